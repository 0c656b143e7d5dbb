//! On-disk snapshot: index structure, record list and raw embedding matrix
//!
//! The index artifact is the one loaders look for first, so it is always
//! removed before and renamed into place after the other two.

use chrono::{DateTime, Utc};
use matjip_common::{MatjipError, Restaurant, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::index::FlatIpIndex;
use crate::types::IndexedCatalog;

/// Similarity index artifact (primary)
pub const INDEX_FILE: &str = "restaurant.index";

/// Ordered record list artifact
pub const RECORDS_FILE: &str = "restaurants.json";

/// Raw embedding matrix artifact
pub const EMBEDDINGS_FILE: &str = "embeddings.json";

/// Current on-disk format
pub const FORMAT_VERSION: u32 = 1;

/// Metadata stored at the top of the index artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub format_version: u32,

    /// Model the vectors were produced with
    pub embedding_model: String,

    pub dimension: usize,
    pub count: usize,
    pub created_at: DateTime<Utc>,

    /// SHA-256 of the record list artifact
    pub records_sha256: String,

    /// SHA-256 of the embedding matrix artifact
    pub embeddings_sha256: String,
}

#[derive(Serialize)]
struct IndexArtifactRef<'a> {
    header: &'a SnapshotHeader,
    index: &'a FlatIpIndex,
}

#[derive(Deserialize)]
struct IndexArtifact {
    header: SnapshotHeader,
    index: FlatIpIndex,
}

/// Whether `dir` holds a snapshot index artifact
pub fn snapshot_exists(dir: &Path) -> bool {
    dir.join(INDEX_FILE).is_file()
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write `catalog` to `dir`
pub async fn write_snapshot(
    dir: &Path,
    catalog: &IndexedCatalog,
    embedding_model: &str,
) -> Result<SnapshotHeader> {
    let encode_err = |what: &str, e: serde_json::Error| {
        MatjipError::persistence(format!("Failed to serialize {}: {}", what, e))
    };

    let records = serde_json::to_vec(catalog.restaurants()).map_err(|e| encode_err("records", e))?;
    let embeddings =
        serde_json::to_vec(catalog.embeddings()).map_err(|e| encode_err("embeddings", e))?;

    let header = SnapshotHeader {
        format_version: FORMAT_VERSION,
        embedding_model: embedding_model.to_string(),
        dimension: catalog.dimension(),
        count: catalog.len(),
        created_at: Utc::now(),
        records_sha256: sha256_hex(&records),
        embeddings_sha256: sha256_hex(&embeddings),
    };

    let index = serde_json::to_vec(&IndexArtifactRef {
        header: &header,
        index: catalog.index(),
    })
    .map_err(|e| encode_err("index", e))?;

    // Index last: a loader never sees new companions behind an old index
    let artifacts = [
        (dir.join(RECORDS_FILE), records),
        (dir.join(EMBEDDINGS_FILE), embeddings),
        (dir.join(INDEX_FILE), index),
    ];

    if let Err(e) = publish(dir, &artifacts).await {
        for (path, _) in &artifacts {
            let _ = fs::remove_file(temp_path(path)).await;
        }
        return Err(e);
    }

    Ok(header)
}

async fn publish(dir: &Path, artifacts: &[(PathBuf, Vec<u8>)]) -> Result<()> {
    let io_err = |what: &str, path: &Path, e: std::io::Error| {
        MatjipError::persistence(format!("Failed to {} {}: {}", what, path.display(), e))
    };

    fs::create_dir_all(dir)
        .await
        .map_err(|e| io_err("create", dir, e))?;

    for (path, bytes) in artifacts {
        let tmp = temp_path(path);
        let mut file = fs::File::create(&tmp)
            .await
            .map_err(|e| io_err("create", &tmp, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| io_err("write", &tmp, e))?;
        file.sync_all()
            .await
            .map_err(|e| io_err("sync", &tmp, e))?;
    }

    // Retire the old snapshot so a crash mid-swap reads as "not found"
    let index_path = dir.join(INDEX_FILE);
    match fs::remove_file(&index_path).await {
        Ok(()) => debug!("Removed previous index artifact {}", index_path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(io_err("remove", &index_path, e)),
    }

    for (path, _) in artifacts {
        fs::rename(temp_path(path), path)
            .await
            .map_err(|e| io_err("rename into", path, e))?;
    }

    Ok(())
}

/// Read an artifact that must exist because the index artifact does
async fn read_companion(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    match fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(MatjipError::snapshot_corrupt(format!(
            "{} is missing next to {}",
            name, INDEX_FILE
        ))),
        Err(e) => Err(MatjipError::persistence(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

fn verify_digest(name: &str, bytes: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(bytes);
    if actual != expected {
        return Err(MatjipError::snapshot_corrupt(format!(
            "{} checksum mismatch (expected {}, found {})",
            name, expected, actual
        )));
    }
    Ok(())
}

/// Read and cross-check a snapshot from `dir`
pub async fn read_snapshot(dir: &Path) -> Result<(SnapshotHeader, IndexedCatalog)> {
    let index_path = dir.join(INDEX_FILE);
    let index_bytes = match fs::read(&index_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(MatjipError::SnapshotNotFound(dir.to_path_buf()));
        }
        Err(e) => {
            return Err(MatjipError::persistence(format!(
                "Failed to read {}: {}",
                index_path.display(),
                e
            )));
        }
    };

    let IndexArtifact { header, index } = serde_json::from_slice(&index_bytes)
        .map_err(|e| MatjipError::snapshot_corrupt(format!("{} is unreadable: {}", INDEX_FILE, e)))?;

    if header.format_version != FORMAT_VERSION {
        return Err(MatjipError::snapshot_corrupt(format!(
            "Unsupported snapshot format {} (expected {})",
            header.format_version, FORMAT_VERSION
        )));
    }

    let records_bytes = read_companion(dir, RECORDS_FILE).await?;
    let embeddings_bytes = read_companion(dir, EMBEDDINGS_FILE).await?;

    verify_digest(RECORDS_FILE, &records_bytes, &header.records_sha256)?;
    verify_digest(EMBEDDINGS_FILE, &embeddings_bytes, &header.embeddings_sha256)?;

    let restaurants: Vec<Restaurant> = serde_json::from_slice(&records_bytes).map_err(|e| {
        MatjipError::snapshot_corrupt(format!("{} is unreadable: {}", RECORDS_FILE, e))
    })?;
    let embeddings: Array2<f32> = serde_json::from_slice(&embeddings_bytes).map_err(|e| {
        MatjipError::snapshot_corrupt(format!("{} is unreadable: {}", EMBEDDINGS_FILE, e))
    })?;

    if header.count != restaurants.len() || (!index.is_empty() && header.dimension != index.dimension()) {
        return Err(MatjipError::snapshot_corrupt(format!(
            "Header describes {} vectors of {} dims, artifacts hold {} restaurants and {}-dim vectors",
            header.count,
            header.dimension,
            restaurants.len(),
            index.dimension()
        )));
    }

    if let Some(row) = index.first_non_unit_row() {
        return Err(MatjipError::snapshot_corrupt(format!(
            "Indexed vector {} is not unit length",
            row
        )));
    }

    for restaurant in &restaurants {
        restaurant
            .validate()
            .map_err(|e| MatjipError::snapshot_corrupt(format!("Invalid record: {}", e)))?;
    }

    let catalog = IndexedCatalog::new(restaurants, embeddings, index)
        .map_err(|e| MatjipError::snapshot_corrupt(format!("Artifacts disagree: {}", e)))?;

    if header.embedding_model.is_empty() {
        warn!("Snapshot in {} does not record its embedding model", dir.display());
    }

    Ok((header, catalog))
}
