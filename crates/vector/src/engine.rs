use indicatif::{ProgressBar, ProgressStyle};
use matjip_common::{AppConfig, MatjipError, Restaurant, Result, SearchResult};
use matjip_llm::LlmClient;
use ndarray::{Array1, ArrayView1};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::index::{normalize, stack_rows, FlatIpIndex};
use crate::snapshot::{read_snapshot, write_snapshot};
use crate::types::{EngineStats, IndexedCatalog};

/// Vector search engine
///
/// Holds at most one catalog. `build` and `load` assemble the replacement
/// off to the side and swap it in whole; searches clone the current `Arc`
/// and never see a half-replaced catalog.
pub struct VectorSearchEngine {
    catalog: RwLock<Option<Arc<IndexedCatalog>>>,
    llm_client: Arc<dyn LlmClient>,
    embedding_model: String,
    batch_size: usize,
}

impl VectorSearchEngine {
    /// Create new vector search engine with nothing indexed
    pub fn new(config: &AppConfig, llm_client: Arc<dyn LlmClient>) -> Self {
        Self {
            catalog: RwLock::new(None),
            llm_client,
            embedding_model: config.embedding_model.clone(),
            batch_size: config.embed_batch_size.max(1),
        }
    }

    /// Embed and index `restaurants`, replacing whatever was held before
    pub async fn build(&self, restaurants: Vec<Restaurant>) -> Result<()> {
        validate_input(&restaurants)?;

        if restaurants.is_empty() {
            warn!("Building an empty restaurant index");
            self.replace(IndexedCatalog::empty()).await;
            return Ok(());
        }

        info!(
            "Building restaurant index - {} restaurants, model {}",
            restaurants.len(),
            self.embedding_model
        );

        let rows = self.encode_all(&restaurants).await?;
        let embeddings = stack_rows(rows)?;
        let index = FlatIpIndex::build(&embeddings)?;
        let dimension = index.dimension();

        let catalog = IndexedCatalog::new(restaurants, embeddings, index)
            .map_err(|e| MatjipError::encoding(format!("Encoder output does not line up: {}", e)))?;
        let count = catalog.len();

        self.replace(catalog).await;
        info!("Restaurant index built: {} restaurants, {} dims", count, dimension);
        Ok(())
    }

    /// Encode search texts batch by batch, in record order
    async fn encode_all(&self, restaurants: &[Restaurant]) -> Result<Vec<Vec<f32>>> {
        let progress = ProgressBar::new(restaurants.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} 임베딩")
                .map(|style| style.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut rows = Vec::with_capacity(restaurants.len());
        for (batch_no, batch) in restaurants.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|r| r.search_text.clone()).collect();

            let embedded = self
                .llm_client
                .embed_batch(&self.embedding_model, &texts)
                .await
                .map_err(|e| {
                    progress.abandon();
                    MatjipError::encoding(format!(
                        "Failed to embed batch starting at restaurant {}: {}",
                        batch[0].id, e
                    ))
                })?;

            if embedded.len() != batch.len() {
                progress.abandon();
                return Err(MatjipError::encoding(format!(
                    "Encoder returned {} vectors for {} texts in batch {}",
                    embedded.len(),
                    batch.len(),
                    batch_no
                )));
            }

            rows.extend(embedded);
            progress.inc(batch.len() as u64);
        }

        progress.finish_and_clear();
        Ok(rows)
    }

    /// Top-`k` restaurants for `query`, best first
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(MatjipError::invalid_input("k must be at least 1"));
        }

        let catalog = self.current().await?;
        if catalog.is_empty() {
            debug!("Search against an empty index: {}", query);
            return Ok(Vec::new());
        }

        let query_vector = self.encode_query(query).await?;
        let hits = catalog.index().search(query_vector.view(), k)?;

        let results: Vec<SearchResult> = hits
            .into_iter()
            .map(|(position, score)| {
                SearchResult::new(catalog.restaurants()[position].clone(), score)
            })
            .collect();

        debug!(
            "Search completed - query: {}, k: {}, results: {}, top score: {:?}",
            query,
            k,
            results.len(),
            results.first().map(|r| r.score)
        );
        Ok(results)
    }

    async fn encode_query(&self, query: &str) -> Result<Array1<f32>> {
        if query.trim().is_empty() {
            return Err(MatjipError::encoding("Query text is empty"));
        }

        // Same call as record encoding so both sides come from one encoder path
        let raw = self
            .llm_client
            .embed_batch(&self.embedding_model, &[query.to_string()])
            .await
            .map_err(|e| MatjipError::encoding(format!("Failed to embed query: {}", e)))?
            .into_iter()
            .next()
            .ok_or_else(|| MatjipError::encoding("Encoder returned no vector for the query"))?;

        normalize(ArrayView1::from(raw.as_slice()))
            .ok_or_else(|| MatjipError::encoding("Query embedding has zero or non-finite norm"))
    }

    /// Persist the current catalog to `dir`
    pub async fn save(&self, dir: &Path) -> Result<()> {
        let catalog = self.current().await?;
        let header = write_snapshot(dir, &catalog, &self.embedding_model).await?;

        info!(
            "Restaurant index saved: {} ({} restaurants, {} dims)",
            dir.display(),
            header.count,
            header.dimension
        );
        Ok(())
    }

    /// Replace the current catalog with the snapshot in `dir`
    pub async fn load(&self, dir: &Path) -> Result<()> {
        let (header, catalog) = read_snapshot(dir).await?;

        if header.embedding_model != self.embedding_model {
            return Err(MatjipError::snapshot_corrupt(format!(
                "Snapshot was built with '{}' but the engine encodes with '{}'",
                header.embedding_model, self.embedding_model
            )));
        }

        let count = catalog.len();
        self.replace(catalog).await;

        info!(
            "Restaurant index loaded: {} ({} restaurants, built {})",
            dir.display(),
            count,
            header.created_at
        );
        Ok(())
    }

    /// Restaurants currently indexed, in index order
    pub async fn restaurants(&self) -> Result<Vec<Restaurant>> {
        Ok(self.current().await?.restaurants().to_vec())
    }

    /// Whether a build or load has succeeded
    pub async fn is_ready(&self) -> bool {
        self.catalog.read().await.is_some()
    }

    /// Get index statistics
    pub async fn stats(&self) -> EngineStats {
        let guard = self.catalog.read().await;
        EngineStats {
            ready: guard.is_some(),
            count: guard.as_ref().map_or(0, |c| c.len()),
            dimension: guard.as_ref().map_or(0, |c| c.dimension()),
            embedding_model: self.embedding_model.clone(),
        }
    }

    async fn current(&self) -> Result<Arc<IndexedCatalog>> {
        self.catalog
            .read()
            .await
            .clone()
            .ok_or(MatjipError::IndexNotReady)
    }

    async fn replace(&self, catalog: IndexedCatalog) {
        *self.catalog.write().await = Some(Arc::new(catalog));
    }
}

/// Check the build preconditions before any encoding work
fn validate_input(restaurants: &[Restaurant]) -> Result<()> {
    let mut seen = HashSet::with_capacity(restaurants.len());

    for restaurant in restaurants {
        if restaurant.search_text.trim().is_empty() {
            return Err(MatjipError::encoding(format!(
                "Restaurant {} has no search text to embed",
                restaurant.id
            )));
        }

        restaurant.validate()?;

        if !seen.insert(restaurant.id) {
            return Err(MatjipError::invalid_input(format!(
                "Duplicate restaurant id {}",
                restaurant.id
            )));
        }
    }

    Ok(())
}
