//! Matjip Vector Search Engine
//!
//! 식당 검색 텍스트 임베딩, 내적(코사인) 인덱스 구축, 스냅샷 저장/로드 및 top-k 검색

mod engine;
mod index;
pub mod snapshot;
mod types;

#[cfg(test)]
mod test_support;

pub use engine::VectorSearchEngine;
pub use index::{normalize, FlatIpIndex};
pub use snapshot::{snapshot_exists, SnapshotHeader};
pub use types::{CatalogMismatch, EngineStats, IndexedCatalog};
