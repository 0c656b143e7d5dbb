use matjip_common::Restaurant;
use ndarray::Array2;

use crate::index::FlatIpIndex;

/// Size disagreement between the parts of a catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{records} restaurants, {embeddings} embedding rows ({embedding_dim} dims), \
     {indexed} indexed vectors ({index_dim} dims)"
)]
pub struct CatalogMismatch {
    pub records: usize,
    pub embeddings: usize,
    pub indexed: usize,
    pub embedding_dim: usize,
    pub index_dim: usize,
}

/// Restaurants, their raw embeddings and the normalized index, bound by position
///
/// Only constructible with matching lengths; never mutated after construction.
#[derive(Debug, Clone)]
pub struct IndexedCatalog {
    restaurants: Vec<Restaurant>,
    embeddings: Array2<f32>,
    index: FlatIpIndex,
}

impl IndexedCatalog {
    pub fn new(
        restaurants: Vec<Restaurant>,
        embeddings: Array2<f32>,
        index: FlatIpIndex,
    ) -> Result<Self, CatalogMismatch> {
        let consistent = restaurants.len() == embeddings.nrows()
            && embeddings.nrows() == index.len()
            && (index.is_empty() || embeddings.ncols() == index.dimension());

        if !consistent {
            return Err(CatalogMismatch {
                records: restaurants.len(),
                embeddings: embeddings.nrows(),
                indexed: index.len(),
                embedding_dim: embeddings.ncols(),
                index_dim: index.dimension(),
            });
        }

        Ok(Self {
            restaurants,
            embeddings,
            index,
        })
    }

    /// Catalog with nothing in it
    pub fn empty() -> Self {
        Self {
            restaurants: Vec::new(),
            embeddings: Array2::zeros((0, 0)),
            index: FlatIpIndex::default(),
        }
    }

    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    /// Raw (pre-normalization) embedding matrix
    pub fn embeddings(&self) -> &Array2<f32> {
        &self.embeddings
    }

    pub fn index(&self) -> &FlatIpIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.restaurants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }
}

/// Engine statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStats {
    /// Whether a build or load has succeeded
    pub ready: bool,

    /// Indexed restaurants
    pub count: usize,

    /// Vector dimension
    pub dimension: usize,

    /// Embedding model used for documents and queries
    pub embedding_model: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use matjip_common::RestaurantProfile;
    use ndarray::array;

    fn restaurant(id: u32) -> Restaurant {
        Restaurant::from_profile(
            id,
            RestaurantProfile {
                name: format!("식당{}", id),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_new_accepts_matching_parts() {
        let raw = array![[1.0f32, 0.0], [0.0, 2.0]];
        let index = FlatIpIndex::build(&raw).unwrap();
        let catalog = IndexedCatalog::new(vec![restaurant(1), restaurant(2)], raw, index).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.dimension(), 2);
        assert_eq!(catalog.embeddings()[[1, 1]], 2.0);
    }

    #[test]
    fn test_new_rejects_count_mismatch() {
        let raw = array![[1.0f32, 0.0], [0.0, 2.0]];
        let index = FlatIpIndex::build(&raw).unwrap();
        let err = IndexedCatalog::new(vec![restaurant(1)], raw, index).unwrap_err();

        assert_eq!(err.records, 1);
        assert_eq!(err.embeddings, 2);
        assert_eq!(err.indexed, 2);
    }

    #[test]
    fn test_new_rejects_dimension_mismatch() {
        let index = FlatIpIndex::build(&array![[1.0f32, 0.0, 0.0]]).unwrap();
        let raw = array![[1.0f32, 0.0]];
        assert!(IndexedCatalog::new(vec![restaurant(1)], raw, index).is_err());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = IndexedCatalog::empty();
        assert!(catalog.is_empty());
        assert_eq!(catalog.dimension(), 0);
    }
}
