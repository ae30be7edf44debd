use std::sync::Arc;

use crate::config::RecommenderConfig;
use crate::data::Dataset;

/// Shared application state
///
/// The dataset is immutable for the process lifetime, so handlers share it
/// through an `Arc` without locking; reloading data requires a restart.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub recommender: RecommenderConfig,
}

impl AppState {
    /// Creates application state around a loaded dataset
    pub fn new(dataset: Dataset, recommender: RecommenderConfig) -> Self {
        Self {
            dataset: Arc::new(dataset),
            recommender,
        }
    }
}
