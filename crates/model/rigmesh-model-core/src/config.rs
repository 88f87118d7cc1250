//! World sizing configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a model world. Capacity is fixed at world creation;
/// attach requests beyond it fail with `ModelError::WorldFull`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Maximum number of concurrently attached model components.
    pub max_model_count: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_model_count: 128,
        }
    }
}
