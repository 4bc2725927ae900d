//! K-FAC layer registration for candle
//!
//! Maps candle layers to the per-layer bookkeeping wrappers used by a
//! Kronecker-factored (K-FAC) preconditioner.
//!
//! # Overview
//!
//! - **Modules**: a closed [`Module`] enum over the layer kinds a model is built from
//! - **Layers**: one [`KfacLayer`] wrapper per supported kind, sized for its A and G factors
//! - **Registry**: walks a named model and registers every eligible layer
//!
//! # Example
//!
//! ```ignore
//! use kfac_rs::{get_kfac_layers, KfacConfig, Module};
//!
//! let config = KfacConfig { damping: 0.1, ..Default::default() };
//! let pairs = get_kfac_layers(&Module::Linear(linear), &config)?;
//! assert_eq!(pairs.len(), 1);
//! ```

pub mod config;
pub mod layers;
pub mod modules;
pub mod registry;

// Re-export commonly used items
pub use config::KfacConfig;
pub use layers::{get_kfac_layers, KfacLayer, KNOWN_MODULES};
pub use modules::{module_requires_grad, ForeignModule, LstmCell, Module};
pub use registry::{LayerRegistry, RegisteredLayer};

/// Library error types
#[derive(Debug, thiserror::Error)]
pub enum KfacError {
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported layer kind: {0}")]
    UnsupportedLayerKind(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KfacError>;
