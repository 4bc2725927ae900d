/// K-FAC bookkeeping for embedding lookups
use candle_nn::Embedding;

use super::FactorShape;
use crate::KfacConfig;

/// K-FAC wrapper for an `Embedding` layer
///
/// Inputs are one-hot token ids, so the A factor is diagonal (one entry
/// per vocabulary row). Embeddings never carry a bias.
#[derive(Debug, Clone)]
pub struct EmbeddingLayer {
    config: KfacConfig,
    num_embeddings: usize,
    embedding_dim: usize,
}

impl EmbeddingLayer {
    pub fn new(embedding: &Embedding, config: KfacConfig) -> crate::Result<Self> {
        config.validate()?;
        let (num_embeddings, embedding_dim) = embedding.embeddings().dims2()?;

        log::debug!(
            "EmbeddingLayer: num_embeddings={}, dim={}, damping={}",
            num_embeddings,
            embedding_dim,
            config.damping
        );

        Ok(Self {
            config,
            num_embeddings,
            embedding_dim,
        })
    }

    pub fn config(&self) -> &KfacConfig {
        &self.config
    }

    pub fn num_embeddings(&self) -> usize {
        self.num_embeddings
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn a_factor_shape(&self) -> FactorShape {
        FactorShape::Diagonal(self.num_embeddings)
    }

    pub fn g_factor_shape(&self) -> FactorShape {
        FactorShape::Dense(self.embedding_dim)
    }
}
