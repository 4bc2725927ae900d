/// K-FAC bookkeeping for the linear projections inside a recurrent cell
use candle_nn::Linear;

use super::{FactorShape, LinearLayer};
use crate::KfacConfig;

/// K-FAC wrapper for one gate projection of an LSTM cell
///
/// Sized like a plain linear layer. The projection is applied once per
/// time step, so inputs and output gradients of every step are folded
/// into the same factors.
#[derive(Debug, Clone)]
pub struct LinearRnnLayer {
    linear: LinearLayer,
}

impl LinearRnnLayer {
    pub fn new(linear: &Linear, config: KfacConfig) -> crate::Result<Self> {
        Ok(Self {
            linear: LinearLayer::new(linear, config)?,
        })
    }

    pub fn config(&self) -> &KfacConfig {
        self.linear.config()
    }

    pub fn has_bias(&self) -> bool {
        self.linear.has_bias()
    }

    pub fn in_features(&self) -> usize {
        self.linear.in_features()
    }

    pub fn out_features(&self) -> usize {
        self.linear.out_features()
    }

    pub fn a_factor_shape(&self) -> FactorShape {
        self.linear.a_factor_shape()
    }

    pub fn g_factor_shape(&self) -> FactorShape {
        self.linear.g_factor_shape()
    }
}
