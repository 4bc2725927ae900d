/// K-FAC bookkeeping for fully-connected layers
use candle_nn::Linear;

use super::FactorShape;
use crate::KfacConfig;

/// K-FAC wrapper for a `Linear` layer
///
/// The A factor covers the layer inputs (plus a constant column when the
/// layer has a bias), the G factor covers the output gradients.
#[derive(Debug, Clone)]
pub struct LinearLayer {
    config: KfacConfig,
    in_features: usize,
    out_features: usize,
    has_bias: bool,
}

impl LinearLayer {
    /// Create new LinearLayer
    ///
    /// # Arguments
    /// * `linear` - Layer to wrap, weight [out_features, in_features]
    /// * `config` - Options forwarded to the wrapper
    pub fn new(linear: &Linear, config: KfacConfig) -> crate::Result<Self> {
        config.validate()?;
        let (out_features, in_features) = linear.weight().dims2()?;
        let has_bias = linear.bias().is_some();

        log::debug!(
            "LinearLayer: in={}, out={}, bias={}, damping={}",
            in_features,
            out_features,
            has_bias,
            config.damping
        );

        Ok(Self {
            config,
            in_features,
            out_features,
            has_bias,
        })
    }

    pub fn config(&self) -> &KfacConfig {
        &self.config
    }

    pub fn has_bias(&self) -> bool {
        self.has_bias
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    pub fn a_factor_shape(&self) -> FactorShape {
        FactorShape::Dense(self.in_features + usize::from(self.has_bias))
    }

    pub fn g_factor_shape(&self) -> FactorShape {
        FactorShape::Dense(self.out_features)
    }
}
