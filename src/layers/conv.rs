/// K-FAC bookkeeping for 2-D convolutions
use candle_nn::{Conv2d, Conv2dConfig};

use super::FactorShape;
use crate::KfacConfig;

/// K-FAC wrapper for a `Conv2d` layer
///
/// The A factor covers one unfolded input patch (in_channels / groups *
/// kernel_h * kernel_w, plus one with a bias), the G factor covers the
/// output channels.
#[derive(Debug, Clone)]
pub struct Conv2dLayer {
    config: KfacConfig,
    conv_config: Conv2dConfig,
    in_channels_per_group: usize,
    out_channels: usize,
    kernel_size: (usize, usize),
    has_bias: bool,
}

impl Conv2dLayer {
    /// Create new Conv2dLayer
    ///
    /// # Arguments
    /// * `conv` - Layer to wrap, weight [out_channels, in_channels / groups, kh, kw]
    /// * `config` - Options forwarded to the wrapper
    pub fn new(conv: &Conv2d, config: KfacConfig) -> crate::Result<Self> {
        config.validate()?;
        let (out_channels, in_channels_per_group, kh, kw) = conv.weight().dims4()?;
        let has_bias = conv.bias().is_some();

        log::debug!(
            "Conv2dLayer: in/group={}, out={}, kernel={}x{}, bias={}, damping={}",
            in_channels_per_group,
            out_channels,
            kh,
            kw,
            has_bias,
            config.damping
        );

        Ok(Self {
            config,
            conv_config: conv.config().clone(),
            in_channels_per_group,
            out_channels,
            kernel_size: (kh, kw),
            has_bias,
        })
    }

    pub fn config(&self) -> &KfacConfig {
        &self.config
    }

    /// Stride, padding, dilation and groups of the wrapped convolution
    pub fn conv_config(&self) -> &Conv2dConfig {
        &self.conv_config
    }

    pub fn has_bias(&self) -> bool {
        self.has_bias
    }

    pub fn kernel_size(&self) -> (usize, usize) {
        self.kernel_size
    }

    pub fn a_factor_shape(&self) -> FactorShape {
        let (kh, kw) = self.kernel_size;
        FactorShape::Dense(self.in_channels_per_group * kh * kw + usize::from(self.has_bias))
    }

    pub fn g_factor_shape(&self) -> FactorShape {
        FactorShape::Dense(self.out_channels)
    }
}
