/// K-FAC layer wrappers
///
/// One wrapper per supported layer kind:
/// - Fully-connected (`LinearLayer`)
/// - 2-D convolution (`Conv2dLayer`)
/// - Embedding lookup (`EmbeddingLayer`)
/// - LSTM gate projections (`LinearRnnLayer`)
///
/// `get_kfac_layers` picks and builds the wrappers for a given module.

pub mod conv;
pub mod embedding;
pub mod linear;
pub mod linear_rnn;

pub use conv::Conv2dLayer;
pub use embedding::EmbeddingLayer;
pub use linear::LinearLayer;
pub use linear_rnn::LinearRnnLayer;

use crate::modules::Module;
use crate::{KfacConfig, KfacError, Result};

/// Lower-cased type names of the modules K-FAC knows how to handle
pub const KNOWN_MODULES: [&str; 4] = ["linear", "conv2d", "embedding", "lstmcell"];

/// Shape of a Kronecker factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorShape {
    /// Full n x n matrix
    Dense(usize),
    /// Only the n diagonal entries are stored
    Diagonal(usize),
}

impl FactorShape {
    /// Side length of the factor
    pub fn dim(&self) -> usize {
        match self {
            FactorShape::Dense(n) | FactorShape::Diagonal(n) => *n,
        }
    }

    /// Number of stored elements
    pub fn numel(&self) -> usize {
        match self {
            FactorShape::Dense(n) => n * n,
            FactorShape::Diagonal(n) => *n,
        }
    }
}

/// A K-FAC wrapper around one layer
#[derive(Debug, Clone)]
pub enum KfacLayer {
    Linear(LinearLayer),
    Conv2d(Conv2dLayer),
    Embedding(EmbeddingLayer),
    LinearRnn(LinearRnnLayer),
}

impl KfacLayer {
    /// Options the wrapper was constructed with
    pub fn config(&self) -> &KfacConfig {
        match self {
            KfacLayer::Linear(l) => l.config(),
            KfacLayer::Conv2d(l) => l.config(),
            KfacLayer::Embedding(l) => l.config(),
            KfacLayer::LinearRnn(l) => l.config(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KfacLayer::Linear(_) => "LinearLayer",
            KfacLayer::Conv2d(_) => "Conv2dLayer",
            KfacLayer::Embedding(_) => "EmbeddingLayer",
            KfacLayer::LinearRnn(_) => "LinearRNNLayer",
        }
    }

    pub fn has_bias(&self) -> bool {
        match self {
            KfacLayer::Linear(l) => l.has_bias(),
            KfacLayer::Conv2d(l) => l.has_bias(),
            KfacLayer::Embedding(_) => false,
            KfacLayer::LinearRnn(l) => l.has_bias(),
        }
    }

    /// Shape of the input-side (A) factor
    pub fn a_factor_shape(&self) -> FactorShape {
        match self {
            KfacLayer::Linear(l) => l.a_factor_shape(),
            KfacLayer::Conv2d(l) => l.a_factor_shape(),
            KfacLayer::Embedding(l) => l.a_factor_shape(),
            KfacLayer::LinearRnn(l) => l.a_factor_shape(),
        }
    }

    /// Shape of the output-gradient-side (G) factor
    pub fn g_factor_shape(&self) -> FactorShape {
        match self {
            KfacLayer::Linear(l) => l.g_factor_shape(),
            KfacLayer::Conv2d(l) => l.g_factor_shape(),
            KfacLayer::Embedding(l) => l.g_factor_shape(),
            KfacLayer::LinearRnn(l) => l.g_factor_shape(),
        }
    }
}

/// Instantiate the K-FAC wrapper(s) for `module`
///
/// # Arguments
/// * `module` - Layer to register
/// * `config` - Options forwarded unchanged to every wrapper
///
/// # Returns
/// (layer, wrapper) pairs. One pair for linear, convolution and embedding
/// layers; two for an LSTM cell (input-to-hidden, then hidden-to-hidden).
pub fn get_kfac_layers(module: &Module, config: &KfacConfig) -> Result<Vec<(Module, KfacLayer)>> {
    let pairs = match module {
        Module::Linear(linear) => vec![(
            module.clone(),
            KfacLayer::Linear(LinearLayer::new(linear, config.clone())?),
        )],
        Module::Conv2d(conv) => vec![(
            module.clone(),
            KfacLayer::Conv2d(Conv2dLayer::new(conv, config.clone())?),
        )],
        Module::Embedding(embedding) => vec![(
            module.clone(),
            KfacLayer::Embedding(EmbeddingLayer::new(embedding, config.clone())?),
        )],
        Module::LstmCell(cell) => {
            let ih = LinearRnnLayer::new(cell.linear_ih(), config.clone())?;
            let hh = LinearRnnLayer::new(cell.linear_hh(), config.clone())?;
            vec![
                (Module::Linear(cell.linear_ih().clone()), KfacLayer::LinearRnn(ih)),
                (Module::Linear(cell.linear_hh().clone()), KfacLayer::LinearRnn(hh)),
            ]
        }
        Module::RecurrentBase(m) => {
            return Err(KfacError::UnsupportedLayerKind(format!(
                "K-FAC does not support the fused recurrent cell {}. \
                 Use kfac_rs::modules::LstmCell instead for K-FAC support.",
                m.type_name()
            )));
        }
        Module::Other(m) => {
            return Err(KfacError::UnsupportedLayerKind(format!(
                "K-FAC does not support layer {}",
                m.type_name()
            )));
        }
    };

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{ForeignModule, LstmCell};
    use candle_core::{DType, Device};
    use candle_nn::{VarBuilder, VarMap};

    fn damped(damping: f64) -> KfacConfig {
        KfacConfig {
            damping,
            ..Default::default()
        }
    }

    #[test]
    fn test_linear_dispatch_forwards_config() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let module = Module::from(candle_nn::linear(4, 3, vb)?);
        let config = damped(0.1);
        let pairs = get_kfac_layers(&module, &config)?;

        assert_eq!(pairs.len(), 1);
        let (layer, wrapper) = &pairs[0];
        assert_eq!(layer.type_name(), "Linear");
        assert!(matches!(wrapper, KfacLayer::Linear(_)));
        assert_eq!(wrapper.config(), &config);
        assert_eq!(wrapper.config().damping, 0.1);

        Ok(())
    }

    #[test]
    fn test_conv2d_dispatch() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let module = Module::from(candle_nn::conv2d(1, 4, 3, Default::default(), vb)?);
        let config = damped(0.01);
        let pairs = get_kfac_layers(&module, &config)?;

        assert_eq!(pairs.len(), 1);
        assert!(matches!(pairs[0].1, KfacLayer::Conv2d(_)));
        assert_eq!(pairs[0].1.name(), "Conv2dLayer");
        assert_eq!(pairs[0].1.config(), &config);

        Ok(())
    }

    #[test]
    fn test_embedding_dispatch() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let module = Module::from(candle_nn::embedding(50, 8, vb)?);
        let config = KfacConfig::default();
        let pairs = get_kfac_layers(&module, &config)?;

        assert_eq!(pairs.len(), 1);
        let wrapper = &pairs[0].1;
        assert!(matches!(wrapper, KfacLayer::Embedding(_)));
        assert!(!wrapper.has_bias());
        assert_eq!(wrapper.a_factor_shape(), FactorShape::Diagonal(50));
        assert_eq!(wrapper.config(), &config);

        Ok(())
    }

    #[test]
    fn test_lstm_cell_dispatches_to_two_rnn_layers() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let cell = LstmCell::new(5, 7, true, vb)?;
        let module = Module::from(cell.clone());
        let config = KfacConfig {
            damping: 0.05,
            batch_first: false,
            ..Default::default()
        };
        let pairs = get_kfac_layers(&module, &config)?;

        assert_eq!(pairs.len(), 2);
        for (layer, wrapper) in &pairs {
            assert_eq!(layer.type_name(), "Linear");
            assert!(matches!(wrapper, KfacLayer::LinearRnn(_)));
            assert_eq!(wrapper.name(), "LinearRNNLayer");
            assert_eq!(wrapper.config(), &config);
        }

        // Input-to-hidden first, hidden-to-hidden second
        assert_eq!(pairs[0].1.a_factor_shape(), FactorShape::Dense(6));
        assert_eq!(pairs[1].1.a_factor_shape(), FactorShape::Dense(8));
        assert_eq!(pairs[0].1.g_factor_shape(), FactorShape::Dense(28));

        match &pairs[0].0 {
            Module::Linear(l) => assert_eq!(l.weight().dims(), cell.linear_ih().weight().dims()),
            other => panic!("expected linear sub-layer, got {}", other.type_name()),
        }

        Ok(())
    }

    #[test]
    fn test_recurrent_base_is_rejected_with_redirect() {
        let module = Module::RecurrentBase(ForeignModule::new("LSTMCell", vec![]));

        match get_kfac_layers(&module, &KfacConfig::default()) {
            Err(KfacError::UnsupportedLayerKind(msg)) => {
                assert!(msg.contains("kfac_rs::modules::LstmCell"), "got: {}", msg);
            }
            other => panic!("expected UnsupportedLayerKind, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_unknown_layer_is_rejected_with_its_name() {
        let module = Module::Other(ForeignModule::new("BatchNorm2d", vec![]));

        match get_kfac_layers(&module, &KfacConfig::default()) {
            Err(KfacError::UnsupportedLayerKind(msg)) => {
                assert!(msg.contains("BatchNorm2d"), "got: {}", msg);
            }
            other => panic!("expected UnsupportedLayerKind, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_invalid_config_fails_whole_dispatch() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let module = Module::from(LstmCell::new(2, 2, false, vb)?);

        assert!(matches!(
            get_kfac_layers(&module, &damped(-1.0)),
            Err(KfacError::Config(_))
        ));

        Ok(())
    }

    #[test]
    fn test_factor_shape_sizes() {
        assert_eq!(FactorShape::Dense(4).numel(), 16);
        assert_eq!(FactorShape::Diagonal(4).numel(), 4);
        assert_eq!(FactorShape::Diagonal(4).dim(), 4);
    }

    #[test]
    fn test_known_modules_match_type_names() {
        for name in ["Linear", "Conv2d", "Embedding", "LSTMCell"] {
            assert!(KNOWN_MODULES.contains(&name.to_lowercase().as_str()));
        }
    }
}
