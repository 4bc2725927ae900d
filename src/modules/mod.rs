//! Layer kinds a K-FAC model is built from
use candle_core::Tensor;
use candle_nn::{Conv2d, Embedding, Linear};

pub mod lstm;

pub use lstm::{LstmCell, LstmState};

/// A layer this crate has no dedicated type for
///
/// Carries the layer's type name and its parameter tensors.
#[derive(Debug, Clone)]
pub struct ForeignModule {
    type_name: String,
    parameters: Vec<Tensor>,
}

impl ForeignModule {
    pub fn new(type_name: impl Into<String>, parameters: Vec<Tensor>) -> Self {
        Self {
            type_name: type_name.into(),
            parameters,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn parameters(&self) -> &[Tensor] {
        &self.parameters
    }
}

/// A layer handed to the registry
///
/// Layers this crate cannot wrap still get a variant so they can be named
/// in error messages and skipped while walking a model.
#[derive(Debug, Clone)]
pub enum Module {
    Linear(Linear),
    Conv2d(Conv2d),
    Embedding(Embedding),
    /// Recurrent cell with separate input-to-hidden and hidden-to-hidden projections
    LstmCell(LstmCell),
    /// Recurrent cell whose gate projections are fused and not visible to K-FAC
    RecurrentBase(ForeignModule),
    Other(ForeignModule),
}

impl Module {
    /// Type name of the layer, e.g. `Linear` or `LSTMCell`
    pub fn type_name(&self) -> &str {
        match self {
            Module::Linear(_) => "Linear",
            Module::Conv2d(_) => "Conv2d",
            Module::Embedding(_) => "Embedding",
            Module::LstmCell(_) => "LSTMCell",
            Module::RecurrentBase(m) | Module::Other(m) => m.type_name(),
        }
    }

    /// All parameter tensors owned by the layer
    pub fn parameters(&self) -> Vec<&Tensor> {
        match self {
            Module::Linear(l) => std::iter::once(l.weight()).chain(l.bias()).collect(),
            Module::Conv2d(c) => std::iter::once(c.weight()).chain(c.bias()).collect(),
            Module::Embedding(e) => vec![e.embeddings()],
            Module::LstmCell(cell) => cell.parameters(),
            Module::RecurrentBase(m) | Module::Other(m) => m.parameters().iter().collect(),
        }
    }
}

impl From<Linear> for Module {
    fn from(linear: Linear) -> Self {
        Module::Linear(linear)
    }
}

impl From<Conv2d> for Module {
    fn from(conv: Conv2d) -> Self {
        Module::Conv2d(conv)
    }
}

impl From<Embedding> for Module {
    fn from(embedding: Embedding) -> Self {
        Module::Embedding(embedding)
    }
}

impl From<LstmCell> for Module {
    fn from(cell: LstmCell) -> Self {
        Module::LstmCell(cell)
    }
}

/// Returns false if any parameter of `module` is not tracked for gradients
///
/// A candle tensor is tracked when it was created as a variable
/// (`Var`, or through a `VarMap`-backed `VarBuilder`). Layers without
/// parameters trivially require gradients.
pub fn module_requires_grad(module: &Module) -> bool {
    module.parameters().iter().all(|param| param.is_variable())
}
