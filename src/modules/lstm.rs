/// LSTM cell with K-FAC visible linear sub-layers
///
/// The gate projections are kept as two separate `Linear` layers
/// (input-to-hidden and hidden-to-hidden) so each one can be registered
/// as its own K-FAC layer.
use candle_core::{DType, Device, Module, Result, Tensor, D};
use candle_nn::{linear, linear_no_bias, Linear, VarBuilder};

/// Hidden and cell state carried between LSTM steps
#[derive(Debug, Clone)]
pub struct LstmState {
    /// Hidden state: [batch, hidden_size]
    pub h: Tensor,
    /// Cell state: [batch, hidden_size]
    pub c: Tensor,
}

impl LstmState {
    pub fn new(h: Tensor, c: Tensor) -> Self {
        Self { h, c }
    }

    /// Zero-initialized state
    pub fn zeros(batch_size: usize, hidden_size: usize, dtype: DType, device: &Device) -> Result<Self> {
        let h = Tensor::zeros((batch_size, hidden_size), dtype, device)?;
        let c = Tensor::zeros((batch_size, hidden_size), dtype, device)?;
        Ok(Self { h, c })
    }
}

fn check_hidden_size(hidden_size: usize) -> Result<()> {
    if hidden_size == 0 {
        return Err(candle_core::Error::Msg(
            "LSTM hidden_size must be > 0".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct LstmCell {
    linear_ih: Linear,
    linear_hh: Linear,
    hidden_size: usize,
}

impl LstmCell {
    /// Create new LSTM cell
    ///
    /// # Arguments
    /// * `input_size` - Input feature dimension
    /// * `hidden_size` - Hidden state dimension
    /// * `bias` - Whether both projections carry a bias
    /// * `vb` - VarBuilder for parameter initialization
    pub fn new(input_size: usize, hidden_size: usize, bias: bool, vb: VarBuilder) -> Result<Self> {
        check_hidden_size(hidden_size)?;
        let (linear_ih, linear_hh) = if bias {
            (
                linear(input_size, 4 * hidden_size, vb.pp("linear_ih"))?,
                linear(hidden_size, 4 * hidden_size, vb.pp("linear_hh"))?,
            )
        } else {
            (
                linear_no_bias(input_size, 4 * hidden_size, vb.pp("linear_ih"))?,
                linear_no_bias(hidden_size, 4 * hidden_size, vb.pp("linear_hh"))?,
            )
        };

        Ok(Self {
            linear_ih,
            linear_hh,
            hidden_size,
        })
    }

    /// Build a cell from existing projections
    ///
    /// `linear_ih` must be [4 * hidden, input] and `linear_hh` [4 * hidden, hidden].
    pub fn from_linears(linear_ih: Linear, linear_hh: Linear) -> Result<Self> {
        let (ih_out, _) = linear_ih.weight().dims2()?;
        let (hh_out, hidden_size) = linear_hh.weight().dims2()?;
        check_hidden_size(hidden_size)?;

        if ih_out != 4 * hidden_size || hh_out != 4 * hidden_size {
            return Err(candle_core::Error::Msg(format!(
                "LSTM projections must output 4 * hidden_size = {}, got {} and {}",
                4 * hidden_size,
                ih_out,
                hh_out
            )));
        }

        Ok(Self {
            linear_ih,
            linear_hh,
            hidden_size,
        })
    }

    pub fn linear_ih(&self) -> &Linear {
        &self.linear_ih
    }

    pub fn linear_hh(&self) -> &Linear {
        &self.linear_hh
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// All parameter tensors, input projection first
    pub fn parameters(&self) -> Vec<&Tensor> {
        let mut params = Vec::with_capacity(4);
        for linear in [&self.linear_ih, &self.linear_hh] {
            params.push(linear.weight());
            params.extend(linear.bias());
        }
        params
    }

    /// Single LSTM step
    ///
    /// # Arguments
    /// * `input` - Input tensor [batch, input_size]
    /// * `state` - Previous state
    ///
    /// # Returns
    /// Next state
    pub fn forward(&self, input: &Tensor, state: &LstmState) -> Result<LstmState> {
        let gates = (self.linear_ih.forward(input)? + self.linear_hh.forward(&state.h)?)?;

        // Gate order: input, forget, cell, output
        let gate = |k: usize| gates.narrow(D::Minus1, k * self.hidden_size, self.hidden_size);
        let i = candle_nn::ops::sigmoid(&gate(0)?)?;
        let f = candle_nn::ops::sigmoid(&gate(1)?)?;
        let g = gate(2)?.tanh()?;
        let o = candle_nn::ops::sigmoid(&gate(3)?)?;

        let c = ((f * &state.c)? + (i * g)?)?;
        let h = (o * c.tanh()?)?;

        Ok(LstmState { h, c })
    }
}
