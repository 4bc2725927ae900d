/// Options forwarded to every K-FAC layer wrapper
///
/// Mirrors the keyword options a K-FAC layer is constructed with. Unknown
/// options are rejected when parsing from JSON.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KfacConfig {
    /// Tikhonov damping added to the factors before inversion
    pub damping: f64,

    /// Running average decay for the A and G factors
    pub factor_decay: f64,

    /// Accumulate layer inputs/grad outputs across micro-batches
    pub accumulate_data: bool,

    /// Inputs are laid out as [batch, seq, ...] rather than [seq, batch, ...]
    pub batch_first: bool,

    /// Keep a copy of the inverted factors between updates
    pub keep_inv_copy: bool,

    /// Precondition with eigen decompositions instead of explicit inverses
    pub use_eigen_decomp: bool,
}

impl Default for KfacConfig {
    fn default() -> Self {
        Self {
            damping: 0.001,
            factor_decay: 0.95,
            accumulate_data: true,
            batch_first: true,
            keep_inv_copy: false,
            use_eigen_decomp: true,
        }
    }
}

impl KfacConfig {
    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if !self.damping.is_finite() || self.damping <= 0.0 {
            return Err(crate::KfacError::Config(format!(
                "damping must be a positive finite number, got {}",
                self.damping
            )));
        }

        if !(self.factor_decay > 0.0 && self.factor_decay <= 1.0) {
            return Err(crate::KfacError::Config(format!(
                "factor_decay must be in (0, 1], got {}",
                self.factor_decay
            )));
        }

        Ok(())
    }

    /// Parse a configuration from JSON
    ///
    /// Missing options take their defaults; unknown options are an error.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
