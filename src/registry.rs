/// Registration of a model's layers with K-FAC
///
/// Walks the named modules of a model and keeps a (layer, wrapper) entry for
/// every module K-FAC should precondition.
use crate::layers::{get_kfac_layers, KfacLayer, KNOWN_MODULES};
use crate::modules::{module_requires_grad, Module};
use crate::{KfacConfig, KfacError, Result};

/// A layer registered with K-FAC
#[derive(Debug, Clone)]
pub struct RegisteredLayer {
    /// Module name; sub-layers of an LSTM cell get a `.linear_ih` / `.linear_hh` suffix
    pub name: String,
    pub module: Module,
    pub layer: KfacLayer,
}

/// Ordered collection of registered K-FAC layers
///
/// Layer names are unique; registering a name twice is an error.
#[derive(Debug)]
pub struct LayerRegistry {
    config: KfacConfig,
    skip_layers: Vec<String>,
    layers: Vec<RegisteredLayer>,
}

impl LayerRegistry {
    /// Create new registry
    ///
    /// # Arguments
    /// * `config` - Options forwarded to every wrapper
    pub fn new(config: KfacConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            skip_layers: Vec::new(),
            layers: Vec::new(),
        })
    }

    /// Skip modules whose name or type name matches one of `skip_layers`
    ///
    /// Type names are compared case-insensitively, module names exactly.
    pub fn with_skip_layers<I, S>(mut self, skip_layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_layers = skip_layers.into_iter().map(Into::into).collect();
        self
    }

    fn is_skipped(&self, name: &str, module: &Module) -> bool {
        let type_name = module.type_name().to_lowercase();
        self.skip_layers
            .iter()
            .any(|skip| skip == name || skip.to_lowercase() == type_name)
    }

    /// Register a single named module
    ///
    /// # Returns
    /// Number of K-FAC layers added (0 if the module was skipped)
    pub fn register_module(&mut self, name: &str, module: &Module) -> Result<usize> {
        let type_name = module.type_name().to_lowercase();

        if !KNOWN_MODULES.contains(&type_name.as_str()) {
            log::debug!("Skipping {} ({}): not a K-FAC module", name, module.type_name());
            return Ok(0);
        }
        if self.is_skipped(name, module) {
            log::debug!("Skipping {} ({}): in skip_layers", name, module.type_name());
            return Ok(0);
        }
        if !module_requires_grad(module) {
            log::debug!("Skipping {} ({}): parameters do not require grad", name, module.type_name());
            return Ok(0);
        }

        let pairs = get_kfac_layers(module, &self.config)?;
        let count = pairs.len();
        let names: Vec<String> = if count > 1 {
            ["linear_ih", "linear_hh"]
                .iter()
                .map(|suffix| format!("{}.{}", name, suffix))
                .collect()
        } else {
            vec![name.to_string()]
        };

        if let Some(dup) = names.iter().find(|n| self.contains(n)) {
            return Err(KfacError::Config(format!("layer {} is already registered", dup)));
        }

        for ((sub_module, layer), name) in pairs.into_iter().zip(names) {
            log::debug!(
                "Registered {} as {} (A: {:?}, G: {:?})",
                name,
                layer.name(),
                layer.a_factor_shape(),
                layer.g_factor_shape()
            );
            self.layers.push(RegisteredLayer {
                name,
                module: sub_module,
                layer,
            });
        }

        Ok(count)
    }

    /// Register every eligible module of a model
    ///
    /// # Arguments
    /// * `modules` - (name, module) pairs in model order
    ///
    /// # Returns
    /// Number of K-FAC layers added
    pub fn register_modules<'a, I>(&mut self, modules: I) -> Result<usize>
    where
        I: IntoIterator<Item = (&'a str, &'a Module)>,
    {
        let mut added = 0;
        for (name, module) in modules {
            added += self.register_module(name, module)?;
        }

        log::info!("Registered {} K-FAC layers ({} total)", added, self.layers.len());

        Ok(added)
    }

    pub fn config(&self) -> &KfacConfig {
        &self.config
    }

    pub fn layers(&self) -> &[RegisteredLayer] {
        &self.layers
    }

    /// Whether a layer with this name has been registered
    pub fn contains(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name == name)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
