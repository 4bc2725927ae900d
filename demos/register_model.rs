/// Register a small sequence model with K-FAC and report the factor sizes
use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use kfac_rs::modules::ForeignModule;
use kfac_rs::{KfacConfig, LayerRegistry, LstmCell, Module};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let device = Device::Cpu;
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

    let vocab_size = 1000;
    let hidden_size = 128;

    let model: Vec<(&str, Module)> = vec![
        ("embed", candle_nn::embedding(vocab_size, hidden_size, vb.pp("embed"))?.into()),
        ("rnn", LstmCell::new(hidden_size, hidden_size, true, vb.pp("rnn"))?.into()),
        ("dropout", Module::Other(ForeignModule::new("Dropout", vec![]))),
        ("decoder", candle_nn::linear(hidden_size, vocab_size, vb.pp("decoder"))?.into()),
    ];

    let config = KfacConfig::from_json(r#"{"damping": 0.003, "factor_decay": 0.95}"#)?;
    log::info!("K-FAC config: {:#?}", config);

    let mut registry = LayerRegistry::new(config)?.with_skip_layers(["embedding"]);
    registry.register_modules(model.iter().map(|(name, module)| (*name, module)))?;

    let mut total = 0;
    for entry in registry.layers() {
        let a = entry.layer.a_factor_shape();
        let g = entry.layer.g_factor_shape();
        total += a.numel() + g.numel();
        log::info!(
            "  - {:<16} {:<16} A: {:?}, G: {:?}",
            entry.name,
            entry.layer.name(),
            a,
            g
        );
    }
    log::info!("Factor storage: ~{:.2}M elements", total as f64 / 1_000_000.0);

    Ok(())
}
