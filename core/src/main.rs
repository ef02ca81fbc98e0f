//! CLI entry point for kws-harness.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kws_harness::cli::{Cli, Commands, EngineKind};
use kws_harness::config::Config;
use kws_harness::inference::{Categories, DummyEngine, InferenceEngine, ModelWrapper, PortKind};
use kws_harness::input::InputFrame;
use kws_harness::timing::{CycleCounter, HostCycleRegister, Stopwatch};

/// Get the enabled features.
fn enabled_features() -> &'static str {
    if cfg!(feature = "linked-engine") {
        "linked-engine"
    } else {
        "dummy"
    }
}

fn open_engine(kind: EngineKind, config: &Config) -> Result<Arc<dyn InferenceEngine>> {
    match kind {
        EngineKind::Dummy => Ok(Arc::new(DummyEngine::new(config.dummy.clone()))),
        #[cfg(feature = "linked-engine")]
        EngineKind::Linked => Ok(Arc::new(kws_harness::inference::LinkedEngine::new(
            config.model.ports,
        ))),
        #[cfg(not(feature = "linked-engine"))]
        EngineKind::Linked => {
            bail!("No model linked into this build; rebuild with --features linked-engine")
        }
    }
}

fn load_categories(config: &Config, model: &ModelWrapper) -> Result<Option<Categories>> {
    let Some(path) = &config.model.categories else {
        return Ok(None);
    };
    let categories = Categories::from_file(path)
        .with_context(|| format!("Failed to load categories: {}", path.display()))?;
    categories.validate(model.output_size(0)?)?;
    Ok(Some(categories))
}

fn summarize(values: &[f64]) -> Value {
    if values.is_empty() {
        return Value::Null;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    serde_json::json!({ "min": min, "mean": mean, "max": max })
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load optional config
    let config = if let Some(config_path) = &cli.config {
        Config::from_yaml_file(config_path)
            .with_context(|| format!("Failed to load config: {}", config_path.display()))?
    } else {
        Config::default()
    };

    // Initialize logging; RUST_LOG wins over the config level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let engine = open_engine(cli.engine, &config)?;
    info!("Using engine: {:?} ({})", cli.engine, enabled_features());
    let mut model = ModelWrapper::from_shared(engine)?;

    match cli.command {
        Commands::Info { metadata } => {
            let ports = [PortKind::Input, PortKind::Output, PortKind::Sink]
                .iter()
                .flat_map(|&kind| {
                    (0..model.port_count(kind)).map(move |index| (kind, index))
                })
                .map(|(kind, index)| -> kws_harness::Result<Value> {
                    let port = model.port(kws_harness::Port { kind, index })?;
                    Ok(serde_json::json!({
                        "kind": kind,
                        "index": index,
                        "size": port.size,
                        "shape": port.shape,
                    }))
                })
                .collect::<kws_harness::Result<Vec<Value>>>()?;

            let metadata: serde_json::Map<String, Value> = metadata
                .into_iter()
                .map(|key| {
                    let value = model.metadata(&key).map(Value::String).unwrap_or(Value::Null);
                    (key, value)
                })
                .collect();

            let output = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "features": enabled_features(),
                "steppable": model.is_steppable(),
                "ports": ports,
                "metadata": metadata,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Predict { input, format } => {
            let categories = load_categories(&config, &model)?;

            // Load input data; expected format: { "data": [...] }
            info!("Loading input: {}", input.display());
            let frame = InputFrame::from_json_file(&input)
                .with_context(|| format!("Failed to load input: {}", input.display()))?;

            // Run inference
            info!("Running inference...");
            let mut timer = Stopwatch::new();
            timer.start();
            let scores = model.predict_to_vec(&frame.data)?;
            timer.stop()?;
            let latency_ms = timer.milliseconds()?;

            info!(
                "Inference complete: {} scores in {:.3}ms",
                scores.len(),
                latency_ms
            );

            let prediction = categories.as_ref().and_then(|c| c.classify(&scores));
            let output = serde_json::json!({
                "latency_ms": latency_ms,
                "scores": scores,
                "prediction": prediction,
                "sink_callbacks": model.sink_callbacks(),
                "sink_values": model.last_sink_values(),
            });

            if format == "pretty" {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", serde_json::to_string(&output)?);
            }
        }

        Commands::Bench { iterations } => {
            let iterations = iterations.unwrap_or(config.bench.iterations);
            if iterations == 0 {
                bail!("Benchmark needs at least one iteration");
            }
            let input = vec![0.0f32; model.input_size(0)?];

            for _ in 0..config.bench.warmup {
                model.predict(&input)?;
            }
            model.reset();

            let mut timer = Stopwatch::new();
            let mut cycles = CycleCounter::new(HostCycleRegister::new(config.bench.cpu_hz));
            cycles.enable();

            let mut latencies = Vec::with_capacity(iterations);
            let mut counts = Vec::with_capacity(iterations);
            for _ in 0..iterations {
                timer.start();
                cycles.start();
                model.predict(&input)?;
                counts.push(cycles.stop()? as f64);
                timer.stop()?;
                latencies.push(timer.milliseconds()?);
            }
            cycles.disable();

            let output = serde_json::json!({
                "iterations": iterations,
                "warmup": config.bench.warmup,
                "cpu_hz": config.bench.cpu_hz,
                "latency_ms": summarize(&latencies),
                "cycles": summarize(&counts),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
