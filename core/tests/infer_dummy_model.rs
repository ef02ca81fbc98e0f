use anyhow::{bail, Context, Result};
use approx::assert_abs_diff_eq;
use kws_harness::config::Config;
use kws_harness::inference::{Categories, DummyEngine, ModelWrapper, TensorShape};
use kws_harness::HarnessError;
use std::path::PathBuf;
use std::sync::Arc;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures")
}

fn load_fixture() -> Result<(Config, Arc<DummyEngine>)> {
    let config_path = fixtures().join("dummy_model.yaml");
    if !config_path.exists() {
        bail!("Missing test fixture at {}", config_path.display());
    }
    let config = Config::from_yaml_file(&config_path).context("Failed to load fixture config")?;
    let engine = Arc::new(DummyEngine::new(config.dummy.clone()));
    Ok((config, engine))
}

fn frame(value: f32) -> Vec<f32> {
    (0..80).map(|i| value + i as f32 * 0.001).collect()
}

#[test]
fn infer_dummy_model_outputs() -> Result<()> {
    let (_, engine) = load_fixture()?;
    let mut model = ModelWrapper::from_shared(engine.clone())?;

    assert_eq!(model.input_size(0)?, 80);
    assert_eq!(model.output_size(0)?, 31);
    assert_eq!(model.sink_output_size(0)?, 1);
    assert_eq!(model.input_shape(0)?, TensorShape::new(1, 1, 80));
    assert_eq!(model.output_shape(0)?, TensorShape::new(1, 1, 31));
    assert_eq!(model.sink_shape(0)?, TensorShape::vector(1));
    assert!(!model.is_steppable());
    assert_eq!(model.metadata("sample_rate").as_deref(), Some("16000"));
    assert_eq!(model.metadata("missing"), None);

    // Buffer exists at construction, before any predict.
    assert_eq!(model.output().len(), 31);

    let input = frame(0.5);
    let storage = {
        let output = model.predict(&input)?;
        assert_eq!(output.len(), 31);
        for (i, v) in output.iter().enumerate() {
            assert_abs_diff_eq!(*v, input[i], epsilon = 1e-6);
        }
        output.as_ptr()
    };

    for _ in 0..3 {
        let output = model.predict(&input)?;
        assert_eq!(output.len(), 31);
        assert_eq!(output.as_ptr(), storage);
    }
    assert_eq!(engine.predict_calls(), 4);

    let view = model.output_view()?;
    assert_eq!(view.shape(), &[1, 1, 31]);

    Ok(())
}

#[test]
fn reset_clears_recurrent_history() -> Result<()> {
    let (_, engine) = load_fixture()?;
    let mut model = ModelWrapper::from_shared(engine.clone())?;
    let input = frame(0.25);

    let first = model.predict_to_vec(&input)?;
    let second = model.predict_to_vec(&input)?;
    assert!(first
        .iter()
        .zip(&second)
        .any(|(a, b)| (a - b).abs() > 1e-3));

    model.reset();
    model.reset();
    let after_reset = model.predict_to_vec(&input)?;
    for (a, b) in first.iter().zip(&after_reset) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
    }
    assert_eq!(engine.reset_calls(), 2);
    assert_eq!(model.output().len(), 31);

    Ok(())
}

#[test]
fn size_mismatch_never_reaches_engine() -> Result<()> {
    let (_, engine) = load_fixture()?;
    let mut model = ModelWrapper::from_shared(engine.clone())?;

    for len in [0, 79, 81] {
        let err = model.predict(&vec![1.0; len]).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::SizeMismatch { expected: 80, actual } if actual == len
        ));
    }
    assert_eq!(engine.predict_calls(), 0);
    assert_eq!(model.sink_callbacks(), 0);
    assert!(model.output().iter().all(|&v| v == 0.0));

    Ok(())
}

#[test]
fn categories_label_the_top_score() -> Result<()> {
    let (config, engine) = load_fixture()?;
    let mut model = ModelWrapper::from_shared(engine)?;

    let path = fixtures().join(
        config
            .model
            .categories
            .as_ref()
            .context("fixture names a categories file")?,
    );
    let categories = Categories::from_file(&path)?;
    categories.validate(model.output_size(0)?)?;

    // Echo engine: the largest input among the first 31 wins.
    let mut input = vec![0.0f32; 80];
    input[29] = 0.9;
    let scores = model.predict(&input)?;
    let prediction = categories.classify(scores).context("no prediction")?;
    assert_eq!(prediction.index, 29);
    assert_eq!(prediction.label, "yes");
    assert_abs_diff_eq!(prediction.score, 0.9, epsilon = 1e-6);

    Ok(())
}
