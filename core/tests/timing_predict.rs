use anyhow::Result;
use kws_harness::inference::{DummyEngine, ModelWrapper};
use kws_harness::timing::{CycleCounter, HostCycleRegister, LazyTimer, Stopwatch};
use kws_harness::HarnessError;

#[test]
fn stopwatch_and_cycles_bracket_predict() -> Result<()> {
    let mut model = ModelWrapper::new(DummyEngine::default())?;
    let input = vec![0.2f32; model.input_size(0)?];

    let mut timer = Stopwatch::new();
    let mut cycles = CycleCounter::new(HostCycleRegister::new(216_000_000));
    assert!(matches!(timer.milliseconds(), Err(HarnessError::TimerNotStarted)));
    assert!(matches!(cycles.count(), Err(HarnessError::TimerNotStarted)));

    cycles.enable();
    timer.start();
    cycles.start();
    assert!(timer.started());
    let output = model.predict(&input)?;
    assert_eq!(output.len(), 31);
    let count = cycles.stop()?;
    timer.stop()?;
    assert!(!timer.started());

    let elapsed = timer.elapsed()?;
    assert!(timer.milliseconds()? >= 0.0);
    assert_eq!(cycles.count()?, count);

    // Stopped reads are stable.
    std::thread::sleep(std::time::Duration::from_millis(1));
    assert_eq!(timer.elapsed()?, elapsed);

    Ok(())
}

#[test]
fn lazy_timer_measures_from_first_read() {
    let mut timer = LazyTimer::new();
    let first = timer.milliseconds();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let later = timer.milliseconds();
    assert_eq!(first, 0.0);
    assert!(later >= 2.0);
}
