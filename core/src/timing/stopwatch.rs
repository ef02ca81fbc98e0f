//! Wall-clock timers over a monotonic tick source.

use std::time::{Duration, Instant};

use crate::error::{HarnessError, Result};

/// Monotonic tick source.
pub trait TickSource {
    /// Prepare the underlying counter. Called once before the first read.
    fn init(&mut self) {}

    /// Current tick count. Never decreases.
    fn read(&self) -> u64;

    /// Tick rate.
    fn ticks_per_second(&self) -> u64;
}

/// Microsecond ticks from [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTicks {
    origin: Instant,
}

impl MonotonicTicks {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicTicks {
    fn read(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    fn ticks_per_second(&self) -> u64 {
        1_000_000
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle,
    Running { start: u64 },
    Stopped { start: u64, end: u64 },
}

/// Start/stop timer.
///
/// Reading a running stopwatch samples the end live ("elapsed so far").
/// Reading before the first [`start`](Self::start) fails with
/// [`HarnessError::TimerNotStarted`].
#[derive(Debug, Clone)]
pub struct Stopwatch<T: TickSource = MonotonicTicks> {
    source: T,
    state: TimerState,
}

impl Stopwatch<MonotonicTicks> {
    pub fn new() -> Self {
        Self::with_source(MonotonicTicks::new())
    }
}

impl Default for Stopwatch<MonotonicTicks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TickSource> Stopwatch<T> {
    /// Build a stopwatch over a tick source, initializing the source.
    pub fn with_source(mut source: T) -> Self {
        source.init();
        Self {
            source,
            state: TimerState::Idle,
        }
    }

    /// Start a new interval, discarding any previous one.
    pub fn start(&mut self) {
        self.state = TimerState::Running {
            start: self.source.read(),
        };
    }

    /// Close the running interval. Stopping a stopped stopwatch keeps the
    /// recorded interval.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            TimerState::Idle => Err(HarnessError::TimerNotStarted),
            TimerState::Running { start } => {
                self.state = TimerState::Stopped {
                    start,
                    end: self.source.read(),
                };
                Ok(())
            }
            TimerState::Stopped { .. } => Ok(()),
        }
    }

    /// True strictly between `start` and `stop`.
    pub fn started(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    /// Elapsed ticks of the current or last interval.
    pub fn elapsed_ticks(&self) -> Result<u64> {
        match self.state {
            TimerState::Idle => Err(HarnessError::TimerNotStarted),
            TimerState::Running { start } => Ok(self.source.read().saturating_sub(start)),
            TimerState::Stopped { start, end } => Ok(end.saturating_sub(start)),
        }
    }

    pub fn seconds(&self) -> Result<f64> {
        let ticks = self.elapsed_ticks()?;
        Ok(ticks as f64 / self.source.ticks_per_second() as f64)
    }

    pub fn milliseconds(&self) -> Result<f64> {
        Ok(self.seconds()? * 1000.0)
    }

    pub fn elapsed(&self) -> Result<Duration> {
        let ticks = self.elapsed_ticks()?;
        let rate = self.source.ticks_per_second();
        let nanos = ticks as u128 * 1_000_000_000 / rate as u128;
        Ok(Duration::from_nanos(nanos as u64))
    }

    pub fn source(&self) -> &T {
        &self.source
    }
}

/// Timer whose origin is pinned by the first read after construction or
/// [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct LazyTimer<T: TickSource = MonotonicTicks> {
    source: T,
    origin: Option<u64>,
}

impl LazyTimer<MonotonicTicks> {
    pub fn new() -> Self {
        Self::with_source(MonotonicTicks::new())
    }
}

impl Default for LazyTimer<MonotonicTicks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TickSource> LazyTimer<T> {
    pub fn with_source(mut source: T) -> Self {
        source.init();
        Self {
            source,
            origin: None,
        }
    }

    /// Forget the origin; the next read pins a new one.
    pub fn reset(&mut self) {
        self.origin = None;
    }

    /// Milliseconds since the origin. The first read returns zero.
    pub fn milliseconds(&mut self) -> f64 {
        let now = self.source.read();
        let origin = *self.origin.get_or_insert(now);
        now.saturating_sub(origin) as f64 * 1000.0 / self.source.ticks_per_second() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Millisecond ticks advanced by hand.
    #[derive(Clone, Default)]
    struct ManualTicks {
        now: Rc<Cell<u64>>,
        inits: Rc<Cell<u32>>,
    }

    impl ManualTicks {
        fn advance(&self, ticks: u64) {
            self.now.set(self.now.get() + ticks);
        }
    }

    impl TickSource for ManualTicks {
        fn init(&mut self) {
            self.inits.set(self.inits.get() + 1);
        }

        fn read(&self) -> u64 {
            self.now.get()
        }

        fn ticks_per_second(&self) -> u64 {
            1000
        }
    }

    #[test]
    fn test_idle_reads_fail() {
        let ticks = ManualTicks::default();
        let mut watch = Stopwatch::with_source(ticks.clone());
        assert_eq!(ticks.inits.get(), 1);
        assert!(!watch.started());
        assert!(matches!(
            watch.milliseconds(),
            Err(HarnessError::TimerNotStarted)
        ));
        assert!(watch.elapsed().is_err());
        assert!(watch.stop().is_err());
    }

    #[test]
    fn test_started_between_start_and_stop() {
        let ticks = ManualTicks::default();
        let mut watch = Stopwatch::with_source(ticks.clone());

        watch.start();
        assert!(watch.started());
        ticks.advance(250);
        watch.stop().unwrap();
        assert!(!watch.started());

        ticks.advance(1000);
        assert_abs_diff_eq!(watch.milliseconds().unwrap(), 250.0);
        assert_abs_diff_eq!(watch.seconds().unwrap(), 0.25);
        assert_eq!(watch.elapsed().unwrap(), Duration::from_millis(250));

        // A second stop keeps the recorded interval.
        watch.stop().unwrap();
        assert_eq!(watch.elapsed_ticks().unwrap(), 250);
    }

    #[test]
    fn test_running_read_is_live() {
        let ticks = ManualTicks::default();
        let mut watch = Stopwatch::with_source(ticks.clone());
        watch.start();
        ticks.advance(10);
        assert_eq!(watch.elapsed_ticks().unwrap(), 10);
        ticks.advance(5);
        assert_eq!(watch.elapsed_ticks().unwrap(), 15);
    }

    #[test]
    fn test_restart_discards_previous_interval() {
        let ticks = ManualTicks::default();
        let mut watch = Stopwatch::with_source(ticks.clone());
        watch.start();
        ticks.advance(100);
        watch.stop().unwrap();

        watch.start();
        ticks.advance(7);
        watch.stop().unwrap();
        assert_eq!(watch.elapsed_ticks().unwrap(), 7);
    }

    #[test]
    fn test_monotonic_stopwatch() {
        let mut watch = Stopwatch::new();
        watch.start();
        std::thread::sleep(Duration::from_millis(2));
        watch.stop().unwrap();
        assert!(watch.milliseconds().unwrap() >= 2.0);
    }

    #[test]
    fn test_lazy_timer_pins_origin_on_first_read() {
        let ticks = ManualTicks::default();
        ticks.advance(40);
        let mut timer = LazyTimer::with_source(ticks.clone());

        assert_abs_diff_eq!(timer.milliseconds(), 0.0);
        ticks.advance(12);
        assert_abs_diff_eq!(timer.milliseconds(), 12.0);

        timer.reset();
        ticks.advance(3);
        assert_abs_diff_eq!(timer.milliseconds(), 0.0);
        ticks.advance(1);
        assert_abs_diff_eq!(timer.milliseconds(), 1.0);
    }
}
