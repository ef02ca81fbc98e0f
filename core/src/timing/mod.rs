//! Timing instruments for bracketing `predict` calls.
//!
//! Both instruments are independent of the model wrapper.

mod cycles;
mod stopwatch;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use cycles::DwtCycleRegister;
pub use cycles::{CycleCounter, CycleRegister, HostCycleRegister};
pub use stopwatch::{LazyTimer, MonotonicTicks, Stopwatch, TickSource};
