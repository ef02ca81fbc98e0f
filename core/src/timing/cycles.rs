//! Hardware cycle counting.
//!
//! The counter is 32 bits wide and wraps silently: at 100 MHz an interval
//! longer than about 42.9 s reads modulo 2^32. No overflow is detected.

use std::time::Instant;

use crate::error::{HarnessError, Result};

/// A free-running cycle count register.
pub trait CycleRegister {
    fn enable(&mut self);
    fn disable(&mut self);
    /// Set the count to zero.
    fn reset(&mut self);
    fn read(&self) -> u32;
}

/// Start/stop cycle counter over a [`CycleRegister`].
#[derive(Debug)]
pub struct CycleCounter<R: CycleRegister> {
    register: R,
    running: bool,
    count: Option<u32>,
}

impl<R: CycleRegister> CycleCounter<R> {
    pub fn new(register: R) -> Self {
        Self {
            register,
            running: false,
            count: None,
        }
    }

    /// Let the register count.
    pub fn enable(&mut self) {
        self.register.enable();
    }

    /// Freeze the register.
    pub fn disable(&mut self) {
        self.register.disable();
    }

    /// Zero the register and begin an interval.
    pub fn start(&mut self) {
        self.register.reset();
        self.running = true;
    }

    /// Snapshot the register and return the count.
    pub fn stop(&mut self) -> Result<u32> {
        if !self.running {
            return Err(HarnessError::TimerNotStarted);
        }
        let count = self.register.read();
        self.running = false;
        self.count = Some(count);
        Ok(count)
    }

    /// Last snapshot taken by [`stop`](Self::stop).
    pub fn count(&self) -> Result<u32> {
        self.count.ok_or(HarnessError::TimerNotStarted)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn register(&self) -> &R {
        &self.register
    }
}

/// Cycle register synthesized from the host's monotonic clock at a nominal
/// core frequency.
#[derive(Debug, Clone)]
pub struct HostCycleRegister {
    hz: u64,
    origin: Instant,
    enabled: bool,
    frozen: u64,
}

impl HostCycleRegister {
    pub fn new(hz: u64) -> Self {
        Self {
            hz,
            origin: Instant::now(),
            enabled: false,
            frozen: 0,
        }
    }

    pub fn hz(&self) -> u64 {
        self.hz
    }

    fn live(&self) -> u64 {
        let nanos = self.origin.elapsed().as_nanos();
        (nanos * self.hz as u128 / 1_000_000_000) as u64
    }
}

impl CycleRegister for HostCycleRegister {
    fn enable(&mut self) {
        if !self.enabled {
            // Resume from the frozen count.
            self.origin = Instant::now();
            self.enabled = true;
        }
    }

    fn disable(&mut self) {
        if self.enabled {
            self.frozen = self.frozen.wrapping_add(self.live());
            self.enabled = false;
        }
    }

    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frozen = 0;
    }

    fn read(&self) -> u32 {
        let total = if self.enabled {
            self.frozen.wrapping_add(self.live())
        } else {
            self.frozen
        };
        total as u32
    }
}

/// Cortex-M DWT cycle counter.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use dwt::DwtCycleRegister;

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod dwt {
    use super::CycleRegister;
    use core::ptr::{read_volatile, write_volatile};

    const DEMCR: *mut u32 = 0xE000_EDFC as *mut u32;
    const DEMCR_TRCENA: u32 = 1 << 24;
    const DWT_CTRL: *mut u32 = 0xE000_1000 as *mut u32;
    const DWT_CTRL_CYCCNTENA: u32 = 1;
    const DWT_CYCCNT: *mut u32 = 0xE000_1004 as *mut u32;

    /// The core's `DWT->CYCCNT` register.
    #[derive(Debug)]
    pub struct DwtCycleRegister {
        _private: (),
    }

    impl DwtCycleRegister {
        /// # Safety
        ///
        /// Must run on a Cortex-M3/M4/M7 core with a DWT unit, and only one
        /// instance may drive the register at a time.
        pub unsafe fn new() -> Self {
            Self { _private: () }
        }
    }

    impl CycleRegister for DwtCycleRegister {
        fn enable(&mut self) {
            unsafe {
                write_volatile(DEMCR, read_volatile(DEMCR) | DEMCR_TRCENA);
                write_volatile(DWT_CTRL, read_volatile(DWT_CTRL) | DWT_CTRL_CYCCNTENA);
            }
        }

        fn disable(&mut self) {
            unsafe { write_volatile(DWT_CTRL, read_volatile(DWT_CTRL) & !DWT_CTRL_CYCCNTENA) }
        }

        fn reset(&mut self) {
            unsafe { write_volatile(DWT_CYCCNT, 0) }
        }

        fn read(&self) -> u32 {
            unsafe { read_volatile(DWT_CYCCNT) }
        }
    }
}
