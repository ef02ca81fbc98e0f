//! Edge-triggered button polling.

use std::ops::{BitOr, BitOrAssign};

/// Sampled pin level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// The two user buttons.
pub trait ButtonPins {
    /// Configure both pins as inputs.
    fn init(&mut self) {}

    fn read_a(&mut self) -> Level;

    fn read_b(&mut self) -> Level;
}

/// Buttons that went from high to low since the previous poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonEvents(u8);

impl ButtonEvents {
    pub const NONE: Self = Self(0);
    pub const BUTTON_A: Self = Self(1);
    pub const BUTTON_B: Self = Self(2);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ButtonEvents {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ButtonEvents {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Polls two buttons and reports press transitions.
#[derive(Debug)]
pub struct ButtonManager<P: ButtonPins> {
    pins: P,
    last_a: Level,
    last_b: Level,
}

impl<P: ButtonPins> ButtonManager<P> {
    /// Initialize the pins and sample their starting levels.
    pub fn new(mut pins: P) -> Self {
        pins.init();
        let last_a = pins.read_a();
        let last_b = pins.read_b();
        Self {
            pins,
            last_a,
            last_b,
        }
    }

    /// Sample both pins once. Holding a button reports it only once.
    pub fn read(&mut self) -> ButtonEvents {
        let a = self.pins.read_a();
        let b = self.pins.read_b();

        let mut events = ButtonEvents::NONE;
        if a == Level::Low && self.last_a == Level::High {
            events |= ButtonEvents::BUTTON_A;
        }
        if b == Level::Low && self.last_b == Level::High {
            events |= ButtonEvents::BUTTON_B;
        }

        self.last_a = a;
        self.last_b = b;
        events
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }
}
