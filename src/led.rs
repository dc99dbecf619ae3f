//! Status LED support: an `embedded-hal` pin adapter and the application
//! heartbeat.

use embedded_hal::digital::OutputPin;

use crate::traits::StatusIndicator;

/// Whether the LED is driven active-high or active-low on the board wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveLevel {
    High,
    Low,
}

/// LED on a plain output pin, tracking its own logical state so `toggle`
/// works without a readable pin.
pub struct Led<PIN: OutputPin> {
    pin: PIN,
    active: ActiveLevel,
    is_on: bool,
}

impl<PIN: OutputPin> Led<PIN> {
    /// Wraps a pin, driving the LED off.
    pub fn new(mut pin: PIN, active: ActiveLevel) -> Self {
        match active {
            ActiveLevel::High => pin.set_low().ok(),
            ActiveLevel::Low => pin.set_high().ok(),
        };
        Self {
            pin,
            active,
            is_on: false,
        }
    }

    pub fn active_high(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::High)
    }

    pub fn active_low(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::Low)
    }

    fn set(&mut self, on: bool) {
        match (self.active, on) {
            (ActiveLevel::High, true) | (ActiveLevel::Low, false) => self.pin.set_high().ok(),
            (ActiveLevel::High, false) | (ActiveLevel::Low, true) => self.pin.set_low().ok(),
        };
        self.is_on = on;
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn free(self) -> PIN {
        self.pin
    }
}

impl<PIN: OutputPin> StatusIndicator for Led<PIN> {
    fn on(&mut self) {
        self.set(true);
    }

    fn off(&mut self) {
        self.set(false);
    }

    fn toggle(&mut self) {
        self.set(!self.is_on);
    }
}

/// Toggles a status indicator once every `period` ticks.
///
/// The application loop calls [`tick`](Self::tick) once per iteration; the
/// loop's own sleep sets the blink rate.
pub struct Heartbeat {
    period: u32,
    count: u32,
}

impl Heartbeat {
    pub fn new(period: u32) -> Self {
        Self { period, count: 0 }
    }

    pub fn tick<S: StatusIndicator>(&mut self, status: &mut S) {
        self.count += 1;
        if self.count >= self.period {
            status.toggle();
            self.count = 0;
        }
    }
}
