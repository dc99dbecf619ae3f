//! Fatal-error diagnostics.
//!
//! Setup failures have no recovery path: the board blinks the status
//! indicator with a count identifying the failure category, forever, until
//! it is power-cycled.

use embedded_hal::delay::DelayNs;

use crate::traits::StatusIndicator;

const BLINK_ON_MS: u32 = 500;
const BLINK_OFF_MS: u32 = 500;
const CYCLE_PAUSE_MS: u32 = 1000;

/// Failure category, distinguished by blink count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultCode {
    /// Bus transport setup failed.
    BusInit,
    /// Downstream device setup failed.
    DeviceInit,
}

impl FaultCode {
    pub const fn blinks(&self) -> u32 {
        match self {
            Self::BusInit => 2,
            Self::DeviceInit => 3,
        }
    }
}

/// Enters the diagnostic blink loop and never returns.
pub fn fatal<S, D>(status: &mut S, delay: &mut D, code: FaultCode) -> !
where
    S: StatusIndicator,
    D: DelayNs,
{
    log::error!("Fatal: {:?}, blinking {} times", code, code.blinks());
    loop {
        blink_cycle(status, delay, code.blinks());
    }
}

/// One blink cycle: `blinks` on/off pulses followed by a pause.
pub fn blink_cycle<S, D>(status: &mut S, delay: &mut D, blinks: u32)
where
    S: StatusIndicator,
    D: DelayNs,
{
    for _ in 0..blinks {
        status.on();
        delay.delay_ms(BLINK_ON_MS);
        status.off();
        delay.delay_ms(BLINK_OFF_MS);
    }
    delay.delay_ms(CYCLE_PAUSE_MS);
}
