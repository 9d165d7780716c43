//! Parking-assist control core.
//!
//! Table-driven state machines for a vehicle parking-assist unit:
//!
//! - [`button`]: debounced arm/disarm push button with press duration
//! - [`keyboard`]: row/column matrix keyboard scan with debounce
//! - [`ultrasound`]: ultrasonic ranging with tick-overflow handling and a
//!   5-sample batch median
//! - [`rgb_light`] / [`display`]: RGB outputs, the display colored by
//!   distance band
//!
//! Every machine is an [`fsm::Fsm`] plus a context, stepped by calling
//! `fire()` from a polling loop. Hardware is reached only through the
//! [`port`] traits, so the whole crate runs on the host under
//! `cargo test` with [`port::registry`] standing in for interrupts.
//!
//! Features: `defmt` (logging and `Format` derives), `hal`
//! (`embedded-hal` / `embassy-time` port adapters).

#![cfg_attr(not(test), no_std)]

// Must come first: the logging macros are textually scoped.
#[macro_use]
mod fmt;

pub mod button;
pub mod colors;
pub mod config;
pub mod display;
pub mod error;
pub mod fsm;
pub mod keyboard;
pub mod median;
pub mod port;
pub mod rgb_light;
pub mod ultrasound;

pub use button::{ButtonFsm, ButtonState};
pub use colors::RgbColor;
pub use display::{DisplayFsm, DisplayState, DistanceBand};
pub use error::Error;
pub use fsm::{Fsm, FsmState, Transition};
pub use keyboard::{KeyboardFsm, KeyboardLayout, KeyboardState, STANDARD_KEYBOARD};
pub use rgb_light::{RgbLightFsm, RgbLightState};
pub use ultrasound::{UltrasoundConfig, UltrasoundFsm, UltrasoundState};

// ═══════════════════════════════════════════════════════════════════════════
// Crate-level checks
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::config::*;
    use super::Error;

    #[test]
    fn display_bands_are_ordered() {
        assert!(DANGER_MIN_CM < WARNING_MIN_CM);
        assert!(WARNING_MIN_CM < NO_PROBLEM_MIN_CM);
        assert!(NO_PROBLEM_MIN_CM < INFO_MIN_CM);
        assert!(INFO_MIN_CM < OK_MIN_CM);
        assert!(OK_MIN_CM < OK_MAX_CM);
    }

    #[test]
    fn median_batch_is_odd() {
        assert_eq!(ULTRASOUND_NUM_MEASUREMENTS % 2, 1);
    }

    #[test]
    fn rgb_outputs_have_distinct_ids() {
        assert_ne!(PORT_RGB_LIGHT_ID, PORT_REAR_PARKING_DISPLAY_ID);
    }

    #[test]
    fn errors_render_their_payload() {
        assert_eq!(
            Error::UnknownDeviceId(7).to_string(),
            "no device registered with id 7"
        );
        assert_eq!(
            Error::InvalidIntensity(120).to_string(),
            "intensity 120 out of range"
        );
        assert_eq!(
            Error::EmptyTransitionTable.to_string(),
            "transition table is empty"
        );
    }
}
