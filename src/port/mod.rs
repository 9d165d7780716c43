//! Port layer: the contract between the FSM core and the hardware.
//!
//! The FSMs never touch peripherals. They receive a device id at
//! construction and call one of the traits below; whatever implements the
//! trait owns the hardware records and looks them up by that id.
//!
//! ## Implementations
//!
//! - [`registry::PortRegistry`]: id-indexed atomic cells written by
//!   interrupt handlers and read by the polling loop. Also what the tests
//!   drive.
//! - [`hal`] (feature `hal`): `embedded-hal` pin/PWM adapters and an
//!   `embassy-time` clock.
//!
//! Reads are `&self` so guards can call them. Reads documented as
//! auto-clearing consume their event. Everything that drives an output or
//! clears an event on the poll side takes `&mut self` and is only called
//! from actions.

pub mod registry;

#[cfg(feature = "hal")]
pub mod hal;

use crate::colors::RgbColor;
use crate::error::Error;

/// Millisecond time base. Wraps around at `u32::MAX`.
pub trait Clock {
    fn millis(&self) -> u32;

    /// Milliseconds elapsed since `since`, wrap-safe.
    fn elapsed_since(&self, since: u32) -> u32 {
        self.millis().wrapping_sub(since)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn millis(&self) -> u32 {
        (**self).millis()
    }
}

/// Single push button.
pub trait ButtonPort: Clock {
    /// Fail if no button is registered under `id`.
    fn check_button(&self, _id: u32) -> Result<(), Error> {
        Ok(())
    }

    /// Raw (undebounced) level: `true` while pressed.
    fn read_pressed(&self, id: u32) -> bool;

    /// Drop the raw pressed flag latched by the edge interrupt.
    fn clear_pressed(&mut self, id: u32);
}

/// Row/column matrix keyboard.
pub trait KeyboardPort: Clock {
    /// Fail if no keyboard is registered under `id`.
    fn check_keyboard(&self, _id: u32) -> Result<(), Error> {
        Ok(())
    }

    /// Row scan deadline expired. Auto-clears on read.
    fn read_row_timeout(&self, id: u32) -> bool;

    /// A column line is asserted for the excited row.
    fn read_key_pressed(&self, id: u32) -> bool;

    /// Drive `row` high (all others low) and re-arm the scan deadline.
    fn excite_row(&mut self, id: u32, row: u8);

    /// Column whose interrupt raised the last key press.
    fn get_triggered_column(&self, id: u32) -> u8;

    /// Drive every row low and stop the scan deadline timer.
    fn stop_scan(&mut self, id: u32);
}

/// Snapshot of the echo input-capture registers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EchoCapture {
    /// Tick of the rising edge; 0 until one is captured.
    pub init_tick: u32,
    /// Tick of the falling edge.
    pub end_tick: u32,
    /// Falling edge captured: the echo pulse is complete.
    pub received: bool,
}

/// Ultrasonic transceiver with trigger, echo and measurement timers.
pub trait UltrasoundPort {
    /// Fail if no transceiver is registered under `id`.
    fn check_ultrasound(&self, _id: u32) -> Result<(), Error> {
        Ok(())
    }

    /// Measurement period elapsed; a new trigger pulse may start.
    fn read_trigger_ready(&self, id: u32) -> bool;

    /// Consume the ready flag, reset echo capture state, raise the trigger
    /// pin and start the trigger, echo and measurement timers.
    fn begin_trigger(&mut self, id: u32);

    /// Trigger pulse width has elapsed.
    fn read_trigger_ended(&self, id: u32) -> bool;

    /// Lower the trigger pin, stop the trigger timer and clear its flag.
    fn stop_trigger(&mut self, id: u32);

    fn read_echo_captured(&self, id: u32) -> EchoCapture;

    /// Echo timer update events since the rising edge.
    fn read_overflow_count(&self, id: u32) -> u32;

    fn clear_echo_received(&mut self, id: u32);

    /// Zero both captured ticks and the overflow count.
    fn reset_echo_ticks(&mut self, id: u32);

    /// Stop trigger, echo and measurement timers and lower the trigger pin.
    /// Leaves the ready flag raised so the next start triggers at once.
    fn stop_all_timers(&mut self, id: u32);
}

/// Color channel of an RGB PWM output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmChannel {
    Red,
    Green,
    Blue,
}

impl PwmChannel {
    pub const ALL: [PwmChannel; 3] = [PwmChannel::Red, PwmChannel::Green, PwmChannel::Blue];

    pub const fn index(self) -> usize {
        match self {
            PwmChannel::Red => 0,
            PwmChannel::Green => 1,
            PwmChannel::Blue => 2,
        }
    }
}

/// Three-channel PWM output (RGB LED).
pub trait PwmPort {
    /// Fail if no output is registered under `id`.
    fn check_output(&self, _id: u32) -> Result<(), Error> {
        Ok(())
    }

    /// Set one channel's duty cycle, `0..=COLOR_RGB_MAX_VALUE` of full scale.
    fn apply_pwm(&mut self, id: u32, channel: PwmChannel, duty: u8);

    /// Drive all three channels from `color`.
    fn apply_color(&mut self, id: u32, color: RgbColor) {
        self.apply_pwm(id, PwmChannel::Red, color.r);
        self.apply_pwm(id, PwmChannel::Green, color.g);
        self.apply_pwm(id, PwmChannel::Blue, color.b);
    }
}
