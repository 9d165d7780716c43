//! `embedded-hal` adapters for boards that poll pins directly.
//!
//! Each adapter serves one device id; every other id is rejected by the
//! matching `check_*` call so a miswired constructor fails early. Pin and
//! PWM errors are not propagated: a failed read counts as "not pressed"
//! and a failed duty write is dropped until the next action retries it.

use core::cell::RefCell;

use embassy_time::Instant;
use embedded_hal::digital::InputPin;
use embedded_hal::pwm::SetDutyCycle;

use super::{ButtonPort, Clock, PwmChannel, PwmPort};
use crate::colors::COLOR_RGB_MAX_VALUE;
use crate::error::Error;

/// Monotonic clock backed by the embassy time driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn millis(&self) -> u32 {
        // Truncation is the wrap the `Clock` contract expects.
        Instant::now().as_millis() as u32
    }
}

fn expect_id(own: u32, id: u32) -> Result<(), Error> {
    if own == id {
        Ok(())
    } else {
        Err(Error::UnknownDeviceId(id))
    }
}

/// Push button read from a GPIO input.
///
/// The pin is sampled on every guard evaluation; there is no edge latch
/// to clear.
pub struct PinButton<P, C> {
    id: u32,
    pin: RefCell<P>,
    active_low: bool,
    clock: C,
}

impl<P: InputPin, C: Clock> PinButton<P, C> {
    /// Button wired to ground with a pull-up (pressed reads low).
    pub fn active_low(id: u32, pin: P, clock: C) -> Self {
        Self {
            id,
            pin: RefCell::new(pin),
            active_low: true,
            clock,
        }
    }

    /// Button wired to supply with a pull-down (pressed reads high).
    pub fn active_high(id: u32, pin: P, clock: C) -> Self {
        Self {
            id,
            pin: RefCell::new(pin),
            active_low: false,
            clock,
        }
    }

    pub fn release(self) -> P {
        self.pin.into_inner()
    }
}

impl<P, C: Clock> Clock for PinButton<P, C> {
    fn millis(&self) -> u32 {
        self.clock.millis()
    }
}

impl<P: InputPin, C: Clock> ButtonPort for PinButton<P, C> {
    fn check_button(&self, id: u32) -> Result<(), Error> {
        expect_id(self.id, id)
    }

    fn read_pressed(&self, id: u32) -> bool {
        if id != self.id {
            return false;
        }
        let Ok(mut pin) = self.pin.try_borrow_mut() else {
            return false;
        };
        let level = if self.active_low {
            pin.is_low()
        } else {
            pin.is_high()
        };
        level.unwrap_or(false)
    }

    fn clear_pressed(&mut self, _id: u32) {}
}

/// RGB LED on three PWM channels.
pub struct PwmRgb<R, G, B> {
    id: u32,
    red: R,
    green: G,
    blue: B,
}

impl<R: SetDutyCycle, G: SetDutyCycle, B: SetDutyCycle> PwmRgb<R, G, B> {
    pub fn new(id: u32, red: R, green: G, blue: B) -> Self {
        Self {
            id,
            red,
            green,
            blue,
        }
    }

    pub fn release(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}

impl<R: SetDutyCycle, G: SetDutyCycle, B: SetDutyCycle> PwmPort for PwmRgb<R, G, B> {
    fn check_output(&self, id: u32) -> Result<(), Error> {
        expect_id(self.id, id)
    }

    fn apply_pwm(&mut self, id: u32, channel: PwmChannel, duty: u8) {
        if id != self.id {
            return;
        }
        let num = u16::from(duty);
        let denom = u16::from(COLOR_RGB_MAX_VALUE);
        let result = match channel {
            PwmChannel::Red => self.red.set_duty_cycle_fraction(num, denom).is_ok(),
            PwmChannel::Green => self.green.set_duty_cycle_fraction(num, denom).is_ok(),
            PwmChannel::Blue => self.blue.set_duty_cycle_fraction(num, denom).is_ok(),
        };
        if !result {
            warn!("pwm: duty write failed on output {}", id);
        }
    }
}
