//! Intensity-corrected RGB light.
//!
//! While active, every [`RgbLightFsm::set_color_intensity`] call is
//! applied on the next `fire`. Deactivating switches the output off; the
//! last corrected color is kept and restored on reactivation.

use crate::colors::{RgbColor, COLOR_OFF};
use crate::config::MAX_LEVEL_INTENSITY;
use crate::error::Error;
use crate::fsm::{Fsm, FsmState, Transition};
use crate::port::PwmPort;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RgbLightState {
    Idle,
    SetColor,
}

impl FsmState for RgbLightState {
    fn name(&self) -> &'static str {
        match self {
            RgbLightState::Idle => "IDLE_RGB",
            RgbLightState::SetColor => "SET_COLOR",
        }
    }
}

pub struct RgbLightContext<P> {
    port: P,
    id: u32,
    status: bool,
    new_color: bool,
    requested: RgbColor,
    intensity: u8,
    color: RgbColor,
}

fn is_active<P>(ctx: &RgbLightContext<P>) -> bool {
    ctx.status
}

fn is_inactive<P>(ctx: &RgbLightContext<P>) -> bool {
    !ctx.status
}

fn has_new_color<P>(ctx: &RgbLightContext<P>) -> bool {
    ctx.status && ctx.new_color
}

fn turn_on<P: PwmPort>(ctx: &mut RgbLightContext<P>) {
    ctx.port.apply_color(ctx.id, ctx.color);
}

fn apply_new_color<P: PwmPort>(ctx: &mut RgbLightContext<P>) {
    ctx.color = ctx.requested.scaled(ctx.intensity);
    ctx.new_color = false;
    ctx.port.apply_color(ctx.id, ctx.color);
    debug!("rgb light {}: color {}", ctx.id, ctx.color);
}

fn turn_off<P: PwmPort>(ctx: &mut RgbLightContext<P>) {
    ctx.port.apply_color(ctx.id, COLOR_OFF);
}

const NUM_TRANSITIONS: usize = 3;

fn transitions<P: PwmPort>() -> [Transition<RgbLightState, RgbLightContext<P>>; NUM_TRANSITIONS] {
    use RgbLightState::*;
    [
        Transition::new(Idle, is_active::<P>, SetColor, Some(turn_on::<P>)),
        Transition::new(SetColor, has_new_color::<P>, SetColor, Some(apply_new_color::<P>)),
        Transition::new(SetColor, is_inactive::<P>, Idle, Some(turn_off::<P>)),
    ]
}

/// RGB light bound to one PWM output id.
pub struct RgbLightFsm<P> {
    fsm: Fsm<RgbLightState, RgbLightContext<P>, NUM_TRANSITIONS>,
    ctx: RgbLightContext<P>,
}

impl<P: PwmPort> RgbLightFsm<P> {
    pub fn new(id: u32, port: P) -> Result<Self, Error> {
        port.check_output(id)?;
        let fsm = Fsm::new(RgbLightState::Idle, transitions::<P>())?;
        Ok(Self {
            fsm,
            ctx: RgbLightContext {
                port,
                id,
                status: false,
                new_color: false,
                requested: COLOR_OFF,
                intensity: MAX_LEVEL_INTENSITY,
                color: COLOR_OFF,
            },
        })
    }

    pub fn fire(&mut self) -> bool {
        self.fsm.fire(&mut self.ctx)
    }

    pub fn get_state(&self) -> RgbLightState {
        self.fsm.get_state()
    }

    pub fn set_state(&mut self, state: RgbLightState) {
        self.fsm.set_state(state);
    }

    pub fn inner_fsm(&self) -> &Fsm<RgbLightState, RgbLightContext<P>, NUM_TRANSITIONS> {
        &self.fsm
    }

    pub fn set_status(&mut self, status: bool) {
        self.ctx.status = status;
    }

    pub fn get_status(&self) -> bool {
        self.ctx.status
    }

    /// Queue `color` at `intensity` percent for the next `fire`.
    ///
    /// Intensities above [`MAX_LEVEL_INTENSITY`] are rejected and leave the
    /// current request untouched.
    pub fn set_color_intensity(&mut self, color: RgbColor, intensity: u8) -> Result<(), Error> {
        if intensity > MAX_LEVEL_INTENSITY {
            return Err(Error::InvalidIntensity(intensity));
        }
        self.ctx.requested = color;
        self.ctx.intensity = intensity;
        self.ctx.new_color = true;
        Ok(())
    }

    /// Last intensity-corrected color that was applied.
    pub fn get_color(&self) -> RgbColor {
        self.ctx.color
    }

    /// `true` while active with a color waiting to be applied.
    pub fn check_activity(&self) -> bool {
        self.ctx.status && self.ctx.new_color
    }
}
