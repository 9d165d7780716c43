//! Parking distance display: an RGB LED colored by distance band.

use crate::colors::{
    RgbColor, COLOR_BLUE, COLOR_GREEN, COLOR_OFF, COLOR_RED, COLOR_TURQUOISE, COLOR_YELLOW,
};
use crate::config::{INFO_MIN_CM, NO_PROBLEM_MIN_CM, OK_MAX_CM, OK_MIN_CM, WARNING_MIN_CM};
use crate::error::Error;
use crate::fsm::{Fsm, FsmState, Transition};
use crate::port::PwmPort;

/// Distance range shown by one display color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DistanceBand {
    Danger,
    Warning,
    NoProblem,
    Info,
    Ok,
    OutOfRange,
}

impl DistanceBand {
    /// Band of `distance_cm`. Lower bounds are inclusive; only the last
    /// band also includes its upper bound.
    pub fn from_distance(distance_cm: Option<u32>) -> Self {
        match distance_cm {
            Some(d) if d > OK_MAX_CM => DistanceBand::OutOfRange,
            Some(d) if d >= OK_MIN_CM => DistanceBand::Ok,
            Some(d) if d >= INFO_MIN_CM => DistanceBand::Info,
            Some(d) if d >= NO_PROBLEM_MIN_CM => DistanceBand::NoProblem,
            Some(d) if d >= WARNING_MIN_CM => DistanceBand::Warning,
            // Everything from DANGER_MIN_CM (0) up.
            Some(_) => DistanceBand::Danger,
            None => DistanceBand::OutOfRange,
        }
    }

    pub fn color(self) -> RgbColor {
        match self {
            DistanceBand::Danger => COLOR_RED,
            DistanceBand::Warning => COLOR_YELLOW,
            DistanceBand::NoProblem => COLOR_GREEN,
            DistanceBand::Info => COLOR_TURQUOISE,
            DistanceBand::Ok => COLOR_BLUE,
            DistanceBand::OutOfRange => COLOR_OFF,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayState {
    WaitDisplay,
    SetDisplay,
}

impl FsmState for DisplayState {
    fn name(&self) -> &'static str {
        match self {
            DisplayState::WaitDisplay => "WAIT_DISPLAY",
            DisplayState::SetDisplay => "SET_DISPLAY",
        }
    }
}

pub struct DisplayContext<P> {
    port: P,
    id: u32,
    status: bool,
    new_color: bool,
    distance_cm: Option<u32>,
}

fn is_active<P>(ctx: &DisplayContext<P>) -> bool {
    ctx.status
}

fn is_inactive<P>(ctx: &DisplayContext<P>) -> bool {
    !ctx.status
}

fn has_new_distance<P>(ctx: &DisplayContext<P>) -> bool {
    ctx.status && ctx.new_color
}

fn show_band<P: PwmPort>(ctx: &mut DisplayContext<P>) {
    let band = DistanceBand::from_distance(ctx.distance_cm);
    ctx.new_color = false;
    ctx.port.apply_color(ctx.id, band.color());
    trace!("display {}: band {}", ctx.id, band);
}

fn blank<P: PwmPort>(ctx: &mut DisplayContext<P>) {
    ctx.port.apply_color(ctx.id, COLOR_OFF);
}

const NUM_TRANSITIONS: usize = 3;

fn transitions<P: PwmPort>() -> [Transition<DisplayState, DisplayContext<P>>; NUM_TRANSITIONS] {
    use DisplayState::*;
    [
        Transition::new(WaitDisplay, is_active::<P>, SetDisplay, Some(show_band::<P>)),
        Transition::new(SetDisplay, has_new_distance::<P>, SetDisplay, Some(show_band::<P>)),
        Transition::new(SetDisplay, is_inactive::<P>, WaitDisplay, Some(blank::<P>)),
    ]
}

/// Distance display bound to one PWM output id.
pub struct DisplayFsm<P> {
    fsm: Fsm<DisplayState, DisplayContext<P>, NUM_TRANSITIONS>,
    ctx: DisplayContext<P>,
}

impl<P: PwmPort> DisplayFsm<P> {
    pub fn new(id: u32, port: P) -> Result<Self, Error> {
        port.check_output(id)?;
        let fsm = Fsm::new(DisplayState::WaitDisplay, transitions::<P>())?;
        Ok(Self {
            fsm,
            ctx: DisplayContext {
                port,
                id,
                status: false,
                new_color: false,
                distance_cm: None,
            },
        })
    }

    pub fn fire(&mut self) -> bool {
        self.fsm.fire(&mut self.ctx)
    }

    pub fn get_state(&self) -> DisplayState {
        self.fsm.get_state()
    }

    pub fn set_state(&mut self, state: DisplayState) {
        self.fsm.set_state(state);
    }

    pub fn inner_fsm(&self) -> &Fsm<DisplayState, DisplayContext<P>, NUM_TRANSITIONS> {
        &self.fsm
    }

    pub fn set_status(&mut self, status: bool) {
        self.ctx.status = status;
    }

    pub fn get_status(&self) -> bool {
        self.ctx.status
    }

    /// Queue a new distance for the next `fire`.
    pub fn set_distance(&mut self, distance_cm: u32) {
        self.ctx.distance_cm = Some(distance_cm);
        self.ctx.new_color = true;
    }

    pub fn get_distance(&self) -> Option<u32> {
        self.ctx.distance_cm
    }

    /// `true` while active with a distance waiting to be shown.
    pub fn check_activity(&self) -> bool {
        self.ctx.status && self.ctx.new_color
    }
}
