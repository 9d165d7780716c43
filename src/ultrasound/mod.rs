//! Ultrasonic ranging.
//!
//! One measurement cycle: raise the trigger pin for the trigger period,
//! wait for the echo's rising edge, wait for its falling edge, convert the
//! pulse width to centimetres and store the sample. Every
//! [`ULTRASOUND_NUM_MEASUREMENTS`] samples the batch median becomes the
//! published distance and the batch starts over.
//!
//! ```text
//!  WAIT_START ──armed & ready──► TRIGGER_START ──trigger ended──► WAIT_ECHO_START
//!      ▲                              ▲                                │ rising edge
//!      │ disarmed                     │ armed & ready                  ▼
//!      └────────────────────────── SET_DISTANCE ◄──falling edge── WAIT_ECHO_END
//! ```

pub mod time_of_flight;

pub use time_of_flight::UltrasoundConfig;

use heapless::Vec;

use crate::config::ULTRASOUND_NUM_MEASUREMENTS;
use crate::error::Error;
use crate::fsm::{Fsm, FsmState, Transition};
use crate::median::median;
use crate::port::UltrasoundPort;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UltrasoundState {
    WaitStart,
    TriggerStart,
    WaitEchoStart,
    WaitEchoEnd,
    SetDistance,
}

impl FsmState for UltrasoundState {
    fn name(&self) -> &'static str {
        match self {
            UltrasoundState::WaitStart => "WAIT_START",
            UltrasoundState::TriggerStart => "TRIGGER_START",
            UltrasoundState::WaitEchoStart => "WAIT_ECHO_START",
            UltrasoundState::WaitEchoEnd => "WAIT_ECHO_END",
            UltrasoundState::SetDistance => "SET_DISTANCE",
        }
    }
}

/// Data seen by the ranging guards and actions.
pub struct UltrasoundContext<P> {
    port: P,
    id: u32,
    config: UltrasoundConfig,
    status: bool,
    samples: Vec<u32, ULTRASOUND_NUM_MEASUREMENTS>,
    distance_cm: u32,
    new_measurement: bool,
    echo_init_tick: u32,
    echo_end_tick: u32,
    echo_overflows: u32,
}

fn armed_and_ready<P: UltrasoundPort>(ctx: &UltrasoundContext<P>) -> bool {
    ctx.status && ctx.port.read_trigger_ready(ctx.id)
}

fn disarmed<P: UltrasoundPort>(ctx: &UltrasoundContext<P>) -> bool {
    !ctx.status
}

fn trigger_ended<P: UltrasoundPort>(ctx: &UltrasoundContext<P>) -> bool {
    ctx.port.read_trigger_ended(ctx.id)
}

fn echo_started<P: UltrasoundPort>(ctx: &UltrasoundContext<P>) -> bool {
    // Tick 0 doubles as "no rising edge yet".
    ctx.port.read_echo_captured(ctx.id).init_tick != 0
}

fn echo_received<P: UltrasoundPort>(ctx: &UltrasoundContext<P>) -> bool {
    ctx.port.read_echo_captured(ctx.id).received
}

fn start_trigger<P: UltrasoundPort>(ctx: &mut UltrasoundContext<P>) {
    ctx.port.begin_trigger(ctx.id);
}

fn end_trigger<P: UltrasoundPort>(ctx: &mut UltrasoundContext<P>) {
    ctx.port.stop_trigger(ctx.id);
}

fn store_echo_start<P: UltrasoundPort>(ctx: &mut UltrasoundContext<P>) {
    ctx.echo_init_tick = ctx.port.read_echo_captured(ctx.id).init_tick;
}

fn store_distance<P: UltrasoundPort>(ctx: &mut UltrasoundContext<P>) {
    let capture = ctx.port.read_echo_captured(ctx.id);
    ctx.echo_init_tick = capture.init_tick;
    ctx.echo_end_tick = capture.end_tick;
    ctx.echo_overflows = ctx.port.read_overflow_count(ctx.id);

    let sample = ctx
        .config
        .distance_cm(ctx.echo_init_tick, ctx.echo_end_tick, ctx.echo_overflows);
    trace!("ultrasound {}: sample {} cm", ctx.id, sample);

    // The batch is drained as soon as it fills, so there is always room.
    let _ = ctx.samples.push(sample);
    if ctx.samples.is_full() {
        ctx.distance_cm = median(&ctx.samples);
        ctx.new_measurement = true;
        ctx.samples.clear();
        debug!("ultrasound {}: distance {} cm", ctx.id, ctx.distance_cm);
    }

    ctx.port.clear_echo_received(ctx.id);
}

fn stop_measurement<P: UltrasoundPort>(ctx: &mut UltrasoundContext<P>) {
    ctx.port.stop_all_timers(ctx.id);
    ctx.port.reset_echo_ticks(ctx.id);
    ctx.port.clear_echo_received(ctx.id);
    ctx.echo_init_tick = 0;
    ctx.echo_end_tick = 0;
    ctx.echo_overflows = 0;
}

const NUM_TRANSITIONS: usize = 6;

fn transitions<P: UltrasoundPort>(
) -> [Transition<UltrasoundState, UltrasoundContext<P>>; NUM_TRANSITIONS] {
    use UltrasoundState::*;
    [
        Transition::new(WaitStart, armed_and_ready::<P>, TriggerStart, Some(start_trigger::<P>)),
        Transition::new(TriggerStart, trigger_ended::<P>, WaitEchoStart, Some(end_trigger::<P>)),
        Transition::new(WaitEchoStart, echo_started::<P>, WaitEchoEnd, Some(store_echo_start::<P>)),
        Transition::new(WaitEchoEnd, echo_received::<P>, SetDistance, Some(store_distance::<P>)),
        Transition::new(SetDistance, armed_and_ready::<P>, TriggerStart, Some(start_trigger::<P>)),
        Transition::new(SetDistance, disarmed::<P>, WaitStart, Some(stop_measurement::<P>)),
    ]
}

/// Ultrasonic transceiver bound to one port id.
pub struct UltrasoundFsm<P> {
    fsm: Fsm<UltrasoundState, UltrasoundContext<P>, NUM_TRANSITIONS>,
    ctx: UltrasoundContext<P>,
}

impl<P: UltrasoundPort> UltrasoundFsm<P> {
    /// Fails with [`Error::UnknownDeviceId`] if `port` has no transceiver
    /// `id`. The sensor starts disarmed.
    pub fn new(id: u32, config: UltrasoundConfig, port: P) -> Result<Self, Error> {
        port.check_ultrasound(id)?;
        let fsm = Fsm::new(UltrasoundState::WaitStart, transitions::<P>())?;
        Ok(Self {
            fsm,
            ctx: UltrasoundContext {
                port,
                id,
                config,
                status: false,
                samples: Vec::new(),
                distance_cm: 0,
                new_measurement: false,
                echo_init_tick: 0,
                echo_end_tick: 0,
                echo_overflows: 0,
            },
        })
    }

    pub fn fire(&mut self) -> bool {
        self.fsm.fire(&mut self.ctx)
    }

    pub fn get_state(&self) -> UltrasoundState {
        self.fsm.get_state()
    }

    pub fn set_state(&mut self, state: UltrasoundState) {
        self.fsm.set_state(state);
    }

    pub fn inner_fsm(&self) -> &Fsm<UltrasoundState, UltrasoundContext<P>, NUM_TRANSITIONS> {
        &self.fsm
    }

    pub fn set_status(&mut self, status: bool) {
        self.ctx.status = status;
    }

    pub fn get_status(&self) -> bool {
        self.ctx.status
    }

    /// Arm the sensor with an empty sample batch.
    pub fn start(&mut self) {
        self.ctx.samples.clear();
        self.ctx.new_measurement = false;
        self.ctx.status = true;
        info!("ultrasound {}: started", self.ctx.id);
    }

    /// Disarm. Timers stop on the next pass through `SET_DISTANCE`.
    pub fn stop(&mut self) {
        self.ctx.status = false;
        info!("ultrasound {}: stopped", self.ctx.id);
    }

    /// Last filtered distance in cm. Consumes the new-measurement flag.
    pub fn get_distance(&mut self) -> u32 {
        self.ctx.new_measurement = false;
        self.ctx.distance_cm
    }

    pub fn has_new_measurement(&self) -> bool {
        self.ctx.new_measurement
    }

    /// Captured echo of the last cycle: (init tick, end tick, overflows).
    pub fn last_echo(&self) -> (u32, u32, u32) {
        (
            self.ctx.echo_init_tick,
            self.ctx.echo_end_tick,
            self.ctx.echo_overflows,
        )
    }

    pub fn config(&self) -> &UltrasoundConfig {
        &self.ctx.config
    }

    /// `true` while armed.
    pub fn check_activity(&self) -> bool {
        self.ctx.status
    }
}
