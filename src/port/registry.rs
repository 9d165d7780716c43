//! Id-indexed hardware records shared between interrupt and poll context.
//!
//! Each record is a set of atomic cells. Interrupt handlers own the
//! `on_*` writers; the FSMs reach the same cells through the port traits
//! implemented by [`PortRegistry`]. Every event flag has exactly one
//! writer that raises it (the ISR) and one that clears it (the FSM
//! action or an auto-clearing read), so no locking is needed.
//!
//! Records are `const`-constructible so a board can keep them in
//! `static`s:
//!
//! ```ignore
//! static CLOCK: SysTickClock = SysTickClock::new();
//! static BUTTONS: [ButtonLine; 1] = [ButtonLine::new()];
//!
//! let port = PortRegistry::new(&CLOCK).with_buttons(&BUTTONS);
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use super::{
    ButtonPort, Clock, EchoCapture, KeyboardPort, PwmChannel, PwmPort, UltrasoundPort,
};
use crate::colors::RgbColor;
use crate::error::Error;

/// Row index meaning "no row excited".
const NO_ROW: u8 = u8::MAX;

// ═══════════════════════════════════════════════════════════════════════════
// Clock
// ═══════════════════════════════════════════════════════════════════════════

/// Manually advanced millisecond clock, for tests and simulation.
pub struct MockClock {
    now: AtomicU32,
}

impl MockClock {
    pub const fn new() -> Self {
        Self {
            now: AtomicU32::new(0),
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::Release);
    }

    pub fn advance(&self, ms: u32) {
        let now = self.now.load(Ordering::Acquire);
        self.now.store(now.wrapping_add(ms), Ordering::Release);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn millis(&self) -> u32 {
        self.now.load(Ordering::Acquire)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Hardware records
// ═══════════════════════════════════════════════════════════════════════════

/// One push button input.
pub struct ButtonLine {
    pressed: AtomicBool,
}

impl ButtonLine {
    pub const fn new() -> Self {
        Self {
            pressed: AtomicBool::new(false),
        }
    }

    /// EXTI handler: latch the new level.
    pub fn on_edge(&self, pressed: bool) {
        self.pressed.store(pressed, Ordering::Release);
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.load(Ordering::Acquire)
    }
}

impl Default for ButtonLine {
    fn default() -> Self {
        Self::new()
    }
}

/// Row outputs, column interrupts and scan timer of one matrix keyboard.
pub struct KeyboardLines {
    excited_row: AtomicU8,
    row_timeout: AtomicBool,
    key_pressed: AtomicBool,
    triggered_col: AtomicU8,
    scan_timer: AtomicBool,
}

impl KeyboardLines {
    pub const fn new() -> Self {
        Self {
            excited_row: AtomicU8::new(NO_ROW),
            row_timeout: AtomicBool::new(false),
            key_pressed: AtomicBool::new(false),
            triggered_col: AtomicU8::new(0),
            scan_timer: AtomicBool::new(false),
        }
    }

    /// Scan timer handler: the excited row's deadline expired.
    pub fn on_row_timeout(&self) {
        self.row_timeout.store(true, Ordering::Release);
    }

    /// Column EXTI handler. The column index is published before the
    /// pressed flag so a reader that sees the flag also sees the column.
    pub fn on_column_edge(&self, col: u8, pressed: bool) {
        if pressed {
            self.triggered_col.store(col, Ordering::Release);
        }
        self.key_pressed.store(pressed, Ordering::Release);
    }

    pub fn excited_row(&self) -> Option<u8> {
        match self.excited_row.load(Ordering::Acquire) {
            NO_ROW => None,
            row => Some(row),
        }
    }

    pub fn is_row_timeout_pending(&self) -> bool {
        self.row_timeout.load(Ordering::Acquire)
    }

    pub fn is_scan_timer_running(&self) -> bool {
        self.scan_timer.load(Ordering::Acquire)
    }
}

impl Default for KeyboardLines {
    fn default() -> Self {
        Self::new()
    }
}

/// Trigger pin, echo capture and the three timers of one transceiver.
pub struct UltrasoundLines {
    trigger_ready: AtomicBool,
    trigger_end: AtomicBool,
    trigger_pin: AtomicBool,
    trigger_timer: AtomicBool,
    echo_timer: AtomicBool,
    measurement_timer: AtomicBool,
    echo_received: AtomicBool,
    echo_init_tick: AtomicU32,
    echo_end_tick: AtomicU32,
    echo_overflows: AtomicU32,
}

impl UltrasoundLines {
    /// Starts ready so the first measurement triggers without waiting a
    /// full measurement period.
    pub const fn new() -> Self {
        Self {
            trigger_ready: AtomicBool::new(true),
            trigger_end: AtomicBool::new(false),
            trigger_pin: AtomicBool::new(false),
            trigger_timer: AtomicBool::new(false),
            echo_timer: AtomicBool::new(false),
            measurement_timer: AtomicBool::new(false),
            echo_received: AtomicBool::new(false),
            echo_init_tick: AtomicU32::new(0),
            echo_end_tick: AtomicU32::new(0),
            echo_overflows: AtomicU32::new(0),
        }
    }

    /// Measurement timer handler: time for a new trigger pulse.
    pub fn on_measurement_period(&self) {
        self.trigger_ready.store(true, Ordering::Release);
    }

    /// Trigger timer handler: the trigger pulse is long enough.
    pub fn on_trigger_elapsed(&self) {
        self.trigger_end.store(true, Ordering::Release);
    }

    /// Echo capture handler. The first edge after a reset is the rising
    /// edge; the next one closes the pulse.
    pub fn on_echo_edge(&self, tick: u32) {
        let init = self.echo_init_tick.load(Ordering::Acquire);
        if init == 0 && !self.echo_received.load(Ordering::Acquire) {
            self.echo_init_tick.store(tick, Ordering::Release);
        } else {
            self.echo_end_tick.store(tick, Ordering::Release);
            self.echo_received.store(true, Ordering::Release);
        }
    }

    /// Echo timer update handler: the capture counter wrapped.
    pub fn on_echo_overflow(&self) {
        let count = self.echo_overflows.load(Ordering::Acquire);
        self.echo_overflows
            .store(count.wrapping_add(1), Ordering::Release);
    }

    // Direct register setters, used to inject exact captures.

    pub fn set_trigger_ready(&self, ready: bool) {
        self.trigger_ready.store(ready, Ordering::Release);
    }

    pub fn set_trigger_end(&self, ended: bool) {
        self.trigger_end.store(ended, Ordering::Release);
    }

    pub fn set_echo_init_tick(&self, tick: u32) {
        self.echo_init_tick.store(tick, Ordering::Release);
    }

    pub fn set_echo_end_tick(&self, tick: u32) {
        self.echo_end_tick.store(tick, Ordering::Release);
    }

    pub fn set_echo_overflows(&self, overflows: u32) {
        self.echo_overflows.store(overflows, Ordering::Release);
    }

    pub fn set_echo_received(&self, received: bool) {
        self.echo_received.store(received, Ordering::Release);
    }

    // Inspection.

    pub fn trigger_pin(&self) -> bool {
        self.trigger_pin.load(Ordering::Acquire)
    }

    pub fn is_trigger_ready(&self) -> bool {
        self.trigger_ready.load(Ordering::Acquire)
    }

    pub fn is_trigger_end(&self) -> bool {
        self.trigger_end.load(Ordering::Acquire)
    }

    pub fn is_trigger_timer_running(&self) -> bool {
        self.trigger_timer.load(Ordering::Acquire)
    }

    pub fn is_echo_timer_running(&self) -> bool {
        self.echo_timer.load(Ordering::Acquire)
    }

    pub fn is_measurement_timer_running(&self) -> bool {
        self.measurement_timer.load(Ordering::Acquire)
    }

    pub fn echo_init_tick(&self) -> u32 {
        self.echo_init_tick.load(Ordering::Acquire)
    }

    pub fn echo_end_tick(&self) -> u32 {
        self.echo_end_tick.load(Ordering::Acquire)
    }

    pub fn echo_overflows(&self) -> u32 {
        self.echo_overflows.load(Ordering::Acquire)
    }

    pub fn is_echo_received(&self) -> bool {
        self.echo_received.load(Ordering::Acquire)
    }

    fn reset_echo(&self) {
        self.echo_init_tick.store(0, Ordering::Release);
        self.echo_end_tick.store(0, Ordering::Release);
        self.echo_overflows.store(0, Ordering::Release);
    }
}

impl Default for UltrasoundLines {
    fn default() -> Self {
        Self::new()
    }
}

/// Duty cycles of one RGB PWM output.
pub struct PwmOutput {
    duty: [AtomicU8; 3],
}

impl PwmOutput {
    pub const fn new() -> Self {
        Self {
            duty: [AtomicU8::new(0), AtomicU8::new(0), AtomicU8::new(0)],
        }
    }

    pub fn duty(&self, channel: PwmChannel) -> u8 {
        self.duty[channel.index()].load(Ordering::Acquire)
    }

    /// Current output as a color.
    pub fn color(&self) -> RgbColor {
        RgbColor::new(
            self.duty(PwmChannel::Red),
            self.duty(PwmChannel::Green),
            self.duty(PwmChannel::Blue),
        )
    }
}

impl Default for PwmOutput {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════

/// Port implementation over borrowed, id-indexed hardware records.
///
/// Cheap to copy: hand one copy to each FSM. Calls with an id that has no
/// record read as inactive and write nothing; FSM constructors reject such
/// ids up front through the `check_*` methods.
pub struct PortRegistry<'a, C> {
    clock: &'a C,
    buttons: &'a [ButtonLine],
    keyboards: &'a [KeyboardLines],
    ultrasounds: &'a [UltrasoundLines],
    outputs: &'a [PwmOutput],
}

impl<C> Clone for PortRegistry<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for PortRegistry<'_, C> {}

impl<'a, C> PortRegistry<'a, C> {
    /// Registry with no devices.
    pub const fn new(clock: &'a C) -> Self {
        Self {
            clock,
            buttons: &[],
            keyboards: &[],
            ultrasounds: &[],
            outputs: &[],
        }
    }

    pub const fn with_buttons(mut self, buttons: &'a [ButtonLine]) -> Self {
        self.buttons = buttons;
        self
    }

    pub const fn with_keyboards(mut self, keyboards: &'a [KeyboardLines]) -> Self {
        self.keyboards = keyboards;
        self
    }

    pub const fn with_ultrasounds(mut self, ultrasounds: &'a [UltrasoundLines]) -> Self {
        self.ultrasounds = ultrasounds;
        self
    }

    pub const fn with_outputs(mut self, outputs: &'a [PwmOutput]) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn button(&self, id: u32) -> Option<&'a ButtonLine> {
        self.buttons.get(id as usize)
    }

    pub fn keyboard(&self, id: u32) -> Option<&'a KeyboardLines> {
        self.keyboards.get(id as usize)
    }

    pub fn ultrasound(&self, id: u32) -> Option<&'a UltrasoundLines> {
        self.ultrasounds.get(id as usize)
    }

    pub fn output(&self, id: u32) -> Option<&'a PwmOutput> {
        self.outputs.get(id as usize)
    }
}

fn known<T>(record: Option<T>, id: u32) -> Result<(), Error> {
    record.map(|_| ()).ok_or(Error::UnknownDeviceId(id))
}

impl<C: Clock> Clock for PortRegistry<'_, C> {
    fn millis(&self) -> u32 {
        self.clock.millis()
    }
}

impl<C: Clock> ButtonPort for PortRegistry<'_, C> {
    fn check_button(&self, id: u32) -> Result<(), Error> {
        known(self.button(id), id)
    }

    fn read_pressed(&self, id: u32) -> bool {
        self.button(id).is_some_and(ButtonLine::is_pressed)
    }

    fn clear_pressed(&mut self, id: u32) {
        if let Some(line) = self.button(id) {
            line.pressed.store(false, Ordering::Release);
        }
    }
}

impl<C: Clock> KeyboardPort for PortRegistry<'_, C> {
    fn check_keyboard(&self, id: u32) -> Result<(), Error> {
        known(self.keyboard(id), id)
    }

    fn read_row_timeout(&self, id: u32) -> bool {
        self.keyboard(id)
            .is_some_and(|k| k.row_timeout.swap(false, Ordering::AcqRel))
    }

    fn read_key_pressed(&self, id: u32) -> bool {
        self.keyboard(id)
            .is_some_and(|k| k.key_pressed.load(Ordering::Acquire))
    }

    fn excite_row(&mut self, id: u32, row: u8) {
        if let Some(k) = self.keyboard(id) {
            k.row_timeout.store(false, Ordering::Release);
            k.excited_row.store(row, Ordering::Release);
            k.scan_timer.store(true, Ordering::Release);
        }
    }

    fn get_triggered_column(&self, id: u32) -> u8 {
        self.keyboard(id)
            .map_or(0, |k| k.triggered_col.load(Ordering::Acquire))
    }

    fn stop_scan(&mut self, id: u32) {
        if let Some(k) = self.keyboard(id) {
            k.scan_timer.store(false, Ordering::Release);
            k.excited_row.store(NO_ROW, Ordering::Release);
            k.row_timeout.store(false, Ordering::Release);
        }
    }
}

impl<C> UltrasoundPort for PortRegistry<'_, C> {
    fn check_ultrasound(&self, id: u32) -> Result<(), Error> {
        known(self.ultrasound(id), id)
    }

    fn read_trigger_ready(&self, id: u32) -> bool {
        self.ultrasound(id)
            .is_some_and(UltrasoundLines::is_trigger_ready)
    }

    fn begin_trigger(&mut self, id: u32) {
        if let Some(u) = self.ultrasound(id) {
            u.trigger_ready.store(false, Ordering::Release);
            u.echo_received.store(false, Ordering::Release);
            u.reset_echo();
            u.trigger_pin.store(true, Ordering::Release);
            u.trigger_timer.store(true, Ordering::Release);
            u.echo_timer.store(true, Ordering::Release);
            u.measurement_timer.store(true, Ordering::Release);
        }
    }

    fn read_trigger_ended(&self, id: u32) -> bool {
        self.ultrasound(id)
            .is_some_and(UltrasoundLines::is_trigger_end)
    }

    fn stop_trigger(&mut self, id: u32) {
        if let Some(u) = self.ultrasound(id) {
            u.trigger_pin.store(false, Ordering::Release);
            u.trigger_timer.store(false, Ordering::Release);
            u.trigger_end.store(false, Ordering::Release);
        }
    }

    fn read_echo_captured(&self, id: u32) -> EchoCapture {
        self.ultrasound(id).map_or(EchoCapture::default(), |u| {
            // Flag first: ticks published before it are then visible.
            let received = u.is_echo_received();
            EchoCapture {
                init_tick: u.echo_init_tick(),
                end_tick: u.echo_end_tick(),
                received,
            }
        })
    }

    fn read_overflow_count(&self, id: u32) -> u32 {
        self.ultrasound(id)
            .map_or(0, UltrasoundLines::echo_overflows)
    }

    fn clear_echo_received(&mut self, id: u32) {
        if let Some(u) = self.ultrasound(id) {
            u.echo_received.store(false, Ordering::Release);
        }
    }

    fn reset_echo_ticks(&mut self, id: u32) {
        if let Some(u) = self.ultrasound(id) {
            u.reset_echo();
        }
    }

    fn stop_all_timers(&mut self, id: u32) {
        if let Some(u) = self.ultrasound(id) {
            u.trigger_pin.store(false, Ordering::Release);
            u.trigger_timer.store(false, Ordering::Release);
            u.echo_timer.store(false, Ordering::Release);
            u.measurement_timer.store(false, Ordering::Release);
            u.trigger_ready.store(true, Ordering::Release);
        }
    }
}

impl<C> PwmPort for PortRegistry<'_, C> {
    fn check_output(&self, id: u32) -> Result<(), Error> {
        known(self.output(id), id)
    }

    fn apply_pwm(&mut self, id: u32, channel: PwmChannel, duty: u8) {
        if let Some(out) = self.output(id) {
            out.duty[channel.index()].store(duty, Ordering::Release);
        }
    }
}
