//! End-to-end parking-assist scenarios over the atomic-cell port registry.
//!
//! Interrupt handlers are simulated by calling the `on_*` hooks on the
//! hardware records; the FSMs only ever see the registry.

use parking_assist::colors::{COLOR_GREEN, COLOR_RED, COLOR_WHITE, COLOR_YELLOW};
use parking_assist::config::*;
use parking_assist::port::registry::{
    ButtonLine, KeyboardLines, MockClock, PortRegistry, PwmOutput, UltrasoundLines,
};
use parking_assist::{
    ButtonFsm, ButtonState, DisplayFsm, KeyboardFsm, RgbColor, RgbLightFsm, UltrasoundConfig,
    UltrasoundFsm, UltrasoundState, STANDARD_KEYBOARD,
};

type Port<'a> = PortRegistry<'a, MockClock>;

struct Board {
    clock: MockClock,
    buttons: [ButtonLine; 1],
    keyboards: [KeyboardLines; 1],
    sensors: [UltrasoundLines; 1],
    outputs: [PwmOutput; 2],
}

impl Board {
    fn new() -> Self {
        Self {
            clock: MockClock::new(),
            buttons: [ButtonLine::new()],
            keyboards: [KeyboardLines::new()],
            sensors: [UltrasoundLines::new()],
            outputs: [PwmOutput::new(), PwmOutput::new()],
        }
    }

    fn port(&self) -> Port<'_> {
        PortRegistry::new(&self.clock)
            .with_buttons(&self.buttons)
            .with_keyboards(&self.keyboards)
            .with_ultrasounds(&self.sensors)
            .with_outputs(&self.outputs)
    }

    fn sensor(&self) -> &UltrasoundLines {
        &self.sensors[PORT_REAR_PARKING_SENSOR_ID as usize]
    }

    fn display_color(&self) -> RgbColor {
        self.outputs[PORT_REAR_PARKING_DISPLAY_ID as usize].color()
    }

    fn light_color(&self) -> RgbColor {
        self.outputs[PORT_RGB_LIGHT_ID as usize].color()
    }
}

/// Hold the parking button for `hold_ms` and let both debounces finish.
fn press_button(board: &Board, btn: &mut ButtonFsm<Port<'_>>, hold_ms: u32) {
    let line = &board.buttons[PORT_PARKING_BUTTON_ID as usize];
    line.on_edge(true);
    btn.fire();
    board.clock.advance(PORT_PARKING_BUTTON_DEBOUNCE_TIME_MS);
    btn.fire();
    board.clock.advance(hold_ms);
    line.on_edge(false);
    btn.fire();
    board.clock.advance(PORT_PARKING_BUTTON_DEBOUNCE_TIME_MS);
    btn.fire();
}

/// Run one ranging cycle whose echo lasts `ticks` timer ticks.
fn range_once(board: &Board, us: &mut UltrasoundFsm<Port<'_>>, ticks: u32) {
    let sensor = board.sensor();
    if us.get_state() == UltrasoundState::SetDistance {
        sensor.on_measurement_period();
    }
    us.fire();
    assert_eq!(us.get_state(), UltrasoundState::TriggerStart);

    sensor.on_trigger_elapsed();
    us.fire();

    let init = 60_000;
    let end = init + ticks;
    sensor.on_echo_edge(init);
    us.fire();
    if end > ULTRASOUND_TIMER_MAX {
        sensor.on_echo_overflow();
    }
    sensor.on_echo_edge(end % (ULTRASOUND_TIMER_MAX + 1));
    us.fire();
    assert_eq!(us.get_state(), UltrasoundState::SetDistance);
}

/// Echo width, in 1 µs ticks, of an obstacle `cm` away.
fn ticks_for(cm: u32) -> u32 {
    cm * SPEED_OF_SOUND_NS_PER_CM / ULTRASOUND_TICK_PERIOD_NS
}

#[test]
fn button_arms_sensor_and_display_tracks_distance() {
    let board = Board::new();
    let mut btn = ButtonFsm::new(
        PORT_PARKING_BUTTON_DEBOUNCE_TIME_MS,
        PORT_PARKING_BUTTON_ID,
        board.port(),
    )
    .unwrap();
    let mut us = UltrasoundFsm::new(
        PORT_REAR_PARKING_SENSOR_ID,
        UltrasoundConfig::default(),
        board.port(),
    )
    .unwrap();
    let mut display = DisplayFsm::new(PORT_REAR_PARKING_DISPLAY_ID, board.port()).unwrap();

    press_button(&board, &mut btn, 1_000);
    assert_eq!(btn.get_state(), ButtonState::Released);
    assert!(btn.get_duration() >= 1_000);
    btn.reset_duration();

    us.start();
    display.set_status(true);
    display.fire();

    // Approaching obstacle: 120 cm, then 40 cm, then 10 cm.
    for (cm, expected) in [(120, COLOR_GREEN), (40, COLOR_YELLOW), (10, COLOR_RED)] {
        for _ in 0..ULTRASOUND_NUM_MEASUREMENTS {
            range_once(&board, &mut us, ticks_for(cm));
        }
        assert!(us.has_new_measurement());
        let distance = us.get_distance();
        assert_eq!(distance, cm);

        display.set_distance(distance);
        display.fire();
        assert_eq!(board.display_color(), expected);
    }

    // Second press disarms everything.
    press_button(&board, &mut btn, 300);
    us.stop();
    us.fire();
    assert_eq!(us.get_state(), UltrasoundState::WaitStart);
    assert!(!board.sensor().is_echo_timer_running());

    display.set_status(false);
    display.fire();
    assert!(board.display_color().is_off());
}

#[test]
fn echo_spanning_a_timer_wrap_ranges_correctly() {
    let board = Board::new();
    let mut us = UltrasoundFsm::new(
        PORT_REAR_PARKING_SENSOR_ID,
        UltrasoundConfig::default(),
        board.port(),
    )
    .unwrap();
    us.start();

    // 60_000 + 11_660 ticks crosses 0xFFFF once.
    for _ in 0..ULTRASOUND_NUM_MEASUREMENTS {
        range_once(&board, &mut us, ticks_for(200));
    }
    assert_eq!(us.get_distance(), 200);
}

#[test]
fn keypad_digits_set_light_intensity() {
    let board = Board::new();
    let mut kb = KeyboardFsm::new(
        PORT_KEYBOARD_MAIN_DEBOUNCE_TIME_MS,
        PORT_KEYBOARD_MAIN_ID,
        &STANDARD_KEYBOARD,
        board.port(),
    )
    .unwrap();
    let mut light = RgbLightFsm::new(PORT_RGB_LIGHT_ID, board.port()).unwrap();
    let lines = &board.keyboards[PORT_KEYBOARD_MAIN_ID as usize];

    light.set_status(true);
    light.fire();
    kb.start_scan();

    // '5' sits at row 1, column 1.
    lines.on_row_timeout();
    kb.fire();
    assert_eq!(kb.get_excited_row(), Some(1));
    lines.on_column_edge(1, true);
    kb.fire();
    board.clock.advance(PORT_KEYBOARD_MAIN_DEBOUNCE_TIME_MS);
    kb.fire();
    lines.on_column_edge(1, false);
    kb.fire();
    board.clock.advance(PORT_KEYBOARD_MAIN_DEBOUNCE_TIME_MS);
    kb.fire();

    let key = kb.get_key_value();
    assert_eq!(key, '5');
    kb.reset_key_value();

    let intensity = key.to_digit(10).map_or(0, |d| d as u8 * 10);
    light.set_color_intensity(COLOR_WHITE, intensity).unwrap();
    light.fire();
    assert_eq!(board.light_color(), RgbColor::new(128, 128, 128));

    // The display output is independent.
    assert!(board.display_color().is_off());
}

#[test]
fn unknown_ids_fail_construction() {
    let board = Board::new();
    assert!(ButtonFsm::new(150, 3, board.port()).is_err());
    assert!(KeyboardFsm::new(150, 1, &STANDARD_KEYBOARD, board.port()).is_err());
    assert!(UltrasoundFsm::new(2, UltrasoundConfig::default(), board.port()).is_err());
    assert!(RgbLightFsm::new(2, board.port()).is_err());
    assert!(DisplayFsm::new(5, board.port()).is_err());
}
