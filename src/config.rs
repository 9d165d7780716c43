//! System-wide constants and compile-time configuration.
//!
//! Device identifiers, debounce times, echo-timer geometry and the display
//! distance bands all live here so they can be tuned in one place.

// Device identifiers
//
// Ids index the port-layer registry; each peripheral class has its own
// id space, except the two PWM outputs which share one.

/// Parking (arm/disarm) push button.
pub const PORT_PARKING_BUTTON_ID: u32 = 0;

/// Main 4x4 matrix keyboard.
pub const PORT_KEYBOARD_MAIN_ID: u32 = 0;

/// Rear parking ultrasonic transceiver.
pub const PORT_REAR_PARKING_SENSOR_ID: u32 = 0;

/// Cabin RGB light.
pub const PORT_RGB_LIGHT_ID: u32 = 0;

/// Rear parking distance display (an RGB LED driven by distance band).
pub const PORT_REAR_PARKING_DISPLAY_ID: u32 = 1;

// Debounce

/// Parking button debounce time (ms).
pub const PORT_PARKING_BUTTON_DEBOUNCE_TIME_MS: u32 = 150;

/// Main keyboard debounce time (ms), applied on press and on release.
pub const PORT_KEYBOARD_MAIN_DEBOUNCE_TIME_MS: u32 = 150;

// Ultrasonic ranging

/// Highest value of the free-running echo capture counter (16-bit timer).
pub const ULTRASOUND_TIMER_MAX: u32 = 0xFFFF;

/// Period of one echo timer tick (ns). 1 µs resolution.
pub const ULTRASOUND_TICK_PERIOD_NS: u32 = 1_000;

/// Round-trip time of sound per centimetre of distance (ns), ≈ 58.3 µs.
pub const SPEED_OF_SOUND_NS_PER_CM: u32 = 58_300;

/// Raw samples per filtered distance. Odd so the median is a real sample.
pub const ULTRASOUND_NUM_MEASUREMENTS: usize = 5;

// RGB outputs

/// Highest intensity level accepted by the RGB light (percent).
pub const MAX_LEVEL_INTENSITY: u8 = 100;

// Display distance bands (cm, lower bounds inclusive)

/// Obstacle very close: red.
pub const DANGER_MIN_CM: u32 = 0;
/// Getting close: yellow.
pub const WARNING_MIN_CM: u32 = 25;
/// Safe manoeuvring distance: green.
pub const NO_PROBLEM_MIN_CM: u32 = 50;
/// Obstacle detected far away: turquoise.
pub const INFO_MIN_CM: u32 = 150;
/// Nothing relevant nearby: blue.
pub const OK_MIN_CM: u32 = 175;
/// Beyond this the display is switched off.
pub const OK_MAX_CM: u32 = 200;

