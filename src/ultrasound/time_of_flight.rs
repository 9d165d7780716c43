//! Echo pulse width to distance conversion.

use crate::config::{SPEED_OF_SOUND_NS_PER_CM, ULTRASOUND_TICK_PERIOD_NS, ULTRASOUND_TIMER_MAX};

/// Geometry of the echo capture timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UltrasoundConfig {
    /// Highest counter value before the timer wraps to 0.
    pub timer_max: u32,
    /// Duration of one counter tick (ns).
    pub tick_period_ns: u32,
}

impl Default for UltrasoundConfig {
    fn default() -> Self {
        Self {
            timer_max: ULTRASOUND_TIMER_MAX,
            tick_period_ns: ULTRASOUND_TICK_PERIOD_NS,
        }
    }
}

impl UltrasoundConfig {
    /// Ticks between the rising edge at `init_tick` and the falling edge
    /// at `end_tick`, with `overflows` counter wraps seen in between.
    ///
    /// When the overflow count comes up short (the wrap interrupt lost a
    /// race with the capture), one extra period is added so the result
    /// stays the forward distance from `init_tick`.
    ///
    /// Captures above `timer_max` are reduced modulo the timer period.
    pub fn elapsed_ticks(&self, init_tick: u32, end_tick: u32, overflows: u32) -> u64 {
        let period = u64::from(self.timer_max) + 1;
        let init = u64::from(init_tick) % period;
        let end_total = u64::from(end_tick) % period + u64::from(overflows) * period;
        if end_total >= init {
            end_total - init
        } else {
            end_total + period - init
        }
    }

    /// Convert a pulse width to centimetres, rounding half up.
    pub fn ticks_to_cm(&self, ticks: u64) -> u32 {
        let ns = ticks.saturating_mul(u64::from(self.tick_period_ns));
        let per_cm = u64::from(SPEED_OF_SOUND_NS_PER_CM);
        let cm = ns.saturating_add(per_cm / 2) / per_cm;
        u32::try_from(cm).unwrap_or(u32::MAX)
    }

    pub fn distance_cm(&self, init_tick: u32, end_tick: u32, overflows: u32) -> u32 {
        self.ticks_to_cm(self.elapsed_ticks(init_tick, end_tick, overflows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // (init, end, overflows, ticks, cm)
    const VECTORS: [(u32, u32, u32, u64, u32); 5] = [
        (1, 584, 0, 583, 10),
        (64371, 3, 1, 1168, 20),
        (3, 1752, 0, 1749, 30),
        (63208, 4, 1, 2332, 40),
        (5, 2920, 0, 2915, 50),
    ];

    #[test]
    fn reference_captures_convert_to_expected_distances() {
        let config = UltrasoundConfig::default();
        for (init, end, overflows, ticks, cm) in VECTORS {
            assert_eq!(config.elapsed_ticks(init, end, overflows), ticks);
            assert_eq!(config.distance_cm(init, end, overflows), cm);
        }
    }

    #[test]
    fn missed_overflow_adds_one_period() {
        let config = UltrasoundConfig::default();
        // Wrapped once but the update interrupt was not counted.
        assert_eq!(config.elapsed_ticks(64371, 3, 0), 1168);
    }

    #[test]
    fn several_overflows_extend_the_pulse() {
        let config = UltrasoundConfig::default();
        assert_eq!(config.elapsed_ticks(100, 100, 2), 2 * 65536);
    }

    #[test]
    fn empty_capture_is_zero_distance() {
        let config = UltrasoundConfig::default();
        assert_eq!(config.distance_cm(0, 0, 0), 0);
    }

    #[test]
    fn rounding_is_half_up() {
        let config = UltrasoundConfig::default();
        // 29.149 us -> 0 cm, 29.150 us -> 1 cm
        let narrow = UltrasoundConfig {
            tick_period_ns: 1,
            ..config
        };
        assert_eq!(narrow.ticks_to_cm(29_149), 0);
        assert_eq!(narrow.ticks_to_cm(29_150), 1);
        assert_eq!(config.ticks_to_cm(58 * 200 + 60), 200);
    }

    #[test]
    fn custom_timer_width() {
        let eight_bit = UltrasoundConfig {
            timer_max: 0xFF,
            tick_period_ns: 1_000,
        };
        assert_eq!(eight_bit.elapsed_ticks(250, 10, 1), 16);
        assert_eq!(eight_bit.elapsed_ticks(250, 10, 0), 16);
    }

    #[test]
    fn capture_wider_than_timer_is_reduced() {
        let eight_bit = UltrasoundConfig {
            timer_max: 0xFF,
            tick_period_ns: 1_000,
        };
        // 1000 % 256 = 232, so this is 24 ticks forward to the wrap.
        assert_eq!(eight_bit.elapsed_ticks(1000, 0, 0), 24);
        assert_eq!(eight_bit.elapsed_ticks(0x1_00FA, 0x1_000A, 1), 16);
        assert_eq!(eight_bit.distance_cm(u32::MAX, u32::MAX, 0), 0);
    }
}
