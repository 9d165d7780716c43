//! RGB colors and intensity correction.

use crate::config::MAX_LEVEL_INTENSITY;

/// Full-scale value of one color channel.
pub const COLOR_RGB_MAX_VALUE: u8 = 255;

/// 8-bit-per-channel color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Percentage of full scale, truncated.
const fn pct(percent: u16) -> u8 {
    ((percent * COLOR_RGB_MAX_VALUE as u16) / 100) as u8
}

pub const COLOR_RED: RgbColor = RgbColor::new(COLOR_RGB_MAX_VALUE, 0, 0);
pub const COLOR_GREEN: RgbColor = RgbColor::new(0, COLOR_RGB_MAX_VALUE, 0);
pub const COLOR_BLUE: RgbColor = RgbColor::new(0, 0, COLOR_RGB_MAX_VALUE);
pub const COLOR_YELLOW: RgbColor = RgbColor::new(pct(37), pct(37), 0);
pub const COLOR_WHITE: RgbColor =
    RgbColor::new(COLOR_RGB_MAX_VALUE, COLOR_RGB_MAX_VALUE, COLOR_RGB_MAX_VALUE);
pub const COLOR_TURQUOISE: RgbColor = RgbColor::new(pct(10), pct(35), pct(32));
pub const COLOR_OFF: RgbColor = RgbColor::new(0, 0, 0);

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `intensity / MAX_LEVEL_INTENSITY`, rounding
    /// half up. Intensities above the maximum are clamped.
    pub fn scaled(self, intensity: u8) -> Self {
        let intensity = intensity.min(MAX_LEVEL_INTENSITY) as u16;
        let max = MAX_LEVEL_INTENSITY as u16;
        let channel = |c: u8| ((c as u16 * intensity + max / 2) / max) as u8;
        Self {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
        }
    }

    pub fn is_off(&self) -> bool {
        *self == COLOR_OFF
    }
}
