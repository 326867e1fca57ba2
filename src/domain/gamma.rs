//! Gamma/color ramp computation
//!
//! Contrast, brightness and gamma are kept per color channel in a
//! [`GammaInput`]. Values are clamped when assigned; the ramp computation
//! only ever sees a `GammaInput`, so it never receives out-of-range input.
//!
//! X gamma ramps always carry 16 bits per entry. A ramp of `size` entries
//! therefore stores each computed level shifted left by `16 - log2(size)`.

use crate::error::{CtrlError, CtrlResult, DomainError};
use bitflags::bitflags;
use serde::Serialize;
use std::str::FromStr;

pub const CONTRAST_MIN: f32 = -1.0;
pub const CONTRAST_MAX: f32 = 1.0;
pub const CONTRAST_DEFAULT: f32 = 0.0;

pub const BRIGHTNESS_MIN: f32 = -1.0;
pub const BRIGHTNESS_MAX: f32 = 1.0;
pub const BRIGHTNESS_DEFAULT: f32 = 0.0;

pub const GAMMA_MIN: f32 = 1.0 / GAMMA_MAX;
pub const GAMMA_MAX: f32 = 10.0;
pub const GAMMA_DEFAULT: f32 = 1.0;

bitflags! {
    /// Selects channels and values for a color update
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorMask: u32 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const CONTRAST = 1 << 3;
        const BRIGHTNESS = 1 << 4;
        const GAMMA = 1 << 5;

        const ALL_CHANNELS = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits();
        const ALL_VALUES =
            Self::CONTRAST.bits() | Self::BRIGHTNESS.bits() | Self::GAMMA.bits();
    }
}

/// One color channel of a ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    pub const fn mask(self) -> ColorMask {
        match self {
            Channel::Red => ColorMask::RED,
            Channel::Green => ColorMask::GREEN,
            Channel::Blue => ColorMask::BLUE,
        }
    }
}

impl FromStr for Channel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" | "r" => Ok(Channel::Red),
            "green" | "g" => Ok(Channel::Green),
            "blue" | "b" => Ok(Channel::Blue),
            _ => Err(DomainError::InvalidChannel(s.to_string())),
        }
    }
}

/// Which of the three knobs an assignment touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorValue {
    Contrast,
    Brightness,
    Gamma,
}

impl ColorValue {
    pub const ALL: [ColorValue; 3] = [
        ColorValue::Contrast,
        ColorValue::Brightness,
        ColorValue::Gamma,
    ];

    /// Inclusive `(min, max)` bounds
    pub const fn bounds(self) -> (f32, f32) {
        match self {
            ColorValue::Contrast => (CONTRAST_MIN, CONTRAST_MAX),
            ColorValue::Brightness => (BRIGHTNESS_MIN, BRIGHTNESS_MAX),
            ColorValue::Gamma => (GAMMA_MIN, GAMMA_MAX),
        }
    }

    pub const fn mask(self) -> ColorMask {
        match self {
            ColorValue::Contrast => ColorMask::CONTRAST,
            ColorValue::Brightness => ColorMask::BRIGHTNESS,
            ColorValue::Gamma => ColorMask::GAMMA,
        }
    }
}

/// Per-channel contrast, brightness and gamma
///
/// Fields can only be changed through [`GammaInput::assign`], which clamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GammaInput {
    contrast: [f32; 3],
    brightness: [f32; 3],
    gamma: [f32; 3],
}

impl Default for GammaInput {
    fn default() -> Self {
        Self {
            contrast: [CONTRAST_DEFAULT; 3],
            brightness: [BRIGHTNESS_DEFAULT; 3],
            gamma: [GAMMA_DEFAULT; 3],
        }
    }
}

impl GammaInput {
    pub fn contrast(&self, channel: Channel) -> f32 {
        self.contrast[channel.index()]
    }

    pub fn brightness(&self, channel: Channel) -> f32 {
        self.brightness[channel.index()]
    }

    pub fn gamma(&self, channel: Channel) -> f32 {
        self.gamma[channel.index()]
    }

    /// All three channels of one value
    pub fn values(&self, value: ColorValue) -> [f32; 3] {
        match value {
            ColorValue::Contrast => self.contrast,
            ColorValue::Brightness => self.brightness,
            ColorValue::Gamma => self.gamma,
        }
    }

    /// Store `values` for the channels selected in `channels`, clamped to
    /// the bounds of `value`. NaN inputs leave the channel unchanged.
    pub fn assign(&mut self, value: ColorValue, values: [f32; 3], channels: ColorMask) {
        let (min, max) = value.bounds();
        let slot = match value {
            ColorValue::Contrast => &mut self.contrast,
            ColorValue::Brightness => &mut self.brightness,
            ColorValue::Gamma => &mut self.gamma,
        };

        for channel in Channel::ALL {
            if !channels.contains(channel.mask()) {
                continue;
            }
            let v = values[channel.index()];
            if v.is_nan() {
                continue;
            }
            slot[channel.index()] = v.clamp(min, max);
        }
    }
}

/// Three channels of 16-bit ramp entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaRamp {
    channels: [Vec<u16>; 3],
}

impl GammaRamp {
    pub const MIN_SIZE: usize = 2;
    pub const MAX_SIZE: usize = 1 << 16;

    /// Identity ramp of `size` entries
    pub fn identity(size: usize) -> CtrlResult<Self> {
        Self::check_size(size)?;
        let mut ramp = Self {
            channels: [vec![0; size], vec![0; size], vec![0; size]],
        };
        ramp.update(&GammaInput::default(), ColorMask::ALL_CHANNELS);
        Ok(ramp)
    }

    /// Wrap ramps read back from the server
    pub fn from_channels(red: Vec<u16>, green: Vec<u16>, blue: Vec<u16>) -> CtrlResult<Self> {
        Self::check_size(red.len())?;
        if green.len() != red.len() || blue.len() != red.len() {
            return Err(CtrlError::BadArgument);
        }
        Ok(Self {
            channels: [red, green, blue],
        })
    }

    pub(crate) fn check_size(size: usize) -> CtrlResult<()> {
        if !(Self::MIN_SIZE..=Self::MAX_SIZE).contains(&size) {
            return Err(CtrlError::BadArgument);
        }
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel(&self, channel: Channel) -> &[u16] {
        &self.channels[channel.index()]
    }

    /// Recompute the selected channels from `input`
    pub fn update(&mut self, input: &GammaInput, channels: ColorMask) {
        let size = self.size();
        for channel in Channel::ALL {
            if !channels.contains(channel.mask()) {
                continue;
            }
            let c = input.contrast(channel);
            let b = input.brightness(channel);
            let g = input.gamma(channel);
            for (i, entry) in self.channels[channel.index()].iter_mut().enumerate() {
                *entry = compute_ramp_value(size, i, c, b, g);
            }
        }
    }
}

/// Left shift that widens `[0, size - 1]` to 16 bits
///
/// Uses the bit width of `size - 1`, so sizes that are not a power of two
/// never overflow.
fn ramp_shift(size: usize) -> u32 {
    let bits = usize::BITS - (size.saturating_sub(1)).leading_zeros();
    16u32.saturating_sub(bits)
}

/// Compute entry `index` of a `size`-entry ramp
///
/// Contrast stretches around the midpoint, gamma warps with a power law,
/// brightness shifts the result, which is clamped to `[0, size - 1]`.
pub(crate) fn compute_ramp_value(
    size: usize,
    index: usize,
    contrast: f32,
    brightness: f32,
    gamma: f32,
) -> u16 {
    let num = (size - 1) as f64;
    let shift = ramp_shift(size);
    let scale = num / 3.0;

    let mut j = index as f64;

    let contrast = f64::from(contrast) * scale;
    if contrast > 0.0 {
        let half = num / 2.0 - 1.0;
        j = (j - half) * (half / (half - contrast)) + half;
    } else {
        let half = num / 2.0;
        j = (j - half) * ((half + contrast) / half) + half;
    }
    if j < 0.0 {
        j = 0.0;
    }

    let exponent = 1.0 / f64::from(gamma);
    let mut val = if exponent == 1.0 {
        j as i64
    } else {
        ((j / num).powf(exponent) * num + 0.5) as i64
    };

    val += (f64::from(brightness) * scale) as i64;
    let val = val.clamp(0, num as i64);

    (val << shift) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ramp() {
        for size in [256usize, 1024, 4096] {
            let shift = 16 - size.trailing_zeros();
            let ramp = GammaRamp::identity(size).unwrap();
            for channel in Channel::ALL {
                for (i, &v) in ramp.channel(channel).iter().enumerate() {
                    assert_eq!(v, (i << shift) as u16, "size {} entry {}", size, i);
                }
            }
        }
    }

    #[test]
    fn test_ramp_shift() {
        assert_eq!(ramp_shift(2), 15);
        assert_eq!(ramp_shift(256), 8);
        assert_eq!(ramp_shift(768), 6);
        assert_eq!(ramp_shift(3), 14);
        assert_eq!(ramp_shift(1 << 16), 0);
    }

    #[test]
    fn test_odd_sized_ramp_is_monotonic() {
        for size in [3usize, 768, 1000, 4095] {
            let ramp = GammaRamp::identity(size).unwrap();
            let red = ramp.channel(Channel::Red);
            assert!(
                red.windows(2).all(|pair| pair[0] < pair[1]),
                "size {} not strictly increasing",
                size
            );
            assert_eq!(red[0], 0);
            assert_eq!(red[size - 1], ((size - 1) << ramp_shift(size)) as u16);
        }
        let ramp = GammaRamp::identity(768).unwrap();
        assert_eq!(ramp.channel(Channel::Green)[256], 256 << 6);
    }

    #[test]
    fn test_odd_sized_ramp_with_gamma() {
        let mut input = GammaInput::default();
        input.assign(ColorValue::Gamma, [2.2; 3], ColorMask::ALL_CHANNELS);
        let mut ramp = GammaRamp::identity(768).unwrap();
        ramp.update(&input, ColorMask::ALL_CHANNELS);
        let blue = ramp.channel(Channel::Blue);
        assert!(blue.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(blue[767], 767 << 6);
    }

    #[test]
    fn test_compute_identity_values() {
        assert_eq!(compute_ramp_value(256, 0, 0.0, 0.0, 1.0), 0);
        assert_eq!(compute_ramp_value(256, 128, 0.0, 0.0, 1.0), 128 << 8);
        assert_eq!(compute_ramp_value(256, 255, 0.0, 0.0, 1.0), 255 << 8);
    }

    #[test]
    fn test_assign_clamps_contrast() {
        let mut input = GammaInput::default();
        input.assign(
            ColorValue::Contrast,
            [CONTRAST_MAX + 1.0; 3],
            ColorMask::ALL_CHANNELS,
        );
        for channel in Channel::ALL {
            assert_eq!(input.contrast(channel), CONTRAST_MAX);
        }
    }

    #[test]
    fn test_assign_clamps_gamma_and_brightness() {
        let mut input = GammaInput::default();
        input.assign(ColorValue::Gamma, [0.0, 50.0, 2.0], ColorMask::ALL_CHANNELS);
        assert_eq!(input.gamma(Channel::Red), GAMMA_MIN);
        assert_eq!(input.gamma(Channel::Green), GAMMA_MAX);
        assert_eq!(input.gamma(Channel::Blue), 2.0);

        input.assign(ColorValue::Brightness, [-3.0; 3], ColorMask::ALL_CHANNELS);
        assert_eq!(input.brightness(Channel::Red), BRIGHTNESS_MIN);
    }

    #[test]
    fn test_assign_respects_channel_mask() {
        let mut input = GammaInput::default();
        input.assign(ColorValue::Brightness, [0.5; 3], ColorMask::GREEN);
        assert_eq!(input.brightness(Channel::Red), BRIGHTNESS_DEFAULT);
        assert_eq!(input.brightness(Channel::Green), 0.5);
        assert_eq!(input.brightness(Channel::Blue), BRIGHTNESS_DEFAULT);
    }

    #[test]
    fn test_assign_ignores_nan() {
        let mut input = GammaInput::default();
        input.assign(ColorValue::Gamma, [f32::NAN; 3], ColorMask::ALL_CHANNELS);
        assert_eq!(input, GammaInput::default());
    }

    #[test]
    fn test_brightness_shifts_and_clamps() {
        let mut input = GammaInput::default();
        input.assign(ColorValue::Brightness, [1.0; 3], ColorMask::RED);
        let mut ramp = GammaRamp::identity(256).unwrap();
        ramp.update(&input, ColorMask::RED);

        // scale = 85, so entry 0 moves up to 85 and the top saturates
        assert_eq!(ramp.channel(Channel::Red)[0], 85 << 8);
        assert_eq!(ramp.channel(Channel::Red)[255], 255 << 8);
        assert_eq!(ramp.channel(Channel::Green)[0], 0);
    }

    #[test]
    fn test_gamma_brightens_midtones() {
        let mid = compute_ramp_value(256, 64, 0.0, 0.0, 2.0);
        assert!(mid > 64 << 8);
        let ramp_end = compute_ramp_value(256, 255, 0.0, 0.0, 2.0);
        assert_eq!(ramp_end, 255 << 8);
    }

    #[test]
    fn test_ramp_is_monotonic_with_contrast() {
        let mut input = GammaInput::default();
        input.assign(ColorValue::Contrast, [0.5; 3], ColorMask::ALL_CHANNELS);
        let mut ramp = GammaRamp::identity(1024).unwrap();
        ramp.update(&input, ColorMask::ALL_CHANNELS);
        let red = ramp.channel(Channel::Red);
        assert!(red.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_ramp_size_validation() {
        assert_eq!(GammaRamp::identity(0), Err(CtrlError::BadArgument));
        assert_eq!(GammaRamp::identity(1), Err(CtrlError::BadArgument));
        assert_eq!(
            GammaRamp::identity(GammaRamp::MAX_SIZE + 1),
            Err(CtrlError::BadArgument)
        );
        assert!(GammaRamp::from_channels(vec![0; 4], vec![0; 4], vec![0; 3]).is_err());
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!("Red".parse::<Channel>().unwrap(), Channel::Red);
        assert!("purple".parse::<Channel>().is_err());
    }
}
