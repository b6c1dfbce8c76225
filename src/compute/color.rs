//! RGB565 color codec and linear color correction.
//!
//! The packed format is 5 bits red, 6 bits green, 5 bits blue (high to low).
//! Packing truncates the low bits of every channel, so `decode16` is the
//! nearest bit-replicated expansion rather than an exact inverse.

use serde::{Deserialize, Serialize};

/// 24-bit color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color24 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color24 {
    pub const BLACK: Color24 = Color24::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into RGB565.
    #[inline]
    pub fn to_color16(self) -> Color16 {
        encode16(self)
    }

    /// Scale all channels by `factor`, truncating.
    ///
    /// Used by previews to emulate the perceived brightness of a real panel.
    pub fn scale(self, factor: f32) -> Self {
        let f = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
        Self::new(f(self.r), f(self.g), f(self.b))
    }
}

impl From<[u8; 3]> for Color24 {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl From<Color24> for [u8; 3] {
    fn from(c: Color24) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Packed RGB565 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Color16(pub u16);

impl Color16 {
    /// 5-bit red component.
    #[inline]
    pub fn r5(self) -> u8 {
        ((self.0 >> 11) & 0x1F) as u8
    }

    /// 6-bit green component.
    #[inline]
    pub fn g6(self) -> u8 {
        ((self.0 >> 5) & 0x3F) as u8
    }

    /// 5-bit blue component.
    #[inline]
    pub fn b5(self) -> u8 {
        (self.0 & 0x1F) as u8
    }

    /// Expand to 24-bit color.
    #[inline]
    pub fn to_color24(self) -> Color24 {
        decode16(self)
    }
}

impl From<u16> for Color16 {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

impl From<Color16> for u16 {
    fn from(c: Color16) -> Self {
        c.0
    }
}

/// Pack a 24-bit color into RGB565 by dropping the low bits of each channel.
#[inline]
pub fn encode16(c: Color24) -> Color16 {
    let r5 = (c.r >> 3) as u16;
    let g6 = (c.g >> 2) as u16;
    let b5 = (c.b >> 3) as u16;
    Color16((r5 << 11) | (g6 << 5) | b5)
}

/// Expand RGB565 to 24-bit color with bit-replication scaling.
///
/// The constants are fixed; stored fixtures depend on them bit for bit.
#[inline]
pub fn decode16(c: Color16) -> Color24 {
    let r5 = c.r5() as u32;
    let g6 = c.g6() as u32;
    let b5 = c.b5() as u32;
    Color24::new(
        ((r5 * 527 + 23) >> 6) as u8,
        ((g6 * 259 + 33) >> 6) as u8,
        ((b5 * 527 + 23) >> 6) as u8,
    )
}

fn default_coefficient() -> f64 {
    1.0
}

/// Brightness, contrast and saturation coefficients.
///
/// All default to 1.0, which leaves colors untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorAdjust {
    /// >1 brightens, <1 darkens.
    #[serde(default = "default_coefficient")]
    pub brightness: f64,
    /// Stretch (>1) or compress (<1) around mid-gray 128.
    #[serde(default = "default_coefficient")]
    pub contrast: f64,
    /// >1 boosts, 0 produces grayscale.
    #[serde(default = "default_coefficient")]
    pub saturation: f64,
}

impl Default for ColorAdjust {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorAdjust {
    pub const IDENTITY: ColorAdjust = ColorAdjust {
        brightness: 1.0,
        contrast: 1.0,
        saturation: 1.0,
    };

    pub fn new(brightness: f64, contrast: f64, saturation: f64) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Apply to one color. See [`adjust`].
    #[inline]
    pub fn apply(&self, c: Color24) -> Color24 {
        adjust(c, self.brightness, self.contrast, self.saturation)
    }
}

/// Saturation, then contrast, then brightness; clamp and truncate.
///
/// Luma uses BT.601 weights and is truncated to an integer before the
/// saturation step.
pub fn adjust(c: Color24, brightness: f64, contrast: f64, saturation: f64) -> Color24 {
    let (r, g, b) = (c.r as f64, c.g as f64, c.b as f64);
    let gray = (0.299 * r + 0.587 * g + 0.114 * b).trunc();

    let channel = |v: f64| {
        let v = gray + (v - gray) * saturation;
        let v = (v - 128.0) * contrast + 128.0;
        let v = v * brightness;
        v.trunc().clamp(0.0, 255.0) as u8
    };

    Color24::new(channel(r), channel(g), channel(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_primaries() {
        assert_eq!(encode16(Color24::new(255, 0, 0)), Color16(0xF800));
        assert_eq!(encode16(Color24::new(0, 255, 0)), Color16(0x07E0));
        assert_eq!(encode16(Color24::new(0, 0, 255)), Color16(0x001F));
        assert_eq!(encode16(Color24::new(255, 255, 255)), Color16(0xFFFF));
        assert_eq!(encode16(Color24::BLACK), Color16(0));
    }

    #[test]
    fn test_decode_red() {
        assert_eq!(decode16(Color16(0xF800)), Color24::new(255, 0, 0));
        assert_eq!(decode16(Color16(0xFFFF)), Color24::new(255, 255, 255));
    }

    #[test]
    fn test_component_accessors() {
        let c = Color16(0b10101_110011_01110);
        assert_eq!(c.r5(), 0b10101);
        assert_eq!(c.g6(), 0b110011);
        assert_eq!(c.b5(), 0b01110);
    }

    #[test]
    fn test_every_packed_value_survives_expansion() {
        for v in 0..=u16::MAX {
            let packed = Color16(v);
            assert_eq!(encode16(decode16(packed)), packed, "value {v:#06x}");
        }
    }

    #[test]
    fn test_channel_error_bounded() {
        for v in 0..=255u8 {
            let rb = decode16(encode16(Color24::new(v, 0, v)));
            let g = decode16(encode16(Color24::new(0, v, 0)));
            assert!((rb.r as i16 - v as i16).abs() <= 8);
            assert!((rb.b as i16 - v as i16).abs() <= 8);
            assert!((g.g as i16 - v as i16).abs() <= 4);
        }
    }

    #[test]
    fn test_adjust_grayscale() {
        let c = adjust(Color24::new(200, 100, 50), 1.0, 1.0, 0.0);
        // trunc(0.299*200 + 0.587*100 + 0.114*50) = 124
        assert_eq!(c, Color24::new(124, 124, 124));
    }

    #[test]
    fn test_adjust_order() {
        // contrast before brightness: (10 - 128) * 2 + 128 = -108, * 0.5 = -54 -> 0
        let c = adjust(Color24::new(10, 10, 10), 0.5, 2.0, 1.0);
        assert_eq!(c, Color24::BLACK);
        // (200 - 128) * 2 + 128 = 272, * 0.5 = 136
        let c = adjust(Color24::new(200, 200, 200), 0.5, 2.0, 1.0);
        assert_eq!(c, Color24::new(136, 136, 136));
    }

    #[test]
    fn test_adjust_clamps() {
        let c = adjust(Color24::new(250, 250, 250), 2.0, 1.0, 1.0);
        assert_eq!(c, Color24::new(255, 255, 255));
    }

    #[test]
    fn test_scale_dims() {
        assert_eq!(
            Color24::new(255, 100, 5).scale(0.2),
            Color24::new(51, 20, 1)
        );
    }

    proptest! {
        #[test]
        fn prop_adjust_identity(r: u8, g: u8, b: u8) {
            let c = Color24::new(r, g, b);
            prop_assert_eq!(ColorAdjust::IDENTITY.apply(c), c);
        }

        #[test]
        fn prop_encode_deterministic(r: u8, g: u8, b: u8) {
            let c = Color24::new(r, g, b);
            prop_assert_eq!(encode16(c), encode16(c));
            prop_assert_eq!(encode16(c), c.to_color16());
        }
    }
}
