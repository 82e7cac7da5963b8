//! RGBA color and HSV conversions.
//!
//! Sprite pixels and palette entries are [`Rgba`] values with components in
//! [0, 1]. Palette modulation (stage intensity, harmony hues) works in HSV,
//! so this module also provides the [`Hsv`] type and pure conversion
//! functions between the two.

use crate::error::EngineError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Straight (non-premultiplied) RGBA color with components in [0, 1].
///
/// Serializes as `"#rrggbb"` when opaque and `"#rrggbbaa"` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// Hue / saturation / value. Hue in degrees [0, 360), s and v in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parses `"#rrggbb"`, `"#rrggbbaa"` or the same without `#`.
    pub fn from_hex(hex: &str) -> Result<Rgba, EngineError> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 && hex.len() != 8 {
            return Err(EngineError::InvalidColor(format!(
                "expected 6 or 8 hex digits, got {}",
                hex.len()
            )));
        }
        let component = |range: std::ops::Range<usize>, name: &str| {
            hex.get(range)
                .ok_or_else(|| EngineError::InvalidColor(format!("invalid {name} component")))
                .and_then(|digits| {
                    u8::from_str_radix(digits, 16).map_err(|e| {
                        EngineError::InvalidColor(format!("invalid {name} component: {e}"))
                    })
                })
                .map(|v| v as f64 / 255.0)
        };
        let a = if hex.len() == 8 {
            component(6..8, "alpha")?
        } else {
            1.0
        };
        Ok(Rgba {
            r: component(0..2, "red")?,
            g: component(2..4, "green")?,
            b: component(4..6, "blue")?,
            a,
        })
    }

    /// Formats as `"#rrggbb"` (opaque) or `"#rrggbbaa"`, quantized to 8 bits.
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    /// Quantizes to 8-bit channels with rounding, clamping out-of-range values.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Linear interpolation of all four channels, `t` clamped to [0, 1].
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a * (1.0 - t) + b * t;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Multiplies r, g and b by `factor` (alpha untouched), clamped.
    pub fn shade(self, factor: f64) -> Rgba {
        Rgba {
            r: (self.r * factor).clamp(0.0, 1.0),
            g: (self.g * factor).clamp(0.0, 1.0),
            b: (self.b * factor).clamp(0.0, 1.0),
            a: self.a,
        }
    }

    pub fn is_transparent(self) -> bool {
        self.a <= 0.0
    }

    /// Scales saturation and value in HSV space, clamped to [0, 1]; alpha is preserved.
    pub fn boost(self, saturation: f64, value: f64) -> Rgba {
        let hsv = rgb_to_hsv(self);
        let out = hsv_to_rgb(Hsv {
            h: hsv.h,
            s: (hsv.s * saturation).clamp(0.0, 1.0),
            v: (hsv.v * value).clamp(0.0, 1.0),
        });
        out.with_alpha(self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Converts the color channels of `c` to HSV. Alpha is ignored.
///
/// Achromatic colors (max == min) get hue 0 and saturation 0.
pub fn rgb_to_hsv(c: Rgba) -> Hsv {
    let max = c.r.max(c.g).max(c.b);
    let min = c.r.min(c.g).min(c.b);
    let delta = max - min;

    let h = if delta <= 0.0 {
        0.0
    } else if max == c.r {
        60.0 * ((c.g - c.b) / delta).rem_euclid(6.0)
    } else if max == c.g {
        60.0 * ((c.b - c.r) / delta + 2.0)
    } else {
        60.0 * ((c.r - c.g) / delta + 4.0)
    };
    let s = if max <= 0.0 { 0.0 } else { delta / max };

    Hsv {
        h: h.rem_euclid(360.0),
        s,
        v: max,
    }
}

/// Converts HSV to an opaque color. Hue is wrapped, s and v are clamped.
pub fn hsv_to_rgb(c: Hsv) -> Rgba {
    let h = c.h.rem_euclid(360.0);
    let s = c.s.clamp(0.0, 1.0);
    let v = c.v.clamp(0.0, 1.0);

    let chroma = v * s;
    let sector = h / 60.0;
    let x = chroma * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = v - chroma;
    Rgba::rgb(r + m, g + m, b + m)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    // -- HSV conversions --

    #[test]
    fn pure_red_has_hue_zero_full_saturation() {
        let hsv = rgb_to_hsv(Rgba::rgb(1.0, 0.0, 0.0));
        assert!(approx_eq(hsv.h, 0.0));
        assert!(approx_eq(hsv.s, 1.0));
        assert!(approx_eq(hsv.v, 1.0));
    }

    #[test]
    fn pure_green_and_blue_hues() {
        assert!(approx_eq(rgb_to_hsv(Rgba::rgb(0.0, 1.0, 0.0)).h, 120.0));
        assert!(approx_eq(rgb_to_hsv(Rgba::rgb(0.0, 0.0, 1.0)).h, 240.0));
    }

    #[test]
    fn gray_is_achromatic() {
        let hsv = rgb_to_hsv(Rgba::rgb(0.5, 0.5, 0.5));
        assert_eq!(hsv.h, 0.0);
        assert_eq!(hsv.s, 0.0);
        assert!(approx_eq(hsv.v, 0.5));
    }

    #[test]
    fn black_has_zero_saturation() {
        let hsv = rgb_to_hsv(Rgba::BLACK);
        assert_eq!(hsv.s, 0.0);
        assert_eq!(hsv.v, 0.0);
    }

    #[test]
    fn hsv_to_rgb_wraps_hue() {
        let a = hsv_to_rgb(Hsv {
            h: 30.0,
            s: 0.5,
            v: 0.8,
        });
        let b = hsv_to_rgb(Hsv {
            h: 390.0,
            s: 0.5,
            v: 0.8,
        });
        assert!(approx_eq(a.r, b.r) && approx_eq(a.g, b.g) && approx_eq(a.b, b.b));
    }

    #[test]
    fn boost_preserves_alpha_and_clamps() {
        let c = Rgba::new(0.2, 0.6, 0.4, 0.5).boost(5.0, 5.0);
        assert_eq!(c.a, 0.5);
        for v in [c.r, c.g, c.b] {
            assert!((0.0..=1.0).contains(&v), "channel {v} out of range");
        }
    }

    #[test]
    fn boost_identity_factors_keep_color() {
        let c = Rgba::new(0.2, 0.6, 0.4, 1.0);
        let b = c.boost(1.0, 1.0);
        assert!(approx_eq(c.r, b.r) && approx_eq(c.g, b.g) && approx_eq(c.b, b.b));
    }

    // -- Hex --

    #[test]
    fn from_hex_parses_opaque_and_alpha_forms() {
        let red = Rgba::from_hex("#ff0000").unwrap();
        assert_eq!(red, Rgba::rgb(1.0, 0.0, 0.0));
        let half = Rgba::from_hex("00ff0080").unwrap();
        assert!(approx_eq(half.a, 128.0 / 255.0));
    }

    #[test]
    fn from_hex_returns_error_for_invalid_hex() {
        assert!(Rgba::from_hex("#gggggg").is_err());
        assert!(Rgba::from_hex("#fff").is_err());
        assert!(Rgba::from_hex("").is_err());
        assert!(Rgba::from_hex("#ff00ff00ff").is_err());
        assert!(Rgba::from_hex("ééé").is_err());
    }

    #[test]
    fn to_hex_omits_alpha_when_opaque() {
        assert_eq!(Rgba::rgb(1.0, 0.0, 0.0).to_hex(), "#ff0000");
        assert_eq!(Rgba::new(0.0, 0.0, 0.0, 0.0).to_hex(), "#00000000");
    }

    #[test]
    fn to_rgba8_clamps_out_of_range() {
        assert_eq!(Rgba::new(1.5, -0.1, 0.5, 1.0).to_rgba8(), [255, 0, 128, 255]);
    }

    #[test]
    fn rgba_serializes_as_hex_string() {
        let json = serde_json::to_string(&Rgba::rgb(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(json, "\"#ff0000\"");
        let back: Rgba = serde_json::from_str("\"#00ff00\"").unwrap();
        assert_eq!(back, Rgba::rgb(0.0, 1.0, 0.0));
    }

    #[test]
    fn lerp_endpoints_are_exact() {
        let a = Rgba::new(0.1, 0.2, 0.3, 0.4);
        let b = Rgba::new(0.9, 0.8, 0.7, 1.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn unit() -> impl Strategy<Value = f64> {
            0.0_f64..=1.0
        }

        proptest! {
            #[test]
            fn hsv_round_trip_within_epsilon(r in unit(), g in unit(), b in unit()) {
                let original = Rgba::rgb(r, g, b);
                let back = hsv_to_rgb(rgb_to_hsv(original));
                prop_assert!((back.r - r).abs() < 1e-9, "r: {} vs {}", back.r, r);
                prop_assert!((back.g - g).abs() < 1e-9, "g: {} vs {}", back.g, g);
                prop_assert!((back.b - b).abs() < 1e-9, "b: {} vs {}", back.b, b);
            }

            #[test]
            fn hsv_components_in_range(r in unit(), g in unit(), b in unit()) {
                let hsv = rgb_to_hsv(Rgba::rgb(r, g, b));
                prop_assert!((0.0..360.0).contains(&hsv.h));
                prop_assert!((0.0..=1.0).contains(&hsv.s));
                prop_assert!((0.0..=1.0).contains(&hsv.v));
            }
        }
    }
}
