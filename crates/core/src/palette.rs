//! Three-color palettes: table lookup, stage modulation, per-part
//! specialization and seed-derived harmonies.
//!
//! Everything here is a pure function of its inputs. Stage modulation and
//! harmony generation work in HSV (see [`crate::color`]).

use crate::color::{hsv_to_rgb, Hsv, Rgba};
use crate::seed::Seed;
use crate::spec::{EvolutionStage, Genre, HarmonyKind, Role};
use crate::template::PartType;
use serde::{Deserialize, Serialize};

/// Primary, secondary and accent colors of one sprite (or one part).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreeColorPalette {
    pub primary: Rgba,
    pub secondary: Rgba,
    pub accent: Rgba,
}

/// Colors as `0xRRGGBB` for compact tables.
fn hex(rgb: u32) -> Rgba {
    Rgba::rgb(
        ((rgb >> 16) & 0xff) as f64 / 255.0,
        ((rgb >> 8) & 0xff) as f64 / 255.0,
        (rgb & 0xff) as f64 / 255.0,
    )
}

fn table(primary: u32, secondary: u32, accent: u32) -> ThreeColorPalette {
    ThreeColorPalette {
        primary: hex(primary),
        secondary: hex(secondary),
        accent: hex(accent),
    }
}

fn mythic() -> ThreeColorPalette {
    table(0x7a4fc4, 0x3b2a6b, 0xf2c14e)
}

fn genre_table(genre: Genre) -> ThreeColorPalette {
    match genre {
        Genre::Fantasy => table(0x4f9d5d, 0x8a5a2b, 0xe8d36a),
        Genre::SciFi => table(0x3fa7d6, 0x2d3e50, 0x7ef9ff),
        Genre::Steampunk => table(0xb5733a, 0x5c4033, 0xd4af37),
        Genre::Cyberpunk => table(0xe0218a, 0x1b1b3a, 0x39ff14),
        Genre::Mythic => mythic(),
    }
}

fn role_table(role: Role) -> ThreeColorPalette {
    match role {
        Role::Scholar => table(0x3566a8, 0xc9b28f, 0xf5e6a8),
        Role::Guardian => table(0x8c8f99, 0x2f4b7c, 0xe3b448),
        Role::Trickster => table(0x9b3fb5, 0x2e8b57, 0xffa630),
        Role::Healer => table(0x6fcf97, 0xf2f2e6, 0xff8fa3),
        Role::Herald => table(0xd9482b, 0xf3d9a4, 0xffffff),
    }
}

impl Default for ThreeColorPalette {
    /// The mythic table, used when nothing more specific applies.
    fn default() -> Self {
        mythic()
    }
}

impl ThreeColorPalette {
    pub fn new(primary: Rgba, secondary: Rgba, accent: Rgba) -> Self {
        Self {
            primary,
            secondary,
            accent,
        }
    }

    /// Table lookup: a role override wins over the genre table.
    pub fn base(genre: Genre, role: Option<Role>) -> Self {
        match role {
            Some(role) => role_table(role),
            None => genre_table(genre),
        }
    }

    /// Scales saturation by `stage.intensity()` and value by
    /// `stage.brightness()` for all three colors, clamped to [0, 1].
    pub fn stage_modulate(self, stage: EvolutionStage) -> Self {
        let (s, v) = (stage.intensity(), stage.brightness());
        Self {
            primary: self.primary.boost(s, v),
            secondary: self.secondary.boost(s, v),
            accent: self.accent.boost(s, v),
        }
    }

    /// Remaps which color dominates for a given part type.
    pub fn specialize(self, part_type: PartType) -> Self {
        match part_type {
            PartType::Eyes => Self::new(self.accent, self.secondary, Rgba::WHITE),
            PartType::Effects => Self::new(
                self.accent.lerp(Rgba::WHITE, 0.35),
                self.accent,
                Rgba::WHITE,
            ),
            PartType::Head | PartType::Limbs | PartType::Tail => {
                Self::new(self.secondary, self.primary, self.accent)
            }
            PartType::Background => Self::new(self.secondary.shade(0.6), self.primary, self.accent),
            PartType::Body | PartType::Wings | PartType::Accessories => self,
        }
    }

    /// Derives a palette from the seed: a seed-chosen base hue plus two
    /// hues at fixed angular offsets for the given harmony.
    pub fn harmony(seed: &Seed, kind: HarmonyKind) -> Self {
        let mut rng = seed.stream("harmony");
        let base = rng.next_range(0.0, 360.0);
        let color = |offset: f64, s: f64, v: f64| {
            hsv_to_rgb(Hsv {
                h: (base + offset).rem_euclid(360.0),
                s,
                v,
            })
        };
        match kind {
            HarmonyKind::Triadic => Self::new(
                color(0.0, 0.7, 0.85),
                color(120.0, 0.7, 0.85),
                color(240.0, 0.7, 0.85),
            ),
            HarmonyKind::Complementary => Self::new(
                color(0.0, 0.7, 0.85),
                color(30.0, 0.7, 0.85),
                color(180.0, 0.7, 0.85),
            ),
            HarmonyKind::Analogous => Self::new(
                color(0.0, 0.7, 0.85),
                color(30.0, 0.7, 0.85),
                color(60.0, 0.7, 0.85),
            ),
            HarmonyKind::Monochromatic => Self::new(
                color(0.0, 0.75, 0.85),
                color(0.0, 0.5, 0.55),
                color(0.0, 0.3, 1.0),
            ),
        }
    }

    pub fn colors(&self) -> [Rgba; 3] {
        [self.primary, self.secondary, self.accent]
    }
}
