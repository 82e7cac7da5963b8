//! The generation request: [`SpriteSpec`] and the enumerations it is built from.
//!
//! A spec is caller-owned and read-only for the duration of a generation
//! call. It serializes to JSON so callers can keep specs as config files.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Implements `ALL`, `name()`, `Display` (human label) and `FromStr`
/// (accepting the snake_case name or the label, case-insensitively).
macro_rules! named_enum {
    ($ty:ident, $field:literal, [$($variant:ident => ($name:literal, $label:literal)),+ $(,)?]) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// The snake_case identifier used in JSON and on the command line.
            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }

            /// Human-readable label used in descriptive records.
            pub fn label(self) -> &'static str {
                match self {
                    $($ty::$variant => $label),+
                }
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = $crate::error::EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name().eq_ignore_ascii_case(s) || v.label().eq_ignore_ascii_case(s))
                    .ok_or_else(|| $crate::error::EngineError::unknown($field, s))
            }
        }
    };
}

pub(crate) use named_enum;

/// Creature body-plan category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Familiar,
    Golem,
    Wisp,
    Sentinel,
    Homunculus,
    Automaton,
    Drifter,
    Warder,
}

named_enum!(Archetype, "archetype", [
    Familiar => ("familiar", "Familiar"),
    Golem => ("golem", "Golem"),
    Wisp => ("wisp", "Wisp"),
    Sentinel => ("sentinel", "Sentinel"),
    Homunculus => ("homunculus", "Homunculus"),
    Automaton => ("automaton", "Automaton"),
    Drifter => ("drifter", "Drifter"),
    Warder => ("warder", "Warder"),
]);

/// The four silhouettes every archetype draws and rigs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPlan {
    Familiar,
    Golem,
    Wisp,
    Sentinel,
}

impl Archetype {
    /// Archetypes without a bespoke silhouette borrow their nearest sibling's.
    pub fn body_plan(self) -> BodyPlan {
        match self {
            Archetype::Familiar | Archetype::Homunculus => BodyPlan::Familiar,
            Archetype::Golem | Archetype::Automaton => BodyPlan::Golem,
            Archetype::Wisp | Archetype::Drifter => BodyPlan::Wisp,
            Archetype::Sentinel | Archetype::Warder => BodyPlan::Sentinel,
        }
    }
}

/// Thematic skin driving base palette selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Fantasy,
    SciFi,
    Steampunk,
    Cyberpunk,
    Mythic,
}

named_enum!(Genre, "genre", [
    Fantasy => ("fantasy", "Fantasy"),
    SciFi => ("sci_fi", "Sci-Fi"),
    Steampunk => ("steampunk", "Steampunk"),
    Cyberpunk => ("cyberpunk", "Cyberpunk"),
    Mythic => ("mythic", "Mythic"),
]);

/// Optional role override. Takes precedence over genre for palettes and over
/// rarity for frame counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Scholar,
    Guardian,
    Trickster,
    Healer,
    Herald,
}

named_enum!(Role, "role", [
    Scholar => ("scholar", "Scholar"),
    Guardian => ("guardian", "Guardian"),
    Trickster => ("trickster", "Trickster"),
    Healer => ("healer", "Healer"),
    Herald => ("herald", "Herald"),
]);

impl Role {
    /// Roles with signature animations force their own frame count.
    pub fn frame_override(self) -> Option<u32> {
        match self {
            Role::Trickster => Some(6),
            Role::Herald => Some(8),
            Role::Scholar | Role::Guardian | Role::Healer => None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

named_enum!(Rarity, "rarity", [
    Common => ("common", "Common"),
    Uncommon => ("uncommon", "Uncommon"),
    Rare => ("rare", "Rare"),
    Epic => ("epic", "Epic"),
    Legendary => ("legendary", "Legendary"),
]);

impl Rarity {
    /// Animation frames per row in standard generation.
    pub fn frame_count(self) -> u32 {
        match self {
            Rarity::Common | Rarity::Uncommon => 4,
            Rarity::Rare | Rarity::Epic => 6,
            Rarity::Legendary => 8,
        }
    }
}

/// Ordered growth phase. `Egg < Baby < … < Legendary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionStage {
    Egg,
    Baby,
    Juvenile,
    Adult,
    Elder,
    Legendary,
}

named_enum!(EvolutionStage, "evolution stage", [
    Egg => ("egg", "Egg"),
    Baby => ("baby", "Baby"),
    Juvenile => ("juvenile", "Juvenile"),
    Adult => ("adult", "Adult"),
    Elder => ("elder", "Elder"),
    Legendary => ("legendary", "Legendary"),
]);

impl EvolutionStage {
    /// Stage used for every part in standard (non-chain) generation.
    pub const STANDARD: EvolutionStage = EvolutionStage::Adult;

    /// Saturation multiplier. Non-decreasing from Egg to Legendary.
    pub fn intensity(self) -> f64 {
        match self {
            EvolutionStage::Egg => 0.6,
            EvolutionStage::Baby => 0.75,
            EvolutionStage::Juvenile => 0.9,
            EvolutionStage::Adult => 1.0,
            EvolutionStage::Elder => 1.15,
            EvolutionStage::Legendary => 1.3,
        }
    }

    /// Value (brightness) multiplier. Non-decreasing from Egg to Legendary.
    pub fn brightness(self) -> f64 {
        match self {
            EvolutionStage::Egg => 0.7,
            EvolutionStage::Baby => 0.8,
            EvolutionStage::Juvenile => 0.9,
            EvolutionStage::Adult => 1.0,
            EvolutionStage::Elder => 1.1,
            EvolutionStage::Legendary => 1.2,
        }
    }

    /// Silhouette scale relative to an adult.
    pub fn size_multiplier(self) -> f64 {
        match self {
            EvolutionStage::Egg => 0.3,
            EvolutionStage::Baby => 0.5,
            EvolutionStage::Juvenile => 0.7,
            EvolutionStage::Adult => 1.0,
            EvolutionStage::Elder => 1.15,
            EvolutionStage::Legendary => 1.3,
        }
    }

    /// Frames per second for this stage; older creatures move slower.
    pub fn frame_rate(self) -> u32 {
        match self {
            EvolutionStage::Egg | EvolutionStage::Baby => 10,
            EvolutionStage::Juvenile | EvolutionStage::Adult => 8,
            EvolutionStage::Elder | EvolutionStage::Legendary => 6,
        }
    }

    /// Seconds each frame of this stage is shown, `1 / frame_rate`.
    pub fn frame_duration(self) -> f64 {
        1.0 / self.frame_rate() as f64
    }
}

/// A named animation the caller wants the sprite (and its rig) to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationSet {
    Idle,
    Walk,
    Cast,
    Attack,
    Hurt,
    Float,
}

named_enum!(AnimationSet, "animation set", [
    Idle => ("idle", "Idle"),
    Walk => ("walk", "Walk"),
    Cast => ("cast", "Cast"),
    Attack => ("attack", "Attack"),
    Hurt => ("hurt", "Hurt"),
    Float => ("float", "Float"),
]);

/// Hue relationship used by seed-derived palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonyKind {
    Triadic,
    Complementary,
    Analogous,
    Monochromatic,
}

named_enum!(HarmonyKind, "harmony", [
    Triadic => ("triadic", "Triadic"),
    Complementary => ("complementary", "Complementary"),
    Analogous => ("analogous", "Analogous"),
    Monochromatic => ("monochromatic", "Monochromatic"),
]);

/// Pixel dimensions of one sprite cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

fn default_animations() -> Vec<AnimationSet> {
    vec![AnimationSet::Idle]
}

fn default_frames_per_stage() -> u32 {
    1
}

/// Immutable generation request.
///
/// Two identical specs generated from the same seed string produce
/// byte-identical sprites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSpec {
    pub archetype: Archetype,
    pub genre: Genre,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub size: Size,
    #[serde(default = "default_animations")]
    pub animations: Vec<AnimationSet>,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub evolution_chain: bool,
    #[serde(default)]
    pub stages: Vec<EvolutionStage>,
    #[serde(default = "default_frames_per_stage")]
    pub frames_per_stage: u32,
    #[serde(default)]
    pub traits: Map<String, Value>,
    #[serde(default)]
    pub token_id: String,
    /// When set, colors come from a seed-derived harmony instead of the
    /// genre/role tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmony: Option<HarmonyKind>,
}

impl SpriteSpec {
    /// Creates a standard (non-chain) Common spec with the Idle animation.
    pub fn new(archetype: Archetype, genre: Genre, width: usize, height: usize) -> Self {
        Self {
            archetype,
            genre,
            role: None,
            size: Size::new(width, height),
            animations: default_animations(),
            rarity: Rarity::Common,
            evolution_chain: false,
            stages: Vec::new(),
            frames_per_stage: default_frames_per_stage(),
            traits: Map::new(),
            token_id: String::new(),
            harmony: None,
        }
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_animations(mut self, animations: Vec<AnimationSet>) -> Self {
        self.animations = animations;
        self
    }

    /// Requests an evolution grid: one row per stage, `frames_per_stage` columns.
    pub fn with_evolution(mut self, stages: Vec<EvolutionStage>, frames_per_stage: u32) -> Self {
        self.evolution_chain = true;
        self.stages = stages;
        self.frames_per_stage = frames_per_stage;
        self
    }

    pub fn with_token(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = token_id.into();
        self
    }

    pub fn with_trait(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.traits.insert(key.into(), value.into());
        self
    }

    pub fn with_harmony(mut self, kind: HarmonyKind) -> Self {
        self.harmony = Some(kind);
        self
    }

    /// Frames per row in standard generation. A role override wins over rarity.
    pub fn frame_count(&self) -> u32 {
        self.role
            .and_then(Role::frame_override)
            .unwrap_or_else(|| self.rarity.frame_count())
    }

    /// Checks dimensions and the evolution-chain invariant.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.size.width == 0 || self.size.height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        self.size
            .width
            .checked_mul(self.size.height)
            .ok_or(EngineError::InvalidDimensions)?;
        if self.evolution_chain {
            if self.stages.is_empty() {
                return Err(EngineError::InvalidSpec(
                    "evolution chain requested without stages".into(),
                ));
            }
            if self.frames_per_stage == 0 {
                return Err(EngineError::InvalidSpec(
                    "evolution chain requires frames_per_stage >= 1".into(),
                ));
            }
        }
        Ok(())
    }
}
