#![deny(unsafe_code)]
//! Core of the spriteforge procedural sprite engine.
//!
//! Turns a string seed and a [`SpriteSpec`] into a layered pixel-art sprite
//! sheet (optionally an evolution-stage grid) with animation metadata, a
//! provenance hash and a [`DescriptiveRecord`], and exports the composition
//! as Spine or DragonBones rigs. Generation is deterministic: the same seed
//! and spec give byte-identical output across runs and threads. Seeding and
//! part selection are integer-only; shape masks use `f64` trigonometry, whose
//! last-bit rounding the standard library does not pin down across targets.
//!
//! The crate performs no I/O; see `spriteforge-output` for PNG and JSON
//! writers.

pub mod color;
pub mod compose;
pub mod error;
pub mod palette;
pub mod params;
pub mod prng;
pub mod raster;
pub mod rasterize;
pub mod record;
pub mod rig;
pub mod seed;
pub mod spec;
pub mod template;

pub use color::Rgba;
pub use compose::{generate, GenerationResult, GridLayout, SpriteGenerator};
pub use error::EngineError;
pub use palette::ThreeColorPalette;
pub use prng::Xorshift64;
pub use raster::{BlendMode, RasterImage};
pub use record::DescriptiveRecord;
pub use rig::{bone_structure, export, ExchangeRecord, RigFormat};
pub use seed::{provenance_hash, Seed};
pub use spec::{
    AnimationSet, Archetype, EvolutionStage, Genre, HarmonyKind, Rarity, Role, Size, SpriteSpec,
};
pub use template::{PartTemplate, PartType, TemplateLibrary};
