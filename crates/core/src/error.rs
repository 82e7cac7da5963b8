//! Error types for the spriteforge core.

use thiserror::Error;

/// Errors produced by generation, template registration and rig export.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Width or height was zero, or `width * height` overflowed.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A sprite spec broke one of its invariants.
    #[error("invalid sprite spec: {0}")]
    InvalidSpec(String),

    /// A string did not name a known variant of an enumerated field.
    #[error("unknown {field} '{value}'")]
    UnknownVariant { field: &'static str, value: String },

    /// A part template was rejected at registration.
    #[error("invalid part template '{id}': {reason}")]
    InvalidTemplate { id: String, reason: String },

    /// An asset-backed template had no pixel data to rasterize.
    #[error("part template '{0}' uses asset generation but carries no pixels")]
    MissingAsset(String),

    /// A bone referenced a parent that is not an earlier bone of the structure.
    #[error("bone '{bone}' references parent '{parent}' which is not an earlier bone")]
    MalformedBone { bone: String, parent: String },

    /// Two bones in one structure shared a name.
    #[error("duplicate bone name: {0}")]
    DuplicateBone(String),

    /// An (x, y) coordinate was outside the raster bounds.
    #[error("index ({x}, {y}) out of bounds for image of size ({width}, {height})")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Writing an artifact failed. Only produced by output layers.
    #[error("i/o error: {0}")]
    Io(String),
}

impl EngineError {
    pub(crate) fn unknown(field: &'static str, value: &str) -> Self {
        EngineError::UnknownVariant {
            field,
            value: value.to_string(),
        }
    }
}
