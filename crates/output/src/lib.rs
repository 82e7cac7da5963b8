#![deny(unsafe_code)]
//! Writers for spriteforge generation results.
//!
//! `spriteforge-core` performs no I/O. This crate turns a
//! [`GenerationResult`](spriteforge_core::GenerationResult) into files: the
//! sheet as PNG, the descriptive record and animation metadata as JSON, and
//! rig interchange documents. PNG encoding sits behind the `png` feature
//! (default on); the pixel conversion in [`pixel`] and the JSON writers in
//! [`document`] are always available.

pub mod document;
pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

pub use document::{write_animation, write_record, write_rig};
pub use pixel::{frame_to_rgba8, image_to_rgba8};

#[cfg(feature = "png")]
pub use snapshot::{write_frames, write_png};
