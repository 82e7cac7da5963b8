//! PNG encoding of sprite sheets and individual frames.
//!
//! Feature-gated behind `png` (default on) so that embedders can depend on
//! this crate without pulling in the `image` crate.

use std::fs;
use std::path::{Path, PathBuf};

use spriteforge_core::compose::AnimationMeta;
use spriteforge_core::{EngineError, RasterImage};
use tracing::debug;

use crate::pixel::{frame_to_rgba8, image_to_rgba8};

fn encode(rgba: Vec<u8>, width: usize, height: usize, path: &Path) -> Result<(), EngineError> {
    let w = u32::try_from(width).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u32::try_from(height).map_err(|_| EngineError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EngineError::Io(e.to_string()))
}

/// Writes the whole sheet as one RGBA PNG.
///
/// Returns `EngineError::InvalidDimensions` if the sheet dimensions overflow
/// `u32`, or `EngineError::Io` on write failure.
pub fn write_png(image: &RasterImage, path: &Path) -> Result<(), EngineError> {
    encode(image_to_rgba8(image), image.width(), image.height(), path)?;
    debug!(path = %path.display(), width = image.width(), height = image.height(), "wrote sheet");
    Ok(())
}

/// Writes every cell of the sheet as `<stage>_<frame>.png` under `dir`,
/// creating it if needed. Returns the written paths in sheet order.
pub fn write_frames(
    image: &RasterImage,
    animation: &AnimationMeta,
    dir: &Path,
) -> Result<Vec<PathBuf>, EngineError> {
    fs::create_dir_all(dir).map_err(|e| EngineError::Io(format!("{}: {e}", dir.display())))?;
    animation
        .frames
        .iter()
        .map(|rect| {
            let path = dir.join(format!("{}_{}.png", rect.stage.name(), rect.frame));
            encode(frame_to_rgba8(image, rect)?, rect.width, rect.height, &path)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use spriteforge_core::{generate, Archetype, EvolutionStage, Genre, Seed, SpriteSpec};

    #[test]
    fn write_png_round_trip() {
        let spec = SpriteSpec::new(Archetype::Familiar, Genre::Mythic, 16, 16);
        let result = generate(&Seed::new("png"), &spec).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");

        write_png(&result.image, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.width() as usize, result.image.width());
        assert_eq!(img.height(), 16);
        assert_eq!(img.into_raw(), image_to_rgba8(&result.image));
    }

    #[test]
    fn write_png_into_missing_directory_is_io_error() {
        let image = RasterImage::new(4, 4).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("sheet.png");
        assert!(matches!(write_png(&image, &path), Err(EngineError::Io(_))));
    }

    #[test]
    fn write_frames_names_cells_by_stage_and_frame() {
        let spec = SpriteSpec::new(Archetype::Sentinel, Genre::SciFi, 12, 12)
            .with_evolution(vec![EvolutionStage::Baby, EvolutionStage::Elder], 2);
        let result = generate(&Seed::new("frames"), &spec).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames");

        let paths = write_frames(&result.image, &result.animation, &out).unwrap();

        assert_eq!(paths.len(), 4);
        assert!(paths[0].ends_with("baby_0.png"));
        assert!(paths[3].ends_with("elder_1.png"));
        for path in &paths {
            let img = image::open(path).unwrap();
            assert_eq!((img.width(), img.height()), (12, 12));
        }
    }
}
