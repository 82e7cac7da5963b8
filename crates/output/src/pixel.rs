//! RGBA8 conversion of sprite rasters.
//!
//! Always available so that callers without the `png` feature can hand the
//! bytes to their own encoder.

use spriteforge_core::compose::FrameRect;
use spriteforge_core::{EngineError, RasterImage};

/// Straight (non-premultiplied) RGBA8 bytes, row-major, `width * height * 4`
/// long. Fully transparent pixels come out as `[0, 0, 0, 0]`.
pub fn image_to_rgba8(image: &RasterImage) -> Vec<u8> {
    image
        .pixels()
        .iter()
        .flat_map(|px| {
            if px.is_transparent() {
                [0; 4]
            } else {
                px.to_rgba8()
            }
        })
        .collect()
}

/// RGBA8 bytes of one sheet cell.
///
/// Returns `EngineError::OutOfBounds` if `rect` does not lie inside `sheet`.
pub fn frame_to_rgba8(sheet: &RasterImage, rect: &FrameRect) -> Result<Vec<u8>, EngineError> {
    let cell = sheet.crop(rect.x, rect.y, rect.width, rect.height)?;
    Ok(image_to_rgba8(&cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spriteforge_core::{generate, Archetype, Genre, Rgba, Seed, SpriteSpec};

    #[test]
    fn buffer_has_four_bytes_per_pixel() {
        let image = RasterImage::new(8, 4).unwrap();
        assert_eq!(image_to_rgba8(&image).len(), 8 * 4 * 4);
    }

    #[test]
    fn transparent_pixels_are_zeroed() {
        let image = RasterImage::filled(2, 2, Rgba::new(0.8, 0.2, 0.4, 0.0)).unwrap();
        assert!(image_to_rgba8(&image).iter().all(|&b| b == 0));
    }

    #[test]
    fn opaque_pixels_keep_full_alpha() {
        let image = RasterImage::filled(3, 3, Rgba::rgb(1.0, 0.0, 0.0)).unwrap();
        let buf = image_to_rgba8(&image);
        for px in buf.chunks_exact(4) {
            assert_eq!(px, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn frames_tile_the_sheet() {
        let spec = SpriteSpec::new(Archetype::Golem, Genre::Fantasy, 16, 16);
        let result = generate(&Seed::new("tiles"), &spec).unwrap();
        let mut total = 0;
        for rect in &result.animation.frames {
            let buf = frame_to_rgba8(&result.image, rect).unwrap();
            assert_eq!(buf.len(), 16 * 16 * 4);
            total += buf.len();
        }
        assert_eq!(total, image_to_rgba8(&result.image).len());
    }

    #[test]
    fn frame_outside_the_sheet_is_rejected() {
        let spec = SpriteSpec::new(Archetype::Wisp, Genre::SciFi, 8, 8);
        let result = generate(&Seed::new("edge"), &spec).unwrap();
        let mut rect = result.animation.frames[0].clone();
        rect.x = result.image.width();
        assert!(matches!(
            frame_to_rgba8(&result.image, &rect),
            Err(EngineError::OutOfBounds { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use spriteforge_core::Rgba;

    proptest! {
        #[test]
        fn alpha_byte_is_zero_only_for_transparent(
            w in 1usize..12,
            h in 1usize..12,
            a in 0.0_f64..=1.0,
        ) {
            let image = RasterImage::filled(w, h, Rgba::new(0.5, 0.5, 0.5, a)).unwrap();
            let buf = image_to_rgba8(&image);
            prop_assert_eq!(buf.len(), w * h * 4);
            let expected = if a <= 0.0 { 0 } else { (a * 255.0).round() as u8 };
            prop_assert!(buf.chunks_exact(4).all(|px| px[3] == expected));
        }
    }
}
