//! Owned RGBA pixel buffers and the blend modes used to composite parts.
//!
//! A [`RasterImage`] is a row-major `width × height` buffer of [`Rgba`]
//! pixels with point-filtering semantics: there is no interpolation, every
//! operation addresses whole pixels. Reads and writes are bounds-checked;
//! drawing helpers ([`RasterImage::plot`]) silently clip instead.

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::error::EngineError;
use crate::spec::named_enum;

/// How a part's pixels combine with what is already on the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Add,
}

named_enum!(BlendMode, "blend mode", [
    Normal => ("normal", "Normal"),
    Multiply => ("multiply", "Multiply"),
    Screen => ("screen", "Screen"),
    Add => ("add", "Add"),
]);

/// Blends `src` over `dst`.
///
/// A fully transparent operand short-circuits to the other one. `Normal` is
/// an alpha lerp of the color with source-over alpha. `Multiply`, `Screen`
/// and `Add` apply their per-channel formula, weighted by source alpha, and
/// keep the larger of the two alphas.
pub fn blend(dst: Rgba, src: Rgba, mode: BlendMode) -> Rgba {
    if src.is_transparent() {
        return dst;
    }
    if dst.is_transparent() {
        return src;
    }
    let t = src.a.clamp(0.0, 1.0);
    match mode {
        BlendMode::Normal => {
            let mix = |d: f64, s: f64| d * (1.0 - t) + s * t;
            Rgba {
                r: mix(dst.r, src.r),
                g: mix(dst.g, src.g),
                b: mix(dst.b, src.b),
                a: (t + dst.a * (1.0 - t)).clamp(0.0, 1.0),
            }
        }
        BlendMode::Multiply | BlendMode::Screen | BlendMode::Add => {
            let op = |d: f64, s: f64| match mode {
                BlendMode::Multiply => d * s,
                BlendMode::Screen => 1.0 - (1.0 - d) * (1.0 - s),
                _ => (d + s).min(1.0),
            };
            let channel = |d: f64, s: f64| d * (1.0 - t) + op(d, s) * t;
            Rgba {
                r: channel(dst.r, src.r),
                g: channel(dst.g, src.g),
                b: channel(dst.b, src.b),
                a: dst.a.max(src.a),
            }
        }
    }
}

/// Row-major RGBA buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl RasterImage {
    /// Creates a fully transparent image.
    ///
    /// Returns `EngineError::InvalidDimensions` if width or height is zero,
    /// or if `width * height` would overflow `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        Self::filled(width, height, Rgba::TRANSPARENT)
    }

    /// Creates an image with every pixel set to `color`.
    pub fn filled(width: usize, height: usize, color: Rgba) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .ok_or(EngineError::InvalidDimensions)?;
        Ok(Self {
            width,
            height,
            pixels: vec![color; len],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    fn out_of_bounds(&self, x: usize, y: usize) -> EngineError {
        EngineError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }

    /// Returns the pixel at (x, y), or `None` outside the image.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Overwrites the pixel at (x, y).
    pub fn set(&mut self, x: usize, y: usize, color: Rgba) -> Result<(), EngineError> {
        let i = self.index(x, y).ok_or_else(|| self.out_of_bounds(x, y))?;
        self.pixels[i] = color;
        Ok(())
    }

    /// Normal-blends `color` at signed coordinates, ignoring points outside
    /// the image. Shape drawing goes through here.
    pub fn plot(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 {
            return;
        }
        if let Some(i) = self.index(x as usize, y as usize) {
            self.pixels[i] = blend(self.pixels[i], color, BlendMode::Normal);
        }
    }

    /// Fills the axis-aligned rectangle `[x0, x1) × [y0, y1)`, clipped.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba) {
        for y in y0.max(0)..y1.min(self.height as i64) {
            for x in x0.max(0)..x1.min(self.width as i64) {
                self.plot(x, y, color);
            }
        }
    }

    /// Blends every pixel of `src` onto this image with its top-left corner
    /// at (x, y), clipped to this image's bounds.
    pub fn composite(&mut self, src: &RasterImage, x: i64, y: i64, mode: BlendMode) {
        for sy in 0..src.height {
            let ty = y + sy as i64;
            if ty < 0 || ty >= self.height as i64 {
                continue;
            }
            for sx in 0..src.width {
                let tx = x + sx as i64;
                if tx < 0 || tx >= self.width as i64 {
                    continue;
                }
                let s = src.pixels[sy * src.width + sx];
                let i = ty as usize * self.width + tx as usize;
                self.pixels[i] = blend(self.pixels[i], s, mode);
            }
        }
    }

    /// Copies `src` verbatim with its top-left corner at (x, y).
    ///
    /// Unlike [`composite`](Self::composite), the source must fit entirely.
    pub fn blit(&mut self, src: &RasterImage, x: usize, y: usize) -> Result<(), EngineError> {
        let fits_x = x.checked_add(src.width).is_some_and(|r| r <= self.width);
        let fits_y = y.checked_add(src.height).is_some_and(|b| b <= self.height);
        if !fits_x || !fits_y {
            return Err(self.out_of_bounds(x.saturating_add(src.width), y.saturating_add(src.height)));
        }
        for row in 0..src.height {
            let from = row * src.width;
            let to = (y + row) * self.width + x;
            self.pixels[to..to + src.width].copy_from_slice(&src.pixels[from..from + src.width]);
        }
        Ok(())
    }

    /// Extracts the `width × height` region at (x, y).
    pub fn crop(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<RasterImage, EngineError> {
        let mut out = RasterImage::new(width, height)?;
        for row in 0..height {
            for col in 0..width {
                let px = self
                    .get(x + col, y + row)
                    .ok_or_else(|| self.out_of_bounds(x + col, y + row))?;
                out.pixels[row * width + col] = px;
            }
        }
        Ok(out)
    }

    /// Applies `f` to every pixel.
    pub fn map_pixels(&mut self, f: impl Fn(Rgba) -> Rgba) {
        for px in &mut self.pixels {
            *px = f(*px);
        }
    }

    /// Number of pixels with non-zero alpha.
    pub fn opaque_count(&self) -> usize {
        self.pixels.iter().filter(|px| !px.is_transparent()).count()
    }
}
