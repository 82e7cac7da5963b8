//! Procedural painting of one part into its own pixel buffer.
//!
//! Every part is laid out relative to a shared [`BodyFrame`]: the center and
//! radius of the creature's body for the current stage and frame. That keeps
//! heads on bodies and eyes on heads without the parts knowing about each
//! other, and lets each part be rasterized independently and in any order.
//!
//! Two clocks drive animation. The row clock (`frame / frames`) moves the
//! whole creature (a vertical bob), so every part follows the body. A
//! template's own clock (`frame % frame_count`, only when `animated`) drives
//! secondary motion such as tail sway, wing flaps and blinking.

use std::f64::consts::TAU;

use glam::DVec2;
use noise::{NoiseFn, Perlin};

use crate::color::Rgba;
use crate::error::EngineError;
use crate::palette::ThreeColorPalette;
use crate::prng::Xorshift64;
use crate::raster::{BlendMode, RasterImage};
use crate::spec::{BodyPlan, EvolutionStage, Size, SpriteSpec};
use crate::template::{GenerationMethod, PartTemplate, PartType};

/// Everything a part needs besides its template and random stream.
#[derive(Debug, Clone, Copy)]
pub struct RasterRequest<'a> {
    pub spec: &'a SpriteSpec,
    /// Sprite palette for this stage, before per-part specialization.
    pub palette: &'a ThreeColorPalette,
    pub stage: EvolutionStage,
    pub frame: u32,
    /// Number of frames in the row `frame` belongs to.
    pub frames: u32,
    pub noise_seed: u32,
}

/// Paints `template` for one (stage, frame) cell.
///
/// The image is sized to the template's fixed size, or to the sprite cell
/// when the template has none. Parts below their type's minimum stage come
/// back fully transparent. Output is bit-identical for identical inputs and
/// identical `rng` state.
///
/// Returns `EngineError::MissingAsset` for an `Asset`/`Hybrid` template that
/// carries no pixels.
pub fn rasterize(
    template: &PartTemplate,
    request: &RasterRequest<'_>,
    rng: &mut Xorshift64,
) -> Result<RasterImage, EngineError> {
    let size = template.resolved_size(request.spec.size);
    let mut image = RasterImage::new(size.width, size.height)?;

    let asset = match template.method {
        GenerationMethod::Procedural => None,
        GenerationMethod::Asset | GenerationMethod::Hybrid => Some(
            template
                .asset
                .as_deref()
                .ok_or_else(|| EngineError::MissingAsset(template.id.clone()))?,
        ),
    };

    if request.stage < template.part_type.min_stage() {
        return Ok(image);
    }

    if template.method != GenerationMethod::Asset {
        Painter::new(&mut image, template, request).paint(template.part_type, rng);
    }
    if let Some(asset) = asset {
        image.composite(asset, 0, 0, BlendMode::Normal);
    }
    Ok(image)
}

/// Body placement shared by every part of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyFrame {
    pub center: DVec2,
    pub radius: f64,
}

impl BodyFrame {
    /// Body placement inside a `size` buffer at `stage`, bobbing over a row
    /// of `frames` frames.
    pub fn locate(size: Size, stage: EvolutionStage, frame: u32, frames: u32) -> Self {
        let extent = size.width.min(size.height) as f64 * 0.34;
        let radius = (extent * stage.size_multiplier()).max(1.0);
        let bob = (cycle(frame, frames).sin() * radius * 0.08).round();
        Self {
            center: DVec2::new(
                size.width as f64 / 2.0,
                size.height as f64 / 2.0 + radius * 0.1 + bob,
            ),
            radius,
        }
    }
}

/// Phase in radians of `frame` within a loop of `period` frames.
fn cycle(frame: u32, period: u32) -> f64 {
    if period == 0 {
        return 0.0;
    }
    (frame % period) as f64 / period as f64 * TAU
}

struct Painter<'a> {
    image: &'a mut RasterImage,
    plan: BodyPlan,
    palette: ThreeColorPalette,
    body: BodyFrame,
    /// Phase of the template's own motion; zero for static templates.
    phase: f64,
    animated: bool,
    noise: Perlin,
}

impl<'a> Painter<'a> {
    fn new(image: &'a mut RasterImage, template: &PartTemplate, request: &RasterRequest<'_>) -> Self {
        let size = Size::new(image.width(), image.height());
        let phase = if template.animated {
            cycle(request.frame, template.frame_count)
        } else {
            0.0
        };
        Self {
            image,
            plan: request.spec.archetype.body_plan(),
            palette: request.palette.specialize(template.part_type),
            body: BodyFrame::locate(size, request.stage, request.frame, request.frames),
            phase,
            animated: template.animated,
            noise: Perlin::new(request.noise_seed),
        }
    }

    fn paint(&mut self, part_type: PartType, rng: &mut Xorshift64) {
        match part_type {
            PartType::Body => self.body(),
            PartType::Head => self.head(),
            PartType::Eyes => self.eyes(rng),
            PartType::Limbs => self.limbs(),
            PartType::Wings => self.wings(),
            PartType::Tail => self.tail(),
            PartType::Accessories => self.accessories(),
            PartType::Effects => self.effects(rng),
            PartType::Background => self.background(),
        }
    }

    fn outline(&self) -> Rgba {
        self.palette.primary.shade(0.6)
    }

    // ── Body ───────────────────────────────────────────────────────

    fn body(&mut self) {
        match self.plan {
            BodyPlan::Familiar => self.familiar_body(),
            BodyPlan::Golem => self.golem_body(),
            BodyPlan::Wisp => self.wisp_body(),
            BodyPlan::Sentinel => self.sentinel_body(),
        }
    }

    fn familiar_body(&mut self) {
        let BodyFrame { center, radius } = self.body;
        let radii = DVec2::new(radius * 0.95, radius * 0.75);
        let (fill_color, belly, outline) = (self.palette.primary, self.palette.secondary, self.outline());
        fill(self.image, center - radii, center + radii, |p| {
            let d = (p - center) / radii;
            let n = d.length_squared();
            if n > 1.0 {
                None
            } else if n > 0.8 {
                Some(outline)
            } else {
                Some(fill_color.lerp(belly, d.y.max(0.0) * 0.45))
            }
        });
    }

    fn golem_body(&mut self) {
        let BodyFrame { center, radius } = self.body;
        let half = DVec2::new(radius * 0.85, radius * 0.8);
        let (stone, crack, outline) = (
            self.palette.primary,
            self.palette.secondary.shade(0.5),
            self.outline(),
        );
        let noise = &self.noise;
        fill(self.image, center - half, center + half, |p| {
            let d = (p - center).abs();
            if d.x > half.x || d.y > half.y {
                return None;
            }
            if d.x > half.x - 1.0 || d.y > half.y - 1.0 {
                return Some(outline);
            }
            let grain = noise.get([p.x * 0.35, p.y * 0.35, 0.5]).clamp(-1.0, 1.0);
            if grain.abs() < 0.05 {
                Some(crack)
            } else {
                Some(stone.shade(0.9 + 0.2 * grain))
            }
        });
    }

    fn wisp_body(&mut self) {
        let BodyFrame { center, radius } = self.body;
        let (glow, core) = (self.palette.primary, self.palette.accent);
        let drift = 0.37 + self.phase.sin() * 0.5;
        let noise = &self.noise;
        let reach = DVec2::splat(radius);
        fill(self.image, center - reach, center + reach, |p| {
            let v = p - center;
            let d = v.length() / radius;
            let angle = v.y.atan2(v.x);
            let n = noise
                .get([angle.cos() * 1.3, angle.sin() * 1.3, drift])
                .clamp(-1.0, 1.0);
            let edge = 0.75 + 0.25 * n;
            if d > edge {
                return None;
            }
            let t = d / edge;
            Some(core.lerp(glow, t).with_alpha(1.0 - 0.55 * t * t))
        });
    }

    fn sentinel_body(&mut self) {
        let BodyFrame { center, radius } = self.body;
        let top = center.y - radius * 0.85;
        let bottom = center.y + radius * 0.9;
        let (plate, shadow, seam, outline) = (
            self.palette.primary,
            self.palette.secondary,
            self.palette.accent,
            self.outline(),
        );
        fill(
            self.image,
            DVec2::new(center.x - radius, top),
            DVec2::new(center.x + radius, bottom),
            |p| {
                let t = (p.y - top) / (bottom - top);
                if !(0.0..=1.0).contains(&t) {
                    return None;
                }
                let half = radius * (0.9 - 0.35 * t);
                let dx = (p.x - center.x).abs();
                if dx > half {
                    None
                } else if dx > half - 1.0 || t > 0.96 {
                    Some(outline)
                } else if dx < 0.8 {
                    Some(seam)
                } else {
                    Some(plate.lerp(shadow, t * 0.4))
                }
            },
        );
    }

    // ── Head & eyes ────────────────────────────────────────────────

    /// Center and radius of the head for this body plan.
    fn head_anchor(&self) -> (DVec2, f64) {
        let BodyFrame { center, radius } = self.body;
        match self.plan {
            BodyPlan::Familiar => (center + DVec2::new(0.0, -radius * 0.8), radius * 0.5),
            BodyPlan::Golem => (center + DVec2::new(0.0, -radius * 0.95), radius * 0.4),
            BodyPlan::Sentinel => (center + DVec2::new(0.0, -radius * 1.0), radius * 0.38),
            BodyPlan::Wisp => (center + DVec2::new(0.0, -radius * 0.55), radius * 0.4),
        }
    }

    /// Wisps have no head; their eyes sit on the core.
    fn eye_anchor(&self) -> (DVec2, f64) {
        match self.plan {
            BodyPlan::Wisp => (
                self.body.center + DVec2::new(0.0, -self.body.radius * 0.1),
                self.body.radius * 0.6,
            ),
            _ => self.head_anchor(),
        }
    }

    fn head(&mut self) {
        let (center, r) = self.head_anchor();
        let (skin, outline, trim) = (self.palette.primary, self.outline(), self.palette.accent);
        match self.plan {
            BodyPlan::Familiar => {
                for side in [-1.0, 1.0] {
                    let base = center + DVec2::new(side * r * 0.6, -r * 0.4);
                    triangle(
                        self.image,
                        base + DVec2::new(-r * 0.3, 0.0),
                        base + DVec2::new(r * 0.3, 0.0),
                        base + DVec2::new(side * r * 0.15, -r * 0.8),
                        outline,
                    );
                }
                disc(self.image, center, r, outline);
                disc(self.image, center, (r - 1.0).max(0.5), skin);
            }
            BodyPlan::Golem => {
                let half = DVec2::splat(r);
                fill(self.image, center - half, center + half, |p| {
                    let d = (p - center).abs();
                    Some(if d.x > r - 1.0 || d.y > r - 1.0 { outline } else { skin })
                });
                let brow = (center.y - r * 0.35).round() as i64;
                self.image.fill_rect(
                    (center.x - r).round() as i64,
                    brow,
                    (center.x + r).round() as i64,
                    brow + 1,
                    outline,
                );
            }
            BodyPlan::Sentinel => {
                disc(self.image, center, r, outline);
                disc(self.image, center, (r - 1.0).max(0.5), skin);
                let crest_x = center.x.round() as i64;
                let crest_top = (center.y - r * 1.5).round() as i64;
                self.image
                    .fill_rect(crest_x, crest_top, crest_x + 1, center.y.round() as i64, trim);
            }
            BodyPlan::Wisp => disc(self.image, center, r, skin.with_alpha(0.8)),
        }
    }

    fn eyes(&mut self, rng: &mut Xorshift64) {
        let (center, r) = self.eye_anchor();
        let iris = self.palette.primary;
        let glint = self.palette.accent;
        let blink = self.animated && rng.chance(0.15);
        let eye_r = (r * 0.2).max(0.8);
        let spacing = r * 0.45;

        if self.plan == BodyPlan::Sentinel {
            let y = center.y.round() as i64;
            let height = if blink { 1 } else { eye_r.ceil().max(1.0) as i64 };
            self.image.fill_rect(
                (center.x - spacing - eye_r).round() as i64,
                y,
                (center.x + spacing + eye_r).round() as i64,
                y + height,
                iris,
            );
            return;
        }

        for side in [-1.0, 1.0] {
            let eye = center + DVec2::new(side * spacing, 0.0);
            if blink {
                let y = eye.y.round() as i64;
                self.image.fill_rect(
                    (eye.x - eye_r).round() as i64,
                    y,
                    (eye.x + eye_r).round() as i64,
                    y + 1,
                    iris,
                );
            } else {
                disc(self.image, eye, eye_r, iris);
                let highlight = eye - DVec2::splat(eye_r * 0.3);
                self.image
                    .plot(highlight.x.floor() as i64, highlight.y.floor() as i64, glint);
            }
        }
    }

    // ── Limbs, wings, tail ─────────────────────────────────────────

    fn limbs(&mut self) {
        let BodyFrame { center, radius } = self.body;
        let (skin, outline) = (self.palette.primary, self.outline());
        let swing = (self.phase.sin() * radius * 0.12).round();
        for side in [-1.0, 1.0] {
            let (x, y, w, h) = match self.plan {
                BodyPlan::Golem => (
                    center.x + side * radius * 1.0,
                    center.y - radius * 0.5 + side * swing,
                    radius * 0.3,
                    radius * 0.9,
                ),
                _ => (
                    center.x + side * radius * 0.45 + side * swing,
                    center.y + radius * 0.55,
                    radius * 0.3,
                    radius * 0.45,
                ),
            };
            let min = DVec2::new(x - w / 2.0, y);
            let max = DVec2::new(x + w / 2.0, y + h);
            fill(self.image, min, max, |p| {
                let edge = p.x - min.x < 1.0 || max.x - p.x < 1.0 || max.y - p.y < 1.0;
                Some(if edge { outline } else { skin })
            });
        }
    }

    fn wings(&mut self) {
        let BodyFrame { center, radius } = self.body;
        let membrane = self.palette.primary.lerp(self.palette.accent, 0.25).with_alpha(0.85);
        let lift = radius * (0.75 + 0.25 * self.phase.sin());
        for side in [-1.0, 1.0] {
            triangle(
                self.image,
                center + DVec2::new(side * radius * 0.55, -radius * 0.25),
                center + DVec2::new(side * radius * 1.35, -lift),
                center + DVec2::new(side * radius * 1.1, radius * 0.35),
                membrane,
            );
        }
    }

    fn tail(&mut self) {
        let BodyFrame { center, radius } = self.body;
        match self.plan {
            BodyPlan::Wisp => {
                let (ember, fade) = (self.palette.accent, self.palette.primary);
                let links = 5;
                for i in 0..links {
                    let t = i as f64 / links as f64;
                    let pos = center
                        + DVec2::new(
                            (self.phase + i as f64 * 0.9).sin() * radius * 0.35,
                            radius * (0.7 + t * 0.9),
                        );
                    let r = radius * (0.35 * (1.0 - t) + 0.08);
                    disc(self.image, pos, r, ember.lerp(fade, t).with_alpha(0.8 * (1.0 - t) + 0.1));
                }
            }
            _ => {
                let (fur, tip) = (self.palette.primary, self.palette.accent);
                let root = center + DVec2::new(radius * 0.85, radius * 0.35);
                let links = 6;
                for i in 0..links {
                    let k = i as f64;
                    let pos = root
                        + DVec2::new(
                            k * radius * 0.13,
                            -k * radius * 0.16 + (self.phase + k * 0.7).sin() * radius * 0.08,
                        );
                    let color = if i == links - 1 { tip } else { fur };
                    disc(self.image, pos, (radius * 0.16 * (1.0 - k * 0.08)).max(0.6), color);
                }
            }
        }
    }

    // ── Accessories & effects ──────────────────────────────────────

    fn accessories(&mut self) {
        let BodyFrame { center, radius } = self.body;
        let shine = self.palette.accent;
        match self.plan {
            BodyPlan::Familiar => {
                let collar = center + DVec2::new(0.0, -radius * 0.55);
                ring(self.image, collar, DVec2::new(radius * 0.55, radius * 0.2), 0.25, shine);
                let gem = collar + DVec2::new(0.0, radius * 0.2);
                disc(self.image, gem, (radius * 0.1).max(0.8), shine.lerp(Rgba::WHITE, 0.5));
            }
            BodyPlan::Golem => {
                let pulse = 0.6 + 0.4 * self.phase.cos().abs();
                for k in 0..6 {
                    let angle = k as f64 * TAU / 6.0 + 0.3;
                    let rune = center + DVec2::from_angle(angle) * radius * 0.5;
                    disc(self.image, rune, (radius * 0.09).max(0.8), shine.with_alpha(pulse));
                }
            }
            BodyPlan::Wisp | BodyPlan::Sentinel => {
                let (head, r) = self.head_anchor();
                let halo = head - DVec2::new(0.0, r * 1.3);
                ring(self.image, halo, DVec2::new(r * 0.9, r * 0.3), 0.35, shine);
            }
        }
    }

    fn effects(&mut self, rng: &mut Xorshift64) {
        let BodyFrame { center, radius } = self.body;
        let (glow, spark) = (self.palette.primary, self.palette.accent);
        let breath = 0.8 + 0.2 * self.phase.cos();

        let reach = radius * 1.25;
        fill(
            self.image,
            center - DVec2::splat(reach),
            center + DVec2::splat(reach),
            |p| {
                let d = (p - center).length() / reach;
                (d < 1.0).then(|| glow.with_alpha(0.12 * (1.0 - d) * breath))
            },
        );
        ring(self.image, center, DVec2::splat(reach), 0.18, glow.with_alpha(0.45 * breath));

        if self.plan == BodyPlan::Wisp {
            for k in 0..3 {
                let angle = self.phase + k as f64 * TAU / 3.0;
                let mote = center + DVec2::from_angle(angle) * radius * 1.05;
                disc(self.image, mote, (radius * 0.1).max(0.8), spark);
            }
        }

        let sparkles = 2 + rng.next_usize(4);
        for _ in 0..sparkles {
            let angle = rng.next_range(0.0, TAU);
            let dist = radius * rng.next_range(0.6, 1.5);
            let at = center + DVec2::from_angle(angle) * dist;
            let (x, y) = (at.x.floor() as i64, at.y.floor() as i64);
            self.image.plot(x, y, spark);
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                self.image.plot(x + dx, y + dy, glow.with_alpha(0.7));
            }
        }
    }

    fn background(&mut self) {
        let (w, h) = (self.image.width() as f64, self.image.height() as f64);
        let center = DVec2::new(w / 2.0, h / 2.0);
        let reach = w.min(h) / 2.0;
        let (wash, sigil) = (self.palette.primary, self.palette.accent);
        fill(self.image, DVec2::ZERO, DVec2::new(w, h), |p| {
            let d = (p - center).length() / reach;
            if d > 1.0 {
                None
            } else if (d - 0.85).abs() < 0.06 {
                Some(sigil.with_alpha(0.5))
            } else {
                Some(wash.with_alpha(0.4 * (1.0 - d)))
            }
        });
    }
}

// ── Shape helpers ──────────────────────────────────────────────────

/// Calls `shade` with the center of every pixel in `[min, max]` (clipped)
/// and plots whatever color it returns.
fn fill(image: &mut RasterImage, min: DVec2, max: DVec2, mut shade: impl FnMut(DVec2) -> Option<Rgba>) {
    let x0 = min.x.floor().max(0.0) as i64;
    let y0 = min.y.floor().max(0.0) as i64;
    let x1 = max.x.ceil().min(image.width() as f64) as i64;
    let y1 = max.y.ceil().min(image.height() as f64) as i64;
    for y in y0..y1 {
        for x in x0..x1 {
            if let Some(color) = shade(DVec2::new(x as f64 + 0.5, y as f64 + 0.5)) {
                image.plot(x, y, color);
            }
        }
    }
}

fn disc(image: &mut RasterImage, center: DVec2, radius: f64, color: Rgba) {
    let reach = DVec2::splat(radius);
    fill(image, center - reach, center + reach, |p| {
        (p.distance_squared(center) <= radius * radius).then_some(color)
    });
}

/// Elliptical ring at normalized distance 1 from `center`, `band` wide on
/// either side, fading to transparent at its edges.
fn ring(image: &mut RasterImage, center: DVec2, radii: DVec2, band: f64, color: Rgba) {
    let reach = radii * (1.0 + band);
    fill(image, center - reach, center + reach, |p| {
        let off = (((p - center) / radii).length() - 1.0).abs();
        (off <= band).then(|| color.with_alpha(color.a * (1.0 - off / band)))
    });
}

fn triangle(image: &mut RasterImage, a: DVec2, b: DVec2, c: DVec2, color: Rgba) {
    let edge = |from: DVec2, to: DVec2, p: DVec2| (to - from).perp_dot(p - from);
    fill(image, a.min(b).min(c), a.max(b).max(c), |p| {
        let (d1, d2, d3) = (edge(a, b, p), edge(b, c, p), edge(c, a, p));
        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
        (!(has_neg && has_pos)).then_some(color)
    });
}
