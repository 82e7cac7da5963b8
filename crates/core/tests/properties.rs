//! End-to-end behavior of generation and rig export through the public API.

use std::collections::HashSet;

use proptest::prelude::*;
use spriteforge_core::color::rgb_to_hsv;
use spriteforge_core::raster::blend;
use spriteforge_core::{
    export, generate, Archetype, BlendMode, EvolutionStage, Genre, PartTemplate, PartType, Rarity,
    RasterImage, RigFormat, Rgba, Role, Seed, SpriteGenerator, SpriteSpec, TemplateLibrary,
    ThreeColorPalette,
};

fn wisp() -> SpriteSpec {
    SpriteSpec::new(Archetype::Wisp, Genre::SciFi, 24, 24)
}

/// Alpha-weighted mean saturation of one cell; transparent pixels count as zero.
fn mean_saturation(image: &RasterImage, x0: usize, y0: usize, size: usize) -> f64 {
    let mut total = 0.0;
    for y in y0..y0 + size {
        for x in x0..x0 + size {
            let px = image.get(x, y).unwrap();
            total += rgb_to_hsv(px).s * px.a;
        }
    }
    total / (size * size) as f64
}

// ── Determinism ────────────────────────────────────────────────────

#[test]
fn repeated_generation_is_byte_identical() {
    let spec = SpriteSpec::new(Archetype::Golem, Genre::Steampunk, 32, 32)
        .with_rarity(Rarity::Legendary)
        .with_trait("name", "Cogheart");
    let seed = Seed::new("token-9001");
    let a = generate(&seed, &spec).unwrap();
    let b = generate(&seed, &spec).unwrap();
    assert_eq!(a.image, b.image);
    assert_eq!(a.provenance_hash, b.provenance_hash);
    assert_eq!(a.animation, b.animation);
    assert_eq!(a.record, b.record);
}

#[test]
fn parallel_generation_matches_serial() {
    let spec = SpriteSpec::new(Archetype::Familiar, Genre::Fantasy, 24, 24)
        .with_evolution(vec![EvolutionStage::Baby, EvolutionStage::Elder], 2);
    let expected = generate(&Seed::new("shared"), &spec).unwrap().image;
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let spec = spec.clone();
            std::thread::spawn(move || generate(&Seed::new("shared"), &spec).unwrap().image)
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn explicit_library_matches_builtin_convenience() {
    let library = TemplateLibrary::with_builtins();
    let seed = Seed::new("explicit");
    let spec = SpriteSpec::new(Archetype::Sentinel, Genre::Mythic, 24, 24);
    let explicit = SpriteGenerator::new(&library).generate(&seed, &spec).unwrap();
    let builtin = generate(&seed, &spec).unwrap();
    assert_eq!(explicit.image, builtin.image);
}

// ── Provenance ─────────────────────────────────────────────────────

#[test]
fn provenance_tracks_seed_and_identity_fields() {
    let base = generate(&Seed::new("abc123"), &wisp()).unwrap().provenance_hash;
    let other_seed = generate(&Seed::new("abc124"), &wisp()).unwrap().provenance_hash;
    let other_rarity = generate(&Seed::new("abc123"), &wisp().with_rarity(Rarity::Epic))
        .unwrap()
        .provenance_hash;
    let other_role = generate(&Seed::new("abc123"), &wisp().with_role(Role::Scholar))
        .unwrap()
        .provenance_hash;
    assert_ne!(base, other_seed);
    assert_ne!(base, other_rarity);
    assert_ne!(base, other_role);
    assert_eq!(base, generate(&Seed::new("abc123"), &wisp()).unwrap().provenance_hash);
}

// ── Sheet shape ────────────────────────────────────────────────────

#[test]
fn common_wisp_scenario() {
    let result = generate(&Seed::new("abc123"), &wisp()).unwrap();
    let frames = Rarity::Common.frame_count() as usize;
    assert_eq!(result.image.width(), 24 * frames);
    assert_eq!(result.image.height(), 24);
    assert_eq!(result.provenance_hash.len(), 64);
    for frame in 0..frames {
        let (cx, cy) = (frame * 24 + 12, 12);
        let near_center = (cy - 3..=cy + 3)
            .flat_map(|y| (cx - 3..=cx + 3).map(move |x| (x, y)))
            .any(|(x, y)| !result.image.get(x, y).unwrap().is_transparent());
        assert!(near_center, "frame {frame} has an empty core");
    }
}

#[test]
fn evolution_chain_scenario() {
    let spec = SpriteSpec::new(Archetype::Familiar, Genre::SciFi, 24, 24).with_evolution(
        vec![EvolutionStage::Egg, EvolutionStage::Adult, EvolutionStage::Legendary],
        2,
    );
    let result = generate(&Seed::new("abc123"), &spec).unwrap();
    assert_eq!(result.image.width(), 48);
    assert_eq!(result.image.height(), 72);
    for column in 0..2 {
        let egg = mean_saturation(&result.image, column * 24, 0, 24);
        let legendary = mean_saturation(&result.image, column * 24, 48, 24);
        assert!(legendary > egg, "column {column}: {legendary} <= {egg}");
    }
}

#[test]
fn role_frame_override_wins_over_rarity() {
    let spec = wisp().with_rarity(Rarity::Legendary).with_role(Role::Trickster);
    let result = generate(&Seed::new("abc123"), &spec).unwrap();
    assert_eq!(result.image.width(), 24 * 6);
    assert_eq!(result.animation.columns, 6);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn chain_sheet_is_frames_by_stages(
        first in 0usize..6,
        count in 1usize..4,
        frames in 1u32..4,
        w in 6usize..20,
        h in 6usize..20,
    ) {
        let stages: Vec<EvolutionStage> =
            (0..count).map(|i| EvolutionStage::ALL[(first + i) % 6]).collect();
        let spec = SpriteSpec::new(Archetype::Drifter, Genre::Cyberpunk, w, h)
            .with_evolution(stages, frames);
        let result = generate(&Seed::new("grid"), &spec).unwrap();
        prop_assert_eq!(result.image.width(), w * frames as usize);
        prop_assert_eq!(result.image.height(), h * count);
        prop_assert_eq!(result.animation.frames.len(), count * frames as usize);
    }

    #[test]
    fn any_seed_is_reproducible(seed in "[a-z0-9]{1,16}") {
        let seed = Seed::new(seed);
        let a = generate(&seed, &wisp()).unwrap();
        let b = generate(&seed, &wisp()).unwrap();
        prop_assert_eq!(a.image, b.image);
        prop_assert_eq!(a.provenance_hash, b.provenance_hash);
    }

    #[test]
    fn blend_contract_holds(
        r in 0.0_f64..=1.0, g in 0.0_f64..=1.0, b in 0.0_f64..=1.0, a in 0.0_f64..=1.0,
        mode_idx in 0usize..4,
    ) {
        let dst = Rgba::new(r, g, b, a);
        let src = Rgba::rgb(1.0 - r, g, 1.0 - b);
        prop_assert_eq!(blend(dst, src, BlendMode::Normal), src);
        prop_assert_eq!(blend(dst, Rgba::TRANSPARENT, BlendMode::ALL[mode_idx]), dst);
    }
}

// ── Compositing order ──────────────────────────────────────────────

fn badge(id: &str, x: i64, y: i64) -> PartTemplate {
    PartTemplate::new(id, id, PartType::Accessories)
        .for_archetypes([Archetype::Golem])
        .with_size(10, 10)
        .with_offset(x, y)
}

fn render_badges(spec: &SpriteSpec, seed: &str, order: [(&str, i64, i64); 2]) -> RasterImage {
    let mut library = TemplateLibrary::new();
    for (id, x, y) in order {
        library.register(badge(id, x, y)).unwrap();
    }
    SpriteGenerator::new(&library)
        .generate(&Seed::new(seed), spec)
        .unwrap()
        .image
}

#[test]
fn disjoint_parts_ignore_registration_order() {
    let spec = SpriteSpec::new(Archetype::Golem, Genre::Fantasy, 24, 24)
        .with_evolution(vec![EvolutionStage::Adult], 1);
    let forward = render_badges(&spec, "order", [("left", 0, 0), ("right", 12, 12)]);
    let reverse = render_badges(&spec, "order", [("right", 12, 12), ("left", 0, 0)]);
    assert!(forward.opaque_count() > 0);
    assert_eq!(forward, reverse);
}

#[test]
fn standard_sprite_ignores_registration_order() {
    let spec = SpriteSpec::new(Archetype::Golem, Genre::Fantasy, 24, 24);
    for i in 0..20 {
        let seed = format!("s{i}");
        let forward = render_badges(&spec, &seed, [("left", 0, 0), ("right", 12, 12)]);
        let reverse = render_badges(&spec, &seed, [("right", 12, 12), ("left", 0, 0)]);
        assert!(forward.opaque_count() > 0, "{seed}");
        assert_eq!(forward, reverse, "{seed}");
    }
}

// ── Stage curve ────────────────────────────────────────────────────

#[test]
fn stage_curve_is_monotonic_for_every_part() {
    for genre in Genre::ALL {
        let base = ThreeColorPalette::base(*genre, None);
        for part in PartType::ALL {
            let colors: Vec<_> = EvolutionStage::ALL
                .iter()
                .map(|s| rgb_to_hsv(base.stage_modulate(*s).specialize(*part).primary))
                .collect();
            for pair in colors.windows(2) {
                assert!(pair[0].s <= pair[1].s + 1e-9, "{genre:?} {part:?}");
                assert!(pair[0].v <= pair[1].v + 1e-9, "{genre:?} {part:?}");
            }
        }
    }
}

// ── Rig export ─────────────────────────────────────────────────────

#[test]
fn rig_formats_share_bone_names() {
    for archetype in Archetype::ALL {
        let spec = SpriteSpec::new(*archetype, Genre::Fantasy, 24, 24);
        let result = generate(&Seed::new("rig"), &spec).unwrap();
        let spine: HashSet<String> = export(&result, &spec, RigFormat::Spine)
            .bone_names()
            .into_iter()
            .map(String::from)
            .collect();
        let dragon: HashSet<String> = export(&result, &spec, RigFormat::DragonBones)
            .bone_names()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(spine, dragon, "{archetype:?}");
    }
}

#[test]
fn unknown_rig_format_is_a_configuration_error() {
    assert!("blender".parse::<RigFormat>().is_err());
}
