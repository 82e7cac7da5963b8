//! Archetype skeletons and export of a generated sprite to skeletal-rig
//! interchange formats.
//!
//! # Module overview
//!
//! - [`spine`] -- Spine JSON documents.
//! - [`dragonbones`] -- DragonBones JSON documents.
//!
//! Both formats are built from one format-neutral [`Rig`]: the pixel-scaled
//! skeleton, one slot per placed part bound to an anchor bone, and one
//! keyframe track per requested animation set. The per-format modules only
//! map that data onto their schema, so both exports always reference the
//! same bones.

pub mod dragonbones;
pub mod spine;

use std::collections::HashSet;
use std::f64::consts::{PI, TAU};

use glam::DVec2;
use serde::Serialize;

use crate::compose::{GenerationResult, PlacedPart};
use crate::error::EngineError;
use crate::spec::{
    named_enum, AnimationSet, Archetype, BodyPlan, EvolutionStage, Size, SpriteSpec,
};
use crate::template::PartType;

pub use dragonbones::DragonBonesDocument;
pub use spine::SpineDocument;

/// One bone of a skeleton. Coordinates are y-up.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<String>,
    /// Offset from the parent, in the parent's rotated frame.
    pub position: DVec2,
    /// Degrees, counter-clockwise.
    pub rotation: f64,
    pub scale: DVec2,
    pub length: f64,
}

impl Bone {
    pub fn new(
        name: impl Into<String>,
        parent: Option<&str>,
        position: DVec2,
        rotation: f64,
        length: f64,
    ) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(String::from),
            position,
            rotation,
            scale: DVec2::ONE,
            length,
        }
    }
}

/// An ordered bone tree. Every parent is an earlier bone.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneStructure {
    bones: Vec<Bone>,
}

/// Placement of a bone in skeleton space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub position: DVec2,
    pub rotation: f64,
}

impl BoneStructure {
    /// Validates and wraps `bones`.
    ///
    /// Fails with `EngineError::DuplicateBone` when a name repeats and with
    /// `EngineError::MalformedBone` when a parent is not an earlier bone
    /// (forward references and self-parenting included).
    pub fn new(bones: Vec<Bone>) -> Result<Self, EngineError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(bones.len());
        for bone in &bones {
            if seen.contains(bone.name.as_str()) {
                return Err(EngineError::DuplicateBone(bone.name.clone()));
            }
            if let Some(parent) = &bone.parent {
                if !seen.contains(parent.as_str()) {
                    return Err(EngineError::MalformedBone {
                        bone: bone.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            seen.insert(&bone.name);
        }
        Ok(Self { bones })
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn names(&self) -> Vec<&str> {
        self.bones.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Same tree with positions and lengths multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            bones: self
                .bones
                .iter()
                .map(|b| Bone {
                    position: b.position * factor,
                    length: b.length * factor,
                    ..b.clone()
                })
                .collect(),
        }
    }

    /// Skeleton-space placement of every bone, in bone order.
    pub fn world_transforms(&self) -> Vec<WorldTransform> {
        let mut out: Vec<WorldTransform> = Vec::with_capacity(self.bones.len());
        for bone in &self.bones {
            let parent = bone.parent.as_deref().and_then(|p| self.index_of(p));
            let world = match parent {
                Some(i) => {
                    let p = out[i];
                    WorldTransform {
                        position: p.position
                            + DVec2::from_angle(p.rotation.to_radians()).rotate(bone.position),
                        rotation: p.rotation + bone.rotation,
                    }
                }
                None => WorldTransform {
                    position: bone.position,
                    rotation: bone.rotation,
                },
            };
            out.push(world);
        }
        out
    }
}

/// The normalized skeleton for an archetype's body plan.
///
/// Units are body radii with the root at the creature's feet; exports scale
/// them to pixels.
pub fn bone_structure(archetype: Archetype) -> BoneStructure {
    let b = |name: &str, parent: Option<&str>, x: f64, y: f64, rotation: f64, length: f64| {
        Bone::new(name, parent, DVec2::new(x, y), rotation, length)
    };
    let bones = match archetype.body_plan() {
        BodyPlan::Familiar => vec![
            b("root", None, 0.0, 0.0, 0.0, 0.0),
            b("body", Some("root"), 0.0, 0.75, 0.0, 0.5),
            b("head", Some("body"), 0.0, 0.55, 0.0, 0.35),
            b("ear_left", Some("head"), -0.25, 0.3, 100.0, 0.15),
            b("ear_right", Some("head"), 0.25, 0.3, 80.0, 0.15),
            b("tail", Some("body"), 0.7, 0.1, 30.0, 0.4),
            b("leg_front", Some("body"), -0.35, -0.45, -90.0, 0.3),
            b("leg_back", Some("body"), 0.35, -0.45, -90.0, 0.3),
        ],
        BodyPlan::Golem => vec![
            b("root", None, 0.0, 0.0, 0.0, 0.0),
            b("torso", Some("root"), 0.0, 0.8, 0.0, 0.6),
            b("head", Some("torso"), 0.0, 0.75, 0.0, 0.3),
            b("arm_left", Some("torso"), -0.85, 0.4, -100.0, 0.6),
            b("arm_right", Some("torso"), 0.85, 0.4, -80.0, 0.6),
            b("leg_left", Some("root"), -0.35, 0.35, -90.0, 0.35),
            b("leg_right", Some("root"), 0.35, 0.35, -90.0, 0.35),
        ],
        BodyPlan::Wisp => vec![
            b("root", None, 0.0, 0.0, 0.0, 0.0),
            b("core", Some("root"), 0.0, 0.9, 0.0, 0.4),
            b("trail_1", Some("core"), 0.0, -0.6, -90.0, 0.3),
            b("trail_2", Some("trail_1"), 0.3, 0.0, 0.0, 0.25),
            b("trail_3", Some("trail_2"), 0.25, 0.0, 0.0, 0.2),
            b("field", Some("core"), 0.0, 0.0, 0.0, 1.0),
        ],
        BodyPlan::Sentinel => vec![
            b("root", None, 0.0, 0.0, 0.0, 0.0),
            b("base", Some("root"), 0.0, 0.1, 0.0, 0.2),
            b("torso", Some("base"), 0.0, 0.75, 0.0, 0.6),
            b("head", Some("torso"), 0.0, 0.85, 0.0, 0.3),
            b("shoulder_left", Some("torso"), -0.7, 0.55, 0.0, 0.2),
            b("shoulder_right", Some("torso"), 0.7, 0.55, 0.0, 0.2),
            b("weapon_left", Some("shoulder_left"), -0.2, -0.3, -90.0, 0.5),
            b("weapon_right", Some("shoulder_right"), 0.2, -0.3, -90.0, 0.5),
        ],
    };
    // Literal trees above are ordered parent-first with unique names.
    BoneStructure { bones }
}

/// Substrings selecting which bones an animation set moves.
pub fn bone_filter(animation: AnimationSet) -> &'static [&'static str] {
    match animation {
        AnimationSet::Idle => &["body", "torso", "core", "head"],
        AnimationSet::Walk => &["leg", "arm", "body"],
        AnimationSet::Cast => &["arm", "head", "weapon"],
        AnimationSet::Attack => &["arm", "weapon", "shoulder"],
        AnimationSet::Hurt => &["body", "torso", "head", "core"],
        AnimationSet::Float => &["core", "trail", "field", "tail"],
    }
}

/// Bones of `structure` that receive keyframes for `animation`.
pub fn animated_bones(structure: &BoneStructure, animation: AnimationSet) -> Vec<&Bone> {
    let filter = bone_filter(animation);
    structure
        .bones()
        .iter()
        .filter(|b| filter.iter().any(|f| b.name.contains(f)))
        .collect()
}

/// Supported interchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RigFormat {
    Spine,
    DragonBones,
}

named_enum!(RigFormat, "rig format", [
    Spine => ("spine", "Spine"),
    DragonBones => ("dragonbones", "DragonBones"),
]);

/// A serialized-ready rig document in one of the supported formats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExchangeRecord {
    Spine(SpineDocument),
    DragonBones(DragonBonesDocument),
}

impl ExchangeRecord {
    pub fn format(&self) -> RigFormat {
        match self {
            ExchangeRecord::Spine(_) => RigFormat::Spine,
            ExchangeRecord::DragonBones(_) => RigFormat::DragonBones,
        }
    }

    /// Pretty-printed JSON in the format's own schema.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn bone_names(&self) -> Vec<&str> {
        match self {
            ExchangeRecord::Spine(doc) => doc.bones.iter().map(|b| b.name.as_str()).collect(),
            ExchangeRecord::DragonBones(doc) => doc
                .armature
                .iter()
                .flat_map(|a| a.bone.iter().map(|b| b.name.as_str()))
                .collect(),
        }
    }

    /// Slot names in draw order.
    pub fn slot_names(&self) -> Vec<&str> {
        match self {
            ExchangeRecord::Spine(doc) => doc.slots.iter().map(|s| s.name.as_str()).collect(),
            ExchangeRecord::DragonBones(doc) => doc
                .armature
                .iter()
                .flat_map(|a| a.slot.iter().map(|s| s.name.as_str()))
                .collect(),
        }
    }

    /// Bones carrying keyframes in the named animation.
    pub fn keyed_bones(&self, animation: &str) -> Vec<&str> {
        match self {
            ExchangeRecord::Spine(doc) => doc
                .animations
                .get(animation)
                .map(|a| a.bones.keys().map(String::as_str).collect())
                .unwrap_or_default(),
            ExchangeRecord::DragonBones(doc) => doc
                .armature
                .iter()
                .flat_map(|a| a.animation.iter())
                .filter(|a| a.name == animation)
                .flat_map(|a| a.bone.iter().map(|b| b.name.as_str()))
                .collect(),
        }
    }
}

/// Exports the composition in `result` as a rig document.
///
/// Each slot's attachment names an image `<template_id>` relative to the
/// document (Spine `images: "./"`, DragonBones display `path`). Nothing here
/// or in `spriteforge-output` writes those per-part images; callers that want
/// a resolvable rig must supply them next to the document.
pub fn export(result: &GenerationResult, spec: &SpriteSpec, format: RigFormat) -> ExchangeRecord {
    let rig = Rig::build(result, spec);
    match format {
        RigFormat::Spine => ExchangeRecord::Spine(spine::document(&rig)),
        RigFormat::DragonBones => ExchangeRecord::DragonBones(dragonbones::document(&rig)),
    }
}

// ── Format-neutral rig ─────────────────────────────────────────────

pub(crate) struct Rig<'a> {
    pub name: &'a str,
    pub hash: &'a str,
    pub cell: Size,
    pub skeleton: BoneStructure,
    pub slots: Vec<Slot<'a>>,
    pub tracks: Vec<Track>,
    /// Whole frames per second; every keyframe sits on a frame boundary.
    pub frame_rate: u32,
    pub columns: u32,
}

/// A placed part bound to a bone, with its region in that bone's frame.
pub(crate) struct Slot<'a> {
    pub name: String,
    pub bone: String,
    pub part: &'a PlacedPart,
    pub offset: DVec2,
    pub rotation: f64,
}

pub(crate) struct Track {
    pub animation: AnimationSet,
    pub looping: bool,
    pub bones: Vec<BoneKeys>,
}

pub(crate) struct BoneKeys {
    pub bone: String,
    pub keys: Vec<Key>,
}

pub(crate) struct Key {
    pub frame: u32,
    pub rotate: f64,
    pub offset: DVec2,
}

struct Motion {
    rotate: f64,
    translate: DVec2,
    looping: bool,
}

fn motion(animation: AnimationSet) -> Motion {
    let (rotate, translate, looping) = match animation {
        AnimationSet::Idle => (2.0, DVec2::new(0.0, 0.04), true),
        AnimationSet::Walk => (15.0, DVec2::new(0.0, 0.03), true),
        AnimationSet::Cast => (25.0, DVec2::new(0.0, 0.02), true),
        AnimationSet::Attack => (40.0, DVec2::new(0.08, 0.0), false),
        AnimationSet::Hurt => (10.0, DVec2::new(-0.1, 0.0), false),
        AnimationSet::Float => (6.0, DVec2::new(0.0, 0.08), true),
    };
    Motion {
        rotate,
        translate,
        looping,
    }
}

/// Left-side, rear and even trail bones move in counter-phase.
fn mirrored(bone: &str) -> bool {
    bone.contains("left") || bone.contains("back") || bone.ends_with("_2")
}

/// Two decimals; negative zero folds to zero.
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0 + 0.0
}

impl<'a> Rig<'a> {
    fn build(result: &'a GenerationResult, spec: &SpriteSpec) -> Self {
        let cell = result.animation.cell;
        let scale = cell.width.min(cell.height) as f64 * 0.34;
        let skeleton = bone_structure(spec.archetype).scaled(scale);
        let world = skeleton.world_transforms();

        let mut taken: HashSet<String> = HashSet::new();
        let slots = result
            .parts
            .iter()
            .map(|part| {
                let name = unique_slot_name(&part.template_id, &mut taken);
                let bone = anchor_bone(&skeleton, part.part_type);
                let anchor = skeleton
                    .index_of(bone)
                    .map(|i| world[i])
                    .unwrap_or(WorldTransform {
                        position: DVec2::ZERO,
                        rotation: 0.0,
                    });
                let center = DVec2::new(
                    part.x as f64 + part.width as f64 / 2.0 - cell.width as f64 / 2.0,
                    cell.height as f64 - (part.y as f64 + part.height as f64 / 2.0),
                );
                let unrotate = DVec2::from_angle(-anchor.rotation.to_radians());
                Slot {
                    name,
                    bone: bone.to_string(),
                    part,
                    offset: unrotate.rotate(center - anchor.position),
                    rotation: -anchor.rotation,
                }
            })
            .collect();

        let columns = result.animation.columns.max(1);
        let tracks = spec
            .animations
            .iter()
            .map(|&animation| {
                let m = motion(animation);
                let bones = animated_bones(&skeleton, animation)
                    .into_iter()
                    .map(|bone| BoneKeys {
                        bone: bone.name.clone(),
                        keys: (0..=columns)
                            .map(|frame| {
                                let t = frame as f64 / columns as f64;
                                let flip = mirrored(&bone.name);
                                let wave = if m.looping {
                                    (TAU * t + if flip { PI } else { 0.0 }).sin()
                                } else {
                                    (PI * t).sin() * if flip { -1.0 } else { 1.0 }
                                };
                                Key {
                                    frame,
                                    rotate: m.rotate * wave,
                                    offset: m.translate * scale * wave,
                                }
                            })
                            .collect(),
                    })
                    .collect();
                Track {
                    animation,
                    looping: m.looping,
                    bones,
                }
            })
            .collect();

        Self {
            name: &result.record.name,
            hash: &result.provenance_hash,
            cell,
            skeleton,
            slots,
            tracks,
            frame_rate: result
                .animation
                .frames
                .first()
                .map(|f| f.stage.frame_rate())
                .unwrap_or(EvolutionStage::STANDARD.frame_rate()),
            columns,
        }
    }

    /// Seconds from the start of a track to `frame`.
    pub fn time_at(&self, frame: u32) -> f64 {
        frame as f64 / self.frame_rate as f64
    }
}

/// `id`, or the first free `id_N` (N from 2) when a slot already uses it.
fn unique_slot_name(id: &str, taken: &mut HashSet<String>) -> String {
    let mut name = id.to_string();
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{id}_{n}");
        n += 1;
    }
    taken.insert(name.clone());
    name
}

/// The bone a part type hangs from, by first match in the skeleton.
fn anchor_bone(skeleton: &BoneStructure, part_type: PartType) -> &'static str {
    let candidates: &[&'static str] = match part_type {
        PartType::Body => &["body", "torso", "core"],
        PartType::Head | PartType::Eyes => &["head", "core"],
        PartType::Limbs => &["leg_front", "arm_left", "leg_left", "shoulder_left", "trail_1"],
        PartType::Wings => &["shoulder_left", "body", "torso", "core"],
        PartType::Tail => &["tail", "trail_1", "base"],
        PartType::Accessories => &["head", "torso", "body", "core"],
        PartType::Effects => &["field", "core", "body", "torso"],
        PartType::Background => &["root"],
    };
    candidates
        .iter()
        .copied()
        .find(|c| skeleton.get(c).is_some())
        .unwrap_or("root")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::generate;
    use crate::seed::Seed;
    use crate::spec::Genre;

    fn sprite(archetype: Archetype) -> (GenerationResult, SpriteSpec) {
        let spec = SpriteSpec::new(archetype, Genre::Fantasy, 32, 32).with_animations(vec![
            AnimationSet::Idle,
            AnimationSet::Walk,
            AnimationSet::Cast,
        ]);
        (generate(&Seed::new("rig"), &spec).unwrap(), spec)
    }

    #[test]
    fn builtin_trees_pass_validation() {
        for archetype in Archetype::ALL {
            let tree = bone_structure(*archetype);
            assert!(BoneStructure::new(tree.bones().to_vec()).is_ok(), "{archetype:?}");
            let roots = tree.bones().iter().filter(|b| b.parent.is_none()).count();
            assert_eq!(roots, 1, "{archetype:?}");
        }
    }

    #[test]
    fn trees_match_body_plans() {
        assert_eq!(
            bone_structure(Archetype::Familiar).names(),
            ["root", "body", "head", "ear_left", "ear_right", "tail", "leg_front", "leg_back"]
        );
        assert_eq!(
            bone_structure(Archetype::Wisp).names(),
            ["root", "core", "trail_1", "trail_2", "trail_3", "field"]
        );
        assert_eq!(bone_structure(Archetype::Warder), bone_structure(Archetype::Sentinel));
        assert_eq!(bone_structure(Archetype::Automaton), bone_structure(Archetype::Golem));
    }

    #[test]
    fn forward_parent_is_malformed() {
        let err = BoneStructure::new(vec![
            Bone::new("arm", Some("torso"), DVec2::ZERO, 0.0, 1.0),
            Bone::new("torso", None, DVec2::ZERO, 0.0, 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, EngineError::MalformedBone { ref bone, ref parent } if bone == "arm" && parent == "torso"));
    }

    #[test]
    fn self_parent_is_malformed() {
        let err = BoneStructure::new(vec![Bone::new("loop", Some("loop"), DVec2::ZERO, 0.0, 1.0)])
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedBone { .. }));
    }

    #[test]
    fn duplicate_bone_is_rejected() {
        let err = BoneStructure::new(vec![
            Bone::new("root", None, DVec2::ZERO, 0.0, 0.0),
            Bone::new("root", None, DVec2::ZERO, 0.0, 0.0),
        ])
        .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateBone(name) if name == "root"));
    }

    #[test]
    fn world_transforms_follow_parent_rotation() {
        let tree = BoneStructure::new(vec![
            Bone::new("root", None, DVec2::ZERO, 90.0, 0.0),
            Bone::new("tip", Some("root"), DVec2::new(1.0, 0.0), 0.0, 0.0),
        ])
        .unwrap();
        let world = tree.world_transforms();
        assert!((world[1].position - DVec2::new(0.0, 1.0)).length() < 1e-9);
        assert_eq!(world[1].rotation, 90.0);
    }

    #[test]
    fn sentinel_torso_carries_head_and_shoulders() {
        let tree = bone_structure(Archetype::Sentinel);
        let kids: Vec<&str> = tree
            .bones()
            .iter()
            .filter(|b| b.parent.as_deref() == Some("torso"))
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(kids, ["head", "shoulder_left", "shoulder_right"]);
    }

    #[test]
    fn walk_filter_selects_legs_arms_and_body() {
        let golem = bone_structure(Archetype::Golem);
        let names: Vec<&str> = animated_bones(&golem, AnimationSet::Walk)
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(names, ["arm_left", "arm_right", "leg_left", "leg_right"]);
        let familiar_bones = bone_structure(Archetype::Familiar);
        let familiar: Vec<&str> =
            animated_bones(&familiar_bones, AnimationSet::Walk)
                .iter()
                .map(|b| b.name.as_str())
                .collect();
        assert_eq!(familiar, ["body", "leg_front", "leg_back"]);
    }

    #[test]
    fn rig_format_parses_and_rejects_unknown() {
        assert_eq!("spine".parse::<RigFormat>().unwrap(), RigFormat::Spine);
        assert_eq!("DragonBones".parse::<RigFormat>().unwrap(), RigFormat::DragonBones);
        assert!(matches!(
            "collada".parse::<RigFormat>(),
            Err(EngineError::UnknownVariant { field: "rig format", .. })
        ));
    }

    #[test]
    fn both_formats_reference_the_same_bones() {
        for archetype in Archetype::ALL {
            let (result, spec) = sprite(*archetype);
            let spine = export(&result, &spec, RigFormat::Spine);
            let dragon = export(&result, &spec, RigFormat::DragonBones);
            let a: HashSet<&str> = spine.bone_names().into_iter().collect();
            let b: HashSet<&str> = dragon.bone_names().into_iter().collect();
            assert_eq!(a, b, "{archetype:?}");
            assert_eq!(spine.slot_names(), dragon.slot_names());
        }
    }

    #[test]
    fn one_slot_per_part_in_layer_order() {
        let (result, spec) = sprite(Archetype::Familiar);
        let rig = export(&result, &spec, RigFormat::Spine);
        let expected: Vec<&str> = result.parts.iter().map(|p| p.template_id.as_str()).collect();
        assert_eq!(rig.slot_names(), expected);
    }

    #[test]
    fn only_filtered_bones_are_keyed() {
        let (result, spec) = sprite(Archetype::Golem);
        for format in [RigFormat::Spine, RigFormat::DragonBones] {
            let rig = export(&result, &spec, format);
            let mut cast = rig.keyed_bones("cast");
            cast.sort_unstable();
            assert_eq!(cast, ["arm_left", "arm_right", "head"], "{format:?}");
            assert!(rig.keyed_bones("attack").is_empty());
        }
    }

    #[test]
    fn duplicate_template_ids_get_unique_slots() {
        let (mut result, spec) = sprite(Archetype::Golem);
        let extra = result.parts[0].clone();
        result.parts.push(extra);
        let rig = export(&result, &spec, RigFormat::Spine);
        let names = rig.slot_names();
        let unique: HashSet<&&str> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn slot_suffix_skips_names_already_in_use() {
        let mut taken = HashSet::new();
        let names: Vec<String> = ["backdrop", "backdrop_2", "backdrop", "backdrop"]
            .into_iter()
            .map(|id| unique_slot_name(id, &mut taken))
            .collect();
        assert_eq!(names, ["backdrop", "backdrop_2", "backdrop_3", "backdrop_4"]);
    }

    #[test]
    fn formats_agree_on_playback_timing() {
        for stage in EvolutionStage::ALL {
            let spec = SpriteSpec::new(Archetype::Familiar, Genre::Fantasy, 24, 24)
                .with_animations(vec![AnimationSet::Walk])
                .with_evolution(vec![*stage], 4);
            let result = generate(&Seed::new("timing"), &spec).unwrap();
            let ExchangeRecord::Spine(spine) = export(&result, &spec, RigFormat::Spine) else {
                panic!("expected spine");
            };
            let ExchangeRecord::DragonBones(dragon) = export(&result, &spec, RigFormat::DragonBones)
            else {
                panic!("expected dragonbones");
            };
            let armature = &dragon.armature[0];
            let rate = armature.frame_rate as f64;
            assert!((1.0 / rate - stage.frame_duration()).abs() < 1e-12, "{stage:?}");
            assert_eq!(spine.skeleton.fps, rate);

            let dragon_seconds = armature.animation[0].duration as f64 / rate;
            let timeline = spine.animations["walk"].bones.values().next().unwrap();
            let spine_seconds = timeline.rotate.last().unwrap().time;
            assert!((dragon_seconds - spine_seconds).abs() < 0.005, "{stage:?}");
        }
    }

    #[test]
    fn round2_folds_negative_zero() {
        assert_eq!(round2(-0.0001).to_string(), "0");
        assert_eq!(round2(1.23456), 1.23);
    }
}
