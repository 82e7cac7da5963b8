//! DragonBones JSON armature documents (5.5 layout).
//!
//! DragonBones is y-down with clockwise skew angles, so y offsets and
//! rotations are negated on the way out. Animation timing is counted in
//! frames at the document frame rate.

use serde::{Deserialize, Serialize};

use super::{round2, Rig};
use crate::raster::BlendMode;

const DRAGONBONES_VERSION: &str = "5.5";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragonBonesDocument {
    pub frame_rate: u32,
    pub name: String,
    pub version: String,
    pub compatible_version: String,
    pub armature: Vec<DbArmature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbArmature {
    #[serde(rename = "type")]
    pub kind: String,
    pub frame_rate: u32,
    pub name: String,
    pub aabb: DbRect,
    pub bone: Vec<DbBone>,
    pub slot: Vec<DbSlot>,
    pub skin: Vec<DbSkin>,
    pub animation: Vec<DbAnimation>,
    pub default_actions: Vec<DbAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbTransform {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(rename = "skX", default)]
    pub skew_x: f64,
    #[serde(rename = "skY", default)]
    pub skew_y: f64,
    #[serde(rename = "scX", default = "one")]
    pub scale_x: f64,
    #[serde(rename = "scY", default = "one")]
    pub scale_y: f64,
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbBone {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub length: f64,
    pub transform: DbTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSlot {
    pub name: String,
    pub parent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbSkin {
    pub name: String,
    pub slot: Vec<DbSkinSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbSkinSlot {
    pub name: String,
    pub display: Vec<DbDisplay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbDisplay {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    pub width: f64,
    pub height: f64,
    pub transform: DbTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbAnimation {
    /// Length in frames.
    pub duration: u32,
    /// 0 loops forever.
    pub play_times: u32,
    pub name: String,
    pub bone: Vec<DbBoneTimeline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbBoneTimeline {
    pub name: String,
    pub rotate_frame: Vec<DbRotateFrame>,
    pub translate_frame: Vec<DbTranslateFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbRotateFrame {
    pub duration: u32,
    pub tween_easing: f64,
    pub rotate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTranslateFrame {
    pub duration: u32,
    pub tween_easing: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbAction {
    pub goto_and_play: String,
}

/// `None` for normal blending, which DragonBones leaves implicit.
fn blend_name(mode: BlendMode) -> Option<String> {
    match mode {
        BlendMode::Normal => None,
        BlendMode::Add => Some("add".into()),
        BlendMode::Multiply => Some("multiply".into()),
        BlendMode::Screen => Some("screen".into()),
    }
}

pub(crate) fn document(rig: &Rig<'_>) -> DragonBonesDocument {
    let (width, height) = (rig.cell.width as f64, rig.cell.height as f64);
    let frame_rate = rig.frame_rate;

    let bone = rig
        .skeleton
        .bones()
        .iter()
        .map(|b| DbBone {
            name: b.name.clone(),
            parent: b.parent.clone(),
            length: round2(b.length),
            transform: DbTransform {
                x: round2(b.position.x),
                y: round2(-b.position.y),
                skew_x: round2(-b.rotation),
                skew_y: round2(-b.rotation),
                scale_x: b.scale.x,
                scale_y: b.scale.y,
            },
        })
        .collect();

    let slot = rig
        .slots
        .iter()
        .map(|s| DbSlot {
            name: s.name.clone(),
            parent: s.bone.clone(),
            blend_mode: blend_name(s.part.blend_mode),
        })
        .collect();

    let skin_slots = rig
        .slots
        .iter()
        .map(|s| DbSkinSlot {
            name: s.name.clone(),
            display: vec![DbDisplay {
                name: s.part.template_id.clone(),
                kind: "image".to_string(),
                path: s.part.template_id.clone(),
                width: s.part.width as f64,
                height: s.part.height as f64,
                transform: DbTransform {
                    x: round2(s.offset.x),
                    y: round2(-s.offset.y),
                    skew_x: round2(-s.rotation),
                    skew_y: round2(-s.rotation),
                    scale_x: 1.0,
                    scale_y: 1.0,
                },
            }],
        })
        .collect();

    let animation: Vec<DbAnimation> = rig
        .tracks
        .iter()
        .map(|track| DbAnimation {
            duration: rig.columns,
            play_times: if track.looping { 0 } else { 1 },
            name: track.animation.name().to_string(),
            bone: track
                .bones
                .iter()
                .map(|keys| {
                    let last = keys.keys.len().saturating_sub(1);
                    let span = |i: usize| if i == last { 0 } else { 1 };
                    DbBoneTimeline {
                        name: keys.bone.clone(),
                        rotate_frame: keys
                            .keys
                            .iter()
                            .enumerate()
                            .map(|(i, k)| DbRotateFrame {
                                duration: span(i),
                                tween_easing: 0.0,
                                rotate: round2(-k.rotate),
                            })
                            .collect(),
                        translate_frame: keys
                            .keys
                            .iter()
                            .enumerate()
                            .map(|(i, k)| DbTranslateFrame {
                                duration: span(i),
                                tween_easing: 0.0,
                                x: round2(k.offset.x),
                                y: round2(-k.offset.y),
                            })
                            .collect(),
                    }
                })
                .collect(),
        })
        .collect();

    let default_actions = animation
        .first()
        .map(|a| DbAction {
            goto_and_play: a.name.clone(),
        })
        .into_iter()
        .collect();

    DragonBonesDocument {
        frame_rate,
        name: rig.name.to_string(),
        version: DRAGONBONES_VERSION.to_string(),
        compatible_version: DRAGONBONES_VERSION.to_string(),
        armature: vec![DbArmature {
            kind: "Armature".to_string(),
            frame_rate,
            name: rig.name.to_string(),
            aabb: DbRect {
                x: round2(-width / 2.0),
                y: -height,
                width,
                height,
            },
            bone,
            slot,
            skin: vec![DbSkin {
                name: String::new(),
                slot: skin_slots,
            }],
            animation,
            default_actions,
        }],
    }
}

#[cfg(test)]
mod tests {
    use crate::compose::generate;
    use crate::rig::{export, ExchangeRecord, RigFormat};
    use crate::seed::Seed;
    use crate::spec::{AnimationSet, Archetype, Genre, Rarity, SpriteSpec};

    fn dragon(animations: Vec<AnimationSet>) -> super::DragonBonesDocument {
        let spec = SpriteSpec::new(Archetype::Sentinel, Genre::Cyberpunk, 24, 24)
            .with_rarity(Rarity::Epic)
            .with_animations(animations);
        let result = generate(&Seed::new("dragon"), &spec).unwrap();
        match export(&result, &spec, RigFormat::DragonBones) {
            ExchangeRecord::DragonBones(doc) => doc,
            other => panic!("expected dragonbones, got {:?}", other.format()),
        }
    }

    #[test]
    fn document_uses_dragonbones_keys() {
        let doc = dragon(vec![AnimationSet::Attack]);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["version"], "5.5");
        assert!(json.get("frameRate").is_some());
        let armature = &json["armature"][0];
        assert_eq!(armature["type"], "Armature");
        for key in ["bone", "slot", "skin", "animation", "defaultActions", "aabb"] {
            assert!(armature.get(key).is_some(), "missing {key}");
        }
        assert!(armature["bone"][1]["transform"].get("skX").is_some());
        assert_eq!(armature["defaultActions"][0]["gotoAndPlay"], "attack");
    }

    #[test]
    fn y_axis_points_down() {
        let doc = dragon(vec![AnimationSet::Idle]);
        let torso = doc.armature[0]
            .bone
            .iter()
            .find(|b| b.name == "torso")
            .unwrap();
        assert!(torso.transform.y < 0.0);
        assert_eq!(doc.armature[0].aabb.y, -24.0);
    }

    #[test]
    fn animation_spans_one_sheet_row() {
        let doc = dragon(vec![AnimationSet::Idle, AnimationSet::Hurt]);
        let anims = &doc.armature[0].animation;
        assert_eq!(anims[0].duration, 6);
        assert_eq!(anims[0].play_times, 0);
        assert_eq!(anims[1].play_times, 1);
        for timeline in &anims[0].bone {
            let total: u32 = timeline.rotate_frame.iter().map(|f| f.duration).sum();
            assert_eq!(total, 6);
            assert_eq!(timeline.rotate_frame.last().unwrap().duration, 0);
        }
    }

    #[test]
    fn every_slot_has_one_display() {
        let doc = dragon(vec![AnimationSet::Idle]);
        let armature = &doc.armature[0];
        assert_eq!(armature.slot.len(), armature.skin[0].slot.len());
        for (slot, skin) in armature.slot.iter().zip(&armature.skin[0].slot) {
            assert_eq!(slot.name, skin.name);
            assert_eq!(skin.display.len(), 1);
        }
    }

    #[test]
    fn round_trips_through_serde() {
        let doc = dragon(vec![AnimationSet::Walk]);
        let json = serde_json::to_string(&doc).unwrap();
        let back: super::DragonBonesDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }
}
