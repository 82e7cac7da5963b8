//! Spine JSON skeleton documents (4.x layout).
//!
//! Spine is y-up with rotations in degrees counter-clockwise, which matches
//! the rig's own conventions, so values carry over unchanged. Keyframe times
//! are in seconds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{round2, Rig};
use crate::raster::BlendMode;

const SPINE_VERSION: &str = "4.1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineDocument {
    pub skeleton: SpineSkeleton,
    pub bones: Vec<SpineBone>,
    pub slots: Vec<SpineSlot>,
    pub skins: Vec<SpineSkin>,
    pub animations: BTreeMap<String, SpineAnimation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineSkeleton {
    pub hash: String,
    pub spine: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fps: f64,
    pub images: String,
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

fn is_one(v: &f64) -> bool {
    *v == 1.0
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpineBone {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub length: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub x: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub y: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: f64,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale_x: f64,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineSlot {
    pub name: String,
    pub bone: String,
    pub attachment: String,
    /// `rrggbbaa`, no leading `#`.
    pub color: String,
    pub blend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineSkin {
    pub name: String,
    /// slot name → attachment name → region.
    pub attachments: BTreeMap<String, BTreeMap<String, SpineRegion>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineRegion {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineAnimation {
    pub bones: BTreeMap<String, SpineBoneTimeline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineBoneTimeline {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rotate: Vec<SpineRotateKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translate: Vec<SpineTranslateKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineRotateKey {
    pub time: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineTranslateKey {
    pub time: f64,
    pub x: f64,
    pub y: f64,
}

fn blend_name(mode: BlendMode) -> &'static str {
    match mode {
        BlendMode::Normal => "normal",
        BlendMode::Add => "additive",
        BlendMode::Multiply => "multiply",
        BlendMode::Screen => "screen",
    }
}

pub(crate) fn document(rig: &Rig<'_>) -> SpineDocument {
    let (width, height) = (rig.cell.width as f64, rig.cell.height as f64);

    let bones = rig
        .skeleton
        .bones()
        .iter()
        .map(|b| SpineBone {
            name: b.name.clone(),
            parent: b.parent.clone(),
            length: round2(b.length),
            x: round2(b.position.x),
            y: round2(b.position.y),
            rotation: round2(b.rotation),
            scale_x: b.scale.x,
            scale_y: b.scale.y,
        })
        .collect();

    let slots = rig
        .slots
        .iter()
        .map(|s| SpineSlot {
            name: s.name.clone(),
            bone: s.bone.clone(),
            attachment: s.part.template_id.clone(),
            color: s.part.tint.with_alpha(1.0).to_hex().trim_start_matches('#').to_string() + "ff",
            blend: blend_name(s.part.blend_mode).to_string(),
        })
        .collect();

    let attachments = rig
        .slots
        .iter()
        .map(|s| {
            let region = SpineRegion {
                x: round2(s.offset.x),
                y: round2(s.offset.y),
                rotation: round2(s.rotation),
                width: s.part.width as f64,
                height: s.part.height as f64,
            };
            (
                s.name.clone(),
                BTreeMap::from([(s.part.template_id.clone(), region)]),
            )
        })
        .collect();

    let animations = rig
        .tracks
        .iter()
        .map(|track| {
            let bones = track
                .bones
                .iter()
                .map(|keys| {
                    let time = |frame: u32| round2(rig.time_at(frame));
                    let timeline = SpineBoneTimeline {
                        rotate: keys
                            .keys
                            .iter()
                            .map(|k| SpineRotateKey {
                                time: time(k.frame),
                                value: round2(k.rotate),
                            })
                            .collect(),
                        translate: keys
                            .keys
                            .iter()
                            .map(|k| SpineTranslateKey {
                                time: time(k.frame),
                                x: round2(k.offset.x),
                                y: round2(k.offset.y),
                            })
                            .collect(),
                    };
                    (keys.bone.clone(), timeline)
                })
                .collect();
            (track.animation.name().to_string(), SpineAnimation { bones })
        })
        .collect();

    SpineDocument {
        skeleton: SpineSkeleton {
            hash: rig.hash.to_string(),
            spine: SPINE_VERSION.to_string(),
            x: round2(-width / 2.0),
            y: 0.0,
            width,
            height,
            fps: rig.frame_rate as f64,
            images: "./".to_string(),
        },
        bones,
        slots,
        skins: vec![SpineSkin {
            name: "default".to_string(),
            attachments,
        }],
        animations,
    }
}

#[cfg(test)]
mod tests {
    use crate::compose::generate;
    use crate::rig::{export, ExchangeRecord, RigFormat};
    use crate::seed::Seed;
    use crate::spec::{AnimationSet, Archetype, Genre, SpriteSpec};

    fn spine(archetype: Archetype) -> super::SpineDocument {
        let spec = SpriteSpec::new(archetype, Genre::Mythic, 32, 32)
            .with_animations(vec![AnimationSet::Idle, AnimationSet::Hurt]);
        let result = generate(&Seed::new("spine"), &spec).unwrap();
        match export(&result, &spec, RigFormat::Spine) {
            ExchangeRecord::Spine(doc) => doc,
            other => panic!("expected spine, got {:?}", other.format()),
        }
    }

    #[test]
    fn document_has_spine_sections() {
        let json: serde_json::Value =
            serde_json::from_str(&ExchangeRecord::Spine(spine(Archetype::Golem)).to_json().unwrap())
                .unwrap();
        for key in ["skeleton", "bones", "slots", "skins", "animations"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["skeleton"]["spine"], "4.1");
        assert_eq!(json["skeleton"]["hash"].as_str().unwrap().len(), 64);
        assert_eq!(json["bones"][0]["name"], "root");
        assert!(json["bones"][0].get("parent").is_none());
        assert_eq!(json["skins"][0]["name"], "default");
    }

    #[test]
    fn skeleton_bounds_center_the_cell() {
        let doc = spine(Archetype::Wisp);
        assert_eq!(doc.skeleton.width, 32.0);
        assert_eq!(doc.skeleton.x, -16.0);
        assert_eq!(doc.skeleton.fps, 8.0);
    }

    #[test]
    fn every_slot_has_a_skin_region() {
        let doc = spine(Archetype::Familiar);
        for slot in &doc.slots {
            let regions = &doc.skins[0].attachments[&slot.name];
            assert!(regions.contains_key(&slot.attachment));
            assert_eq!(slot.color.len(), 8);
        }
    }

    #[test]
    fn looping_tracks_close_on_their_first_key() {
        let doc = spine(Archetype::Familiar);
        let idle = &doc.animations["idle"];
        for timeline in idle.bones.values() {
            let (first, last) = (&timeline.rotate[0], timeline.rotate.last().unwrap());
            assert_eq!(first.value, last.value);
            assert!(last.time > first.time);
        }
        assert!(doc.animations.contains_key("hurt"));
    }

    #[test]
    fn round_trips_through_serde() {
        let doc = spine(Archetype::Sentinel);
        let json = serde_json::to_string(&doc).unwrap();
        let back: super::SpineDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }
}
