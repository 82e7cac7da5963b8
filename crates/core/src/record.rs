//! The descriptive record handed to callers alongside a generated sprite.
//!
//! The record is plain data: a name, a description, two URI placeholders and
//! a list of `{trait_type, value}` attributes. Persisting it is the caller's
//! job.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::{param_nonempty, scalar_params};
use crate::spec::{EvolutionStage, SpriteSpec};

/// Trait keys consumed by the record itself rather than listed as attributes.
const RESERVED_TRAITS: &[&str] = &["name", "description"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: Value,
}

impl Attribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveRecord {
    pub name: String,
    pub description: String,
    pub image: String,
    pub animation_url: String,
    pub attributes: Vec<Attribute>,
}

impl DescriptiveRecord {
    /// Builds the record for one generated sprite.
    ///
    /// `frames` is the number of columns in the sheet. The `name` and
    /// `description` traits override the generated text; every other scalar
    /// trait is appended as an attribute.
    pub fn describe(spec: &SpriteSpec, provenance_hash: &str, frames: u32) -> Self {
        let stem = if spec.token_id.is_empty() {
            provenance_hash.chars().take(12).collect::<String>()
        } else {
            spec.token_id.clone()
        };

        let name = param_nonempty(&spec.traits, "name").unwrap_or_else(|| {
            format!("{} {} #{}", spec.genre.label(), spec.archetype.label(), stem)
        });
        let description = param_nonempty(&spec.traits, "description")
            .unwrap_or_else(|| generated_description(spec, frames));

        let category = if spec.evolution_chain {
            "Evolution Chain"
        } else {
            "Sprite"
        };
        let mut attributes = vec![
            Attribute::new("Category", category),
            Attribute::new("Archetype", spec.archetype.label()),
            Attribute::new("Genre", spec.genre.label()),
            Attribute::new("Rarity", spec.rarity.label()),
            Attribute::new("Provenance Hash", provenance_hash),
        ];
        if let Some(role) = spec.role {
            attributes.push(Attribute::new("Role", role.label()));
        }
        attributes.push(Attribute::new("Frames", frames));
        if spec.evolution_chain {
            attributes.push(Attribute::new("Stages", stage_list(&spec.stages)));
        }
        attributes.extend(
            scalar_params(&spec.traits, RESERVED_TRAITS)
                .map(|(key, value)| Attribute::new(key, value.clone())),
        );

        Self {
            name,
            description,
            image: format!("{stem}.png"),
            animation_url: format!("{stem}.anim.json"),
            attributes,
        }
    }

    /// Replaces the URI placeholders with where the caller actually put things.
    pub fn with_uris(mut self, image: impl Into<String>, animation_url: impl Into<String>) -> Self {
        self.image = image.into();
        self.animation_url = animation_url.into();
        self
    }

    /// First attribute with the given trait type.
    pub fn attribute(&self, trait_type: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| &a.value)
    }
}

fn stage_list(stages: &[EvolutionStage]) -> String {
    stages
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn generated_description(spec: &SpriteSpec, frames: u32) -> String {
    let mut text = format!(
        "A {} {} {}",
        spec.rarity.label().to_lowercase(),
        spec.genre.label(),
        spec.archetype.label().to_lowercase()
    );
    if let Some(role) = spec.role {
        text.push_str(&format!(" of the {} calling", role.label().to_lowercase()));
    }
    if spec.evolution_chain {
        text.push_str(&format!(
            ", shown evolving through {} in {} frames per stage.",
            stage_list(&spec.stages),
            frames
        ));
    } else {
        text.push_str(&format!(", animated over {frames} frames."));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Archetype, Genre, Rarity, Role};

    const HASH: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn spec() -> SpriteSpec {
        SpriteSpec::new(Archetype::Wisp, Genre::SciFi, 24, 24).with_rarity(Rarity::Rare)
    }

    #[test]
    fn required_attributes_are_present() {
        let record = DescriptiveRecord::describe(&spec(), HASH, 6);
        for key in ["Category", "Archetype", "Genre", "Rarity", "Provenance Hash"] {
            assert!(record.attribute(key).is_some(), "missing {key}");
        }
        assert_eq!(record.attribute("Genre"), Some(&Value::from("Sci-Fi")));
        assert_eq!(record.attribute("Provenance Hash"), Some(&Value::from(HASH)));
        assert_eq!(record.attribute("Frames"), Some(&Value::from(6)));
        assert_eq!(record.attribute("Role"), None);
    }

    #[test]
    fn generated_name_uses_token_or_hash_prefix() {
        let anonymous = DescriptiveRecord::describe(&spec(), HASH, 4);
        assert_eq!(anonymous.name, "Sci-Fi Wisp #0123456789ab");
        assert_eq!(anonymous.image, "0123456789ab.png");
        let token = DescriptiveRecord::describe(&spec().with_token("77"), HASH, 4);
        assert_eq!(token.name, "Sci-Fi Wisp #77");
        assert_eq!(token.animation_url, "77.anim.json");
    }

    #[test]
    fn name_and_description_traits_override() {
        let s = spec()
            .with_trait("name", "Lantern")
            .with_trait("description", "Drifts at dusk.");
        let record = DescriptiveRecord::describe(&s, HASH, 4);
        assert_eq!(record.name, "Lantern");
        assert_eq!(record.description, "Drifts at dusk.");
        assert!(record.attribute("name").is_none());
    }

    #[test]
    fn role_and_chain_attributes() {
        let s = spec()
            .with_role(Role::Herald)
            .with_evolution(vec![EvolutionStage::Egg, EvolutionStage::Adult], 2);
        let record = DescriptiveRecord::describe(&s, HASH, 2);
        assert_eq!(record.attribute("Role"), Some(&Value::from("Herald")));
        assert_eq!(record.attribute("Category"), Some(&Value::from("Evolution Chain")));
        assert_eq!(record.attribute("Stages"), Some(&Value::from("Egg, Adult")));
        assert!(record.description.contains("Egg, Adult"));
    }

    #[test]
    fn scalar_traits_become_trailing_attributes() {
        let s = spec().with_trait("mood", "calm").with_trait("tags", serde_json::json!(["x"]));
        let record = DescriptiveRecord::describe(&s, HASH, 4);
        let last = record.attributes.last().unwrap();
        assert_eq!(last.trait_type, "mood");
        assert!(record.attribute("tags").is_none());
    }

    #[test]
    fn serializes_with_required_keys() {
        let json = serde_json::to_value(DescriptiveRecord::describe(&spec(), HASH, 4)).unwrap();
        for key in ["name", "description", "image", "animation_url", "attributes"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["attributes"][0].get("trait_type").is_some());
    }

    #[test]
    fn with_uris_replaces_placeholders() {
        let record = DescriptiveRecord::describe(&spec(), HASH, 4).with_uris("out/a.png", "out/a.json");
        assert_eq!(record.image, "out/a.png");
        assert_eq!(record.animation_url, "out/a.json");
    }
}
