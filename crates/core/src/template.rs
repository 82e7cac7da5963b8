//! Part templates and the archetype-indexed template library.
//!
//! A [`PartTemplate`] declares one renderable creature component: what kind
//! of part it is, where it sits in the z-order, how it blends and which
//! archetypes, genres and evolution stages it is compatible with. The
//! [`TemplateLibrary`] indexes templates by archetype and chooses the parts
//! for each generation call.
//!
//! Registration is additive only. Once built, a library is read-only and can
//! be shared across threads; [`TemplateLibrary::builtin`] hands out a
//! process-wide instance initialized exactly once.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::prng::Xorshift64;
use crate::raster::{BlendMode, RasterImage};
use crate::spec::{named_enum, Archetype, EvolutionStage, Genre, Size, SpriteSpec};

/// Kind of creature component a template renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartType {
    Body,
    Head,
    Eyes,
    Limbs,
    Wings,
    Tail,
    Accessories,
    Effects,
    Background,
}

named_enum!(PartType, "part type", [
    Body => ("body", "Body"),
    Head => ("head", "Head"),
    Eyes => ("eyes", "Eyes"),
    Limbs => ("limbs", "Limbs"),
    Wings => ("wings", "Wings"),
    Tail => ("tail", "Tail"),
    Accessories => ("accessories", "Accessories"),
    Effects => ("effects", "Effects"),
    Background => ("background", "Background"),
]);

impl PartType {
    /// Types every sprite tries to include, in selection order.
    pub const ESSENTIAL: [PartType; 3] = [PartType::Body, PartType::Head, PartType::Eyes];

    pub fn is_essential(self) -> bool {
        Self::ESSENTIAL.contains(&self)
    }

    pub fn default_layer(self) -> RenderLayer {
        match self {
            PartType::Background => RenderLayer::Background,
            PartType::Body => RenderLayer::Body,
            PartType::Wings | PartType::Tail => RenderLayer::BodyDetails,
            PartType::Limbs => RenderLayer::Limbs,
            PartType::Head => RenderLayer::Head,
            PartType::Eyes => RenderLayer::Eyes,
            PartType::Accessories => RenderLayer::Accessories,
            PartType::Effects => RenderLayer::Effects,
        }
    }

    /// Earliest stage at which the part is drawn at all.
    pub fn min_stage(self) -> EvolutionStage {
        match self {
            PartType::Accessories => EvolutionStage::Adult,
            PartType::Effects => EvolutionStage::Elder,
            _ => EvolutionStage::Egg,
        }
    }
}

/// Named z-order slots. Parts composite in ascending [`RenderLayer::z`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderLayer {
    Background,
    Body,
    BodyDetails,
    Limbs,
    Head,
    Eyes,
    Accessories,
    Effects,
    Foreground,
}

impl RenderLayer {
    pub fn z(self) -> i32 {
        match self {
            RenderLayer::Background => 0,
            RenderLayer::Body => 10,
            RenderLayer::BodyDetails => 20,
            RenderLayer::Limbs => 30,
            RenderLayer::Head => 40,
            RenderLayer::Eyes => 50,
            RenderLayer::Accessories => 60,
            RenderLayer::Effects => 70,
            RenderLayer::Foreground => 80,
        }
    }
}

/// How a part's pixels are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    #[default]
    Procedural,
    /// Pixels come from the template's attached asset image.
    Asset,
    /// Procedural pixels with the asset image composited on top.
    Hybrid,
}

named_enum!(GenerationMethod, "generation method", [
    Procedural => ("procedural", "Procedural"),
    Asset => ("asset", "Asset"),
    Hybrid => ("hybrid", "Hybrid"),
]);

/// A reusable, declarative part definition.
///
/// Empty `genres` or `stages` sets mean "compatible with all".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartTemplate {
    pub id: String,
    pub name: String,
    pub part_type: PartType,
    pub layer: i32,
    /// `None` renders at the sprite cell size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default)]
    pub offset: (i64, i64),
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub method: GenerationMethod,
    #[serde(skip)]
    pub asset: Option<Arc<RasterImage>>,
    pub archetypes: BTreeSet<Archetype>,
    #[serde(default)]
    pub genres: BTreeSet<Genre>,
    #[serde(default)]
    pub stages: BTreeSet<EvolutionStage>,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub frame_count: u32,
}

impl PartTemplate {
    /// A procedural, cell-sized template on its type's default layer.
    pub fn new(id: impl Into<String>, name: impl Into<String>, part_type: PartType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            part_type,
            layer: part_type.default_layer().z(),
            size: None,
            offset: (0, 0),
            blend_mode: BlendMode::Normal,
            method: GenerationMethod::Procedural,
            asset: None,
            archetypes: BTreeSet::new(),
            genres: BTreeSet::new(),
            stages: BTreeSet::new(),
            animated: false,
            frame_count: 0,
        }
    }

    pub fn for_archetypes(mut self, archetypes: impl IntoIterator<Item = Archetype>) -> Self {
        self.archetypes.extend(archetypes);
        self
    }

    pub fn for_genres(mut self, genres: impl IntoIterator<Item = Genre>) -> Self {
        self.genres.extend(genres);
        self
    }

    pub fn for_stages(mut self, stages: impl IntoIterator<Item = EvolutionStage>) -> Self {
        self.stages.extend(stages);
        self
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    pub fn with_offset(mut self, x: i64, y: i64) -> Self {
        self.offset = (x, y);
        self
    }

    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    /// Attaches pixels and switches to `Asset` (or `Hybrid` when `hybrid`).
    pub fn with_asset(mut self, image: RasterImage, hybrid: bool) -> Self {
        self.asset = Some(Arc::new(image));
        self.method = if hybrid {
            GenerationMethod::Hybrid
        } else {
            GenerationMethod::Asset
        };
        self
    }

    pub fn animated(mut self, frame_count: u32) -> Self {
        self.animated = true;
        self.frame_count = frame_count;
        self
    }

    pub fn accepts_genre(&self, genre: Genre) -> bool {
        self.genres.is_empty() || self.genres.contains(&genre)
    }

    pub fn accepts_stage(&self, stage: EvolutionStage) -> bool {
        self.stages.is_empty() || self.stages.contains(&stage)
    }

    /// Pixel size of the rasterized part for a given sprite cell.
    pub fn resolved_size(&self, cell: Size) -> Size {
        self.size.unwrap_or(cell)
    }

    fn validate(&self) -> Result<(), EngineError> {
        let invalid = |reason: &str| EngineError::InvalidTemplate {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if self.archetypes.is_empty() {
            return Err(invalid("declares no compatible archetypes"));
        }
        if let Some(size) = self.size {
            if size.width == 0 || size.height == 0 {
                return Err(invalid("fixed size must be non-zero"));
            }
        }
        if self.animated && self.frame_count == 0 {
            return Err(invalid("animated templates need at least one frame"));
        }
        match self.method {
            GenerationMethod::Procedural => Ok(()),
            GenerationMethod::Asset | GenerationMethod::Hybrid if self.asset.is_none() => {
                Err(EngineError::MissingAsset(self.id.clone()))
            }
            GenerationMethod::Asset | GenerationMethod::Hybrid => Ok(()),
        }
    }
}

/// Archetype-indexed catalog of part templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    by_archetype: BTreeMap<Archetype, Vec<Arc<PartTemplate>>>,
    registered: usize,
}

static BUILTIN: LazyLock<TemplateLibrary> = LazyLock::new(TemplateLibrary::with_builtins);

impl TemplateLibrary {
    /// An empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh library pre-populated with the baseline templates for every
    /// built-in archetype.
    pub fn with_builtins() -> Self {
        let mut library = Self::new();
        for template in builtin_templates() {
            if let Err(e) = library.register(template) {
                // Built-in definitions are static; a failure is a programming error.
                debug_assert!(false, "built-in template rejected: {e}");
            }
        }
        debug!(templates = library.len(), "built-in template library initialized");
        library
    }

    /// Process-wide built-in library, initialized on first access. Concurrent
    /// first calls block until the single initialization completes.
    pub fn builtin() -> &'static TemplateLibrary {
        &BUILTIN
    }

    /// Validates and appends `template` under every archetype it declares.
    ///
    /// On error the library is left unchanged. Duplicate ids are not
    /// detected; registering twice yields two entries.
    pub fn register(&mut self, template: PartTemplate) -> Result<(), EngineError> {
        template.validate()?;
        let template = Arc::new(template);
        for archetype in &template.archetypes {
            self.by_archetype
                .entry(*archetype)
                .or_default()
                .push(Arc::clone(&template));
        }
        self.registered += 1;
        Ok(())
    }

    /// Number of successful registrations.
    pub fn len(&self) -> usize {
        self.registered
    }

    pub fn is_empty(&self) -> bool {
        self.registered == 0
    }

    /// All templates registered for `archetype`, in registration order.
    pub fn templates(&self, archetype: Archetype) -> &[Arc<PartTemplate>] {
        self.by_archetype
            .get(&archetype)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Templates for `archetype` whose genre predicate accepts `genre`.
    pub fn available_parts(&self, archetype: Archetype, genre: Genre) -> Vec<Arc<PartTemplate>> {
        self.templates(archetype)
            .iter()
            .filter(|t| t.accepts_genre(genre))
            .cloned()
            .collect()
    }

    /// [`available_parts`](Self::available_parts) narrowed to the stages the
    /// spec will render: any requested stage for an evolution chain, the
    /// standard stage otherwise.
    pub fn available_for(&self, spec: &SpriteSpec) -> Vec<Arc<PartTemplate>> {
        let stages: &[EvolutionStage] = if spec.evolution_chain {
            &spec.stages
        } else {
            &[EvolutionStage::STANDARD]
        };
        self.available_parts(spec.archetype, spec.genre)
            .into_iter()
            .filter(|t| stages.iter().any(|s| t.accepts_stage(*s)))
            .collect()
    }

    /// Chooses the parts for one generation call.
    ///
    /// The first available template of each essential type is always taken
    /// (a type with no match is skipped). An evolution chain then takes every
    /// non-essential template; a standard sprite draws between one and three
    /// of them from `rng`.
    pub fn select_for_generation(
        &self,
        spec: &SpriteSpec,
        rng: &mut Xorshift64,
    ) -> Vec<Arc<PartTemplate>> {
        let available = self.available_for(spec);
        let mut chosen: Vec<Arc<PartTemplate>> = PartType::ESSENTIAL
            .iter()
            .filter_map(|ty| available.iter().find(|t| t.part_type == *ty).cloned())
            .collect();

        // Sampled by (layer, id) so registration order never changes the draw.
        let mut remainder: Vec<&Arc<PartTemplate>> = available
            .iter()
            .filter(|t| !t.part_type.is_essential())
            .collect();
        remainder.sort_by(|a, b| (a.layer, &a.id).cmp(&(b.layer, &b.id)));

        if spec.evolution_chain {
            chosen.extend(remainder.into_iter().cloned());
        } else if !remainder.is_empty() {
            let count = 1 + rng.next_usize(remainder.len().min(3));
            let mut picks = rng.sample_indices(remainder.len(), count);
            picks.sort_unstable();
            chosen.extend(picks.into_iter().map(|i| Arc::clone(remainder[i])));
        }

        debug!(
            archetype = spec.archetype.name(),
            available = available.len(),
            selected = chosen.len(),
            "selected part templates"
        );
        chosen
    }
}

fn builtin_templates() -> Vec<PartTemplate> {
    use Archetype::*;
    use EvolutionStage::{Adult, Elder, Legendary};

    let familiar = [Familiar, Homunculus];
    let golem = [Golem, Automaton];
    let wisp = [Wisp, Drifter];
    let sentinel = [Sentinel, Warder];

    vec![
        // Familiar plan
        PartTemplate::new("familiar_body", "Familiar Body", PartType::Body).for_archetypes(familiar),
        PartTemplate::new("familiar_head", "Familiar Head", PartType::Head).for_archetypes(familiar),
        PartTemplate::new("familiar_eyes", "Familiar Eyes", PartType::Eyes).for_archetypes(familiar),
        PartTemplate::new("familiar_paws", "Padded Paws", PartType::Limbs).for_archetypes(familiar),
        PartTemplate::new("familiar_tail", "Curled Tail", PartType::Tail)
            .for_archetypes(familiar)
            .animated(4),
        PartTemplate::new("familiar_collar", "Charm Collar", PartType::Accessories)
            .for_archetypes(familiar)
            .for_stages([Adult, Elder, Legendary]),
        // Golem plan
        PartTemplate::new("golem_body", "Golem Core", PartType::Body).for_archetypes(golem),
        PartTemplate::new("golem_head", "Golem Crown", PartType::Head).for_archetypes(golem),
        PartTemplate::new("golem_eyes", "Golem Eyes", PartType::Eyes).for_archetypes(golem),
        PartTemplate::new("golem_arms", "Stone Arms", PartType::Limbs).for_archetypes(golem),
        PartTemplate::new("golem_runes", "Glowing Runes", PartType::Accessories)
            .for_archetypes(golem)
            .for_genres([Genre::Fantasy, Genre::Steampunk, Genre::Mythic])
            .for_stages([Adult, Elder, Legendary])
            .with_blend_mode(BlendMode::Add),
        // Wisp plan
        PartTemplate::new("wisp_body", "Wisp Core", PartType::Body)
            .for_archetypes(wisp)
            .animated(4),
        PartTemplate::new("wisp_eyes", "Wisp Eyes", PartType::Eyes).for_archetypes(wisp),
        PartTemplate::new("wisp_trail", "Ember Trail", PartType::Tail)
            .for_archetypes(wisp)
            .with_blend_mode(BlendMode::Add)
            .animated(4),
        PartTemplate::new("wisp_motes", "Orbiting Motes", PartType::Effects)
            .for_archetypes(wisp)
            .for_stages([Elder, Legendary])
            .with_blend_mode(BlendMode::Screen)
            .animated(4),
        // Sentinel plan
        PartTemplate::new("sentinel_body", "Sentinel Shell", PartType::Body).for_archetypes(sentinel),
        PartTemplate::new("sentinel_head", "Sentinel Helm", PartType::Head).for_archetypes(sentinel),
        PartTemplate::new("sentinel_eyes", "Sentinel Visor", PartType::Eyes).for_archetypes(sentinel),
        PartTemplate::new("sentinel_wings", "Vaned Wings", PartType::Wings)
            .for_archetypes(sentinel)
            .for_genres([Genre::Fantasy, Genre::SciFi, Genre::Mythic])
            .animated(4),
        PartTemplate::new("sentinel_halo", "Warding Halo", PartType::Accessories)
            .for_archetypes(sentinel)
            .for_stages([Adult, Elder, Legendary])
            .with_blend_mode(BlendMode::Screen),
        // Shared across every archetype
        PartTemplate::new("aura", "Ascendant Aura", PartType::Effects)
            .for_archetypes(Archetype::ALL.iter().copied())
            .for_stages([Elder, Legendary])
            .with_blend_mode(BlendMode::Screen)
            .animated(4),
        PartTemplate::new("backdrop", "Sigil Backdrop", PartType::Background)
            .for_archetypes(Archetype::ALL.iter().copied())
            .for_genres([Genre::Fantasy, Genre::Mythic]),
    ]
}
