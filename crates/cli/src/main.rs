#![deny(unsafe_code)]
//! CLI binary for the spriteforge sprite engine.
//!
//! Subcommands:
//! - `generate`: build a sprite sheet from a seed and spec, write PNG and
//!   optional record, animation metadata and rig files
//! - `export-rig`: write only the Spine or DragonBones document
//! - `list`: print archetypes, genres, roles, rarities and rig formats

mod error;

use clap::{Args, Parser, Subcommand};
use error::CliError;
use serde_json::json;
use spriteforge_core::{
    export, generate, AnimationSet, Archetype, DescriptiveRecord, EvolutionStage,
    GenerationResult, Genre, HarmonyKind, Rarity, RigFormat, Role, Seed, SpriteSpec,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "spriteforge", version, about = "Deterministic procedural sprite generator")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Where the sprite spec comes from: a JSON file, or individual flags.
#[derive(Args, Debug, Default)]
struct SpecArgs {
    /// Seed string; identical seeds and specs give identical sprites.
    #[arg(long)]
    seed: String,

    /// JSON spec file. Overrides every other spec flag.
    #[arg(long)]
    spec: Option<PathBuf>,

    /// Archetype name (see `list`).
    #[arg(short, long)]
    archetype: Option<String>,

    /// Genre name (see `list`).
    #[arg(short, long)]
    genre: Option<String>,

    /// Rarity tier.
    #[arg(short, long, default_value = "common")]
    rarity: String,

    /// Role override for palette and frame count.
    #[arg(long)]
    role: Option<String>,

    /// Cell size as WIDTHxHEIGHT.
    #[arg(short, long, default_value = "32x32")]
    size: String,

    /// Comma-separated animation sets.
    #[arg(long, default_value = "idle")]
    animations: String,

    /// Comma-separated evolution stages; turns the sheet into a stage grid.
    #[arg(long)]
    stages: Option<String>,

    /// Frames per stage row for an evolution grid.
    #[arg(long, default_value_t = 1)]
    frames_per_stage: u32,

    /// Seed-derived palette harmony instead of the genre colors.
    #[arg(long)]
    harmony: Option<String>,

    /// Token identifier used in the record name and file stems.
    #[arg(long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a sprite sheet and write it as PNG.
    Generate {
        #[command(flatten)]
        spec: SpecArgs,

        /// Output PNG path.
        #[arg(short, long, default_value = "sprite.png")]
        output: PathBuf,

        /// Also write the descriptive record as JSON.
        #[arg(long)]
        record: Option<PathBuf>,

        /// Also write frame rectangles and clips as JSON.
        #[arg(long)]
        animation: Option<PathBuf>,

        /// Also write every cell as its own PNG into this directory.
        #[arg(long)]
        frames_dir: Option<PathBuf>,

        /// Rig format to export alongside the sheet (spine, dragonbones).
        #[arg(long, requires = "rig_out")]
        rig: Option<String>,

        /// Rig document path.
        #[arg(long, requires = "rig")]
        rig_out: Option<PathBuf>,
    },
    /// Generate a sprite and write only its rig document.
    ExportRig {
        #[command(flatten)]
        spec: SpecArgs,

        /// Rig format (spine, dragonbones).
        #[arg(short, long, default_value = "spine")]
        format: String,

        /// Output JSON path.
        #[arg(short, long, default_value = "rig.json")]
        output: PathBuf,
    },
    /// List archetypes, genres, roles, rarities and rig formats.
    List,
}

fn parse<T>(value: &str) -> Result<T, CliError>
where
    T: FromStr<Err = spriteforge_core::EngineError>,
{
    value.parse::<T>().map_err(CliError::from)
}

fn parse_list<T>(value: &str) -> Result<Vec<T>, CliError>
where
    T: FromStr<Err = spriteforge_core::EngineError>,
{
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse)
        .collect()
}

fn parse_size(value: &str) -> Result<(usize, usize), CliError> {
    let bad = || CliError::Input(format!("invalid --size '{value}', expected WIDTHxHEIGHT"));
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(bad)?;
    let w = w.trim().parse().map_err(|_| bad())?;
    let h = h.trim().parse().map_err(|_| bad())?;
    Ok((w, h))
}

impl SpecArgs {
    fn to_spec(&self) -> Result<SpriteSpec, CliError> {
        if let Some(path) = &self.spec {
            return read_spec(path);
        }
        let archetype: Archetype = parse(
            self.archetype
                .as_deref()
                .ok_or_else(|| CliError::Input("--archetype is required without --spec".into()))?,
        )?;
        let genre: Genre = parse(
            self.genre
                .as_deref()
                .ok_or_else(|| CliError::Input("--genre is required without --spec".into()))?,
        )?;
        let (width, height) = parse_size(&self.size)?;

        let mut spec = SpriteSpec::new(archetype, genre, width, height)
            .with_rarity(parse::<Rarity>(&self.rarity)?)
            .with_animations(parse_list::<AnimationSet>(&self.animations)?);
        if let Some(role) = &self.role {
            spec = spec.with_role(parse::<Role>(role)?);
        }
        if let Some(stages) = &self.stages {
            spec = spec.with_evolution(parse_list::<EvolutionStage>(stages)?, self.frames_per_stage);
        }
        if let Some(harmony) = &self.harmony {
            spec = spec.with_harmony(parse::<HarmonyKind>(harmony)?);
        }
        if let Some(token) = &self.token {
            spec = spec.with_token(token.as_str());
        }
        Ok(spec)
    }
}

fn read_spec(path: &Path) -> Result<SpriteSpec, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("invalid spec {}: {e}", path.display())))
}

fn generate_from(args: &SpecArgs) -> Result<(SpriteSpec, GenerationResult), CliError> {
    let spec = args.to_spec()?;
    debug!(?spec, "resolved spec");
    let result = generate(&Seed::new(args.seed.as_str()), &spec)?;
    Ok((spec, result))
}

/// The record with its image and animation URIs pointing at this run's files.
fn located_record(
    record: &DescriptiveRecord,
    output: &Path,
    animation: Option<&Path>,
) -> DescriptiveRecord {
    let animation_url = animation.map_or_else(
        || record.animation_url.clone(),
        |path| path.display().to_string(),
    );
    record
        .clone()
        .with_uris(output.display().to_string(), animation_url)
}

fn names<T: Copy>(all: &[T], name: fn(T) -> &'static str) -> Vec<&'static str> {
    all.iter().copied().map(name).collect()
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let sections = [
                ("archetypes", names(Archetype::ALL, Archetype::name)),
                ("genres", names(Genre::ALL, Genre::name)),
                ("roles", names(Role::ALL, Role::name)),
                ("rarities", names(Rarity::ALL, Rarity::name)),
                ("stages", names(EvolutionStage::ALL, EvolutionStage::name)),
                ("animations", names(AnimationSet::ALL, AnimationSet::name)),
                ("harmonies", names(HarmonyKind::ALL, HarmonyKind::name)),
                ("rig_formats", names(RigFormat::ALL, RigFormat::name)),
            ];
            if cli.json {
                let info: serde_json::Map<String, serde_json::Value> = sections
                    .iter()
                    .map(|(key, values)| (key.to_string(), json!(values)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                for (key, values) in &sections {
                    println!("{}:", key.replace('_', " "));
                    println!("  {}", values.join(", "));
                }
            }
        }
        Command::Generate {
            spec,
            output,
            record,
            animation,
            frames_dir,
            rig,
            rig_out,
        } => {
            let rig_format = rig.as_deref().map(parse::<RigFormat>).transpose()?;
            let (sprite, result) = generate_from(&spec)?;

            spriteforge_output::write_png(&result.image, &output)?;
            if let Some(path) = &record {
                let located = located_record(&result.record, &output, animation.as_deref());
                spriteforge_output::write_record(&located, path)?;
            }
            if let Some(path) = &animation {
                spriteforge_output::write_animation(&result.animation, path)?;
            }
            let frames = match &frames_dir {
                Some(dir) => {
                    spriteforge_output::write_frames(&result.image, &result.animation, dir)?.len()
                }
                None => 0,
            };
            if let (Some(format), Some(path)) = (rig_format, &rig_out) {
                spriteforge_output::write_rig(&export(&result, &sprite, format), path)?;
            }

            if cli.json {
                let info = json!({
                    "seed": spec.seed,
                    "archetype": sprite.archetype.name(),
                    "genre": sprite.genre.name(),
                    "width": result.image.width(),
                    "height": result.image.height(),
                    "provenance_hash": result.provenance_hash,
                    "name": result.record.name,
                    "parts": result.parts.iter().map(|p| p.template_id.as_str()).collect::<Vec<_>>(),
                    "output": output.display().to_string(),
                    "record": record.as_ref().map(|p| p.display().to_string()),
                    "animation": animation.as_ref().map(|p| p.display().to_string()),
                    "frames_written": frames,
                    "rig": rig_out.as_ref().map(|p| p.display().to_string()),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "generated {} ({}x{}, hash {}) -> {}",
                    result.record.name,
                    result.image.width(),
                    result.image.height(),
                    &result.provenance_hash[..12],
                    output.display()
                );
            }
        }
        Command::ExportRig {
            spec,
            format,
            output,
        } => {
            let format = parse::<RigFormat>(&format)?;
            let (sprite, result) = generate_from(&spec)?;
            let document = export(&result, &sprite, format);
            spriteforge_output::write_rig(&document, &output)?;

            if cli.json {
                let info = json!({
                    "seed": spec.seed,
                    "format": format.name(),
                    "bones": document.bone_names(),
                    "slots": document.slot_names(),
                    "output": output.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "exported {} rig ({} bones) -> {}",
                    format.label(),
                    document.bone_names().len(),
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging disabled: {e}");
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
