//! ciab-export - CIAB mesh export tool
//!
//! Converts glTF/GLB and OBJ scenes into .ciab files (positions, attributes,
//! skin weights, bone tree and sampled animations).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use ciab_common::{decode_ciab, CiabModel};
use ciab_export::{
    export_to_file, load_scene, manifest, AxisConversion, ExportOptions, UnmatchedGroupPolicy,
    DEFAULT_FPS,
};

#[derive(Parser)]
#[command(name = "ciab-export")]
#[command(about = "CIAB mesh export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a single model file
    Export {
        /// Input model file (glTF/GLB/OBJ)
        input: PathBuf,

        /// Output .ciab file (defaults next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Axis conversion applied to all emitted data
        #[arg(short, long, value_enum, default_value_t = AxisConversion::Identity)]
        axis: AxisConversion,

        /// Frame rate for sampling animations (default: 30)
        #[arg(short, long)]
        fps: Option<u32>,

        /// Fail on vertex groups that match no bone instead of falling back to bone 0
        #[arg(long)]
        strict_groups: bool,
    },

    /// Build models from a manifest file
    Build {
        /// Path to ciab.toml manifest
        #[arg(default_value = "ciab.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without building
    Check {
        /// Path to ciab.toml manifest
        #[arg(default_value = "ciab.toml")]
        manifest: PathBuf,
    },

    /// Decode a .ciab file and print its contents
    Inspect {
        /// Input .ciab file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            axis,
            fps,
            strict_groups,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(""));
            let options = ExportOptions {
                axis,
                fps_override: fps,
                unmatched_groups: if strict_groups {
                    UnmatchedGroupPolicy::Error
                } else {
                    UnmatchedGroupPolicy::Fallback
                },
            };
            tracing::info!("Converting {:?}", input);

            let scene = load_scene(&input, fps.unwrap_or(DEFAULT_FPS))?;
            export_to_file(&scene, &options, &output)?;
            tracing::info!("Done!");
        }

        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building models from {:?}", manifest);
            }
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            let written = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete! {} model(s) written", written.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Inspect { file } => inspect(&file)?,
    }

    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let model: CiabModel =
        decode_ciab(&bytes).with_context(|| format!("Failed to decode {:?}", path))?;

    let header = model.header();
    tracing::info!(
        "{:?}: version {}, {} bytes",
        path,
        header.version,
        bytes.len()
    );
    tracing::info!(
        "  vertices: {}, indices: {}, bones: {}, animations: {}",
        header.vertex_count,
        header.index_count,
        header.bone_count,
        header.animation_count
    );
    tracing::info!("  chunks: {:?}", model.present_chunks());

    if let Some(tree) = &model.skeleton {
        tracing::info!("  root bone: {}", tree.root_index);
        for (i, bone) in tree.bones.iter().enumerate() {
            tracing::info!(
                "    bone {}: parent {}, children {:?}",
                i,
                bone.parent_index,
                bone.child_indices
            );
        }
    }
    for (i, clip) in model.animations.iter().enumerate() {
        tracing::info!(
            "  animation {}: {} fps, {} keys, {:.3}s",
            i,
            clip.fps,
            clip.key_count,
            clip.duration()
        );
    }

    Ok(())
}
