//! Manifest parsing and build orchestration
//!
//! Parses ciab.toml and exports every listed model.
//!
//! ```toml
//! [output]
//! dir = "build/models"
//!
//! [models]
//! crate = "models/crate.obj"
//! hero = { path = "models/hero.glb", axis = "swap-yz", fps = 24, strict_groups = true }
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::axis::AxisConversion;
use crate::export::{export_to_file, ExportOptions};
use crate::import::{load_scene, SourceFormat, DEFAULT_FPS};
use crate::skinning::UnmatchedGroupPolicy;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub models: BTreeMap<String, ModelEntry>,
    /// Directory relative source paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("models/")
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ModelEntry {
    Simple(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        axis: AxisConversion,
        #[serde(default)]
        fps: Option<u32>,
        #[serde(default)]
        strict_groups: bool,
    },
}

impl ModelEntry {
    pub fn path(&self) -> &Path {
        match self {
            ModelEntry::Simple(p) => p,
            ModelEntry::Detailed { path, .. } => path,
        }
    }

    pub fn options(&self) -> ExportOptions {
        match self {
            ModelEntry::Simple(_) => ExportOptions::default(),
            ModelEntry::Detailed {
                axis,
                fps,
                strict_groups,
                ..
            } => ExportOptions {
                axis: *axis,
                fps_override: *fps,
                unmatched_groups: if *strict_groups {
                    UnmatchedGroupPolicy::Error
                } else {
                    UnmatchedGroupPolicy::Fallback
                },
            },
        }
    }
}

impl Manifest {
    /// Source path of an entry, resolved against the manifest directory
    pub fn source_path(&self, entry: &ModelEntry) -> PathBuf {
        self.base_dir.join(entry.path())
    }
}

/// Parse manifest text; relative paths resolve against `base_dir`
pub fn parse_manifest(content: &str, base_dir: &Path) -> Result<Manifest> {
    let mut manifest: Manifest = toml::from_str(content)?;
    manifest.base_dir = base_dir.to_path_buf();
    Ok(manifest)
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    parse_manifest(&content, base_dir)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    if manifest.models.is_empty() {
        tracing::warn!("Manifest lists no models");
    }
    for (name, entry) in &manifest.models {
        let source = manifest.source_path(entry);
        if SourceFormat::from_path(&source).is_none() {
            bail!("Unsupported source format for '{}': {:?}", name, source);
        }
        if !source.exists() {
            bail!("Model '{}' source not found: {:?}", name, source);
        }
        if entry.options().fps_override == Some(0) {
            bail!("Model '{}' has a zero frame rate", name);
        }
    }
    Ok(())
}

/// Build all models from a manifest, returning the written paths
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<Vec<PathBuf>> {
    let output_dir = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => manifest.base_dir.join(&manifest.output.dir),
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut written = Vec::with_capacity(manifest.models.len());
    for (name, entry) in &manifest.models {
        let source = manifest.source_path(entry);
        let options = entry.options();
        tracing::info!("Exporting model: {} ({:?})", name, source);

        let scene = load_scene(&source, options.fps_override.unwrap_or(DEFAULT_FPS))
            .with_context(|| format!("Failed to load model '{}'", name))?;
        let path = export_to_file(&scene, &options, &output_dir.join(name))
            .with_context(|| format!("Failed to export model '{}'", name))?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_and_detailed_entries() {
        let manifest = parse_manifest(
            r#"
            [output]
            dir = "out"

            [models]
            crate = "crate.obj"
            hero = { path = "hero.glb", axis = "swap-yz", fps = 24, strict_groups = true }
            "#,
            Path::new("assets"),
        )
        .unwrap();

        assert_eq!(manifest.output.dir, PathBuf::from("out"));
        assert_eq!(manifest.models.len(), 2);

        let crate_entry = &manifest.models["crate"];
        assert_eq!(crate_entry.options(), ExportOptions::default());
        assert_eq!(
            manifest.source_path(crate_entry),
            Path::new("assets").join("crate.obj")
        );

        let hero = manifest.models["hero"].options();
        assert_eq!(hero.axis, AxisConversion::SwapYz);
        assert_eq!(hero.fps_override, Some(24));
        assert_eq!(hero.unmatched_groups, UnmatchedGroupPolicy::Error);
    }

    #[test]
    fn test_defaults() {
        let manifest = parse_manifest("", Path::new("")).unwrap();
        assert_eq!(manifest.output.dir, PathBuf::from("models/"));
        assert!(manifest.models.is_empty());
    }

    #[test]
    fn test_unknown_axis_rejected() {
        let result = parse_manifest(
            "[models]\nhero = { path = \"hero.glb\", axis = \"sideways\" }\n",
            Path::new(""),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_missing_source() {
        let source = "[models]\nghost = \"ghost.obj\"\n";
        let manifest = parse_manifest(source, Path::new("/nonexistent")).unwrap();
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn test_validate_unsupported_format() {
        let manifest = parse_manifest("[models]\nhero = \"hero.fbx\"\n", Path::new("")).unwrap();
        assert!(validate(&manifest).is_err());
    }
}
