use std::path::{Path, PathBuf};

use anyhow::Context;
use spirogen_chip::{ChipBuilder, ChipLayout, ReticleLayout};
use spirogen_config::{ChipConfig, ReticleMember};
use spirogen_core::{Layer, PathPoint};
use spirogen_export::{write_snapshot, write_svg, LayoutSnapshot};
use spirogen_geometry::{primitives, Polyline};
use tracing::{error, info, warn};

use crate::error::CliError;

pub struct ChipArgs {
    pub config: PathBuf,
    pub output: PathBuf,
    pub center_width: Option<f64>,
    pub artwork: Option<PathBuf>,
    pub artwork_layer: u16,
}

pub struct ReticleArgs {
    pub config: PathBuf,
    pub output: PathBuf,
}

pub fn run_chip(args: ChipArgs) -> Result<(), CliError> {
    if let Some(width) = args.center_width {
        if width <= 0.0 {
            return Err(CliError::usage(format!(
                "--center-width must be positive (got {width})"
            )));
        }
    }

    let config =
        spirogen_config::load_chip(&args.config).map_err(|e| CliError::input(e.to_string()))?;
    let mut layout = build_one(&config, args.center_width)?;

    if let Some(path) = &args.artwork {
        match load_artwork(path) {
            Ok(outlines) => layout.insert_artwork(outlines, Layer(args.artwork_layer)),
            // Optional graphics never fail the build.
            Err(err) => warn!(path = %path.display(), "skipping artwork: {err:#}"),
        }
    }

    write_outputs(&args.output, &layout)
}

pub fn run_reticle(args: ReticleArgs) -> Result<(), CliError> {
    let config = spirogen_config::load_reticle(&args.config)
        .map_err(|e| CliError::input(e.to_string()))?;
    let base_dir = args.config.parent().unwrap_or(Path::new("."));

    // Each member chip builds independently: one failing chip is logged
    // and skipped, the others still compose.
    let mut reticle = ReticleLayout::new();
    let mut failures = 0usize;
    for member in &config.members {
        match build_member(base_dir, member) {
            Ok(chip) => {
                let pivot = member.pivot_um.unwrap_or([0.0, 0.0]);
                reticle.add(
                    chip,
                    member.rotation_deg.to_radians(),
                    (member.translation_um[0], member.translation_um[1]),
                    PathPoint::new(pivot[0], pivot[1]),
                );
            }
            Err(err) => {
                error!(config = %member.config.display(), "chip build failed: {err}");
                failures += 1;
            }
        }
    }

    if reticle.is_empty() {
        return Err(CliError::processing(format!(
            "all {failures} member chips of reticle \"{}\" failed to build",
            config.name
        )));
    }

    let mut flat = ChipLayout::new(&config.name);
    reticle.flatten(&mut flat);
    write_outputs(&args.output, &flat)?;

    if failures > 0 {
        return Err(CliError::processing(format!(
            "{failures} member chip(s) failed to build; reticle output is partial"
        )));
    }
    Ok(())
}

fn build_member(base_dir: &Path, member: &ReticleMember) -> Result<ChipLayout, CliError> {
    let path = if member.config.is_absolute() {
        member.config.clone()
    } else {
        base_dir.join(&member.config)
    };
    let config = spirogen_config::load_chip(&path).map_err(|e| CliError::input(e.to_string()))?;
    build_one(&config, member.center_width_um)
}

fn build_one(config: &ChipConfig, center_width: Option<f64>) -> Result<ChipLayout, CliError> {
    let mut builder = ChipBuilder::new(config);
    if let Some(width) = center_width {
        builder = builder.with_center_width(width);
    }
    let (layout, report) = builder
        .build()
        .map_err(|e| CliError::processing(e.to_string()))?;
    info!(
        chip = %config.name,
        length_um = report.conductor_length_um,
        low_sections = report.low_impedance_sections,
        "build complete"
    );
    Ok(layout)
}

/// Artwork files carry pre-shaped closed outlines as a JSON list of
/// polygons, each polygon a list of `[x, y]` vertices.
fn load_artwork(path: &Path) -> anyhow::Result<Vec<Polyline<f64>>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let polygons: Vec<Vec<[f64; 2]>> =
        serde_json::from_str(&raw).context("failed to parse artwork JSON")?;

    let mut outlines = Vec::with_capacity(polygons.len());
    for (i, poly) in polygons.iter().enumerate() {
        anyhow::ensure!(
            poly.len() >= 3,
            "artwork polygon {i} has {} vertices; need at least 3",
            poly.len()
        );
        let vertices: Vec<(f64, f64)> = poly.iter().map(|p| (p[0], p[1])).collect();
        outlines.push(primitives::polygon(&vertices));
    }
    Ok(outlines)
}

fn write_outputs(output: &Path, layout: &ChipLayout) -> Result<(), CliError> {
    std::fs::create_dir_all(output).map_err(|e| CliError::processing(e.to_string()))?;

    let snapshot = LayoutSnapshot::from_layout(layout);
    let json_path = output.join(format!("{}.json", layout.name));
    let svg_path = output.join(format!("{}.svg", layout.name));
    write_snapshot(&json_path, &snapshot).map_err(|e| CliError::processing(e.to_string()))?;
    write_svg(&svg_path, &snapshot).map_err(|e| CliError::processing(e.to_string()))?;
    info!(
        snapshot = %json_path.display(),
        preview = %svg_path.display(),
        "wrote layout outputs"
    );
    Ok(())
}
