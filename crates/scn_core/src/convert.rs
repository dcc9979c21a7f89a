//! The conversion pipeline: read, edit, write.
//!
//! Steps run in a fixed order regardless of how options were given:
//! load, categories, lights, prune, transform, remove references, remove
//! hierarchy, remove transformations, subdivide, save.

use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::io::{load_scene, save_scene, SceneIoError};
use crate::metadata::{read_categories, read_lights, MetadataError};
use crate::scene::Scene;
use crate::select::{prune, SelectError, Selection};
use crate::xform::{TransformComposer, TransformOp};

/// Errors that abort a conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Unable to read scene from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: SceneIoError,
    },

    #[error("Unable to read categories from {path}: {source}")]
    Categories {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },

    #[error("Unable to read lights from {path}: {source}")]
    Lights {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error("Unable to write scene to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: SceneIoError,
    },
}

/// Everything one conversion needs, built once from the command line.
#[derive(Clone, Debug, Default)]
pub struct ConvertOptions {
    pub input: PathBuf,
    pub output: PathBuf,

    /// Category table (CSV)
    pub categories: Option<PathBuf>,

    /// Lights table (JSON)
    pub lights: Option<PathBuf>,

    pub selection: Selection,

    /// Transform edits, in command-line order
    pub transform_ops: Vec<TransformOp>,

    pub remove_references: bool,
    pub remove_hierarchy: bool,
    pub remove_transformations: bool,

    /// Subdivide triangles with longer edges. Non-positive disables.
    pub max_edge_length: Option<f32>,
}

impl ConvertOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Default::default()
        }
    }
}

/// What a conversion did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvertReport {
    pub categorized_nodes: usize,
    pub lights_added: usize,
    pub pruned: usize,
    pub transform_applied: bool,
    pub references_inlined: usize,
    pub triangles_added: usize,
    pub node_count: usize,
}

/// Run the whole pipeline.
pub fn convert(options: &ConvertOptions) -> Result<ConvertReport, ConvertError> {
    let mut scene = read_scene(&options.input)?;
    let mut report = edit_scene(&mut scene, options)?;
    write_scene(&scene, &options.output)?;

    report.node_count = scene.node_count();
    Ok(report)
}

/// Every step between load and save, on a scene already in memory.
pub fn edit_scene(scene: &mut Scene, options: &ConvertOptions) -> Result<ConvertReport, ConvertError> {
    let mut report = ConvertReport::default();

    if let Some(path) = &options.categories {
        let start = Instant::now();
        report.categorized_nodes =
            read_categories(scene, path).map_err(|source| ConvertError::Categories {
                path: path.clone(),
                source,
            })?;
        log::info!("Read categories from {} ...", path.display());
        log::info!("  Time = {:.2} seconds", start.elapsed().as_secs_f64());
    }

    if let Some(path) = &options.lights {
        let start = Instant::now();
        report.lights_added = read_lights(scene, path).map_err(|source| ConvertError::Lights {
            path: path.clone(),
            source,
        })?;
        log::info!("Read lights from {} ...", path.display());
        log::info!("  Time = {:.2} seconds", start.elapsed().as_secs_f64());
        log::info!("  # Lights = {}", scene.light_count());
    }

    report.pruned = prune(scene, &options.selection)?;

    let composer = TransformComposer::from_ops(&options.transform_ops);
    report.transform_applied = composer.apply(scene);

    if options.remove_references {
        report.references_inlined = scene.remove_references();
    }
    if options.remove_hierarchy {
        scene.remove_hierarchy();
    }
    if options.remove_transformations {
        scene.remove_transformations();
    }
    if let Some(max_edge_length) = options.max_edge_length.filter(|&l| l > 0.0) {
        report.triangles_added = scene.subdivide_triangles(max_edge_length);
    }

    report.node_count = scene.node_count();
    Ok(report)
}

fn read_scene(path: &Path) -> Result<Scene, ConvertError> {
    let start = Instant::now();
    let scene = load_scene(path).map_err(|source| ConvertError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!("Read scene from {} ...", path.display());
    log_statistics(&scene, start);
    Ok(scene)
}

fn write_scene(scene: &Scene, path: &Path) -> Result<(), ConvertError> {
    let start = Instant::now();
    save_scene(scene, path).map_err(|source| ConvertError::Save {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!("Wrote scene to {} ...", path.display());
    log_statistics(scene, start);
    Ok(())
}

fn log_statistics(scene: &Scene, start: Instant) {
    log::info!("  Time = {:.2} seconds", start.elapsed().as_secs_f64());
    log::info!("  # Nodes = {}", scene.node_count());
    log::info!("  # Lights = {}", scene.light_count());
    log::info!("  # Materials = {}", scene.material_count());
    log::info!("  # Referenced scenes = {}", scene.referenced_scene_count());
}
