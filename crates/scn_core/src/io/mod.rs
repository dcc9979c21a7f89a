//! Scene file reading and writing.
//!
//! Two formats are supported, chosen by file extension:
//!
//! - `.json` - native scene document, lossless (hierarchy, transforms,
//!   references, categories, materials, lights)
//! - `.obj` - Wavefront OBJ; read through `tobj`, written as flattened
//!   world-space geometry with a sibling `.mtl` library
//!
//! # Example
//!
//! ```ignore
//! use scn_core::io::{load_scene, save_scene};
//!
//! let scene = load_scene("house.json")?;
//! save_scene(&scene, "house.obj")?;
//! ```

mod json;
mod obj;

use std::path::Path;

use thiserror::Error;

use crate::scene::Scene;

pub use json::{ElementDocument, NodeDocument, ReferencedSceneDocument, SceneDocument};
pub use obj::{load_obj, save_obj};

/// Errors that can occur reading or writing scene files.
#[derive(Error, Debug)]
pub enum SceneIoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("Unsupported scene format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid mesh in {node}: {message}")]
    InvalidMesh { node: String, message: String },

    #[error("Invalid material index: {0}")]
    InvalidMaterial(usize),

    #[error("Invalid referenced scene index: {0}")]
    InvalidReference(usize),

    #[error("Invalid parent for node {0}")]
    InvalidParent(usize),
}

/// Result type for scene I/O.
pub type SceneIoResult<T> = Result<T, SceneIoError>;

/// Scene file formats, by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneFormat {
    Json,
    Obj,
}

impl SceneFormat {
    /// Pick the format from the extension of `path`, ignoring case.
    pub fn from_path(path: &Path) -> SceneIoResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(SceneFormat::Json),
            "obj" => Ok(SceneFormat::Obj),
            _ => Err(SceneIoError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read a scene file.
pub fn load_scene<P: AsRef<Path>>(path: P) -> SceneIoResult<Scene> {
    let path = path.as_ref();
    match SceneFormat::from_path(path)? {
        SceneFormat::Json => json::load_json(path),
        SceneFormat::Obj => obj::load_obj(path),
    }
}

/// Write a scene file.
pub fn save_scene<P: AsRef<Path>>(scene: &Scene, path: P) -> SceneIoResult<()> {
    let path = path.as_ref();
    match SceneFormat::from_path(path)? {
        SceneFormat::Json => json::save_json(scene, path),
        SceneFormat::Obj => obj::save_obj(scene, path),
    }
}

/// Name a scene after the stem of the file it came from.
fn scene_name(path: &Path) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
}
