//! SCN Core - Scene graph, editing and file formats for scn2scn.
//!
//! This crate provides:
//!
//! - **Scene graph types**: `Scene`, `SceneNode`, `Element`, `Mesh`
//! - **Selection**: prune nodes outside a box or a named subtree
//! - **Transform editing**: compose command-line transform operations onto the root
//! - **Geometry operations**: inline references, flatten, bake transforms, subdivide
//! - **Scene I/O**: native JSON documents and Wavefront OBJ
//! - **Metadata**: category and light tables keyed by model id
//!
//! # Example
//!
//! ```ignore
//! use scn_core::convert::{convert, ConvertOptions};
//!
//! let mut options = ConvertOptions::new("house.json", "house.obj");
//! options.remove_references = true;
//! let report = convert(&options)?;
//! println!("Pruned {} nodes", report.pruned);
//! ```

pub mod convert;
pub mod io;
pub mod mesh;
pub mod metadata;
pub mod process;
pub mod scene;
pub mod select;
pub mod xform;

// Re-export commonly used types
pub use convert::{convert, ConvertError, ConvertOptions, ConvertReport};
pub use io::{load_scene, save_scene, SceneIoError};
pub use mesh::Mesh;
pub use scene::{
    Category, Element, Light, LightKind, Material, NodeId, ReferencedScene, Scene, SceneNode,
    Shape,
};
pub use select::{prune, SelectError, Selection};
pub use xform::{Axis, TransformComposer, TransformOp};
