//! Native JSON scene document.
//!
//! The document mirrors the in-memory scene one-to-one. Nodes are stored as a
//! flat pre-order list, root first, each naming its parent by position, so
//! hierarchy depth never turns into JSON nesting depth. Transforms are stored
//! as 16 column-major numbers (glam's serde layout) and omitted when identity.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use scn_math::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::{scene_name, SceneIoError, SceneIoResult};
use crate::mesh::Mesh;
use crate::scene::{Category, Element, Light, Material, NodeId, Scene, SceneNode, Shape};

/// A whole scene on disk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Material>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lights: Vec<Light>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_scenes: Vec<ReferencedSceneDocument>,

    /// Root first; every other node follows its parent
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReferencedSceneDocument {
    pub name: String,
    pub scene: SceneDocument,
}

/// One node, linked to its parent by position in [`SceneDocument::nodes`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "is_identity")]
    pub transform: Mat4,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ElementDocument>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementDocument {
    Mesh {
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        normals: Option<Vec<Vec3>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        material: Option<usize>,
    },
    Reference {
        scene: usize,
    },
}

fn is_identity(m: &Mat4) -> bool {
    *m == Mat4::IDENTITY
}

impl SceneDocument {
    /// Snapshot a scene, referenced scenes included.
    pub fn from_scene(scene: &Scene) -> Self {
        let ids = scene.node_ids();
        let positions: HashMap<NodeId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        Self {
            name: scene.name.clone(),
            materials: scene.materials.iter().map(|m| (**m).clone()).collect(),
            lights: scene.lights.clone(),
            referenced_scenes: scene
                .referenced_scenes
                .iter()
                .map(|r| ReferencedSceneDocument {
                    name: r.name.clone(),
                    scene: SceneDocument::from_scene(&r.scene),
                })
                .collect(),
            nodes: ids
                .iter()
                .map(|&id| {
                    let parent = scene.parent(id).and_then(|p| positions.get(&p).copied());
                    NodeDocument::from_node(scene, id, parent)
                })
                .collect(),
        }
    }

    /// Build the scene, checking every index the nodes carry.
    pub fn into_scene(self) -> SceneIoResult<Scene> {
        let mut scene = Scene::new(self.name);
        for material in self.materials {
            scene.add_material(material);
        }
        scene.lights = self.lights;
        for referenced in self.referenced_scenes {
            let inner = referenced.scene.into_scene()?;
            scene.add_referenced_scene(referenced.name, inner);
        }

        let mut ids: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        for (position, document) in self.nodes.into_iter().enumerate() {
            let id = match (position, document.parent) {
                (0, None) => {
                    let root = scene.root();
                    scene.set_name(root, document.name);
                    scene.set_transform(root, document.transform);
                    scene.node_mut(root).category = document.category;
                    root
                }
                (_, Some(parent)) if parent < position => {
                    let mut node = SceneNode::new(document.name).with_transform(document.transform);
                    node.category = document.category;
                    scene.add_child(ids[parent], node)
                }
                _ => return Err(SceneIoError::InvalidParent(position)),
            };

            let elements = build_elements(&scene, id, document.elements)?;
            scene.node_mut(id).elements = elements;
            ids.push(id);
        }

        Ok(scene)
    }
}

impl NodeDocument {
    fn from_node(scene: &Scene, id: NodeId, parent: Option<usize>) -> Self {
        let node = scene.node(id);
        Self {
            parent,
            name: node.name().map(str::to_string),
            transform: node.transform,
            category: node.category.clone(),
            elements: node
                .elements
                .iter()
                .map(|element| match element {
                    Element::Shape(shape) => ElementDocument::Mesh {
                        positions: shape.mesh.positions.clone(),
                        indices: shape.mesh.indices.clone(),
                        normals: shape.mesh.normals.clone(),
                        material: shape.material,
                    },
                    Element::Reference(index) => ElementDocument::Reference { scene: *index },
                })
                .collect(),
        }
    }
}

fn build_elements(
    scene: &Scene,
    id: NodeId,
    documents: Vec<ElementDocument>,
) -> SceneIoResult<Vec<Element>> {
    documents
        .into_iter()
        .map(|document| match document {
            ElementDocument::Mesh {
                positions,
                indices,
                normals,
                material,
            } => {
                let mesh = Mesh::new(positions, indices, normals);
                mesh.validate().map_err(|message| SceneIoError::InvalidMesh {
                    node: scene.node(id).name().unwrap_or("<unnamed>").to_string(),
                    message,
                })?;
                if let Some(index) = material.filter(|&i| i >= scene.material_count()) {
                    return Err(SceneIoError::InvalidMaterial(index));
                }

                let mut shape = Shape::new(mesh);
                shape.material = material;
                Ok(Element::Shape(shape))
            }
            ElementDocument::Reference { scene: index } => {
                if index >= scene.referenced_scene_count() {
                    return Err(SceneIoError::InvalidReference(index));
                }
                Ok(Element::Reference(index))
            }
        })
        .collect()
}

/// Read a JSON scene document.
pub fn load_json(path: &Path) -> SceneIoResult<Scene> {
    let content = fs::read_to_string(path)?;
    let mut document: SceneDocument = serde_json::from_str(&content)?;
    if document.name.is_empty() {
        document.name = scene_name(path).to_string();
    }

    let scene = document.into_scene()?;
    log::info!(
        "Loaded {}: {} nodes, {} referenced scenes",
        path.display(),
        scene.node_count(),
        scene.referenced_scene_count()
    );
    Ok(scene)
}

/// Write a JSON scene document.
pub fn save_json(scene: &Scene, path: &Path) -> SceneIoResult<()> {
    let document = SceneDocument::from_scene(scene);
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    log::info!("Wrote {}: {} nodes", path.display(), scene.node_count());
    Ok(())
}
