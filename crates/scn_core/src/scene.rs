//! Scene graph types for scn2scn.
//!
//! A [`Scene`] owns an arena of [`SceneNode`]s forming a single rooted tree.
//! Nodes are addressed by [`NodeId`]; ids of removed nodes are never reused,
//! so a stale id simply stops resolving.

use std::collections::HashMap;
use std::sync::Arc;

use scn_math::{Aabb, Mat4, Mat4Ext, Vec3};
use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;

/// A material definition, passed through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Material name
    pub name: String,

    /// Diffuse/albedo color (RGB, 0-1)
    pub diffuse_color: Vec3,

    /// Specular color (RGB, 0-1)
    pub specular_color: Vec3,

    /// Emissive color (RGB, for light-emitting surfaces)
    pub emissive_color: Vec3,

    /// Opacity (0=transparent, 1=opaque)
    pub opacity: f32,

    /// Path to diffuse/albedo texture
    pub diffuse_texture: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse_color: Vec3::new(0.5, 0.5, 0.5), // Grey default
            specular_color: Vec3::ZERO,
            emissive_color: Vec3::ZERO,
            opacity: 1.0,
            diffuse_texture: None,
        }
    }
}

impl Material {
    /// Create a new material with just a name and diffuse color.
    pub fn new(name: impl Into<String>, diffuse_color: Vec3) -> Self {
        Self {
            name: name.into(),
            diffuse_color,
            ..Default::default()
        }
    }
}

/// Kind of light source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    Point,
    Spot,
    Directional,
    Area,
}

/// A light source in world space, passed through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    #[serde(default)]
    pub name: String,

    pub kind: LightKind,

    #[serde(default = "Light::default_color")]
    pub color: Vec3,

    #[serde(default = "Light::default_intensity")]
    pub intensity: f32,

    #[serde(default)]
    pub position: Vec3,

    #[serde(default = "Light::default_direction")]
    pub direction: Vec3,

    /// Cone half-angle in radians (spot lights)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff_angle: Option<f32>,
}

impl Light {
    fn default_color() -> Vec3 {
        Vec3::ONE
    }

    fn default_intensity() -> f32 {
        1.0
    }

    fn default_direction() -> Vec3 {
        Vec3::NEG_Y
    }

    /// Create a white point light at `position`.
    pub fn point(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            kind: LightKind::Point,
            color: Self::default_color(),
            intensity: Self::default_intensity(),
            position,
            direction: Self::default_direction(),
            cutoff_angle: None,
        }
    }

    /// The same light placed by `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            position: matrix.transform_point3(self.position),
            direction: matrix.transform_vector3(self.direction).normalize_or_zero(),
            ..self.clone()
        }
    }
}

/// Object category attached to a node from a category table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub model_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fine_grained_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coarse_grained_class: Option<String>,
}

/// Triangle geometry with an optional material.
#[derive(Clone, Debug)]
pub struct Shape {
    /// Shared so inlined references can alias one mesh until it is edited
    pub mesh: Arc<Mesh>,

    /// Index into [`Scene::materials`]
    pub material: Option<usize>,
}

impl Shape {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh: Arc::new(mesh),
            material: None,
        }
    }

    /// Set the material for this shape.
    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }
}

/// Something attached to a node.
#[derive(Clone, Debug)]
pub enum Element {
    /// Geometry owned by this scene
    Shape(Shape),

    /// Instance of [`Scene::referenced_scenes`]`[index]`
    Reference(usize),
}

/// A scene loaded from elsewhere and instanced through [`Element::Reference`].
#[derive(Clone, Debug)]
pub struct ReferencedScene {
    pub name: String,
    pub scene: Scene,
}

/// Stable handle to a node in a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena slot of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node in the scene tree.
#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    name: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,

    /// Placement relative to the parent
    pub transform: Mat4,

    /// Attached geometry and references
    pub elements: Vec<Element>,

    /// Category from a category table, if any
    pub category: Option<Category>,
}

impl SceneNode {
    /// Create a detached node with an identity transform.
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Shorthand for a named node.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()))
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Convenience for attaching a mesh without material.
    pub fn with_mesh(self, mesh: Mesh) -> Self {
        self.with_element(Element::Shape(Shape::new(mesh)))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// True if any element is a reference to another scene.
    pub fn has_references(&self) -> bool {
        self.elements
            .iter()
            .any(|e| matches!(e, Element::Reference(_)))
    }
}

/// A complete scene: node tree plus the tables its elements point into.
#[derive(Clone, Debug)]
pub struct Scene {
    /// Scene name (usually from filename)
    pub name: String,

    /// Materials used by shapes
    pub materials: Vec<Arc<Material>>,

    /// Lights in world space
    pub lights: Vec<Light>,

    /// Scenes instanced by reference elements
    pub referenced_scenes: Vec<ReferencedScene>,

    nodes: Vec<Option<SceneNode>>,
    root: NodeId,
    /// Live nodes per name, in insertion order
    names: HashMap<String, Vec<NodeId>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("")
    }
}

impl Scene {
    /// Create a scene holding only an unnamed root node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            materials: Vec::new(),
            lights: Vec::new(),
            referenced_scenes: Vec::new(),
            nodes: vec![Some(SceneNode::default())],
            root: NodeId(0),
            names: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a live node.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0).and_then(|n| n.as_ref())
    }

    /// True if `id` refers to a node that has not been removed.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Borrow a node. Panics on a removed id.
    pub fn node(&self, id: NodeId) -> &SceneNode {
        self.nodes[id.0].as_ref().expect("dangling NodeId")
    }

    /// Mutably borrow a node. Panics on a removed id.
    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        self.nodes[id.0].as_mut().expect("dangling NodeId")
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Find a node by name. The first node inserted under a name wins.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).and_then(|ids| ids.first()).copied()
    }

    /// Attach `node` as the last child of `parent` and return its id.
    ///
    /// Any parent/children links already present on `node` are discarded.
    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();

        if let Some(name) = &node.name {
            self.names.entry(name.clone()).or_default().push(id);
        }

        self.nodes.push(Some(node));
        self.node_mut(parent).children.push(id);
        id
    }

    /// Detach `id` from its parent and destroy it with its whole subtree.
    ///
    /// Returns `false` (and does nothing) for the root or a removed id.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.contains(id) {
            return false;
        }

        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
        self.destroy_subtree(id);
        true
    }

    fn destroy_subtree(&mut self, id: NodeId) {
        let Some(node) = self.nodes[id.0].take() else {
            return;
        };

        if let Some(name) = &node.name {
            if let Some(ids) = self.names.get_mut(name) {
                ids.retain(|&other| other != id);
                if ids.is_empty() {
                    self.names.remove(name);
                }
            }
        }

        for child in node.children {
            self.destroy_subtree(child);
        }
    }

    /// True if `ancestor` lies strictly above `id` on the path to the root.
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.node(id).parent;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.node(p).parent;
        }
        false
    }

    /// True if `descendant` lies strictly below `id`.
    pub fn is_descendant_of(&self, descendant: NodeId, id: NodeId) -> bool {
        self.is_ancestor_of(id, descendant)
    }

    /// Rename a node, keeping the name index current.
    pub fn set_name(&mut self, id: NodeId, name: Option<String>) {
        if let Some(old) = self.node_mut(id).name.take() {
            if let Some(ids) = self.names.get_mut(&old) {
                ids.retain(|&other| other != id);
                if ids.is_empty() {
                    self.names.remove(&old);
                }
            }
        }

        if let Some(name) = &name {
            self.names.entry(name.clone()).or_default().push(id);
        }
        self.node_mut(id).name = name;
    }

    /// Replace a node's local transform.
    pub fn set_transform(&mut self, id: NodeId, transform: Mat4) {
        self.node_mut(id).transform = transform;
    }

    /// Composition of local transforms from the root down to `id`.
    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let node = self.node(id);
        match node.parent {
            Some(parent) => self.world_transform(parent) * node.transform,
            None => node.transform,
        }
    }

    /// World-space box around the geometry of `id` and its current subtree.
    pub fn world_bbox(&self, id: NodeId) -> Aabb {
        self.subtree_bbox(id, &self.world_transform(id))
    }

    fn subtree_bbox(&self, id: NodeId, world: &Mat4) -> Aabb {
        let node = self.node(id);
        let mut bbox = Aabb::EMPTY;

        for element in &node.elements {
            let local = match element {
                Element::Shape(shape) => shape.mesh.bounds,
                Element::Reference(index) => match self.referenced_scenes.get(*index) {
                    Some(referenced) => referenced.scene.bounds(),
                    None => continue,
                },
            };
            bbox = Aabb::surrounding(&bbox, &world.transform_aabb(&local));
        }

        for &child in &node.children {
            let child_world = *world * self.node(child).transform;
            bbox = Aabb::surrounding(&bbox, &self.subtree_bbox(child, &child_world));
        }

        bbox
    }

    /// World-space bounds of the whole scene.
    pub fn bounds(&self) -> Aabb {
        self.world_bbox(self.root)
    }

    /// Ids of all live nodes in pre-order, root first.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.node_count());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            ids.push(id);
            stack.extend(self.node(id).children.iter().rev());
        }
        ids
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Add a material and return its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(Arc::new(material));
        self.materials.len() - 1
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Register a scene that reference elements can point at.
    pub fn add_referenced_scene(&mut self, name: impl Into<String>, scene: Scene) -> usize {
        self.referenced_scenes.push(ReferencedScene {
            name: name.into(),
            scene,
        });
        self.referenced_scenes.len() - 1
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub fn referenced_scene_count(&self) -> usize {
        self.referenced_scenes.len()
    }

    /// Triangles directly owned by this scene (references not expanded).
    pub fn triangle_count(&self) -> usize {
        self.nodes
            .iter()
            .flatten()
            .flat_map(|n| &n.elements)
            .map(|e| match e {
                Element::Shape(shape) => shape.mesh.triangle_count(),
                Element::Reference(_) => 0,
            })
            .sum()
    }
}
