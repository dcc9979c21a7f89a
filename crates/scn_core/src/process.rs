//! Whole-scene geometry operations applied after selection and transform
//! editing: inline references, flatten hierarchy, bake transforms, and
//! subdivide long triangle edges.

use std::collections::HashMap;
use std::sync::Arc;

use scn_math::Mat4;

use crate::scene::{Element, NodeId, Scene, SceneNode, Shape};

/// Where each inlined scene's materials start in the target table, keyed by
/// the scene's address. Sources stay borrowed for the whole inlining pass.
type MaterialOffsets = HashMap<*const Scene, usize>;

impl Scene {
    /// Replace every reference element with a copy of the referenced scene.
    ///
    /// The copy hangs under the node that carried the reference. Nested
    /// references are inlined too, so afterwards the scene references nothing.
    /// Each referenced scene's materials are appended once, however many
    /// instances share them. Returns the number of references inlined.
    pub fn remove_references(&mut self) -> usize {
        let referenced = std::mem::take(&mut self.referenced_scenes);
        let mut offsets = MaterialOffsets::new();
        let mut inlined = 0;

        for id in self.node_ids() {
            let elements = std::mem::take(&mut self.node_mut(id).elements);
            let mut kept = Vec::with_capacity(elements.len());

            for element in elements {
                match element {
                    Element::Reference(index) => match referenced.get(index) {
                        Some(r) => inlined += self.inline_scene(id, &r.name, &r.scene, &mut offsets),
                        None => log::warn!("Dropping reference to missing scene {}", index),
                    },
                    shape => kept.push(shape),
                }
            }

            self.node_mut(id).elements = kept;
        }

        log::info!("Inlined {} references", inlined);
        inlined
    }

    /// Copy `source` under `parent`. Returns how many scenes were inlined.
    fn inline_scene(
        &mut self,
        parent: NodeId,
        name: &str,
        source: &Scene,
        offsets: &mut MaterialOffsets,
    ) -> usize {
        let material_offset = *offsets.entry(source as *const Scene).or_insert_with(|| {
            let offset = self.materials.len();
            self.materials.extend(source.materials.iter().cloned());
            offset
        });

        let world = self.world_transform(parent);
        self.lights
            .extend(source.lights.iter().map(|light| light.transformed(&world)));

        let root_name = source
            .node(source.root())
            .name()
            .unwrap_or(name)
            .to_string();
        1 + self.copy_subtree(parent, source, source.root(), Some(root_name), material_offset, offsets)
    }

    fn copy_subtree(
        &mut self,
        parent: NodeId,
        source: &Scene,
        id: NodeId,
        name: Option<String>,
        material_offset: usize,
        offsets: &mut MaterialOffsets,
    ) -> usize {
        let node = source.node(id);
        let mut copy = SceneNode::new(name).with_transform(node.transform);
        copy.category = node.category.clone();

        let mut nested = Vec::new();
        for element in &node.elements {
            match element {
                Element::Shape(shape) => copy.elements.push(Element::Shape(Shape {
                    mesh: Arc::clone(&shape.mesh),
                    material: shape.material.map(|m| m + material_offset),
                })),
                Element::Reference(index) => match source.referenced_scenes.get(*index) {
                    Some(r) => nested.push(r),
                    None => log::warn!("Dropping reference to missing scene {}", index),
                },
            }
        }

        let copy_id = self.add_child(parent, copy);
        let mut inlined = 0;

        for r in nested {
            inlined += self.inline_scene(copy_id, &r.name, &r.scene, offsets);
        }
        for &child in node.children() {
            let child_name = source.node(child).name().map(str::to_string);
            inlined += self.copy_subtree(copy_id, source, child, child_name, material_offset, offsets);
        }

        inlined
    }

    /// Re-attach every node that carries elements directly under the root,
    /// keeping its placement, and drop all other non-root nodes.
    pub fn remove_hierarchy(&mut self) {
        let root = self.root();
        let mut relative: HashMap<NodeId, Mat4> = HashMap::new();
        relative.insert(root, Mat4::IDENTITY);

        let mut flattened = Vec::new();
        for id in self.node_ids().into_iter().skip(1) {
            let parent = self.parent(id).unwrap_or(root);
            let placement = relative[&parent] * self.node(id).transform;
            relative.insert(id, placement);

            let node = self.node_mut(id);
            if node.elements.is_empty() {
                continue;
            }
            let mut flat = SceneNode::new(node.name().map(str::to_string)).with_transform(placement);
            flat.elements = std::mem::take(&mut node.elements);
            flat.category = node.category.take();
            flattened.push(flat);
        }

        for child in self.children(root).to_vec() {
            self.remove_node(child);
        }

        log::info!("Flattened hierarchy to {} nodes", flattened.len());
        for flat in flattened {
            self.add_child(root, flat);
        }
    }

    /// Bake every node transform into its geometry and reset all node
    /// transforms to identity.
    ///
    /// References cannot be baked into shared geometry; each node holding
    /// references gets a new child carrying them with the node's world
    /// transform.
    pub fn remove_transformations(&mut self) {
        let worlds: Vec<(NodeId, Mat4)> = self
            .node_ids()
            .into_iter()
            .map(|id| (id, self.world_transform(id)))
            .collect();

        let mut moved_references = 0;
        for (id, world) in worlds {
            let node = self.node_mut(id);
            node.transform = Mat4::IDENTITY;

            let (references, mut shapes): (Vec<_>, Vec<_>) = std::mem::take(&mut node.elements)
                .into_iter()
                .partition(|e| matches!(e, Element::Reference(_)));

            if world != Mat4::IDENTITY {
                for element in &mut shapes {
                    if let Element::Shape(shape) = element {
                        Arc::make_mut(&mut shape.mesh).transform(&world);
                    }
                }
            }
            node.elements = shapes;

            if !references.is_empty() {
                moved_references += references.len();
                let mut holder = SceneNode::new(None).with_transform(world);
                holder.elements = references;
                self.add_child(id, holder);
            }
        }

        if moved_references > 0 {
            log::warn!(
                "Kept transforms on {} references that cannot be baked",
                moved_references
            );
        }
    }

    /// Split triangles until no edge is longer than `max_edge_length`, in
    /// referenced scenes too. Returns the number of triangles added.
    pub fn subdivide_triangles(&mut self, max_edge_length: f32) -> usize {
        if max_edge_length <= 0.0 {
            return 0;
        }

        let mut added = 0;
        for id in self.node_ids() {
            for element in &mut self.node_mut(id).elements {
                if let Element::Shape(shape) = element {
                    added += Arc::make_mut(&mut shape.mesh).subdivide_long_edges(max_edge_length);
                }
            }
        }

        for referenced in &mut self.referenced_scenes {
            added += referenced.scene.subdivide_triangles(max_edge_length);
        }

        log::info!("Subdivided into {} additional triangles", added);
        added
    }
}
