//! Node selection: prune everything outside a region or a named subtree.
//!
//! Pruning is a single post-order sweep. A node is removed when it fails an
//! active filter, unless it still has children once its own subtree has been
//! pruned, or it is the root.

use scn_math::Aabb;
use thiserror::Error;

use crate::scene::{NodeId, Scene};

/// Errors that can occur during selection.
#[derive(Error, Debug)]
pub enum SelectError {
    #[error("Unable to find select subtree node {0}")]
    SubtreeNotFound(String),
}

/// Which nodes survive pruning.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    /// Keep nodes whose world box intersects this box. Empty = no bbox filter.
    pub bbox: Aabb,

    /// Keep the named node, its ancestors and its descendants.
    pub subtree: Option<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            bbox: Aabb::EMPTY,
            subtree: None,
        }
    }
}

impl Selection {
    /// Select by region only.
    pub fn in_bbox(bbox: Aabb) -> Self {
        Self {
            bbox,
            ..Default::default()
        }
    }

    /// Select by subtree only.
    pub fn in_subtree(name: impl Into<String>) -> Self {
        Self {
            subtree: Some(name.into()),
            ..Default::default()
        }
    }

    /// True if at least one filter is set.
    pub fn is_active(&self) -> bool {
        !self.bbox.is_empty() || self.subtree.is_some()
    }
}

/// Resolved filters for one sweep.
struct Filters<'a> {
    bbox: Option<&'a Aabb>,
    subtree: Option<NodeId>,
}

/// Remove every node not retained by `selection`. Returns the removal count.
///
/// An inactive selection returns immediately without visiting the tree.
/// A subtree name that does not resolve fails before anything is removed.
pub fn prune(scene: &mut Scene, selection: &Selection) -> Result<usize, SelectError> {
    if !selection.is_active() {
        return Ok(0);
    }

    let subtree = match &selection.subtree {
        Some(name) => Some(
            scene
                .find_node(name)
                .ok_or_else(|| SelectError::SubtreeNotFound(name.clone()))?,
        ),
        None => None,
    };

    let filters = Filters {
        bbox: (!selection.bbox.is_empty()).then_some(&selection.bbox),
        subtree,
    };

    let before = scene.node_count();
    prune_node(scene, scene.root(), &filters);
    let removed = before - scene.node_count();

    log::info!("Pruned {} of {} nodes", removed, before);
    Ok(removed)
}

fn prune_node(scene: &mut Scene, id: NodeId, filters: &Filters<'_>) {
    // Snapshot: pruning a child edits this node's child list
    let children = scene.children(id).to_vec();
    for child in children {
        prune_node(scene, child, filters);
    }

    if !is_rejected(scene, id, filters) {
        return;
    }

    // Never disconnect a surviving descendant, never drop the root
    if !scene.children(id).is_empty() || id == scene.root() {
        return;
    }

    scene.remove_node(id);
}

fn is_rejected(scene: &Scene, id: NodeId, filters: &Filters<'_>) -> bool {
    if let Some(bbox) = filters.bbox {
        if !scene.world_bbox(id).intersects(bbox) {
            return true;
        }
    }

    if let Some(target) = filters.subtree {
        let related = id == target
            || scene.is_ancestor_of(id, target)
            || scene.is_descendant_of(id, target);
        if !related {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::box_mesh;
    use crate::scene::SceneNode;
    use scn_math::{Mat4, Vec3};

    fn unit_box_at(name: &str, offset: Vec3) -> SceneNode {
        SceneNode::named(name)
            .with_transform(Mat4::from_translation(offset))
            .with_mesh(box_mesh(Vec3::ZERO, Vec3::ONE))
    }

    fn snapshot(scene: &Scene) -> Vec<(Option<String>, Option<NodeId>, Vec<NodeId>)> {
        scene
            .node_ids()
            .into_iter()
            .map(|id| {
                let node = scene.node(id);
                (
                    node.name().map(str::to_string),
                    node.parent(),
                    node.children().to_vec(),
                )
            })
            .collect()
    }

    /// root
    /// ├── a
    /// │   ├── a1
    /// │   └── a2
    /// │       └── a2x
    /// └── b
    ///     └── b1
    fn family() -> Scene {
        let mut scene = Scene::new("family");
        let root = scene.root();
        let a = scene.add_child(root, unit_box_at("a", Vec3::ZERO));
        scene.add_child(a, unit_box_at("a1", Vec3::ZERO));
        let a2 = scene.add_child(a, unit_box_at("a2", Vec3::ZERO));
        scene.add_child(a2, unit_box_at("a2x", Vec3::ZERO));
        let b = scene.add_child(root, unit_box_at("b", Vec3::ZERO));
        scene.add_child(b, unit_box_at("b1", Vec3::ZERO));
        scene
    }

    #[test]
    fn test_inactive_selection_is_noop() {
        let mut scene = family();
        let before = snapshot(&scene);

        let removed = prune(&mut scene, &Selection::default()).unwrap();

        assert_eq!(removed, 0);
        assert_eq!(snapshot(&scene), before);
    }

    #[test]
    fn test_reversed_bbox_counts_as_inactive() {
        let selection = Selection::in_bbox(Aabb::from_min_max(Vec3::ONE, Vec3::ZERO));
        assert!(!selection.is_active());
    }

    #[test]
    fn test_bbox_end_to_end() {
        // A sits fully outside the filter; B straddles it and holds C inside
        let mut scene = Scene::new("room");
        let root = scene.root();
        let a = scene.add_child(root, unit_box_at("A", Vec3::new(10.0, 10.0, 10.0)));
        let b = scene.add_child(
            root,
            SceneNode::named("B").with_mesh(box_mesh(Vec3::splat(-2.0), Vec3::splat(0.5))),
        );
        let c = scene.add_child(b, unit_box_at("C", Vec3::ZERO));

        let filter = Aabb::from_min_max(Vec3::ZERO, Vec3::splat(2.0));
        let removed = prune(&mut scene, &Selection::in_bbox(filter)).unwrap();

        assert_eq!(removed, 1);
        assert!(!scene.contains(a));
        assert!(scene.contains(b));
        assert!(scene.contains(c));
        assert_eq!(scene.children(root), &[b]);
    }

    #[test]
    fn test_group_node_kept_by_surviving_child() {
        // The group carries no geometry of its own
        let mut scene = Scene::new("test");
        let root = scene.root();
        let parent = scene.add_child(root, SceneNode::named("parent"));
        let child = scene.add_child(parent, unit_box_at("child", Vec3::splat(0.25)));
        let stray = scene.add_child(parent, unit_box_at("stray", Vec3::splat(50.0)));

        let filter = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        prune(&mut scene, &Selection::in_bbox(filter)).unwrap();

        assert!(scene.contains(parent));
        assert!(scene.contains(child));
        assert!(!scene.contains(stray));
    }

    #[test]
    fn test_empty_nodes_fail_bbox_filter() {
        let mut scene = Scene::new("test");
        let root = scene.root();
        let group = scene.add_child(root, SceneNode::named("empty_group"));

        let filter = Aabb::from_min_max(Vec3::splat(-100.0), Vec3::splat(100.0));
        prune(&mut scene, &Selection::in_bbox(filter)).unwrap();

        assert!(!scene.contains(group));
    }

    #[test]
    fn test_root_survives_everything() {
        let mut scene = family();
        let root = scene.root();

        let filter = Aabb::from_min_max(Vec3::splat(100.0), Vec3::splat(101.0));
        prune(&mut scene, &Selection::in_bbox(filter)).unwrap();

        assert!(scene.contains(root));
        assert_eq!(scene.node_count(), 1);
        assert!(scene.children(root).is_empty());
    }

    #[test]
    fn test_subtree_keeps_path_and_descendants() {
        let mut scene = family();
        let a = scene.find_node("a").unwrap();
        let a1 = scene.find_node("a1").unwrap();
        let a2 = scene.find_node("a2").unwrap();
        let a2x = scene.find_node("a2x").unwrap();
        let b = scene.find_node("b").unwrap();
        let b1 = scene.find_node("b1").unwrap();

        let removed = prune(&mut scene, &Selection::in_subtree("a2")).unwrap();

        assert_eq!(removed, 3);
        assert!(scene.contains(scene.root()));
        assert!(scene.contains(a), "ancestor");
        assert!(scene.contains(a2), "target");
        assert!(scene.contains(a2x), "descendant");
        assert!(!scene.contains(a1), "sibling of target");
        assert!(!scene.contains(b));
        assert!(!scene.contains(b1));
    }

    #[test]
    fn test_subtree_not_found_changes_nothing() {
        let mut scene = family();
        let before = snapshot(&scene);

        let err = prune(&mut scene, &Selection::in_subtree("nobody")).unwrap_err();

        assert!(matches!(err, SelectError::SubtreeNotFound(ref name) if name == "nobody"));
        assert_eq!(err.to_string(), "Unable to find select subtree node nobody");
        assert_eq!(snapshot(&scene), before);
    }

    #[test]
    fn test_both_filters_combine() {
        // a2x is inside the subtree but outside the region
        let mut scene = Scene::new("test");
        let root = scene.root();
        let a = scene.add_child(root, unit_box_at("a", Vec3::ZERO));
        let a1 = scene.add_child(a, unit_box_at("a1", Vec3::ZERO));
        let a2 = scene.add_child(a, unit_box_at("a2", Vec3::new(20.0, 0.0, 0.0)));
        let b = scene.add_child(root, unit_box_at("b", Vec3::ZERO));

        let selection = Selection {
            bbox: Aabb::from_min_max(Vec3::splat(-1.0), Vec3::splat(2.0)),
            subtree: Some("a".to_string()),
        };
        prune(&mut scene, &selection).unwrap();

        assert!(scene.contains(a));
        assert!(scene.contains(a1));
        assert!(!scene.contains(a2));
        assert!(!scene.contains(b));
    }

    #[test]
    fn test_subtree_covering_everything_removes_nothing() {
        let mut scene = family();
        scene.remove_node(scene.find_node("b").unwrap());
        let before = snapshot(&scene);

        let removed = prune(&mut scene, &Selection::in_subtree("a")).unwrap();

        assert_eq!(removed, 0);
        assert_eq!(snapshot(&scene), before);
    }
}
