use crate::{Interval, Vec3};

/// Axis-aligned bounding box used for world-space scene bounds and region selection.
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
/// A box is empty when any of its intervals is empty.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// Create an empty AABB (contains nothing).
    pub fn empty() -> Self {
        Self::EMPTY
    }

    /// Create an AABB from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            x: Interval::new(a.x.min(b.x), a.x.max(b.x)),
            y: Interval::new(a.y.min(b.y), a.y.max(b.y)),
            z: Interval::new(a.z.min(b.z), a.z.max(b.z)),
        }
    }

    /// Create an AABB from an explicit min and max corner.
    ///
    /// Unlike [`Aabb::from_points`] the corners are not reordered, so a
    /// `min` that exceeds `max` on any axis yields an empty box.
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            x: Interval::new(min.x, max.x),
            y: Interval::new(min.y, max.y),
            z: Interval::new(min.z, max.z),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Returns true if the box contains nothing.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// Returns true if the boxes overlap on every axis (touching counts).
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x.overlaps(&other.x) && self.y.overlaps(&other.y) && self.z.overlaps(&other.z)
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// The 8 corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min(), self.max());
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        let a = Vec3::new(10.0, 0.0, 10.0);
        let b = Vec3::new(0.0, 10.0, 0.0);
        let aabb = Aabb::from_points(a, b);

        assert_eq!(aabb.x.min, 0.0);
        assert_eq!(aabb.x.max, 10.0);
        assert_eq!(aabb.y.min, 0.0);
        assert_eq!(aabb.y.max, 10.0);
        assert_eq!(aabb.z.min, 0.0);
        assert_eq!(aabb.z.max, 10.0);
    }

    #[test]
    fn test_aabb_from_min_max_keeps_order() {
        let aabb = Aabb::from_min_max(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 1.0));
        assert!(aabb.is_empty());

        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        assert!(!aabb.is_empty());
    }

    #[test]
    fn test_aabb_surrounding() {
        let box1 = Aabb::from_points(Vec3::ZERO, Vec3::new(5.0, 5.0, 5.0));
        let box2 = Aabb::from_points(Vec3::new(3.0, 3.0, 3.0), Vec3::new(10.0, 10.0, 10.0));
        let surrounding = Aabb::surrounding(&box1, &box2);

        assert_eq!(surrounding.x.min, 0.0);
        assert_eq!(surrounding.x.max, 10.0);

        let with_empty = Aabb::surrounding(&box1, &Aabb::EMPTY);
        assert_eq!(with_empty, box1);
    }

    #[test]
    fn test_aabb_intersects() {
        let unit = Aabb::from_points(Vec3::ZERO, Vec3::ONE);

        assert!(unit.intersects(&Aabb::from_points(Vec3::splat(0.5), Vec3::splat(2.0))));
        assert!(unit.intersects(&Aabb::from_points(Vec3::ONE, Vec3::splat(2.0))), "shared corner");
        assert!(!unit.intersects(&Aabb::from_points(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 1.0, 1.0))));

        // Overlap on two axes is not enough
        let beside = Aabb::from_points(Vec3::new(0.0, 0.0, 5.0), Vec3::new(1.0, 1.0, 6.0));
        assert!(!unit.intersects(&beside));

        assert!(!unit.intersects(&Aabb::EMPTY));
        assert!(!Aabb::EMPTY.intersects(&unit));
    }

    #[test]
    fn test_aabb_flat_box_intersects() {
        // Planar geometry has zero extent on one axis
        let plane = Aabb::from_points(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0));
        let filter = Aabb::from_points(Vec3::splat(-0.5), Vec3::splat(0.5));
        assert!(plane.intersects(&filter));
    }

    #[test]
    fn test_aabb_centroid() {
        let aabb = Aabb::from_points(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(aabb.centroid(), Vec3::new(5.0, 5.0, 5.0));
    }
}
