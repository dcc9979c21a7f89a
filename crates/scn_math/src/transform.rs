// Transform utilities for Mat4
//
// Extends glam::Mat4 with the helpers the scene graph needs for world bounds
// and geometry baking. glam already provides transform_point3() and
// transform_vector3().

use glam::{Mat4, Vec3};
use crate::Aabb;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    /// Empty boxes stay empty.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Transform a surface normal (inverse-transpose of the linear part),
    /// returning a unit vector.
    fn transform_normal3(&self, normal: Vec3) -> Vec3;

    /// True if the matrix mirrors space, turning triangle winding inside out.
    fn flips_winding(&self) -> bool;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }

        let corners = aabb.corners();
        let mut result_min = self.transform_point3(corners[0]);
        let mut result_max = result_min;

        for &corner in &corners[1..] {
            let p = self.transform_point3(corner);
            result_min = result_min.min(p);
            result_max = result_max.max(p);
        }

        Aabb::from_min_max(result_min, result_max)
    }

    fn transform_normal3(&self, normal: Vec3) -> Vec3 {
        let normal_matrix = self.inverse().transpose();
        normal_matrix.transform_vector3(normal).normalize_or_zero()
    }

    fn flips_winding(&self) -> bool {
        self.determinant() < 0.0
    }
}
