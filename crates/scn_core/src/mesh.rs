//! Triangle mesh geometry attached to scene nodes.
//!
//! Meshes are opaque to selection and transform editing: the scene graph only
//! reads their bounds. The whole-scene geometry operations (baking node
//! transforms, subdividing long edges) mutate them in place.

use std::collections::HashMap;

use scn_math::{Aabb, Mat4, Mat4Ext, Vec3};

/// A mesh consisting of vertex positions, optional normals, and triangle indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional, one per vertex when present)
    pub normals: Option<Vec<Vec3>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box in mesh-local space
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        let bounds = Self::compute_bounds(&positions);
        Self {
            positions,
            normals,
            indices,
            bounds,
        }
    }

    /// Compute axis-aligned bounding box from positions.
    fn compute_bounds(positions: &[Vec3]) -> Aabb {
        if positions.is_empty() {
            return Aabb::empty();
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for pos in positions {
            min = min.min(*pos);
            max = max.max(*pos);
        }

        Aabb::from_min_max(min, max)
    }

    /// Recompute `bounds` after positions were edited.
    pub fn update_bounds(&mut self) {
        self.bounds = Self::compute_bounds(&self.positions);
    }

    /// Check the index buffer against the vertex count.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            ));
        }
        let vertex_count = self.positions.len();
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(format!(
                "index {} out of range for {} vertices",
                bad, vertex_count
            ));
        }
        if let Some(normals) = &self.normals {
            if normals.len() != vertex_count {
                return Err(format!(
                    "{} normals for {} vertices",
                    normals.len(),
                    vertex_count
                ));
            }
        }
        Ok(())
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Apply `matrix` to every vertex (and normal) in place.
    pub fn transform(&mut self, matrix: &Mat4) {
        for p in &mut self.positions {
            *p = matrix.transform_point3(*p);
        }
        if let Some(normals) = &mut self.normals {
            for n in normals.iter_mut() {
                *n = matrix.transform_normal3(*n);
            }
        }
        if matrix.flips_winding() {
            for tri in self.indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }
        self.update_bounds();
    }

    /// Split triangles until no edge is longer than `max_edge_length`.
    ///
    /// The longest edge of an offending triangle is bisected and the triangle
    /// replaced by two halves. Midpoint vertices are shared between the two
    /// triangles adjacent to an edge so the mesh stays connected.
    ///
    /// Returns the number of triangles added. Non-positive limits do nothing.
    pub fn subdivide_long_edges(&mut self, max_edge_length: f32) -> usize {
        if max_edge_length <= 0.0 || !max_edge_length.is_finite() {
            return 0;
        }

        let before = self.triangle_count();
        let max_sq = max_edge_length * max_edge_length;
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        // Reversed so popping visits triangles in their original order
        let mut pending: Vec<[u32; 3]> = self
            .indices
            .chunks_exact(3)
            .rev()
            .map(|t| [t[0], t[1], t[2]])
            .collect();
        let mut done = Vec::with_capacity(self.indices.len());

        while let Some(tri) = pending.pop() {
            // Pick the longest edge (a, b) with opposite vertex c
            let mut longest = (0.0_f32, 0usize);
            for e in 0..3 {
                let a = self.positions[tri[e] as usize];
                let b = self.positions[tri[(e + 1) % 3] as usize];
                let len_sq = a.distance_squared(b);
                if len_sq > longest.0 {
                    longest = (len_sq, e);
                }
            }

            if longest.0 <= max_sq {
                done.extend_from_slice(&tri);
                continue;
            }

            let e = longest.1;
            let (a, b, c) = (tri[e], tri[(e + 1) % 3], tri[(e + 2) % 3]);
            let m = self.midpoint(a, b, &mut midpoints);

            // Keep winding order
            pending.push([a, m, c]);
            pending.push([m, b, c]);
        }

        self.indices = done;
        self.update_bounds();
        self.triangle_count() - before
    }

    /// Vertex at the middle of edge (a, b), created on first use.
    fn midpoint(&mut self, a: u32, b: u32, cache: &mut HashMap<(u32, u32), u32>) -> u32 {
        let key = (a.min(b), a.max(b));
        if let Some(&m) = cache.get(&key) {
            return m;
        }

        let m = self.positions.len() as u32;
        let pa = self.positions[a as usize];
        let pb = self.positions[b as usize];
        self.positions.push((pa + pb) * 0.5);

        if let Some(normals) = &mut self.normals {
            let n = (normals[a as usize] + normals[b as usize]).normalize_or_zero();
            normals.push(n);
        }

        cache.insert(key, m);
        m
    }
}
