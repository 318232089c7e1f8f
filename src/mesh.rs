//! Mesh buffers produced by the ribbon and river builders.
//!
//! A [`MeshBuffer`] owns exactly the data handed to an external renderer or
//! collision backend: vertex positions, a triangle index list, per-vertex UVs,
//! recomputed normals and an axis-aligned bounding box. Buffers are plain data;
//! attaching them to scene resources is the consumer's concern.

use super::core::{BBox, Point3, Vec3};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshBuffer {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub uvs: Vec<[f64; 2]>,
    pub normals: Vec<[f64; 3]>,
    /// Axis-aligned bounds, populated by [`MeshBuffer::finalize`].
    pub bounds: Option<BBox>,
}

impl MeshBuffer {
    #[must_use]
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(triangles * 3),
            uvs: Vec::with_capacity(vertices),
            normals: Vec::new(),
            bounds: None,
        }
    }

    /// Append one vertex, returning its index.
    pub fn push_vertex(&mut self, position: Point3, uv: [f64; 2]) -> u32 {
        let index = u32::try_from(self.positions.len()).unwrap_or(u32::MAX);
        self.positions.push(position.to_array());
        self.uvs.push(uv);
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.push(a);
        self.indices.push(b);
        self.indices.push(c);
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    /// Returns true if all vertex indices are within bounds.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len() as u32;
        self.indices.iter().all(|&i| i < n)
    }

    /// Returns true if indices represent a triangle list.
    #[must_use]
    pub fn has_triangle_indices(&self) -> bool {
        self.indices.len() % 3 == 0
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.has_triangle_indices() {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if self.uvs.len() != self.positions.len() {
            return Err("mesh UV buffer does not match vertex count".to_string());
        }
        if !self.normals.is_empty() && self.normals.len() != self.positions.len() {
            return Err("mesh normal buffer does not match vertex count".to_string());
        }
        Ok(())
    }

    /// Recompute smooth per-vertex normals by accumulating area-weighted face
    /// normals. Vertices not referenced by any triangle get the up vector.
    pub fn recompute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];

        for tri in self.indices.chunks_exact(3) {
            let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let a = Vec3::new(self.positions[ia][0], self.positions[ia][1], self.positions[ia][2]);
            let b = Vec3::new(self.positions[ib][0], self.positions[ib][1], self.positions[ib][2]);
            let c = Vec3::new(self.positions[ic][0], self.positions[ic][1], self.positions[ic][2]);

            // Unnormalized cross product weights by twice the triangle area.
            let face = (b - a).cross(c - a);
            accum[ia] = accum[ia] + face;
            accum[ib] = accum[ib] + face;
            accum[ic] = accum[ic] + face;
        }

        self.normals = accum
            .into_iter()
            .map(|n| n.normalized().unwrap_or(Vec3::Y).to_array())
            .collect();
    }

    pub fn recompute_bounds(&mut self) {
        self.bounds = BBox::from_arrays(&self.positions);
    }

    /// Recompute normals and bounds in one pass; every builder calls this
    /// before handing the buffer out.
    pub fn finalize(&mut self) {
        self.recompute_normals();
        self.recompute_bounds();
    }

    /// Returns the position buffer as a flat slice: `[x0, y0, z0, x1, ...]`.
    ///
    /// This is a zero-copy view over `positions`, useful for graphics adapters
    /// that expect packed numeric buffers.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        flatten_f64_array_slice::<3>(&self.positions)
    }

    /// Returns the UV buffer as a flat slice: `[u0, v0, u1, v1, ...]`.
    #[must_use]
    pub fn uvs_flat(&self) -> &[f64] {
        flatten_f64_array_slice::<2>(&self.uvs)
    }

    /// Returns the normal buffer as a flat slice: `[nx0, ny0, nz0, ...]`.
    #[must_use]
    pub fn normals_flat(&self) -> &[f64] {
        flatten_f64_array_slice::<3>(&self.normals)
    }
}

fn flatten_f64_array_slice<const N: usize>(data: &[[f64; N]]) -> &[f64] {
    let count = data.len().checked_mul(N).unwrap_or(0);
    let ptr = data.as_ptr().cast::<f64>();
    // SAFETY: `[[f64; N]]` is stored contiguously, and we compute the element
    // count as `len * N`.
    unsafe { std::slice::from_raw_parts(ptr, count) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshBuffer {
        let mut mesh = MeshBuffer::with_capacity(4, 2);
        mesh.push_vertex(Point3::new(0.0, 0.0, 0.0), [0.0, 0.0]);
        mesh.push_vertex(Point3::new(1.0, 0.0, 0.0), [1.0, 0.0]);
        mesh.push_vertex(Point3::new(0.0, 0.0, 1.0), [0.0, 1.0]);
        mesh.push_vertex(Point3::new(1.0, 0.0, 1.0), [1.0, 1.0]);
        mesh.push_triangle(0, 2, 1);
        mesh.push_triangle(1, 2, 3);
        mesh
    }

    #[test]
    fn test_counts_and_validate() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_meshes() {
        let mut mesh = quad();
        mesh.indices.push(0);
        assert!(mesh.validate().is_err());

        let mut mesh = quad();
        mesh.push_triangle(0, 1, 99);
        assert!(mesh.validate().is_err());

        let mut mesh = quad();
        mesh.positions[0][1] = f64::NAN;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_finalize_flat_quad() {
        let mut mesh = quad();
        mesh.finalize();

        // A flat horizontal quad with upward winding gets up normals.
        assert_eq!(mesh.normals.len(), 4);
        for n in &mesh.normals {
            assert!((n[1] - 1.0).abs() < 1e-12, "normal {n:?} should point up");
        }

        let bounds = mesh.bounds.unwrap();
        assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_flat_accessors() {
        let mesh = quad();
        assert_eq!(mesh.positions_flat().len(), 12);
        assert_eq!(mesh.uvs_flat().len(), 8);
        assert_eq!(mesh.positions_flat()[3], 1.0);
    }
}
