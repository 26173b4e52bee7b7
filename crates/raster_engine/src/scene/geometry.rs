//! CPU-side mesh data used for bounds and mirror setup

use crate::bounds::{Aabb, ShapeKind, ShapeSource};
use crate::foundation::math::Vec3;
use crate::render::MaterialId;

/// Polygon of a mesh: vertex indices in winding order plus its material
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Indices into [`MeshGeometry::vertices`], at least three
    pub indices: Vec<usize>,
    /// Material assigned to the polygon
    pub material: Option<MaterialId>,
}

impl Polygon {
    /// Polygon without a material
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices, material: None }
    }

    /// Polygon with a material
    pub fn with_material(indices: Vec<usize>, material: MaterialId) -> Self {
        Self {
            indices,
            material: Some(material),
        }
    }

    /// Newell normal (unnormalized, length is twice the area)
    ///
    /// `None` when an index is out of range.
    pub fn normal(&self, vertices: &[Vec3]) -> Option<Vec3> {
        let mut normal = Vec3::zeros();
        for (i, &index) in self.indices.iter().enumerate() {
            let current = vertices.get(index)?;
            let next = vertices.get(self.indices[(i + 1) % self.indices.len()])?;
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
        }
        Some(normal)
    }
}

/// Vertex positions and polygons of one mesh
#[derive(Debug, Clone, Default)]
pub struct MeshGeometry {
    /// Object-space vertex positions
    pub vertices: Vec<Vec3>,
    /// Polygons referencing `vertices`
    pub polygons: Vec<Polygon>,
}

impl MeshGeometry {
    /// Mesh from raw parts
    pub fn new(vertices: Vec<Vec3>, polygons: Vec<Polygon>) -> Self {
        Self { vertices, polygons }
    }

    /// Axis-aligned rectangle in the XZ plane facing -Y, one polygon
    pub fn quad_xz(half_width: f32, half_height: f32, material: Option<MaterialId>) -> Self {
        let vertices = vec![
            Vec3::new(-half_width, 0.0, -half_height),
            Vec3::new(half_width, 0.0, -half_height),
            Vec3::new(half_width, 0.0, half_height),
            Vec3::new(-half_width, 0.0, half_height),
        ];
        let polygon = Polygon {
            indices: vec![0, 1, 2, 3],
            material,
        };
        Self::new(vertices, vec![polygon])
    }

    /// Axis-aligned box centered at the origin, quads facing outward
    pub fn cuboid(half: Vec3, material: Option<MaterialId>) -> Self {
        let vertices = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -half.x } else { half.x },
                    if i & 2 == 0 { -half.y } else { half.y },
                    if i & 4 == 0 { -half.z } else { half.z },
                )
            })
            .collect();
        let faces = [
            [0, 4, 6, 2],
            [1, 3, 7, 5],
            [0, 1, 5, 4],
            [2, 6, 7, 3],
            [0, 2, 3, 1],
            [4, 5, 7, 6],
        ];
        let polygons = faces
            .iter()
            .map(|face| Polygon {
                indices: face.to_vec(),
                material,
            })
            .collect();
        Self::new(vertices, polygons)
    }

    /// Box around every vertex
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }
}

impl ShapeSource for MeshGeometry {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Mesh
    }

    fn bound_box(&self) -> Option<[Vec3; 8]> {
        let aabb = self.bounds()?;
        let (min, max) = (aabb.min, aabb.max);
        Some(std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        }))
    }
}
