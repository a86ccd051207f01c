//! GPU-ready vertex packing for region meshes.

use bytemuck::{Pod, Zeroable};
use scene::World;
use scene::components::{GeometryId, TriMesh};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Flat-shaded, unindexed-by-normal copy of a mesh: every triangle gets its
/// own three vertices carrying the face normal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackedMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl PackedMesh {
    pub fn pack(mesh: &TriMesh) -> Self {
        let mut out = PackedMesh::default();
        for tri in mesh.triangles() {
            let n = (tri[1] - tri[0])
                .cross(tri[2] - tri[0])
                .normalized()
                .map(|n| [n.x as f32, n.y as f32, n.z as f32])
                .unwrap_or([0.0, 0.0, 1.0]);
            for p in tri {
                out.indices.push(out.vertices.len() as u32);
                out.vertices.push(MeshVertex {
                    position: [p.x as f32, p.y as f32, p.z as f32],
                    normal: n,
                });
            }
        }
        out
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Packs every visible mesh of the world, in draw order.
pub fn pack_world(world: &World) -> Vec<(GeometryId, PackedMesh)> {
    world
        .drawables()
        .into_iter()
        .filter_map(|(_, _, component)| {
            let mesh = world.geometry(component.id)?.as_mesh()?;
            Some((component.id, PackedMesh::pack(mesh)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{MeshVertex, PackedMesh};
    use foundation::math::Vec3;
    use scene::components::TriMesh;

    #[test]
    fn packs_flat_normals_and_bytes() {
        let mesh = TriMesh {
            positions: vec![
                Vec3::new(0.0, 0.0, 2.0),
                Vec3::new(1.0, 0.0, 2.0),
                Vec3::new(0.0, 1.0, 2.0),
            ],
            indices: vec![0, 1, 2],
        };
        let packed = PackedMesh::pack(&mesh);
        assert_eq!(packed.vertices.len(), 3);
        assert!(packed.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert_eq!(
            packed.vertex_bytes().len(),
            3 * std::mem::size_of::<MeshVertex>()
        );
        assert_eq!(packed.index_bytes().len(), 12);
    }
}
