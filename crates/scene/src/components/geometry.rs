use foundation::math::Vec3;

use super::ComponentBounds;

/// Index into the world's geometry store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GeometryId(pub u32);

/// What a piece of region geometry represents.
///
/// Only [`GeometryRole::TopFace`] meshes take metric colors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryRole {
    TopFace,
    SideWall,
    Bottom,
    EdgeLine,
}

impl GeometryRole {
    pub fn is_recolorable(self) -> bool {
        matches!(self, GeometryRole::TopFace)
    }
}

/// Indexed triangle list in local space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl TriMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangles as position triples. Out-of-range indices end iteration early.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map_while(|tri| {
            Some([
                *self.positions.get(tri[0] as usize)?,
                *self.positions.get(tri[1] as usize)?,
                *self.positions.get(tri[2] as usize)?,
            ])
        })
    }
}

/// Polyline in local space, drawn with a constant screen-space width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    pub points: Vec<Vec3>,
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Mesh(TriMesh),
    Line(Polyline),
}

impl Geometry {
    pub fn positions(&self) -> &[Vec3] {
        match self {
            Geometry::Mesh(m) => &m.positions,
            Geometry::Line(l) => &l.points,
        }
    }

    pub fn bounds(&self) -> Option<ComponentBounds> {
        ComponentBounds::from_points(self.positions())
    }

    pub fn as_mesh(&self) -> Option<&TriMesh> {
        match self {
            Geometry::Mesh(m) => Some(m),
            Geometry::Line(_) => None,
        }
    }
}

/// Entity component linking to stored geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ComponentGeometry {
    pub id: GeometryId,
    pub role: GeometryRole,
}

impl ComponentGeometry {
    pub fn new(id: GeometryId, role: GeometryRole) -> Self {
        Self { id, role }
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, TriMesh};
    use foundation::math::Vec3;

    #[test]
    fn triangles_follow_indices() {
        let mesh = TriMesh {
            positions: vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            indices: vec![0, 1, 2, 2, 1, 0],
        };
        let tris: Vec<_> = mesh.triangles().collect();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[1][0], Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn bad_indices_are_not_yielded() {
        let mesh = TriMesh {
            positions: vec![Vec3::ZERO],
            indices: vec![0, 0, 5],
        };
        assert_eq!(mesh.triangles().count(), 0);
        assert!(Geometry::Mesh(mesh).bounds().is_some());
    }
}
