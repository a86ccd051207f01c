use foundation::bounds::Aabb3;
use foundation::handles::Handle;

use crate::components::{
    ComponentBounds, ComponentGeometry, Geometry, GeometryId, GeometryRole, Material, Transform,
    TriMesh, Visibility,
};
use crate::entity::EntityId;

/// Entity storage for one map instance.
///
/// Components live in parallel `Vec<Option<_>>` columns indexed by entity
/// index. [`World::clear`] disposes everything and bumps the generation, so
/// ids handed out before the clear no longer resolve.
///
/// Entity transforms are local to the map root; [`World::root`] places the
/// whole map (fit scale and recentering) without touching raw geometry.
#[derive(Debug)]
pub struct World {
    generation: u32,
    next_index: u32,
    root: Transform,
    transforms: Vec<Option<Transform>>,
    bounds: Vec<Option<ComponentBounds>>,
    visibility: Vec<Option<Visibility>>,
    geometry: Vec<Option<ComponentGeometry>>,
    materials: Vec<Option<Material>>,
    geometries: Vec<Geometry>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            generation: 0,
            next_index: 0,
            root: Transform::identity(),
            transforms: Vec::new(),
            bounds: Vec::new(),
            visibility: Vec::new(),
            geometry: Vec::new(),
            materials: Vec::new(),
            geometries: Vec::new(),
        }
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(Handle::new(self.next_index, self.generation));
        self.next_index += 1;
        self.ensure_capacity(id.index() as usize);
        self.transforms[id.index() as usize] = Some(Transform::identity());
        id
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.next_index as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next_index == 0
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.slot(entity).is_some()
    }

    /// Disposes every entity, geometry and material. Returns how many entities were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.len();
        self.generation = self.generation.wrapping_add(1);
        self.next_index = 0;
        self.transforms.clear();
        self.bounds.clear();
        self.visibility.clear();
        self.geometry.clear();
        self.materials.clear();
        self.geometries.clear();
        dropped
    }

    pub fn root(&self) -> Transform {
        self.root
    }

    pub fn set_root(&mut self, root: Transform) {
        self.root = root;
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        if let Some(idx) = self.slot(entity) {
            self.transforms[idx] = Some(transform);
        }
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.transforms.get(self.slot(entity)?).and_then(|t| *t)
    }

    /// Local transform composed with the map root.
    pub fn world_transform(&self, entity: EntityId) -> Option<Transform> {
        Some(self.root.compose(&self.transform(entity)?))
    }

    pub fn set_visibility(&mut self, entity: EntityId, visibility: Visibility) {
        if let Some(idx) = self.slot(entity) {
            self.visibility[idx] = Some(visibility);
        }
    }

    pub fn visibility(&self, entity: EntityId) -> Visibility {
        self.slot(entity)
            .and_then(|idx| self.visibility[idx])
            .unwrap_or_default()
    }

    /// Stores `geometry` for `entity` and derives its local bounds.
    pub fn set_geometry(
        &mut self,
        entity: EntityId,
        geometry: Geometry,
        role: GeometryRole,
    ) -> Option<GeometryId> {
        let idx = self.slot(entity)?;
        let id = GeometryId(self.geometries.len() as u32);
        self.bounds[idx] = geometry.bounds();
        self.geometries.push(geometry);
        self.geometry[idx] = Some(ComponentGeometry::new(id, role));
        Some(id)
    }

    pub fn geometry_component(&self, entity: EntityId) -> Option<ComponentGeometry> {
        self.geometry.get(self.slot(entity)?).and_then(|g| *g)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0 as usize)
    }

    pub fn geometry_of(&self, entity: EntityId) -> Option<&Geometry> {
        self.geometry(self.geometry_component(entity)?.id)
    }

    pub fn bounds(&self, entity: EntityId) -> Option<ComponentBounds> {
        self.bounds.get(self.slot(entity)?).and_then(|b| *b)
    }

    pub fn set_material(&mut self, entity: EntityId, material: Material) {
        if let Some(idx) = self.slot(entity) {
            self.materials[idx] = Some(material);
        }
    }

    pub fn material(&self, entity: EntityId) -> Option<&Material> {
        self.materials.get(self.slot(entity)?).and_then(|m| m.as_ref())
    }

    pub fn material_mut(&mut self, entity: EntityId) -> Option<&mut Material> {
        let idx = self.slot(entity)?;
        self.materials.get_mut(idx).and_then(|m| m.as_mut())
    }

    /// Visible entities with geometry, in index order, with their world transforms.
    pub fn drawables(&self) -> Vec<(EntityId, Transform, ComponentGeometry)> {
        let mut out = Vec::new();
        for (idx, comp) in self.geometry.iter().enumerate() {
            let Some(comp) = comp else { continue };
            let entity = self.entity_at(idx);
            if !self.visibility(entity).visible {
                continue;
            }
            let Some(transform) = self.world_transform(entity) else {
                continue;
            };
            out.push((entity, transform, *comp));
        }
        out
    }

    /// Pickable meshes with their root-local transforms, in index order.
    pub fn pick_targets(&self) -> Vec<(EntityId, Transform, &TriMesh)> {
        let mut out = Vec::new();
        for (idx, comp) in self.geometry.iter().enumerate() {
            let Some(comp) = comp else { continue };
            let entity = self.entity_at(idx);
            if !self.visibility(entity).is_pick_target() {
                continue;
            }
            let (Some(local), Some(mesh)) = (
                self.transform(entity),
                self.geometry(comp.id).and_then(Geometry::as_mesh),
            ) else {
                continue;
            };
            out.push((entity, local, mesh));
        }
        out
    }

    /// Root-local bounds over every entity whose geometry has `role`.
    pub fn local_bounds_of_role(&self, role: GeometryRole) -> Aabb3 {
        let mut out = Aabb3::empty();
        for (idx, comp) in self.geometry.iter().enumerate() {
            if comp.is_none_or(|c| c.role != role) {
                continue;
            }
            let entity = self.entity_at(idx);
            let (Some(b), Some(local)) = (self.bounds(entity), self.transform(entity)) else {
                continue;
            };
            let placed = b.transformed(&local);
            out.extend(placed.min);
            out.extend(placed.max);
        }
        out
    }

    fn entity_at(&self, idx: usize) -> EntityId {
        EntityId(Handle::new(idx as u32, self.generation))
    }

    fn slot(&self, entity: EntityId) -> Option<usize> {
        (entity.0.generation() == self.generation && entity.index() < self.next_index)
            .then_some(entity.index() as usize)
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if self.transforms.len() <= idx {
            let new_len = idx + 1;
            self.transforms.resize(new_len, None);
            self.bounds.resize(new_len, None);
            self.visibility.resize(new_len, None);
            self.geometry.resize(new_len, None);
            self.materials.resize(new_len, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::World;
    use crate::components::{
        Geometry, GeometryRole, Material, Polyline, Transform, TriMesh, Visibility,
    };
    use foundation::color::Color;
    use foundation::math::Vec3;

    fn triangle() -> Geometry {
        Geometry::Mesh(TriMesh {
            positions: vec![
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(2.0, 0.0, 1.0),
                Vec3::new(0.0, 2.0, 1.0),
            ],
            indices: vec![0, 1, 2],
        })
    }

    #[test]
    fn spawn_and_collect_drawables() {
        let mut world = World::new();
        let e = world.spawn();
        world.set_geometry(e, triangle(), GeometryRole::TopFace);

        let drawables = world.drawables();
        assert_eq!(drawables.len(), 1);
        assert_eq!(drawables[0].0, e);
        assert_eq!(drawables[0].2.role, GeometryRole::TopFace);
    }

    #[test]
    fn hidden_entities_are_filtered() {
        let mut world = World::new();
        let e = world.spawn();
        world.set_geometry(e, triangle(), GeometryRole::TopFace);
        world.set_visibility(e, Visibility::hidden());
        assert!(world.drawables().is_empty());
        assert!(world.pick_targets().is_empty());
    }

    #[test]
    fn only_pickable_meshes_are_pick_targets() {
        let mut world = World::new();
        let top = world.spawn();
        world.set_geometry(top, triangle(), GeometryRole::TopFace);
        world.set_visibility(top, Visibility::pickable());
        let line = world.spawn();
        world.set_geometry(
            line,
            Geometry::Line(Polyline {
                points: vec![Vec3::ZERO, Vec3::ONE],
                closed: false,
            }),
            GeometryRole::EdgeLine,
        );
        world.set_visibility(line, Visibility::pickable());

        let targets = world.pick_targets();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].0, top);
    }

    #[test]
    fn clear_invalidates_old_ids() {
        let mut world = World::new();
        let old = world.spawn();
        world.set_material(old, Material::solid(Color::WHITE));
        assert_eq!(world.clear(), 1);

        let fresh = world.spawn();
        assert_eq!(fresh.index(), old.index());
        assert!(!world.is_alive(old));
        assert!(world.material(old).is_none());
        assert!(world.material(fresh).is_none());
    }

    #[test]
    fn root_transform_does_not_touch_local_bounds() {
        let mut world = World::new();
        let e = world.spawn();
        world.set_geometry(e, triangle(), GeometryRole::TopFace);
        world.set_root(Transform::scale_then_translate(10.0, Vec3::new(5.0, 0.0, 0.0)));

        let local = world.local_bounds_of_role(GeometryRole::TopFace);
        assert_eq!(local.max, [2.0, 2.0, 1.0]);
        let placed = world.world_transform(e).expect("transform");
        assert_eq!(placed.apply(Vec3::new(2.0, 0.0, 1.0)), Vec3::new(25.0, 0.0, 10.0));
    }
}
