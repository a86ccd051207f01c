use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

use crate::World;
use crate::components::{ComponentBounds, Transform};
use crate::entity::EntityId;
use crate::spatial::{Bvh, Item as BvhItem, Ray};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    /// Distance along the normalized world ray.
    pub distance: f64,
    /// World-space hit point.
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
        }
    }
}

/// Ray/mesh picking over the world's pick targets.
///
/// Built once per map build in root-local space. The root transform is
/// applied at query time by moving the ray into root-local space, so an
/// animated fit scale never forces a rebuild.
///
/// Ordering contract: the nearest triangle hit wins; equal distances go to
/// the lower `EntityId::index()`.
#[derive(Debug, Default)]
pub struct PickIndex {
    bvh: Bvh,
    triangles: Vec<Option<Vec<[Vec3; 3]>>>,
}

impl PickIndex {
    pub fn build(world: &World) -> Self {
        let mut triangles: Vec<Option<Vec<[Vec3; 3]>>> = Vec::new();
        let mut items = Vec::new();
        for (entity, local, mesh) in world.pick_targets() {
            let tris: Vec<[Vec3; 3]> = mesh
                .triangles()
                .map(|t| [local.apply(t[0]), local.apply(t[1]), local.apply(t[2])])
                .filter(|t| t.iter().all(|p| p.is_finite()))
                .collect();
            let Some(bounds) = ComponentBounds::from_points(tris.iter().flatten()) else {
                continue;
            };
            items.push(BvhItem {
                entity,
                bounds: bounds.to_aabb(),
            });
            let idx = entity.index() as usize;
            if triangles.len() <= idx {
                triangles.resize(idx + 1, None);
            }
            triangles[idx] = Some(tris);
        }
        Self {
            bvh: Bvh::build(items),
            triangles,
        }
    }

    pub fn len(&self) -> usize {
        self.bvh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bvh.is_empty()
    }

    pub fn pick(&self, root: &Transform, ray: Ray, opts: PickOptions) -> Option<PickHit> {
        let dir = ray.dir.normalized()?;
        let local = Ray::new(root.inverse_apply(ray.origin)?, root.inverse_apply_dir(dir)?);

        let mut best: Option<(f64, EntityId)> = None;
        for candidate in self.bvh.query_ray(&local, opts.max_distance) {
            if best.is_some_and(|(bt, _)| candidate.t_enter > bt) {
                break;
            }
            let Some(tris) = self
                .triangles
                .get(candidate.entity.index() as usize)
                .and_then(|t| t.as_ref())
            else {
                continue;
            };
            let Some(t) = tris
                .iter()
                .filter_map(|tri| ray_triangle(&local, tri))
                .filter(|t| *t <= opts.max_distance)
                .min_by(|a, b| stable_total_cmp_f64(*a, *b))
            else {
                continue;
            };
            let better = match best {
                None => true,
                Some((bt, be)) => stable_total_cmp_f64(t, bt)
                    .then_with(|| candidate.entity.index().cmp(&be.index()))
                    .is_lt(),
            };
            if better {
                best = Some((t, candidate.entity));
            }
        }

        let (t, entity) = best?;
        Some(PickHit {
            entity,
            distance: t,
            point: ray.origin + dir.scale(t),
        })
    }
}

/// One-shot pick without a cached index.
pub fn pick_ray(world: &World, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    PickIndex::build(world).pick(&world.root(), ray, opts)
}

/// Screen picking wrapper. The caller supplies the screen-to-ray mapping.
pub fn pick_screen<F>(
    index: &PickIndex,
    root: &Transform,
    x_px: f64,
    y_px: f64,
    mut make_ray: F,
    opts: PickOptions,
) -> Option<PickHit>
where
    F: FnMut(f64, f64) -> Option<Ray>,
{
    let ray = make_ray(x_px, y_px)?;
    index.pick(root, ray, opts)
}

/// Two-sided Möller–Trumbore. Returns the ray parameter of the hit.
pub fn ray_triangle(ray: &Ray, tri: &[Vec3; 3]) -> Option<f64> {
    const EPS: f64 = 1e-12;
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = ray.dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - tri[0];
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}
