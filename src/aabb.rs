use crate::geometry::{Fp, Object3D, Ray, Shape3D, Vec3f, EPS, FP_INF, FP_NEG_INF};
use crate::scene::Geometry;

#[derive(Clone, Debug)]
pub struct Aabb {
    pub min: Vec3f,
    pub max: Vec3f,
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb {
            min: Vec3f::new(FP_INF, FP_INF, FP_INF),
            max: Vec3f::new(FP_NEG_INF, FP_NEG_INF, FP_NEG_INF),
        }
    }
}

impl Aabb {
    pub fn extend_point(&self, point: &Vec3f) -> Aabb {
        Aabb {
            min: self.min.inf(point),
            max: self.max.sup(point),
        }
    }

    pub fn extend_aabb(&self, aabb: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&aabb.min),
            max: self.max.sup(&aabb.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|coord| self.min[coord] > self.max[coord])
    }

    /// Slab test: true if the ray reaches the box at some `t > EPS`.
    pub fn hit(&self, ray: &Ray) -> bool {
        let mut t_near = FP_NEG_INF;
        let mut t_far = FP_INF;
        for coord in 0..3 {
            let o = ray.origin[coord];
            let d = ray.direction[coord];
            if d == 0.0 {
                if o < self.min[coord] || o > self.max[coord] {
                    return false;
                }
                continue;
            }
            let t1 = (self.min[coord] - o) / d;
            let t2 = (self.max[coord] - o) / d;
            t_near = Fp::max(t_near, Fp::min(t1, t2));
            t_far = Fp::min(t_far, Fp::max(t1, t2));
        }
        t_near <= t_far && t_far >= EPS
    }
}

/// Local space bounds, `None` for unbounded shapes.
fn calculate_aabb_for_shape(shape3d: &Shape3D) -> Option<Aabb> {
    let eps_vec = Vec3f::new(EPS, EPS, EPS);
    match shape3d {
        Shape3D::Sphere { r } => {
            let s = Vec3f::new(*r, *r, *r).abs();
            Some(Aabb {
                min: -s - eps_vec,
                max: s + eps_vec,
            })
        }
        Shape3D::Box { s } => Some(Aabb {
            min: -s.abs() - eps_vec,
            max: s.abs() + eps_vec,
        }),
        Shape3D::Torus { major, minor } => {
            let outer = major.abs() + minor.abs();
            let s = Vec3f::new(outer, outer, minor.abs());
            Some(Aabb {
                min: -s - eps_vec,
                max: s + eps_vec,
            })
        }
        Shape3D::Plane { .. } => None,
    }
}

// to make the formatter happy
fn if_then_else<T>(cond: bool, fst: T, snd: T) -> T {
    if cond {
        fst
    } else {
        snd
    }
}

pub fn calculate_aabb_for_object(object: &Object3D) -> Option<Aabb> {
    let shape_aabb = calculate_aabb_for_shape(&object.shape)?;
    let mut result = Aabb::default();
    for x_from_min in [false, true] {
        for y_from_min in [false, true] {
            for z_from_min in [false, true] {
                let point = Vec3f::new(
                    if_then_else(x_from_min, shape_aabb.min.x, shape_aabb.max.x),
                    if_then_else(y_from_min, shape_aabb.min.y, shape_aabb.max.y),
                    if_then_else(z_from_min, shape_aabb.min.z, shape_aabb.max.z),
                );
                let object_point = object.rotation.transform_vector(&point) + object.position;
                result = result.extend_point(&object_point);
            }
        }
    }
    Some(result)
}

/// Bounds of all finite geometry, unbounded shapes are skipped.
pub fn calculate_aabb(slice: &[Geometry]) -> Aabb {
    slice
        .iter()
        .filter_map(|geometry| geometry.aabb.as_ref())
        .fold(Aabb::default(), |acc, aabb| acc.extend_aabb(aabb))
}
