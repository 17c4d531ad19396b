use arrayvec::ArrayVec;
use nalgebra::{UnitQuaternion, Vector3, Vector4};
use std::f64::consts::PI;

use crate::utils::{clamp01, safe_sqrt};

pub type Fp = f64;
pub type Vec3f = Vector3<Fp>;
pub type Vec4f = Vector4<Fp>;

pub static EPS: Fp = 0.00001;
pub const FP_INF: Fp = Fp::INFINITY;
pub const FP_NEG_INF: Fp = Fp::NEG_INFINITY;

#[derive(Clone, Debug)]
pub struct Ray {
    pub origin: Vec3f,
    pub direction: Vec3f,
}

impl Ray {
    pub fn at(&self, t: Fp) -> Vec3f {
        self.origin + self.direction * t
    }
}

/// Hit of a ray with a single shape, before material data is attached.
#[derive(Clone, Debug)]
pub struct Hit {
    pub offset: Fp,
    pub point: Vec3f,
    pub normal: Vec3f,
    pub u: Fp,
    pub v: Fp,
}

#[derive(Clone, Debug)]
pub enum Shape3D {
    Sphere { r: Fp },
    Box { s: Vec3f },
    /// Intersection is not implemented, a torus never reports a hit.
    Torus { major: Fp, minor: Fp },
    Plane { norm: Vec3f, point: Vec3f },
}

#[derive(Clone, Debug)]
pub struct Object3D {
    pub shape: Shape3D,
    pub position: Vec3f,
    pub rotation: UnitQuaternion<Fp>,
}

pub fn get_reflection_ray(ray: &Vec3f, normal: &Vec3f) -> Vec3f {
    let projection = -ray.dot(normal);
    ray + normal * projection * 2.0
}

/// Bends `direction` through a surface with index `ior` on the far side of `normal`.
/// Exiting rays (same side as the normal) swap the indices and flip the normal.
/// Returns `None` on total internal reflection.
pub fn get_refraction_ray(direction: &Vec3f, normal: &Vec3f, ior: Fp) -> Option<Vec3f> {
    let ior = if ior <= EPS { 1.0 } else { ior };
    let cos_in = direction.dot(normal);
    let (normal, eta, cos_i) = if cos_in < 0.0 {
        (*normal, 1.0 / ior, -cos_in)
    } else {
        (-normal, ior, cos_in)
    };
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i);
    if sin2_t > 1.0 {
        return None;
    }
    let cos_t = safe_sqrt(1.0 - sin2_t);
    (direction * eta + normal * (eta * cos_i - cos_t)).try_normalize(0.0)
}

/// Two unit vectors orthogonal to `axis` and to each other.
pub fn tangent_basis(axis: &Vec3f) -> (Vec3f, Vec3f) {
    let seed = if axis.x.abs() < 0.9 {
        Vec3f::x()
    } else {
        Vec3f::y()
    };
    let t1 = (seed - axis * seed.dot(axis)).normalize();
    let t2 = axis.cross(&t1);
    (t1, t2)
}

fn intersect_sphere(ray: &Ray, r: Fp) -> Option<Hit> {
    let a = ray.direction.dot(&ray.direction);
    if a == 0.0 {
        return None;
    }
    let b = 2.0 * ray.origin.dot(&ray.direction);
    let c = ray.origin.dot(&ray.origin) - r * r;
    let discr = b * b - 4.0 * a * c;
    if discr < 0.0 {
        return None;
    }
    let mut roots = ArrayVec::<Fp, 2>::new();
    roots.push((-b - discr.sqrt()) / (2.0 * a));
    roots.push((-b + discr.sqrt()) / (2.0 * a));
    // both roots behind the origin: sphere is behind the ray
    let offset = roots.into_iter().find(|t| *t > EPS)?;
    let point = ray.at(offset);
    let normal = point.try_normalize(0.0)?;
    Some(Hit {
        offset,
        point,
        normal,
        u: (normal.y.atan2(normal.x) / PI + 1.0) / 2.0,
        v: (normal.z + 1.0) / 2.0,
    })
}

fn intersect_box(ray: &Ray, s: &Vec3f) -> Option<Hit> {
    // nearest face ahead of the origin, the exit face when starting inside or on the surface
    let mut best: Option<(Fp, usize, Fp)> = None;
    for i in 0..3 {
        let d = ray.direction[i];
        if d == 0.0 {
            continue;
        }
        for sign in [-1.0, 1.0] {
            let t = (sign * s[i] - ray.origin[i]) / d;
            if t <= EPS || best.is_some_and(|(t_to_beat, _, _)| t >= t_to_beat) {
                continue;
            }
            let p = ray.at(t);
            let (j, k) = ((i + 1) % 3, (i + 2) % 3);
            if p[j].abs() <= s[j] + EPS && p[k].abs() <= s[k] + EPS {
                best = Some((t, i, sign));
            }
        }
    }
    let (offset, axis, sign) = best?;
    let point = ray.at(offset);
    let mut normal = Vec3f::zeros();
    normal[axis] = sign;

    // six faces side by side along u
    let face = (axis * 2 + usize::from(sign > 0.0)) as Fp;
    let (j, k) = ((axis + 1) % 3, (axis + 2) % 3);
    let a = clamp01((point[j] / s[j] + 1.0) / 2.0);
    let b = clamp01((point[k] / s[k] + 1.0) / 2.0);
    Some(Hit {
        offset,
        point,
        normal,
        u: (face + a) / 6.0,
        v: b,
    })
}

fn intersect_plane(ray: &Ray, norm: &Vec3f, point: &Vec3f) -> Option<Hit> {
    let norm = norm.try_normalize(0.0)?;
    let denom = norm.dot(&ray.direction);
    if denom.abs() < Fp::EPSILON {
        return None;
    }
    let offset = -(norm.dot(&ray.origin) - norm.dot(point)) / denom;
    if offset <= EPS {
        return None;
    }
    let hit_point = ray.at(offset);
    let (t1, t2) = tangent_basis(&norm);
    let local = hit_point - point;
    Some(Hit {
        offset,
        point: hit_point,
        normal: norm,
        u: local.dot(&t1).rem_euclid(1.0),
        v: local.dot(&t2).rem_euclid(1.0),
    })
}

pub fn intersect(ray: &Ray, shape: &Shape3D) -> Option<Hit> {
    match shape {
        Shape3D::Sphere { r } => intersect_sphere(ray, *r),
        Shape3D::Box { s } => intersect_box(ray, s),
        Shape3D::Torus { .. } => None,
        Shape3D::Plane { norm, point } => intersect_plane(ray, norm, point),
    }
}

/// Intersects a world space ray with a transformed shape, the hit is returned in world space.
pub fn intersect_ray_with_object3d(ray: &Ray, object: &Object3D) -> Option<Hit> {
    let transposed_ray = Ray {
        origin: ray.origin - object.position,
        direction: ray.direction,
    };
    let rotated_ray = Ray {
        origin: object
            .rotation
            .conjugate()
            .transform_vector(&transposed_ray.origin),
        direction: object
            .rotation
            .conjugate()
            .transform_vector(&transposed_ray.direction),
    };
    let mut hit = intersect(&rotated_ray, &object.shape)?;
    hit.point = object.rotation.transform_vector(&hit.point) + object.position;
    hit.normal = object.rotation.transform_vector(&hit.normal);
    Some(hit)
}
