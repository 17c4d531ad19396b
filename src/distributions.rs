use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;

use crate::geometry::{tangent_basis, Fp, Vec3f};
use crate::utils::safe_sqrt;

pub trait SampleDistribution {
    /// Unit direction distributed around the unit vector `axis`.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, axis: &Vec3f) -> Vec3f;
}

/// Uniform over solid angle inside a cone around the axis.
pub struct ConeJitter {
    pub half_angle: Fp,
}

/// Cosine weighted lobe around the axis.
pub struct CosineLobe;

pub fn random_unit_vec<R: Rng + ?Sized>(rng: &mut R) -> Vec3f {
    loop {
        let v = Vec3f::new(
            rng.sample(StandardNormal),
            rng.sample(StandardNormal),
            rng.sample(StandardNormal),
        );
        if let Some(v) = v.try_normalize(Fp::EPSILON) {
            return v;
        }
    }
}

impl SampleDistribution for ConeJitter {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, axis: &Vec3f) -> Vec3f {
        let cos_max = self.half_angle.clamp(0.0, PI).cos();
        let cos_theta = 1.0 - rng.gen::<Fp>() * (1.0 - cos_max);
        let sin_theta = safe_sqrt(1.0 - cos_theta * cos_theta);
        let phi = 2.0 * PI * rng.gen::<Fp>();
        let (t1, t2) = tangent_basis(axis);
        (axis * cos_theta + t1 * (sin_theta * phi.cos()) + t2 * (sin_theta * phi.sin()))
            .normalize()
    }
}

impl SampleDistribution for CosineLobe {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, axis: &Vec3f) -> Vec3f {
        let uniform = random_unit_vec(rng);
        (uniform + axis).try_normalize(Fp::EPSILON).unwrap_or(*axis)
    }
}
