use crate::geometry::Fp;

pub fn safe_sqrt(x: Fp) -> Fp {
    Fp::max(0.0, x).sqrt()
}

/// Clamps to `[0, 1]`, NaN becomes 0.
pub fn clamp01(x: Fp) -> Fp {
    Fp::min(1.0, Fp::max(0.0, x))
}
