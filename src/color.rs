//! RGBA colors as float vectors with channels in `[0, 1]`.

use crate::geometry::{Fp, Vec4f};
use crate::utils::clamp01;

pub type Color = Vec4f;

pub fn rgb(r: Fp, g: Fp, b: Fp) -> Color {
    Vec4f::new(r, g, b, 1.0)
}

pub fn black() -> Color {
    rgb(0.0, 0.0, 0.0)
}

/// `r * c1 + (1 - r) * c2` on all four channels.
pub fn blend(c1: &Color, c2: &Color, r: Fp) -> Color {
    c1 * r + c2 * (1.0 - r)
}

/// Scales the color channels, alpha is kept.
pub fn scale(c: &Color, s: Fp) -> Color {
    Vec4f::new(c.x * s, c.y * s, c.z * s, c.w)
}

/// Channel-wise product of the color channels, alpha of `a` is kept.
pub fn modulate(a: &Color, b: &Color) -> Color {
    Vec4f::new(a.x * b.x, a.y * b.y, a.z * b.z, a.w)
}

/// Per channel sum clamped to 1, alpha of `a` is kept.
pub fn add_saturating(a: &Color, b: &Color) -> Color {
    Vec4f::new(
        Fp::min(1.0, a.x + b.x),
        Fp::min(1.0, a.y + b.y),
        Fp::min(1.0, a.z + b.z),
        a.w,
    )
}

pub fn to_rgba8(c: &Color) -> [u8; 4] {
    let channel = |x: Fp| (clamp01(x) * 255.0).round() as u8;
    [channel(c.x), channel(c.y), channel(c.z), channel(c.w)]
}
