//! Per-geometry irradiance cache ("rex").
//!
//! A square grid indexed by the surface parameterization `(u, v)`. Every cell
//! keeps running means of the light thrown at it, so repeated identical samples
//! leave the stored value unchanged.

use std::path::Path;

use crate::color::{black, blend, scale, Color};
use crate::geometry::{Fp, Vec3f};
use crate::output::{save_image, OutputError};
use crate::utils::clamp01;

#[derive(Clone, Debug)]
struct RexCell {
    color: Color,
    direction: Vec3f,
    samples: u32,
}

#[derive(Clone, Debug)]
pub struct Rex {
    resolution: usize,
    cells: Vec<RexCell>,
}

impl Rex {
    pub fn new(resolution: usize) -> Rex {
        let resolution = resolution.max(1);
        let cell = RexCell {
            color: black(),
            direction: Vec3f::zeros(),
            samples: 0,
        };
        Rex {
            resolution,
            cells: vec![cell; resolution * resolution],
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Grid index of a parameter in `[0, 1]`, `p = 1` lands in the last cell.
    pub fn index_for(&self, p: Fp) -> usize {
        let index = Fp::max(0.0, (self.resolution as Fp * p).round()) as usize;
        index.min(self.resolution - 1)
    }

    fn cell_index(&self, u: Fp, v: Fp) -> usize {
        self.index_for(u) + self.resolution * self.index_for(v)
    }

    fn cell_mut(&mut self, u: Fp, v: Fp) -> &mut RexCell {
        let index = self.cell_index(u, v);
        &mut self.cells[index]
    }

    fn cell(&self, u: Fp, v: Fp) -> &RexCell {
        &self.cells[self.cell_index(u, v)]
    }

    pub fn throw_diffuse(&mut self, u: Fp, v: Fp, color: &Color) {
        let cell = self.cell_mut(u, v);
        cell.samples += 1;
        let weight = 1.0 / cell.samples as Fp;
        cell.color = blend(color, &cell.color, weight);
    }

    /// `direction` is the direction along which the thrown highlight is strongest.
    pub fn throw_spec(&mut self, u: Fp, v: Fp, direction: &Vec3f, color: &Color) {
        let cell = self.cell_mut(u, v);
        cell.samples += 1;
        let weight = 1.0 / cell.samples as Fp;
        cell.direction = cell.direction.lerp(direction, weight);
        cell.color = blend(color, &cell.color, weight);
    }

    pub fn catch_diffuse(&self, u: Fp, v: Fp) -> Color {
        self.cell(u, v).color
    }

    pub fn catch_spec(&self, u: Fp, v: Fp, view_direction: &Vec3f) -> Color {
        let cell = self.cell(u, v);
        scale(&cell.color, clamp01(view_direction.dot(&cell.direction)))
    }

    #[cfg(test)]
    pub fn samples(&self, u: Fp, v: Fp) -> u32 {
        self.cell(u, v).samples
    }

    pub fn total_samples(&self) -> u64 {
        self.cells.iter().map(|cell| cell.samples as u64).sum()
    }

    /// Row-major RGBA8 buffer, `u` along x and `v` along y.
    pub fn to_pixels(&self) -> Vec<u8> {
        self.cells
            .iter()
            .flat_map(|cell| crate::color::to_rgba8(&cell.color))
            .collect()
    }

    pub fn export(&self, path: &Path) -> Result<(), OutputError> {
        let resolution = self.resolution as u32;
        save_image(path, resolution, resolution, &self.to_pixels())
    }
}
