//! Stochastic light-ray cascades that fill the per-geometry irradiance caches.
//!
//! Rays are traced in parallel against the read-only scene; each chunk of
//! iterations records its throws, and a bounded window of chunks is applied to
//! the caches by a single writer in chunk order before the next window is
//! traced. Results are identical for a given seed whatever the thread count.

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use std::ops::Range;
use std::time::Instant;

use crate::color::{modulate, scale, Color};
use crate::distributions::{ConeJitter, CosineLobe, SampleDistribution};
use crate::geometry::{get_reflection_ray, Fp, Ray, Vec3f};
use crate::rex::Rex;
use crate::scene::Scene;
use crate::utils::clamp01;

const CHUNK_SIZE: usize = 256;

#[derive(Clone, Debug)]
enum Throw {
    Diffuse {
        geometry: usize,
        u: Fp,
        v: Fp,
        color: Color,
    },
    Spec {
        geometry: usize,
        u: Fp,
        v: Fp,
        direction: Vec3f,
        color: Color,
    },
}

struct Cascade<'a> {
    scene: &'a Scene,
    branching: usize,
    lobe: CosineLobe,
}

impl Cascade<'_> {
    /// Follows one light ray, `spec_weight` is set for bounced rays.
    fn trace(
        &self,
        ray: &Ray,
        carried: &Color,
        depth: i32,
        spec_weight: Option<Fp>,
        rng: &mut Xoshiro256PlusPlus,
        throws: &mut Vec<Throw>,
    ) {
        let Some(hit) = self.scene.intersect(ray) else {
            return;
        };
        let material = hit.material;
        let cos = clamp01((-ray.direction).dot(&hit.normal));
        let diffuse = scale(&modulate(&material.diffuse_color, carried), cos);
        let reflected = get_reflection_ray(&ray.direction, &hit.normal);

        if let Some(weight) = spec_weight {
            throws.push(Throw::Spec {
                geometry: hit.geometry,
                u: hit.u,
                v: hit.v,
                direction: reflected,
                color: scale(&modulate(&material.spec_color, carried), weight),
            });
        }
        throws.push(Throw::Diffuse {
            geometry: hit.geometry,
            u: hit.u,
            v: hit.v,
            color: diffuse,
        });

        if depth <= 0 {
            return;
        }
        let facing = if ray.direction.dot(&hit.normal) > 0.0 {
            -hit.normal
        } else {
            hit.normal
        };
        let glossiness = Fp::max(1.0, material.glossiness);
        for _ in 0..self.branching {
            let direction = self.lobe.sample(rng, &facing);
            let weight = clamp01(direction.dot(&reflected)).powf(glossiness);
            let bounce = Ray {
                origin: hit.point,
                direction,
            };
            self.trace(&bounce, &diffuse, depth - 1, Some(weight), rng, throws);
        }
    }
}

fn chunk_seed(seed: u64, light: usize, chunk: usize) -> u64 {
    seed ^ ((light as u64) << 40) ^ (chunk as u64)
}

/// Traces the chunks `chunks` of one light, returning their throws in chunk order.
fn trace_chunks(
    cascade: &Cascade,
    light_index: usize,
    jitter: &ConeJitter,
    axis: &Vec3f,
    chunks: Range<usize>,
    bar: &ProgressBar,
) -> Vec<Vec<Throw>> {
    let settings = &cascade.scene.settings;
    let light = &cascade.scene.lights[light_index];
    let carried = scale(&light.color, light.intensity);
    chunks
        .into_par_iter()
        .map(|chunk| {
            let mut rng =
                Xoshiro256PlusPlus::seed_from_u64(chunk_seed(settings.seed, light_index, chunk));
            let iterations = CHUNK_SIZE.min(settings.rex_accuracy - chunk * CHUNK_SIZE);
            let mut throws = Vec::new();
            for _ in 0..iterations {
                let ray = Ray {
                    origin: light.position,
                    direction: jitter.sample(&mut rng, axis),
                };
                cascade.trace(&ray, &carried, settings.rex_depth, None, &mut rng, &mut throws);
            }
            bar.inc(1);
            throws
        })
        .collect()
}

fn apply(scene: &mut Scene, throw: Throw) {
    match throw {
        Throw::Diffuse {
            geometry,
            u,
            v,
            color,
        } => {
            if let Some(rex) = scene.geometry[geometry].rex.as_mut() {
                rex.throw_diffuse(u, v, &color);
            }
        }
        Throw::Spec {
            geometry,
            u,
            v,
            direction,
            color,
        } => {
            if let Some(rex) = scene.geometry[geometry].rex.as_mut() {
                rex.throw_spec(u, v, &direction, &color);
            }
        }
    }
}

/// Allocates a fresh cache for every geometry and fills it from every light.
pub fn bake(scene: &mut Scene) {
    bake_in_windows(scene, rayon::current_num_threads() * 4);
}

/// Throws are held for at most `window` chunks at a time before they are applied.
pub fn bake_in_windows(scene: &mut Scene, window: usize) {
    let settings = scene.settings.clone();
    let window = window.max(1);
    for geometry in &mut scene.geometry {
        geometry.rex = Some(Rex::new(settings.rex_resolution));
    }
    info!(
        "baking {}x{} caches for {} objects: {} rays per light, cascade {}, depth {}",
        settings.rex_resolution,
        settings.rex_resolution,
        scene.geometry.len(),
        settings.rex_accuracy,
        settings.rex_cascade,
        settings.rex_depth
    );

    let now = Instant::now();
    let chunks = settings.rex_accuracy.div_ceil(CHUNK_SIZE);
    let jitter = ConeJitter {
        half_angle: settings.rex_spread,
    };
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {wide_bar:.cyan/blue} light {msg}: {human_pos}/{human_len} chunks ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    let mut total = 0usize;
    for light_index in 0..scene.lights.len() {
        let Some(axis) = scene.lights[light_index].direction() else {
            warn!(
                "light {} looks at its own position, skipping it while baking",
                light_index
            );
            continue;
        };
        let bar = ProgressBar::new(chunks as u64)
            .with_style(style.clone())
            .with_message(light_index.to_string());
        let mut count = 0usize;
        for start in (0..chunks).step_by(window) {
            let range = start..chunks.min(start + window);
            let throws = {
                let cascade = Cascade {
                    scene: &*scene,
                    branching: settings.rex_cascade,
                    lobe: CosineLobe,
                };
                trace_chunks(&cascade, light_index, &jitter, &axis, range, &bar)
            };
            for throw in throws.into_iter().flatten() {
                apply(scene, throw);
                count += 1;
            }
        }
        bar.finish();
        debug!("light {} deposited {} samples", light_index, count);
        total += count;
    }
    info!("bake time: {:?}, {} samples deposited", now.elapsed(), total);
}
