use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{error, info};
use rayon::prelude::*;
use std::time::Instant;

use crate::color::{add_saturating, blend, scale, to_rgba8, Color};
use crate::geometry::{get_reflection_ray, get_refraction_ray, Fp, Ray, Vec3f, EPS};
use crate::scene::{Camera, Intersection, Scene};
use crate::utils::clamp01;

/// Primary ray generator for a `width` x `height` image.
pub struct CameraRays {
    position: Vec3f,
    center: Vec3f,
    right: Vec3f,
    up: Vec3f,
    half_width: Fp,
    half_height: Fp,
}

impl CameraRays {
    pub fn new(camera: &Camera, width: u32, height: u32) -> Option<CameraRays> {
        let (forward, right, up) = camera.basis()?;
        let right_offset = camera.width / Fp::max(1.0, width as Fp - 1.0);
        let up_offset = camera.height / Fp::max(1.0, height as Fp - 1.0);
        Some(CameraRays {
            position: camera.position,
            center: camera.position + forward * camera.focal_length,
            right: right * right_offset,
            up: up * up_offset,
            half_width: (width as Fp - 1.0) / 2.0,
            half_height: (height as Fp - 1.0) / 2.0,
        })
    }

    pub fn ray_for(&self, x: usize, y: usize) -> Ray {
        let screen_point = self.center
            + self.right * (x as Fp - self.half_width)
            + self.up * (y as Fp - self.half_height);
        let direction = screen_point - self.position;
        Ray {
            origin: self.position,
            direction: direction.try_normalize(0.0).unwrap_or(direction),
        }
    }
}

/// Averaged diffuse and specular intensities of the unoccluded lights.
fn direct_light(scene: &Scene, hit: &Intersection, view: &Vec3f) -> (Fp, Fp) {
    if scene.lights.is_empty() {
        return (0.0, 0.0);
    }
    let mut diffuse = 0.0;
    let mut spec = 0.0;
    for light in &scene.lights {
        let Some(to_light) = (light.position - hit.point).try_normalize(EPS) else {
            continue;
        };
        let shadow_ray = Ray {
            origin: hit.point,
            direction: to_light,
        };
        if scene.is_occluded(&shadow_ray) {
            continue;
        }
        diffuse += clamp01(to_light.dot(&hit.normal)) * light.intensity;
        if hit.material.spec > 0.0 {
            let facing = get_reflection_ray(&-to_light, &hit.normal).dot(view);
            if facing > 0.0 {
                spec += Fp::min(facing, 1.0).powf(hit.material.glossiness);
            }
        }
    }
    let count = scene.lights.len() as Fp;
    (diffuse / count, spec / count)
}

/// Color seen along `ray`. Reflection and refraction recurse while `depth > 0`.
pub fn trace(ray: &Ray, scene: &Scene, depth: i32) -> Color {
    let Some(hit) = scene.intersect(ray) else {
        return scene.settings.bg_color;
    };
    let material = hit.material;
    let view = -ray.direction;
    let (diffuse_intensity, spec_intensity) = direct_light(scene, &hit, &view);

    let rex = scene.rex(hit.geometry);
    let diffuse = match rex {
        Some(rex) => rex.catch_diffuse(hit.u, hit.v),
        None => scale(&material.diffuse_color, diffuse_intensity),
    };
    let mut specular = scale(&material.spec_color, material.spec * spec_intensity);
    if let Some(rex) = rex.filter(|_| material.spec > 0.0) {
        let baked = rex.catch_spec(hit.u, hit.v, &view);
        specular = add_saturating(&specular, &scale(&baked, material.spec));
    }

    let mut color = diffuse;
    if material.transparency > 0.0 && depth > 0 {
        let direction = get_refraction_ray(&ray.direction, &hit.normal, material.refraction)
            .unwrap_or_else(|| get_reflection_ray(&ray.direction, &hit.normal));
        let refracted = Ray {
            origin: hit.point,
            direction,
        };
        let transmitted = trace(&refracted, scene, depth - 1);
        color = blend(&transmitted, &color, material.transparency);
    }
    if material.reflection > 0.0 && depth > 0 {
        let reflected = Ray {
            origin: hit.point,
            direction: get_reflection_ray(&ray.direction, &hit.normal),
        };
        let mirrored = trace(&reflected, scene, depth - 1);
        color = blend(&mirrored, &color, material.reflection);
    }
    add_saturating(&color, &specular)
}

/// Renders the scene into a row-major RGBA8 buffer of `width * height * 4` bytes.
pub fn render_scene(scene: &Scene) -> Vec<u8> {
    let width = scene.settings.width as usize;
    let height = scene.settings.height as usize;
    let mut result = vec![0u8; width * height * 4];
    let Some(rays) = CameraRays::new(&scene.camera, scene.settings.width, scene.settings.height)
    else {
        error!("camera basis is degenerate, the image is left background only");
        let background = to_rgba8(&scene.settings.bg_color);
        for pixel in result.chunks_exact_mut(4) {
            pixel.copy_from_slice(&background);
        }
        return result;
    };
    info!(
        "rendering image with {}x{} resolution, {} objects, {} lights, depth {}",
        width,
        height,
        scene.geometry.len(),
        scene.lights.len(),
        scene.settings.ray_depth
    );

    let now = Instant::now();
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {wide_bar:.cyan/blue} rows: {human_pos}/{human_len} {percent}% ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    let bar = ProgressBar::new(height as u64).with_style(style);
    result
        .par_chunks_mut(width * 4)
        .enumerate()
        .progress_with(bar)
        .for_each(|(y, row)| {
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let color = trace(&rays.ray_for(x, y), scene, scene.settings.ray_depth);
                pixel.copy_from_slice(&to_rgba8(&color));
            }
        });
    info!("render time: {:?}", now.elapsed());
    result
}
