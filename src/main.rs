mod aabb;
mod baking;
mod cli;
mod color;
mod distributions;
mod geometry;
mod logger;
mod output;
mod rendering;
mod rex;
mod scene;
mod scene_file;
mod utils;


extern crate nalgebra as na;

use anyhow::Context;
use clap::Parser;
use log::info;
use std::fs;
use std::path::Path;

use crate::baking::bake;
use crate::cli::Args;
use crate::logger::init_logger;
use crate::output::save_image;
use crate::rendering::render_scene;
use crate::scene::Scene;
use crate::scene_file::load_scene;

fn export_rexes(scene: &Scene, dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for (index, geometry) in scene.geometry.iter().enumerate() {
        if let Some(rex) = &geometry.rex {
            let path = dir.join(format!("rex_{}.png", index));
            rex.export(&path)
                .with_context(|| format!("exporting cache to {}", path.display()))?;
            info!(
                "cache {} written to {} ({}x{}, {} samples)",
                index,
                path.display(),
                rex.resolution(),
                rex.resolution(),
                rex.total_samples()
            );
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.clone().into());

    let mut scene = load_scene(&args.scene)
        .with_context(|| format!("failed to load scene {}", args.scene.display()))?;
    args.apply_overrides(&mut scene.settings);
    scene.validate()?;
    let bounds = scene.bounds();
    if bounds.is_empty() {
        info!("scene holds no bounded geometry");
    } else {
        info!("scene bounds: {:?} .. {:?}", bounds.min, bounds.max);
    }

    if scene.settings.rex {
        bake(&mut scene);
        if let Some(dir) = &args.rex_dir {
            export_rexes(&scene, dir)?;
        }
    }

    let rendered_scene = render_scene(&scene);
    save_image(
        &args.output,
        scene.settings.width,
        scene.settings.height,
        &rendered_scene,
    )
    .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("image written to {}", args.output.display());
    Ok(())
}
