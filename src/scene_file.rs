//! Line based scene description loader.
//!
//! One command per line, `#` starts a comment. Primitive and light properties
//! apply to the block opened by the last `NEW_PRIMITIVE` / `NEW_LIGHT`.
//! Unknown commands are reported and skipped.

use log::warn;
use na::{Quaternion, UnitQuaternion};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::color::Color;
use crate::geometry::{Fp, Object3D, Shape3D, Vec3f, Vec4f};
use crate::scene::{Camera, Geometry, Light, Material, Scene, SceneError, Settings};

#[derive(Debug, Error)]
pub enum SceneFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {command} expects {expected} values, got {actual}")]
    Arity {
        line: usize,
        command: String,
        expected: String,
        actual: usize,
    },

    #[error("Line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    #[error("Line {line}: expected on or off, got '{token}'")]
    InvalidFlag { line: usize, token: String },

    #[error("Line {line}: {command} used outside of a {block} block")]
    OutsideBlock {
        line: usize,
        command: String,
        block: &'static str,
    },

    #[error("Primitive opened at line {line} has no shape")]
    MissingShape { line: usize },

    #[error(transparent)]
    Scene(#[from] SceneError),
}

struct Line<'a> {
    number: usize,
    command: &'a str,
    args: Vec<&'a str>,
}

impl Line<'_> {
    fn arity_error(&self, expected: &str) -> SceneFileError {
        SceneFileError::Arity {
            line: self.number,
            command: self.command.to_string(),
            expected: expected.to_string(),
            actual: self.args.len(),
        }
    }

    fn parse<T: std::str::FromStr>(&self, token: &str) -> Result<T, SceneFileError> {
        token.parse().map_err(|_| SceneFileError::InvalidNumber {
            line: self.number,
            token: token.to_string(),
        })
    }

    fn floats(&self, n: usize) -> Result<Vec<Fp>, SceneFileError> {
        if self.args.len() != n {
            return Err(self.arity_error(&n.to_string()));
        }
        self.args.iter().map(|token| self.parse(token)).collect()
    }

    fn float(&self) -> Result<Fp, SceneFileError> {
        Ok(self.floats(1)?[0])
    }

    fn count<T: std::str::FromStr>(&self) -> Result<T, SceneFileError> {
        match self.args.as_slice() {
            [token] => self.parse(token),
            _ => Err(self.arity_error("1")),
        }
    }

    fn vector(&self) -> Result<Vec3f, SceneFileError> {
        let v = self.floats(3)?;
        Ok(Vec3f::new(v[0], v[1], v[2]))
    }

    /// `r g b` or `r g b a`, alpha defaults to opaque.
    fn color(&self) -> Result<Color, SceneFileError> {
        let n = self.args.len();
        if n != 3 && n != 4 {
            return Err(self.arity_error("3 or 4"));
        }
        let v = self.floats(n)?;
        Ok(Vec4f::new(v[0], v[1], v[2], v.get(3).copied().unwrap_or(1.0)))
    }

    fn flag(&self) -> Result<bool, SceneFileError> {
        match self.args.as_slice() {
            ["on"] | ["true"] | ["1"] => Ok(true),
            ["off"] | ["false"] | ["0"] => Ok(false),
            [token] => Err(SceneFileError::InvalidFlag {
                line: self.number,
                token: token.to_string(),
            }),
            _ => Err(self.arity_error("1")),
        }
    }
}

struct PendingPrimitive {
    line: usize,
    shape: Option<Shape3D>,
    position: Vec3f,
    rotation: UnitQuaternion<Fp>,
    material: Material,
}

impl PendingPrimitive {
    fn finish(self) -> Result<Geometry, SceneFileError> {
        let shape = self
            .shape
            .ok_or(SceneFileError::MissingShape { line: self.line })?;
        Ok(Geometry::with_object3d(
            Object3D {
                shape,
                position: self.position,
                rotation: self.rotation,
            },
            self.material,
        ))
    }
}

fn primitive<'p>(
    current: &'p mut Option<PendingPrimitive>,
    line: &Line,
) -> Result<&'p mut PendingPrimitive, SceneFileError> {
    current.as_mut().ok_or_else(|| SceneFileError::OutsideBlock {
        line: line.number,
        command: line.command.to_string(),
        block: "NEW_PRIMITIVE",
    })
}

fn light<'l>(current: &'l mut Option<Light>, line: &Line) -> Result<&'l mut Light, SceneFileError> {
    current.as_mut().ok_or_else(|| SceneFileError::OutsideBlock {
        line: line.number,
        command: line.command.to_string(),
        block: "NEW_LIGHT",
    })
}

pub fn parse_file_content(content: &str) -> Result<Scene, SceneFileError> {
    let mut settings = Settings::default();
    let mut camera = Camera::default();
    let mut geometry = vec![];
    let mut lights = vec![];
    let mut current_primitive: Option<PendingPrimitive> = None;
    let mut current_light: Option<Light> = None;

    for (index, raw) in content.lines().enumerate() {
        let text = raw.split('#').next().unwrap_or_default().trim();
        let mut tokens = text.split_whitespace();
        let Some(command) = tokens.next() else {
            continue;
        };
        let line = Line {
            number: index + 1,
            command,
            args: tokens.collect(),
        };

        match line.command {
            "DIMENSIONS" => match line.args.as_slice() {
                [w, h] => {
                    settings.width = line.parse(w)?;
                    settings.height = line.parse(h)?;
                }
                _ => return Err(line.arity_error("2")),
            },
            "BG_COLOR" => settings.bg_color = line.color()?,
            "RAY_DEPTH" => settings.ray_depth = line.count()?,
            "CAMERA_POSITION" => camera.position = line.vector()?,
            "CAMERA_LOOK_AT" => camera.look_at = line.vector()?,
            "CAMERA_UP" => camera.up = line.vector()?,
            "CAMERA_FOCAL_LENGTH" => camera.focal_length = line.float()?,
            "CAMERA_VIEW" => {
                let v = line.floats(2)?;
                camera.width = v[0];
                camera.height = v[1];
            }
            "REX" => settings.rex = line.flag()?,
            "REX_RESOLUTION" => settings.rex_resolution = line.count()?,
            "REX_ACCURACY" => settings.rex_accuracy = line.count()?,
            "REX_CASCADE" => settings.rex_cascade = line.count()?,
            "REX_DEPTH" => settings.rex_depth = line.count()?,
            "REX_SPREAD" => settings.rex_spread = line.float()?,
            "SEED" => settings.seed = line.count()?,
            "NEW_PRIMITIVE" => {
                if let Some(pending) = current_primitive.take() {
                    geometry.push(pending.finish()?);
                }
                current_primitive = Some(PendingPrimitive {
                    line: line.number,
                    shape: None,
                    position: Vec3f::zeros(),
                    rotation: UnitQuaternion::identity(),
                    material: Material::default(),
                });
            }
            "SPHERE" => {
                primitive(&mut current_primitive, &line)?.shape =
                    Some(Shape3D::Sphere { r: line.float()? })
            }
            "BOX" => {
                primitive(&mut current_primitive, &line)?.shape =
                    Some(Shape3D::Box { s: line.vector()? })
            }
            "TORUS" => {
                let v = line.floats(2)?;
                primitive(&mut current_primitive, &line)?.shape = Some(Shape3D::Torus {
                    major: v[0],
                    minor: v[1],
                })
            }
            "PLANE" => {
                let v = line.floats(6)?;
                primitive(&mut current_primitive, &line)?.shape = Some(Shape3D::Plane {
                    norm: Vec3f::new(v[0], v[1], v[2]),
                    point: Vec3f::new(v[3], v[4], v[5]),
                })
            }
            "POSITION" => primitive(&mut current_primitive, &line)?.position = line.vector()?,
            "ROTATION" => {
                let v = line.floats(4)?;
                primitive(&mut current_primitive, &line)?.rotation =
                    UnitQuaternion::new_normalize(Quaternion::new(v[3], v[0], v[1], v[2]))
            }
            "DIFFUSE_COLOR" => {
                primitive(&mut current_primitive, &line)?.material.diffuse_color = line.color()?
            }
            "SPECULAR_COLOR" => {
                primitive(&mut current_primitive, &line)?.material.spec_color = line.color()?
            }
            "SPEC" => primitive(&mut current_primitive, &line)?.material.spec = line.float()?,
            "GLOSSINESS" => {
                primitive(&mut current_primitive, &line)?.material.glossiness = line.float()?
            }
            "TRANSPARENCY" => {
                primitive(&mut current_primitive, &line)?.material.transparency = line.float()?
            }
            "REFLECTION" => {
                primitive(&mut current_primitive, &line)?.material.reflection = line.float()?
            }
            "IOR" => primitive(&mut current_primitive, &line)?.material.refraction = line.float()?,
            "NEW_LIGHT" => {
                if let Some(done) = current_light.take() {
                    lights.push(done);
                }
                current_light = Some(Light::default());
            }
            "LIGHT_POSITION" => light(&mut current_light, &line)?.position = line.vector()?,
            "LIGHT_LOOK_AT" => light(&mut current_light, &line)?.look_at = line.vector()?,
            "LIGHT_COLOR" => light(&mut current_light, &line)?.color = line.color()?,
            "LIGHT_INTENSITY" => light(&mut current_light, &line)?.intensity = line.float()?,
            _ => {
                warn!(
                    "line {}: ignoring unknown command {}",
                    line.number, line.command
                );
            }
        }
    }
    if let Some(pending) = current_primitive {
        geometry.push(pending.finish()?);
    }
    if let Some(done) = current_light {
        lights.push(done);
    }
    Ok(Scene::new(geometry, lights, camera, settings)?)
}

pub fn load_scene(path: &Path) -> Result<Scene, SceneFileError> {
    let content = fs::read_to_string(path)?;
    parse_file_content(&content)
}
