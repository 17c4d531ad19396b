use na::UnitQuaternion;
use thiserror::Error;

use crate::aabb::{calculate_aabb, calculate_aabb_for_object, Aabb};
use crate::color::{black, rgb, Color};
use crate::geometry::{intersect_ray_with_object3d, Fp, Object3D, Ray, Shape3D, Vec3f, EPS};
use crate::rex::Rex;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Image dimensions must be positive, got {width}x{height}")]
    Dimensions { width: u32, height: u32 },

    #[error("Camera basis is degenerate (position, look_at and up must span a frame)")]
    DegenerateCamera,
}

#[derive(Clone, Debug)]
pub struct Material {
    pub diffuse_color: Color,
    pub spec_color: Color,
    /// Weight of the specular highlight, no highlight at 0.
    pub spec: Fp,
    pub glossiness: Fp,
    pub transparency: Fp,
    pub reflection: Fp,
    pub refraction: Fp,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            diffuse_color: rgb(1.0, 1.0, 1.0),
            spec_color: rgb(1.0, 1.0, 1.0),
            spec: 0.0,
            glossiness: 16.0,
            transparency: 0.0,
            reflection: 0.0,
            refraction: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Light {
    pub position: Vec3f,
    /// Aim of the cone of rays shot while baking.
    pub look_at: Vec3f,
    pub color: Color,
    pub intensity: Fp,
}

impl Default for Light {
    fn default() -> Self {
        Light {
            position: Vec3f::zeros(),
            look_at: -Vec3f::z(),
            color: rgb(1.0, 1.0, 1.0),
            intensity: 1.0,
        }
    }
}

impl Light {
    pub fn direction(&self) -> Option<Vec3f> {
        (self.look_at - self.position).try_normalize(EPS)
    }
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3f,
    pub look_at: Vec3f,
    pub up: Vec3f,
    pub focal_length: Fp,
    /// Size of the view rectangle at `focal_length`.
    pub width: Fp,
    pub height: Fp,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            position: Vec3f::new(0.0, 0.0, 5.0),
            look_at: Vec3f::zeros(),
            up: Vec3f::y(),
            focal_length: 1.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

impl Camera {
    /// `(forward, right, up)`; `up` points towards increasing image rows.
    pub fn basis(&self) -> Option<(Vec3f, Vec3f, Vec3f)> {
        let forward = (self.look_at - self.position).try_normalize(EPS)?;
        let right = forward.cross(&self.up).try_normalize(EPS)?;
        let up = forward.cross(&right).try_normalize(EPS)?;
        Some((forward, right, up))
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub width: u32,
    pub height: u32,
    pub bg_color: Color,
    pub ray_depth: i32,
    /// Run the baking pass before rendering.
    pub rex: bool,
    pub rex_resolution: usize,
    pub rex_accuracy: usize,
    pub rex_cascade: usize,
    pub rex_depth: i32,
    /// Half angle of the light cone, in radians.
    pub rex_spread: Fp,
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            width: 640,
            height: 480,
            bg_color: black(),
            ray_depth: 4,
            rex: false,
            rex_resolution: 64,
            rex_accuracy: 10_000,
            rex_cascade: 4,
            rex_depth: 2,
            rex_spread: 0.35,
            seed: 0x5eed,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Geometry {
    pub object3d: Object3D,
    pub material: Material,
    pub aabb: Option<Aabb>,
    pub rex: Option<Rex>,
}

impl Geometry {
    pub fn new(shape: Shape3D, position: Vec3f, material: Material) -> Geometry {
        Geometry::with_object3d(
            Object3D {
                shape,
                position,
                rotation: UnitQuaternion::identity(),
            },
            material,
        )
    }

    pub fn with_object3d(object3d: Object3D, material: Material) -> Geometry {
        Geometry {
            aabb: calculate_aabb_for_object(&object3d),
            object3d,
            material,
            rex: None,
        }
    }

    /// World space hit tagged with this geometry's material and its index in the scene.
    pub fn intersect(&self, ray: &Ray, index: usize) -> Option<Intersection<'_>> {
        let hit = intersect_ray_with_object3d(ray, &self.object3d)?;
        Some(Intersection {
            offset: hit.offset,
            point: hit.point,
            normal: hit.normal,
            u: hit.u,
            v: hit.v,
            material: &self.material,
            geometry: index,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Intersection<'a> {
    pub offset: Fp,
    pub point: Vec3f,
    pub normal: Vec3f,
    pub u: Fp,
    pub v: Fp,
    pub material: &'a Material,
    /// Index into `Scene::geometry`.
    pub geometry: usize,
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub geometry: Vec<Geometry>,
    pub lights: Vec<Light>,
    pub camera: Camera,
    pub settings: Settings,
}

impl Scene {
    pub fn new(
        geometry: Vec<Geometry>,
        lights: Vec<Light>,
        camera: Camera,
        settings: Settings,
    ) -> Result<Scene, SceneError> {
        let scene = Scene {
            geometry,
            lights,
            camera,
            settings,
        };
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        if self.settings.width == 0 || self.settings.height == 0 {
            return Err(SceneError::Dimensions {
                width: self.settings.width,
                height: self.settings.height,
            });
        }
        if self.camera.basis().is_none() {
            return Err(SceneError::DegenerateCamera);
        }
        Ok(())
    }

    pub fn bounds(&self) -> Aabb {
        calculate_aabb(&self.geometry)
    }

    /// Nearest hit with `offset > EPS` over all geometry.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'_>> {
        let mut nearest: Option<Intersection> = None;
        for (index, geometry) in self.geometry.iter().enumerate() {
            if geometry.aabb.as_ref().is_some_and(|aabb| !aabb.hit(ray)) {
                continue;
            }
            if let Some(candidate) = geometry.intersect(ray, index) {
                let closer = nearest
                    .as_ref()
                    .map_or(true, |best| candidate.offset < best.offset);
                if candidate.offset > EPS && closer {
                    nearest = Some(candidate);
                }
            }
        }
        nearest
    }

    /// Binary occlusion: any hit along the ray, at any distance.
    pub fn is_occluded(&self, ray: &Ray) -> bool {
        self.intersect(ray).is_some()
    }

    pub fn rex(&self, index: usize) -> Option<&Rex> {
        self.geometry.get(index).and_then(|geometry| geometry.rex.as_ref())
    }
}
