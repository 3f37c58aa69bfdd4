use crate::body::{orbit_position, BodyId, BodyRegistry, CelestialBody, Orbit};
use crate::color::Rgb;
use crate::overlay::Overlay;
use anyhow::{Context, Result};
use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

pub(crate) const DEFAULT_STAR_COUNT: usize = 10_000;
const STARFIELD_EXTENT: f32 = 3000.0;
const ORBIT_SEGMENTS: usize = 100;

pub(crate) const SCENE_BG_DARK: Rgb = Rgb::hex(0x000000);
pub(crate) const SCENE_BG_LIGHT: Rgb = Rgb::hex(0xf0f0f0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MeshId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Material {
    Emissive,
    Lit,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RingDisc {
    pub(crate) inner: f32,
    pub(crate) outer: f32,
    pub(crate) color: Rgb,
    pub(crate) opacity: f32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Glow {
    pub(crate) radius: f32,
    pub(crate) color: Rgb,
    pub(crate) opacity: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct Mesh {
    pub(crate) position: Vec3,
    pub(crate) spin: f32,
    pub(crate) radius: f32,
    pub(crate) color: Rgb,
    pub(crate) material: Material,
    pub(crate) visible: bool,
    pub(crate) ring: Option<RingDisc>,
    pub(crate) glow: Option<Glow>,
}

#[derive(Clone, Debug)]
pub(crate) struct OrbitRing {
    pub(crate) points: Vec<Vec3>,
    pub(crate) color: Rgb,
    pub(crate) opacity: f32,
    pub(crate) visible: bool,
}

impl OrbitRing {
    fn new(radius: f32) -> Self {
        let points = (0..=ORBIT_SEGMENTS)
            .map(|i| orbit_position(radius, TAU * i as f32 / ORBIT_SEGMENTS as f32))
            .collect();
        Self {
            points,
            color: Rgb::hex(0x888888),
            opacity: 0.5,
            visible: true,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Starfield {
    pub(crate) points: Vec<Vec3>,
    pub(crate) color: Rgb,
    pub(crate) opacity: f32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PointLight {
    pub(crate) position: Vec3,
    pub(crate) color: Rgb,
    pub(crate) intensity: f32,
    /// Zero means no falloff.
    pub(crate) range: f32,
}

impl PointLight {
    pub(crate) fn attenuation(&self, at: Vec3) -> f32 {
        if self.range <= 0.0 {
            return 1.0;
        }
        let d = at.distance(self.position);
        let k = (1.0 - d / self.range).clamp(0.0, 1.0);
        k * k
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Lighting {
    pub(crate) ambient: Rgb,
    pub(crate) key: PointLight,
    pub(crate) sun_glow: PointLight,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: Rgb::hex(0x404040),
            key: PointLight {
                position: Vec3::ZERO,
                color: Rgb::WHITE,
                intensity: 1.5,
                range: 0.0,
            },
            sun_glow: PointLight {
                position: Vec3::ZERO,
                color: Rgb::hex(0xffff00),
                intensity: 2.0,
                range: 200.0,
            },
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PlanetSpec {
    pub(crate) name: &'static str,
    pub(crate) color: u32,
    pub(crate) size: f32,
    pub(crate) orbit_radius: f32,
    pub(crate) orbit_speed: f32,
    pub(crate) rotation_speed: f32,
    pub(crate) has_ring: bool,
}

const fn planet(
    name: &'static str,
    color: u32,
    size: f32,
    orbit_radius: f32,
    orbit_speed: f32,
    rotation_speed: f32,
) -> PlanetSpec {
    PlanetSpec {
        name,
        color,
        size,
        orbit_radius,
        orbit_speed,
        rotation_speed,
        has_ring: false,
    }
}

pub(crate) const SUN_NAME: &str = "Sun";
const SUN_RADIUS: f32 = 20.0;
const SUN_ROTATION_SPEED: f32 = 0.01;

pub(crate) const PLANETS: [PlanetSpec; 8] = [
    planet("Mercury", 0x8a8a8a, 5.0, 40.0, 0.04, 0.004),
    planet("Venus", 0xe6c229, 8.0, 60.0, 0.015, 0.002),
    planet("Earth", 0x3498db, 8.5, 80.0, 0.01, 0.02),
    planet("Mars", 0xe67e22, 6.0, 100.0, 0.008, 0.018),
    planet("Jupiter", 0xf1c40f, 18.0, 130.0, 0.002, 0.04),
    PlanetSpec {
        has_ring: true,
        ..planet("Saturn", 0xf39c12, 15.0, 160.0, 0.0009, 0.038)
    },
    planet("Uranus", 0x1abc9c, 12.0, 190.0, 0.0004, 0.03),
    planet("Neptune", 0x2980b9, 11.5, 220.0, 0.0001, 0.032),
];

pub(crate) struct Scene {
    pub(crate) meshes: Vec<Mesh>,
    pub(crate) bodies: BodyRegistry,
    pub(crate) orbit_rings: Vec<OrbitRing>,
    pub(crate) stars: Starfield,
    pub(crate) lighting: Lighting,
    pub(crate) background: Rgb,
}

impl Scene {
    pub(crate) fn build<R: Rng>(rng: &mut R, star_count: usize) -> Result<(Scene, Overlay)> {
        let mut scene = Scene {
            meshes: Vec::with_capacity(PLANETS.len() + 1),
            bodies: BodyRegistry::new(),
            orbit_rings: Vec::with_capacity(PLANETS.len()),
            stars: Starfield {
                points: Vec::new(),
                color: Rgb::WHITE,
                opacity: 0.9,
            },
            lighting: Lighting::default(),
            background: SCENE_BG_DARK,
        };

        scene.add_sun()?;
        for spec in &PLANETS {
            scene.add_planet(spec, rng.gen_range(0.0..TAU))?;
        }
        scene.stars.points = random_starfield(rng, star_count);
        scene.orbit_rings = scene
            .bodies
            .planets()
            .map(|(_, b)| OrbitRing::new(b.orbit_radius()))
            .collect();

        let overlay = Overlay::for_bodies(&scene.bodies);
        Ok((scene, overlay))
    }

    fn push_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    fn add_sun(&mut self) -> Result<BodyId> {
        let color = Rgb::hex(0xffff00);
        let mesh = self.push_mesh(Mesh {
            position: Vec3::ZERO,
            spin: 0.0,
            radius: SUN_RADIUS,
            color,
            material: Material::Emissive,
            visible: true,
            ring: None,
            glow: Some(Glow {
                radius: 22.0,
                color,
                opacity: 0.3,
            }),
        });
        self.bodies
            .insert(CelestialBody::star(SUN_NAME, mesh, SUN_ROTATION_SPEED))
            .context("registering the sun")
    }

    fn add_planet(&mut self, spec: &PlanetSpec, angle: f32) -> Result<BodyId> {
        let orbit = Orbit::new(spec.orbit_radius, spec.orbit_speed, angle);
        let ring = spec.has_ring.then(|| RingDisc {
            inner: spec.size + 2.0,
            outer: spec.size + 5.0,
            color: Rgb::hex(0xcccccc),
            opacity: 0.8,
        });
        let mesh = self.push_mesh(Mesh {
            position: orbit.position(),
            spin: 0.0,
            radius: spec.size,
            color: Rgb::hex(spec.color),
            material: Material::Lit,
            visible: true,
            ring,
            glow: None,
        });
        self.bodies
            .insert(CelestialBody::planet(spec.name, mesh, orbit, spec.rotation_speed))
            .with_context(|| format!("registering planet {}", spec.name))
    }

    pub(crate) fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub(crate) fn body_mesh(&self, id: BodyId) -> Option<&Mesh> {
        self.bodies.get(id).and_then(|b| self.mesh(b.mesh))
    }

    pub(crate) fn advance(&mut self, delta: f32) {
        self.bodies.advance(delta);
        self.sync_meshes();
    }

    fn sync_meshes(&mut self) {
        for (_, body) in self.bodies.iter() {
            if let Some(mesh) = self.meshes.get_mut(body.mesh.0) {
                mesh.position = body.world_position();
                mesh.spin = body.spin;
            }
        }
    }

    pub(crate) fn set_orbits_visible(&mut self, visible: bool) {
        for ring in &mut self.orbit_rings {
            ring.visible = visible;
        }
    }
}

fn random_starfield<R: Rng>(rng: &mut R, count: usize) -> Vec<Vec3> {
    let half = STARFIELD_EXTENT * 0.5;
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn build(seed: u64) -> (Scene, Overlay) {
        let mut rng = StdRng::seed_from_u64(seed);
        Scene::build(&mut rng, 500).unwrap()
    }

    #[test]
    fn test_one_sun_eight_planets() {
        let (scene, _) = build(1);
        assert_eq!(scene.bodies.len(), 9);
        assert_eq!(scene.bodies.planets().count(), 8);
        let sun = scene.bodies.sun().unwrap();
        let sun_body = scene.bodies.get(sun).unwrap();
        assert_eq!(sun_body.name, SUN_NAME);
        assert_eq!(sun_body.orbit_radius(), 0.0);
        assert_eq!(sun_body.rotation_speed, 0.01);
    }

    #[test]
    fn test_planet_constants_match_table() {
        let (scene, _) = build(2);
        for spec in &PLANETS {
            let id = scene.bodies.by_name(spec.name).unwrap();
            let body = scene.bodies.get(id).unwrap();
            let orbit = body.orbit().unwrap();
            assert_eq!(orbit.radius, spec.orbit_radius);
            assert_eq!(orbit.angular_speed, spec.orbit_speed);
            assert_eq!(body.rotation_speed, spec.rotation_speed);
            let mesh = scene.body_mesh(id).unwrap();
            assert_eq!(mesh.radius, spec.size);
            assert_eq!(mesh.color, Rgb::hex(spec.color));
        }
    }

    #[test]
    fn test_only_saturn_has_a_ring() {
        let (scene, _) = build(3);
        let ringed: Vec<_> = scene
            .bodies
            .iter()
            .filter(|(id, _)| scene.body_mesh(*id).unwrap().ring.is_some())
            .map(|(_, b)| b.name)
            .collect();
        assert_eq!(ringed, vec!["Saturn"]);
        let saturn = scene.bodies.by_name("Saturn").unwrap();
        let ring = scene.body_mesh(saturn).unwrap().ring.unwrap();
        assert_eq!(ring.inner, 17.0);
        assert_eq!(ring.outer, 20.0);
    }

    #[test]
    fn test_initial_angles_in_range_and_meshes_placed() {
        let (scene, _) = build(4);
        for (id, body) in scene.bodies.planets() {
            let orbit = body.orbit().unwrap();
            assert!((0.0..TAU).contains(&orbit.angle));
            let mesh = scene.body_mesh(id).unwrap();
            assert!((mesh.position - orbit.position()).length() < 1e-4);
        }
    }

    #[test]
    fn test_starfield_count_and_bounds() {
        let (scene, _) = build(5);
        assert_eq!(scene.stars.points.len(), 500);
        assert!(scene
            .stars
            .points
            .iter()
            .all(|p| p.abs().max_element() <= STARFIELD_EXTENT * 0.5));
    }

    #[test]
    fn test_one_orbit_ring_per_planet() {
        let (scene, _) = build(6);
        assert_eq!(scene.orbit_rings.len(), 8);
        for (ring, (_, body)) in scene.orbit_rings.iter().zip(scene.bodies.planets()) {
            assert_eq!(ring.points.len(), ORBIT_SEGMENTS + 1);
            for p in &ring.points {
                assert!(p.y.abs() < 1e-6);
                assert!((p.length() - body.orbit_radius()).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_overlays_created_for_bodies() {
        let (scene, overlay) = build(7);
        assert_eq!(overlay.labels().len(), scene.bodies.len());
        assert_eq!(overlay.tooltips().len(), 8);
    }

    #[test]
    fn test_advance_moves_meshes_through_handles() {
        let (mut scene, _) = build(8);
        scene.advance(100.0);
        for (id, body) in scene.bodies.iter() {
            let mesh = scene.body_mesh(id).unwrap();
            assert!((mesh.position - body.world_position()).length() < 1e-4);
            assert_eq!(mesh.spin, body.spin);
        }
        let sun = scene.bodies.sun().unwrap();
        assert_eq!(scene.body_mesh(sun).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn test_point_light_falloff() {
        let l = Lighting::default();
        assert_eq!(l.key.attenuation(Vec3::new(1000.0, 0.0, 0.0)), 1.0);
        assert_eq!(l.sun_glow.attenuation(Vec3::ZERO), 1.0);
        assert_eq!(l.sun_glow.attenuation(Vec3::new(250.0, 0.0, 0.0)), 0.0);
    }
}
