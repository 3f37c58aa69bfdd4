use crate::scene::MeshId;
use anyhow::{ensure, Result};
use glam::Vec3;
use std::collections::BTreeMap;
use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct BodyId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Orbit {
    pub(crate) radius: f32,
    pub(crate) angular_speed: f32,
    /// Always in [0, 2π).
    pub(crate) angle: f32,
}

impl Orbit {
    pub(crate) fn new(radius: f32, angular_speed: f32, angle: f32) -> Self {
        Self {
            radius,
            angular_speed,
            angle: wrap_angle(angle),
        }
    }

    pub(crate) fn advance(&mut self, delta: f32) {
        self.angle = wrap_angle(self.angle + self.angular_speed * delta);
    }

    pub(crate) fn position(&self) -> Vec3 {
        orbit_position(self.radius, self.angle)
    }
}

pub(crate) fn orbit_position(radius: f32, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(radius * c, 0.0, radius * s)
}

pub(crate) fn wrap_angle(a: f32) -> f32 {
    let w = a.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if w >= TAU {
        0.0
    } else {
        w
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum BodyKind {
    Star,
    Planet(Orbit),
}

#[derive(Clone, Debug)]
pub(crate) struct CelestialBody {
    pub(crate) name: &'static str,
    pub(crate) mesh: MeshId,
    pub(crate) kind: BodyKind,
    pub(crate) rotation_speed: f32,
    pub(crate) spin: f32,
}

impl CelestialBody {
    pub(crate) fn star(name: &'static str, mesh: MeshId, rotation_speed: f32) -> Self {
        Self {
            name,
            mesh,
            kind: BodyKind::Star,
            rotation_speed,
            spin: 0.0,
        }
    }

    pub(crate) fn planet(name: &'static str, mesh: MeshId, orbit: Orbit, rotation_speed: f32) -> Self {
        Self {
            name,
            mesh,
            kind: BodyKind::Planet(orbit),
            rotation_speed,
            spin: 0.0,
        }
    }

    pub(crate) fn is_star(&self) -> bool {
        matches!(self.kind, BodyKind::Star)
    }

    pub(crate) fn orbit(&self) -> Option<&Orbit> {
        match &self.kind {
            BodyKind::Planet(o) => Some(o),
            BodyKind::Star => None,
        }
    }

    pub(crate) fn orbit_mut(&mut self) -> Option<&mut Orbit> {
        match &mut self.kind {
            BodyKind::Planet(o) => Some(o),
            BodyKind::Star => None,
        }
    }

    pub(crate) fn orbit_radius(&self) -> f32 {
        self.orbit().map_or(0.0, |o| o.radius)
    }

    pub(crate) fn world_position(&self) -> Vec3 {
        self.orbit().map_or(Vec3::ZERO, Orbit::position)
    }

    pub(crate) fn advance(&mut self, delta: f32) {
        if let Some(orbit) = self.orbit_mut() {
            orbit.advance(delta);
        }
        self.spin = wrap_angle(self.spin + self.rotation_speed * delta);
    }
}

#[derive(Default, Debug)]
pub(crate) struct BodyRegistry {
    bodies: Vec<CelestialBody>,
    by_name: BTreeMap<&'static str, BodyId>,
}

impl BodyRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Names are unique and at most one star may be registered.
    pub(crate) fn insert(&mut self, body: CelestialBody) -> Result<BodyId> {
        ensure!(
            !self.by_name.contains_key(body.name),
            "body {:?} is already registered",
            body.name
        );
        ensure!(
            !(body.is_star() && self.sun().is_some()),
            "a second star {:?} cannot be registered",
            body.name
        );
        let id = BodyId(self.bodies.len());
        self.by_name.insert(body.name, id);
        self.bodies.push(body);
        Ok(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.bodies.len()
    }

    pub(crate) fn get(&self, id: BodyId) -> Option<&CelestialBody> {
        self.bodies.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: BodyId) -> Option<&mut CelestialBody> {
        self.bodies.get_mut(id.0)
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<BodyId> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn sun(&self) -> Option<BodyId> {
        self.bodies.iter().position(CelestialBody::is_star).map(BodyId)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (BodyId, &CelestialBody)> {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i), b))
    }

    pub(crate) fn planets(&self) -> impl Iterator<Item = (BodyId, &CelestialBody)> {
        self.iter().filter(|(_, b)| !b.is_star())
    }

    /// Returns false for the star or an unknown id.
    pub(crate) fn set_angular_speed(&mut self, id: BodyId, speed: f32) -> bool {
        match self.get_mut(id).and_then(CelestialBody::orbit_mut) {
            Some(orbit) => {
                orbit.angular_speed = speed;
                true
            }
            None => false,
        }
    }

    pub(crate) fn advance(&mut self, delta: f32) {
        for body in &mut self.bodies {
            body.advance(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn registry() -> BodyRegistry {
        let mut reg = BodyRegistry::new();
        reg.insert(CelestialBody::star("Sun", MeshId(0), 0.01)).unwrap();
        reg.insert(CelestialBody::planet("Earth", MeshId(1), Orbit::new(80.0, 0.01, 1.0), 0.02))
            .unwrap();
        reg.insert(CelestialBody::planet("Mars", MeshId(2), Orbit::new(100.0, 0.008, 4.0), 0.018))
            .unwrap();
        reg
    }

    fn angle_diff(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(TAU);
        d.min(TAU - d)
    }

    #[test]
    fn test_position_reconstruction() {
        for &(r, theta) in &[(40.0f32, 0.0f32), (80.0, PI / 2.0), (220.0, 3.7), (1.0, PI)] {
            let p = orbit_position(r, theta);
            assert!((p.x - r * theta.cos()).abs() < 1e-4);
            assert_eq!(p.y, 0.0);
            assert!((p.z - r * theta.sin()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_advance_adds_speed_times_delta() {
        let mut reg = registry();
        let earth = reg.by_name("Earth").unwrap();
        let before = reg.get(earth).unwrap().orbit().unwrap().angle;
        reg.advance(2.5);
        let after = reg.get(earth).unwrap().orbit().unwrap().angle;
        assert!(angle_diff(after, before + 0.01 * 2.5) < 1e-6);
    }

    #[test]
    fn test_angle_stays_in_range() {
        let mut orbit = Orbit::new(10.0, 1.0, 6.0);
        for _ in 0..100 {
            orbit.advance(0.77);
            assert!((0.0..TAU).contains(&orbit.angle));
        }
        assert!((0.0..TAU).contains(&wrap_angle(-1e-9)));
        assert!((Orbit::new(1.0, 0.0, -PI).angle - PI).abs() < 1e-6);
    }

    #[test]
    fn test_star_never_moves_but_spins() {
        let mut reg = registry();
        let sun = reg.sun().unwrap();
        reg.advance(10.0);
        let body = reg.get(sun).unwrap();
        assert_eq!(body.world_position(), Vec3::ZERO);
        assert_eq!(body.orbit_radius(), 0.0);
        assert!((body.spin - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_star_identity_comes_from_kind() {
        let mut reg = BodyRegistry::new();
        reg.insert(CelestialBody::planet("Sun", MeshId(0), Orbit::new(5.0, 0.1, 0.0), 0.0))
            .unwrap();
        assert!(reg.sun().is_none());
        let helios = reg.insert(CelestialBody::star("Helios", MeshId(1), 0.0)).unwrap();
        assert_eq!(reg.sun(), Some(helios));
    }

    #[test]
    fn test_duplicate_name_and_second_star_rejected() {
        let mut reg = registry();
        assert!(reg
            .insert(CelestialBody::planet("Earth", MeshId(9), Orbit::new(1.0, 0.0, 0.0), 0.0))
            .is_err());
        assert!(reg.insert(CelestialBody::star("Sirius", MeshId(9), 0.0)).is_err());
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_set_angular_speed_only_for_planets() {
        let mut reg = registry();
        let sun = reg.sun().unwrap();
        let mars = reg.by_name("Mars").unwrap();
        assert!(!reg.set_angular_speed(sun, 0.05));
        assert!(reg.set_angular_speed(mars, 0.05));
        assert!(!reg.set_angular_speed(BodyId(42), 0.05));
        assert_eq!(reg.get(mars).unwrap().orbit().unwrap().angular_speed, 0.05);
    }

    #[test]
    fn test_planets_skip_the_star_and_keep_order() {
        let reg = registry();
        let names: Vec<_> = reg.planets().map(|(_, b)| b.name).collect();
        assert_eq!(names, vec!["Earth", "Mars"]);
    }
}
