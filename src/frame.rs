use crate::body::BodyId;
use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::controls::{snap_speed, Control, RunState, ViewState, SLIDER_STEP};
use crate::overlay::{HoverEvent, Overlay};
use crate::projector::{CameraProjector, Viewport};
use crate::scene::Scene;
use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub(crate) const MAX_FRAME_DELTA: f32 = 0.25;

/// Draws a finished frame. Called exactly once per tick.
pub(crate) trait Renderer {
    fn render(&mut self, frame: &Orrery) -> Result<()>;
}

#[derive(Debug)]
pub(crate) struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub(crate) fn start() -> Self {
        Self { last: Instant::now() }
    }

    pub(crate) fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = capped_delta(now.saturating_duration_since(self.last));
        self.last = now;
        dt
    }
}

pub(crate) fn capped_delta(elapsed: Duration) -> f32 {
    elapsed.as_secs_f32().min(MAX_FRAME_DELTA)
}

pub(crate) struct Orrery {
    pub(crate) scene: Scene,
    pub(crate) overlay: Overlay,
    pub(crate) view: ViewState,
    pub(crate) camera: PerspectiveCamera,
    pub(crate) controls: OrbitControls,
    viewport: Viewport,
    pointer: Option<(f32, f32)>,
    frames: u64,
    last_delta: f32,
}

impl Orrery {
    pub(crate) fn new(mut scene: Scene, mut overlay: Overlay, view: ViewState, viewport: Viewport) -> Self {
        let mut camera = PerspectiveCamera::default();
        camera.fit_viewport(viewport);
        let controls = OrbitControls::new(&camera);
        scene.set_orbits_visible(view.show_orbits);
        scene.background = view.scene_background();
        overlay.set_labels_visible(view.show_labels);
        Self {
            scene,
            overlay,
            view,
            camera,
            controls,
            viewport,
            pointer: None,
            frames: 0,
            last_delta: 0.0,
        }
    }

    pub(crate) fn run_state(&self) -> RunState {
        self.view.run_state()
    }

    pub(crate) fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub(crate) fn frames(&self) -> u64 {
        self.frames
    }

    pub(crate) fn last_delta(&self) -> f32 {
        self.last_delta
    }

    pub(crate) fn projector(&self) -> CameraProjector {
        CameraProjector::new(&self.camera, self.viewport)
    }

    pub(crate) fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.fit_viewport(viewport);
    }

    pub(crate) fn tick<R: Renderer>(&mut self, delta: f32, renderer: &mut R) -> Result<()> {
        let delta = delta.max(0.0);
        if !self.view.paused {
            self.scene.advance(delta);
        }
        self.controls.update(&mut self.camera);

        let projector = self.projector();
        self.overlay.update(&self.scene, &projector, self.view.show_labels);
        // bodies move under a still pointer too
        for ev in self.overlay.pointer_moved(self.pointer) {
            log_hover(ev);
        }

        self.frames += 1;
        self.last_delta = delta;
        renderer.render(self)
    }

    pub(crate) fn set_pointer(&mut self, at: Option<(f32, f32)>) {
        self.pointer = at;
        for ev in self.overlay.pointer_moved(at) {
            log_hover(ev);
        }
    }

    pub(crate) fn apply(&mut self, control: Control) {
        match control {
            Control::TogglePause => {
                self.view.paused = !self.view.paused;
                info!(state = ?self.view.run_state(), "animation toggled");
            }
            Control::ResetView => {
                self.controls.reset(&mut self.camera);
                info!("camera reset");
            }
            Control::ToggleOrbits => {
                self.view.show_orbits = !self.view.show_orbits;
                self.scene.set_orbits_visible(self.view.show_orbits);
                debug!(visible = self.view.show_orbits, "orbit paths");
            }
            Control::ToggleLabels => {
                self.view.show_labels = !self.view.show_labels;
                self.overlay.set_labels_visible(self.view.show_labels);
                debug!(visible = self.view.show_labels, "labels");
            }
            Control::ToggleDarkMode => self.set_dark_mode(!self.view.dark_mode),
            Control::SetDarkMode(on) => self.set_dark_mode(on),
            Control::SetSpeed { body, value } => self.set_speed(body, value),
            Control::NudgeSpeed { body, steps } => {
                if let Some(current) = self.speed_of(body) {
                    self.set_speed(body, current + steps as f32 * SLIDER_STEP);
                }
            }
        }
    }

    pub(crate) fn speed_of(&self, body: BodyId) -> Option<f32> {
        self.scene
            .bodies
            .get(body)
            .and_then(|b| b.orbit())
            .map(|o| o.angular_speed)
    }

    fn set_speed(&mut self, body: BodyId, value: f32) {
        let value = snap_speed(value);
        if self.scene.bodies.set_angular_speed(body, value) {
            debug!(body = body.0, speed = value, "orbit speed set");
        }
    }

    fn set_dark_mode(&mut self, on: bool) {
        self.view.dark_mode = on;
        self.scene.background = self.view.scene_background();
        debug!(dark = on, "theme");
    }
}

fn log_hover(ev: HoverEvent) {
    match ev {
        HoverEvent::Enter(id) => debug!(body = id.0, "pointer enter"),
        HoverEvent::Leave(id) => debug!(body = id.0, "pointer leave"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[derive(Default)]
    struct Recorder {
        calls: usize,
        earth_angles: Vec<f32>,
    }

    impl Renderer for Recorder {
        fn render(&mut self, frame: &Orrery) -> Result<()> {
            self.calls += 1;
            let earth = frame.scene.bodies.by_name("Earth").unwrap();
            let angle = frame.scene.bodies.get(earth).unwrap().orbit().unwrap().angle;
            self.earth_angles.push(angle);
            Ok(())
        }
    }

    fn orrery() -> Orrery {
        let mut rng = StdRng::seed_from_u64(3);
        let (scene, overlay) = Scene::build(&mut rng, 0).unwrap();
        Orrery::new(scene, overlay, ViewState::default(), Viewport::new(120.0, 40.0))
    }

    fn earth(o: &Orrery) -> BodyId {
        o.scene.bodies.by_name("Earth").unwrap()
    }

    fn earth_angle(o: &Orrery) -> f32 {
        o.scene.bodies.get(earth(o)).unwrap().orbit().unwrap().angle
    }

    #[test]
    fn test_running_tick_advances_by_speed_times_delta() {
        let mut o = orrery();
        let mut r = Recorder::default();
        let before = earth_angle(&o);
        o.tick(0.5, &mut r).unwrap();
        let moved = crate::body::wrap_angle(earth_angle(&o) - before);
        assert!((moved - 0.01 * 0.5).abs() < 1e-5);
        assert_eq!(r.calls, 1);
        assert_eq!(r.earth_angles, vec![earth_angle(&o)]);
    }

    fn motion(o: &Orrery) -> Vec<(f32, Option<(f32, f32)>)> {
        o.scene
            .bodies
            .iter()
            .map(|(_, b)| (b.spin, b.orbit().map(|orb| (orb.angle, orb.angular_speed))))
            .collect()
    }

    fn circular_gap(a: f32, b: f32) -> f32 {
        let d = crate::body::wrap_angle(a - b);
        d.min(std::f32::consts::TAU - d)
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let mut o = orrery();
        let mut r = Recorder::default();
        o.tick(0.1, &mut r).unwrap();
        o.apply(Control::TogglePause);
        assert_eq!(o.run_state(), RunState::Paused);
        let frozen = motion(&o);
        for _ in 0..10 {
            o.tick(0.2, &mut r).unwrap();
        }
        assert_eq!(motion(&o), frozen);
        assert_eq!(r.calls, 11);

        o.apply(Control::TogglePause);
        assert_eq!(o.run_state(), RunState::Running);
        let dt = 0.5;
        o.tick(dt, &mut r).unwrap();
        assert_eq!(r.calls, 12);
        let bodies: Vec<_> = o.scene.bodies.iter().map(|(_, b)| b.clone()).collect();
        for (body, (spin, orbit)) in bodies.iter().zip(frozen) {
            let spin_expected = crate::body::wrap_angle(spin + body.rotation_speed * dt);
            assert!(circular_gap(body.spin, spin_expected) < 1e-5, "{} spin", body.name);
            if let Some((angle, speed)) = orbit {
                let expected = crate::body::wrap_angle(angle + speed * dt);
                let now = body.orbit().unwrap().angle;
                assert!(circular_gap(now, expected) < 1e-5, "{} angle", body.name);
            }
        }
    }

    #[test]
    fn test_slider_change_applies_on_next_tick() {
        let mut o = orrery();
        let mut r = Recorder::default();
        let id = earth(&o);
        o.apply(Control::SetSpeed { body: id, value: 0.1 });
        assert_eq!(o.speed_of(id), Some(0.1));
        let before = earth_angle(&o);
        o.tick(1.0, &mut r).unwrap();
        let moved = crate::body::wrap_angle(earth_angle(&o) - before);
        assert!((moved - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_speed_input_is_clamped_and_snapped() {
        let mut o = orrery();
        let id = earth(&o);
        o.apply(Control::SetSpeed { body: id, value: 3.0 });
        assert_eq!(o.speed_of(id), Some(0.1));
        o.apply(Control::SetSpeed { body: id, value: 0.0424 });
        assert!((o.speed_of(id).unwrap() - 0.042).abs() < 1e-7);
        o.apply(Control::NudgeSpeed { body: id, steps: -10 });
        assert!((o.speed_of(id).unwrap() - 0.032).abs() < 1e-6);
        o.apply(Control::NudgeSpeed { body: id, steps: -1000 });
        assert_eq!(o.speed_of(id), Some(0.0));
    }

    #[test]
    fn test_zero_speed_keeps_planet_still() {
        let mut o = orrery();
        let mut r = Recorder::default();
        let id = earth(&o);
        o.apply(Control::SetSpeed { body: id, value: 0.0 });
        let before = earth_angle(&o);
        o.tick(0.25, &mut r).unwrap();
        assert_eq!(earth_angle(&o), before);
    }

    #[test]
    fn test_speed_on_the_sun_is_ignored() {
        let mut o = orrery();
        let sun = o.scene.bodies.sun().unwrap();
        o.apply(Control::SetSpeed { body: sun, value: 0.05 });
        assert_eq!(o.speed_of(sun), None);
    }

    #[test]
    fn test_toggles_twice_restore_state() {
        let mut o = orrery();
        let start = o.view;
        for c in [Control::ToggleOrbits, Control::ToggleLabels, Control::ToggleDarkMode, Control::TogglePause] {
            o.apply(c);
            assert_ne!(o.view, start);
            o.apply(c);
            assert_eq!(o.view, start);
        }
        assert!(o.scene.orbit_rings.iter().all(|r| r.visible));
        assert!(o.overlay.labels().iter().all(|l| l.visible));
    }

    #[test]
    fn test_orbit_toggle_hides_every_ring() {
        let mut o = orrery();
        o.apply(Control::ToggleOrbits);
        assert!(o.scene.orbit_rings.iter().all(|r| !r.visible));
    }

    #[test]
    fn test_label_toggle_applies_before_next_tick() {
        let mut o = orrery();
        o.apply(Control::ToggleLabels);
        assert!(o.overlay.labels().iter().all(|l| !l.visible));
        let mut r = Recorder::default();
        o.tick(0.1, &mut r).unwrap();
        assert!(o.overlay.labels().iter().all(|l| !l.visible));
    }

    #[test]
    fn test_dark_mode_set_is_idempotent() {
        let mut o = orrery();
        o.apply(Control::SetDarkMode(false));
        let bg = o.scene.background;
        o.apply(Control::SetDarkMode(false));
        assert_eq!(o.scene.background, bg);
        assert_eq!(bg, crate::scene::SCENE_BG_LIGHT);
        o.apply(Control::SetDarkMode(true));
        assert_eq!(o.scene.background, crate::scene::SCENE_BG_DARK);
    }

    #[test]
    fn test_camera_keeps_settling_while_paused() {
        let mut o = orrery();
        let mut r = Recorder::default();
        o.apply(Control::TogglePause);
        o.controls.rotate_left(1.0);
        let before = o.camera.position;
        o.tick(0.1, &mut r).unwrap();
        assert!((o.camera.position - before).length() > 1e-3);
    }

    #[test]
    fn test_reset_view_restores_camera() {
        let mut o = orrery();
        let mut r = Recorder::default();
        let home = o.camera.position;
        o.controls.rotate_left(2.0);
        o.controls.dolly_out(2.0);
        for _ in 0..20 {
            o.tick(0.016, &mut r).unwrap();
        }
        assert!((o.camera.position - home).length() > 1.0);
        o.apply(Control::ResetView);
        o.tick(0.016, &mut r).unwrap();
        assert!((o.camera.position - home).length() < 1e-3);
    }

    #[test]
    fn test_initial_view_state_is_applied_to_scene() {
        let mut rng = StdRng::seed_from_u64(9);
        let (scene, overlay) = Scene::build(&mut rng, 0).unwrap();
        let view = ViewState {
            show_orbits: false,
            show_labels: false,
            dark_mode: false,
            ..ViewState::default()
        };
        let o = Orrery::new(scene, overlay, view, Viewport::new(80.0, 24.0));
        assert!(o.scene.orbit_rings.iter().all(|r| !r.visible));
        assert!(o.overlay.labels().iter().all(|l| !l.visible));
        assert_eq!(o.scene.background, crate::scene::SCENE_BG_LIGHT);
    }

    #[test]
    fn test_delta_is_capped() {
        assert_eq!(capped_delta(Duration::from_secs(3)), MAX_FRAME_DELTA);
        assert!((capped_delta(Duration::from_millis(20)) - 0.02).abs() < 1e-6);
    }
}
