use crate::body::BodyId;
use crate::camera::CELL_ASPECT;
use crate::config::Settings;
use crate::controls::Control;
use crate::frame::{FrameClock, Orrery};
use crate::input::{collect_input_nonblocking, UiAction};
use crate::panel::{ControlPanel, PanelHit};
use crate::render::{TerminalRenderer, MIN_COLS, MIN_ROWS};
use crate::scene::{Scene, PLANETS};
use anyhow::{bail, Context, Result};
use crossterm::tty::IsTty;
use rand::{rngs::StdRng, SeedableRng};
use std::f32::consts::TAU;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const STATS_EVERY: u64 = 300;

#[derive(Clone, Copy, Debug)]
enum Drag {
    Camera { col: u16, row: u16 },
    Slider(usize),
}

pub(crate) struct App {
    orrery: Orrery,
    renderer: TerminalRenderer,
    fps: u32,
    drag: Option<Drag>,
    should_quit: bool,
}

impl App {
    fn init(settings: &Settings) -> Result<Self> {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (scene, overlay) = Scene::build(&mut rng, settings.star_count).context("building the scene")?;
        let sliders = slider_bodies(&scene);
        info!(
            bodies = scene.bodies.len(),
            stars = scene.stars.points.len(),
            seed = ?settings.seed,
            "scene built"
        );

        let renderer = TerminalRenderer::begin(ControlPanel::new(sliders))?;
        let orrery = Orrery::new(scene, overlay, settings.initial_view(), renderer.viewport());
        Ok(Self {
            orrery,
            renderer,
            fps: settings.fps(),
            drag: None,
            should_quit: false,
        })
    }

    fn run(&mut self) -> Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.fps as f32);
        let mut clock = FrameClock::start();

        while !self.should_quit {
            let frame_start = Instant::now();
            if let Some(vp) = self.renderer.resize_if_needed()? {
                info!(width = vp.width, height = vp.height, "viewport resized");
                self.orrery.resize(vp);
            }

            for action in collect_input_nonblocking(frame_dt)? {
                self.handle(action);
                if self.should_quit {
                    break;
                }
            }
            if self.should_quit {
                break;
            }

            let delta = clock.tick();
            self.orrery.tick(delta, &mut self.renderer)?;
            if self.orrery.frames() % STATS_EVERY == 0 {
                debug!(
                    frames = self.orrery.frames(),
                    delta,
                    camera_distance = self.orrery.controls.distance(&self.orrery.camera),
                    camera_settled = self.orrery.controls.is_settled(),
                    "frame stats"
                );
            }

            spin_sleep(frame_dt, frame_start);
        }
        Ok(())
    }

    fn handle(&mut self, action: UiAction) {
        match action {
            UiAction::Quit => self.should_quit = true,
            UiAction::TogglePause => self.orrery.apply(Control::TogglePause),
            UiAction::ResetView => self.orrery.apply(Control::ResetView),
            UiAction::ToggleOrbits => self.orrery.apply(Control::ToggleOrbits),
            UiAction::ToggleLabels => self.orrery.apply(Control::ToggleLabels),
            UiAction::ToggleDarkMode => self.orrery.apply(Control::ToggleDarkMode),
            UiAction::SelectSlider(i) => self.renderer.panel.select(i),
            UiAction::SelectNext => self.renderer.panel.select_next(),
            UiAction::SelectPrev => self.renderer.panel.select_prev(),
            UiAction::NudgeSelected(steps) => {
                if let Some(body) = self.renderer.panel.selected_body() {
                    self.orrery.apply(Control::NudgeSpeed { body, steps });
                }
            }
            UiAction::Rotate { left, up } => {
                self.orrery.controls.rotate_left(left);
                self.orrery.controls.rotate_up(up);
            }
            UiAction::DollyIn(factor) => self.orrery.controls.dolly_in(factor),
            UiAction::DollyOut(factor) => self.orrery.controls.dolly_out(factor),
            UiAction::PointerMoved { col, row } => self.pointer_at(col, row),
            UiAction::PointerDown { col, row } => self.pointer_down(col, row),
            UiAction::PointerDrag { col, row } => self.pointer_drag(col, row),
            UiAction::PointerUp => self.drag = None,
        }
    }

    fn in_viewport(&self, col: u16) -> bool {
        (col as f32) < self.orrery.viewport().width
    }

    fn pointer_at(&mut self, col: u16, row: u16) {
        let at = self
            .in_viewport(col)
            .then(|| (col as f32 + 0.5, row as f32 + 0.5));
        self.orrery.set_pointer(at);
    }

    fn pointer_down(&mut self, col: u16, row: u16) {
        if self.in_viewport(col) {
            self.drag = Some(Drag::Camera { col, row });
            return;
        }
        match self.renderer.panel.hit(col, row) {
            Some(PanelHit::Control(c)) => self.orrery.apply(c),
            Some(PanelHit::Select(i)) => self.renderer.panel.select(i),
            Some(PanelHit::Slider { index, value }) => {
                self.set_slider(index, value);
                self.drag = Some(Drag::Slider(index));
            }
            None => {}
        }
    }

    fn pointer_drag(&mut self, col: u16, row: u16) {
        match self.drag {
            Some(Drag::Camera { col: c0, row: r0 }) => {
                // a full-height drag turns the camera once around
                let rows = self.orrery.viewport().height.max(1.0);
                let dx = col as f32 - c0 as f32;
                let dy = row as f32 - r0 as f32;
                self.orrery.controls.rotate_left(TAU * dx / (rows * CELL_ASPECT));
                self.orrery.controls.rotate_up(TAU * dy / rows);
                self.drag = Some(Drag::Camera { col, row });
            }
            Some(Drag::Slider(index)) => {
                if let Some(value) = self.renderer.panel.drag_slider(index, col) {
                    self.set_slider(index, value);
                }
            }
            None => {}
        }
    }

    fn set_slider(&mut self, index: usize, value: f32) {
        self.renderer.panel.select(index);
        if let Some(body) = self.renderer.panel.slider_body(index) {
            self.orrery.apply(Control::SetSpeed { body, value });
        }
    }
}

fn slider_bodies(scene: &Scene) -> Vec<(BodyId, &'static str)> {
    PLANETS
        .iter()
        .filter_map(|p| scene.bodies.by_name(p.name).map(|id| (id, p.name)))
        .collect()
}

pub(crate) fn run(settings: Settings) -> Result<()> {
    if !io::stdout().is_tty() {
        bail!("solarscope needs an interactive terminal on stdout");
    }
    let (cols, rows) = crossterm::terminal::size().context("querying terminal size")?;
    if cols < MIN_COLS || rows < MIN_ROWS {
        bail!("terminal is {cols}x{rows}; solarscope needs at least {MIN_COLS}x{MIN_ROWS}");
    }
    info!(cols, rows, fps = settings.fps(), "starting");

    let mut app = App::init(&settings)?;
    let res = app.run();
    // restore the terminal even when the loop failed
    let end = app.renderer.end();
    info!(frames = app.orrery.frames(), "stopped");
    res.and(end)
}

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sliders_resolve_planets_by_name_in_table_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let (scene, _) = Scene::build(&mut rng, 0).unwrap();
        let sliders = slider_bodies(&scene);
        let names: Vec<_> = sliders.iter().map(|(_, name)| *name).collect();
        let expected: Vec<_> = PLANETS.iter().map(|p| p.name).collect();
        assert_eq!(names, expected);
        for (id, name) in sliders {
            let body = scene.bodies.get(id).unwrap();
            assert_eq!(body.name, name);
            assert!(!body.is_star());
        }
    }
}
