use crate::body::BodyId;
use crate::color::Rgb;
use crate::controls::{speed_at_fraction, speed_fraction, Control, RunState};
use crate::frame::Orrery;
use crate::term::{draw_box, CellBuffer, TextStyle};

pub(crate) const PANEL_WIDTH: u16 = 32;
const BAR_WIDTH: u16 = 12;
const NAME_WIDTH: u16 = 8;
const EDGE: Rgb = Rgb::hex(0x505f78);

const HELP: [&str; 4] = [
    "p pause  r reset  o orbits",
    "l labels  d theme  q quit",
    "tab/1-8 pick  +/- [/] speed",
    "arrows/drag orbit  w/s zoom",
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum PanelHit {
    Control(Control),
    Select(usize),
    Slider { index: usize, value: f32 },
}

#[derive(Clone, Copy, Debug)]
enum Target {
    Control(Control),
    Select(usize),
    Track { index: usize, x0: u16 },
}

#[derive(Clone, Copy, Debug)]
struct HitRegion {
    x0: u16,
    x1: u16,
    y: u16,
    target: Target,
}

pub(crate) struct ControlPanel {
    sliders: Vec<(BodyId, &'static str)>,
    selected: usize,
    hits: Vec<HitRegion>,
}

impl ControlPanel {
    pub(crate) fn new(sliders: Vec<(BodyId, &'static str)>) -> Self {
        Self {
            sliders,
            selected: 0,
            hits: Vec::new(),
        }
    }

    pub(crate) fn selected_body(&self) -> Option<BodyId> {
        self.sliders.get(self.selected).map(|(id, _)| *id)
    }

    pub(crate) fn slider_body(&self, index: usize) -> Option<BodyId> {
        self.sliders.get(index).map(|(id, _)| *id)
    }

    pub(crate) fn select(&mut self, index: usize) {
        if index < self.sliders.len() {
            self.selected = index;
        }
    }

    pub(crate) fn select_next(&mut self) {
        if !self.sliders.is_empty() {
            self.selected = (self.selected + 1) % self.sliders.len();
        }
    }

    pub(crate) fn select_prev(&mut self) {
        if !self.sliders.is_empty() {
            self.selected = (self.selected + self.sliders.len() - 1) % self.sliders.len();
        }
    }

    pub(crate) fn hit(&self, col: u16, row: u16) -> Option<PanelHit> {
        let region = self
            .hits
            .iter()
            .find(|h| h.y == row && (h.x0..h.x1).contains(&col))?;
        Some(match region.target {
            Target::Control(c) => PanelHit::Control(c),
            Target::Select(i) => PanelHit::Select(i),
            Target::Track { index, x0 } => PanelHit::Slider {
                index,
                value: track_value(x0, col),
            },
        })
    }

    /// Value for a drag on slider `index` at `col`, pinned to the track ends
    /// once the pointer leaves it. Row does not matter.
    pub(crate) fn drag_slider(&self, index: usize, col: u16) -> Option<f32> {
        self.hits.iter().find_map(|h| match h.target {
            Target::Track { index: i, x0 } if i == index => Some(track_value(x0, col)),
            _ => None,
        })
    }

    pub(crate) fn draw(&mut self, buf: &mut CellBuffer, x0: u16, frame: &Orrery, fps: f32) {
        self.hits.clear();
        let view = frame.view;
        let bg = view.page_background();
        let (fg, dim, accent) = if view.dark_mode {
            (Rgb::hex(0xdcdcdc), Rgb::hex(0x787878), Rgb::hex(0xf1c40f))
        } else {
            (Rgb::hex(0x1e1e1e), Rgb::hex(0x6e6e6e), Rgb::hex(0x2980b9))
        };
        let w = PANEL_WIDTH.min(buf.w.saturating_sub(x0));
        let h = buf.h;
        buf.fill_rect(x0, 0, w, h, bg.to_color());
        draw_box(buf, x0, 0, w, h, EDGE.to_color(), bg.to_color());

        let ix = x0 + 2;
        let max_x = x0 + w.saturating_sub(1);
        let last_row = h.saturating_sub(2);
        let plain = |c: Rgb, bold: bool| TextStyle {
            fg: c.to_color(),
            bg: Some(bg.to_color()),
            bold,
        };
        let text = |buf: &mut CellBuffer, x: u16, y: u16, s: &str, style: TextStyle| {
            if y <= last_row {
                buf.draw_text_clipped(x as i32, y as i32, s, max_x, style);
            }
        };

        let mut y = 1;
        text(buf, ix, y, "Solar System", plain(fg, true));
        y += 1;
        let state = match frame.run_state() {
            RunState::Running => "running",
            RunState::Paused => "paused",
        };
        text(buf, ix, y, &format!("State: {state}  {fps:>4.0} fps"), plain(dim, false));
        y += 2;

        let buttons = [
            (view.pause_caption(), Control::TogglePause),
            ("Reset View", Control::ResetView),
            (view.orbits_caption(), Control::ToggleOrbits),
            (view.labels_caption(), Control::ToggleLabels),
        ];
        for (caption, control) in buttons {
            let label = format!("[ {caption} ]");
            text(buf, ix, y, &label, plain(fg, false));
            self.push_hit(ix, label.chars().count() as u16, y, last_row, Target::Control(control));
            y += 1;
        }
        let checkbox = format!("[{}] Dark Mode", if view.dark_mode { 'x' } else { ' ' });
        text(buf, ix, y, &checkbox, plain(fg, false));
        self.push_hit(
            ix,
            checkbox.chars().count() as u16,
            y,
            last_row,
            Target::Control(Control::SetDarkMode(!view.dark_mode)),
        );
        y += 2;

        text(buf, ix, y, "Orbit Speeds", plain(fg, true));
        y += 1;
        let bar_x = ix + NAME_WIDTH + 1;
        for index in 0..self.sliders.len() {
            let (body, name) = self.sliders[index];
            let speed = frame.speed_of(body).unwrap_or(0.0);
            let selected = index == self.selected;
            let name_style = if selected { plain(accent, true) } else { plain(fg, false) };
            if selected {
                text(buf, x0 + 1, y, ">", plain(accent, true));
            }
            text(buf, ix, y, name, name_style);
            self.push_hit(ix, NAME_WIDTH, y, last_row, Target::Select(index));

            text(buf, bar_x, y, &slider_bar(speed), plain(if selected { accent } else { dim }, false));
            self.push_hit(bar_x, BAR_WIDTH, y, last_row, Target::Track { index, x0: bar_x });
            text(buf, bar_x + BAR_WIDTH + 1, y, &format!("{speed:.4}"), plain(fg, false));
            y += 1;
        }

        y += 1;
        for line in HELP {
            text(buf, ix, y, line, plain(dim, false));
            y += 1;
        }
    }

    fn push_hit(&mut self, x0: u16, width: u16, y: u16, last_row: u16, target: Target) {
        if y <= last_row {
            self.hits.push(HitRegion {
                x0,
                x1: x0 + width,
                y,
                target,
            });
        }
    }
}

fn track_value(x0: u16, col: u16) -> f32 {
    let offset = col.saturating_sub(x0).min(BAR_WIDTH - 1);
    speed_at_fraction(offset as f32 / (BAR_WIDTH - 1) as f32)
}

fn slider_bar(speed: f32) -> String {
    let knob = (speed_fraction(speed) * (BAR_WIDTH - 1) as f32).round() as u16;
    (0..BAR_WIDTH)
        .map(|i| match i.cmp(&knob) {
            std::cmp::Ordering::Less => '━',
            std::cmp::Ordering::Equal => '●',
            std::cmp::Ordering::Greater => '─',
        })
        .collect()
}
