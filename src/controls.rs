use crate::body::BodyId;
use crate::color::Rgb;
use crate::scene::{SCENE_BG_DARK, SCENE_BG_LIGHT};

pub(crate) const PAGE_BG_DARK: Rgb = Rgb::BLACK;
pub(crate) const PAGE_BG_LIGHT: Rgb = Rgb::hex(0xffffff);

pub(crate) const SLIDER_MIN: f32 = 0.0;
pub(crate) const SLIDER_MAX: f32 = 0.1;
pub(crate) const SLIDER_STEP: f32 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RunState {
    Running,
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ViewState {
    pub(crate) paused: bool,
    pub(crate) show_orbits: bool,
    pub(crate) show_labels: bool,
    pub(crate) dark_mode: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            paused: false,
            show_orbits: true,
            show_labels: true,
            dark_mode: true,
        }
    }
}

impl ViewState {
    pub(crate) fn run_state(&self) -> RunState {
        if self.paused {
            RunState::Paused
        } else {
            RunState::Running
        }
    }

    pub(crate) fn pause_caption(&self) -> &'static str {
        if self.paused {
            "Resume"
        } else {
            "Pause"
        }
    }

    pub(crate) fn orbits_caption(&self) -> &'static str {
        if self.show_orbits {
            "Hide Orbits"
        } else {
            "Show Orbits"
        }
    }

    pub(crate) fn labels_caption(&self) -> &'static str {
        if self.show_labels {
            "Hide Labels"
        } else {
            "Show Labels"
        }
    }

    pub(crate) fn page_background(&self) -> Rgb {
        if self.dark_mode {
            PAGE_BG_DARK
        } else {
            PAGE_BG_LIGHT
        }
    }

    pub(crate) fn scene_background(&self) -> Rgb {
        if self.dark_mode {
            SCENE_BG_DARK
        } else {
            SCENE_BG_LIGHT
        }
    }
}

pub(crate) fn snap_speed(v: f32) -> f32 {
    if !v.is_finite() {
        return SLIDER_MIN;
    }
    let steps_per_unit = (1.0 / SLIDER_STEP).round();
    let snapped = (v.clamp(SLIDER_MIN, SLIDER_MAX) * steps_per_unit).round() / steps_per_unit;
    snapped.clamp(SLIDER_MIN, SLIDER_MAX)
}

pub(crate) fn speed_at_fraction(t: f32) -> f32 {
    snap_speed(SLIDER_MIN + t.clamp(0.0, 1.0) * (SLIDER_MAX - SLIDER_MIN))
}

pub(crate) fn speed_fraction(v: f32) -> f32 {
    ((v - SLIDER_MIN) / (SLIDER_MAX - SLIDER_MIN)).clamp(0.0, 1.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Control {
    TogglePause,
    ResetView,
    ToggleOrbits,
    ToggleLabels,
    ToggleDarkMode,
    SetDarkMode(bool),
    SetSpeed { body: BodyId, value: f32 },
    NudgeSpeed { body: BodyId, steps: i32 },
}
