use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::time::Duration;

pub(crate) const KEY_ROTATE_STEP: f32 = 0.08;
pub(crate) const KEY_DOLLY_FACTOR: f32 = 1.10;
pub(crate) const WHEEL_DOLLY_FACTOR: f32 = 1.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum UiAction {
    Quit,
    TogglePause,
    ResetView,
    ToggleOrbits,
    ToggleLabels,
    ToggleDarkMode,
    SelectSlider(usize),
    SelectNext,
    SelectPrev,
    NudgeSelected(i32),
    Rotate { left: f32, up: f32 },
    DollyIn(f32),
    DollyOut(f32),
    PointerMoved { col: u16, row: u16 },
    PointerDown { col: u16, row: u16 },
    PointerDrag { col: u16, row: u16 },
    PointerUp,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<UiAction>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Some(action) = map_event(event::read()?) {
            out.push(action);
            if out.len() >= 32 {
                break;
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event(ev: Event) -> Option<UiAction> {
    match ev {
        Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => map_key(k),
        Event::Mouse(m) => map_mouse(m),
        _ => None,
    }
}

fn map_key(k: KeyEvent) -> Option<UiAction> {
    if k.modifiers.contains(KeyModifiers::CONTROL) && matches!(k.code, KeyCode::Char('c')) {
        return Some(UiAction::Quit);
    }
    let action = match k.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => UiAction::Quit,
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') => UiAction::TogglePause,
        KeyCode::Char('r') | KeyCode::Char('R') => UiAction::ResetView,
        KeyCode::Char('o') | KeyCode::Char('O') => UiAction::ToggleOrbits,
        KeyCode::Char('l') | KeyCode::Char('L') => UiAction::ToggleLabels,
        KeyCode::Char('d') | KeyCode::Char('D') => UiAction::ToggleDarkMode,
        KeyCode::Char(c @ '1'..='8') => UiAction::SelectSlider(c as usize - '1' as usize),
        KeyCode::Tab => UiAction::SelectNext,
        KeyCode::BackTab => UiAction::SelectPrev,
        KeyCode::Char('+') | KeyCode::Char('=') => UiAction::NudgeSelected(1),
        KeyCode::Char('-') | KeyCode::Char('_') => UiAction::NudgeSelected(-1),
        KeyCode::Char(']') => UiAction::NudgeSelected(10),
        KeyCode::Char('[') => UiAction::NudgeSelected(-10),
        KeyCode::Left => UiAction::Rotate { left: KEY_ROTATE_STEP, up: 0.0 },
        KeyCode::Right => UiAction::Rotate { left: -KEY_ROTATE_STEP, up: 0.0 },
        KeyCode::Up => UiAction::Rotate { left: 0.0, up: KEY_ROTATE_STEP },
        KeyCode::Down => UiAction::Rotate { left: 0.0, up: -KEY_ROTATE_STEP },
        KeyCode::Char('w') | KeyCode::Char('W') => UiAction::DollyIn(KEY_DOLLY_FACTOR),
        KeyCode::Char('s') | KeyCode::Char('S') => UiAction::DollyOut(KEY_DOLLY_FACTOR),
        _ => return None,
    };
    Some(action)
}

fn map_mouse(m: MouseEvent) -> Option<UiAction> {
    let (col, row) = (m.column, m.row);
    match m.kind {
        MouseEventKind::Moved => Some(UiAction::PointerMoved { col, row }),
        MouseEventKind::Down(MouseButton::Left) => Some(UiAction::PointerDown { col, row }),
        MouseEventKind::Drag(MouseButton::Left) => Some(UiAction::PointerDrag { col, row }),
        MouseEventKind::Up(MouseButton::Left) => Some(UiAction::PointerUp),
        MouseEventKind::ScrollUp => Some(UiAction::DollyIn(WHEEL_DOLLY_FACTOR)),
        MouseEventKind::ScrollDown => Some(UiAction::DollyOut(WHEEL_DOLLY_FACTOR)),
        _ => None,
    }
}
