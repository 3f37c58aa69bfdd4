use crate::frame::{Orrery, Renderer};
use crate::panel::{ControlPanel, PANEL_WIDTH};
use crate::projector::Viewport;
use crate::raster::{draw_scene, DepthBuffer};
use crate::term::Terminal;
use anyhow::Result;

pub(crate) const MIN_COLS: u16 = 64;
pub(crate) const MIN_ROWS: u16 = 22;

pub(crate) fn scene_viewport(cols: u16, rows: u16) -> Viewport {
    let panel = PANEL_WIDTH.min(cols / 2);
    Viewport::new(cols.saturating_sub(panel).max(1) as f32, rows.max(1) as f32)
}

pub(crate) struct TerminalRenderer {
    term: Terminal,
    depth: DepthBuffer,
    pub(crate) panel: ControlPanel,
    fps: f32,
}

impl TerminalRenderer {
    pub(crate) fn begin(panel: ControlPanel) -> Result<Self> {
        let term = Terminal::begin()?;
        let vp = scene_viewport(term.cols, term.rows);
        Ok(Self {
            depth: DepthBuffer::new(vp.width as u16, vp.height as u16),
            term,
            panel,
            fps: 0.0,
        })
    }

    pub(crate) fn end(&mut self) -> Result<()> {
        self.term.end()
    }

    pub(crate) fn resize_if_needed(&mut self) -> Result<Option<Viewport>> {
        if !self.term.resize_if_needed()? {
            return Ok(None);
        }
        Ok(Some(scene_viewport(self.term.cols, self.term.rows)))
    }

    pub(crate) fn viewport(&self) -> Viewport {
        scene_viewport(self.term.cols, self.term.rows)
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, frame: &Orrery) -> Result<()> {
        let dt = frame.last_delta();
        if dt > 0.0 {
            let inst = 1.0 / dt;
            self.fps = if self.fps == 0.0 { inst } else { self.fps * 0.9 + inst * 0.1 };
        }

        let buf = &mut self.term.cur;
        draw_scene(buf, &mut self.depth, frame);
        let panel_x = frame.viewport().width as u16;
        self.panel.draw(buf, panel_x, frame, self.fps);
        self.term.present()
    }
}
