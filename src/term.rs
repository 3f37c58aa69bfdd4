use crossterm::{
    cursor, event, execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.w && y < self.h {
            self.cells.get(self.idx(x, y))
        } else {
            None
        }
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }

    pub(crate) fn fill_rect(&mut self, x0: u16, y0: u16, w: u16, h: u16, bg: Color) {
        for y in y0..y0.saturating_add(h).min(self.h) {
            for x in x0..x0.saturating_add(w).min(self.w) {
                self.set(
                    x,
                    y,
                    Cell {
                        ch: ' ',
                        fg: Color::White,
                        bg,
                        bold: false,
                    },
                );
            }
        }
    }

    pub(crate) fn draw_text_clipped(&mut self, x: i32, y: i32, s: &str, max_x: u16, style: TextStyle) {
        if y < 0 || y >= self.h as i32 {
            return;
        }
        for (i, ch) in s.chars().enumerate() {
            let xx = x + i as i32;
            if xx < 0 {
                continue;
            }
            if xx >= max_x.min(self.w) as i32 {
                break;
            }
            let bg = style.bg.unwrap_or_else(|| {
                self.get(xx as u16, y as u16).map_or(Color::Black, |c| c.bg)
            });
            self.set(
                xx as u16,
                y as u16,
                Cell {
                    ch,
                    fg: style.fg,
                    bg,
                    bold: style.bold,
                },
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn row_text(&self, y: u16) -> String {
        (0..self.w)
            .filter_map(|x| self.get(x, y).map(|c| c.ch))
            .collect()
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct TextStyle {
    pub(crate) fg: Color,
    /// `None` keeps whatever background is already there.
    pub(crate) bg: Option<Color>,
    pub(crate) bold: bool,
}

pub(crate) fn draw_box(buf: &mut CellBuffer, x: u16, y: u16, w: u16, h: u16, fg: Color, bg: Color) {
    if w < 2 || h < 2 {
        return;
    }
    let right = x + w - 1;
    let bottom = y + h - 1;
    let mut put = |xx: u16, yy: u16, ch: char| {
        buf.set(xx, yy, Cell { ch, fg, bg, bold: false });
    };
    for xx in x + 1..right {
        put(xx, y, '─');
        put(xx, bottom, '─');
    }
    for yy in y + 1..bottom {
        put(x, yy, '│');
        put(right, yy, '│');
    }
    put(x, y, '┌');
    put(right, y, '┐');
    put(x, bottom, '└');
    put(right, bottom, '┘');
}

pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    full_redraw: bool,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            event::EnableMouseCapture,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            full_redraw: true,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            SetAttribute(Attribute::Reset),
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            event::DisableMouseCapture,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.full_redraw = true;
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        let diff_only = !std::mem::take(&mut self.full_redraw);
        if !diff_only {
            queue!(self.out, Clear(ClearType::All))?;
        }
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_bold != Some(c.bold) {
                    let attr = if c.bold { Attribute::Bold } else { Attribute::NormalIntensity };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = Some(c.bold);
                    // attribute changes can reset colors on some terminals
                    last_fg = None;
                    last_bg = None;
                }
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, SetAttribute(Attribute::Reset), ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_ignores_out_of_bounds() {
        let mut buf = CellBuffer::new(4, 2);
        buf.set(9, 9, Cell { ch: 'x', ..Cell::default() });
        assert!(buf.cells.iter().all(|c| c.ch == ' '));
    }

    #[test]
    fn test_clipped_text_stops_at_limit() {
        let mut buf = CellBuffer::new(10, 1);
        let style = TextStyle { fg: Color::White, bg: None, bold: true };
        buf.draw_text_clipped(-2, 0, "abcdefgh", 4, style);
        assert_eq!(buf.row_text(0), "cdef      ");
        assert!(buf.get(0, 0).unwrap().bold);
    }

    #[test]
    fn test_box_corners() {
        let mut buf = CellBuffer::new(5, 3);
        draw_box(&mut buf, 0, 0, 5, 3, Color::White, Color::Black);
        assert_eq!(buf.row_text(0), "┌───┐");
        assert_eq!(buf.row_text(1), "│   │");
        assert_eq!(buf.row_text(2), "└───┘");
    }
}
