// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::frame::{Cell, Frame};

/// A horizontal stretch of changed cells sharing one style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Run {
    x: u16,
    y: u16,
    start: usize,
    len: usize,
}

/// Changed runs of `frame` relative to `last`, row by row.
fn diff_runs(last: &[Cell], frame: &Frame) -> Vec<Run> {
    let cells = frame.cells();
    let width = frame.width as usize;
    let mut runs = Vec::new();
    if width == 0 {
        return runs;
    }

    for y in 0..frame.height as usize {
        let row = y * width;
        let mut x = 0usize;
        while x < width {
            let idx = row + x;
            if last.get(idx) == Some(&cells[idx]) {
                x += 1;
                continue;
            }
            let head = cells[idx];
            let mut len = 1;
            while x + len < width {
                let next = cells[idx + len];
                let same_style = next.fg == head.fg && next.bg == head.bg && next.bold == head.bold;
                if !same_style || last.get(idx + len) == Some(&next) {
                    break;
                }
                len += 1;
            }
            runs.push(Run {
                x: x as u16,
                y: y as u16,
                start: idx,
                len,
            });
            x += len;
        }
    }
    runs
}

#[derive(Default)]
struct Pen {
    fg: Option<Color>,
    bg: Option<Color>,
    bold: bool,
}

impl Pen {
    fn apply(&mut self, out: &mut Stdout, cell: &Cell) -> Result<()> {
        if cell.fg != self.fg {
            out.queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            self.fg = cell.fg;
        }
        if cell.bg != self.bg {
            out.queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            self.bg = cell.bg;
        }
        if cell.bold != self.bold {
            out.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            self.bold = cell.bold;
        }
        Ok(())
    }
}

struct LastFrame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

pub struct Terminal {
    stdout: Stdout,
    last: Option<LastFrame>,
    run_buf: String,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore(&mut out);
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            last: None,
            run_buf: String::with_capacity(64),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    /// Forces the next draw to repaint every cell.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Writes the cells that changed since the previous draw.
    pub fn draw(&mut self, frame: &Frame) -> Result<()> {
        let stale = self
            .last
            .as_ref()
            .map(|l| l.width != frame.width || l.height != frame.height)
            .unwrap_or(true);
        if stale {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.last = Some(LastFrame {
                width: frame.width,
                height: frame.height,
                cells: Vec::new(),
            });
        }
        let Some(last) = self.last.as_mut() else {
            return Ok(());
        };

        let cells = frame.cells();
        let mut pen = Pen::default();
        let mut cur_pos: Option<(u16, u16)> = None;

        for run in diff_runs(&last.cells, frame) {
            if cur_pos != Some((run.x, run.y)) {
                self.stdout.queue(cursor::MoveTo(run.x, run.y))?;
            }
            pen.apply(&mut self.stdout, &cells[run.start])?;

            self.run_buf.clear();
            self.run_buf
                .extend(cells[run.start..run.start + run.len].iter().map(|c| c.ch));
            self.stdout.queue(Print(self.run_buf.as_str()))?;

            let next_x = run.x.saturating_add(run.len as u16);
            cur_pos = (next_x < frame.width).then_some((next_x, run.y));
        }

        last.cells.clear();
        last.cells.extend_from_slice(cells);

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()
    }
}

fn restore(out: &mut Stdout) {
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

impl Drop for Terminal {
    fn drop(&mut self) {
        restore(&mut self.stdout);
    }
}

pub fn restore_terminal_best_effort() {
    restore(&mut stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(ch: char) -> Cell {
        Cell {
            ch,
            fg: Some(Color::White),
            bg: None,
            bold: false,
        }
    }

    #[test]
    fn first_draw_covers_every_row() {
        let f = Frame::new(4, 3, None);
        let runs = diff_runs(&[], &f);
        assert_eq!(runs.len(), 3);
        assert!(runs.iter().all(|r| r.x == 0 && r.len == 4));
    }

    #[test]
    fn unchanged_frame_emits_nothing() {
        let mut f = Frame::new(5, 2, None);
        f.set(2, 1, glyph('x'));
        let last = f.cells().to_vec();
        assert!(diff_runs(&last, &f).is_empty());
    }

    #[test]
    fn runs_split_on_style_changes() {
        let f0 = Frame::new(6, 1, None);
        let last = f0.cells().to_vec();

        let mut f = f0.clone();
        f.set(1, 0, glyph('a'));
        f.set(2, 0, glyph('b'));
        f.set(
            3,
            0,
            Cell {
                bold: true,
                ..glyph('c')
            },
        );
        let runs = diff_runs(&last, &f);
        assert_eq!(
            runs,
            vec![
                Run {
                    x: 1,
                    y: 0,
                    start: 1,
                    len: 2
                },
                Run {
                    x: 3,
                    y: 0,
                    start: 3,
                    len: 1
                },
            ]
        );
    }
}
