// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::frame::{Cell, Frame};
use crate::geometry::{Domain, Point};
use crate::glyphs::Glyphs;
use crate::palette::{to_terminal, ColorMode, Palette, Rgb};
use crate::scheduler::{Trace, VisualState};

// Mono terminals cannot dim, so faint primitives are skipped instead.
const MONO_CUTOFF: f32 = 0.25;
const MIN_VISIBLE: f32 = 0.02;
const CLOUD_ALPHA: f32 = 0.6;

/// Maps domain coordinates onto a grid of terminal cells (y flipped).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    pub domain: Domain,
}

impl Viewport {
    pub fn new(cols: u16, rows: u16, domain: Domain) -> Self {
        Self { cols, rows, domain }
    }

    pub fn to_cell(&self, p: Point) -> Option<(i32, i32)> {
        if self.cols == 0 || self.rows == 0 || !self.domain.contains(p) {
            return None;
        }
        let fx = (p.x - self.domain.x_min) / self.domain.width();
        let fy = (self.domain.y_max - p.y) / self.domain.height();
        let cx = (fx * (self.cols - 1) as f32).round() as i32;
        let cy = (fy * (self.rows - 1) as f32).round() as i32;
        Some((cx, cy))
    }
}

/// Calls `plot` for every cell on the line from `a` to `b`, both inclusive.
fn for_each_cell(a: (i32, i32), b: (i32, i32), mut plot: impl FnMut(i32, i32)) {
    let (mut x, mut y) = a;
    let dx = (b.0 - a.0).abs();
    let dy = -(b.1 - a.1).abs();
    let sx = if a.0 < b.0 { 1 } else { -1 };
    let sy = if a.1 < b.1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        plot(x, y);
        if (x, y) == b {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Rasterizes visual states into a [`Frame`].
pub struct Scene {
    pub palette: Palette,
    pub glyphs: Glyphs,
    pub color_mode: ColorMode,
    /// Leave the terminal's own background alone.
    pub transparent_bg: bool,
}

impl Scene {
    pub fn new(palette: Palette, glyphs: Glyphs, color_mode: ColorMode, transparent_bg: bool) -> Self {
        Self {
            palette,
            glyphs,
            color_mode,
            transparent_bg,
        }
    }

    fn fg(&self, c: Rgb) -> Option<Color> {
        to_terminal(self.color_mode, c)
    }

    fn cell_bg(&self, state: &VisualState<'_>) -> Option<Color> {
        if self.transparent_bg && state.flash <= 0.0 {
            None
        } else {
            self.fg(state.background)
        }
    }

    /// Draws `state`, reserving the bottom row for `status` when given.
    pub fn render(
        &self,
        state: &VisualState<'_>,
        domain: Domain,
        status: Option<&str>,
        frame: &mut Frame,
    ) {
        let bg = self.cell_bg(state);
        frame.clear(bg);

        let rows = if status.is_some() {
            frame.height.saturating_sub(1)
        } else {
            frame.height
        };
        let view = Viewport::new(frame.width, rows, domain);

        for dot in &state.cloud {
            let Some((x, y)) = view.to_cell(dot.pos) else {
                continue;
            };
            let color = state
                .background
                .lerp(self.palette.cloud(dot.intensity), CLOUD_ALPHA);
            frame.set(
                x as u16,
                y as u16,
                Cell {
                    ch: self.glyphs.cloud_glyph(dot.intensity),
                    fg: self.fg(color),
                    bg,
                    bold: false,
                },
            );
        }

        for b in &state.branches {
            self.draw_trace(frame, &view, state.background, b, self.palette.branch, bg);
        }
        self.draw_trace(
            frame,
            &view,
            state.background,
            &state.leader,
            self.palette.leader,
            bg,
        );
        for s in &state.secondary {
            self.draw_trace(frame, &view, state.background, s, self.palette.secondary, bg);
        }
        self.draw_trace(
            frame,
            &view,
            state.background,
            &state.stroke,
            self.palette.stroke,
            bg,
        );

        if let Some(text) = status {
            let y = frame.height.saturating_sub(1);
            frame.put_str(0, y, text, self.fg(self.palette.status));
        }
    }

    fn draw_trace(
        &self,
        frame: &mut Frame,
        view: &Viewport,
        background: Rgb,
        trace: &Trace<'_>,
        color: Rgb,
        bg: Option<Color>,
    ) {
        if !trace.is_visible() || trace.opacity < MIN_VISIBLE {
            return;
        }
        if self.color_mode == ColorMode::Mono && trace.opacity < MONO_CUTOFF {
            return;
        }

        let fg = self.fg(background.lerp(color, trace.opacity));
        let bold = trace.opacity > 0.5;

        for seg in trace.points.windows(2) {
            let (Some(a), Some(b)) = (view.to_cell(seg[0]), view.to_cell(seg[1])) else {
                continue;
            };
            let ch = self.glyphs.line_glyph(b.0 - a.0, b.1 - a.1);
            for_each_cell(a, b, |x, y| {
                if x < 0 || y < 0 || y >= view.rows as i32 {
                    return;
                }
                frame.set(x as u16, y as u16, Cell { ch, fg, bg, bold });
            });
        }
    }
}
