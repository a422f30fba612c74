// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Cell {
    pub fn blank(bg: Option<Color>) -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg,
            bold: false,
        }
    }
}

/// A screen-sized cell buffer, rebuilt every tick.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    bg: Option<Color>,
    touched: usize,
}

impl Frame {
    pub fn new(width: u16, height: u16, bg: Option<Color>) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::blank(bg); len],
            bg,
            touched: 0,
        }
    }

    #[allow(dead_code)]
    pub fn bg(&self) -> Option<Color> {
        self.bg
    }

    pub fn clear(&mut self, bg: Option<Color>) {
        self.bg = bg;
        self.cells.fill(Cell::blank(bg));
        self.touched = 0;
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of `set` calls that landed since the last clear.
    #[allow(dead_code)]
    pub fn touched(&self) -> usize {
        self.touched
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
            self.touched += 1;
        }
    }

    /// Writes `text` left to right from `(x, y)`, clipped at the right edge.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, fg: Option<Color>) {
        let bg = self.bg;
        for (i, ch) in text.chars().enumerate() {
            let Some(cx) = x.checked_add(i as u16) else {
                break;
            };
            if cx >= self.width {
                break;
            }
            self.set(
                cx,
                y,
                Cell {
                    ch,
                    fg,
                    bg,
                    bold: false,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_every_cell_to_background() {
        let mut f = Frame::new(3, 2, None);
        f.set(
            1,
            1,
            Cell {
                ch: 'x',
                fg: None,
                bg: None,
                bold: true,
            },
        );
        assert_eq!(f.get(1, 1).map(|c| c.ch), Some('x'));
        assert_eq!(f.touched(), 1);

        f.clear(Some(Color::Black));
        assert_eq!(f.get(1, 1), Some(&Cell::blank(Some(Color::Black))));
        assert_eq!(f.touched(), 0);
    }

    #[test]
    fn writes_outside_the_frame_are_dropped() {
        let mut f = Frame::new(2, 2, None);
        f.set(2, 0, Cell::blank(Some(Color::Red)));
        f.set(0, 5, Cell::blank(Some(Color::Red)));
        assert_eq!(f.touched(), 0);
        assert!(f.get(2, 0).is_none());
    }

    #[test]
    fn put_str_clips_at_the_right_edge() {
        let mut f = Frame::new(4, 1, None);
        f.put_str(2, 0, "abcdef", None);
        assert_eq!(f.get(2, 0).map(|c| c.ch), Some('a'));
        assert_eq!(f.get(3, 0).map(|c| c.ch), Some('b'));
        assert_eq!(f.touched(), 2);
    }
}
