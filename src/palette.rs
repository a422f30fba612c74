// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::settings::Style;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

impl ColorMode {
    pub fn label(self) -> &'static str {
        match self {
            ColorMode::TrueColor => "24-bit truecolor",
            ColorMode::Color256 => "8-bit (256-color)",
            ColorMode::Color16 => "16-color",
            ColorMode::Mono => "mono",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb::new(
            lerp_u8(self.r, other.r, t),
            lerp_u8(self.g, other.g, t),
            lerp_u8(self.b, other.b, t),
        )
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

fn dist2(a: Rgb, b: Rgb) -> i32 {
    let dr = a.r as i32 - b.r as i32;
    let dg = a.g as i32 - b.g as i32;
    let db = a.b as i32 - b.b as i32;
    dr * dr + dg * dg + db * db
}

fn rgb_to_ansi256(c: Rgb) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let level = |v: u8| ((v as u16 * 5 + 127) / 255) as u8;
    let (r6, g6, b6) = (level(c.r), level(c.g), level(c.b));
    let cube = Rgb::new(
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );
    let cube_idx = 16 + 36 * r6 + 6 * g6 + b6;

    let avg = ((c.r as u16 + c.g as u16 + c.b as u16) / 3) as u8;
    let (gray_idx, gray) = match avg {
        0..=7 => (16, Rgb::BLACK),
        239..=255 => (231, Rgb::new(255, 255, 255)),
        _ => {
            let step = (avg - 8) / 10;
            let v = 8 + 10 * step;
            (232 + step, Rgb::new(v, v, v))
        }
    };

    if dist2(c, gray) < dist2(c, cube) {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(c: Rgb) -> Color {
    const TABLE: [(Color, Rgb); 16] = [
        (Color::Black, Rgb::new(0, 0, 0)),
        (Color::DarkGrey, Rgb::new(128, 128, 128)),
        (Color::Grey, Rgb::new(192, 192, 192)),
        (Color::White, Rgb::new(255, 255, 255)),
        (Color::DarkRed, Rgb::new(128, 0, 0)),
        (Color::Red, Rgb::new(255, 0, 0)),
        (Color::DarkGreen, Rgb::new(0, 128, 0)),
        (Color::Green, Rgb::new(0, 255, 0)),
        (Color::DarkBlue, Rgb::new(0, 0, 128)),
        (Color::Blue, Rgb::new(0, 0, 255)),
        (Color::DarkCyan, Rgb::new(0, 128, 128)),
        (Color::Cyan, Rgb::new(0, 255, 255)),
        (Color::DarkMagenta, Rgb::new(128, 0, 128)),
        (Color::Magenta, Rgb::new(255, 0, 255)),
        (Color::DarkYellow, Rgb::new(128, 128, 0)),
        (Color::Yellow, Rgb::new(255, 255, 0)),
    ];

    TABLE
        .iter()
        .min_by_key(|(_, rgb)| dist2(c, *rgb))
        .map(|(color, _)| *color)
        .unwrap_or(Color::White)
}

/// Quantizes `c` for the terminal's color depth. Mono has no colors.
pub fn to_terminal(mode: ColorMode, c: Rgb) -> Option<Color> {
    match mode {
        ColorMode::Mono => None,
        ColorMode::TrueColor => Some(Color::Rgb {
            r: c.r,
            g: c.g,
            b: c.b,
        }),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(c))),
        ColorMode::Color16 => Some(rgb_to_color16(c)),
    }
}

/// Colors of every drawable primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub cloud_dark: Rgb,
    pub cloud_light: Rgb,
    pub leader: Rgb,
    pub branch: Rgb,
    pub stroke: Rgb,
    pub secondary: Rgb,
    pub resting: Rgb,
    pub flash: Rgb,
    pub status: Rgb,
}

impl Palette {
    pub fn for_style(style: Style) -> Self {
        let flash = match style {
            Style::Classic => Rgb::new(0x1a, 0x1a, 0x1a),
            Style::Storm => Rgb::new(0x3c, 0x3c, 0x64),
        };
        Self {
            cloud_dark: Rgb::new(0x40, 0x40, 0x48),
            cloud_light: Rgb::new(0xff, 0xff, 0xff),
            leader: Rgb::new(0x00, 0xff, 0xff),
            branch: Rgb::new(0x00, 0xcc, 0xff),
            stroke: Rgb::new(0xff, 0xff, 0xff),
            secondary: Rgb::new(0xcc, 0xee, 0xff),
            resting: Rgb::BLACK,
            flash,
            status: Rgb::new(0x80, 0x80, 0x90),
        }
    }

    pub fn cloud(&self, intensity: f32) -> Rgb {
        self.cloud_dark.lerp(self.cloud_light, intensity)
    }

    /// Background for a flash level in `[0, 1]`.
    pub fn background(&self, flash: f32) -> Rgb {
        self.resting.lerp(self.flash, flash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_hits_both_ends_and_clamps() {
        let a = Rgb::new(0, 100, 200);
        let b = Rgb::new(200, 100, 0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 7.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(100, 100, 100));
    }

    #[test]
    fn ansi256_picks_grays_and_cube_colors() {
        assert_eq!(rgb_to_ansi256(Rgb::BLACK), 16);
        assert_eq!(rgb_to_ansi256(Rgb::new(255, 255, 255)), 231);
        assert_eq!(rgb_to_ansi256(Rgb::new(0, 255, 255)), 51);
        assert_eq!(rgb_to_ansi256(Rgb::new(0x1a, 0x1a, 0x1a)), 233);
    }

    #[test]
    fn color16_snaps_to_nearest() {
        assert_eq!(rgb_to_color16(Rgb::new(10, 240, 250)), Color::Cyan);
        assert_eq!(rgb_to_color16(Rgb::new(20, 20, 20)), Color::Black);
    }

    #[test]
    fn mono_has_no_foreground() {
        assert_eq!(to_terminal(ColorMode::Mono, Rgb::new(1, 2, 3)), None);
        assert_eq!(
            to_terminal(ColorMode::TrueColor, Rgb::new(1, 2, 3)),
            Some(Color::Rgb { r: 1, g: 2, b: 3 })
        );
    }

    #[test]
    fn background_rests_dark_without_flash() {
        let p = Palette::for_style(Style::Storm);
        assert_eq!(p.background(0.0), p.resting);
        assert_eq!(p.background(1.0), p.flash);
    }
}
