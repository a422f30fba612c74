// Copyright (c) 2026 rezky_nightky

/// Characters used to draw clouds and discharge channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyphs {
    /// Cloud ramp from faint to dense.
    pub cloud: &'static [char],
    pub vertical: char,
    pub horizontal: char,
    /// Rising to the right on screen.
    pub rising: char,
    /// Falling to the right on screen.
    pub falling: char,
    pub strike: char,
}

impl Glyphs {
    pub const ASCII: Glyphs = Glyphs {
        cloud: &['.', ':', 'o', 'O', '@'],
        vertical: '|',
        horizontal: '-',
        rising: '/',
        falling: '\\',
        strike: '*',
    };

    pub const UNICODE: Glyphs = Glyphs {
        cloud: &['·', '∘', '•', '●', '◉'],
        vertical: '│',
        horizontal: '─',
        rising: '╱',
        falling: '╲',
        strike: '✶',
    };

    pub const BLOCKS: Glyphs = Glyphs {
        cloud: &['░', '▒', '▓', '█'],
        vertical: '┃',
        horizontal: '━',
        rising: '╱',
        falling: '╲',
        strike: '█',
    };

    pub fn cloud_glyph(&self, intensity: f32) -> char {
        let last = self.cloud.len().saturating_sub(1);
        let idx = (intensity.clamp(0.0, 1.0) * last as f32).round() as usize;
        self.cloud.get(idx.min(last)).copied().unwrap_or('.')
    }

    /// Glyph for a step of `(dx, dy)` cells, `dy` growing downwards.
    pub fn line_glyph(&self, dx: i32, dy: i32) -> char {
        if dx == 0 && dy == 0 {
            return self.strike;
        }
        let (ax, ay) = (dx.abs(), dy.abs());
        if ax * 2 < ay {
            self.vertical
        } else if ay * 2 < ax {
            self.horizontal
        } else if (dx > 0) == (dy > 0) {
            self.falling
        } else {
            self.rising
        }
    }
}

pub fn glyphs_from_str(spec: &str, default_to_ascii: bool) -> Result<Glyphs, String> {
    let spec = spec.trim().to_ascii_lowercase();
    match spec.as_str() {
        "auto" => Ok(if default_to_ascii {
            Glyphs::ASCII
        } else {
            Glyphs::UNICODE
        }),
        "ascii" => Ok(Glyphs::ASCII),
        "unicode" | "utf8" | "utf-8" => Ok(Glyphs::UNICODE),
        "blocks" => Ok(Glyphs::BLOCKS),
        _ => Err(format!(
            "unsupported charset: {} (allowed: auto, ascii, unicode, blocks)",
            spec
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_selects_ascii_when_non_utf() {
        assert_eq!(glyphs_from_str("auto", true), Ok(Glyphs::ASCII));
        assert_eq!(glyphs_from_str(" Unicode ", true), Ok(Glyphs::UNICODE));
        assert!(glyphs_from_str("katakana", false).is_err());
    }

    #[test]
    fn cloud_ramp_spans_the_intensity_range() {
        let g = Glyphs::ASCII;
        assert_eq!(g.cloud_glyph(0.0), '.');
        assert_eq!(g.cloud_glyph(1.0), '@');
        assert_eq!(g.cloud_glyph(7.0), '@');
    }

    #[test]
    fn line_glyph_follows_slope() {
        let g = Glyphs::ASCII;
        assert_eq!(g.line_glyph(0, 1), '|');
        assert_eq!(g.line_glyph(3, 0), '-');
        assert_eq!(g.line_glyph(1, 1), '\\');
        assert_eq!(g.line_glyph(-1, 1), '/');
        assert_eq!(g.line_glyph(0, 0), '*');
    }
}
