// Copyright (c) 2026 rezky_nightky

/// A position in domain coordinates (x to the right, y up).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// The fixed plotting rectangle every generated point lives in.
///
/// `y_min` is the floor the leader walks down to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 10.0,
            y_min: 0.0,
            y_max: 10.0,
        }
    }
}

impl Domain {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    pub fn floor(&self) -> f32 {
        self.y_min
    }

    pub fn is_well_formed(&self) -> bool {
        [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.x_min, self.x_max),
            p.y.clamp(self.y_min, self.y_max),
        )
    }

    /// Maps fractions of width/height (0..1) into domain coordinates.
    pub fn at(&self, fx: f32, fy: f32) -> Point {
        Point::new(
            self.x_min + fx * self.width(),
            self.y_min + fy * self.height(),
        )
    }
}
