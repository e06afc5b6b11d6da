use super::point::Point;

/// Axis-aligned box in database units. `min` is inclusive, `max` exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min: Point<i64>,
    pub max: Point<i64>,
}

impl Rect {
    pub fn new(min: Point<i64>, max: Point<i64>) -> Self {
        Self { min, max }
    }

    pub fn from_coords(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self::new(
            Point::new(x1.min(x2), y1.min(y2)),
            Point::new(x1.max(x2), y1.max(y2)),
        )
    }

    pub fn width(&self) -> i64 {
        self.max.x - self.min.x
    }
    pub fn height(&self) -> i64 {
        self.max.y - self.min.y
    }
    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains(&self, p: Point<i64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Grows the box by `dx` on the left and right and by `dy` on the bottom and top.
    pub fn bloat(&self, dx: i64, dy: i64) -> Rect {
        Rect::new(
            Point::new(self.min.x - dx, self.min.y - dy),
            Point::new(self.max.x + dx, self.max.y + dy),
        )
    }

    /// True when the open Y spans of the two boxes intersect.
    pub fn overlaps_y(&self, other: &Rect) -> bool {
        self.min.y < other.max.y && self.max.y > other.min.y
    }
}
