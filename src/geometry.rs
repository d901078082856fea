//! Geometric primitives used for placement on page media boxes.

/// A 2D point in page space (PDF points, origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in page space.
///
/// `x`/`y` name the lower-left corner, matching PDF user-space
/// conventions; `width`/`height` extend right and up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// X coordinate of the lower-left corner
    pub x: f32,
    /// Y coordinate of the lower-left corner
    pub y: f32,
    /// Width of the rectangle
    pub width: f32,
    /// Height of the rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from lower-left corner and dimensions.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points (llx, lly, urx, ury).
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// Left edge x-coordinate.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge x-coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate.
    pub fn bottom(&self) -> f32 {
        self.y
    }

    /// Top edge y-coordinate.
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Whether `other` lies entirely within this rectangle (edges count as inside).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.bottom() >= self.bottom()
            && other.right() <= self.right()
            && other.top() <= self.top()
    }

    /// As a `[llx, lly, urx, ury]` array, the form PDF `/Rect` entries take.
    pub fn to_pdf_array(&self) -> [f32; 4] {
        [self.x, self.y, self.right(), self.top()]
    }

    /// As a `[x, y, width, height]` array, used in error reports.
    pub fn to_xywh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.left(), 10.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 20.0);
        assert_eq!(r.top(), 70.0);
    }

    #[test]
    fn test_rect_from_corners() {
        let r = Rect::from_corners(0.0, 0.0, 612.0, 792.0);
        assert_eq!(r.width, 612.0);
        assert_eq!(r.height, 792.0);
        // Swapped corners normalize
        let s = Rect::from_corners(612.0, 792.0, 0.0, 0.0);
        assert_eq!(s, r);
    }

    #[test]
    fn test_rect_center() {
        let c = Rect::new(0.0, 0.0, 612.0, 792.0).center();
        assert_eq!(c.x, 306.0);
        assert_eq!(c.y, 396.0);
    }

    #[test]
    fn test_contains_rect() {
        let page = Rect::new(0.0, 0.0, 612.0, 792.0);
        assert!(page.contains_rect(&Rect::new(24.0, 24.0, 100.0, 50.0)));
        // Touching the edge is still inside
        assert!(page.contains_rect(&Rect::new(0.0, 0.0, 612.0, 792.0)));
        assert!(!page.contains_rect(&Rect::new(600.0, 24.0, 100.0, 50.0)));
        assert!(!page.contains_rect(&Rect::new(-1.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_pdf_array() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.to_pdf_array(), [10.0, 20.0, 110.0, 70.0]);
        assert_eq!(r.to_xywh(), [10.0, 20.0, 100.0, 50.0]);
    }
}
