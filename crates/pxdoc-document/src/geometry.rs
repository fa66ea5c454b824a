#![forbid(unsafe_code)]

//! Integer geometry in canvas pixel coordinates (origin top-left).

use std::ops::{Add, AddAssign, Neg, Sub};

/// A 2D integer vector: a pixel position, an offset, or a size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VecI {
    pub x: i32,
    pub y: i32,
}

impl VecI {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0, 0);

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `|x| + |y|`.
    #[inline]
    pub const fn taxicab_length(self) -> i32 {
        self.x.abs() + self.y.abs()
    }

    /// Whether both components are at least 1 (a usable canvas size).
    #[inline]
    pub const fn is_positive(self) -> bool {
        self.x >= 1 && self.y >= 1
    }
}

impl Add for VecI {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for VecI {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for VecI {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for VecI {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<(i32, i32)> for VecI {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// An axis-aligned rectangle: top-left position plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RectI {
    /// Top-left corner (inclusive).
    pub pos: VecI,
    /// Width and height.
    pub size: VecI,
}

impl RectI {
    #[inline]
    pub const fn new(pos: VecI, size: VecI) -> Self {
        Self { pos, size }
    }

    /// Rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(size: VecI) -> Self {
        Self::new(VecI::ZERO, size)
    }

    /// Smallest rectangle covering both pixels.
    pub fn from_points(a: VecI, b: VecI) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        let right = a.x.max(b.x) + 1;
        let bottom = a.y.max(b.y) + 1;
        Self::new(VecI::new(left, top), VecI::new(right - left, bottom - top))
    }

    /// Smallest rectangle covering every pixel, or `None` for no pixels.
    pub fn bounding(pixels: impl IntoIterator<Item = VecI>) -> Option<Self> {
        pixels
            .into_iter()
            .map(|p| Self::from_points(p, p))
            .reduce(|acc, r| acc.union(&r))
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.pos.x + self.size.x
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }

    /// Whether the pixel lies inside the rectangle.
    #[inline]
    pub const fn contains(&self, p: VecI) -> bool {
        p.x >= self.pos.x && p.x < self.right() && p.y >= self.pos.y && p.y < self.bottom()
    }

    /// Overlapping area, or `None` if the rectangles do not overlap.
    pub fn intersect(&self, other: &RectI) -> Option<RectI> {
        let left = self.pos.x.max(other.pos.x);
        let top = self.pos.y.max(other.pos.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (left < right && top < bottom)
            .then(|| Self::new(VecI::new(left, top), VecI::new(right - left, bottom - top)))
    }

    /// Smallest rectangle containing both. An empty side yields the other.
    pub fn union(&self, other: &RectI) -> RectI {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let left = self.pos.x.min(other.pos.x);
        let top = self.pos.y.min(other.pos.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(VecI::new(left, top), VecI::new(right - left, bottom - top))
    }

    /// The same rectangle moved by `offset`.
    #[inline]
    pub fn translate(&self, offset: VecI) -> RectI {
        Self::new(self.pos + offset, self.size)
    }
}

/// Pixels of a Bresenham line from `from` to `to`, both inclusive.
pub fn bresenham_line(from: VecI, to: VecI) -> Vec<VecI> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let mut p = from;
    let mut line = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        line.push(p);
        if p == to {
            return line;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            p.x += sx;
        }
        if e2 <= dx {
            err += dx;
            p.y += sy;
        }
    }
}
