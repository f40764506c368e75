use super::Point;

/// Values of the player-relative screen layer.
pub mod player_relative {
    pub const BACKGROUND: i32 = 0;
    pub const SELF: i32 = 1;
    pub const ALLY: i32 = 2;
    pub const NEUTRAL: i32 = 3;
    pub const ENEMY: i32 = 4;
}

/// A 2-D screen feature layer stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayer {
    width: usize,
    height: usize,
    cells: Vec<i32>,
}

impl FeatureLayer {
    /// Creates a layer filled with zeros.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Creates a layer by evaluating `f(x, y)` for every cell.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> i32,
    {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells in the layer.
    #[must_use]
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Cell values in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        usize::try_from(point.x).is_ok_and(|x| x < self.width)
            && usize::try_from(point.y).is_ok_and(|y| y < self.height)
    }

    #[must_use]
    pub fn get(&self, point: Point) -> Option<i32> {
        self.index_of(point).map(|i| self.cells[i])
    }

    /// Sets a cell; points outside the layer are ignored.
    pub fn set(&mut self, point: Point, value: i32) {
        if let Some(i) = self.index_of(point) {
            self.cells[i] = value;
        }
    }

    /// Iterates over the positions of every cell equal to `value`.
    pub fn positions_of(&self, value: i32) -> impl Iterator<Item = Point> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, v)| **v == value)
            .map(move |(i, _)| to_point(i % width, i / width))
    }

    /// Mean position of the cells equal to `value`, truncated to integer cells.
    ///
    /// Returns `None` when no cell matches.
    ///
    /// ```
    /// use beacon_env::{FeatureLayer, Point};
    ///
    /// let layer = FeatureLayer::from_fn(4, 4, |x, y| i32::from(x >= 2 && y == 1));
    /// assert_eq!(layer.mean_position(1), Some(Point::new(2, 1)));
    /// assert_eq!(layer.mean_position(7), None);
    /// ```
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn mean_position(&self, value: i32) -> Option<Point> {
        let mut count = 0_i64;
        let (mut sum_x, mut sum_y) = (0_i64, 0_i64);
        for p in self.positions_of(value) {
            count += 1;
            sum_x += i64::from(p.x);
            sum_y += i64::from(p.y);
        }
        if count == 0 {
            return None;
        }
        Some(Point::new((sum_x / count) as i32, (sum_y / count) as i32))
    }

    fn index_of(&self, point: Point) -> Option<usize> {
        if !self.contains(point) {
            return None;
        }
        let x = usize::try_from(point.x).ok()?;
        let y = usize::try_from(point.y).ok()?;
        Some(y * self.width + x)
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn to_point(x: usize, y: usize) -> Point {
    Point::new(x as i32, y as i32)
}
