//! # Grid Mathematics
//!
//! Line rasterization and percentage rolls.

use crate::Cell;
use rand::Rng;

/// Rasterizes the integer line from `a` to `b` with Bresenham's algorithm.
///
/// The result excludes `a` and includes `b`. The line is always traced from
/// the smaller endpoint, so tracing `b` to `a` visits the same cells in
/// reverse: `{a} ∪ line(a, b)` equals `{b} ∪ line(b, a)`.
///
/// # Examples
///
/// ```
/// use warband::{rasterize_line, Cell};
///
/// let line = rasterize_line(Cell::new(0, 0), Cell::new(0, 3));
/// assert_eq!(line, vec![Cell::new(0, 1), Cell::new(0, 2), Cell::new(0, 3)]);
/// assert!(rasterize_line(Cell::new(4, 4), Cell::new(4, 4)).is_empty());
/// ```
pub fn rasterize_line(a: Cell, b: Cell) -> Vec<Cell> {
    if a == b {
        return Vec::new();
    }

    let mut points = if a <= b {
        bresenham(a, b)
    } else {
        let mut points = bresenham(b, a);
        points.reverse();
        points
    };
    points.remove(0);
    points
}

/// Inclusive Bresenham line between two cells.
fn bresenham(from: Cell, to: Cell) -> Vec<Cell> {
    let dc = (to.col - from.col).abs();
    let dr = -(to.row - from.row).abs();
    let sc = (to.col - from.col).signum();
    let sr = (to.row - from.row).signum();
    let mut err = dc + dr;
    let (mut row, mut col) = (from.row, from.col);
    let mut points = Vec::with_capacity((dc.max(-dr) + 1) as usize);

    loop {
        points.push(Cell::new(row, col));
        if row == to.row && col == to.col {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dr {
            err += dr;
            col += sc;
        }
        if e2 <= dc {
            err += dc;
            row += sr;
        }
    }

    points
}

/// Rolls a uniform 1..=100 value.
pub fn roll_percentile(rng: &mut impl Rng) -> u32 {
    rng.gen_range(1..=100)
}

/// True with `percent`% probability. 0 never fires, 100 always does.
pub fn percent_chance(rng: &mut impl Rng, percent: u32) -> bool {
    percent > 0 && roll_percentile(rng) <= percent
}
