use std::time::Duration;

use super::state::Position;

/// A square, timed hazard on the grid
///
/// Obstacles never change after construction. The live set holds them as
/// `Arc<Obstacle>` and removal compares handles, not geometry, so two
/// obstacles covering the same cells are still distinct.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    origin: Position,
    size: usize,
    duration: Duration,
    cells: Vec<Position>,
}

impl Obstacle {
    /// Create an obstacle whose top-left corner is `origin`
    pub fn new(origin: Position, size: usize, duration: Duration) -> Self {
        let side = size as i32;
        let mut cells = Vec::with_capacity(size * size);
        for dx in 0..side {
            for dy in 0..side {
                cells.push(origin.moved_by(dx, dy));
            }
        }

        Self {
            origin,
            size,
            duration,
            cells,
        }
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Lifetime measured from placement
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Cells covered by this obstacle
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    /// Check if `pos` lies inside the footprint
    pub fn occupies(&self, pos: Position) -> bool {
        let side = self.size as i32;
        pos.x >= self.origin.x
            && pos.x < self.origin.x + side
            && pos.y >= self.origin.y
            && pos.y < self.origin.y + side
    }

    /// Check if the two footprints share at least one cell
    pub fn overlaps(&self, other: &Obstacle) -> bool {
        let (small, large) = if self.size < other.size {
            (self, other)
        } else {
            (other, self)
        };
        small.cells.iter().any(|&cell| large.occupies(cell))
    }

    /// Check if the whole footprint lies on a `width` x `height` grid
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        let side = self.size as i32;
        self.origin.x >= 0
            && self.origin.y >= 0
            && self.origin.x + side <= width as i32
            && self.origin.y + side <= height as i32
    }
}
