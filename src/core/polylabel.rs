//! Pole of inaccessibility: the interior point farthest from any edge.
//!
//! Quadtree search over square cells. Each cell carries the signed distance
//! from its center to the outline and an upper bound for any point inside it;
//! cells that cannot beat the current best by `precision` are dropped.

use geo::{BoundingRect, Centroid, Contains, EuclideanDistance, Point, Polygon};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

const MIN_PRECISION: f64 = 1e-9;

#[derive(Clone, Copy)]
struct Cell {
    center: Point<f64>,
    half: f64,
    distance: f64,
    max: f64,
}

impl Cell {
    fn new(x: f64, y: f64, half: f64, polygon: &Polygon<f64>) -> Self {
        let center = Point::new(x, y);
        let distance = signed_distance(center, polygon);
        Self {
            center,
            half,
            distance,
            max: distance + half * std::f64::consts::SQRT_2,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.max.total_cmp(&other.max) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.max.total_cmp(&other.max)
    }
}

/// Positive inside the polygon, negative outside.
fn signed_distance(point: Point<f64>, polygon: &Polygon<f64>) -> f64 {
    let edge = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| point.euclidean_distance(ring))
        .fold(f64::INFINITY, f64::min);

    if polygon.contains(&point) {
        edge
    } else {
        -edge
    }
}

pub fn pole_of_inaccessibility(polygon: &Polygon<f64>, precision: f64) -> Option<Point<f64>> {
    let rect = polygon.bounding_rect()?;
    let (min, max) = (rect.min(), rect.max());
    let width = max.x - min.x;
    let height = max.y - min.y;
    let precision = precision.max(MIN_PRECISION);

    // Cells narrower than `precision` can't improve the answer, and an
    // unbounded grid over a sliver would be huge.
    let cell_size = width.min(height).max(precision);
    if cell_size == precision {
        return Some(Point::new(min.x, min.y));
    }

    let half = cell_size / 2.0;
    let mut queue = BinaryHeap::new();

    let mut x = min.x;
    while x < max.x {
        let mut y = min.y;
        while y < max.y {
            queue.push(Cell::new(x + half, y + half, half, polygon));
            y += cell_size;
        }
        x += cell_size;
    }

    let mut best = match polygon.centroid() {
        Some(c) => Cell::new(c.x(), c.y(), 0.0, polygon),
        None => Cell::new(min.x + width / 2.0, min.y + height / 2.0, 0.0, polygon),
    };

    let bbox_cell = Cell::new(min.x + width / 2.0, min.y + height / 2.0, 0.0, polygon);
    if bbox_cell.distance > best.distance {
        best = bbox_cell;
    }

    while let Some(cell) = queue.pop() {
        if cell.distance > best.distance {
            best = cell;
        }

        if cell.max - best.distance <= precision {
            continue;
        }

        let half = cell.half / 2.0;
        let (cx, cy) = (cell.center.x(), cell.center.y());
        queue.push(Cell::new(cx - half, cy - half, half, polygon));
        queue.push(Cell::new(cx + half, cy - half, half, polygon));
        queue.push(Cell::new(cx - half, cy + half, half, polygon));
        queue.push(Cell::new(cx + half, cy + half, half, polygon));
    }

    Some(best.center)
}
