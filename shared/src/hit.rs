use std::sync::Arc;

use geo::{Contains, MultiPolygon, Point, Rect};

const GRID_COLS: usize = 48;
const GRID_ROWS: usize = 32;

struct HitEntry<T> {
    bounds: Rect<f64>,
    shape: Arc<MultiPolygon<f64>>,
    layer: u8,
    value: T,
}

/// A flat 2D grid over screen space for pointer hit-testing of projected regions.
///
/// Candidates come from the grid cell; the exact test is point-in-polygon.
/// Higher `layer` wins, and within a layer the region inserted last (drawn on
/// top) wins.
pub struct HitGrid<T> {
    cells: Vec<Vec<usize>>,
    entries: Vec<HitEntry<T>>,
    min_x: f64,
    min_y: f64,
    cell_w: f64,
    cell_h: f64,
}

impl<T> HitGrid<T> {
    pub fn build(
        regions: impl IntoIterator<Item = (Arc<MultiPolygon<f64>>, Rect<f64>, u8, T)>,
    ) -> Self {
        let entries: Vec<HitEntry<T>> = regions
            .into_iter()
            .map(|(shape, bounds, layer, value)| HitEntry {
                bounds,
                shape,
                layer,
                value,
            })
            .collect();

        if entries.is_empty() {
            return Self {
                cells: Vec::new(),
                entries,
                min_x: 0.0,
                min_y: 0.0,
                cell_w: 1.0,
                cell_h: 1.0,
            };
        }

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for entry in &entries {
            min_x = min_x.min(entry.bounds.min().x);
            min_y = min_y.min(entry.bounds.min().y);
            max_x = max_x.max(entry.bounds.max().x);
            max_y = max_y.max(entry.bounds.max().y);
        }

        // Pad so points on the outer edge still land inside the grid
        min_x -= 1.0;
        min_y -= 1.0;
        max_x += 1.0;
        max_y += 1.0;

        let cell_w = (max_x - min_x) / GRID_COLS as f64;
        let cell_h = (max_y - min_y) / GRID_ROWS as f64;

        let mut cells = vec![Vec::new(); GRID_COLS * GRID_ROWS];
        for (idx, entry) in entries.iter().enumerate() {
            let b = entry.bounds;
            let col_start = ((b.min().x - min_x) / cell_w).floor().max(0.0) as usize;
            let col_end = ((b.max().x - min_x) / cell_w).ceil().min(GRID_COLS as f64) as usize;
            let row_start = ((b.min().y - min_y) / cell_h).floor().max(0.0) as usize;
            let row_end = ((b.max().y - min_y) / cell_h).ceil().min(GRID_ROWS as f64) as usize;

            for row in row_start..row_end {
                for col in col_start..col_end {
                    cells[row * GRID_COLS + col].push(idx);
                }
            }
        }

        Self {
            cells,
            entries,
            min_x,
            min_y,
            cell_w,
            cell_h,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Topmost region containing the screen point.
    pub fn find_at(&self, x: f64, y: f64) -> Option<&T> {
        if self.cells.is_empty() {
            return None;
        }

        let col = ((x - self.min_x) / self.cell_w).floor() as isize;
        let row = ((y - self.min_y) / self.cell_h).floor() as isize;
        if col < 0 || row < 0 || col >= GRID_COLS as isize || row >= GRID_ROWS as isize {
            return None;
        }

        let point = Point::new(x, y);
        let cell = &self.cells[row as usize * GRID_COLS + col as usize];
        cell.iter()
            .map(|&idx| &self.entries[idx])
            .filter(|entry| {
                x >= entry.bounds.min().x
                    && x <= entry.bounds.max().x
                    && y >= entry.bounds.min().y
                    && y <= entry.bounds.max().y
                    && entry.shape.contains(&point)
            })
            .max_by_key(|entry| entry.layer)
            .map(|entry| &entry.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{BoundingRect, polygon};

    fn rect_region(x0: f64, y0: f64, x1: f64, y1: f64, layer: u8, name: &'static str)
        -> (Arc<MultiPolygon<f64>>, Rect<f64>, u8, &'static str)
    {
        let shape = MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ]]);
        let bounds = shape.bounding_rect().expect("non-empty shape");
        (Arc::new(shape), bounds, layer, name)
    }

    fn triangle(name: &'static str) -> (Arc<MultiPolygon<f64>>, Rect<f64>, u8, &'static str) {
        let shape = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 100.0, y: 0.0),
            (x: 0.0, y: 100.0),
            (x: 0.0, y: 0.0),
        ]]);
        let bounds = shape.bounding_rect().expect("non-empty shape");
        (Arc::new(shape), bounds, 0, name)
    }

    #[test]
    fn higher_layer_wins_over_region_below() {
        let grid = HitGrid::build([
            rect_region(0.0, 0.0, 100.0, 100.0, 0, "state"),
            rect_region(10.0, 10.0, 20.0, 20.0, 1, "county"),
        ]);
        assert_eq!(grid.find_at(15.0, 15.0), Some(&"county"));
        assert_eq!(grid.find_at(50.0, 50.0), Some(&"state"));
        assert_eq!(grid.find_at(500.0, 50.0), None);
    }

    #[test]
    fn later_region_wins_within_a_layer() {
        let grid = HitGrid::build([
            rect_region(0.0, 0.0, 50.0, 50.0, 0, "first"),
            rect_region(25.0, 25.0, 75.0, 75.0, 0, "second"),
        ]);
        assert_eq!(grid.find_at(30.0, 30.0), Some(&"second"));
        assert_eq!(grid.find_at(10.0, 10.0), Some(&"first"));
    }

    #[test]
    fn bounding_box_alone_is_not_a_hit() {
        let grid = HitGrid::build([triangle("tri")]);
        assert_eq!(grid.find_at(10.0, 10.0), Some(&"tri"));
        assert_eq!(grid.find_at(90.0, 90.0), None);
    }

    #[test]
    fn empty_grid_finds_nothing() {
        let grid: HitGrid<&str> = HitGrid::build([]);
        assert!(grid.is_empty());
        assert_eq!(grid.find_at(0.0, 0.0), None);
    }
}
