//! Grid snapping for node placement.

use kurbo::Point;

/// Grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 24.0;

/// Snap a single coordinate to the nearest grid line.
///
/// Halfway values go to the even grid line, so a node sitting exactly between
/// two lines does not drift in one direction on repeated snapping.
pub fn snap_coordinate(value: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return value;
    }
    (value / grid_size).round_ties_even() * grid_size
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    Point::new(snap_coordinate(point.x, grid_size), snap_coordinate(point.y, grid_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(Point::new(23.0, 47.0), 24.0), Point::new(24.0, 48.0));
    }

    #[test]
    fn test_snap_to_grid_exact() {
        assert_eq!(snap_to_grid(Point::new(48.0, 72.0), 24.0), Point::new(48.0, 72.0));
    }

    #[test]
    fn test_snap_round_down() {
        assert_eq!(snap_to_grid(Point::new(31.0, 59.0), 24.0), Point::new(24.0, 48.0));
    }

    #[test]
    fn test_snap_midpoint_goes_to_even_line() {
        assert_eq!(snap_coordinate(12.0, 24.0), 0.0);
        assert_eq!(snap_coordinate(36.0, 24.0), 48.0);
    }

    #[test]
    fn test_zero_grid_is_identity() {
        assert_eq!(snap_coordinate(13.5, 0.0), 13.5);
    }
}
