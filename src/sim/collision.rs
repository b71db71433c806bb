//! Collision detection for the bridge
//!
//! Tiles are static axis-aligned boxes on a single row, so a linear scan is
//! all the broad phase we need. The avatar is caught when its bottom edge
//! crosses a tile top while falling; any remaining overlap with a tile is
//! pushed out along the shallower axis.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tolerance for "was above the surface last step"
const LANDING_EPSILON: f32 = 0.5;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Horizontal extents overlap (touching edges don't count)
    #[inline]
    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x
    }

    /// Interiors overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.overlaps_x(other) && self.min.y < other.max.y && self.max.y > other.min.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Find the surface a falling body lands on this step
///
/// `prev_bottom` is the body's bottom edge before integration. Returns the
/// highest tile top that the bottom edge crossed while horizontally
/// overlapping that tile.
pub fn find_landing<I>(body: &Rect, prev_bottom: f32, tiles: I) -> Option<f32>
where
    I: IntoIterator<Item = Rect>,
{
    tiles
        .into_iter()
        .filter(|tile| {
            body.overlaps_x(tile)
                && prev_bottom >= tile.max.y - LANDING_EPSILON
                && body.min.y <= tile.max.y
        })
        .map(|tile| tile.max.y)
        .reduce(f32::max)
}

/// Smallest translation of `body` that takes it out of `tile`
///
/// `None` if the interiors do not overlap. Ties go to the vertical axis.
pub fn separation(body: &Rect, tile: &Rect) -> Option<Vec2> {
    if !body.overlaps(tile) {
        return None;
    }
    let left = tile.min.x - body.max.x;
    let right = tile.max.x - body.min.x;
    let down = tile.min.y - body.max.y;
    let up = tile.max.y - body.min.y;

    let dx = if -left < right { left } else { right };
    let dy = if up <= -down { up } else { down };
    if dy.abs() <= dx.abs() {
        Some(Vec2::new(0.0, dy))
    } else {
        Some(Vec2::new(dx, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile_at(x: f32) -> Rect {
        Rect::from_center(Vec2::new(x, 200.0), Vec2::new(60.0, 20.0))
    }

    #[test]
    fn test_rect_from_center() {
        let r = Rect::from_center(Vec2::new(10.0, 20.0), Vec2::new(4.0, 6.0));
        assert_eq!(r.min, Vec2::new(8.0, 17.0));
        assert_eq!(r.max, Vec2::new(12.0, 23.0));
        assert_eq!(r.center(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Rect::from_center(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
        let b = Rect::from_center(Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&b.translated(Vec2::new(-0.5, 0.0))));
    }

    #[test]
    fn test_landing_on_tile_below() {
        // Bottom edge crosses the tile top at 210
        let body = Rect::from_center(Vec2::new(100.0, 228.0), Vec2::new(40.0, 40.0));
        let top = find_landing(&body, 212.0, [tile_at(100.0)]);
        assert_eq!(top, Some(210.0));
    }

    #[test]
    fn test_no_landing_over_gap() {
        let body = Rect::from_center(Vec2::new(100.0, 228.0), Vec2::new(40.0, 40.0));
        assert_eq!(find_landing(&body, 212.0, [tile_at(200.0)]), None);
    }

    #[test]
    fn test_no_landing_from_below() {
        // Body already under the surface last step: it keeps falling
        let body = Rect::from_center(Vec2::new(100.0, 150.0), Vec2::new(40.0, 40.0));
        assert_eq!(find_landing(&body, 140.0, [tile_at(100.0)]), None);
    }

    #[test]
    fn test_shallow_overlap_pushes_up() {
        // Sank 3 below the top of a tile it is mostly over
        let body = Rect::from_center(Vec2::new(100.0, 227.0), Vec2::new(40.0, 40.0));
        assert_eq!(separation(&body, &tile_at(100.0)), Some(Vec2::new(0.0, 3.0)));
    }

    #[test]
    fn test_side_overlap_pushes_back() {
        // Deep below the top, 10 into the tile's left side
        let body = Rect::from_center(Vec2::new(60.0, 195.0), Vec2::new(40.0, 40.0));
        assert_eq!(separation(&body, &tile_at(100.0)), Some(Vec2::new(-10.0, 0.0)));
    }

    #[test]
    fn test_separated_bodies_need_no_push() {
        let body = Rect::from_center(Vec2::new(100.0, 230.0), Vec2::new(40.0, 40.0));
        assert_eq!(separation(&body, &tile_at(100.0)), None);
    }
}
