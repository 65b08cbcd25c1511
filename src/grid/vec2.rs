//! Integer grid geometry: positions, compass directions, taxicab scans

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 2D grid position / offset
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Taxicab norm |x| + |y|
    pub fn taxicab(self) -> i32 {
        self.x.abs() + self.y.abs()
    }

    /// Taxicab distance to another position
    pub fn distance(self, other: Vec2) -> i32 {
        (self - other).taxicab()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl Mul<i32> for Vec2 {
    type Output = Vec2;
    fn mul(self, scale: i32) -> Vec2 {
        Vec2::new(self.x * scale, self.y * scale)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Compass direction of a one-step move. `None` is the explicit "stay put"
/// intent, not an absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    /// Offset applied by moving one step in this direction. The y axis grows
    /// downward.
    pub fn vec(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0, -1),
            Direction::Down => Vec2::new(0, 1),
            Direction::Left => Vec2::new(-1, 0),
            Direction::Right => Vec2::new(1, 0),
            Direction::None => Vec2::new(0, 0),
        }
    }

    /// Inverse of [`Direction::vec`]; anything that is not a unit step maps
    /// to `None`.
    pub fn from_vec(v: Vec2) -> Self {
        match (v.x, v.y) {
            (0, -1) => Direction::Up,
            (0, 1) => Direction::Down,
            (-1, 0) => Direction::Left,
            (1, 0) => Direction::Right,
            _ => Direction::None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::None => 'N',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'U' => Some(Direction::Up),
            'D' => Some(Direction::Down),
            'L' => Some(Direction::Left),
            'R' => Some(Direction::Right),
            'N' => Some(Direction::None),
            _ => None,
        }
    }
}

/// Every in-bounds cell within taxicab distance `size` of `pos`, excluding
/// `pos` itself, in x-then-y scan order.
pub fn diamond(pos: Vec2, size: i32, width: i32, height: i32) -> Vec<Vec2> {
    let mut out = Vec::new();
    let i0 = (-size).max(-pos.x);
    let i1 = (size + 1).min(width - pos.x);
    for i in i0..i1 {
        let j0 = (-size + i.abs()).max(-pos.y);
        let j1 = (size + 1 - i.abs()).min(height - pos.y);
        for j in j0..j1 {
            if i == 0 && j == 0 {
                continue;
            }
            out.push(pos + Vec2::new(i, j));
        }
    }
    out
}

/// The in-bounds cells at exactly taxicab distance `size` from `pos`
pub fn ring(pos: Vec2, size: i32, width: i32, height: i32) -> Vec<Vec2> {
    let mut out = Vec::new();
    let i0 = (-size).max(-pos.x);
    let i1 = (size + 1).min(width - pos.x);
    for i in i0..i1 {
        let j1 = -size + i.abs();
        let j2 = size - i.abs();
        if (0..height).contains(&(j1 + pos.y)) {
            out.push(pos + Vec2::new(i, j1));
        }
        if j1 != j2 && (0..height).contains(&(j2 + pos.y)) {
            out.push(pos + Vec2::new(i, j2));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_vectors_round_trip() {
        for d in [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
            Direction::None,
        ] {
            assert_eq!(Direction::from_vec(d.vec()), d);
            assert_eq!(Direction::from_char(d.as_char()), Some(d));
        }
    }

    #[test]
    fn diamond_covers_taxicab_ball() {
        let cells = diamond(Vec2::new(5, 5), 2, 20, 20);
        // |ball(2)| = 13, minus the centre
        assert_eq!(cells.len(), 12);
        assert!(cells.iter().all(|p| p.distance(Vec2::new(5, 5)) <= 2));
        assert!(!cells.contains(&Vec2::new(5, 5)));
    }

    #[test]
    fn diamond_clips_at_map_edges() {
        let cells = diamond(Vec2::new(0, 0), 1, 20, 20);
        assert_eq!(cells, vec![Vec2::new(0, 1), Vec2::new(1, 0)]);
    }

    #[test]
    fn ring_yields_exact_distance() {
        let cells = ring(Vec2::new(5, 5), 3, 20, 20);
        assert_eq!(cells.len(), 12);
        assert!(cells.iter().all(|p| p.distance(Vec2::new(5, 5)) == 3));
    }

    #[test]
    fn ring_at_distance_one_matches_neighbours() {
        let mut cells = ring(Vec2::new(5, 5), 1, 20, 20);
        cells.sort();
        let mut expected = vec![
            Vec2::new(4, 5),
            Vec2::new(6, 5),
            Vec2::new(5, 4),
            Vec2::new(5, 6),
        ];
        expected.sort();
        assert_eq!(cells, expected);
    }
}
