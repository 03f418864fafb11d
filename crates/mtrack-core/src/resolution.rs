//! Display resolutions, grid coordinates and the aspect-ratio allow-list.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A `(width, height)` display configuration. Grids are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of cells a grid of this resolution holds.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether `point` lies in `[0, width) x [0, height)`.
    pub fn contains(&self, point: Point) -> bool {
        (0..i64::from(self.width)).contains(&point.x)
            && (0..i64::from(self.height)).contains(&point.y)
    }

    /// Checks the resolution against the aspect-ratio allow-list.
    pub fn has_supported_aspect(&self) -> bool {
        supported_aspects()
            .iter()
            .any(|&(ax, ay)| matches_aspect(self.width, self.height, ax, ay))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| format!("not a resolution: {s}"))?;
        let width = w.parse().map_err(|_| format!("bad width in {s}"))?;
        let height = h.parse().map_err(|_| format!("bad height in {s}"))?;
        Ok(Self { width, height })
    }
}

/// A recorded cursor position. Legacy maps hold positions off-screen too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Point {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("not a point: {s}"))?;
        Ok(Self {
            x: x.trim().parse().map_err(|_| format!("bad x in {s}"))?,
            y: y.trim().parse().map_err(|_| format!("bad y in {s}"))?,
        })
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(Resolution);
string_serde!(Point);

const BASE_ASPECTS: [(u32, u32); 5] = [(4, 3), (16, 9), (16, 10), (18, 9), (21, 9)];

/// Every accepted aspect ratio.
///
/// The five base ratios, their portrait mirrors, and 2x/3x/5x horizontal
/// multiples of all ten for side-by-side monitors.
pub fn supported_aspects() -> Vec<(u32, u32)> {
    let mut aspects: Vec<(u32, u32)> = BASE_ASPECTS.to_vec();
    aspects.extend(BASE_ASPECTS.iter().map(|&(x, y)| (y, x)));
    let single = aspects.clone();
    for factor in [2, 3, 5] {
        aspects.extend(single.iter().map(|&(x, y)| (x * factor, y)));
    }
    aspects
}

fn matches_aspect(width: u32, height: u32, ax: u32, ay: u32) -> bool {
    width % ax == 0 && (width / ax) as u64 * ay as u64 == height as u64
}
