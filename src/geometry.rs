//! Axis-aligned bounding boxes around OCR vertices.
//!
//! OCR providers describe text regions as polygons. For display, we only need
//! the smallest upright rectangle containing every vertex of the polygon.

use std::{cmp::Ordering, ops::Sub};

use schemars::JsonSchema;

use crate::prelude::*;

/// A value we can compute bounding boxes over.
///
/// `Default` is the value used for a missing coordinate.
pub trait Coordinate: Copy + PartialOrd + Sub<Output = Self> + Default {}

impl Coordinate for f64 {}

impl Coordinate for Coord {}

/// A coordinate exactly as it appeared in a provider payload.
///
/// Some providers send integer pixel positions and some send floats. We keep
/// the original kind so that integers are written back out as integers. Any
/// arithmetic involving a float produces a float.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Coord {
    /// An integral coordinate.
    Int(i64),
    /// A floating-point coordinate.
    Float(f64),
}

impl Coord {
    /// Get this coordinate as a float.
    pub fn as_f64(self) -> f64 {
        match self {
            Coord::Int(i) => i as f64,
            Coord::Float(f) => f,
        }
    }
}

impl Default for Coord {
    fn default() -> Self {
        Coord::Int(0)
    }
}

impl From<f64> for Coord {
    fn from(value: f64) -> Self {
        Coord::Float(value)
    }
}

impl From<i64> for Coord {
    fn from(value: i64) -> Self {
        Coord::Int(value)
    }
}

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Coord::Int(a), Coord::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        match (self, rhs) {
            (Coord::Int(a), Coord::Int(b)) => match a.checked_sub(b) {
                Some(diff) => Coord::Int(diff),
                None => Coord::Float(a as f64 - b as f64),
            },
            _ => Coord::Float(self.as_f64() - rhs.as_f64()),
        }
    }
}

/// A single polygon vertex. Missing (or `null`) coordinates are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct Vertex<T = Coord> {
    #[serde(default, deserialize_with = "crate::providers::default_on_null")]
    pub x: T,
    #[serde(default, deserialize_with = "crate::providers::default_on_null")]
    pub y: T,
}

impl<T> Vertex<T> {
    /// Create a new vertex.
    #[cfg(test)]
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    /// Apply `f` to both coordinates.
    pub fn map<U>(self, f: impl Fn(T) -> U) -> Vertex<U> {
        Vertex {
            x: f(self.x),
            y: f(self.y),
        }
    }
}

/// An upright rectangle, in the same units as the vertices it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox<T> {
    pub left: T,
    pub top: T,
    pub width: T,
    pub height: T,
}

impl<T> BoundingBox<T> {
    /// Apply `f` to every field.
    pub fn map<U>(self, f: impl Fn(T) -> U) -> BoundingBox<U> {
        BoundingBox {
            left: f(self.left),
            top: f(self.top),
            width: f(self.width),
            height: f(self.height),
        }
    }
}

/// Compute the bounding box of `vertices`, or `None` if there are none.
///
/// On ties, the first extreme value wins, which only matters when integer and
/// float coordinates compare equal.
pub fn reduce<T, I>(vertices: I) -> Option<BoundingBox<T>>
where
    T: Coordinate,
    I: IntoIterator<Item = Vertex<T>>,
{
    let mut vertices = vertices.into_iter();
    let first = vertices.next()?;
    let (mut left, mut right) = (first.x, first.x);
    let (mut top, mut bottom) = (first.y, first.y);
    for vertex in vertices {
        if vertex.x < left {
            left = vertex.x;
        }
        if vertex.x > right {
            right = vertex.x;
        }
        if vertex.y < top {
            top = vertex.y;
        }
        if vertex.y > bottom {
            bottom = vertex.y;
        }
    }
    Some(BoundingBox {
        left,
        top,
        width: right - left,
        height: bottom - top,
    })
}
