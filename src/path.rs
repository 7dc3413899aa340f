mod builder;

pub use builder::PathBuilder;

pub use lyon::path as lyon_path;

use strokevg_core::math::{Point, Size};

/// An immutable set of contours to be stroked.
#[derive(Debug, Clone)]
pub struct Path {
    pub raw: lyon::path::Path,
}

impl Path {
    pub fn builder() -> PathBuilder {
        PathBuilder::new()
    }

    /// Creates a new [`Path`] representing a line segment given its starting
    /// and end points.
    pub fn line(from: Point, to: Point) -> Self {
        PathBuilder::new().move_to(from).line_to(to).build()
    }

    /// Creates a new [`Path`] representing a rectangle given its top-left
    /// corner coordinate and its `Size`.
    pub fn rectangle(top_left: Point, size: Size) -> Self {
        PathBuilder::new().rectangle(top_left, size).build()
    }

    /// Number of path events (including contour begins and ends), used to
    /// estimate how many patches a conversion pass will need.
    pub fn verb_count(&self) -> usize {
        self.raw.iter().count()
    }

    /// Returns the current [`Path`] with the given transform applied to it.
    pub fn transform(&self, transform: &lyon::path::math::Transform) -> Path {
        Path {
            raw: self.raw.clone().transformed(transform),
        }
    }
}
