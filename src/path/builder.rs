use super::Path;

use strokevg_core::math::{Point, Size};

use lyon::math;
use lyon::path::builder::{self, SvgPathBuilder};

/// A [`Path`] builder.
///
/// Once a [`Path`] is built, it can no longer be mutated.
pub struct PathBuilder {
    pub raw: builder::WithSvg<lyon::path::path::BuilderImpl>,
}

impl PathBuilder {
    /// Creates a new [`PathBuilder`].
    pub fn new() -> Self {
        Self {
            raw: lyon::path::Path::builder().with_svg(),
        }
    }

    /// Moves the starting point of a new sub-path to the given `Point`.
    pub fn move_to(mut self, point: Point) -> Self {
        self.raw.move_to(math::Point::new(point.x, point.y));
        self
    }

    /// Connects the last point in the [`Path`] to the given `Point` with a
    /// straight line.
    pub fn line_to(mut self, point: Point) -> Self {
        self.raw.line_to(math::Point::new(point.x, point.y));
        self
    }

    /// Adds a quadratic bezier curve to the [`Path`] given its control
    /// point and its end point.
    pub fn quadratic_curve_to(mut self, control: Point, to: Point) -> Self {
        self.raw.quadratic_bezier_to(
            math::Point::new(control.x, control.y),
            math::Point::new(to.x, to.y),
        );
        self
    }

    /// Adds a cubic bezier curve to the [`Path`] given its two control
    /// points and its end point.
    pub fn bezier_curve_to(mut self, control_a: Point, control_b: Point, to: Point) -> Self {
        self.raw.cubic_bezier_to(
            math::Point::new(control_a.x, control_a.y),
            math::Point::new(control_b.x, control_b.y),
            math::Point::new(to.x, to.y),
        );
        self
    }

    /// Adds a rectangle to the [`Path`] given its top-left corner coordinate
    /// and its `Size`.
    pub fn rectangle(self, top_left: Point, size: Size) -> Self {
        self.move_to(top_left)
            .line_to(Point::new(top_left.x + size.width, top_left.y))
            .line_to(Point::new(
                top_left.x + size.width,
                top_left.y + size.height,
            ))
            .line_to(Point::new(top_left.x, top_left.y + size.height))
            .close()
    }

    /// Closes the current contour of the [`Path`].
    pub fn close(mut self) -> Self {
        self.raw.close();
        self
    }

    /// Builds the [`Path`] of this builder.
    pub fn build(self) -> Path {
        Path {
            raw: self.raw.build(),
        }
    }
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}
