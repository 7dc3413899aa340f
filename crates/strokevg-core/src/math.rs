//! Math types shared across the strokevg crates.
//!
//! All geometry is in device-space pixels. The aliases point at [`euclid`],
//! which is also what `lyon::math` aliases, so path points and strokevg
//! points are the same concrete type.

/// A point in device-space pixels.
///
/// Alias for ```euclid::default::Point2D<f32>```.
pub type Point = euclid::default::Point2D<f32>;

/// A vector in device-space pixels.
///
/// Alias for ```euclid::default::Vector2D<f32>```.
pub type Vector = euclid::default::Vector2D<f32>;

/// A size in device-space pixels.
///
/// Alias for ```euclid::default::Size2D<f32>```.
pub type Size = euclid::default::Size2D<f32>;

/// Alias for ```euclid::default::Box2D<f32>```
pub type Box2D = euclid::default::Box2D<f32>;

/// Alias for ```euclid::default::Transform2D<f32>```
pub type Transform = euclid::default::Transform2D<f32>;

/// An angle in radians (f32).
///
/// Alias for ```euclid::Angle<f32>```
pub type Angle = euclid::Angle<f32>;

/// Shorthand for `Point::new(x, y)`.
#[inline]
pub const fn point(x: f32, y: f32) -> Point {
    Point::new(x, y)
}

/// Shorthand for `Vector::new(x, y)`.
#[inline]
pub const fn vector(x: f32, y: f32) -> Vector {
    Vector::new(x, y)
}

/// Shorthand for `Size::new(w, h)`.
#[inline]
pub const fn size(w: f32, h: f32) -> Size {
    Size::new(w, h)
}
