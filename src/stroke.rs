//! Stroke style inputs.

/// Properties of a stroked path.
///
/// All values are in device-space pixels; callers apply any view transform
/// to the path (and its width) before conversion. Hairline strokes
/// (`width == 0`) are resolved by the caller as well.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stroke {
    /// A stroke thickness.
    ///
    /// Must be > 0.
    ///
    /// Default: 1.0
    pub width: f32,

    /// The limit at which a sharp corner is drawn beveled.
    ///
    /// Default: 4.0
    pub miter_limit: f32,

    /// A stroke line cap.
    ///
    /// Default: Butt
    pub line_cap: LineCap,

    /// A stroke line join.
    ///
    /// Default: Miter
    pub line_join: LineJoin,
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke {
            width: 1.0,
            miter_limit: 4.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
        }
    }
}

/// Drawn at the beginning and end of an open contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineCap {
    /// No stroke extension.
    #[default]
    Butt,
    /// Adds a semicircle.
    Round,
    /// Adds a square.
    Square,
}

/// Specifies how corners are drawn where two segments meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineJoin {
    /// Extends to the miter limit.
    #[default]
    Miter,
    /// Adds a circular arc.
    Round,
    /// Connects outside edges.
    Bevel,
}
