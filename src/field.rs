// SPDX: CC0-1.0

use crate::{Number, Point};
use core::{fmt, num::NonZeroU16, ops::Range};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WindowErr {
    EmptyAxis {
        axis: char,
        min: Number,
        max: Number,
    },
    NonFinite {
        axis: char,
        value: Number,
    },
}

impl fmt::Display for WindowErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAxis { axis, min, max } => {
                write!(f, "{axis} bounds are empty: min {min} is not less than max {max}")
            }
            Self::NonFinite { axis, value } => {
                write!(f, "{axis} bound {value} is not finite")
            }
        }
    }
}

/// Viewing rectangle plus grid density. A constructed `Window` always has
/// finite bounds with `min < max` on both axes, so sampling never has to
/// re-check them.
#[derive(Clone, Debug, PartialEq)]
pub struct Window {
    x: Range<Number>,
    y: Range<Number>,
    density: NonZeroU16,
}

impl Window {
    pub fn new(
        x: Range<Number>,
        y: Range<Number>,
        density: NonZeroU16,
    ) -> Result<Self, WindowErr> {
        for (axis, range) in [('x', &x), ('y', &y)] {
            for value in [range.start, range.end] {
                if !value.is_finite() {
                    return Err(WindowErr::NonFinite { axis, value });
                }
            }
            if range.start >= range.end {
                return Err(WindowErr::EmptyAxis {
                    axis,
                    min: range.start,
                    max: range.end,
                });
            }
        }
        Ok(Self { x, y, density })
    }

    pub const fn x(&self) -> &Range<Number> {
        &self.x
    }

    pub const fn y(&self) -> &Range<Number> {
        &self.y
    }

    pub const fn density(&self) -> NonZeroU16 {
        self.density
    }

    /// Spacing between grid neighbors on each axis. With a single-point
    /// grid there are no neighbors; the full span stands in so arrow
    /// scaling stays meaningful.
    pub fn step(&self) -> Point<Number> {
        Point::new(
            step_of(&self.x, self.density.get()),
            step_of(&self.y, self.density.get()),
        )
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("x range", &self.x)
            .field("y range", &self.y)
            .field("density", &self.density)
            .finish()
    }
}

fn step_of(range: &Range<Number>, n: u16) -> Number {
    if n > 1 {
        (range.end - range.start) / Number::from(n - 1)
    } else {
        range.end - range.start
    }
}

/// `i`-th of `n` evenly spaced coordinates, inclusive of both endpoints.
/// The lerp form lands exactly on the bounds at both ends.
fn coord(range: &Range<Number>, i: u16, n: u16) -> Number {
    if n == 1 {
        return range.start;
    }
    let t = Number::from(i) / Number::from(n - 1);
    range.start * (1.0 - t) + range.end * t
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldArrow {
    pub at: Point<Number>,
    /// Unit direction of the solution curve through `at`; `None` marks a
    /// point whose slope is not finite.
    pub dir: Option<Point<Number>>,
}

/// One full sampling of a window: `density × density` arrows in row-major
/// order, rows advancing in `y`. Rebuilt from scratch on every redraw.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSample {
    arrows: Vec<FieldArrow>,
    density: NonZeroU16,
    step: Point<Number>,
}

impl FieldSample {
    pub fn arrows(&self) -> &[FieldArrow] {
        &self.arrows
    }

    /// Arrows whose direction is defined, as `(position, unit vector)`.
    pub fn defined(&self) -> impl Iterator<Item = (Point<Number>, Point<Number>)> + '_ {
        self.arrows
            .iter()
            .filter_map(|arrow| arrow.dir.map(|dir| (arrow.at, dir)))
    }

    pub const fn density(&self) -> NonZeroU16 {
        self.density
    }

    pub const fn step(&self) -> Point<Number> {
        self.step
    }
}

/// Sample the slope function over the window's grid.
///
/// Structural failures of `f` (an expression that cannot be evaluated at
/// all) abort the sample. A slope that merely comes out non-finite is not a
/// failure: that arrow is marked undefined and the renderer skips it.
pub fn sample<F, E>(mut f: F, win: &Window) -> Result<FieldSample, E>
where
    F: FnMut(Point<Number>) -> Result<Number, E>,
{
    let n = win.density().get();
    let mut arrows = Vec::with_capacity(usize::from(n) * usize::from(n));

    for yi in 0..n {
        let y = coord(win.y(), yi, n);
        for xi in 0..n {
            let x = coord(win.x(), xi, n);
            let at = Point::new(x, y);
            let slope = f(at)?;
            arrows.push(FieldArrow {
                at,
                dir: direction(slope),
            });
        }
    }

    Ok(FieldSample {
        arrows,
        density: win.density(),
        step: win.step(),
    })
}

/// Unit tangent of `(1, slope)`, or `None` for a non-finite slope.
fn direction(slope: Number) -> Option<Point<Number>> {
    if !slope.is_finite() {
        return None;
    }
    let mut mag = slope.hypot(1.0);
    // at least 1 for any finite slope, but keep the raw tangent rather
    // than divide by a degenerate magnitude
    if !mag.is_normal() {
        mag = 1.0;
    }
    Some(Point::new(1.0 / mag, slope / mag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn win(x: Range<Number>, y: Range<Number>, n: u16) -> Window {
        Window::new(x, y, NonZeroU16::new(n).unwrap()).unwrap()
    }

    #[test]
    fn grid_shape_and_corners() {
        let w = win(-4.0..4.0, -4.0..4.0, 5);
        let field = sample(|at| Ok::<_, ()>(at.x + at.y), &w).unwrap();
        let arrows = field.arrows();

        assert_eq!(arrows.len(), 25);
        assert_eq!(arrows[0].at, Point::new(-4.0, -4.0));
        assert_eq!(arrows[4].at, Point::new(4.0, -4.0));
        assert_eq!(arrows[20].at, Point::new(-4.0, 4.0));
        assert_eq!(arrows[24].at, Point::new(4.0, 4.0));
    }

    #[test]
    fn corners_are_exact_for_awkward_bounds() {
        let w = win(0.1..0.3, -0.7..0.2, 7);
        let field = sample(|_| Ok::<_, ()>(0.0), &w).unwrap();
        let last = field.arrows().last().unwrap();
        assert_eq!(last.at, Point::new(0.3, 0.2));
    }

    #[test]
    fn directions_are_unit_length() {
        let w = win(-4.0..4.0, -4.0..4.0, 9);
        let field = sample(|at| Ok::<_, ()>(at.x * at.y - 3.0), &w).unwrap();
        for (_, dir) in field.defined() {
            assert_relative_eq!(dir.x.hypot(dir.y), 1.0, epsilon = 1e-12);
        }
        assert_eq!(field.defined().count(), field.arrows().len());
    }

    #[test]
    fn nonfinite_slope_is_marked_undefined() {
        let w = win(-1.0..1.0, -1.0..1.0, 3);
        let field = sample(|at| Ok::<_, ()>(1.0 / at.x), &w).unwrap();
        for (i, arrow) in field.arrows().iter().enumerate() {
            if i % 3 == 1 {
                // the middle column sits exactly on x = 0
                assert_eq!(arrow.at.x, 0.0);
                assert_eq!(arrow.dir, None);
            } else {
                assert!(arrow.dir.is_some());
            }
        }
    }

    #[test]
    fn constant_slope_gives_a_uniform_field() {
        let w = win(-2.0..2.0, -2.0..2.0, 4);
        let field = sample(|_| Ok::<_, ()>(3.0), &w).unwrap();
        let mag = 10.0_f64.sqrt();
        for (_, dir) in field.defined() {
            assert_relative_eq!(dir.x, 1.0 / mag, epsilon = 1e-12);
            assert_relative_eq!(dir.y, 3.0 / mag, epsilon = 1e-12);
        }
        assert_eq!(field.defined().count(), 16);
    }

    #[test]
    fn sampling_is_idempotent() {
        let w = win(-3.0..3.0, -1.0..1.0, 6);
        let f = |at: Point<Number>| Ok::<_, ()>(at.y / at.x);
        let first = sample(f, &w).unwrap();
        let second = sample(f, &w).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_point_grid() {
        let w = win(-4.0..4.0, 0.0..1.0, 1);
        let field = sample(|_| Ok::<_, ()>(1.0), &w).unwrap();
        assert_eq!(field.arrows().len(), 1);
        assert_eq!(field.arrows()[0].at, Point::new(-4.0, 0.0));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = Window::new(5.0..1.0, -1.0..1.0, NonZeroU16::new(3).unwrap()).unwrap_err();
        assert!(matches!(err, WindowErr::EmptyAxis { axis: 'x', .. }));

        let err = Window::new(-1.0..1.0, 2.0..2.0, NonZeroU16::new(3).unwrap()).unwrap_err();
        assert!(matches!(err, WindowErr::EmptyAxis { axis: 'y', .. }));
    }

    #[test]
    fn nan_bounds_are_rejected() {
        let err =
            Window::new(Number::NAN..1.0, -1.0..1.0, NonZeroU16::new(3).unwrap()).unwrap_err();
        assert!(matches!(err, WindowErr::NonFinite { axis: 'x', .. }));
    }

    #[test]
    fn evaluation_failure_aborts_the_sample() {
        let w = win(-1.0..1.0, -1.0..1.0, 3);
        let result = sample(|at| if at.x > 0.0 { Err("boom") } else { Ok(0.0) }, &w);
        assert_eq!(result.unwrap_err(), "boom");
    }
}
