// SPDX: CC0-1.0

pub mod eval;
pub mod field;
pub mod lex;
pub mod parse;
pub mod plot;
pub mod shell;
pub mod stdlib;

use crate::{
    eval::{Idents, Program},
    lex::Lexer,
    parse::ParseErr,
};
use std::sync::Arc;

pub type Number = f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    #[inline]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

/// Compile expression text into an evaluable program.
///
/// Everything downstream sees only `Program` and the structured errors; the
/// token stream never escapes this boundary.
pub fn compile(src: &Arc<str>, idents: &Idents) -> Result<Program, ParseErr> {
    parse::parse(Lexer::new(src), idents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{self, FieldSample, Window};
    use approx::assert_relative_eq;
    use core::num::NonZeroU16;

    fn sample_expr(expr: &str, win: &Window) -> FieldSample {
        let idents = stdlib::builtins();
        let src: Arc<str> = Arc::from(expr);
        let prog = compile(&src, &idents).expect("compile failure");
        let mut stack = Vec::new();
        field::sample(|at| eval::eval(&prog, &idents, at, &mut stack), win)
            .expect("sample failure")
    }

    #[test]
    fn poles_survive_the_whole_pipeline_as_undefined() {
        let win = Window::new(-1.0..1.0, -1.0..1.0, NonZeroU16::new(3).unwrap()).unwrap();
        let sampled = sample_expr("1/x", &win);

        let undefined: Vec<_> = sampled
            .arrows()
            .iter()
            .filter(|arrow| arrow.dir.is_none())
            .collect();
        assert_eq!(undefined.len(), 3);
        assert!(undefined.iter().all(|arrow| arrow.at.x == 0.0));
        assert_eq!(sampled.defined().count(), 6);
    }

    #[test]
    fn constant_expression_fills_the_grid_uniformly() {
        let win = Window::new(-4.0..4.0, -4.0..4.0, NonZeroU16::new(5).unwrap()).unwrap();
        let sampled = sample_expr("3", &win);

        let mag = 10.0_f64.sqrt();
        assert_eq!(sampled.defined().count(), 25);
        for (_, dir) in sampled.defined() {
            assert_relative_eq!(dir.x, 1.0 / mag, epsilon = 1e-12);
            assert_relative_eq!(dir.y, 3.0 / mag, epsilon = 1e-12);
        }
    }

    #[test]
    fn failed_compile_yields_no_program() {
        let idents = stdlib::builtins();
        let src: Arc<str> = Arc::from("2 +* x");
        assert!(compile(&src, &idents).is_err());
    }
}
