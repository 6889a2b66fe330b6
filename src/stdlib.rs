// SPDX: CC0-1.0

use crate::eval::{Axis, Fun, Ident, Idents};
use crate::Number;
use core::f64::consts; // assumes Number = f64

pub const X: &str = "x";
pub const Y: &str = "y";

/// The identifier table every expression compiles against: the two free
/// variables, the usual constants, and the elementary functions.
pub fn builtins() -> Idents {
    let mut ret = Idents::new();

    ret.insert(X.to_owned(), Ident::Var(Axis::X));
    ret.insert(Y.to_owned(), Ident::Var(Axis::Y));

    ret.insert("pi".to_owned(), Ident::Const(consts::PI));
    ret.insert("tau".to_owned(), Ident::Const(consts::TAU));
    ret.insert("e".to_owned(), Ident::Const(consts::E));

    fun(&mut ret, "abs", 1, |a| a[0].abs());
    fun(&mut ret, "sqrt", 1, |a| a[0].sqrt());
    fun(&mut ret, "exp", 1, |a| a[0].exp());
    fun(&mut ret, "ln", 1, |a| a[0].ln());
    fun(&mut ret, "log", 2, |a| a[0].log(a[1]));

    // trig
    fun(&mut ret, "sin", 1, |a| a[0].sin());
    fun(&mut ret, "cos", 1, |a| a[0].cos());
    fun(&mut ret, "tan", 1, |a| a[0].tan());
    fun(&mut ret, "asin", 1, |a| a[0].asin());
    fun(&mut ret, "acos", 1, |a| a[0].acos());
    fun(&mut ret, "atan", 1, |a| a[0].atan());
    fun(&mut ret, "arcsin", 1, |a| a[0].asin());
    fun(&mut ret, "arccos", 1, |a| a[0].acos());
    fun(&mut ret, "arctan", 1, |a| a[0].atan());
    fun(&mut ret, "sinh", 1, |a| a[0].sinh());
    fun(&mut ret, "cosh", 1, |a| a[0].cosh());
    fun(&mut ret, "tanh", 1, |a| a[0].tanh());

    ret
}

fn fun(idents: &mut Idents, name: &str, arity: usize, f: fn(&[Number]) -> Number) {
    idents.insert(name.to_owned(), Ident::Fun(Fun::new(arity, f)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_bind_to_their_axis() {
        let idents = builtins();
        assert!(matches!(idents.get(X), Some(Ident::Var(Axis::X))));
        assert!(matches!(idents.get(Y), Some(Ident::Var(Axis::Y))));
    }

    #[test]
    fn log_takes_a_base() {
        let idents = builtins();
        match idents.get("log") {
            Some(Ident::Fun(f)) => assert_eq!(f.arity, 2),
            other => panic!("unexpected entry: {other:?}"),
        }
    }
}
