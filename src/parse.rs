// SPDX: CC0-1.0

// shunting yard (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm),
// with two deviations from the textbook loop: adjacent values multiply
// implicitly, and '-' resolves to subtraction or negation from the token on
// its left

use crate::{
    eval::{Ident, Idents, Operation, OperationKind, Operator, Program},
    lex::{LexErr, LexErrKind, Lexer, Span, TokenKind},
    Number,
};
use core::{fmt, num::ParseFloatError};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub enum ParseErrKind {
    Lex(LexErrKind),
    Number(ParseFloatError),
    ParenMismatch,
    MissingOperand {
        name: String,
        arity: usize,
        found: usize,
    },
    LeftoverValues {
        found: usize,
    },
    Empty,
}

impl fmt::Display for ParseErrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "{err}"),
            Self::Number(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::MissingOperand { name, arity, found } => write!(
                f,
                "'{name}' requires {arity} operand{s}, but found {found}",
                s = if *arity == 1 { "" } else { "s" }
            ),
            Self::LeftoverValues { found } => {
                write!(f, "expression leaves {found} values, expected exactly 1")
            }
            Self::Empty => write!(f, "empty expression"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParseErr {
    pub kind: ParseErrKind,
    pub span: Span,
}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            kind: ParseErrKind::Lex(err.kind),
            span: err.span,
        }
    }
}

#[derive(Clone, Debug)]
enum PendingKind {
    Operator(Operator),
    Fun,
    OpenParen,
}

#[derive(Clone, Debug)]
struct Pending {
    kind: PendingKind,
    span: Span,
}

impl Pending {
    fn into_output(self) -> Operation {
        let kind = match self.kind {
            PendingKind::Operator(op) => OperationKind::Operator(op),
            PendingKind::Fun => OperationKind::Ident,
            PendingKind::OpenParen => unreachable!("parentheses never reach the output"),
        };
        Operation {
            kind,
            span: self.span,
        }
    }
}

fn shunt_operator(o1: Operator, span: Span, out: &mut Vec<Operation>, ops: &mut Vec<Pending>) {
    if !o1.is_prefix() {
        while let Some(top) = ops.last() {
            let pop = match top.kind {
                PendingKind::OpenParen => false,
                // a call binds tighter than any operator
                PendingKind::Fun => true,
                PendingKind::Operator(o2) => {
                    o2.precedence() > o1.precedence()
                        || (o2.precedence() == o1.precedence() && !o1.is_right_assoc())
                }
            };
            if !pop {
                break;
            }
            let top = ops.pop().unwrap();
            out.push(top.into_output());
        }
    }
    ops.push(Pending {
        kind: PendingKind::Operator(o1),
        span,
    });
}

pub fn parse(lex: Lexer<'_>, idents: &Idents) -> Result<Program, ParseErr> {
    let src = lex.src();
    let mut out: Vec<Operation> = Vec::new(); // output, in postfix order
    let mut ops: Vec<Pending> = Vec::new(); // operator stack

    // whether the previous token can end a value: an adjacent value after it
    // multiplies, and a '-' after it subtracts
    let mut after_value = false;

    for tok in lex {
        let tok = tok?;

        let begins_value = matches!(
            tok.kind,
            TokenKind::Number | TokenKind::Ident | TokenKind::OpenParen
        );
        if after_value && begins_value {
            // implicit multiplication: 2x, 2cos(x), (x+1)(x-1)
            shunt_operator(Operator::Mul, tok.span.clone(), &mut out, &mut ops);
        }

        after_value = match tok.kind {
            TokenKind::Number => {
                let num: Number = match tok.span.text().parse() {
                    Ok(val) => val,
                    Err(err) => {
                        return Err(ParseErr {
                            kind: ParseErrKind::Number(err),
                            span: tok.span,
                        });
                    }
                };
                out.push(Operation {
                    kind: OperationKind::Literal(num),
                    span: tok.span,
                });
                true
            }

            TokenKind::Ident => {
                if let Some(Ident::Fun(_)) = idents.get(tok.span.text()) {
                    ops.push(Pending {
                        kind: PendingKind::Fun,
                        span: tok.span,
                    });
                    // a function name heads a call; it is not a value yet
                    false
                } else {
                    // unknown names are assumed to be variables here and
                    // resolved (or rejected) at evaluation time
                    out.push(Operation {
                        kind: OperationKind::Ident,
                        span: tok.span,
                    });
                    true
                }
            }

            TokenKind::Plus => {
                shunt_operator(Operator::Add, tok.span, &mut out, &mut ops);
                false
            }

            TokenKind::Minus => {
                let op = if after_value {
                    Operator::Sub
                } else {
                    Operator::Neg
                };
                shunt_operator(op, tok.span, &mut out, &mut ops);
                false
            }

            TokenKind::Star => {
                shunt_operator(Operator::Mul, tok.span, &mut out, &mut ops);
                false
            }

            TokenKind::Slash => {
                shunt_operator(Operator::Div, tok.span, &mut out, &mut ops);
                false
            }

            TokenKind::Caret => {
                shunt_operator(Operator::Pow, tok.span, &mut out, &mut ops);
                false
            }

            TokenKind::Comma => {
                while matches!(ops.last(), Some(top) if !matches!(top.kind, PendingKind::OpenParen))
                {
                    let top = ops.pop().unwrap();
                    out.push(top.into_output());
                }
                false
            }

            TokenKind::OpenParen => {
                ops.push(Pending {
                    kind: PendingKind::OpenParen,
                    span: tok.span,
                });
                false
            }

            TokenKind::CloseParen => {
                loop {
                    match ops.pop() {
                        Some(top) if matches!(top.kind, PendingKind::OpenParen) => break,
                        Some(top) => out.push(top.into_output()),
                        None => {
                            return Err(ParseErr {
                                kind: ParseErrKind::ParenMismatch,
                                span: tok.span,
                            });
                        }
                    }
                }
                // a call's name sits directly under its parentheses
                if matches!(ops.last(), Some(top) if matches!(top.kind, PendingKind::Fun)) {
                    let fun = ops.pop().unwrap();
                    out.push(fun.into_output());
                }
                true
            }
        };
    }

    while let Some(top) = ops.pop() {
        if let PendingKind::OpenParen = top.kind {
            return Err(ParseErr {
                kind: ParseErrKind::ParenMismatch,
                span: top.span,
            });
        }
        out.push(top.into_output());
    }

    validate(&out, idents, &src)?;
    Ok(Program::new(out))
}

/// Walk the postfix program once, tracking how many values are on the stack.
/// Rejecting operand-count mistakes here means a malformed expression never
/// produces a program at all.
fn validate(out: &[Operation], idents: &Idents, src: &Arc<str>) -> Result<(), ParseErr> {
    let mut depth: usize = 0;

    for op in out {
        let (name, pops) = match op.kind {
            OperationKind::Literal(_) => (None, 0),
            OperationKind::Operator(o) => (Some(o.name().to_owned()), o.arity()),
            OperationKind::Ident => match idents.get(op.span.text()) {
                Some(Ident::Fun(fun)) => (Some(op.span.text().to_owned()), fun.arity),
                // variables, constants, and not-yet-known names push a value
                _ => (None, 0),
            },
        };

        if depth < pops {
            return Err(ParseErr {
                kind: ParseErrKind::MissingOperand {
                    name: name.unwrap(),
                    arity: pops,
                    found: depth,
                },
                span: op.span.clone(),
            });
        }
        depth = depth - pops + 1;
    }

    match depth {
        1 => Ok(()),
        0 => Err(ParseErr {
            kind: ParseErrKind::Empty,
            span: Span::all(Arc::clone(src)),
        }),
        found => Err(ParseErr {
            kind: ParseErrKind::LeftoverValues { found },
            span: Span::all(Arc::clone(src)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib;

    fn try_compile(src: &str) -> Result<Program, ParseErr> {
        let idents = stdlib::builtins();
        let src: Arc<str> = Arc::from(src);
        parse(Lexer::new(&src), &idents)
    }

    fn kinds(prog: &Program) -> Vec<OperationKind> {
        prog.ops().map(|op| op.kind).collect()
    }

    #[test]
    fn postfix_order() {
        let prog = try_compile("x - y").unwrap();
        assert_eq!(
            kinds(&prog),
            [
                OperationKind::Ident,
                OperationKind::Ident,
                OperationKind::Operator(Operator::Sub),
            ]
        );
    }

    #[test]
    fn implicit_multiplication_matches_explicit() {
        let implicit = try_compile("2x").unwrap();
        let explicit = try_compile("2 * x").unwrap();
        assert_eq!(kinds(&implicit), kinds(&explicit));
    }

    #[test]
    fn dangling_operator_fails_to_compile() {
        let err = try_compile("2 +* x").unwrap_err();
        match err.kind {
            ParseErrKind::MissingOperand { ref name, .. } => assert_eq!(name, "add"),
            ref other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.span.text(), "+");
    }

    #[test]
    fn unbalanced_parens() {
        assert!(matches!(
            try_compile("(x").unwrap_err().kind,
            ParseErrKind::ParenMismatch
        ));
        assert!(matches!(
            try_compile("x)").unwrap_err().kind,
            ParseErrKind::ParenMismatch
        ));
    }

    #[test]
    fn empty_input() {
        assert!(matches!(
            try_compile("").unwrap_err().kind,
            ParseErrKind::Empty
        ));
        assert!(matches!(
            try_compile("   ").unwrap_err().kind,
            ParseErrKind::Empty
        ));
    }

    #[test]
    fn stray_comma_leaves_two_values() {
        assert!(matches!(
            try_compile("x, y").unwrap_err().kind,
            ParseErrKind::LeftoverValues { found: 2 }
        ));
    }

    #[test]
    fn malformed_number() {
        assert!(matches!(
            try_compile("1.2.3").unwrap_err().kind,
            ParseErrKind::Number(_)
        ));
    }

    #[test]
    fn wrong_call_arity_fails_to_compile() {
        let err = try_compile("log(x)").unwrap_err();
        match err.kind {
            ParseErrKind::MissingOperand {
                ref name,
                arity,
                found,
            } => {
                assert_eq!(name, "log");
                assert_eq!(arity, 2);
                assert_eq!(found, 1);
            }
            ref other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_name_parses_as_variable() {
        // deferred to evaluation, where it reports with a suggestion
        assert!(try_compile("foo + x").is_ok());
    }
}
