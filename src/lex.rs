// SPDX: CC0-1.0

use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

/// Byte range into the shared source line. Cloning bumps a refcount, so
/// errors can carry their location without borrowing the source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    src: Arc<str>,
    start: usize,
    len: usize,
}

impl Span {
    #[inline]
    pub const fn new(src: Arc<str>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<str>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    pub fn src(&self) -> Arc<str> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

    pub fn widen(&mut self, by: usize) {
        self.len += by;
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Ident,
    Plus,
    /// Subtraction or negation; the parser decides from context.
    Minus,
    Star,
    Slash,
    Caret,
    Comma,
    OpenParen,
    CloseParen,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexErrKind {
    InvalidChar(char),
    Unsupported(char),
}

impl fmt::Display for LexErrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar(chr) => write!(f, "invalid character {chr:?}"),
            Self::Unsupported(chr) => write!(f, "unsupported character {chr:?}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub kind: LexErrKind,
    pub span: Span,
}

/// Characters we recognize but refuse; the shell attaches a tailored note
/// to each of these.
const UNSUPPORTED: [char; 8] = ['=', '<', '>', '|', '[', ']', '{', '}'];

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<str>,
    cur: Peekable<CharIndices<'src>>,
    failed: bool, // yield None after the first error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<str>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            failed: false,
        }
    }

    pub fn src(&self) -> Arc<str> {
        Arc::clone(self.src)
    }

    fn take_run<P>(&mut self, start: usize, kind: TokenKind, pred: P) -> Token
    where
        P: Fn(char) -> bool,
    {
        let mut span = Span::new(Arc::clone(self.src), start, 0);
        while let Some((_, chr)) = self.cur.peek().copied() {
            if pred(chr) {
                span.widen(1);
                self.cur.next();
            } else {
                break;
            }
        }
        Token { kind, span }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while matches!(self.cur.peek(), Some((_, chr)) if chr.is_ascii_whitespace()) {
            self.cur.next();
        }

        let (start, chr) = self.cur.peek().copied()?;
        let symbol = match chr {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '^' => Some(TokenKind::Caret),
            ',' => Some(TokenKind::Comma),
            '(' => Some(TokenKind::OpenParen),
            ')' => Some(TokenKind::CloseParen),
            _ => None,
        };
        if let Some(kind) = symbol {
            self.cur.next();
            return Some(Ok(Token {
                kind,
                span: Span::new(Arc::clone(self.src), start, 1),
            }));
        }

        if chr.is_ascii_alphabetic() {
            // maximal munch: a whole alphabetic run is one identifier
            return Some(Ok(self.take_run(start, TokenKind::Ident, |chr| {
                chr.is_ascii_alphabetic()
            })));
        }
        if chr.is_ascii_digit() || chr == '.' {
            return Some(Ok(self.take_run(start, TokenKind::Number, |chr| {
                chr.is_ascii_digit() || chr == '.'
            })));
        }

        self.failed = true;
        let kind = if UNSUPPORTED.contains(&chr) {
            LexErrKind::Unsupported(chr)
        } else {
            LexErrKind::InvalidChar(chr)
        };
        Some(Err(LexErr {
            kind,
            span: Span::new(Arc::clone(self.src), start, chr.len_utf8()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let src: Arc<str> = Arc::from(src);
        Lexer::new(&src)
            .map(|tok| tok.expect("lex failure").kind)
            .collect()
    }

    #[test]
    fn tokenizes_arithmetic() {
        use TokenKind::*;
        assert_eq!(
            kinds("2 + x*(y - 1)"),
            [Number, Plus, Ident, Star, OpenParen, Ident, Minus, Number, CloseParen]
        );
    }

    #[test]
    fn alphabetic_run_is_one_ident() {
        let src: Arc<str> = Arc::from("xy + cos");
        let toks: Vec<_> = Lexer::new(&src).map(|t| t.unwrap()).collect();
        assert_eq!(toks[0].kind, TokenKind::Ident);
        assert_eq!(toks[0].span.text(), "xy");
        assert_eq!(toks[2].span.text(), "cos");
    }

    #[test]
    fn number_run_keeps_dot() {
        let src: Arc<str> = Arc::from("1.25");
        let toks: Vec<_> = Lexer::new(&src).map(|t| t.unwrap()).collect();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].span.text(), "1.25");
    }

    #[test]
    fn invalid_char_stops_lexing() {
        let src: Arc<str> = Arc::from("x # y");
        let results: Vec<_> = Lexer::new(&src).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.kind, LexErrKind::InvalidChar('#'));
        assert_eq!(err.span.start(), 2);
    }

    #[test]
    fn equals_is_unsupported() {
        let src: Arc<str> = Arc::from("y = x");
        let err = Lexer::new(&src)
            .find_map(Result::err)
            .expect("should reject '='");
        assert_eq!(err.kind, LexErrKind::Unsupported('='));
    }
}
