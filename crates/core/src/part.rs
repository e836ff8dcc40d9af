//! Parse parts: the input the combinator engine consumes.
//!
//! The grouping pass that runs before us turns a token stream into a tree of
//! operator applications and then flattens it back into a sequence where every
//! group is bracketed by a [`Part::LeftParen`] and a matching
//! [`Part::RightParen`]. Tokens stay in source order between them.

use crate::source::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// Identifiers and keywords -- distinguished by the grammar
    Word,
    /// Numeric literal text, undecoded
    Number,
    /// Content of a quoted string, delimiters excluded
    QuotedString,
    Punctuation,
    Comment,
    Space,
    /// Text the lexer could not classify
    Error,
}

/// Close brackets. Used as the default stop set when skipping unparsable input.
pub const CLOSE_BRACKETS: &[&str] = &[")", "]", "}"];

#[derive(Debug, Clone, PartialEq)]
pub struct CstToken {
    pub text: String,
    pub token_type: TokenType,
    pub pos: Position,
    /// True for tokens inserted by an earlier pass rather than lexed.
    pub synthetic: bool,
}

impl CstToken {
    pub fn new(text: impl Into<String>, token_type: TokenType, pos: Position) -> Self {
        CstToken {
            text: text.into(),
            token_type,
            pos,
            synthetic: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.token_type == TokenType::Error
    }
}

/// Broad shape of the operator that produced a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorType {
    Prefix,
    Infix,
    Postfix,
    Separator,
    Nullary,
}

/// The operator a pseudo-parenthesis brackets.
#[derive(Debug, Clone, PartialEq)]
pub struct Paren {
    pub operator: String,
    pub operator_type: OperatorType,
    pub pos: Position,
}

impl Paren {
    pub fn new(operator: impl Into<String>, operator_type: OperatorType, pos: Position) -> Self {
        Paren {
            operator: operator.into(),
            operator_type,
            pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Token(CstToken),
    LeftParen(Paren),
    RightParen(Paren),
}

impl Part {
    pub fn pos(&self) -> &Position {
        match self {
            Part::Token(t) => &t.pos,
            Part::LeftParen(p) | Part::RightParen(p) => &p.pos,
        }
    }

    pub fn as_token(&self) -> Option<&CstToken> {
        match self {
            Part::Token(t) => Some(t),
            _ => None,
        }
    }

    /// True for a token, other than an error token, whose text is `text`.
    pub fn is_token_text(&self, text: &str) -> bool {
        matches!(self, Part::Token(t) if !t.is_error() && t.text == text)
    }

    /// How this part reads inside an error placeholder tree.
    pub fn diagnostic_text(&self) -> String {
        match self {
            Part::Token(t) => t.text.clone(),
            Part::LeftParen(p) => format!("`({}`", p.operator),
            Part::RightParen(p) => format!("`{})`", p.operator),
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Token(t) => write!(f, "{:?}@{}", t.text, t.pos.left),
            Part::LeftParen(p) => write!(f, "({}", p.operator),
            Part::RightParen(p) => write!(f, "{})", p.operator),
        }
    }
}
