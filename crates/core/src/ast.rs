//! Shared AST types.
//!
//! Trees are produced by the lifter and handed to downstream passes. They
//! live here so that the event and combinator modules can name tree kinds
//! without depending on the lifter.

use crate::source::Position;
use serde_json::json;
use std::fmt;

// ──────────────────────────────────────────────
// Tree kinds
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InnerTreeType {
    Block,
    Call,
    Decl,
    Esc,
    Fun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafTreeType {
    LeftName,
    RightName,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeType {
    Inner(InnerTreeType),
    Leaf(LeafTreeType),
}

impl InnerTreeType {
    pub fn name(self) -> &'static str {
        match self {
            InnerTreeType::Block => "Block",
            InnerTreeType::Call => "Call",
            InnerTreeType::Decl => "Decl",
            InnerTreeType::Esc => "Esc",
            InnerTreeType::Fun => "Fun",
        }
    }
}

impl LeafTreeType {
    pub fn name(self) -> &'static str {
        match self {
            LeafTreeType::LeftName => "LeftName",
            LeafTreeType::RightName => "RightName",
            LeafTreeType::Value => "Value",
        }
    }
}

impl TreeType {
    pub fn name(self) -> &'static str {
        match self {
            TreeType::Inner(t) => t.name(),
            TreeType::Leaf(t) => t.name(),
        }
    }
}

// ──────────────────────────────────────────────
// Names and values
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Name {
    /// A name as written in source
    Parsed(String),
    /// A name that refers to a language builtin regardless of scope
    Builtin(String),
}

impl Name {
    pub fn text(&self) -> &str {
        match self {
            Name::Parsed(t) | Name::Builtin(t) => t,
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Parsed(t) => f.write_str(t),
            Name::Builtin(t) => write!(f, "builtin`{}`", t),
        }
    }
}

/// Decodes token text into a name. Fails for empty text.
pub fn decode_name(text: &str) -> Option<Name> {
    let text = text.strip_prefix('\\').unwrap_or(text);
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        None
    } else {
        Some(Name::Parsed(text.to_owned()))
    }
}

/// Functions the builder refers to when it synthesizes trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFn {
    /// Joins the elements of an implicit tuple
    Comma,
    /// Marks a subtree the parser could not interpret
    Error,
    /// Packs its arguments into a list
    Listify,
    /// Attaches documentation to the decorated construct
    DocComment,
    /// A free-standing comment kept in the tree
    EmbeddedComment,
}

impl BuiltinFn {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinFn::Comma => ",",
            BuiltinFn::Error => "error",
            BuiltinFn::Listify => "list",
            BuiltinFn::DocComment => "@docComment",
            BuiltinFn::EmbeddedComment => "REM",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    List(Vec<Value>),
    Function(BuiltinFn),
}

impl Value {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => json!(b),
            Value::Int(n) => json!(n),
            Value::Float(x) => json!(x),
            Value::Str(s) => json!(s),
            Value::Symbol(s) => json!(format!("\\{}", s)),
            Value::List(items) => items.iter().map(Value::to_json).collect(),
            Value::Function(f) => json!(format!("fn {}", f.name())),
        }
    }
}

/// Decodes the text of a literal token into a value.
///
/// Numbers become `Int` when they fit, otherwise `Float`. Quoted string
/// content is taken as is. `true`, `false` and `null` are recognized words.
pub fn unpack_value(text: &str, token_type: crate::part::TokenType) -> Option<Value> {
    use crate::part::TokenType;
    match token_type {
        TokenType::Number => {
            let digits: String = text.chars().filter(|c| *c != '_').collect();
            if let Ok(n) = digits.parse::<i64>() {
                Some(Value::Int(n))
            } else if let Some(hex) = digits.strip_prefix("0x") {
                i64::from_str_radix(hex, 16).ok().map(Value::Int)
            } else {
                digits.parse::<f64>().ok().map(Value::Float)
            }
        }
        TokenType::QuotedString => Some(Value::Str(text.to_owned())),
        TokenType::Word => match text {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            "null" => Some(Value::Null),
            _ => None,
        },
        _ => None,
    }
}

// ──────────────────────────────────────────────
// Trees
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum LeafContent {
    LeftName(Name),
    RightName(Name),
    Value(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafTree {
    pub pos: Position,
    pub content: LeafContent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InnerTree {
    pub pos: Position,
    pub kind: InnerTreeType,
    pub children: Vec<Tree>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Leaf(LeafTree),
    Inner(InnerTree),
}

impl Tree {
    pub fn value(pos: Position, value: Value) -> Tree {
        Tree::Leaf(LeafTree {
            pos,
            content: LeafContent::Value(value),
        })
    }

    pub fn inner(kind: InnerTreeType, pos: Position, children: Vec<Tree>) -> Tree {
        Tree::Inner(InnerTree {
            pos,
            kind,
            children,
        })
    }

    pub fn pos(&self) -> &Position {
        match self {
            Tree::Leaf(l) => &l.pos,
            Tree::Inner(i) => &i.pos,
        }
    }

    pub fn tree_type(&self) -> TreeType {
        match self {
            Tree::Leaf(l) => TreeType::Leaf(match l.content {
                LeafContent::LeftName(_) => LeafTreeType::LeftName,
                LeafContent::RightName(_) => LeafTreeType::RightName,
                LeafContent::Value(_) => LeafTreeType::Value,
            }),
            Tree::Inner(i) => TreeType::Inner(i.kind),
        }
    }

    pub fn children(&self) -> &[Tree] {
        match self {
            Tree::Leaf(_) => &[],
            Tree::Inner(i) => &i.children,
        }
    }

    /// True for `Call(Value(Error), ...)`, the placeholder for unparsable input.
    pub fn is_error(&self) -> bool {
        matches!(
            self.children().first(),
            Some(Tree::Leaf(LeafTree {
                content: LeafContent::Value(Value::Function(BuiltinFn::Error)),
                ..
            }))
        ) && self.tree_type() == TreeType::Inner(InnerTreeType::Call)
    }

    /// Structural JSON: `["Kind", content]` for leaves and
    /// `["Kind", [children...]]` for inner trees.
    pub fn to_json(&self) -> serde_json::Value {
        let kind = self.tree_type().name();
        match self {
            Tree::Leaf(l) => match &l.content {
                LeafContent::LeftName(n) | LeafContent::RightName(n) => {
                    json!([kind, n.to_string()])
                }
                LeafContent::Value(v) => json!([kind, v.to_json()]),
            },
            Tree::Inner(i) => {
                let children: Vec<_> = i.children.iter().map(Tree::to_json).collect();
                json!([kind, children])
            }
        }
    }
}
