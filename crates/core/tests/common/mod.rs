//! Test input scanner.
//!
//! Just enough lexing to write test inputs as text: words, numbers, quoted
//! strings (content only), single-character punctuation, `//` and `/* */`
//! comments. `(` and `)` become group markers for operator `Paren`.

#![allow(dead_code)]

use astbuild_core::{
    CodeLocation, Comment, CommentIndex, CommentType, CstToken, OperatorType, Paren, Part,
    Position, TokenType,
};

pub struct Scanned {
    pub parts: Vec<Part>,
    pub comments: CommentIndex,
}

pub fn scan(src: &str) -> Scanned {
    let loc = CodeLocation::new("test.src");
    let pos = |left: usize, right: usize| Position::new(loc.clone(), left, right);
    let bytes = src.as_bytes();
    let mut parts = Vec::new();
    let mut comments = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        if c.is_ascii_whitespace() {
            i += 1;
        } else if src[i..].starts_with("//") {
            i = src[i..].find('\n').map_or(bytes.len(), |n| i + n);
            comments.push(Comment::new(&src[start..i], CommentType::Line, pos(start, i)));
        } else if src[i..].starts_with("/*") {
            i = src[i + 2..].find("*/").map_or(bytes.len(), |n| i + 2 + n + 2);
            comments.push(Comment::new(&src[start..i], CommentType::Block, pos(start, i)));
        } else if c == b'"' {
            let end = src[i + 1..].find('"').map_or(bytes.len(), |n| i + 1 + n);
            let text = &src[i + 1..end];
            parts.push(Part::Token(CstToken::new(
                text,
                TokenType::QuotedString,
                pos(i + 1, end),
            )));
            i = (end + 1).min(bytes.len());
        } else if c == b'(' || c == b')' {
            i += 1;
            let paren = Paren::new("Paren", OperatorType::Nullary, pos(start, i));
            parts.push(if c == b'(' {
                Part::LeftParen(paren)
            } else {
                Part::RightParen(paren)
            });
        } else if c.is_ascii_digit() {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            parts.push(token(&src[start..i], TokenType::Number, pos(start, i)));
        } else if c.is_ascii_alphabetic() || c == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            parts.push(token(&src[start..i], TokenType::Word, pos(start, i)));
        } else {
            i += src[i..].chars().next().map_or(1, char::len_utf8);
            parts.push(token(&src[start..i], TokenType::Punctuation, pos(start, i)));
        }
    }
    Scanned {
        parts,
        comments: CommentIndex::new(comments),
    }
}

fn token(text: &str, token_type: TokenType, pos: Position) -> Part {
    Part::Token(CstToken::new(text, token_type, pos))
}

/// A small statement language:
///
/// ```text
/// Root := Stmt* EOF
/// Stmt := DocComment(Decl) | Call | <skip to `;`>
/// Decl := `let` Word `=` Expr `;`
/// Call := Word `(` (Expr (`,` Expr)*)? `)` `;`
/// Expr := Sum | Atom
/// Sum  := Atom `+` Atom
/// Atom := Number | Word | String+ | `(` Expr `)`
/// ```
pub fn statement_grammar() -> astbuild_core::Productions {
    use astbuild_core::dsl::*;
    let mut g = astbuild_core::Productions::new();
    let declare = |g: &mut astbuild_core::Productions, production: &str, c| {
        g.declare(production, c).expect("fresh production name");
    };
    declare(&mut g, "Root", cat([any(reference("Stmt")), eof()]));
    declare(
        &mut g,
        "Stmt",
        or([
            doc_comment(reference("Decl")),
            reference("Call"),
            garbage("Stmt").stop_after([";"]).require_some().into(),
        ]),
    );
    declare(
        &mut g,
        "Decl",
        decl_tree(cat([
            token("let"),
            left_name(word()),
            token("="),
            reference("Expr"),
            token(";"),
        ])),
    );
    declare(
        &mut g,
        "Call",
        call_tree(cat([
            name(word()),
            open(),
            opt(cat([
                reference("Expr"),
                any(cat([token(","), reference("Expr")])),
            ])),
            close(),
            token(";"),
        ])),
    );
    declare(&mut g, "Expr", or([reference("Sum"), reference("Atom")]));
    declare(
        &mut g,
        "Sum",
        call_tree(cat([
            reference("Atom"),
            name_of("+"),
            shift_left(),
            reference("Atom"),
        ])),
    );
    declare(
        &mut g,
        "Atom",
        or([
            value(number()),
            name(word()),
            join_strings(),
            cat([open(), reference("Expr"), close()]),
        ]),
    );
    g
}

/// True if `tree` or any subtree is an error placeholder.
pub fn contains_error(tree: &astbuild_core::Tree) -> bool {
    tree.is_error() || tree.children().iter().any(contains_error)
}
