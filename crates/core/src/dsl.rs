//! Helpers for writing grammars.
//!
//! Thin constructors over [`Combinator`] so a production reads close to its
//! PEG notation:
//!
//! ```ignore
//! grammar.declare("Root", cat([any(reference("Stmt")), eof()]))?;
//! grammar.declare("Stmt", call_tree(cat([name_of("print"), reference("Arg"), token(";")])))?;
//! ```

use crate::ast::{decode_name, InnerTreeType, LeafTreeType, Name, TreeType, Value};
use crate::combinator::{value_leaf, Combinator, CounterOwner, Garbage};
use crate::comments::Side;
use crate::diagnostics::MessageTemplate;
use crate::event::{Event, FinishedType, LeafEvent};
use crate::part::{CstToken, OperatorType, Part, TokenType};

// ──────────────────────────────────────────────
// Structure
// ──────────────────────────────────────────────

pub fn epsilon() -> Combinator {
    Combinator::epsilon()
}

pub fn reference(name: &str) -> Combinator {
    Combinator::reference(name)
}

pub fn cat(elements: impl IntoIterator<Item = Combinator>) -> Combinator {
    Combinator::cat(elements)
}

pub fn or(options: impl IntoIterator<Item = Combinator>) -> Combinator {
    Combinator::or(options)
}

/// Zero or one.
pub fn opt(c: Combinator) -> Combinator {
    or([c, epsilon()])
}

/// One or more.
pub fn many(c: Combinator) -> Combinator {
    Combinator::rep(c)
}

/// Zero or more.
pub fn any(c: Combinator) -> Combinator {
    opt(many(c))
}

/// Negative lookahead.
pub fn not(c: Combinator) -> Combinator {
    Combinator::NegLookahead(Box::new(c))
}

pub fn eof() -> Combinator {
    Combinator::Eof
}

pub fn debug(description: impl Into<String>, body: Combinator) -> Combinator {
    Combinator::Debug {
        description: description.into(),
        body: Box::new(body),
    }
}

// ──────────────────────────────────────────────
// Matching parts
// ──────────────────────────────────────────────

/// A token with exactly this text, consumed silently.
pub fn token(text: &str) -> Combinator {
    let owned = text.to_owned();
    Combinator::matching(format!("`{}`", text), false, move |p| p.is_token_text(&owned))
}

/// A token with exactly this text, emitted as a raw token.
pub fn emit_token(text: &str) -> Combinator {
    let owned = text.to_owned();
    Combinator::matching(format!("`{}`", text), true, move |p| p.is_token_text(&owned))
}

/// Any non-error token accepted by `filter`.
pub fn token_where(
    description: impl Into<String>,
    emit: bool,
    filter: impl Fn(&CstToken) -> bool + Send + Sync + 'static,
) -> Combinator {
    Combinator::matching(description, emit, move |p| match p {
        Part::Token(t) => !t.is_error() && filter(t),
        _ => false,
    })
}

pub fn of_type(token_type: TokenType, emit: bool) -> Combinator {
    token_where(format!("{:?}", token_type), emit, move |t| {
        t.token_type == token_type
    })
}

/// Emits any word token.
pub fn word() -> Combinator {
    of_type(TokenType::Word, true)
}

/// Emits any word token not in `reserved`.
pub fn unreserved_word(reserved: &[&str]) -> Combinator {
    let reserved: Vec<String> = reserved.iter().map(|s| (*s).to_owned()).collect();
    token_where("UnreservedWord", true, move |t| {
        t.token_type == TokenType::Word && !reserved.contains(&t.text)
    })
}

/// Emits any number token.
pub fn number() -> Combinator {
    of_type(TokenType::Number, true)
}

/// A word read as the name of a builtin.
pub fn builtin_name() -> Combinator {
    Combinator::where_(
        token_where("BuiltinName", false, |t| {
            t.token_type == TokenType::Word && decode_name(&t.text).is_some()
        }),
        |text, pos| LeafEvent::Name {
            name: Name::Builtin(decode_name(text).map_or_else(|| text.to_owned(), |n| n.text().to_owned())),
            pos: pos.clone(),
        },
    )
}

/// Succeeds before a token an earlier pass inserted.
pub fn synthetic_token() -> Combinator {
    Combinator::lookahead("synthetic", |s| {
        matches!(s.next(), Some(Part::Token(t)) if t.synthetic)
    })
}

/// The start of a group.
pub fn open() -> Combinator {
    Combinator::matching("(", false, |p| matches!(p, Part::LeftParen(_)))
}

/// The end of a group.
pub fn close() -> Combinator {
    Combinator::matching(")", false, |p| matches!(p, Part::RightParen(_)))
}

/// Succeeds before a group opened for operator `operator`.
pub fn operator(operator: &str) -> Combinator {
    let owned = operator.to_owned();
    Combinator::lookahead(format!("({}", operator), move |s| {
        matches!(s.next(), Some(Part::LeftParen(p)) if p.operator == owned)
    })
}

/// Succeeds before a group opened for an operator of this type.
pub fn operator_type(operator_type: OperatorType) -> Combinator {
    Combinator::lookahead(format!("{:?}", operator_type), move |s| {
        matches!(s.next(), Some(Part::LeftParen(p)) if p.operator_type == operator_type)
    })
}

// ──────────────────────────────────────────────
// Trees
// ──────────────────────────────────────────────

/// Brackets what `c` emits in a subtree of kind `finished`.
pub fn tree(c: Combinator, finished: FinishedType) -> Combinator {
    Combinator::emit_after(
        Combinator::emit_before(c, |p| Event::start(p.clone())),
        move |p| vec![Event::finish(p.clone(), finished)],
    )
}

fn inner(c: Combinator, kind: InnerTreeType) -> Combinator {
    tree(c, FinishedType::Tree(TreeType::Inner(kind)))
}

fn leaf(c: Combinator, kind: LeafTreeType) -> Combinator {
    tree(c, FinishedType::Tree(TreeType::Leaf(kind)))
}

pub fn block_tree(c: Combinator) -> Combinator {
    inner(c, InnerTreeType::Block)
}

pub fn call_tree(c: Combinator) -> Combinator {
    inner(c, InnerTreeType::Call)
}

pub fn decl_tree(c: Combinator) -> Combinator {
    inner(c, InnerTreeType::Decl)
}

pub fn esc_tree(c: Combinator) -> Combinator {
    inner(c, InnerTreeType::Esc)
}

pub fn fun_tree(c: Combinator) -> Combinator {
    inner(c, InnerTreeType::Fun)
}

pub fn soft_block_tree(c: Combinator) -> Combinator {
    tree(c, FinishedType::SoftBlock)
}

pub fn soft_comma_tree(c: Combinator) -> Combinator {
    tree(c, FinishedType::SoftComma)
}

pub fn left_name(c: Combinator) -> Combinator {
    leaf(c, LeafTreeType::LeftName)
}

pub fn name(c: Combinator) -> Combinator {
    leaf(c, LeafTreeType::RightName)
}

pub fn value(c: Combinator) -> Combinator {
    leaf(c, LeafTreeType::Value)
}

/// A name leaf for a token with exactly this text.
pub fn name_of(text: &str) -> Combinator {
    name(emit_token(text))
}

/// A value leaf that consumes nothing.
pub fn implied_value(v: Value, bias: Side) -> Combinator {
    value(Combinator::implied(bias, move |p, out| {
        out.push(Event::value(v.clone(), p.clone()))
    }))
}

/// A name leaf that consumes nothing.
pub fn implied_name(n: Name, bias: Side) -> Combinator {
    name(Combinator::implied(bias, move |p, out| {
        out.push(Event::name(n.clone(), p.clone()))
    }))
}

/// Swaps the two subtrees completed most recently.
pub fn shift_left() -> Combinator {
    Combinator::emit_after(epsilon(), |p| vec![Event::ShiftLeft { pos: p.clone() }])
}

/// Opens a subtree whose end is emitted separately, by
/// [`finish_split_call`] or [`finish_split_comma_soft`].
pub fn start_split_tree() -> Combinator {
    Combinator::emit_before(epsilon(), |p| Event::start(p.clone()))
}

pub fn finish_split_call() -> Combinator {
    let finished = FinishedType::Tree(TreeType::Inner(InnerTreeType::Call));
    Combinator::emit_before(epsilon(), move |p| Event::finish(p.clone(), finished))
}

pub fn finish_split_comma_soft() -> Combinator {
    Combinator::emit_before(epsilon(), |p| Event::finish(p.clone(), FinishedType::SoftComma))
}

// ──────────────────────────────────────────────
// Substitution
// ──────────────────────────────────────────────

/// A token with text `text`, lifted as the name `to`.
pub fn rename(text: &str, to: Name) -> Combinator {
    name(Combinator::where_(token(text), move |_, p| LeafEvent::Name {
        name: to.clone(),
        pos: p.clone(),
    }))
}

/// A token with text `text`, lifted as the name `to` written as a word or
/// punctuation token.
pub fn rename_token(text: &str, to: &str) -> Combinator {
    let to = to.to_owned();
    let token_type = if to.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        TokenType::Word
    } else {
        TokenType::Punctuation
    };
    name(Combinator::where_(token(text), move |_, p| {
        LeafEvent::Token(CstToken::new(to.clone(), token_type, p.clone()))
    }))
}

/// A token with text `text`, lifted as the string value of that text.
pub fn as_value(text: &str) -> Combinator {
    revalue(text, Value::Str(text.to_owned()))
}

/// A token with text `text`, lifted as `symbol`.
pub fn as_symbol(text: &str, symbol: &str) -> Combinator {
    revalue(text, Value::Symbol(symbol.to_owned()))
}

/// A token with text `text`, lifted as `v`.
pub fn revalue(text: &str, v: Value) -> Combinator {
    value(Combinator::where_(token(text), move |_, p| value_leaf(v.clone(), p)))
}

// ──────────────────────────────────────────────
// Recovery, comments, counters, strings
// ──────────────────────────────────────────────

/// Skips unparsable input in place of `production`; see [`Garbage`] for the
/// builder methods.
pub fn garbage(production: &str) -> Garbage {
    Garbage::new(production)
}

pub fn problem(matcher: Combinator, template: MessageTemplate) -> Combinator {
    Combinator::Problem {
        matcher: Box::new(matcher),
        template,
    }
}

pub fn doc_comment(decorated: Combinator) -> Combinator {
    Combinator::DocComment(Box::new(decorated))
}

pub fn comments_to_calls() -> Combinator {
    Combinator::CommentsToCalls
}

pub fn counter(owner: CounterOwner, body: Combinator) -> Combinator {
    Combinator::Counter {
        owner,
        body: Box::new(body),
    }
}

pub fn count_up(owner: CounterOwner) -> Combinator {
    Combinator::CountUp { owner }
}

pub fn count_for_each(owner: CounterOwner, repeated: Combinator) -> Combinator {
    Combinator::CountForEach {
        owner,
        repeated: Box::new(repeated),
    }
}

pub fn raw_string() -> Combinator {
    value(Combinator::TokenToRawString)
}

pub fn code_point() -> Combinator {
    value(Combinator::TokenToCodePoint)
}

pub fn join_strings() -> Combinator {
    value(Combinator::JoinStrings)
}

impl From<Garbage> for Combinator {
    fn from(g: Garbage) -> Self {
        Combinator::Garbage(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinator::test_support::{parts, run};
    use crate::comments::CommentIndex;
    use crate::diagnostics::ListBackedLogSink;
    use crate::productions::Productions;
    use serde_json::json;

    fn parse(grammar: &Productions, src: &str) -> serde_json::Value {
        let input = parts(src);
        let mut sink = ListBackedLogSink::new();
        let (tree, _) = grammar
            .apply("Root", &input, &CommentIndex::default(), &mut sink, true)
            .unwrap();
        tree.to_json()
    }

    #[test]
    fn renames_and_revalues() {
        let mut g = Productions::new();
        g.declare(
            "Root",
            call_tree(cat([
                rename("plus", Name::Parsed("+".into())),
                as_value("hi"),
                revalue("yes", Value::Bool(true)),
            ])),
        )
        .unwrap();
        assert_eq!(
            parse(&g, "plus hi yes"),
            json!(["Call", [["RightName", "+"], ["Value", "hi"], ["Value", true]]])
        );
    }

    #[test]
    fn renamed_tokens_and_symbols() {
        let mut g = Productions::new();
        g.declare(
            "Root",
            call_tree(cat([
                rename_token("minus", "-"),
                rename_token("func", "fn"),
                as_symbol("it", "self"),
            ])),
        )
        .unwrap();
        assert_eq!(
            parse(&g, "minus func it"),
            json!(["Call", [["RightName", "-"], ["RightName", "fn"], ["Value", "\\self"]]])
        );
    }

    #[test]
    fn synthetic_tokens_are_seen_without_consuming() {
        let mut input = parts("a b");
        if let Part::Token(t) = &mut input[1] {
            t.synthetic = true;
        }
        let productions = Productions::new();
        let (result, output) = run(&synthetic_token(), &productions, &input, 0);
        assert_eq!(result, Ok(None));
        assert!(output.is_empty());
        let (result, output) = run(&synthetic_token(), &productions, &input, 1);
        assert_eq!(result, Ok(Some(1)));
        assert!(output.is_empty());
    }

    #[test]
    fn operator_type_checks_the_group() {
        let input = parts("( 3 )");
        let productions = Productions::new();
        let (result, _) = run(&operator_type(OperatorType::Nullary), &productions, &input, 0);
        assert_eq!(result, Ok(Some(0)));
        let (result, _) = run(&operator_type(OperatorType::Prefix), &productions, &input, 0);
        assert_eq!(result, Ok(None));
        let (result, _) = run(&operator_type(OperatorType::Nullary), &productions, &input, 1);
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn implied_values_fill_gaps() {
        let mut g = Productions::new();
        g.declare(
            "Root",
            call_tree(cat([name(word()), implied_value(Value::Null, Side::Left)])),
        )
        .unwrap();
        assert_eq!(
            parse(&g, "f"),
            json!(["Call", [["RightName", "f"], ["Value", null]]])
        );
    }

    #[test]
    fn split_trees_close_elsewhere() {
        let mut g = Productions::new();
        g.declare(
            "Root",
            cat([
                start_split_tree(),
                value(number()),
                token(","),
                value(number()),
                finish_split_comma_soft(),
            ]),
        )
        .unwrap();
        assert_eq!(
            parse(&g, "1 , 2"),
            json!(["Call", [["Value", "fn ,"], ["Value", 1], ["Value", 2]]])
        );
    }

    #[test]
    fn operator_lookahead_checks_the_group() {
        let mut g = Productions::new();
        g.declare(
            "Root",
            cat([operator("Op"), open(), value(number()), close()]),
        )
        .unwrap();
        assert_eq!(parse(&g, "( 3 )"), json!(["Value", 3]));
    }

    #[test]
    fn builtin_names_are_marked() {
        let mut g = Productions::new();
        g.declare("Root", name(builtin_name())).unwrap();
        assert_eq!(parse(&g, "print"), json!(["RightName", "builtin`print`"]));
    }
}
