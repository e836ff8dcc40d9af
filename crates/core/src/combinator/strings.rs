//! String literal content.
//!
//! The lexer splits a quoted string into content chunks (`QuotedString`
//! tokens) and escape sequences. These combinators turn chunks into values.

use super::{Applied, Context};
use crate::ast::Value;
use crate::event::{Event, LeafEvent};
use crate::part::{CstToken, Part, TokenType};

fn quoted_at<'a>(ctx: &Context<'a>, index: usize) -> Option<&'a CstToken> {
    let input = ctx.input;
    match input.get(index) {
        Some(Part::Token(t)) if t.token_type == TokenType::QuotedString => Some(t),
        _ => None,
    }
}

/// A content chunk taken verbatim as a string value.
pub(super) fn raw_string(ctx: &mut Context<'_>, position: usize) -> Applied {
    let Some(token) = quoted_at(ctx, position) else {
        return Ok(None);
    };
    ctx.output
        .push(Event::value(Value::Str(token.text.clone()), token.pos.clone()));
    Ok(Some(position + 1))
}

/// The hex digits of a `\u{...}` escape as the string of that one code
/// point. Only `QuotedString` chunks match. Text that is not all hex digits,
/// or names a surrogate or a value past U+10FFFF, is re-emitted as an error
/// token, which lifts to an error tree.
pub(super) fn code_point(ctx: &mut Context<'_>, position: usize) -> Applied {
    let Some(token) = quoted_at(ctx, position) else {
        return Ok(None);
    };
    let decoded = Some(token.text.as_str())
        .filter(|text| !text.is_empty() && text.bytes().all(|b| b.is_ascii_hexdigit()))
        .and_then(|text| u32::from_str_radix(text, 16).ok())
        .and_then(char::from_u32);
    let event = match decoded {
        Some(c) => Event::value(Value::Str(c.to_string()), token.pos.clone()),
        None => {
            let mut raw = token.clone();
            raw.text = format!("\\u{{{}}}", token.text);
            raw.token_type = TokenType::Error;
            Event::Leaf(LeafEvent::Token(raw))
        }
    };
    ctx.output.push(event);
    Ok(Some(position + 1))
}

/// One or more adjacent content chunks as a single token. Runs of two or
/// more become a synthetic token spanning them all.
pub(super) fn join(ctx: &mut Context<'_>, position: usize) -> Applied {
    let Some(first) = quoted_at(ctx, position) else {
        return Ok(None);
    };
    let mut after = position + 1;
    let mut joined: Option<CstToken> = None;
    while let Some(next) = quoted_at(ctx, after) {
        let acc = joined.get_or_insert_with(|| {
            let mut t = first.clone();
            t.synthetic = true;
            t
        });
        acc.text.push_str(&next.text);
        acc.pos = acc.pos.with_right(next.pos.right);
        after += 1;
    }
    let token = joined.unwrap_or_else(|| first.clone());
    ctx.output.push(Event::Leaf(LeafEvent::Token(token)));
    Ok(Some(after))
}
