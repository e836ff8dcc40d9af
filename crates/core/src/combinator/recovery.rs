//! Error recovery.
//!
//! [`Garbage`] skips input a grammar could not make sense of and leaves an
//! error event in its place, so a single bad construct does not sink the
//! whole tree. [`problem`] keeps what its matcher built and flags it.

use super::{Applied, Combinator, Context};
use crate::diagnostics::MessageTemplate;
use crate::event::{ErrorEvent, ErrorKind, Event};
use crate::part::{Part, CLOSE_BRACKETS};
use std::collections::HashSet;

/// Skips parts up to the next stopping point at nesting depth zero.
///
/// Skipping stops before an unmatched right paren, before any token in
/// `stop_before`, and after any token in `stop_after`. Parts inside a
/// parenthesized group are skipped whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Garbage {
    pub template: MessageTemplate,
    pub values: Vec<String>,
    pub stop_after: HashSet<String>,
    pub stop_before: HashSet<String>,
    /// Fail instead of succeeding when there is nothing to skip.
    pub require_some: bool,
}

impl Garbage {
    /// Recovery for `production`, reported as "Expected `production` here".
    pub fn new(production: &str) -> Self {
        Garbage {
            template: MessageTemplate::Unparsable,
            values: vec![production.to_owned()],
            stop_after: HashSet::new(),
            stop_before: CLOSE_BRACKETS.iter().map(|s| (*s).to_owned()).collect(),
            require_some: false,
        }
    }

    pub fn with_template(mut self, template: MessageTemplate, values: Vec<String>) -> Self {
        self.template = template;
        self.values = values;
        self
    }

    pub fn stop_after<'s>(mut self, tokens: impl IntoIterator<Item = &'s str>) -> Self {
        self.stop_after = tokens.into_iter().map(str::to_owned).collect();
        self
    }

    pub fn stop_before<'s>(mut self, tokens: impl IntoIterator<Item = &'s str>) -> Self {
        self.stop_before = tokens.into_iter().map(str::to_owned).collect();
        self
    }

    pub fn require_some(mut self) -> Self {
        self.require_some = true;
        self
    }

    pub(super) fn apply(&self, ctx: &mut Context<'_>, position: usize) -> Applied {
        let input = ctx.input;
        let mut depth = 0usize;
        let mut after = position;
        while let Some(part) = input.get(after) {
            match part {
                Part::LeftParen(_) => depth += 1,
                Part::RightParen(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Part::Token(token) if depth == 0 => {
                    if self.stop_after.contains(&token.text) {
                        after += 1;
                        break;
                    }
                    if self.stop_before.contains(&token.text) {
                        break;
                    }
                }
                Part::Token(_) => {}
            }
            after += 1;
        }

        if after == position {
            return Ok((!self.require_some).then_some(position));
        }
        let skipped = input[position..after].to_vec();
        tracing::debug!(
            template = self.template.key(),
            skipped = skipped.len(),
            position,
            "skipping unparsable input"
        );
        let origin = ctx.origin();
        ctx.output.push(Event::Error(ErrorEvent::new(
            ErrorKind::ProductionFailed,
            self.template.clone(),
            self.values.clone(),
            skipped,
            &origin,
        )));
        Ok(Some(after))
    }
}

pub(super) fn problem(
    matcher: &Combinator,
    template: &MessageTemplate,
    ctx: &mut Context<'_>,
    position: usize,
) -> Applied {
    let start = ctx.output.len();
    match matcher.apply(ctx, position)? {
        Some(after) if after > position => {
            let origin = ctx.origin();
            ctx.output.push(Event::Error(ErrorEvent::new(
                ErrorKind::KnownProblem,
                template.clone(),
                Vec::new(),
                ctx.input[position..after].to_vec(),
                &origin,
            )));
            Ok(Some(after))
        }
        _ => {
            ctx.rollback(start);
            Ok(None)
        }
    }
}
