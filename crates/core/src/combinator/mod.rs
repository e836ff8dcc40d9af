//! The combinator algebra.
//!
//! A [`Combinator`] is applied at a position in the part stream and either
//! fails (`Ok(None)`) or returns a position at or after the one it was given,
//! having appended events to the context's output. A failing combinator
//! leaves the output exactly as it found it; composite combinators truncate
//! back to their starting length before reporting failure.
//!
//! `Err` is reserved for broken invariants (an undeclared production, a
//! counter used outside its scope) and aborts the whole application.

use crate::ast::Value;
use crate::comments::{CommentIndex, Side};
use crate::diagnostics::MessageTemplate;
use crate::error::EngineError;
use crate::event::{Event, LeafEvent};
use crate::part::{CstToken, Part};
use crate::productions::Productions;
use crate::source::{CodeLocation, Position};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, debug_span, trace};

mod comments;
mod counter;
mod recovery;
mod strings;

pub use counter::CounterOwner;
pub use recovery::Garbage;

/// Result of applying a combinator: `Ok(Some(after))` on a match,
/// `Ok(None)` when it does not match.
pub type Applied = Result<Option<usize>, EngineError>;

pub type PartPredicate = Arc<dyn Fn(&Part) -> bool + Send + Sync>;
pub type SuffixPredicate = Arc<dyn Fn(&Suffix<'_>) -> bool + Send + Sync>;
pub type PrefixPredicate = Arc<dyn Fn(&Prefix<'_>) -> bool + Send + Sync>;
pub type MakeLeaf = Arc<dyn Fn(&str, &Position) -> LeafEvent + Send + Sync>;
pub type EmitAt = Arc<dyn Fn(&Position, &mut Vec<Event>) + Send + Sync>;
pub type MakeEvent = Arc<dyn Fn(&Position) -> Event + Send + Sync>;
pub type MakeEvents = Arc<dyn Fn(&Position) -> Vec<Event> + Send + Sync>;

// ──────────────────────────────────────────────
// Context
// ──────────────────────────────────────────────

/// Everything one in-flight application reads and writes.
pub struct Context<'a> {
    loc: CodeLocation,
    input: &'a [Part],
    productions: &'a Productions,
    comments: &'a CommentIndex,
    /// Combinators append here when they succeed.
    output: Vec<Event>,
    /// Production names entered but not yet exited.
    ref_stack: Vec<Arc<str>>,
    /// Innermost last.
    counter_stack: Vec<(CounterOwner, usize)>,
}

impl<'a> Context<'a> {
    pub fn new(
        loc: CodeLocation,
        input: &'a [Part],
        productions: &'a Productions,
        comments: &'a CommentIndex,
    ) -> Self {
        Context {
            loc,
            input,
            productions,
            comments,
            output: Vec::new(),
            ref_stack: Vec::new(),
            counter_stack: Vec::new(),
        }
    }

    pub fn input(&self) -> &'a [Part] {
        self.input
    }

    pub fn output(&self) -> &[Event] {
        &self.output
    }

    /// Appends an event outside any combinator, e.g. a wrapping start.
    pub fn push(&mut self, event: Event) {
        self.output.push(event);
    }

    pub fn into_output(self) -> Vec<Event> {
        self.output
    }

    /// Production names entered but not yet exited, outermost first.
    pub fn entered_productions(&self) -> Vec<String> {
        self.ref_stack.iter().map(|n| n.to_string()).collect()
    }

    /// Position used when there is no part to anchor to.
    pub fn origin(&self) -> Position {
        Position::new(self.loc.clone(), 0, 0)
    }

    fn rollback(&mut self, length: usize) {
        self.output.truncate(length);
    }
}

/// Read-only view of the parts at and after a position.
pub struct Suffix<'a> {
    input: &'a [Part],
    position: usize,
}

impl<'a> Suffix<'a> {
    pub fn next(&self) -> Option<&'a Part> {
        self.input.get(self.position)
    }

    pub fn next_token(&self) -> Option<&'a CstToken> {
        self.nth_token(0)
    }

    /// The token after skipping `n` tokens. Parentheses are not counted.
    pub fn nth_token(&self, n: usize) -> Option<&'a CstToken> {
        self.input
            .get(self.position..)?
            .iter()
            .filter_map(Part::as_token)
            .nth(n)
    }
}

/// Read-only view of the parts before a position.
pub struct Prefix<'a> {
    input: &'a [Part],
    position: usize,
}

impl<'a> Prefix<'a> {
    pub fn prev(&self) -> Option<&'a Part> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.input.get(i))
    }

    pub fn prev_token(&self) -> Option<&'a CstToken> {
        self.input
            .get(..self.position)?
            .iter()
            .rev()
            .find_map(Part::as_token)
    }
}

// ──────────────────────────────────────────────
// Combinator
// ──────────────────────────────────────────────

#[derive(Clone)]
pub enum Combinator {
    /// A production looked up by name when applied.
    Ref(Arc<str>),
    /// Concatenation.
    Cat(Vec<Combinator>),
    /// Ordered alternation.
    Or(Vec<Combinator>),
    /// Consumes one part matching `filter`, copying it to the output if `emit`.
    Match {
        description: String,
        filter: PartPredicate,
        emit: bool,
    },
    /// One or more.
    Rep(Box<Combinator>),
    NegLookahead(Box<Combinator>),
    Lookahead {
        description: String,
        predicate: SuffixPredicate,
    },
    Lookbehind {
        description: String,
        predicate: PrefixPredicate,
    },
    /// Consumes the one token `filter` consumes but emits `make_leaf`'s output.
    Where {
        filter: Box<Combinator>,
        make_leaf: MakeLeaf,
    },
    /// Emits without consuming, positioned relative to a neighbouring part.
    Implied { bias: Side, emit_at: EmitAt },
    EmitBefore {
        matcher: Box<Combinator>,
        make_event: MakeEvent,
    },
    EmitAfter {
        matcher: Box<Combinator>,
        make_events: MakeEvents,
    },
    /// Runs `body` with a fresh counter owned by `owner` on the counter stack.
    Counter {
        owner: CounterOwner,
        body: Box<Combinator>,
    },
    /// Applies `repeated` as many times as the innermost counter of `owner` says.
    CountForEach {
        owner: CounterOwner,
        repeated: Box<Combinator>,
    },
    CountUp { owner: CounterOwner },
    /// Attaches adjacent doc comments to what `decorated` matches.
    DocComment(Box<Combinator>),
    /// Emits each comment at the current position as an embedded comment call.
    CommentsToCalls,
    Garbage(Garbage),
    /// Flags what `matcher` matched without failing.
    Problem {
        matcher: Box<Combinator>,
        template: MessageTemplate,
    },
    /// Traces entry and outcome of `body`.
    Debug {
        description: String,
        body: Box<Combinator>,
    },
    Eof,
    TokenToRawString,
    TokenToCodePoint,
    JoinStrings,
}

impl Combinator {
    /// Matches the empty string.
    pub fn epsilon() -> Self {
        Combinator::Cat(Vec::new())
    }

    pub fn reference(name: &str) -> Self {
        Combinator::Ref(Arc::from(name))
    }

    /// Concatenation, with nested concatenations flattened.
    pub fn cat(elements: impl IntoIterator<Item = Combinator>) -> Self {
        let mut flat = Vec::new();
        for element in elements {
            match element {
                Combinator::Cat(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.pop().unwrap_or_else(Combinator::epsilon)
        } else {
            Combinator::Cat(flat)
        }
    }

    /// Alternation, with nested alternations flattened.
    /// No options at all never matches.
    pub fn or(options: impl IntoIterator<Item = Combinator>) -> Self {
        let mut flat = Vec::new();
        for option in options {
            match option {
                Combinator::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.pop().unwrap_or_else(|| Combinator::Or(Vec::new()))
        } else {
            Combinator::Or(flat)
        }
    }

    pub fn matching(
        description: impl Into<String>,
        emit: bool,
        filter: impl Fn(&Part) -> bool + Send + Sync + 'static,
    ) -> Self {
        Combinator::Match {
            description: description.into(),
            filter: Arc::new(filter),
            emit,
        }
    }

    pub fn rep(body: Combinator) -> Self {
        Combinator::Rep(Box::new(body))
    }

    pub fn lookahead(
        description: impl Into<String>,
        predicate: impl Fn(&Suffix<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Combinator::Lookahead {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn lookbehind(
        description: impl Into<String>,
        predicate: impl Fn(&Prefix<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Combinator::Lookbehind {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn where_(
        filter: Combinator,
        make_leaf: impl Fn(&str, &Position) -> LeafEvent + Send + Sync + 'static,
    ) -> Self {
        Combinator::Where {
            filter: Box::new(filter),
            make_leaf: Arc::new(make_leaf),
        }
    }

    pub fn implied(
        bias: Side,
        emit_at: impl Fn(&Position, &mut Vec<Event>) + Send + Sync + 'static,
    ) -> Self {
        Combinator::Implied {
            bias,
            emit_at: Arc::new(emit_at),
        }
    }

    pub fn emit_before(
        matcher: Combinator,
        make_event: impl Fn(&Position) -> Event + Send + Sync + 'static,
    ) -> Self {
        Combinator::EmitBefore {
            matcher: Box::new(matcher),
            make_event: Arc::new(make_event),
        }
    }

    pub fn emit_after(
        matcher: Combinator,
        make_events: impl Fn(&Position) -> Vec<Event> + Send + Sync + 'static,
    ) -> Self {
        Combinator::EmitAfter {
            matcher: Box::new(matcher),
            make_events: Arc::new(make_events),
        }
    }

    /// The combinators this one applies directly. References are not followed.
    pub fn children(&self) -> Vec<&Combinator> {
        match self {
            Combinator::Cat(items) | Combinator::Or(items) => items.iter().collect(),
            Combinator::Rep(c)
            | Combinator::NegLookahead(c)
            | Combinator::DocComment(c)
            | Combinator::Where { filter: c, .. }
            | Combinator::EmitBefore { matcher: c, .. }
            | Combinator::EmitAfter { matcher: c, .. }
            | Combinator::Counter { body: c, .. }
            | Combinator::CountForEach { repeated: c, .. }
            | Combinator::Problem { matcher: c, .. }
            | Combinator::Debug { body: c, .. } => vec![c.as_ref()],
            _ => Vec::new(),
        }
    }

    pub fn apply(&self, ctx: &mut Context<'_>, position: usize) -> Applied {
        match self {
            Combinator::Ref(name) => apply_ref(name, ctx, position),
            Combinator::Cat(elements) => {
                let start = ctx.output.len();
                let mut after = position;
                for element in elements {
                    match element.apply(ctx, after)? {
                        Some(next) => after = next,
                        None => {
                            ctx.rollback(start);
                            return Ok(None);
                        }
                    }
                }
                Ok(Some(after))
            }
            Combinator::Or(options) => {
                let start = ctx.output.len();
                for option in options {
                    if let Some(after) = option.apply(ctx, position)? {
                        return Ok(Some(after));
                    }
                    ctx.rollback(start);
                }
                Ok(None)
            }
            Combinator::Match { filter, emit, .. } => match ctx.input.get(position) {
                Some(part) if filter(part) => {
                    if *emit {
                        let Part::Token(token) = part else {
                            return Err(EngineError::EmittedNonToken {
                                part: part.to_string(),
                            });
                        };
                        ctx.output.push(Event::Leaf(LeafEvent::Token(token.clone())));
                    }
                    Ok(Some(position + 1))
                }
                _ => Ok(None),
            },
            Combinator::Rep(body) => {
                let Some(mut end) = body.apply(ctx, position)? else {
                    return Ok(None);
                };
                if end > position {
                    loop {
                        let start = ctx.output.len();
                        match body.apply(ctx, end)? {
                            Some(next) if next > end => end = next,
                            Some(_) => {
                                // Stalled: the repetition adds nothing.
                                ctx.rollback(start);
                                break;
                            }
                            None => break,
                        }
                    }
                }
                Ok(Some(end))
            }
            Combinator::NegLookahead(body) => {
                let start = ctx.output.len();
                let matched = body.apply(ctx, position)?.is_some();
                ctx.rollback(start);
                Ok(if matched { None } else { Some(position) })
            }
            Combinator::Lookahead { predicate, .. } => {
                let suffix = Suffix {
                    input: ctx.input,
                    position,
                };
                Ok(predicate(&suffix).then_some(position))
            }
            Combinator::Lookbehind { predicate, .. } => {
                let prefix = Prefix {
                    input: ctx.input,
                    position,
                };
                Ok(predicate(&prefix).then_some(position))
            }
            Combinator::Where { filter, make_leaf } => {
                let input = ctx.input;
                let token = match input.get(position) {
                    Some(Part::Token(token)) if !token.is_error() => token,
                    _ => return Ok(None),
                };
                let start = ctx.output.len();
                let filter_after = filter.apply(ctx, position)?;
                ctx.rollback(start);
                if filter_after == Some(position + 1) {
                    ctx.output
                        .push(Event::Leaf(make_leaf(&token.text, &token.pos)));
                    Ok(Some(position + 1))
                } else {
                    Ok(None)
                }
            }
            Combinator::Implied { bias, emit_at } => {
                let input = ctx.input;
                let look_right = if position == 0 {
                    true
                } else if position >= input.len() {
                    false
                } else {
                    *bias == Side::Right
                };
                let anchor = if look_right {
                    input.get(position).map(|p| p.pos().left_edge())
                } else {
                    input.get(position - 1).map(|p| p.pos().right_edge())
                };
                let anchor = anchor.unwrap_or_else(|| ctx.origin());
                emit_at(&anchor, &mut ctx.output);
                Ok(Some(position))
            }
            Combinator::EmitBefore {
                matcher,
                make_event,
            } => {
                let input = ctx.input;
                let anchor = if let Some(next) = input.get(position) {
                    next.pos().left_edge()
                } else if let Some(prev) = position.checked_sub(1).and_then(|i| input.get(i)) {
                    prev.pos().right_edge()
                } else {
                    ctx.origin()
                };
                let start = ctx.output.len();
                ctx.output.push(make_event(&anchor));
                let after = matcher.apply(ctx, position)?;
                if after.is_none() {
                    ctx.rollback(start);
                }
                Ok(after)
            }
            Combinator::EmitAfter {
                matcher,
                make_events,
            } => {
                let Some(after) = matcher.apply(ctx, position)? else {
                    return Ok(None);
                };
                let input = ctx.input;
                let anchor = if let Some(prev) = after.checked_sub(1).and_then(|i| input.get(i)) {
                    prev.pos().right_edge()
                } else if let Some(next) = input.get(after) {
                    next.pos().left_edge()
                } else {
                    ctx.origin()
                };
                ctx.output.extend(make_events(&anchor));
                Ok(Some(after))
            }
            Combinator::Counter { owner, body } => counter::scope(*owner, body, ctx, position),
            Combinator::CountForEach { owner, repeated } => {
                counter::for_each(*owner, repeated, ctx, position)
            }
            Combinator::CountUp { owner } => counter::count_up(*owner, ctx, position),
            Combinator::DocComment(decorated) => comments::decorate(decorated, ctx, position),
            Combinator::CommentsToCalls => comments::to_calls(ctx, position),
            Combinator::Garbage(garbage) => garbage.apply(ctx, position),
            Combinator::Problem { matcher, template } => {
                recovery::problem(matcher, template, ctx, position)
            }
            Combinator::Debug { description, body } => {
                let next = ctx
                    .input
                    .get(position)
                    .map_or_else(|| "none".to_owned(), Part::to_string);
                let span = debug_span!("combinator", %description, position, %next);
                let _entered = span.enter();
                let result = body.apply(ctx, position);
                match &result {
                    Ok(Some(after)) => debug!(after, "application succeeded"),
                    Ok(None) => debug!("application failed"),
                    Err(e) => debug!(error = %e, "application aborted"),
                }
                result
            }
            Combinator::Eof => Ok((position == ctx.input.len()).then_some(position)),
            Combinator::TokenToRawString => strings::raw_string(ctx, position),
            Combinator::TokenToCodePoint => strings::code_point(ctx, position),
            Combinator::JoinStrings => strings::join(ctx, position),
        }
    }
}

fn apply_ref(name: &Arc<str>, ctx: &mut Context<'_>, position: usize) -> Applied {
    // No left recursion support: the grouping pass already parenthesizes
    // operator applications, so productions always consume before recursing.
    let productions = ctx.productions;
    let Some(rhs) = productions.get(name) else {
        return Err(EngineError::UndeclaredProduction {
            name: name.to_string(),
            trace: ctx.entered_productions(),
        });
    };
    let start = ctx.output.len();
    ctx.ref_stack.push(Arc::clone(name));
    let result = rhs.apply(ctx, position);
    ctx.ref_stack.pop();
    let after = result?;
    if after.is_none() {
        trace!(production = %name, position, "production failed");
        ctx.rollback(start);
    }
    Ok(after)
}

impl fmt::Debug for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Ref(name) => write!(f, "Ref({})", name),
            Combinator::Cat(items) => f.debug_tuple("Cat").field(items).finish(),
            Combinator::Or(items) => f.debug_tuple("Or").field(items).finish(),
            Combinator::Match {
                description, emit, ..
            } => write!(f, "Match({}, emit={})", description, emit),
            Combinator::Rep(body) => f.debug_tuple("Rep").field(body).finish(),
            Combinator::NegLookahead(body) => f.debug_tuple("NegLookahead").field(body).finish(),
            Combinator::Lookahead { description, .. } => write!(f, "Lookahead({})", description),
            Combinator::Lookbehind { description, .. } => {
                write!(f, "Lookbehind({})", description)
            }
            Combinator::Where { filter, .. } => f.debug_tuple("Where").field(filter).finish(),
            Combinator::Implied { bias, .. } => write!(f, "Implied({:?})", bias),
            Combinator::EmitBefore { matcher, .. } => {
                f.debug_tuple("EmitBefore").field(matcher).finish()
            }
            Combinator::EmitAfter { matcher, .. } => {
                f.debug_tuple("EmitAfter").field(matcher).finish()
            }
            Combinator::Counter { owner, body } => {
                f.debug_tuple("Counter").field(owner).field(body).finish()
            }
            Combinator::CountForEach { owner, repeated } => f
                .debug_tuple("CountForEach")
                .field(owner)
                .field(repeated)
                .finish(),
            Combinator::CountUp { owner } => f.debug_tuple("CountUp").field(owner).finish(),
            Combinator::DocComment(c) => f.debug_tuple("DocComment").field(c).finish(),
            Combinator::CommentsToCalls => f.write_str("CommentsToCalls"),
            Combinator::Garbage(g) => fmt::Debug::fmt(g, f),
            Combinator::Problem { matcher, template } => f
                .debug_tuple("Problem")
                .field(matcher)
                .field(&template.key())
                .finish(),
            Combinator::Debug { description, body } => {
                f.debug_tuple("Debug").field(description).field(body).finish()
            }
            Combinator::Eof => f.write_str("Eof"),
            Combinator::TokenToRawString => f.write_str("TokenToRawString"),
            Combinator::TokenToCodePoint => f.write_str("TokenToCodePoint"),
            Combinator::JoinStrings => f.write_str("JoinStrings"),
        }
    }
}

/// A value leaf event, the common payload of implied and substituted leaves.
pub fn value_leaf(value: Value, pos: &Position) -> LeafEvent {
    LeafEvent::Value {
        value,
        pos: pos.clone(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::part::TokenType;

    /// Parts for whitespace separated words; `(` and `)` become a paren pair
    /// for operator `Op`. Each token sits at its own offset.
    pub fn parts(src: &str) -> Vec<Part> {
        use crate::part::{OperatorType, Paren};
        let loc = CodeLocation::new("test");
        let mut offset = 0;
        src.split_whitespace()
            .map(|word| {
                let pos = Position::new(loc.clone(), offset, offset + word.len());
                offset += word.len() + 1;
                match word {
                    "(" => Part::LeftParen(Paren::new("Op", OperatorType::Nullary, pos)),
                    ")" => Part::RightParen(Paren::new("Op", OperatorType::Nullary, pos)),
                    _ => {
                        let token_type = if word.chars().all(|c| c.is_ascii_digit()) {
                            TokenType::Number
                        } else if word.starts_with(|c: char| c.is_alphabetic()) {
                            TokenType::Word
                        } else {
                            TokenType::Punctuation
                        };
                        Part::Token(CstToken::new(word, token_type, pos))
                    }
                }
            })
            .collect()
    }

    pub fn exact(text: &'static str) -> Combinator {
        Combinator::matching(text, true, move |p| p.is_token_text(text))
    }

    pub fn run(
        c: &Combinator,
        productions: &Productions,
        input: &[Part],
        position: usize,
    ) -> (Applied, Vec<Event>) {
        let comments = CommentIndex::default();
        let mut ctx = Context::new(CodeLocation::new("test"), input, productions, &comments);
        let result = c.apply(&mut ctx, position);
        (result, ctx.into_output())
    }

    pub fn token_texts(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Leaf(LeafEvent::Token(t)) => Some(t.text.clone()),
                _ => None,
            })
            .collect()
    }
}
