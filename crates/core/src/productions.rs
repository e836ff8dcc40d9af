//! The production registry: named combinators and the top-level driver.

use crate::ast::Tree;
use crate::combinator::{Combinator, Context};
use crate::comments::CommentIndex;
use crate::diagnostics::{LogSink, MessageTemplate};
use crate::error::EngineError;
use crate::event::{ErrorEvent, ErrorKind, Event, FinishedType};
use crate::lift::lift;
use crate::part::Part;
use crate::source::CodeLocation;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Location used for positions when there is no input to take one from.
pub const DEFAULT_LOCATION: &str = "<input>";

/// A grammar: productions keyed by name. Declared once, then shared
/// read-only across any number of applications.
#[derive(Debug, Clone, Default)]
pub struct Productions {
    by_name: HashMap<String, Combinator>,
}

impl Productions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name`. Each name can be declared once.
    pub fn declare(&mut self, name: impl Into<String>, rhs: Combinator) -> Result<(), EngineError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(EngineError::DuplicateProduction { name });
        }
        self.by_name.insert(name, rhs);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Combinator> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Declared names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names referenced from some production but never declared, sorted.
    /// Applying a grammar that reaches one of these fails with
    /// [`EngineError::UndeclaredProduction`]; this finds them up front.
    pub fn undeclared_references(&self) -> Vec<String> {
        let mut missing = BTreeSet::new();
        let mut pending: Vec<&Combinator> = self.by_name.values().collect();
        while let Some(c) = pending.pop() {
            if let Combinator::Ref(name) = c {
                if !self.contains(name) {
                    missing.insert(name.to_string());
                }
            }
            pending.extend(c.children());
        }
        missing.into_iter().collect()
    }

    /// Applies production `start` to `input` and lifts the result.
    ///
    /// Returns the single tree plus the position the start production
    /// reached, or `None` if it failed. Input the start production did not
    /// consume is reported as an error subtree when `must_consume_all`.
    pub fn apply(
        &self,
        start: &str,
        input: &[Part],
        comments: &CommentIndex,
        sink: &mut dyn LogSink,
        must_consume_all: bool,
    ) -> Result<(Tree, Option<usize>), EngineError> {
        let loc = input
            .first()
            .map(|p| p.pos().loc.clone())
            .unwrap_or_else(|| CodeLocation::new(DEFAULT_LOCATION));
        self.apply_at(&loc, start, input, comments, sink, must_consume_all)
    }

    /// Like [`Productions::apply`], with `loc` used for positions that no
    /// part anchors, e.g. on empty input.
    pub fn apply_at(
        &self,
        loc: &CodeLocation,
        start: &str,
        input: &[Part],
        comments: &CommentIndex,
        sink: &mut dyn LogSink,
        must_consume_all: bool,
    ) -> Result<(Tree, Option<usize>), EngineError> {
        let mut ctx = Context::new(loc.clone(), input, self, comments);
        let origin = ctx.origin();
        let left = input.first().map_or_else(|| origin.clone(), |p| p.pos().left_edge());
        let right = input.last().map_or_else(|| origin.clone(), |p| p.pos().right_edge());

        ctx.push(Event::start(left));
        let end = Combinator::reference(start).apply(&mut ctx, 0)?;
        let consumed = end.unwrap_or(0);
        if must_consume_all && consumed < input.len() {
            ctx.push(Event::Error(ErrorEvent::new(
                ErrorKind::ProductionFailed,
                MessageTemplate::UnconsumedInput,
                vec![start.to_owned()],
                input[consumed..].to_vec(),
                &origin,
            )));
        }
        ctx.push(Event::finish(right, FinishedType::SoftBlock));

        let events = ctx.into_output();
        debug!(
            production = start,
            parts = input.len(),
            ?end,
            events = events.len(),
            "applied start production"
        );
        let mut trees = lift(&events, sink)?;
        match trees.pop() {
            Some(tree) if trees.is_empty() => Ok((tree, end)),
            popped => Err(EngineError::TreeCount {
                production: start.to_owned(),
                count: trees.len() + usize::from(popped.is_some()),
            }),
        }
    }
}
