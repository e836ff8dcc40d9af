//! The flat output trace written by successful combinators.
//!
//! `StartTree` / `FinishTree` pairs bracket the events of one subtree. Leaf
//! events stand alone or sit alone between a start and finish. `ShiftLeft`
//! and `Error` events are structurally flat.

use crate::ast::{Name, TreeType, Value};
use crate::diagnostics::MessageTemplate;
use crate::part::{CstToken, Part};
use crate::source::Position;
use std::fmt;

/// How a `FinishTree` closes its subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishedType {
    Tree(TreeType),
    /// A block, unless there is exactly one child which stands for itself.
    SoftBlock,
    /// A comma call, unless there is exactly one child which stands for itself.
    SoftComma,
}

impl FinishedType {
    pub fn abbrev(self) -> &'static str {
        match self {
            FinishedType::Tree(t) => t.name(),
            FinishedType::SoftBlock => "SoftBlock",
            FinishedType::SoftComma => "SoftComma",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeafEvent {
    /// A raw token whose decoding is left to the lifter
    Token(CstToken),
    Value { value: Value, pos: Position },
    Name { name: Name, pos: Position },
}

impl LeafEvent {
    pub fn pos(&self) -> &Position {
        match self {
            LeafEvent::Token(t) => &t.pos,
            LeafEvent::Value { pos, .. } | LeafEvent::Name { pos, .. } => pos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input skipped during recovery
    ProductionFailed,
    /// Input that parsed but is flagged
    KnownProblem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub kind: ErrorKind,
    pub template: MessageTemplate,
    pub values: Vec<String>,
    /// The raw parts the error covers
    pub parts: Vec<Part>,
    pub pos: Position,
}

impl ErrorEvent {
    /// `fallback` positions an error over no parts.
    pub fn new(
        kind: ErrorKind,
        template: MessageTemplate,
        values: Vec<String>,
        parts: Vec<Part>,
        fallback: &Position,
    ) -> Self {
        let pos = Position::spanning(parts.iter().map(Part::pos), fallback);
        ErrorEvent {
            kind,
            template,
            values,
            parts,
            pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartTree { pos: Position },
    FinishTree { pos: Position, finished: FinishedType },
    Leaf(LeafEvent),
    /// Swap the two most recently completed siblings.
    ShiftLeft { pos: Position },
    Error(ErrorEvent),
}

impl Event {
    pub fn start(pos: Position) -> Self {
        Event::StartTree { pos }
    }

    pub fn finish(pos: Position, finished: FinishedType) -> Self {
        Event::FinishTree { pos, finished }
    }

    pub fn value(value: Value, pos: Position) -> Self {
        Event::Leaf(LeafEvent::Value { value, pos })
    }

    pub fn name(name: Name, pos: Position) -> Self {
        Event::Leaf(LeafEvent::Name { name, pos })
    }

    pub fn pos(&self) -> &Position {
        match self {
            Event::StartTree { pos } | Event::FinishTree { pos, .. } | Event::ShiftLeft { pos } => {
                pos
            }
            Event::Leaf(leaf) => leaf.pos(),
            Event::Error(e) => &e.pos,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::StartTree { .. } => f.write_str("<"),
            Event::FinishTree { finished, .. } => write!(f, "{}>", finished.abbrev()),
            Event::Leaf(LeafEvent::Token(t)) => write!(f, "{:?}", t.text),
            Event::Leaf(LeafEvent::Value { value, .. }) => write!(f, "{}", value.to_json()),
            Event::Leaf(LeafEvent::Name { name, .. }) => write!(f, "{}", name),
            Event::ShiftLeft { .. } => f.write_str("ShiftLeft"),
            Event::Error(e) => write!(f, "Error({})", e.template.key()),
        }
    }
}

/// Renders `events` with a marker before index `at`, for internal error dumps.
pub fn dump_events(events: &[Event], at: usize) -> String {
    let at = at.min(events.len());
    let render = |slice: &[Event]| {
        slice
            .iter()
            .map(Event::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{}, \u{2191}{}", render(&events[..at]), render(&events[at..]))
}
