//! Lifting: turning the flat event trace into trees.
//!
//! One forward pass over the events with an explicit stack of open subtrees.
//! Unparsable input already shows up as error events by the time it gets
//! here; anything else out of place means a combinator broke the event
//! invariants and is reported as [`EngineError::Malformed`].

use crate::ast::{
    decode_name, unpack_value, BuiltinFn, InnerTreeType, LeafContent, LeafTree, LeafTreeType,
    Tree, TreeType, Value,
};
use crate::diagnostics::{LogSink, MessageTemplate, Severity};
use crate::error::EngineError;
use crate::event::{dump_events, ErrorEvent, Event, FinishedType, LeafEvent};
use crate::part::Part;
use crate::source::Position;

/// Lifts `events` into a forest. Error events are logged to `sink` as they
/// are turned into error trees.
pub fn lift(events: &[Event], sink: &mut dyn LogSink) -> Result<Vec<Tree>, EngineError> {
    Lifter { events, sink }.run()
}

struct Frame {
    start: Position,
    children: Vec<Tree>,
}

struct Lifter<'e, 's> {
    events: &'e [Event],
    sink: &'s mut dyn LogSink,
}

/// The children list trees are currently appended to.
fn siblings<'v>(stack: &'v mut Vec<Frame>, forest: &'v mut Vec<Tree>) -> &'v mut Vec<Tree> {
    match stack.last_mut() {
        Some(frame) => &mut frame.children,
        None => forest,
    }
}

impl Lifter<'_, '_> {
    fn run(mut self) -> Result<Vec<Tree>, EngineError> {
        let events = self.events;
        let mut forest = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut i = 0;
        while let Some(event) = events.get(i) {
            match event {
                Event::StartTree { pos } => {
                    if let (
                        Some(Event::Leaf(leaf)),
                        Some(Event::FinishTree {
                            finished: FinishedType::Tree(TreeType::Leaf(kind)),
                            ..
                        }),
                    ) = (events.get(i + 1), events.get(i + 2))
                    {
                        let tree = self.make_leaf(*kind, leaf, i + 1)?;
                        siblings(&mut stack, &mut forest).push(tree);
                        i += 3;
                        continue;
                    }
                    stack.push(Frame {
                        start: pos.clone(),
                        children: Vec::new(),
                    });
                }
                Event::FinishTree { pos: end, finished } => {
                    // An unmatched finish at the top level ends the forest;
                    // what follows is leftover.
                    let Some(frame) = stack.pop() else {
                        break;
                    };
                    let pos = frame.start.with_right(end.right);
                    let tree = make_inner(*finished, pos, frame.children).ok_or_else(|| {
                        self.malformed(i, format!("unexpected tree type {}", finished.abbrev()))
                    })?;
                    siblings(&mut stack, &mut forest).push(tree);
                }
                Event::ShiftLeft { .. } => {
                    let items = siblings(&mut stack, &mut forest);
                    let n = items.len();
                    if n < 2 {
                        return Err(self.malformed(i, "too few preceding ShiftLeft"));
                    }
                    items.swap(n - 2, n - 1);
                }
                Event::Leaf(LeafEvent::Value { value, pos }) => {
                    siblings(&mut stack, &mut forest).push(Tree::value(pos.clone(), value.clone()));
                }
                Event::Leaf(LeafEvent::Name { name, pos }) => {
                    siblings(&mut stack, &mut forest).push(Tree::Leaf(LeafTree {
                        pos: pos.clone(),
                        content: LeafContent::RightName(name.clone()),
                    }));
                }
                Event::Leaf(LeafEvent::Token(_)) => {
                    return Err(self.malformed(i, format!("orphan {}", event)));
                }
                Event::Error(error) => {
                    let tree = self.report(error);
                    siblings(&mut stack, &mut forest).push(tree);
                }
            }
            i += 1;
        }

        if !stack.is_empty() {
            return Err(self.malformed(events.len(), "unbalanced"));
        }
        if let Some(first) = events.get(i) {
            let rest = &events[i..];
            let last = rest.last().unwrap_or(first);
            let pos = first.pos().with_right(last.pos().right);
            let rendered = rest.iter().map(|e| self.render(e)).collect();
            forest.push(error_tree(pos, rendered));
        }
        Ok(forest)
    }

    fn make_leaf(
        &mut self,
        kind: LeafTreeType,
        leaf: &LeafEvent,
        index: usize,
    ) -> Result<Tree, EngineError> {
        let pos = leaf.pos().clone();
        let content = match kind {
            LeafTreeType::LeftName | LeafTreeType::RightName => {
                let name = match leaf {
                    LeafEvent::Token(t) if t.is_error() => None,
                    LeafEvent::Token(t) => decode_name(&t.text),
                    LeafEvent::Name { name, .. } => Some(name.clone()),
                    LeafEvent::Value { value, .. } => {
                        return Err(self.malformed(
                            index,
                            format!("{} in name", value.to_json()),
                        ))
                    }
                };
                name.map(|n| match kind {
                    LeafTreeType::LeftName => LeafContent::LeftName(n),
                    _ => LeafContent::RightName(n),
                })
            }
            LeafTreeType::Value => match leaf {
                LeafEvent::Token(t) => unpack_value(&t.text, t.token_type),
                LeafEvent::Value { value, .. } => Some(value.clone()),
                LeafEvent::Name { name, .. } => {
                    return Err(self.malformed(index, format!("{} in value", name)))
                }
            }
            .map(LeafContent::Value),
        };
        Ok(match content {
            Some(content) => Tree::Leaf(LeafTree { pos, content }),
            None => {
                let events = self.events;
                let event = &events[index];
                let text = match event {
                    Event::Leaf(LeafEvent::Token(t)) => t.text.clone(),
                    other => other.to_string(),
                };
                self.sink
                    .log(Severity::Error, &MessageTemplate::Undecodable, &pos, &[text]);
                let rendered = vec![self.render(event)];
                error_tree(pos, rendered)
            }
        })
    }

    /// The error tree for an error event, logging it on the way.
    fn report(&mut self, error: &ErrorEvent) -> Tree {
        let pos = &error.pos;
        self.sink
            .log(Severity::Error, &error.template, pos, &error.values);
        error_tree(pos.clone(), parts_to_strings(pos, &error.parts))
    }

    /// How an event reads inside an error tree.
    fn render(&self, event: &Event) -> Tree {
        let pos = event.pos().clone();
        let text = match event {
            Event::StartTree { .. } => "`<`".to_owned(),
            Event::FinishTree { finished, .. } => format!("`{}>`", finished.abbrev()),
            Event::Leaf(LeafEvent::Token(t)) => t.text.clone(),
            Event::Leaf(LeafEvent::Value { value, .. }) => return Tree::value(pos, value.clone()),
            Event::Leaf(LeafEvent::Name { name, .. }) => name.to_string(),
            Event::ShiftLeft { .. } => "`ShiftLeft`".to_owned(),
            Event::Error(e) => return error_tree(pos.clone(), parts_to_strings(&pos, &e.parts)),
        };
        Tree::value(pos, Value::Str(text))
    }

    fn malformed(&self, index: usize, description: impl Into<String>) -> EngineError {
        EngineError::Malformed {
            description: description.into(),
            index,
            dump: dump_events(self.events, index),
        }
    }
}

fn make_inner(finished: FinishedType, pos: Position, mut children: Vec<Tree>) -> Option<Tree> {
    match finished {
        FinishedType::Tree(TreeType::Inner(kind)) => Some(Tree::inner(kind, pos, children)),
        FinishedType::Tree(TreeType::Leaf(_)) => None,
        FinishedType::SoftBlock if children.len() == 1 => children.pop(),
        FinishedType::SoftBlock => Some(Tree::inner(InnerTreeType::Block, pos, children)),
        FinishedType::SoftComma if children.len() == 1 => children.pop(),
        FinishedType::SoftComma => {
            children.insert(0, Tree::value(pos.left_edge(), Value::Function(BuiltinFn::Comma)));
            Some(Tree::inner(InnerTreeType::Call, pos, children))
        }
    }
}

fn parts_to_strings(pos: &Position, parts: &[Part]) -> Vec<Tree> {
    parts
        .iter()
        .map(|p| Tree::value(pos.clone(), Value::Str(p.diagnostic_text())))
        .collect()
}

/// `Call(error, Call(list, rendered...))`
fn error_tree(pos: Position, rendered: Vec<Tree>) -> Tree {
    let mut listed = Vec::with_capacity(rendered.len() + 1);
    listed.push(Tree::value(pos.left_edge(), Value::Function(BuiltinFn::Listify)));
    listed.extend(rendered);
    Tree::inner(
        InnerTreeType::Call,
        pos.clone(),
        vec![
            Tree::value(pos.left_edge(), Value::Function(BuiltinFn::Error)),
            Tree::inner(InnerTreeType::Call, pos, listed),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Name;
    use crate::diagnostics::{ListBackedLogSink, MessageTemplate};
    use crate::event::ErrorKind;
    use crate::part::{CstToken, TokenType};
    use crate::source::CodeLocation;
    use serde_json::json;

    fn pos(left: usize, right: usize) -> Position {
        Position::new(CodeLocation::new("test"), left, right)
    }

    fn start(at: usize) -> Event {
        Event::start(pos(at, at))
    }

    fn finish(at: usize, finished: FinishedType) -> Event {
        Event::finish(pos(at, at), finished)
    }

    fn tree(t: TreeType) -> FinishedType {
        FinishedType::Tree(t)
    }

    const VALUE: TreeType = TreeType::Leaf(LeafTreeType::Value);
    const NAME: TreeType = TreeType::Leaf(LeafTreeType::RightName);
    const CALL: TreeType = TreeType::Inner(InnerTreeType::Call);

    fn token(text: &str, token_type: TokenType, at: usize) -> Event {
        Event::Leaf(LeafEvent::Token(CstToken::new(
            text,
            token_type,
            pos(at, at + text.len()),
        )))
    }

    fn int(n: i64, at: usize) -> Event {
        Event::value(Value::Int(n), pos(at, at + 1))
    }

    fn lift_ok(events: &[Event]) -> (Vec<serde_json::Value>, ListBackedLogSink) {
        let mut sink = ListBackedLogSink::new();
        let forest = lift(events, &mut sink).unwrap();
        (forest.iter().map(Tree::to_json).collect(), sink)
    }

    #[test]
    fn leaf_fast_path_decodes_tokens() {
        let (forest, _) = lift_ok(&[
            start(0),
            token("12", TokenType::Number, 0),
            finish(2, tree(VALUE)),
            start(3),
            token("x", TokenType::Word, 3),
            finish(4, tree(NAME)),
        ]);
        assert_eq!(forest, vec![json!(["Value", 12]), json!(["RightName", "x"])]);
    }

    #[test]
    fn soft_block_collapses_single_child() {
        let (forest, _) = lift_ok(&[start(0), int(1, 0), finish(1, FinishedType::SoftBlock)]);
        assert_eq!(forest, vec![json!(["Value", 1])]);
        let (forest, _) = lift_ok(&[
            start(0),
            int(1, 0),
            int(2, 2),
            finish(3, FinishedType::SoftBlock),
        ]);
        assert_eq!(
            forest,
            vec![json!(["Block", [["Value", 1], ["Value", 2]]])]
        );
    }

    #[test]
    fn soft_comma_adds_comma_call() {
        let (forest, _) = lift_ok(&[start(0), int(1, 0), finish(1, FinishedType::SoftComma)]);
        assert_eq!(forest, vec![json!(["Value", 1])]);
        let (forest, _) = lift_ok(&[
            start(0),
            int(1, 0),
            int(2, 2),
            finish(3, FinishedType::SoftComma),
        ]);
        assert_eq!(
            forest,
            vec![json!(["Call", [["Value", "fn ,"], ["Value", 1], ["Value", 2]]])]
        );
    }

    #[test]
    fn shift_left_swaps_operator_before_operand() {
        let plus = Event::name(Name::Parsed("+".into()), pos(2, 3));
        let (forest, _) = lift_ok(&[
            start(0),
            int(1, 0),
            plus,
            Event::ShiftLeft { pos: pos(3, 3) },
            int(2, 4),
            finish(5, tree(CALL)),
        ]);
        assert_eq!(
            forest,
            vec![json!(["Call", [["RightName", "+"], ["Value", 1], ["Value", 2]]])]
        );
    }

    #[test]
    fn error_events_become_error_trees_and_are_logged() {
        let error = ErrorEvent::new(
            ErrorKind::ProductionFailed,
            MessageTemplate::Unparsable,
            vec!["Expr".into()],
            vec![Part::Token(CstToken::new("?", TokenType::Punctuation, pos(0, 1)))],
            &pos(0, 0),
        );
        let (forest, sink) = lift_ok(&[Event::Error(error)]);
        assert_eq!(
            forest,
            vec![json!(["Call", [["Value", "fn error"], ["Call", [["Value", "fn list"], ["Value", "?"]]]]])]
        );
        assert_eq!(sink.messages(), vec!["Expected Expr here"]);
    }

    #[test]
    fn undecodable_leaf_becomes_logged_error_tree() {
        let (forest, sink) = lift_ok(&[
            start(0),
            token("abc", TokenType::Word, 0),
            finish(3, tree(VALUE)),
        ]);
        assert_eq!(
            forest,
            vec![json!(["Call", [["Value", "fn error"], ["Call", [["Value", "fn list"], ["Value", "abc"]]]]])]
        );
        assert_eq!(sink.messages(), vec!["Cannot decode abc"]);
        assert_eq!(sink.diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn leftover_events_are_folded_into_one_error_tree() {
        let (forest, _) = lift_ok(&[int(1, 0), finish(1, tree(CALL)), int(2, 2)]);
        assert_eq!(forest.len(), 2);
        assert_eq!(
            forest[1],
            json!(["Call", [["Value", "fn error"], ["Call", [["Value", "fn list"], ["Value", "`Call>`"], ["Value", 2]]]]])
        );
    }

    #[test]
    fn malformed_sequences_are_internal_errors() {
        let mut sink = ListBackedLogSink::new();
        let unbalanced = lift(&[start(0), int(1, 0)], &mut sink);
        assert!(matches!(unbalanced, Err(EngineError::Malformed { index: 2, .. })));

        let shift = lift(&[int(1, 0), Event::ShiftLeft { pos: pos(1, 1) }], &mut sink);
        assert!(matches!(shift, Err(EngineError::Malformed { index: 1, .. })));

        let orphan = lift(&[token("x", TokenType::Word, 0)], &mut sink);
        assert!(matches!(orphan, Err(EngineError::Malformed { index: 0, .. })));

        let leaf_kind = lift(&[start(0), int(1, 0), int(2, 1), finish(2, tree(VALUE))], &mut sink);
        match leaf_kind {
            Err(EngineError::Malformed { description, dump, .. }) => {
                assert!(description.contains("unexpected tree type"));
                assert!(dump.contains('\u{2191}'));
            }
            other => panic!("expected malformed, got {:?}", other),
        }
    }
}
