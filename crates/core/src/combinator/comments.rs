//! Comment-aware combinators.

use super::{Applied, Combinator, Context};
use crate::ast::{BuiltinFn, InnerTreeType, LeafTreeType, TreeType, Value};
use crate::comments::{Comment, CommentType, Side};
use crate::event::{Event, FinishedType};
use crate::part::Part;
use crate::source::Position;

const VALUE: FinishedType = FinishedType::Tree(TreeType::Leaf(LeafTreeType::Value));
const CALL: FinishedType = FinishedType::Tree(TreeType::Inner(InnerTreeType::Call));

/// Comments in the gap before `input[position]`, back to the previous token.
/// Nothing at the end of input.
fn comments_at<'a>(ctx: &Context<'a>, position: usize) -> Vec<&'a Comment> {
    let input = ctx.input;
    let Some(part) = input.get(position) else {
        return Vec::new();
    };
    let after = part.pos().left_edge();
    let before = input[..position]
        .iter()
        .rev()
        .find_map(Part::as_token)
        .map(|t| t.pos.right_edge())
        .unwrap_or_else(|| Position::new(after.loc.clone(), 0, 0));
    let comments: &'a crate::comments::CommentIndex = ctx.comments;
    comments.comments_between(&before, &after)
}

fn value_tree(out: &mut Vec<Event>, value: Value, pos: &Position) {
    out.push(Event::start(pos.clone()));
    out.push(Event::value(value, pos.clone()));
    out.push(Event::finish(pos.right_edge(), VALUE));
}

/// Wraps what `decorated` matches in a doc comment call when doc comments
/// sit right before it (associated right) or right after it (associated
/// left). Semiliterate prose only counts when it is all there is.
pub(super) fn decorate(decorated: &Combinator, ctx: &mut Context<'_>, position: usize) -> Applied {
    let before: Vec<&Comment> = comments_at(ctx, position)
        .into_iter()
        .filter(|c| c.association() == Some(Side::Right) && c.content().is_some())
        .collect();
    let start = ctx.output.len();
    let Some(after) = decorated.apply(ctx, position)? else {
        return Ok(None);
    };
    if after == position {
        return Ok(Some(after));
    }

    let mut docs = before;
    docs.extend(
        comments_at(ctx, after)
            .into_iter()
            .filter(|c| c.association() == Some(Side::Left) && c.content().is_some()),
    );
    let semilit = docs
        .iter()
        .all(|c| c.comment_type == CommentType::SemilitParagraph);
    if !semilit {
        docs.retain(|c| c.comment_type != CommentType::SemilitParagraph);
    }
    let (Some(first), Some(last)) = (docs.first(), docs.last()) else {
        return Ok(Some(after));
    };
    let left = first.pos.left_edge();
    let right = last.pos.right_edge();
    let span = Position::spanning(docs.iter().map(|c| &c.pos), &left);

    let mut opening = Vec::with_capacity(4);
    opening.push(Event::start(left.clone()));
    value_tree(&mut opening, Value::Function(BuiltinFn::DocComment), &left);
    ctx.output.splice(start..start, opening);

    let contents = docs
        .iter()
        .filter_map(|c| c.content())
        .map(Value::Str)
        .collect();
    value_tree(&mut ctx.output, Value::List(contents), &span);
    value_tree(&mut ctx.output, Value::Bool(semilit), &right);
    ctx.output.push(Event::finish(right, CALL));
    Ok(Some(after))
}

/// Emits every comment before `input[position]` as
/// `Call(EmbeddedComment, text, association, is_semilit)`. Consumes nothing.
pub(super) fn to_calls(ctx: &mut Context<'_>, position: usize) -> Applied {
    for comment in comments_at(ctx, position) {
        let Some(content) = comment.content() else {
            continue;
        };
        let association = match comment.association() {
            Some(Side::Left) => Value::Bool(false),
            Some(Side::Right) => Value::Bool(true),
            None => Value::Null,
        };
        let semilit = comment.comment_type == CommentType::SemilitParagraph;
        let pos = &comment.pos;
        let out = &mut ctx.output;
        out.push(Event::start(pos.left_edge()));
        value_tree(out, Value::Function(BuiltinFn::EmbeddedComment), &pos.left_edge());
        value_tree(out, Value::Str(content), pos);
        value_tree(out, association, &pos.right_edge());
        value_tree(out, Value::Bool(semilit), &pos.right_edge());
        out.push(Event::finish(pos.right_edge(), CALL));
    }
    Ok(Some(position))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::comments::CommentIndex;
    use crate::productions::Productions;
    use crate::source::CodeLocation;

    fn pos(left: usize, right: usize) -> Position {
        Position::new(CodeLocation::new("test"), left, right)
    }

    fn run_with(
        c: &Combinator,
        input: &[Part],
        comments: Vec<Comment>,
        position: usize,
    ) -> (Applied, Vec<Event>) {
        let productions = Productions::new();
        let index = CommentIndex::new(comments);
        let mut ctx = Context::new(CodeLocation::new("test"), input, &productions, &index);
        let result = c.apply(&mut ctx, position);
        (result, ctx.into_output())
    }

    /// `x` at 0..1, `y` at 20..21 with room for comments between.
    fn spaced() -> Vec<Part> {
        let mut input = parts("x y");
        if let Part::Token(t) = &mut input[1] {
            t.pos = pos(20, 21);
        }
        input
    }

    fn values(events: &[Event]) -> Vec<Value> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Leaf(crate::event::LeafEvent::Value { value, .. }) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn doc_comment_wraps_decorated_output() {
        let comments = vec![Comment::new("/** about y */", CommentType::Block, pos(2, 16))];
        let (result, output) = run_with(
            &Combinator::DocComment(Box::new(exact("y"))),
            &spaced(),
            comments,
            1,
        );
        assert_eq!(result, Ok(Some(2)));
        assert_eq!(output.len(), 12);
        assert!(matches!(output[0], Event::StartTree { .. }));
        assert_eq!(
            values(&output),
            vec![
                Value::Function(BuiltinFn::DocComment),
                Value::List(vec![Value::Str("about y".into())]),
                Value::Bool(false),
            ]
        );
        assert!(matches!(output[11], Event::FinishTree { finished, .. } if finished == CALL));
    }

    #[test]
    fn plain_comments_do_not_decorate() {
        let comments = vec![Comment::new("// just a note", CommentType::Line, pos(2, 16))];
        let (result, output) = run_with(
            &Combinator::DocComment(Box::new(exact("y"))),
            &spaced(),
            comments,
            1,
        );
        assert_eq!(result, Ok(Some(2)));
        assert_eq!(token_texts(&output), vec!["y"]);
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn comments_become_calls_without_consuming() {
        let comments = vec![
            Comment::new("// note", CommentType::Line, pos(2, 9)),
            Comment::new("/**/", CommentType::Block, pos(10, 14)),
        ];
        let (result, output) = run_with(&Combinator::CommentsToCalls, &spaced(), comments, 1);
        assert_eq!(result, Ok(Some(1)));
        assert_eq!(
            values(&output),
            vec![
                Value::Function(BuiltinFn::EmbeddedComment),
                Value::Str("note".into()),
                Value::Null,
                Value::Bool(false),
            ]
        );
    }

    #[test]
    fn no_comments_at_end_of_input() {
        let comments = vec![Comment::new("// trailing", CommentType::Line, pos(2, 9))];
        let input = parts("x");
        let (result, output) = run_with(&Combinator::CommentsToCalls, &input, comments, 1);
        assert_eq!(result, Ok(Some(1)));
        assert!(output.is_empty());
    }
}
