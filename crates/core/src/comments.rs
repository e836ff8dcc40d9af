//! Comment storage and association heuristics.
//!
//! Comments never reach the part stream. The lexer hands them over separately
//! and combinators look them up by the gap between two parts.

use crate::source::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentType {
    /// `// ...` up to end of line
    Line,
    /// `/* ... */`
    Block,
    /// Prose between code sections of a semiliterate (Markdown-hosted) source
    SemilitParagraph,
}

/// Which neighbouring construct a comment documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The construct before the comment
    Left,
    /// The construct after the comment
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub comment_type: CommentType,
    pub pos: Position,
}

impl Comment {
    pub fn new(text: impl Into<String>, comment_type: CommentType, pos: Position) -> Self {
        Comment {
            text: text.into(),
            comment_type,
            pos,
        }
    }

    /// See [`comment_content`].
    pub fn content(&self) -> Option<String> {
        comment_content(&self.text, self.comment_type)
    }

    pub fn association(&self) -> Option<Side> {
        comment_association(&self.text, self.comment_type)
    }
}

/// Doc comments (`/** ... */`, `/// ...`) document what follows them,
/// `/**< ... */` and `///< ...` what precedes them. Semiliterate paragraphs
/// document what follows. Other comments are not associated.
pub fn comment_association(text: &str, comment_type: CommentType) -> Option<Side> {
    match comment_type {
        CommentType::SemilitParagraph => Some(Side::Right),
        CommentType::Line => {
            if text.starts_with("///<") {
                Some(Side::Left)
            } else if text.starts_with("///") && !text.starts_with("////") {
                Some(Side::Right)
            } else {
                None
            }
        }
        CommentType::Block => {
            if text.starts_with("/**<") {
                Some(Side::Left)
            } else if text.starts_with("/**") && text != "/**/" && !text.starts_with("/***") {
                Some(Side::Right)
            } else {
                None
            }
        }
    }
}

/// The text of a comment without its delimiters and decorative leading stars,
/// or `None` when nothing but whitespace remains.
pub fn comment_content(text: &str, comment_type: CommentType) -> Option<String> {
    let content = match comment_type {
        CommentType::SemilitParagraph => text.trim().to_owned(),
        CommentType::Line => text
            .trim_start_matches('/')
            .trim_start_matches(['<', '!'])
            .trim()
            .to_owned(),
        CommentType::Block => {
            let inner = text.strip_prefix("/*").unwrap_or(text);
            let inner = inner.strip_suffix("*/").unwrap_or(inner);
            let inner = inner.trim_start_matches('*').trim_start_matches('<');
            inner
                .lines()
                .map(|line| {
                    let line = line.trim();
                    line.strip_prefix('*').map(str::trim_start).unwrap_or(line)
                })
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        }
    };
    if content.trim().is_empty() {
        None
    } else {
        Some(content)
    }
}

/// Comments of one input, ordered by position.
#[derive(Debug, Clone, Default)]
pub struct CommentIndex {
    comments: Vec<Comment>,
}

impl CommentIndex {
    pub fn new(mut comments: Vec<Comment>) -> Self {
        comments.sort_by_key(|c| (c.pos.left, c.pos.right));
        CommentIndex { comments }
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// Comments lying entirely within `before.right ..= after.left`.
    pub fn comments_between(&self, before: &Position, after: &Position) -> Vec<&Comment> {
        let start = before.right;
        let end = after.left;
        if end < start {
            return Vec::new();
        }
        let first = self.comments.partition_point(|c| c.pos.left < start);
        self.comments[first..]
            .iter()
            .take_while(|c| c.pos.left <= end)
            .filter(|c| c.pos.right <= end && c.pos.loc == after.loc)
            .collect()
    }
}
