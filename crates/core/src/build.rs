//! Entry point: parts in, one tree out.
//!
//! A thin driver over [`Productions::apply_at`] that reads its options from a
//! [`BuildConfig`].

use crate::ast::Tree;
use crate::comments::CommentIndex;
use crate::config::BuildConfig;
use crate::diagnostics::LogSink;
use crate::error::EngineError;
use crate::part::Part;
use crate::productions::Productions;
use crate::source::CodeLocation;
use tracing::{info_span, warn};

/// Builds the tree for `parts` with `productions`.
///
/// Returns the tree and the position the start production reached (`None`
/// if it failed outright). Unparsable input shows up as error subtrees and
/// as messages on `sink`; `Err` means the grammar or engine is broken.
pub fn build_tree(
    config: &BuildConfig,
    parts: &[Part],
    comments: &CommentIndex,
    sink: &mut dyn LogSink,
    productions: &Productions,
) -> Result<(Tree, Option<usize>), EngineError> {
    let loc = parts
        .first()
        .map(|p| p.pos().loc.clone())
        .unwrap_or_else(|| CodeLocation::new(&config.location));
    let span = info_span!("build_tree", loc = %loc, start = %config.start_production);
    let _entered = span.enter();

    let (tree, end) = productions.apply_at(
        &loc,
        &config.start_production,
        parts,
        comments,
        sink,
        config.must_consume_all,
    )?;
    if end != Some(parts.len()) {
        warn!(
            reached = ?end,
            parts = parts.len(),
            "start production did not consume all input"
        );
    }
    Ok((tree, end))
}
