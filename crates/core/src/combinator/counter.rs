//! Counting combinators.
//!
//! A grammar counts something on the way in (say, how many open brackets an
//! operator contributed) and replays a matcher that many times on the way
//! out. Counts live on a stack in the context so nested scopes with the same
//! owner see only their own count.

use super::{Applied, Combinator, Context};
use crate::error::EngineError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(0);

/// Ties a [`Combinator::Counter`] scope to the `CountUp` and `CountForEach`
/// combinators that refer to it. Every call to [`CounterOwner::new`] yields a
/// distinct owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterOwner(u64);

impl CounterOwner {
    pub fn new() -> Self {
        CounterOwner(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for CounterOwner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CounterOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "counter#{}", self.0)
    }
}

pub(super) fn scope(
    owner: CounterOwner,
    body: &Combinator,
    ctx: &mut Context<'_>,
    position: usize,
) -> Applied {
    ctx.counter_stack.push((owner, 0));
    let depth = ctx.counter_stack.len();
    let result = body.apply(ctx, position);
    let balanced = ctx.counter_stack.len() == depth
        && matches!(ctx.counter_stack.pop(), Some((o, _)) if o == owner);
    if !balanced {
        return Err(EngineError::CounterImbalance {
            owner: owner.to_string(),
        });
    }
    result
}

pub(super) fn count_up(owner: CounterOwner, ctx: &mut Context<'_>, position: usize) -> Applied {
    let entry = innermost(ctx, owner)?;
    ctx.counter_stack[entry].1 += 1;
    Ok(Some(position))
}

pub(super) fn for_each(
    owner: CounterOwner,
    repeated: &Combinator,
    ctx: &mut Context<'_>,
    position: usize,
) -> Applied {
    let count = ctx.counter_stack[innermost(ctx, owner)?].1;
    let start = ctx.output.len();
    let mut after = position;
    for _ in 0..count {
        match repeated.apply(ctx, after)? {
            Some(next) => after = next,
            None => {
                ctx.rollback(start);
                return Ok(None);
            }
        }
    }
    Ok(Some(after))
}

fn innermost(ctx: &Context<'_>, owner: CounterOwner) -> Result<usize, EngineError> {
    ctx.counter_stack
        .iter()
        .rposition(|(o, _)| *o == owner)
        .ok_or_else(|| EngineError::MissingCounter {
            owner: owner.to_string(),
        })
}
