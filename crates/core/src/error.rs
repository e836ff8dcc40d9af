/// Internal-consistency failures.
///
/// These mean the grammar or the engine broke an invariant; they are never
/// reported as user diagnostics. Unparsable input is not an error at this
/// level -- it degrades to error subtrees plus messages on the log sink.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A production name was declared twice.
    #[error("duplicate production {name}")]
    DuplicateProduction { name: String },

    /// A reference named a production that was never declared.
    #[error("no definition for production {name} (entered via {})", .trace.join(" > "))]
    UndeclaredProduction { name: String, trace: Vec<String> },

    /// The event stream handed to the lifter is not well formed.
    #[error("{description} at {index}: {dump}")]
    Malformed {
        description: String,
        index: usize,
        dump: String,
    },

    /// A top-level application lifted to other than exactly one tree.
    #[error("expected exactly one tree from {production}, got {count}")]
    TreeCount { production: String, count: usize },

    /// A counting combinator ran outside any counter scope of its owner.
    #[error("no counter owned by {owner} on the counter stack")]
    MissingCounter { owner: String },

    /// A counter scope popped an entry it did not push.
    #[error("counter stack imbalance leaving scope of {owner}")]
    CounterImbalance { owner: String },

    /// A match combinator asked to emit a part that is not a token.
    #[error("cannot emit non-token part {part} as a leaf")]
    EmittedNonToken { part: String },
}
