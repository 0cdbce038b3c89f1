//! The stateful PEG engine (components A–E): an input buffer, a
//! memoization table per memoizable rule, a four-stack state manager, a
//! generic combinator evaluator, and the semantic traps built on top of it.
//! Grammar drivers ([`crate::preprocessor`], [`crate::wikitext`]) are built
//! entirely out of these pieces plus their own rule functions — the engine
//! itself knows nothing about wikitext syntax.

pub mod buffer;
pub mod combinators;
pub mod memo;
pub mod stacks;
pub mod traps;

pub use buffer::Buffer;
pub use combinators::PResult;
pub use stacks::StackManager;
