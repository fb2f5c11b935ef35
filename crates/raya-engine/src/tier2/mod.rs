//! Tier-2 tracing optimizer and copy-and-patch JIT.
//!
//! A second compilation tier sitting beside the existing `jit`/`aot`
//! Cranelift pipeline: instead of compiling a whole function's SSA form
//! up front, tier-2 builds one basic block of specialized codeunits at a
//! time, tracing the abstract type of every local and stack slot as it
//! goes, and lazily links each block's successors the first time
//! execution actually reaches them. It depends on nothing from `jit`/
//! `aot` — it operates directly on the same
//! `compiler::bytecode::{Module, Function, Opcode, ConstantPool}` types
//! the interpreter already uses.
//!
//! Module layout:
//! - [`decoder`]: tier-1 bytecode decoding, owned locally rather than
//!   reused from `jit::analysis::decoder` so this tier stays independent.
//! - [`types`] / [`context`] / [`propagator`]: the abstract type forest and
//!   the transfer function that updates it per tier-1 opcode.
//! - [`codeunit`]: the specialized opcode surface and its 16-bit
//!   instruction stream.
//! - [`space`]: the bump allocator basic blocks are emitted into.
//! - [`metadata`]: per-BB bookkeeping, the BB registry, and the
//!   backward-jump version table.
//! - [`builder`]: turns a stretch of tier-1 bytecode into one built BB.
//! - [`linker`]: lazily resolves and rewrites a BB's successor edges.
//! - [`stencil`] / [`jit`]: the copy-and-patch backend that turns linked
//!   codeunits into executable machine code.
//! - [`warmup`]: execution counting and opcode-based eligibility
//!   screening that gates entry into tier-2.
//! - [`engine`]: the external facade tying all of the above together.

pub mod error;
pub mod decoder;
pub mod types;
pub mod context;
pub mod propagator;
pub mod codeunit;
pub mod space;
pub mod metadata;
pub mod builder;
pub mod linker;
pub mod stencil;
pub mod jit;
pub mod warmup;

mod engine;
pub use engine::{Tier2Config, Tier2Engine};
pub use error::{Tier2Error, Tier2Result};
