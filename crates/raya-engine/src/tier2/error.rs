//! Error types for the tier-2 optimizer and stencil JIT.

/// Errors that can occur anywhere in the tier-2 pipeline.
///
/// Every public entry point into tier-2 (builder, linker, stencil JIT,
/// warmup) returns `Result<_, Tier2Error>` or folds a `Tier2Error` into a
/// sentinel (`None`) at the interpreter boundary. No partial basic block
/// is ever published when one of these is returned.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Tier2Error {
    /// An allocator (BBSpace, executable-memory mapping) could not satisfy
    /// a request.
    #[error("tier-2 allocator out of memory")]
    OutOfMemory,

    /// The builder or stencil JIT encountered an opcode it cannot handle:
    /// a forbidden tier-1 opcode during warmup screening, or a tier-2
    /// opcode with no stencil during compilation.
    #[error("unsupported opcode: {0}")]
    UnsupportedOpcode(String),

    /// A backward-jump target's version ring already holds
    /// `MAX_BB_VERSIONS` distinct specializations.
    #[error("backward-jump target exhausted its {0} version slots")]
    VersionExhaustion(usize),

    /// A stencil's symbol load could not be resolved against loaded
    /// runtime helper symbols at preload time.
    #[error("unresolved JIT symbol: {0}")]
    SymbolUnresolved(String),
}

/// Convenience alias used throughout the tier-2 module.
pub type Tier2Result<T> = Result<T, Tier2Error>;
