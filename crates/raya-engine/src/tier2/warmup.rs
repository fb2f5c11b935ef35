//! Warmup: counts executions of `RESUME` and decides when a function is
//! hot enough to hand off to tier-2, screening out functions tier-2 can't
//! safely specialize before that handoff ever happens.

use rustc_hash::FxHashMap;

use crate::compiler::bytecode::{Function, Opcode};

use super::decoder::decode_function;
use super::error::{Tier2Error, Tier2Result};

/// Configuration for the warmup counter.
#[derive(Debug, Clone)]
pub struct WarmupConfig {
    /// Number of `RESUME` hits before a function is handed to tier-2.
    pub threshold: u32,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        WarmupConfig { threshold: 64 }
    }
}

/// Per-function warmup counter state. `!Sync` by construction (see
/// `NotSync` below): only the thread that owns a given frame increments
/// its function's counter, so there is no cross-thread contention to
/// design around.
pub struct WarmupCounter {
    counts: FxHashMap<u32, u32>,
    config: WarmupConfig,
    _not_sync: NotSync,
}

/// Zero-sized marker that is `!Sync` (it holds a `Cell`), so any struct
/// embedding it cannot be shared across threads without an explicit
/// wrapper — `Tier2FunctionState`'s single-writer-from-owning-thread
/// invariant is enforced by the compiler, not by convention.
#[derive(Default)]
struct NotSync(std::cell::Cell<()>);

impl WarmupCounter {
    pub fn new(config: WarmupConfig) -> Self {
        WarmupCounter { counts: FxHashMap::default(), config, _not_sync: NotSync::default() }
    }

    /// Record one more hit of `RESUME` for `func_index`. Returns `true`
    /// the call that crosses the threshold (and only that call — the
    /// counter keeps incrementing past it so callers can tell "just
    /// crossed" from "already hot").
    pub fn record_resume(&mut self, func_index: u32) -> bool {
        let count = self.counts.entry(func_index).or_insert(0);
        *count += 1;
        *count == self.config.threshold
    }

    pub fn count(&self, func_index: u32) -> u32 {
        self.counts.get(&func_index).copied().unwrap_or(0)
    }
}

/// Opcodes that disqualify a function from tier-2 specialization
/// altogether. Tier-2's type propagator and BB builder have no model for
/// generators, exceptions, closures, concurrency primitives, or bulk
/// object/array/tuple initialization, so any of these appearing anywhere
/// in the function's code rules it out before the builder ever runs.
fn is_forbidden(op: Opcode) -> bool {
    matches!(
        op,
        Opcode::Yield
            | Opcode::Await
            | Opcode::Throw
            | Opcode::Rethrow
            | Opcode::EndTry
            | Opcode::Trap
            | Opcode::LoadCaptured
            | Opcode::StoreCaptured
            | Opcode::SetClosureCapture
            | Opcode::MakeClosure
            | Opcode::Spawn
            | Opcode::SpawnClosure
            | Opcode::NewMutex
            | Opcode::NewChannel
            | Opcode::MutexLock
            | Opcode::MutexUnlock
            | Opcode::NewSemaphore
            | Opcode::SemAcquire
            | Opcode::SemRelease
            | Opcode::WaitAll
            | Opcode::TaskCancel
            | Opcode::InitObject
            | Opcode::InitArray
            | Opcode::InitTuple
    )
}

/// Whether `op` is one of the specializations tier-2 actually exists to
/// speed up. A function with no optimizable opcode anywhere gains nothing
/// from tier-2 and isn't worth the BB-building overhead.
fn is_optimizable(op: Opcode) -> bool {
    matches!(
        op,
        Opcode::Iadd
            | Opcode::Isub
            | Opcode::Imul
            | Opcode::Idiv
            | Opcode::Imod
            | Opcode::Ipow
            | Opcode::Fadd
            | Opcode::Fsub
            | Opcode::Fmul
            | Opcode::Fdiv
            | Opcode::Fpow
            | Opcode::Fmod
    )
}

/// The outcome of screening a function for tier-2 eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    NoOptimizableOpcode,
    ForbiddenOpcode,
}

/// Decode `function` and decide whether it's eligible for tier-2 entry.
/// Decoding happens once, here, rather than being repeated by both the
/// screen and the builder.
pub fn screen(function: &Function) -> Tier2Result<Eligibility> {
    let instrs = decode_function(&function.code)
        .map_err(|e| Tier2Error::UnsupportedOpcode(format!("{e:?}")))?;

    let mut saw_optimizable = false;
    for instr in &instrs {
        if is_forbidden(instr.opcode) {
            return Ok(Eligibility::ForbiddenOpcode);
        }
        if is_optimizable(instr.opcode) {
            saw_optimizable = true;
        }
    }

    Ok(if saw_optimizable { Eligibility::Eligible } else { Eligibility::NoOptimizableOpcode })
}
