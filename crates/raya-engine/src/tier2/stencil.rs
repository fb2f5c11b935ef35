//! Stencils: pre-built machine-code templates with holes (offsets to patch
//! with a resolved address) and symbol loads (offsets that need a runtime
//! helper's address instead of a compile-time constant).
//!
//! Producing real per-architecture stencils (compiling a tiny C-like
//! template per `Tier2Op` and extracting its relocations, the way
//! `copy-and-patch` systems normally bootstrap) is out of scope here: this
//! module supplies the data types the JIT patches against, plus a
//! [`StubStencilTable`] that hands back single-byte trap instructions —
//! mirroring the role `jit::backend::stub::StubBackend` plays for the
//! Cranelift pipeline, so the rest of the pipeline (`jit.rs`) can be
//! exercised without a real codegen backend.

use rustc_hash::FxHashMap;

use super::codeunit::Tier2Op;

/// What a [`Hole`] should be patched with.
///
/// The first three kinds are resolved externally, through a
/// [`crate::tier2::jit::SymbolResolver`] the linker/VM supplies. The
/// remaining four are the copy-and-patch trace assembly's own addressing
/// kinds: `StencilJit::compile_trace` resolves them itself from the
/// layout it is building, without consulting the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoleKind {
    /// The address of the successor BB this codeunit branches to.
    SuccessorBb,
    /// The address of a runtime helper (box/unbox, allocation, dispatch).
    RuntimeHelper(RuntimeHelper),
    /// A constant pool entry's address (interned float, string, etc).
    ConstantPool,
    /// `BASE`: the address of this stencil instance once copied into the
    /// trace.
    Base,
    /// `CONTINUE`: the address of the next stencil in sequence, or the
    /// trace's end-of-trace trampoline for the last instruction.
    Continue,
    /// `NEXT_INSTR`: the address of the source tier-1 bytecode this
    /// codeunit lowers. Resolved at the owning BB's origin offset rather
    /// than per-codeunit, since codeunit provenance below BB granularity
    /// isn't tracked past `BBBuilder::build` (see DESIGN.md).
    NextInstr(u32),
    /// `OPARG_PLUS_ONE`: `arg + 1` of the codeunit this stencil was
    /// instantiated for. Resolved directly from the codeunit, never from
    /// the symbol resolver.
    OpargPlusOne,
}

/// Runtime helper functions stencils call into — the tier-2 analogue of
/// `jit::backend::traits::RuntimeHelper`, trimmed to what copy-and-patch
/// specialization actually needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeHelper {
    BoxFloat,
    UnboxFloat,
    BoxInt,
    CheckIntFail,
    CheckFloatFail,
    Deoptimize,
}

/// One patch site within a stencil's machine code.
#[derive(Debug, Clone, Copy)]
pub struct Hole {
    /// Byte offset within the stencil's code where the patch is written.
    pub offset: usize,
    /// How many bytes to write (4 or 8, depending on addressing mode).
    pub width: u8,
    /// What value resolves this hole.
    pub kind: HoleKind,
    /// Constant added to the resolved value before writing.
    pub addend: i64,
    /// Whether the patched value is relative to the hole's own address
    /// (`pc_relative`) or absolute.
    pub pc_relative: bool,
}

/// A symbol load: like a [`Hole`], but for data the stencil reads once at
/// load time rather than a per-instance patch (e.g. a shared jump table
/// base). Tracked separately so the JIT can resolve holes per compiled
/// trace but resolve symbol loads once per stencil table load.
#[derive(Debug, Clone, Copy)]
pub struct SymbolLoad {
    pub offset: usize,
    pub helper: RuntimeHelper,
}

/// One precompiled machine-code template for a single [`Tier2Op`].
#[derive(Debug, Clone)]
pub struct Stencil {
    pub code: Vec<u8>,
    pub holes: Vec<Hole>,
    pub symbol_loads: Vec<SymbolLoad>,
}

impl Stencil {
    pub fn code_len(&self) -> usize {
        self.code.len()
    }
}

/// Resolve a single hole's patch value given the addresses it needs:
/// `base + addend + pc_relative * hole_addr`, where `base` is the
/// resolved symbol/successor address and `hole_addr` is the absolute
/// address the hole's bytes will live at once copied into the trace.
pub fn resolve_hole(base: u64, hole: &Hole, hole_addr: u64) -> u64 {
    let pc_term = if hole.pc_relative { hole_addr } else { 0 };
    (base as i64).wrapping_add(hole.addend).wrapping_add(pc_term as i64) as u64
}

/// Source of stencils for each [`Tier2Op`]. Production systems bootstrap
/// this table from compiler-emitted object files at build time; this
/// trait exists so `jit.rs` doesn't hardcode which table implementation
/// backs it.
pub trait StencilTable {
    fn stencil_for(&self, op: Tier2Op) -> Option<&Stencil>;
}

/// A trap-only stencil table for exercising the JIT pipeline without real
/// per-architecture codegen: every [`Tier2Op`] maps to a one-byte trap
/// instruction (`0xCC` / `INT3` on x86-64), no holes, no symbol loads.
pub struct StubStencilTable {
    stencils: FxHashMap<Tier2Op, Stencil>,
}

impl StubStencilTable {
    pub fn new() -> Self {
        let trap = Stencil { code: vec![0xCC], holes: Vec::new(), symbol_loads: Vec::new() };
        let ops = [
            Tier2Op::ExtendedArg,
            Tier2Op::Verbatim,
            Tier2Op::BbBranch,
            Tier2Op::BbJumpIfFlagSet,
            Tier2Op::BbJumpIfFlagUnset,
            Tier2Op::BbJumpBackwardLazy,
            Tier2Op::JumpBackwardQuick,
            Tier2Op::JumpForward,
            Tier2Op::BbTestPopIfFalse,
            Tier2Op::BbTestPopIfTrue,
            Tier2Op::BbTestPopIfNone,
            Tier2Op::BbTestPopIfNotNone,
            Tier2Op::BbTestIter,
            Tier2Op::CheckInt,
            Tier2Op::CheckFloat,
            Tier2Op::UnboxFloat,
            Tier2Op::BoxFloat,
            Tier2Op::LoadFastNoIncref,
            Tier2Op::CopyNoIncref,
            Tier2Op::PopTopNoDecref,
            Tier2Op::StoreFastUnboxedBoxed,
            Tier2Op::StoreFastBoxedUnboxed,
            Tier2Op::StoreFastUnboxedUnboxed,
            Tier2Op::StoreFastBoxedBoxed,
            Tier2Op::BinaryAddFloatUnboxed,
            Tier2Op::BinarySubtractFloatUnboxed,
            Tier2Op::BinaryMultiplyFloatUnboxed,
            Tier2Op::BinaryAddIntRest,
            Tier2Op::BinarySubtractIntRest,
            Tier2Op::BinaryMultiplyIntRest,
            Tier2Op::BinarySubscrListIntRest,
            Tier2Op::StoreSubscrListIntRest,
            Tier2Op::ResumeQuick,
            Tier2Op::BbBranchCache,
        ];
        let stencils = ops.into_iter().map(|op| (op, trap.clone())).collect();
        StubStencilTable { stencils }
    }
}

impl Default for StubStencilTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StencilTable for StubStencilTable {
    fn stencil_for(&self, op: Tier2Op) -> Option<&Stencil> {
        self.stencils.get(&op)
    }
}
