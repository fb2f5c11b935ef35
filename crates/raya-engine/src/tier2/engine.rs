//! `Tier2Engine`: the external facade this module exposes to the VM's
//! frame-execution loop, mirroring `jit::engine::JitEngine`'s role for the
//! Cranelift pipeline.

use rustc_hash::FxHashMap;

use crate::compiler::bytecode::{ConstantPool, Function};

use super::builder::BBBuilder;
use super::context::TypeContext;
use super::error::Tier2Result;
use super::jit::{ExecutableTrace, StencilJit, SymbolResolver};
use super::linker::LazyLinker;
use super::metadata::BbId;
use super::space::DEFAULT_SEGMENT_CODEUNITS;
use super::stencil::{StencilTable, StubStencilTable};
use super::warmup::{Eligibility, WarmupConfig, WarmupCounter};

/// Configuration for a [`Tier2Engine`].
pub struct Tier2Config {
    /// Execution-count threshold before a function enters tier-2.
    pub warmup: WarmupConfig,
    /// Codeunits per `BBSpace` segment.
    pub bb_space_segment_codeunits: usize,
}

impl Default for Tier2Config {
    fn default() -> Self {
        Tier2Config { warmup: WarmupConfig::default(), bb_space_segment_codeunits: DEFAULT_SEGMENT_CODEUNITS }
    }
}

/// All tier-2 state for one function once it has warmed up: its
/// `LazyLinker` (BB registry, codeunit space, backward-jump table).
struct FunctionState {
    linker: LazyLinker,
}

/// Top-level tier-2 engine: tracks warmup counters across every function
/// in a module and owns the per-function state created once a function
/// crosses the warmup threshold.
pub struct Tier2Engine {
    config: Tier2Config,
    warmup: WarmupCounter,
    functions: FxHashMap<u32, FunctionState>,
    stencils: StubStencilTable,
    jit: StencilJit,
}

impl Tier2Engine {
    pub fn new() -> Self {
        Self::with_config(Tier2Config::default())
    }

    pub fn with_config(config: Tier2Config) -> Self {
        let warmup = WarmupCounter::new(WarmupConfig { threshold: config.warmup.threshold });
        Tier2Engine {
            config,
            warmup,
            functions: FxHashMap::default(),
            stencils: StubStencilTable::new(),
            jit: StencilJit::new(),
        }
    }

    /// Record one `RESUME` hit for `func_index`. Returns `true` exactly
    /// the call that crosses the warmup threshold, at which point the
    /// caller should build the function's entry BB via
    /// [`Tier2Engine::enter`].
    pub fn record_resume(&mut self, func_index: u32) -> bool {
        self.warmup.record_resume(func_index)
    }

    /// Build and register the entry BB for `function`, starting tier-2
    /// execution at `entry_offset` with a freshly initialized type
    /// context. Call this once a function has both crossed the warmup
    /// threshold and passed [`super::warmup::screen`].
    pub fn enter(
        &mut self,
        func_index: u32,
        function: &Function,
        constants: &ConstantPool,
        entry_offset: u32,
    ) -> Tier2Result<BbId> {
        let eligible = matches!(super::warmup::screen(function)?, Eligibility::Eligible);
        if !eligible {
            return Err(super::error::Tier2Error::UnsupportedOpcode(
                "function is not eligible for tier-2 entry".to_string(),
            ));
        }

        let builder = BBBuilder::new(function, constants)?;
        let entry_types = TypeContext::init(function.local_count, function.local_count + 64);

        // Spec §4.6: populate the backward-jump-offset table (sorted,
        // deduped) before building the entry BB, so every loop header in
        // the function is known up front.
        let backward_targets = builder.backward_jump_targets();
        let segment_codeunits = self.config.bb_space_segment_codeunits;
        let state = self
            .functions
            .entry(func_index)
            .or_insert_with(|| FunctionState { linker: LazyLinker::new(segment_codeunits, backward_targets) });

        state.linker.build_and_register(&builder, entry_offset, entry_types)
    }

    /// Lazily build and link a BB's unresolved successor edge, mirroring
    /// `_PyOptimizer_GenerateNextBB`. The successor's entry types are
    /// derived internally from `from`'s exit types (and its type guard, if
    /// any) by the `LazyLinker` rather than supplied here.
    pub fn generate_next_bb(
        &mut self,
        func_index: u32,
        builder: &BBBuilder,
        from: BbId,
        is_success_edge: bool,
        target_offset: u32,
    ) -> Tier2Result<BbId> {
        let state = self.functions.get_mut(&func_index).ok_or_else(|| {
            super::error::Tier2Error::UnsupportedOpcode(format!("function {func_index} has no tier-2 state"))
        })?;
        state.linker.generate_next_bb(builder, from, is_success_edge, target_offset)
    }

    /// Find or build a specialized backward-jump target BB, mirroring
    /// `_PyOptimizer_LocateJumpBackwardsBB`.
    pub fn locate_jump_backwards_bb(
        &mut self,
        func_index: u32,
        builder: &BBBuilder,
        target_offset: u32,
        entry_types: TypeContext,
    ) -> Tier2Result<BbId> {
        let state = self.functions.get_mut(&func_index).ok_or_else(|| {
            super::error::Tier2Error::UnsupportedOpcode(format!("function {func_index} has no tier-2 state"))
        })?;
        state.linker.locate_jump_backwards_bb(builder, target_offset, entry_types)
    }

    pub fn rewrite_forward_jump(&mut self, func_index: u32, from: BbId, target: BbId) -> Tier2Result<()> {
        let state = self.functions.get_mut(&func_index).ok_or_else(|| {
            super::error::Tier2Error::UnsupportedOpcode(format!("function {func_index} has no tier-2 state"))
        })?;
        state.linker.rewrite_forward_jump(from, target)
    }

    pub fn rewrite_backward_jump(&mut self, func_index: u32, from: BbId, target: BbId) -> Tier2Result<()> {
        let state = self.functions.get_mut(&func_index).ok_or_else(|| {
            super::error::Tier2Error::UnsupportedOpcode(format!("function {func_index} has no tier-2 state"))
        })?;
        state.linker.rewrite_backward_jump(from, target)
    }

    /// Compile a linked BB's codeunits down to executable machine code.
    pub fn compile_trace(
        &self,
        func_index: u32,
        bb: BbId,
        resolver: &dyn SymbolResolver,
    ) -> Tier2Result<ExecutableTrace> {
        let state = self.functions.get(&func_index).ok_or_else(|| {
            super::error::Tier2Error::UnsupportedOpcode(format!("function {func_index} has no tier-2 state"))
        })?;
        let meta = state.linker.registry().get(bb);
        let units = state.linker.space().resolve(meta.code)[..meta.len].to_vec();
        // A single linked BB has no internal jump targets by construction
        // (its terminator sits at the very end); `jump_targets` only
        // matters once multiple BBs are stitched into one combined trace,
        // which nothing upstream does yet.
        self.jit.compile_trace(&units, &[], meta.origin_offset, &self.stencils as &dyn StencilTable, resolver)
    }

    pub fn free_trace(&self, trace: ExecutableTrace) {
        self.jit.free_trace(trace);
    }
}

impl Default for Tier2Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::bytecode::Opcode;
    use crate::tier2::stencil::HoleKind;

    fn function_with_code(code: Vec<u8>) -> Function {
        Function { name: "t".into(), param_count: 0, local_count: 1, code, register_count: 0, reg_code: Vec::new() }
    }

    struct NoHelpers;
    impl SymbolResolver for NoHelpers {
        fn resolve(&self, _kind: HoleKind) -> Option<u64> {
            None
        }
    }

    #[test]
    fn engine_warmup_then_enter_builds_entry_bb() {
        let mut code = Vec::new();
        code.push(Opcode::ConstI32 as u8);
        code.extend_from_slice(&1i32.to_le_bytes());
        code.push(Opcode::ConstI32 as u8);
        code.extend_from_slice(&2i32.to_le_bytes());
        code.push(Opcode::Iadd as u8);
        code.push(Opcode::ReturnVoid as u8);

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let mut engine = Tier2Engine::with_config(Tier2Config { warmup: WarmupConfig { threshold: 1 }, ..Tier2Config::default() });

        assert!(engine.record_resume(0));
        let bb = engine.enter(0, &func, &consts, 0).unwrap();

        let trace = engine.compile_trace(0, bb, &NoHelpers).unwrap();
        assert!(trace.len() > 0);
        engine.free_trace(trace);
    }

    #[test]
    fn enter_rejects_forbidden_function() {
        let code = vec![Opcode::Yield as u8, Opcode::ReturnVoid as u8];
        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let mut engine = Tier2Engine::new();
        assert!(engine.enter(0, &func, &consts, 0).is_err());
    }

    #[test]
    fn guard_success_edge_rebuilds_into_specialized_add() {
        // RESUME args come in with unknown types, so the entry BB for
        // `a + a; return` must split on a CHECK_INT guard before it can
        // specialize; following the success edge back to the same offset
        // should now specialize straight away.
        let mut code = Vec::new();
        code.push(Opcode::LoadLocal0 as u8); // offset 0
        code.push(Opcode::LoadLocal0 as u8); // offset 1
        code.push(Opcode::Iadd as u8); // offset 2
        code.push(Opcode::ReturnVoid as u8); // offset 3

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let mut engine =
            Tier2Engine::with_config(Tier2Config { warmup: WarmupConfig { threshold: 1 }, ..Tier2Config::default() });

        assert!(engine.record_resume(0));
        let entry = engine.enter(0, &func, &consts, 0).unwrap();

        let builder = BBBuilder::new(&func, &consts).unwrap();
        let after_guard = engine.generate_next_bb(0, &builder, entry, true, 2).unwrap();

        let trace = engine.compile_trace(0, after_guard, &NoHelpers).unwrap();
        assert!(trace.len() > 0);
        engine.free_trace(trace);
    }
}
