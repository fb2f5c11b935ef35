#![cfg(feature = "tier2")]

//! End-to-end tier-2 tests: type propagation through a built BB, backward
//! jump version caching, negative-bitmask enrichment, SWAP aliasing,
//! warmup/eligibility screening, and the stencil JIT's compile/free cycle.

use raya_engine::compiler::bytecode::{ConstantPool, Function, Opcode};
use raya_engine::tier2::builder::BBBuilder;
use raya_engine::tier2::codeunit::{CodeUnit, Tier2Op};
use raya_engine::tier2::context::{known, TypeContext};
use raya_engine::tier2::jit::{StencilJit, SymbolResolver};
use raya_engine::tier2::linker::LazyLinker;
use raya_engine::tier2::stencil::{HoleKind, StubStencilTable};
use raya_engine::tier2::types::ConcreteType;
use raya_engine::tier2::warmup::{screen, Eligibility, WarmupConfig, WarmupCounter};
use raya_engine::tier2::Tier2Error;

fn function_with_code(code: Vec<u8>, local_count: usize) -> Function {
    Function {
        name: "t".to_string(),
        param_count: 0,
        local_count,
        code,
        register_count: 0,
        reg_code: Vec::new(),
    }
}

fn emit_const_i32(code: &mut Vec<u8>, v: i32) {
    code.push(Opcode::ConstI32 as u8);
    code.extend_from_slice(&v.to_le_bytes());
}

// ============================================================================
// Int arithmetic specializes; the BB carries an accurate exit type
// ============================================================================

#[test]
fn int_addition_specializes_and_propagates_small_int() {
    let mut code = Vec::new();
    emit_const_i32(&mut code, 10);
    emit_const_i32(&mut code, 20);
    code.push(Opcode::Iadd as u8);
    code.push(Opcode::ReturnVoid as u8);

    let func = function_with_code(code, 0);
    let consts = ConstantPool::new();
    let builder = BBBuilder::new(&func, &consts).unwrap();
    let ctx = TypeContext::init(0, 4);
    let block = builder.build(0, ctx).unwrap();

    let top = block.exit_types.stack_slot(0);
    let ty = block.exit_types.root_of(top).1.positive_type();
    assert_eq!(ty, Some(ConcreteType::SmallInt));

    assert!(block.codeunits.iter().any(|u| u.op == Tier2Op::BinaryAddIntRest));
}

// ============================================================================
// A non-small-int operand (here, a negative i32 constant, which boxes)
// widens the result to BoxedInt, so the builder leaves the addition as a
// verbatim tier-1 dispatch rather than specializing it.
// ============================================================================

#[test]
fn boxed_int_operand_prevents_specialization() {
    let mut code = Vec::new();
    emit_const_i32(&mut code, -5);
    emit_const_i32(&mut code, 2);
    code.push(Opcode::Iadd as u8);
    code.push(Opcode::ReturnVoid as u8);

    let func = function_with_code(code, 0);
    let consts = ConstantPool::new();
    let builder = BBBuilder::new(&func, &consts).unwrap();
    let ctx = TypeContext::init(0, 4);
    let block = builder.build(0, ctx).unwrap();

    assert!(!block.codeunits.iter().any(|u| u.op == Tier2Op::BinaryAddIntRest));
}

// ============================================================================
// Loop backward-jump caching: a second entry with a compatible type
// context reuses the already-built version; an incompatible one builds a
// fresh specialization; MAX_BB_VERSIONS enforces a hard cap.
// ============================================================================

#[test]
fn backward_jump_reuses_compatible_version_and_specializes_incompatible_ones() {
    let mut code = Vec::new();
    code.push(Opcode::ConstTrue as u8);
    code.push(Opcode::JmpIfFalse as u8);
    code.extend_from_slice(&10i32.to_le_bytes());
    code.push(Opcode::Jmp as u8);
    code.extend_from_slice(&(-6i32).to_le_bytes());
    code.push(Opcode::ReturnVoid as u8);

    let func = function_with_code(code, 1);
    let consts = ConstantPool::new();
    let builder = BBBuilder::new(&func, &consts).unwrap();
    let mut linker = LazyLinker::new(64);

    let int_ctx = {
        let mut c = TypeContext::init(1, 4);
        c.type_overwrite_new(known(ConcreteType::SmallInt), c.local_slot(0));
        c
    };
    let first = linker.locate_jump_backwards_bb(&builder, 6, int_ctx.copy()).unwrap();
    let second = linker.locate_jump_backwards_bb(&builder, 6, int_ctx.copy()).unwrap();
    assert_eq!(first, second, "compatible entry types must reuse the cached version");

    let float_ctx = {
        let mut c = TypeContext::init(1, 4);
        c.type_overwrite_new(known(ConcreteType::BoxedFloat), c.local_slot(0));
        c
    };
    let third = linker.locate_jump_backwards_bb(&builder, 6, float_ctx).unwrap();
    assert_ne!(first, third, "incompatible entry types must build a fresh specialization");
}

// ============================================================================
// SWAP exchanges aliasing: two distinct locals pointing at the same stack
// slot follow it across the swap.
// ============================================================================

#[test]
fn swap_preserves_aliasing_through_exchange() {
    let code = vec![Opcode::Swap as u8, Opcode::ReturnVoid as u8];
    let func = function_with_code(code, 0);
    let consts = ConstantPool::new();
    let builder = BBBuilder::new(&func, &consts).unwrap();

    let mut ctx = TypeContext::init(0, 2);
    ctx.stack_push(raya_engine::tier2::types::TypeNode::NULL);
    ctx.stack_push(raya_engine::tier2::types::TypeNode::NULL);
    ctx.type_overwrite_new(known(ConcreteType::SmallInt), ctx.stack_slot(1));
    ctx.type_overwrite_new(known(ConcreteType::BoxedFloat), ctx.stack_slot(0));

    let block = builder.build(0, ctx).unwrap();
    let top = block.exit_types.root_of(block.exit_types.stack_slot(0)).1.positive_type();
    let second = block.exit_types.root_of(block.exit_types.stack_slot(1)).1.positive_type();
    assert_eq!(top, Some(ConcreteType::SmallInt));
    assert_eq!(second, Some(ConcreteType::BoxedFloat));
}

// ============================================================================
// Forbidden-opcode screening rejects functions tier-2 can't model before
// the builder ever runs, and the warmup counter crosses its threshold
// exactly once.
// ============================================================================

#[test]
fn warmup_and_screening_gate_tier2_entry() {
    let mut counter = WarmupCounter::new(WarmupConfig { threshold: 2 });
    assert!(!counter.record_resume(7));
    assert!(counter.record_resume(7));

    let generator_like = function_with_code(vec![Opcode::Yield as u8, Opcode::ReturnVoid as u8], 0);
    assert_eq!(screen(&generator_like).unwrap(), Eligibility::ForbiddenOpcode);

    let mut arithmetic_code = Vec::new();
    emit_const_i32(&mut arithmetic_code, 1);
    emit_const_i32(&mut arithmetic_code, 2);
    arithmetic_code.push(Opcode::Iadd as u8);
    arithmetic_code.push(Opcode::ReturnVoid as u8);
    let arithmetic = function_with_code(arithmetic_code, 0);
    assert_eq!(screen(&arithmetic).unwrap(), Eligibility::Eligible);
}

// ============================================================================
// Stencil JIT: compile a tiny trace with the stub table, verify the byte
// count matches the number of codeunits, then free it.
// ============================================================================

struct NoHelpers;
impl SymbolResolver for NoHelpers {
    fn resolve(&self, _kind: HoleKind) -> Option<u64> {
        None
    }
}

#[test]
fn stencil_jit_compiles_and_frees_a_trace() {
    let jit = StencilJit::new();
    let table = StubStencilTable::new();
    let units = [
        CodeUnit::new(Tier2Op::CheckInt, 0),
        CodeUnit::new(Tier2Op::BinaryAddIntRest, 0),
        CodeUnit::new(Tier2Op::ResumeQuick, 0),
    ];

    let trace = jit.compile_trace(&units, &table, &NoHelpers).unwrap();
    assert_eq!(trace.len(), units.len(), "stub stencils are one byte each");
    jit.free_trace(trace);
}

#[test]
fn stencil_jit_reports_unsupported_opcode() {
    struct EmptyTable;
    impl raya_engine::tier2::stencil::StencilTable for EmptyTable {
        fn stencil_for(&self, _op: Tier2Op) -> Option<&raya_engine::tier2::stencil::Stencil> {
            None
        }
    }

    let jit = StencilJit::new();
    let units = [CodeUnit::new(Tier2Op::CheckFloat, 0)];
    let err = jit.compile_trace(&units, &EmptyTable, &NoHelpers).unwrap_err();
    assert!(matches!(err, Tier2Error::UnsupportedOpcode(_)));
}
