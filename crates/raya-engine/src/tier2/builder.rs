//! Builds one basic block at a time from tier-1 bytecode: a single forward
//! scan that runs the type propagator, decides which opcodes specialize,
//! and stops at the first branch, type guard, or scope exit.

use rustc_hash::FxHashMap;

use crate::compiler::bytecode::{ConstantPool, Function, Opcode};

use super::codeunit::{CodeUnit, Tier2Op};
use super::decoder::{decode_function, DecodedInstr, Operands};
use super::context::TypeContext;
use super::error::{Tier2Error, Tier2Result};
use super::propagator::{self, GuardKind};
use super::types::{ConcreteType, NodeTag};

/// A tier-1 opcode paired with its decoded operands, kept for a `Verbatim`
/// codeunit so the stencil JIT can recover everything the original
/// instruction needs without cramming it into an 8-bit codeunit arg.
pub type SideTableEntry = (Opcode, Operands);

/// How a built block ends.
#[derive(Debug, Clone)]
pub enum Terminator {
    /// Unconditional jump to `target` (tier-1 bytecode offset).
    Jump { target: u32 },
    /// Conditional branch: `taken` if the test succeeds, `fallthrough` otherwise.
    Branch { kind: GuardTestKind, taken: u32, fallthrough: u32 },
    /// `target` is at or before this block's start: a loop edge, routed
    /// through the backward-jump version table instead of simple lazy
    /// linking.
    BackwardJump { target: u32 },
    /// Falls out of tier-2 back to the tier-1 interpreter: `Return`.
    Return,
    /// Falls out of tier-2 back to the tier-1 interpreter: `ReturnVoid`.
    ReturnVoid,
    /// Falls out of tier-2: `Throw`/`Rethrow`.
    Throw,
    /// Falls out of tier-2: `Trap`.
    Trap(u16),
    /// A `CHECK_INT`/`CHECK_FLOAT` guard split the block here: `stack_depth`
    /// names which operand of the (not-yet-executed) arithmetic instruction
    /// at `resume_offset` was checked. Both successors rebuild starting at
    /// `resume_offset`, re-entering `classify_binary_op` with the guard's
    /// outcome folded into the operand's type — success narrows it to a
    /// concrete type, failure rules that type out.
    TypeGuard { kind: GuardKind, stack_depth: u8, resume_offset: u32 },
}

/// The boolean/null test a conditional jump performs, mirrored from the
/// tier-1 opcode it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardTestKind {
    IfFalse,
    IfTrue,
    IfNull,
    IfNotNull,
}

/// One fully built basic block, ready to be registered with a `BBRegistry`
/// and (for its unresolved edges) handed to the `LazyLinker`.
#[derive(Debug, Clone)]
pub struct BuiltBlock {
    pub origin_offset: u32,
    pub codeunits: Vec<CodeUnit>,
    pub side_table: Vec<SideTableEntry>,
    pub entry_types: TypeContext,
    pub exit_types: TypeContext,
    pub terminator: Terminator,
}

/// Forward-scans a function's tier-1 bytecode starting at `start_offset`,
/// building codeunits until a branch, guard, or scope exit is reached.
pub struct BBBuilder<'a> {
    function: &'a Function,
    constants: &'a ConstantPool,
    instrs: Vec<DecodedInstr>,
    offset_to_index: FxHashMap<usize, usize>,
}

impl<'a> BBBuilder<'a> {
    /// Decode `function`'s bytecode once, up front, so repeated `build`
    /// calls (one per BB start offset) don't redecode the whole function.
    pub fn new(function: &'a Function, constants: &'a ConstantPool) -> Tier2Result<Self> {
        let instrs = decode_function(&function.code)
            .map_err(|e| Tier2Error::UnsupportedOpcode(format!("{e:?}")))?;
        let offset_to_index = instrs.iter().enumerate().map(|(i, instr)| (instr.offset, i)).collect();
        Ok(BBBuilder { function, constants, instrs, offset_to_index })
    }

    fn index_at(&self, offset: u32) -> Option<usize> {
        self.offset_to_index.get(&(offset as usize)).copied()
    }

    /// Scan every decoded `Jmp` for a backward edge (target at or before
    /// the jump's own offset) and return the sorted, deduped target set.
    /// Spec §4.6: `initialize` populates this table before building the
    /// entry BB, so every loop header is known up front rather than
    /// discovered one backward edge at a time.
    pub fn backward_jump_targets(&self) -> Vec<u32> {
        let mut targets: Vec<u32> = self
            .instrs
            .iter()
            .filter_map(|instr| match instr.opcode {
                Opcode::Jmp => match instr.operands {
                    Operands::I32(rel) => {
                        let target = resolve_jump(instr.offset, rel);
                        (target <= instr.offset as u32).then_some(target)
                    }
                    _ => None,
                },
                _ => None,
            })
            .collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }

    /// Build one basic block starting at `start_offset` with the given
    /// entry type context. `entry_types` is consumed and becomes
    /// `BuiltBlock::entry_types`; a working copy is mutated as the scan
    /// proceeds and ends up as `BuiltBlock::exit_types`.
    ///
    /// `backward_targets` is the sorted, deduped set of offsets some `Jmp`
    /// in the function jumps backward to (every loop header). Spec §4.3
    /// step 2: if the scan reaches one of these offsets and it isn't the
    /// block's own first instruction, the block must end there instead of
    /// running through it, so a loop header always starts its own BB and
    /// can be registered into the backward-jump version table. The scan
    /// ends the block with a synthesized `Jump` to that same offset; the
    /// header's own BB is then built lazily on first actual reach, via the
    /// same `generate_next_bb` path any other jump target uses.
    pub fn build(
        &self,
        start_offset: u32,
        entry_types: TypeContext,
        backward_targets: &[u32],
    ) -> Tier2Result<BuiltBlock> {
        let start_idx = self
            .index_at(start_offset)
            .ok_or_else(|| Tier2Error::UnsupportedOpcode(format!("no instruction at offset {start_offset}")))?;
        let mut idx = start_idx;

        let mut ctx = entry_types.copy();
        let mut codeunits = Vec::new();
        let mut side_table = Vec::new();

        let terminator = loop {
            let instr = &self.instrs[idx];

            if idx != start_idx && backward_targets.binary_search(&(instr.offset as u32)).is_ok() {
                break Terminator::Jump { target: instr.offset as u32 };
            }

            if let Some(terminator) = self.terminator_for(instr) {
                if let Terminator::Branch { .. } = terminator {
                    // BB_TEST_POP_IF_*: the test opcode this terminator
                    // lowers to pops its operand before testing it.
                    ctx.stack_shrink(1);
                }
                break terminator;
            }

            if is_binary_arith(instr.opcode) {
                match classify_binary_op(instr.opcode, &ctx) {
                    BinaryOpDecision::Guard { kind, stack_depth } => {
                        let guard_op = match kind {
                            GuardKind::Int => Tier2Op::CheckInt,
                            GuardKind::Float => Tier2Op::CheckFloat,
                        };
                        codeunits.push(CodeUnit::new(guard_op, stack_depth));
                        break Terminator::TypeGuard { kind, stack_depth, resume_offset: instr.offset as u32 };
                    }
                    BinaryOpDecision::Specialize(specialized) => {
                        propagator::propagate(instr.opcode, 0, &mut ctx, self.constants);
                        codeunits.push(CodeUnit::new(specialized, 0));
                    }
                    BinaryOpDecision::Fallback => {
                        propagator::propagate(instr.opcode, 0, &mut ctx, self.constants);
                        emit_verbatim(instr, &mut codeunits, &mut side_table);
                    }
                }
            } else {
                let raw_arg = operand_as_u32(&instr.operands);
                propagator::propagate(instr.opcode, raw_arg, &mut ctx, self.constants);
                emit_verbatim(instr, &mut codeunits, &mut side_table);
            }

            idx += 1;
            if idx >= self.instrs.len() {
                // Ran off the end of the function without a terminator:
                // treat as an implicit ReturnVoid, matching raya's
                // compiler which always appends one.
                break Terminator::ReturnVoid;
            }
        };

        Ok(BuiltBlock {
            origin_offset: start_offset,
            codeunits,
            side_table,
            entry_types,
            exit_types: ctx,
            terminator,
        })
    }

    fn terminator_for(&self, instr: &DecodedInstr) -> Option<Terminator> {
        let next_offset = (instr.offset + instr.size) as u32;
        match instr.opcode {
            Opcode::Jmp => match instr.operands {
                Operands::I32(rel) => {
                    let target = resolve_jump(instr.offset, rel);
                    Some(if target <= instr.offset as u32 {
                        Terminator::BackwardJump { target }
                    } else {
                        Terminator::Jump { target }
                    })
                }
                _ => None,
            },
            Opcode::JmpIfFalse | Opcode::JmpIfTrue | Opcode::JmpIfNull | Opcode::JmpIfNotNull => {
                match instr.operands {
                    Operands::I32(rel) => {
                        let taken = resolve_jump(instr.offset, rel);
                        let kind = match instr.opcode {
                            Opcode::JmpIfFalse => GuardTestKind::IfFalse,
                            Opcode::JmpIfTrue => GuardTestKind::IfTrue,
                            Opcode::JmpIfNull => GuardTestKind::IfNull,
                            Opcode::JmpIfNotNull => GuardTestKind::IfNotNull,
                            _ => unreachable!(),
                        };
                        Some(Terminator::Branch { kind, taken, fallthrough: next_offset })
                    }
                    _ => None,
                }
            }
            Opcode::Return => Some(Terminator::Return),
            Opcode::ReturnVoid => Some(Terminator::ReturnVoid),
            Opcode::Throw | Opcode::Rethrow => Some(Terminator::Throw),
            Opcode::Trap => {
                let code = match instr.operands {
                    Operands::U16(v) => v,
                    _ => 0,
                };
                Some(Terminator::Trap(code))
            }
            _ => None,
        }
    }
}

/// Whether `op` is one of the unboxing-ladder's binary arithmetic
/// opcodes — the only ones `classify_binary_op` ever sees.
fn is_binary_arith(op: Opcode) -> bool {
    matches!(op, Opcode::Iadd | Opcode::Isub | Opcode::Imul | Opcode::Fadd | Opcode::Fsub | Opcode::Fmul)
}

/// The concrete type, guard opcode, and specialized codeunit a binary
/// arithmetic opcode is after, keyed by which unboxing-ladder rung it sits
/// on.
fn binary_op_shape(op: Opcode) -> Option<(ConcreteType, GuardKind, Tier2Op)> {
    match op {
        Opcode::Iadd => Some((ConcreteType::SmallInt, GuardKind::Int, Tier2Op::BinaryAddIntRest)),
        Opcode::Isub => Some((ConcreteType::SmallInt, GuardKind::Int, Tier2Op::BinarySubtractIntRest)),
        Opcode::Imul => Some((ConcreteType::SmallInt, GuardKind::Int, Tier2Op::BinaryMultiplyIntRest)),
        Opcode::Fadd => Some((ConcreteType::BoxedFloat, GuardKind::Float, Tier2Op::BinaryAddFloatUnboxed)),
        Opcode::Fsub => Some((ConcreteType::BoxedFloat, GuardKind::Float, Tier2Op::BinarySubtractFloatUnboxed)),
        Opcode::Fmul => Some((ConcreteType::BoxedFloat, GuardKind::Float, Tier2Op::BinaryMultiplyFloatUnboxed)),
        _ => None,
    }
}

/// What `classify_binary_op` decided an arithmetic instruction should
/// become: specialize outright, fall back to the generic dispatch, or
/// split the block here with a runtime type guard.
#[derive(Debug, Clone, Copy)]
enum BinaryOpDecision {
    Specialize(Tier2Op),
    Fallback,
    Guard { kind: GuardKind, stack_depth: u8 },
}

/// The `infer_BINARY_OP` ladder, run *before* `propagate` touches `ctx`:
/// walk the two operands (stack depth 0 then 1), and
///
/// - an operand with unknown positive type needs a guard before this op
///   can specialize;
/// - an operand already ruled out for the wanted type (by a previous
///   guard's failure edge) means specializing is hopeless — fall back;
/// - an operand known to be some other concrete type entirely also falls
///   back, since no guard fixes that;
/// - once both operands are confirmed to be the wanted type, specialize.
///
/// Each `Guard` decision checks exactly one operand; if the other operand
/// still needs checking, the chain continues naturally the next time this
/// same bytecode offset is rebuilt (see `Terminator::TypeGuard`).
fn classify_binary_op(op: Opcode, ctx: &TypeContext) -> BinaryOpDecision {
    let Some((wanted, guard_kind, specialized)) = binary_op_shape(op) else {
        return BinaryOpDecision::Fallback;
    };
    let wanted_flag = wanted.negative_flag().expect("unboxing-ladder types always carry a negative flag");

    for depth in 0..2u8 {
        let (_, root) = ctx.root_of(ctx.stack_slot(depth as usize));
        match root.tag() {
            NodeTag::RootPositive => match root.positive_type() {
                Some(t) if t == wanted => continue,
                Some(_) => return BinaryOpDecision::Fallback,
                None => return BinaryOpDecision::Guard { kind: guard_kind, stack_depth: depth },
            },
            NodeTag::RootNegative => {
                let mask = root.negative_mask().expect("RootNegative always carries a mask");
                if mask.contains(wanted_flag) {
                    // Already guarded for this exact type and failed.
                    return BinaryOpDecision::Fallback;
                }
                return BinaryOpDecision::Guard { kind: guard_kind, stack_depth: depth };
            }
            _ => return BinaryOpDecision::Fallback,
        }
    }

    BinaryOpDecision::Specialize(specialized)
}

fn emit_verbatim(instr: &DecodedInstr, out: &mut Vec<CodeUnit>, side_table: &mut Vec<SideTableEntry>) {
    let index = side_table.len() as u32;
    side_table.push((instr.opcode, instr.operands.clone()));
    emit_with_wide_arg(out, Tier2Op::Verbatim, index);
}

/// Emit `op` with a (possibly wide) immediate, chaining `ExtendedArg`
/// codeunits the same way tier-1 bytecode chains `EXTENDED_ARG` prefixes:
/// each prefix contributes 8 more significant bits, read most-significant
/// first, before the final codeunit carries the low byte.
fn emit_with_wide_arg(out: &mut Vec<CodeUnit>, op: Tier2Op, full_arg: u32) {
    let bytes = full_arg.to_be_bytes();
    let mut start = 0;
    while start < 3 && bytes[start] == 0 {
        start += 1;
    }
    for &b in &bytes[start..3] {
        out.push(CodeUnit::new(Tier2Op::ExtendedArg, b));
    }
    out.push(CodeUnit::new(op, bytes[3]));
}

fn operand_as_u32(operands: &Operands) -> u32 {
    match *operands {
        Operands::None => 0,
        Operands::U16(v) => v as u32,
        Operands::U32(v) => v,
        Operands::I32(v) => v as u32,
        Operands::F64(_) => 0,
        Operands::Call { func_index, .. } => func_index,
        Operands::Try { .. } => 0,
        Operands::NativeCall { native_id, .. } => native_id as u32,
        Operands::MakeClosure { func_index, .. } => func_index,
        Operands::Spawn { func_index, .. } => func_index as u32,
        Operands::ArrayLiteral { type_index, .. } => type_index,
    }
}

fn resolve_jump(instr_offset: usize, relative: i32) -> u32 {
    ((instr_offset as i64) + (relative as i64)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::bytecode::Function;

    fn function_with_code(code: Vec<u8>) -> Function {
        Function {
            name: "test".to_string(),
            param_count: 0,
            local_count: 2,
            code,
            register_count: 0,
            reg_code: Vec::new(),
        }
    }

    fn emit_const_i32(code: &mut Vec<u8>, v: i32) {
        code.push(Opcode::ConstI32 as u8);
        code.extend_from_slice(&v.to_le_bytes());
    }

    #[test]
    fn straight_line_block_ends_in_return_void() {
        let mut code = Vec::new();
        emit_const_i32(&mut code, 1);
        emit_const_i32(&mut code, 2);
        code.push(Opcode::Iadd as u8);
        code.push(Opcode::Pop as u8);
        code.push(Opcode::ReturnVoid as u8);

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let ctx = TypeContext::init(2, 4);
        let block = builder.build(0, ctx, &[]).unwrap();

        assert!(matches!(block.terminator, Terminator::ReturnVoid));
        // ConstI32, ConstI32, Iadd (specialized), Pop -> 4 codeunits
        assert_eq!(block.codeunits.len(), 4);
    }

    #[test]
    fn iadd_specializes_when_both_operands_small_int() {
        let mut code = Vec::new();
        emit_const_i32(&mut code, 1);
        emit_const_i32(&mut code, 2);
        code.push(Opcode::Iadd as u8);
        code.push(Opcode::ReturnVoid as u8);

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let ctx = TypeContext::init(0, 4);
        let block = builder.build(0, ctx, &[]).unwrap();

        let iadd_unit = block.codeunits[2];
        assert_eq!(iadd_unit.op, Tier2Op::BinaryAddIntRest);
    }

    #[test]
    fn conditional_jump_produces_branch_terminator() {
        let mut code = Vec::new();
        code.push(Opcode::ConstTrue as u8);
        code.push(Opcode::JmpIfFalse as u8);
        code.extend_from_slice(&11i32.to_le_bytes()); // target = 1+11=12
        code.push(Opcode::ReturnVoid as u8); // offset 6
        code.push(Opcode::ReturnVoid as u8); // offset 7..11 padding not needed, keep simple
        code.push(Opcode::Nop as u8);
        code.push(Opcode::Nop as u8);
        code.push(Opcode::Nop as u8);
        code.push(Opcode::Nop as u8);
        code.push(Opcode::ReturnVoid as u8); // offset 12 (target)

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let ctx = TypeContext::init(0, 4);
        let block = builder.build(0, ctx, &[]).unwrap();

        match block.terminator {
            Terminator::Branch { kind, taken, fallthrough } => {
                assert_eq!(kind, GuardTestKind::IfFalse);
                assert_eq!(taken, 12);
                assert_eq!(fallthrough, 6);
            }
            other => panic!("expected Branch terminator, got {other:?}"),
        }
    }

    #[test]
    fn backward_jump_detected() {
        let mut code = Vec::new();
        code.push(Opcode::ConstTrue as u8); // offset 0
        code.push(Opcode::JmpIfFalse as u8); // offset 1
        code.extend_from_slice(&10i32.to_le_bytes()); // target = 1+10=11
        code.push(Opcode::Jmp as u8); // offset 6
        code.extend_from_slice(&(-6i32).to_le_bytes()); // target = 6-6=0
        code.push(Opcode::ReturnVoid as u8); // offset 11

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let ctx = TypeContext::init(0, 4);
        let block = builder.build(6, ctx, &[]).unwrap();

        match block.terminator {
            Terminator::BackwardJump { target } => assert_eq!(target, 0),
            other => panic!("expected BackwardJump terminator, got {other:?}"),
        }
    }

    #[test]
    fn iadd_emits_check_int_guard_for_unknown_operand() {
        let mut code = Vec::new();
        code.push(Opcode::LoadLocal0 as u8); // offset 0
        code.push(Opcode::LoadLocal0 as u8); // offset 1
        code.push(Opcode::Iadd as u8); // offset 2
        code.push(Opcode::ReturnVoid as u8);

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let ctx = TypeContext::init(2, 4);
        let block = builder.build(0, ctx, &[]).unwrap();

        match block.terminator {
            Terminator::TypeGuard { kind, stack_depth, resume_offset } => {
                assert_eq!(kind, GuardKind::Int);
                assert_eq!(stack_depth, 0);
                assert_eq!(resume_offset, 2);
            }
            other => panic!("expected TypeGuard terminator, got {other:?}"),
        }
        assert_eq!(block.codeunits.last().unwrap().op, Tier2Op::CheckInt);
    }

    #[test]
    fn fadd_emits_check_float_guard_for_unknown_operand() {
        let mut code = Vec::new();
        code.push(Opcode::LoadLocal0 as u8);
        code.push(Opcode::LoadLocal1 as u8);
        code.push(Opcode::Fadd as u8);
        code.push(Opcode::ReturnVoid as u8);

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let ctx = TypeContext::init(2, 4);
        let block = builder.build(0, ctx, &[]).unwrap();

        match block.terminator {
            Terminator::TypeGuard { kind, .. } => assert_eq!(kind, GuardKind::Float),
            other => panic!("expected TypeGuard terminator, got {other:?}"),
        }
        assert_eq!(block.codeunits.last().unwrap().op, Tier2Op::CheckFloat);
    }

    #[test]
    fn iadd_falls_back_when_operand_type_known_incompatible() {
        let mut code = Vec::new();
        code.push(Opcode::ConstStr as u8);
        code.extend_from_slice(&0u16.to_le_bytes());
        code.push(Opcode::ConstStr as u8);
        code.extend_from_slice(&0u16.to_le_bytes());
        code.push(Opcode::Iadd as u8);
        code.push(Opcode::ReturnVoid as u8);

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let ctx = TypeContext::init(0, 4);
        let block = builder.build(0, ctx, &[]).unwrap();

        assert!(matches!(block.terminator, Terminator::ReturnVoid));
        // ConstStr, ConstStr, Iadd (verbatim, via side table) -> 3 codeunits
        assert_eq!(block.codeunits.len(), 3);
        assert_eq!(block.codeunits[2].op, Tier2Op::Verbatim);
    }

    #[test]
    fn branch_terminator_pops_test_value_from_exit_types() {
        let mut code = Vec::new();
        code.push(Opcode::ConstTrue as u8); // offset 0
        code.push(Opcode::JmpIfFalse as u8); // offset 1
        code.extend_from_slice(&10i32.to_le_bytes()); // target = 1+10=11
        code.push(Opcode::ReturnVoid as u8); // offset 6 (fallthrough)
        code.push(Opcode::Nop as u8);
        code.push(Opcode::Nop as u8);
        code.push(Opcode::Nop as u8);
        code.push(Opcode::Nop as u8);
        code.push(Opcode::ReturnVoid as u8); // offset 11 (target)

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let ctx = TypeContext::init(0, 4);
        let block = builder.build(0, ctx, &[]).unwrap();

        assert_eq!(block.exit_types.stack_top(), 0);
    }

    #[test]
    fn backward_jump_targets_sorted_and_deduped() {
        let mut code = Vec::new();
        code.push(Opcode::Nop as u8); // offset 0 (loop header)
        code.push(Opcode::Jmp as u8); // offset 1
        code.extend_from_slice(&(-1i32).to_le_bytes()); // target = 1-1=0
        code.push(Opcode::Jmp as u8); // offset 6
        code.extend_from_slice(&(-6i32).to_le_bytes()); // target = 6-6=0 (dup)
        code.push(Opcode::Jmp as u8); // offset 11
        code.extend_from_slice(&5i32.to_le_bytes()); // target = 11+5=16 (forward, not backward)
        code.push(Opcode::ReturnVoid as u8); // offset 16

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();

        assert_eq!(builder.backward_jump_targets(), vec![0]);
    }

    #[test]
    fn backward_target_mid_scan_splits_the_block() {
        let mut code = Vec::new();
        emit_const_i32(&mut code, 1); // offset 0..5
        code.push(Opcode::LoadLocal0 as u8); // offset 5 (loop header)
        code.push(Opcode::ReturnVoid as u8); // offset 6

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let ctx = TypeContext::init(2, 4);
        let block = builder.build(0, ctx, &[5]).unwrap();

        match block.terminator {
            Terminator::Jump { target } => assert_eq!(target, 5),
            other => panic!("expected Jump terminator at the backward target, got {other:?}"),
        }
        // Only the ConstI32 before the loop header is in this block.
        assert_eq!(block.codeunits.len(), 1);
    }

    #[test]
    fn backward_target_as_block_start_is_not_split() {
        let mut code = Vec::new();
        code.push(Opcode::LoadLocal0 as u8); // offset 0 (loop header, also start)
        code.push(Opcode::ReturnVoid as u8); // offset 1

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let ctx = TypeContext::init(2, 4);
        let block = builder.build(0, ctx, &[0]).unwrap();

        assert!(matches!(block.terminator, Terminator::ReturnVoid));
        assert_eq!(block.codeunits.len(), 1);
    }
}
