//! Lazy linking: resolving a `BbBranch`/`BbJumpBackwardLazy` placeholder
//! the first time control actually reaches it, and rewriting the
//! placeholder in place so later hits skip resolution entirely.

use super::builder::{BBBuilder, BuiltBlock, GuardTestKind, Terminator};
use super::codeunit::{CodeUnit, TaggedBbId, Tier2Op, INLINE_CACHE_ENTRIES_BB_BRANCH};
use super::context::{known, TypeContext};
use super::error::{Tier2Error, Tier2Result};
use super::metadata::{BBMetadata, BBRegistry, BackwardJumpTable, BackwardJumpVersion, BbId, GuardInfo};
use super::propagator::GuardKind;
use super::space::BBSpace;
use super::types::{ConcreteType, NegativeType, NodeTag, TypeNode};

/// Owns the mutable linking state for one function's tier-2 activity: the
/// registry of built BBs, the codeunit space they live in, and the
/// backward-jump version table. `BBBuilder` is stateless and reusable
/// across calls, so it is borrowed per call rather than stored here.
pub struct LazyLinker {
    registry: BBRegistry,
    space: BBSpace,
    backward_jumps: BackwardJumpTable,
    /// Sorted, deduped set of offsets some `Jmp` in this function targets
    /// backward (every loop header), from `BBBuilder::backward_jump_targets`.
    /// Threaded into every `build` call so the builder splits a BB at a
    /// loop header instead of scanning through it.
    backward_targets: Vec<u32>,
}

impl LazyLinker {
    pub fn new(segment_capacity: usize, backward_targets: Vec<u32>) -> Self {
        LazyLinker {
            registry: BBRegistry::new(),
            space: BBSpace::new(segment_capacity),
            backward_jumps: BackwardJumpTable::new(),
            backward_targets,
        }
    }

    pub fn registry(&self) -> &BBRegistry {
        &self.registry
    }

    pub fn space(&self) -> &BBSpace {
        &self.space
    }

    /// Build and register the BB starting at `start_offset` with the given
    /// entry types, without resolving its successor edges. Those are
    /// resolved lazily, the first time execution actually takes them (see
    /// `generate_next_bb`).
    pub fn build_and_register(
        &mut self,
        builder: &BBBuilder,
        start_offset: u32,
        entry_types: TypeContext,
    ) -> Tier2Result<BbId> {
        let built = builder.build(start_offset, entry_types, &self.backward_targets)?;
        self.register(built)
    }

    /// Register a freshly built BB. A BB whose own `origin_offset` is a
    /// loop header (present in `backward_targets`) is additionally
    /// registered into the backward-jump version table under that same
    /// offset — this is the BB a `JUMP_BACKWARD_QUICK` must land on, not
    /// whichever BB happened to end in the `Jmp` that reaches it.
    fn register(&mut self, built: BuiltBlock) -> Tier2Result<BbId> {
        let is_backward = matches!(built.terminator, Terminator::BackwardJump { .. });
        let type_guard = match built.terminator {
            Terminator::TypeGuard { kind, stack_depth, .. } => Some(GuardInfo { kind, stack_depth }),
            _ => None,
        };
        let origin_offset = built.origin_offset;
        let is_loop_header = self.backward_targets.binary_search(&origin_offset).is_ok();
        let header_entry_types = is_loop_header.then(|| built.entry_types.copy());

        let mut codeunits = built.codeunits;
        append_terminator_placeholder(&mut codeunits, &built.terminator);

        let ptr = self.space.emit(&codeunits)?;
        let meta = BBMetadata {
            code: ptr,
            len: codeunits.len(),
            origin_offset,
            entry_types: built.entry_types,
            exit_types: built.exit_types.copy(),
            type_guard,
            success: None,
            failure: None,
            is_backward_jump_source: is_backward,
        };
        let id = self.registry.insert(meta);

        if let Some(entry_types) = header_entry_types {
            self.backward_jumps.insert(origin_offset, BackwardJumpVersion { bb: id, entry_types })?;
        }

        Ok(id)
    }

    /// `_PyOptimizer_GenerateNextBB`'s analogue: given a BB whose
    /// placeholder hasn't been resolved yet, derive the successor's entry
    /// types from `from`'s exit types (folding in guard refinement when
    /// `from` ends in a `TypeGuard`), build the successor at
    /// `target_offset`, and link the two together. Returns the newly built
    /// successor id.
    pub fn generate_next_bb(
        &mut self,
        builder: &BBBuilder,
        from: BbId,
        is_success_edge: bool,
        target_offset: u32,
    ) -> Tier2Result<BbId> {
        let entry_types = self.successor_entry_types(from, is_success_edge);
        let successor = self.build_and_register(builder, target_offset, entry_types)?;
        let meta = self.registry.get_mut(from);
        if is_success_edge {
            meta.success = Some(successor);
        } else {
            meta.failure = Some(successor);
        }
        Ok(successor)
    }

    /// Derive a successor's entry types from `from`'s exit types. When
    /// `from` ends in a `TypeGuard`, the checked operand's root is narrowed
    /// to the guarded concrete type on the success edge, or has that type
    /// added to its ruled-out mask on the failure edge; every other
    /// terminator kind passes `exit_types` through unchanged.
    fn successor_entry_types(&self, from: BbId, is_success_edge: bool) -> TypeContext {
        let meta = self.registry.get(from);
        let mut types = meta.exit_types.copy();
        let Some(guard) = meta.type_guard else {
            return types;
        };

        let slot = types.stack_slot(guard.stack_depth as usize);
        let (_, root) = types.root_of(slot);
        if is_success_edge {
            let refined = match guard.kind {
                GuardKind::Int => ConcreteType::SmallInt,
                GuardKind::Float => ConcreteType::BoxedFloat,
            };
            types.type_overwrite_new(known(refined), slot);
        } else {
            let tested_flag = match guard.kind {
                GuardKind::Int => NegativeType::SMALL_INT,
                GuardKind::Float => NegativeType::BOXED_FLOAT,
            };
            let existing = match root.tag() {
                NodeTag::RootNegative => root.negative_mask().unwrap_or(NegativeType::EMPTY),
                _ => NegativeType::EMPTY,
            };
            types.type_overwrite_new(TypeNode::root_neg(existing.union(tested_flag)), slot);
        }
        types
    }

    /// `_PyOptimizer_LocateJumpBackwardsBB`'s analogue: find a
    /// backward-jump target BB whose entry types are compatible with
    /// `entry_types`, or build and register a new specialized version if
    /// none exists (and the version ring has room).
    pub fn locate_jump_backwards_bb(
        &mut self,
        builder: &BBBuilder,
        target_offset: u32,
        entry_types: TypeContext,
    ) -> Tier2Result<BbId> {
        if let Some(id) = self.backward_jumps.find_compatible(target_offset, &entry_types) {
            return Ok(id);
        }
        self.build_and_register(builder, target_offset, entry_types)
    }

    /// Rewrite a forward `BbBranch` placeholder once both its edges are
    /// known, replacing the terminator codeunit with a direct
    /// `JumpForward`/conditional-jump form and the tagged bb id in its
    /// cache slot. Same-size, in-place: the codeunit count never changes.
    pub fn rewrite_forward_jump(&mut self, id: BbId, target: BbId) -> Tier2Result<()> {
        self.rewrite_branch_cache(id, target, Tier2Op::JumpForward)
    }

    /// Rewrite a resolved backward-jump placeholder into
    /// `JumpBackwardQuick`, pointing at the specialized loop-header BB.
    pub fn rewrite_backward_jump(&mut self, id: BbId, target: BbId) -> Tier2Result<()> {
        self.rewrite_branch_cache(id, target, Tier2Op::JumpBackwardQuick)
    }

    fn rewrite_branch_cache(&mut self, id: BbId, target: BbId, new_op: Tier2Op) -> Tier2Result<()> {
        let meta = self.registry.get(id);
        let code = meta.code;
        let len = meta.len;
        let is_type_guard = meta.type_guard.is_some();
        let units = self.space.resolve(code);
        if units.is_empty() {
            return Err(Tier2Error::UnsupportedOpcode("empty BB has no terminator to rewrite".into()));
        }
        let branch_index = len
            .checked_sub(INLINE_CACHE_ENTRIES_BB_BRANCH + 1)
            .ok_or_else(|| Tier2Error::UnsupportedOpcode("BB too short for a branch cache slot".into()))?;

        let tagged = TaggedBbId::make(target.raw(), is_type_guard);
        let (hi, lo) = tagged.to_cache_bytes();
        self.space.overwrite(code, branch_index, CodeUnit::new(new_op, 0));
        self.space.overwrite(code, branch_index + 1, CodeUnit::new(Tier2Op::BbBranchCache, hi));
        self.space.overwrite(code, branch_index + 2, CodeUnit::new(Tier2Op::BbBranchCache, lo));
        Ok(())
    }
}

/// Push a branch/jump-lazy placeholder codeunit followed by
/// `INLINE_CACHE_ENTRIES_BB_BRANCH` reserved `BbBranchCache` codeunits. The
/// cache slots must be reserved now, at build time: `BBSpace::overwrite`
/// can only replace a codeunit in place, never grow a block, so
/// `rewrite_branch_cache` needs the slots to already exist when it later
/// writes the resolved target's tagged id into them.
fn push_branch_with_cache(out: &mut Vec<CodeUnit>, op: Tier2Op) {
    out.push(CodeUnit::new(op, 0));
    for _ in 0..INLINE_CACHE_ENTRIES_BB_BRANCH {
        out.push(CodeUnit::new(Tier2Op::BbBranchCache, 0));
    }
}

/// Append the placeholder codeunit(s) a block's terminator lowers to. The
/// linker later rewrites the branch op and its cache slots in place once
/// both edges are known, so the block's total length never changes across
/// linking.
fn append_terminator_placeholder(out: &mut Vec<CodeUnit>, terminator: &Terminator) {
    match terminator {
        Terminator::Jump { .. } => push_branch_with_cache(out, Tier2Op::BbBranch),
        Terminator::Branch { kind, .. } => {
            let test_op = match kind {
                GuardTestKind::IfFalse => Tier2Op::BbTestPopIfFalse,
                GuardTestKind::IfTrue => Tier2Op::BbTestPopIfTrue,
                GuardTestKind::IfNull => Tier2Op::BbTestPopIfNone,
                GuardTestKind::IfNotNull => Tier2Op::BbTestPopIfNotNone,
            };
            out.push(CodeUnit::new(test_op, 0));
            push_branch_with_cache(out, Tier2Op::BbBranch);
        }
        Terminator::BackwardJump { .. } => push_branch_with_cache(out, Tier2Op::BbJumpBackwardLazy),
        Terminator::Return | Terminator::ReturnVoid | Terminator::Throw => {
            out.push(CodeUnit::new(Tier2Op::Verbatim, 0xFF))
        }
        Terminator::Trap(code) => out.push(CodeUnit::new(Tier2Op::Verbatim, (*code & 0xFF) as u8)),
        // The CHECK_INT/CHECK_FLOAT codeunit itself was already pushed by
        // the builder; only the BB_BRANCH placeholder for its two
        // successors (narrowed-success, ruled-out-failure) remains.
        Terminator::TypeGuard { .. } => push_branch_with_cache(out, Tier2Op::BbBranch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::bytecode::{ConstantPool, Function, Opcode};

    fn function_with_code(code: Vec<u8>) -> Function {
        Function { name: "t".into(), param_count: 0, local_count: 1, code, register_count: 0, reg_code: Vec::new() }
    }

    #[test]
    fn build_and_register_tracks_backward_jump() {
        let mut code = Vec::new();
        code.push(Opcode::ConstTrue as u8);
        code.push(Opcode::JmpIfFalse as u8);
        code.extend_from_slice(&10i32.to_le_bytes());
        code.push(Opcode::Jmp as u8);
        code.extend_from_slice(&(-6i32).to_le_bytes());
        code.push(Opcode::ReturnVoid as u8);

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let mut linker = LazyLinker::new(64, Vec::new());

        let ctx = TypeContext::init(0, 4);
        let id = linker.build_and_register(&builder, 6, ctx).unwrap();
        assert!(linker.registry().get(id).is_backward_jump_source);
    }

    #[test]
    fn loop_header_is_registered_not_the_backward_jump_source() {
        // offset 0: Nop                          (loop header)
        // offset 1: JmpIfFalse -> taken 12, else fallthrough 6
        // offset 6: Nop                          (loop body)
        // offset 7: Jmp -7 -> target 0            (backward edge)
        // offset 12: ReturnVoid                  (loop exit)
        let mut code = Vec::new();
        code.push(Opcode::Nop as u8); // 0
        code.push(Opcode::JmpIfFalse as u8); // 1
        code.extend_from_slice(&11i32.to_le_bytes()); // taken = 1+11=12
        code.push(Opcode::Nop as u8); // 6
        code.push(Opcode::Jmp as u8); // 7
        code.extend_from_slice(&(-7i32).to_le_bytes()); // target = 7-7=0
        code.push(Opcode::ReturnVoid as u8); // 12

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let backward_targets = builder.backward_jump_targets();
        assert_eq!(backward_targets, vec![0]);

        let mut linker = LazyLinker::new(64, backward_targets);

        let header_ctx = TypeContext::init(0, 4);
        let header = linker.build_and_register(&builder, 0, header_ctx).unwrap();
        assert_eq!(linker.registry().get(header).origin_offset, 0);

        let body = linker.generate_next_bb(&builder, header, false, 6).unwrap();
        assert_eq!(linker.registry().get(body).origin_offset, 6);
        assert!(linker.registry().get(body).is_backward_jump_source);

        let lookup_ctx = TypeContext::init(0, 4);
        let found = linker.locate_jump_backwards_bb(&builder, 0, lookup_ctx).unwrap();
        assert_eq!(found, header);
        assert_ne!(found, body);
    }

    #[test]
    fn generate_next_bb_links_success_edge() {
        let mut code = Vec::new();
        code.push(Opcode::ReturnVoid as u8);
        code.push(Opcode::ReturnVoid as u8);

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let mut linker = LazyLinker::new(64, Vec::new());

        let ctx = TypeContext::init(0, 4);
        let first = linker.build_and_register(&builder, 0, ctx).unwrap();

        let second = linker.generate_next_bb(&builder, first, true, 1).unwrap();

        assert_eq!(linker.registry().get(first).success, Some(second));
    }

    #[test]
    fn generate_next_bb_narrows_guarded_operand_on_success_edge() {
        let mut code = Vec::new();
        code.push(Opcode::LoadLocal0 as u8); // offset 0
        code.push(Opcode::LoadLocal0 as u8); // offset 1
        code.push(Opcode::Iadd as u8); // offset 2
        code.push(Opcode::ReturnVoid as u8); // offset 3

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let mut linker = LazyLinker::new(64, Vec::new());

        let ctx = TypeContext::init(1, 4);
        let guard_bb = linker.build_and_register(&builder, 0, ctx).unwrap();
        assert!(linker.registry().get(guard_bb).type_guard.is_some());

        let success = linker.generate_next_bb(&builder, guard_bb, true, 2).unwrap();
        let success_entry = &linker.registry().get(success).entry_types;
        let top = success_entry.stack_slot(0);
        assert_eq!(
            success_entry.root_of(top).1.positive_type(),
            Some(crate::tier2::types::ConcreteType::SmallInt)
        );

        let failure = linker.generate_next_bb(&builder, guard_bb, false, 2).unwrap();
        let failure_entry = &linker.registry().get(failure).entry_types;
        let top = failure_entry.stack_slot(0);
        let mask = failure_entry.root_of(top).1.negative_mask().unwrap();
        assert!(mask.contains(crate::tier2::types::NegativeType::SMALL_INT));
    }

    #[test]
    fn chained_guard_successes_eventually_specialize() {
        // `a + a`: both operands alias the same local, so the first
        // CHECK_INT only narrows the instance it tested; the second
        // operand still needs its own guard before the add specializes.
        let mut code = Vec::new();
        code.push(Opcode::LoadLocal0 as u8); // offset 0
        code.push(Opcode::LoadLocal0 as u8); // offset 1
        code.push(Opcode::Iadd as u8); // offset 2
        code.push(Opcode::ReturnVoid as u8); // offset 3

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let mut linker = LazyLinker::new(64, Vec::new());

        let ctx = TypeContext::init(1, 4);
        let first_guard = linker.build_and_register(&builder, 0, ctx).unwrap();
        assert!(linker.registry().get(first_guard).type_guard.is_some());

        let second_guard = linker.generate_next_bb(&builder, first_guard, true, 2).unwrap();
        assert!(linker.registry().get(second_guard).type_guard.is_some());

        let specialized_bb = linker.generate_next_bb(&builder, second_guard, true, 2).unwrap();
        let meta = linker.registry().get(specialized_bb);
        assert!(meta.type_guard.is_none());
        let units = linker.space().resolve(meta.code);
        assert_eq!(units[0].op, Tier2Op::BinaryAddIntRest);
    }

    #[test]
    fn rewrite_forward_jump_overwrites_placeholder_in_place() {
        let mut code = Vec::new();
        code.push(Opcode::Jmp as u8);
        code.extend_from_slice(&5i32.to_le_bytes());
        code.push(Opcode::ReturnVoid as u8);

        let func = function_with_code(code);
        let consts = ConstantPool::new();
        let builder = BBBuilder::new(&func, &consts).unwrap();
        let mut linker = LazyLinker::new(64, Vec::new());

        let ctx = TypeContext::init(0, 4);
        let from = linker.build_and_register(&builder, 0, ctx).unwrap();
        let ctx2 = TypeContext::init(0, 4);
        let to = linker.build_and_register(&builder, 5, ctx2).unwrap();

        let len_before = linker.registry().get(from).len;
        linker.rewrite_forward_jump(from, to).unwrap();
        assert_eq!(linker.registry().get(from).len, len_before);
    }
}
