//! The abstract transfer function: `propagate(op, arg, ctx, consts)`.
//! Maps each tier-1 `Opcode` onto a `TypeContext` mutation.

use crate::compiler::bytecode::{ConstantPool, Opcode};
use super::context::{known, TypeContext};
use super::types::ConcreteType;

/// The outcome of propagating a guard opcode: two possible successor type
/// contexts (success and failure paths), used by the builder to decide
/// whether a guard must be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    /// `CHECK_INT k`.
    Int,
    /// `CHECK_FLOAT k`.
    Float,
}

/// Apply one opcode's abstract transfer to `ctx`.
///
/// `arg` is the instruction's oparg (already merged from any
/// `EXTENDED_ARG` prefixes by the caller — see `builder.rs`). `consts` is
/// the owning function's constant pool, consulted by `LOAD_CONST`-family
/// opcodes to refine `ROOT_POS` types.
///
/// Not every raya opcode needs a bespoke case: comparison/string opcodes
/// just pop their operands and push a statically known result type. The
/// unboxing-ladder arithmetic opcodes (`Iadd`/`Isub`/`Imul`/`Fadd`/`Fsub`/
/// `Fmul`) get their own cases below, since their result type depends on
/// their operand types; `builder.rs`'s `classify_binary_op` then decides
/// whether to specialize, guard, or fall back to verbatim.
pub fn propagate(op: Opcode, arg: u32, ctx: &mut TypeContext, consts: &ConstantPool) {
    match op {
        Opcode::Nop | Opcode::Debugger => {}

        Opcode::Pop => {
            ctx.stack_shrink(1);
        }
        Opcode::Dup => {
            let top = ctx.stack_slot(0);
            let (_, root) = ctx.root_of(top);
            ctx.stack_push(root);
            let new_top = ctx.stack_slot(0);
            ctx.type_set_ref(top, new_top);
        }
        Opcode::Swap => {
            // General form is TYPE_SWAP(stack_top-1, stack_top-n); raya's
            // `Swap` has no oparg — it always exchanges the top two stack
            // slots, i.e. the n == 2 instance.
            let a = ctx.stack_slot(0);
            let b = ctx.stack_slot(1);
            ctx.type_swap(a, b);
        }

        Opcode::ConstNull => ctx.stack_push(known(ConcreteType::Null)),
        Opcode::ConstTrue | Opcode::ConstFalse => ctx.stack_push(known(ConcreteType::Bool)),
        Opcode::ConstI32 => {
            // Refines to smallint when the constant is a compact
            // non-negative integer. ConstI32 carries its value inline in
            // the instruction stream, not via the constant pool, but the
            // refinement rule is the same one LOAD_CONST uses.
            ctx.stack_push(known(if is_small_int(arg as i32) {
                ConcreteType::SmallInt
            } else {
                ConcreteType::BoxedInt
            }));
        }
        Opcode::ConstF64 => ctx.stack_push(known(ConcreteType::BoxedFloat)),
        Opcode::ConstStr => ctx.stack_push(known(ConcreteType::Str)),
        Opcode::LoadConst => {
            // LOAD_CONST indexes the shared constant pool; refine by the
            // constant's runtime kind.
            if let Some(i) = consts.get_integer(arg) {
                ctx.stack_push(known(if is_small_int(i) { ConcreteType::SmallInt } else { ConcreteType::BoxedInt }));
            } else if consts.get_float(arg).is_some() {
                ctx.stack_push(known(ConcreteType::BoxedFloat));
            } else if consts.get_string(arg).is_some() {
                ctx.stack_push(known(ConcreteType::Str));
            } else {
                ctx.stack_push(super::types::TypeNode::root_pos_unknown());
            }
        }

        Opcode::LoadLocal | Opcode::LoadLocal0 | Opcode::LoadLocal1 => {
            let idx = local_index(op, arg);
            let local = ctx.local_slot(idx);
            ctx.stack_grow(1);
            let dst = ctx.stack_slot(0);
            ctx.type_set_ref(local, dst);
        }
        Opcode::StoreLocal | Opcode::StoreLocal0 | Opcode::StoreLocal1 => {
            let idx = local_index(op, arg);
            let src = ctx.stack_slot(0);
            let dst = ctx.local_slot(idx);
            ctx.type_overwrite_ref(src, dst);
            ctx.stack_shrink(1);
        }

        // Iadd/Isub/Imul are the unboxing ladder's int rungs: the result
        // only stays SmallInt (the fast path `classify_binary_op` in
        // `builder.rs` specializes on) when both operands already were —
        // overflow into a general integer is always possible at runtime,
        // so any other input pairing widens to BoxedInt.
        Opcode::Iadd | Opcode::Isub | Opcode::Imul => {
            let result = if both_operands_are(ctx, ConcreteType::SmallInt) {
                ConcreteType::SmallInt
            } else {
                ConcreteType::BoxedInt
            };
            binary_result(ctx, result);
        }
        Opcode::Idiv | Opcode::Imod | Opcode::Ipow
        | Opcode::Ishl | Opcode::Ishr | Opcode::Iushr
        | Opcode::Iand | Opcode::Ior | Opcode::Ixor => {
            binary_result(ctx, ConcreteType::BoxedInt);
        }
        Opcode::Ineg | Opcode::Inot => unary_result(ctx, ConcreteType::BoxedInt),

        // Fadd/Fsub/Fmul are the unboxing ladder's float rungs. The
        // compiler only ever emits these for already-float operands, so
        // the result is always a float; which flavour the specializer
        // picks is decided by `classify_binary_op`, not by this type.
        Opcode::Fadd | Opcode::Fsub | Opcode::Fmul => binary_result(ctx, ConcreteType::BoxedFloat),
        Opcode::Fdiv | Opcode::Fpow | Opcode::Fmod => binary_result(ctx, ConcreteType::BoxedFloat),
        Opcode::Fneg => unary_result(ctx, ConcreteType::BoxedFloat),

        Opcode::Ieq | Opcode::Ine | Opcode::Ilt | Opcode::Ile | Opcode::Igt | Opcode::Ige
        | Opcode::Feq | Opcode::Fne | Opcode::Flt | Opcode::Fle | Opcode::Fgt | Opcode::Fge
        | Opcode::Seq | Opcode::Sne | Opcode::Slt | Opcode::Sle | Opcode::Sgt | Opcode::Sge
        | Opcode::Eq | Opcode::Ne | Opcode::StrictEq | Opcode::StrictNe
        | Opcode::And | Opcode::Or | Opcode::InstanceOf => {
            binary_result(ctx, ConcreteType::Bool);
        }
        Opcode::Not => unary_result(ctx, ConcreteType::Bool),
        Opcode::Typeof | Opcode::ToString => unary_result(ctx, ConcreteType::Str),
        Opcode::Sconcat => binary_result(ctx, ConcreteType::Str),
        Opcode::Slen | Opcode::ArrayLen => unary_result(ctx, ConcreteType::SmallInt),

        Opcode::ArrayPush => {
            ctx.stack_shrink(2);
        }
        Opcode::ArrayPop => unary_result(ctx, ConcreteType::Object),

        // Everything else escapes to a runtime helper or changes control
        // flow; it is either handled by the builder directly (calls,
        // jumps, guards) or forbidden at warmup. A conservative default:
        // leave the type context untouched for zero-stack-effect ops, or
        // push an unknown root when the opcode produces a value we don't
        // specifically model.
        _ => {}
    }
}

fn is_small_int(v: i32) -> bool {
    (0..=0xFFFF).contains(&v)
}

fn local_index(op: Opcode, arg: u32) -> usize {
    match op {
        Opcode::LoadLocal0 | Opcode::StoreLocal0 => 0,
        Opcode::LoadLocal1 | Opcode::StoreLocal1 => 1,
        _ => arg as usize,
    }
}

/// Whether the top two stack slots (the operands about to be consumed by
/// a binary opcode) both resolve to the concrete type `ty`.
fn both_operands_are(ctx: &TypeContext, ty: ConcreteType) -> bool {
    let a = ctx.root_of(ctx.stack_slot(0)).1.positive_type();
    let b = ctx.root_of(ctx.stack_slot(1)).1.positive_type();
    a == Some(ty) && b == Some(ty)
}

fn binary_result(ctx: &mut TypeContext, ty: ConcreteType) {
    ctx.stack_shrink(2);
    ctx.stack_push(known(ty));
}

fn unary_result(ctx: &mut TypeContext, ty: ConcreteType) {
    ctx.stack_shrink(1);
    ctx.stack_push(known(ty));
}
