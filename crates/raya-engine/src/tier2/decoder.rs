//! Tier-1 bytecode instruction decoder, owned by `tier2` so this tier has
//! no dependency on `jit`/`aot`. Decodes raw bytecode bytes into typed
//! instruction structs with parsed operands — the same job
//! `jit::analysis::decoder` does for the Cranelift pipeline, duplicated
//! here rather than shared since the two tiers are meant to stay
//! independently buildable.

use crate::compiler::bytecode::Opcode;

/// Error during bytecode decoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid opcode byte {byte:#x} at offset {offset}")]
    InvalidOpcode { byte: u8, offset: usize },
    #[error("unexpected end of bytecode at offset {0}")]
    UnexpectedEnd(usize),
}

/// A decoded bytecode instruction with typed operands.
#[derive(Debug, Clone)]
pub struct DecodedInstr {
    /// Byte offset in the function's code array.
    pub offset: usize,
    pub opcode: Opcode,
    pub operands: Operands,
    /// Total size in bytes (opcode + operands).
    pub size: usize,
}

/// Typed operands for each instruction format.
#[derive(Debug, Clone)]
pub enum Operands {
    None,
    U16(u16),
    U32(u32),
    I32(i32),
    F64(f64),
    Call { func_index: u32, arg_count: u16 },
    Try { catch_offset: i32, finally_offset: i32 },
    NativeCall { native_id: u16, arg_count: u8 },
    MakeClosure { func_index: u32, capture_count: u16 },
    Spawn { func_index: u16, arg_count: u16 },
    ArrayLiteral { type_index: u32, length: u32 },
}

/// Decode all instructions in a function's bytecode.
pub fn decode_function(code: &[u8]) -> Result<Vec<DecodedInstr>, DecodeError> {
    let mut instrs = Vec::new();
    let mut pos = 0;

    while pos < code.len() {
        let offset = pos;
        let byte = code[pos];
        let opcode = Opcode::from_u8(byte).ok_or(DecodeError::InvalidOpcode { byte, offset })?;
        pos += 1;

        let operands = decode_operands(opcode, code, &mut pos, offset)?;
        let size = pos - offset;

        instrs.push(DecodedInstr { offset, opcode, operands, size });
    }

    Ok(instrs)
}

fn decode_operands(
    opcode: Opcode,
    code: &[u8],
    pos: &mut usize,
    offset: usize,
) -> Result<Operands, DecodeError> {
    match opcode {
        Opcode::Nop | Opcode::Pop | Opcode::Dup | Opcode::Swap
        | Opcode::ConstNull | Opcode::ConstTrue | Opcode::ConstFalse
        | Opcode::LoadLocal0 | Opcode::LoadLocal1
        | Opcode::StoreLocal0 | Opcode::StoreLocal1
        | Opcode::Iadd | Opcode::Isub | Opcode::Imul | Opcode::Idiv
        | Opcode::Imod | Opcode::Ineg | Opcode::Ipow
        | Opcode::Ishl | Opcode::Ishr | Opcode::Iushr
        | Opcode::Iand | Opcode::Ior | Opcode::Ixor | Opcode::Inot
        | Opcode::Fadd | Opcode::Fsub | Opcode::Fmul | Opcode::Fdiv
        | Opcode::Fneg | Opcode::Fpow | Opcode::Fmod
        | Opcode::Ieq | Opcode::Ine | Opcode::Ilt | Opcode::Ile
        | Opcode::Igt | Opcode::Ige
        | Opcode::Feq | Opcode::Fne | Opcode::Flt | Opcode::Fle
        | Opcode::Fgt | Opcode::Fge
        | Opcode::Eq | Opcode::Ne | Opcode::StrictEq | Opcode::StrictNe
        | Opcode::Not | Opcode::And | Opcode::Or | Opcode::Typeof
        | Opcode::Sconcat | Opcode::Slen
        | Opcode::Seq | Opcode::Sne | Opcode::Slt | Opcode::Sle
        | Opcode::Sgt | Opcode::Sge | Opcode::ToString
        | Opcode::Return | Opcode::ReturnVoid
        | Opcode::LoadElem | Opcode::StoreElem | Opcode::ArrayLen
        | Opcode::Await | Opcode::Yield
        | Opcode::NewMutex | Opcode::NewChannel
        | Opcode::MutexLock | Opcode::MutexUnlock
        | Opcode::NewSemaphore | Opcode::SemAcquire | Opcode::SemRelease
        | Opcode::WaitAll | Opcode::Sleep | Opcode::TaskCancel
        | Opcode::JsonIndex | Opcode::JsonIndexSet
        | Opcode::JsonPush | Opcode::JsonPop
        | Opcode::JsonNewObject | Opcode::JsonNewArray
        | Opcode::JsonKeys | Opcode::JsonLength
        | Opcode::Throw | Opcode::EndTry | Opcode::Rethrow
        | Opcode::TupleGet
        | Opcode::NewRefCell | Opcode::LoadRefCell | Opcode::StoreRefCell
        | Opcode::ArrayPush | Opcode::ArrayPop
        | Opcode::InstanceOf | Opcode::Cast => Ok(Operands::None),

        Opcode::LoadLocal | Opcode::StoreLocal
        | Opcode::LoadField | Opcode::StoreField
        | Opcode::LoadFieldFast | Opcode::StoreFieldFast
        | Opcode::OptionalField
        | Opcode::ConstStr
        | Opcode::CloseVar
        | Opcode::LoadCaptured | Opcode::StoreCaptured
        | Opcode::SetClosureCapture
        | Opcode::InitObject | Opcode::InitArray | Opcode::InitTuple
        | Opcode::Trap => {
            let v = read_u16(code, pos, offset)?;
            Ok(Operands::U16(v))
        }

        Opcode::SpawnClosure => {
            let arg_count = read_u16(code, pos, offset)?;
            Ok(Operands::U16(arg_count))
        }

        Opcode::Jmp | Opcode::JmpIfFalse | Opcode::JmpIfTrue
        | Opcode::JmpIfNull | Opcode::JmpIfNotNull => {
            let v = read_i32(code, pos, offset)?;
            Ok(Operands::I32(v))
        }

        Opcode::ConstI32 => {
            let v = read_i32(code, pos, offset)?;
            Ok(Operands::I32(v))
        }

        Opcode::ConstF64 => {
            let v = read_f64(code, pos, offset)?;
            Ok(Operands::F64(v))
        }

        Opcode::LoadConst | Opcode::New | Opcode::NewArray
        | Opcode::TaskThen | Opcode::LoadModule
        | Opcode::LoadGlobal | Opcode::StoreGlobal
        | Opcode::LoadStatic | Opcode::StoreStatic
        | Opcode::JsonGet | Opcode::JsonSet | Opcode::JsonDelete => {
            let v = read_u32(code, pos, offset)?;
            Ok(Operands::U32(v))
        }

        Opcode::Call | Opcode::CallMethod
        | Opcode::CallConstructor | Opcode::CallSuper | Opcode::CallStatic => {
            let func_index = read_u32(code, pos, offset)?;
            let arg_count = read_u16(code, pos, offset)?;
            Ok(Operands::Call { func_index, arg_count })
        }

        Opcode::Spawn => {
            let raw = read_u32(code, pos, offset)?;
            let func_index = raw as u16;
            let arg_count = read_u16(code, pos, offset)?;
            Ok(Operands::Spawn { func_index, arg_count })
        }

        Opcode::ObjectLiteral | Opcode::TupleLiteral => {
            let type_index = read_u32(code, pos, offset)?;
            let count = read_u16(code, pos, offset)?;
            Ok(Operands::Call { func_index: type_index, arg_count: count })
        }

        Opcode::MakeClosure => {
            let func_index = read_u32(code, pos, offset)?;
            let capture_count = read_u16(code, pos, offset)?;
            Ok(Operands::MakeClosure { func_index, capture_count })
        }

        Opcode::ArrayLiteral => {
            let type_index = read_u32(code, pos, offset)?;
            let length = read_u32(code, pos, offset)?;
            Ok(Operands::ArrayLiteral { type_index, length })
        }

        Opcode::Try => {
            let catch_offset = read_i32(code, pos, offset)?;
            let finally_offset = read_i32(code, pos, offset)?;
            Ok(Operands::Try { catch_offset, finally_offset })
        }

        Opcode::NativeCall | Opcode::ModuleNativeCall => {
            let native_id = read_u16(code, pos, offset)?;
            let arg_count = read_u8(code, pos, offset)?;
            Ok(Operands::NativeCall { native_id, arg_count })
        }
    }
}

fn read_u8(code: &[u8], pos: &mut usize, offset: usize) -> Result<u8, DecodeError> {
    if *pos >= code.len() {
        return Err(DecodeError::UnexpectedEnd(offset));
    }
    let v = code[*pos];
    *pos += 1;
    Ok(v)
}

fn read_u16(code: &[u8], pos: &mut usize, offset: usize) -> Result<u16, DecodeError> {
    if *pos + 2 > code.len() {
        return Err(DecodeError::UnexpectedEnd(offset));
    }
    let v = u16::from_le_bytes([code[*pos], code[*pos + 1]]);
    *pos += 2;
    Ok(v)
}

fn read_u32(code: &[u8], pos: &mut usize, offset: usize) -> Result<u32, DecodeError> {
    if *pos + 4 > code.len() {
        return Err(DecodeError::UnexpectedEnd(offset));
    }
    let v = u32::from_le_bytes([code[*pos], code[*pos + 1], code[*pos + 2], code[*pos + 3]]);
    *pos += 4;
    Ok(v)
}

fn read_i32(code: &[u8], pos: &mut usize, offset: usize) -> Result<i32, DecodeError> {
    if *pos + 4 > code.len() {
        return Err(DecodeError::UnexpectedEnd(offset));
    }
    let v = i32::from_le_bytes([code[*pos], code[*pos + 1], code[*pos + 2], code[*pos + 3]]);
    *pos += 4;
    Ok(v)
}

fn read_f64(code: &[u8], pos: &mut usize, offset: usize) -> Result<f64, DecodeError> {
    if *pos + 8 > code.len() {
        return Err(DecodeError::UnexpectedEnd(offset));
    }
    let v = f64::from_le_bytes([
        code[*pos], code[*pos + 1], code[*pos + 2], code[*pos + 3],
        code[*pos + 4], code[*pos + 5], code[*pos + 6], code[*pos + 7],
    ]);
    *pos += 8;
    Ok(v)
}
