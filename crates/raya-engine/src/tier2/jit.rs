//! The copy-and-patch stencil JIT: concatenates each codeunit's stencil,
//! patches holes and symbol loads, and maps the result executable.
//!
//! Memory is managed with a hidden size header ahead of every allocation —
//! `alloc` requests `nbytes + size_of::<usize>()`, writes the total size
//! as the header, and hands back a pointer past it; `free` reads the
//! header back off the returned pointer to know how much to unmap. This
//! keeps `ExecutableTrace` down to a pointer and a length instead of a
//! separately tracked allocation size.
//!
//! By default, traces are mapped read-write, patched, then `mprotect`'d to
//! read-execute (W^X). Building with the `tier2-rwx` feature skips the
//! `mprotect` step and maps read-write-execute up front instead, trading
//! the W^X guarantee for one fewer syscall per trace — useful on targets
//! where `mprotect` is unavailable or undesirable.

use std::mem::size_of;

use super::codeunit::CodeUnit;
use super::error::{Tier2Error, Tier2Result};
use super::stencil::{Hole, HoleKind, Stencil, StencilTable};

/// Size in bytes of one trampoline slot: this pipeline has no
/// per-architecture codegen (see `stencil.rs`'s module doc), so a
/// trampoline is just a patched absolute address rather than a real
/// native indirect-jump instruction — wide enough to hold one.
const TRAMPOLINE_SIZE: usize = size_of::<u64>();

/// Resolves a [`HoleKind`] to the absolute address it should patch in.
/// Successor BB addresses and runtime helper addresses come from
/// different sources (the linker's registry vs. the VM's helper table),
/// so this is a caller-supplied trait rather than a fixed lookup table.
pub trait SymbolResolver {
    fn resolve(&self, kind: HoleKind) -> Option<u64>;
}

/// Executable machine code produced by [`StencilJit::compile_trace`].
/// `ptr` points at the first executable byte of the trace body (past the
/// hidden size header); `len` is the number of body bytes, not counting
/// the header. `trampolines` points at the separate end-of-trace (and,
/// when present, jump-target) trampoline region every
/// `CONTINUE` hole may point into; it has no meaningful entry point of
/// its own but must stay mapped and must be freed alongside the body.
pub struct ExecutableTrace {
    ptr: *mut u8,
    len: usize,
    trampolines: *mut u8,
}

impl ExecutableTrace {
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// Safety: the pointer addresses immutable, page-granular executable
// memory once compile_trace returns; no aliasing mutable access exists
// past that point.
unsafe impl Send for ExecutableTrace {}
unsafe impl Sync for ExecutableTrace {}

/// Owns no state itself (every allocation is independently freed via
/// [`StencilJit::free_trace`]); exists as the namespace `Tier2Engine`
/// delegates to, mirroring `jit::backend::cranelift`'s backend struct
/// shape.
#[derive(Default)]
pub struct StencilJit;

impl StencilJit {
    pub fn new() -> Self {
        StencilJit
    }

    /// Compile a sequence of already-linked codeunits into one executable
    /// trace, per the copy-and-patch assembly steps:
    ///
    /// 1. Size every codeunit's stencil, aborting if any is empty (a
    ///    stencil with no code can't be a jump target or a continuation).
    /// 2. Allocate two executable regions: the trace body, and one
    ///    trampoline slot per entry in `jump_targets` plus a final
    ///    end-of-trace trampoline.
    /// 3. Copy each stencil into the body and patch its holes: `BASE` and
    ///    `CONTINUE` are resolved from the layout just computed,
    ///    `NEXT_INSTR` and `OPARG_PLUS_ONE` from this codeunit and
    ///    `origin_offset`, and the remaining kinds (`SuccessorBb`,
    ///    `RuntimeHelper`, `ConstantPool`) through `resolver`, same as
    ///    before. Each trampoline is stamped with the body address of the
    ///    codeunit it exists to let external control flow land on.
    /// 4. Return the trace: its entry point is always the body's first
    ///    byte (`ExecutableTrace::as_ptr`), never a trampoline — a
    ///    trampoline only matters to control flow that re-enters the
    ///    trace partway through from somewhere else.
    ///
    /// `jump_targets` is the sorted set of codeunit indices some edge
    /// (within this trace or from outside it) targets directly, distinct
    /// from plain sequential fall-through between consecutive codeunits.
    /// Compiling one linked BB at a time, as `Tier2Engine::compile_trace`
    /// currently does, never produces any — internal jump targets only
    /// arise once multiple BBs are stitched into a single trace, which
    /// this primitive supports but nothing upstream does yet.
    pub fn compile_trace(
        &self,
        units: &[CodeUnit],
        jump_targets: &[usize],
        origin_offset: u32,
        table: &dyn StencilTable,
        resolver: &dyn SymbolResolver,
    ) -> Tier2Result<ExecutableTrace> {
        if units.is_empty() {
            let raw = self.alloc(0)?;
            self.make_executable(raw, 0)?;
            let trampolines = self.alloc(0)?;
            self.make_executable(trampolines, 0)?;
            return Ok(ExecutableTrace { ptr: raw, len: 0, trampolines });
        }

        // Step 1: size pass.
        let mut stencils: Vec<&Stencil> = Vec::with_capacity(units.len());
        let mut body_offsets = Vec::with_capacity(units.len());
        let mut cursor = 0usize;
        for unit in units {
            let stencil = table
                .stencil_for(unit.op)
                .ok_or_else(|| Tier2Error::UnsupportedOpcode(format!("{:?}", unit.op)))?;
            if stencil.code_len() == 0 {
                return Err(Tier2Error::UnsupportedOpcode(format!("{:?} has an empty stencil", unit.op)));
            }
            body_offsets.push(cursor);
            cursor += stencil.code_len();
            stencils.push(stencil);
        }
        let body_len = cursor;

        // Step 2: two-region allocation.
        let trampoline_count = jump_targets.len() + 1;
        let end_trampoline_slot = jump_targets.len();
        let body = self.alloc(body_len)?;
        let trampolines = self.alloc(trampoline_count * TRAMPOLINE_SIZE)?;

        // Step 3: stamp every jump-target trampoline with the body
        // address it redirects to.
        for (slot, &target_idx) in jump_targets.iter().enumerate() {
            let target_addr = (body as u64) + body_offsets[target_idx] as u64;
            unsafe {
                write_patch(trampolines.add(slot * TRAMPOLINE_SIZE), 8, target_addr);
            }
        }
        // The end-of-trace trampoline: nothing follows the last codeunit,
        // so it carries no redirect address of its own.
        unsafe {
            write_patch(trampolines.add(end_trampoline_slot * TRAMPOLINE_SIZE), 8, 0);
        }

        // Copy stencil code into the body and collect (offset, hole,
        // owning codeunit index) triples before patching, so a missing
        // symbol fails before any hole is written.
        let mut pending: Vec<(usize, Hole, usize)> = Vec::new();
        for (i, stencil) in stencils.iter().enumerate() {
            let base = body_offsets[i];
            unsafe {
                std::ptr::copy_nonoverlapping(stencil.code.as_ptr(), body.add(base), stencil.code.len());
            }
            for hole in &stencil.holes {
                pending.push((base + hole.offset, *hole, i));
            }
            for load in &stencil.symbol_loads {
                resolver
                    .resolve(HoleKind::RuntimeHelper(load.helper))
                    .ok_or_else(|| Tier2Error::SymbolUnresolved(format!("{:?}", load.helper)))?;
            }
        }

        for (code_offset, hole, i) in pending {
            let hole_addr = (body as u64) + code_offset as u64;
            let resolved = match hole.kind {
                HoleKind::Base => (body as u64) + body_offsets[i] as u64,
                HoleKind::Continue => {
                    if i + 1 < units.len() {
                        (body as u64) + body_offsets[i + 1] as u64
                    } else {
                        (trampolines as u64) + (end_trampoline_slot * TRAMPOLINE_SIZE) as u64
                    }
                }
                HoleKind::OpargPlusOne => units[i].arg as u64 + 1,
                HoleKind::NextInstr(_) => resolver
                    .resolve(HoleKind::NextInstr(origin_offset))
                    .ok_or_else(|| Tier2Error::SymbolUnresolved(format!("{:?}", hole.kind)))?,
                other => resolver.resolve(other).ok_or_else(|| Tier2Error::SymbolUnresolved(format!("{other:?}")))?,
            };
            let value = super::stencil::resolve_hole(resolved, &hole, hole_addr);
            unsafe {
                write_patch(body.add(code_offset), hole.width, value);
            }
        }

        self.make_executable(body, body_len)?;
        self.make_executable(trampolines, trampoline_count * TRAMPOLINE_SIZE)?;

        Ok(ExecutableTrace { ptr: body, len: body_len, trampolines })
    }

    /// Release a trace's memory. Must only be called once per trace, and
    /// never while any caller might still be executing it.
    pub fn free_trace(&self, trace: ExecutableTrace) {
        self.free(trace.ptr);
        self.free(trace.trampolines);
    }

    #[cfg(unix)]
    fn alloc(&self, nbytes: usize) -> Tier2Result<*mut u8> {
        let header = size_of::<usize>();
        let total = nbytes + header;
        let page = page_size();
        let mapped = total.div_ceil(page) * page;

        unsafe {
            let addr = libc::mmap(
                std::ptr::null_mut(),
                mapped,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            );
            if addr == libc::MAP_FAILED {
                return Err(Tier2Error::OutOfMemory);
            }
            let base = addr as *mut u8;
            std::ptr::write(base as *mut usize, mapped);
            Ok(base.add(header))
        }
    }

    #[cfg(unix)]
    fn free(&self, ptr: *mut u8) {
        let header = size_of::<usize>();
        unsafe {
            let base = ptr.sub(header);
            let total = std::ptr::read(base as *const usize);
            libc::munmap(base as *mut libc::c_void, total);
        }
    }

    #[cfg(all(unix, not(feature = "tier2-rwx")))]
    fn make_executable(&self, ptr: *mut u8, len: usize) -> Tier2Result<()> {
        let header = size_of::<usize>();
        unsafe {
            let base = ptr.sub(header);
            let total = std::ptr::read(base as *const usize);
            let rc = libc::mprotect(base as *mut libc::c_void, total, libc::PROT_READ | libc::PROT_EXEC);
            if rc != 0 {
                return Err(Tier2Error::OutOfMemory);
            }
        }
        let _ = len;
        Ok(())
    }

    #[cfg(all(unix, feature = "tier2-rwx"))]
    fn make_executable(&self, ptr: *mut u8, len: usize) -> Tier2Result<()> {
        let header = size_of::<usize>();
        unsafe {
            let base = ptr.sub(header);
            let total = std::ptr::read(base as *const usize);
            let rc = libc::mprotect(
                base as *mut libc::c_void,
                total,
                libc::PROT_READ | libc::PROT_WRITE | libc::PROT_EXEC,
            );
            if rc != 0 {
                return Err(Tier2Error::OutOfMemory);
            }
        }
        let _ = len;
        Ok(())
    }
}

#[cfg(unix)]
fn page_size() -> usize {
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

// No Windows executable-memory backend yet (VirtualAlloc/VirtualProtect):
// tier-2 is unix-only for now, matching `vm::ffi::loader`'s platform split.
#[cfg(not(unix))]
impl StencilJit {
    fn alloc(&self, _nbytes: usize) -> Tier2Result<*mut u8> {
        Err(Tier2Error::OutOfMemory)
    }

    fn free(&self, _ptr: *mut u8) {}

    fn make_executable(&self, _ptr: *mut u8, _len: usize) -> Tier2Result<()> {
        Err(Tier2Error::OutOfMemory)
    }
}

unsafe fn write_patch(dst: *mut u8, width: u8, value: u64) {
    match width {
        4 => std::ptr::write_unaligned(dst as *mut u32, value as u32),
        8 => std::ptr::write_unaligned(dst as *mut u64, value),
        _ => unreachable!("stencil holes are only ever 4 or 8 bytes wide"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier2::codeunit::Tier2Op;
    use crate::tier2::stencil::StubStencilTable;

    struct NoHelpers;
    impl SymbolResolver for NoHelpers {
        fn resolve(&self, _kind: HoleKind) -> Option<u64> {
            None
        }
    }

    #[test]
    fn compile_trace_with_stub_table_produces_executable_bytes() {
        let jit = StencilJit::new();
        let table = StubStencilTable::new();
        let units = [CodeUnit::new(Tier2Op::CheckInt, 0), CodeUnit::new(Tier2Op::ResumeQuick, 0)];

        let trace = jit.compile_trace(&units, &[], 0, &table, &NoHelpers).unwrap();
        assert_eq!(trace.len(), 2);
        assert!(!trace.as_ptr().is_null());

        jit.free_trace(trace);
    }

    #[test]
    fn compile_trace_rejects_unknown_opcode_stencil() {
        struct EmptyTable;
        impl StencilTable for EmptyTable {
            fn stencil_for(&self, _op: Tier2Op) -> Option<&super::super::stencil::Stencil> {
                None
            }
        }

        let jit = StencilJit::new();
        let units = [CodeUnit::new(Tier2Op::CheckInt, 0)];
        let result = jit.compile_trace(&units, &[], 0, &EmptyTable, &NoHelpers);
        assert!(matches!(result, Err(Tier2Error::UnsupportedOpcode(_))));
    }

    #[test]
    fn alloc_and_free_roundtrip() {
        let jit = StencilJit::new();
        let ptr = jit.alloc(16).unwrap();
        assert!(!ptr.is_null());
        jit.free(ptr);
    }
}
