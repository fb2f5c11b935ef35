//! Per-basic-block bookkeeping: `BBMetadata`, the `BBRegistry` that owns
//! every BB built for a function, and the backward-jump version table
//! that bounds how many specializations a loop header can accumulate.

use rustc_hash::FxHashMap;

use super::context::TypeContext;
use super::error::{Tier2Error, Tier2Result};
use super::propagator::GuardKind;
use super::space::BBSpacePtr;

/// Which operand a BB's trailing `CHECK_INT`/`CHECK_FLOAT` guard tested,
/// carried alongside a guard-terminated BB's metadata so
/// `LazyLinker::generate_next_bb` can refine the successor's entry types
/// without re-decoding the block.
#[derive(Debug, Clone, Copy)]
pub struct GuardInfo {
    pub kind: GuardKind,
    pub stack_depth: u8,
}

/// Maximum number of distinct specialized versions kept per backward-jump
/// target before further versions are rejected outright.
pub const MAX_BB_VERSIONS: usize = 10;

/// Opaque handle to a built basic block, stable for the life of its
/// owning `BBRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BbId(u32);

impl BbId {
    fn new(raw: u32) -> Self {
        BbId(raw)
    }

    /// The raw id, used by the codeunit cache-slot packing in `codeunit.rs`.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// One built basic block and the state needed to link into and out of it.
#[derive(Debug, Clone)]
pub struct BBMetadata {
    /// Where this BB's codeunits live in the owning function's `BBSpace`.
    pub code: BBSpacePtr,
    /// Number of codeunits in this BB (the `BBSpace` slice is not
    /// self-terminating, so the length is carried alongside the pointer).
    pub len: usize,
    /// The tier-1 bytecode offset this BB starts at.
    pub origin_offset: u32,
    /// The type context in effect at BB entry.
    pub entry_types: TypeContext,
    /// The type context in effect at BB exit, before any guard refinement
    /// is folded in for a successor. Used by `LazyLinker::generate_next_bb`
    /// to derive a successor's entry types without re-running the builder.
    pub exit_types: TypeContext,
    /// Set when this BB's terminator is a type guard: which operand was
    /// checked, so the linker can narrow (success) or rule out (failure)
    /// that operand's type when deriving the successor's entry types.
    pub type_guard: Option<GuardInfo>,
    /// Successor on the fallthrough/guard-success edge, if already linked.
    pub success: Option<BbId>,
    /// Successor on the guard-failure/branch-not-taken edge, if already linked.
    pub failure: Option<BbId>,
    /// Whether this BB ends with a backward jump (a loop edge), which
    /// routes through the backward-jump version table instead of simple
    /// lazy linking.
    pub is_backward_jump_source: bool,
}

/// Owns every `BBMetadata` built for one function's tier-2 state, indexed
/// by `BbId`.
#[derive(Debug, Default)]
pub struct BBRegistry {
    blocks: Vec<BBMetadata>,
}

impl BBRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        BBRegistry { blocks: Vec::new() }
    }

    /// Register a freshly built BB, returning its id.
    pub fn insert(&mut self, meta: BBMetadata) -> BbId {
        let id = BbId::new(self.blocks.len() as u32);
        self.blocks.push(meta);
        id
    }

    /// Look up a BB's metadata.
    pub fn get(&self, id: BbId) -> &BBMetadata {
        &self.blocks[id.0 as usize]
    }

    /// Mutably look up a BB's metadata, used when lazy-linking a
    /// previously unresolved successor edge.
    pub fn get_mut(&mut self, id: BbId) -> &mut BBMetadata {
        &mut self.blocks[id.0 as usize]
    }

    /// Number of BBs registered so far.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no BBs have been registered yet.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// One specialized version of a backward-jump target: the BB built for a
/// particular entry `TypeContext`.
#[derive(Debug, Clone)]
pub struct BackwardJumpVersion {
    pub bb: BbId,
    pub entry_types: TypeContext,
}

/// The fixed-size ring of specializations kept per backward-jump target
/// bytecode offset. Bounded by [`MAX_BB_VERSIONS`]; once full, a new,
/// incompatible type context is rejected with
/// `Tier2Error::VersionExhaustion` rather than silently evicting an
/// existing version — callers that want a version freed must do so
/// explicitly.
#[derive(Debug, Default)]
pub struct BackwardJumpTable {
    // keyed by tier-1 bytecode offset of the jump target
    targets: FxHashMap<u32, Vec<BackwardJumpVersion>>,
}

impl BackwardJumpTable {
    /// An empty table.
    pub fn new() -> Self {
        BackwardJumpTable { targets: FxHashMap::default() }
    }

    /// Find an already-built version at `target_offset` compatible with
    /// `entry_types` (per `TypeContext::compatible`), preferring the
    /// version with the smallest `diff`. Returns `None` if no compatible
    /// version exists yet.
    pub fn find_compatible(&self, target_offset: u32, entry_types: &TypeContext) -> Option<BbId> {
        let versions = self.targets.get(&target_offset)?;
        versions
            .iter()
            .filter(|v| v.entry_types.compatible(entry_types))
            .min_by_key(|v| v.entry_types.diff(entry_types))
            .map(|v| v.bb)
    }

    /// Register a newly built version for `target_offset`.
    ///
    /// Errors with `VersionExhaustion` if the ring for this target already
    /// holds [`MAX_BB_VERSIONS`] entries.
    pub fn insert(&mut self, target_offset: u32, version: BackwardJumpVersion) -> Tier2Result<()> {
        let versions = self.targets.entry(target_offset).or_default();
        if versions.len() >= MAX_BB_VERSIONS {
            return Err(Tier2Error::VersionExhaustion(MAX_BB_VERSIONS));
        }
        versions.push(version);
        Ok(())
    }

    /// Number of versions currently held for `target_offset`.
    pub fn version_count(&self, target_offset: u32) -> usize {
        self.targets.get(&target_offset).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier2::context::{known, TypeContext};
    use crate::tier2::types::ConcreteType;

    fn dummy_meta(ctx: TypeContext) -> BBMetadata {
        BBMetadata {
            code: dummy_bb_space_ptr(),
            len: 0,
            origin_offset: 0,
            entry_types: ctx.copy(),
            exit_types: ctx,
            type_guard: None,
            success: None,
            failure: None,
            is_backward_jump_source: false,
        }
    }

    // BBSpacePtr has no public constructor outside `space.rs`'s `emit`;
    // tests here only need a placeholder value, obtained through a real
    // (empty) emission.
    fn dummy_bb_space_ptr() -> BBSpacePtr {
        let mut space = crate::tier2::space::BBSpace::new(4);
        space.emit(&[]).unwrap()
    }

    #[test]
    fn registry_roundtrip() {
        let mut reg = BBRegistry::new();
        let ctx = TypeContext::init(1, 1);
        let id = reg.insert(dummy_meta(ctx));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(id).origin_offset, 0);
    }

    #[test]
    fn backward_jump_table_finds_compatible_version() {
        let mut table = BackwardJumpTable::new();
        let mut reg = BBRegistry::new();
        let ctx = TypeContext::init(1, 0);
        let id = reg.insert(dummy_meta(ctx.copy()));
        table.insert(100, BackwardJumpVersion { bb: id, entry_types: ctx.copy() }).unwrap();

        let found = table.find_compatible(100, &ctx);
        assert_eq!(found, Some(id));
    }

    #[test]
    fn backward_jump_table_rejects_incompatible() {
        let mut table = BackwardJumpTable::new();
        let mut reg = BBRegistry::new();
        let mut ctx = TypeContext::init(1, 0);
        ctx.type_overwrite_new(known(ConcreteType::SmallInt), ctx.local_slot(0));
        let id = reg.insert(dummy_meta(ctx.copy()));
        table.insert(100, BackwardJumpVersion { bb: id, entry_types: ctx.copy() }).unwrap();

        let mut other = TypeContext::init(1, 0);
        other.type_overwrite_new(known(ConcreteType::BoxedFloat), other.local_slot(0));
        assert_eq!(table.find_compatible(100, &other), None);
    }

    #[test]
    fn backward_jump_table_exhausts_after_max_versions() {
        let mut table = BackwardJumpTable::new();
        for i in 0..MAX_BB_VERSIONS {
            let ctx = TypeContext::init(1, 0);
            let mut reg = BBRegistry::new();
            let id = reg.insert(dummy_meta(ctx.copy()));
            table.insert(200, BackwardJumpVersion { bb: id, entry_types: ctx }).unwrap();
            assert_eq!(table.version_count(200), i + 1);
        }
        let mut reg = BBRegistry::new();
        let ctx = TypeContext::init(1, 0);
        let id = reg.insert(dummy_meta(ctx.copy()));
        let err = table.insert(200, BackwardJumpVersion { bb: id, entry_types: ctx });
        assert_eq!(err, Err(Tier2Error::VersionExhaustion(MAX_BB_VERSIONS)));
    }
}
