//! The type context: a union-find forest spanning locals and stack slots.

use super::types::{ConcreteType, NegativeType, NodeTag, TypeNode};

/// Where a node lives: the locals array or the stack array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    /// `locals[index]`.
    Local,
    /// `stack[index]`.
    Stack,
}

/// A location within a [`TypeContext`]: which array, and the index into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Which array the node lives in.
    pub area: Area,
    /// Index into that array.
    pub index: u32,
}

/// A handle to a node inside a specific [`TypeContext`].
///
/// This is the "REF payload is an index, not a pointer" handle named in
/// `types.rs`'s module doc: every operation that needs to dereference a
/// node goes through a `TypeContext` method taking a `NodeRef`, so there is
/// never a raw pointer into the arrays anywhere in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef(Location);

impl NodeRef {
    /// A reference to `locals[index]`.
    pub fn local(index: u32) -> Self {
        NodeRef(Location { area: Area::Local, index })
    }

    /// A reference to `stack[index]`.
    pub fn stack(index: u32) -> Self {
        NodeRef(Location { area: Area::Stack, index })
    }

    /// The location this reference names.
    pub fn location(self) -> Location {
        self.0
    }
}

/// The abstract interpreter's per-program-point state: a forest of type
/// nodes covering both local variables and the operand stack.
#[derive(Debug, Clone)]
pub struct TypeContext {
    locals: Vec<TypeNode>,
    stack: Vec<TypeNode>,
    /// Number of live stack slots. Slots at or above this index are dead
    /// but keep their storage, since references into them from other
    /// slots may still be live.
    stack_top: usize,
}

impl TypeContext {
    /// A fresh context with every local and stack slot set to `ROOT_POS`
    /// with unknown type.
    pub fn init(locals_len: usize, stack_len: usize) -> Self {
        TypeContext {
            locals: vec![TypeNode::root_pos_unknown(); locals_len],
            stack: vec![TypeNode::root_pos_unknown(); stack_len],
            stack_top: 0,
        }
    }

    /// Number of local slots.
    pub fn locals_len(&self) -> usize {
        self.locals.len()
    }

    /// Number of stack slots (total capacity, not `stack_top`).
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Number of live stack slots.
    pub fn stack_top(&self) -> usize {
        self.stack_top
    }

    fn flat_index(&self, loc: Location) -> u32 {
        match loc.area {
            Area::Local => loc.index,
            Area::Stack => self.locals.len() as u32 + loc.index,
        }
    }

    /// Invert a flat slot index (as stored inside a `REF` node) back into
    /// an `(array, index)` pair.
    ///
    /// Because `REF` payloads here are already context-relative flat
    /// indices rather than raw pointers, this is a direct offset
    /// computation rather than a search loop; a debug assertion (not a
    /// scan) verifies the index is in range.
    pub fn locate(&self, flat_index: u32) -> Location {
        let nlocals = self.locals.len() as u32;
        if flat_index < nlocals {
            Location { area: Area::Local, index: flat_index }
        } else {
            let index = flat_index - nlocals;
            debug_assert!((index as usize) < self.stack.len(), "REF target out of range");
            Location { area: Area::Stack, index }
        }
    }

    fn get(&self, loc: Location) -> TypeNode {
        match loc.area {
            Area::Local => self.locals[loc.index as usize],
            Area::Stack => self.stack[loc.index as usize],
        }
    }

    fn set(&mut self, loc: Location, node: TypeNode) {
        match loc.area {
            Area::Local => self.locals[loc.index as usize] = node,
            Area::Stack => self.stack[loc.index as usize] = node,
        }
    }

    /// Follow `REF` links from `node` until a root is reached. Returns the
    /// root's location and value. Bounded by `locals_len + stack_len`
    /// steps, since the forest is acyclic by construction.
    pub fn root_of(&self, node: NodeRef) -> (NodeRef, TypeNode) {
        let mut loc = node.location();
        let bound = self.locals.len() + self.stack.len() + 1;
        for _ in 0..bound {
            let value = self.get(loc);
            match value.tag() {
                NodeTag::Ref => {
                    let target = value.ref_target().expect("Ref tag implies ref_target");
                    loc = self.locate(target);
                }
                NodeTag::RootPositive | NodeTag::RootNegative => {
                    return (NodeRef(loc), value);
                }
                NodeTag::Null => panic!("root_of encountered an uninitialized (NULL_TAG) node"),
            }
        }
        panic!("type forest cycle detected (exceeded {bound} steps)");
    }

    /// Whether `a` and `b` are in the same tree.
    pub fn same_tree(&self, a: NodeRef, b: NodeRef) -> bool {
        self.root_of(a).0 == self.root_of(b).0
    }

    /// Deep-clone this context.
    ///
    /// Because every `REF` already stores a context-relative flat index
    /// (see `types.rs`), cloning the two backing `Vec`s is sufficient —
    /// every reference still resolves to the same logical slot in the
    /// clone, turning deep-copy into a straight `Vec` clone with no
    /// pointer rewriting.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Push a node, growing `stack_top` by one. Used by the propagator
    /// and builder when an opcode pushes a value.
    pub fn stack_push(&mut self, node: TypeNode) {
        assert!(self.stack_top < self.stack.len(), "stack overflow in type context");
        self.stack[self.stack_top] = node;
        self.stack_top += 1;
    }

    /// Pop the top stack slot's value (does not clear storage).
    pub fn stack_pop(&mut self) -> TypeNode {
        assert!(self.stack_top > 0, "stack underflow in type context");
        self.stack_top -= 1;
        self.stack[self.stack_top]
    }

    /// A `NodeRef` to the stack slot `depth` entries below the top
    /// (`depth == 0` is the top-of-stack slot).
    pub fn stack_slot(&self, depth: usize) -> NodeRef {
        assert!(depth < self.stack_top, "stack_slot depth beyond stack_top");
        NodeRef::stack((self.stack_top - 1 - depth) as u32)
    }

    /// A `NodeRef` to `locals[index]`.
    pub fn local_slot(&self, index: usize) -> NodeRef {
        assert!(index < self.locals.len());
        NodeRef::local(index as u32)
    }

    /// Shrink the stack by `n` entries without touching slot storage.
    /// Stale slots are only cleared by a later `TYPE_OVERWRITE` of that
    /// slot, not eagerly on shrink.
    pub fn stack_shrink(&mut self, n: usize) {
        assert!(n <= self.stack_top);
        self.stack_top -= n;
    }

    /// Grow the live-stack count by `n` without writing to the newly-live
    /// slots (callers must immediately `stack_push`/overwrite them).
    pub fn stack_grow(&mut self, n: usize) {
        assert!(self.stack_top + n <= self.stack.len());
        self.stack_top += n;
    }

    // ---- The three primitive mutations ----

    /// `TYPE_SET(src, dst, src_is_new)`: make `dst`'s tree merge into
    /// `src`'s tree by overwriting `dst`'s root.
    pub fn type_set_new(&mut self, src: TypeNode, dst: NodeRef) {
        debug_assert!(src.is_root(), "TYPE_SET with src_is_new requires a root value");
        let (dst_root, _) = self.root_of(dst);
        self.set(dst_root.location(), src);
    }

    /// `TYPE_SET(src, dst, false)`: make `dst`'s root a reference to `src`.
    /// No-op if `src` and `dst` are already the same tree.
    pub fn type_set_ref(&mut self, src: NodeRef, dst: NodeRef) {
        if self.same_tree(src, dst) {
            return;
        }
        let (dst_root, _) = self.root_of(dst);
        let src_flat = self.flat_index(src.location());
        self.set(dst_root.location(), TypeNode::reference(src_flat));
    }

    /// `TYPE_OVERWRITE(src, dst, true)`: detach `dst` from its tree
    /// (electing a new root for any orphaned children), then install a
    /// fresh root value at `dst`.
    pub fn type_overwrite_new(&mut self, src: TypeNode, dst: NodeRef) {
        debug_assert!(src.is_root());
        self.overwrite(Some(src), None, dst);
    }

    /// `TYPE_OVERWRITE(src, dst, false)`: detach `dst` from its tree, then
    /// make `dst` a reference to `src`. No-op if already the same tree.
    pub fn type_overwrite_ref(&mut self, src: NodeRef, dst: NodeRef) {
        if self.same_tree(src, dst) {
            return;
        }
        self.overwrite(None, Some(src), dst);
    }

    fn overwrite(&mut self, src_new: Option<TypeNode>, src_ref: Option<NodeRef>, dst: NodeRef) {
        let dst_loc = dst.location();
        let dst_value = self.get(dst_loc);
        let dst_flat = self.flat_index(dst_loc);

        let new_dst_value = match (src_new, src_ref) {
            (Some(v), None) => v,
            (None, Some(r)) => TypeNode::reference(self.flat_index(r.location())),
            _ => unreachable!("overwrite takes exactly one of src_new/src_ref"),
        };

        match dst_value.tag() {
            NodeTag::RootPositive | NodeTag::RootNegative => {
                // Elect the first child found as the new root of the
                // orphaned subtree; repoint the rest at it.
                let mut new_root_flat: Option<u32> = None;
                for i in 0..self.locals.len() as u32 {
                    self.repoint_child(Area::Local, i, dst_flat, dst_value, &mut new_root_flat);
                }
                for i in 0..self.stack.len() as u32 {
                    self.repoint_child(Area::Stack, i, dst_flat, dst_value, &mut new_root_flat);
                }
                self.set(dst_loc, new_dst_value);
            }
            NodeTag::Ref => {
                let dst_parent = dst_value;
                for i in 0..self.locals.len() as u32 {
                    self.redirect_to_parent(Area::Local, i, dst_flat, dst_parent);
                }
                for i in 0..self.stack.len() as u32 {
                    self.redirect_to_parent(Area::Stack, i, dst_flat, dst_parent);
                }
                self.set(dst_loc, new_dst_value);
            }
            NodeTag::Null => panic!("overwrite of an uninitialized (NULL_TAG) node"),
        }
    }

    fn repoint_child(
        &mut self,
        area: Area,
        index: u32,
        dst_flat: u32,
        old_dst_value: TypeNode,
        new_root_flat: &mut Option<u32>,
    ) {
        let loc = Location { area, index };
        let value = self.get(loc);
        if value.tag() == NodeTag::Ref && value.ref_target() == Some(dst_flat) {
            match *new_root_flat {
                None => {
                    *new_root_flat = Some(self.flat_index(loc));
                    self.set(loc, old_dst_value);
                }
                Some(root_flat) => {
                    self.set(loc, TypeNode::reference(root_flat));
                }
            }
        }
    }

    fn redirect_to_parent(&mut self, area: Area, index: u32, dst_flat: u32, dst_parent: TypeNode) {
        let loc = Location { area, index };
        let value = self.get(loc);
        if value.tag() == NodeTag::Ref && value.ref_target() == Some(dst_flat) {
            self.set(loc, dst_parent);
        }
    }

    /// `TYPE_SWAP(a, b)`: swap the contents at `a` and `b`, redirecting
    /// every node that pointed at one to point at the other. No-op if
    /// `a` and `b` are already the same tree.
    pub fn type_swap(&mut self, a: NodeRef, b: NodeRef) {
        if self.same_tree(a, b) {
            return;
        }
        let a_flat = self.flat_index(a.location());
        let b_flat = self.flat_index(b.location());

        for i in 0..self.locals.len() as u32 {
            self.swap_redirect(Area::Local, i, a_flat, b_flat);
        }
        for i in 0..self.stack.len() as u32 {
            self.swap_redirect(Area::Stack, i, a_flat, b_flat);
        }

        // XOR-swap the two node words directly, mirroring the reference
        // design's in-place word swap.
        let a_loc = a.location();
        let b_loc = b.location();
        let mut av = self.get(a_loc).raw();
        let mut bv = self.get(b_loc).raw();
        av ^= bv;
        bv ^= av;
        av ^= bv;
        self.set(a_loc, TypeNode::from_raw(av));
        self.set(b_loc, TypeNode::from_raw(bv));
    }

    fn swap_redirect(&mut self, area: Area, index: u32, a_flat: u32, b_flat: u32) {
        let loc = Location { area, index };
        let value = self.get(loc);
        if value.tag() != NodeTag::Ref {
            return;
        }
        match value.ref_target() {
            Some(t) if t == a_flat => self.set(loc, TypeNode::reference(b_flat)),
            Some(t) if t == b_flat => self.set(loc, TypeNode::reference(a_flat)),
            _ => {}
        }
    }

    /// `compatible(c1, c2)`: `true` iff every equi-indexed node pair shares
    /// shape (same root coordinates) and every root's type in `c2` is
    /// equal to or more specific than the corresponding root in `self`
    /// (`c1`). Widening is permitted only from `self` to `other`.
    pub fn compatible(&self, other: &TypeContext) -> bool {
        if self.locals.len() != other.locals.len() || self.stack.len() != other.stack.len() {
            return false;
        }
        let n = self.locals.len() + self.stack.len();
        for flat in 0..n as u32 {
            let loc = self.locate(flat);
            let a_ref = match loc.area {
                Area::Local => NodeRef::local(loc.index),
                Area::Stack => NodeRef::stack(loc.index),
            };
            let (a_root_ref, a_root) = self.root_of(a_ref);
            let (b_root_ref, b_root) = other.root_of(a_ref);
            if a_root_ref.location() != b_root_ref.location() {
                return false;
            }
            if !Self::root_compatible(a_root, b_root) {
                return false;
            }
        }
        true
    }

    fn root_compatible(c1_root: TypeNode, c2_root: TypeNode) -> bool {
        match (c1_root.positive_type(), c1_root.tag()) {
            (None, NodeTag::RootPositive) => {
                // c1 is unknown: any positive root in c2 (known or still
                // unknown) is a valid widening. The reverse direction
                // (c2 unknown when c1 is known) is rejected by the next arm.
                matches!(c2_root.tag(), NodeTag::RootPositive)
            }
            (Some(t1), NodeTag::RootPositive) => {
                matches!(c2_root.tag(), NodeTag::RootPositive) && c2_root.positive_type() == Some(t1)
            }
            (None, NodeTag::RootNegative) => {
                let m1 = c1_root.negative_mask().unwrap();
                match c2_root.tag() {
                    NodeTag::RootNegative => {
                        let m2 = c2_root.negative_mask().unwrap();
                        // c2 may have ruled out the same set or more.
                        m2.contains(m1)
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// `diff(c1, c2)`: the number of equi-indexed root positions whose
    /// types differ, or `usize::MAX` if not `compatible`.
    pub fn diff(&self, other: &TypeContext) -> usize {
        if !self.compatible(other) {
            return usize::MAX;
        }
        let n = self.locals.len() + self.stack.len();
        let mut count = 0;
        for flat in 0..n as u32 {
            let loc = self.locate(flat);
            let node_ref = match loc.area {
                Area::Local => NodeRef::local(loc.index),
                Area::Stack => NodeRef::stack(loc.index),
            };
            let (_, a_root) = self.root_of(node_ref);
            let (_, b_root) = other.root_of(node_ref);
            if a_root != b_root {
                count += 1;
            }
        }
        count
    }
}

/// Construct a fresh positive-root value for a known concrete type.
pub fn known(ty: ConcreteType) -> TypeNode {
    TypeNode::root_pos(ty)
}

/// Construct a fresh negative-root value ruling out a single type.
pub fn ruled_out(ty: NegativeType) -> TypeNode {
    TypeNode::root_neg(ty)
}
