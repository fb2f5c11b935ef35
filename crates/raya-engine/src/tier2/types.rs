//! Tagged type nodes: the union-find forest element.
//!
//! A [`TypeNode`] is a single machine word whose two least-significant bits
//! are a tag. Unlike a pointer-tagged design (storing either a pointer to a
//! runtime type object or a pointer to a sibling node in the same word),
//! this implementation stores small integer payloads: a [`ConcreteType`]
//! discriminant for positive roots, a 4-bit mask of [`NegativeType`] flags
//! for negative roots, and a flat slot index for references. Every `REF`
//! is a small integer that stays valid across a `Vec`-level clone, so
//! [`crate::tier2::context::TypeContext::copy`] never needs pointer
//! rewriting.

const TAG_MASK: u64 = 0b11;
const TAG_ROOT_POS: u64 = 0b01;
const TAG_ROOT_NEG: u64 = 0b10;
const TAG_REF: u64 = 0b11;

/// The tag stored in a [`TypeNode`]'s two low bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTag {
    /// Unused slot (the entire word is zero).
    Null,
    /// Root of a tree with a known (or unknown) concrete type.
    RootPositive,
    /// Root of a tree with a set of ruled-out concrete types.
    RootNegative,
    /// Interior node: points at another node in the same context.
    Ref,
}

/// The small, closed set of "interesting" concrete types the propagator
/// distinguishes. Only four of these (the unboxing-ladder types) ever
/// appear in a negative bitmask, which is fixed at 4 bits wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConcreteType {
    /// Boxed 64-bit float (heap-allocated float object).
    BoxedFloat = 0,
    /// Unboxed 64-bit float (raw machine float, internal convention only).
    UnboxedFloat = 1,
    /// Boxed integer (general heap-allocated integer object).
    BoxedInt = 2,
    /// Small integer (fits the VM's compact inline-int representation).
    SmallInt = 3,
    /// Boolean.
    Bool = 4,
    /// `null`.
    Null = 5,
    /// String.
    Str = 6,
    /// Heap object (class instance).
    Object = 7,
    /// Array.
    Array = 8,
    /// Tuple.
    Tuple = 9,
}

impl ConcreteType {
    const COUNT: u8 = 10;

    fn from_index(idx: u8) -> Option<Self> {
        Some(match idx {
            0 => Self::BoxedFloat,
            1 => Self::UnboxedFloat,
            2 => Self::BoxedInt,
            3 => Self::SmallInt,
            4 => Self::Bool,
            5 => Self::Null,
            6 => Self::Str,
            7 => Self::Object,
            8 => Self::Array,
            9 => Self::Tuple,
            _ => return None,
        })
    }

    /// Whether this type participates in the 4-bit negative bitmask. Only
    /// the unboxing-ladder-relevant types do.
    pub fn negative_flag(self) -> Option<NegativeType> {
        match self {
            Self::BoxedFloat => Some(NegativeType::BOXED_FLOAT),
            Self::UnboxedFloat => Some(NegativeType::UNBOXED_FLOAT),
            Self::BoxedInt => Some(NegativeType::BOXED_INT),
            Self::SmallInt => Some(NegativeType::SMALL_INT),
            _ => None,
        }
    }

    /// True for any flavour of float (boxed or unboxed).
    pub fn is_float(self) -> bool {
        matches!(self, Self::BoxedFloat | Self::UnboxedFloat)
    }

    /// True for any flavour of int (boxed or small).
    pub fn is_int(self) -> bool {
        matches!(self, Self::BoxedInt | Self::SmallInt)
    }
}

/// Small macro-free bitflags: a single 4-bit mask doesn't need the
/// `bitflags` crate, matching `compiler::bytecode::opcode`'s manual
/// `from_u8`/`to_u8` tables elsewhere in this codebase.
macro_rules! bitflags_like {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $repr:ty {
            $(const $flag:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name($repr);

        impl $name {
            $(#[allow(non_upper_case_globals)] pub const $flag: $name = $name($value);)*

            /// The empty mask (no types ruled out yet).
            pub const EMPTY: $name = $name(0);

            /// Raw bit pattern.
            pub fn bits(self) -> $repr { self.0 }

            /// Reconstruct from a raw bit pattern.
            pub fn from_bits(bits: $repr) -> Self { $name(bits) }

            /// Union of two masks.
            pub fn union(self, other: Self) -> Self { $name(self.0 | other.0) }

            /// Whether `self` contains every bit set in `other`.
            pub fn contains(self, other: Self) -> bool { self.0 & other.0 == other.0 }

            /// Whether no bits are set.
            pub fn is_empty(self) -> bool { self.0 == 0 }
        }
    };
}

bitflags_like! {
    /// A 4-bit mask of ruled-out [`ConcreteType`]s, accumulated across
    /// failed type guards.
    pub struct NegativeType: u8 {
        const BOXED_FLOAT = 1 << 0;
        const UNBOXED_FLOAT = 1 << 1;
        const BOXED_INT = 1 << 2;
        const SMALL_INT = 1 << 3;
    }
}

/// A single node in the type forest: the value stored in
/// [`crate::tier2::context::TypeContext`]'s `locals`/`stack` arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeNode(u64);

impl TypeNode {
    /// The unused-slot sentinel (`NULL_TAG`, value 0).
    pub const NULL: TypeNode = TypeNode(0);

    /// A fresh positive root with unknown type (all-zero payload bits).
    pub fn root_pos_unknown() -> Self {
        TypeNode(TAG_ROOT_POS)
    }

    /// A fresh positive root with a known concrete type.
    pub fn root_pos(ty: ConcreteType) -> Self {
        TypeNode(((ty as u64) + 1) << 2 | TAG_ROOT_POS)
    }

    /// A fresh negative root carrying the given ruled-out-types mask.
    pub fn root_neg(mask: NegativeType) -> Self {
        TypeNode((mask.bits() as u64) << 2 | TAG_ROOT_NEG)
    }

    /// The "all bits set" negative root: every unboxing-ladder type ruled
    /// out at once, tagged `ROOT_NEG`.
    pub fn root_neg_full() -> Self {
        Self::root_neg(NegativeType::from_bits(0b1111))
    }

    /// A reference to another node, addressed by its flat slot index
    /// (locals first, then stack — see [`crate::tier2::context::TypeContext`]).
    pub fn reference(flat_index: u32) -> Self {
        TypeNode((flat_index as u64) << 2 | TAG_REF)
    }

    /// This node's tag.
    pub fn tag(self) -> NodeTag {
        if self.0 == 0 {
            return NodeTag::Null;
        }
        match self.0 & TAG_MASK {
            TAG_ROOT_POS => NodeTag::RootPositive,
            TAG_ROOT_NEG => NodeTag::RootNegative,
            TAG_REF => NodeTag::Ref,
            _ => unreachable!("tag bits are exhaustively 2 bits wide"),
        }
    }

    /// True if this node is a root (positive or negative).
    pub fn is_root(self) -> bool {
        matches!(self.tag(), NodeTag::RootPositive | NodeTag::RootNegative)
    }

    /// For a `Ref` node, the flat index it points at.
    pub fn ref_target(self) -> Option<u32> {
        match self.tag() {
            NodeTag::Ref => Some((self.0 >> 2) as u32),
            _ => None,
        }
    }

    /// For a positive root, the concrete type (`None` if still unknown).
    pub fn positive_type(self) -> Option<ConcreteType> {
        match self.tag() {
            NodeTag::RootPositive => {
                let idx = (self.0 >> 2) as u64;
                if idx == 0 {
                    None
                } else {
                    ConcreteType::from_index((idx - 1) as u8)
                }
            }
            _ => None,
        }
    }

    /// For a negative root, the ruled-out-types mask.
    pub fn negative_mask(self) -> Option<NegativeType> {
        match self.tag() {
            NodeTag::RootNegative => Some(NegativeType::from_bits((self.0 >> 2) as u8)),
            _ => None,
        }
    }

    /// Raw bit pattern (used only for the XOR-swap trick in
    /// [`crate::tier2::context::TypeContext::type_swap`]:
    /// `*src ^= *dst; *dst ^= *src; *src ^= *dst;`).
    pub(crate) fn raw(self) -> u64 {
        self.0
    }

    pub(crate) fn from_raw(raw: u64) -> Self {
        TypeNode(raw)
    }
}

impl ConcreteType {
    /// Total count of concrete types in the closed set (used by debug
    /// assertions, never by production control flow).
    pub fn count() -> u8 {
        Self::COUNT
    }
}
