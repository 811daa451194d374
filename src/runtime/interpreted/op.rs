//! Operation vocabulary of the tensor-graph evaluator
//!
//! The enums model the evaluator's whole vocabulary, including operations this
//! backend does not implement, so a request for one of them is representable
//! and can be rejected deterministically by the dispatch table.

use crate::dtype::{DType, Scalar};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

macro_rules! op_category {
    (
        $(#[$meta:meta])*
        $name:ident, $category:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every operation of this category
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Category prefix used in textual identifiers
            pub const CATEGORY: &'static str = $category;

            /// Operation name without the category prefix
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            /// Look up an operation by its unprefixed name
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}", Self::CATEGORY, self.name())
            }
        }
    };
}

op_category! {
    /// Buffer construction and access
    BufferOp, "BufferOps" {
        /// Read an input buffer
        Load => "LOAD",
        /// Scalar literal of a given dtype
        Const => "CONST",
        /// Write an output buffer
        Store => "STORE",
    }
}

op_category! {
    /// Elementwise unary operations
    UnaryOp, "UnaryOps" {
        /// Identity
        Noop => "NOOP",
        /// Base-2 exponent
        Exp2 => "EXP2",
        /// Base-2 logarithm
        Log2 => "LOG2",
        /// Value-converting cast or bit reinterpretation
        Cast => "CAST",
        /// Sine
        Sin => "SIN",
        /// Square root
        Sqrt => "SQRT",
        /// Reciprocal
        Recip => "RECIP",
        /// Numeric negation (logical not for bools)
        Neg => "NEG",
    }
}

op_category! {
    /// Elementwise binary operations
    BinaryOp, "BinaryOps" {
        /// Addition
        Add => "ADD",
        /// Subtraction
        Sub => "SUB",
        /// Multiplication
        Mul => "MUL",
        /// Division
        Div => "DIV",
        /// Maximum
        Max => "MAX",
        /// Remainder
        Mod => "MOD",
        /// Less-than comparison
        CmpLt => "CMPLT",
        /// Bitwise xor
        Xor => "XOR",
    }
}

op_category! {
    /// Three-operand operations
    TernaryOp, "TernaryOps" {
        /// Multiply two operands, then sum over the axes collapsed in the target shape
        MulAcc => "MULACC",
        /// Elementwise select
        Where => "WHERE",
    }
}

op_category! {
    /// Reductions to a keepdims target shape
    ReduceOp, "ReduceOps" {
        /// Sum
        Sum => "SUM",
        /// Maximum
        Max => "MAX",
    }
}

op_category! {
    /// Shape and view operations
    MovementOp, "MovementOps" {
        /// Change shape without changing element order
        Reshape => "RESHAPE",
        /// Reorder axes
        Permute => "PERMUTE",
        /// Broadcast size-1 axes
        Expand => "EXPAND",
        /// Zero padding
        Pad => "PAD",
        /// Slice
        Shrink => "SHRINK",
        /// Step through axes
        Stride => "STRIDE",
        /// Explicit shape, strides, and offset view
        AsStrided => "AS_STRIDED",
    }
}

/// An abstract operation identifier
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    /// Buffer construction
    Buffer(BufferOp),
    /// Elementwise unary
    Unary(UnaryOp),
    /// Elementwise binary
    Binary(BinaryOp),
    /// Ternary
    Ternary(TernaryOp),
    /// Reduction
    Reduce(ReduceOp),
    /// Movement
    Movement(MovementOp),
}

impl Op {
    /// Number of array operands the operation takes
    pub fn arity(self) -> usize {
        match self {
            Op::Buffer(_) => 0,
            Op::Unary(_) | Op::Reduce(_) | Op::Movement(_) => 1,
            Op::Binary(_) | Op::Ternary(TernaryOp::MulAcc) => 2,
            Op::Ternary(TernaryOp::Where) => 3,
        }
    }

    /// Resolve an operation from its category prefix and name
    pub fn from_parts(category: &str, name: &str) -> Result<Self> {
        let op = match category {
            BufferOp::CATEGORY => BufferOp::from_name(name).map(Op::Buffer),
            UnaryOp::CATEGORY => UnaryOp::from_name(name).map(Op::Unary),
            BinaryOp::CATEGORY => BinaryOp::from_name(name).map(Op::Binary),
            TernaryOp::CATEGORY => TernaryOp::from_name(name).map(Op::Ternary),
            ReduceOp::CATEGORY => ReduceOp::from_name(name).map(Op::Reduce),
            MovementOp::CATEGORY => MovementOp::from_name(name).map(Op::Movement),
            _ => None,
        };
        op.ok_or_else(|| Error::unsupported_op(format!("{category}.{name}")))
    }

    /// Every operation in the vocabulary
    pub fn all() -> impl Iterator<Item = Op> {
        let buffer = BufferOp::ALL.iter().copied().map(Op::Buffer);
        let unary = UnaryOp::ALL.iter().copied().map(Op::Unary);
        let binary = BinaryOp::ALL.iter().copied().map(Op::Binary);
        let ternary = TernaryOp::ALL.iter().copied().map(Op::Ternary);
        let reduce = ReduceOp::ALL.iter().copied().map(Op::Reduce);
        let movement = MovementOp::ALL.iter().copied().map(Op::Movement);
        buffer
            .chain(unary)
            .chain(binary)
            .chain(ternary)
            .chain(reduce)
            .chain(movement)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Buffer(op) => fmt::Display::fmt(op, f),
            Op::Unary(op) => fmt::Display::fmt(op, f),
            Op::Binary(op) => fmt::Display::fmt(op, f),
            Op::Ternary(op) => fmt::Display::fmt(op, f),
            Op::Reduce(op) => fmt::Display::fmt(op, f),
            Op::Movement(op) => fmt::Display::fmt(op, f),
        }
    }
}

/// Parses `"BinaryOps.ADD"`-style identifiers
///
/// Anything not in the vocabulary is `Error::UnsupportedOp`.
impl FromStr for Op {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (category, name) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| Error::unsupported_op(s))?;
        Op::from_parts(category, name)
    }
}

macro_rules! impl_from_category {
    ($($t:ident => $variant:ident),+) => {
        $(impl From<$t> for Op {
            fn from(op: $t) -> Self {
                Op::$variant(op)
            }
        })+
    };
}

impl_from_category!(
    BufferOp => Buffer,
    UnaryOp => Unary,
    BinaryOp => Binary,
    TernaryOp => Ternary,
    ReduceOp => Reduce,
    MovementOp => Movement
);

/// Operation-specific argument payload
#[derive(Clone, Debug, PartialEq)]
pub enum OpArg {
    /// No payload
    None,
    /// Literal for `CONST`
    Const {
        /// Value before conversion
        value: Scalar,
        /// Result dtype
        dtype: DType,
    },
    /// Target for `CAST`
    Cast {
        /// Result dtype
        dtype: DType,
        /// Reinterpret bits instead of converting values
        bitcast: bool,
    },
    /// Target shape for reductions, `MULACC`, and `EXPAND`
    Shape(Vec<usize>),
    /// `(before, after)` per axis for `PAD`
    Padding(Vec<(usize, usize)>),
    /// View description for `AS_STRIDED`, strides and offset in elements
    Strided {
        /// View shape
        shape: Vec<usize>,
        /// Per-axis element strides
        strides: Vec<isize>,
        /// Element offset of the first element
        offset: usize,
    },
}

impl OpArg {
    /// Short payload kind for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            OpArg::None => "none",
            OpArg::Const { .. } => "const",
            OpArg::Cast { .. } => "cast",
            OpArg::Shape(_) => "shape",
            OpArg::Padding(_) => "padding",
            OpArg::Strided { .. } => "strided",
        }
    }
}
