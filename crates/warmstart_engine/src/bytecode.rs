//! Bytecode: the compiled representation that is cached across contexts.
//!
//! A [`Chunk`] holds no per-context state: natives and globals are referenced
//! by name and resolved when the chunk runs, so the same chunk can run in any
//! context of a compatible engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use warmstart_common::ContentHash;

use crate::value::Value;

/// A `Math` function known to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Builtin {
    /// `Math.sqrt(x)`
    Sqrt,
    /// `Math.abs(x)`
    Abs,
    /// `Math.floor(x)`
    Floor,
    /// `Math.ceil(x)`
    Ceil,
    /// `Math.pow(x, y)`
    Pow,
    /// `Math.max(...xs)`
    Max,
    /// `Math.min(...xs)`
    Min,
}

impl Builtin {
    /// Looks up a `Math` member by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sqrt" => Builtin::Sqrt,
            "abs" => Builtin::Abs,
            "floor" => Builtin::Floor,
            "ceil" => Builtin::Ceil,
            "pow" => Builtin::Pow,
            "max" => Builtin::Max,
            "min" => Builtin::Min,
            _ => return None,
        })
    }

    /// Required argument count, `None` for variadic builtins.
    pub fn arity(self) -> Option<usize> {
        match self {
            Builtin::Sqrt | Builtin::Abs | Builtin::Floor | Builtin::Ceil => Some(1),
            Builtin::Pow => Some(2),
            Builtin::Max | Builtin::Min => None,
        }
    }

    /// Applies the builtin to numeric arguments.
    pub fn apply(self, args: &[f64]) -> f64 {
        let first = args.first().copied().unwrap_or(f64::NAN);
        match self {
            Builtin::Sqrt => first.sqrt(),
            Builtin::Abs => first.abs(),
            Builtin::Floor => first.floor(),
            Builtin::Ceil => first.ceil(),
            Builtin::Pow => first.powf(args.get(1).copied().unwrap_or(f64::NAN)),
            Builtin::Max => args.iter().copied().fold(f64::NEG_INFINITY, |acc, x| {
                if acc.is_nan() || x.is_nan() {
                    f64::NAN
                } else {
                    acc.max(x)
                }
            }),
            Builtin::Min => args.iter().copied().fold(f64::INFINITY, |acc, x| {
                if acc.is_nan() || x.is_nan() {
                    f64::NAN
                } else {
                    acc.min(x)
                }
            }),
        }
    }
}

/// One stack-machine instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Push `constants[i]`.
    Const(u32),
    /// Push local slot `i`.
    LoadLocal(u32),
    /// Pop into local slot `i`.
    StoreLocal(u32),
    /// Push the context global named `names[i]`.
    LoadGlobal(u32),
    /// Numeric negation.
    Neg,
    /// Logical not.
    Not,
    /// Addition or string concatenation.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder.
    Rem,
    /// Strict equality.
    Eq,
    /// Strict inequality.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Call a `Math` builtin with `argc` stack arguments.
    CallBuiltin {
        /// Which builtin.
        builtin: Builtin,
        /// Number of arguments on the stack.
        argc: u8,
    },
    /// Call the native named `names[name]` with `argc` stack arguments.
    CallNative {
        /// Index into the chunk's name pool.
        name: u32,
        /// Number of arguments on the stack.
        argc: u8,
    },
    /// Pop into the completion value.
    SetResult,
    /// Stop and return the completion value.
    Return,
}

/// A compiled script body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Instructions, always ending in [`Op::Return`].
    pub ops: Vec<Op>,
    /// Constant pool.
    pub constants: Vec<Value>,
    /// Global and native names referenced by the instructions.
    pub names: Vec<String>,
    /// Number of local slots.
    pub local_count: u32,
    /// Identity tag of the source this chunk was compiled from.
    pub source_tag: ContentHash,
}

/// A structural defect found by [`Chunk::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyError {
    /// Index of the offending instruction.
    pub at: usize,
    /// What is wrong with it.
    pub reason: String,
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op {}: {}", self.at, self.reason)
    }
}

impl Chunk {
    /// Checks that every operand index is in range and that the chunk ends in
    /// `Return`. Run on every chunk rebuilt from a payload before it is used.
    ///
    /// Every local slot is introduced by exactly one `StoreLocal`, so a
    /// `local_count` above the number of stores is rejected before anything
    /// sizes the locals from it.
    pub fn verify(&self) -> Result<(), VerifyError> {
        let fail = |at: usize, reason: String| Err(VerifyError { at, reason });

        if self.ops.last() != Some(&Op::Return) {
            return fail(self.ops.len(), "missing trailing return".to_string());
        }
        for (at, op) in self.ops.iter().enumerate() {
            match *op {
                Op::Const(i) if i as usize >= self.constants.len() => {
                    return fail(at, format!("constant {i} out of range"));
                }
                Op::LoadLocal(i) | Op::StoreLocal(i) if i >= self.local_count => {
                    return fail(at, format!("local {i} out of range"));
                }
                Op::LoadGlobal(i) | Op::CallNative { name: i, .. }
                    if i as usize >= self.names.len() =>
                {
                    return fail(at, format!("name {i} out of range"));
                }
                Op::CallBuiltin { builtin, argc } => {
                    if let Some(arity) = builtin.arity() {
                        if arity != argc as usize {
                            return fail(at, format!("{builtin:?} takes {arity} arguments"));
                        }
                    }
                }
                _ => {}
            }
        }
        let stores = self
            .ops
            .iter()
            .filter(|op| matches!(op, Op::StoreLocal(_)))
            .count();
        if self.local_count as usize > stores {
            return fail(
                0,
                format!("{} locals declared but only {stores} stored", self.local_count),
            );
        }
        Ok(())
    }
}
