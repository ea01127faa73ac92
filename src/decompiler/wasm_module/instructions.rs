//! Structured instruction tree for one function body or constant expression.
//!
//! The reader folds wasm's flat `block ... end` operator stream into nested
//! bodies so the tree builder can recurse over control flow directly.

use crate::decompiler::datatypes::{MemoryType, ValueType};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ConstValue {
    I32(i32),
    I64(i64),
    F32(u32),
    F64(u64),
    V128,
}

impl ConstValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            ConstValue::I32(_) => ValueType::I32,
            ConstValue::I64(_) => ValueType::I64,
            ConstValue::F32(_) => ValueType::F32,
            ConstValue::F64(_) => ValueType::F64,
            ConstValue::V128 => ValueType::V128,
        }
    }
}

/// A numeric operator: the full instruction name plus the token it renders as.
///
/// Conversions and operators without a symbol use the instruction name as
/// their token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumericOp {
    pub name: &'static str,
    pub token: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryAccess {
    pub name: &'static str,
    pub offset: u64,

    // In bytes, already decoded from the log2 encoding
    pub align: u64,
    pub memory_type: MemoryType,
}

impl MemoryAccess {
    pub fn is_naturally_aligned(&self) -> bool {
        self.align == self.memory_type.size_in_bytes()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSignature {
    pub params: Vec<ValueType>,
    pub results: Vec<ValueType>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Nop,
    Unreachable,
    Const(ConstValue),

    LocalGet(u32),
    LocalSet(u32),
    LocalTee(u32),
    GlobalGet(u32),
    GlobalSet(u32),

    Unary(NumericOp),
    Binary(NumericOp),
    Compare(NumericOp),
    Convert(NumericOp),

    Load(MemoryAccess),
    Store(MemoryAccess),

    Block {
        signature: BlockSignature,
        body: Vec<Instruction>,
    },
    Loop {
        signature: BlockSignature,
        body: Vec<Instruction>,
    },
    If {
        signature: BlockSignature,
        then_body: Vec<Instruction>,
        else_body: Option<Vec<Instruction>>,
    },

    Br(u32),
    BrIf(u32),
    BrTable {
        targets: Vec<u32>,
        default: u32,
    },
    Return,
    Drop,

    Call(u32),
    CallIndirect {
        type_index: u32,
        table_index: u32,
    },

    /// Anything rendered as a plain `name(args)` call: select, memory
    /// management and bulk memory operators.
    Other {
        name: &'static str,
        nargs: u32,
        nreturns: u32,
    },
}
