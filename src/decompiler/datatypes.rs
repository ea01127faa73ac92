// ============================================================
// Decompiler Type Names
// ============================================================
//
// Wasm value types and memory access types, named the way they
// appear in decompiled output.
//
// ============================================================

use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
    V128,
    FuncRef,
    ExternRef,
}

impl ValueType {
    pub fn decompiled_name(self) -> &'static str {
        match self {
            ValueType::I32 => "int",
            ValueType::I64 => "long",
            ValueType::F32 => "float",
            ValueType::F64 => "double",
            ValueType::V128 => "simd",
            ValueType::FuncRef => "funcref",
            ValueType::ExternRef => "externref",
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.decompiled_name())
    }
}

/// The type of the bytes a load or store touches.
///
/// Narrow integer accesses carry their signedness so `i32.load8_u`
/// and `i32.load8_s` read differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MemoryType {
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    Float,
    Double,
    Simd,
}

impl MemoryType {
    pub fn decompiled_name(self) -> &'static str {
        match self {
            MemoryType::Byte => "byte",
            MemoryType::UByte => "ubyte",
            MemoryType::Short => "short",
            MemoryType::UShort => "ushort",
            MemoryType::Int => "int",
            MemoryType::UInt => "uint",
            MemoryType::Long => "long",
            MemoryType::Float => "float",
            MemoryType::Double => "double",
            MemoryType::Simd => "simd",
        }
    }

    pub fn size_in_bytes(self) -> u64 {
        match self {
            MemoryType::Byte | MemoryType::UByte => 1,
            MemoryType::Short | MemoryType::UShort => 2,
            MemoryType::Int | MemoryType::UInt | MemoryType::Float => 4,
            MemoryType::Long | MemoryType::Double => 8,
            MemoryType::Simd => 16,
        }
    }
}

impl Display for MemoryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.decompiled_name())
    }
}
