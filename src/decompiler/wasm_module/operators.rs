//! Classifies `wasmparser` operators into decompiler instructions.
//!
//! Control operators are passed back as markers so the reader can fold the
//! flat stream into nested bodies.

use crate::decompiler::datatypes::MemoryType;
use crate::decompiler::decompiler_errors::DecompilerError;
use crate::decompiler::wasm_module::instructions::{
    ConstValue, Instruction, MemoryAccess, NumericOp,
};
use crate::return_unsupported_error;
use wasmparser::{BlockType, MemArg, Operator};

pub(crate) enum FlatOperator {
    Instruction(Instruction),
    Block(BlockType),
    Loop(BlockType),
    If(BlockType),
    Else,
    End,
}

macro_rules! numeric {
    ($kind:ident, $name:literal, $token:literal) => {
        Instruction::$kind(NumericOp {
            name: $name,
            token: $token,
        })
    };
}

macro_rules! convert {
    ($name:literal) => {
        Instruction::Convert(NumericOp {
            name: $name,
            token: $name,
        })
    };
}

fn load(name: &'static str, memarg: &MemArg, memory_type: MemoryType) -> Instruction {
    Instruction::Load(memory_access(name, memarg, memory_type))
}

fn store(name: &'static str, memarg: &MemArg, memory_type: MemoryType) -> Instruction {
    Instruction::Store(memory_access(name, memarg, memory_type))
}

fn memory_access(name: &'static str, memarg: &MemArg, memory_type: MemoryType) -> MemoryAccess {
    MemoryAccess {
        name,
        offset: memarg.offset,
        align: 1u64 << memarg.align,
        memory_type,
    }
}

fn other(name: &'static str, nargs: u32, nreturns: u32) -> Instruction {
    Instruction::Other {
        name,
        nargs,
        nreturns,
    }
}

/// The variant name of an operator, for error messages.
pub(crate) fn operator_name(operator: &Operator) -> String {
    let debug = format!("{operator:?}");
    debug
        .split(|c: char| !c.is_ascii_alphanumeric())
        .next()
        .unwrap_or_default()
        .to_owned()
}

pub(crate) fn classify_operator(operator: &Operator) -> Result<FlatOperator, DecompilerError> {
    use MemoryType::*;

    let instruction = match operator {
        // Control
        Operator::Block { blockty } => return Ok(FlatOperator::Block(*blockty)),
        Operator::Loop { blockty } => return Ok(FlatOperator::Loop(*blockty)),
        Operator::If { blockty } => return Ok(FlatOperator::If(*blockty)),
        Operator::Else => return Ok(FlatOperator::Else),
        Operator::End => return Ok(FlatOperator::End),

        Operator::Nop => Instruction::Nop,
        Operator::Unreachable => Instruction::Unreachable,
        Operator::Br { relative_depth } => Instruction::Br(*relative_depth),
        Operator::BrIf { relative_depth } => Instruction::BrIf(*relative_depth),
        Operator::BrTable { targets } => {
            let default = targets.default();
            let targets = targets.targets().collect::<Result<Vec<u32>, _>>()?;
            Instruction::BrTable { targets, default }
        }
        Operator::Return => Instruction::Return,
        Operator::Call { function_index } => Instruction::Call(*function_index),
        Operator::CallIndirect {
            type_index,
            table_index,
        } => Instruction::CallIndirect {
            type_index: *type_index,
            table_index: *table_index,
        },
        Operator::Drop => Instruction::Drop,
        Operator::Select | Operator::TypedSelect { .. } => other("select", 3, 1),

        // Variables
        Operator::LocalGet { local_index } => Instruction::LocalGet(*local_index),
        Operator::LocalSet { local_index } => Instruction::LocalSet(*local_index),
        Operator::LocalTee { local_index } => Instruction::LocalTee(*local_index),
        Operator::GlobalGet { global_index } => Instruction::GlobalGet(*global_index),
        Operator::GlobalSet { global_index } => Instruction::GlobalSet(*global_index),

        // Constants
        Operator::I32Const { value } => Instruction::Const(ConstValue::I32(*value)),
        Operator::I64Const { value } => Instruction::Const(ConstValue::I64(*value)),
        Operator::F32Const { value } => Instruction::Const(ConstValue::F32(value.bits())),
        Operator::F64Const { value } => Instruction::Const(ConstValue::F64(value.bits())),
        Operator::V128Const { .. } => Instruction::Const(ConstValue::V128),

        // Memory
        Operator::I32Load { memarg } => load("i32.load", memarg, Int),
        Operator::I64Load { memarg } => load("i64.load", memarg, Long),
        Operator::F32Load { memarg } => load("f32.load", memarg, Float),
        Operator::F64Load { memarg } => load("f64.load", memarg, Double),
        Operator::I32Load8S { memarg } => load("i32.load8_s", memarg, Byte),
        Operator::I32Load8U { memarg } => load("i32.load8_u", memarg, UByte),
        Operator::I32Load16S { memarg } => load("i32.load16_s", memarg, Short),
        Operator::I32Load16U { memarg } => load("i32.load16_u", memarg, UShort),
        Operator::I64Load8S { memarg } => load("i64.load8_s", memarg, Byte),
        Operator::I64Load8U { memarg } => load("i64.load8_u", memarg, UByte),
        Operator::I64Load16S { memarg } => load("i64.load16_s", memarg, Short),
        Operator::I64Load16U { memarg } => load("i64.load16_u", memarg, UShort),
        Operator::I64Load32S { memarg } => load("i64.load32_s", memarg, Int),
        Operator::I64Load32U { memarg } => load("i64.load32_u", memarg, UInt),
        Operator::V128Load { memarg } => load("v128.load", memarg, Simd),
        Operator::I32Store { memarg } => store("i32.store", memarg, Int),
        Operator::I64Store { memarg } => store("i64.store", memarg, Long),
        Operator::F32Store { memarg } => store("f32.store", memarg, Float),
        Operator::F64Store { memarg } => store("f64.store", memarg, Double),
        Operator::I32Store8 { memarg } => store("i32.store8", memarg, Byte),
        Operator::I32Store16 { memarg } => store("i32.store16", memarg, Short),
        Operator::I64Store8 { memarg } => store("i64.store8", memarg, Byte),
        Operator::I64Store16 { memarg } => store("i64.store16", memarg, Short),
        Operator::I64Store32 { memarg } => store("i64.store32", memarg, Int),
        Operator::V128Store { memarg } => store("v128.store", memarg, Simd),
        Operator::MemorySize { .. } => other("memory_size", 0, 1),
        Operator::MemoryGrow { .. } => other("memory_grow", 1, 1),
        Operator::MemoryCopy { .. } => other("memory_copy", 3, 0),
        Operator::MemoryFill { .. } => other("memory_fill", 3, 0),
        Operator::MemoryInit { .. } => other("memory_init", 3, 0),
        Operator::DataDrop { .. } => other("data_drop", 0, 0),

        // i32 numeric
        Operator::I32Eqz => numeric!(Unary, "i32.eqz", "!"),
        Operator::I32Eq => numeric!(Compare, "i32.eq", "=="),
        Operator::I32Ne => numeric!(Compare, "i32.ne", "!="),
        Operator::I32LtS => numeric!(Compare, "i32.lt_s", "<"),
        Operator::I32LtU => numeric!(Compare, "i32.lt_u", "<"),
        Operator::I32GtS => numeric!(Compare, "i32.gt_s", ">"),
        Operator::I32GtU => numeric!(Compare, "i32.gt_u", ">"),
        Operator::I32LeS => numeric!(Compare, "i32.le_s", "<="),
        Operator::I32LeU => numeric!(Compare, "i32.le_u", "<="),
        Operator::I32GeS => numeric!(Compare, "i32.ge_s", ">="),
        Operator::I32GeU => numeric!(Compare, "i32.ge_u", ">="),
        Operator::I32Clz => numeric!(Unary, "i32.clz", "clz"),
        Operator::I32Ctz => numeric!(Unary, "i32.ctz", "ctz"),
        Operator::I32Popcnt => numeric!(Unary, "i32.popcnt", "popcnt"),
        Operator::I32Add => numeric!(Binary, "i32.add", "+"),
        Operator::I32Sub => numeric!(Binary, "i32.sub", "-"),
        Operator::I32Mul => numeric!(Binary, "i32.mul", "*"),
        Operator::I32DivS => numeric!(Binary, "i32.div_s", "/"),
        Operator::I32DivU => numeric!(Binary, "i32.div_u", "/"),
        Operator::I32RemS => numeric!(Binary, "i32.rem_s", "%"),
        Operator::I32RemU => numeric!(Binary, "i32.rem_u", "%"),
        Operator::I32And => numeric!(Binary, "i32.and", "&"),
        Operator::I32Or => numeric!(Binary, "i32.or", "|"),
        Operator::I32Xor => numeric!(Binary, "i32.xor", "^"),
        Operator::I32Shl => numeric!(Binary, "i32.shl", "<<"),
        Operator::I32ShrS => numeric!(Binary, "i32.shr_s", ">>"),
        Operator::I32ShrU => numeric!(Binary, "i32.shr_u", ">>"),
        Operator::I32Rotl => numeric!(Binary, "i32.rotl", "i32.rotl"),
        Operator::I32Rotr => numeric!(Binary, "i32.rotr", "i32.rotr"),

        // i64 numeric
        Operator::I64Eqz => numeric!(Unary, "i64.eqz", "!"),
        Operator::I64Eq => numeric!(Compare, "i64.eq", "=="),
        Operator::I64Ne => numeric!(Compare, "i64.ne", "!="),
        Operator::I64LtS => numeric!(Compare, "i64.lt_s", "<"),
        Operator::I64LtU => numeric!(Compare, "i64.lt_u", "<"),
        Operator::I64GtS => numeric!(Compare, "i64.gt_s", ">"),
        Operator::I64GtU => numeric!(Compare, "i64.gt_u", ">"),
        Operator::I64LeS => numeric!(Compare, "i64.le_s", "<="),
        Operator::I64LeU => numeric!(Compare, "i64.le_u", "<="),
        Operator::I64GeS => numeric!(Compare, "i64.ge_s", ">="),
        Operator::I64GeU => numeric!(Compare, "i64.ge_u", ">="),
        Operator::I64Clz => numeric!(Unary, "i64.clz", "clz"),
        Operator::I64Ctz => numeric!(Unary, "i64.ctz", "ctz"),
        Operator::I64Popcnt => numeric!(Unary, "i64.popcnt", "popcnt"),
        Operator::I64Add => numeric!(Binary, "i64.add", "+"),
        Operator::I64Sub => numeric!(Binary, "i64.sub", "-"),
        Operator::I64Mul => numeric!(Binary, "i64.mul", "*"),
        Operator::I64DivS => numeric!(Binary, "i64.div_s", "/"),
        Operator::I64DivU => numeric!(Binary, "i64.div_u", "/"),
        Operator::I64RemS => numeric!(Binary, "i64.rem_s", "%"),
        Operator::I64RemU => numeric!(Binary, "i64.rem_u", "%"),
        Operator::I64And => numeric!(Binary, "i64.and", "&"),
        Operator::I64Or => numeric!(Binary, "i64.or", "|"),
        Operator::I64Xor => numeric!(Binary, "i64.xor", "^"),
        Operator::I64Shl => numeric!(Binary, "i64.shl", "<<"),
        Operator::I64ShrS => numeric!(Binary, "i64.shr_s", ">>"),
        Operator::I64ShrU => numeric!(Binary, "i64.shr_u", ">>"),
        Operator::I64Rotl => numeric!(Binary, "i64.rotl", "i64.rotl"),
        Operator::I64Rotr => numeric!(Binary, "i64.rotr", "i64.rotr"),

        // f32 numeric
        Operator::F32Eq => numeric!(Compare, "f32.eq", "=="),
        Operator::F32Ne => numeric!(Compare, "f32.ne", "!="),
        Operator::F32Lt => numeric!(Compare, "f32.lt", "<"),
        Operator::F32Gt => numeric!(Compare, "f32.gt", ">"),
        Operator::F32Le => numeric!(Compare, "f32.le", "<="),
        Operator::F32Ge => numeric!(Compare, "f32.ge", ">="),
        Operator::F32Abs => numeric!(Unary, "f32.abs", "abs"),
        Operator::F32Neg => numeric!(Unary, "f32.neg", "-"),
        Operator::F32Ceil => numeric!(Unary, "f32.ceil", "ceil"),
        Operator::F32Floor => numeric!(Unary, "f32.floor", "floor"),
        Operator::F32Trunc => numeric!(Unary, "f32.trunc", "trunc"),
        Operator::F32Nearest => numeric!(Unary, "f32.nearest", "nearest"),
        Operator::F32Sqrt => numeric!(Unary, "f32.sqrt", "sqrt"),
        Operator::F32Add => numeric!(Binary, "f32.add", "+"),
        Operator::F32Sub => numeric!(Binary, "f32.sub", "-"),
        Operator::F32Mul => numeric!(Binary, "f32.mul", "*"),
        Operator::F32Div => numeric!(Binary, "f32.div", "/"),
        Operator::F32Min => numeric!(Binary, "f32.min", "f32.min"),
        Operator::F32Max => numeric!(Binary, "f32.max", "f32.max"),
        Operator::F32Copysign => numeric!(Binary, "f32.copysign", "f32.copysign"),

        // f64 numeric
        Operator::F64Eq => numeric!(Compare, "f64.eq", "=="),
        Operator::F64Ne => numeric!(Compare, "f64.ne", "!="),
        Operator::F64Lt => numeric!(Compare, "f64.lt", "<"),
        Operator::F64Gt => numeric!(Compare, "f64.gt", ">"),
        Operator::F64Le => numeric!(Compare, "f64.le", "<="),
        Operator::F64Ge => numeric!(Compare, "f64.ge", ">="),
        Operator::F64Abs => numeric!(Unary, "f64.abs", "abs"),
        Operator::F64Neg => numeric!(Unary, "f64.neg", "-"),
        Operator::F64Ceil => numeric!(Unary, "f64.ceil", "ceil"),
        Operator::F64Floor => numeric!(Unary, "f64.floor", "floor"),
        Operator::F64Trunc => numeric!(Unary, "f64.trunc", "trunc"),
        Operator::F64Nearest => numeric!(Unary, "f64.nearest", "nearest"),
        Operator::F64Sqrt => numeric!(Unary, "f64.sqrt", "sqrt"),
        Operator::F64Add => numeric!(Binary, "f64.add", "+"),
        Operator::F64Sub => numeric!(Binary, "f64.sub", "-"),
        Operator::F64Mul => numeric!(Binary, "f64.mul", "*"),
        Operator::F64Div => numeric!(Binary, "f64.div", "/"),
        Operator::F64Min => numeric!(Binary, "f64.min", "f64.min"),
        Operator::F64Max => numeric!(Binary, "f64.max", "f64.max"),
        Operator::F64Copysign => numeric!(Binary, "f64.copysign", "f64.copysign"),

        // Conversions
        Operator::I32WrapI64 => convert!("i32.wrap_i64"),
        Operator::I32TruncF32S => convert!("i32.trunc_f32_s"),
        Operator::I32TruncF32U => convert!("i32.trunc_f32_u"),
        Operator::I32TruncF64S => convert!("i32.trunc_f64_s"),
        Operator::I32TruncF64U => convert!("i32.trunc_f64_u"),
        Operator::I64ExtendI32S => convert!("i64.extend_i32_s"),
        Operator::I64ExtendI32U => convert!("i64.extend_i32_u"),
        Operator::I64TruncF32S => convert!("i64.trunc_f32_s"),
        Operator::I64TruncF32U => convert!("i64.trunc_f32_u"),
        Operator::I64TruncF64S => convert!("i64.trunc_f64_s"),
        Operator::I64TruncF64U => convert!("i64.trunc_f64_u"),
        Operator::F32ConvertI32S => convert!("f32.convert_i32_s"),
        Operator::F32ConvertI32U => convert!("f32.convert_i32_u"),
        Operator::F32ConvertI64S => convert!("f32.convert_i64_s"),
        Operator::F32ConvertI64U => convert!("f32.convert_i64_u"),
        Operator::F32DemoteF64 => convert!("f32.demote_f64"),
        Operator::F64ConvertI32S => convert!("f64.convert_i32_s"),
        Operator::F64ConvertI32U => convert!("f64.convert_i32_u"),
        Operator::F64ConvertI64S => convert!("f64.convert_i64_s"),
        Operator::F64ConvertI64U => convert!("f64.convert_i64_u"),
        Operator::F64PromoteF32 => convert!("f64.promote_f32"),
        Operator::I32ReinterpretF32 => convert!("i32.reinterpret_f32"),
        Operator::I64ReinterpretF64 => convert!("i64.reinterpret_f64"),
        Operator::F32ReinterpretI32 => convert!("f32.reinterpret_i32"),
        Operator::F64ReinterpretI64 => convert!("f64.reinterpret_i64"),

        // Sign extension
        Operator::I32Extend8S => convert!("i32.extend8_s"),
        Operator::I32Extend16S => convert!("i32.extend16_s"),
        Operator::I64Extend8S => convert!("i64.extend8_s"),
        Operator::I64Extend16S => convert!("i64.extend16_s"),
        Operator::I64Extend32S => convert!("i64.extend32_s"),

        // Non-trapping float to int
        Operator::I32TruncSatF32S => convert!("i32.trunc_sat_f32_s"),
        Operator::I32TruncSatF32U => convert!("i32.trunc_sat_f32_u"),
        Operator::I32TruncSatF64S => convert!("i32.trunc_sat_f64_s"),
        Operator::I32TruncSatF64U => convert!("i32.trunc_sat_f64_u"),
        Operator::I64TruncSatF32S => convert!("i64.trunc_sat_f32_s"),
        Operator::I64TruncSatF32U => convert!("i64.trunc_sat_f32_u"),
        Operator::I64TruncSatF64S => convert!("i64.trunc_sat_f64_s"),
        Operator::I64TruncSatF64U => convert!("i64.trunc_sat_f64_u"),

        unsupported => return_unsupported_error!(operator_name(unsupported)),
    };

    Ok(FlatOperator::Instruction(instruction))
}
