//! Tests for reading wasm binaries into the module model.

use super::read_module;
use crate::decompiler::datatypes::{MemoryType as AccessType, ValueType};
use crate::decompiler::decompiler_errors::ErrorType;
use crate::decompiler::wasm_module::instructions::{
    BlockSignature, ConstValue, Instruction as Decoded, MemoryAccess, NumericOp,
};
use crate::decompiler::wasm_module::module_model::{EntityKind, ImportInfo};
use wasm_encoder::{
    BlockType, CodeSection, ConstExpr, DataSection, EntityType, ExportKind, ExportSection,
    Function, FunctionSection, GlobalSection, GlobalType, ImportSection, IndirectNameMap,
    Instruction, MemArg, MemorySection, MemoryType, Module, NameMap, NameSection, TypeSection,
    ValType,
};

/// One import, one defined function with a local, memory, a global,
/// an export, a data segment and a name section.
fn sample_module() -> Vec<u8> {
    let mut module = Module::new();

    let mut types = TypeSection::new();
    types.ty().function(vec![ValType::I32, ValType::I32], vec![ValType::I32]);
    types.ty().function(vec![ValType::I32], vec![]);
    module.section(&types);

    let mut imports = ImportSection::new();
    imports.import("env", "log", EntityType::Function(1));
    module.section(&imports);

    let mut functions = FunctionSection::new();
    functions.function(0);
    module.section(&functions);

    let mut memories = MemorySection::new();
    memories.memory(MemoryType {
        minimum: 1,
        maximum: Some(2),
        memory64: false,
        shared: false,
        page_size_log2: None,
    });
    module.section(&memories);

    let mut globals = GlobalSection::new();
    globals.global(
        GlobalType {
            val_type: ValType::I32,
            mutable: true,
            shared: false,
        },
        &ConstExpr::i32_const(1024),
    );
    module.section(&globals);

    let mut exports = ExportSection::new();
    exports.export("add", ExportKind::Func, 1);
    exports.export("memory", ExportKind::Memory, 0);
    module.section(&exports);

    let mut code = CodeSection::new();
    let mut add = Function::new(vec![(1, ValType::I32)]);
    add.instruction(&Instruction::LocalGet(0));
    add.instruction(&Instruction::LocalGet(1));
    add.instruction(&Instruction::I32Add);
    add.instruction(&Instruction::LocalSet(2));
    add.instruction(&Instruction::Block(BlockType::Empty));
    add.instruction(&Instruction::LocalGet(2));
    add.instruction(&Instruction::Call(0));
    add.instruction(&Instruction::End);
    add.instruction(&Instruction::LocalGet(2));
    add.instruction(&Instruction::I32Load(MemArg {
        offset: 8,
        align: 2,
        memory_index: 0,
    }));
    add.instruction(&Instruction::End);
    code.function(&add);
    module.section(&code);

    let mut data = DataSection::new();
    data.active(0, &ConstExpr::i32_const(16), b"hi\n".to_vec());
    module.section(&data);

    let mut names = NameSection::new();
    let mut function_names = NameMap::new();
    function_names.append(1, "add");
    names.functions(&function_names);
    let mut add_locals = NameMap::new();
    add_locals.append(0, "x");
    add_locals.append(1, "y");
    let mut local_names = IndirectNameMap::new();
    local_names.append(1, &add_locals);
    names.locals(&local_names);
    module.section(&names);

    module.finish()
}

#[test]
fn imports_come_first_in_the_function_index_space() {
    let module = read_module(&sample_module()).expect("module should read");

    assert_eq!(module.functions.len(), 2);
    assert_eq!(
        module.functions[0].import,
        Some(ImportInfo {
            module: String::from("env"),
            field: String::from("log"),
        })
    );
    assert_eq!(module.functions[0].signature.params, vec![ValueType::I32]);
    assert!(module.functions[1].import.is_none());
    assert_eq!(module.functions[1].locals, vec![ValueType::I32]);
}

#[test]
fn bodies_fold_into_nested_blocks() {
    let module = read_module(&sample_module()).expect("module should read");

    assert_eq!(
        module.functions[1].body,
        vec![
            Decoded::LocalGet(0),
            Decoded::LocalGet(1),
            Decoded::Binary(NumericOp {
                name: "i32.add",
                token: "+",
            }),
            Decoded::LocalSet(2),
            Decoded::Block {
                signature: BlockSignature::default(),
                body: vec![Decoded::LocalGet(2), Decoded::Call(0)],
            },
            Decoded::LocalGet(2),
            Decoded::Load(MemoryAccess {
                name: "i32.load",
                offset: 8,
                align: 4,
                memory_type: AccessType::Int,
            }),
        ]
    );
}

#[test]
fn declarations_keep_limits_and_initializers() {
    let module = read_module(&sample_module()).expect("module should read");

    assert_eq!(module.memories.len(), 1);
    assert_eq!(module.memories[0].initial, 1);
    assert_eq!(module.memories[0].maximum, Some(2));

    assert_eq!(module.globals[0].ty, ValueType::I32);
    assert!(module.globals[0].mutable);
    assert_eq!(module.globals[0].init, vec![Decoded::Const(ConstValue::I32(1024))]);

    assert_eq!(module.data_segments[0].bytes, b"hi\n".to_vec());
    assert_eq!(
        module.data_segments[0].offset,
        Some(vec![Decoded::Const(ConstValue::I32(16))])
    );
}

#[test]
fn exports_and_names_are_collected() {
    let module = read_module(&sample_module()).expect("module should read");

    assert!(
        module
            .exports
            .iter()
            .any(|export| export.name == "memory" && export.kind == EntityKind::Memory)
    );
    assert_eq!(
        module.names.entities.get(&(EntityKind::Function, 1)).map(String::as_str),
        Some("add")
    );
    assert_eq!(module.names.locals.get(&(1, 1)).map(String::as_str), Some("y"));
}

#[test]
fn if_else_bodies_are_split() {
    let mut module = Module::new();
    let mut types = TypeSection::new();
    types.ty().function(vec![ValType::I32], vec![ValType::I32]);
    module.section(&types);
    let mut functions = FunctionSection::new();
    functions.function(0);
    module.section(&functions);

    let mut code = CodeSection::new();
    let mut choose = Function::new(vec![]);
    choose.instruction(&Instruction::LocalGet(0));
    choose.instruction(&Instruction::If(BlockType::Result(ValType::I32)));
    choose.instruction(&Instruction::I32Const(1));
    choose.instruction(&Instruction::Else);
    choose.instruction(&Instruction::I32Const(2));
    choose.instruction(&Instruction::End);
    choose.instruction(&Instruction::End);
    code.function(&choose);
    module.section(&code);

    let module = read_module(&module.finish()).expect("module should read");
    assert_eq!(
        module.functions[0].body,
        vec![
            Decoded::LocalGet(0),
            Decoded::If {
                signature: BlockSignature {
                    params: Vec::new(),
                    results: vec![ValueType::I32],
                },
                then_body: vec![Decoded::Const(ConstValue::I32(1))],
                else_body: Some(vec![Decoded::Const(ConstValue::I32(2))]),
            },
        ]
    );
}

#[test]
fn empty_else_bodies_are_dropped() {
    let mut module = Module::new();
    let mut types = TypeSection::new();
    types.ty().function(vec![ValType::I32], vec![]);
    module.section(&types);
    let mut functions = FunctionSection::new();
    functions.function(0);
    module.section(&functions);

    let mut code = CodeSection::new();
    let mut check = Function::new(vec![]);
    check.instruction(&Instruction::LocalGet(0));
    check.instruction(&Instruction::If(BlockType::Empty));
    check.instruction(&Instruction::LocalGet(0));
    check.instruction(&Instruction::Drop);
    check.instruction(&Instruction::Else);
    check.instruction(&Instruction::End);
    check.instruction(&Instruction::End);
    code.function(&check);
    module.section(&code);

    let module = read_module(&module.finish()).expect("module should read");
    assert_eq!(
        module.functions[0].body,
        vec![
            Decoded::LocalGet(0),
            Decoded::If {
                signature: BlockSignature::default(),
                then_body: vec![Decoded::LocalGet(0), Decoded::Drop],
                else_body: None,
            },
        ]
    );
}

#[test]
fn invalid_bytes_are_a_wasm_error() {
    let error = read_module(b"\0asm\x01\0\0\0\x01").expect_err("truncated module should fail");
    assert_eq!(error.error_type, ErrorType::Wasm);
}

#[test]
fn unsupported_operators_name_the_feature() {
    let mut module = Module::new();
    let mut types = TypeSection::new();
    types.ty().function(vec![], vec![]);
    module.section(&types);
    let mut functions = FunctionSection::new();
    functions.function(0);
    module.section(&functions);

    let mut code = CodeSection::new();
    let mut body = Function::new(vec![]);
    body.instruction(&Instruction::I32Const(7));
    body.instruction(&Instruction::I8x16Splat);
    body.instruction(&Instruction::Drop);
    body.instruction(&Instruction::End);
    code.function(&body);
    module.section(&code);

    let error = read_module(&module.finish()).expect_err("i8x16.splat is not rendered");
    assert_eq!(error.error_type, ErrorType::Unsupported);
    assert!(error.msg.contains("I8x16Splat"));
}
