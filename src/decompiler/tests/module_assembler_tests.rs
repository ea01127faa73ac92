//! Tests for assembling declarations and functions into module text.

use super::{DecompiledModule, ModuleAssembler, quote_data_bytes};
use crate::decompiler::datatypes::{MemoryType, ValueType};
use crate::decompiler::decompiler_warnings::{DecompilerWarning, WarningKind};
use crate::decompiler::layout::layout_primitives::Layout;
use crate::decompiler::wasm_module::instructions::{
    BlockSignature, ConstValue, Instruction, MemoryAccess, NumericOp,
};
use crate::decompiler::wasm_module::module_context::ModuleContext;
use crate::decompiler::wasm_module::module_model::{
    DataSegment, EntityKind, ExportDef, FunctionDef, GlobalDef, ImportInfo, MemoryDef, TableDef,
    WasmModule,
};
use crate::projects::settings::DecompileOptions;

const ADD: NumericOp = NumericOp {
    name: "i32.add",
    token: "+",
};

fn import(module: &str, field: &str) -> Option<ImportInfo> {
    Some(ImportInfo {
        module: module.to_owned(),
        field: field.to_owned(),
    })
}

fn function(params: &[ValueType], results: &[ValueType], body: Vec<Instruction>) -> FunctionDef {
    FunctionDef {
        signature: BlockSignature {
            params: params.to_vec(),
            results: results.to_vec(),
        },
        import: None,
        locals: Vec::new(),
        body,
    }
}

fn int(value: i32) -> Instruction {
    Instruction::Const(ConstValue::I32(value))
}

fn assemble(module: &WasmModule) -> (DecompiledModule, Vec<DecompilerWarning>) {
    let context = ModuleContext::new(module);
    ModuleAssembler::new(&context, Layout::new(&DecompileOptions::default()))
        .assemble()
        .expect("module should assemble")
}

fn full_module() -> WasmModule {
    let mut imported_log = function(&[ValueType::I32], &[], Vec::new());
    imported_log.import = import("env", "log");

    WasmModule {
        functions: vec![
            imported_log,
            function(
                &[ValueType::I32, ValueType::I32],
                &[ValueType::I32],
                vec![
                    Instruction::LocalGet(0),
                    Instruction::LocalGet(1),
                    Instruction::Binary(ADD),
                ],
            ),
        ],
        globals: vec![GlobalDef {
            ty: ValueType::I32,
            mutable: true,
            import: None,
            init: vec![int(1024)],
        }],
        tables: vec![TableDef {
            element_type: ValueType::FuncRef,
            initial: 1,
            maximum: None,
            import: import("env", "table"),
        }],
        memories: vec![MemoryDef {
            initial: 1,
            maximum: Some(2),
            import: None,
        }],
        data_segments: vec![DataSegment {
            offset: Some(vec![int(16)]),
            bytes: b"hi\n\0".to_vec(),
        }],
        exports: vec![
            ExportDef {
                name: String::from("memory"),
                kind: EntityKind::Memory,
                index: 0,
            },
            ExportDef {
                name: String::from("add"),
                kind: EntityKind::Function,
                index: 1,
            },
        ],
        ..Default::default()
    }
}

#[test]
fn sections_render_in_declaration_order() {
    let (module, warnings) = assemble(&full_module());

    let expected = [
        "export memory memory(initial: 1, max: 2);",
        "",
        "global g_a:int = 1024;",
        "",
        "import table env_table:funcref;",
        "",
        r#"data d_a(offset: 16) = "hi\0a\00";"#,
        "",
        "import function env_log(a:int);",
        "",
        "export function add(a:int, b:int):int {",
        "  return a + b;",
        "}",
        "",
        "",
    ]
    .join("\n");

    assert_eq!(module.to_text(), expected);
    assert!(warnings.is_empty());
}

#[test]
fn imported_functions_have_no_body() {
    let (module, _) = assemble(&full_module());

    let log = module.function("env_log").expect("import should be listed");
    assert_eq!(log.body, None);

    let add = module.function("add").expect("add should be listed");
    assert_eq!(add.body, Some(vec![String::from("  return a + b;")]));
}

#[test]
fn passive_data_and_empty_bodies() {
    let module = WasmModule {
        functions: vec![function(&[], &[], Vec::new())],
        data_segments: vec![DataSegment {
            offset: None,
            bytes: b"abc".to_vec(),
        }],
        ..Default::default()
    };
    let (module, _) = assemble(&module);

    assert_eq!(
        module.to_text(),
        "data d_a = \"abc\";\n\nfunction f_a() {\n}\n\n"
    );
}

#[test]
fn multiple_results_are_listed_in_brackets() {
    let module = WasmModule {
        functions: vec![function(
            &[],
            &[ValueType::I32, ValueType::I64],
            vec![int(1), Instruction::Const(ConstValue::I64(2))],
        )],
        ..Default::default()
    };
    let (module, _) = assemble(&module);

    assert_eq!(module.functions[0].signature, "function f_a():(int, long)");
    assert_eq!(
        module.functions[0].body,
        Some(vec![String::from("  return 1, 2L;")])
    );
}

#[test]
fn struct_parameters_get_their_inferred_type() {
    let field = |offset| {
        Instruction::Load(MemoryAccess {
            name: "i32.load",
            offset,
            align: 4,
            memory_type: MemoryType::Int,
        })
    };
    let module = WasmModule {
        functions: vec![function(
            &[ValueType::I32],
            &[ValueType::I32],
            vec![
                Instruction::LocalGet(0),
                field(0),
                Instruction::LocalGet(0),
                field(4),
                Instruction::Binary(ADD),
            ],
        )],
        ..Default::default()
    };
    let (module, _) = assemble(&module);

    assert_eq!(
        module.functions[0].signature,
        "function f_a(a:{ a:int, b:int }):int"
    );
    assert_eq!(
        module.functions[0].body,
        Some(vec![String::from("  return a.a + a.b;")])
    );
}

#[test]
fn dead_code_and_sanitized_names_are_reported() {
    let mut module = WasmModule {
        functions: vec![function(&[], &[], vec![Instruction::Return, Instruction::Nop])],
        ..Default::default()
    };
    module
        .names
        .entities
        .insert((EntityKind::Function, 0), String::from("bad name"));
    let (decompiled, warnings) = assemble(&module);

    assert_eq!(decompiled.functions[0].name, "bad_name");
    assert!(warnings.iter().any(|warning| matches!(
        warning.warning_kind,
        WarningKind::DeadCodeSkipped { count: 1 }
    )));
    assert!(warnings.iter().any(|warning| matches!(
        warning.warning_kind,
        WarningKind::NameSanitized { count: 1 }
    )));
}

#[test]
fn data_bytes_are_quoted_with_hex_escapes() {
    assert_eq!(quote_data_bytes(b"ok ~"), "\"ok ~\"");
    assert_eq!(
        quote_data_bytes(&[0x00, 0x7f, 0xff, b'"', b'\\']),
        r#""\00\7f\ff\22\5c""#
    );
}
