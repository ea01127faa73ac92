//! Tests for rebuilding expression trees from the wasm value stack.

use super::TreeBuilder;
use crate::decompiler::datatypes::ValueType;
use crate::decompiler::decompiler_errors::{ErrorMetaDataKey, ErrorType};
use crate::decompiler::layout::layout_primitives::Layout;
use crate::decompiler::render::access_tracking::NoAccessNaming;
use crate::decompiler::render::expression_decompiler::ExpressionDecompiler;
use crate::decompiler::tree::nodes::{ExprKind, NodeKind};
use crate::decompiler::wasm_module::instructions::{
    BlockSignature, ConstValue, Instruction, NumericOp,
};
use crate::decompiler::wasm_module::module_context::ModuleContext;
use crate::decompiler::wasm_module::module_model::{FunctionDef, GlobalDef, WasmModule};

const ADD: NumericOp = NumericOp {
    name: "i32.add",
    token: "+",
};

const LAYOUT: Layout = Layout {
    indent_amount: 2,
    target_width: 70,
};

fn signature(params: &[ValueType], results: &[ValueType]) -> BlockSignature {
    BlockSignature {
        params: params.to_vec(),
        results: results.to_vec(),
    }
}

fn function(
    params: &[ValueType],
    results: &[ValueType],
    locals: &[ValueType],
    body: Vec<Instruction>,
) -> FunctionDef {
    FunctionDef {
        signature: signature(params, results),
        import: None,
        locals: locals.to_vec(),
        body,
    }
}

fn module(functions: Vec<FunctionDef>) -> WasmModule {
    WasmModule {
        functions,
        ..Default::default()
    }
}

fn int(value: i32) -> Instruction {
    Instruction::Const(ConstValue::I32(value))
}

/// Builds and renders function 0 of the module.
fn decompile(module: &WasmModule) -> Vec<String> {
    let context = ModuleContext::new(module);
    let tree = TreeBuilder::build_function(&context, 0).expect("tree should build");
    ExpressionDecompiler::new(LAYOUT, &NoAccessNaming)
        .decompile(&tree.root)
        .expect("tree should render")
        .into_lines()
}

#[test]
fn returns_the_value_left_on_the_stack() {
    let module = module(vec![function(
        &[ValueType::I32, ValueType::I32],
        &[ValueType::I32],
        &[],
        vec![
            Instruction::LocalGet(0),
            Instruction::LocalGet(1),
            Instruction::Binary(ADD),
        ],
    )]);

    assert_eq!(decompile(&module), vec!["return a + b;"]);
}

#[test]
fn first_set_declares_the_local() {
    let module = module(vec![function(
        &[],
        &[],
        &[ValueType::I32],
        vec![int(5), Instruction::LocalSet(0)],
    )]);

    assert_eq!(decompile(&module), vec!["var a:int = 5;"]);
}

#[test]
fn reading_a_local_before_any_set_hoists_its_declaration() {
    let module = module(vec![function(
        &[],
        &[ValueType::I64],
        &[ValueType::I64],
        vec![Instruction::LocalGet(0)],
    )]);

    assert_eq!(decompile(&module), vec!["var a:long;", "return a;"]);
}

#[test]
fn locals_escaping_their_block_are_hoisted() {
    let module = module(vec![function(
        &[],
        &[ValueType::I32],
        &[ValueType::I32],
        vec![
            Instruction::Block {
                signature: BlockSignature::default(),
                body: vec![int(1), Instruction::LocalSet(0)],
            },
            Instruction::LocalGet(0),
        ],
    )]);

    assert_eq!(
        decompile(&module),
        vec!["var a:int;", "block B_a {", "  a = 1;", "}", "return a;"]
    );
}

#[test]
fn pending_values_are_flushed_before_a_statement() {
    let module = module(vec![
        function(&[], &[ValueType::I32], &[], vec![int(1), Instruction::Call(1)]),
        function(&[], &[], &[], Vec::new()),
    ]);

    assert_eq!(
        decompile(&module),
        vec!["let t0 = 1;", "f_b();", "return t0;"]
    );
}

#[test]
fn multi_value_results_bind_consecutive_temporaries() {
    let module = module(vec![
        function(
            &[],
            &[ValueType::I32],
            &[],
            vec![Instruction::Call(1), Instruction::Binary(ADD)],
        ),
        function(&[], &[ValueType::I32, ValueType::I32], &[], Vec::new()),
    ]);

    assert_eq!(
        decompile(&module),
        vec!["let t0, t1 = f_b();", "return t0 + t1;"]
    );
}

#[test]
fn conditional_branch_back_to_a_loop_continues_it() {
    let module = module(vec![function(
        &[ValueType::I32],
        &[],
        &[],
        vec![Instruction::Loop {
            signature: BlockSignature::default(),
            body: vec![Instruction::LocalGet(0), Instruction::BrIf(0)],
        }],
    )]);

    assert_eq!(
        decompile(&module),
        vec!["loop L_a {", "  if (a) continue L_a;", "}"]
    );
}

#[test]
fn branch_to_the_function_is_a_return_and_skips_dead_code() {
    let module = module(vec![function(
        &[ValueType::I32],
        &[ValueType::I32],
        &[],
        vec![Instruction::LocalGet(0), Instruction::Br(0), int(5), Instruction::Drop],
    )]);

    let context = ModuleContext::new(&module);
    let tree = TreeBuilder::build_function(&context, 0).expect("tree should build");
    assert_eq!(tree.dead_instructions, 2);
    assert_eq!(decompile(&module), vec!["return a;"]);
}

#[test]
fn if_with_a_result_is_an_expression() {
    let module = module(vec![function(
        &[ValueType::I32],
        &[ValueType::I32],
        &[],
        vec![
            Instruction::LocalGet(0),
            Instruction::If {
                signature: signature(&[], &[ValueType::I32]),
                then_body: vec![int(1)],
                else_body: Some(vec![int(2)]),
            },
        ],
    )]);

    assert_eq!(
        decompile(&module),
        vec!["return if (a) { 1; } else { 2; }"]
    );
}

#[test]
fn tee_of_the_only_pending_value_splits_into_set_and_read() {
    let module = module(vec![function(
        &[],
        &[ValueType::I32],
        &[ValueType::I32],
        vec![int(3), Instruction::LocalTee(0)],
    )]);

    assert_eq!(decompile(&module), vec!["var a:int = 3;", "return a;"]);
}

#[test]
fn nested_tee_stays_an_assignment_expression() {
    let module = module(vec![function(
        &[],
        &[ValueType::I32],
        &[ValueType::I32],
        vec![int(1), int(2), Instruction::LocalTee(0), Instruction::Binary(ADD)],
    )]);

    assert_eq!(
        decompile(&module),
        vec!["var a:int;", "return 1 + (a = 2);"]
    );
}

#[test]
fn globals_are_read_and_written_by_name() {
    let mut module = module(vec![function(
        &[],
        &[],
        &[],
        vec![
            Instruction::GlobalGet(0),
            int(1),
            Instruction::Binary(ADD),
            Instruction::GlobalSet(0),
        ],
    )]);
    module.globals.push(GlobalDef {
        ty: ValueType::I32,
        mutable: true,
        import: None,
        init: vec![int(0)],
    });

    assert_eq!(decompile(&module), vec!["g_a = g_a + 1;"]);
}

#[test]
fn branch_table_lists_every_target() {
    let module = module(vec![function(
        &[ValueType::I32],
        &[],
        &[],
        vec![Instruction::Block {
            signature: BlockSignature::default(),
            body: vec![
                Instruction::LocalGet(0),
                Instruction::BrTable {
                    targets: vec![0],
                    default: 1,
                },
            ],
        }],
    )]);

    assert_eq!(
        decompile(&module),
        vec!["block B_a {", "  br_table[B_a, ..return](a);", "}"]
    );
}

#[test]
fn missing_results_report_the_function_and_counts() {
    let module = module(vec![function(&[], &[ValueType::I32], &[], Vec::new())]);
    let context = ModuleContext::new(&module);

    let error = match TreeBuilder::build_function(&context, 0) {
        Ok(_) => panic!("a body without its result should fail"),
        Err(error) => error,
    };
    assert_eq!(error.error_type, ErrorType::Decompiler);
    assert_eq!(error.location.function.as_deref(), Some("f_a"));
    assert_eq!(
        error.metadata.get(&ErrorMetaDataKey::ExpectedCount).map(String::as_str),
        Some("1")
    );
}

#[test]
fn constant_expressions_reduce_to_one_node() {
    let module = WasmModule::default();
    let context = ModuleContext::new(&module);

    let node = TreeBuilder::build_constant(&context, &[int(1024)]).expect("constant should build");
    assert_eq!(node.kind, NodeKind::Expr(ExprKind::Const(ConstValue::I32(1024))));

    let error = TreeBuilder::build_constant(&context, &[int(1), int(2)])
        .expect_err("two values are not one constant");
    assert_eq!(error.error_type, ErrorType::Decompiler);
}

#[test]
fn stack_underflow_reports_the_instruction_position() {
    let module = module(vec![function(
        &[],
        &[],
        &[],
        vec![Instruction::Nop, int(1), Instruction::Binary(ADD)],
    )]);
    let context = ModuleContext::new(&module);

    let error = match TreeBuilder::build_function(&context, 0) {
        Ok(_) => panic!("adding a single operand should fail"),
        Err(error) => error,
    };
    assert_eq!(error.location.instruction, Some(2));
    assert!(error.msg.contains("needs 2 operands"));
}

#[test]
fn conditional_exit_returns_the_values_beneath_the_condition() {
    let module = module(vec![function(
        &[ValueType::I32],
        &[ValueType::I32],
        &[],
        vec![
            int(5),
            Instruction::LocalGet(0),
            Instruction::BrIf(0),
            Instruction::Drop,
            int(7),
        ],
    )]);

    assert_eq!(
        decompile(&module),
        vec!["let t0 = 5;", "if (a) return t0;", "t0;", "return 7;"]
    );
}
