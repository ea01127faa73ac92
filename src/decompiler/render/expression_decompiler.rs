//! Renders a node tree into a `LayoutValue`.
//!
//! Children are rendered first, then the node's kind picks the layout rule
//! that combines them.

use crate::decompiler::decompiler_errors::DecompilerError;
use crate::decompiler::layout::layout_primitives::{Layout, indent_value};
use crate::decompiler::layout::layout_value::LayoutValue;
use crate::decompiler::render::access_tracking::AccessNaming;
use crate::decompiler::render::numeric_format::format_constant;
use crate::decompiler::render::references::{
    local_declaration, memory_access_suffix, operator_token, temporary_name,
};
use crate::decompiler::tree::nodes::{ExprKind, LabelKind, LocalRef, Node, NodeKind};
use crate::decompiler::wasm_module::instructions::MemoryAccess;
use crate::return_decompiler_error;

pub struct ExpressionDecompiler<'a> {
    layout: Layout,
    access: &'a dyn AccessNaming,
}

impl<'a> ExpressionDecompiler<'a> {
    pub fn new(layout: Layout, access: &'a dyn AccessNaming) -> Self {
        ExpressionDecompiler { layout, access }
    }

    pub fn decompile(&self, node: &Node) -> Result<LayoutValue, DecompilerError> {
        let mut args = Vec::with_capacity(node.children.len());
        for child in &node.children {
            args.push(self.decompile(child)?);
        }

        match &node.kind {
            NodeKind::FlushToVars { start, count } => {
                let names = (*start..start + count)
                    .map(temporary_name)
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(self.layout.wrap_nary(args, &format!("let {names} = "), ""))
            }
            NodeKind::FlushedVar { index } => Ok(LayoutValue::single(temporary_name(*index))),
            NodeKind::Statements => Ok(self.statements(args)),
            NodeKind::EndReturn => Ok(self.return_values(args)),
            NodeKind::Decl(local) => Ok(LayoutValue::single(format!(
                "var {}",
                self.local_declaration(local)
            ))),
            NodeKind::DeclInit(local) => {
                let [value] = exact_args(args, "var")?;
                let prefix = format!("var {} = ", self.local_declaration(local));
                Ok(self.layout.wrap_child(value, &prefix, ""))
            }
            NodeKind::Expr(kind) => self.expression(kind, node, args),
        }
    }

    fn expression(
        &self,
        kind: &ExprKind,
        node: &Node,
        args: Vec<LayoutValue>,
    ) -> Result<LayoutValue, DecompilerError> {
        match kind {
            ExprKind::Const(value) => Ok(LayoutValue::single(format_constant(value))),
            ExprKind::LocalGet(name) | ExprKind::GlobalGet(name) => {
                Ok(LayoutValue::single(name.to_owned()))
            }
            ExprKind::LocalSet(name) | ExprKind::GlobalSet(name) => {
                let [value] = exact_args(args, "set")?;
                Ok(self.set(value, name))
            }
            ExprKind::LocalTee(name) => {
                // A tee without a value child only reads back what an
                // earlier set stored
                if args.is_empty() {
                    return Ok(LayoutValue::single(name.to_owned()));
                }
                let [value] = exact_args(args, "tee")?;
                Ok(self.set(value, name))
            }
            ExprKind::Binary(token) | ExprKind::Compare(token) => {
                let [left, right] = exact_args(args, token)?;
                let infix = format!(" {} ", operator_token(token));
                Ok(self.layout.wrap_binary(left, right, &infix, false))
            }
            ExprKind::Unary(token) => {
                let [operand] = exact_args(args, token)?;
                let prefix = format!("{}(", operator_token(token));
                Ok(self.layout.wrap_child(operand, &prefix, ")"))
            }
            ExprKind::Load(access) => {
                let [address] = exact_args(args, access.name)?;
                Ok(self.memory_access(address, &node.children[0], access))
            }
            ExprKind::Store(access) => {
                let [address, value] = exact_args(args, access.name)?;
                let target = self.memory_access(address, &node.children[0], access);
                Ok(self.layout.wrap_binary(target, value, " = ", true))
            }
            ExprKind::If => self.if_else(args),
            ExprKind::Block(label) => {
                let [body] = exact_args(args, "block")?;
                Ok(self.layout.block(body, label, "block"))
            }
            ExprKind::Loop(label) => {
                let [body] = exact_args(args, "loop")?;
                Ok(self.layout.block(body, label, "loop"))
            }
            ExprKind::Br { label, target } => {
                Ok(LayoutValue::single(format!("{} {label}", jump_keyword(*target))))
            }
            ExprKind::BrIf {
                target: LabelKind::Function,
                ..
            } => {
                let mut args = args.into_iter();
                let Some(condition) = args.next() else {
                    return_decompiler_error!("'br_if' expects a condition");
                };
                Ok(self.conditional_return(condition, args.collect()))
            }
            ExprKind::BrIf { label, target } => {
                let [condition] = exact_args(args, "br_if")?;
                let postfix = format!(") {} {label}", jump_keyword(*target));
                Ok(self.layout.wrap_child(condition, "if (", &postfix))
            }
            ExprKind::Return => Ok(self.return_values(args)),

            // Dropped results are the common case, so the drop stays silent
            ExprKind::Drop => {
                let [value] = exact_args(args, "drop")?;
                Ok(value)
            }
            ExprKind::Call(callee) => Ok(self.layout.wrap_nary(args, &format!("{callee}("), ")")),
            ExprKind::Convert(token) => {
                let prefix = format!("{}(", operator_token(token));
                Ok(self.layout.wrap_nary(args, &prefix, ")"))
            }
            ExprKind::Other(name) => Ok(self.layout.wrap_nary(args, &format!("{name}("), ")")),
        }
    }

    fn statements(&self, args: Vec<LayoutValue>) -> LayoutValue {
        let mut lines = Vec::new();
        for mut statement in args {
            if !statement.last_line().ends_with('}') {
                statement.append_to_last_line(";");
            }
            lines.extend(statement.into_lines());
        }
        LayoutValue::from_lines(lines, false)
    }

    fn return_values(&self, args: Vec<LayoutValue>) -> LayoutValue {
        if args.is_empty() {
            return LayoutValue::single("return");
        }
        self.layout.wrap_nary(args, "return ", "")
    }

    fn conditional_return(&self, condition: LayoutValue, values: Vec<LayoutValue>) -> LayoutValue {
        let mut returned = self.return_values(values);
        if !returned.is_multiline() {
            let postfix = format!(") {}", returned.first_line());
            return self.layout.wrap_child(condition, "if (", &postfix);
        }

        let mut value = self.layout.wrap_child(condition, "if (", ")");
        indent_value(&mut returned, self.layout.indent_amount, "");
        value.append_lines(returned);
        value
    }

    fn set(&self, value: LayoutValue, name: &str) -> LayoutValue {
        let mut set = self.layout.wrap_child(value, &format!("{name} = "), "");

        // An assignment used as an operand reads as one, so keep it bracketed
        set.needs_bracketing = true;
        set
    }

    fn memory_access(
        &self,
        address_value: LayoutValue,
        address: &Node,
        access: &MemoryAccess,
    ) -> LayoutValue {
        let mut value = self.layout.bracket_if_needed(address_value);
        let symbolic = self.access.access_name(access.offset, address);
        value.append_to_last_line(&memory_access_suffix(access, symbolic));
        value
    }

    fn if_else(&self, args: Vec<LayoutValue>) -> Result<LayoutValue, DecompilerError> {
        let child_count = args.len();
        let mut args = args.into_iter();
        let (Some(condition), Some(then_branch)) = (args.next(), args.next()) else {
            return_decompiler_error!("'if' expects 2 or 3 children, found {}", child_count);
        };
        let else_branch = args.next();

        let mut multiline = condition.is_multiline() || then_branch.is_multiline();
        let mut width = "if () {  }".len() + condition.width() + then_branch.width();
        if let Some(else_branch) = &else_branch {
            width += " else {  }".len() + else_branch.width();
            multiline = multiline || else_branch.is_multiline();
        }
        multiline = multiline || width > self.layout.target_width;

        if !multiline {
            let mut line = format!(
                "if ({}) {{ {} }}",
                condition.first_line(),
                then_branch.first_line()
            );
            if let Some(else_branch) = &else_branch {
                line.push_str(&format!(" else {{ {} }}", else_branch.first_line()));
            }
            return Ok(LayoutValue::single(line));
        }

        let mut value = condition;
        value.prepend_to_first_line("if (");
        value.append_to_last_line(") {");
        self.append_branch(&mut value, then_branch);
        if let Some(else_branch) = else_branch {
            value.push_line("} else {");
            self.append_branch(&mut value, else_branch);
        }
        value.push_line("}");
        value.needs_bracketing = false;
        Ok(value)
    }

    fn append_branch(&self, value: &mut LayoutValue, mut branch: LayoutValue) {
        if branch.is_blank() {
            return;
        }
        indent_value(&mut branch, self.layout.indent_amount, "");
        value.append_lines(branch);
    }

    fn local_declaration(&self, local: &LocalRef) -> String {
        local_declaration(&local.name, local.ty, self.access)
    }
}

fn jump_keyword(target: LabelKind) -> &'static str {
    match target {
        LabelKind::Loop => "continue",
        _ => "break",
    }
}

fn exact_args<const N: usize>(
    args: Vec<LayoutValue>,
    operation: &str,
) -> Result<[LayoutValue; N], DecompilerError> {
    let found = args.len();
    match <[LayoutValue; N]>::try_from(args) {
        Ok(args) => Ok(args),
        Err(_) => return_decompiler_error!(
            "'{}' expects {} children, found {}",
            operation,
            N,
            found;
            { DecompilationStage => "Rendering" }
        ),
    }
}

#[cfg(test)]
#[path = "tests/expression_decompiler_tests.rs"]
mod tests;
