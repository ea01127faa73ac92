//! Stitches section declarations and decompiled functions into one module.
//!
//! Order: memories, globals, tables, data segments, functions. Each function
//! gets a fresh tree and a fresh access tracker.

use crate::decompiler::decompiler_errors::DecompilerError;
use crate::decompiler::decompiler_warnings::{DecompilerWarning, WarningKind};
use crate::decompiler::layout::layout_primitives::{Layout, indent_value};
use crate::decompiler::render::access_tracking::{AccessNaming, AccessTracker, NoAccessNaming};
use crate::decompiler::render::expression_decompiler::ExpressionDecompiler;
use crate::decompiler::render::references::local_declaration;
use crate::decompiler::tree::tree_builder::TreeBuilder;
use crate::decompiler::wasm_module::instructions::Instruction;
use crate::decompiler::wasm_module::module_context::{LinkageQuery, ModuleContext};
use crate::decompiler::wasm_module::module_model::EntityKind;
use crate::{return_decompiler_error, timer_log};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecompiledFunction {
    pub name: String,
    pub signature: String,

    // None for imported functions, which have no body to show
    pub body: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecompiledModule {
    /// Memory, global, table and data lines, groups separated by a blank line
    pub declarations: Vec<String>,
    pub functions: Vec<DecompiledFunction>,
}

impl DecompiledModule {
    pub fn function(&self, name: &str) -> Option<&DecompiledFunction> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in &self.declarations {
            text.push_str(line);
            text.push('\n');
        }

        for function in &self.functions {
            text.push_str(&function.signature);
            match &function.body {
                None => text.push(';'),
                Some(lines) => {
                    text.push_str(" {\n");
                    for line in lines {
                        text.push_str(line);
                        text.push('\n');
                    }
                    text.push('}');
                }
            }
            text.push_str("\n\n");
        }

        text
    }
}

impl Display for DecompiledModule {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.to_text())
    }
}

pub struct ModuleAssembler<'a> {
    context: &'a ModuleContext<'a>,
    layout: Layout,
    warnings: Vec<DecompilerWarning>,
}

impl<'a> ModuleAssembler<'a> {
    pub fn new(context: &'a ModuleContext<'a>, layout: Layout) -> Self {
        ModuleAssembler {
            context,
            layout,
            warnings: Vec::new(),
        }
    }

    pub fn assemble(mut self) -> Result<(DecompiledModule, Vec<DecompilerWarning>), DecompilerError> {
        let mut module = DecompiledModule::default();

        let time = Instant::now();
        self.memories(&mut module.declarations)?;
        self.globals(&mut module.declarations)?;
        self.tables(&mut module.declarations)?;
        self.data_segments(&mut module.declarations)?;
        timer_log!(time, "Declarations assembled in: ");

        let time = Instant::now();
        let mut tracker = AccessTracker::new();
        for index in 0..self.context.module.functions.len() as u32 {
            let function = self.function(index, &mut tracker)?;
            module.functions.push(function);
            tracker.clear();
        }
        timer_log!(time, "Functions decompiled in: ");

        if self.context.names.sanitized_count > 0 {
            self.warnings.push(DecompilerWarning::new(
                "Names rewritten into identifiers",
                None,
                WarningKind::NameSanitized {
                    count: self.context.names.sanitized_count,
                },
            ));
        }

        Ok((module, self.warnings))
    }

    // ============================================================
    // Declarations
    // ============================================================

    fn memories(&self, lines: &mut Vec<String>) -> Result<(), DecompilerError> {
        for (index, memory) in self.context.module.memories.iter().enumerate() {
            let index = index as u32;
            let name = self.context.entity_name(EntityKind::Memory, index)?;
            let mut line = format!("{}memory {name}", self.linkage_prefix(EntityKind::Memory, index));
            if memory.import.is_none() {
                line.push_str(&format!("(initial: {}", memory.initial));
                if let Some(maximum) = memory.maximum {
                    line.push_str(&format!(", max: {maximum}"));
                }
                line.push(')');
            }
            line.push(';');
            lines.push(line);
        }
        end_group(lines, self.context.module.memories.is_empty());
        Ok(())
    }

    fn globals(&self, lines: &mut Vec<String>) -> Result<(), DecompilerError> {
        for (index, global) in self.context.module.globals.iter().enumerate() {
            let index = index as u32;
            let name = self.context.entity_name(EntityKind::Global, index)?;
            let mut line = format!(
                "{}global {name}:{}",
                self.linkage_prefix(EntityKind::Global, index),
                global.ty
            );
            if global.import.is_none() {
                let init = self
                    .constant_expression(&global.init)
                    .map_err(|error| error.with_function(name))?;
                line.push_str(&format!(" = {init}"));
            }
            line.push(';');
            lines.push(line);
        }
        end_group(lines, self.context.module.globals.is_empty());
        Ok(())
    }

    fn tables(&self, lines: &mut Vec<String>) -> Result<(), DecompilerError> {
        for (index, table) in self.context.module.tables.iter().enumerate() {
            let index = index as u32;
            let name = self.context.entity_name(EntityKind::Table, index)?;
            let mut line = format!(
                "{}table {name}:{}",
                self.linkage_prefix(EntityKind::Table, index),
                table.element_type
            );
            if table.import.is_none() {
                line.push_str(&format!("(min: {}", table.initial));
                if let Some(maximum) = table.maximum {
                    line.push_str(&format!(", max: {maximum}"));
                }
                line.push(')');
            }
            line.push(';');
            lines.push(line);
        }
        end_group(lines, self.context.module.tables.is_empty());
        Ok(())
    }

    fn data_segments(&self, lines: &mut Vec<String>) -> Result<(), DecompilerError> {
        for (index, segment) in self.context.module.data_segments.iter().enumerate() {
            let name = self.context.entity_name(EntityKind::Data, index as u32)?;
            let bytes = quote_data_bytes(&segment.bytes);
            let line = match &segment.offset {
                Some(offset) => {
                    let offset = self
                        .constant_expression(offset)
                        .map_err(|error| error.with_function(name))?;
                    format!("data {name}(offset: {offset}) = {bytes};")
                }
                None => format!("data {name} = {bytes};"),
            };
            lines.push(line);
        }
        end_group(lines, self.context.module.data_segments.is_empty());
        Ok(())
    }

    fn linkage_prefix(&self, kind: EntityKind, index: u32) -> &'static str {
        match (
            self.context.is_exported(kind, index),
            self.context.is_imported(kind, index),
        ) {
            (true, true) => "export import ",
            (true, false) => "export ",
            (false, true) => "import ",
            (false, false) => "",
        }
    }

    /// Renders an initializer, which has to fit on a single line.
    fn constant_expression(&self, instructions: &[Instruction]) -> Result<String, DecompilerError> {
        let node = TreeBuilder::build_constant(self.context, instructions)?;
        let value = ExpressionDecompiler::new(self.layout, &NoAccessNaming).decompile(&node)?;
        if value.is_multiline() {
            return_decompiler_error!(
                "Constant expression rendered to {} lines",
                value.line_count()
            );
        }
        Ok(value.first_line().to_owned())
    }

    // ============================================================
    // Functions
    // ============================================================

    fn function(
        &mut self,
        index: u32,
        tracker: &mut AccessTracker,
    ) -> Result<DecompiledFunction, DecompilerError> {
        let name = self.context.entity_name(EntityKind::Function, index)?.to_owned();
        let is_import = self.context.is_imported(EntityKind::Function, index);

        let tree = match is_import {
            true => None,
            false => {
                let tree = TreeBuilder::build_function(self.context, index)?;
                tracker.track(&tree.root);
                if tree.dead_instructions > 0 {
                    self.warnings.push(DecompilerWarning::new(
                        "Unreachable instructions skipped",
                        Some(name.clone()),
                        WarningKind::DeadCodeSkipped {
                            count: tree.dead_instructions,
                        },
                    ));
                }
                Some(tree)
            }
        };

        let signature = self.signature(index, &name, tracker)?;

        let body = match tree {
            None => None,
            Some(tree) => {
                let mut value = ExpressionDecompiler::new(self.layout, &*tracker)
                    .decompile(&tree.root)
                    .map_err(|error| error.with_function(&name))?;
                indent_value(&mut value, self.layout.indent_amount, "");
                match value.is_blank() {
                    true => Some(Vec::new()),
                    false => Some(value.into_lines()),
                }
            }
        };

        Ok(DecompiledFunction {
            name,
            signature,
            body,
        })
    }

    fn signature(
        &self,
        index: u32,
        name: &str,
        access: &dyn AccessNaming,
    ) -> Result<String, DecompilerError> {
        let function = self.context.function(index)?;

        let mut params = Vec::with_capacity(function.signature.params.len());
        for (param_index, ty) in function.signature.params.iter().enumerate() {
            let param_name = self.context.local_name(index, param_index as u32)?;
            params.push(local_declaration(param_name, *ty, access));
        }

        let mut signature = format!(
            "{}function {name}({})",
            self.linkage_prefix(EntityKind::Function, index),
            params.join(", ")
        );

        let results = &function.signature.results;
        match results.len() {
            0 => {}
            1 => signature.push_str(&format!(":{}", results[0])),
            _ => {
                let types = results
                    .iter()
                    .map(|ty| ty.decompiled_name())
                    .collect::<Vec<_>>()
                    .join(", ");
                signature.push_str(&format!(":({types})"));
            }
        }

        Ok(signature)
    }
}

fn end_group(lines: &mut Vec<String>, group_was_empty: bool) {
    if !group_was_empty {
        lines.push(String::new());
    }
}

/// Printable ASCII as-is, every other byte as `\` and two lowercase hex digits.
pub fn quote_data_bytes(bytes: &[u8]) -> String {
    const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

    let mut quoted = String::with_capacity(bytes.len() + 2);
    quoted.push('"');
    for &byte in bytes {
        if (b' '..=b'~').contains(&byte) && byte != b'"' && byte != b'\\' {
            quoted.push(char::from(byte));
        } else {
            quoted.push('\\');
            quoted.push(char::from(HEX_DIGITS[(byte >> 4) as usize]));
            quoted.push(char::from(HEX_DIGITS[(byte & 0xf) as usize]));
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
#[path = "tests/module_assembler_tests.rs"]
mod tests;
