//! Builds the decompiler node tree from a structured instruction list.
//!
//! The builder replays the wasm value stack. While a value is pending it
//! lives on `exp_stack` as its own expression node, so consumers can take it
//! as a child. The top `depth` entries of the current frame are always
//! single-value nodes and everything below them is a statement.
//!
//! When a statement is emitted while values are still pending, or a node
//! produces several values, the pending values are bound to numbered
//! temporaries so the statement can't be reordered ahead of them.

use crate::decompiler::decompiler_errors::{DecompilerError, ErrorMetaDataKey};
use crate::decompiler::tree::nodes::{ExprKind, LabelKind, LocalRef, Node, NodeKind};
use crate::decompiler::wasm_module::instructions::{BlockSignature, Instruction};
use crate::decompiler::wasm_module::module_context::ModuleContext;
use crate::decompiler::wasm_module::module_model::EntityKind;
use crate::decompiler::wasm_module::naming::index_to_alpha_name;
use crate::{return_decompiler_error, tree_log};
use rustc_hash::{FxHashMap, FxHashSet};

// Locals defined here are visible for the whole function
const FUNCTION_SCOPE: usize = 0;

pub struct FunctionTree {
    pub root: Node,

    /// Instructions skipped because they follow an unconditional branch
    pub dead_instructions: usize,
}

struct Label {
    name: String,
    kind: LabelKind,
}

pub struct TreeBuilder<'a> {
    context: &'a ModuleContext<'a>,

    // None while building a constant expression
    function_index: Option<u32>,
    param_count: u32,
    result_count: usize,

    exp_stack: Vec<Node>,
    depth: usize,
    labels: Vec<Label>,
    label_counter: u64,
    next_temporary: u32,

    // Local index -> the scope that declared it
    defined_locals: FxHashMap<u32, usize>,
    scopes_closed: Vec<bool>,
    current_scope: usize,
    predeclarations: Vec<Node>,
    predeclared: FxHashSet<u32>,

    dead_instructions: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(context: &'a ModuleContext<'a>, function_index: Option<u32>) -> Self {
        TreeBuilder {
            context,
            function_index,
            param_count: 0,
            result_count: 0,
            exp_stack: Vec::new(),
            depth: 0,
            labels: Vec::new(),
            label_counter: 0,
            next_temporary: 0,
            defined_locals: FxHashMap::default(),
            scopes_closed: Vec::new(),
            current_scope: FUNCTION_SCOPE,
            predeclarations: Vec::new(),
            predeclared: FxHashSet::default(),
            dead_instructions: 0,
        }
    }

    pub fn build_function(
        context: &'a ModuleContext<'a>,
        function_index: u32,
    ) -> Result<FunctionTree, DecompilerError> {
        let function = context.function(function_index)?;
        let name = context.entity_name(EntityKind::Function, function_index)?;

        let result_count = function.signature.results.len();
        let mut builder = TreeBuilder::new(context, Some(function_index));
        builder.param_count = function.signature.params.len() as u32;
        builder.result_count = result_count;
        builder.labels.push(Label {
            name: String::from("return"),
            kind: LabelKind::Function,
        });

        let mut root = builder
            .construct_frame(&function.body, result_count, Vec::new(), true)
            .map_err(|error| error.with_function(name))?;

        let predeclarations = std::mem::take(&mut builder.predeclarations);
        let hoisted = predeclarations
            .iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Decl(local) => Some(local.name.as_str()),
                _ => None,
            })
            .collect::<FxHashSet<_>>();
        if !hoisted.is_empty() {
            demote_hoisted_declarations(&mut root, &hoisted);
        }
        root.children.splice(0..0, predeclarations);

        tree_log!("\nTree for ", Dark Magenta name, "\n", root.to_string());

        Ok(FunctionTree {
            root,
            dead_instructions: builder.dead_instructions,
        })
    }

    /// Builds the single value node of a constant expression
    /// (global initializers and data segment offsets).
    pub fn build_constant(
        context: &'a ModuleContext<'a>,
        instructions: &[Instruction],
    ) -> Result<Node, DecompilerError> {
        let mut builder = TreeBuilder::new(context, None);
        let statements = builder.construct_frame(instructions, 1, Vec::new(), false)?;

        let mut children = statements.children;
        if children.len() != 1 {
            return_decompiler_error!(
                "Constant expression reduced to {} nodes instead of one",
                children.len();
                { DecompilationStage => "Tree Building" }
            );
        }

        match children.pop() {
            Some(node) => Ok(node),
            None => return_decompiler_error!("Constant expression has no value"),
        }
    }

    // ============================================================
    // Frames
    // ============================================================

    /// Builds one nested body into a `Statements` node.
    ///
    /// `initial_values` are the block's parameters, already bound to
    /// temporaries by the parent.
    fn construct_frame(
        &mut self,
        body: &[Instruction],
        result_count: usize,
        initial_values: Vec<Node>,
        is_function_body: bool,
    ) -> Result<Node, DecompilerError> {
        let saved_depth = self.depth;
        let base = self.exp_stack.len();
        self.depth = 0;

        let scope = self.scopes_closed.len();
        self.scopes_closed.push(false);
        let saved_scope = std::mem::replace(&mut self.current_scope, scope);

        self.push_values(initial_values);

        let reachable = self.construct_instructions(body)?;
        if reachable {
            if self.depth != result_count {
                let mut error = DecompilerError::decompiler_error(format!(
                    "Block ended with {} values on the stack but declares {} results",
                    self.depth, result_count
                ));
                error.new_metadata_entry(ErrorMetaDataKey::ExpectedCount, result_count.to_string());
                error.new_metadata_entry(ErrorMetaDataKey::FoundCount, self.depth.to_string());
                return Err(error);
            }
            if is_function_body && result_count > 0 {
                self.emit(NodeKind::EndReturn, result_count, 0)?;
            }
        } else {
            // Everything still pending was bound to a temporary by the branch
            let leftover = self.exp_stack.len() - self.depth;
            self.exp_stack.truncate(leftover.max(base));
        }

        let statements = self.exp_stack.split_off(base);

        self.scopes_closed[scope] = true;
        self.current_scope = saved_scope;
        self.depth = saved_depth;

        Ok(Node::new(NodeKind::Statements, statements))
    }

    /// Returns false when the body ends in an unconditional transfer.
    fn construct_instructions(&mut self, body: &[Instruction]) -> Result<bool, DecompilerError> {
        for (position, instruction) in body.iter().enumerate() {
            let diverges = self
                .construct_instruction(instruction)
                .map_err(|error| error.at_instruction(position))?;
            if diverges {
                self.dead_instructions += body.len() - position - 1;
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Returns true for instructions that never fall through.
    fn construct_instruction(&mut self, instruction: &Instruction) -> Result<bool, DecompilerError> {
        match instruction {
            Instruction::Nop => {}
            Instruction::Unreachable => {
                self.emit_expr(ExprKind::Other(String::from("unreachable")), 0, 0)?;
                return Ok(true);
            }
            Instruction::Const(value) => self.emit_expr(ExprKind::Const(*value), 0, 1)?,

            Instruction::LocalGet(index) => {
                self.note_local_read(*index)?;
                let name = self.local_name(*index)?;
                self.emit_expr(ExprKind::LocalGet(name), 0, 1)?;
            }
            Instruction::LocalSet(index) => self.local_set(*index)?,
            Instruction::LocalTee(index) => self.local_tee(*index)?,
            Instruction::GlobalGet(index) => {
                let name = self.global_name(*index)?;
                self.emit_expr(ExprKind::GlobalGet(name), 0, 1)?;
            }
            Instruction::GlobalSet(index) => {
                let name = self.global_name(*index)?;
                self.emit_expr(ExprKind::GlobalSet(name), 1, 0)?;
            }

            Instruction::Unary(op) => self.emit_expr(ExprKind::Unary(op.token), 1, 1)?,
            Instruction::Binary(op) => self.emit_expr(ExprKind::Binary(op.token), 2, 1)?,
            Instruction::Compare(op) => self.emit_expr(ExprKind::Compare(op.token), 2, 1)?,
            Instruction::Convert(op) => self.emit_expr(ExprKind::Convert(op.token), 1, 1)?,
            Instruction::Load(access) => self.emit_expr(ExprKind::Load(*access), 1, 1)?,
            Instruction::Store(access) => self.emit_expr(ExprKind::Store(*access), 2, 0)?,

            Instruction::Block { signature, body } => {
                self.construct_block(LabelKind::Block, signature, body)?
            }
            Instruction::Loop { signature, body } => {
                self.construct_block(LabelKind::Loop, signature, body)?
            }
            Instruction::If {
                signature,
                then_body,
                else_body,
            } => self.construct_if(signature, then_body, else_body.as_deref())?,

            Instruction::Br(relative_depth) => {
                let (label, target) = self.label_at(*relative_depth)?;
                if target == LabelKind::Function {
                    self.emit_expr(ExprKind::Return, self.result_count, 0)?;
                } else {
                    self.emit_expr(ExprKind::Br { label, target }, 0, 0)?;
                }
                return Ok(true);
            }
            Instruction::BrIf(relative_depth) => {
                let (label, target) = self.label_at(*relative_depth)?;
                if target == LabelKind::Function && self.result_count > 0 {
                    self.conditional_return(label)?;
                } else {
                    self.emit_expr(ExprKind::BrIf { label, target }, 1, 0)?;
                }
            }
            Instruction::BrTable { targets, default } => {
                let mut labels = Vec::with_capacity(targets.len());
                for target in targets {
                    labels.push(self.label_at(*target)?.0);
                }
                let (default_label, _) = self.label_at(*default)?;
                labels.push(format!("..{default_label}"));
                let name = format!("br_table[{}]", labels.join(", "));
                self.emit_expr(ExprKind::Other(name), 1, 0)?;
                return Ok(true);
            }
            Instruction::Return => {
                self.emit_expr(ExprKind::Return, self.result_count, 0)?;
                return Ok(true);
            }
            Instruction::Drop => self.emit_expr(ExprKind::Drop, 1, 0)?,

            Instruction::Call(function_index) => {
                let signature = &self.context.function(*function_index)?.signature;
                let callee = self
                    .context
                    .entity_name(EntityKind::Function, *function_index)?
                    .to_owned();
                self.emit_expr(
                    ExprKind::Call(callee),
                    signature.params.len(),
                    signature.results.len(),
                )?;
            }
            Instruction::CallIndirect { type_index, .. } => {
                let signature = self.context.type_signature(*type_index)?;
                self.emit_expr(
                    ExprKind::Other(String::from("call_indirect")),
                    signature.params.len() + 1,
                    signature.results.len(),
                )?;
            }
            Instruction::Other {
                name,
                nargs,
                nreturns,
            } => self.emit_expr(
                ExprKind::Other((*name).to_owned()),
                *nargs as usize,
                *nreturns as usize,
            )?,
        }

        Ok(false)
    }

    fn construct_block(
        &mut self,
        kind: LabelKind,
        signature: &BlockSignature,
        body: &[Instruction],
    ) -> Result<(), DecompilerError> {
        let params = self.take_block_params(signature.params.len())?;
        let label = self.push_label(kind);

        let statements = self.construct_frame(body, signature.results.len(), params, false)?;
        self.labels.pop();

        let expr = match kind {
            LabelKind::Loop => ExprKind::Loop(label),
            _ => ExprKind::Block(label),
        };
        self.push_result(Node::expr(expr, vec![statements]), signature.results.len())
    }

    fn construct_if(
        &mut self,
        signature: &BlockSignature,
        then_body: &[Instruction],
        else_body: Option<&[Instruction]>,
    ) -> Result<(), DecompilerError> {
        if self.depth == 0 {
            return_decompiler_error!("'if' has no condition on the stack");
        }
        let Some(condition) = self.exp_stack.pop() else {
            return_decompiler_error!("'if' has no condition on the stack");
        };
        self.depth -= 1;

        let params = self.take_block_params(signature.params.len())?;
        self.push_label(LabelKind::If);

        let result_count = signature.results.len();
        let then_node = self.construct_frame(then_body, result_count, params.clone(), false)?;
        let else_node = match else_body {
            Some(body) => Some(self.construct_frame(body, result_count, params, false)?),
            None => None,
        };
        self.labels.pop();

        let mut children = vec![condition, then_node];
        children.extend(else_node);
        self.push_result(Node::expr(ExprKind::If, children), result_count)
    }

    /// Binds everything pending to temporaries and hands the top `count`
    /// references over to the block being entered.
    fn take_block_params(&mut self, count: usize) -> Result<Vec<Node>, DecompilerError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if self.depth < count {
            return_decompiler_error!(
                "Block takes {} parameters but only {} values are on the stack",
                count,
                self.depth
            );
        }

        let mut references = self.flush_pending(None);
        let params = references.split_off(references.len() - count);
        self.push_values(references);
        Ok(params)
    }

    // ============================================================
    // Node emission
    // ============================================================

    fn emit_expr(&mut self, kind: ExprKind, nargs: usize, nreturns: usize) -> Result<(), DecompilerError> {
        self.emit(NodeKind::Expr(kind), nargs, nreturns)
    }

    fn emit(&mut self, kind: NodeKind, nargs: usize, nreturns: usize) -> Result<(), DecompilerError> {
        if self.depth < nargs {
            return_decompiler_error!(
                "'{}' needs {} operands but only {} are on the stack",
                kind,
                nargs,
                self.depth;
                { DecompilationStage => "Tree Building" }
            );
        }

        let children = self.exp_stack.split_off(self.exp_stack.len() - nargs);
        self.depth -= nargs;
        self.push_result(Node::new(kind, children), nreturns)
    }

    fn push_result(&mut self, node: Node, nreturns: usize) -> Result<(), DecompilerError> {
        match nreturns {
            1 => {
                self.exp_stack.push(node);
                self.depth += 1;
            }
            0 => {
                let references = self.flush_pending(None);
                self.exp_stack.push(node);
                self.push_values(references);
            }
            _ => {
                let references = self.flush_pending(Some((node, nreturns)));
                self.push_values(references);
            }
        }
        Ok(())
    }

    /// A `br_if` out of the function returns the values under its condition
    /// when taken and leaves them on the stack otherwise, so they are bound
    /// to temporaries shared by both paths.
    fn conditional_return(&mut self, label: String) -> Result<(), DecompilerError> {
        let nargs = self.result_count + 1;
        if self.depth < nargs {
            return_decompiler_error!(
                "'br_if' out of the function needs {} operands but only {} are on the stack",
                nargs,
                self.depth;
                { DecompilationStage => "Tree Building" }
            );
        }

        let mut children = self.exp_stack.split_off(self.exp_stack.len() - 1);
        self.depth -= 1;
        let references = self.flush_pending(None);
        children.extend_from_slice(&references[references.len() - self.result_count..]);

        let target = LabelKind::Function;
        self.exp_stack
            .push(Node::expr(ExprKind::BrIf { label, target }, children));
        self.push_values(references);
        Ok(())
    }

    fn push_values(&mut self, values: Vec<Node>) {
        self.depth += values.len();
        self.exp_stack.extend(values);
    }

    /// Moves every pending value into a temporary, plus the results of
    /// `multi_value` when given. Values already held in temporaries are not
    /// bound again. Returns the references in stack order.
    fn flush_pending(&mut self, multi_value: Option<(Node, usize)>) -> Vec<Node> {
        let pending = self.exp_stack.split_off(self.exp_stack.len() - self.depth);
        self.depth = 0;

        let start = self.next_temporary;
        let mut flushed = Vec::new();
        let mut references = Vec::with_capacity(pending.len());

        for value in pending {
            if matches!(value.kind, NodeKind::FlushedVar { .. }) {
                references.push(value);
            } else {
                flushed.push(value);
                references.push(self.new_temporary());
            }
        }

        if let Some((node, nreturns)) = multi_value {
            flushed.push(node);
            for _ in 0..nreturns {
                references.push(self.new_temporary());
            }
        }

        if !flushed.is_empty() {
            let count = self.next_temporary - start;
            self.exp_stack
                .push(Node::new(NodeKind::FlushToVars { start, count }, flushed));
        }

        references
    }

    fn new_temporary(&mut self) -> Node {
        let index = self.next_temporary;
        self.next_temporary += 1;
        Node::leaf(NodeKind::FlushedVar { index })
    }

    // ============================================================
    // Locals
    // ============================================================

    fn local_set(&mut self, index: u32) -> Result<(), DecompilerError> {
        if !self.is_param(index) {
            match self.defined_locals.get(&index) {
                None => {
                    self.defined_locals.insert(index, self.current_scope);
                    let local = self.local_ref(index)?;
                    return self.emit(NodeKind::DeclInit(local), 1, 0);
                }
                Some(scope) if self.scopes_closed[*scope] => self.predeclare(index)?,
                Some(_) => {}
            }
        }

        let name = self.local_name(index)?;
        self.emit_expr(ExprKind::LocalSet(name), 1, 0)
    }

    fn local_tee(&mut self, index: u32) -> Result<(), DecompilerError> {
        let name = self.local_name(index)?;

        // Nothing else pending, so this is a plain set followed by a read
        if self.depth == 1 {
            self.local_set(index)?;
            return self.emit_expr(ExprKind::LocalTee(name), 0, 1);
        }

        if !self.is_param(index) {
            match self.defined_locals.get(&index) {
                None => self.predeclare(index)?,
                Some(scope) if self.scopes_closed[*scope] => self.predeclare(index)?,
                Some(_) => {}
            }
        }
        self.emit_expr(ExprKind::LocalTee(name), 1, 1)
    }

    fn note_local_read(&mut self, index: u32) -> Result<(), DecompilerError> {
        if self.is_param(index) {
            return Ok(());
        }
        match self.defined_locals.get(&index) {
            Some(scope) if !self.scopes_closed[*scope] => Ok(()),
            _ => self.predeclare(index),
        }
    }

    /// Hoists a declaration to the top of the function body.
    fn predeclare(&mut self, index: u32) -> Result<(), DecompilerError> {
        self.defined_locals.insert(index, FUNCTION_SCOPE);
        if self.predeclared.insert(index) {
            let local = self.local_ref(index)?;
            self.predeclarations.push(Node::leaf(NodeKind::Decl(local)));
        }
        Ok(())
    }

    fn is_param(&self, index: u32) -> bool {
        index < self.param_count
    }

    fn current_function(&self) -> Result<u32, DecompilerError> {
        match self.function_index {
            Some(index) => Ok(index),
            None => return_decompiler_error!("Local access outside of a function body"),
        }
    }

    fn local_name(&self, index: u32) -> Result<String, DecompilerError> {
        let function_index = self.current_function()?;
        Ok(self.context.local_name(function_index, index)?.to_owned())
    }

    fn local_ref(&self, index: u32) -> Result<LocalRef, DecompilerError> {
        let function_index = self.current_function()?;
        Ok(LocalRef {
            name: self.context.local_name(function_index, index)?.to_owned(),
            ty: self.context.local_type(function_index, index)?,
        })
    }

    fn global_name(&self, index: u32) -> Result<String, DecompilerError> {
        Ok(self
            .context
            .entity_name(EntityKind::Global, index)?
            .to_owned())
    }

    // ============================================================
    // Labels
    // ============================================================

    fn push_label(&mut self, kind: LabelKind) -> String {
        let prefix = match kind {
            LabelKind::Loop => "L_",
            LabelKind::If => "I_",
            _ => "B_",
        };
        let name = format!("{prefix}{}", index_to_alpha_name(self.label_counter));
        self.label_counter += 1;
        self.labels.push(Label {
            name: name.clone(),
            kind,
        });
        name
    }

    fn label_at(&self, relative_depth: u32) -> Result<(String, LabelKind), DecompilerError> {
        let position = self.labels.len().checked_sub(relative_depth as usize + 1);
        match position.and_then(|position| self.labels.get(position)) {
            Some(label) => Ok((label.name.clone(), label.kind)),
            None => return_decompiler_error!("Branch depth {} has no enclosing label", relative_depth),
        }
    }
}

// A local hoisted to the top of the function keeps its earlier
// initializations as plain assignments
fn demote_hoisted_declarations(node: &mut Node, hoisted: &FxHashSet<&str>) {
    let demoted = match &node.kind {
        NodeKind::DeclInit(local) if hoisted.contains(local.name.as_str()) => {
            Some(local.name.to_owned())
        }
        _ => None,
    };
    if let Some(name) = demoted {
        node.kind = NodeKind::Expr(ExprKind::LocalSet(name));
    }

    for child in &mut node.children {
        demote_hoisted_declarations(child, hoisted);
    }
}

#[cfg(test)]
#[path = "tests/tree_builder_tests.rs"]
mod tests;
