//! ============================================================
//!                     Decompiler Node Tree
//! ============================================================
//! One typed tree per function body (or constant expression), built from the
//! structured instruction list and consumed by the expression decompiler.
//!
//!  - Every node owns its children in evaluation order
//!  - Children counts match the operation's arity
//!  - Names are already resolved, nothing here points back into the module
//!
//! Values that cross a statement boundary are bound to numbered temporaries:
//! a `FlushToVars` node declares `count` of them starting at `start`, and
//! each later use is a `FlushedVar` reference.

use crate::decompiler::datatypes::ValueType;
use crate::decompiler::wasm_module::instructions::{ConstValue, MemoryAccess};
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, children: Vec<Node>) -> Self {
        Node { kind, children }
    }

    pub fn leaf(kind: NodeKind) -> Self {
        Node {
            kind,
            children: Vec::new(),
        }
    }

    pub fn expr(kind: ExprKind, children: Vec<Node>) -> Self {
        Node::new(NodeKind::Expr(kind), children)
    }
}

/// A local variable as the declaration nodes see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRef {
    pub name: String,
    pub ty: ValueType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Expr(ExprKind),
    Statements,
    FlushToVars { start: u32, count: u32 },
    FlushedVar { index: u32 },
    Decl(LocalRef),
    DeclInit(LocalRef),
    EndReturn,
}

/// What a branch jumps to, decides between `break` and `continue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Block,
    Loop,
    If,
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Const(ConstValue),

    LocalGet(String),
    LocalSet(String),
    LocalTee(String),
    GlobalGet(String),
    GlobalSet(String),

    // Carry the operator token, not the instruction name
    Unary(&'static str),
    Binary(&'static str),
    Compare(&'static str),
    Convert(&'static str),

    Load(MemoryAccess),
    Store(MemoryAccess),

    Block(String),
    Loop(String),
    If,
    Br { label: String, target: LabelKind },
    BrIf { label: String, target: LabelKind },
    Return,
    Drop,
    Call(String),
    Other(String),
}

// ============================================================
// Tree display, used by the show_tree logging
// ============================================================

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.fmt_indented(f, 0)
    }
}

impl Node {
    fn fmt_indented(&self, f: &mut Formatter<'_>, depth: usize) -> FmtResult {
        writeln!(f, "{}{}", "  ".repeat(depth), self.kind)?;
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            NodeKind::Expr(kind) => write!(f, "{kind}"),
            NodeKind::Statements => f.write_str("statements"),
            NodeKind::FlushToVars { start, count } => write!(f, "flush t{start}..+{count}"),
            NodeKind::FlushedVar { index } => write!(f, "t{index}"),
            NodeKind::Decl(local) => write!(f, "decl {}:{}", local.name, local.ty),
            NodeKind::DeclInit(local) => write!(f, "decl_init {}:{}", local.name, local.ty),
            NodeKind::EndReturn => f.write_str("end_return"),
        }
    }
}

impl Display for ExprKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ExprKind::Const(value) => write!(f, "const {value:?}"),
            ExprKind::LocalGet(name) => write!(f, "local.get {name}"),
            ExprKind::LocalSet(name) => write!(f, "local.set {name}"),
            ExprKind::LocalTee(name) => write!(f, "local.tee {name}"),
            ExprKind::GlobalGet(name) => write!(f, "global.get {name}"),
            ExprKind::GlobalSet(name) => write!(f, "global.set {name}"),
            ExprKind::Unary(token)
            | ExprKind::Binary(token)
            | ExprKind::Compare(token)
            | ExprKind::Convert(token) => f.write_str(token),
            ExprKind::Load(access) | ExprKind::Store(access) => {
                write!(f, "{} offset={}", access.name, access.offset)
            }
            ExprKind::Block(label) => write!(f, "block {label}"),
            ExprKind::Loop(label) => write!(f, "loop {label}"),
            ExprKind::If => f.write_str("if"),
            ExprKind::Br { label, .. } => write!(f, "br {label}"),
            ExprKind::BrIf { label, .. } => write!(f, "br_if {label}"),
            ExprKind::Return => f.write_str("return"),
            ExprKind::Drop => f.write_str("drop"),
            ExprKind::Call(callee) => write!(f, "call {callee}"),
            ExprKind::Other(name) => f.write_str(name),
        }
    }
}
