//! Owned model of a validated wasm module.
//!
//! Index spaces follow wasm: imported entities come first, in the order the
//! import section lists them, then the module's own definitions.

use crate::decompiler::datatypes::ValueType;
use crate::decompiler::wasm_module::instructions::{BlockSignature, Instruction};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Function,
    Table,
    Memory,
    Global,
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    pub module: String,
    pub field: String,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub signature: BlockSignature,
    pub import: Option<ImportInfo>,

    // Declared locals only, parameters live in the signature
    pub locals: Vec<ValueType>,
    pub body: Vec<Instruction>,
}

impl FunctionDef {
    pub fn local_type(&self, index: u32) -> Option<ValueType> {
        let index = index as usize;
        let params = &self.signature.params;
        if index < params.len() {
            return Some(params[index]);
        }
        self.locals.get(index - params.len()).copied()
    }

    pub fn local_count(&self) -> usize {
        self.signature.params.len() + self.locals.len()
    }
}

#[derive(Debug, Clone)]
pub struct GlobalDef {
    pub ty: ValueType,
    pub mutable: bool,
    pub import: Option<ImportInfo>,
    pub init: Vec<Instruction>,
}

#[derive(Debug, Clone)]
pub struct TableDef {
    pub element_type: ValueType,
    pub initial: u64,
    pub maximum: Option<u64>,
    pub import: Option<ImportInfo>,
}

#[derive(Debug, Clone)]
pub struct MemoryDef {
    pub initial: u64,
    pub maximum: Option<u64>,
    pub import: Option<ImportInfo>,
}

#[derive(Debug, Clone)]
pub struct DataSegment {
    // None for passive segments
    pub offset: Option<Vec<Instruction>>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDef {
    pub name: String,
    pub kind: EntityKind,
    pub index: u32,
}

/// Raw names from the `name` custom section, before sanitizing.
#[derive(Debug, Clone, Default)]
pub struct NameSectionNames {
    pub entities: FxHashMap<(EntityKind, u32), String>,
    pub locals: FxHashMap<(u32, u32), String>,
}

#[derive(Debug, Clone, Default)]
pub struct WasmModule {
    pub types: Vec<BlockSignature>,
    pub functions: Vec<FunctionDef>,
    pub globals: Vec<GlobalDef>,
    pub tables: Vec<TableDef>,
    pub memories: Vec<MemoryDef>,
    pub data_segments: Vec<DataSegment>,
    pub exports: Vec<ExportDef>,
    pub names: NameSectionNames,
}

impl WasmModule {
    pub fn entity_count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Function => self.functions.len(),
            EntityKind::Table => self.tables.len(),
            EntityKind::Memory => self.memories.len(),
            EntityKind::Global => self.globals.len(),
            EntityKind::Data => self.data_segments.len(),
        }
    }

    pub fn import_of(&self, kind: EntityKind, index: u32) -> Option<&ImportInfo> {
        let index = index as usize;
        match kind {
            EntityKind::Function => self.functions.get(index)?.import.as_ref(),
            EntityKind::Table => self.tables.get(index)?.import.as_ref(),
            EntityKind::Memory => self.memories.get(index)?.import.as_ref(),
            EntityKind::Global => self.globals.get(index)?.import.as_ref(),
            EntityKind::Data => None,
        }
    }
}
