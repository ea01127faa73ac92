//! Read-only view of a module and its resolved names, shared by the tree
//! builder and the module assembler.

use crate::decompiler::datatypes::ValueType;
use crate::decompiler::decompiler_errors::DecompilerError;
use crate::decompiler::wasm_module::instructions::BlockSignature;
use crate::decompiler::wasm_module::module_model::{EntityKind, FunctionDef, WasmModule};
use crate::decompiler::wasm_module::naming::ModuleNames;
use crate::return_decompiler_error;

/// Import/export status of module entities.
pub trait LinkageQuery {
    fn is_imported(&self, kind: EntityKind, index: u32) -> bool;
    fn is_exported(&self, kind: EntityKind, index: u32) -> bool;
}

pub struct ModuleContext<'a> {
    pub module: &'a WasmModule,
    pub names: ModuleNames,
}

impl<'a> ModuleContext<'a> {
    pub fn new(module: &'a WasmModule) -> Self {
        ModuleContext {
            module,
            names: ModuleNames::resolve(module),
        }
    }

    pub fn entity_name(&self, kind: EntityKind, index: u32) -> Result<&str, DecompilerError> {
        match self.names.entity(kind, index) {
            Some(name) => Ok(name),
            None => return_decompiler_error!("No {:?} with index {} to name", kind, index),
        }
    }

    pub fn local_name(&self, function_index: u32, local_index: u32) -> Result<&str, DecompilerError> {
        match self.names.local(function_index, local_index) {
            Some(name) => Ok(name),
            None => return_decompiler_error!(
                "Function {} has no local with index {}",
                function_index,
                local_index
            ),
        }
    }

    pub fn function(&self, index: u32) -> Result<&'a FunctionDef, DecompilerError> {
        match self.module.functions.get(index as usize) {
            Some(function) => Ok(function),
            None => return_decompiler_error!("Function index {} is out of range", index),
        }
    }

    pub fn type_signature(&self, type_index: u32) -> Result<&'a BlockSignature, DecompilerError> {
        match self.module.types.get(type_index as usize) {
            Some(signature) => Ok(signature),
            None => return_decompiler_error!("Type index {} is out of range", type_index),
        }
    }

    pub fn local_type(&self, function_index: u32, local_index: u32) -> Result<ValueType, DecompilerError> {
        match self.function(function_index)?.local_type(local_index) {
            Some(ty) => Ok(ty),
            None => return_decompiler_error!(
                "Function {} has no local with index {}",
                function_index,
                local_index
            ),
        }
    }
}

impl LinkageQuery for ModuleContext<'_> {
    fn is_imported(&self, kind: EntityKind, index: u32) -> bool {
        self.module.import_of(kind, index).is_some()
    }

    fn is_exported(&self, kind: EntityKind, index: u32) -> bool {
        self.module
            .exports
            .iter()
            .any(|export| export.kind == kind && export.index == index)
    }
}
