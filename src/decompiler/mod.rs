//! Turns a wasm binary into readable pseudo-source.
//!
//! Reading produces a [`WasmModule`], the tree builder turns each function
//! body into an expression tree, and the renderer lays trees out as lines.

pub mod datatypes;
pub mod module_assembler;

mod decompiler_messages {
    pub mod decompiler_errors;
    pub mod decompiler_warnings;
    pub mod dev_logging;
    pub mod display_messages;
}
pub use decompiler_messages::{decompiler_errors, decompiler_warnings, display_messages};

pub mod wasm_module {
    pub mod instructions;
    pub mod module_context;
    pub mod module_model;
    pub mod module_reader;
    pub mod naming;
    pub(crate) mod operators;
}

pub mod tree {
    pub mod nodes;
    pub mod tree_builder;
}

pub mod layout {
    pub mod layout_primitives;
    pub mod layout_value;
}

pub mod render {
    pub mod access_tracking;
    pub mod expression_decompiler;
    pub(crate) mod numeric_format;
    pub mod references;
}

use crate::decompiler::decompiler_errors::{DecompilerError, DecompilerMessages};
use crate::decompiler::decompiler_warnings::DecompilerWarning;
use crate::decompiler::layout::layout_primitives::Layout;
use crate::decompiler::module_assembler::{DecompiledModule, ModuleAssembler};
use crate::decompiler::wasm_module::module_context::ModuleContext;
use crate::decompiler::wasm_module::module_reader::read_module;
use crate::projects::settings::DecompileOptions;
use crate::{return_file_error, timer_log};
use std::fs;
use std::path::Path;
use std::time::Instant;

pub use wasm_module::module_model::WasmModule;

/// A decompiled module and whatever was noticed while producing it.
#[derive(Debug)]
pub struct Decompilation {
    pub module: DecompiledModule,
    pub warnings: Vec<DecompilerWarning>,
}

pub fn decompile_bytes(
    bytes: &[u8],
    options: &DecompileOptions,
) -> Result<Decompilation, DecompilerMessages> {
    let options = options.validated().map_err(DecompilerMessages::from_error)?;

    let time = Instant::now();
    let module = read_module(bytes).map_err(DecompilerMessages::from_error)?;
    timer_log!(time, "Module read in: ");

    decompile_module(&module, &options).map_err(DecompilerMessages::from_error)
}

pub fn decompile_module(
    module: &WasmModule,
    options: &DecompileOptions,
) -> Result<Decompilation, DecompilerError> {
    let context = ModuleContext::new(module);
    let assembler = ModuleAssembler::new(&context, Layout::new(options));
    let (module, warnings) = assembler.assemble()?;

    Ok(Decompilation { module, warnings })
}

pub fn decompile_file(
    path: &Path,
    options: &DecompileOptions,
) -> Result<Decompilation, DecompilerMessages> {
    let bytes = read_wasm_file(path).map_err(DecompilerMessages::from_error)?;

    decompile_bytes(&bytes, options).map_err(|mut messages| {
        messages.errors = messages
            .errors
            .into_iter()
            .map(|error| error.with_file_path(path.to_path_buf()))
            .collect();
        messages
    })
}

fn read_wasm_file(path: &Path) -> Result<Vec<u8>, DecompilerError> {
    if !path.is_file() {
        return_file_error!(path, "No wasm file found at '{}'", path.display());
    }

    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) => return_file_error!(path, "Could not read '{}': {e}", path.display()),
    }
}
