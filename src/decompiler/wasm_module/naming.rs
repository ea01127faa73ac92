//! Resolves every entity and local in a module to a unique identifier.

use crate::decompiler::wasm_module::module_model::{EntityKind, WasmModule};
use rustc_hash::{FxHashMap, FxHashSet};

/// Short base-26 name for an index, least significant letter first.
///
/// `0 -> a`, `25 -> z`, `26 -> aa`, `27 -> ba`.
pub fn index_to_alpha_name(index: u64) -> String {
    let mut name = String::new();
    let mut index = index;
    loop {
        name.push(char::from(b'a' + (index % 26) as u8));
        index /= 26;
        if index == 0 {
            break;
        }
        index -= 1;
    }
    name
}

pub fn generated_prefix(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Function => "f_",
        EntityKind::Global => "g_",
        EntityKind::Table => "T_",
        EntityKind::Memory => "M_",
        EntityKind::Data => "d_",
    }
}

/// Rewrites a name into `[A-Za-z0-9_]+` that doesn't start with a digit.
/// Returns the name unchanged when it is already an identifier.
pub fn sanitize_identifier(name: &str) -> String {
    let mut identifier: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if identifier.is_empty() || identifier.starts_with(|c: char| c.is_ascii_digit()) {
        identifier.insert(0, '_');
    }

    identifier
}

#[derive(Default)]
struct UniqueNames {
    taken: FxHashSet<String>,
}

impl UniqueNames {
    fn claim(&mut self, name: String, index: u64) -> String {
        let mut unique = name;
        while self.taken.contains(&unique) {
            unique = format!("{unique}_{index}");
        }
        self.taken.insert(unique.clone());
        unique
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModuleNames {
    entities: FxHashMap<EntityKind, Vec<String>>,

    // Per function, parameters first then declared locals
    locals: Vec<Vec<String>>,

    /// How many names had to be rewritten to become identifiers
    pub sanitized_count: usize,
}

impl ModuleNames {
    pub fn resolve(module: &WasmModule) -> ModuleNames {
        let mut names = ModuleNames::default();

        for kind in [
            EntityKind::Function,
            EntityKind::Global,
            EntityKind::Table,
            EntityKind::Memory,
            EntityKind::Data,
        ] {
            let mut unique = UniqueNames::default();
            let mut resolved = Vec::with_capacity(module.entity_count(kind));

            for index in 0..module.entity_count(kind) as u32 {
                let candidate = preferred_name(module, kind, index);
                let identifier = names.sanitize(&candidate);
                resolved.push(unique.claim(identifier, index as u64));
            }

            names.entities.insert(kind, resolved);
        }

        for (function_index, function) in module.functions.iter().enumerate() {
            let mut unique = UniqueNames::default();
            let mut resolved = Vec::with_capacity(function.local_count());

            for local_index in 0..function.local_count() as u32 {
                let candidate = match module.names.locals.get(&(function_index as u32, local_index)) {
                    Some(name) => name.to_owned(),
                    None => index_to_alpha_name(local_index as u64),
                };
                let identifier = names.sanitize(&candidate);
                resolved.push(unique.claim(identifier, local_index as u64));
            }

            names.locals.push(resolved);
        }

        names
    }

    fn sanitize(&mut self, candidate: &str) -> String {
        let identifier = sanitize_identifier(candidate);
        if identifier != candidate {
            self.sanitized_count += 1;
        }
        identifier
    }

    pub fn entity(&self, kind: EntityKind, index: u32) -> Option<&str> {
        self.entities
            .get(&kind)?
            .get(index as usize)
            .map(String::as_str)
    }

    pub fn local(&self, function_index: u32, local_index: u32) -> Option<&str> {
        self.locals
            .get(function_index as usize)?
            .get(local_index as usize)
            .map(String::as_str)
    }
}

// Name section first, then the first export, then the import path
fn preferred_name(module: &WasmModule, kind: EntityKind, index: u32) -> String {
    if let Some(name) = module.names.entities.get(&(kind, index)) {
        return name.to_owned();
    }

    if let Some(export) = module
        .exports
        .iter()
        .find(|export| export.kind == kind && export.index == index)
    {
        return export.name.to_owned();
    }

    if let Some(import) = module.import_of(kind, index) {
        return format!("{}_{}", import.module, import.field);
    }

    format!(
        "{}{}",
        generated_prefix(kind),
        index_to_alpha_name(index as u64)
    )
}

#[cfg(test)]
#[path = "tests/naming_tests.rs"]
mod tests;
