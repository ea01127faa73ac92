//! Names of temporaries and locals, and the suffix a load or store appends
//! to its address.

use crate::decompiler::datatypes::ValueType;
use crate::decompiler::render::access_tracking::AccessNaming;
use crate::decompiler::wasm_module::instructions::MemoryAccess;

pub fn temporary_name(index: u32) -> String {
    format!("t{index}")
}

/// Operator tokens that are instruction names can't keep their dots.
pub fn operator_token(token: &str) -> String {
    token.replace('.', "_")
}

/// `name:type`, with the tracked struct or pointer type when there is one.
pub fn local_declaration(name: &str, ty: ValueType, access: &dyn AccessNaming) -> String {
    match access.local_type_name(name) {
        Some(type_name) => format!("{name}:{type_name}"),
        None => format!("{name}:{}", ty.decompiled_name()),
    }
}

/// `.field`, `[index]`, or the raw `[offset]:type@align` form.
pub fn memory_access_suffix(access: &MemoryAccess, symbolic: Option<String>) -> String {
    match symbolic {
        Some(index) if index.starts_with('[') => index,
        Some(field) => format!(".{field}"),
        None if access.is_naturally_aligned() => {
            format!("[{}]:{}", access.offset, access.memory_type)
        }
        None => format!(
            "[{}]:{}@{}",
            access.offset, access.memory_type, access.align
        ),
    }
}
