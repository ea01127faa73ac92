//! Infers struct and pointer shapes for locals used as memory addresses.
//!
//! Every load and store whose address is a plain read of a local is recorded
//! by offset. Once a function is tracked, each such local is classified:
//!
//!  - struct: two or more fields, one type per offset, no overlaps and no
//!    gap wider than the field that follows it
//!  - typed pointer: a single element type and alignment for every access
//!
//! Anything else keeps the raw `[offset]:type` rendering.

use crate::access_log;
use crate::decompiler::datatypes::MemoryType;
use crate::decompiler::tree::nodes::{ExprKind, Node, NodeKind};
use crate::decompiler::wasm_module::naming::index_to_alpha_name;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

/// Symbolic names for memory accesses, consulted while rendering.
pub trait AccessNaming {
    /// Field (`a`) or index (`[2]`) for an access at `offset` through `address`.
    fn access_name(&self, offset: u64, address: &Node) -> Option<String>;

    /// Type name that replaces a local's value type in its declaration.
    fn local_type_name(&self, local: &str) -> Option<String>;
}

/// Names nothing, every access renders raw.
pub struct NoAccessNaming;

impl AccessNaming for NoAccessNaming {
    fn access_name(&self, _offset: u64, _address: &Node) -> Option<String> {
        None
    }

    fn local_type_name(&self, _local: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AccessShape {
    memory_type: MemoryType,
    align: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LocalLayout {
    Struct {
        fields: FxHashMap<u64, String>,
        type_name: String,
    },
    Pointer {
        element_size: u64,
        type_name: String,
    },
}

#[derive(Debug, Default)]
pub struct AccessTracker {
    // Local name -> offset -> how it was accessed there
    accesses: FxHashMap<String, BTreeMap<u64, AccessShape>>,

    // Locals accessed with different shapes at the same offset
    mixed: FxHashSet<String>,
    layouts: FxHashMap<String, LocalLayout>,
}

impl AccessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every access in a function body and classifies the locals.
    pub fn track(&mut self, root: &Node) {
        self.record(root);
        self.check_layouts();
    }

    pub fn clear(&mut self) {
        self.accesses.clear();
        self.mixed.clear();
        self.layouts.clear();
    }

    fn record(&mut self, node: &Node) {
        if let NodeKind::Expr(ExprKind::Load(access) | ExprKind::Store(access)) = &node.kind {
            if let Some(local) = node.children.first().and_then(address_local) {
                let shape = AccessShape {
                    memory_type: access.memory_type,
                    align: access.align,
                };
                let offsets = self.accesses.entry(local.to_owned()).or_default();
                match offsets.get(&access.offset) {
                    Some(existing) if *existing != shape => {
                        self.mixed.insert(local.to_owned());
                    }
                    Some(_) => {}
                    None => {
                        offsets.insert(access.offset, shape);
                    }
                }
            }
        }

        for child in &node.children {
            self.record(child);
        }
    }

    fn check_layouts(&mut self) {
        for (local, offsets) in &self.accesses {
            if self.mixed.contains(local) {
                continue;
            }

            let layout = struct_layout(offsets).or_else(|| pointer_layout(offsets));
            if let Some(layout) = layout {
                access_log!(Dark Magenta local, " -> ", format!("{layout:?}"));
                self.layouts.insert(local.to_owned(), layout);
            }
        }
    }
}

impl AccessNaming for AccessTracker {
    fn access_name(&self, offset: u64, address: &Node) -> Option<String> {
        let local = address_local(address)?;
        match self.layouts.get(local)? {
            LocalLayout::Struct { fields, .. } => fields.get(&offset).cloned(),
            LocalLayout::Pointer { element_size, .. } => {
                if offset % element_size == 0 {
                    Some(format!("[{}]", offset / element_size))
                } else {
                    None
                }
            }
        }
    }

    fn local_type_name(&self, local: &str) -> Option<String> {
        match self.layouts.get(local)? {
            LocalLayout::Struct { type_name, .. } | LocalLayout::Pointer { type_name, .. } => {
                Some(type_name.to_owned())
            }
        }
    }
}

fn address_local(address: &Node) -> Option<&str> {
    match &address.kind {
        NodeKind::Expr(ExprKind::LocalGet(name) | ExprKind::LocalTee(name)) => Some(name.as_str()),
        _ => None,
    }
}

fn struct_layout(offsets: &BTreeMap<u64, AccessShape>) -> Option<LocalLayout> {
    if offsets.len() < 2 {
        return None;
    }

    let mut end_of_previous = 0;
    for (offset, shape) in offsets {
        let size = shape.memory_type.size_in_bytes();
        if *offset < end_of_previous || offset - end_of_previous >= size {
            return None;
        }
        end_of_previous = offset + size;
    }

    let mut fields = FxHashMap::default();
    let mut declared = Vec::with_capacity(offsets.len());
    for (position, (offset, shape)) in offsets.iter().enumerate() {
        let name = index_to_alpha_name(position as u64);
        declared.push(format!("{name}:{}", shape.memory_type));
        fields.insert(*offset, name);
    }

    Some(LocalLayout::Struct {
        fields,
        type_name: format!("{{ {} }}", declared.join(", ")),
    })
}

fn pointer_layout(offsets: &BTreeMap<u64, AccessShape>) -> Option<LocalLayout> {
    let mut shapes = offsets.values();
    let first = *shapes.next()?;
    if shapes.any(|shape| *shape != first) {
        return None;
    }

    let element_size = first.memory_type.size_in_bytes();
    let type_name = if first.align == element_size {
        format!("{}_ptr", first.memory_type)
    } else {
        format!("{}_ptr@{}", first.memory_type, first.align)
    };

    Some(LocalLayout::Pointer {
        element_size,
        type_name,
    })
}

#[cfg(test)]
#[path = "tests/access_tracking_tests.rs"]
mod tests;
