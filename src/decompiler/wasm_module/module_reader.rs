//! Reads a wasm binary into the owned [`WasmModule`] model.
//!
//! The module is validated up front, so the reader only has to reject
//! features the decompiler can't render, never malformed input.

use crate::decompiler::datatypes::ValueType;
use crate::decompiler::decompiler_errors::DecompilerError;
use crate::decompiler::wasm_module::instructions::{BlockSignature, Instruction};
use crate::decompiler::wasm_module::module_model::{
    DataSegment, EntityKind, ExportDef, FunctionDef, GlobalDef, ImportInfo, MemoryDef,
    NameSectionNames, TableDef, WasmModule,
};
use crate::decompiler::wasm_module::operators::{FlatOperator, classify_operator};
use crate::{return_decompiler_error, return_unsupported_error};
use wasmparser::{
    BinaryReaderError, BlockType, DataKind, ExternalKind, FuncType, FunctionBody, KnownCustom,
    Name, NameMap, NameSectionReader, OperatorsReader, Parser, Payload, RefType, TypeRef, ValType,
};

pub fn read_module(bytes: &[u8]) -> Result<WasmModule, DecompilerError> {
    wasmparser::validate(bytes)?;

    let mut module = WasmModule::default();
    let mut imported_functions = 0;
    let mut bodies_read = 0;

    for payload in Parser::new(0).parse_all(bytes) {
        match payload? {
            Payload::TypeSection(reader) => {
                for func_type in reader.into_iter_err_on_gc_types() {
                    module.types.push(signature_of(&func_type?)?);
                }
            }

            Payload::ImportSection(reader) => {
                for import in reader.into_imports() {
                    let import = import?;
                    let info = Some(ImportInfo {
                        module: import.module.to_owned(),
                        field: import.name.to_owned(),
                    });

                    match import.ty {
                        TypeRef::Func(type_index) => {
                            module.functions.push(FunctionDef {
                                signature: type_signature(&module.types, type_index)?,
                                import: info,
                                locals: Vec::new(),
                                body: Vec::new(),
                            });
                            imported_functions += 1;
                        }
                        TypeRef::Table(table) => module.tables.push(TableDef {
                            element_type: ref_type(table.element_type)?,
                            initial: table.initial,
                            maximum: table.maximum,
                            import: info,
                        }),
                        TypeRef::Memory(memory) => module.memories.push(MemoryDef {
                            initial: memory.initial,
                            maximum: memory.maximum,
                            import: info,
                        }),
                        TypeRef::Global(global) => module.globals.push(GlobalDef {
                            ty: value_type(global.content_type)?,
                            mutable: global.mutable,
                            import: info,
                            init: Vec::new(),
                        }),
                        _ => return_unsupported_error!(format!(
                            "import of {}.{}",
                            import.module, import.name
                        )),
                    }
                }
            }

            Payload::FunctionSection(reader) => {
                for type_index in reader {
                    module.functions.push(FunctionDef {
                        signature: type_signature(&module.types, type_index?)?,
                        import: None,
                        locals: Vec::new(),
                        body: Vec::new(),
                    });
                }
            }

            Payload::TableSection(reader) => {
                for table in reader {
                    let table = table?;
                    module.tables.push(TableDef {
                        element_type: ref_type(table.ty.element_type)?,
                        initial: table.ty.initial,
                        maximum: table.ty.maximum,
                        import: None,
                    });
                }
            }

            Payload::MemorySection(reader) => {
                for memory in reader {
                    let memory = memory?;
                    module.memories.push(MemoryDef {
                        initial: memory.initial,
                        maximum: memory.maximum,
                        import: None,
                    });
                }
            }

            Payload::GlobalSection(reader) => {
                for global in reader {
                    let global = global?;
                    let init =
                        read_instructions(global.init_expr.get_operators_reader(), &module.types)?;
                    module.globals.push(GlobalDef {
                        ty: value_type(global.ty.content_type)?,
                        mutable: global.ty.mutable,
                        import: None,
                        init,
                    });
                }
            }

            Payload::ExportSection(reader) => {
                for export in reader {
                    let export = export?;
                    let kind = match export.kind {
                        ExternalKind::Func => EntityKind::Function,
                        ExternalKind::Table => EntityKind::Table,
                        ExternalKind::Memory => EntityKind::Memory,
                        ExternalKind::Global => EntityKind::Global,
                        _ => continue,
                    };
                    module.exports.push(ExportDef {
                        name: export.name.to_owned(),
                        kind,
                        index: export.index,
                    });
                }
            }

            Payload::DataSection(reader) => {
                for data in reader {
                    let data = data?;
                    let offset = match data.kind {
                        DataKind::Active { offset_expr, .. } => Some(read_instructions(
                            offset_expr.get_operators_reader(),
                            &module.types,
                        )?),
                        DataKind::Passive => None,
                    };
                    module.data_segments.push(DataSegment {
                        offset,
                        bytes: data.data.to_vec(),
                    });
                }
            }

            Payload::CodeSectionEntry(body) => {
                let function_index = imported_functions + bodies_read;
                bodies_read += 1;

                let (locals, instructions) = read_function_body(&body, &module.types)?;
                let Some(function) = module.functions.get_mut(function_index) else {
                    return_decompiler_error!(
                        "Code section entry {} has no matching function declaration",
                        function_index
                    );
                };
                function.locals = locals;
                function.body = instructions;
            }

            Payload::CustomSection(reader) => {
                if let KnownCustom::Name(name_reader) = reader.as_known() {
                    // A broken name section only costs us names, never the module
                    let mut names = NameSectionNames::default();
                    if read_names(name_reader, &mut names).is_ok() {
                        module.names = names;
                    }
                }
            }

            _ => {}
        }
    }

    Ok(module)
}

fn read_function_body(
    body: &FunctionBody,
    types: &[BlockSignature],
) -> Result<(Vec<ValueType>, Vec<Instruction>), DecompilerError> {
    let mut locals = Vec::new();
    for local in body.get_locals_reader()? {
        let (count, ty) = local?;
        let ty = value_type(ty)?;
        locals.extend(std::iter::repeat_n(ty, count as usize));
    }

    let instructions = read_instructions(body.get_operators_reader()?, types)?;
    Ok((locals, instructions))
}

enum Opener {
    Root,
    Block,
    Loop,
    If,
}

struct OpenFrame {
    opener: Opener,
    signature: BlockSignature,
    body: Vec<Instruction>,

    // Set once an `else` is seen, `body` then collects the else arm
    then_body: Option<Vec<Instruction>>,
}

impl OpenFrame {
    fn new(opener: Opener, signature: BlockSignature) -> Self {
        OpenFrame {
            opener,
            signature,
            body: Vec::new(),
            then_body: None,
        }
    }
}

fn current_frame(frames: &mut [OpenFrame]) -> Result<&mut OpenFrame, DecompilerError> {
    match frames.last_mut() {
        Some(frame) => Ok(frame),
        None => return_decompiler_error!("Operator found after the end of the body"),
    }
}

/// Folds a flat operator stream into nested instruction bodies.
///
/// Used for function bodies and constant expressions alike; both end with
/// the `end` that closes the implicit outer block.
pub(crate) fn read_instructions(
    mut reader: OperatorsReader,
    types: &[BlockSignature],
) -> Result<Vec<Instruction>, DecompilerError> {
    let mut frames = vec![OpenFrame::new(Opener::Root, BlockSignature::default())];

    while !reader.eof() {
        let operator = reader.read()?;
        match classify_operator(&operator)? {
            FlatOperator::Instruction(instruction) => {
                current_frame(&mut frames)?.body.push(instruction)
            }
            FlatOperator::Block(block_type) => frames.push(OpenFrame::new(
                Opener::Block,
                block_signature(block_type, types)?,
            )),
            FlatOperator::Loop(block_type) => frames.push(OpenFrame::new(
                Opener::Loop,
                block_signature(block_type, types)?,
            )),
            FlatOperator::If(block_type) => frames.push(OpenFrame::new(
                Opener::If,
                block_signature(block_type, types)?,
            )),
            FlatOperator::Else => {
                let frame = current_frame(&mut frames)?;
                frame.then_body = Some(std::mem::take(&mut frame.body));
            }
            FlatOperator::End => {
                let Some(frame) = frames.pop() else {
                    return_decompiler_error!("Unbalanced 'end' in operator stream");
                };

                let instruction = match frame.opener {
                    Opener::Root => return Ok(frame.body),
                    Opener::Block => Instruction::Block {
                        signature: frame.signature,
                        body: frame.body,
                    },
                    Opener::Loop => Instruction::Loop {
                        signature: frame.signature,
                        body: frame.body,
                    },
                    // An explicit but empty else is the same as none
                    Opener::If => match frame.then_body {
                        Some(then_body) => Instruction::If {
                            signature: frame.signature,
                            then_body,
                            else_body: Some(frame.body).filter(|body| !body.is_empty()),
                        },
                        None => Instruction::If {
                            signature: frame.signature,
                            then_body: frame.body,
                            else_body: None,
                        },
                    },
                };

                current_frame(&mut frames)?.body.push(instruction);
            }
        }
    }

    return_decompiler_error!("Operator stream ended before the body was closed")
}

fn read_names(
    reader: NameSectionReader,
    names: &mut NameSectionNames,
) -> Result<(), BinaryReaderError> {
    for subsection in reader {
        match subsection? {
            Name::Function(map) => read_name_map(map, EntityKind::Function, names)?,
            Name::Global(map) => read_name_map(map, EntityKind::Global, names)?,
            Name::Table(map) => read_name_map(map, EntityKind::Table, names)?,
            Name::Memory(map) => read_name_map(map, EntityKind::Memory, names)?,
            Name::Data(map) => read_name_map(map, EntityKind::Data, names)?,
            Name::Local(functions) => {
                for function in functions {
                    let function = function?;
                    for naming in function.names {
                        let naming = naming?;
                        names
                            .locals
                            .insert((function.index, naming.index), naming.name.to_owned());
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn read_name_map(
    map: NameMap,
    kind: EntityKind,
    names: &mut NameSectionNames,
) -> Result<(), BinaryReaderError> {
    for naming in map {
        let naming = naming?;
        names
            .entities
            .insert((kind, naming.index), naming.name.to_owned());
    }
    Ok(())
}

fn signature_of(func_type: &FuncType) -> Result<BlockSignature, DecompilerError> {
    Ok(BlockSignature {
        params: func_type
            .params()
            .iter()
            .map(|ty| value_type(*ty))
            .collect::<Result<_, _>>()?,
        results: func_type
            .results()
            .iter()
            .map(|ty| value_type(*ty))
            .collect::<Result<_, _>>()?,
    })
}

fn type_signature(
    types: &[BlockSignature],
    type_index: u32,
) -> Result<BlockSignature, DecompilerError> {
    match types.get(type_index as usize) {
        Some(signature) => Ok(signature.clone()),
        None => return_decompiler_error!("Type index {} is out of range", type_index),
    }
}

fn block_signature(
    block_type: BlockType,
    types: &[BlockSignature],
) -> Result<BlockSignature, DecompilerError> {
    match block_type {
        BlockType::Empty => Ok(BlockSignature::default()),
        BlockType::Type(ty) => Ok(BlockSignature {
            params: Vec::new(),
            results: vec![value_type(ty)?],
        }),
        BlockType::FuncType(type_index) => type_signature(types, type_index),
    }
}

pub(crate) fn value_type(ty: ValType) -> Result<ValueType, DecompilerError> {
    match ty {
        ValType::I32 => Ok(ValueType::I32),
        ValType::I64 => Ok(ValueType::I64),
        ValType::F32 => Ok(ValueType::F32),
        ValType::F64 => Ok(ValueType::F64),
        ValType::V128 => Ok(ValueType::V128),
        ValType::Ref(ref_ty) => ref_type(ref_ty),
    }
}

fn ref_type(ref_ty: RefType) -> Result<ValueType, DecompilerError> {
    if ref_ty.is_func_ref() {
        Ok(ValueType::FuncRef)
    } else if ref_ty.is_extern_ref() {
        Ok(ValueType::ExternRef)
    } else {
        return_unsupported_error!(format!("reference type {ref_ty:?}"))
    }
}

#[cfg(test)]
#[path = "tests/module_reader_tests.rs"]
mod tests;
