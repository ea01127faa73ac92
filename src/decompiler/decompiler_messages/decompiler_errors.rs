use crate::decompiler::decompiler_warnings::DecompilerWarning;
use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

// The final set of errors and warnings emitted from a decompiler run
#[derive(Debug, Default)]
pub struct DecompilerMessages {
    pub errors: Vec<DecompilerError>,
    pub warnings: Vec<DecompilerWarning>,
}

impl DecompilerMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_error(error: DecompilerError) -> Self {
        DecompilerMessages {
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum ErrorMetaDataKey {
    DecompilationStage,
    Feature,
    ExpectedCount,
    FoundCount,

    // Optional suggestions
    PrimarySuggestion,
}

/// Where in the module an error came from.
///
/// Wasm modules have no source text, so locations name the file being read,
/// the function (by resolved name) and the instruction position inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLocation {
    pub file: Option<PathBuf>,
    pub function: Option<String>,
    pub instruction: Option<usize>,
}

impl Display for ErrorLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut wrote = false;
        if let Some(file) = &self.file {
            write!(f, "{}", file.display())?;
            wrote = true;
        }
        if let Some(function) = &self.function {
            if wrote {
                f.write_str(" ")?;
            }
            write!(f, "function '{function}'")?;
            wrote = true;
        }
        if let Some(instruction) = self.instruction {
            if wrote {
                f.write_str(" ")?;
            }
            write!(f, "instruction #{instruction}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DecompilerError {
    pub msg: String,
    pub location: ErrorLocation,
    pub error_type: ErrorType,

    // Structured details for tooling that wants more than the message
    pub metadata: FxHashMap<ErrorMetaDataKey, String>,
}

impl DecompilerError {
    pub fn new(msg: impl Into<String>, location: ErrorLocation, error_type: ErrorType) -> Self {
        DecompilerError {
            msg: msg.into(),
            location,
            error_type,
            metadata: FxHashMap::default(),
        }
    }

    /// Internal invariant violation. Always a decompiler bug, never bad input.
    pub fn decompiler_error(msg: impl Into<String>) -> Self {
        DecompilerError::new(msg, ErrorLocation::default(), ErrorType::Decompiler)
    }

    pub fn file_error(path: &std::path::Path, msg: impl Into<String>) -> Self {
        DecompilerError::new(
            msg,
            ErrorLocation {
                file: Some(path.to_path_buf()),
                ..Default::default()
            },
            ErrorType::File,
        )
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        DecompilerError::new(msg, ErrorLocation::default(), ErrorType::Config)
    }

    pub fn with_file_path(mut self, file_path: PathBuf) -> Self {
        self.location.file = Some(file_path);
        self
    }

    /// Fills in the function name unless a more specific one is already set.
    pub fn with_function(mut self, name: &str) -> Self {
        if self.location.function.is_none() {
            self.location.function = Some(name.to_owned());
        }
        self
    }

    /// Records the position of the failing instruction inside its enclosing body.
    pub fn at_instruction(mut self, position: usize) -> Self {
        if self.location.instruction.is_none() {
            self.location.instruction = Some(position);
        }
        self
    }

    pub fn new_metadata_entry(&mut self, key: ErrorMetaDataKey, value: impl Into<String>) {
        self.metadata.insert(key, value.into());
    }
}

impl Display for DecompilerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", error_type_to_str(&self.error_type), self.msg)
    }
}

impl From<wasmparser::BinaryReaderError> for DecompilerError {
    fn from(error: wasmparser::BinaryReaderError) -> Self {
        let mut decompiler_error = DecompilerError::new(
            error.message().to_owned(),
            ErrorLocation::default(),
            ErrorType::Wasm,
        );
        decompiler_error
            .new_metadata_entry(ErrorMetaDataKey::DecompilationStage, "Module Reading");
        decompiler_error.new_metadata_entry(
            ErrorMetaDataKey::PrimarySuggestion,
            format!("Byte offset {:#x} is malformed", error.offset()),
        );
        decompiler_error
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ErrorType {
    File,
    Config,
    Wasm,
    Unsupported,
    Decompiler,
}

pub fn error_type_to_str(e_type: &ErrorType) -> &'static str {
    match e_type {
        ErrorType::File => "File Error",
        ErrorType::Config => "Malformed Config",
        ErrorType::Wasm => "Invalid Wasm Module",
        ErrorType::Unsupported => "Unsupported Feature",
        ErrorType::Decompiler => "Decompiler Bug",
    }
}

/// Returns a new DecompilerError for internal invariant violations.
///
/// These indicate a bug in the tree builder or the expression decompiler,
/// not a problem with the module being read.
///
/// Usage:
/// `return_decompiler_error!("expected {} children", 2; { DecompilationStage => "Rendering" })`
#[macro_export]
macro_rules! return_decompiler_error {
    // Variant with format string, arguments, and metadata (with semicolon separator)
    ($fmt:expr, $($arg:expr),+ ; { $( $key:ident => $value:expr ),* $(,)? }) => {{
        let mut error = $crate::decompiler::decompiler_errors::DecompilerError::decompiler_error(
            format!($fmt, $($arg),+),
        );
        $(
            error.new_metadata_entry(
                $crate::decompiler::decompiler_errors::ErrorMetaDataKey::$key,
                $value,
            );
        )*
        return Err(error);
    }};
    // Variant with format string and arguments (no metadata)
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{
        return Err($crate::decompiler::decompiler_errors::DecompilerError::decompiler_error(
            format!($fmt, $($arg),+),
        ));
    }};
    // Variant with message and metadata (with semicolon separator)
    ($msg:expr ; { $( $key:ident => $value:expr ),* $(,)? }) => {{
        let mut error = $crate::decompiler::decompiler_errors::DecompilerError::decompiler_error($msg);
        $(
            error.new_metadata_entry(
                $crate::decompiler::decompiler_errors::ErrorMetaDataKey::$key,
                $value,
            );
        )*
        return Err(error);
    }};
    // Simple variant with just message (no metadata)
    ($msg:expr) => {{
        return Err($crate::decompiler::decompiler_errors::DecompilerError::decompiler_error($msg));
    }};
}

/// Returns a new DecompilerError for operators or module features the
/// decompiler has no rendering for.
#[macro_export]
macro_rules! return_unsupported_error {
    ($feature:expr) => {{
        let mut error = $crate::decompiler::decompiler_errors::DecompilerError::new(
            format!("'{}' is not supported by the decompiler", $feature),
            $crate::decompiler::decompiler_errors::ErrorLocation::default(),
            $crate::decompiler::decompiler_errors::ErrorType::Unsupported,
        );
        error.new_metadata_entry(
            $crate::decompiler::decompiler_errors::ErrorMetaDataKey::Feature,
            format!("{}", $feature),
        );
        return Err(error);
    }};
}

/// Returns a new DecompilerError for malformed or unreadable config files.
#[macro_export]
macro_rules! return_config_error {
    ($fmt:expr, $($arg:expr),+ $(,)?) => {
        return Err($crate::decompiler::decompiler_errors::DecompilerError::config_error(
            format!($fmt, $($arg),+),
        ))
    };
    ($msg:expr) => {
        return Err($crate::decompiler::decompiler_errors::DecompilerError::config_error($msg))
    };
}

/// Returns a new DecompilerError for files that can't be found or read.
#[macro_export]
macro_rules! return_file_error {
    ($path:expr, $fmt:expr, $($arg:expr),+ $(,)?) => {
        return Err($crate::decompiler::decompiler_errors::DecompilerError::file_error(
            $path,
            format!($fmt, $($arg),+),
        ))
    };
    ($path:expr, $msg:expr) => {
        return Err($crate::decompiler::decompiler_errors::DecompilerError::file_error(
            $path, $msg,
        ))
    };
}
