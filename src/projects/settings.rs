use crate::decompiler::decompiler_errors::DecompilerError;
use crate::{return_config_error, return_file_error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "decompile.toml";
pub const DECOMPILED_FILE_EXTENSION: &str = "dcmp";

pub const DEFAULT_INDENT_AMOUNT: usize = 2;
pub const DEFAULT_TARGET_WIDTH: usize = 70;

/// Formatting parameters for the layout engine.
///
/// Passed explicitly into every decompile call, never read from global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompileOptions {
    pub indent_amount: usize,
    pub target_width: usize,
}

impl Default for DecompileOptions {
    fn default() -> Self {
        DecompileOptions {
            indent_amount: DEFAULT_INDENT_AMOUNT,
            target_width: DEFAULT_TARGET_WIDTH,
        }
    }
}

// The shape of decompile.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    format: DecompileOptions,
}

impl DecompileOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, DecompilerError> {
        let config: ConfigFile = match toml::from_str(text) {
            Ok(config) => config,
            Err(error) => return_config_error!("Could not parse config: {}", error),
        };
        config.format.validated()
    }

    pub fn load(path: &Path) -> Result<Self, DecompilerError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) => return_file_error!(path, "Could not read config file: {}", error),
        };

        DecompileOptions::from_toml_str(&text)
            .map_err(|error| error.with_file_path(path.to_path_buf()))
    }

    /// Uses `explicit_path` when given, otherwise `decompile.toml` in the
    /// working directory if there is one, otherwise the defaults.
    pub fn discover(explicit_path: Option<&Path>) -> Result<Self, DecompilerError> {
        if let Some(path) = explicit_path {
            return DecompileOptions::load(path);
        }

        let default_path = PathBuf::from(CONFIG_FILE_NAME);
        if default_path.is_file() {
            return DecompileOptions::load(&default_path);
        }

        Ok(DecompileOptions::default())
    }

    pub fn validated(self) -> Result<Self, DecompilerError> {
        if self.target_width == 0 {
            return_config_error!("target_width must be greater than zero");
        }
        Ok(self)
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
