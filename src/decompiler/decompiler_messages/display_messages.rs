use crate::decompiler::decompiler_errors::{
    DecompilerError, DecompilerMessages, ErrorMetaDataKey, ErrorType,
};
use crate::decompiler::decompiler_warnings::print_formatted_warning;
use saying::say;
use std::env;
use std::path::Path;

fn relative_display_path(path: &Path) -> String {
    match env::current_dir() {
        Ok(dir) => path
            .strip_prefix(&dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string(),
        Err(_) => path.to_string_lossy().to_string(),
    }
}

pub fn print_decompiler_messages(messages: DecompilerMessages) {
    for err in messages.errors {
        print_formatted_error(err);
    }

    for warning in messages.warnings {
        print_formatted_warning(warning);
    }
}

pub fn print_formatted_error(e: DecompilerError) {
    let relative_dir = e
        .location
        .file
        .as_deref()
        .map(relative_display_path)
        .unwrap_or_default();

    match e.error_type {
        ErrorType::File => {
            say!(Yellow "🏚 Can't find/read file or directory: ", relative_dir);
            say!(e.msg);
            return;
        }

        ErrorType::Config => {
            if !relative_dir.is_empty() {
                say!("\n (-_-)  🔥🔥🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥🔥🔥  <(^~^)/ ");
            }
            say!(Yellow "CONFIG FILE ISSUE- ");
            say!(Dark Yellow "Malformed config file, something in the [format] table doesn't make sense");
        }

        ErrorType::Wasm => {
            if !relative_dir.is_empty() {
                say!("\n(╯°□°)╯  🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥  Σ(°△°;) ");
            }
            say!(Red "Invalid Wasm Module");
        }

        ErrorType::Unsupported => {
            if !relative_dir.is_empty() {
                say!("\n(ಠ_ಠ) ", Dark Magenta relative_dir);
            }
            say!(Yellow "Unsupported feature - ");
            say!(Dark Yellow "this module uses something the decompiler can't render yet");
        }

        ErrorType::Decompiler => {
            if !relative_dir.is_empty() {
                say!("\nヽ༼☉ ‿ ⚆༽ﾉ  🔥🔥🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥🔥🔥  ╰(° _ o╰) ");
            }
            say!(Yellow "DECOMPILER BUG - ");
            say!(Dark Yellow "decompiler developer skill issue (not your fault)");
        }
    }

    if let Some(function) = &e.location.function {
        say!(Dark Magenta "In function ", Bright {function});
    }
    if let Some(stage) = e.metadata.get(&ErrorMetaDataKey::DecompilationStage) {
        say!(Dark Magenta "Stage: ", stage);
    }

    say!(Red e.msg);

    if let Some(suggestion) = e.metadata.get(&ErrorMetaDataKey::PrimarySuggestion) {
        say!(Dark suggestion);
    }
}
