//! Command-line entrypoint for the decompiler.
//!
//! Parses the command, merges config file values with command-line overrides
//! and writes the decompiled module to stdout or a file.

use crate::decompiler::decompile_file;
use crate::decompiler::decompiler_errors::DecompilerError;
use crate::decompiler::decompiler_warnings::print_formatted_warning;
use crate::decompiler::display_messages::{print_decompiler_messages, print_formatted_error};
use crate::projects::settings::{DECOMPILED_FILE_EXTENSION, DecompileOptions};
use saying::say;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    // Decompiles a single .wasm file
    Decompile {
        path: String,
        options: DecompileCommandOptions,
    },

    Help,
}

/// Everything the `decompile` command can override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DecompileCommandOptions {
    output: Option<String>,
    config: Option<String>,
    indent_amount: Option<usize>,
    target_width: Option<usize>,
    json: bool,
}

#[derive(PartialEq, Eq, Debug)]
pub enum Flag {
    DisableWarnings,
    DisableTimers,
}

pub fn start_cli() {
    let decompiler_args: Vec<String> = env::args().collect();

    if decompiler_args.len() < 2 {
        print_help(false);
        return;
    }

    let command = match get_command(&decompiler_args[1..]) {
        Ok(command) => command,
        Err(e) => {
            say!(Red e);
            print_help(true);
            return;
        }
    };

    let flags = get_flags(&decompiler_args);

    match command {
        Command::Help => {
            print_help(false);
        }

        Command::Decompile { path, options } => {
            run_decompile(&path, &options, &flags);
        }
    }
}

fn run_decompile(path: &str, command_options: &DecompileCommandOptions, flags: &[Flag]) {
    let options = match resolve_options(command_options) {
        Ok(options) => options,
        Err(e) => {
            print_formatted_error(e);
            return;
        }
    };

    let start = Instant::now();
    let decompilation = match decompile_file(Path::new(path), &options) {
        Ok(decompilation) => decompilation,
        Err(messages) => {
            print_decompiler_messages(messages);
            return;
        }
    };

    let text = match command_options.json {
        true => match serde_json::to_string_pretty(&decompilation.module) {
            Ok(json) => json,
            Err(e) => {
                say!(Red "Could not serialize the decompiled module: ", e);
                return;
            }
        },
        false => decompilation.module.to_text(),
    };

    if !flags.contains(&Flag::DisableWarnings) {
        for warning in decompilation.warnings {
            print_formatted_warning(warning);
        }
    }

    match &command_options.output {
        None => print!("{text}"),

        Some(output) => {
            let output_path = output_path(path, output);
            let shown_path = output_path.display().to_string();
            if let Err(e) = fs::write(&output_path, text) {
                say!(Red "Could not write ", shown_path, ": ", e);
                return;
            }

            if !flags.contains(&Flag::DisableTimers) {
                let duration = start.elapsed();
                say!(
                    "\nDecompiled ",
                    Blue shown_path,
                    Reset " in: ",
                    Green Bold #duration
                );
            }
        }
    }
}

/// Config file first, then command-line values on top.
fn resolve_options(
    command_options: &DecompileCommandOptions,
) -> Result<DecompileOptions, DecompilerError> {
    let config_path = command_options.config.as_deref().map(Path::new);
    let mut options = DecompileOptions::discover(config_path)?;

    if let Some(indent_amount) = command_options.indent_amount {
        options.indent_amount = indent_amount;
    }
    if let Some(target_width) = command_options.target_width {
        options.target_width = target_width;
    }

    options.validated()
}

// An output that names a directory gets the input's file stem plus .dcmp
fn output_path(input: &str, output: &str) -> PathBuf {
    let output = PathBuf::from(output);
    if !output.is_dir() {
        return output;
    }

    let stem = Path::new(input)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("module"));

    output.join(stem).with_extension(DECOMPILED_FILE_EXTENSION)
}

fn get_command(args: &[String]) -> Result<Command, String> {
    let command = args.first().map(String::as_str);

    match command {
        Some("help") | Some("--help") | Some("-h") => Ok(Command::Help),

        Some("decompile") => parse_decompile_command(&args[1..]),

        // A bare path is shorthand for `decompile <path>`
        Some(path) if !path.starts_with('-') => parse_decompile_command(args),

        Some(other) => Err(format!("Invalid command: '{other}'")),

        None => Err(String::from("No command given")),
    }
}

fn get_flags(args: &[String]) -> Vec<Flag> {
    let mut flags = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--hide-warnings" => flags.push(Flag::DisableWarnings),
            "--hide-timers" => flags.push(Flag::DisableTimers),
            _ => {}
        }
    }

    flags
}

fn parse_decompile_command(args: &[String]) -> Result<Command, String> {
    let mut path = String::new();
    let mut options = DecompileCommandOptions::default();
    let mut index = 0usize;

    while let Some(arg) = args.get(index) {
        match arg.as_str() {
            "-o" | "--output" => {
                options.output = Some(flag_value(args, index, arg)?.to_owned());
                index += 2;
            }
            "--config" => {
                options.config = Some(flag_value(args, index, arg)?.to_owned());
                index += 2;
            }
            "--width" => {
                let value = flag_value(args, index, arg)?;
                options.target_width = match value.parse::<usize>() {
                    Ok(width) if width > 0 => Some(width),
                    Ok(_) => {
                        return Err(String::from(
                            "Invalid --width value: '0'. It must be greater than zero.",
                        ));
                    }
                    Err(_) => {
                        return Err(format!(
                            "Invalid --width value: '{value}'. It must be a positive integer."
                        ));
                    }
                };
                index += 2;
            }
            "--indent" => {
                let value = flag_value(args, index, arg)?;
                options.indent_amount = match value.parse::<usize>() {
                    Ok(indent) => Some(indent),
                    Err(_) => {
                        return Err(format!(
                            "Invalid --indent value: '{value}'. It must be a non-negative integer."
                        ));
                    }
                };
                index += 2;
            }
            "--json" => {
                options.json = true;
                index += 1;
            }
            "--hide-warnings" | "--hide-timers" => {
                index += 1;
            }
            _ if arg.starts_with('-') => {
                return Err(format!(
                    "Unknown decompile flag: '{arg}'. Supported flags are -o/--output, --config, --width, --indent, --json."
                ));
            }
            _ => {
                if path.is_empty() {
                    path = arg.to_owned();
                    index += 1;
                } else {
                    return Err(String::from(
                        "Decompile command accepts exactly one path argument.",
                    ));
                }
            }
        }
    }

    if path.is_empty() {
        return Err(String::from("Missing path to a .wasm file"));
    }

    Ok(Command::Decompile { path, options })
}

fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, String> {
    match args.get(index + 1) {
        Some(value) if !value.starts_with("--") => Ok(value.as_str()),
        _ => Err(format!("Missing value for {flag}")),
    }
}

fn print_help(commands_only: bool) {
    if !commands_only {
        say!(Bright Black "------------------------------------");
        say!(Green Bold "wasm-decompile");
        say!("Usage: ", Bold "decompile <path>", Italic " [options]");
    }
    say!(Green Bold "\nCommands:");
    say!("  decompile <path>   - Decompiles a .wasm file");
    say!("  help               - Shows this message");

    say!(Green Bold "\nOptions:");
    say!("  -o, --output <path>   (default: stdout)");
    say!("  --config <path>       (default: ./decompile.toml if present)");
    say!("  --width <columns>     (default: 70)");
    say!("  --indent <spaces>     (default: 2)");
    say!("  --json                Emits the decompiled module as JSON");

    say!(Green Bold "\nFlags:");
    say!("  --hide-warnings");
    say!("  --hide-timers");
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
