pub mod decompiler;
pub mod projects;

pub use decompiler::{Decompilation, decompile_bytes, decompile_file, decompile_module};
pub use projects::settings::DecompileOptions;
