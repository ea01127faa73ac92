use wasm_decompile::projects::cli::start_cli;

fn main() {
    start_cli();
}
