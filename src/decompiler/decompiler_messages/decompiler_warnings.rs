use saying::say;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecompilerWarning {
    pub msg: String,
    pub function: Option<String>,
    pub warning_kind: WarningKind,
}

impl DecompilerWarning {
    pub fn new(msg: &str, function: Option<String>, warning_kind: WarningKind) -> DecompilerWarning {
        DecompilerWarning {
            msg: msg.to_owned(),
            function,
            warning_kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WarningKind {
    // Instructions after an unconditional branch that were never turned into nodes
    DeadCodeSkipped { count: usize },

    // Names from the name section / exports that had to be rewritten to be identifiers
    NameSanitized { count: usize },
}

pub fn print_formatted_warning(w: DecompilerWarning) {
    say!(Yellow "WARNING: ");
    let function = w.function.unwrap_or_default();
    match w.warning_kind {
        WarningKind::DeadCodeSkipped { count } => {
            say!(
                "Skipped ", Bright {count}, " unreachable instruction(s) in '", Dark Magenta function, "'"
            );
        }
        WarningKind::NameSanitized { count } => {
            say!("Rewrote ", Bright {count}, " name(s) that were not valid identifiers");
        }
    }
    if !w.msg.is_empty() {
        say!(Dark w.msg);
    }
}
