use crate::decompiler::wasm_module::instructions::ConstValue;

/// Six fixed decimals with the redundant trailing zeros removed,
/// always keeping one digit after the point.
pub fn trimmed_decimal(value: f64) -> String {
    if !value.is_finite() {
        return non_finite(value);
    }

    let mut text = format!("{value:.6}");
    while text.len() > 2 && text.ends_with('0') && text.as_bytes()[text.len() - 2] != b'.' {
        text.pop();
    }
    text
}

// Lowercase with an explicit sign, the way C formats them
fn non_finite(value: f64) -> String {
    let sign = if value.is_sign_negative() { "-" } else { "" };
    let name = if value.is_nan() { "nan" } else { "inf" };
    format!("{sign}{name}")
}

pub fn format_constant(value: &ConstValue) -> String {
    match value {
        ConstValue::I32(value) => value.to_string(),
        ConstValue::I64(value) => format!("{value}L"),
        ConstValue::F32(bits) => format!("{}f", trimmed_decimal(f32::from_bits(*bits) as f64)),
        ConstValue::F64(bits) => trimmed_decimal(f64::from_bits(*bits)),
        ConstValue::V128 => String::from("V128"),
    }
}

#[cfg(test)]
#[path = "tests/numeric_format_tests.rs"]
mod tests;
