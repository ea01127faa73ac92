use super::{format_constant, trimmed_decimal};
use crate::decompiler::wasm_module::instructions::ConstValue;

#[test]
fn trims_trailing_zeros_but_keeps_one_digit() {
    assert_eq!(trimmed_decimal(1.0), "1.0");
    assert_eq!(trimmed_decimal(0.25), "0.25");
    assert_eq!(trimmed_decimal(-3.125), "-3.125");
    assert_eq!(trimmed_decimal(1.0 / 3.0), "0.333333");
}

#[test]
fn integer_constants() {
    assert_eq!(format_constant(&ConstValue::I32(-1)), "-1");
    assert_eq!(format_constant(&ConstValue::I64(i64::MAX)), "9223372036854775807L");
}

#[test]
fn float_constants() {
    assert_eq!(format_constant(&ConstValue::F32(0.5f32.to_bits())), "0.5f");
    assert_eq!(format_constant(&ConstValue::F64(100.0f64.to_bits())), "100.0");
    assert_eq!(format_constant(&ConstValue::V128), "V128");
}

#[test]
fn non_finite_floats_are_lowercase() {
    assert_eq!(trimmed_decimal(f64::NAN), "nan");
    assert_eq!(trimmed_decimal(-f64::NAN), "-nan");
    assert_eq!(trimmed_decimal(f64::INFINITY), "inf");
    assert_eq!(trimmed_decimal(f64::NEG_INFINITY), "-inf");
    assert_eq!(format_constant(&ConstValue::F32(f32::NAN.to_bits())), "nanf");
    assert_eq!(format_constant(&ConstValue::F32(f32::NEG_INFINITY.to_bits())), "-inff");
    assert_eq!(format_constant(&ConstValue::F64(f64::INFINITY.to_bits())), "inf");
}
