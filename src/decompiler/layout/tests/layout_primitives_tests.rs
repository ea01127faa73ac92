//! Tests for the width-aware wrapping rules.

use super::{Layout, indent_value};
use crate::decompiler::layout::layout_value::LayoutValue;
use proptest::prelude::*;

const LAYOUT: Layout = Layout {
    indent_amount: 2,
    target_width: 70,
};

fn lines(value: &LayoutValue) -> Vec<&str> {
    value.lines().iter().map(String::as_str).collect()
}

fn multiline(values: &[&str]) -> LayoutValue {
    LayoutValue::from_lines(values.iter().map(|line| line.to_string()).collect(), false)
}

#[test]
fn binary_of_short_operands_stays_on_one_line() {
    let value = LAYOUT.wrap_binary(LayoutValue::single("1"), LayoutValue::single("2"), " + ", false);

    assert_eq!(lines(&value), vec!["1 + 2"]);
    assert!(value.needs_bracketing);
}

#[test]
fn nested_binary_operands_are_bracketed() {
    let sum = LAYOUT.wrap_binary(LayoutValue::single("a"), LayoutValue::single("b"), " + ", false);
    let product = LAYOUT.wrap_binary(sum, LayoutValue::single("c"), " * ", false);

    assert_eq!(product.first_line(), "(a + b) * c");
}

#[test]
fn call_without_arguments() {
    let value = LAYOUT.wrap_nary(Vec::new(), "foo(", ")");
    assert_eq!(lines(&value), vec!["foo()"]);
    assert!(!value.needs_bracketing);
}

#[test]
fn overlong_call_aligns_arguments_under_the_parenthesis() {
    let args = (0..8)
        .map(|index| LayoutValue::single(format!("argument_{index}")))
        .collect();
    let value = LAYOUT.wrap_nary(args, "foo(", ")");

    assert_eq!(value.line_count(), 8);
    assert_eq!(value.lines()[0], "foo(argument_0,");
    assert_eq!(value.lines()[1], "    argument_1,");
    assert_eq!(value.lines()[7], "    argument_7)");
}

#[test]
fn overlong_prefix_puts_arguments_on_indented_lines() {
    let prefix = format!("{}(", "f".repeat(55));
    let args = vec![
        LayoutValue::single("x".repeat(20)),
        LayoutValue::single("y".repeat(20)),
    ];
    let value = LAYOUT.wrap_nary(args, &prefix, ")");

    assert_eq!(
        value.lines(),
        [
            prefix.clone(),
            format!("  {},", "x".repeat(20)),
            format!("  {})", "y".repeat(20)),
        ]
    );
}

#[test]
fn separators_count_towards_the_single_line_width() {
    // 32 + 31 + 4 + 1 fits only when ", " is ignored
    let args = vec![
        LayoutValue::single("a".repeat(32)),
        LayoutValue::single("b".repeat(31)),
    ];
    let value = LAYOUT.wrap_nary(args, "foo(", ")");
    assert!(value.is_multiline());
}

#[test]
fn narrow_affixes_never_break_a_multiline_child() {
    let value = LAYOUT.wrap_child(multiline(&["a", "b"]), "(", ")");
    assert_eq!(lines(&value), vec!["(a", " b)"]);
}

#[test]
fn wide_prefix_moves_onto_its_own_line() {
    let child = LayoutValue::single("v".repeat(60));
    let value = LAYOUT.wrap_child(child, "some_long_name = ", "");

    assert_eq!(value.line_count(), 2);
    assert_eq!(value.lines()[0], "some_long_name = ");
    assert_eq!(value.lines()[1], format!("  {}", "v".repeat(60)));
}

#[test]
fn wrapped_child_no_longer_needs_brackets() {
    let child = LayoutValue::from_lines(vec![String::from("a + b")], true);
    let value = LAYOUT.bracket_if_needed(child);

    assert_eq!(value.first_line(), "(a + b)");
    assert!(!value.needs_bracketing);

    let plain = LAYOUT.bracket_if_needed(LayoutValue::single("a"));
    assert_eq!(plain.first_line(), "a");
}

#[test]
fn multiline_store_indents_the_value() {
    let value = multiline(&["call(", "  x)"]);
    let store = LAYOUT.wrap_binary(LayoutValue::single("p[0]:int"), value, " = ", true);

    assert_eq!(lines(&store), vec!["p[0]:int = ", "  call(", "    x)"]);
}

#[test]
fn block_indents_its_body_and_closes_it() {
    let value = LAYOUT.block(multiline(&["a();", "b();"]), "B_a", "block");
    assert_eq!(lines(&value), vec!["block B_a {", "  a();", "  b();", "}"]);

    let empty = LAYOUT.block(LayoutValue::from_lines(Vec::new(), false), "L_b", "loop");
    assert_eq!(lines(&empty), vec!["loop L_b {", "}"]);
}

#[test]
fn indentation_skips_blank_lines() {
    let mut value = multiline(&["a", "", "b"]);
    indent_value(&mut value, 4, "");
    assert_eq!(lines(&value), vec!["    a", "", "    b"]);

    let mut prefixed = multiline(&["a", "b"]);
    indent_value(&mut prefixed, 2, "x(");
    assert_eq!(lines(&prefixed), vec!["x(a", "  b"]);
}

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,29}"
}

proptest! {
    #[test]
    fn call_lines_stay_within_the_target_width(
        callee in "[a-z]{1,29}",
        args in proptest::collection::vec(identifier(), 0..12),
    ) {
        let prefix = format!("{callee}(");
        let values = args.iter().map(|arg| LayoutValue::single(arg.as_str())).collect();
        let value = LAYOUT.wrap_nary(values, &prefix, ")");

        for line in value.lines() {
            prop_assert!(
                line.chars().count() <= LAYOUT.target_width,
                "line '{line}' is wider than {}",
                LAYOUT.target_width
            );
        }
    }

    #[test]
    fn binary_lines_stay_within_the_target_width(
        left in identifier(),
        right in identifier(),
        infix in prop::sample::select(vec![" + ", " * ", " << ", " == ", " = "]),
        left_flagged in any::<bool>(),
        right_flagged in any::<bool>(),
        indent_right in any::<bool>(),
    ) {
        let left = LayoutValue::from_lines(vec![left], left_flagged);
        let right = LayoutValue::from_lines(vec![right], right_flagged);
        let value = LAYOUT.wrap_binary(left, right, infix, indent_right);

        for line in value.lines() {
            prop_assert!(
                line.chars().count() <= LAYOUT.target_width,
                "line '{line}' is wider than {}",
                LAYOUT.target_width
            );
        }
    }

    #[test]
    fn wrapped_child_lines_stay_within_the_target_width(
        child in identifier(),
        prefix in "[a-z_ =(]{0,40}",
        postfix in "[);]{0,2}",
    ) {
        let value = LAYOUT.wrap_child(LayoutValue::single(child.as_str()), &prefix, &postfix);

        for line in value.lines() {
            prop_assert!(
                line.chars().count() <= LAYOUT.target_width,
                "line '{line}' is wider than {}",
                LAYOUT.target_width
            );
        }
    }

    #[test]
    fn operands_are_bracketed_exactly_when_flagged(
        left in "[a-z]{1,10}",
        right in "[a-z]{1,10}",
        other in "[a-z]{1,10}",
        flagged in any::<bool>(),
    ) {
        let operand = LayoutValue::from_lines(vec![format!("{left} + {right}")], flagged);
        let value = LAYOUT.wrap_binary(operand, LayoutValue::single(other.as_str()), " * ", false);

        let bracketed = format!("({left} + {right}) * {other}");
        prop_assert_eq!(value.first_line() == bracketed, flagged);
    }
}
