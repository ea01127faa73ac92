//! Width-aware wrapping rules that combine child values into a parent.
//!
//! Every rule takes its children by value and returns the parent, so lines
//! are only ever moved between values.

use crate::decompiler::layout::layout_value::LayoutValue;
use crate::layout_log;
use crate::projects::settings::DecompileOptions;

fn text_width(text: &str) -> usize {
    text.chars().count()
}

/// Prepends `amount` spaces to every non-empty line, or `first_line_prefix`
/// to the first line when one is given.
pub fn indent_value(value: &mut LayoutValue, amount: usize, first_line_prefix: &str) {
    let indent = " ".repeat(amount);
    for (index, line) in value.lines_mut().iter_mut().enumerate() {
        if index == 0 && !first_line_prefix.is_empty() {
            line.insert_str(0, first_line_prefix);
        } else if !line.is_empty() {
            line.insert_str(0, &indent);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub indent_amount: usize,
    pub target_width: usize,
}

impl Layout {
    pub fn new(options: &DecompileOptions) -> Self {
        Layout {
            indent_amount: options.indent_amount,
            target_width: options.target_width,
        }
    }

    /// Surrounds a child with a prefix and postfix.
    ///
    /// Affixes no wider than one indent never force a line break.
    pub fn wrap_child(&self, child: LayoutValue, prefix: &str, postfix: &str) -> LayoutValue {
        let mut child = child;
        let prefix_width = text_width(prefix);
        let postfix_width = text_width(postfix);
        let width = prefix_width + postfix_width + child.width();

        if width < self.target_width
            || (prefix_width <= self.indent_amount && postfix_width <= self.indent_amount)
        {
            if child.is_multiline() {
                indent_value(&mut child, prefix_width, prefix);
            } else {
                child.prepend_to_first_line(prefix);
            }
        } else {
            // Prefix on its own line
            indent_value(&mut child, self.indent_amount, "");
            child.insert_first_line(prefix);
        }
        child.append_to_last_line(postfix);

        child.needs_bracketing = false;
        child
    }

    pub fn bracket_if_needed(&self, value: LayoutValue) -> LayoutValue {
        if !value.needs_bracketing {
            return value;
        }
        self.wrap_child(value, "(", ")")
    }

    /// `left <infix> right`, brackets both operands first.
    ///
    /// `indent_right` is for assignment-like infixes where the right side is
    /// a nested statement rather than a sibling operand.
    pub fn wrap_binary(
        &self,
        left: LayoutValue,
        right: LayoutValue,
        infix: &str,
        indent_right: bool,
    ) -> LayoutValue {
        let left = self.bracket_if_needed(left);
        let mut right = self.bracket_if_needed(right);
        let width = text_width(infix) + left.width() + right.width();

        if width < self.target_width && !left.is_multiline() && !right.is_multiline() {
            let line = format!("{}{}{}", left.first_line(), infix, right.first_line());
            return LayoutValue::from_lines(vec![line], true);
        }

        let mut binary = left;
        binary.append_to_last_line(infix);
        if indent_right {
            indent_value(&mut right, self.indent_amount, "");
        }
        binary.append_lines(right);
        binary.needs_bracketing = true;
        binary
    }

    /// `prefix arg, arg, ... postfix`, for calls and everything call-like.
    pub fn wrap_nary(&self, args: Vec<LayoutValue>, prefix: &str, postfix: &str) -> LayoutValue {
        let prefix_width = text_width(prefix);
        let separators = 2 * args.len().saturating_sub(1);

        let mut total_width = 0;
        let mut max_width = 0;
        let mut multiline = false;
        for arg in &args {
            let width = arg.width();
            max_width = max_width.max(width);
            total_width += width;
            multiline = multiline || arg.is_multiline();
        }

        if args.is_empty()
            || (!multiline
                && total_width + separators + prefix_width + text_width(postfix)
                    < self.target_width)
        {
            let joined = args
                .iter()
                .map(LayoutValue::first_line)
                .collect::<Vec<_>>()
                .join(", ");
            return LayoutValue::single(format!("{prefix}{joined}{postfix}"));
        }

        // Continuation lines line up after the prefix when the widest
        // argument still fits that way
        let align_with_prefix = max_width + prefix_width < self.target_width;
        layout_log!(Dark "wrap_nary ", prefix, " aligned: ", align_with_prefix);

        let last = args.len() - 1;
        let mut lines = Vec::new();
        for (index, mut arg) in args.into_iter().enumerate() {
            if align_with_prefix {
                let first_line_prefix = if index == 0 { prefix } else { "" };
                indent_value(&mut arg, prefix_width, first_line_prefix);
            } else {
                indent_value(&mut arg, self.indent_amount, "");
            }
            if index < last {
                arg.append_to_last_line(",");
            }
            lines.extend(arg.into_lines());
        }
        if !align_with_prefix {
            lines.insert(0, prefix.to_owned());
        }

        let mut value = LayoutValue::from_lines(lines, false);
        value.append_to_last_line(postfix);
        value
    }

    /// `keyword label {`, the indented body, then `}`.
    pub fn block(&self, body: LayoutValue, label: &str, keyword: &str) -> LayoutValue {
        let header = format!("{keyword} {label} {{");
        if body.is_blank() {
            return LayoutValue::from_lines(vec![header, String::from("}")], false);
        }

        let mut block = body;
        indent_value(&mut block, self.indent_amount, "");
        block.insert_first_line(header);
        block.push_line("}");
        block.needs_bracketing = false;
        block
    }
}

#[cfg(test)]
#[path = "tests/layout_primitives_tests.rs"]
mod tests;
