//! `"Hello {}"` placeholder substitution, the message half of format rendering.
//!
//! Grammar: `{}` consumes the next positional argument; excess arguments are
//! ignored; a missing argument leaves the placeholder untouched; `{{` emits a
//! literal `{`.

use std::fmt;

/// Renders `pattern` against `args`, following the placeholder law in the
/// module docs.
pub fn format(pattern: &str, args: &[&dyn fmt::Display]) -> String {
    let mut out = String::with_capacity(pattern.len() + args.len() * 8);
    let mut chars = pattern.chars().peekable();
    let mut next_arg = args.iter();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => match chars.peek() {
                Some('{') => {
                    chars.next();
                    out.push('{');
                }
                Some('}') => {
                    chars.next();
                    match next_arg.next() {
                        Some(arg) => {
                            use fmt::Write;
                            let _ = write!(out, "{}", arg);
                        }
                        None => out.push_str("{}"),
                    }
                }
                _ => out.push('{'),
            },
            '}' => match chars.peek() {
                Some('}') => {
                    chars.next();
                    out.push('}');
                }
                _ => out.push('}'),
            },
            _ => out.push(ch),
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(vals: &[&dyn fmt::Display]) -> Vec<&dyn fmt::Display> {
        vals.to_vec()
    }

    #[test]
    fn substitutes_in_order() {
        let (a, b, c) = (1, 2, 3);
        let rendered = format("{} + {} = {}", &args(&[&a, &b, &c]));
        assert_eq!(rendered, "1 + 2 = 3");
    }

    #[test]
    fn identity_with_no_placeholders() {
        assert_eq!(format("no args", &[]), "no args");
    }

    #[test]
    fn missing_argument_leaves_placeholder_verbatim() {
        assert_eq!(format("a {} b", &[]), "a {} b");
    }

    #[test]
    fn excess_arguments_are_ignored() {
        let (a, b) = (1, 2);
        assert_eq!(format("{}", &args(&[&a, &b])), "1");
    }

    #[test]
    fn double_brace_escapes() {
        assert_eq!(format("{{}}", &[]), "{}");
    }
}
