//! Placeholder substitution for step parameters.
//!
//! A parameter may reference earlier results with `{{TOKEN}}`:
//!
//! - `{{0}}`, `{{1}}`, ... - value of the frame at that depth (0 = top)
//! - `{{STD_OUT}}` / `{{STD_ERR}}` - output captured by the top frame
//! - `{{DESKTOP}}`, `{{UUID}}`, ... - named constants from a [`ConstantSource`]
//!
//! Substitution is a single left-to-right pass. Replacement text is never
//! scanned again, so a value containing `{{0}}` stays literally `{{0}}`.

use regex::Regex;
use tracing::debug;

use super::error::{RecipeError, Result};
use super::stack::ValueStack;
use crate::constants::{Constant, ConstantSource};

/// Token for the top frame's captured standard output.
pub const STD_OUT: &str = "STD_OUT";

/// Token for the top frame's captured standard error.
pub const STD_ERR: &str = "STD_ERR";

/// A recognized placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Index(usize),
    StdOut,
    StdErr,
    Constant(Constant),
}

/// Resolves placeholders against a stack and a constant source.
///
/// The matching grammar is compiled once, from the constants the source
/// supports.
pub struct Resolver {
    pattern: Regex,
    constants: Box<dyn ConstantSource>,
}

impl Resolver {
    pub fn new(constants: Box<dyn ConstantSource>) -> Result<Self> {
        let mut alternatives = vec![r"[0-9]+".to_string(), STD_OUT.to_string(), STD_ERR.to_string()];
        alternatives.extend(
            constants
                .supported()
                .iter()
                .map(|c| regex::escape(c.as_str())),
        );
        let source = format!(r"\{{\{{({})\}}\}}", alternatives.join("|"));
        debug!(pattern = %source, "compiled placeholder grammar");

        Ok(Self {
            pattern: Regex::new(&source)?,
            constants,
        })
    }

    /// The constant source this resolver consults.
    pub fn constants(&self) -> &dyn ConstantSource {
        self.constants.as_ref()
    }

    /// Substitute every placeholder in `parameter`.
    pub fn resolve(&self, parameter: &str, stack: &ValueStack) -> Result<String> {
        let mut resolved = String::with_capacity(parameter.len());
        let mut last = 0;

        for caps in self.pattern.captures_iter(parameter) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            resolved.push_str(&parameter[last..whole.start()]);
            let token = parse_token(inner.as_str())?;
            resolved.push_str(&self.replacement(token, stack)?);
            last = whole.end();
        }
        resolved.push_str(&parameter[last..]);

        if last > 0 {
            debug!(parameter, resolved = %resolved, %stack, "resolved parameter");
        }
        Ok(resolved)
    }

    fn replacement(&self, token: Token, stack: &ValueStack) -> Result<String> {
        match token {
            Token::Index(depth) => Ok(stack.peek_at(depth)?.value().to_string()),
            Token::StdOut => Ok(stack.peek_at(0)?.stdout().unwrap_or_default().to_string()),
            Token::StdErr => Ok(stack.peek_at(0)?.stderr().unwrap_or_default().to_string()),
            Token::Constant(constant) => self.constants.resolve(constant),
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

fn parse_token(text: &str) -> Result<Token> {
    match text {
        STD_OUT => Ok(Token::StdOut),
        STD_ERR => Ok(Token::StdErr),
        // an index too large for usize is deeper than any stack
        _ if text.bytes().all(|b| b.is_ascii_digit()) => {
            Ok(Token::Index(text.parse().unwrap_or(usize::MAX)))
        }
        _ => text
            .parse()
            .map(Token::Constant)
            .map_err(|_| RecipeError::InvalidRecipe(format!("unknown constant: {}", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::stack::Frame;

    /// Constants with fixed values; DESKTOP is unsupported on purpose.
    struct FixedConstants;

    impl ConstantSource for FixedConstants {
        fn supported(&self) -> &[Constant] {
            &[Constant::Delimiter, Constant::Desktop, Constant::Uuid]
        }

        fn resolve(&self, constant: Constant) -> Result<String> {
            match constant {
                Constant::Delimiter => Ok("/".to_string()),
                Constant::Uuid => Ok("{{0}}".to_string()),
                other => Err(RecipeError::InvalidRecipe(format!(
                    "can't resolve {} here",
                    other
                ))),
            }
        }
    }

    fn resolver() -> Resolver {
        Resolver::new(Box::new(FixedConstants)).unwrap()
    }

    fn stack_of(values: &[&str]) -> ValueStack {
        let mut stack = ValueStack::new();
        for v in values {
            stack.push(Frame::new(*v));
        }
        stack
    }

    #[test]
    fn test_no_placeholders_unchanged() {
        let stack = ValueStack::new();
        let text = "plain text with { braces } and {{ spaced }}";
        assert_eq!(resolver().resolve(text, &stack).unwrap(), text);
    }

    #[test]
    fn test_index_lookup() {
        let stack = stack_of(&["seed", "below", "top"]);
        let r = resolver();
        assert_eq!(r.resolve("{{0}}", &stack).unwrap(), "top");
        assert_eq!(r.resolve("{{1}}", &stack).unwrap(), "below");
        assert_eq!(r.resolve("a{{2}}b{{0}}c", &stack).unwrap(), "aseedbtopc");
    }

    #[test]
    fn test_index_out_of_range_is_invalid_recipe() {
        let stack = stack_of(&["only"]);
        let err = resolver().resolve("{{1}}", &stack).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRecipe);
        assert!(err.to_string().contains("size 1"));
    }

    #[test]
    fn test_huge_index_is_out_of_range() {
        let stack = stack_of(&["only"]);
        let err = resolver()
            .resolve("{{99999999999999999999999}}", &stack)
            .unwrap_err();
        assert!(matches!(err, RecipeError::IndexOutOfRange { size: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidRecipe);
    }

    #[test]
    fn test_non_ascii_digits_are_not_indices() {
        let stack = stack_of(&["only"]);
        let r = resolver();
        // ARABIC-INDIC DIGIT THREE and FULLWIDTH DIGIT ONE
        assert_eq!(r.resolve("x{{\u{0663}}}y", &stack).unwrap(), "x{{\u{0663}}}y");
        assert_eq!(r.resolve("{{\u{FF11}}}", &stack).unwrap(), "{{\u{FF11}}}");
    }

    #[test]
    fn test_captured_output() {
        let r = resolver();
        let mut stack = stack_of(&["seed"]);
        assert_eq!(r.resolve("[{{STD_OUT}}][{{STD_ERR}}]", &stack).unwrap(), "[][]");

        stack.push(Frame::new("0").with_output("hello\n", "warn\n"));
        assert_eq!(
            r.resolve("[{{STD_OUT}}][{{STD_ERR}}]", &stack).unwrap(),
            "[hello\n][warn\n]"
        );
    }

    #[test]
    fn test_constants() {
        let stack = stack_of(&["seed"]);
        let r = resolver();
        assert_eq!(r.resolve("a{{DELIMITER}}b", &stack).unwrap(), "a/b");

        let err = r.resolve("{{DESKTOP}}", &stack).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRecipe);
    }

    #[test]
    fn test_unsupported_constant_passes_through() {
        // SW_MIRROR is not in this source's grammar, so it is plain text
        let stack = stack_of(&["seed"]);
        assert_eq!(
            resolver().resolve("{{SW_MIRROR}}", &stack).unwrap(),
            "{{SW_MIRROR}}"
        );
    }

    #[test]
    fn test_no_second_pass() {
        let r = resolver();
        let stack = stack_of(&["seed", "{{1}}"]);
        assert_eq!(r.resolve("{{0}}", &stack).unwrap(), "{{1}}");
        // constant values are not expanded either
        assert_eq!(r.resolve("{{UUID}}", &stack).unwrap(), "{{0}}");
    }

    #[test]
    fn test_replacement_with_dollar_is_literal() {
        let stack = stack_of(&["$1 and \\0"]);
        assert_eq!(resolver().resolve("x{{0}}", &stack).unwrap(), "x$1 and \\0");
    }
}
