//! Matching of a single path component against a glob fragment.

use glob::{MatchOptions, Pattern};

use crate::GlobCompileError;

/// A compiled glob fragment that matches single directory entry names.
///
/// Supports `*`, `?`, `[...]` character classes and `\` escapes. Unless
/// dotfiles are included, wildcards never match a leading `.`; a literal
/// leading `.` in the fragment always does.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    fragment: String,
    pattern: Pattern,
    options: MatchOptions,
}

impl GlobMatcher {
    /// Compiles a fragment.
    pub fn compile(fragment: &str, include_dotfiles: bool) -> Result<Self, GlobCompileError> {
        let pattern =
            Pattern::new(&translate_escapes(fragment)).map_err(|source| {
                GlobCompileError::InvalidFragment {
                    fragment: fragment.to_string(),
                    source,
                }
            })?;
        Ok(Self {
            fragment: fragment.to_string(),
            pattern,
            options: MatchOptions {
                case_sensitive: true,
                require_literal_separator: true,
                require_literal_leading_dot: !include_dotfiles,
            },
        })
    }

    /// Returns true if `name` matches the fragment.
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.matches_with(name, self.options)
    }

    /// The fragment this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        &self.fragment
    }
}

/// Returns true if the fragment contains any glob metacharacter.
pub fn has_specials(fragment: &str) -> bool {
    fragment.contains(['*', '?', '[', '\\'])
}

/// Rewrites `\x` escapes into the bracket form understood by [`Pattern`].
fn translate_escapes(fragment: &str) -> String {
    let mut translated = String::with_capacity(fragment.len());
    let mut chars = fragment.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => translated.push_str(&Pattern::escape(&escaped.to_string())),
                None => translated.push('\\'),
            },
            c => translated.push(c),
        }
    }
    translated
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("*.txt", "a.txt", true)]
    #[case("*.txt", "a.rs", false)]
    #[case("?.rs", "x.rs", true)]
    #[case("?.rs", "xy.rs", false)]
    #[case("[ab].md", "b.md", true)]
    #[case("[ab].md", "c.md", false)]
    #[case("*", ".hidden", false)]
    #[case(".*", ".hidden", true)]
    #[case("\\*", "*", true)]
    #[case("\\*", "a", false)]
    #[case("a\\?b", "a?b", true)]
    fn test_matches(#[case] fragment: &str, #[case] name: &str, #[case] expected: bool) {
        let matcher = GlobMatcher::compile(fragment, false).unwrap();
        assert_eq!(matcher.matches(name), expected);
    }

    #[test]
    fn test_dotfiles_included() {
        let matcher = GlobMatcher::compile("*", true).unwrap();
        assert!(matcher.matches(".hidden"));
        assert!(matcher.matches("visible"));
    }

    #[test]
    fn test_invalid_fragment() {
        assert!(GlobMatcher::compile("[abc", false).is_err());
        assert!(GlobMatcher::compile("a**", false).is_err());
    }

    #[test]
    fn test_has_specials() {
        assert!(has_specials("*.rs"));
        assert!(has_specials("a\\b"));
        assert!(has_specials("[x]"));
        assert!(!has_specials("main.rs"));
    }
}
