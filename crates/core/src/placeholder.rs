//! Placeholder parsing and substitution for deferred value resolution.
//!
//! Environment assignments in a descriptor may reference values that aren't
//! known until package resolution time. This module handles parsing
//! placeholder strings and substituting resolved values.
//!
//! # Placeholder Formats
//!
//! - `$${pkg:NAME}` - root path of the resolved package NAME
//! - `$${env:NAME}` - current value of NAME in the environment context,
//!   which sees assignments made earlier in declaration order
//!
//! # Shell Variables
//!
//! Single `$` characters pass through unchanged, so shell variables like
//! `$HOME` and `$PATH` work naturally without any escaping.
//!
//! # Escaping
//!
//! Use `$$$` before `{` to produce a literal `$${` sequence.
//!
//! # Example
//!
//! ```
//! use dsh_core::placeholder::{parse, Segment, Placeholder};
//!
//! let segments = parse("$${pkg:cudatoolkit}/lib:$HOME").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Placeholder(Placeholder::Pkg("cudatoolkit".to_string())),
//!     Segment::Literal("/lib:$HOME".to_string()),
//! ]);
//! ```

use thiserror::Error;

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// `$${pkg:NAME}` - root path of a resolved package
    Pkg(String),

    /// `$${env:NAME}` - current value of an environment variable
    Env(String),
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text (no placeholders)
    Literal(String),

    /// A placeholder to be resolved
    Placeholder(Placeholder),
}

/// Errors that can occur during placeholder parsing or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    #[error("unclosed placeholder at position {0}")]
    Unclosed(usize),

    #[error("unknown placeholder type: {0}")]
    UnknownType(String),

    #[error("malformed placeholder: {0}")]
    Malformed(String),

    #[error("placeholder references package '{0}' which is not declared")]
    UnresolvedPackage(String),

    #[error("placeholder references variable '{0}' which is not set")]
    UnsetVariable(String),
}

/// Trait for resolving placeholder values during materialization.
pub trait Resolver {
    /// Resolve a package root path by name.
    fn resolve_pkg(&self, name: &str) -> Result<&str, PlaceholderError>;

    /// Resolve the current value of an environment variable.
    fn resolve_env(&self, name: &str) -> Result<&str, PlaceholderError>;
}

/// Parse a string containing placeholders into segments.
///
/// # Errors
///
/// Returns an error if a placeholder is malformed (unclosed, unknown type).
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = input.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        if ch == '$' {
            match chars.peek() {
                Some((_, '$')) => {
                    // We have "$$", check what follows
                    chars.next(); // consume the second $

                    match chars.peek() {
                        Some((_, '$')) => {
                            // "$$$" followed by "{" is the escape for a literal "$${"
                            chars.next(); // consume the third $

                            match chars.peek() {
                                Some((_, '{')) => {
                                    literal.push_str("$${");
                                    chars.next(); // consume the {
                                }
                                _ => {
                                    literal.push_str("$$$");
                                }
                            }
                        }
                        Some((_, '{')) => {
                            // "$${" starts a placeholder
                            chars.next(); // consume the {

                            if !literal.is_empty() {
                                segments.push(Segment::Literal(std::mem::take(&mut literal)));
                            }

                            let mut content = String::new();
                            let mut found_close = false;

                            for (_, c) in chars.by_ref() {
                                if c == '}' {
                                    found_close = true;
                                    break;
                                }
                                content.push(c);
                            }

                            if !found_close {
                                return Err(PlaceholderError::Unclosed(pos));
                            }

                            let placeholder = parse_placeholder_content(&content)?;
                            segments.push(Segment::Placeholder(placeholder));
                        }
                        _ => {
                            // "$$" followed by something else, output as literal
                            literal.push_str("$$");
                        }
                    }
                }
                _ => {
                    // Lone $, shell variables like $HOME pass through
                    literal.push('$');
                }
            }
        } else {
            literal.push(ch);
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

/// Parse the content inside a placeholder (everything between `$${` and `}`).
fn parse_placeholder_content(content: &str) -> Result<Placeholder, PlaceholderError> {
    let (kind, name) = content
        .split_once(':')
        .ok_or_else(|| PlaceholderError::Malformed(format!("missing colon in '{content}'")))?;

    if name.is_empty() {
        return Err(PlaceholderError::Malformed(format!(
            "empty name in '{content}'"
        )));
    }

    match kind {
        "pkg" => Ok(Placeholder::Pkg(name.to_string())),
        "env" => Ok(Placeholder::Env(name.to_string())),
        _ => Err(PlaceholderError::UnknownType(kind.to_string())),
    }
}

/// Substitute all placeholders in a string using the provided resolver.
///
/// # Errors
///
/// Returns an error if parsing fails or if any placeholder cannot be resolved.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, PlaceholderError> {
    let segments = parse(input)?;
    substitute_segments(&segments, resolver)
}

/// Substitute placeholders in pre-parsed segments.
pub fn substitute_segments(
    segments: &[Segment],
    resolver: &impl Resolver,
) -> Result<String, PlaceholderError> {
    let mut result = String::new();

    for segment in segments {
        match segment {
            Segment::Literal(s) => result.push_str(s),
            Segment::Placeholder(p) => {
                let value = match p {
                    Placeholder::Pkg(name) => resolver.resolve_pkg(name)?,
                    Placeholder::Env(name) => resolver.resolve_env(name)?,
                };
                result.push_str(value);
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TestResolver {
        pkgs: HashMap<String, String>,
        envs: HashMap<String, String>,
    }

    impl TestResolver {
        fn new() -> Self {
            Self {
                pkgs: HashMap::new(),
                envs: HashMap::new(),
            }
        }

        fn with_pkg(mut self, name: &str, root: &str) -> Self {
            self.pkgs.insert(name.to_string(), root.to_string());
            self
        }

        fn with_env(mut self, name: &str, value: &str) -> Self {
            self.envs.insert(name.to_string(), value.to_string());
            self
        }
    }

    impl Resolver for TestResolver {
        fn resolve_pkg(&self, name: &str) -> Result<&str, PlaceholderError> {
            self.pkgs
                .get(name)
                .map(|s| s.as_str())
                .ok_or_else(|| PlaceholderError::UnresolvedPackage(name.to_string()))
        }

        fn resolve_env(&self, name: &str) -> Result<&str, PlaceholderError> {
            self.envs
                .get(name)
                .map(|s| s.as_str())
                .ok_or_else(|| PlaceholderError::UnsetVariable(name.to_string()))
        }
    }

    #[test]
    fn toolkit_library_path() {
        let resolver = TestResolver::new().with_pkg("cudatoolkit", "/store/x86_64-linux/cudatoolkit");

        let result = substitute("$${pkg:cudatoolkit}/lib", &resolver).unwrap();
        assert_eq!(result, "/store/x86_64-linux/cudatoolkit/lib");
    }

    #[test]
    fn cert_bundle_file() {
        let resolver = TestResolver::new().with_pkg("cacert", "/store/x86_64-linux/cacert");

        let result = substitute(
            "$${pkg:cacert}/etc/ssl/certs/ca-bundle.crt",
            &resolver,
        )
        .unwrap();
        assert_eq!(result, "/store/x86_64-linux/cacert/etc/ssl/certs/ca-bundle.crt");
    }

    #[test]
    fn env_reference_sees_earlier_assignment() {
        let resolver = TestResolver::new()
            .with_pkg("cudatoolkit", "/store/cuda")
            .with_env("CUDA_PATH", "/store/cuda");

        let result = substitute("$${env:CUDA_PATH}/lib64", &resolver).unwrap();
        assert_eq!(result, "/store/cuda/lib64");
    }

    #[test]
    fn adjacent_placeholders() {
        let resolver = TestResolver::new()
            .with_pkg("a", "/store/a")
            .with_pkg("b", "/store/b");

        let result = substitute("$${pkg:a}/bin:$${pkg:b}/bin", &resolver).unwrap();
        assert_eq!(result, "/store/a/bin:/store/b/bin");
    }

    #[test]
    fn shell_variables_pass_through() {
        let resolver = TestResolver::new();
        let result = substitute("echo $HOME $PATH $1 $?", &resolver).unwrap();
        assert_eq!(result, "echo $HOME $PATH $1 $?");
    }

    #[test]
    fn lone_dollar_preserved() {
        let resolver = TestResolver::new();
        let result = substitute("costs $5 or more$", &resolver).unwrap();
        assert_eq!(result, "costs $5 or more$");
    }

    #[test]
    fn double_dollar_without_brace_preserved() {
        let resolver = TestResolver::new();
        let result = substitute("echo $$variable", &resolver).unwrap();
        assert_eq!(result, "echo $$variable");
    }

    #[test]
    fn escape_placeholder_syntax() {
        let resolver = TestResolver::new();
        let result = substitute("echo $$${pkg:literal}", &resolver).unwrap();
        assert_eq!(result, "echo $${pkg:literal}");
    }

    #[test]
    fn empty_input() {
        let segments = parse("").unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn error_unclosed_placeholder() {
        let result = parse("$${pkg:cudatoolkit");
        assert!(matches!(result, Err(PlaceholderError::Unclosed(0))));
    }

    #[test]
    fn error_unknown_placeholder_type() {
        let result = parse("$${build:foo}");
        assert!(matches!(result, Err(PlaceholderError::UnknownType(ref s)) if s == "build"));
    }

    #[test]
    fn error_malformed_missing_colon() {
        let result = parse("$${pkg}");
        assert!(matches!(result, Err(PlaceholderError::Malformed(_))));
    }

    #[test]
    fn error_malformed_empty_name() {
        let result = parse("$${pkg:}");
        assert!(matches!(result, Err(PlaceholderError::Malformed(_))));
    }

    #[test]
    fn error_unresolved_package() {
        let resolver = TestResolver::new();
        let result = substitute("$${pkg:missing}", &resolver);
        assert!(
            matches!(result, Err(PlaceholderError::UnresolvedPackage(ref s)) if s == "missing")
        );
    }

    #[test]
    fn error_unset_variable() {
        let resolver = TestResolver::new();
        let result = substitute("$${env:NOPE}", &resolver);
        assert!(matches!(result, Err(PlaceholderError::UnsetVariable(ref s)) if s == "NOPE"));
    }
}
