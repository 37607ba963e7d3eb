//! # Rule Set
//!
//! Ordered `(pattern, template)` pairs turning a real path into a virtual
//! one.
//!
//! A rule matches when its pattern matches at the very beginning of the
//! real path. The first matching rule in declared order wins; the virtual
//! path is the real path with every match of the pattern replaced by the
//! expanded template. A path no rule matches has no virtual counterpart.
//!
//! ## Templates
//!
//! Templates use the `regex` crate's expansion syntax (`$name`, `${name}`,
//! `$1`, `$$` for a literal dollar). Backslash references (`\g<name>`,
//! `\g<1>`, `\1`) are rewritten to that syntax when the rule is built.
//!
//! ```rust
//! use remapfs::Rule;
//!
//! let rule = Rule::new(
//!     r".*/(?P<title>[^/]+)/(?P<category>[^/]+)/content/(?P<file>.+)$",
//!     r"cyclopaedia/\g<title> [\g<category>]/\g<file>",
//! )
//! .unwrap();
//! assert_eq!(
//!     rule.apply("/doc/food/fruits/content/apple.md").as_deref(),
//!     Some("cyclopaedia/food [fruits]/apple.md")
//! );
//! ```

use regex::Regex;

use crate::ConfigError;
use crate::config::TransformationConfig;

/// A single compiled transformation rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    template: String,
}

impl Rule {
    /// Compile a rule from its pattern and replacement template.
    ///
    /// Backslash references are rewritten into `regex` syntax, which differs
    /// from classic backslash templates in two places:
    ///
    /// - `\0` is group 0, the whole match, not an octal escape for NUL.
    /// - `$` always starts a reference: `$name` expands group `name` (empty
    ///   if there is none). Write `$$` for a literal dollar.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidPattern`] if `pattern` does not compile
    pub fn new(pattern: &str, template: &str) -> Result<Self, ConfigError> {
        let compiled = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: compiled,
            template: normalize_template(template),
        })
    }

    /// The pattern source.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// The template, in `regex` expansion syntax.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The virtual path for `path`, or `None` if this rule does not match it.
    pub fn apply(&self, path: &str) -> Option<String> {
        let found = self.pattern.find(path)?;
        if found.start() != 0 {
            return None;
        }
        Some(
            self.pattern
                .replace_all(path, self.template.as_str())
                .into_owned(),
        )
    }
}

/// Rewrite backslash group references into `${group}` references.
fn normalize_template(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some((group, tail)) = after.strip_prefix("g<").and_then(|s| s.split_once('>')) {
            push_group(&mut out, group);
            rest = tail;
        } else if after.starts_with(|c: char| c.is_ascii_digit()) {
            let digits = after
                .chars()
                .take(2)
                .take_while(char::is_ascii_digit)
                .count();
            push_group(&mut out, &after[..digits]);
            rest = &after[digits..];
        } else if let Some(tail) = after.strip_prefix('\\') {
            out.push('\\');
            rest = tail;
        } else {
            out.push('\\');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

fn push_group(out: &mut String, group: &str) {
    out.push_str("${");
    out.push_str(group);
    out.push('}');
}

/// An ordered list of rules; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile every configured transformation, keeping configuration order.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidPattern`] for the first pattern that fails to compile
    pub fn new(transformations: &[TransformationConfig]) -> Result<Self, ConfigError> {
        let rules = transformations
            .iter()
            .map(|t| Rule::new(&t.from, &t.to))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Wrap already compiled rules.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The virtual path of `path` under the first matching rule.
    pub fn apply(&self, path: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.apply(path))
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}
