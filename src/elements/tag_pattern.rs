//! Fluentd-style tag match patterns.
//!
//! A pattern is one or more space-separated alternatives. Within an
//! alternative:
//!
//! - `*` matches any run of characters inside a single tag part
//! - `**` matches zero or more tag parts (`a.**` matches `a`, `a.b`, `a.b.c`)
//! - `{x,y}` matches either `x` or `y`
//!
//! Everything else matches literally.

use regex::Regex;
use std::fmt;

/// Pattern matching every tag
pub const MATCH_ALL: &str = "**";

/// A compiled tag pattern
#[derive(Clone)]
pub struct TagPattern {
    source: String,
    regex: Regex,
}

impl TagPattern {
    /// Compile a pattern
    ///
    /// Fails on empty patterns and unbalanced braces.
    pub fn new(pattern: impl Into<String>) -> Result<Self, String> {
        let source = pattern.into();
        let alternatives: Vec<&str> = source.split_whitespace().collect();
        if alternatives.is_empty() {
            return Err("Tag pattern cannot be empty".to_string());
        }

        let mut translated = Vec::with_capacity(alternatives.len());
        for alt in &alternatives {
            translated.push(translate(alt)?);
        }

        let regex = Regex::new(&format!("^(?:{})$", translated.join("|")))
            .map_err(|e| format!("Invalid tag pattern '{}': {}", source, e))?;

        Ok(Self { source, regex })
    }

    /// Pattern matching every tag
    pub fn match_all() -> Self {
        // `**` always translates to `.*`
        Self {
            source: MATCH_ALL.to_string(),
            regex: Regex::new("^(?:.*)$").expect("static regex"),
        }
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.regex.is_match(tag)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether one of the alternatives is the bare `**` pattern
    pub fn is_catch_all(&self) -> bool {
        self.source.split_whitespace().any(|alt| alt == MATCH_ALL)
    }
}

fn translate(pattern: &str) -> Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let after = chars.get(i + 2).copied();

        match c {
            // `.**` at the end or before another `.` makes the whole trailing part optional
            '.' if next == Some('*') && after == Some('*') && matches!(chars.get(i + 3), None | Some('.')) => {
                out.push_str(r"(?:\..*)?");
                i += 3;
            }
            '*' if next == Some('*') => {
                if i == 0 && after == Some('.') {
                    out.push_str(r"(?:.*\.)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str(r"[^.]*");
                i += 1;
            }
            '{' => {
                depth += 1;
                out.push_str("(?:");
                i += 1;
            }
            ',' if depth > 0 => {
                out.push('|');
                i += 1;
            }
            '}' => {
                if depth == 0 {
                    return Err(format!("Unbalanced '}}' in tag pattern '{}'", pattern));
                }
                depth -= 1;
                out.push(')');
                i += 1;
            }
            _ => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }

    if depth != 0 {
        return Err(format!("Unbalanced '{{' in tag pattern '{}'", pattern));
    }

    Ok(out)
}

impl PartialEq for TagPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for TagPattern {}

impl fmt::Debug for TagPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TagPattern").field(&self.source).finish()
    }
}

impl fmt::Display for TagPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_all() {
        let p = TagPattern::match_all();
        assert!(p.matches(""));
        assert!(p.matches("a"));
        assert!(p.matches("kubernetes.var.log.pods.x"));
        assert!(p.is_catch_all());
        assert_eq!(p, TagPattern::new("**").unwrap());
    }

    #[test]
    fn test_single_star_stays_in_one_part() {
        let p = TagPattern::new("a.*").unwrap();
        assert!(p.matches("a.b"));
        assert!(!p.matches("a"));
        assert!(!p.matches("a.b.c"));
    }

    #[test]
    fn test_trailing_double_star_is_optional() {
        let p = TagPattern::new("a.**").unwrap();
        assert!(p.matches("a"));
        assert!(p.matches("a.b"));
        assert!(p.matches("a.b.c"));
        assert!(!p.matches("ab"));
    }

    #[test]
    fn test_double_star_inside_part() {
        let p = TagPattern::new("kubernetes.var.log.pods.openshift-*_**").unwrap();
        assert!(p.matches("kubernetes.var.log.pods.openshift-dns_dns-default-x_uid.dns.0.log"));
        assert!(!p.matches("kubernetes.var.log.pods.myapp_pod_uid.app.0.log"));

        let p = TagPattern::new("journal.system**").unwrap();
        assert!(p.matches("journal.system"));
        assert!(p.matches("journal.system.kubelet"));
        assert!(!p.matches("journal.user"));
    }

    #[test]
    fn test_leading_double_star() {
        let p = TagPattern::new("**.log").unwrap();
        assert!(p.matches("log"));
        assert!(p.matches("a.b.log"));
        assert!(!p.matches("a.b.logs"));
    }

    #[test]
    fn test_alternatives_and_braces() {
        let p = TagPattern::new("linux-audit.log** k8s-audit.log**").unwrap();
        assert!(p.matches("k8s-audit.log"));
        assert!(p.matches("linux-audit.log.1"));
        assert!(!p.matches("ovn-audit.log"));
        assert!(!p.is_catch_all());

        let p = TagPattern::new("app.{web,api}").unwrap();
        assert!(p.matches("app.web"));
        assert!(p.matches("app.api"));
        assert!(!p.matches("app.db"));
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let p = TagPattern::new("a+b.c").unwrap();
        assert!(p.matches("a+b.c"));
        assert!(!p.matches("aab.c"));
        assert!(!p.matches("a+bxc"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(TagPattern::new("").is_err());
        assert!(TagPattern::new("   ").is_err());
        assert!(TagPattern::new("a.{b,c").is_err());
        assert!(TagPattern::new("a.b}").is_err());
    }
}
