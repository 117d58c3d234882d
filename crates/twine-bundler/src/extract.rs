//! Request extraction.
//!
//! A lexical scan for calls to the require-like function with a single string
//! literal argument. Nothing is parsed or evaluated, so requests built at
//! runtime (`require(name)`, `require('a' + b)`) are invisible to the bundler.

use regex::Regex;

/// Finds `require("...")` style requests in module source.
#[derive(Debug, Clone)]
pub struct RequestExtractor {
    pattern: Regex,
}

impl RequestExtractor {
    /// Build an extractor for calls to `name`.
    pub fn new(name: &str) -> Result<Self, regex::Error> {
        let pattern = format!(
            r#"(?m)(?:^|[^\w$.]){}\s*\(\s*(?:"((?:[^"\\\n]|\\.)*)"|'((?:[^'\\\n]|\\.)*)'|`([^`\\$]*)`)\s*\)"#,
            regex::escape(name)
        );
        Ok(Self {
            pattern: Regex::new(&pattern)?,
        })
    }

    /// Request literals in source order. Repeats are kept.
    pub fn extract(&self, source: &str) -> Vec<String> {
        self.pattern
            .captures_iter(source)
            .filter_map(|caps| {
                caps.get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| unescape(m.as_str()))
            })
            .filter(|request| !request.is_empty())
            .collect()
    }
}

fn unescape(literal: &str) -> String {
    if !literal.contains('\\') {
        return literal.to_string();
    }

    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
