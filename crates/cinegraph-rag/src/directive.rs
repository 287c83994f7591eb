//! Presentation directives.
//!
//! A directive is a plain-text token at the start of an answer telling the
//! UI to render a relationship graph or a ranked bar chart. Detection is an
//! ordered keyword table matched case-insensitively against the query text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// UI hint carried in front of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    ShowGraph,
    ShowBarChart,
}

impl Directive {
    pub const ALL: [Directive; 2] = [Directive::ShowGraph, Directive::ShowBarChart];

    pub fn token(&self) -> &'static str {
        match self {
            Directive::ShowGraph => "<SHOW_GRAPH>",
            Directive::ShowBarChart => "<SHOW_BAR_CHART>",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.token() == token)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One row of the rule table: any keyword hit yields the directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveRule {
    pub keywords: Vec<String>,
    pub directive: Directive,
}

impl DirectiveRule {
    pub fn new(directive: Directive, keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            directive,
        }
    }

    pub fn matches(&self, query_lower: &str) -> bool {
        self.keywords.iter().any(|k| query_lower.contains(k.as_str()))
    }
}

/// Ordered keyword table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveRules {
    rules: Vec<DirectiveRule>,
}

impl Default for DirectiveRules {
    fn default() -> Self {
        Self::new()
            .with_rule(DirectiveRule::new(
                Directive::ShowGraph,
                &["relationship", "connection", "visualize"],
            ))
            .with_rule(DirectiveRule::new(
                Directive::ShowBarChart,
                &["compare", "rating", "top", "best", "versus"],
            ))
    }
}

impl DirectiveRules {
    /// An empty table. Detects nothing.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: DirectiveRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[DirectiveRule] {
        &self.rules
    }

    /// Directives triggered by `query`, in rule order, without repeats.
    pub fn detect(&self, query: &str) -> Vec<Directive> {
        let lower = query.to_lowercase();
        let mut found = Vec::new();
        for rule in &self.rules {
            if !found.contains(&rule.directive) && rule.matches(&lower) {
                found.push(rule.directive);
            }
        }
        found
    }
}

/// Put directive tokens in front of `text`, one per line.
pub fn prepend_directives(directives: &[Directive], text: &str) -> String {
    let mut out = String::new();
    for directive in directives {
        out.push_str(directive.token());
        out.push('\n');
    }
    out.push_str(text);
    out
}

/// Split an answer into its directives and the display text.
///
/// Leading tokens are collected in order; stray tokens elsewhere in the text
/// are removed as well.
pub fn strip_directives(text: &str) -> (Vec<Directive>, String) {
    let mut directives = Vec::new();
    let mut rest = text.trim_start();

    'leading: loop {
        for directive in Directive::ALL {
            if let Some(after) = rest.strip_prefix(directive.token()) {
                if !directives.contains(&directive) {
                    directives.push(directive);
                }
                rest = after.trim_start();
                continue 'leading;
            }
        }
        break;
    }

    let mut body = rest.to_string();
    for directive in Directive::ALL {
        if body.contains(directive.token()) {
            if !directives.contains(&directive) {
                directives.push(directive);
            }
            body = body.replace(directive.token(), "");
        }
    }

    (directives, body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_detection_is_case_insensitive() {
        let rules = DirectiveRules::default();
        for query in ["Compare X and Y", "compare x and y", "COMPARE X VS Y"] {
            assert_eq!(rules.detect(query), vec![Directive::ShowBarChart], "{query}");
        }
    }

    #[test]
    fn test_detection_is_idempotent() {
        let rules = DirectiveRules::default();
        let query = "Visualize the connection between the best movies";
        assert_eq!(rules.detect(query), rules.detect(query));
        assert_eq!(
            rules.detect(query),
            vec![Directive::ShowGraph, Directive::ShowBarChart]
        );
    }

    #[test]
    fn test_plain_question_has_no_directive() {
        assert!(DirectiveRules::default()
            .detect("Who directed Inception?")
            .is_empty());
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = DirectiveRules::new().with_rule(DirectiveRule::new(Directive::ShowGraph, &["Cast"]));
        assert_eq!(rules.detect("show the CAST list"), vec![Directive::ShowGraph]);
        assert!(rules.detect("compare them").is_empty());
    }

    #[test]
    fn test_strip_leading_tokens() {
        let text = "<SHOW_BAR_CHART>\n<SHOW_GRAPH> Heat is rated higher.";
        let (directives, body) = strip_directives(text);
        assert_eq!(directives, vec![Directive::ShowBarChart, Directive::ShowGraph]);
        assert_eq!(body, "Heat is rated higher.");
    }

    #[test]
    fn test_strip_without_tokens() {
        let (directives, body) = strip_directives("  Just text. ");
        assert!(directives.is_empty());
        assert_eq!(body, "Just text.");
    }

    #[test]
    fn test_prepend_then_strip() {
        let text = prepend_directives(&[Directive::ShowGraph], "Nolan directed it.");
        assert!(text.starts_with("<SHOW_GRAPH>"));
        assert_eq!(strip_directives(&text).1, "Nolan directed it.");
    }

    #[test]
    fn test_from_token() {
        assert_eq!(
            Directive::from_token("<SHOW_GRAPH>"),
            Some(Directive::ShowGraph)
        );
        assert_eq!(Directive::from_token("<SHOW_PIE>"), None);
    }
}
