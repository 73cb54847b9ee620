//! Template registry
//!
//! A resource's parser table: an ordered list of [`ParserRule`]s, each of
//! which knows how to recognise one attribute in running-config text and how
//! to render that attribute back into a command.

use super::{RmError, RmResult};
use indexmap::map::Entry;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::fmt;

// ============================================================================
// Rule building blocks
// ============================================================================

/// How a rule renders its positive command.
#[derive(Clone, Copy)]
pub enum Setval {
    /// Jinja template rendered against the entry
    Template(&'static str),
    /// Function called with the entry
    Func(fn(&Value) -> String),
}

impl fmt::Debug for Setval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setval::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Setval::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// How a rule renders its removal command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negation {
    /// Removal prefix followed by the rendered setval
    Prefix,
    /// Removal prefix followed by this template; for commands whose removal
    /// form must leave out optional clauses
    Remval(&'static str),
    /// This template rendered verbatim; for attributes whose inverse is a
    /// positive statement (`no shutdown` / `shutdown`)
    Custom(&'static str),
}

/// One entry of a parser table.
#[derive(Debug, Clone)]
pub struct ParserRule {
    /// Rule name; also the default comparison path into the fact tree
    pub name: &'static str,
    /// Match pattern with named captures
    pub getval: &'static str,
    /// Positive render template
    pub setval: Setval,
    /// Result template projected into the fact tree on a match
    pub result: Value,
    /// Captures of this rule become context for subsequent lines
    pub shared: bool,
    /// Comparison path when it differs from `name`
    pub compval: Option<&'static str>,
    /// Removal rendering
    pub negation: Negation,
    /// Match against the whole indented block instead of a single line
    pub multiline: bool,
}

impl ParserRule {
    /// Start a rule with a name and match pattern.
    pub fn new(name: &'static str, getval: &'static str) -> Self {
        Self {
            name,
            getval,
            setval: Setval::Template(""),
            result: Value::Null,
            shared: false,
            compval: None,
            negation: Negation::Prefix,
            multiline: false,
        }
    }

    pub fn setval(mut self, template: &'static str) -> Self {
        self.setval = Setval::Template(template);
        self
    }

    pub fn setval_fn(mut self, func: fn(&Value) -> String) -> Self {
        self.setval = Setval::Func(func);
        self
    }

    pub fn result(mut self, result: Value) -> Self {
        self.result = result;
        self
    }

    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    pub fn compval(mut self, path: &'static str) -> Self {
        self.compval = Some(path);
        self
    }

    pub fn remval(mut self, template: &'static str) -> Self {
        self.negation = Negation::Remval(template);
        self
    }

    pub fn negate_with(mut self, template: &'static str) -> Self {
        self.negation = Negation::Custom(template);
        self
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// Path into an entry used when comparing want and have.
    pub fn compare_path(&self) -> &'static str {
        self.compval.unwrap_or(self.name)
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub(crate) rule: ParserRule,
    pub(crate) pattern: Regex,
}

/// Ordered parser table, indexed by rule name.
#[derive(Debug)]
pub struct RmTemplate {
    compiled: IndexMap<&'static str, CompiledRule>,
    prefix: &'static str,
}

impl RmTemplate {
    /// Build a registry, compiling every match pattern.
    ///
    /// Rule names must be unique.
    pub fn try_new(rules: Vec<ParserRule>) -> RmResult<Self> {
        let mut compiled = IndexMap::with_capacity(rules.len());

        for rule in rules {
            let slot = match compiled.entry(rule.name) {
                Entry::Occupied(_) => return Err(RmError::DuplicateParser(rule.name.to_string())),
                Entry::Vacant(slot) => slot,
            };
            let pattern = Regex::new(rule.getval).map_err(|source| RmError::Pattern {
                rule: rule.name.to_string(),
                source,
            })?;
            slot.insert(CompiledRule { rule, pattern });
        }

        Ok(Self {
            compiled,
            prefix: "no",
        })
    }

    /// Override the removal prefix (default `no`).
    pub fn with_prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &ParserRule> {
        self.compiled.values().map(|c| &c.rule)
    }

    pub(crate) fn compiled(&self) -> impl Iterator<Item = &CompiledRule> {
        self.compiled.values()
    }

    /// Look up a rule by name.
    pub fn get(&self, name: &str) -> Option<&ParserRule> {
        self.compiled.get(name).map(|c| &c.rule)
    }

    pub(crate) fn require(&self, name: &str) -> RmResult<&ParserRule> {
        self.get(name)
            .ok_or_else(|| RmError::UnknownParser(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules() -> Vec<ParserRule> {
        vec![
            ParserRule::new("interface", r"^interface (?P<name>\S+)$")
                .setval("interface {{ name }}")
                .result(json!({"{{ name }}": {"name": "{{ name }}"}}))
                .shared(),
            ParserRule::new("description", r"^\s+description (?P<description>.+)$")
                .setval("description {{ description }}")
                .result(json!({"{{ name }}": {"description": "{{ description }}"}})),
        ]
    }

    #[test]
    fn test_registry_order_and_lookup() {
        let tmplt = RmTemplate::try_new(rules()).unwrap();
        let names: Vec<_> = tmplt.rules().map(|r| r.name).collect();
        assert_eq!(names, vec!["interface", "description"]);
        assert!(tmplt.get("description").is_some());
        assert!(tmplt.get("mtu").is_none());
        assert_eq!(tmplt.len(), 2);
        assert_eq!(tmplt.prefix(), "no");
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let mut rules = rules();
        rules.push(ParserRule::new("description", r"^desc$"));
        let err = RmTemplate::try_new(rules).unwrap_err();
        assert!(matches!(err, RmError::DuplicateParser(name) if name == "description"));
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let err = RmTemplate::try_new(vec![ParserRule::new("broken", r"^(unclosed")])
            .unwrap_err();
        assert!(matches!(err, RmError::Pattern { .. }));
    }

    #[test]
    fn test_compare_path() {
        let rule = ParserRule::new("neighbor_shutdown", r"^\s+shutdown$").compval("shutdown");
        assert_eq!(rule.compare_path(), "shutdown");
        let rule = ParserRule::new("ip.domain_name", r"^x$");
        assert_eq!(rule.compare_path(), "ip.domain_name");
    }
}
