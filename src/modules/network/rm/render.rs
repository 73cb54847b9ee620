//! Command renderer and Jinja evaluation
//!
//! Rendering turns one fact-tree entry into one CLI command through a
//! rule's setval (or its negation). The same Jinja environment evaluates
//! parser result templates in [`super::parser`].

use super::template::{Negation, RmTemplate, Setval};
use super::{RmError, RmResult};
use minijinja::{Environment, UndefinedBehavior};
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

/// Shared environment. Undefined names (and attributes of undefined names)
/// render as empty strings.
static ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    env
});

/// Render a template string against a fact-tree value.
pub fn render_template(source: &str, data: &Value) -> RmResult<String> {
    let ctx = minijinja::Value::from_serialize(data);
    Ok(ENV.render_str(source, ctx)?)
}

/// Collapse whitespace runs and trim.
pub fn normalize_command(command: &str) -> String {
    command.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn has_template(s: &str) -> bool {
    s.contains("{{") || s.contains("{%")
}

/// A string that is exactly one `{{ expr }}` block.
fn sole_expression(s: &str) -> Option<&str> {
    let inner = s.trim().strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") || inner.contains("{%") {
        return None;
    }
    Some(inner.trim())
}

/// Evaluate a result-template leaf.
///
/// A leaf consisting of a single expression keeps the expression's native
/// type (`{{ mtu|int }}` yields a number, `{{ negated is defined }}` a
/// boolean); anything else renders to a string. Undefined and `none`
/// become `null`.
fn eval_leaf(source: &str, vars: &minijinja::Value) -> RmResult<Value> {
    if let Some(expr) = sole_expression(source) {
        let compiled = ENV.compile_expression(expr)?;
        let value = compiled.eval(vars.clone())?;
        if value.is_undefined() || value.is_none() {
            return Ok(Value::Null);
        }
        return serde_json::to_value(&value).map_err(|e| {
            RmError::schema(source, format!("expression result is not representable: {}", e))
        });
    }
    if has_template(source) {
        return Ok(Value::String(ENV.render_str(source, vars.clone())?));
    }
    Ok(Value::String(source.to_string()))
}

fn eval_node(template: &Value, vars: &minijinja::Value) -> RmResult<Value> {
    match template {
        Value::String(s) => eval_leaf(s, vars),
        Value::Array(items) => items
            .iter()
            .map(|item| eval_node(item, vars))
            .collect::<RmResult<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                let key = if has_template(key) {
                    let rendered = ENV.render_str(key, vars.clone())?;
                    let rendered = rendered.trim().to_string();
                    if rendered.is_empty() {
                        return Err(RmError::EmptyKey(key.clone()));
                    }
                    rendered
                } else {
                    key.clone()
                };
                out.insert(key, eval_node(value, vars)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

/// Project captured variables through a result template.
pub fn eval_result(template: &Value, vars: &Value) -> RmResult<Value> {
    let ctx = minijinja::Value::from_serialize(vars);
    eval_node(template, &ctx)
}

impl RmTemplate {
    /// Render one command for `parser` from `data`.
    ///
    /// With `negate`, the rule's [`Negation`] decides the form. An empty
    /// rendering stays empty (no bare removal prefix).
    pub fn render(&self, data: &Value, parser: &str, negate: bool) -> RmResult<String> {
        let rule = self.require(parser)?;

        let positive = || -> RmResult<String> {
            match rule.setval {
                Setval::Template(t) => render_template(t, data),
                Setval::Func(f) => Ok(f(data)),
            }
        };

        let command = if !negate {
            normalize_command(&positive()?)
        } else {
            match rule.negation {
                Negation::Prefix => self.prefixed(&positive()?),
                Negation::Remval(t) => self.prefixed(&render_template(t, data)?),
                Negation::Custom(t) => normalize_command(&render_template(t, data)?),
            }
        };

        Ok(command)
    }

    fn prefixed(&self, command: &str) -> String {
        let command = normalize_command(command);
        if command.is_empty() {
            command
        } else {
            format!("{} {}", self.prefix(), command)
        }
    }
}
