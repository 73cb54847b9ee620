//! Config parser
//!
//! Converts running-config text into a structured fact tree by scanning it
//! line by line against a resource's rule table.
//!
//! Addressing works through a context stack. A shared rule (such as
//! `interface X` or `router bgp N`) pushes its captures for the lines
//! indented beneath it; a line at the same or shallower indentation closes
//! the contexts opened at or below its own column. For flat configurations
//! this reduces to "the last shared match stays in effect".

use super::render::eval_result;
use super::template::RmTemplate;
use super::utils::{merge_into, remove_empties};
use serde_json::{Map, Value};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    indent: usize,
    raw: &'a str,
}

/// Non-blank, non-comment lines with their indentation.
fn logical_lines(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .map(|raw| raw.trim_end())
        .filter_map(|raw| {
            let trimmed = raw.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('!') || trimmed.starts_with('#') {
                return None;
            }
            Some(Line {
                indent: raw.len() - trimmed.len(),
                raw,
            })
        })
        .collect()
}

/// Index one past the last line of the block headed by `lines[start]`.
fn block_end(lines: &[Line<'_>], start: usize) -> usize {
    let indent = lines[start].indent;
    lines[start + 1..]
        .iter()
        .position(|line| line.indent <= indent)
        .map_or(lines.len(), |offset| start + 1 + offset)
}

#[derive(Debug, Default)]
struct ContextStack {
    frames: Vec<(usize, Map<String, Value>)>,
}

impl ContextStack {
    /// Drop contexts opened at or deeper than `indent`.
    fn close_from(&mut self, indent: usize) {
        while self.frames.last().is_some_and(|(i, _)| *i >= indent) {
            self.frames.pop();
        }
    }

    fn open(&mut self, indent: usize, captures: Map<String, Value>) {
        self.frames.push((indent, captures));
    }

    /// Context variables overlaid with `captures`; inner frames win over
    /// outer ones and captures win over all.
    fn vars_with(&self, captures: &Map<String, Value>) -> Value {
        let mut vars = Map::new();
        for (_, frame) in &self.frames {
            for (k, v) in frame {
                vars.insert(k.clone(), v.clone());
            }
        }
        for (k, v) in captures {
            vars.insert(k.clone(), v.clone());
        }
        Value::Object(vars)
    }
}

impl RmTemplate {
    /// Parse running-config text into a fact tree.
    ///
    /// Lines no rule recognises are skipped. A rule whose result template
    /// cannot be evaluated for a line does not apply, and the next rule is
    /// tried.
    pub fn parse(&self, text: &str) -> Value {
        let lines = logical_lines(text);
        let mut facts = Value::Object(Map::new());
        let mut stack = ContextStack::default();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            stack.close_from(line.indent);

            let mut consumed = 1;
            let mut matched = false;

            for compiled in self.compiled() {
                let rule = &compiled.rule;
                let end = if rule.multiline { block_end(&lines, i) } else { i + 1 };
                let candidate = if rule.multiline {
                    lines[i..end]
                        .iter()
                        .map(|l| l.raw)
                        .collect::<Vec<_>>()
                        .join("\n")
                } else {
                    line.raw.to_string()
                };

                let Some(caps) = compiled.pattern.captures(&candidate) else {
                    continue;
                };

                let mut captures = Map::new();
                for name in compiled.pattern.capture_names().flatten() {
                    if let Some(m) = caps.name(name) {
                        captures.insert(name.to_string(), Value::String(m.as_str().to_string()));
                    }
                }

                let vars = stack.vars_with(&captures);
                match eval_result(&rule.result, &vars) {
                    Ok(result) => {
                        trace!(rule = rule.name, line = line.raw, "Matched line");
                        merge_into(&mut facts, remove_empties(&result));
                        if rule.shared {
                            stack.open(line.indent, captures);
                        }
                        consumed = end - i;
                        matched = true;
                        break;
                    }
                    Err(e) => {
                        debug!(rule = rule.name, line = line.raw, error = %e, "Rule does not apply");
                    }
                }
            }

            if !matched {
                debug!(line = line.raw, "Skipping unrecognised line");
            }
            i += consumed;
        }

        remove_empties(&facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::network::rm::ParserRule;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn interfaces() -> RmTemplate {
        RmTemplate::try_new(vec![
            ParserRule::new("interface", r"^interface (?P<name>\S+)$")
                .setval("interface {{ name }}")
                .result(json!({"{{ name }}": {"name": "{{ name }}"}}))
                .shared(),
            ParserRule::new("description", r"^\s+description (?P<description>.+)$")
                .setval("description {{ description }}")
                .result(json!({"{{ name }}": {"description": "{{ description }}"}})),
            ParserRule::new("enabled", r"^\s+(?P<negated>no )?shutdown$")
                .setval("no shutdown")
                .result(json!({"{{ name }}": {"enabled": "{{ negated is defined }}"}})),
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_flat_contexts() {
        let text = "\
interface Ethernet1/1
  description uplink
  no shutdown
!
interface Ethernet1/2
  shutdown
";
        assert_eq!(
            interfaces().parse(text),
            json!({
                "Ethernet1/1": {"name": "Ethernet1/1", "description": "uplink", "enabled": true},
                "Ethernet1/2": {"name": "Ethernet1/2", "enabled": false}
            })
        );
    }

    #[test]
    fn test_parse_skips_unknown_and_orphan_lines() {
        let text = "\
  description orphan
feature bgp
interface Ethernet1/1
  speed 1000
  description kept
";
        // The orphan line renders an empty key, so its rule does not apply
        assert_eq!(
            interfaces().parse(text),
            json!({"Ethernet1/1": {"name": "Ethernet1/1", "description": "kept"}})
        );
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(interfaces().parse(""), json!({}));
        assert_eq!(interfaces().parse("!\n\n# comment\n"), json!({}));
    }

    #[test]
    fn test_parse_nested_contexts() {
        let tmplt = RmTemplate::try_new(vec![
            ParserRule::new("as_number", r"^router bgp (?P<as_number>\S+)$")
                .result(json!({"as_number": "{{ as_number }}"}))
                .shared(),
            ParserRule::new("vrf", r"^\s+vrf (?P<vrf>\S+)$")
                .result(json!({"vrfs": {"{{ vrf }}": {"vrf": "{{ vrf }}"}}}))
                .shared(),
            ParserRule::new("router_id", r"^\s+router-id (?P<router_id>\S+)$")
                .result(json!({"vrfs": {"{{ vrf|default('default') }}": {"router_id": "{{ router_id }}"}}})),
        ])
        .unwrap();

        let text = "\
router bgp 65000
  router-id 10.0.0.1
  vrf blue
    router-id 10.1.1.1
  vrf red
    router-id 10.2.2.2
";
        assert_eq!(
            tmplt.parse(text),
            json!({
                "as_number": "65000",
                "vrfs": {
                    "default": {"router_id": "10.0.0.1"},
                    "blue": {"vrf": "blue", "router_id": "10.1.1.1"},
                    "red": {"vrf": "red", "router_id": "10.2.2.2"}
                }
            })
        );
    }

    #[test]
    fn test_parse_list_attribute_accumulates() {
        let tmplt = RmTemplate::try_new(vec![
            ParserRule::new("vrf", r"^vrf context (?P<name>\S+)$")
                .result(json!({"{{ name }}": {"name": "{{ name }}"}}))
                .shared(),
            ParserRule::new("ip.domain_list", r"^\s+ip domain-list (?P<domain>\S+)$")
                .result(json!({"{{ name }}": {"ip": {"domain_list": ["{{ domain }}"]}}})),
        ])
        .unwrap();

        let text = "\
vrf context red
  ip domain-list a.example.com
  ip domain-list b.example.com
  ip domain-list a.example.com
";
        assert_eq!(
            tmplt.parse(text),
            json!({"red": {"name": "red", "ip": {"domain_list": ["a.example.com", "b.example.com"]}}})
        );
    }

    #[test]
    fn test_parse_multiline_block() {
        let tmplt = RmTemplate::try_new(vec![
            ParserRule::new(
                "acl",
                r"(?s)^ip access-list (?P<name>\S+)\n(?P<entries>.*)$",
            )
            .result(json!({"{{ name }}": {"name": "{{ name }}", "entries": "{{ entries }}"}}))
            .multiline(),
            ParserRule::new("hostname", r"^hostname (?P<hostname>\S+)$")
                .result(json!({"hostname": "{{ hostname }}"})),
        ])
        .unwrap();

        let text = "\
ip access-list EDGE
  10 permit ip any any
  20 deny ip any any
hostname leaf1
";
        assert_eq!(
            tmplt.parse(text),
            json!({
                "EDGE": {"name": "EDGE", "entries": "  10 permit ip any any\n  20 deny ip any any"},
                "hostname": "leaf1"
            })
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let tmplt = RmTemplate::try_new(vec![
            ParserRule::new("specific", r"^ntp master (?P<stratum>\d+)$")
                .result(json!({"master": {"stratum": "{{ stratum|int }}"}})),
            ParserRule::new("generic", r"^ntp master.*$")
                .result(json!({"master": {"bare": true}})),
        ])
        .unwrap();
        assert_eq!(tmplt.parse("ntp master 8"), json!({"master": {"stratum": 8}}));
        assert_eq!(tmplt.parse("ntp master"), json!({"master": {"bare": true}}));
    }
}
