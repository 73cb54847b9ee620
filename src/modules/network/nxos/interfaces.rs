//! nxos_interfaces
//!
//! Interface attributes keyed by interface name.
//!
//! ```text
//! interface Ethernet1/1
//!   description uplink to spine1
//!   no switchport
//!   mtu 9216
//!   speed 10000
//!   duplex full
//!   ip forward
//!   fabric forwarding mode anycast-gateway
//!   no shutdown
//! ```
//!
//! Whether an unconfigured Ethernet port is layer 2 and whether it starts
//! shut depends on `system default switchport [shutdown]`. Those defaults
//! arrive through [`OptionDefaults`] (`mode`, `enabled`) and are filled into
//! both sides before comparison so that an unset attribute compares as the
//! device's default. An Ethernet port absent from the running config is
//! taken to be at those defaults.

use crate::modules::network::rm::utils::stringify_field;
use crate::modules::network::rm::{
    KeySpec, Normalizer, OptionDefaults, ParserRule, Resource, RmEngine, RmResult, RmTemplate,
};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tracing::debug;

static TEMPLATE: Lazy<RmTemplate> = Lazy::new(|| {
    RmTemplate::try_new(vec![
        ParserRule::new("interface", r"^interface (?P<name>\S+)$")
            .setval("interface {{ name }}")
            .result(json!({"{{ name }}": {"name": "{{ name }}"}}))
            .shared(),
        ParserRule::new("description", r"^\s+description (?P<description>.+)$")
            .setval("description {{ description }}")
            .remval("description")
            .result(json!({"{{ name }}": {"description": "{{ description }}"}})),
        ParserRule::new("speed", r"^\s+speed (?P<speed>\S+)$")
            .setval("speed {{ speed }}")
            .remval("speed")
            .result(json!({"{{ name }}": {"speed": "{{ speed }}"}})),
        ParserRule::new("duplex", r"^\s+duplex (?P<duplex>\S+)$")
            .setval("duplex {{ duplex }}")
            .remval("duplex")
            .result(json!({"{{ name }}": {"duplex": "{{ duplex }}"}})),
        ParserRule::new("mtu", r"^\s+mtu (?P<mtu>\d+)$")
            .setval("mtu {{ mtu }}")
            .remval("mtu")
            .result(json!({"{{ name }}": {"mtu": "{{ mtu }}"}})),
        ParserRule::new("mode", r"^\s+(?P<negated>no )?switchport$")
            .setval("{{ 'no ' if mode == 'layer3' else '' }}switchport")
            .negate_with("{{ '' if mode == 'layer3' else 'no ' }}switchport")
            .result(json!({
                "{{ name }}": {"mode": "{{ 'layer3' if negated is defined else 'layer2' }}"}
            })),
        ParserRule::new("ip_forward", r"^\s+ip forward$")
            .setval("ip forward")
            .result(json!({"{{ name }}": {"ip_forward": true}})),
        ParserRule::new(
            "fabric_forwarding_anycast_gateway",
            r"^\s+fabric forwarding mode anycast-gateway$",
        )
        .setval("fabric forwarding mode anycast-gateway")
        .result(json!({"{{ name }}": {"fabric_forwarding_anycast_gateway": true}})),
        ParserRule::new("enabled", r"^\s+(?P<negated>no )?shutdown$")
            .setval("no shutdown")
            .negate_with("shutdown")
            .result(json!({"{{ name }}": {"enabled": "{{ negated is defined }}"}})),
    ])
    .expect("interfaces parser table is valid")
});

/// Compared in this order within each interface.
const PARSERS: &[&str] = &[
    "description",
    "speed",
    "duplex",
    "mtu",
    "mode",
    "ip_forward",
    "fabric_forwarding_anycast_gateway",
    "enabled",
];

/// Interfaces that can be created and removed.
const LOGICAL_PREFIXES: &[&str] = &["loopback", "port-channel", "vlan", "tunnel", "nve"];

fn is_logical(name: &str) -> bool {
    let name = name.to_lowercase();
    LOGICAL_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn takes_switchport_defaults(name: &str) -> bool {
    name.to_lowercase().starts_with("ethernet")
}

fn fill_defaults(entry: &mut Value, defaults: &OptionDefaults) {
    let Value::Object(map) = entry else {
        return;
    };
    for key in ["mode", "enabled"] {
        if let Some(default) = defaults.get(key) {
            map.entry(key).or_insert_with(|| default.clone());
        }
    }
}

/// The `nxos_interfaces` resource
#[derive(Debug, Clone, Copy, Default)]
pub struct Interfaces;

impl Resource for Interfaces {
    fn name(&self) -> &'static str {
        "nxos_interfaces"
    }

    fn description(&self) -> &'static str {
        "Manage interface attributes on Cisco NX-OS devices"
    }

    fn template(&self) -> &RmTemplate {
        &TEMPLATE
    }

    fn normalizer(&self) -> Normalizer {
        Normalizer::keyed(KeySpec::Field("name"), &[])
    }

    fn gather_command(&self) -> &'static str {
        "show running-config | section '^interface'"
    }

    fn uses_defaults(&self) -> bool {
        true
    }

    /// `mtu` and `speed` are kept as the device prints them.
    fn prepare(&self, entry: &mut Value) {
        stringify_field(entry, "mtu");
        stringify_field(entry, "speed");
    }

    fn compare_entry(&self, rm: &mut RmEngine<'_>, want: &Value, have: &Value) -> RmResult<()> {
        let mut want = want.clone();
        let mut have = have.clone();

        let name = want
            .get("name")
            .or_else(|| have.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if takes_switchport_defaults(&name) {
            fill_defaults(&mut want, rm.defaults());
            fill_defaults(&mut have, rm.defaults());
        }

        let entry = if want.get("name").is_some() { &want } else { &have };
        rm.context(entry, "interface", |rm| rm.compare(PARSERS, &want, &have))?;
        Ok(())
    }

    fn purge_entry(&self, rm: &mut RmEngine<'_>, have: &Value) -> RmResult<()> {
        let name = have.get("name").and_then(Value::as_str).unwrap_or_default();
        if is_logical(name) {
            rm.addcmd(have, "interface", true)
        } else {
            debug!(interface = name, "Physical interface cannot be purged, skipping");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::network::rm::{generate_commands, State};
    use pretty_assertions::assert_eq;

    fn run(want: Value, have: Value, state: State, defaults: &OptionDefaults) -> Vec<String> {
        let normalizer = Interfaces.normalizer();
        generate_commands(
            &Interfaces,
            &normalizer.normalize(&want).unwrap(),
            &normalizer.normalize(&have).unwrap(),
            state,
            defaults,
        )
        .unwrap()
    }

    fn layer2_shut() -> OptionDefaults {
        let mut defaults = OptionDefaults::new();
        defaults.insert("mode".to_string(), json!("layer2"));
        defaults.insert("enabled".to_string(), json!(false));
        defaults
    }

    #[test]
    fn test_parse_interfaces() {
        let text = "\
interface Ethernet1/1
  description uplink to spine1
  no switchport
  mtu 9216
  ip forward
  no shutdown
interface loopback0
  description router id
";
        assert_eq!(
            Interfaces.parse_facts(text),
            json!([
                {
                    "name": "Ethernet1/1",
                    "description": "uplink to spine1",
                    "mode": "layer3",
                    "mtu": "9216",
                    "ip_forward": true,
                    "enabled": true
                },
                {"name": "loopback0", "description": "router id"}
            ])
        );
    }

    #[test]
    fn test_replaced_resets_to_defaults() {
        let have = json!([{
            "name": "Ethernet1/1",
            "description": "old",
            "mode": "layer3",
            "mtu": "9216",
            "enabled": true
        }]);
        let want = json!([{"name": "Ethernet1/1", "description": "old"}]);
        assert_eq!(
            run(want, have, State::Replaced, &layer2_shut()),
            vec!["interface Ethernet1/1", "no mtu", "switchport", "shutdown"]
        );
    }

    #[test]
    fn test_merged_defaults_cause_no_churn() {
        let have = json!([{"name": "Ethernet1/1", "description": "old"}]);
        let want = json!([{"name": "Ethernet1/1", "description": "new"}]);
        assert_eq!(
            run(want, have, State::Merged, &layer2_shut()),
            vec!["interface Ethernet1/1", "description new"]
        );
    }

    #[test]
    fn test_deleted_keeps_interface() {
        let have = json!([{"name": "Ethernet1/2", "description": "x", "speed": "1000"}]);
        assert_eq!(
            run(json!([{"name": "Ethernet1/2"}]), have, State::Deleted, &OptionDefaults::new()),
            vec!["interface Ethernet1/2", "no description", "no speed"]
        );
    }

    #[test]
    fn test_purged_only_logical() {
        let have = json!([
            {"name": "Ethernet1/1", "description": "phys"},
            {"name": "loopback10", "description": "lo"},
            {"name": "port-channel5"}
        ]);
        assert_eq!(
            run(json!([]), have, State::Purged, &OptionDefaults::new()),
            vec!["no interface loopback10", "no interface port-channel5"]
        );
    }

    #[test]
    fn test_mode_rendering() {
        assert_eq!(
            TEMPLATE.render(&json!({"mode": "layer3"}), "mode", false).unwrap(),
            "no switchport"
        );
        assert_eq!(
            TEMPLATE.render(&json!({"mode": "layer2"}), "mode", false).unwrap(),
            "switchport"
        );
        assert_eq!(
            TEMPLATE.render(&json!({"mode": "layer2"}), "mode", true).unwrap(),
            "no switchport"
        );
    }

    #[test]
    fn test_numeric_mtu_and_speed_match_device_text() {
        let have = Interfaces.parse_facts("interface Ethernet1/1\n  mtu 9216\n  speed 10000\n");
        let want = json!([{"name": "Ethernet1/1", "mtu": 9216, "speed": 10000}]);
        for state in [State::Merged, State::Replaced] {
            assert_eq!(
                run(want.clone(), have.clone(), state, &OptionDefaults::new()),
                Vec::<String>::new()
            );
        }

        let want = json!([{"name": "Ethernet1/1", "mtu": 1500}]);
        assert_eq!(
            run(want, have, State::Merged, &OptionDefaults::new()),
            vec!["interface Ethernet1/1", "mtu 1500"]
        );
    }

    #[test]
    fn test_unconfigured_port_starts_at_defaults() {
        let want = json!([{"name": "Ethernet1/5", "description": "server"}]);
        assert_eq!(
            run(want, json!([]), State::Merged, &layer2_shut()),
            vec!["interface Ethernet1/5", "description server"]
        );

        let want = json!([{"name": "Ethernet1/5", "enabled": false, "mode": "layer2"}]);
        assert!(run(want, json!([]), State::Replaced, &layer2_shut()).is_empty());

        let want = json!([{"name": "Ethernet1/5", "enabled": true}]);
        assert_eq!(
            run(want, json!([]), State::Merged, &layer2_shut()),
            vec!["interface Ethernet1/5", "no shutdown"]
        );
    }
}
