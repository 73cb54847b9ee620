//! nxos_ntp_global
//!
//! Device-wide NTP settings. There is no configuration context; every
//! command is top level.
//!
//! ```text
//! ntp authenticate
//! ntp logging
//! ntp master 8
//! ntp source-interface loopback0
//! ntp server 192.0.2.10 prefer use-vrf management key 1
//! ntp peer 192.0.2.20 use-vrf default
//! ntp trusted-key 1
//! ```

use crate::modules::network::rm::utils::{integer_field, integer_value};
use crate::modules::network::rm::{
    KeySpec, ListSpec, Normalizer, ParserRule, Resource, RmEngine, RmResult, RmTemplate, State,
};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

const LISTS: &[ListSpec] = &[
    ListSpec::new("servers", KeySpec::Field("server")),
    ListSpec::new("peers", KeySpec::Field("peer")),
    ListSpec::new("trusted_keys", KeySpec::Value),
];

static TEMPLATE: Lazy<RmTemplate> = Lazy::new(|| {
    RmTemplate::try_new(vec![
        ParserRule::new("authenticate", r"^ntp authenticate$")
            .setval("ntp authenticate")
            .result(json!({"authenticate": true})),
        ParserRule::new("logging", r"^ntp logging$")
            .setval("ntp logging")
            .result(json!({"logging": true})),
        ParserRule::new("master.stratum", r"^ntp master(?: (?P<stratum>\d+))?$")
            .setval("ntp master {{ master.stratum }}")
            .remval("ntp master")
            .result(json!({"master": {"stratum": "{{ stratum|int if stratum is defined else 8 }}"}})),
        ParserRule::new("source_interface", r"^ntp source-interface (?P<source_interface>\S+)$")
            .setval("ntp source-interface {{ source_interface }}")
            .remval("ntp source-interface")
            .result(json!({"source_interface": "{{ source_interface }}"})),
        ParserRule::new(
            "servers",
            r"^ntp server (?P<server>\S+)(?P<prefer> prefer)?(?: use-vrf (?P<use_vrf>\S+))?(?: key (?P<key_id>\d+))?(?: maxpoll (?P<maxpoll>\d+))?(?: minpoll (?P<minpoll>\d+))?$",
        )
        .setval(concat!(
            "ntp server {{ server }}",
            "{% if prefer %} prefer{% endif %}",
            "{% if use_vrf %} use-vrf {{ use_vrf }}{% endif %}",
            "{% if key_id %} key {{ key_id }}{% endif %}",
            "{% if maxpoll %} maxpoll {{ maxpoll }}{% endif %}",
            "{% if minpoll %} minpoll {{ minpoll }}{% endif %}",
        ))
        .remval("ntp server {{ server }}{% if use_vrf %} use-vrf {{ use_vrf }}{% endif %}")
        .result(json!({
            "servers": [{
                "server": "{{ server }}",
                "prefer": "{{ true if prefer is defined }}",
                "use_vrf": "{{ use_vrf }}",
                "key_id": "{{ key_id|int if key_id is defined }}",
                "maxpoll": "{{ maxpoll|int if maxpoll is defined }}",
                "minpoll": "{{ minpoll|int if minpoll is defined }}"
            }]
        })),
        ParserRule::new(
            "peers",
            r"^ntp peer (?P<peer>\S+)(?P<prefer> prefer)?(?: use-vrf (?P<use_vrf>\S+))?(?: key (?P<key_id>\d+))?(?: maxpoll (?P<maxpoll>\d+))?(?: minpoll (?P<minpoll>\d+))?$",
        )
        .setval(concat!(
            "ntp peer {{ peer }}",
            "{% if prefer %} prefer{% endif %}",
            "{% if use_vrf %} use-vrf {{ use_vrf }}{% endif %}",
            "{% if key_id %} key {{ key_id }}{% endif %}",
            "{% if maxpoll %} maxpoll {{ maxpoll }}{% endif %}",
            "{% if minpoll %} minpoll {{ minpoll }}{% endif %}",
        ))
        .remval("ntp peer {{ peer }}{% if use_vrf %} use-vrf {{ use_vrf }}{% endif %}")
        .result(json!({
            "peers": [{
                "peer": "{{ peer }}",
                "prefer": "{{ true if prefer is defined }}",
                "use_vrf": "{{ use_vrf }}",
                "key_id": "{{ key_id|int if key_id is defined }}",
                "maxpoll": "{{ maxpoll|int if maxpoll is defined }}",
                "minpoll": "{{ minpoll|int if minpoll is defined }}"
            }]
        })),
        ParserRule::new("trusted_keys", r"^ntp trusted-key (?P<key>\d+)$")
            .setval("ntp trusted-key {{ item }}")
            .result(json!({"trusted_keys": ["{{ key|int }}"]})),
    ])
    .expect("ntp_global parser table is valid")
});

const PARSERS: &[&str] = &["authenticate", "logging", "master.stratum", "source_interface"];

/// Numeric options of a server or peer; the parser yields integers.
const ASSOCIATION_NUMBERS: &[&str] = &["key_id", "maxpoll", "minpoll"];

fn prepare_associations(entry: &mut Value, field: &str) {
    let Some(Value::Object(associations)) = entry.get_mut(field) else {
        return;
    };
    for association in associations.values_mut() {
        for number in ASSOCIATION_NUMBERS {
            integer_field(association, number);
        }
    }
}

/// The `nxos_ntp_global` resource
#[derive(Debug, Clone, Copy, Default)]
pub struct NtpGlobal;

impl Resource for NtpGlobal {
    fn name(&self) -> &'static str {
        "nxos_ntp_global"
    }

    fn description(&self) -> &'static str {
        "Manage NTP settings on Cisco NX-OS devices"
    }

    fn template(&self) -> &RmTemplate {
        &TEMPLATE
    }

    fn normalizer(&self) -> Normalizer {
        Normalizer::single(LISTS)
    }

    fn gather_command(&self) -> &'static str {
        "show running-config ntp"
    }

    fn supported_states(&self) -> &'static [State] {
        &[
            State::Merged,
            State::Replaced,
            State::Overridden,
            State::Deleted,
            State::Gathered,
            State::Parsed,
            State::Rendered,
        ]
    }

    /// Key ids and polling intervals may be written as strings.
    fn prepare(&self, entry: &mut Value) {
        if let Some(master) = entry.get_mut("master") {
            integer_field(master, "stratum");
        }
        prepare_associations(entry, "servers");
        prepare_associations(entry, "peers");
        if let Some(Value::Object(keys)) = entry.get_mut("trusted_keys") {
            keys.values_mut().for_each(integer_value);
        }
    }

    fn compare_entry(&self, rm: &mut RmEngine<'_>, want: &Value, have: &Value) -> RmResult<()> {
        rm.compare(PARSERS, want, have)?;
        for list in ["servers", "peers", "trusted_keys"] {
            rm.compare_list(list, want, have)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::network::rm::{generate_commands, OptionDefaults, RmError};
    use pretty_assertions::assert_eq;

    fn run(want: Value, have: Value, state: State) -> RmResult<Vec<String>> {
        let normalizer = NtpGlobal.normalizer();
        generate_commands(
            &NtpGlobal,
            &normalizer.normalize(&want).unwrap(),
            &normalizer.normalize(&have).unwrap(),
            state,
            &OptionDefaults::new(),
        )
    }

    #[test]
    fn test_parse_ntp() {
        let text = "\
!Command: show running-config ntp
ntp authenticate
ntp master
ntp source-interface loopback0
ntp server 192.0.2.10 prefer use-vrf management key 1
ntp server 192.0.2.11 maxpoll 10 minpoll 4
ntp peer 192.0.2.20 use-vrf default
ntp trusted-key 1
ntp trusted-key 2
";
        assert_eq!(
            NtpGlobal.parse_facts(text),
            json!({
                "authenticate": true,
                "master": {"stratum": 8},
                "source_interface": "loopback0",
                "servers": [
                    {"server": "192.0.2.10", "prefer": true, "use_vrf": "management", "key_id": 1},
                    {"server": "192.0.2.11", "maxpoll": 10, "minpoll": 4}
                ],
                "peers": [{"peer": "192.0.2.20", "use_vrf": "default"}],
                "trusted_keys": [1, 2]
            })
        );
    }

    #[test]
    fn test_replaced_servers() {
        let have = json!({
            "logging": true,
            "servers": [
                {"server": "192.0.2.10", "prefer": true, "use_vrf": "management"},
                {"server": "192.0.2.11", "use_vrf": "management"}
            ]
        });
        let want = json!({
            "logging": true,
            "servers": [{"server": "192.0.2.10", "use_vrf": "management", "key_id": 2}]
        });
        assert_eq!(
            run(want, have, State::Replaced).unwrap(),
            vec![
                "ntp server 192.0.2.10 use-vrf management key 2",
                "no ntp server 192.0.2.11 use-vrf management"
            ]
        );
    }

    #[test]
    fn test_deleted_clears_everything() {
        let have = json!({"authenticate": true, "master": {"stratum": 8}, "trusted_keys": [1]});
        assert_eq!(
            run(json!({}), have, State::Deleted).unwrap(),
            vec!["no ntp authenticate", "no ntp master", "no ntp trusted-key 1"]
        );
    }

    #[test]
    fn test_purged_is_unsupported() {
        let err = run(json!({}), json!({"logging": true}), State::Purged).unwrap_err();
        assert!(matches!(err, RmError::UnsupportedState { state: State::Purged, .. }));
    }

    #[test]
    fn test_string_keys_match_parsed_integers() {
        let have = NtpGlobal.parse_facts(
            "ntp master 4\nntp server 192.0.2.10 key 1 maxpoll 10\nntp trusted-key 1\n",
        );
        let want = json!({
            "master": {"stratum": "4"},
            "servers": [{"server": "192.0.2.10", "key_id": "1", "maxpoll": "10"}],
            "trusted_keys": ["1"]
        });
        for state in [State::Merged, State::Replaced] {
            assert_eq!(run(want.clone(), have.clone(), state).unwrap(), Vec::<String>::new());
        }

        let want = json!({"trusted_keys": ["1", "2"]});
        assert_eq!(
            run(want, have, State::Merged).unwrap(),
            vec!["ntp trusted-key 2"]
        );
    }
}
