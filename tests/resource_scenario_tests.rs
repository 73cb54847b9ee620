//! End-to-end resource module scenarios
//!
//! Modules run through the registry against a replayed device or a mocked
//! transport, covering the command list, the configuration session and the
//! reported output.

mod common;

use common::*;
use mockall::mock;
use nxresource::modules::network::common::{
    DeviceTransport, ReplayTransport, TransportError, TransportResult,
};
use nxresource::modules::network::nxos::{INTERFACES, NTP_GLOBAL, VRF_GLOBAL};
use nxresource::modules::network::rm::{OptionDefaults, Resource, RmError};
use nxresource::modules::{ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleRegistry};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

mock! {
    pub Device {}

    impl DeviceTransport for Device {
        fn identifier(&self) -> String;
        fn send(&self, command: &str) -> TransportResult<String>;
        fn get_option_defaults(&self) -> TransportResult<OptionDefaults>;
    }
}

fn params(value: Value) -> ModuleParams {
    serde_json::from_value(value).unwrap()
}

fn replay(running_config: &str) -> Arc<ReplayTransport> {
    Arc::new(ReplayTransport::new("leaf1").with_running_config(running_config))
}

fn run(
    module: &str,
    args: Value,
    transport: Arc<dyn DeviceTransport>,
) -> Result<ModuleOutput, ModuleError> {
    let registry = ModuleRegistry::with_builtins();
    let context = ModuleContext::new().with_transport(transport);
    registry.execute(module, &params(args), &context)
}

// ============================================================================
// Reconciliation
// ============================================================================

#[test]
fn test_merged_interface_update() {
    let transport = replay("interface Ethernet1/1\n  description old\n");
    let output = run(
        "nxos_interfaces",
        json!({
            "state": "merged",
            "config": [{"name": "Ethernet1/1", "description": "new", "enabled": true}]
        }),
        transport.clone(),
    )
    .unwrap();

    assert!(output.changed);
    assert_eq!(
        output.commands(),
        vec!["interface Ethernet1/1", "description new", "no shutdown"]
    );
    assert_eq!(
        transport.sent(),
        vec![
            "show running-config | section '^interface'",
            "configure terminal",
            "interface Ethernet1/1",
            "description new",
            "no shutdown",
            "end",
            "show running-config | section '^interface'"
        ]
    );
    assert_eq!(
        output.data["before"],
        json!([{"name": "Ethernet1/1", "description": "old"}])
    );
    assert!(output.data.contains_key("after"));
}

#[test]
fn test_replaced_static_route_attributes() {
    let transport = replay("vrf context red\n  ip route 10.0.0.0/8 192.0.2.1 tag 5\n");
    let output = run(
        "nxos_vrf_global",
        json!({
            "state": "replaced",
            "config": [{
                "name": "red",
                "ip": {"route": [
                    {"source": "10.0.0.0/8", "forward_router_address": "192.0.2.1", "tag": 10},
                    {"source": "172.16.0.0/12", "forward_router_address": "192.0.2.2"}
                ]}
            }]
        }),
        transport.clone(),
    )
    .unwrap();

    assert_eq!(
        output.commands(),
        vec![
            "vrf context red",
            "ip route 10.0.0.0/8 192.0.2.1 tag 10",
            "ip route 172.16.0.0/12 192.0.2.2"
        ]
    );
    assert_eq!(transport.config_commands(), output.commands());
}

#[test]
fn test_purged_vrf_removes_container() {
    let transport = replay(
        "vrf context X\n  address-family ipv4 unicast\n    route-target both auto\n",
    );
    let output = run(
        "nxos_vrf_global",
        json!({"state": "purged", "config": [{"name": "X"}]}),
        transport.clone(),
    )
    .unwrap();

    assert_eq!(output.commands(), vec!["no vrf context X"]);
    assert_eq!(transport.config_commands(), vec!["no vrf context X"]);
}

#[test]
fn test_unchanged_config_sends_nothing() {
    let transport = replay(VRF_CONFIG);
    let facts = VRF_GLOBAL.parse_facts(VRF_CONFIG);
    let output = run(
        "nxos_vrf_global",
        json!({"state": "overridden", "config": facts}),
        transport.clone(),
    )
    .unwrap();

    assert!(!output.changed);
    assert!(output.commands().is_empty());
    assert!(transport.config_commands().is_empty());
}

#[test]
fn test_device_defaults_suppress_churn() {
    let running = "\
system default switchport
system default switchport shutdown
interface Ethernet1/1
  description server
";
    let config = json!([{"name": "Ethernet1/1", "description": "server"}]);

    let output = run(
        "nxos_interfaces",
        json!({"state": "replaced", "config": config}),
        replay(running),
    )
    .unwrap();
    assert!(!output.changed);

    let output = run(
        "nxos_interfaces",
        json!({
            "state": "replaced",
            "config": [{"name": "Ethernet1/1", "description": "server", "enabled": true}]
        }),
        replay(running),
    )
    .unwrap();
    assert_eq!(output.commands(), vec!["interface Ethernet1/1", "no shutdown"]);
}

#[test]
fn test_bgp_as_change_is_refused() {
    let transport = replay(BGP_CONFIG);
    let err = run(
        "nxos_bgp_global",
        json!({"state": "merged", "config": {"as_number": 65001, "router_id": "10.0.0.9"}}),
        transport.clone(),
    )
    .unwrap_err();

    assert!(matches!(err, ModuleError::Reconcile(RmError::PolicyViolation(_))));
    assert!(transport.config_commands().is_empty());
    assert!(!transport.sent().contains(&"configure terminal".to_string()));
}

#[test]
fn test_purging_another_bgp_instance_sends_nothing() {
    let transport = replay(BGP_CONFIG);
    let output = run(
        "nxos_bgp_global",
        json!({"state": "purged", "config": {"as_number": 65001}}),
        transport.clone(),
    )
    .unwrap();

    assert!(!output.changed);
    assert!(output.commands().is_empty());
    assert!(transport.config_commands().is_empty());
}

#[test]
fn test_numeric_mtu_is_idempotent() {
    let output = run(
        "nxos_interfaces",
        json!({"state": "merged", "config": [{"name": "Ethernet1/1", "mtu": 9216}]}),
        replay("interface Ethernet1/1\n  mtu 9216\n"),
    )
    .unwrap();
    assert!(!output.changed);
}

#[test]
fn test_check_mode_through_registry() {
    let transport = replay("interface loopback0\n  description old\n");
    let registry = ModuleRegistry::with_builtins();
    let context = ModuleContext::new()
        .with_check_mode(true)
        .with_transport(transport.clone());

    let output = registry
        .execute(
            "nxos_interfaces",
            &params(json!({"state": "deleted", "config": [{"name": "loopback0"}]})),
            &context,
        )
        .unwrap();

    assert!(output.changed);
    assert_eq!(output.commands(), vec!["interface loopback0", "no description"]);
    assert!(transport.config_commands().is_empty());
}

// ============================================================================
// Read-only states
// ============================================================================

#[test]
fn test_gathered_and_parsed_agree() {
    let gathered = run(
        "nxos_ntp_global",
        json!({"state": "gathered"}),
        replay(NTP_CONFIG),
    )
    .unwrap();
    assert!(!gathered.changed);

    let parsed = ModuleRegistry::with_builtins()
        .execute(
            "nxos_ntp_global",
            &params(json!({"state": "parsed", "running_config": NTP_CONFIG})),
            &ModuleContext::new(),
        )
        .unwrap();

    assert_eq!(gathered.data["gathered"], parsed.data["parsed"]);
    assert_eq!(parsed.data["parsed"], NTP_GLOBAL.parse_facts(NTP_CONFIG));
}

#[test]
fn test_rendered_needs_no_device() {
    let output = ModuleRegistry::with_builtins()
        .execute(
            "nxos_ntp_global",
            &params(json!({
                "state": "rendered",
                "config": {"logging": true, "trusted_keys": [3]}
            })),
            &ModuleContext::new(),
        )
        .unwrap();

    assert!(!output.changed);
    assert_eq!(output.commands(), vec!["ntp logging", "ntp trusted-key 3"]);
}

#[test]
fn test_unknown_module() {
    let err = ModuleRegistry::with_builtins()
        .execute("nxos_vlans", &params(json!({})), &ModuleContext::new())
        .unwrap_err();
    assert!(matches!(err, ModuleError::NotFound(_)));
}

// ============================================================================
// Transport failures
// ============================================================================

#[test]
fn test_partial_apply_reports_progress() {
    let mut device = MockDevice::new();
    device.expect_identifier().return_const("leaf1".to_string());
    device
        .expect_get_option_defaults()
        .returning(|| Ok(OptionDefaults::new()));
    device.expect_send().returning(|command| match command {
        c if c == INTERFACES.gather_command() => {
            Ok("interface Ethernet1/1\n  description old\n".to_string())
        }
        "description new" => Err(TransportError::CommandFailed {
            command: command.to_string(),
            message: "% Invalid command".to_string(),
        }),
        _ => Ok(String::new()),
    });

    let err = run(
        "nxos_interfaces",
        json!({"config": [{"name": "Ethernet1/1", "description": "new"}]}),
        Arc::new(device),
    )
    .unwrap_err();

    match err {
        ModuleError::Reconcile(RmError::PartialApply { applied, total, .. }) => {
            assert_eq!(applied, 1);
            assert_eq!(total, 2);
        }
        other => panic!("expected a partial apply, got {:?}", other),
    }
}

#[test]
fn test_connection_failure_on_gather() {
    let mut device = MockDevice::new();
    device.expect_identifier().return_const("leaf1".to_string());
    device
        .expect_send()
        .times(1)
        .returning(|_| Err(TransportError::ConnectionFailed("leaf1:22 refused".to_string())));

    let err = run(
        "nxos_vrf_global",
        json!({"state": "gathered"}),
        Arc::new(device),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ModuleError::Reconcile(RmError::Transport(TransportError::ConnectionFailed(_)))
    ));
}
