//! Shared test utilities and fixtures for the nxresource test suite.
//!
//! This module provides:
//! - Captured running-config fixtures for each resource
//! - Helpers that normalise want/have and run the engine
//! - Re-indentation of rendered command lists into running-config text
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use nxresource::modules::network::rm::{
    generate_commands, OptionDefaults, Resource, RmResult, State,
};
use serde_json::Value;

// ============================================================================
// Fixtures
// ============================================================================

pub const INTERFACES_CONFIG: &str = "\
interface Ethernet1/1
  description uplink to spine1
  no switchport
  mtu 9216
  ip forward
  no shutdown
interface Ethernet1/2
  description server port
  speed 10000
  duplex full
  switchport
  shutdown
interface loopback0
  description router id
interface Vlan100
  fabric forwarding mode anycast-gateway
  no shutdown
";

pub const VRF_CONFIG: &str = "\
vrf context management
  ip route 0.0.0.0/0 192.168.1.1
vrf context red
  description tenant red
  vni 5000
  rd auto
  ip domain-name red.example.com
  ip domain-list a.example.com
  ip domain-list b.example.com
  ip route 10.0.0.0/8 192.0.2.1 tag 5
  ip route 172.16.0.0/12 Ethernet1/1 192.0.2.9 name backup 250
  address-family ipv4 unicast
    route-target both auto
vrf context blue
  shutdown
";

pub const BGP_CONFIG: &str = "\
router bgp 65000
  router-id 10.0.0.1
  log-neighbor-changes
  maxas-limit 40
  neighbor 10.0.0.2 remote-as 65001
    description spine1
    update-source loopback0
    local-as 65100
    address-family ipv4 unicast
      send-community
      send-community extended
      route-map RM-IN in
      next-hop-self
  neighbor 10.0.0.3
    remote-as 65001
    shutdown
  vrf blue
    router-id 10.1.1.1
    neighbor 10.1.1.2
      remote-as 65002
      address-family ipv4 unicast
        route-reflector-client
";

pub const NTP_CONFIG: &str = "\
!Command: show running-config ntp
ntp authenticate
ntp logging
ntp master 4
ntp source-interface loopback0
ntp server 192.0.2.10 prefer use-vrf management key 1
ntp server 192.0.2.11 maxpoll 10 minpoll 4
ntp peer 192.0.2.20 use-vrf default
ntp trusted-key 1
ntp trusted-key 2
";

// ============================================================================
// Engine helpers
// ============================================================================

/// Normalise schema-form want and have and generate commands.
pub fn try_commands_with(
    resource: &dyn Resource,
    want: &Value,
    have: &Value,
    state: State,
    defaults: &OptionDefaults,
) -> RmResult<Vec<String>> {
    let normalizer = resource.normalizer();
    generate_commands(
        resource,
        &normalizer.normalize(want)?,
        &normalizer.normalize(have)?,
        state,
        defaults,
    )
}

/// [`try_commands_with`] without platform defaults, panicking on error.
pub fn commands(resource: &dyn Resource, want: &Value, have: &Value, state: State) -> Vec<String> {
    try_commands_with(resource, want, have, state, &OptionDefaults::new())
        .unwrap_or_else(|e| panic!("{} {}: {}", resource.name(), state, e))
}

/// Commands negating something: `no ...` lines and custom inverses.
pub fn negations(commands: &[String]) -> Vec<String> {
    commands
        .iter()
        .filter(|c| c.starts_with("no ") || c.as_str() == "shutdown" || c.as_str() == "switchport")
        .cloned()
        .collect()
}

// ============================================================================
// Re-indentation
// ============================================================================

/// Turn a flat rendered command list back into indented running-config text.
///
/// Context-entry commands open a level; every other command sits one level
/// below the innermost open context.
pub fn indent_commands(commands: &[String]) -> String {
    let mut text = String::new();
    let mut depth: Option<usize> = None;
    let mut in_vrf = false;
    let mut neighbor_depth = 1;

    for command in commands {
        let level = if command.starts_with("interface ")
            || command.starts_with("vrf context ")
            || command.starts_with("router bgp ")
        {
            in_vrf = false;
            Some(0)
        } else if command.starts_with("vrf ") {
            in_vrf = true;
            Some(1)
        } else if command.starts_with("neighbor ") {
            neighbor_depth = if in_vrf { 2 } else { 1 };
            Some(neighbor_depth)
        } else if command.starts_with("address-family ") {
            Some(neighbor_depth + 1)
        } else {
            None
        };

        match level {
            Some(level) => {
                text.push_str(&"  ".repeat(level));
                depth = Some(level);
            }
            None => {
                if let Some(d) = depth {
                    text.push_str(&"  ".repeat(d + 1));
                }
            }
        }
        text.push_str(command);
        text.push('\n');
    }
    text
}
