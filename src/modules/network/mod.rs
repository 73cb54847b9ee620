//! Network Device Modules
//!
//! Declarative resource modules for Cisco NX-OS. Each module reads the
//! relevant section of the running config into structured facts, compares
//! them against the desired configuration, and sends only the commands
//! needed to reconcile the two.
//!
//! # Supported Resources
//!
//! - **nxos_interfaces**: physical and logical interface attributes
//! - **nxos_vrf_global**: VRF contexts, their domains and static routes
//! - **nxos_bgp_global**: the BGP instance, its VRFs and neighbors
//! - **nxos_ntp_global**: NTP servers, peers, keys and global options
//!
//! # Example Usage
//!
//! ```yaml
//! - name: Configure uplinks
//!   module: nxos_interfaces
//!   state: merged
//!   config:
//!     - name: Ethernet1/1
//!       description: uplink to spine1
//!       mtu: "9216"
//!       enabled: true
//! ```
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +-------------------+
//! | nxos_interfaces  |     |  ResourceModule   |
//! | nxos_vrf_global  |---->|  (Module trait)   |
//! | nxos_bgp_global  |     +-------------------+
//! | nxos_ntp_global  |        |            |
//! +------------------+        v            v
//!           |          +-----------+  +-----------------+
//!           +--------->| rm engine |  | DeviceTransport |
//!                      +-----------+  +-----------------+
//! ```

pub mod common;
pub mod nxos;
pub mod resource;
pub mod rm;

// Re-export main types for convenience
pub use common::{
    generate_facts_diff, parse_system_defaults, send_config, DeviceTransport, ReplayTransport,
    TransportError, TransportResult,
};
pub use resource::ResourceModule;

use crate::modules::ModuleRegistry;
use std::sync::Arc;

/// Register all network modules with the registry
pub fn register_network_modules(registry: &mut ModuleRegistry) {
    for resource in nxos::resources() {
        registry.register(Arc::new(ResourceModule::new(resource)));
    }
}

/// Get a list of all available network module names
pub fn network_module_names() -> Vec<&'static str> {
    nxos::resources().iter().map(|r| r.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_names() {
        let names = network_module_names();
        assert!(names.contains(&"nxos_interfaces"));
        assert!(names.contains(&"nxos_bgp_global"));
        assert_eq!(names.len(), 4);
    }
}
