//! Cisco NX-OS resources

pub mod bgp_global;
pub mod interfaces;
pub mod ntp_global;
pub mod vrf_global;

pub use bgp_global::BgpGlobal;
pub use interfaces::Interfaces;
pub use ntp_global::NtpGlobal;
pub use vrf_global::VrfGlobal;

use crate::modules::network::rm::Resource;

pub static INTERFACES: Interfaces = Interfaces;
pub static VRF_GLOBAL: VrfGlobal = VrfGlobal;
pub static BGP_GLOBAL: BgpGlobal = BgpGlobal;
pub static NTP_GLOBAL: NtpGlobal = NtpGlobal;

/// Every NX-OS resource, in registration order.
pub fn resources() -> [&'static dyn Resource; 4] {
    [&INTERFACES, &VRF_GLOBAL, &BGP_GLOBAL, &NTP_GLOBAL]
}

/// Look up a resource by module name.
pub fn find(name: &str) -> Option<&'static dyn Resource> {
    resources().into_iter().find(|r| r.name() == name)
}
