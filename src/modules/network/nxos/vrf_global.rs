//! nxos_vrf_global
//!
//! VRF contexts keyed by name, with their domain settings and static
//! routes.
//!
//! ```text
//! vrf context red
//!   description tenant red
//!   vni 5000
//!   rd auto
//!   ip domain-name red.example.com
//!   ip domain-list a.example.com
//!   ip route 10.0.0.0/8 192.0.2.1 tag 5
//! ```
//!
//! Static routes are identified by destination and next hop (address,
//! interface and next-hop VRF); `tag`, `name`, `track` and preference are
//! attributes of a route. Re-adding a route with new attributes replaces
//! it on the device, so changing only those never emits a removal.

use crate::modules::network::rm::{
    KeySpec, ListSpec, Normalizer, ParserRule, Resource, RmEngine, RmResult, RmTemplate,
};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tracing::debug;

const ROUTE_KEY: &[&str] = &["source", "forward_router_address", "interface", "vrf"];

const LISTS: &[ListSpec] = &[
    ListSpec::new("ip.domain_list", KeySpec::Value),
    ListSpec::new("ip.route", KeySpec::Composite(ROUTE_KEY)),
];

/// VRFs that always exist.
const PERMANENT_VRFS: &[&str] = &["management", "default"];

static TEMPLATE: Lazy<RmTemplate> = Lazy::new(|| {
    RmTemplate::try_new(vec![
        ParserRule::new("vrf", r"^vrf context (?P<name>\S+)$")
            .setval("vrf context {{ name }}")
            .result(json!({"{{ name }}": {"name": "{{ name }}"}}))
            .shared(),
        ParserRule::new("description", r"^\s+description (?P<description>.+)$")
            .setval("description {{ description }}")
            .remval("description")
            .result(json!({"{{ name }}": {"description": "{{ description }}"}})),
        ParserRule::new("vni", r"^\s+vni (?P<vni>\d+)(?: l3)?$")
            .setval("vni {{ vni }}")
            .result(json!({"{{ name }}": {"vni": "{{ vni|int }}"}})),
        ParserRule::new("rd", r"^\s+rd (?P<rd>\S+)$")
            .setval("rd {{ rd }}")
            .result(json!({"{{ name }}": {"rd": "{{ rd }}"}})),
        ParserRule::new("shutdown", r"^\s+shutdown$")
            .setval("shutdown")
            .result(json!({"{{ name }}": {"shutdown": true}})),
        ParserRule::new("ip.domain_name", r"^\s+ip domain-name (?P<domain_name>\S+)$")
            .setval("ip domain-name {{ ip.domain_name }}")
            .result(json!({"{{ name }}": {"ip": {"domain_name": "{{ domain_name }}"}}})),
        ParserRule::new("ip.domain_list", r"^\s+ip domain-list (?P<domain>\S+)$")
            .setval("ip domain-list {{ item }}")
            .result(json!({"{{ name }}": {"ip": {"domain_list": ["{{ domain }}"]}}})),
        ParserRule::new(
            "ip.route",
            r"(?x)
            ^\s+ip\ route\ (?P<source>\S+)
            (?:\ (?P<interface>[A-Za-z][A-Za-z-]*\d\S*))?
            (?:\ (?P<forward_router_address>[0-9a-fA-F:]*[.:][0-9a-fA-F.:]*))?
            (?:\ vrf\ (?P<dest_vrf>\S+))?
            (?:\ track\ (?P<track>\d+))?
            (?:\ name\ (?P<route_name>\S+))?
            (?:\ tag\ (?P<tag>\d+))?
            (?:\ (?P<route_pref>\d+))?
            $",
        )
        .setval(concat!(
            "ip route {{ source }}",
            "{% if interface %} {{ interface }}{% endif %}",
            "{% if forward_router_address %} {{ forward_router_address }}{% endif %}",
            "{% if vrf %} vrf {{ vrf }}{% endif %}",
            "{% if track %} track {{ track }}{% endif %}",
            "{% if name %} name {{ name }}{% endif %}",
            "{% if tag %} tag {{ tag }}{% endif %}",
            "{% if route_pref %} {{ route_pref }}{% endif %}",
        ))
        .remval(concat!(
            "ip route {{ source }}",
            "{% if interface %} {{ interface }}{% endif %}",
            "{% if forward_router_address %} {{ forward_router_address }}{% endif %}",
            "{% if vrf %} vrf {{ vrf }}{% endif %}",
        ))
        .result(json!({
            "{{ name }}": {
                "ip": {
                    "route": [{
                        "source": "{{ source }}",
                        "interface": "{{ interface }}",
                        "forward_router_address": "{{ forward_router_address }}",
                        "vrf": "{{ dest_vrf }}",
                        "track": "{{ track|int if track is defined }}",
                        "name": "{{ route_name }}",
                        "tag": "{{ tag|int if tag is defined }}",
                        "route_pref": "{{ route_pref|int if route_pref is defined }}"
                    }]
                }
            }
        })),
    ])
    .expect("vrf_global parser table is valid")
});

const PARSERS: &[&str] = &["description", "vni", "rd", "shutdown", "ip.domain_name"];

/// The `nxos_vrf_global` resource
#[derive(Debug, Clone, Copy, Default)]
pub struct VrfGlobal;

impl Resource for VrfGlobal {
    fn name(&self) -> &'static str {
        "nxos_vrf_global"
    }

    fn description(&self) -> &'static str {
        "Manage VRF contexts on Cisco NX-OS devices"
    }

    fn template(&self) -> &RmTemplate {
        &TEMPLATE
    }

    fn normalizer(&self) -> Normalizer {
        Normalizer::keyed(KeySpec::Field("name"), LISTS)
    }

    fn gather_command(&self) -> &'static str {
        "show running-config | section '^vrf context'"
    }

    fn compare_entry(&self, rm: &mut RmEngine<'_>, want: &Value, have: &Value) -> RmResult<()> {
        let entry = if want.get("name").is_some() { want } else { have };
        rm.context(entry, "vrf", |rm| {
            rm.compare(PARSERS, want, have)?;
            rm.compare_list("ip.domain_list", want, have)?;
            rm.compare_list("ip.route", want, have)
        })?;
        Ok(())
    }

    fn purge_entry(&self, rm: &mut RmEngine<'_>, have: &Value) -> RmResult<()> {
        let name = have.get("name").and_then(Value::as_str).unwrap_or_default();
        if PERMANENT_VRFS.contains(&name) {
            debug!(vrf = name, "VRF cannot be removed, skipping");
            return Ok(());
        }
        rm.addcmd(have, "vrf", true)
    }
}
