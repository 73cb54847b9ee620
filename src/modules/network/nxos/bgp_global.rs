//! nxos_bgp_global
//!
//! The single BGP instance: global attributes, neighbors with their
//! address families, and per-VRF instances carrying the same attributes.
//!
//! ```text
//! router bgp 65000
//!   router-id 10.0.0.1
//!   log-neighbor-changes
//!   neighbor 10.0.0.2 remote-as 65001
//!     description spine1
//!     local-as 65100
//!     address-family ipv4 unicast
//!       send-community
//!       send-community extended
//!       route-map RM-IN in
//!   vrf blue
//!     router-id 10.1.1.1
//!     neighbor 10.1.1.2
//!       remote-as 65002
//! ```
//!
//! The AS number identifies the instance. It cannot be changed in place;
//! the instance has to be purged first.

use crate::modules::network::rm::utils::{
    get_from_dict, is_empty, scalar_to_string, stringify_field,
};
use crate::modules::network::rm::{
    KeySpec, ListSpec, Normalizer, ParserRule, Resource, RmEngine, RmError, RmResult, RmTemplate,
    State,
};
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

const DEFAULT_VRF: &str = "default";

const ADDRESS_FAMILIES: ListSpec =
    ListSpec::new("address_family", KeySpec::Composite(&["afi", "safi"]));
const NEIGHBORS: ListSpec = ListSpec::new("neighbors", KeySpec::Field("neighbor_address"))
    .with_children(&[ADDRESS_FAMILIES]);
const VRFS: ListSpec = ListSpec::new("vrfs", KeySpec::Field("vrf")).with_children(&[NEIGHBORS]);

static TEMPLATE: Lazy<RmTemplate> = Lazy::new(|| {
    RmTemplate::try_new(vec![
        ParserRule::new("as_number", r"^router bgp (?P<as_number>\S+)$")
            .setval("router bgp {{ as_number }}")
            .result(json!({"as_number": "{{ as_number }}"}))
            .shared(),
        ParserRule::new("vrf", r"^\s+vrf (?P<vrf>\S+)$")
            .setval("vrf {{ vrf }}")
            .result(json!({"vrfs": {"{{ vrf }}": {"vrf": "{{ vrf }}"}}}))
            .shared(),
        ParserRule::new("router_id", r"^\s+router-id (?P<router_id>\S+)$")
            .setval("router-id {{ router_id }}")
            .result(json!({
                "vrfs": {"{{ vrf|default('default') }}": {"router_id": "{{ router_id }}"}}
            })),
        ParserRule::new("log_neighbor_changes", r"^\s+log-neighbor-changes$")
            .setval("log-neighbor-changes")
            .result(json!({
                "vrfs": {"{{ vrf|default('default') }}": {"log_neighbor_changes": true}}
            })),
        ParserRule::new("maxas_limit", r"^\s+maxas-limit (?P<maxas_limit>\d+)$")
            .setval("maxas-limit {{ maxas_limit }}")
            .result(json!({
                "vrfs": {"{{ vrf|default('default') }}": {"maxas_limit": "{{ maxas_limit|int }}"}}
            })),
        ParserRule::new(
            "confederation.identifier",
            r"^\s+confederation identifier (?P<identifier>\S+)$",
        )
        .setval("confederation identifier {{ confederation.identifier }}")
        .result(json!({
            "vrfs": {
                "{{ vrf|default('default') }}": {"confederation": {"identifier": "{{ identifier }}"}}
            }
        })),
        ParserRule::new(
            "neighbor",
            r"^\s+neighbor (?P<neighbor_address>\S+)(?: remote-as (?P<remote_as>\S+))?$",
        )
        .setval("neighbor {{ neighbor_address }}")
        .result(json!({
            "vrfs": {
                "{{ vrf|default('default') }}": {
                    "neighbors": {
                        "{{ neighbor_address }}": {
                            "neighbor_address": "{{ neighbor_address }}",
                            "remote_as": "{{ remote_as }}"
                        }
                    }
                }
            }
        }))
        .shared(),
        ParserRule::new("remote_as", r"^\s+remote-as (?P<remote_as>\S+)$")
            .setval("remote-as {{ remote_as }}")
            .result(neighbor_attr(json!({"remote_as": "{{ remote_as }}"}))),
        ParserRule::new("local_as", r"^\s+local-as (?P<local_as>\S+)$")
            .setval("local-as {{ local_as }}")
            .result(neighbor_attr(json!({"local_as": "{{ local_as }}"}))),
        ParserRule::new("description", r"^\s+description (?P<description>.+)$")
            .setval("description {{ description }}")
            .remval("description")
            .result(neighbor_attr(json!({"description": "{{ description }}"}))),
        ParserRule::new("update_source", r"^\s+update-source (?P<update_source>\S+)$")
            .setval("update-source {{ update_source }}")
            .result(neighbor_attr(json!({"update_source": "{{ update_source }}"}))),
        ParserRule::new("neighbor_shutdown", r"^\s+shutdown$")
            .setval("shutdown")
            .compval("shutdown")
            .result(neighbor_attr(json!({"shutdown": true}))),
        ParserRule::new("address_family", r"^\s+address-family (?P<afi>\S+) (?P<safi>\S+)$")
            .setval("address-family {{ afi }} {{ safi }}")
            .result(neighbor_attr(json!({
                "address_family": {
                    "{{ afi ~ '_' ~ safi if afi }}": {"afi": "{{ afi }}", "safi": "{{ safi }}"}
                }
            })))
            .shared(),
        ParserRule::new("send_community.standard", r"^\s+send-community$")
            .setval("send-community")
            .result(af_attr(json!({"send_community": {"standard": true}}))),
        ParserRule::new("send_community.extended", r"^\s+send-community extended$")
            .setval("send-community extended")
            .result(af_attr(json!({"send_community": {"extended": true}}))),
        ParserRule::new("route_reflector_client", r"^\s+route-reflector-client$")
            .setval("route-reflector-client")
            .result(af_attr(json!({"route_reflector_client": true}))),
        ParserRule::new("next_hop_self", r"^\s+next-hop-self$")
            .setval("next-hop-self")
            .result(af_attr(json!({"next_hop_self": true}))),
        ParserRule::new("route_map.inbound", r"^\s+route-map (?P<route_map>\S+) in$")
            .setval("route-map {{ route_map.inbound }} in")
            .result(af_attr(json!({"route_map": {"inbound": "{{ route_map }}"}}))),
        ParserRule::new("route_map.outbound", r"^\s+route-map (?P<route_map>\S+) out$")
            .setval("route-map {{ route_map.outbound }} out")
            .result(af_attr(json!({"route_map": {"outbound": "{{ route_map }}"}}))),
    ])
    .expect("bgp_global parser table is valid")
});

/// Wrap a neighbor attribute in its VRF and neighbor keys.
fn neighbor_attr(attr: Value) -> Value {
    json!({
        "vrfs": {
            "{{ vrf|default('default') }}": {
                "neighbors": {"{{ neighbor_address }}": attr}
            }
        }
    })
}

/// Wrap an address-family attribute in its VRF, neighbor and family keys.
fn af_attr(attr: Value) -> Value {
    neighbor_attr(json!({
        "address_family": {"{{ afi ~ '_' ~ safi if afi }}": attr}
    }))
}

/// Compared for the default instance and for every VRF.
const INSTANCE_PARSERS: &[&str] = &[
    "router_id",
    "log_neighbor_changes",
    "maxas_limit",
    "confederation.identifier",
];

const NEIGHBOR_PARSERS: &[&str] = &[
    "remote_as",
    "local_as",
    "description",
    "update_source",
    "neighbor_shutdown",
];

const AF_PARSERS: &[&str] = &[
    "send_community.standard",
    "send_community.extended",
    "route_reflector_client",
    "next_hop_self",
    "route_map.inbound",
    "route_map.outbound",
];

/// Keyed children of `path` in normalised form.
fn children<'v>(entry: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
    get_from_dict(entry, path).and_then(Value::as_object)
}

fn prepare_neighbor(neighbor: &mut Value) {
    stringify_field(neighbor, "remote_as");
    stringify_field(neighbor, "local_as");
    let Some(Value::Object(families)) = neighbor.get_mut("address_family") else {
        return;
    };
    for af in families.values_mut() {
        let Some(Value::Object(community)) = af.get_mut("send_community") else {
            continue;
        };
        if let Some(both) = community.shift_remove("both") {
            community.entry("standard").or_insert_with(|| both.clone());
            community.entry("extended").or_insert(both);
        }
    }
}

fn prepare_instance(instance: &mut Value) {
    if let Some(Value::Object(neighbors)) = instance.get_mut("neighbors") {
        neighbors.values_mut().for_each(prepare_neighbor);
    }
}

/// Diff two keyed child collections: changed or new entries through
/// `compare`, then have-only entries removed through the `parser` negation.
fn compare_children<F>(
    rm: &mut RmEngine<'_>,
    want: Option<&Map<String, Value>>,
    have: Option<&Map<String, Value>>,
    parser: &str,
    mut compare: F,
) -> RmResult<()>
where
    F: FnMut(&mut RmEngine<'_>, &Value, &Value) -> RmResult<()>,
{
    let empty = Value::Object(Map::new());
    let mut remaining = have.cloned().unwrap_or_default();
    for (key, w) in want.into_iter().flatten() {
        let h = remaining.shift_remove(key).unwrap_or_else(|| empty.clone());
        compare(rm, w, &h)?;
    }
    for h in remaining.values() {
        rm.addcmd(h, parser, true)?;
    }
    Ok(())
}

fn compare_address_family(rm: &mut RmEngine<'_>, want: &Value, have: &Value) -> RmResult<()> {
    rm.context(want, "address_family", |rm| rm.compare(AF_PARSERS, want, have))?;
    Ok(())
}

fn compare_neighbor(rm: &mut RmEngine<'_>, want: &Value, have: &Value) -> RmResult<()> {
    rm.context(want, "neighbor", |rm| {
        let begin = rm.len();
        rm.compare(NEIGHBOR_PARSERS, want, have)?;
        // local-as is accepted only once the neighbor's other settings are in
        rm.move_to_end(begin, &["local-as", "no local-as"]);
        compare_children(
            rm,
            children(want, "address_family"),
            children(have, "address_family"),
            "address_family",
            compare_address_family,
        )
    })?;
    Ok(())
}

fn compare_instance(rm: &mut RmEngine<'_>, want: &Value, have: &Value) -> RmResult<()> {
    rm.compare(INSTANCE_PARSERS, want, have)?;
    compare_children(
        rm,
        children(want, "neighbors"),
        children(have, "neighbors"),
        "neighbor",
        compare_neighbor,
    )
}

fn compare_vrf(rm: &mut RmEngine<'_>, want: &Value, have: &Value) -> RmResult<()> {
    rm.context(want, "vrf", |rm| compare_instance(rm, want, have))?;
    Ok(())
}

/// The `nxos_bgp_global` resource
#[derive(Debug, Clone, Copy, Default)]
pub struct BgpGlobal;

impl Resource for BgpGlobal {
    fn name(&self) -> &'static str {
        "nxos_bgp_global"
    }

    fn description(&self) -> &'static str {
        "Manage the global BGP instance on Cisco NX-OS devices"
    }

    fn template(&self) -> &RmTemplate {
        &TEMPLATE
    }

    fn normalizer(&self) -> Normalizer {
        Normalizer::single(&[NEIGHBORS, VRFS])
    }

    fn gather_command(&self) -> &'static str {
        "show running-config | section '^router bgp'"
    }

    /// The parser files default-VRF attributes under `vrfs.default`; they
    /// belong at the top level.
    fn post_parse(&self, mut parsed: Value) -> Value {
        let Some(root) = parsed.as_object_mut() else {
            return parsed;
        };
        if let Some(Value::Object(mut vrfs)) = root.shift_remove("vrfs") {
            if let Some(Value::Object(default)) = vrfs.shift_remove(DEFAULT_VRF) {
                root.extend(default);
            }
            if !vrfs.is_empty() {
                root.insert("vrfs".to_string(), Value::Object(vrfs));
            }
        }
        parsed
    }

    fn prepare(&self, entry: &mut Value) {
        stringify_field(entry, "as_number");
        prepare_instance(entry);
        if let Some(Value::Object(vrfs)) = entry.get_mut("vrfs") {
            vrfs.values_mut().for_each(prepare_instance);
        }
    }

    /// `deleted` and `purged` only touch the instance whose AS is named.
    fn addresses(&self, want: &Value, have: &Value) -> bool {
        let wanted = get_from_dict(want, "as_number").and_then(scalar_to_string);
        let running = get_from_dict(have, "as_number").and_then(scalar_to_string);
        match (wanted, running) {
            (Some(w), Some(h)) => w == h,
            _ => true,
        }
    }

    fn validate(&self, want: &Value, have: &Value, state: State) -> RmResult<()> {
        if matches!(state, State::Deleted | State::Purged) || is_empty(want) {
            return Ok(());
        }
        let wanted = get_from_dict(want, "as_number").and_then(scalar_to_string);
        let running = get_from_dict(have, "as_number").and_then(scalar_to_string);
        match (wanted, running) {
            (Some(w), Some(h)) if w != h => Err(RmError::PolicyViolation(format!(
                "BGP AS number cannot be changed from {} to {}; purge the running instance first",
                h, w
            ))),
            (None, None) => Err(RmError::schema(
                "config.as_number",
                "required when no BGP instance is running",
            )),
            _ => Ok(()),
        }
    }

    fn compare_entry(&self, rm: &mut RmEngine<'_>, want: &Value, have: &Value) -> RmResult<()> {
        let entry = if want.get("as_number").is_some() { want } else { have };
        rm.context(entry, "as_number", |rm| {
            compare_instance(rm, want, have)?;
            compare_children(
                rm,
                children(want, "vrfs"),
                children(have, "vrfs"),
                "vrf",
                compare_vrf,
            )
        })?;
        Ok(())
    }

    fn purge_entry(&self, rm: &mut RmEngine<'_>, have: &Value) -> RmResult<()> {
        rm.addcmd(have, "as_number", true)
    }
}
