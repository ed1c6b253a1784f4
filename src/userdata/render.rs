//! Deterministic rendering of a cluster document into cloud-init text.
//!
//! `render` is a pure function of the document: the same state always
//! produces byte-identical output.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::{GaribanError, Result};

use super::construct::{hostapd_file_id, wpa_file_id};
use super::{
    ClusterDocument, HostapdContent, NetRulesContent, RadioVariant, UserdataCollection,
    VpnBridgeContent, WpaSupplicantContent, WriteFileEntry, WriteFilePayload,
};

/// The serialized artifacts of one cluster document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub cloud_init_yaml: String,
    pub write_files_yaml: String,
    pub runcmd_yaml: String,
    pub combined_text: String,
}

#[derive(Serialize)]
struct WriteFilesBlock {
    write_files: Vec<RenderedFile>,
}

#[derive(Serialize)]
struct RenderedFile {
    path: String,
    content: String,
}

#[derive(Serialize)]
struct RuncmdBlock {
    runcmd: Vec<Vec<String>>,
}

/// Renders every artifact of `doc`.
pub fn render(doc: &ClusterDocument) -> Result<Rendered> {
    let cloud_init_yaml = serde_yaml::to_string(&doc.cloud_init)?;

    let mut files = Vec::new();
    for entry in &doc.artifacts.write_files {
        if excluded_by_topology(doc, entry) {
            continue;
        }
        let content = render_write_file(entry);
        if content.is_empty() {
            continue;
        }
        files.push(RenderedFile {
            path: entry.destination_path.clone(),
            content,
        });
    }
    let write_files_yaml = serde_yaml::to_string(&WriteFilesBlock { write_files: files })?;

    let mut commands = Vec::new();
    for command in &doc.artifacts.run_commands {
        let mut argv = vec![command.executable_path.clone()];
        let args = shell_words::split(&command.argument_string)
            .map_err(|e| GaribanError::Validation(format!("runcmd '{}': {e}", command.id)))?;
        argv.extend(args);
        commands.push(argv);
    }
    let runcmd_yaml = serde_yaml::to_string(&RuncmdBlock { runcmd: commands })?;

    let combined_text = format!(
        "#cloud-config\n# vim: syntax=yaml\n\n{cloud_init_yaml}\n{write_files_yaml}\n{runcmd_yaml}"
    );

    Ok(Rendered {
        cloud_init_yaml,
        write_files_yaml,
        runcmd_yaml,
        combined_text,
    })
}

/// Renders the current cluster and stores the derived caches: per-entry
/// `rendered_content` plus the collection-level rendered text and the
/// non-empty secret files.
pub fn dump(collection: &mut UserdataCollection) -> Result<Rendered> {
    let doc = collection
        .current_mut()
        .ok_or_else(|| GaribanError::Lookup("current cluster".to_string()))?;
    for entry in &mut doc.artifacts.write_files {
        entry.rendered_content = render_write_file(entry);
    }
    let rendered = render(doc)?;
    collection.current_rendered_files = collection.clusters[collection.current_cluster]
        .artifacts
        .secret_files
        .iter()
        .filter(|f| !f.source_path.is_empty())
        .cloned()
        .collect();
    collection.current_rendered_text = rendered.combined_text.clone();
    Ok(rendered)
}

/// Simple topology has no 5 GHz AP: its entries are left out entirely.
fn excluded_by_topology(doc: &ClusterDocument, entry: &WriteFileEntry) -> bool {
    doc.cluster_meta.is_simple
        && (entry.id == wpa_file_id(RadioVariant::ApAn)
            || entry.id == hostapd_file_id(RadioVariant::ApAn))
}

/// Renders one entry's body. Empty output means "omit this file".
pub fn render_write_file(entry: &WriteFileEntry) -> String {
    match &entry.payload {
        WriteFilePayload::IsSimple(content) => format!("{}\n", content.is_simple),
        WriteFilePayload::WpaSupplicant(content) => {
            let yoursite = entry.id == wpa_file_id(RadioVariant::Yoursite);
            render_wpa_supplicant(content, yoursite)
        }
        WriteFilePayload::Hostapd(content) => render_hostapd(content),
        WriteFilePayload::VpnBridge(content) => render_vpn_bridge(content),
        WriteFilePayload::HttpProxy(content) => format!("http_proxy={}\n", content.http_proxy),
        WriteFilePayload::NoProxy(content) => format!("no_proxy={}\n", content.no_proxy),
        WriteFilePayload::NetRules(content) => render_net_rules(content),
    }
}

// Empty-valued keys become `#key` comments; the network block quotes the
// ssid and nothing else. A yoursite file with no SSID is suppressed.
fn render_wpa_supplicant(content: &WpaSupplicantContent, yoursite: bool) -> String {
    if yoursite && content.network.ssid.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    push_wpa_kv(&mut out, "ctrl_interface", &content.ctrl_interface);
    let _ = writeln!(out, "update_config={}", content.update_config);
    push_wpa_kv(&mut out, "country", &content.country);
    out.push_str("network={\n");
    if content.network.ssid.is_empty() {
        out.push_str("\t#ssid\n");
    } else {
        let _ = writeln!(out, "\tssid=\"{}\"", content.network.ssid);
    }
    if content.network.psk.is_empty() {
        out.push_str("\t#psk\n");
    } else {
        let _ = writeln!(out, "\tpsk={}", content.network.psk);
    }
    let _ = writeln!(out, "\tscan_ssid={}", content.network.scan_ssid);
    out.push_str("}\n");
    out
}

fn push_wpa_kv(out: &mut String, key: &str, value: &str) {
    if value.is_empty() {
        let _ = writeln!(out, "#{key}");
    } else {
        let _ = writeln!(out, "{key}={value}");
    }
}

// Flat key=value lines in declaration order; empty values become `#key=`.
fn render_hostapd(content: &HostapdContent) -> String {
    let mut out = String::new();
    push_hostapd_kv(&mut out, "ssid", &content.ssid);
    push_hostapd_kv(&mut out, "wpa_psk", &content.wpa_psk);
    push_hostapd_kv(&mut out, "country_code", &content.country_code);
    push_hostapd_kv(&mut out, "interface", &content.interface);
    push_hostapd_kv(&mut out, "bridge", &content.bridge);
    push_hostapd_kv(&mut out, "ctrl_interface", &content.ctrl_interface);
    push_hostapd_kv(&mut out, "deny_mac_file", &content.deny_mac_file);
    push_hostapd_kv(&mut out, "driver", &content.driver);
    for (key, value) in [
        ("ctrl_interface_group", content.ctrl_interface_group),
        ("wpa", content.wpa),
    ] {
        let _ = writeln!(out, "{key}={value}");
    }
    push_hostapd_kv(&mut out, "wpa_key_mgmt", &content.wpa_key_mgmt);
    push_hostapd_kv(&mut out, "rsn_pairwise", &content.rsn_pairwise);
    for (key, value) in [
        ("logger_syslog", content.logger_syslog),
        ("logger_syslog_level", content.logger_syslog_level),
        ("logger_stdout", content.logger_stdout),
        ("logger_stdout_level", content.logger_stdout_level),
    ] {
        let _ = writeln!(out, "{key}={value}");
    }
    push_hostapd_kv(&mut out, "hw_mode", &content.hw_mode);
    for (key, value) in [
        ("ieee80211n", content.ieee80211n),
        ("require_ht", content.require_ht),
        ("channel", content.channel),
    ] {
        let _ = writeln!(out, "{key}={value}");
    }
    push_hostapd_kv(&mut out, "ht_capab", &content.ht_capab);
    for (key, value) in [
        ("wmm_enabled", content.wmm_enabled),
        ("wmm_ac_bk_cwmin", content.wmm_ac_bk_cwmin),
        ("wmm_ac_bk_cwmax", content.wmm_ac_bk_cwmax),
        ("wmm_ac_bk_aifs", content.wmm_ac_bk_aifs),
        ("wmm_ac_bk_txop_limit", content.wmm_ac_bk_txop_limit),
        ("wmm_ac_bk_acm", content.wmm_ac_bk_acm),
        ("wmm_ac_be_aifs", content.wmm_ac_be_aifs),
        ("wmm_ac_be_cwmin", content.wmm_ac_be_cwmin),
        ("wmm_ac_be_cwmax", content.wmm_ac_be_cwmax),
        ("wmm_ac_be_txop_limit", content.wmm_ac_be_txop_limit),
        ("wmm_ac_be_acm", content.wmm_ac_be_acm),
        ("wmm_ac_vi_aifs", content.wmm_ac_vi_aifs),
        ("wmm_ac_vi_cwmin", content.wmm_ac_vi_cwmin),
        ("wmm_ac_vi_cwmax", content.wmm_ac_vi_cwmax),
        ("wmm_ac_vi_txop_limit", content.wmm_ac_vi_txop_limit),
        ("wmm_ac_vi_acm", content.wmm_ac_vi_acm),
        ("wmm_ac_vo_aifs", content.wmm_ac_vo_aifs),
        ("wmm_ac_vo_cwmin", content.wmm_ac_vo_cwmin),
        ("wmm_ac_vo_cwmax", content.wmm_ac_vo_cwmax),
        ("wmm_ac_vo_txop_limit", content.wmm_ac_vo_txop_limit),
        ("wme_enabled", content.wme_enabled),
        ("macaddr_acl", content.macaddr_acl),
    ] {
        let _ = writeln!(out, "{key}={value}");
    }
    out
}

fn push_hostapd_kv(out: &mut String, key: &str, value: &str) {
    if value.is_empty() {
        let _ = writeln!(out, "#{key}=");
    } else {
        let _ = writeln!(out, "{key}={value}");
    }
}

// The vpncmd script. An unconfigured bridge (no cascade server) renders
// nothing so the file is omitted from the image.
fn render_vpn_bridge(content: &VpnBridgeContent) -> String {
    if content.server.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    out.push_str(&vpn_command(
        "BridgeCreate",
        &content.hub,
        &[("DEVICE", content.device.clone()), ("TAP", "no".to_string())],
    ));
    out.push_str(&vpn_command("Hub", &content.hub, &[]));
    out.push_str(&vpn_command(
        "CascadeCreate",
        &content.cascade_name,
        &[
            ("SERVER", format!("{}:{}", content.server, content.port)),
            ("HUB", content.hub.clone()),
            ("USERNAME", content.username.clone()),
        ],
    ));
    out.push_str(&vpn_command(
        "CascadePasswordSet",
        &content.cascade_name,
        &[
            ("PASSWORD", content.password.clone()),
            ("TYPE", content.password_type.clone()),
        ],
    ));
    out.push_str(&vpn_command("CascadeOnline", &content.cascade_name, &[]));
    out.push_str(&vpn_command("CascadeList", "", &[]));
    out
}

// One vpncmd line; empty positional names and empty /FIELD: values
// collapse out of the rendered command.
fn vpn_command(name: &str, positional: &str, fields: &[(&str, String)]) -> String {
    let mut line = name.to_string();
    if !positional.is_empty() {
        line.push(' ');
        line.push_str(positional);
    }
    for (field, value) in fields {
        if value.is_empty() {
            continue;
        }
        let _ = write!(line, " /{field}:{value}");
    }
    line.push('\n');
    line
}

fn render_net_rules(content: &NetRulesContent) -> String {
    let mut out = String::new();
    for rule in &content.rules {
        let _ = writeln!(
            out,
            "SUBSYSTEM==\"net\", ACTION==\"add\", ATTR{{address}}==\"{}\", NAME=\"{}\"",
            rule.mac_address, rule.interface
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::userdata::accessor;
    use crate::userdata::construct::{FILE_HTTP_PROXY, build_cluster_document, push_new_cluster};
    use crate::userdata::NetRule;

    #[test]
    fn render_is_deterministic() {
        let mut doc = build_cluster_document();
        doc.cloud_init.hostname = "demo-master-00".to_string();
        let first = render(&doc).unwrap();
        let second = render(&doc).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn combined_text_layout() {
        let doc = build_cluster_document();
        let rendered = render(&doc).unwrap();
        assert!(rendered.combined_text.starts_with("#cloud-config\n# vim: syntax=yaml\n\n"));
        assert!(rendered.combined_text.contains("write_files:"));
        assert!(rendered.combined_text.contains("runcmd:"));
    }

    #[test]
    fn simple_topology_drops_the_5ghz_ap_entries() {
        let mut doc = build_cluster_document();
        accessor::set_simple_mode(&mut doc, true).unwrap();
        let rendered = render(&doc).unwrap();
        assert!(!rendered.write_files_yaml.contains("hostapd_ap_an.conf"));
        assert!(!rendered.write_files_yaml.contains("wpa_supplicant_ap_an.conf"));
        assert!(rendered.write_files_yaml.contains("hostapd_ap_bg.conf"));

        accessor::set_simple_mode(&mut doc, false).unwrap();
        let rendered = render(&doc).unwrap();
        assert!(rendered.write_files_yaml.contains("hostapd_ap_an.conf"));
    }

    #[test]
    fn empty_yoursite_ssid_suppresses_the_file() {
        let doc = build_cluster_document();
        let rendered = render(&doc).unwrap();
        assert!(!rendered.write_files_yaml.contains("wpa_supplicant_yoursite.conf"));
    }

    #[test]
    fn proxy_files_render_even_when_empty() {
        let doc = build_cluster_document();
        let entry = accessor::write_file(&doc, FILE_HTTP_PROXY).unwrap();
        assert_eq!(render_write_file(entry), "http_proxy=\n");
        let rendered = render(&doc).unwrap();
        assert!(rendered.write_files_yaml.contains("/etc/transproxy/http_proxy"));
    }

    #[test]
    fn wpa_supplicant_comment_rules() {
        let mut doc = build_cluster_document();
        {
            let content = accessor::wpa_supplicant_mut(&mut doc, RadioVariant::Be).unwrap();
            content.network.ssid = "mesh-ssid".to_string();
        }
        let entry = accessor::write_file(&doc, "wpa_supplicant_be").unwrap();
        let body = render_write_file(entry);
        assert!(body.contains("ctrl_interface=DIR=/var/run/wpa_supplicant_be GROUP=netdev"));
        assert!(body.contains("update_config=1"));
        assert!(body.contains("#country"));
        assert!(body.contains("network={"));
        assert!(body.contains("\tssid=\"mesh-ssid\""));
        assert!(body.contains("\t#psk"));
        assert!(body.contains("\tscan_ssid=1"));
        assert!(body.trim_end().ends_with('}'));
    }

    #[test]
    fn hostapd_comment_rules() {
        let doc = build_cluster_document();
        let entry = accessor::write_file(&doc, "hostapd_be").unwrap();
        let body = render_write_file(entry);
        assert!(body.contains("#ssid=\n"));
        assert!(body.contains("#wpa_psk=\n"));
        assert!(body.contains("interface=wlan1"));
        assert!(body.contains("hw_mode=a"));
        assert!(body.contains("channel=36"));
        assert!(body.contains("macaddr_acl=0"));
    }

    #[test]
    fn vpn_bridge_renders_the_command_sequence() {
        let mut doc = build_cluster_document();
        {
            let content = accessor::vpn_bridge_mut(&mut doc).unwrap();
            content.server = "vpn.example.com".to_string();
            content.hub = "BRIDGE".to_string();
            content.username = "operator".to_string();
            content.password = "pw".to_string();
        }
        let entry = accessor::write_file(&doc, "vpnbridge").unwrap();
        let body = render_write_file(entry);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "BridgeCreate BRIDGE /DEVICE:eth0 /TAP:no");
        assert_eq!(lines[1], "Hub BRIDGE");
        assert_eq!(
            lines[2],
            "CascadeCreate cascade_rdbox /SERVER:vpn.example.com:443 /HUB:BRIDGE /USERNAME:operator"
        );
        assert_eq!(lines[3], "CascadePasswordSet cascade_rdbox /PASSWORD:pw /TYPE:standard");
        assert_eq!(lines[4], "CascadeOnline cascade_rdbox");
        assert_eq!(lines[5], "CascadeList");

        // Unconfigured bridge renders nothing at all.
        let pristine = build_cluster_document();
        let entry = accessor::write_file(&pristine, "vpnbridge").unwrap();
        assert_eq!(render_write_file(entry), "");
    }

    #[test]
    fn net_rules_render_one_udev_line_per_entry() {
        let mut doc = build_cluster_document();
        {
            let entry = accessor::write_file_mut(&mut doc, "net_rules").unwrap();
            if let WriteFilePayload::NetRules(content) = &mut entry.payload {
                content.rules.push(NetRule {
                    mac_address: "b8:27:eb:00:00:01".to_string(),
                    interface: "wlan1".to_string(),
                });
            }
        }
        let entry = accessor::write_file(&doc, "net_rules").unwrap();
        assert_eq!(
            render_write_file(entry),
            "SUBSYSTEM==\"net\", ACTION==\"add\", ATTR{address}==\"b8:27:eb:00:00:01\", NAME=\"wlan1\"\n"
        );
    }

    #[test]
    fn runcmd_splits_argument_strings_into_argv() {
        let mut doc = build_cluster_document();
        accessor::set_kubeadm_join_args(&mut doc, "--token abc.def 10.0.0.1:6443").unwrap();
        let rendered = render(&doc).unwrap();
        assert!(rendered.runcmd_yaml.contains("/opt/rdbox/boot/rdbox-first_session.bash"));
        assert!(rendered.runcmd_yaml.contains("--token"));
        assert!(rendered.runcmd_yaml.contains("10.0.0.1:6443"));
    }

    #[test]
    fn dump_fills_the_derived_caches() {
        let mut collection = crate::userdata::UserdataCollection::default();
        push_new_cluster(&mut collection, "demo", "");
        let rendered = dump(&mut collection).unwrap();
        assert_eq!(collection.current_rendered_text, rendered.combined_text);
        // No secret paths chosen yet.
        assert!(collection.current_rendered_files.is_empty());
        let doc = collection.current().unwrap();
        let entry = accessor::write_file(doc, FILE_HTTP_PROXY).unwrap();
        assert_eq!(entry.rendered_content, "http_proxy=\n");
    }
}
