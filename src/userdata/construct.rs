//! Prototype fragments for every artifact type and the constructor that
//! assembles them into a complete cluster document.
//!
//! Every `fresh_*` function returns an owned value built from scratch, so
//! callers can never share mutable state with the prototypes or with each
//! other.

use chrono::{SecondsFormat, Utc};

use super::{
    ClusterDocument, ClusterMeta, CloudInitContent, HostapdContent, HttpProxyContent,
    IsSimpleContent, NetRulesContent, NoProxyContent, RadioVariant, RunCommandEntry, SecretFileEntry,
    SecretFileId, UserdataCollection, VpnBridgeContent, WpaNetwork, WpaSupplicantContent,
    WriteFileEntry, WriteFilePayload,
};

pub const PATH_ETC_RDBOX: &str = "/etc/rdbox";

// Stable write-file ids. All lookups go through these, never positions.
pub const FILE_NET_RULES: &str = "net_rules";
pub const FILE_IS_SIMPLE: &str = "is_simple";
pub const FILE_VPNBRIDGE: &str = "vpnbridge";
pub const FILE_HTTP_PROXY: &str = "http_proxy";
pub const FILE_NO_PROXY: &str = "no_proxy";

pub const RUNCMD_FIRST_SESSION: &str = "rdbox-first_session.bash";
pub const RUNCMD_KUBEADM_JOIN: &str = "to_run_kubeadm_join_after_communicating_with";

pub fn wpa_file_id(variant: RadioVariant) -> String {
    format!("wpa_supplicant_{}", variant.as_str())
}

pub fn hostapd_file_id(variant: RadioVariant) -> String {
    format!("hostapd_{}", variant.as_str())
}

pub fn fresh_net_rules() -> WriteFileEntry {
    WriteFileEntry {
        id: FILE_NET_RULES.to_string(),
        destination_path: "/etc/udev/rules.d/70-persistent-net.rules".to_string(),
        rendered_content: String::new(),
        payload: WriteFilePayload::NetRules(NetRulesContent::default()),
    }
}

pub fn fresh_simple_mode_flag() -> WriteFileEntry {
    WriteFileEntry {
        id: FILE_IS_SIMPLE.to_string(),
        destination_path: "/var/lib/rdbox/.is_simple".to_string(),
        rendered_content: String::new(),
        payload: WriteFilePayload::IsSimple(IsSimpleContent { is_simple: true }),
    }
}

pub fn fresh_wpa_supplicant(variant: RadioVariant) -> WriteFileEntry {
    let content = WpaSupplicantContent {
        ctrl_interface: format!(
            "DIR=/var/run/wpa_supplicant_{} GROUP=netdev",
            variant.as_str()
        ),
        update_config: 1,
        country: String::new(),
        network: WpaNetwork {
            ssid: String::new(),
            psk: String::new(),
            scan_ssid: 1,
        },
    };
    WriteFileEntry {
        id: wpa_file_id(variant),
        destination_path: format!("{PATH_ETC_RDBOX}/wpa_supplicant_{}.conf", variant.as_str()),
        rendered_content: String::new(),
        payload: WriteFilePayload::WpaSupplicant(content),
    }
}

pub fn fresh_hostapd(variant: RadioVariant) -> WriteFileEntry {
    let mut content = HostapdContent {
        ssid: String::new(),
        wpa_psk: String::new(),
        country_code: String::new(),
        interface: "wlan10".to_string(),
        bridge: String::new(),
        ctrl_interface: format!("/var/run/hostapd_{}", variant.as_str()),
        deny_mac_file: format!("{PATH_ETC_RDBOX}/hostapd_be.deny"),
        driver: "nl80211".to_string(),
        ctrl_interface_group: 0,
        wpa: 2,
        wpa_key_mgmt: "WPA-PSK".to_string(),
        rsn_pairwise: "CCMP".to_string(),
        logger_syslog: 1,
        logger_syslog_level: 1,
        logger_stdout: -1,
        logger_stdout_level: 1,
        hw_mode: "a".to_string(),
        ieee80211n: 1,
        require_ht: 1,
        channel: 36,
        ht_capab: "[HT40-][HT40+][SHORT-GI-40][TX-STBC][RX-STBC12][GF]".to_string(),
        wmm_enabled: 1,
        wmm_ac_bk_cwmin: 4,
        wmm_ac_bk_cwmax: 10,
        wmm_ac_bk_aifs: 7,
        wmm_ac_bk_txop_limit: 0,
        wmm_ac_bk_acm: 0,
        wmm_ac_be_aifs: 3,
        wmm_ac_be_cwmin: 4,
        wmm_ac_be_cwmax: 10,
        wmm_ac_be_txop_limit: 0,
        wmm_ac_be_acm: 0,
        wmm_ac_vi_aifs: 2,
        wmm_ac_vi_cwmin: 3,
        wmm_ac_vi_cwmax: 4,
        wmm_ac_vi_txop_limit: 94,
        wmm_ac_vi_acm: 0,
        wmm_ac_vo_aifs: 2,
        wmm_ac_vo_cwmin: 2,
        wmm_ac_vo_cwmax: 3,
        wmm_ac_vo_txop_limit: 47,
        wme_enabled: 1,
        macaddr_acl: 0,
    };
    match variant {
        RadioVariant::Be => {
            content.interface = "wlan1".to_string();
        }
        RadioVariant::ApAn => {
            content.interface = "wlan2".to_string();
            content.bridge = "br0".to_string();
        }
        RadioVariant::ApBg => {
            content.interface = "wlan3".to_string();
            content.bridge = "br0".to_string();
            content.hw_mode = "g".to_string();
            content.channel = 1;
        }
        RadioVariant::Yoursite => {}
    }
    WriteFileEntry {
        id: hostapd_file_id(variant),
        destination_path: format!("{PATH_ETC_RDBOX}/hostapd_{}.conf", variant.as_str()),
        rendered_content: String::new(),
        payload: WriteFilePayload::Hostapd(content),
    }
}

pub fn fresh_vpn_bridge() -> WriteFileEntry {
    WriteFileEntry {
        id: FILE_VPNBRIDGE.to_string(),
        destination_path: "/usr/local/etc/vpnbridge.in".to_string(),
        rendered_content: String::new(),
        payload: WriteFilePayload::VpnBridge(VpnBridgeContent::default()),
    }
}

pub fn fresh_http_proxy() -> WriteFileEntry {
    WriteFileEntry {
        id: FILE_HTTP_PROXY.to_string(),
        destination_path: "/etc/transproxy/http_proxy".to_string(),
        rendered_content: String::new(),
        payload: WriteFilePayload::HttpProxy(HttpProxyContent::default()),
    }
}

pub fn fresh_no_proxy() -> WriteFileEntry {
    WriteFileEntry {
        id: FILE_NO_PROXY.to_string(),
        destination_path: "/etc/transproxy/no_proxy".to_string(),
        rendered_content: String::new(),
        payload: WriteFilePayload::NoProxy(NoProxyContent::default()),
    }
}

pub fn fresh_run_command(path: &str, id: &str) -> RunCommandEntry {
    RunCommandEntry {
        id: id.to_string(),
        executable_path: path.to_string(),
        argument_string: String::new(),
    }
}

pub fn fresh_secret_file(id: SecretFileId) -> SecretFileEntry {
    SecretFileEntry {
        id,
        source_path: String::new(),
        destination_path: String::new(),
    }
}

/// Assembles a complete cluster document in the fixed output order.
///
/// The order matters only for output stability; lookups are by id.
pub fn build_cluster_document() -> ClusterDocument {
    let mut doc = ClusterDocument {
        hostname: String::new(),
        info: super::DocumentInfo::default(),
        cluster_meta: ClusterMeta::default(),
        cloud_init: CloudInitContent::default(),
        artifacts: super::Artifacts::default(),
    };

    let files = &mut doc.artifacts.write_files;
    files.push(fresh_net_rules());
    files.push(fresh_simple_mode_flag());
    files.push(fresh_wpa_supplicant(RadioVariant::Be));
    files.push(fresh_wpa_supplicant(RadioVariant::ApAn));
    files.push(fresh_wpa_supplicant(RadioVariant::ApBg));
    files.push(fresh_wpa_supplicant(RadioVariant::Yoursite));
    files.push(fresh_hostapd(RadioVariant::Be));
    files.push(fresh_hostapd(RadioVariant::ApAn));
    files.push(fresh_hostapd(RadioVariant::ApBg));
    files.push(fresh_vpn_bridge());
    files.push(fresh_http_proxy());
    files.push(fresh_no_proxy());

    doc.artifacts.run_commands.push(fresh_run_command(
        "/opt/rdbox/boot/rdbox-first_session.bash",
        RUNCMD_FIRST_SESSION,
    ));
    doc.artifacts.run_commands.push(fresh_run_command(
        "/opt/rdbox/boot/to_run_kubeadm_join_after_communicating_with",
        RUNCMD_KUBEADM_JOIN,
    ));

    doc.artifacts
        .secret_files
        .push(fresh_secret_file(SecretFileId::PublicKey));
    doc.artifacts
        .secret_files
        .push(fresh_secret_file(SecretFileId::SecretKey));

    doc
}

/// Current UTC time in ISO-8601 with millisecond precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn is_cluster_id_unique(collection: &UserdataCollection, id: &str) -> bool {
    !collection.clusters.iter().any(|c| c.cluster_meta.id == id)
}

/// Appends a new cluster document, stamps its identity and dates, and
/// repoints `current_cluster` at it. Id uniqueness is the caller's job
/// (checked up front via [`is_cluster_id_unique`]).
pub fn push_new_cluster(collection: &mut UserdataCollection, id: &str, comment: &str) -> usize {
    let mut doc = build_cluster_document();
    doc.cluster_meta.id = id.to_string();
    doc.cluster_meta.comment = comment.to_string();
    let now = now_iso8601();
    doc.info.create_date = now.clone();
    doc.info.update_date = now;
    collection.clusters.push(doc);
    collection.current_cluster = collection.clusters.len() - 1;
    collection.current_cluster
}
