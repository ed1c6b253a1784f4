//! The user-data document model: one `ClusterDocument` per cluster node,
//! collected in a `UserdataCollection`.

pub mod accessor;
pub mod construct;
pub mod render;

use serde::{Deserialize, Serialize};

/// Root aggregate of every cluster document this installation has built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserdataCollection {
    /// Index of the cluster currently being edited.
    pub current_cluster: usize,
    /// Creation-ordered cluster documents. Never reordered.
    pub clusters: Vec<ClusterDocument>,
    /// Cache of the last rendered user-data text. Derived, re-derivable.
    #[serde(default)]
    pub current_rendered_text: String,
    /// Cache of the secret files referenced by the last render.
    #[serde(default)]
    pub current_rendered_files: Vec<SecretFileEntry>,
}

impl UserdataCollection {
    pub fn current(&self) -> Option<&ClusterDocument> {
        self.clusters.get(self.current_cluster)
    }

    pub fn current_mut(&mut self) -> Option<&mut ClusterDocument> {
        self.clusters.get_mut(self.current_cluster)
    }
}

/// One node's full configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterDocument {
    /// Committed hostname; only set when the naming step is finalized.
    /// The working hostname lives in `cloud_init.hostname`.
    pub hostname: String,
    pub info: DocumentInfo,
    pub cluster_meta: ClusterMeta,
    pub cloud_init: CloudInitContent,
    pub artifacts: Artifacts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub version: u32,
    pub create_date: String,
    pub update_date: String,
    pub comment: String,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            version: 1,
            create_date: String::new(),
            update_date: String::new(),
            comment: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterMeta {
    /// Unique cluster name.
    pub id: String,
    /// AP-only / simple-mesh topology flag.
    pub is_simple: bool,
    pub comment: String,
    pub role_lists: RoleLists,
}

/// A node's function within the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    LeaderMaster,
    BranchMaster,
    Slave,
    Other,
    VpnBridge,
}

impl Role {
    /// The middle part of a composed hostname (`<cluster>-<part>-<suffix>`).
    pub fn hostname_part(&self) -> &'static str {
        match self {
            Role::LeaderMaster | Role::BranchMaster => "master",
            Role::Slave => "slave",
            Role::Other => "",
            Role::VpnBridge => "vpnbridge",
        }
    }
}

/// One registered hostname suffix and the parent it attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMember {
    pub id: String,
    pub parent: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleLists {
    pub leader_master: Vec<RoleMember>,
    pub branch_master: Vec<RoleMember>,
    pub slave: Vec<RoleMember>,
    pub other: Vec<RoleMember>,
    pub vpn_bridge: Vec<RoleMember>,
}

impl RoleLists {
    pub fn members(&self, role: Role) -> &[RoleMember] {
        match role {
            Role::LeaderMaster => &self.leader_master,
            Role::BranchMaster => &self.branch_master,
            Role::Slave => &self.slave,
            Role::Other => &self.other,
            Role::VpnBridge => &self.vpn_bridge,
        }
    }

    pub fn members_mut(&mut self, role: Role) -> &mut Vec<RoleMember> {
        match role {
            Role::LeaderMaster => &mut self.leader_master,
            Role::BranchMaster => &mut self.branch_master,
            Role::Slave => &mut self.slave,
            Role::Other => &mut self.other,
            Role::VpnBridge => &mut self.vpn_bridge,
        }
    }
}

/// Working cloud-init fields, edited throughout the wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudInitContent {
    pub hostname: String,
    pub fqdn: String,
    pub manage_etc_hosts: bool,
    pub resize_rootfs: bool,
    pub growpart: GrowpartConfig,
    pub users: Vec<AdminUser>,
    pub ssh_pwauth: bool,
    pub locale: String,
    pub timezone: String,
    pub ntp: NtpConfig,
}

impl Default for CloudInitContent {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            fqdn: "rdbox.lan".to_string(),
            manage_etc_hosts: true,
            resize_rootfs: true,
            growpart: GrowpartConfig::default(),
            users: vec![AdminUser::default()],
            ssh_pwauth: false,
            locale: String::new(),
            timezone: String::new(),
            ntp: NtpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowpartConfig {
    pub mode: String,
    pub devices: Vec<String>,
    pub ignore_growroot_disabled: bool,
}

impl Default for GrowpartConfig {
    fn default() -> Self {
        Self {
            mode: "auto".to_string(),
            devices: vec!["/".to_string()],
            ignore_growroot_disabled: false,
        }
    }
}

/// The single administrator account provisioned on first boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub name: String,
    pub gecos: String,
    pub sudo: String,
    pub shell: String,
    pub groups: String,
    pub lock_passwd: bool,
    /// SHA-512 crypt hash; never plaintext.
    pub passwd: String,
    pub ssh_authorized_keys: Vec<String>,
}

impl Default for AdminUser {
    fn default() -> Self {
        Self {
            name: String::new(),
            gecos: "RDBOX-Administrator".to_string(),
            sudo: "ALL=(ALL) NOPASSWD:ALL".to_string(),
            shell: "/bin/bash".to_string(),
            groups: "users,docker,video,input".to_string(),
            lock_passwd: true,
            passwd: String::new(),
            ssh_authorized_keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NtpConfig {
    pub pools: Vec<String>,
    pub servers: Vec<String>,
}

/// The artifact lists rendered into the final user-data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artifacts {
    pub write_files: Vec<WriteFileEntry>,
    pub run_commands: Vec<RunCommandEntry>,
    pub secret_files: Vec<SecretFileEntry>,
}

/// One file written by cloud-init at first boot.
///
/// `id` is the only stable reference to an entry; positions are an
/// output-ordering detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileEntry {
    pub id: String,
    pub destination_path: String,
    /// Last rendered body. Derived from `payload`, kept for preview.
    #[serde(default)]
    pub rendered_content: String,
    pub payload: WriteFilePayload,
}

/// Kind-specific structured content of a write-file entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum WriteFilePayload {
    IsSimple(IsSimpleContent),
    WpaSupplicant(WpaSupplicantContent),
    Hostapd(HostapdContent),
    VpnBridge(VpnBridgeContent),
    HttpProxy(HttpProxyContent),
    NoProxy(NoProxyContent),
    NetRules(NetRulesContent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFileKind {
    IsSimple,
    WpaSupplicant,
    Hostapd,
    VpnBridge,
    HttpProxy,
    NoProxy,
    NetRules,
}

impl WriteFilePayload {
    pub fn kind(&self) -> WriteFileKind {
        match self {
            WriteFilePayload::IsSimple(_) => WriteFileKind::IsSimple,
            WriteFilePayload::WpaSupplicant(_) => WriteFileKind::WpaSupplicant,
            WriteFilePayload::Hostapd(_) => WriteFileKind::Hostapd,
            WriteFilePayload::VpnBridge(_) => WriteFileKind::VpnBridge,
            WriteFilePayload::HttpProxy(_) => WriteFileKind::HttpProxy,
            WriteFilePayload::NoProxy(_) => WriteFileKind::NoProxy,
            WriteFilePayload::NetRules(_) => WriteFileKind::NetRules,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IsSimpleContent {
    pub is_simple: bool,
}

/// Radio variant of a wpa_supplicant or hostapd entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioVariant {
    /// Backend mesh radio (wlan1, 5 GHz).
    Be,
    /// 5 GHz access point (wlan2, bridged).
    ApAn,
    /// 2.4 GHz access point (wlan3, bridged).
    ApBg,
    /// The operator's upstream Wi-Fi (client only).
    Yoursite,
}

impl RadioVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            RadioVariant::Be => "be",
            RadioVariant::ApAn => "ap_an",
            RadioVariant::ApBg => "ap_bg",
            RadioVariant::Yoursite => "yoursite",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WpaSupplicantContent {
    pub ctrl_interface: String,
    pub update_config: i32,
    pub country: String,
    pub network: WpaNetwork,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WpaNetwork {
    pub ssid: String,
    /// 64-hex-char derived PSK, or empty.
    pub psk: String,
    pub scan_ssid: i32,
}

/// Flat hostapd.conf key set, rendered in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostapdContent {
    pub ssid: String,
    pub wpa_psk: String,
    pub country_code: String,
    pub interface: String,
    pub bridge: String,
    pub ctrl_interface: String,
    pub deny_mac_file: String,
    pub driver: String,
    pub ctrl_interface_group: i32,
    pub wpa: i32,
    pub wpa_key_mgmt: String,
    pub rsn_pairwise: String,
    pub logger_syslog: i32,
    pub logger_syslog_level: i32,
    pub logger_stdout: i32,
    pub logger_stdout_level: i32,
    pub hw_mode: String,
    pub ieee80211n: i32,
    pub require_ht: i32,
    pub channel: i32,
    pub ht_capab: String,
    pub wmm_enabled: i32,
    pub wmm_ac_bk_cwmin: i32,
    pub wmm_ac_bk_cwmax: i32,
    pub wmm_ac_bk_aifs: i32,
    pub wmm_ac_bk_txop_limit: i32,
    pub wmm_ac_bk_acm: i32,
    pub wmm_ac_be_aifs: i32,
    pub wmm_ac_be_cwmin: i32,
    pub wmm_ac_be_cwmax: i32,
    pub wmm_ac_be_txop_limit: i32,
    pub wmm_ac_be_acm: i32,
    pub wmm_ac_vi_aifs: i32,
    pub wmm_ac_vi_cwmin: i32,
    pub wmm_ac_vi_cwmax: i32,
    pub wmm_ac_vi_txop_limit: i32,
    pub wmm_ac_vi_acm: i32,
    pub wmm_ac_vo_aifs: i32,
    pub wmm_ac_vo_cwmin: i32,
    pub wmm_ac_vo_cwmax: i32,
    pub wmm_ac_vo_txop_limit: i32,
    pub wme_enabled: i32,
    pub macaddr_acl: i32,
}

/// Fields feeding the vpncmd script (BridgeCreate .. CascadeList).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpnBridgeContent {
    pub device: String,
    pub cascade_name: String,
    pub server: String,
    pub port: u16,
    pub hub: String,
    pub username: String,
    pub password: String,
    pub password_type: String,
}

impl Default for VpnBridgeContent {
    fn default() -> Self {
        Self {
            device: "eth0".to_string(),
            cascade_name: "cascade_rdbox".to_string(),
            server: String::new(),
            port: 443,
            hub: String::new(),
            username: String::new(),
            password: String::new(),
            password_type: "standard".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpProxyContent {
    pub http_proxy: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoProxyContent {
    pub no_proxy: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetRulesContent {
    pub rules: Vec<NetRule>,
}

/// One pinned NIC name (udev rule line).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetRule {
    pub mac_address: String,
    pub interface: String,
}

/// Command executed by cloud-init's runcmd at first boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCommandEntry {
    pub id: String,
    pub executable_path: String,
    pub argument_string: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretFileId {
    #[serde(rename = "publicKey")]
    PublicKey,
    #[serde(rename = "secretKey")]
    SecretKey,
}

/// A file copied from the operator's machine next to the written image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretFileEntry {
    pub id: SecretFileId,
    pub source_path: String,
    pub destination_path: String,
}
