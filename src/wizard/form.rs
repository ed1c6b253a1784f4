//! Working form state, populated from the document when a cluster is
//! opened and committed back page by page.

use zeroize::Zeroizing;

use crate::userdata::accessor::{ProxySettings, generate_random_string};
use crate::userdata::{HostapdContent, NtpConfig, Role, VpnBridgeContent, WpaSupplicantContent};

use super::pages::Hardware;

const BACKEND_SSID_RANDOM_LENGTH: usize = 32;
const AP_SSID_RANDOM_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionMethod {
    #[default]
    Ethernet,
    Wifi,
}

/// One radio's paired wpa_supplicant/hostapd form copies.
#[derive(Debug, Clone, Default)]
pub struct RadioForm {
    pub wpa: WpaSupplicantContent,
    pub hostapd: HostapdContent,
}

/// Everything the wizard edits before it is committed to the document.
#[derive(Debug, Default)]
pub struct FormData {
    // Changed on every run.
    pub cluster_name: String,
    pub cluster_comment: String,
    pub hardware: Option<Hardware>,
    pub role: Option<Role>,
    pub hostname_suffix: String,
    pub hostname: String,
    pub parent: String,

    // Carried across runs via the document.
    pub username: String,
    /// Plaintext while being edited; the stored `$6$` hash after reload.
    pub password: Zeroizing<String>,
    pub public_key: String,
    pub secret_key: String,
    pub authorized_keys: String,

    pub timezone: String,
    pub locale: String,
    pub ntp: NtpConfig,
    pub country: String,

    pub connection_method: ConnectionMethod,
    pub connection_wpa: WpaSupplicantContent,

    pub proxy: ProxySettings,

    pub backend: RadioForm,
    pub ap_bg: RadioForm,
    pub ap_an: RadioForm,

    pub vpn_bridge: VpnBridgeContent,

    pub kubeadm_join_args: String,
}

impl FormData {
    pub fn reset(&mut self) {
        *self = FormData::default();
    }

    /// Recomputes the composed hostname `<cluster>-<rolepart>-<suffix>`.
    /// BranchMaster may not take `00`; that suffix belongs to the leader.
    pub fn update_hostname_from_suffix(&mut self) {
        let Some(role) = self.role else {
            self.hostname.clear();
            return;
        };
        if self.hostname_suffix.is_empty() {
            self.hostname.clear();
            return;
        }
        if role == Role::BranchMaster && self.hostname_suffix == "00" {
            self.hostname_suffix.clear();
            self.hostname.clear();
            return;
        }
        self.hostname = format!(
            "{}-{}-{}",
            self.cluster_name,
            role.hostname_part(),
            self.hostname_suffix
        );
    }

    /// A fresh backend mesh SSID: `_<rand32>-<cluster>`. Changing the SSID
    /// invalidates any previously derived keys.
    pub fn generate_backend_ssid(&mut self) {
        if !self.backend.hostapd.ssid.is_empty() {
            self.backend.hostapd.wpa_psk.clear();
            self.backend.wpa.network.psk.clear();
        }
        let ssid = format!(
            "_{}-{}",
            generate_random_string(BACKEND_SSID_RANDOM_LENGTH),
            self.cluster_name
        );
        self.backend.hostapd.ssid = ssid.clone();
        self.backend.wpa.network.ssid = ssid;
    }

    /// A fresh AP SSID pair `<cluster>-<rand6>-g` / `<cluster>-<rand6>-a`.
    pub fn generate_ap_ssid(&mut self) {
        if !self.ap_bg.hostapd.ssid.is_empty() {
            self.ap_bg.hostapd.wpa_psk.clear();
            self.ap_bg.wpa.network.psk.clear();
            self.ap_an.hostapd.wpa_psk.clear();
            self.ap_an.wpa.network.psk.clear();
        }
        let prefix = format!(
            "{}-{}",
            self.cluster_name,
            generate_random_string(AP_SSID_RANDOM_LENGTH)
        );
        self.ap_bg.hostapd.ssid = format!("{prefix}-g");
        self.ap_bg.wpa.network.ssid = self.ap_bg.hostapd.ssid.clone();
        self.ap_an.hostapd.ssid = format!("{prefix}-a");
        self.ap_an.wpa.network.ssid = self.ap_an.hostapd.ssid.clone();
    }

    /// Backend SSID edited by hand: derived keys are stale.
    pub fn change_backend_ssid(&mut self) {
        self.backend.wpa.network.ssid = self.backend.hostapd.ssid.clone();
        self.backend.wpa.network.psk.clear();
        self.backend.hostapd.wpa_psk.clear();
    }

    /// AP SSID edited on the 2.4 GHz page: the 5 GHz pair follows, and
    /// every AP key is stale.
    pub fn change_ap_ssid(&mut self) {
        self.ap_bg.wpa.network.ssid = self.ap_bg.hostapd.ssid.clone();
        self.ap_an.hostapd.ssid = self.ap_bg.hostapd.ssid.clone();
        self.ap_bg.wpa.network.psk.clear();
        self.ap_bg.hostapd.wpa_psk.clear();
        self.ap_an.wpa.network.psk.clear();
        self.ap_an.hostapd.wpa_psk.clear();
    }

    /// Both AP bands share one passphrase.
    pub fn change_ap_passphrase(&mut self) {
        self.ap_bg.wpa.network.psk = self.ap_bg.hostapd.wpa_psk.clone();
        self.ap_an.hostapd.wpa_psk = self.ap_bg.hostapd.wpa_psk.clone();
    }

    /// Both AP bands share one regulatory country.
    pub fn change_ap_country(&mut self) {
        self.ap_bg.wpa.country = self.ap_bg.hostapd.country_code.clone();
        self.ap_an.hostapd.country_code = self.ap_bg.hostapd.country_code.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_composition() {
        let mut form = FormData {
            cluster_name: "demo".to_string(),
            role: Some(Role::Slave),
            hostname_suffix: "01".to_string(),
            ..FormData::default()
        };
        form.update_hostname_from_suffix();
        assert_eq!(form.hostname, "demo-slave-01");

        form.role = Some(Role::VpnBridge);
        form.update_hostname_from_suffix();
        assert_eq!(form.hostname, "demo-vpnbridge-01");
    }

    #[test]
    fn branch_master_cannot_take_the_leader_suffix() {
        let mut form = FormData {
            cluster_name: "demo".to_string(),
            role: Some(Role::BranchMaster),
            hostname_suffix: "00".to_string(),
            ..FormData::default()
        };
        form.update_hostname_from_suffix();
        assert_eq!(form.hostname, "");
        assert_eq!(form.hostname_suffix, "");
    }

    #[test]
    fn generated_ssids_follow_the_naming_scheme() {
        let mut form = FormData {
            cluster_name: "demo".to_string(),
            ..FormData::default()
        };
        form.generate_backend_ssid();
        assert!(form.backend.hostapd.ssid.starts_with('_'));
        assert!(form.backend.hostapd.ssid.ends_with("-demo"));
        assert_eq!(form.backend.hostapd.ssid, form.backend.wpa.network.ssid);

        form.generate_ap_ssid();
        assert!(form.ap_bg.hostapd.ssid.starts_with("demo-"));
        assert!(form.ap_bg.hostapd.ssid.ends_with("-g"));
        assert!(form.ap_an.hostapd.ssid.ends_with("-a"));
        let bg_stem = form.ap_bg.hostapd.ssid.trim_end_matches("-g");
        let an_stem = form.ap_an.hostapd.ssid.trim_end_matches("-a");
        assert_eq!(bg_stem, an_stem);
    }

    #[test]
    fn regenerating_an_ssid_invalidates_derived_keys() {
        let mut form = FormData {
            cluster_name: "demo".to_string(),
            ..FormData::default()
        };
        form.generate_ap_ssid();
        form.ap_bg.hostapd.wpa_psk = "deadbeef".to_string();
        form.ap_an.wpa.network.psk = "deadbeef".to_string();
        form.generate_ap_ssid();
        assert_eq!(form.ap_bg.hostapd.wpa_psk, "");
        assert_eq!(form.ap_an.wpa.network.psk, "");
    }
}
