//! The wizard state machine driving user-data construction.
//!
//! Pages advance through a data-dependent transition function; each
//! forward step commits that page's form fields into the working document
//! first. Errors raised by a commit are logged and contained here so the
//! GUI never observes an unhandled fault mid-wizard.

mod form;
mod pages;

pub use form::{ConnectionMethod, FormData, RadioForm};
pub use pages::{Hardware, PageId, role_selectable};

use std::collections::HashMap;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::{GaribanError, Result};
use crate::flasher::{RenderedConfig, SecretFilePicker};
use crate::locale;
use crate::userdata::accessor::{self, WPA_PSK_LENGTH};
use crate::userdata::{
    ClusterDocument, RadioVariant, Role, SecretFileId, UserdataCollection, construct, render,
};

/// Wizard over one owned collection. The `working` copy is mutated page
/// by page; `saved` is what the store last knew, restored on a full
/// back-out to the welcome page.
pub struct UserdataWizard {
    saved: UserdataCollection,
    working: UserdataCollection,
    pub form: FormData,
    current_page: PageId,
    history: Vec<PageId>,
    page_validity: HashMap<PageId, bool>,
    first_setup: bool,
}

impl UserdataWizard {
    pub fn new(collection: UserdataCollection) -> Self {
        Self {
            saved: collection.clone(),
            working: collection,
            form: FormData::default(),
            current_page: PageId::ClusterWelcome,
            history: vec![PageId::ClusterWelcome],
            page_validity: HashMap::new(),
            first_setup: true,
        }
    }

    pub fn current_page(&self) -> PageId {
        self.current_page
    }

    pub fn page_history(&self) -> &[PageId] {
        &self.history
    }

    pub fn collection(&self) -> &UserdataCollection {
        &self.working
    }

    pub fn is_first_setup(&self) -> bool {
        self.first_setup
    }

    /// True when no cluster has ever been created on this machine.
    pub fn is_first_boot(&self) -> bool {
        self.working.clusters.is_empty()
    }

    /// Per-page validity signal supplied by the form layer. Pages without
    /// a signal count as valid.
    pub fn set_page_validity(&mut self, page: PageId, valid: bool) {
        self.page_validity.insert(page, valid);
    }

    fn page_valid(&self, page: PageId) -> bool {
        self.page_validity.get(&page).copied().unwrap_or(true)
    }

    // -----------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------

    /// Commits the current page and moves to its successor. An invalid
    /// page or a failed commit leaves the wizard where it is.
    pub fn advance(&mut self) -> PageId {
        if !self.page_valid(self.current_page) {
            debug!("page {:?} invalid, staying", self.current_page);
            return self.current_page;
        }
        match self.commit_and_next() {
            Ok(next) => self.enter(next),
            Err(e) => {
                warn!("commit on {:?} failed: {e}", self.current_page);
                self.current_page
            }
        }
    }

    /// Jumps straight to `target` (the welcome page's new/previous choice
    /// and the finish shortcut); no commit runs for the current page.
    pub fn advance_to(&mut self, target: PageId) -> PageId {
        if self.current_page == PageId::ClusterWelcome {
            self.first_setup = target == PageId::ClusterNew;
        }
        if target == PageId::AllFinish {
            if let Err(e) = render::dump(&mut self.working) {
                warn!("rendering on finish failed: {e}");
                return self.current_page;
            }
        }
        self.enter(target)
    }

    fn enter(&mut self, page: PageId) -> PageId {
        if !self.history.contains(&page) {
            self.history.push(page);
        }
        debug!("page {:?} -> {:?}", self.current_page, page);
        self.current_page = page;
        page
    }

    /// Steps back through the navigation history. Re-entering the welcome
    /// page resets every working field and refetches the document.
    pub fn retreat(&mut self) -> PageId {
        if self.history.len() <= 1 {
            self.reset_to_welcome();
            return self.current_page;
        }
        self.history.pop();
        let page = *self.history.last().unwrap_or(&PageId::ClusterWelcome);
        self.current_page = page;
        match page {
            PageId::ClusterWelcome => self.reset_to_welcome(),
            PageId::ClusterNew | PageId::ClusterPreviously => {
                self.form.hardware = None;
            }
            PageId::TypeHw => {
                self.form.role = None;
            }
            PageId::TypeRole => {
                self.form.hostname_suffix.clear();
            }
            _ => {}
        }
        self.current_page
    }

    fn reset_to_welcome(&mut self) {
        self.current_page = PageId::ClusterWelcome;
        self.history = vec![PageId::ClusterWelcome];
        self.first_setup = false;
        self.form.reset();
        self.working = self.saved.clone();
    }

    // -----------------------------------------------------------------
    // Page selection helpers
    // -----------------------------------------------------------------

    pub fn select_hardware(&mut self, hardware: Hardware) {
        self.form.hostname.clear();
        self.form.hardware = Some(hardware);
        if self.first_setup {
            self.form.role = Some(Role::LeaderMaster);
            self.form.hostname = format!("{}-master-00", self.form.cluster_name);
        }
    }

    pub fn select_role(&mut self, role: Role) {
        self.form.hostname.clear();
        self.form.role = Some(role);
        if role == Role::LeaderMaster {
            self.form.hostname = format!("{}-master-00", self.form.cluster_name);
        }
    }

    /// Opens a previously created cluster for another node's setup.
    pub fn select_previous_cluster(&mut self, index: usize) -> Result<()> {
        let doc = self
            .working
            .clusters
            .get(index)
            .ok_or_else(|| GaribanError::Lookup(format!("cluster #{index}")))?;
        self.form.cluster_name = doc.cluster_meta.id.clone();
        self.form.cluster_comment = doc.cluster_meta.comment.clone();
        accessor::set_current_cluster(&mut self.working, index);
        Ok(())
    }

    /// When the cluster came in via the previous-cluster page its topology
    /// is fixed: only the matching hardware group stays selectable.
    pub fn is_hardware_selectable(&self, hardware: Hardware) -> bool {
        if !self.history.contains(&PageId::ClusterPreviously) {
            return true;
        }
        match self.working.current() {
            Some(doc) => doc.cluster_meta.is_simple == hardware.is_simple(),
            None => true,
        }
    }

    /// Runs the native picker for an SSH key file. Cancellation clears
    /// the working field and is not an error.
    pub fn pick_secret_file(
        &mut self,
        picker: &mut dyn SecretFilePicker,
        id: SecretFileId,
    ) -> Result<()> {
        match picker.select_secret_file()? {
            None => {
                match id {
                    SecretFileId::PublicKey => self.form.public_key.clear(),
                    SecretFileId::SecretKey => self.form.secret_key.clear(),
                }
                Ok(())
            }
            Some(path) => {
                let path = path.display().to_string();
                match id {
                    SecretFileId::PublicKey => self.form.public_key = path.clone(),
                    SecretFileId::SecretKey => self.form.secret_key = path.clone(),
                }
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_source_path_of_secret_file(doc, id, &path)
            }
        }
    }

    // -----------------------------------------------------------------
    // Transition function
    // -----------------------------------------------------------------

    fn doc_mut(collection: &mut UserdataCollection) -> Result<&mut ClusterDocument> {
        collection
            .current_mut()
            .ok_or_else(|| GaribanError::Lookup("current cluster".to_string()))
    }

    fn doc(collection: &UserdataCollection) -> Result<&ClusterDocument> {
        collection
            .current()
            .ok_or_else(|| GaribanError::Lookup("current cluster".to_string()))
    }

    fn commit_and_next(&mut self) -> Result<PageId> {
        match self.current_page {
            PageId::ClusterWelcome => Ok(PageId::ClusterNew),

            PageId::ClusterNew => {
                self.first_setup = true;
                if self.form.cluster_name.is_empty() {
                    return Err(GaribanError::Validation("cluster name is empty".to_string()));
                }
                if !construct::is_cluster_id_unique(&self.working, &self.form.cluster_name) {
                    return Err(GaribanError::Validation(format!(
                        "cluster '{}' already exists",
                        self.form.cluster_name
                    )));
                }
                let name = self.form.cluster_name.clone();
                let comment = self.form.cluster_comment.clone();
                construct::push_new_cluster(&mut self.working, &name, &comment);
                self.reload_form_data()?;
                Ok(PageId::TypeHw)
            }

            PageId::ClusterPreviously => {
                self.first_setup = false;
                self.reload_form_data()?;
                Ok(PageId::TypeHw)
            }

            PageId::TypeHw => {
                let hardware = self
                    .form
                    .hardware
                    .ok_or_else(|| GaribanError::Validation("no topology chosen".to_string()))?;
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_simple_mode(doc, hardware.is_simple())?;
                Ok(PageId::TypeRole)
            }

            PageId::TypeRole => {
                let role = self
                    .form
                    .role
                    .ok_or_else(|| GaribanError::Validation("no role chosen".to_string()))?;
                match role {
                    Role::LeaderMaster => {
                        self.form.hostname_suffix = "00".to_string();
                        self.form.parent = "00".to_string();
                        Ok(PageId::ClusterHostname)
                    }
                    Role::Other => Ok(PageId::ClusterHostname),
                    _ => Ok(PageId::ClusterSuffix),
                }
            }

            PageId::ClusterSuffix => {
                if self.form.role == Some(Role::BranchMaster) {
                    self.form.parent = "00".to_string();
                }
                Ok(PageId::ClusterHostname)
            }

            PageId::ClusterHostname => {
                let hostname = self.form.hostname.clone();
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_working_hostname(doc, &hostname);
                if self.form.role == Some(Role::Other) {
                    self.form.hostname_suffix = hostname;
                }
                if self.first_setup {
                    Ok(PageId::UserdataUserinfo)
                } else {
                    Ok(PageId::ClusterApply)
                }
            }

            PageId::ClusterApply => Ok(PageId::UserdataUserinfo),

            PageId::UserdataUserinfo => {
                let username = self.form.username.clone();
                let password = self.form.password.clone();
                let keys = self.form.authorized_keys.clone();
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_username_of_root(doc, &username);
                if !password.starts_with("$6$") {
                    accessor::set_password_of_root(doc, &password)?;
                }
                accessor::set_authorized_keys_of_root(doc, &keys);
                if accessor::count_authorized_keys_of_root(doc) == 0 {
                    self.form.authorized_keys.clear();
                    return Ok(PageId::UserdataUserinfo);
                }
                Ok(PageId::UserdataEnvinfo)
            }

            PageId::UserdataEnvinfo => {
                let timezone = self.form.timezone.clone();
                let lc = self.form.locale.clone();
                let ntp = self.form.ntp.clone();
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_timezone(doc, &timezone);
                accessor::set_locale(doc, &lc);
                accessor::set_ntp(doc, ntp);
                Ok(PageId::NetworkConnection)
            }

            PageId::NetworkConnection => {
                match self.form.connection_method {
                    ConnectionMethod::Ethernet => {
                        self.form.connection_wpa.network.ssid.clear();
                        self.form.connection_wpa.network.psk.clear();
                    }
                    ConnectionMethod::Wifi => {
                        if self.form.connection_wpa.network.psk.len() != WPA_PSK_LENGTH {
                            self.form.connection_wpa.network.psk =
                                accessor::convert_to_wifi_passphrase(
                                    &self.form.connection_wpa.network.psk,
                                    &self.form.connection_wpa.network.ssid,
                                );
                        }
                    }
                }
                let country = self.form.connection_wpa.country.clone();
                let ssid = self.form.connection_wpa.network.ssid.clone();
                let psk = self.form.connection_wpa.network.psk.clone();
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_yoursite_wifi(doc, &country, &ssid, &psk)?;
                Ok(PageId::NetworkProxy)
            }

            PageId::NetworkProxy => {
                let settings = self.form.proxy.clone();
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_proxy(doc, &settings)?;
                Ok(PageId::WifiBackend)
            }

            PageId::WifiBackend => {
                if self.form.backend.hostapd.wpa_psk.len() != WPA_PSK_LENGTH {
                    let derived = accessor::convert_to_wifi_passphrase(
                        &self.form.backend.hostapd.wpa_psk,
                        &self.form.backend.hostapd.ssid,
                    );
                    self.form.backend.hostapd.wpa_psk = derived.clone();
                    self.form.backend.wpa.network.psk = derived;
                }
                self.form.backend.wpa.network.ssid = self.form.backend.hostapd.ssid.clone();
                let hostapd = self.form.backend.hostapd.clone();
                let wpa = self.form.backend.wpa.clone();
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_hostapd(doc, RadioVariant::Be, hostapd)?;
                accessor::set_wpa_supplicant(doc, RadioVariant::Be, wpa)?;
                Ok(PageId::WifiApBg)
            }

            PageId::WifiApBg => {
                if self.form.ap_bg.hostapd.ssid == self.form.ap_an.hostapd.ssid {
                    self.form.ap_an.hostapd.ssid =
                        format!("{}-a", self.form.ap_bg.hostapd.ssid);
                }
                if self.form.ap_bg.hostapd.wpa_psk.len() != WPA_PSK_LENGTH {
                    let derived = accessor::convert_to_wifi_passphrase(
                        &self.form.ap_bg.hostapd.wpa_psk,
                        &self.form.ap_bg.hostapd.ssid,
                    );
                    self.form.ap_bg.hostapd.wpa_psk = derived.clone();
                    self.form.ap_bg.wpa.network.psk = derived;
                }
                self.form.ap_bg.wpa.network.ssid = self.form.ap_bg.hostapd.ssid.clone();
                let hostapd = self.form.ap_bg.hostapd.clone();
                let wpa = self.form.ap_bg.wpa.clone();
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_hostapd(doc, RadioVariant::ApBg, hostapd)?;
                accessor::set_wpa_supplicant(doc, RadioVariant::ApBg, wpa)?;
                let simple = self.form.hardware.map(|h| h.is_simple()).unwrap_or(true);
                if simple {
                    Ok(PageId::VpnBridge)
                } else {
                    Ok(PageId::WifiApAn)
                }
            }

            PageId::WifiApAn => {
                if self.form.ap_an.hostapd.wpa_psk.len() != WPA_PSK_LENGTH {
                    let derived = accessor::convert_to_wifi_passphrase(
                        &self.form.ap_an.hostapd.wpa_psk,
                        &self.form.ap_an.hostapd.ssid,
                    );
                    self.form.ap_an.hostapd.wpa_psk = derived.clone();
                    self.form.ap_an.wpa.network.psk = derived;
                }
                self.form.ap_an.wpa.network.ssid = self.form.ap_an.hostapd.ssid.clone();
                let hostapd = self.form.ap_an.hostapd.clone();
                let wpa = self.form.ap_an.wpa.clone();
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_hostapd(doc, RadioVariant::ApAn, hostapd)?;
                accessor::set_wpa_supplicant(doc, RadioVariant::ApAn, wpa)?;
                Ok(PageId::VpnBridge)
            }

            PageId::VpnBridge => {
                let content = self.form.vpn_bridge.clone();
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_vpn_bridge(doc, content)?;
                Ok(PageId::JoinKubernetes)
            }

            PageId::JoinKubernetes => {
                let args = self.form.kubeadm_join_args.clone();
                let doc = Self::doc_mut(&mut self.working)?;
                accessor::set_kubeadm_join_args(doc, &args)?;
                render::dump(&mut self.working)?;
                Ok(PageId::AllFinish)
            }

            PageId::AllFinish => Ok(PageId::AllFinish),
        }
    }

    // -----------------------------------------------------------------
    // Form <-> document
    // -----------------------------------------------------------------

    /// Pulls every form field from the current document, inferring the
    /// fields the document only stores indirectly.
    fn reload_form_data(&mut self) -> Result<()> {
        {
            let doc = Self::doc(&self.working)?;

            self.form.username = accessor::username_of_root(doc);
            self.form.password = Zeroizing::new(accessor::password_of_root(doc));
            self.form.public_key =
                accessor::source_path_of_secret_file(doc, SecretFileId::PublicKey)?;
            self.form.secret_key =
                accessor::source_path_of_secret_file(doc, SecretFileId::SecretKey)?;
            self.form.authorized_keys = accessor::authorized_keys_of_root(doc).join("\n");

            let prediction = locale::predict_locale_and_timezone();
            self.form.timezone = prediction.timezone;
            self.form.locale = prediction.locale;
            self.form.ntp = accessor::ntp_of_cluster(doc);
            self.form.country = locale::country_code_for_timezone(&self.form.timezone)
                .unwrap_or("US")
                .to_string();

            self.form.connection_wpa =
                accessor::wpa_supplicant(doc, RadioVariant::Yoursite)?.clone();
            self.form.connection_method = if self.form.connection_wpa.network.ssid.is_empty() {
                ConnectionMethod::Ethernet
            } else {
                ConnectionMethod::Wifi
            };

            self.form.proxy = accessor::parse_proxy_settings(doc)?;

            self.form.backend.hostapd = accessor::hostapd(doc, RadioVariant::Be)?.clone();
            self.form.backend.wpa = accessor::wpa_supplicant(doc, RadioVariant::Be)?.clone();
            self.form.ap_bg.hostapd = accessor::hostapd(doc, RadioVariant::ApBg)?.clone();
            self.form.ap_bg.wpa = accessor::wpa_supplicant(doc, RadioVariant::ApBg)?.clone();
            self.form.ap_an.hostapd = accessor::hostapd(doc, RadioVariant::ApAn)?.clone();
            self.form.ap_an.wpa = accessor::wpa_supplicant(doc, RadioVariant::ApAn)?.clone();

            self.form.vpn_bridge = accessor::vpn_bridge(doc)?.clone();
            self.form.kubeadm_join_args = accessor::kubeadm_join_args(doc)?;
        }

        if self.form.backend.hostapd.ssid.is_empty() {
            self.form.generate_backend_ssid();
        }
        if self.form.ap_bg.hostapd.ssid.is_empty() {
            self.form.generate_ap_ssid();
        }
        self.apply_country_defaults();
        Ok(())
    }

    /// Back-fills empty Wi-Fi regulatory countries from the predicted
    /// timezone's country.
    fn apply_country_defaults(&mut self) {
        let country = self.form.country.clone();
        if country.is_empty() {
            return;
        }
        if self.form.connection_wpa.country.is_empty() {
            self.form.connection_wpa.country = country.clone();
        }
        if self.form.backend.hostapd.country_code.is_empty() {
            self.form.backend.hostapd.country_code = country.clone();
        }
        if self.form.ap_bg.hostapd.country_code.is_empty() {
            self.form.ap_bg.hostapd.country_code = country.clone();
        }
        if self.form.ap_an.hostapd.country_code.is_empty() {
            self.form.ap_an.hostapd.country_code = country;
        }
    }

    // -----------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------

    /// The save step: registers the committed role suffix, stamps the
    /// update date, promotes the working hostname, and re-renders. The
    /// caller persists the returned collection; in-memory state is not
    /// rolled back if that write fails.
    pub fn finalize(&mut self) -> Result<&UserdataCollection> {
        let role = self
            .form
            .role
            .ok_or_else(|| GaribanError::Validation("no role chosen".to_string()))?;
        let suffix = self.form.hostname_suffix.clone();
        let parent = self.form.parent.clone();
        {
            let doc = Self::doc_mut(&mut self.working)?;
            accessor::reset_committed_hostname(doc);
            accessor::touch_update_date(doc);
            accessor::add_suffix_for_role(doc, role, &suffix, &parent);
            accessor::commit_hostname(doc);
        }
        render::dump(&mut self.working)?;
        self.saved = self.working.clone();
        Ok(&self.working)
    }

    /// What the flasher consumes after a successful finalize.
    pub fn rendered_config(&self) -> RenderedConfig {
        RenderedConfig {
            combined_text: self.working.current_rendered_text.clone(),
            secret_files: self.working.current_rendered_files.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::userdata::accessor::ProxyMode;

    fn demo_wizard_through_finish() -> UserdataWizard {
        let mut w = UserdataWizard::new(UserdataCollection::default());
        assert_eq!(w.current_page(), PageId::ClusterWelcome);

        assert_eq!(w.advance(), PageId::ClusterNew);
        w.form.cluster_name = "demo".to_string();
        assert_eq!(w.advance(), PageId::TypeHw);
        assert!(w.is_first_setup());
        assert_eq!(w.collection().clusters.len(), 1);

        w.select_hardware(Hardware::ApOnly);
        assert_eq!(w.form.role, Some(Role::LeaderMaster));
        assert_eq!(w.form.hostname, "demo-master-00");
        assert_eq!(w.advance(), PageId::TypeRole);
        assert!(w.collection().current().unwrap().cluster_meta.is_simple);

        assert_eq!(w.advance(), PageId::ClusterHostname);
        assert_eq!(w.form.hostname_suffix, "00");
        assert_eq!(w.form.parent, "00");

        assert_eq!(w.advance(), PageId::UserdataUserinfo);

        w.form.username = "ubuntu".to_string();
        w.form.password = Zeroizing::new("ubuntu-password".to_string());
        w.form.authorized_keys = "ssh-rsa AAAA operator@laptop".to_string();
        assert_eq!(w.advance(), PageId::UserdataEnvinfo);

        assert_eq!(w.advance(), PageId::NetworkConnection);
        w.form.connection_method = ConnectionMethod::Ethernet;
        assert_eq!(w.advance(), PageId::NetworkProxy);

        w.form.proxy.mode = ProxyMode::Unnecessary;
        assert_eq!(w.advance(), PageId::WifiBackend);
        assert_eq!(w.advance(), PageId::WifiApBg);
        // ApOnly topology skips the 5 GHz AP page.
        assert_eq!(w.advance(), PageId::VpnBridge);
        assert_eq!(w.advance(), PageId::JoinKubernetes);
        assert_eq!(w.advance(), PageId::AllFinish);
        w
    }

    #[test]
    fn demo_traversal_renders_the_expected_skeleton() {
        let w = demo_wizard_through_finish();
        let text = &w.collection().current_rendered_text;
        assert!(text.starts_with("#cloud-config\n"));
        assert!(text.contains("hostname: demo-master-00"));
        assert!(!text.contains("hostapd_ap_an.conf"));
        assert!(!text.contains("wpa_supplicant_ap_an.conf"));
        assert!(!text.contains("wpa_supplicant_yoursite.conf"));

        let doc = w.collection().current().unwrap();
        let entry = accessor::write_file(doc, construct::FILE_HTTP_PROXY).unwrap();
        assert_eq!(entry.rendered_content, "http_proxy=\n");

        // Password left the form as plaintext and landed as a hash.
        assert!(accessor::password_of_root(doc).starts_with("$6$"));
        assert_eq!(accessor::username_of_root(doc), "ubuntu");
        assert_eq!(
            accessor::authorized_keys_of_root(doc),
            vec!["ssh-rsa AAAA operator@laptop"]
        );

        // Finish page self-loops.
        let mut w = w;
        assert_eq!(w.advance(), PageId::AllFinish);
    }

    #[test]
    fn finalize_registers_the_role_and_commits_the_hostname() {
        let mut w = demo_wizard_through_finish();
        w.finalize().unwrap();
        let doc = w.collection().current().unwrap();
        assert_eq!(accessor::committed_hostname(doc), "demo-master-00");
        assert_eq!(
            doc.cluster_meta.role_lists.leader_master,
            vec![crate::userdata::RoleMember {
                id: "00".to_string(),
                parent: "00".to_string(),
            }]
        );
        assert!(!doc.info.update_date.is_empty());
        let config = w.rendered_config();
        assert!(config.combined_text.contains("hostname: demo-master-00"));

        // Finalizing twice keeps the role list stable.
        w.finalize().unwrap();
        let doc = w.collection().current().unwrap();
        assert_eq!(doc.cluster_meta.role_lists.leader_master.len(), 1);
    }

    #[test]
    fn invalid_page_blocks_advance() {
        let mut w = UserdataWizard::new(UserdataCollection::default());
        w.advance();
        w.form.cluster_name = "demo".to_string();
        w.set_page_validity(PageId::ClusterNew, false);
        assert_eq!(w.advance(), PageId::ClusterNew);
        assert!(w.collection().clusters.is_empty());
        w.set_page_validity(PageId::ClusterNew, true);
        assert_eq!(w.advance(), PageId::TypeHw);
    }

    #[test]
    fn duplicate_cluster_name_is_contained() {
        let mut collection = UserdataCollection::default();
        construct::push_new_cluster(&mut collection, "demo", "");
        let mut w = UserdataWizard::new(collection);
        w.advance();
        w.form.cluster_name = "demo".to_string();
        // Commit fails, wizard stays put, nothing was appended.
        assert_eq!(w.advance(), PageId::ClusterNew);
        assert_eq!(w.collection().clusters.len(), 1);
    }

    #[test]
    fn userinfo_without_rsa_keys_stays_on_the_page() {
        let mut w = UserdataWizard::new(UserdataCollection::default());
        w.advance();
        w.form.cluster_name = "demo".to_string();
        w.advance();
        w.select_hardware(Hardware::ApOnly);
        w.advance();
        w.advance();
        assert_eq!(w.advance(), PageId::UserdataUserinfo);
        w.form.username = "ubuntu".to_string();
        w.form.password = Zeroizing::new("pw".to_string());
        w.form.authorized_keys = "ssh-ed25519 AAAA nope".to_string();
        assert_eq!(w.advance(), PageId::UserdataUserinfo);
        assert_eq!(w.form.authorized_keys, "");
    }

    #[test]
    fn retreat_to_welcome_resets_everything() {
        let mut w = UserdataWizard::new(UserdataCollection::default());
        w.advance();
        w.form.cluster_name = "demo".to_string();
        w.advance();
        w.select_hardware(Hardware::FullMesh);
        w.advance();
        assert_eq!(w.current_page(), PageId::TypeRole);
        assert_eq!(w.page_history().len(), 4);

        w.retreat(); // TypeHw
        assert_eq!(w.current_page(), PageId::TypeHw);
        assert_eq!(w.form.role, None);
        w.retreat(); // ClusterNew
        assert_eq!(w.form.hardware, None);
        w.retreat(); // ClusterWelcome
        assert_eq!(w.current_page(), PageId::ClusterWelcome);
        assert_eq!(w.page_history(), &[PageId::ClusterWelcome]);
        assert_eq!(w.form.cluster_name, "");
        // The working copy was refetched: the uncommitted cluster is gone.
        assert!(w.collection().clusters.is_empty());
    }

    #[test]
    fn full_mesh_visits_the_5ghz_page_and_separates_ap_ssids() {
        let mut w = UserdataWizard::new(UserdataCollection::default());
        w.advance();
        w.form.cluster_name = "mesh".to_string();
        w.advance();
        w.select_hardware(Hardware::FullMesh);
        w.advance();
        w.advance();
        w.advance();
        w.form.username = "ubuntu".to_string();
        w.form.password = Zeroizing::new("pw".to_string());
        w.form.authorized_keys = "ssh-rsa AAAA k".to_string();
        w.advance();
        w.advance();
        w.form.connection_method = ConnectionMethod::Ethernet;
        w.advance();
        w.form.proxy.mode = ProxyMode::Unnecessary;
        w.advance();
        assert_eq!(w.current_page(), PageId::WifiBackend);
        w.form.backend.hostapd.wpa_psk = "backend-passphrase".to_string();
        w.advance();
        assert_eq!(w.current_page(), PageId::WifiApBg);

        // Force an SSID collision; the commit must separate the bands.
        w.form.ap_an.hostapd.ssid = w.form.ap_bg.hostapd.ssid.clone();
        let bg_ssid = w.form.ap_bg.hostapd.ssid.clone();
        w.form.ap_bg.hostapd.wpa_psk = "ap-passphrase".to_string();
        assert_eq!(w.advance(), PageId::WifiApAn);
        assert_eq!(w.form.ap_an.hostapd.ssid, format!("{bg_ssid}-a"));

        w.form.ap_an.hostapd.wpa_psk = "ap-passphrase".to_string();
        assert_eq!(w.advance(), PageId::VpnBridge);

        let doc = w.collection().current().unwrap();
        let be = accessor::hostapd(doc, RadioVariant::Be).unwrap();
        assert_eq!(be.wpa_psk.len(), WPA_PSK_LENGTH);
        let bg = accessor::hostapd(doc, RadioVariant::ApBg).unwrap();
        assert_eq!(bg.wpa_psk.len(), WPA_PSK_LENGTH);
        let an = accessor::hostapd(doc, RadioVariant::ApAn).unwrap();
        assert_eq!(an.wpa_psk.len(), WPA_PSK_LENGTH);
        // Different SSIDs, same passphrase: different derived keys.
        assert_ne!(bg.wpa_psk, an.wpa_psk);
        assert!(!doc.cluster_meta.is_simple);
    }

    #[test]
    fn welcome_choice_sets_first_setup() {
        let mut collection = UserdataCollection::default();
        construct::push_new_cluster(&mut collection, "demo", "");
        let mut w = UserdataWizard::new(collection);
        assert!(!w.is_first_boot());
        assert_eq!(w.advance_to(PageId::ClusterPreviously), PageId::ClusterPreviously);
        assert!(!w.is_first_setup());
        w.select_previous_cluster(0).unwrap();
        assert_eq!(w.form.cluster_name, "demo");
        assert_eq!(w.advance(), PageId::TypeHw);
    }

    #[test]
    fn cancelled_secret_pick_clears_the_field() {
        struct NoPick;
        impl SecretFilePicker for NoPick {
            fn select_secret_file(&mut self) -> crate::error::Result<Option<std::path::PathBuf>> {
                Ok(None)
            }
        }
        struct PickOne;
        impl SecretFilePicker for PickOne {
            fn select_secret_file(&mut self) -> crate::error::Result<Option<std::path::PathBuf>> {
                Ok(Some(std::path::PathBuf::from("/home/op/.ssh/id_rsa.pub")))
            }
        }

        let mut collection = UserdataCollection::default();
        construct::push_new_cluster(&mut collection, "demo", "");
        let mut w = UserdataWizard::new(collection);

        w.pick_secret_file(&mut PickOne, SecretFileId::PublicKey).unwrap();
        assert_eq!(w.form.public_key, "/home/op/.ssh/id_rsa.pub");
        let doc = w.collection().current().unwrap();
        assert_eq!(
            accessor::source_path_of_secret_file(doc, SecretFileId::PublicKey).unwrap(),
            "/home/op/.ssh/id_rsa.pub"
        );

        w.pick_secret_file(&mut NoPick, SecretFileId::PublicKey).unwrap();
        assert_eq!(w.form.public_key, "");
    }
}
