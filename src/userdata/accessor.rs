//! Get/set operations over a cluster document.
//!
//! Entries are addressed by stable id, resolved with a linear scan; the
//! collections stay in the tens of entries, so the scan is the intended
//! design. A missing id is a programming error and surfaces as
//! [`GaribanError::Lookup`].

use std::sync::LazyLock;

use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use regex::Regex;
use sha1::Sha1;
use sha_crypt::{Sha512Params, sha512_crypt_b64};
use url::Url;

use crate::error::{GaribanError, Result};

use super::construct::{FILE_HTTP_PROXY, FILE_NO_PROXY, FILE_VPNBRIDGE, RUNCMD_KUBEADM_JOIN};
use super::{
    AdminUser, ClusterDocument, HostapdContent, NtpConfig, RadioVariant, Role, RoleMember,
    RunCommandEntry, SecretFileEntry, SecretFileId, UserdataCollection, VpnBridgeContent,
    WpaSupplicantContent, WriteFileEntry, WriteFilePayload, construct,
};

/// Length of a derived WPA2 PSK in hex characters.
pub const WPA_PSK_LENGTH: usize = 64;

const PBKDF2_ROUNDS: u32 = 4096;
// Classic crypt default; a plain `$6$salt$hash` string implies it.
const CRYPT_ROUNDS: usize = 5_000;
const CRYPT_SALT_LENGTH: usize = 15;
const SEED_OF_RANDOM_CHAR: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

static ADDR_OR_CIDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,3}\.){3}[0-9]{1,3}(/([0-9]|[1-2][0-9]|3[0-2]))?$")
        .expect("static pattern")
});

// ---------------------------------------------------------------------------
// Lookup by id
// ---------------------------------------------------------------------------

pub fn write_file<'a>(doc: &'a ClusterDocument, id: &str) -> Result<&'a WriteFileEntry> {
    doc.artifacts
        .write_files
        .iter()
        .find(|f| f.id == id)
        .ok_or_else(|| GaribanError::Lookup(id.to_string()))
}

pub fn write_file_mut<'a>(doc: &'a mut ClusterDocument, id: &str) -> Result<&'a mut WriteFileEntry> {
    doc.artifacts
        .write_files
        .iter_mut()
        .find(|f| f.id == id)
        .ok_or_else(|| GaribanError::Lookup(id.to_string()))
}

pub fn has_write_file(doc: &ClusterDocument, id: &str) -> bool {
    doc.artifacts.write_files.iter().any(|f| f.id == id)
}

pub fn run_command<'a>(doc: &'a ClusterDocument, id: &str) -> Result<&'a RunCommandEntry> {
    doc.artifacts
        .run_commands
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| GaribanError::Lookup(id.to_string()))
}

pub fn run_command_mut<'a>(
    doc: &'a mut ClusterDocument,
    id: &str,
) -> Result<&'a mut RunCommandEntry> {
    doc.artifacts
        .run_commands
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| GaribanError::Lookup(id.to_string()))
}

pub fn secret_file(doc: &ClusterDocument, id: SecretFileId) -> Result<&SecretFileEntry> {
    doc.artifacts
        .secret_files
        .iter()
        .find(|f| f.id == id)
        .ok_or_else(|| GaribanError::Lookup(format!("{id:?}")))
}

pub fn secret_file_mut(
    doc: &mut ClusterDocument,
    id: SecretFileId,
) -> Result<&mut SecretFileEntry> {
    doc.artifacts
        .secret_files
        .iter_mut()
        .find(|f| f.id == id)
        .ok_or_else(|| GaribanError::Lookup(format!("{id:?}")))
}

// ---------------------------------------------------------------------------
// Typed payload access
// ---------------------------------------------------------------------------

pub fn wpa_supplicant(
    doc: &ClusterDocument,
    variant: RadioVariant,
) -> Result<&WpaSupplicantContent> {
    let id = construct::wpa_file_id(variant);
    match &write_file(doc, &id)?.payload {
        WriteFilePayload::WpaSupplicant(content) => Ok(content),
        _ => Err(GaribanError::Lookup(id)),
    }
}

pub fn wpa_supplicant_mut(
    doc: &mut ClusterDocument,
    variant: RadioVariant,
) -> Result<&mut WpaSupplicantContent> {
    let id = construct::wpa_file_id(variant);
    match &mut write_file_mut(doc, &id)?.payload {
        WriteFilePayload::WpaSupplicant(content) => Ok(content),
        _ => Err(GaribanError::Lookup(id)),
    }
}

pub fn hostapd(doc: &ClusterDocument, variant: RadioVariant) -> Result<&HostapdContent> {
    let id = construct::hostapd_file_id(variant);
    match &write_file(doc, &id)?.payload {
        WriteFilePayload::Hostapd(content) => Ok(content),
        _ => Err(GaribanError::Lookup(id)),
    }
}

pub fn hostapd_mut(doc: &mut ClusterDocument, variant: RadioVariant) -> Result<&mut HostapdContent> {
    let id = construct::hostapd_file_id(variant);
    match &mut write_file_mut(doc, &id)?.payload {
        WriteFilePayload::Hostapd(content) => Ok(content),
        _ => Err(GaribanError::Lookup(id)),
    }
}

pub fn vpn_bridge(doc: &ClusterDocument) -> Result<&VpnBridgeContent> {
    match &write_file(doc, FILE_VPNBRIDGE)?.payload {
        WriteFilePayload::VpnBridge(content) => Ok(content),
        _ => Err(GaribanError::Lookup(FILE_VPNBRIDGE.to_string())),
    }
}

pub fn vpn_bridge_mut(doc: &mut ClusterDocument) -> Result<&mut VpnBridgeContent> {
    match &mut write_file_mut(doc, FILE_VPNBRIDGE)?.payload {
        WriteFilePayload::VpnBridge(content) => Ok(content),
        _ => Err(GaribanError::Lookup(FILE_VPNBRIDGE.to_string())),
    }
}

pub fn http_proxy_value(doc: &ClusterDocument) -> Result<String> {
    match &write_file(doc, FILE_HTTP_PROXY)?.payload {
        WriteFilePayload::HttpProxy(content) => Ok(content.http_proxy.clone()),
        _ => Err(GaribanError::Lookup(FILE_HTTP_PROXY.to_string())),
    }
}

pub fn no_proxy_value(doc: &ClusterDocument) -> Result<String> {
    match &write_file(doc, FILE_NO_PROXY)?.payload {
        WriteFilePayload::NoProxy(content) => Ok(content.no_proxy.clone()),
        _ => Err(GaribanError::Lookup(FILE_NO_PROXY.to_string())),
    }
}

pub fn set_wpa_supplicant(
    doc: &mut ClusterDocument,
    variant: RadioVariant,
    content: WpaSupplicantContent,
) -> Result<()> {
    *wpa_supplicant_mut(doc, variant)? = content;
    Ok(())
}

pub fn set_hostapd(
    doc: &mut ClusterDocument,
    variant: RadioVariant,
    content: HostapdContent,
) -> Result<()> {
    *hostapd_mut(doc, variant)? = content;
    Ok(())
}

pub fn set_vpn_bridge(doc: &mut ClusterDocument, content: VpnBridgeContent) -> Result<()> {
    *vpn_bridge_mut(doc)? = content;
    Ok(())
}

/// Sets the upstream Wi-Fi client entry. `psk` is the already-derived key
/// (or empty when clearing).
pub fn set_yoursite_wifi(
    doc: &mut ClusterDocument,
    country: &str,
    ssid: &str,
    psk: &str,
) -> Result<()> {
    let content = wpa_supplicant_mut(doc, RadioVariant::Yoursite)?;
    content.country = country.to_string();
    content.network.ssid = ssid.to_string();
    content.network.psk = psk.to_string();
    Ok(())
}

/// Flags the topology both on the marker file and the cluster metadata so
/// the serializer's selection rule and the flag file can never disagree.
pub fn set_simple_mode(doc: &mut ClusterDocument, is_simple: bool) -> Result<()> {
    doc.cluster_meta.is_simple = is_simple;
    match &mut write_file_mut(doc, construct::FILE_IS_SIMPLE)?.payload {
        WriteFilePayload::IsSimple(content) => {
            content.is_simple = is_simple;
            Ok(())
        }
        _ => Err(GaribanError::Lookup(construct::FILE_IS_SIMPLE.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Root user
// ---------------------------------------------------------------------------

fn admin(doc: &ClusterDocument) -> Option<&AdminUser> {
    doc.cloud_init.users.first()
}

fn admin_mut(doc: &mut ClusterDocument) -> &mut AdminUser {
    if doc.cloud_init.users.is_empty() {
        doc.cloud_init.users.push(AdminUser::default());
    }
    &mut doc.cloud_init.users[0]
}

pub fn username_of_root(doc: &ClusterDocument) -> String {
    admin(doc).map(|u| u.name.clone()).unwrap_or_default()
}

pub fn set_username_of_root(doc: &mut ClusterDocument, name: &str) {
    admin_mut(doc).name = name.to_string();
}

/// The stored hash, `$6$...`; never plaintext.
pub fn password_of_root(doc: &ClusterDocument) -> String {
    admin(doc).map(|u| u.passwd.clone()).unwrap_or_default()
}

/// Hashes `plaintext` with SHA-512 crypt under a fresh 15-character
/// alphanumeric salt and stores only the hash.
pub fn set_password_of_root(doc: &mut ClusterDocument, plaintext: &str) -> Result<()> {
    let salt = generate_random_string(CRYPT_SALT_LENGTH);
    let params = Sha512Params::new(CRYPT_ROUNDS)
        .map_err(|e| GaribanError::PasswordHash(format!("{e:?}")))?;
    let hash = sha512_crypt_b64(plaintext.as_bytes(), salt.as_bytes(), &params)
        .map_err(|e| GaribanError::PasswordHash(format!("{e:?}")))?;
    admin_mut(doc).passwd = format!("$6${salt}${hash}");
    Ok(())
}

pub fn authorized_keys_of_root(doc: &ClusterDocument) -> Vec<String> {
    admin(doc)
        .map(|u| u.ssh_authorized_keys.clone())
        .unwrap_or_default()
}

pub fn count_authorized_keys_of_root(doc: &ClusterDocument) -> usize {
    admin(doc).map(|u| u.ssh_authorized_keys.len()).unwrap_or(0)
}

/// Replaces the authorized-key set with the RSA-prefixed, de-duplicated
/// lines of `text`. The whole list is swapped, never merged.
pub fn set_authorized_keys_of_root(doc: &mut ClusterDocument, text: &str) {
    let mut keys: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if !line.starts_with("ssh-rsa ") {
            continue;
        }
        if !keys.iter().any(|k| k == line) {
            keys.push(line.to_string());
        }
    }
    admin_mut(doc).ssh_authorized_keys = keys;
}

// ---------------------------------------------------------------------------
// Hostname / environment
// ---------------------------------------------------------------------------

pub fn working_hostname(doc: &ClusterDocument) -> &str {
    &doc.cloud_init.hostname
}

pub fn set_working_hostname(doc: &mut ClusterDocument, hostname: &str) {
    doc.cloud_init.hostname = hostname.to_string();
}

pub fn committed_hostname(doc: &ClusterDocument) -> &str {
    &doc.hostname
}

/// Copies the working hostname into the committed slot (naming finalized).
pub fn commit_hostname(doc: &mut ClusterDocument) {
    doc.hostname = doc.cloud_init.hostname.clone();
}

/// Clears the committed slot; the working hostname is retained.
pub fn reset_committed_hostname(doc: &mut ClusterDocument) {
    doc.hostname.clear();
}

pub fn set_timezone(doc: &mut ClusterDocument, timezone: &str) {
    doc.cloud_init.timezone = timezone.to_string();
}

pub fn set_locale(doc: &mut ClusterDocument, locale: &str) {
    doc.cloud_init.locale = locale.to_string();
}

pub fn ntp_of_cluster(doc: &ClusterDocument) -> NtpConfig {
    doc.cloud_init.ntp.clone()
}

pub fn set_ntp(doc: &mut ClusterDocument, ntp: NtpConfig) {
    doc.cloud_init.ntp = ntp;
}

pub fn touch_update_date(doc: &mut ClusterDocument) {
    doc.info.update_date = construct::now_iso8601();
}

// ---------------------------------------------------------------------------
// Secret files
// ---------------------------------------------------------------------------

pub fn source_path_of_secret_file(doc: &ClusterDocument, id: SecretFileId) -> Result<String> {
    Ok(secret_file(doc, id)?.source_path.clone())
}

pub fn set_source_path_of_secret_file(
    doc: &mut ClusterDocument,
    id: SecretFileId,
    path: &str,
) -> Result<()> {
    secret_file_mut(doc, id)?.source_path = path.to_string();
    Ok(())
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Registers a hostname suffix under `role`. Idempotent by suffix id.
pub fn add_suffix_for_role(doc: &mut ClusterDocument, role: Role, id: &str, parent: &str) {
    let members = doc.cluster_meta.role_lists.members_mut(role);
    if members.iter().any(|m| m.id == id) {
        return;
    }
    members.push(RoleMember {
        id: id.to_string(),
        parent: parent.to_string(),
    });
}

/// Parent candidates a Slave can attach to: the leader (`00`) plus every
/// registered BranchMaster suffix.
pub fn branch_parent_candidates(doc: &ClusterDocument) -> Vec<String> {
    let mut parents = vec!["00".to_string()];
    for member in &doc.cluster_meta.role_lists.branch_master {
        parents.push(member.id.clone());
    }
    parents
}

// ---------------------------------------------------------------------------
// Kubernetes join
// ---------------------------------------------------------------------------

pub fn kubeadm_join_args(doc: &ClusterDocument) -> Result<String> {
    Ok(run_command(doc, RUNCMD_KUBEADM_JOIN)?.argument_string.clone())
}

pub fn set_kubeadm_join_args(doc: &mut ClusterDocument, args: &str) -> Result<()> {
    run_command_mut(doc, RUNCMD_KUBEADM_JOIN)?.argument_string = args.to_string();
    Ok(())
}

// ---------------------------------------------------------------------------
// Proxy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyMode {
    #[default]
    Unnecessary,
    Necessary,
    Auth,
}

/// Proxy fields as the wizard edits them, recovered from the stored URL.
#[derive(Debug, Clone, Default)]
pub struct ProxySettings {
    pub mode: ProxyMode,
    pub address: String,
    pub port: String,
    pub no_proxy: String,
    pub user: String,
    pub password: String,
}

pub fn set_http_proxy(doc: &mut ClusterDocument, value: &str) -> Result<()> {
    match &mut write_file_mut(doc, FILE_HTTP_PROXY)?.payload {
        WriteFilePayload::HttpProxy(content) => {
            content.http_proxy = value.to_string();
            Ok(())
        }
        _ => Err(GaribanError::Lookup(FILE_HTTP_PROXY.to_string())),
    }
}

pub fn set_no_proxy(doc: &mut ClusterDocument, value: &str) -> Result<()> {
    match &mut write_file_mut(doc, FILE_NO_PROXY)?.payload {
        WriteFilePayload::NoProxy(content) => {
            content.no_proxy = value.to_string();
            Ok(())
        }
        _ => Err(GaribanError::Lookup(FILE_NO_PROXY.to_string())),
    }
}

/// Writes both proxy strings from the wizard's proxy page fields.
///
/// `Unnecessary` clears both; the other modes build `scheme://host:port`
/// (with `user:password@` embedded for `Auth`) and sanitize the no-proxy
/// list down to IPv4/CIDR tokens.
pub fn set_proxy(doc: &mut ClusterDocument, settings: &ProxySettings) -> Result<()> {
    let (http_proxy, no_proxy) = match settings.mode {
        ProxyMode::Unnecessary => (String::new(), String::new()),
        ProxyMode::Necessary => {
            let parsed = Url::parse(&settings.address)?;
            let host = parsed
                .host_str()
                .ok_or_else(|| GaribanError::Validation("proxy address has no host".to_string()))?;
            (
                format!("{}://{}:{}", parsed.scheme(), host, settings.port),
                sanitize_no_proxy(&settings.no_proxy),
            )
        }
        ProxyMode::Auth => {
            let parsed = Url::parse(&settings.address)?;
            let host = parsed
                .host_str()
                .ok_or_else(|| GaribanError::Validation("proxy address has no host".to_string()))?;
            (
                format!(
                    "{}://{}:{}@{}:{}",
                    parsed.scheme(),
                    settings.user,
                    settings.password,
                    host,
                    settings.port
                ),
                sanitize_no_proxy(&settings.no_proxy),
            )
        }
    };
    set_http_proxy(doc, &http_proxy)?;
    set_no_proxy(doc, &no_proxy)
}

/// Keeps only comma-separated IPv4-address-or-CIDR tokens, whitespace
/// stripped. Non-matching tokens are dropped silently.
pub fn sanitize_no_proxy(input: &str) -> String {
    input
        .split(',')
        .map(|token| token.replace(char::is_whitespace, ""))
        .filter(|token| ADDR_OR_CIDR.is_match(token))
        .collect::<Vec<_>>()
        .join(",")
}

/// Recovers the proxy page's fields from the stored proxy strings.
pub fn parse_proxy_settings(doc: &ClusterDocument) -> Result<ProxySettings> {
    let http_proxy = http_proxy_value(doc)?;
    let no_proxy = no_proxy_value(doc)?;
    if http_proxy.is_empty() {
        return Ok(ProxySettings {
            mode: ProxyMode::Unnecessary,
            no_proxy,
            ..ProxySettings::default()
        });
    }
    let parsed = Url::parse(&http_proxy)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| GaribanError::Validation("stored proxy has no host".to_string()))?;
    let address = format!("{}://{}", parsed.scheme(), host);
    let port = parsed.port().map(|p| p.to_string()).unwrap_or_default();
    if parsed.username().is_empty() {
        Ok(ProxySettings {
            mode: ProxyMode::Necessary,
            address,
            port,
            no_proxy,
            ..ProxySettings::default()
        })
    } else {
        Ok(ProxySettings {
            mode: ProxyMode::Auth,
            address,
            port,
            no_proxy,
            user: parsed.username().to_string(),
            password: parsed.password().unwrap_or_default().to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// WPA2 passphrase-to-PSK derivation: PBKDF2-HMAC-SHA1, 4096 rounds,
/// keyed by the SSID, hex-encoded. Returns the input unchanged when either
/// side is empty.
pub fn convert_to_wifi_passphrase(plaintext: &str, ssid: &str) -> String {
    if plaintext.is_empty() || ssid.is_empty() {
        return plaintext.to_string();
    }
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha1>(
        plaintext.as_bytes(),
        ssid.as_bytes(),
        PBKDF2_ROUNDS,
        &mut key,
    );
    hex::encode(key)
}

/// Random string over the alphanumeric seed alphabet (salts, SSIDs).
pub fn generate_random_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| SEED_OF_RANDOM_CHAR[rng.gen_range(0..SEED_OF_RANDOM_CHAR.len())] as char)
        .collect()
}

// ---------------------------------------------------------------------------
// Collection level
// ---------------------------------------------------------------------------

pub fn cluster_id_by_index(collection: &UserdataCollection, index: usize) -> Option<&str> {
    collection
        .clusters
        .get(index)
        .map(|c| c.cluster_meta.id.as_str())
}

pub fn set_current_cluster(collection: &mut UserdataCollection, index: usize) {
    collection.current_cluster = index;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::userdata::construct::build_cluster_document;

    #[test]
    fn password_hash_never_stores_plaintext() {
        let mut doc = build_cluster_document();
        set_password_of_root(&mut doc, "hunter2secret").unwrap();
        let stored = password_of_root(&doc);
        assert!(stored.starts_with("$6$"));
        assert!(!stored.contains("hunter2secret"));
        // $6$<15-char salt>$<hash>
        let salt = stored.split('$').nth(2).unwrap();
        assert_eq!(salt.len(), 15);
        assert!(salt.bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn authorized_keys_filters_and_dedupes() {
        let mut doc = build_cluster_document();
        let text = "ssh-rsa AAAA key1\n\
                    ssh-ed25519 BBBB nope\n\
                    ssh-rsa AAAA key1\n\
                    not a key\n\
                    ssh-rsa CCCC key2\n";
        set_authorized_keys_of_root(&mut doc, text);
        let keys = authorized_keys_of_root(&doc);
        assert_eq!(keys, vec!["ssh-rsa AAAA key1", "ssh-rsa CCCC key2"]);
        assert_eq!(count_authorized_keys_of_root(&doc), 2);

        // Replacement, not merge.
        set_authorized_keys_of_root(&mut doc, "ssh-rsa DDDD key3");
        assert_eq!(authorized_keys_of_root(&doc), vec!["ssh-rsa DDDD key3"]);
    }

    #[test]
    fn wifi_passphrase_matches_the_published_vector() {
        // IEEE 802.11i test vector.
        let psk = convert_to_wifi_passphrase("password", "IEEE");
        assert_eq!(
            psk,
            "f42c6fc52df0ebef9ebb4b90b38a5f902e83fe1b135a70e23aed762e9710a12e"
        );
        assert_eq!(psk.len(), WPA_PSK_LENGTH);
        assert_eq!(psk, convert_to_wifi_passphrase("password", "IEEE"));
    }

    #[test]
    fn wifi_passphrase_is_identity_on_empty_input() {
        assert_eq!(convert_to_wifi_passphrase("", "ssid"), "");
        assert_eq!(convert_to_wifi_passphrase("secret", ""), "secret");
    }

    #[test]
    fn no_proxy_sanitizer_drops_invalid_tokens() {
        assert_eq!(
            sanitize_no_proxy("10.0.0.0/8, bad_token ,192.168.1.1"),
            "10.0.0.0/8,192.168.1.1"
        );
        assert_eq!(sanitize_no_proxy(""), "");
        assert_eq!(sanitize_no_proxy("10.0.0.0/33"), "");
    }

    #[test]
    fn set_proxy_modes() {
        let mut doc = build_cluster_document();

        let mut settings = ProxySettings {
            mode: ProxyMode::Necessary,
            address: "http://proxy.example.com".to_string(),
            port: "3128".to_string(),
            no_proxy: "10.0.0.0/8".to_string(),
            ..ProxySettings::default()
        };
        set_proxy(&mut doc, &settings).unwrap();
        assert_eq!(
            http_proxy_value(&doc).unwrap(),
            "http://proxy.example.com:3128"
        );
        assert_eq!(no_proxy_value(&doc).unwrap(), "10.0.0.0/8");

        settings.mode = ProxyMode::Auth;
        settings.user = "alice".to_string();
        settings.password = "pw".to_string();
        set_proxy(&mut doc, &settings).unwrap();
        assert_eq!(
            http_proxy_value(&doc).unwrap(),
            "http://alice:pw@proxy.example.com:3128"
        );

        settings.mode = ProxyMode::Unnecessary;
        set_proxy(&mut doc, &settings).unwrap();
        assert_eq!(http_proxy_value(&doc).unwrap(), "");
        assert_eq!(no_proxy_value(&doc).unwrap(), "");
    }

    #[test]
    fn proxy_settings_round_trip_through_the_stored_url() {
        let mut doc = build_cluster_document();
        let settings = ProxySettings {
            mode: ProxyMode::Auth,
            address: "http://proxy.example.com".to_string(),
            port: "8080".to_string(),
            no_proxy: "192.168.1.1".to_string(),
            user: "bob".to_string(),
            password: "s3cret".to_string(),
        };
        set_proxy(&mut doc, &settings).unwrap();
        let recovered = parse_proxy_settings(&doc).unwrap();
        assert_eq!(recovered.mode, ProxyMode::Auth);
        assert_eq!(recovered.address, "http://proxy.example.com");
        assert_eq!(recovered.port, "8080");
        assert_eq!(recovered.user, "bob");
        assert_eq!(recovered.password, "s3cret");
        assert_eq!(recovered.no_proxy, "192.168.1.1");
    }

    #[test]
    fn add_suffix_for_role_is_idempotent() {
        let mut doc = build_cluster_document();
        add_suffix_for_role(&mut doc, Role::Slave, "01", "00");
        add_suffix_for_role(&mut doc, Role::Slave, "01", "00");
        assert_eq!(doc.cluster_meta.role_lists.slave.len(), 1);
        add_suffix_for_role(&mut doc, Role::BranchMaster, "02", "00");
        assert_eq!(
            branch_parent_candidates(&doc),
            vec!["00".to_string(), "02".to_string()]
        );
    }

    #[test]
    fn lookup_of_unknown_id_fails() {
        let doc = build_cluster_document();
        assert!(write_file(&doc, "no_such_file").is_err());
        assert!(has_write_file(&doc, construct::FILE_VPNBRIDGE));
        assert!(!has_write_file(&doc, "no_such_file"));
    }

    #[test]
    fn hostname_commit_and_reset() {
        let mut doc = build_cluster_document();
        set_working_hostname(&mut doc, "demo-master-00");
        assert_eq!(committed_hostname(&doc), "");
        commit_hostname(&mut doc);
        assert_eq!(committed_hostname(&doc), "demo-master-00");
        reset_committed_hostname(&mut doc);
        assert_eq!(committed_hostname(&doc), "");
        assert_eq!(working_hostname(&doc), "demo-master-00");
    }
}
