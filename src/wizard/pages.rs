//! Page identifiers and flow metadata for the user-data wizard.

use crate::userdata::Role;

/// Unique identifier for each wizard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageId {
    ClusterWelcome,
    ClusterNew,
    ClusterPreviously,
    TypeHw,
    TypeRole,
    ClusterSuffix,
    ClusterHostname,
    ClusterApply,
    UserdataUserinfo,
    UserdataEnvinfo,
    NetworkConnection,
    NetworkProxy,
    WifiBackend,
    WifiApBg,
    WifiApAn,
    VpnBridge,
    JoinKubernetes,
    AllFinish,
}

impl PageId {
    pub fn short_name(&self) -> &'static str {
        match self {
            PageId::ClusterWelcome => "Welcome",
            PageId::ClusterNew => "New Cluster",
            PageId::ClusterPreviously => "Previous Cluster",
            PageId::TypeHw => "Hardware",
            PageId::TypeRole => "Role",
            PageId::ClusterSuffix => "Suffix",
            PageId::ClusterHostname => "Hostname",
            PageId::ClusterApply => "Apply",
            PageId::UserdataUserinfo => "User Info",
            PageId::UserdataEnvinfo => "Env Info",
            PageId::NetworkConnection => "Connection",
            PageId::NetworkProxy => "Proxy",
            PageId::WifiBackend => "Wi-Fi Backend",
            PageId::WifiApBg => "Wi-Fi AP 2.4GHz",
            PageId::WifiApAn => "Wi-Fi AP 5GHz",
            PageId::VpnBridge => "VPN Bridge",
            PageId::JoinKubernetes => "Kubernetes Join",
            PageId::AllFinish => "Finish",
        }
    }
}

/// Hardware topology chosen on the hardware page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hardware {
    ApOnly,
    SimpleMesh,
    FullMesh,
}

impl Hardware {
    /// Simple topologies run a single AP radio and no 5 GHz AP.
    pub fn is_simple(&self) -> bool {
        !matches!(self, Hardware::FullMesh)
    }
}

/// Which roles the chosen hardware can host.
pub fn role_selectable(role: Role, hardware: Hardware) -> bool {
    match role {
        Role::LeaderMaster | Role::Other => true,
        Role::BranchMaster => hardware.is_simple(),
        Role::Slave => hardware != Hardware::ApOnly,
        Role::VpnBridge => hardware == Hardware::FullMesh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_gating_by_hardware() {
        assert!(role_selectable(Role::LeaderMaster, Hardware::ApOnly));
        assert!(role_selectable(Role::Other, Hardware::FullMesh));
        assert!(role_selectable(Role::BranchMaster, Hardware::SimpleMesh));
        assert!(!role_selectable(Role::BranchMaster, Hardware::FullMesh));
        assert!(!role_selectable(Role::Slave, Hardware::ApOnly));
        assert!(role_selectable(Role::Slave, Hardware::SimpleMesh));
        assert!(role_selectable(Role::VpnBridge, Hardware::FullMesh));
        assert!(!role_selectable(Role::VpnBridge, Hardware::ApOnly));
    }
}
