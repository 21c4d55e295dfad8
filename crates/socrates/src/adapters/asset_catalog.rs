//! JSON-file-backed adapter for the [`AssetCatalog`] port (`AssetCatalog` in
//! the Python original's `asset_catalog.py`).

use std::fs;
use std::net::IpAddr;
use std::path::Path;

use domain::{AssetCatalog, AssetProfile};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AssetEntry {
    ip: Option<String>,
    cidr: Option<String>,
    #[serde(default)]
    criticality: Option<f64>,
    #[serde(default)]
    exposure: Option<f64>,
    #[serde(default)]
    sensitive: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AssetFile {
    Wrapped { assets: Vec<AssetEntry> },
    Bare(Vec<AssetEntry>),
}

/// Asset metadata loaded once from a JSON file (`{"assets": [...]}` or a
/// bare array), matched by exact IP and then by CIDR membership.
#[derive(Debug, Default)]
pub struct JsonAssetCatalog {
    entries: Vec<AssetEntry>,
}

impl JsonAssetCatalog {
    /// Load the catalog from `path`. A missing file yields an empty catalog
    /// (every IP resolves to the private/public default), matching the
    /// Python original's `from_json_file`.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when `path` exists but does not parse.
    pub fn load(path: &Path) -> Result<Self, serde_json::Error> {
        let Ok(text) = fs::read_to_string(path) else {
            return Ok(Self::default());
        };
        let parsed: AssetFile = serde_json::from_str(&text)?;
        let entries = match parsed {
            AssetFile::Wrapped { assets } => assets,
            AssetFile::Bare(assets) => assets,
        };
        Ok(Self { entries })
    }

    fn default_profile(ip: IpAddr) -> AssetProfile {
        if is_private_or_local(ip) {
            AssetProfile { criticality: 0.45, exposure: 0.2, sensitive: false }
        } else {
            AssetProfile { criticality: 0.5, exposure: 0.7, sensitive: false }
        }
    }
}

impl AssetCatalog for JsonAssetCatalog {
    fn resolve(&self, ip_text: &str) -> AssetProfile {
        let Ok(ip) = ip_text.parse::<IpAddr>() else {
            return AssetProfile { criticality: 0.4, exposure: 0.3, sensitive: false };
        };

        let direct = self.entries.iter().find(|e| e.ip.as_deref() == Some(ip_text));
        let cidr_match = direct.is_none().then(|| self.entries.iter().find(|e| matches_cidr(e, ip))).flatten();

        match direct.or(cidr_match) {
            Some(entry) => AssetProfile {
                criticality: entry.criticality.unwrap_or(0.4).clamp(0.0, 1.0),
                exposure: entry.exposure.unwrap_or(0.3).clamp(0.0, 1.0),
                sensitive: entry.sensitive,
            },
            None => Self::default_profile(ip),
        }
    }
}

fn matches_cidr(entry: &AssetEntry, ip: IpAddr) -> bool {
    let Some(cidr) = entry.cidr.as_deref() else { return false };
    let Some((network, prefix)) = cidr.split_once('/') else { return false };
    let Ok(network_ip) = network.parse::<IpAddr>() else { return false };
    let Ok(prefix_len) = prefix.parse::<u32>() else { return false };
    match (network_ip, ip) {
        (IpAddr::V4(net), IpAddr::V4(addr)) => same_prefix(u32::from(net), u32::from(addr), prefix_len),
        (IpAddr::V6(net), IpAddr::V6(addr)) => same_prefix_128(u128::from(net), u128::from(addr), prefix_len),
        _ => false,
    }
}

fn same_prefix(a: u32, b: u32, prefix_len: u32) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let mask = u32::MAX.checked_shl(32 - prefix_len).unwrap_or(0);
    (a & mask) == (b & mask)
}

fn same_prefix_128(a: u128, b: u128, prefix_len: u32) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let mask = u128::MAX.checked_shl(128 - prefix_len).unwrap_or(0);
    (a & mask) == (b & mask)
}

fn is_private_or_local(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unicast_link_local(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_ip_gets_the_plain_default_profile() {
        let catalog = JsonAssetCatalog::default();
        let profile = catalog.resolve("not-an-ip");
        assert_eq!(profile, AssetProfile { criticality: 0.4, exposure: 0.3, sensitive: false });
    }

    #[test]
    fn private_ip_with_no_entry_gets_the_private_default() {
        let catalog = JsonAssetCatalog::default();
        let profile = catalog.resolve("10.0.0.5");
        assert_eq!(profile, AssetProfile { criticality: 0.45, exposure: 0.2, sensitive: false });
    }

    #[test]
    fn public_ip_with_no_entry_gets_the_public_default() {
        let catalog = JsonAssetCatalog::default();
        let profile = catalog.resolve("8.8.8.8");
        assert_eq!(profile, AssetProfile { criticality: 0.5, exposure: 0.7, sensitive: false });
    }

    #[test]
    fn cidr_entry_matches_addresses_within_the_network() {
        let catalog = JsonAssetCatalog {
            entries: vec![AssetEntry {
                ip: None,
                cidr: Some("10.0.0.0/24".to_owned()),
                criticality: Some(0.95),
                exposure: Some(0.1),
                sensitive: true,
            }],
        };
        let profile = catalog.resolve("10.0.0.42");
        assert_eq!(profile, AssetProfile { criticality: 0.95, exposure: 0.1, sensitive: true });

        let outside = catalog.resolve("10.0.1.42");
        assert_eq!(outside, AssetProfile { criticality: 0.45, exposure: 0.2, sensitive: false });
    }

    #[test]
    fn direct_ip_match_wins_over_cidr_match() {
        let catalog = JsonAssetCatalog {
            entries: vec![
                AssetEntry { ip: None, cidr: Some("10.0.0.0/8".to_owned()), criticality: Some(0.9), exposure: Some(0.9), sensitive: true },
                AssetEntry { ip: Some("10.0.0.5".to_owned()), cidr: None, criticality: Some(0.1), exposure: Some(0.1), sensitive: false },
            ],
        };
        let profile = catalog.resolve("10.0.0.5");
        assert_eq!(profile, AssetProfile { criticality: 0.1, exposure: 0.1, sensitive: false });
    }
}
