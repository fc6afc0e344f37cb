//! Mint configuration - passed from the embedding page/app

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::core::Address;

pub const DEFAULT_EXPLORER_URL: &str = "https://etherscan.io";
pub const DEFAULT_MARKETPLACE_URL: &str = "https://opensea.io";
/// Ganache's network id.
pub const LOCAL_NETWORK_ID: u64 = 5777;
/// 0.1 ETH.
pub const DEFAULT_MINT_PRICE_WEI: u128 = 100_000_000_000_000_000;

/// Outbound link bases for one network.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkLinks {
    #[serde(rename = "explorerURL")]
    pub explorer_url: String,
    #[serde(rename = "openseaURL")]
    pub marketplace_url: String,
}

impl Default for NetworkLinks {
    fn default() -> Self {
        Self { explorer_url: DEFAULT_EXPLORER_URL.into(), marketplace_url: DEFAULT_MARKETPLACE_URL.into() }
    }
}

impl NetworkLinks {
    pub fn account_url(&self, account: &Address) -> String {
        format!("{}/address/{}", self.explorer_url, account)
    }

    pub fn asset_url(&self, contract: &Address, token_id: u64) -> String {
        format!("{}/assets/{}/{}", self.marketplace_url, contract, token_id)
    }
}

/// Static network id → link registry (`config.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkRegistry {
    networks: HashMap<u64, NetworkLinks>,
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(rename = "NETWORKS", default)]
    networks: HashMap<String, NetworkLinks>,
}

impl NetworkRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn with_network(mut self, id: u64, links: NetworkLinks) -> Self {
        self.networks.insert(id, links);
        self
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let file: RegistryFile = serde_json::from_str(raw).context("network registry json")?;
        let mut networks = HashMap::with_capacity(file.networks.len());
        for (id, links) in file.networks {
            let id: u64 = id.parse().with_context(|| format!("network id '{}'", id))?;
            networks.insert(id, links);
        }
        Ok(Self { networks })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn get(&self, network_id: u64) -> Option<&NetworkLinks> { self.networks.get(&network_id) }

    /// Links for `network_id`. The local-development network keeps `defaults`;
    /// every other id uses its registry entry, or `defaults` if it has none.
    pub fn links_for(&self, network_id: u64, local_id: u64, defaults: &NetworkLinks) -> NetworkLinks {
        if network_id == local_id {
            return defaults.clone();
        }
        match self.networks.get(&network_id) {
            Some(links) => links.clone(),
            None => {
                tracing::warn!(network_id, "no registry entry for network, using default links");
                defaults.clone()
            }
        }
    }
}

/// Network id → deployed contract address (build artifact `networks` map).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deployments {
    addresses: HashMap<u64, Address>,
}

#[derive(Deserialize)]
struct ArtifactFile {
    #[serde(default)]
    networks: HashMap<String, ArtifactNetwork>,
}

#[derive(Deserialize)]
struct ArtifactNetwork {
    address: Address,
}

impl Deployments {
    pub fn new() -> Self { Self::default() }

    pub fn with_deployment(mut self, network_id: u64, address: Address) -> Self {
        self.addresses.insert(network_id, address);
        self
    }

    pub fn from_artifact_json(raw: &str) -> anyhow::Result<Self> {
        let file: ArtifactFile = serde_json::from_str(raw).context("contract artifact json")?;
        let mut addresses = HashMap::with_capacity(file.networks.len());
        for (id, net) in file.networks {
            let id: u64 = id.parse().with_context(|| format!("network id '{}'", id))?;
            addresses.insert(id, net.address);
        }
        Ok(Self { addresses })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        Self::from_artifact_json(&raw)
    }

    pub fn address_on(&self, network_id: u64) -> Option<&Address> { self.addresses.get(&network_id) }
}

/// Mint configuration. Higher layers construct this.
#[derive(Debug, Clone)]
pub struct MintConfig {
    pub app: String,
    pub mint_quantity: u32,
    pub mint_price_wei: u128,
    pub local_network_id: u64,
    pub default_links: NetworkLinks,
    pub networks: NetworkRegistry,
    pub deployments: Deployments,
    pub cycle_period_ms: u64,
    pub cycle_min: u32,
    pub cycle_max: u32,
    pub cycle_initial: u32,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            app: "smart-shades".into(),
            mint_quantity: 1,
            mint_price_wei: DEFAULT_MINT_PRICE_WEI,
            local_network_id: LOCAL_NETWORK_ID,
            default_links: NetworkLinks::default(),
            networks: NetworkRegistry::default(),
            deployments: Deployments::default(),
            cycle_period_ms: 3000,
            cycle_min: 1,
            cycle_max: 1000,
            cycle_initial: 7,
        }
    }
}

impl MintConfig {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into(), ..Default::default() }
    }
    pub fn with_mint_price_wei(mut self, wei: u128) -> Self { self.mint_price_wei = wei; self }
    pub fn with_mint_quantity(mut self, quantity: u32) -> Self { self.mint_quantity = quantity; self }
    pub fn with_local_network_id(mut self, id: u64) -> Self { self.local_network_id = id; self }
    pub fn with_networks(mut self, networks: NetworkRegistry) -> Self { self.networks = networks; self }
    pub fn with_deployments(mut self, deployments: Deployments) -> Self { self.deployments = deployments; self }
    pub fn with_cycle_period_ms(mut self, ms: u64) -> Self { self.cycle_period_ms = ms; self }

    /// Defaults overridden by `SHADES_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(app) = env_string("SHADES_APP") {
            config.app = app;
        }
        if let Some(raw) = env_string("SHADES_MINT_PRICE_WEI") {
            config.mint_price_wei = raw.parse().with_context(|| format!("SHADES_MINT_PRICE_WEI '{}'", raw))?;
        }
        if let Some(raw) = env_string("SHADES_MINT_QUANTITY") {
            config.mint_quantity = raw.parse().with_context(|| format!("SHADES_MINT_QUANTITY '{}'", raw))?;
        }
        if let Some(raw) = env_string("SHADES_LOCAL_NETWORK_ID") {
            config.local_network_id = raw.parse().with_context(|| format!("SHADES_LOCAL_NETWORK_ID '{}'", raw))?;
        }
        if let Some(raw) = env_string("SHADES_CYCLE_MS") {
            config.cycle_period_ms = raw.parse().with_context(|| format!("SHADES_CYCLE_MS '{}'", raw))?;
        }
        if let Some(path) = env_string("SHADES_NETWORKS_FILE") {
            config.networks = NetworkRegistry::load(Path::new(&path))?;
        }
        if let Some(path) = env_string("SHADES_ARTIFACT_FILE") {
            config.deployments = Deployments::load(Path::new(&path))?;
        }
        Ok(config)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_JSON: &str = r#"{
        "NETWORKS": {
            "1": { "explorerURL": "https://etherscan.io", "openseaURL": "https://opensea.io" },
            "4": { "explorerURL": "https://rinkeby.etherscan.io", "openseaURL": "https://testnets.opensea.io" }
        }
    }"#;

    #[test]
    fn registry_parses_site_config() {
        let reg = NetworkRegistry::from_json(CONFIG_JSON).unwrap();
        assert_eq!(reg.get(4).unwrap().explorer_url, "https://rinkeby.etherscan.io");
        assert!(reg.get(5777).is_none());
    }

    #[test]
    fn registry_rejects_non_numeric_ids() {
        let raw = r#"{"NETWORKS": {"main": {"explorerURL": "a", "openseaURL": "b"}}}"#;
        assert!(NetworkRegistry::from_json(raw).is_err());
    }

    #[test]
    fn links_for_local_keeps_defaults() {
        let reg = NetworkRegistry::from_json(CONFIG_JSON).unwrap();
        let defaults = NetworkLinks::default();
        assert_eq!(reg.links_for(LOCAL_NETWORK_ID, LOCAL_NETWORK_ID, &defaults), defaults);
        assert_eq!(reg.links_for(4, LOCAL_NETWORK_ID, &defaults).marketplace_url, "https://testnets.opensea.io");
        assert_eq!(reg.links_for(99, LOCAL_NETWORK_ID, &defaults), defaults);
    }

    #[test]
    fn artifact_networks_map_to_addresses() {
        let raw = r#"{"contractName": "SmartShades", "networks": {
            "5777": {"address": "0x5FbDB2315678afecb367f032d93F642f64180aa3", "transactionHash": "0x00"}
        }}"#;
        let d = Deployments::from_artifact_json(raw).unwrap();
        assert_eq!(d.address_on(5777).unwrap().as_str(), "0x5fbdb2315678afecb367f032d93f642f64180aa3");
        assert!(d.address_on(1).is_none());
    }

    #[test]
    fn link_formats() {
        let links = NetworkLinks::default();
        let account = Address::parse("0x90f79bf6eb2c4f870365e785982e1f101e93b906").unwrap();
        assert_eq!(links.account_url(&account), "https://etherscan.io/address/0x90f79bf6eb2c4f870365e785982e1f101e93b906");
        assert_eq!(links.asset_url(&account, 3), "https://opensea.io/assets/0x90f79bf6eb2c4f870365e785982e1f101e93b906/3");
    }

    #[test]
    fn builder_defaults() {
        let c = MintConfig::new("test").with_mint_price_wei(0).with_cycle_period_ms(10);
        assert_eq!(c.app, "test");
        assert_eq!(c.mint_quantity, 1);
        assert_eq!(c.mint_price_wei, 0);
        assert_eq!(c.cycle_period_ms, 10);
        assert_eq!(c.local_network_id, 5777);
    }
}
