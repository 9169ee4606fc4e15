use std::collections::HashMap;

use url::Url;

use crate::{ChainId, Network, Result, TokenListError};

/// Immutable table of supported networks, indexed by name and by chain id.
///
/// Built once at start-up and handed to the provider binding, the multicall
/// aggregator and the resolver. Tests construct registries with fake networks.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<Network>,
    by_name: HashMap<String, usize>,
    by_chain_id: HashMap<ChainId, usize>,
}

impl NetworkRegistry {
    pub fn new(networks: Vec<Network>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(networks.len());
        let mut by_chain_id = HashMap::with_capacity(networks.len());

        for (idx, network) in networks.iter().enumerate() {
            if by_name.insert(network.name.clone(), idx).is_some() {
                return Err(TokenListError::DuplicateNetwork(network.name.clone()));
            }
            if by_chain_id.insert(network.chain_id, idx).is_some() {
                return Err(TokenListError::DuplicateNetwork(format!(
                    "chain ID {} ({})",
                    network.chain_id, network.name
                )));
            }
        }

        Ok(Self { networks, by_name, by_chain_id })
    }

    /// The networks the list is published for.
    pub fn builtin() -> Self {
        let networks = vec![
            Network::new("ethereum", 1, "assets", "Ether", "ETH"),
            Network::new("polygon", 137, "assets-polygon", "Polygon Ecosystem Token", "POL"),
            Network::new("arbitrum", 42161, "assets-arbitrum", "Ether", "ETH"),
            Network::new("optimism", 10, "assets-optimism", "Ether", "ETH"),
            Network::new("base", 8453, "assets-base", "Ether", "ETH"),
            Network::new("gnosis", 100, "assets-xdai", "xDAI", "XDAI"),
            Network::new("avalanche", 43114, "assets-avalanche", "Avalanche", "AVAX"),
            Network::new("fantom", 250, "assets-fantom", "Fantom", "FTM"),
            Network::new("celo", 42220, "assets-celo", "Celo", "CELO"),
            Network::new("kava", 2222, "assets-kava", "Kava", "KAVA"),
            Network::new("moonbeam", 1284, "assets-moonbeam", "Glimmer", "GLMR"),
            Network::new("bsc", 56, "assets-bsc", "BNB", "BNB"),
            Network::new("fraxtal", 252, "assets-fraxtal", "Frax Ether", "frxETH"),
            Network::new("mantle", 5000, "assets-mantle", "Mantle", "MNT"),
            Network::new("aurora", 1313161554, "assets-aurora", "Ether", "ETH"),
            Network::new("x-layer", 1261120, "assets-x-layer", "OKB", "OKB")
                .with_rpc_url(Url::parse("https://xlayerrpc.okx.com").expect("static url")),
        ];

        Self::new(networks).expect("builtin networks are unique")
    }

    pub fn lookup(&self, name: &str) -> Result<&Network> {
        self.by_name
            .get(name)
            .map(|idx| &self.networks[*idx])
            .ok_or_else(|| TokenListError::UnknownNetwork { name: name.to_string() })
    }

    pub fn lookup_by_chain_id(&self, chain_id: ChainId) -> Result<&Network> {
        self.by_chain_id
            .get(&chain_id)
            .map(|idx| &self.networks[*idx])
            .ok_or(TokenListError::UnsupportedChainId { chain_id })
    }

    pub fn lookup_by_folder(&self, folder_name: &str) -> Option<&Network> {
        self.networks.iter().find(|network| network.folder_name == folder_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Network> {
        self.networks.iter()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Networks to process, in registry order. A non-empty `include` keeps
    /// only the named networks; otherwise everything not in `ignore` is kept.
    /// `ignore` matches either a network name or an asset folder.
    pub fn select(&self, include: &[String], ignore: &[String]) -> Vec<&Network> {
        self.networks
            .iter()
            .filter(|network| {
                if !include.is_empty() {
                    return include.iter().any(|name| *name == network.name);
                }
                !ignore
                    .iter()
                    .any(|skip| *skip == network.name || *skip == network.folder_name)
            })
            .collect()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
