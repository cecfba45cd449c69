//! The run configuration, resolved once at start up

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::ValueEnum;
use tracing::debug;

use crate::{
    artifacts::read_json_file,
    cli::Cli,
    constants::{
        ARBITRUM_GOERLI_RPC, EVM_ARTIFACTS_DIR, LOCAL_RPC, ZKSYNC_ARTIFACTS_DIR,
        ZKSYNC_TESTNET_RPC,
    },
    errors::ScriptError,
};

/// The networks we know how to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Network {
    /// Local zkSync node
    Local,
    /// zkSync era testnet
    ZksyncTestnet,
    /// Arbitrum Goerli rollup
    ArbitrumGoerli,
}

impl Network {
    /// RPC endpoint used when none is given
    pub fn default_rpc(&self) -> &'static str {
        match self {
            Network::Local => LOCAL_RPC,
            Network::ZksyncTestnet => ZKSYNC_TESTNET_RPC,
            Network::ArbitrumGoerli => ARBITRUM_GOERLI_RPC,
        }
    }

    /// Whether contracts are deployed through the era `ContractDeployer`
    pub fn is_zksync(&self) -> bool {
        match self {
            Network::Local | Network::ZksyncTestnet => true,
            Network::ArbitrumGoerli => false,
        }
    }

    /// Artifacts directory used when none is given, era and EVM builds differ
    pub fn default_artifacts_dir(&self) -> &'static str {
        if self.is_zksync() {
            ZKSYNC_ARTIFACTS_DIR
        } else {
            EVM_ARTIFACTS_DIR
        }
    }

    /// Key of the private key in the secrets file
    pub fn secrets_key(&self) -> &'static str {
        match self {
            Network::Local | Network::ZksyncTestnet => "privateKey",
            Network::ArbitrumGoerli => "privateKeyArbitrumGoerli",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Local => "local",
            Network::ZksyncTestnet => "zksync-testnet",
            Network::ArbitrumGoerli => "arbitrum-goerli",
        };
        f.write_str(name)
    }
}

/// Everything a run needs to know about its environment
#[derive(Clone)]
pub struct DeployConfig {
    /// Target network
    pub network: Network,
    /// RPC endpoint
    pub rpc_url: String,
    /// Hex private key of the deployer
    pub private_key: String,
    /// Artifacts of our own contracts
    pub artifacts_dir: PathBuf,
    /// Artifacts of the SyncSwap contracts
    pub dependency_artifacts_dir: PathBuf,
    /// Addresses of the SyncSwap contracts
    pub dependency_contracts_file: PathBuf,
    /// Where the manifest is written
    pub output_file: PathBuf,
    /// How long to wait for an awaited event
    pub event_timeout: Duration,
}

// Keep the key out of the logs
impl fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployConfig")
            .field("network", &self.network)
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"<redacted>")
            .field("artifacts_dir", &self.artifacts_dir)
            .field("dependency_artifacts_dir", &self.dependency_artifacts_dir)
            .field("dependency_contracts_file", &self.dependency_contracts_file)
            .field("output_file", &self.output_file)
            .field("event_timeout", &self.event_timeout)
            .finish()
    }
}

impl DeployConfig {
    /// Resolve the configuration from the parsed command line
    pub fn from_cli(cli: &Cli) -> Result<Self, ScriptError> {
        let private_key =
            resolve_private_key(cli.priv_key.as_deref(), &cli.secrets_file, cli.network)?;
        let rpc_url = cli
            .rpc_url
            .clone()
            .unwrap_or_else(|| cli.network.default_rpc().to_string());

        let config = DeployConfig {
            network: cli.network,
            rpc_url,
            private_key,
            artifacts_dir: cli
                .artifacts_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(cli.network.default_artifacts_dir())),
            dependency_artifacts_dir: cli.dependency_artifacts_dir.clone(),
            dependency_contracts_file: cli.dependency_contracts.clone(),
            output_file: cli.output.clone(),
            event_timeout: Duration::from_secs(cli.event_timeout_secs),
        };
        debug!("Resolved config: {:?}", config);

        Ok(config)
    }
}

/// Pick the private key given explicitly, or the one of the secrets file
fn resolve_private_key(
    explicit: Option<&str>,
    secrets_file: &Path,
    network: Network,
) -> Result<String, ScriptError> {
    if let Some(key) = explicit.filter(|key| !key.trim().is_empty()) {
        return Ok(key.trim().to_string());
    }

    let missing = || {
        ScriptError::Config(format!(
            "no private key, set ZKS_PRIVATE_KEY or add `{}` to {}",
            network.secrets_key(),
            secrets_file.display()
        ))
    };

    if !secrets_file.is_file() {
        return Err(missing());
    }
    let secrets = read_json_file(secrets_file)?;
    secrets[network.secrets_key()]
        .as_str()
        .filter(|key| !key.trim().is_empty())
        .map(|key| key.trim().to_string())
        .ok_or_else(missing)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn explicit_key_wins() {
        let key = resolve_private_key(Some("0xabc"), Path::new("/nope"), Network::Local).unwrap();
        assert_eq!(key, "0xabc");
    }

    #[test]
    fn reads_the_network_key_from_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = dir.path().join("secrets.json");
        fs::write(
            &secrets,
            r#"{ "privateKey": "0x01", "privateKeyArbitrumGoerli": "0x02" }"#,
        )
        .unwrap();

        assert_eq!(
            resolve_private_key(None, &secrets, Network::Local).unwrap(),
            "0x01"
        );
        assert_eq!(
            resolve_private_key(None, &secrets, Network::ArbitrumGoerli).unwrap(),
            "0x02"
        );
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = dir.path().join("secrets.json");
        fs::write(&secrets, r#"{ "privateKey": "" }"#).unwrap();

        let err = resolve_private_key(Some("  "), &secrets, Network::ZksyncTestnet).unwrap_err();
        assert!(matches!(err, ScriptError::Config(msg) if msg.contains("privateKey")));

        let err = resolve_private_key(None, &dir.path().join("nope.json"), Network::Local)
            .unwrap_err();
        assert!(matches!(err, ScriptError::Config(_)));
    }

    #[test]
    fn only_arbitrum_uses_evm_artifacts() {
        assert!(Network::Local.is_zksync());
        assert!(Network::ZksyncTestnet.is_zksync());
        assert!(!Network::ArbitrumGoerli.is_zksync());

        assert_eq!(Network::Local.default_artifacts_dir(), "artifacts-zk");
        assert_eq!(Network::ZksyncTestnet.default_artifacts_dir(), "artifacts-zk");
        assert_eq!(Network::ArbitrumGoerli.default_artifacts_dir(), "artifacts");
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = DeployConfig {
            network: Network::Local,
            rpc_url: LOCAL_RPC.to_string(),
            private_key: "0xdeadbeef".to_string(),
            artifacts_dir: PathBuf::from("a"),
            dependency_artifacts_dir: PathBuf::from("b"),
            dependency_contracts_file: PathBuf::from("c.json"),
            output_file: PathBuf::from("d.json"),
            event_timeout: Duration::from_secs(60),
        };
        assert!(!format!("{config:?}").contains("deadbeef"));
    }
}
