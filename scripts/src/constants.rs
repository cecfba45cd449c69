//! Constants used in the deploy scripts

/// Default RPC endpoint of the local zkSync node
pub const LOCAL_RPC: &str = "http://localhost:3050";

/// Default RPC endpoint of the zkSync testnet
pub const ZKSYNC_TESTNET_RPC: &str = "https://testnet.era.zksync.dev";

/// Default RPC endpoint of the Arbitrum Goerli rollup
pub const ARBITRUM_GOERLI_RPC: &str = "https://goerli-rollup.arbitrum.io/rpc";

/// Environment variable holding the deployer private key
pub const PRIVATE_KEY_ENV: &str = "ZKS_PRIVATE_KEY";

/// Default path of the untracked secrets file
pub const DEFAULT_SECRETS_FILE: &str = "secrets.json";

/// Directory holding the era compiled artifacts of our own contracts
pub const ZKSYNC_ARTIFACTS_DIR: &str = "artifacts-zk";

/// Directory holding the EVM compiled artifacts of our own contracts
pub const EVM_ARTIFACTS_DIR: &str = "artifacts";

/// Directory holding the compiled artifacts of the SyncSwap contracts
pub const DEFAULT_DEPENDENCY_ARTIFACTS_DIR: &str = "syncswap-contracts/artifacts-zk";

/// Address file written by the SyncSwap deployment run
pub const DEFAULT_DEPENDENCY_CONTRACTS_FILE: &str = "local-dependency-contracts.json";

/// Manifest consumed by the front-end and the tests
pub const DEFAULT_OUTPUT_FILE: &str = "local-contracts.json";

/// Seconds to wait for the `PoolCreated` event
pub const DEFAULT_EVENT_TIMEOUT_SECS: u64 = 60;

/// Indentation of the written manifest
pub const OUTPUT_INDENT: u16 = 4;

/// Amount of tokens preminted to the deployer, in whole tokens
pub const HANDS_TOKEN_PREMINT: &str = "1000000";

/// Hard cap of the token supply, in whole tokens
pub const HANDS_TOKEN_SUPPLY_CAP: &str = "1000000";

/// Logical name of the token contract in the manifest
pub const TOKEN_CONTRACT_NAME: &str = "HandsToken";

/// Logical name of the liquidity pool in the manifest
pub const POOL_CONTRACT_NAME: &str = "HandsPool";

/// Dependency artifacts, as (logical name, path relative to the dependency artifacts dir)
pub const DEPENDENCY_ARTIFACTS: [(&str, &str); 11] = [
    ("wETH", "contracts/WETH.sol/WETH.json"),
    ("vault", "contracts/vault/SyncSwapVault.sol/SyncSwapVault.json"),
    (
        "master",
        "contracts/master/SyncSwapPoolMaster.sol/SyncSwapPoolMaster.json",
    ),
    (
        "classicFactory",
        "contracts/pool/classic/SyncSwapClassicPoolFactory.sol/SyncSwapClassicPoolFactory.json",
    ),
    (
        "stableFactory",
        "contracts/pool/stable/SyncSwapStablePoolFactory.sol/SyncSwapStablePoolFactory.json",
    ),
    ("router", "contracts/SyncSwapRouter.sol/SyncSwapRouter.json"),
    (
        "feeManager",
        "contracts/master/SyncSwapFeeManager.sol/SyncSwapFeeManager.json",
    ),
    (
        "feeRecipient",
        "contracts/master/SyncSwapFeeRecipient.sol/SyncSwapFeeRecipient.json",
    ),
    (
        "feeRegistry",
        "contracts/master/FeeRegistry.sol/FeeRegistry.json",
    ),
    (
        "forwardRegistry",
        "contracts/master/ForwarderRegistry.sol/ForwarderRegistry.json",
    ),
    (
        "classicPool",
        "contracts/pool/classic/SyncSwapClassicPool.sol/SyncSwapClassicPool.json",
    ),
];
