//! Shared helpers of the integration tests: an in-memory chain & artifact fixtures

#![allow(dead_code)]

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    task::{Context, Poll},
    time::Duration,
};

use alloy::{
    primitives::{address, Address, Bytes, Log, B256, U256},
    rpc::types::Filter,
    sol_types::SolEvent,
};
use futures::{
    channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender},
    Stream, StreamExt,
};
use hands_scripts::{
    config::{DeployConfig, Network},
    constants::DEPENDENCY_ARTIFACTS,
    dependencies::DependencyManifest,
    errors::ScriptError,
    tx::{
        abi::IPoolFactory::PoolCreated,
        chain::{ChainClient, Confirmation, TxPayload},
    },
};
use json::{array, object, JsonValue};

pub const DEPLOYER: Address = address!("0x00000000000000000000000000000000000000d0");
pub const ROUTER: Address = address!("0x000000000000000000000000000000000000bbbb");
pub const FACTORY: Address = address!("0x000000000000000000000000000000000000cccc");
pub const WETH: Address = address!("0x000000000000000000000000000000000000aaaa");
pub const POOL: Address = address!("0x000000000000000000000000000000000000f001");

/// Creation code given to every test contract
pub const BYTECODE: &str = "0x6080604052";

/// Mutable part of [`MockChain`]
#[derive(Default)]
struct MockChainInner {
    /// Every payload sent, in order
    sent: Vec<TxPayload>,
    /// Number of contract creations so far
    deployments: usize,
    /// Index of the creation that reverts
    failing_deployment: Option<usize>,
    /// Whether fee estimates fail
    failing_fees: bool,
    /// Read-only call outputs, by target & selector
    call_results: HashMap<(Address, [u8; 4]), Bytes>,
    /// Logs put in the receipt of transactions sent to an address
    receipt_logs: HashMap<Address, Vec<Log>>,
    /// Logs pushed to the subscribers once a transaction to an address is mined
    emitted_logs: HashMap<Address, Vec<Log>>,
    /// Open subscriptions
    subscribers: Vec<UnboundedSender<Log>>,
    /// Native balances
    balances: HashMap<Address, U256>,
}

/// An in-memory [`ChainClient`], every transaction is mined on submission
pub struct MockChain {
    /// Signer address
    sender: Address,
    /// Chain state
    inner: Mutex<MockChainInner>,
    /// Number of subscriptions not dropped yet
    live_subscriptions: Arc<AtomicUsize>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        MockChain {
            sender: DEPLOYER,
            inner: Mutex::new(MockChainInner::default()),
            live_subscriptions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Address given to the `index`-th contract creation
    pub fn deployed_address(index: usize) -> Address {
        Address::with_last_byte(0x10 + index as u8)
    }

    /// Revert the `index`-th contract creation
    pub fn with_failing_deployment(self, index: usize) -> Self {
        self.inner.lock().unwrap().failing_deployment = Some(index);
        self
    }

    /// Fail every fee estimate
    pub fn with_failing_fees(self) -> Self {
        self.inner.lock().unwrap().failing_fees = true;
        self
    }

    /// Answer calls of `selector` on `to` with `output`
    pub fn with_call_result(self, to: Address, selector: [u8; 4], output: Vec<u8>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .call_results
            .insert((to, selector), output.into());
        self
    }

    /// Put `log` in the receipt of the transactions sent to `to`
    pub fn with_receipt_log(self, to: Address, log: Log) -> Self {
        self.inner
            .lock()
            .unwrap()
            .receipt_logs
            .entry(to)
            .or_default()
            .push(log);
        self
    }

    /// Push `log` to the subscribers once a transaction sent to `to` is mined
    pub fn with_emitted_log(self, to: Address, log: Log) -> Self {
        self.inner
            .lock()
            .unwrap()
            .emitted_logs
            .entry(to)
            .or_default()
            .push(log);
        self
    }

    pub fn sent(&self) -> Vec<TxPayload> {
        self.inner.lock().unwrap().sent.clone()
    }

    /// Creation payloads, in order
    pub fn deployments(&self) -> Vec<TxPayload> {
        self.sent().into_iter().filter(|tx| tx.to.is_none()).collect()
    }

    /// Call payloads sent to `to`
    pub fn calls_to(&self, to: Address) -> Vec<TxPayload> {
        self.sent()
            .into_iter()
            .filter(|tx| tx.to == Some(to))
            .collect()
    }

    pub fn live_subscriptions(&self) -> usize {
        self.live_subscriptions.load(Ordering::SeqCst)
    }

    /// Subscribers still able to receive logs
    pub fn open_subscribers(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .subscribers
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }
}

impl ChainClient for MockChain {
    type LogStream = MockLogStream;

    fn sender(&self) -> Address {
        self.sender
    }

    async fn estimate_fee(&self, _payload: &TxPayload) -> Result<U256, ScriptError> {
        if self.inner.lock().unwrap().failing_fees {
            return Err(ScriptError::FeeEstimation("gas price unavailable".to_string()));
        }
        Ok(U256::from(21_000u64) * U256::from(1_000_000_000u64))
    }

    async fn send_and_confirm(
        &self,
        payload: TxPayload,
        _what: &str,
    ) -> Result<Confirmation, ScriptError> {
        let mut inner = self.inner.lock().unwrap();
        inner.sent.push(payload.clone());
        let nonce = inner.sent.len();
        let tx_hash = B256::with_last_byte(nonce as u8);

        let confirmation = match payload.to {
            None => {
                let index = inner.deployments;
                inner.deployments += 1;
                let success = inner.failing_deployment != Some(index);
                Confirmation {
                    tx_hash,
                    block_number: Some(nonce as u64),
                    success,
                    contract_address: success.then(|| Self::deployed_address(index)),
                    logs: Vec::new(),
                }
            }
            Some(to) => {
                *inner.balances.entry(to).or_default() += payload.value;

                for log in inner.emitted_logs.get(&to).cloned().unwrap_or_default() {
                    for subscriber in &inner.subscribers {
                        let _ = subscriber.unbounded_send(log.clone());
                    }
                }

                Confirmation {
                    tx_hash,
                    block_number: Some(nonce as u64),
                    success: true,
                    contract_address: None,
                    logs: inner.receipt_logs.get(&to).cloned().unwrap_or_default(),
                }
            }
        };

        Ok(confirmation)
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ScriptError> {
        let selector: [u8; 4] = input[..4].try_into().unwrap();
        self.inner
            .lock()
            .unwrap()
            .call_results
            .get(&(to, selector))
            .cloned()
            .ok_or_else(|| ScriptError::ContractInteraction(format!("call to {to} reverted")))
    }

    async fn balance(&self, owner: Address) -> Result<U256, ScriptError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .balances
            .get(&owner)
            .copied()
            .unwrap_or_default())
    }

    async fn subscribe_logs(&self, _filter: &Filter) -> Result<Self::LogStream, ScriptError> {
        let (tx, rx) = unbounded();
        self.inner.lock().unwrap().subscribers.push(tx);
        self.live_subscriptions.fetch_add(1, Ordering::SeqCst);

        Ok(MockLogStream {
            logs: rx,
            live: self.live_subscriptions.clone(),
        })
    }
}

/// Subscription handed out by [`MockChain`], counted until dropped
pub struct MockLogStream {
    /// Receiving end of the subscription
    logs: UnboundedReceiver<Log>,
    /// Counter of live subscriptions
    live: Arc<AtomicUsize>,
}

impl Stream for MockLogStream {
    type Item = Log;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Log>> {
        self.logs.poll_next_unpin(cx)
    }
}

impl Drop for MockLogStream {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A `PoolCreated` log emitted by `factory`
pub fn pool_created_log(factory: Address, token0: Address, token1: Address, pool: Address) -> Log {
    Log {
        address: factory,
        data: PoolCreated {
            token0,
            token1,
            pool,
        }
        .encode_log_data(),
    }
}

/// Dependencies with the router, the classic factory and wETH
pub fn dependency_manifest() -> DependencyManifest {
    let mut dependencies = DependencyManifest::default();
    dependencies.addresses.insert("router".into(), ROUTER);
    dependencies.addresses.insert("classicFactory".into(), FACTORY);
    dependencies.addresses.insert("wETH".into(), WETH);
    dependencies
        .abis
        .insert("classicPool".into(), array![function_abi("getReserves", &[], "view")]);
    dependencies
}

/// A run configuration rooted at `dir`
pub fn test_config(dir: &Path) -> DeployConfig {
    DeployConfig {
        network: Network::Local,
        rpc_url: "http://localhost:3050".to_string(),
        private_key: "0x7726827caac94a7f9e1b160f7ea819f172f7b6f9d2a97f992c38edeab82d4110"
            .to_string(),
        artifacts_dir: dir.join("artifacts-zk"),
        dependency_artifacts_dir: dir.join("syncswap-contracts/artifacts-zk"),
        dependency_contracts_file: dir.join("local-dependency-contracts.json"),
        output_file: dir.join("local-contracts.json"),
        event_timeout: Duration::from_millis(200),
    }
}

/// ABI entry of a function taking `inputs` as `(name, type)` pairs
pub fn function_abi(name: &str, inputs: &[(&str, &str)], mutability: &str) -> JsonValue {
    object! {
        "type": "function",
        "name": name,
        "inputs": params(inputs),
        "outputs": array![],
        "stateMutability": mutability,
    }
}

/// ABI entry of a constructor taking `inputs` as `(name, type)` pairs
pub fn constructor_abi(inputs: &[(&str, &str)]) -> JsonValue {
    object! {
        "type": "constructor",
        "inputs": params(inputs),
        "stateMutability": "nonpayable",
    }
}

/// `owner() returns (address)`
pub fn owner_abi() -> JsonValue {
    object! {
        "type": "function",
        "name": "owner",
        "inputs": array![],
        "outputs": array![object! { "name": "", "type": "address", "internalType": "address" }],
        "stateMutability": "view",
    }
}

/// Param list of an ABI entry
fn params(inputs: &[(&str, &str)]) -> JsonValue {
    let mut params = JsonValue::new_array();
    for (name, kind) in inputs {
        params
            .push(object! { "name": *name, "type": *kind, "internalType": *kind })
            .unwrap();
    }
    params
}

/// Write a hardhat artifact of `name` under `artifacts_dir`
pub fn write_artifact(artifacts_dir: &Path, name: &str, abi: JsonValue) -> PathBuf {
    let dir = artifacts_dir.join(format!("contracts/{name}.sol"));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{name}.json"));
    let artifact = object! {
        "contractName": name,
        "abi": abi,
        "bytecode": BYTECODE,
    };
    fs::write(&path, json::stringify_pretty(artifact, 2)).unwrap();
    path
}

/// Write the artifacts of every contract of the built-in plans
pub fn write_hands_artifacts(artifacts_dir: &Path) {
    let set_bank = function_abi("setBankContract", &[("_bank", "address")], "nonpayable");

    write_artifact(
        artifacts_dir,
        "HandsToken",
        array![constructor_abi(&[
            ("_owner", "address"),
            ("_premint", "uint256"),
            ("_cap", "uint256"),
        ])],
    );
    write_artifact(
        artifacts_dir,
        "Affiliate",
        array![owner_abi(), set_bank.clone()],
    );
    write_artifact(
        artifacts_dir,
        "Staking",
        array![
            constructor_abi(&[("_token", "address")]),
            owner_abi(),
            set_bank
        ],
    );
    write_artifact(
        artifacts_dir,
        "Bank",
        array![constructor_abi(&[
            ("_affiliate", "address"),
            ("_staking", "address"),
        ])],
    );
    write_artifact(
        artifacts_dir,
        "Hands",
        array![constructor_abi(&[("_bank", "address")])],
    );
    write_artifact(artifacts_dir, "Bankroll", array![]);
}

/// Write the SyncSwap address file & artifacts where `config` expects them
pub fn write_dependency_files(config: &DeployConfig) {
    let addresses = object! {
        "wETH": WETH.to_string(),
        "router": ROUTER.to_string(),
        "classicFactory": FACTORY.to_string(),
    };
    fs::write(
        &config.dependency_contracts_file,
        json::stringify_pretty(addresses, 2),
    )
    .unwrap();

    for (_, relative) in DEPENDENCY_ARTIFACTS {
        let path = config.dependency_artifacts_dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, json::stringify(object! { "abi": array![] })).unwrap();
    }
}
