//! zkSync era deployments.
//!
//! Era does not run EVM creation code: a contract is deployed by calling the
//! `ContractDeployer` system contract with the hash of its bytecode, the
//! bytecode itself travelling as a factory dependency of an EIP-712
//! (type `0x71`) transaction.

use alloy::{
    primitives::{address, Address, Bytes, Log, B256, U256},
    rlp::{Encodable, Header},
    signers::{local::PrivateKeySigner, Signature, SignerSync},
    sol,
    sol_types::{eip712_domain, Eip712Domain, SolCall, SolEvent, SolStruct},
};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::{errors::ScriptError, tx::chain::TxPayload};

/// The `ContractDeployer` system contract
pub const CONTRACT_DEPLOYER: Address = address!("0x0000000000000000000000000000000000008006");

/// Type byte of the EIP-712 transactions
pub const EIP712_TX_TYPE: u8 = 0x71;

/// Gas per pubdata byte we accept to pay
pub const DEFAULT_GAS_PER_PUBDATA: u64 = 50_000;

/// Version byte of an era bytecode hash
const BYTECODE_HASH_VERSION: u8 = 1;

sol! {
interface IContractDeployer {
    function create(bytes32 _salt, bytes32 _bytecodeHash, bytes calldata _input) external payable returns (address);

    event ContractDeployed(address indexed deployerAddress, bytes32 indexed bytecodeHash, address indexed contractAddress);
}

struct Transaction {
    uint256 txType;
    uint256 from;
    uint256 to;
    uint256 gasLimit;
    uint256 gasPerPubdataByteLimit;
    uint256 maxFeePerGas;
    uint256 maxPriorityFeePerGas;
    uint256 paymaster;
    uint256 nonce;
    uint256 value;
    bytes data;
    bytes32[] factoryDeps;
    bytes paymasterInput;
}
}

/// Hash under which era knows a bytecode.
///
/// The sha256 of the code with its first 4 bytes replaced by the version and
/// the length of the code in 32 bytes words.
pub fn hash_bytecode(bytecode: &[u8]) -> Result<B256, ScriptError> {
    if bytecode.len() % 32 != 0 {
        return Err(ScriptError::Parse(format!(
            "bytecode of {} bytes is not made of 32 bytes words, is it an era artifact?",
            bytecode.len()
        )));
    }
    let words = bytecode.len() / 32;
    if words % 2 == 0 {
        return Err(ScriptError::Parse(format!(
            "bytecode has an even number of words ({words})"
        )));
    }
    let words = u16::try_from(words)
        .map_err(|_| ScriptError::Parse(format!("bytecode of {words} words is too long")))?;

    let mut hash: [u8; 32] = Sha256::digest(bytecode).into();
    hash[0] = BYTECODE_HASH_VERSION;
    hash[1] = 0;
    hash[2..4].copy_from_slice(&words.to_be_bytes());

    Ok(B256::from(hash))
}

/// Address of the contract created by the deployer, read from its `ContractDeployed` event
pub fn deployed_address(logs: &[Log]) -> Option<Address> {
    logs.iter()
        .filter(|log| log.address == CONTRACT_DEPLOYER)
        .find_map(|log| IContractDeployer::ContractDeployed::decode_log(log).ok())
        .map(|event| event.data.contractAddress)
}

/// An EIP-712 transaction, as accepted by era
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712Transaction {
    /// The network chain id
    pub chain_id: u64,
    /// The signer
    pub from: Address,
    /// Nonce of the signer
    pub nonce: u64,
    /// Gas limit
    pub gas_limit: u64,
    /// Max fee per gas, in wei
    pub max_fee_per_gas: u128,
    /// Max priority fee per gas, in wei
    pub max_priority_fee_per_gas: u128,
    /// Gas per pubdata byte limit
    pub gas_per_pubdata: u64,
    /// Called contract
    pub to: Address,
    /// Wei sent along
    pub value: U256,
    /// Calldata
    pub input: Bytes,
    /// Bytecodes published with the transaction
    pub factory_deps: Vec<Bytes>,
}

impl Eip712Transaction {
    /// Turn a creation payload into a `ContractDeployer.create` call
    /// shipping the bytecode as a factory dependency.
    ///
    /// Nonce, gas limit & fees are left at zero.
    pub fn deployment(
        chain_id: u64,
        from: Address,
        payload: &TxPayload,
    ) -> Result<Self, ScriptError> {
        let (bytecode, constructor_args) = payload.creation_parts().ok_or_else(|| {
            ScriptError::ContractDeployment("the payload is not a contract creation".to_string())
        })?;

        let input = IContractDeployer::createCall {
            _salt: B256::ZERO,
            _bytecodeHash: hash_bytecode(&bytecode)?,
            _input: constructor_args,
        }
        .abi_encode();

        Ok(Eip712Transaction {
            chain_id,
            from,
            nonce: 0,
            gas_limit: 0,
            max_fee_per_gas: 0,
            max_priority_fee_per_gas: 0,
            gas_per_pubdata: DEFAULT_GAS_PER_PUBDATA,
            to: CONTRACT_DEPLOYER,
            value: payload.value,
            input: input.into(),
            factory_deps: vec![bytecode],
        })
    }

    /// The era signing domain
    pub fn domain(&self) -> Eip712Domain {
        eip712_domain! {
            name: "zkSync",
            version: "2",
            chain_id: self.chain_id,
        }
    }

    /// The hash the sender signs
    pub fn signing_hash(&self) -> Result<B256, ScriptError> {
        let factory_deps = self
            .factory_deps
            .iter()
            .map(|dep| hash_bytecode(dep))
            .collect::<Result<Vec<_>, _>>()?;

        let typed = Transaction {
            txType: U256::from(EIP712_TX_TYPE),
            from: U256::from_be_slice(self.from.as_slice()),
            to: U256::from_be_slice(self.to.as_slice()),
            gasLimit: U256::from(self.gas_limit),
            gasPerPubdataByteLimit: U256::from(self.gas_per_pubdata),
            maxFeePerGas: U256::from(self.max_fee_per_gas),
            maxPriorityFeePerGas: U256::from(self.max_priority_fee_per_gas),
            // No paymaster, the sender pays
            paymaster: U256::ZERO,
            nonce: U256::from(self.nonce),
            value: self.value,
            data: self.input.clone(),
            factoryDeps: factory_deps,
            paymasterInput: Bytes::new(),
        };

        Ok(typed.eip712_signing_hash(&self.domain()))
    }

    /// Sign with `signer` and encode, ready for `eth_sendRawTransaction`
    pub fn sign(&self, signer: &PrivateKeySigner) -> Result<Bytes, ScriptError> {
        let hash = self.signing_hash()?;
        let signature = signer
            .sign_hash_sync(&hash)
            .map_err(|e| ScriptError::ContractDeployment(format!("signing failed: {e}")))?;

        Ok(self.encode_signed(&signature))
    }

    /// The `0x71` envelope: the type byte followed by the rlp list of the fields
    pub fn encode_signed(&self, signature: &Signature) -> Bytes {
        let mut payload = Vec::new();
        self.nonce.encode(&mut payload);
        self.max_priority_fee_per_gas.encode(&mut payload);
        self.max_fee_per_gas.encode(&mut payload);
        self.gas_limit.encode(&mut payload);
        self.to.encode(&mut payload);
        self.value.encode(&mut payload);
        self.input.encode(&mut payload);
        u8::from(signature.v()).encode(&mut payload);
        signature.r().encode(&mut payload);
        signature.s().encode(&mut payload);
        self.chain_id.encode(&mut payload);
        self.from.encode(&mut payload);
        self.gas_per_pubdata.encode(&mut payload);
        self.factory_deps.encode(&mut payload);
        // Empty custom signature, the one above is used
        Bytes::new().encode(&mut payload);
        // No paymaster params
        Vec::<Bytes>::new().encode(&mut payload);

        let mut out = vec![EIP712_TX_TYPE];
        Header {
            list: true,
            payload_length: payload.len(),
        }
        .encode(&mut out);
        out.extend_from_slice(&payload);

        out.into()
    }

    /// The transaction as an `eth_estimateGas` request, factory deps included
    pub fn estimate_request(&self) -> Value {
        let factory_deps: Vec<Vec<u8>> = self.factory_deps.iter().map(|dep| dep.to_vec()).collect();

        json!({
            "from": self.from,
            "to": self.to,
            "value": self.value,
            "data": self.input,
            "type": format!("{EIP712_TX_TYPE:#x}"),
            "eip712Meta": {
                "gasPerPubdata": U256::from(self.gas_per_pubdata),
                "factoryDeps": factory_deps,
            },
        })
    }
}
