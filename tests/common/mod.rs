//! Shared utilities for integration testing: an in-memory chain that emulates
//! the credential registry contract, and a gateway bound to it.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::consensus::transaction::SignerRecoverable;
use alloy::consensus::{Transaction, TxEnvelope};
use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::eips::eip2718::Decodable2718;
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use tokio::net::TcpListener;

use credential_gateway::blockchain::contract::{parse_abi, AddressRecord};
use credential_gateway::blockchain::{
    ChainAdapter, ChainError, ChainId, ChainResult, ChainRpc, ContractArtifacts, ReceiptStatus,
    Wallet,
};
use credential_gateway::config::{GatewayConfig, TransactionConfig};
use credential_gateway::credentials::CredentialService;
use credential_gateway::http::HttpServer;
use credential_gateway::lifecycle::Shutdown;

pub const CHAIN_ID: u64 = 31337;
pub const FRONTEND_URL: &str = "http://frontend.test";

/// Well-known development accounts.
pub const OWNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const OWNER_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const OTHER_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const OTHER_ADDRESS: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

const GWEI: u64 = 1_000_000_000;

pub fn abi() -> JsonAbi {
    parse_abi(include_str!("../../contracts/contract-abi.json")).unwrap()
}

pub fn owner() -> Address {
    OWNER_ADDRESS.parse().unwrap()
}

#[derive(Debug, Clone)]
struct Record {
    recipient_name: String,
    recipient_email: String,
    issuer_name: String,
    credential_type: String,
    description: String,
    metadata_uri: String,
    issue_date: u64,
    issuer: Address,
    is_valid: bool,
}

/// Contract storage plus the chain bookkeeping around it.
#[derive(Default)]
struct Registry {
    owner: Address,
    authorized: HashSet<Address>,
    credentials: HashMap<String, Record>,
    by_issuer: HashMap<Address, Vec<String>>,
    by_recipient: HashMap<String, Vec<String>>,
    nonces: HashMap<Address, u64>,
    receipts: HashMap<TxHash, ReceiptStatus>,
    block: u64,
}

/// In-memory registry chain.
///
/// Transactions are decoded from their signed raw form, so the sender is the
/// recovered signer and the nonce must match exactly. The contract rules are
/// the registry's: only authorized issuers issue, only the owner authorizes,
/// only a credential's issuer revokes it and a revoked credential cannot be
/// revoked again. A rejected transaction still mines, with a failed receipt.
pub struct FakeChain {
    pub contract: Address,
    abi: JsonAbi,
    state: Mutex<Registry>,
    gas_price: AtomicU64,
    withhold_receipts: AtomicBool,
    failing_ids: Mutex<HashSet<String>>,
    /// Every RPC request, of any kind.
    pub rpc_requests: AtomicUsize,
    /// Nonces handed out by `transaction_count`, in order.
    pub nonce_fetches: Mutex<Vec<u64>>,
    pub submitted: AtomicUsize,
}

impl FakeChain {
    /// A chain with the registry deployed by [`OWNER_ADDRESS`], who is
    /// authorized to issue.
    pub fn new() -> Arc<Self> {
        let mut registry = Registry {
            owner: owner(),
            ..Default::default()
        };
        registry.authorized.insert(owner());

        Arc::new(Self {
            contract: Address::repeat_byte(0xc0),
            abi: abi(),
            state: Mutex::new(registry),
            gas_price: AtomicU64::new(2 * GWEI),
            withhold_receipts: AtomicBool::new(false),
            failing_ids: Mutex::new(HashSet::new()),
            rpc_requests: AtomicUsize::new(0),
            nonce_fetches: Mutex::new(Vec::new()),
            submitted: AtomicUsize::new(0),
        })
    }

    /// `getCredential(id)` errors from now on.
    pub fn fail_credential(&self, credential_id: &str) {
        self.failing_ids.lock().unwrap().insert(credential_id.to_string());
    }

    /// Transactions still mine but their receipts are never returned.
    pub fn withhold_receipts(&self) {
        self.withhold_receipts.store(true, Ordering::SeqCst);
    }

    pub fn set_gas_price_gwei(&self, gwei: u64) {
        self.gas_price.store(gwei * GWEI, Ordering::SeqCst);
    }

    pub fn nonce_of(&self, address: Address) -> u64 {
        self.state.lock().unwrap().nonces.get(&address).copied().unwrap_or(0)
    }

    pub fn requests(&self) -> usize {
        self.rpc_requests.load(Ordering::SeqCst)
    }

    /// Artifacts describing this chain's deployment.
    pub fn artifacts(&self) -> ContractArtifacts {
        ContractArtifacts {
            address: Some(AddressRecord {
                address: self.contract.to_string(),
                network: Some("hardhat".to_string()),
                deployer: Some(OWNER_ADDRESS.to_string()),
                deployment_time: None,
            }),
            abi: Some(self.abi.clone()),
        }
    }

    fn function(&self, data: &[u8]) -> ChainResult<&Function> {
        if data.len() < 4 {
            return Err(ChainError::Rpc("execution reverted: missing selector".into()));
        }
        self.abi
            .functions()
            .find(|f| f.selector().as_slice() == &data[..4])
            .ok_or_else(|| ChainError::Rpc("execution reverted: unknown selector".into()))
    }

    fn read(&self, function: &Function, args: &[DynSolValue]) -> ChainResult<Vec<DynSolValue>> {
        let state = self.state.lock().unwrap();
        let string_arg = || args[0].as_str().unwrap_or_default().to_string();

        let outputs = match function.name.as_str() {
            "getCredential" => {
                let id = string_arg();
                if self.failing_ids.lock().unwrap().contains(&id) {
                    return Err(ChainError::Rpc("execution reverted".into()));
                }
                match state.credentials.get(&id) {
                    Some(r) => vec![
                        DynSolValue::String(id),
                        DynSolValue::String(r.recipient_name.clone()),
                        DynSolValue::String(r.recipient_email.clone()),
                        DynSolValue::String(r.issuer_name.clone()),
                        DynSolValue::String(r.credential_type.clone()),
                        DynSolValue::String(r.description.clone()),
                        DynSolValue::Uint(U256::from(r.issue_date), 256),
                        DynSolValue::Address(r.issuer),
                        DynSolValue::Bool(r.is_valid),
                        DynSolValue::String(r.metadata_uri.clone()),
                    ],
                    None => vec![
                        DynSolValue::String(String::new()),
                        DynSolValue::String(String::new()),
                        DynSolValue::String(String::new()),
                        DynSolValue::String(String::new()),
                        DynSolValue::String(String::new()),
                        DynSolValue::String(String::new()),
                        DynSolValue::Uint(U256::ZERO, 256),
                        DynSolValue::Address(Address::ZERO),
                        DynSolValue::Bool(false),
                        DynSolValue::String(String::new()),
                    ],
                }
            }
            "verifyCredential" => match state.credentials.get(&string_arg()) {
                Some(r) => vec![
                    DynSolValue::Bool(true),
                    DynSolValue::Bool(r.is_valid),
                    DynSolValue::String(r.recipient_name.clone()),
                    DynSolValue::String(r.issuer_name.clone()),
                    DynSolValue::String(r.credential_type.clone()),
                    DynSolValue::Uint(U256::from(r.issue_date), 256),
                ],
                None => vec![
                    DynSolValue::Bool(false),
                    DynSolValue::Bool(false),
                    DynSolValue::String(String::new()),
                    DynSolValue::String(String::new()),
                    DynSolValue::String(String::new()),
                    DynSolValue::Uint(U256::ZERO, 256),
                ],
            },
            "getIssuerCredentials" => {
                let issuer = args[0].as_address().unwrap_or_default();
                vec![string_array(state.by_issuer.get(&issuer))]
            }
            "getRecipientCredentials" => vec![string_array(state.by_recipient.get(&string_arg()))],
            "isAuthorizedIssuer" => {
                let issuer = args[0].as_address().unwrap_or_default();
                vec![DynSolValue::Bool(state.authorized.contains(&issuer))]
            }
            "owner" => vec![DynSolValue::Address(state.owner)],
            other => {
                return Err(ChainError::Rpc(format!("execution reverted: {} is not a view", other)))
            }
        };
        Ok(outputs)
    }

    /// Apply a state-changing call. `false` means the contract reverted.
    fn execute(state: &mut Registry, sender: Address, function: &Function, args: &[DynSolValue]) -> bool {
        let text = |i: usize| args[i].as_str().unwrap_or_default().to_string();

        match function.name.as_str() {
            "issueCredential" => {
                let id = text(0);
                if !state.authorized.contains(&sender) || id.is_empty() || state.credentials.contains_key(&id) {
                    return false;
                }
                let record = Record {
                    recipient_name: text(1),
                    recipient_email: text(2),
                    issuer_name: text(3),
                    credential_type: text(4),
                    description: text(5),
                    metadata_uri: text(6),
                    issue_date: chrono::Utc::now().timestamp() as u64,
                    issuer: sender,
                    is_valid: true,
                };
                state.by_issuer.entry(sender).or_default().push(id.clone());
                state
                    .by_recipient
                    .entry(record.recipient_email.clone())
                    .or_default()
                    .push(id.clone());
                state.credentials.insert(id, record);
                true
            }
            "revokeCredential" => match state.credentials.get_mut(&text(0)) {
                Some(record) if record.issuer == sender && record.is_valid => {
                    record.is_valid = false;
                    true
                }
                _ => false,
            },
            "authorizeIssuer" => {
                if sender != state.owner {
                    return false;
                }
                match args[0].as_address() {
                    Some(issuer) => {
                        state.authorized.insert(issuer);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }
}

fn string_array(ids: Option<&Vec<String>>) -> DynSolValue {
    DynSolValue::Array(
        ids.map(|ids| ids.iter().cloned().map(DynSolValue::String).collect())
            .unwrap_or_default(),
    )
}

#[async_trait]
impl ChainRpc for FakeChain {
    async fn chain_id(&self) -> ChainResult<ChainId> {
        self.rpc_requests.fetch_add(1, Ordering::SeqCst);
        Ok(ChainId(CHAIN_ID))
    }

    async fn block_number(&self) -> ChainResult<u64> {
        self.rpc_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().block)
    }

    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {
        self.rpc_requests.fetch_add(1, Ordering::SeqCst);
        if to != self.contract {
            return Ok(Bytes::new());
        }
        let function = self.function(&data)?;
        let args = function
            .abi_decode_input(&data[4..])
            .map_err(|e| ChainError::Rpc(format!("invalid calldata: {}", e)))?;
        let outputs = self.read(function, &args)?;
        let encoded = function
            .abi_encode_output(&outputs)
            .map_err(|e| ChainError::Rpc(format!("output encoding: {}", e)))?;
        Ok(Bytes::from(encoded))
    }

    async fn transaction_count(&self, address: Address) -> ChainResult<u64> {
        self.rpc_requests.fetch_add(1, Ordering::SeqCst);
        let nonce = self.nonce_of(address);
        self.nonce_fetches.lock().unwrap().push(nonce);
        // Yield so concurrent senders get a chance to interleave.
        tokio::task::yield_now().await;
        Ok(nonce)
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.rpc_requests.fetch_add(1, Ordering::SeqCst);
        Ok(u128::from(self.gas_price.load(Ordering::SeqCst)))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> ChainResult<TxHash> {
        self.rpc_requests.fetch_add(1, Ordering::SeqCst);
        let mut buf: &[u8] = &raw;
        let envelope = TxEnvelope::decode_2718(&mut buf)
            .map_err(|e| ChainError::Rpc(format!("invalid transaction: {}", e)))?;
        let sender = envelope
            .recover_signer()
            .map_err(|e| ChainError::Rpc(format!("invalid signature: {}", e)))?;
        let tx_hash = *envelope.tx_hash();

        let mut state = self.state.lock().unwrap();
        let expected = state.nonces.get(&sender).copied().unwrap_or(0);
        if envelope.nonce() != expected {
            return Err(ChainError::Rpc(format!(
                "nonce too low: expected {}, got {}",
                expected,
                envelope.nonce()
            )));
        }
        state.nonces.insert(sender, expected + 1);

        let success = match envelope.to() {
            Some(to) if to == self.contract => match self.function(envelope.input()) {
                Ok(function) => match function.abi_decode_input(&envelope.input()[4..]) {
                    Ok(args) => Self::execute(&mut state, sender, function, &args),
                    Err(_) => false,
                },
                Err(_) => false,
            },
            _ => false,
        };

        state.block += 1;
        let block_number = state.block;
        state.receipts.insert(
            tx_hash,
            ReceiptStatus {
                block_number: Some(block_number),
                success,
            },
        );
        self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<ReceiptStatus>> {
        self.rpc_requests.fetch_add(1, Ordering::SeqCst);
        if self.withhold_receipts.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.state.lock().unwrap().receipts.get(&tx_hash).copied())
    }
}

pub fn tx_config() -> TransactionConfig {
    TransactionConfig {
        confirmation_timeout_secs: 1,
        poll_interval_ms: 10,
        ..Default::default()
    }
}

/// A service bound to `chain`, signing with `key`.
pub async fn service(chain: Arc<FakeChain>, key: Option<&str>, tx: TransactionConfig) -> CredentialService {
    let mut adapter = ChainAdapter::with_rpc(chain.clone(), CHAIN_ID).await;
    adapter.bind_contract(chain.artifacts()).unwrap();
    let wallet = key.map(|k| Wallet::from_private_key(k, CHAIN_ID).unwrap());
    adapter.attach_signer(wallet, tx);
    CredentialService::new(Arc::new(adapter))
}

/// A running gateway on an ephemeral port. Stops when dropped.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub chain: Arc<FakeChain>,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestGateway {
    pub async fn start() -> Self {
        Self::start_with(FakeChain::new(), OWNER_KEY).await
    }

    pub async fn start_with(chain: Arc<FakeChain>, key: &str) -> Self {
        let service = service(chain.clone(), Some(key), tx_config()).await;
        Self::serve(chain, service).await
    }

    pub async fn serve(chain: Arc<FakeChain>, service: CredentialService) -> Self {
        let mut config = GatewayConfig::default();
        config.frontend.base_url = FRONTEND_URL.to_string();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let server = HttpServer::new(&config, service);
        let stop = shutdown.wait();
        tokio::spawn(async move {
            let _ = server.run(listener, stop).await;
        });

        Self {
            addr,
            chain,
            client: reqwest::Client::new(),
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Issue a credential for `email` from the owner account; returns the JSON body.
    pub async fn issue(&self, email: &str) -> serde_json::Value {
        let res = self
            .client
            .post(self.url("/api/credentials/issue"))
            .json(&serde_json::json!({
                "recipient_name": "Ada Lovelace",
                "recipient_email": email,
                "issuer_name": "Org",
                "credential_type": "Cert",
                "description": "Completed the course",
                "issuer_address": OWNER_ADDRESS.to_lowercase(),
            }))
            .send()
            .await
            .unwrap();
        let status = res.status();
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(status, 200, "issue failed: {}", body);
        body
    }

    pub async fn get_json(&self, path: &str) -> (u16, serde_json::Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
