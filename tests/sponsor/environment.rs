//! In-process chain, ledger, sponsor and wallet used by the test cases.

use alloy::primitives::{Address, B256, ChainId, Signature, U256, address, keccak256};
use gas_sponsor::{
    authorization::AuthorizationSigner,
    delegation::DelegationApi,
    error::{PriceFeedError, TransactionError},
    ledger::LedgerApi,
    orchestrator::{Orchestrator, SponsorSession},
    price::{PriceFeed, PriceOracle},
    pricing::FeeEstimator,
    signers::{DigestSigner, DynSigner},
    sponsor::SponsorApi,
    transactions::ConfirmedTransaction,
    types::{AuthorizationDigest, DelegationState, FeedPrice, PendingCall, UserSignature},
};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU32, Ordering},
};
use tokio::sync::Notify;

/// Anvil account 1.
pub const USER_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const SPONSOR: Address = address!("478645622A0371921184Bbe0267f4ECbA536fD8C");
pub const CHAIN_ID: ChainId = 545;
pub const INITIAL_NONCE: u64 = 4;
pub const ETH_USD: FeedPrice = FeedPrice::new(360_000_000_000, -8);
pub const GAS_PRICE: u128 = 20_000_000;
pub const GAS_LIMIT: u64 = 3_000_000;
/// Debit for [`GAS_PRICE`] and [`GAS_LIMIT`] at [`ETH_USD`].
pub const REQUIRED: u64 = 220_000;

/// Chain state shared by the fakes.
#[derive(Debug, Default)]
pub struct ChainState {
    pub installed: bool,
    pub nonce: u64,
    pub balance: U256,
    pub blocks: u64,

    pub install_calls: u32,
    pub balance_reads: u32,
    pub debit_calls: u32,
    pub submit_calls: u32,
    pub submitted: Vec<UserSignature>,
    pub submitted_nonces: Vec<u64>,

    pub fail_install: u32,
    pub fail_balance_reads: u32,
    pub fail_debit: u32,
    pub fail_submit: u32,
}

impl ChainState {
    fn include(&mut self) -> ConfirmedTransaction {
        self.blocks += 1;
        ConfirmedTransaction {
            tx_hash: keccak256(self.blocks.to_be_bytes()),
            block_number: self.blocks,
            gas_used: 21_000,
        }
    }
}

pub type SharedChain = Arc<Mutex<ChainState>>;

fn take_failure(counter: &mut u32) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

#[derive(Debug)]
pub struct FakeDelegation(pub SharedChain);

#[async_trait::async_trait]
impl DelegationApi for FakeDelegation {
    async fn delegation_state(&self, _: Address) -> Result<DelegationState, TransactionError> {
        Ok(if self.0.lock().installed {
            DelegationState::Installed
        } else {
            DelegationState::NotInstalled
        })
    }

    async fn account_nonce(&self, _: Address) -> Result<u64, TransactionError> {
        Ok(self.0.lock().nonce)
    }

    async fn install(
        &self,
        _: Address,
        nonce: u64,
    ) -> Result<ConfirmedTransaction, TransactionError> {
        let mut chain = self.0.lock();
        chain.install_calls += 1;
        if take_failure(&mut chain.fail_install) {
            return Err(TransactionError::NotIncluded(B256::ZERO));
        }
        assert_eq!(nonce, chain.nonce, "delegation sent with a stale nonce");
        chain.installed = true;
        chain.nonce += 1;
        Ok(chain.include())
    }
}

#[derive(Debug)]
pub struct FakeLedger(pub SharedChain);

#[async_trait::async_trait]
impl LedgerApi for FakeLedger {
    async fn balance_of(&self, _: Address) -> Result<U256, TransactionError> {
        let mut chain = self.0.lock();
        chain.balance_reads += 1;
        if take_failure(&mut chain.fail_balance_reads) {
            return Err(TransactionError::Other("connection reset".into()));
        }
        Ok(chain.balance)
    }

    async fn debit(
        &self,
        _: Address,
        amount: U256,
    ) -> Result<ConfirmedTransaction, TransactionError> {
        let mut chain = self.0.lock();
        chain.debit_calls += 1;
        if take_failure(&mut chain.fail_debit) {
            return Err(TransactionError::Reverted(B256::ZERO));
        }
        if chain.balance < amount {
            return Err(TransactionError::Revert { reason: "panic: arithmetic underflow".into() });
        }
        chain.balance -= amount;
        Ok(chain.include())
    }
}

/// Verifies the authorization the way the delegation contract does.
#[derive(Debug)]
pub struct FakeSponsor(pub SharedChain);

#[async_trait::async_trait]
impl SponsorApi for FakeSponsor {
    fn sponsor_address(&self) -> Address {
        SPONSOR
    }

    async fn submit(
        &self,
        account: Address,
        call: &PendingCall,
        nonce: u64,
        signature: &UserSignature,
    ) -> Result<ConfirmedTransaction, TransactionError> {
        let mut chain = self.0.lock();
        chain.submit_calls += 1;
        chain.submitted.push(*signature);
        chain.submitted_nonces.push(nonce);
        if take_failure(&mut chain.fail_submit) {
            return Err(TransactionError::NotIncluded(B256::ZERO));
        }
        if !chain.installed {
            return Err(TransactionError::Revert { reason: "account is not delegated".into() });
        }

        let digest = AuthorizationDigest::compute(CHAIN_ID, call, SPONSOR, nonce).hash();
        let signer = signature
            .signature
            .recover_address_from_msg(digest.as_slice())
            .map_err(|err| TransactionError::Other(err.into()))?;
        if signer != account {
            return Err(TransactionError::Revert { reason: "signer is not the account".into() });
        }

        Ok(chain.include())
    }
}

#[derive(Debug)]
pub struct FixedFeed(pub Option<FeedPrice>);

#[async_trait::async_trait]
impl PriceFeed for FixedFeed {
    async fn fetch(&self) -> Result<FeedPrice, PriceFeedError> {
        self.0.ok_or_else(|| PriceFeedError::MissingFeed("eth".into()))
    }
}

/// A wallet that can be held open or made to decline.
#[derive(Debug)]
pub struct Wallet {
    key: DynSigner,
    held: AtomicBool,
    release: Notify,
    decline: AtomicU32,
    requests: AtomicU32,
}

impl Wallet {
    pub fn new() -> Self {
        Self {
            key: DynSigner::from_signing_key(USER_KEY).unwrap(),
            held: AtomicBool::new(false),
            release: Notify::new(),
            decline: AtomicU32::new(0),
            requests: AtomicU32::new(0),
        }
    }

    /// Signature requests block until [`Wallet::release`].
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    /// The next `times` signature requests are declined.
    pub fn decline(&self, times: u32) {
        self.decline.store(times, Ordering::SeqCst);
    }

    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DigestSigner for Wallet {
    fn address(&self) -> Address {
        self.key.address()
    }

    async fn sign_digest(&self, digest: B256) -> Result<Signature, alloy::signers::Error> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.held.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self
            .decline
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(alloy::signers::Error::other("user rejected the request"));
        }
        self.key.sign_digest(digest).await
    }
}

/// Everything a test case needs.
#[derive(Debug)]
pub struct Environment {
    pub chain: SharedChain,
    pub wallet: Arc<Wallet>,
    pub orchestrator: Orchestrator,
}

impl Environment {
    pub fn new() -> Self {
        Self::with_price(Some(ETH_USD))
    }

    /// An environment whose price feed returns `price`, or fails if `None`.
    pub fn with_price(price: Option<FeedPrice>) -> Self {
        Self::build(price, GAS_PRICE)
    }

    /// An environment quoting `gas_price`.
    pub fn with_gas_price(gas_price: u128) -> Self {
        Self::build(Some(ETH_USD), gas_price)
    }

    fn build(price: Option<FeedPrice>, gas_price: u128) -> Self {
        let chain = SharedChain::new(Mutex::new(ChainState {
            nonce: INITIAL_NONCE,
            ..Default::default()
        }));
        let wallet = Arc::new(Wallet::new());

        let oracle = PriceOracle::new(Arc::new(FixedFeed(price)), ETH_USD);
        let orchestrator = Orchestrator::new(
            CHAIN_ID,
            Arc::new(FakeDelegation(chain.clone())),
            AuthorizationSigner::new(wallet.clone()),
            FeeEstimator::new(oracle, gas_price, GAS_LIMIT),
            Arc::new(FakeLedger(chain.clone())),
            Arc::new(FakeSponsor(chain.clone())),
        );

        Self { chain, wallet, orchestrator }
    }

    pub fn user(&self) -> Address {
        self.wallet.address()
    }

    pub fn call() -> PendingCall {
        PendingCall::new(
            address!("d41923bF117045b50e4589799F14Cb67A06090E1"),
            alloy::primitives::bytes!(
                "a9059cbb000000000000000000000000478645622a0371921184bbe0267f4ecba536fd8c0000000000000000000000000000000000000000000000000de0b6b3a7640000"
            ),
            U256::ZERO,
        )
    }

    pub async fn open(&self) -> SponsorSession {
        SponsorSession::open(self.orchestrator.clone(), self.user(), Self::call()).await.unwrap()
    }

    pub fn deposit(&self, amount: u64) {
        self.chain.lock().balance += U256::from(amount);
    }
}
