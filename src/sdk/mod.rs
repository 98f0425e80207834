// SDK facade - one object binding ledger, registry, market, and consensus
// for embedding processes. Subsystems share a single data directory and a
// single coarse ledger lock.

use crate::config::Config;
use crate::consensus::{ConsensusError, PbftNode, ValidatorInfo};
use crate::crypto::Keypair;
use crate::economics::{registration_mint, ActivityCounters, Priority};
use crate::governance::GovernanceOracle;
use crate::ledger::{Ledger, LedgerError, StoredTransaction};
use crate::market::{MarketError, Purchase, SkillDraft, SkillMarket};
use crate::registry::{BotIdentity, IdentityRegistry, RegistryError};
use crate::storage::{Store, StoreError};
use crate::tx::{TransactionBuilder, TxType};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

/// Facade-level errors; `code()` lifts the stable code of the failing
/// subsystem.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Ledger unavailable")]
    LedgerUnavailable,

    #[error("Encoding failed: {0}")]
    Encoding(#[from] crate::crypto::CanonicalError),

    #[error(transparent)]
    Build(#[from] crate::tx::BuildError),
}

impl SdkError {
    pub fn code(&self) -> &'static str {
        match self {
            SdkError::Ledger(e) => e.code(),
            SdkError::Registry(e) => e.code(),
            SdkError::Market(e) => e.code(),
            SdkError::Consensus(e) => e.code(),
            SdkError::Storage(_) => "STORAGE_FAILED",
            SdkError::LedgerUnavailable => "CONSENSUS_FAILURE",
            SdkError::Encoding(_) => "ENCODING_FAILED",
            SdkError::Build(_) => "INVALID_AMOUNT",
        }
    }
}

/// The embedding surface: wires every subsystem over one data directory
pub struct Sdk {
    config: Config,
    ledger: Arc<Mutex<Ledger>>,
    registry: IdentityRegistry,
    market: SkillMarket,
    consensus: Option<PbftNode>,
    oracle: Option<Box<dyn GovernanceOracle>>,
}

impl Sdk {
    pub fn new(config: Config) -> Result<Self, SdkError> {
        let store = Store::open(&config.data_dir)?;
        let ledger = Arc::new(Mutex::new(Ledger::with_store(config.fees, store.clone())));
        let registry = IdentityRegistry::with_store(store.clone());
        let market = SkillMarket::with_store(Arc::clone(&ledger), store);

        Ok(Self {
            config,
            ledger,
            registry,
            market,
            consensus: None,
            oracle: None,
        })
    }

    /// Load all persisted state in dependency order. Corrupt state files
    /// surface here and abort startup.
    pub fn initialize(&mut self) -> Result<(), SdkError> {
        self.lock_ledger()?.initialize()?;
        self.registry.initialize()?;
        self.market.initialize()?;
        info!(data_dir = %self.config.data_dir.display(), "clawrrency initialized");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> Arc<Mutex<Ledger>> {
        Arc::clone(&self.ledger)
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn market(&self) -> &SkillMarket {
        &self.market
    }

    /// Turn this process into a validator with the given peers
    pub fn enable_consensus(
        &mut self,
        node_id: impl Into<String>,
        keypair: Keypair,
        peers: Vec<ValidatorInfo>,
    ) -> Result<(), SdkError> {
        let node = PbftNode::new(
            node_id,
            keypair,
            peers,
            Arc::clone(&self.ledger),
            self.config.consensus,
        )?;
        self.consensus = Some(node);
        Ok(())
    }

    pub fn consensus(&mut self) -> Option<&mut PbftNode> {
        self.consensus.as_mut()
    }

    /// Attach the external governance oracle
    pub fn set_oracle(&mut self, oracle: Box<dyn GovernanceOracle>) {
        self.oracle = Some(oracle);
    }

    pub fn oracle(&mut self) -> Option<&mut (dyn GovernanceOracle + 'static)> {
        self.oracle.as_deref_mut()
    }

    // ------------------------------------------------------------------
    // Wallets and registration
    // ------------------------------------------------------------------

    /// Create a wallet and its (empty) ledger account
    pub fn create_wallet(&mut self, name: &str, description: &str) -> Result<BotIdentity, SdkError> {
        let identity = self.registry.create_wallet(name, description)?;
        self.lock_ledger()?.create_account(&identity.public_key, 0)?;
        Ok(identity)
    }

    /// Register a bot: lock stake in the registry, then mint the
    /// registration grant (100 attested, 50 otherwise) into its account
    /// through a self-signed mint transaction.
    pub fn register_bot(
        &mut self,
        public_key: &str,
        stake: u64,
        attester: Option<&str>,
    ) -> Result<(), SdkError> {
        self.registry.register_bot(public_key, stake, attester)?;
        let keypair = self.registry.keypair_for(public_key)?;

        let nonce = {
            let ledger = self.lock_ledger()?;
            ledger
                .get_account(public_key)
                .map(|a| a.next_nonce())
                .unwrap_or(1)
        };
        let mint = TransactionBuilder::new()
            .sender(&keypair)
            .tx_type(TxType::Mint)
            .amount(registration_mint(attester.is_some()))
            .nonce(nonce)
            .build()?;
        self.apply_or_submit(mint)?;
        Ok(())
    }

    pub fn is_registered(&self, public_key: &str) -> bool {
        self.registry.is_registered(public_key)
    }

    pub fn reputation(&self, public_key: &str) -> Option<f64> {
        self.registry.get_bot(public_key).map(|b| b.reputation)
    }

    pub fn update_reputation(
        &mut self,
        public_key: &str,
        counters: ActivityCounters,
    ) -> Result<f64, SdkError> {
        Ok(self.registry.update_reputation(public_key, counters)?)
    }

    /// Voting power from reputation plus shells held
    pub fn voting_power(&self, public_key: &str) -> Result<f64, SdkError> {
        let shells = self.lock_ledger()?.get_balance(public_key);
        Ok(self.registry.voting_power(public_key, shells))
    }

    // ------------------------------------------------------------------
    // Shells
    // ------------------------------------------------------------------

    pub fn balance(&self, public_key: &str) -> Result<u64, SdkError> {
        Ok(self.lock_ledger()?.get_balance(public_key))
    }

    /// Move shells between wallets at normal priority. Routed through
    /// consensus when this node is a validator, applied directly
    /// otherwise. Returns the transaction digest.
    pub fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<String, SdkError> {
        self.transfer_with_priority(from, to, amount, Priority::Normal)
    }

    /// Move shells with an explicit fee priority; the adjusted fee is
    /// burned from the sender
    pub fn transfer_with_priority(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
        priority: Priority,
    ) -> Result<String, SdkError> {
        let keypair = self.registry.keypair_for(from)?;
        let nonce = {
            let ledger = self.lock_ledger()?;
            ledger
                .get_account(from)
                .map(|a| a.next_nonce())
                .ok_or_else(|| LedgerError::UnknownSender(from.to_string()))?
        };
        let tx = TransactionBuilder::new()
            .sender(&keypair)
            .recipient(to)
            .amount(amount)
            .nonce(nonce)
            .priority(priority)
            .build()?;
        self.apply_or_submit(tx)
    }

    pub fn history(&self, public_key: &str, limit: usize) -> Result<Vec<StoredTransaction>, SdkError> {
        let ledger = self.lock_ledger()?;
        Ok(ledger
            .get_transaction_history(public_key, limit)
            .into_iter()
            .cloned()
            .collect())
    }

    // ------------------------------------------------------------------
    // Skills
    // ------------------------------------------------------------------

    /// Create a skill and credit the creator's published-skill counter
    pub fn create_skill(&mut self, creator: &str, draft: SkillDraft) -> Result<String, SdkError> {
        let id = self.market.create_skill(draft, creator)?;
        if self.registry.get_bot(creator).is_some() {
            self.registry.record_skill_published(creator)?;
        }
        Ok(id)
    }

    pub fn list_skill(&mut self, id: &str, price: u64, seller: &str) -> Result<(), SdkError> {
        Ok(self.market.list_skill(id, price, seller)?)
    }

    /// Buy a skill with the buyer's registered wallet; bumps the buyer's
    /// trade counter on success
    pub fn purchase_skill(&mut self, id: &str, buyer: &str) -> Result<Purchase, SdkError> {
        let keypair = self.registry.keypair_for(buyer)?;
        let purchase = self.market.purchase_skill(id, &keypair)?;
        self.registry.record_trade(buyer)?;
        Ok(purchase)
    }

    pub fn verify_skill(&self, id: &str) -> Result<bool, SdkError> {
        Ok(self.market.verify_skill(id)?)
    }

    pub fn add_review(
        &mut self,
        id: &str,
        reviewer: &str,
        rating: u8,
        comment: &str,
    ) -> Result<(), SdkError> {
        Ok(self.market.add_review(id, reviewer, rating, comment)?)
    }

    pub fn delist_skill(&mut self, id: &str, seller: &str) -> Result<(), SdkError> {
        Ok(self.market.delist_skill(id, seller)?)
    }

    // ------------------------------------------------------------------

    fn apply_or_submit(&mut self, tx: crate::tx::Transaction) -> Result<String, SdkError> {
        match self.consensus.as_mut() {
            Some(node) => Ok(node.submit_transaction(tx)?),
            None => Ok(self.lock_ledger()?.apply_transaction(&tx)?),
        }
    }

    fn lock_ledger(&self) -> Result<std::sync::MutexGuard<'_, Ledger>, SdkError> {
        self.ledger.lock().map_err(|_| SdkError::LedgerUnavailable)
    }
}
