// Skill market - listings, purchases, and reviews over the ledger
//
// The market owns skills, listings, and purchase records; shells move
// through the shared ledger via skill_purchase transactions.

use crate::crypto::{CanonicalError, Keypair};
use crate::ledger::{Ledger, LedgerError};
use crate::market::{Listing, ListingStatus, Purchase, Review, SkillArtifact, SkillDraft};
use crate::storage::{Store, StoreError};
use crate::tx::{BuildError, SkillPurchaseData, TransactionBuilder, TxPayload, TxType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

pub const MARKET_STATE_VERSION: u32 = 1;

/// Errors from market operations. `code()` gives the stable external code.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    #[error("Skill already exists: {0}")]
    SkillExists(String),

    #[error("Skill is not listed: {0}")]
    NotListed(String),

    #[error("Listing is not active: {0}")]
    ListingNotActive(String),

    #[error("Only the creator can list this skill")]
    NotCreator,

    #[error("Only the seller can delist this skill")]
    NotSeller,

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Unknown buyer: {0}")]
    UnknownBuyer(String),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Reviewer has not purchased this skill")]
    ReviewWithoutPurchase,

    #[error("Ledger unavailable")]
    LedgerUnavailable,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Encoding failed: {0}")]
    Encoding(#[from] CanonicalError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl MarketError {
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::UnknownSkill(_)
            | MarketError::SkillExists(_)
            | MarketError::NotListed(_)
            | MarketError::ListingNotActive(_)
            | MarketError::NotCreator
            | MarketError::NotSeller
            | MarketError::InvalidRating(_)
            | MarketError::ReviewWithoutPurchase => "INVALID_SKILL",
            MarketError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            MarketError::UnknownBuyer(_) => "UNKNOWN_SENDER",
            MarketError::LedgerUnavailable => "CONSENSUS_FAILURE",
            MarketError::Ledger(e) => e.code(),
            MarketError::Build(_) => "INVALID_AMOUNT",
            MarketError::Encoding(_) => "ENCODING_FAILED",
            MarketError::Storage(_) => "STORAGE_FAILED",
        }
    }
}

/// The market's persistent shape
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketState {
    pub version: u32,
    pub skills: HashMap<String, SkillArtifact>,
    pub listings: HashMap<String, Listing>,
    pub purchases: HashMap<String, Vec<Purchase>>,
}

impl MarketState {
    pub fn new() -> Self {
        Self {
            version: MARKET_STATE_VERSION,
            skills: HashMap::new(),
            listings: HashMap::new(),
            purchases: HashMap::new(),
        }
    }
}

impl Default for MarketState {
    fn default() -> Self {
        Self::new()
    }
}

/// The skill marketplace
pub struct SkillMarket {
    state: MarketState,
    ledger: Arc<Mutex<Ledger>>,
    store: Option<Store>,
}

impl SkillMarket {
    pub fn new(ledger: Arc<Mutex<Ledger>>) -> Self {
        Self {
            state: MarketState::new(),
            ledger,
            store: None,
        }
    }

    pub fn with_store(ledger: Arc<Mutex<Ledger>>, store: Store) -> Self {
        Self {
            state: MarketState::new(),
            ledger,
            store: Some(store),
        }
    }

    /// Load persisted skills; absent file means an empty market
    pub fn initialize(&mut self) -> Result<(), MarketError> {
        if let Some(store) = &self.store {
            if let Some(state) = store.load_market()? {
                self.state = state;
            }
        }
        Ok(())
    }

    pub fn state(&self) -> &MarketState {
        &self.state
    }

    /// Create a content-addressed skill artifact. Duplicates (same
    /// manifest, hence same id) are rejected.
    pub fn create_skill(&mut self, draft: SkillDraft, creator: &str) -> Result<String, MarketError> {
        let artifact = SkillArtifact::from_draft(draft, creator, now_ms())?;
        let id = artifact.id.clone();
        if self.state.skills.contains_key(&id) {
            return Err(MarketError::SkillExists(id));
        }
        self.state.skills.insert(id.clone(), artifact);
        self.persist();
        debug!(%id, creator, "created skill");
        Ok(id)
    }

    pub fn get_skill(&self, id: &str) -> Option<&SkillArtifact> {
        self.state.skills.get(id)
    }

    pub fn get_listing(&self, id: &str) -> Option<&Listing> {
        self.state.listings.get(id)
    }

    pub fn purchases_of(&self, id: &str) -> &[Purchase] {
        self.state
            .purchases
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn active_listings(&self) -> Vec<&Listing> {
        self.state
            .listings
            .values()
            .filter(|l| l.status == ListingStatus::Active)
            .collect()
    }

    /// Offer a skill for sale; only its creator can
    pub fn list_skill(&mut self, id: &str, price: u64, seller: &str) -> Result<(), MarketError> {
        let artifact = self
            .state
            .skills
            .get(id)
            .ok_or_else(|| MarketError::UnknownSkill(id.to_string()))?;
        if artifact.creator != seller {
            return Err(MarketError::NotCreator);
        }

        self.state.listings.insert(
            id.to_string(),
            Listing::new(id.to_string(), seller.to_string(), price, now_ms()),
        );
        self.persist();
        Ok(())
    }

    /// Buy a listed skill: builds and signs a skill_purchase transaction,
    /// routes it through the ledger, and records the purchase with the
    /// transaction digest.
    pub fn purchase_skill(&mut self, id: &str, buyer: &Keypair) -> Result<Purchase, MarketError> {
        let artifact = self
            .state
            .skills
            .get(id)
            .ok_or_else(|| MarketError::UnknownSkill(id.to_string()))?;
        let listing = self
            .state
            .listings
            .get(id)
            .ok_or_else(|| MarketError::NotListed(id.to_string()))?;
        if listing.status != ListingStatus::Active {
            return Err(MarketError::ListingNotActive(id.to_string()));
        }

        let buyer_pk = buyer.public_key_hex();
        let (balance, nonce) = {
            let ledger = self
                .ledger
                .lock()
                .map_err(|_| MarketError::LedgerUnavailable)?;
            let account = ledger
                .get_account(&buyer_pk)
                .ok_or_else(|| MarketError::UnknownBuyer(buyer_pk.clone()))?;
            (account.balance, account.next_nonce())
        };
        if balance < listing.price {
            return Err(MarketError::InsufficientBalance {
                available: balance,
                required: listing.price,
            });
        }

        let payload = TxPayload::Skill(SkillPurchaseData {
            skill_id: id.to_string(),
            manifest_hash: artifact.id.clone(),
            creator: artifact.creator.clone(),
            price: listing.price,
            created_at: artifact.created_at,
        });
        let tx = TransactionBuilder::new()
            .sender(buyer)
            .tx_type(TxType::SkillPurchase)
            .recipient(listing.seller.clone())
            .amount(listing.price)
            .nonce(nonce)
            .payload(payload)
            .build()?;

        let digest = {
            let mut ledger = self
                .ledger
                .lock()
                .map_err(|_| MarketError::LedgerUnavailable)?;
            ledger.apply_transaction(&tx)?
        };

        let purchase = Purchase {
            skill_id: id.to_string(),
            buyer: buyer_pk,
            seller: listing.seller.clone(),
            price: listing.price,
            timestamp: now_ms(),
            tx_digest: digest,
        };
        self.state
            .purchases
            .entry(id.to_string())
            .or_default()
            .push(purchase.clone());
        if let Some(listing) = self.state.listings.get_mut(id) {
            listing.sales_count += 1;
        }
        self.persist();
        debug!(%id, buyer = %purchase.buyer, price = purchase.price, "skill purchased");
        Ok(purchase)
    }

    /// Recompute the manifest hash and all file hashes; false on any
    /// mismatch
    pub fn verify_skill(&self, id: &str) -> Result<bool, MarketError> {
        let artifact = self
            .state
            .skills
            .get(id)
            .ok_or_else(|| MarketError::UnknownSkill(id.to_string()))?;
        let valid = artifact.verify();
        if !valid {
            warn!(%id, "skill failed integrity verification");
        }
        Ok(valid)
    }

    /// Leave a review. Only buyers may review; ratings are 1..=5.
    pub fn add_review(
        &mut self,
        id: &str,
        reviewer: &str,
        rating: u8,
        comment: &str,
    ) -> Result<(), MarketError> {
        if !(1..=5).contains(&rating) {
            return Err(MarketError::InvalidRating(rating));
        }

        let purchased = self
            .state
            .purchases
            .get(id)
            .map(|p| p.iter().any(|purchase| purchase.buyer == reviewer))
            .unwrap_or(false);
        if !purchased {
            return Err(MarketError::ReviewWithoutPurchase);
        }

        let listing = self
            .state
            .listings
            .get_mut(id)
            .ok_or_else(|| MarketError::NotListed(id.to_string()))?;
        listing.reviews.push(Review {
            reviewer: reviewer.to_string(),
            rating,
            comment: comment.to_string(),
            timestamp: now_ms(),
        });
        listing.refresh_rating();
        self.persist();
        Ok(())
    }

    /// Withdraw a listing; only the seller can
    pub fn delist_skill(&mut self, id: &str, seller: &str) -> Result<(), MarketError> {
        let listing = self
            .state
            .listings
            .get_mut(id)
            .ok_or_else(|| MarketError::NotListed(id.to_string()))?;
        if listing.seller != seller {
            return Err(MarketError::NotSeller);
        }
        listing.status = ListingStatus::Delisted;
        self.persist();
        Ok(())
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save_market(&self.state) {
                warn!("failed to persist market state: {e}");
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
