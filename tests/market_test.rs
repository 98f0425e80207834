use clawrrency::crypto::Keypair;
use clawrrency::economics::FeeSchedule;
use clawrrency::ledger::Ledger;
use clawrrency::market::{
    ListingStatus, MarketError, NewSkillFile, SkillArtifact, SkillDraft, SkillMarket, SkillType,
};
use clawrrency::tx::TxType;
use std::sync::{Arc, Mutex};

fn one_file_draft(name: &str, path: &str, content: &str) -> SkillDraft {
    SkillDraft {
        name: name.to_string(),
        description: "a tradable skill".to_string(),
        version: "1.0.0".to_string(),
        skill_type: SkillType::Skill,
        files: vec![NewSkillFile {
            path: path.to_string(),
            content: content.to_string(),
        }],
        dependencies: Vec::new(),
        license: "MIT".to_string(),
        entry_point: Some(path.to_string()),
    }
}

/// Creator with 0 shells, buyer with 1000
fn fixture() -> (SkillMarket, Arc<Mutex<Ledger>>, Keypair, Keypair) {
    let ledger = Arc::new(Mutex::new(Ledger::new(FeeSchedule::default())));
    let creator = Keypair::generate();
    let buyer = Keypair::generate();
    {
        let mut l = ledger.lock().unwrap();
        l.create_account(&creator.public_key_hex(), 0).unwrap();
        l.create_account(&buyer.public_key_hex(), 1000).unwrap();
    }
    let market = SkillMarket::new(Arc::clone(&ledger));
    (market, ledger, creator, buyer)
}

// ============================================================================
// FULL LIFECYCLE
// ============================================================================

/// Test: create, list, purchase, verify; tampering invalidates
#[test]
fn test_skill_lifecycle() {
    let (mut market, ledger, creator, buyer) = fixture();
    let creator_pk = creator.public_key_hex();

    let id = market
        .create_skill(one_file_draft("markdown-summarizer", "index.js", "x=1"), &creator_pk)
        .unwrap();
    market.list_skill(&id, 50, &creator_pk).unwrap();

    let purchase = market.purchase_skill(&id, &buyer).unwrap();
    assert_eq!(purchase.price, 50);
    assert_eq!(purchase.seller, creator_pk);

    {
        let l = ledger.lock().unwrap();
        assert_eq!(l.get_balance(&buyer.public_key_hex()), 949);
        assert_eq!(l.get_balance(&creator_pk), 50);

        // The purchase is pinned to a real skill_purchase transaction.
        let stored = l.get_transaction_by_hash(&purchase.tx_digest).unwrap();
        assert_eq!(stored.transaction.tx_type, TxType::SkillPurchase);
        assert_eq!(stored.transaction.amount, 50);
    }

    assert!(market.verify_skill(&id).unwrap());

    // Tampering with the stored content breaks verification.
    let mut tampered: SkillArtifact = market.get_skill(&id).unwrap().clone();
    tampered.files[0].content = "x=2".to_string();
    assert!(!tampered.verify());
}

/// Test: the purchase payload carries the artifact's identity
#[test]
fn test_purchase_payload_binds_artifact() {
    let (mut market, ledger, creator, buyer) = fixture();
    let creator_pk = creator.public_key_hex();

    let id = market
        .create_skill(one_file_draft("echo", "main.js", "say()"), &creator_pk)
        .unwrap();
    market.list_skill(&id, 10, &creator_pk).unwrap();
    let purchase = market.purchase_skill(&id, &buyer).unwrap();

    let l = ledger.lock().unwrap();
    let stored = l.get_transaction_by_hash(&purchase.tx_digest).unwrap();
    let json = serde_json::to_value(&stored.transaction).unwrap();
    assert_eq!(json["data"]["skill_id"], id);
    assert_eq!(json["data"]["creator"], creator_pk);
    assert_eq!(json["data"]["price"], 10);
}

// ============================================================================
// GUARDS
// ============================================================================

#[test]
fn test_buyer_needs_funds() {
    let (mut market, ledger, creator, _) = fixture();
    let creator_pk = creator.public_key_hex();
    let broke = Keypair::generate();
    ledger
        .lock()
        .unwrap()
        .create_account(&broke.public_key_hex(), 5)
        .unwrap();

    let id = market
        .create_skill(one_file_draft("pricey", "a.js", "1"), &creator_pk)
        .unwrap();
    market.list_skill(&id, 50, &creator_pk).unwrap();

    let err = market.purchase_skill(&id, &broke).unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
    assert!(market.purchases_of(&id).is_empty());
}

#[test]
fn test_unlisted_skill_cannot_be_bought() {
    let (mut market, _, creator, buyer) = fixture();
    let id = market
        .create_skill(one_file_draft("quiet", "a.js", "1"), &creator.public_key_hex())
        .unwrap();
    let err = market.purchase_skill(&id, &buyer).unwrap_err();
    assert!(matches!(err, MarketError::NotListed(_)));
}

#[test]
fn test_repeat_sales_count() {
    let (mut market, ledger, creator, buyer) = fixture();
    let creator_pk = creator.public_key_hex();
    let second = Keypair::generate();
    ledger
        .lock()
        .unwrap()
        .create_account(&second.public_key_hex(), 100)
        .unwrap();

    let id = market
        .create_skill(one_file_draft("popular", "a.js", "1"), &creator_pk)
        .unwrap();
    market.list_skill(&id, 10, &creator_pk).unwrap();

    market.purchase_skill(&id, &buyer).unwrap();
    market.purchase_skill(&id, &second).unwrap();

    let listing = market.get_listing(&id).unwrap();
    assert_eq!(listing.sales_count, 2);
    assert_eq!(listing.status, ListingStatus::Active);
    assert_eq!(market.purchases_of(&id).len(), 2);
}

// ============================================================================
// REVIEWS
// ============================================================================

#[test]
fn test_reviews_average_and_gate() {
    let (mut market, ledger, creator, buyer) = fixture();
    let creator_pk = creator.public_key_hex();
    let second = Keypair::generate();
    ledger
        .lock()
        .unwrap()
        .create_account(&second.public_key_hex(), 100)
        .unwrap();

    let id = market
        .create_skill(one_file_draft("rated", "a.js", "1"), &creator_pk)
        .unwrap();
    market.list_skill(&id, 10, &creator_pk).unwrap();
    market.purchase_skill(&id, &buyer).unwrap();
    market.purchase_skill(&id, &second).unwrap();

    market
        .add_review(&id, &buyer.public_key_hex(), 5, "excellent")
        .unwrap();
    market
        .add_review(&id, &second.public_key_hex(), 2, "meh")
        .unwrap();

    let listing = market.get_listing(&id).unwrap();
    assert_eq!(listing.reviews.len(), 2);
    assert!((listing.rating - 3.5).abs() < f64::EPSILON);

    // Ratings outside 1..=5 are rejected outright.
    for bad in [0u8, 6] {
        let err = market
            .add_review(&id, &buyer.public_key_hex(), bad, "")
            .unwrap_err();
        assert!(matches!(err, MarketError::InvalidRating(_)));
    }
}
