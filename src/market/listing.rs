use serde::{Deserialize, Serialize};

/// Lifecycle of a listing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Sold,
    Delisted,
}

/// A buyer's review of a purchased skill
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer: String,
    pub rating: u8,
    pub comment: String,
    pub timestamp: u64,
}

/// A skill offered for sale
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub skill_id: String,
    pub seller: String,
    pub price: u64,
    pub listed_at: u64,
    pub status: ListingStatus,
    pub sales_count: u64,
    pub rating: f64,
    pub reviews: Vec<Review>,
}

impl Listing {
    pub fn new(skill_id: String, seller: String, price: u64, listed_at: u64) -> Self {
        Self {
            skill_id,
            seller,
            price,
            listed_at,
            status: ListingStatus::Active,
            sales_count: 0,
            rating: 0.0,
            reviews: Vec::new(),
        }
    }

    /// Recompute the aggregate rating as the arithmetic mean
    pub fn refresh_rating(&mut self) {
        if self.reviews.is_empty() {
            self.rating = 0.0;
        } else {
            let sum: u64 = self.reviews.iter().map(|r| r.rating as u64).sum();
            self.rating = sum as f64 / self.reviews.len() as f64;
        }
    }
}

/// A completed purchase, tied to the value-moving transaction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub skill_id: String,
    pub buyer: String,
    pub seller: String,
    pub price: u64,
    pub timestamp: u64,
    pub tx_digest: String,
}
