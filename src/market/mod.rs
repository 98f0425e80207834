// Market module - content-addressed skill artifacts and trade

mod listing;
mod market;
mod skill;

pub use listing::{Listing, ListingStatus, Purchase, Review};
pub use market::{MarketError, MarketState, SkillMarket, MARKET_STATE_VERSION};
pub use skill::{ManifestFile, NewSkillFile, SkillArtifact, SkillDraft, SkillFile, SkillManifest, SkillType};
