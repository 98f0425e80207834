// Transaction module - the signed value-transfer record

mod builder;
mod codec;
mod model;
mod validator;

pub use builder::{BuildError, TransactionBuilder};
pub use codec::{CodecError, TxCodec};
pub use model::{
    GovernanceData, SkillPurchaseData, Transaction, TxPayload, TxType, MAX_SAFE_AMOUNT,
    TX_VERSION,
};
pub use validator::{TxValidator, ValidationError};
