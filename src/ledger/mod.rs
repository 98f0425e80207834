// Ledger module - THE AUTHORITATIVE STATE
// Accounts, balances, nonces, and the transaction application path

mod account;
mod engine;
mod state;

pub use account::Account;
pub use engine::{Ledger, LedgerError};
pub use state::{LedgerState, StoredTransaction, LEDGER_STATE_VERSION};
