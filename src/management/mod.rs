mod auth;
mod ledger;

pub use auth::TokenManager;
pub use ledger::LedgerEntry;
pub use ledger::ReviewLedger;
