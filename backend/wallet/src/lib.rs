//! Dual-bucket credit wallet: atomic unlock, refill policies, and the
//! founders-slot claim. Every mutating entry point here is meant to be
//! called from inside `flx_store::Store::write_tx` so the whole operation
//! shares one `BEGIN IMMEDIATE` transaction with the lead store.

pub mod error;
pub mod founders;
pub mod refill;
pub mod unlock;
pub mod wallet;

pub use error::{WalletError, WalletResult};
pub use unlock::{unlock, UnlockOutcome};
pub use wallet::Wallet;
