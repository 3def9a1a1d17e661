//! Transaction assembly, signing, broadcast and confirmation

mod confirmation;
mod gas;
mod sender;

pub use confirmation::{ConfirmationWatcher, PollPolicy};
pub use gas::GasEstimator;
pub use sender::{MintRequest, TransactionSender};
