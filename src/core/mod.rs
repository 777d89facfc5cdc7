// Core byte-level building blocks: hashes, Base58Check, scripts, transactions

mod types;
mod transaction;
mod serialize;
mod hash;
pub mod base58;
pub mod script;

pub use types::*;
pub use transaction::*;
pub use serialize::*;
pub use hash::*;
pub use script::Script;
