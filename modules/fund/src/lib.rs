//! Fund Module for HEALCHAIN
//!
//! Record handlers for medical crowdfunding:
//! - User registration, credentials and balances
//! - Raise projects and medical bills
//! - Donations with an append-only transaction trail
//! - Examination (audit) logs
//! - Milestone and NFT certificate metadata
//! - Name-based invocation dispatch and genesis seeding

pub mod record;
pub mod ledger;
pub mod project;
pub mod donation;
pub mod examine;
pub mod nft;
pub mod history;
pub mod contract;
pub mod genesis;

pub use record::*;
pub use ledger::*;
pub use project::*;
pub use donation::*;
pub use history::*;
pub use contract::*;
pub use genesis::*;
