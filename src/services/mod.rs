//! Service layer: the AI service client, the contract store and the
//! analysis pipeline that connects them.

pub mod ai_client;
pub mod analysis;
pub mod store;

pub use ai_client::AiClient;
pub use store::{ContractStore, StoreError};
