//! Outbound ports - Interfaces that the application requires from external systems

mod character_store_port;
mod llm_port;

pub use character_store_port::{CharacterStorePort, StoreError};
pub use llm_port::{LlmError, LlmPort};
