pub mod api;
pub mod config;
pub mod errors;
pub mod generation_state;
pub mod ingest;
pub mod llm_providers;
pub mod logging;
pub mod models;
pub mod plan_client;
pub mod plan_schema;
pub mod session_service;

pub use config::Config;
pub use errors::*;
pub use generation_state::GenerationState;
pub use llm_providers::{
    JsonResponseParser, LLMProvider, LLMProviderFactory, LLMProviderType, StructuredRequest,
    TextGenerator,
};
pub use models::*;
pub use plan_client::PlanRequestClient;
pub use session_service::{SessionService, SubmitError};
