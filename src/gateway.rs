//! Passerelle vers le fournisseur d'IA générative.
//! Contient le client HTTP, la politique de réessai, les prompts et les
//! opérations médicales exposées au backend.
pub mod assistant;
pub mod prompts;
pub mod provider;
pub mod retry;

pub use assistant::AiGateway;
pub use provider::{GeminiClient, GenerateRequest, Part, ProviderError, TextModel};
pub use retry::RetryPolicy;
