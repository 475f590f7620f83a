/// Network adapters for the external services
pub mod gemini_client;
pub mod nvd_client;

pub use gemini_client::GeminiClient;
pub use nvd_client::NvdClient;
