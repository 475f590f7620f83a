use crate::shared::Result;
use async_trait::async_trait;

/// What kind of component a generation batch describes.
///
/// The mapping service uses a different prompt for hardware descriptors
/// than for software packages, but the cache and quota paths are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Package,
    Hardware,
}

/// CPE mapping service.
///
/// Accepts a batch of component names and returns one CPE 2.3 string per
/// line, positionally paired with the input. The response is raw text;
/// parsing and validation belong to the caller. Callers must clear the
/// quota governor before issuing a call.
#[async_trait]
pub trait CpeGenerator: Send + Sync {
    async fn generate(&self, components: &[String], mode: GenerationMode) -> Result<String>;
}
