use std::sync::Arc;

use crate::config::GenerativeProviderConfig;
use crate::error::ProviderError;
use crate::providers::{GeminiGenerativeProvider, OpenAiCompatibleGenerativeProvider};
use crate::traits::GenerativeProvider;

pub fn build_generative_provider(
    cfg: GenerativeProviderConfig,
) -> Result<Arc<dyn GenerativeProvider>, ProviderError> {
    match cfg {
        GenerativeProviderConfig::Gemini(c) => Ok(Arc::new(GeminiGenerativeProvider::new(c)?)),
        GenerativeProviderConfig::OpenAiCompatible(c) => {
            Ok(Arc::new(OpenAiCompatibleGenerativeProvider::new(c)?))
        }
    }
}
