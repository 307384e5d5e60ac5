mod gemini;
mod openai_compatible;

pub use gemini::GeminiGenerativeProvider;
pub use openai_compatible::OpenAiCompatibleGenerativeProvider;
