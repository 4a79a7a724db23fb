use helix_core::config::LlmSettings;
use helix_core::traits::LanguageModel;
use helix_core::{Document, Error, Response, Result, SearchMethod};
use tracing::{debug, info};

use crate::prompt::PromptBuilder;

/// Turns retrieved documents into an answer with one language-model call.
pub struct ResponseSynthesizer {
    model: Box<dyn LanguageModel>,
    max_tokens: usize,
    temperature: f32,
}

impl ResponseSynthesizer {
    pub fn new(model: Box<dyn LanguageModel>, settings: &LlmSettings) -> Self {
        Self { model, max_tokens: settings.max_tokens, temperature: settings.temperature }
    }

    pub fn synthesize(
        &self,
        query: &str,
        docs: Vec<Document>,
        confidence: f32,
        method: SearchMethod,
        policy_context: &str,
    ) -> Result<Response> {
        let prompt = PromptBuilder::hr_query_prompt(query, &docs, policy_context);
        debug!(prompt_chars = prompt.len(), sources = docs.len(), "generating answer");
        let answer = self
            .model
            .generate(&prompt, self.max_tokens, self.temperature)
            .map_err(|e| Error::backend("language model", e))?;
        info!(%method, confidence, sources = docs.len(), "answer generated");
        Ok(Response::new(answer, docs, confidence, method))
    }
}
