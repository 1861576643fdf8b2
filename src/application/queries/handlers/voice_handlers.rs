//! Voice Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{SpeechSynthesizerPort, Voice};
use crate::application::queries::ListVoices;

/// ListVoices Handler
pub struct ListVoicesHandler {
    synthesizer: Arc<dyn SpeechSynthesizerPort>,
}

impl ListVoicesHandler {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizerPort>) -> Self {
        Self { synthesizer }
    }

    pub async fn handle(&self, query: ListVoices) -> Result<Vec<Voice>, ApplicationError> {
        let api_key = query.api_key.trim();
        if api_key.is_empty() {
            return Err(ApplicationError::validation("API key is required"));
        }
        Ok(self.synthesizer.list_voices(api_key).await?)
    }
}
