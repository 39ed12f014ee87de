//! Extraction client answering from a script

use async_trait::async_trait;
use racesheet_ingest::services::{ExtractionClient, ExtractionFailure, ImagePayload, Instruction};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued answers in order and records every instruction received
#[derive(Default)]
pub struct ScriptedClient {
    answers: Mutex<VecDeque<Result<String, ExtractionFailure>>>,
    calls: Mutex<Vec<Instruction>>,
}

#[allow(dead_code)]
impl ScriptedClient {
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ExtractionFailure>>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Instruction> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ExtractionClient for ScriptedClient {
    async fn extract(
        &self,
        _image: &ImagePayload,
        instruction: &Instruction,
    ) -> Result<String, ExtractionFailure> {
        self.calls.lock().unwrap().push(instruction.clone());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExtractionFailure::Other("script exhausted".to_string())))
    }
}

#[allow(dead_code)]
pub fn screenshot() -> ImagePayload {
    ImagePayload::new("screenshot.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47])
}
