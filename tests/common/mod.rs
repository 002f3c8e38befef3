#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use study_planner::{StructuredRequest, TextGenerator};

/// What the fake generator answers with
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Empty,
    Fail(String),
}

/// In-process stand-in for a hosted model. Records every request it receives
/// and can be held back until the test releases it.
pub struct FakeGenerator {
    reply: Reply,
    requests: Mutex<Vec<StructuredRequest>>,
    gate: Option<Arc<Notify>>,
}

impl FakeGenerator {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
            gate: None,
        })
    }

    pub fn gated(reply: Reply, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
            gate: Some(gate),
        })
    }

    pub fn replying_with_plan(days: u32) -> Arc<Self> {
        Self::new(Reply::Text(plan_json(days).to_string()))
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<StructuredRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate_text(&self, request: &StructuredRequest) -> Result<Option<String>> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.reply {
            Reply::Text(text) => Ok(Some(text.clone())),
            Reply::Empty => Ok(None),
            Reply::Fail(message) => Err(anyhow!("{}", message)),
        }
    }

    fn provider_name(&self) -> &str {
        "Fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

/// A well-formed plan reply with `days` sequential days
pub fn plan_json(days: u32) -> Value {
    let schedule: Vec<Value> = (1..=days)
        .map(|day| {
            json!({
                "day": day,
                "topic": format!("Chapter {}", day),
                "summary": format!("Key ideas of chapter {}.", day),
                "flashcards": [
                    { "front": "What is a cell?", "back": "The basic unit of life." },
                    { "front": "What is a tissue?", "back": "A group of similar cells." },
                    { "front": "What is an organ?", "back": "A group of tissues with one function." }
                ],
                "quiz": [
                    {
                        "question": "Which is the smallest unit of life?",
                        "options": ["Organ", "Cell", "Tissue", "System"],
                        "correctAnswerIndex": 1
                    }
                ]
            })
        })
        .collect();

    json!({
        "planName": "Biology Basics",
        "totalDays": days,
        "schedule": schedule
    })
}
