//! Counting test doubles for the extractor collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use racecal_core::error::ExtractError;
use racecal_core::generative::Generator;
use racecal_core::sources::{CaptureTarget, CapturedResponse, FetchedPage, NetworkCapture, PageFetcher};
use racecal_core::ProgressObserver;

/// Serves canned pages by exact URL; unknown URLs are unreachable.
#[derive(Default)]
pub struct MapFetcher {
    pages: HashMap<String, FetchedPage>,
    calls: Mutex<Vec<String>>,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), FetchedPage::new(body, 200));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), FetchedPage::new("", status));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl PageFetcher for MapFetcher {
    async fn fetch(&self, url: &str, _verify_tls: bool) -> Result<FetchedPage, ExtractError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ExtractError::unreachable(url, "connection refused"))
    }
}

/// One recorded capture call.
#[derive(Debug, Clone)]
pub struct CaptureCall {
    pub url: String,
    pub patterns: Vec<String>,
    pub had_content: bool,
    pub verify_tls: bool,
}

/// Returns canned captured responses by page URL and records each call.
#[derive(Default)]
pub struct MapCapture {
    responses: HashMap<String, Vec<CapturedResponse>>,
    calls: Mutex<Vec<CaptureCall>>,
}

impl MapCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, page_url: &str, endpoint: &str, body: &str) -> Self {
        self.responses
            .entry(page_url.to_string())
            .or_default()
            .push(CapturedResponse::new(endpoint, body));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn patterns_for(&self, page_url: &str) -> Option<Vec<String>> {
        self.call_for(page_url).map(|call| call.patterns)
    }

    pub fn call_for(&self, page_url: &str) -> Option<CaptureCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|call| call.url == page_url)
            .cloned()
    }
}

#[async_trait]
impl NetworkCapture for MapCapture {
    async fn capture(
        &self,
        target: CaptureTarget<'_>,
        patterns: &[String],
        _limit: Duration,
    ) -> Vec<CapturedResponse> {
        self.calls.lock().unwrap().push(CaptureCall {
            url: target.url.to_string(),
            patterns: patterns.to_vec(),
            had_content: target.content.is_some(),
            verify_tls: target.verify_tls,
        });
        self.responses.get(target.url).cloned().unwrap_or_default()
    }
}

/// Replies with the first rule whose needle appears in the prompt.
#[derive(Default)]
pub struct ScriptedGenerator {
    rules: Vec<(String, String)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_when(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), reply.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ExtractError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .ok_or_else(|| ExtractError::unreachable("scripted", "no reply for prompt"))
    }
}

/// Collects progress lines.
#[derive(Default)]
pub struct RecordingProgress {
    lines: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl ProgressObserver for RecordingProgress {
    fn on_progress(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}
