//! Test doubles for the model endpoint and the clock
//!
//! These are public so that integration tests and downstream crates can run
//! the full pipeline deterministically, without network access or real
//! waiting.

use crate::clock::Clock;
use crate::error::{AnalyzerError, Result};
use crate::llm::TextModel;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Virtual clock: `sleep` returns immediately and moves time forward
#[derive(Debug)]
pub struct FakeClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    /// Creates a clock starting at the current instant
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Moves time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        *lock(&self.elapsed) += duration;
    }

    /// Virtual time passed since the clock was created
    pub fn elapsed(&self) -> Duration {
        *lock(&self.elapsed)
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        lock(&self.sleeps).clone()
    }

    /// Sum of all requested sleeps
    pub fn total_slept(&self) -> Duration {
        lock(&self.sleeps).iter().sum()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        lock(&self.sleeps).push(duration);
        self.advance(duration);
    }
}

/// One scripted model behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Return this text
    Text(String),
    /// Fail with a "too many requests" error
    Throttle,
    /// Fail with a non-throttle endpoint error
    Fail(String),
    /// Panic inside the call
    Panic(String),
}

impl Reply {
    /// Shorthand for [`Reply::Text`]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// A prompt the scripted model received
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The prompt text
    pub prompt: String,
    /// When the call started, by the model's clock
    pub at: Instant,
}

type Responder = Box<dyn Fn(&str) -> Reply + Send + Sync>;

/// Model double answering from a queue or from a function of the prompt
pub struct ScriptedModel {
    queue: Mutex<VecDeque<Reply>>,
    responder: Option<Responder>,
    clock: Option<Arc<dyn Clock>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    /// Answers with `replies` in order, then fails every further call
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            queue: Mutex::new(replies.into()),
            responder: None,
            clock: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers every prompt with `responder(prompt)`, after any queued replies
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        Self {
            queue: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(responder)),
            clock: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Stamps recorded calls with `clock` instead of the wall clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.prompt.clone()).collect()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn next_reply(&self, prompt: &str) -> Reply {
        if let Some(reply) = lock(&self.queue).pop_front() {
            return reply;
        }
        match &self.responder {
            Some(responder) => responder(prompt),
            None => Reply::Fail("script exhausted".to_string()),
        }
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let at = self.clock.as_ref().map_or_else(Instant::now, |c| c.now());
        lock(&self.calls).push(RecordedCall {
            prompt: prompt.to_string(),
            at,
        });

        match self.next_reply(prompt) {
            Reply::Text(text) => Ok(text),
            Reply::Throttle => Err(AnalyzerError::RateLimitExceeded(
                "429 Too Many Requests".to_string(),
            )),
            Reply::Fail(message) => Err(AnalyzerError::LLM(message)),
            Reply::Panic(message) => panic!("{}", message),
        }
    }
}
