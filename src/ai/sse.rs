//! Server-sent event decoding and data-stream encoding.
//!
//! The LLM replies with an SSE stream of chat-completion chunks. Clients of
//! `/api/chat` expect a line-oriented data stream instead:
//!
//! ```text
//! 0:"text delta"\n
//! 3:"error message"\n
//! d:{"finishReason":"stop"}\n
//! ```

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;

use crate::ai::AiError;

/// Incremental SSE parser. Feed raw bytes, get back each event's `data`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return the data of every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, separator)) = find_boundary(&self.buffer) {
            let raw: Vec<u8> = self.buffer.drain(..end + separator).collect();
            let text = String::from_utf8_lossy(&raw[..end]);
            if let Some(data) = event_data(&text) {
                events.push(data);
            }
        }
        events
    }
}

fn find_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    (0..buf.len()).find_map(|i| {
        if buf[i..].starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else if buf[i..].starts_with(b"\n\n") {
            Some((i, 2))
        } else {
            None
        }
    })
}

fn event_data(event: &str) -> Option<String> {
    let lines: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    message: String,
}

/// One decoded completion event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEvent {
    Delta(String),
    Done,
}

/// Decode the `data` of one SSE event.
pub fn parse_event(data: &str) -> Result<CompletionEvent, AiError> {
    if data.trim() == "[DONE]" {
        return Ok(CompletionEvent::Done);
    }
    let chunk: CompletionChunk =
        serde_json::from_str(data).map_err(|e| AiError::Decode(e.to_string()))?;
    if let Some(error) = chunk.error {
        return Err(AiError::Stream(error.message));
    }
    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .collect();
    Ok(CompletionEvent::Delta(text))
}

pub fn encode_text(text: &str) -> String {
    format!("0:{}\n", Value::from(text))
}

pub fn encode_error(message: &str) -> String {
    format!("3:{}\n", Value::from(message))
}

pub fn encode_finish() -> String {
    "d:{\"finishReason\":\"stop\"}\n".to_string()
}

struct DataStream<S> {
    upstream: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl<S> DataStream<S> {
    fn absorb(&mut self, chunk: &[u8]) {
        for data in self.decoder.push(chunk) {
            match parse_event(&data) {
                Ok(CompletionEvent::Delta(text)) if text.is_empty() => {}
                Ok(CompletionEvent::Delta(text)) => self.pending.push_back(encode_text(&text)),
                Ok(CompletionEvent::Done) => {
                    self.finish();
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Chat stream error");
                    self.pending.push_back(encode_error(&e.to_string()));
                    self.finished = true;
                    return;
                }
            }
        }
    }

    fn finish(&mut self) {
        self.pending.push_back(encode_finish());
        self.finished = true;
    }
}

/// Re-encode an SSE completion byte stream as data-stream lines.
///
/// Ends after `[DONE]`, after the first error, or when `upstream` ends.
pub fn data_stream<S, B, E>(upstream: S) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let state = DataStream {
        upstream: Box::pin(upstream),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.pending.pop_front() {
                return Some((line, state));
            }
            if state.finished {
                return None;
            }
            match state.upstream.next().await {
                Some(Ok(chunk)) => state.absorb(chunk.as_ref()),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Chat upstream read failed");
                    state.pending.push_back(encode_error(&e.to_string()));
                    state.finished = true;
                }
                None => state.finish(),
            }
        }
    })
}
