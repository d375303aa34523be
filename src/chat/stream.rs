//! Pull-based iteration over a streamed chat completion.

use futures::StreamExt;

use crate::chat::response::ChatChunk;
use crate::error::{Error, Result};
use crate::transport::SseStream;

/// Iterator over the chunks of one streaming request.
///
/// Drive it with [`ChatStream::next`]; each `true` makes the freshly decoded
/// chunk available through [`ChatStream::current`]. After `next` returns
/// `false`, [`ChatStream::err`] distinguishes normal completion (`None`) from
/// a failure, and keeps returning that same failure on every later call.
pub struct ChatStream {
    events: Option<SseStream>,
    current: Option<ChatChunk>,
    error: Option<Error>,
    done: bool,
}

impl ChatStream {
    pub(crate) fn new(events: SseStream) -> Self {
        Self {
            events: Some(events),
            current: None,
            error: None,
            done: false,
        }
    }

    /// Advances to the next chunk. Returns `false` once the stream is
    /// exhausted, closed, or failed; failures are sticky.
    pub async fn next(&mut self) -> bool {
        if self.done || self.error.is_some() {
            return false;
        }
        let Some(events) = self.events.as_mut() else {
            self.done = true;
            return false;
        };

        loop {
            match events.next().await {
                None => {
                    self.done = true;
                    self.current = None;
                    return false;
                }
                Some(Err(error)) => {
                    self.error = Some(error);
                    self.current = None;
                    return false;
                }
                Some(Ok(event)) => {
                    let data = event.data.trim();
                    if data == "[DONE]" {
                        self.done = true;
                        self.current = None;
                        return false;
                    }
                    // Keep-alive events carry no payload.
                    if data.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ChatChunk>(data) {
                        Ok(chunk) => {
                            self.current = Some(chunk);
                            return true;
                        }
                        Err(error) => {
                            self.error = Some(Error::parsing(format!(
                                "failed to decode stream chunk: {error}"
                            )));
                            self.current = None;
                            return false;
                        }
                    }
                }
            }
        }
    }

    /// The most recently decoded chunk, if any.
    pub fn current(&self) -> Option<&ChatChunk> {
        self.current.as_ref()
    }

    /// The failure that terminated the stream, if one did. Stable across
    /// repeated calls.
    pub fn err(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Releases the underlying connection. Safe to call more than once.
    pub fn close(&mut self) {
        self.events = None;
        self.done = true;
    }

    /// Drains the remaining chunks and concatenates their content deltas.
    pub async fn collect_content(&mut self) -> Result<String> {
        let mut content = String::new();
        while self.next().await {
            if let Some(chunk) = self.current() {
                content.push_str(chunk.content());
            }
        }
        match self.error.as_ref() {
            // The stored error stays behind so err() keeps reporting it.
            Some(error) => {
                let mut copy = Error::new(error.kind(), error.message());
                if let Some(status) = error.status_code() {
                    copy = copy.with_status(status);
                }
                Err(copy)
            }
            None => Ok(content),
        }
    }
}
