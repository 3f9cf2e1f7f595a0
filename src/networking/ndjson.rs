//! Newline-delimited chunk reassembly
//!
//! HTTP chunks do not respect line boundaries: one chunk may hold several
//! lines, or half of one. `LineBuffer` keeps the unterminated tail until the
//! rest arrives.

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};

#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append a chunk and return every line it completed, without terminators.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let rest = self.pending.split_off(pos + 1);
            let line = std::mem::replace(&mut self.pending, rest);
            let text = String::from_utf8_lossy(&line[..pos]);
            lines.push(text.trim_end_matches('\r').to_string());
        }
        lines
    }

    /// Whatever is left once the stream ends.
    pub fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.pending).into_owned())
        }
    }
}

/// Turn a byte-chunk stream into a line stream. Errors pass through unchanged.
pub fn lines<S, E>(chunks: S) -> BoxStream<'static, Result<String, E>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    chunks
        .scan(LineBuffer::default(), |buffer, chunk| {
            let out: Vec<Result<String, E>> = match chunk {
                Ok(bytes) => buffer.push(&bytes).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            futures::future::ready(Some(stream::iter(out)))
        })
        .flatten()
        .boxed()
}
