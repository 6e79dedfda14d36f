//! # Stage Event Replay
//!
//! Feeds `<type> <json>` lines into a stage queue. Blank lines and lines
//! starting with `#` are skipped.
//!
//! ```text
//! cal {"hash":"ab12","hashId":"...","aggregationFragment":[...],...}
//! btc {"hash":"ab12","hashId":"...",...}
//! ```

use proof_bus::InMemoryStageQueue;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

/// A line that could not be split into type and payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Line {line}: expected `<type> <json>`")]
pub struct ReplayLineError {
    pub line: usize,
}

/// Split one replay line.
///
/// Returns `Ok(None)` for lines that carry no event.
pub fn parse_line(line: usize, text: &str) -> Result<Option<(&str, &str)>, ReplayLineError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    match text.split_once(char::is_whitespace) {
        Some((message_type, payload)) if !payload.trim().is_empty() => {
            Ok(Some((message_type, payload.trim())))
        }
        _ => Err(ReplayLineError { line }),
    }
}

/// Counters for one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub published: usize,
    pub skipped: usize,
}

/// Publish every event line from `reader` onto `queue`.
///
/// Does not close the queue; the caller decides when input is finished.
pub async fn replay<R>(reader: R, queue: &InMemoryStageQueue) -> std::io::Result<ReplayStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = ReplayStats::default();
    let mut number = 0;

    while let Some(text) = lines.next_line().await? {
        number += 1;
        match parse_line(number, &text) {
            Ok(Some((message_type, payload))) => {
                queue.publish(message_type, payload);
                stats.published += 1;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Replay line skipped");
                stats.skipped += 1;
            }
        }
    }
    Ok(stats)
}
