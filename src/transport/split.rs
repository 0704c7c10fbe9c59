//! Sending text that exceeds the single-message limit.

use teloxide::types::{ChatId, MessageId};
use tokio::time::sleep;
use tracing::warn;

use super::{Transport, TransportError};

/// Split `text` into consecutive chunks of at most `max_len` UTF-16 code
/// units, the unit Telegram measures messages in.
///
/// Splits on character boundaries only; words may be cut.
pub fn split_chunks(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut units = 0;

    for c in text.chars() {
        let width = c.len_utf16();
        if units + width > max_len && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            units = 0;
        }
        current.push(c);
        units += width;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Send `text` as ordered chunks; only the first chunk replies to `reply_to`.
///
/// A flood-control signal on a chunk is honored once: wait the requested
/// time, resend that chunk, and give up if it fails again.
pub async fn send_long<T: Transport + ?Sized>(
    transport: &T,
    chat_id: ChatId,
    text: &str,
    reply_to: Option<MessageId>,
    max_len: usize,
) -> Result<usize, TransportError> {
    let chunks = split_chunks(text, max_len);

    for (i, chunk) in chunks.iter().enumerate() {
        let reply_to = if i == 0 { reply_to } else { None };

        match transport.send_text(chat_id, chunk, reply_to).await {
            Ok(()) => {}
            Err(TransportError::RetryAfter(wait)) => {
                warn!(
                    "Flood control on chunk {}/{} in chat {}, retrying after {:?}",
                    i + 1,
                    chunks.len(),
                    chat_id.0,
                    wait
                );
                sleep(wait).await;
                transport.send_text(chat_id, chunk, reply_to).await?;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(chunks.len())
}
