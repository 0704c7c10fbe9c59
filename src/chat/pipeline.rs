//! Per-message chat pipeline.
//!
//! Each routed message walks `received → reacted → typing → api-called →
//! formatted → replied`, or stops at `failed`. Decorations and the typing
//! indicator are best effort; an API failure ends the message with a formatted
//! apology. Nothing here returns an error to the caller.

use std::sync::Arc;
use std::time::Duration;

use teloxide::types::{ChatId, MessageId};
use tracing::{debug, error, info, warn};

use super::feedback::{FeedbackAction, FeedbackQuery};
use super::message::{IncomingMessage, strip_mention};
use crate::api::GenerativeApi;
use crate::cache::{CacheConfig, TypedCache};
use crate::limiter::RateLimiter;
use crate::reactions::{Decoration, Decorator};
use crate::text::{Formatter, LengthPolicy, utf16_len};
use crate::transport::{self, OutboundReply, Transport};

/// Sent when the API call itself fails.
pub const ERROR_TEXT: &str = "An error occurred. Please try again later.";
/// Sent when the API answered without usable text.
pub const RETRY_TEXT: &str = "Sorry sir! Please try again";

/// Pipeline stage, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Reacted,
    TypingSignaled,
    ApiCalled,
    Formatted,
    Replied,
    Failed,
}

/// Why a message ended without a generated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Nothing left to ask after stripping the mention.
    EmptyPrompt,
    /// The API call failed.
    Api,
    /// The API answered without result text.
    EmptyResult,
    /// The reply could not be delivered.
    Delivery,
}

/// Final state of one processed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A generated reply was delivered.
    Replied { photo: bool, chunks: usize },
    /// Processing stopped; an apology was sent unless delivery itself failed.
    Failed(Failure),
}

/// Pipeline knobs that are not owned by a component.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Bot username without `@`.
    pub bot_username: String,
    pub feedback_buttons: bool,
    /// Pause before decorating an incoming message.
    pub reaction_delay: Duration,
    /// Single-message limit in UTF-16 code units.
    pub max_message_length: usize,
}

/// Routes messages through reaction, API call, formatting and reply.
pub struct ChatPipeline<T, A> {
    transport: Arc<T>,
    api: Arc<A>,
    limiter: RateLimiter,
    formatter: Formatter,
    decorator: Decorator,
    /// Bot replies whose feedback keyboard was already used.
    answered: TypedCache<(i64, i32), ()>,
    options: PipelineOptions,
}

impl<T: Transport, A: GenerativeApi> ChatPipeline<T, A> {
    pub fn new(
        transport: Arc<T>,
        api: Arc<A>,
        limiter: RateLimiter,
        formatter: Formatter,
        decorator: Decorator,
        options: PipelineOptions,
    ) -> Self {
        Self {
            transport,
            api,
            limiter,
            formatter,
            decorator,
            answered: TypedCache::new("feedback_ledger", CacheConfig::feedback_ledger()),
            options,
        }
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    pub fn bot_username(&self) -> &str {
        &self.options.bot_username
    }

    /// Full treatment for a freshly routed message.
    pub async fn handle(&self, msg: &IncomingMessage, prompt: &str) -> Outcome {
        debug!(
            "[{:?}] chat={} message={} sender={:?}",
            Stage::Received,
            msg.chat_id.0,
            msg.message_id.0,
            msg.sender_id
        );

        self.decorate(msg).await;
        debug!("[{:?}] message={}", Stage::Reacted, msg.message_id.0);

        self.respond(msg, prompt).await
    }

    /// Best-effort reaction or sticker.
    async fn decorate(&self, msg: &IncomingMessage) {
        if !self.options.reaction_delay.is_zero() {
            tokio::time::sleep(self.options.reaction_delay).await;
        }

        let result = match self.decorator.pick_reaction_or_sticker() {
            Decoration::Reaction(emoji) => {
                self.transport
                    .send_reaction(msg.chat_id, msg.message_id, emoji)
                    .await
            }
            Decoration::Sticker(file_id) => {
                self.transport
                    .send_sticker(msg.chat_id, &file_id, Some(msg.message_id))
                    .await
            }
        };

        if let Err(e) = result {
            warn!("Failed to decorate message {}: {}", msg.message_id.0, e);
        }
    }

    /// Everything after the decoration: typing, API call, formatting, reply.
    async fn respond(&self, msg: &IncomingMessage, prompt: &str) -> Outcome {
        if let Err(e) = self.transport.send_typing(msg.chat_id).await {
            warn!("Failed to send typing action to chat {}: {}", msg.chat_id.0, e);
        }
        debug!("[{:?}] chat={}", Stage::TypingSignaled, msg.chat_id.0);

        let prompt = prompt.trim();
        if prompt.is_empty() {
            return self.apologize(msg, RETRY_TEXT, Failure::EmptyPrompt).await;
        }

        let waited = self.limiter.acquire().await;
        if !waited.is_zero() {
            debug!("Rate limited for {:?} before API call", waited);
        }

        let response = match self.api.generate(prompt).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error processing message {}: {}", msg.message_id.0, e);
                return self.apologize(msg, ERROR_TEXT, Failure::Api).await;
            }
        };
        debug!("[{:?}] message={}", Stage::ApiCalled, msg.message_id.0);

        let Some(text) = response.usable_text() else {
            warn!("API returned no text for message {}", msg.message_id.0);
            return self.apologize(msg, RETRY_TEXT, Failure::EmptyResult).await;
        };

        let photo = response.image_url.is_some();
        let split = self.formatter.length_policy() == LengthPolicy::Split;
        let max_len = self.options.max_message_length;

        let body = if photo {
            // Captions cannot be split and have a lower limit.
            self.formatter.render_within(text, max_len.min(transport::MAX_CAPTION_LENGTH))
        } else if split {
            self.formatter.render(text)
        } else {
            self.formatter.render_within(text, max_len)
        };
        debug!("[{:?}] {} units", Stage::Formatted, utf16_len(&body));

        let oversized = utf16_len(&body) > max_len;

        let delivered = if !photo && oversized && split {
            transport::send_long(
                self.transport.as_ref(),
                msg.chat_id,
                &body,
                Some(msg.message_id),
                self.options.max_message_length,
            )
            .await
        } else {
            let reply = OutboundReply {
                text: body,
                image_url: response.image_url,
                reply_to: Some(msg.message_id),
                feedback: self.options.feedback_buttons,
            };
            self.transport.send_reply(msg.chat_id, &reply).await.map(|()| 1)
        };

        match delivered {
            Ok(chunks) => {
                debug!("[{:?}] message={}", Stage::Replied, msg.message_id.0);
                Outcome::Replied { photo, chunks }
            }
            Err(e) => {
                error!("Failed to deliver reply to message {}: {}", msg.message_id.0, e);
                debug!("[{:?}] message={}", Stage::Failed, msg.message_id.0);
                Outcome::Failed(Failure::Delivery)
            }
        }
    }

    /// Send a formatted apology and report `failure`.
    async fn apologize(&self, msg: &IncomingMessage, text: &str, failure: Failure) -> Outcome {
        debug!("[{:?}] message={} ({:?})", Stage::Failed, msg.message_id.0, failure);

        let reply = OutboundReply::text(self.formatter.format(text), msg.message_id);
        match self.transport.send_reply(msg.chat_id, &reply).await {
            Ok(()) => Outcome::Failed(failure),
            Err(e) => {
                error!("Failed to send apology to chat {}: {}", msg.chat_id.0, e);
                Outcome::Failed(Failure::Delivery)
            }
        }
    }

    /// Handle a pressed feedback button.
    ///
    /// Each bot reply accepts one activation; later presses are only
    /// acknowledged. The keyboard is removed before regenerating. Returns the
    /// outcome of a regeneration, if one ran.
    pub async fn handle_feedback(
        &self,
        action: FeedbackAction,
        query: FeedbackQuery,
    ) -> Option<Outcome> {
        let Some((chat_id, message_id)) = query.target else {
            self.acknowledge(&query.callback_id, None).await;
            return None;
        };

        if !self.claim(chat_id, message_id) {
            debug!("Feedback on message {} already handled", message_id.0);
            self.acknowledge(&query.callback_id, None).await;
            return None;
        }

        info!("Feedback {:?} on message {} in chat {}", action, message_id.0, chat_id.0);
        self.acknowledge(&query.callback_id, action.acknowledgement()).await;

        if let Err(e) = self.transport.clear_reply_markup(chat_id, message_id).await {
            warn!("Failed to remove feedback keyboard from {}: {}", message_id.0, e);
        }

        if action != FeedbackAction::Regenerate {
            return None;
        }

        let Some(original) = query.original else {
            warn!("Regenerate requested but original message is gone");
            return None;
        };
        let prompt = original
            .text
            .as_deref()
            .map(|text| strip_mention(text, &self.options.bot_username))
            .unwrap_or_default();

        Some(self.respond(&original, &prompt).await)
    }

    fn claim(&self, chat_id: ChatId, message_id: MessageId) -> bool {
        self.answered.insert_if_absent((chat_id.0, message_id.0), ())
    }

    async fn acknowledge(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.transport.answer_callback(callback_id, text).await {
            warn!("Failed to answer callback query: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use url::Url;

    use super::*;
    use crate::api::{ApiError, ApiResponse};
    use crate::chat::message::fixtures::{self, BOT};
    use crate::text::FontStyle;
    use crate::transport::testing::{RecordingTransport, Sent};

    /// API double answering every call with the same scripted result.
    struct ScriptedApi {
        answer: Box<dyn Fn() -> Result<ApiResponse, ApiError> + Send + Sync>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn new(answer: impl Fn() -> Result<ApiResponse, ApiError> + Send + Sync + 'static) -> Self {
            Self {
                answer: Box::new(answer),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn text(text: &'static str) -> Self {
            Self::new(move || {
                Ok(ApiResponse {
                    results: Some(text.to_string()),
                    image_url: None,
                })
            })
        }
    }

    #[async_trait]
    impl GenerativeApi for ScriptedApi {
        async fn generate(&self, prompt: &str) -> Result<ApiResponse, ApiError> {
            self.prompts.lock().push(prompt.to_string());
            (self.answer)()
        }
    }

    fn pipeline_with(
        transport: RecordingTransport,
        api: ScriptedApi,
        length: LengthPolicy,
        max_message_length: usize,
    ) -> ChatPipeline<RecordingTransport, ScriptedApi> {
        ChatPipeline::new(
            Arc::new(transport),
            Arc::new(api),
            RateLimiter::new(5),
            Formatter::new(FontStyle::SmallCaps, length, 100, Duration::from_secs(60)),
            Decorator::with_rng(0.0, Vec::new(), StdRng::seed_from_u64(7)),
            PipelineOptions {
                bot_username: BOT.to_string(),
                feedback_buttons: true,
                reaction_delay: Duration::ZERO,
                max_message_length,
            },
        )
    }

    fn pipeline(api: ScriptedApi) -> ChatPipeline<RecordingTransport, ScriptedApi> {
        pipeline_with(RecordingTransport::new(), api, LengthPolicy::Chars(4096), 4096)
    }

    fn only_reply(pipeline: &ChatPipeline<RecordingTransport, ScriptedApi>) -> OutboundReply {
        let messages = pipeline.transport.messages();
        assert_eq!(messages.len(), 1, "expected one message, got {messages:?}");
        match messages.into_iter().next() {
            Some(Sent::Reply { reply, .. }) => reply,
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_text_result_is_formatted_with_feedback() {
        let pipeline = pipeline(ScriptedApi::text("hello world"));
        let msg = fixtures::private("hi");

        let outcome = pipeline.handle(&msg, "hi").await;

        assert_eq!(outcome, Outcome::Replied { photo: false, chunks: 1 });
        let reply = only_reply(&pipeline);
        assert_eq!(
            reply.text,
            pipeline.formatter.format(&pipeline.formatter.truncate("hello world"))
        );
        assert_eq!(reply.text, "ʜᴇʟʟᴏ ᴡᴏʀʟᴅ");
        assert!(reply.feedback);
        assert_eq!(reply.reply_to, Some(msg.message_id));
        assert_eq!(reply.image_url, None);
    }

    #[tokio::test]
    async fn test_decorations_and_typing_precede_reply() {
        let pipeline = pipeline(ScriptedApi::text("ok"));
        pipeline.handle(&fixtures::private("hi"), "hi").await;

        let sent = pipeline.transport.sent();
        assert!(matches!(sent[0], Sent::Reaction { message_id: MessageId(10), .. }));
        assert_eq!(sent[1], Sent::Typing);
        assert!(matches!(sent[2], Sent::Reply { .. }));
    }

    #[tokio::test]
    async fn test_image_result_is_sent_as_photo() {
        let pipeline = pipeline(ScriptedApi::new(|| {
            Ok(ApiResponse {
                results: Some("a red panda".to_string()),
                image_url: Url::parse("https://img.example.com/panda.jpg").ok(),
            })
        }));

        let outcome = pipeline.handle(&fixtures::private("draw"), "draw").await;

        assert_eq!(outcome, Outcome::Replied { photo: true, chunks: 1 });
        let reply = only_reply(&pipeline);
        assert_eq!(reply.text, "ᴀ ʀᴇᴅ ᴘᴀɴᴅᴀ");
        assert!(reply.image_url.is_some());
        assert!(reply.feedback);
    }

    #[tokio::test]
    async fn test_empty_result_sends_plain_apology() {
        let pipeline = pipeline(ScriptedApi::new(|| Ok(ApiResponse::default())));

        let outcome = pipeline.handle(&fixtures::private("hi"), "hi").await;

        assert_eq!(outcome, Outcome::Failed(Failure::EmptyResult));
        let reply = only_reply(&pipeline);
        assert_eq!(reply.text, pipeline.formatter.format(RETRY_TEXT));
        assert!(!reply.feedback);
    }

    #[tokio::test]
    async fn test_api_error_is_contained() {
        let pipeline = pipeline(ScriptedApi::new(|| {
            Err(ApiError::Network("connection reset".to_string()))
        }));

        let outcome = pipeline.handle(&fixtures::private("hi"), "hi").await;

        assert_eq!(outcome, Outcome::Failed(Failure::Api));
        let reply = only_reply(&pipeline);
        assert_eq!(reply.text, pipeline.formatter.format(ERROR_TEXT));
        assert!(!reply.feedback);
    }

    #[tokio::test]
    async fn test_links_are_not_stylized() {
        let pipeline = pipeline(ScriptedApi::text("docs at https://doc.rust-lang.org"));
        pipeline.handle(&fixtures::private("docs?"), "docs?").await;
        assert_eq!(only_reply(&pipeline).text, "docs at https://doc.rust-lang.org");
    }

    #[tokio::test]
    async fn test_blank_prompt_skips_api() {
        let pipeline = pipeline(ScriptedApi::text("unused"));

        let outcome = pipeline.handle(&fixtures::group("@fancy_bot"), "   ").await;

        assert_eq!(outcome, Outcome::Failed(Failure::EmptyPrompt));
        assert!(pipeline.api.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_decorations_do_not_stop_reply() {
        let pipeline = pipeline_with(
            RecordingTransport::flaky_decorations(),
            ScriptedApi::text("still here"),
            LengthPolicy::Chars(4096),
            4096,
        );

        let outcome = pipeline.handle(&fixtures::private("hi"), "hi").await;

        assert_eq!(outcome, Outcome::Replied { photo: false, chunks: 1 });
        assert_eq!(pipeline.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_undeliverable_reply_is_reported() {
        let pipeline = pipeline_with(
            RecordingTransport::failing_replies(),
            ScriptedApi::text("hi"),
            LengthPolicy::Chars(4096),
            4096,
        );

        let outcome = pipeline.handle(&fixtures::private("hi"), "hi").await;

        assert_eq!(outcome, Outcome::Failed(Failure::Delivery));
    }

    #[tokio::test]
    async fn test_truncation_applies_before_formatting() {
        let pipeline = pipeline_with(
            RecordingTransport::new(),
            ScriptedApi::text("abcdefghijklmnop"),
            LengthPolicy::Chars(10),
            10,
        );

        pipeline.handle(&fixtures::private("hi"), "hi").await;

        let reply = only_reply(&pipeline);
        assert_eq!(reply.text, "ᴀʙᴄᴅᴇғɢ...");
        assert_eq!(reply.text.chars().count(), 10);
    }

    #[tokio::test]
    async fn test_split_policy_sends_chunks() {
        let pipeline = pipeline_with(
            RecordingTransport::new(),
            ScriptedApi::text("0123456789012345678901234"),
            LengthPolicy::Split,
            10,
        );
        let msg = fixtures::private("count");

        let outcome = pipeline.handle(&msg, "count").await;

        assert_eq!(outcome, Outcome::Replied { photo: false, chunks: 3 });
        let messages = pipeline.transport.messages();
        assert_eq!(messages.len(), 3);
        assert!(matches!(
            &messages[0],
            Sent::Text { reply_to: Some(id), .. } if *id == msg.message_id
        ));
        assert!(matches!(&messages[2], Sent::Text { reply_to: None, text, .. } if text == "01234"));
    }

    #[tokio::test]
    async fn test_split_policy_truncates_photo_caption() {
        let pipeline = pipeline_with(
            RecordingTransport::new(),
            ScriptedApi::new(|| {
                Ok(ApiResponse {
                    results: Some("abcdefghijklmnop".to_string()),
                    image_url: Url::parse("https://img.example.com/long.jpg").ok(),
                })
            }),
            LengthPolicy::Split,
            10,
        );

        let outcome = pipeline.handle(&fixtures::private("draw"), "draw").await;

        assert_eq!(outcome, Outcome::Replied { photo: true, chunks: 1 });
        let reply = only_reply(&pipeline);
        assert_eq!(reply.text.chars().count(), 10);
        assert!(reply.text.ends_with("..."));
    }

    #[tokio::test]
    async fn test_photo_caption_is_capped_in_chars_mode() {
        let pipeline = pipeline(ScriptedApi::new(|| {
            Ok(ApiResponse {
                results: Some("x".repeat(1500)),
                image_url: Url::parse("https://img.example.com/wide.jpg").ok(),
            })
        }));

        let outcome = pipeline.handle(&fixtures::private("draw"), "draw").await;

        assert_eq!(outcome, Outcome::Replied { photo: true, chunks: 1 });
        let reply = only_reply(&pipeline);
        assert_eq!(reply.text.encode_utf16().count(), transport::MAX_CAPTION_LENGTH);
        assert!(reply.text.ends_with("..."));
    }

    #[tokio::test]
    async fn test_words_mode_still_respects_max_length() {
        let pipeline = pipeline_with(
            RecordingTransport::new(),
            ScriptedApi::new(|| {
                Ok(ApiResponse {
                    results: Some("a".repeat(5000)),
                    image_url: None,
                })
            }),
            LengthPolicy::Words(50),
            4096,
        );

        let outcome = pipeline.handle(&fixtures::private("one word"), "one word").await;

        assert_eq!(outcome, Outcome::Replied { photo: false, chunks: 1 });
        let reply = only_reply(&pipeline);
        assert_eq!(reply.text.encode_utf16().count(), 4096);
        assert!(reply.text.ends_with("..."));
    }

    fn feedback(action_target: i32, original: Option<IncomingMessage>) -> FeedbackQuery {
        FeedbackQuery {
            callback_id: "cb-1".to_string(),
            target: Some((ChatId(-1001), MessageId(action_target))),
            original,
        }
    }

    #[tokio::test]
    async fn test_like_is_acknowledged_and_keyboard_removed() {
        let pipeline = pipeline(ScriptedApi::text("unused"));

        let outcome = pipeline
            .handle_feedback(FeedbackAction::Like, feedback(99, None))
            .await;

        assert_eq!(outcome, None);
        assert_eq!(
            pipeline.transport.sent(),
            vec![
                Sent::Answer {
                    callback_id: "cb-1".to_string(),
                    text: FeedbackAction::Like.acknowledgement().map(str::to_string),
                },
                Sent::ClearMarkup {
                    message_id: MessageId(99)
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_regenerate_reprocesses_original_once() {
        let pipeline = pipeline(ScriptedApi::text("second try"));
        let original = fixtures::group("@fancy_bot tell me a joke");

        let first = pipeline
            .handle_feedback(FeedbackAction::Regenerate, feedback(99, Some(original.clone())))
            .await;
        let second = pipeline
            .handle_feedback(FeedbackAction::Regenerate, feedback(99, Some(original)))
            .await;

        assert_eq!(first, Some(Outcome::Replied { photo: false, chunks: 1 }));
        assert_eq!(second, None);
        assert_eq!(*pipeline.api.prompts.lock(), vec!["tell me a joke".to_string()]);

        let sent = pipeline.transport.sent();
        // Regeneration skips the decoration step.
        assert!(!sent.iter().any(|s| matches!(s, Sent::Reaction { .. })));
        assert_eq!(
            sent.iter().filter(|s| matches!(s, Sent::ClearMarkup { .. })).count(),
            1
        );
        assert_eq!(
            sent.iter().filter(|s| matches!(s, Sent::Answer { .. })).count(),
            2
        );
    }

    #[tokio::test]
    async fn test_feedback_without_target_is_only_answered() {
        let pipeline = pipeline(ScriptedApi::text("unused"));
        let query = FeedbackQuery {
            callback_id: "cb-2".to_string(),
            target: None,
            original: None,
        };

        assert_eq!(pipeline.handle_feedback(FeedbackAction::Dislike, query).await, None);
        assert_eq!(pipeline.transport.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_api_calls_are_rate_limited() {
        let pipeline = pipeline(ScriptedApi::text("ok"));
        let start = tokio::time::Instant::now();

        for _ in 0..10 {
            pipeline.handle(&fixtures::private("hi"), "hi").await;
        }

        assert_eq!(pipeline.api.prompts.lock().len(), 10);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
