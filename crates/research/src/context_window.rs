//! Context-window assembly — fit unbounded chat history into a fixed
//! model prompt budget.
//!
//! The builder works on a reverse-chronological working set so that the
//! most recent context survives trimming: the new user message first,
//! then history walking backward in (user, assistant) exchanges, then the
//! system message at the tail. Trimming pops from the tail; if even the
//! lone survivor is over budget, its final line (the user's question) is
//! preserved verbatim and the rest is cut down to the latest tokens that
//! fit. The output is always chronological.

use lorebase_core::chat::{ChatLog, ChatMessage, Role};
use lorebase_core::error::Result;
use lorebase_core::tokenizer::{Tokenizer, max_prompt_size};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ContextWindowBuilder {
    tokenizer: Arc<dyn Tokenizer>,
    lookback_turns: usize,
}

impl ContextWindowBuilder {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, lookback_turns: usize) -> Self {
        Self {
            tokenizer,
            lookback_turns,
        }
    }

    /// Build the model-facing message sequence for one request.
    ///
    /// Returns chronological messages whose total token count fits the
    /// model's prompt budget. Unknown models are a configuration error.
    pub fn build(
        &self,
        user_message: &str,
        system_message: &str,
        chat_log: &ChatLog,
        model: &str,
    ) -> Result<Vec<ChatMessage>> {
        let budget = max_prompt_size(model)?;

        // Reverse-chronological working set, newest first.
        let mut working = vec![ChatMessage::user(user_message)];

        let message_cap = 2 * self.lookback_turns;
        let mut appended = 0;
        // Pairs are anchored at the newest end of the log, so an odd
        // leading turn is the oldest one.
        'outer: for pair in chat_log.turns.rchunks(2) {
            for turn in pair.iter().rev() {
                if appended >= message_cap {
                    break 'outer;
                }
                let message = match turn.role {
                    Role::Assistant => ChatMessage::assistant(turn.rendered()),
                    _ => ChatMessage::user(turn.rendered()),
                };
                working.push(message);
                appended += 1;
            }
        }

        if !system_message.is_empty() {
            working.push(ChatMessage::system(system_message));
        }

        // Trim from the tail: system goes first, then the oldest history.
        let mut dropped = 0;
        while self.total_tokens(&working) > budget && working.len() > 1 {
            working.pop();
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, budget, "Trimmed context window to budget");
        }

        if working.len() == 1 && self.total_tokens(&working) > budget {
            working[0].content = self.truncate_final_message(&working[0].content, budget);
        }

        let total = self.total_tokens(&working);
        if total > budget {
            // Only reachable when the question line alone exceeds the
            // budget; the question is never cut.
            warn!(total, budget, "Context window exceeds budget after truncation");
        }

        working.reverse();
        Ok(working)
    }

    fn total_tokens(&self, messages: &[ChatMessage]) -> usize {
        messages.iter().map(|m| self.tokenizer.count(&m.content)).sum()
    }

    /// Cut a single oversized message down to the budget while keeping its
    /// final line, the user's question, untouched. Of the remainder, the
    /// latest tokens that fit are kept.
    fn truncate_final_message(&self, content: &str, budget: usize) -> String {
        let (remainder, question) = match content.rfind('\n') {
            Some(idx) => (&content[..idx], &content[idx + 1..]),
            None => ("", content),
        };

        let question_tokens = self.tokenizer.count(question);
        let available = budget.saturating_sub(question_tokens + 1);

        let tokens = self.tokenizer.encode(remainder);
        let kept = if tokens.len() > available {
            self.tokenizer.decode(&tokens[tokens.len() - available..])
        } else {
            remainder.to_string()
        };

        debug!(
            original_tokens = tokens.len() + question_tokens,
            budget,
            "Truncated final message, question preserved"
        );

        if kept.is_empty() {
            question.to_string()
        } else {
            format!("{kept}\n{question}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorebase_core::chat::ChatTurn;
    use lorebase_core::tokenizer::ChunkTokenizer;

    fn builder(lookback_turns: usize) -> ContextWindowBuilder {
        ContextWindowBuilder::new(Arc::new(ChunkTokenizer), lookback_turns)
    }

    fn log_with_exchanges(count: usize) -> ChatLog {
        let mut log = ChatLog::new();
        for i in 0..count {
            log.push(ChatTurn::user(format!("question {i}")));
            log.push(ChatTurn::assistant(format!("answer {i}")));
        }
        log
    }

    #[test]
    fn small_conversation_kept_whole_and_chronological() {
        let log = log_with_exchanges(2);
        let messages = builder(10)
            .build("what now?", "You are helpful.", &log, "gpt-4")
            .unwrap();

        // system, then history in order, then the new user message
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[1].content.contains("question 0"));
        assert!(messages[2].content.contains("answer 0"));
        assert!(messages[4].content.contains("answer 1"));
        assert_eq!(messages[5].content, "what now?");
        assert_eq!(messages[5].role, Role::User);
    }

    #[test]
    fn lookback_limits_history() {
        let log = log_with_exchanges(20);
        let messages = builder(3)
            .build("latest", "sys", &log, "gpt-4")
            .unwrap();

        // 1 system + 6 history + 1 new user
        assert_eq!(messages.len(), 8);
        // Only the newest exchanges survive.
        assert!(messages[1].content.contains("question 17"));
        assert!(messages[6].content.contains("answer 19"));
    }

    #[test]
    fn odd_length_log_keeps_newest_turns() {
        let mut log = log_with_exchanges(2);
        log.push(ChatTurn::user("dangling question"));

        let messages = builder(1).build("now", "sys", &log, "gpt-4").unwrap();

        // 1 system + 2 newest history messages + the new user message
        assert_eq!(messages.len(), 4);
        assert!(messages[1].content.contains("answer 1"));
        assert!(messages[2].content.contains("dangling question"));
        assert_eq!(messages[3].content, "now");
    }

    #[test]
    fn unknown_model_is_error() {
        let result = builder(5).build("q", "sys", &ChatLog::new(), "gpt-unknown");
        assert!(result.is_err());
    }

    #[test]
    fn output_fits_budget() {
        // gpt-3.5-turbo budget is 4096 tokens = 16384 chars at 4 chars/token.
        let mut log = ChatLog::new();
        for i in 0..10 {
            log.push(ChatTurn::user(format!("q{i} {}", "x".repeat(4000))));
            log.push(ChatTurn::assistant(format!("a{i} {}", "y".repeat(4000))));
        }
        let tokenizer = ChunkTokenizer;
        let messages = builder(10)
            .build("the question", "sys", &log, "gpt-3.5-turbo")
            .unwrap();

        let total: usize = messages.iter().map(|m| tokenizer.count(&m.content)).sum();
        assert!(total <= 4096);
        // Newest user message always survives.
        assert_eq!(messages.last().unwrap().content, "the question");
    }

    #[test]
    fn oldest_history_dropped_before_newest() {
        let mut log = ChatLog::new();
        for i in 0..5 {
            log.push(ChatTurn::user(format!("q{i} {}", "x".repeat(6000))));
            log.push(ChatTurn::assistant(format!("a{i} {}", "y".repeat(6000))));
        }
        let messages = builder(10)
            .build("final question", "sys", &log, "gpt-3.5-turbo")
            .unwrap();

        // Whatever survives must be the newest slice of history.
        let joined: String = messages.iter().map(|m| m.content.as_str()).collect();
        assert!(joined.contains("final question"));
        assert!(!joined.contains("q0 "));
    }

    #[test]
    fn single_oversized_message_keeps_question_line() {
        let filler = "word ".repeat(10_000);
        let content = format!("{filler}\nwhat is the answer?");
        let log = ChatLog::new();
        let tokenizer = ChunkTokenizer;

        let messages = builder(5)
            .build(&content, "sys", &log, "gpt-3.5-turbo")
            .unwrap();

        assert_eq!(messages.len(), 1);
        let result = &messages[0].content;
        assert!(result.ends_with("\nwhat is the answer?"));
        assert!(tokenizer.count(result) <= 4096);
    }

    #[test]
    fn truncation_keeps_latest_tokens_of_remainder() {
        let content = format!("{}{}\nthe question", "early ".repeat(5000), "late ".repeat(5000));
        let messages = builder(5)
            .build(&content, "", &ChatLog::new(), "gpt-3.5-turbo")
            .unwrap();

        let result = &messages[0].content;
        assert!(result.contains("late"));
        assert!(!result.contains("early"));
    }

    #[test]
    fn build_is_idempotent() {
        let log = log_with_exchanges(4);
        let b = builder(5);
        let first = b.build("q", "sys", &log, "gpt-4").unwrap();
        let second = b.build("q", "sys", &log, "gpt-4").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_system_message_omitted() {
        let messages = builder(5)
            .build("hello", "", &ChatLog::new(), "gpt-4")
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }
}
