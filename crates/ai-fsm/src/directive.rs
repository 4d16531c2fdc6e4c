//! The two directives every agent understands from signals and chat.

use ai_core::DirectiveConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirective {
    ReturnToBase,
    Panic,
}

/// Match `message` against the configured trigger words. Return words win over panic words.
pub fn parse_directive(config: &DirectiveConfig, message: &str) -> Option<MessageDirective> {
    let message = message.to_lowercase();
    let mentions = |words: &[String]| {
        words
            .iter()
            .any(|w| !w.is_empty() && message.contains(&w.to_lowercase()))
    };

    if mentions(&config.return_words) {
        Some(MessageDirective::ReturnToBase)
    } else if mentions(&config.panic_words) {
        Some(MessageDirective::Panic)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_words_take_priority() {
        let config = DirectiveConfig::default();
        assert_eq!(
            parse_directive(&config, "PANIC and Return"),
            Some(MessageDirective::ReturnToBase)
        );
        assert_eq!(
            parse_directive(&config, "jester upstairs"),
            Some(MessageDirective::Panic)
        );
        assert_eq!(parse_directive(&config, "nice loot"), None);
    }
}
