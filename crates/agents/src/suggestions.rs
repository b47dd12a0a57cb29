use std::time::Duration;

pub const SUGGESTION_ROTATION: Duration = Duration::from_millis(2600);

pub const DEFAULT_SUGGESTIONS: &[&str] = &[
    "What makes you unique as a developer?",
    "Give me a quick summary",
    "Tell me about Munich Experience",
    "What are your core skills?",
];

/// The single rotating prompt shown under the chat input.
#[derive(Debug, Clone)]
pub struct SuggestionCarousel {
    prompts: Vec<String>,
    index: usize,
}

impl Default for SuggestionCarousel {
    fn default() -> Self {
        Self::new(DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect())
    }
}

impl SuggestionCarousel {
    pub fn new(prompts: Vec<String>) -> Self {
        Self { prompts, index: 0 }
    }

    pub fn current(&self) -> Option<&str> {
        self.prompts.get(self.index).map(String::as_str)
    }

    pub fn advance(&mut self) -> Option<&str> {
        if !self.prompts.is_empty() {
            self.index = (self.index + 1) % self.prompts.len();
        }
        self.current()
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps() {
        let mut carousel = SuggestionCarousel::default();
        assert_eq!(carousel.current(), Some("What makes you unique as a developer?"));
        for _ in 0..DEFAULT_SUGGESTIONS.len() {
            carousel.advance();
        }
        assert_eq!(carousel.current(), Some("What makes you unique as a developer?"));
    }

    #[test]
    fn empty_carousel_is_inert() {
        let mut carousel = SuggestionCarousel::new(Vec::new());
        assert_eq!(carousel.advance(), None);
    }
}
