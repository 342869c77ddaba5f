// ============================================================
// CONTENT ANALYZER
// ============================================================
// Crude human/non-human signal for open-text survey answers

/// Self-referential phrases that give away a generated answer.
pub const AI_PHRASE_DENYLIST: [&str; 12] = [
    "as an ai",
    "as an assistant",
    "as a language model",
    "as an artificial intelligence",
    "i'm an ai",
    "i am an ai",
    "i'm a chatbot",
    "i am a chatbot",
    "i'm just an ai",
    "i'm a language model",
    "i am a language model",
    "i'm an artificial intelligence",
];

/// Deterministic heuristic over a single answer. Not a trained model.
#[derive(Debug, Clone)]
pub struct HumanTextClassifier {
    /// Shorter answers (in characters) are too short to judge
    pub min_length: usize,

    /// More periods than this reads as an overly formal multi-sentence answer
    pub max_periods: usize,

    /// Lower-case phrases matched as substrings
    pub denylist: Vec<String>,
}

impl Default for HumanTextClassifier {
    fn default() -> Self {
        Self {
            min_length: 20,
            max_periods: 5,
            denylist: AI_PHRASE_DENYLIST.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl HumanTextClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_human(&self, text: &str) -> bool {
        if text.chars().count() < self.min_length {
            return false;
        }

        let lowered = text.to_lowercase().replace('\u{2019}', "'");
        if self
            .denylist
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
        {
            return false;
        }

        text.matches('.').count() <= self.max_periods
    }
}

/// [`HumanTextClassifier::is_human`] with the default thresholds.
pub fn classify_is_human(text: &str) -> bool {
    HumanTextClassifier::default().is_human(text)
}
