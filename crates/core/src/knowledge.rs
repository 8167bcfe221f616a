//! The curated knowledge base of canned answers.
//!
//! Loaded once at startup, never mutated afterwards. Two lookups:
//!
//! - **exact**: byte-for-byte equality with a stored question, via a map
//! - **fuzzy**: case-insensitive containment in either direction, scanned in
//!   declaration order so earlier entries win ties
//!
//! The fuzzy scan compares lowercase text. When testing whether the input
//! contains a question, the question's trailing `?`/`!`/`.` is ignored so a
//! question phrased as a longer sentence still finds its entry. Blank input
//! never matches: an empty needle is a substring of everything.

use crate::error::KnowledgeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One curated question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,

    /// Short label listed in the fallback reply ("Creating strong passwords").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl KnowledgeEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            topic: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// The label for this entry, falling back to the question itself.
    pub fn topic_label(&self) -> &str {
        self.topic.as_deref().unwrap_or(&self.question)
    }
}

/// On-disk shape of a knowledge file.
#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    entries: Vec<KnowledgeEntry>,
}

/// Immutable, ordered knowledge table.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
    /// Literal question → index of its first occurrence.
    exact: HashMap<String, usize>,
    /// Fuzzy keys per entry, same order as `entries`.
    fuzzy_keys: Vec<FuzzyKey>,
}

#[derive(Debug, Clone)]
struct FuzzyKey {
    /// Lowercased question.
    full: String,
    /// Lowercased question without surrounding whitespace or trailing punctuation.
    stem: String,
}

impl FuzzyKey {
    fn new(question: &str) -> Self {
        let full = question.to_lowercase();
        let stem = full.trim().trim_end_matches(['?', '!', '.']).trim_end().to_owned();
        Self { full, stem }
    }

    fn matches(&self, input: &str) -> bool {
        self.full.contains(input) || (!self.stem.is_empty() && input.contains(self.stem.as_str()))
    }
}

impl KnowledgeBase {
    /// Build a knowledge base from an ordered list of entries.
    ///
    /// Rejects entries whose question or answer is blank.
    pub fn new(entries: Vec<KnowledgeEntry>) -> Result<Self, KnowledgeError> {
        let mut exact = HashMap::with_capacity(entries.len());
        let mut fuzzy_keys = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            if entry.question.trim().is_empty() {
                return Err(KnowledgeError::InvalidEntry {
                    index,
                    reason: "question is empty".into(),
                });
            }
            if entry.answer.trim().is_empty() {
                return Err(KnowledgeError::InvalidEntry {
                    index,
                    reason: "answer is empty".into(),
                });
            }
            exact.entry(entry.question.clone()).or_insert(index);
            fuzzy_keys.push(FuzzyKey::new(&entry.question));
        }

        Ok(Self {
            entries,
            exact,
            fuzzy_keys,
        })
    }

    /// Load a knowledge base from a TOML file of `[[entries]]` tables.
    pub fn load_from(path: &Path) -> Result<Self, KnowledgeError> {
        let content = std::fs::read_to_string(path).map_err(|e| KnowledgeError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let file: KnowledgeFile =
            toml::from_str(&content).map_err(|e| KnowledgeError::ParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let kb = Self::new(file.entries)?;
        tracing::info!(path = %path.display(), entries = kb.len(), "Loaded knowledge base");
        Ok(kb)
    }

    /// The built-in digital-literacy knowledge base.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(question, answer, topic)| {
                KnowledgeEntry::new(*question, *answer).with_topic(*topic)
            })
            .collect();
        Self::new(entries).unwrap_or_else(|e| unreachable!("built-in knowledge is valid: {e}"))
    }

    /// Answer for a question stored byte-for-byte as `text`.
    pub fn exact_match(&self, text: &str) -> Option<&str> {
        if text.trim().is_empty() {
            return None;
        }
        self.exact
            .get(text)
            .map(|&index| self.entries[index].answer.as_str())
    }

    /// Answer of the first entry whose question contains, or is contained in,
    /// `text`, ignoring case.
    pub fn fuzzy_match(&self, text: &str) -> Option<&str> {
        if text.trim().is_empty() {
            return None;
        }
        let input = text.to_lowercase();
        self.fuzzy_keys
            .iter()
            .position(|key| key.matches(&input))
            .map(|index| self.entries[index].answer.as_str())
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "How do I create a strong password?",
        "To create a strong password: 1) Use at least 12 characters 2) Mix uppercase, lowercase letters, numbers, and symbols 3) Avoid personal information 4) Don't use common words or patterns 5) Use a different password for each account. Consider using a password manager to help create and store strong passwords safely!",
        "Creating strong passwords",
    ),
    (
        "What is the best way to avoid scams online?",
        "To avoid online scams: 1) Be skeptical of unexpected emails and messages 2) Don't click on suspicious links 3) Never share personal or financial information with untrusted sources 4) Use strong passwords and enable two-factor authentication 5) Keep your software updated 6) Research companies before making purchases 7) If something seems too good to be true, it probably is!",
        "Avoiding online scams",
    ),
    (
        "How do I use video calling apps?",
        "To use video calling apps: 1) Download the app (like Zoom, FaceTime, or WhatsApp) from your device's app store 2) Create an account if required 3) Give the app permission to use your camera and microphone 4) Add contacts or use their phone numbers/email addresses 5) Tap the video call button to start a call. Most apps have similar interfaces with buttons to mute yourself, turn off video, or end the call.",
        "Using video calling apps",
    ),
    (
        "How can I send photos on WhatsApp?",
        "To send photos on WhatsApp: 1) Open a chat with the person you want to send to 2) Tap the '+' or paperclip icon 3) Select 'Gallery' or 'Photos' 4) Choose the photo you want to send 5) Add a caption if desired 6) Tap the send button. You can also take a new photo directly in WhatsApp by selecting the camera option!",
        "Sending photos in messaging apps",
    ),
    (
        "What should I do if I forget my password?",
        "If you forget your password: 1) Look for a 'Forgot Password' or 'Reset Password' option on the login page 2) Enter your email address or username 3) Check your email for reset instructions 4) Create a new strong password 5) Consider writing it down in a secure place or using a password manager for future reference. For important accounts, make sure your recovery email is up to date!",
        "Recovering forgotten passwords",
    ),
    (
        "How do I update my apps?",
        "To update your apps: On iPhone/iPad: 1) Open App Store 2) Tap your profile icon 3) Scroll to see available updates 4) Tap 'Update All' or update individual apps. On Android: 1) Open Google Play Store 2) Tap your profile icon 3) Select 'Manage apps & device' 4) Tap 'Updates available' and update apps. Regular updates improve security and add new features!",
        "Updating your apps",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> KnowledgeBase {
        KnowledgeBase::new(vec![
            KnowledgeEntry::new("How do I reset my router?", "Unplug it."),
            KnowledgeEntry::new("How do I reset my phone?", "Settings, then Reset."),
        ])
        .unwrap()
    }

    #[test]
    fn builtin_has_six_entries_in_order() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(kb.len(), 6);
        assert_eq!(kb.entries()[0].question, "How do I create a strong password?");
        assert_eq!(kb.entries()[5].topic_label(), "Updating your apps");
    }

    #[test]
    fn exact_match_is_case_sensitive() {
        let kb = small();
        assert_eq!(kb.exact_match("How do I reset my router?"), Some("Unplug it."));
        assert_eq!(kb.exact_match("how do i reset my router?"), None);
        assert_eq!(kb.exact_match("How do I reset my router"), None);
    }

    #[test]
    fn fuzzy_match_ignores_case() {
        let kb = small();
        assert_eq!(kb.fuzzy_match("HOW DO I RESET MY PHONE?"), Some("Settings, then Reset."));
    }

    #[test]
    fn fuzzy_match_input_inside_question() {
        let kb = small();
        assert_eq!(kb.fuzzy_match("my phone"), Some("Settings, then Reset."));
    }

    #[test]
    fn fuzzy_match_question_inside_input() {
        let kb = KnowledgeBase::builtin();
        let answer = kb
            .fuzzy_match("How do I create a strong password please")
            .unwrap();
        assert!(answer.starts_with("To create a strong password"));
    }

    #[test]
    fn fuzzy_match_first_declared_entry_wins() {
        let kb = small();
        // Both questions contain "reset my"
        assert_eq!(kb.fuzzy_match("reset my"), Some("Unplug it."));
    }

    #[test]
    fn blank_input_never_matches() {
        let kb = KnowledgeBase::builtin();
        for input in ["", "   ", "\t\n"] {
            assert_eq!(kb.exact_match(input), None, "exact: {input:?}");
            assert_eq!(kb.fuzzy_match(input), None, "fuzzy: {input:?}");
        }
    }

    #[test]
    fn punctuation_input_is_not_blank() {
        let kb = KnowledgeBase::builtin();
        let answer = kb.fuzzy_match("?").unwrap();
        assert!(answer.starts_with("To create a strong password"));
    }

    #[test]
    fn input_punctuation_is_kept() {
        let kb = KnowledgeBase::builtin();
        // Only "...video calling apps?" contains "s?"
        let answer = kb.fuzzy_match("s?").unwrap();
        assert!(answer.starts_with("To use video calling apps"));
    }

    #[test]
    fn duplicate_questions_first_inserted_wins() {
        let kb = KnowledgeBase::new(vec![
            KnowledgeEntry::new("Same?", "first"),
            KnowledgeEntry::new("Same?", "second"),
        ])
        .unwrap();
        assert_eq!(kb.exact_match("Same?"), Some("first"));
        assert_eq!(kb.fuzzy_match("same"), Some("first"));
    }

    #[test]
    fn unrelated_input_has_no_match() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(kb.fuzzy_match("What's the weather in Lisbon tomorrow?"), None);
    }

    #[test]
    fn empty_answer_rejected() {
        let err = KnowledgeBase::new(vec![KnowledgeEntry::new("Q?", "  ")]).unwrap_err();
        assert!(matches!(err, KnowledgeError::InvalidEntry { index: 0, .. }));
    }

    #[test]
    fn load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.toml");
        std::fs::write(
            &path,
            r#"
[[entries]]
question = "How do I zoom in?"
answer = "Pinch outwards with two fingers."
topic = "Zooming in"

[[entries]]
question = "How do I take a screenshot?"
answer = "Press power and volume down together."
"#,
        )
        .unwrap();

        let kb = KnowledgeBase::load_from(&path).unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.entries()[0].topic_label(), "Zooming in");
        assert_eq!(kb.entries()[1].topic_label(), "How do I take a screenshot?");
        assert_eq!(
            kb.exact_match("How do I zoom in?"),
            Some("Pinch outwards with two fingers.")
        );
    }

    #[test]
    fn load_from_missing_file_fails() {
        let err = KnowledgeBase::load_from(Path::new("/nonexistent/knowledge.toml")).unwrap_err();
        assert!(matches!(err, KnowledgeError::ReadError { .. }));
    }
}
