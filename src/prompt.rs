use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One example sentence in several languages, keyed by language code.
pub type FewShotEntry = HashMap<String, String>;

const BUNDLED_EXAMPLES: &[(&str, &str)] = &[
    (
        "Not everything depends on us, sometimes we find ourselves at the wrong place at the wrong time.",
        "Не всегда все зависит от нас самих, бывает, мы оказываемся не в то время не в том месте",
    ),
    ("Hello, how are you?", "Привет, как дела?"),
    ("Can you translate this text quickly?", "Можешь быстро перевести этот текст?"),
    (
        "The Janus Pro 7b output was a drastic disaster for me.",
        "Выход Janus Pro 7b был радикально катастрофой для меня.",
    ),
    ("Hello! Nice to see you on my channel :)", "Привет! Рад тебя видеть на своём канале :)"),
    ("The song is from the movie The Witch Mountain", "песня звучит в фильме Ведьмина гора"),
    ("word", "слово"),
    ("What else needs to be checked", "Что ещё нужно проверить"),
];

/// The English/Russian example set shipped with the binary.
pub fn bundled_examples() -> Vec<FewShotEntry> {
    BUNDLED_EXAMPLES
        .iter()
        .map(|(en, ru)| {
            HashMap::from([
                ("en".to_string(), en.to_string()),
                ("ru".to_string(), ru.to_string()),
            ])
        })
        .collect()
}

/// Reads a JSON array of `{ "<code>": "<sentence>", ... }` objects.
pub fn load_examples(path: &Path) -> Result<Vec<FewShotEntry>> {
    let s = fs::read_to_string(path)
        .with_context(|| format!("failed to read few-shot examples {}", path.display()))?;
    let entries = serde_json::from_str::<Vec<FewShotEntry>>(&s)
        .with_context(|| format!("failed to parse few-shot examples {}", path.display()))?;
    Ok(entries)
}

fn system_prompt(source: &str, target: &str) -> String {
    format!(
        "You are a bilingual translation assistant. Always translate the user's message from {source} to {target}.\n\
         It can be a single character, word, phrase or large text.\n\
         Rules:\n\
         1. Preserve meaning, tone, punctuation, and formatting.\n\
         2. Output ONLY the translated text without additional commentary.\n\
         3. If the user's text is in {source}, translate it into {target}.\n\
         4. If the user's text is in {target}, translate it into {source}.\n\
         /no_think"
    )
}

/// Builds the chat transcript for one translation: system rules, few-shot pairs, input.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    examples: Vec<FewShotEntry>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(bundled_examples())
    }
}

impl PromptBuilder {
    pub fn new(examples: Vec<FewShotEntry>) -> Self {
        Self { examples }
    }

    pub fn example_count(&self) -> usize {
        self.examples.len()
    }

    /// Entries that carry both codes become one user/assistant pair, in set order.
    pub fn build(&self, text: &str, source: &str, target: &str) -> Vec<ChatMessage> {
        let mut msgs = vec![ChatMessage::new(Role::System, system_prompt(source, target))];
        for entry in &self.examples {
            if let (Some(src), Some(dst)) = (entry.get(source), entry.get(target)) {
                msgs.push(ChatMessage::new(Role::User, src.as_str()));
                msgs.push(ChatMessage::new(Role::Assistant, dst.as_str()));
            }
        }
        msgs.push(ChatMessage::new(Role::User, text));
        msgs
    }
}
