use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::families::{ConciseRule, ElaborateRule, FormalRule, GrammarRule, SimplifyRule};

/// One family of rewrites, fired when the lower-cased prompt mentions any of
/// its keywords.
pub trait RewriteRule: Send + Sync {
    fn id(&self) -> &'static str;

    fn keywords(&self) -> &'static [&'static str];

    fn rewrite(&self, text: &str) -> String;

    fn matches(&self, prompt: &str) -> bool {
        self.keywords().iter().any(|keyword| prompt.contains(keyword))
    }
}

/// Deterministic prompt-driven text rewriter.
///
/// Every matching family runs, in registration order, each one on the output
/// of the previous. When nothing matches, the text gets a general polish.
pub struct RuleEngine {
    rules: Vec<Box<dyn RewriteRule>>,
}

impl RuleEngine {
    pub fn new(rules: Vec<Box<dyn RewriteRule>>) -> Self {
        Self { rules }
    }

    /// concise, formal, grammar, simplify, elaborate.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ConciseRule),
            Box::new(FormalRule),
            Box::new(GrammarRule),
            Box::new(SimplifyRule),
            Box::new(ElaborateRule),
        ])
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn RewriteRule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    /// Ids of the families the prompt fires, in the order they run.
    pub fn fired(&self, prompt: &str) -> Vec<&'static str> {
        let prompt = prompt.to_lowercase();
        self.rules
            .iter()
            .filter(|rule| rule.matches(&prompt))
            .map(|rule| rule.id())
            .collect()
    }

    pub fn rewrite(&self, text: &str, prompt: &str) -> String {
        let lowered = prompt.to_lowercase();
        let mut out = text.to_string();
        let mut fired = Vec::new();

        for rule in &self.rules {
            if rule.matches(&lowered) {
                out = rule.rewrite(&out);
                fired.push(rule.id());
            }
        }

        if fired.is_empty() {
            tracing::debug!("no rewrite rule matched, polishing");
            return polish(&out, prompt);
        }
        tracing::debug!(rules = ?fired, "rewrite rules fired");
        out
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::standard()
    }
}

static SENTENCE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^\s*|[.!?]\s+)([a-z])").expect("sentence start regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static SPACE_BEFORE_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\.").expect("period regex"));

const TONE_SENTENCES: [(&str, &str); 3] = [
    (
        "engaging",
        " This engaging revision aims to capture and maintain the reader's interest.",
    ),
    (
        "clear",
        " This revision focuses on clarity and straightforward communication.",
    ),
    (
        "persuasive",
        " This persuasive revision is designed to effectively convince the reader.",
    ),
];

/// Sentence capitalization and spacing cleanup, followed by a closing
/// sentence picked from the prompt.
pub fn polish(text: &str, prompt: &str) -> String {
    let out = SENTENCE_START.replace_all(text, |caps: &Captures<'_>| {
        format!("{}{}", &caps[1], caps[2].to_uppercase())
    });
    let out = WHITESPACE.replace_all(&out, " ");
    let out = space_after_commas(&out);
    let mut out = SPACE_BEFORE_PERIOD
        .replace_all(&out, ".")
        .trim()
        .to_string();

    let lowered = prompt.to_lowercase();
    if let Some((_, sentence)) = TONE_SENTENCES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
    {
        out.push_str(sentence);
        return out;
    }

    let last_word: String = prompt
        .split(char::is_whitespace)
        .next_back()
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphabetic)
        .collect();
    if last_word.len() > 3 {
        out.push_str(&format!(
            " This revision emphasizes {}.",
            last_word.to_lowercase()
        ));
    }
    out
}

/// Puts a space after every comma not already followed by whitespace.
pub(crate) fn space_after_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        out.push(ch);
        if ch == ',' && !chars.peek().is_some_and(|next| next.is_whitespace()) {
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commas_get_one_space() {
        assert_eq!(space_after_commas("a,b, c,"), "a, b, c, ");
        assert_eq!(space_after_commas(",,"), ", , ");
    }

    #[test]
    fn polish_capitalizes_sentences() {
        assert_eq!(
            polish("  hello there.  how are you?fine", "fix"),
            "Hello there. How are you?fine"
        );
    }
}
