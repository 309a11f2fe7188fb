use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::rules::{RewriteRule, space_after_commas};

type WordTable = Vec<(Regex, &'static str)>;

/// Whole-word, case-sensitive replacements. Words are regex fragments.
fn word_table(pairs: &[(&str, &'static str)]) -> WordTable {
    pairs
        .iter()
        .map(|&(word, replacement)| {
            let pattern = format!(r"\b{word}\b");
            (Regex::new(&pattern).expect("word regex"), replacement)
        })
        .collect()
}

fn replace_words(table: &WordTable, text: &str) -> String {
    table.iter().fold(text.to_string(), |out, (regex, replacement)| {
        regex.replace_all(&out, *replacement).into_owned()
    })
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("rewrite regex")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| regex(r"\s+"));

static FILLER: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?i)\bin my opinion\b|\bi think\b|\bi believe\b|\bbasically\b|\bliterally\b|\bactually\b|\bjust\b|\bvery\b|\breally\b|\bquite\b|\bin order to\b|\bthe fact that\b",
    )
});
static COMMA_AND: LazyLock<Regex> = LazyLock::new(|| regex(r",\s*and\s+"));
static COMMA_SPACING: LazyLock<Regex> = LazyLock::new(|| regex(r"\s*,\s*"));

/// Drops filler phrases and tightens long text.
pub struct ConciseRule;

impl RewriteRule for ConciseRule {
    fn id(&self) -> &'static str {
        "concise"
    }

    fn keywords(&self) -> &'static [&'static str] {
        &["concise", "shorter", "brief"]
    }

    fn rewrite(&self, text: &str) -> String {
        let out = FILLER.replace_all(text, "");
        let out = WHITESPACE.replace_all(&out, " ").trim().to_string();
        if out.chars().count() <= 100 {
            return out;
        }
        let out = COMMA_AND.replace_all(&out, " and ");
        COMMA_SPACING.replace_all(&out, ", ").into_owned()
    }
}

const CONTRACTIONS: [(&str, &str); 37] = [
    ("don't", "do not"),
    ("can't", "cannot"),
    ("won't", "will not"),
    ("shan't", "shall not"),
    ("hasn't", "has not"),
    ("haven't", "have not"),
    ("hadn't", "had not"),
    ("didn't", "did not"),
    ("isn't", "is not"),
    ("aren't", "are not"),
    ("wasn't", "was not"),
    ("weren't", "were not"),
    ("I'm", "I am"),
    ("you're", "you are"),
    ("he's", "he is"),
    ("she's", "she is"),
    ("it's", "it is"),
    ("we're", "we are"),
    ("they're", "they are"),
    ("I've", "I have"),
    ("you've", "you have"),
    ("we've", "we have"),
    ("they've", "they have"),
    ("I'll", "I will"),
    ("you'll", "you will"),
    ("he'll", "he will"),
    ("she'll", "she will"),
    ("it'll", "it will"),
    ("we'll", "we will"),
    ("they'll", "they will"),
    ("I'd", "I would"),
    ("you'd", "you would"),
    ("he'd", "he would"),
    ("she'd", "she would"),
    ("it'd", "it would"),
    ("we'd", "we would"),
    ("they'd", "they would"),
];

static CASUAL_WORDS: LazyLock<WordTable> = LazyLock::new(|| {
    word_table(&[
        ("kids", "children"),
        ("guys?", "individual(s)"),
        ("awesome", "excellent"),
        ("cool", "satisfactory"),
        ("got", "received"),
        ("huge", "significant"),
        ("a lot", "considerably"),
        ("stuff", "items"),
        ("things", "matters"),
        ("big", "substantial"),
        ("ad", "advertisement"),
        ("app", "application"),
        ("info", "information"),
        ("pic", "picture"),
        ("phone", "telephone"),
        ("email", "electronic mail"),
        ("good", "excellent"),
        ("bad", "unfavorable"),
        ("yeah", "yes"),
        ("nope", "no"),
    ])
});

/// Expands contractions and swaps casual words for formal ones.
pub struct FormalRule;

impl RewriteRule for FormalRule {
    fn id(&self) -> &'static str {
        "formal"
    }

    fn keywords(&self) -> &'static [&'static str] {
        &["formal", "professional", "business"]
    }

    fn rewrite(&self, text: &str) -> String {
        let expanded = CONTRACTIONS
            .iter()
            .fold(text.to_string(), |out, (short, long)| out.replace(short, long));
        replace_words(&CASUAL_WORDS, &expanded)
    }
}

static PRONOUN_ORDER: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\b(me|him|her|them|us)\b\s+(and|or)\s+\b(I|he|she|they|we)\b")
});
static AGREEMENT: LazyLock<WordTable> = LazyLock::new(|| {
    [
        ("they was", "they were"),
        ("I is", "I am"),
        ("you is", "you are"),
        ("he are", "he is"),
        ("she are", "she is"),
        ("it are", "it is"),
        ("I were", "I was"),
    ]
    .iter()
    .map(|&(wrong, right)| (regex(&format!(r"(?i)\b{wrong}\b")), right))
    .collect()
});
static THERE_IS_PLURAL: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)\bthere's\s+(\w+\s+\w+)\b"));
static SPACE_BEFORE_COMMA: LazyLock<Regex> = LazyLock::new(|| regex(r"\s+,"));
static SPACE_BEFORE_PERIOD: LazyLock<Regex> = LazyLock::new(|| regex(r"\s+\."));
static REPEATED_PERIODS: LazyLock<Regex> = LazyLock::new(|| regex(r"\.{2,}"));
// The period and its trailing space collapse to ". ." ahead of the letter,
// which keeps its case.
static LOWERCASE_AFTER_PERIOD: LazyLock<Regex> = LazyLock::new(|| regex(r"\.\s*([a-z])"));

/// Fixes pronoun order, subject-verb agreement, and punctuation spacing.
pub struct GrammarRule;

impl RewriteRule for GrammarRule {
    fn id(&self) -> &'static str {
        "grammar"
    }

    fn keywords(&self) -> &'static [&'static str] {
        &["grammar", "spelling", "correct"]
    }

    fn rewrite(&self, text: &str) -> String {
        let out = PRONOUN_ORDER.replace_all(text, |caps: &Captures<'_>| {
            format!("{} {} {}", caps[3].to_lowercase(), &caps[2], &caps[1])
        });
        let out = AGREEMENT
            .iter()
            .fold(out.into_owned(), |out, (regex, replacement)| {
                regex.replace_all(&out, *replacement).into_owned()
            });
        let out = THERE_IS_PLURAL.replace_all(&out, "there are ${1}");
        let out = SPACE_BEFORE_COMMA.replace_all(&out, ",");
        let out = space_after_commas(&out);
        let out = SPACE_BEFORE_PERIOD.replace_all(&out, ".");
        let out = REPEATED_PERIODS.replace_all(&out, ".");
        LOWERCASE_AFTER_PERIOD
            .replace_all(&out, ". .${1}")
            .into_owned()
    }
}

static PLAIN_WORDS: LazyLock<WordTable> = LazyLock::new(|| {
    word_table(&[
        ("utilize", "use"),
        ("facilitate", "help"),
        ("undertake", "do"),
        ("purchase", "buy"),
        ("obtain", "get"),
        ("commence", "start"),
        ("terminate", "end"),
        ("implement", "use"),
        ("requisite", "needed"),
        ("alleviate", "ease"),
        ("mitigate", "reduce"),
        ("elucidate", "explain"),
        ("procure", "get"),
        ("excogitate", "think"),
        ("exacerbate", "worsen"),
        ("ameliorative", "improving"),
        ("delineate", "describe"),
        ("expostulate", "argue"),
    ])
});
static FOUR_ITEM_LIST: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(\w+),\s+(\w+),\s+(\w+),\s+and\s+(\w+)"));
static THREE_ITEM_LIST: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(\w+),\s+(\w+),\s+and\s+(\w+)"));
static TRANSITION: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\b(however|moreover|furthermore|consequently|additionally)\b")
});

/// Swaps long words for plain ones and breaks up long sentences.
pub struct SimplifyRule;

impl RewriteRule for SimplifyRule {
    fn id(&self) -> &'static str {
        "simplify"
    }

    fn keywords(&self) -> &'static [&'static str] {
        &["simple", "simplify", "easy"]
    }

    fn rewrite(&self, text: &str) -> String {
        let out = replace_words(&PLAIN_WORDS, text);
        if out.chars().count() <= 80 {
            return out;
        }
        let out = FOUR_ITEM_LIST.replace_all(&out, "${1}, ${2}, and ${3}. Also, ${4}");
        let out = THREE_ITEM_LIST.replace_all(&out, "${1}, ${2}, and ${3}");
        TRANSITION
            .replace_all(&out, |caps: &Captures<'_>| {
                format!(". {}", capitalize(&caps[1]))
            })
            .into_owned()
    }
}

static VIVID_WORDS: LazyLock<WordTable> = LazyLock::new(|| {
    word_table(&[
        ("team", "dedicated team"),
        ("goal", "ambitious goal"),
        ("plan", "comprehensive plan"),
        ("approach", "strategic approach"),
        ("result", "significant result"),
        ("problem", "challenging problem"),
        ("solution", "innovative solution"),
        ("quickly", "remarkably quickly"),
        ("carefully", "meticulously"),
        ("completely", "thoroughly and completely"),
        ("improve", "substantially improve"),
        ("increase", "dramatically increase"),
        ("decrease", "significantly decrease"),
    ])
});

const CONTEXT_MARKER: &str = "This is important because";
const CONTEXT_SENTENCE: &str = " This is important because it provides essential context and additional information that enhances understanding and appreciation of the subject matter.";

/// Adds descriptive words and a closing context sentence.
pub struct ElaborateRule;

impl RewriteRule for ElaborateRule {
    fn id(&self) -> &'static str {
        "elaborate"
    }

    fn keywords(&self) -> &'static [&'static str] {
        &["elaborate", "expand", "detailed"]
    }

    fn rewrite(&self, text: &str) -> String {
        let mut out = replace_words(&VIVID_WORDS, text);
        if !out.contains(CONTEXT_MARKER) {
            out.push_str(CONTEXT_SENTENCE);
        }
        out
    }
}
