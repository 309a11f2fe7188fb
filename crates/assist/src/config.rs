use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    /// Prompts remembered per session, most recent first.
    pub history_limit: usize,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self { history_limit: 10 }
    }
}
