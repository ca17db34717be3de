use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DFA_STATES: usize = 4096;

/// Per-call knobs. Every request may carry them; absent fields take the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Upper bound on constructed DFA states; `None` disables the guard.
    pub max_dfa_states: Option<usize>,
    pub record_steps: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            max_dfa_states: Some(DEFAULT_MAX_DFA_STATES),
            record_steps: true,
        }
    }
}

impl ConvertOptions {
    pub fn unbounded() -> Self {
        ConvertOptions {
            max_dfa_states: None,
            ..ConvertOptions::default()
        }
    }

    pub(crate) fn allows(&self, state_count: usize) -> bool {
        self.max_dfa_states.map_or(true, |limit| state_count <= limit)
    }
}
