//! Proposals extracted from replies.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Answer the extraction model gives when a reply names nothing.
pub const NO_PROPOSAL: &str = "None";

/// Separator between names in one extraction answer.
const NAME_SEPARATOR: char = '|';

/// Extracted proposals keyed by author handle.
///
/// Values are the raw model answers, a `|`-separated list of full names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalResult {
    proposals: BTreeMap<String, String>,
}

impl ProposalResult {
    /// Check whether a model answer is the "nothing found" sentinel.
    pub fn is_no_proposal(answer: &str) -> bool {
        let answer = answer.trim().trim_matches(|c| c == '\'' || c == '"');
        answer.is_empty() || answer == NO_PROPOSAL
    }

    /// Build from raw answers, dropping sentinel and empty answers.
    pub fn from_answers<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            proposals: answers
                .into_iter()
                .filter(|(_, answer)| !Self::is_no_proposal(answer))
                .map(|(author, answer)| (author, answer.trim().to_string()))
                .collect(),
        }
    }

    pub fn get(&self, author: &str) -> Option<&str> {
        self.proposals.get(author).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.proposals.iter()
    }

    /// Names proposed by one author.
    pub fn names(&self, author: &str) -> Vec<&str> {
        self.get(author).map(split_names).unwrap_or_default()
    }

    /// Invert the result: each proposed name with the authors who proposed it.
    pub fn tally(&self) -> BTreeMap<String, Vec<String>> {
        let mut tally: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (author, answer) in &self.proposals {
            for name in split_names(answer) {
                let supporters = tally.entry(name.to_string()).or_default();
                if !supporters.contains(author) {
                    supporters.push(author.clone());
                }
            }
        }
        tally
    }
}

fn split_names(answer: &str) -> Vec<&str> {
    answer
        .split(NAME_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != NO_PROPOSAL)
        .collect()
}
