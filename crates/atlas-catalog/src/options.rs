use serde::{Deserialize, Serialize};

use crate::token::normalize_token;

/// One selectable entry: `value` is the identity token, `label` the text
/// shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self { value: normalize_token(&label), label }
    }
}

/// Display-ordered option list: sorted by label, no two entries share a
/// token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSet {
    options: Vec<SelectOption>,
}

impl OptionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from projected labels. The first label seen for a token wins.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options: Vec<SelectOption> = Vec::new();
        for label in labels {
            let option = SelectOption::new(label.as_ref());
            if !options.iter().any(|o| o.value == option.value) {
                options.push(option);
            }
        }
        options.sort_by(|a, b| a.label.cmp(&b.label));
        Self { options }
    }

    /// Look up an option by label or token.
    pub fn resolve(&self, value: &str) -> Option<&SelectOption> {
        let token = normalize_token(value);
        self.options.iter().find(|o| o.value == token)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.resolve(value).is_some()
    }

    pub fn first(&self) -> Option<&SelectOption> {
        self.options.first()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectOption> {
        self.options.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.label.as_str()).collect()
    }
}
