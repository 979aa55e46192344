use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A filter value as it lives in the query string: a scalar for radio-style
/// fields, an ordered token set for checkbox-style fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(String),
    Tokens(Vec<String>),
}

impl FilterValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FilterValue::Scalar(value) => Some(value),
            FilterValue::Tokens(_) => None,
        }
    }

    /// Scalars read as a one-element token list.
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            FilterValue::Scalar(value) => vec![value.as_str()],
            FilterValue::Tokens(tokens) => tokens.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        match self {
            FilterValue::Scalar(value) => value == token,
            FilterValue::Tokens(tokens) => tokens.iter().any(|t| t == token),
        }
    }
}

/// Immutable snapshot of the filters applied to a listing page.
///
/// Keys with an empty scalar or an empty token set are never stored, so a
/// state always serializes without `key=` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    values: BTreeMap<String, FilterValue>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(FilterValue::as_scalar)
    }

    pub fn tokens(&self, key: &str) -> Vec<String> {
        self.values
            .get(key)
            .map(|v| v.tokens().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn has_token(&self, key: &str, token: &str) -> bool {
        self.values
            .get(key)
            .map(|v| v.contains(token))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn with_scalar(&self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            return self.without(key);
        }
        let mut next = self.clone();
        next.values.insert(key.to_string(), FilterValue::Scalar(value));
        next
    }

    /// Replaces the token set of `key`. Blank tokens are dropped and
    /// duplicates collapse onto their first occurrence.
    pub fn with_tokens<I, S>(&self, key: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for token in tokens {
            let token = token.into();
            let token = token.trim();
            if !token.is_empty() && !unique.iter().any(|t| t == token) {
                unique.push(token.to_string());
            }
        }

        if unique.is_empty() {
            return self.without(key);
        }
        let mut next = self.clone();
        next.values.insert(key.to_string(), FilterValue::Tokens(unique));
        next
    }

    pub fn without(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.values.remove(key);
        next
    }

    pub fn retain<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&str, &FilterValue) -> bool,
    {
        let mut next = self.clone();
        next.values.retain(|k, v| keep(k, v));
        next
    }
}

/// A navigation request produced by a filter mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    pub url: String,
    pub preserve_scroll: bool,
    pub preserve_state: bool,
    pub replace: bool,
}

impl Visit {
    pub fn preserving(url: String) -> Self {
        Self {
            url,
            preserve_scroll: true,
            preserve_state: true,
            replace: false,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.url.split_once('?').map(|(_, query)| query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_tokens_drops_blanks_and_duplicates() {
        let state = FilterState::new().with_tokens(
            "category",
            ["plumbing", " ", "plumbing", "electrical"],
        );
        assert_eq!(state.tokens("category"), vec!["plumbing", "electrical"]);
    }

    #[test]
    fn test_empty_values_are_never_stored() {
        let state = FilterState::new()
            .with_scalar("location", "Lagos")
            .with_tokens("category", ["plumbing"]);

        let cleared = state
            .with_scalar("location", "")
            .with_tokens("category", Vec::<String>::new());
        assert!(cleared.is_empty());
    }

    #[test]
    fn test_transitions_leave_original_untouched() {
        let state = FilterState::new().with_scalar("urgent", "1");
        let next = state.without("urgent");
        assert_eq!(state.scalar("urgent"), Some("1"));
        assert!(!next.contains_key("urgent"));
    }

    #[test]
    fn test_visit_query() {
        let visit = Visit::preserving("/jobs?urgent=1".to_string());
        assert_eq!(visit.query(), Some("urgent=1"));
        assert!(visit.preserve_scroll);
        assert_eq!(Visit::preserving("/jobs".to_string()).query(), None);
    }
}
