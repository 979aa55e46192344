use crate::core::hierarchy::{self, CategoryHierarchy};
use crate::domain::model::FilterState;
use crate::domain::schema::{FieldKind, FilterSchema, ScalarInput};
use crate::utils::error::{MarketError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A single change a visitor makes to the filter sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    Set { key: String, value: Option<String> },
    Toggle { key: String, value: String },
    Remove { key: String, token: String },
    ClearAll,
}

impl Mutation {
    pub fn set(key: &str, value: Option<&str>) -> Self {
        Mutation::Set {
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }

    pub fn toggle(key: &str, value: &str) -> Self {
        Mutation::Toggle {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn remove(key: &str, token: &str) -> Self {
        Mutation::Remove {
            key: key.to_string(),
            token: token.to_string(),
        }
    }
}

/// Pure filter transitions for one page schema. Every transition returns a
/// new state with pagination dropped.
#[derive(Debug, Clone, Default)]
pub struct Facets {
    schema: FilterSchema,
    hierarchy: CategoryHierarchy,
}

impl Facets {
    pub fn new(schema: FilterSchema, hierarchy: CategoryHierarchy) -> Self {
        Self { schema, hierarchy }
    }

    pub fn schema(&self) -> &FilterSchema {
        &self.schema
    }

    pub fn hierarchy(&self) -> &CategoryHierarchy {
        &self.hierarchy
    }

    pub fn apply(&self, state: &FilterState, mutation: &Mutation) -> FilterState {
        match mutation {
            Mutation::Set { key, value } => self.set_filter(state, key, value.as_deref()),
            Mutation::Toggle { key, value } => self.toggle_member(state, key, value),
            Mutation::Remove { key, token } => self.remove_filter(state, key, token),
            Mutation::ClearAll => self.clear_all(state),
        }
    }

    /// Rejects mutations a visitor cannot produce from the sidebar: unknown
    /// keys and preserved route parameters.
    pub fn check(&self, mutation: &Mutation) -> Result<()> {
        let key = match mutation {
            Mutation::Set { key, .. }
            | Mutation::Toggle { key, .. }
            | Mutation::Remove { key, .. } => key,
            Mutation::ClearAll => return Ok(()),
        };
        if self.schema.is_preserved(key) {
            return Err(MarketError::InvalidFilter {
                key: key.clone(),
                reason: "route parameters cannot be changed from the filters".to_string(),
            });
        }
        if !self.schema.is_recognized(key) {
            return Err(MarketError::InvalidFilter {
                key: key.clone(),
                reason: "not a filter on this page".to_string(),
            });
        }
        Ok(())
    }

    fn reset_page(&self, state: FilterState) -> FilterState {
        state.without(&self.schema.page_key)
    }

    fn is_parent(&self, key: &str) -> bool {
        self.schema.cascade.parent == key
    }

    fn is_child(&self, key: &str) -> bool {
        self.schema.cascade.child == key
    }

    /// Sets a field outright. `None`, blank and sentinel values clear it. For
    /// multi-valued fields the value is read as a comma list and the category
    /// cascade is applied to whatever was added or dropped.
    pub fn set_filter(&self, state: &FilterState, key: &str, value: Option<&str>) -> FilterState {
        let next = if self.schema.is_multi(key) {
            let tokens = value
                .map(|raw| self.schema.split_tokens(key, raw))
                .unwrap_or_default();
            self.replace_tokens(state, key, tokens)
        } else {
            match self.schema.classify_scalar(key, value) {
                ScalarInput::Value(normalized) => state.with_scalar(key, normalized),
                ScalarInput::Absent => state.without(key),
                ScalarInput::Rejected => return state.clone(),
            }
        };

        tracing::debug!("set_filter {}={:?}", key, value);
        self.reset_page(next)
    }

    fn replace_tokens(&self, state: &FilterState, key: &str, tokens: Vec<String>) -> FilterState {
        let keys = &self.schema.cascade;
        if self.is_parent(key) {
            let dropped: Vec<String> = state
                .tokens(key)
                .into_iter()
                .filter(|c| !tokens.contains(c))
                .collect();
            let mut next = state.with_tokens(key, tokens);
            for category in &dropped {
                next = hierarchy::remove_category(&next, &self.hierarchy, keys, category);
            }
            next
        } else if self.is_child(key) {
            let mut next = state.without(key);
            for role in &tokens {
                next = hierarchy::add_sub_role(&next, &self.hierarchy, keys, role);
            }
            next
        } else {
            state.with_tokens(key, tokens)
        }
    }

    /// Checkbox toggle. Single-valued fields act as a radio that can be
    /// switched off by selecting the current value again.
    pub fn toggle_member(&self, state: &FilterState, key: &str, value: &str) -> FilterState {
        let value = value.trim();
        if value.is_empty() || value.contains(',') {
            tracing::warn!("Ignoring toggle of '{}' with unusable value '{}'", key, value);
            return state.clone();
        }
        if self.schema.is_multi(key) && self.schema.is_sentinel_token(key, value) {
            tracing::warn!("Ignoring toggle of sentinel '{}' on '{}'", value, key);
            return state.clone();
        }

        let keys = &self.schema.cascade;
        let next = match self.schema.kind(key) {
            Some(FieldKind::Multi) => {
                if state.has_token(key, value) {
                    self.drop_token(state, key, value)
                } else if self.is_child(key) {
                    hierarchy::add_sub_role(state, &self.hierarchy, keys, value)
                } else if self.is_parent(key) {
                    hierarchy::add_category(state, keys, value)
                } else {
                    let mut tokens = state.tokens(key);
                    tokens.push(value.to_string());
                    state.with_tokens(key, tokens)
                }
            }
            _ => {
                if state.scalar(key) == Some(value) {
                    state.without(key)
                } else {
                    match self.schema.classify_scalar(key, Some(value)) {
                        ScalarInput::Value(normalized) => state.with_scalar(key, normalized),
                        ScalarInput::Absent => state.without(key),
                        ScalarInput::Rejected => return state.clone(),
                    }
                }
            }
        };

        tracing::debug!("toggle_member {}:{}", key, value);
        self.reset_page(next)
    }

    fn drop_token(&self, state: &FilterState, key: &str, token: &str) -> FilterState {
        let keys = &self.schema.cascade;
        if self.is_parent(key) {
            hierarchy::remove_category(state, &self.hierarchy, keys, token)
        } else if self.is_child(key) {
            hierarchy::remove_sub_role(state, keys, token)
        } else {
            let remaining = state.tokens(key).into_iter().filter(|t| t != token);
            state.with_tokens(key, remaining)
        }
    }

    /// Removes one active value, as a chip's close button does.
    pub fn remove_filter(&self, state: &FilterState, key: &str, token: &str) -> FilterState {
        let next = if self.schema.is_multi(key) {
            self.drop_token(state, key, token)
        } else if token.is_empty() || state.scalar(key) == Some(token) {
            state.without(key)
        } else {
            state.clone()
        };

        tracing::debug!("remove_filter {}:{}", key, token);
        self.reset_page(next)
    }

    /// Keeps only the immutable route parameters.
    pub fn clear_all(&self, state: &FilterState) -> FilterState {
        state.retain(|key, _| self.schema.is_preserved(key))
    }

    /// Absolute lower bound for `date_posted`, if one is active.
    pub fn date_posted_cutoff(
        &self,
        state: &FilterState,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let days: i64 = state.scalar("date_posted")?.parse().ok()?;
        if days <= 0 {
            return None;
        }
        now.checked_sub_signed(Duration::try_days(days)?)
    }
}
