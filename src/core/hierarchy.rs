use crate::domain::model::FilterState;
use crate::domain::schema::CascadeKeys;
use crate::utils::error::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRole {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sub_roles: Vec<SubRole>,
}

impl Category {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            icon: None,
            sub_roles: Vec::new(),
        }
    }

    pub fn with_sub_role(mut self, id: &str, label: &str) -> Self {
        self.sub_roles.push(SubRole {
            id: id.to_string(),
            label: label.to_string(),
        });
        self
    }
}

/// Two-level category tree. Every sub-role id belongs to exactly one category.
#[derive(Debug, Clone, Default)]
pub struct CategoryHierarchy {
    categories: Vec<Category>,
    parent_of: HashMap<String, usize>,
}

impl CategoryHierarchy {
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        let mut seen_categories = HashSet::new();
        let mut parent_of = HashMap::new();

        for (index, category) in categories.iter().enumerate() {
            if !seen_categories.insert(category.id.clone()) {
                return Err(MarketError::InvalidConfigValueError {
                    field: "categories".to_string(),
                    value: category.id.clone(),
                    reason: "Duplicate category id".to_string(),
                });
            }
            for role in &category.sub_roles {
                if let Some(previous) = parent_of.insert(role.id.clone(), index) {
                    return Err(MarketError::InvalidConfigValueError {
                        field: format!("categories.{}.sub_roles", category.id),
                        value: role.id.clone(),
                        reason: format!(
                            "Sub-role already belongs to category '{}'",
                            categories[previous].id
                        ),
                    });
                }
            }
        }

        Ok(Self {
            categories,
            parent_of,
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn parent_of(&self, sub_role: &str) -> Option<&str> {
        self.parent_of
            .get(sub_role)
            .map(|&index| self.categories[index].id.as_str())
    }

    pub fn sub_roles_of(&self, category: &str) -> Vec<&str> {
        self.category(category)
            .map(|c| c.sub_roles.iter().map(|r| r.id.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn category_label(&self, id: &str) -> Option<&str> {
        self.category(id).map(|c| c.label.as_str())
    }

    pub fn sub_role_label(&self, id: &str) -> Option<&str> {
        let &index = self.parent_of.get(id)?;
        self.categories[index]
            .sub_roles
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.label.as_str())
    }
}

fn with_token_added(state: &FilterState, key: &str, token: &str) -> FilterState {
    let mut tokens = state.tokens(key);
    if !tokens.iter().any(|t| t == token) {
        tokens.push(token.to_string());
    }
    state.with_tokens(key, tokens)
}

fn with_token_removed(state: &FilterState, key: &str, token: &str) -> FilterState {
    let tokens = state.tokens(key).into_iter().filter(|t| t != token);
    state.with_tokens(key, tokens)
}

pub fn add_category(state: &FilterState, keys: &CascadeKeys, category: &str) -> FilterState {
    with_token_added(state, &keys.parent, category)
}

/// Drops the category and every selected sub-role that belongs to it.
pub fn remove_category(
    state: &FilterState,
    hierarchy: &CategoryHierarchy,
    keys: &CascadeKeys,
    category: &str,
) -> FilterState {
    let next = with_token_removed(state, &keys.parent, category);
    let children = next
        .tokens(&keys.child)
        .into_iter()
        .filter(|role| hierarchy.parent_of(role) != Some(category));
    let next = next.with_tokens(&keys.child, children);
    tracing::debug!("Removed category '{}' and its sub-roles", category);
    next
}

/// Selects a sub-role, selecting its parent category too when it is missing.
pub fn add_sub_role(
    state: &FilterState,
    hierarchy: &CategoryHierarchy,
    keys: &CascadeKeys,
    sub_role: &str,
) -> FilterState {
    let next = with_token_added(state, &keys.child, sub_role);
    match hierarchy.parent_of(sub_role) {
        Some(parent) if !next.has_token(&keys.parent, parent) => {
            tracing::debug!("Selecting parent category '{}' for '{}'", parent, sub_role);
            add_category(&next, keys, parent)
        }
        _ => next,
    }
}

/// The parent category stays selected.
pub fn remove_sub_role(state: &FilterState, keys: &CascadeKeys, sub_role: &str) -> FilterState {
    with_token_removed(state, &keys.child, sub_role)
}
