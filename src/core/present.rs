//! Display helpers for server-supplied records: icons, labels, meta text and
//! the not-found fallback.

use crate::core::hierarchy::CategoryHierarchy;
use crate::utils::error::{MarketError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const CURRENCY_SYMBOL: &str = "$";
pub const META_DESCRIPTION_LIMIT: usize = 160;

static RANGE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d+)\s*|(\+))?\s*$").expect("range token pattern")
});

/// Icon names keyed by category (or listing type), with a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconSet {
    #[serde(default = "default_icon")]
    pub default: String,
    #[serde(flatten)]
    pub icons: BTreeMap<String, String>,
}

fn default_icon() -> String {
    "tag".to_string()
}

impl Default for IconSet {
    fn default() -> Self {
        Self {
            default: default_icon(),
            icons: BTreeMap::new(),
        }
    }
}

impl IconSet {
    pub fn lookup(&self, key: &str) -> &str {
        self.icons
            .get(key)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    /// A category's own icon wins over the table.
    pub fn for_category<'a>(&'a self, hierarchy: &'a CategoryHierarchy, id: &str) -> &'a str {
        hierarchy
            .category(id)
            .and_then(|c| c.icon.as_deref())
            .unwrap_or_else(|| self.lookup(id))
    }
}

/// `full_time` → `Full Time`.
pub fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapses whitespace and cuts to `limit` characters, preferring a word
/// boundary, with `...` appended when anything was dropped.
pub fn truncate_meta(text: &str, limit: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= limit {
        return collapsed;
    }

    if limit <= 3 {
        return collapsed.chars().take(limit).collect();
    }

    let keep = limit - 3;
    let cut: String = collapsed.chars().take(keep).collect();
    let trimmed = match cut.rfind(' ') {
        Some(space) if space > keep / 2 => &cut[..space],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end_matches([' ', ',', '.', ';', ':']))
}

/// `12500` → `12,500`.
pub fn group_thousands(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats `1000-2000`, `10000+` and `500` as money. Anything else is `None`.
pub fn currency_label(token: &str) -> Option<String> {
    let caps = RANGE_TOKEN.captures(token)?;
    let low: u64 = caps.get(1)?.as_str().parse().ok()?;
    let low = format!("{}{}", CURRENCY_SYMBOL, group_thousands(low));

    if let Some(high) = caps.get(2) {
        let high: u64 = high.as_str().parse().ok()?;
        return Some(format!("{} - {}{}", low, CURRENCY_SYMBOL, group_thousands(high)));
    }
    if caps.get(3).is_some() {
        return Some(format!("{}+", low));
    }
    Some(low)
}

/// `Label: value` when the value is present and not blank.
pub fn optional_field(label: &str, value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| format!("{}: {}", label, v))
}

pub fn not_found_message(resource: &str) -> String {
    format!("Sorry, this {} could not be found.", resource.replace('_', " "))
}

/// Turns a missing record into the not-found error.
pub fn require<T>(record: Option<T>, resource: &str) -> Result<T> {
    record.ok_or_else(|| MarketError::NotFound {
        resource: resource.to_string(),
    })
}
