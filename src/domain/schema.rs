use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel that every field treats as "no filter".
pub const ALL_SENTINEL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Radio-style, one value.
    Single,
    /// Checkbox-style, comma-joined ordered token list.
    Multi,
}

/// How raw tokens of a field turn into chip labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// Amounts and ranges: `1000-2000`, `10000+`, `500`.
    Currency,
    /// snake_case ids shown as Title Case.
    Title,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub label: Option<String>,
    /// Values equivalent to absence, in addition to `""` and `"all"`.
    #[serde(default)]
    pub sentinels: Vec<String>,
    /// When non-empty, the only values a single-valued field accepts.
    #[serde(default)]
    pub allowed: Vec<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub format: Option<ValueFormat>,
    #[serde(default = "default_true")]
    pub chip: bool,
}

fn default_true() -> bool {
    true
}

impl FieldSpec {
    pub fn single(key: &str) -> Self {
        Self::new(key, FieldKind::Single)
    }

    pub fn multi(key: &str) -> Self {
        Self::new(key, FieldKind::Multi)
    }

    fn new(key: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            kind,
            label: None,
            sentinels: Vec::new(),
            allowed: Vec::new(),
            options: BTreeMap::new(),
            format: None,
            chip: true,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_sentinel(mut self, sentinel: &str) -> Self {
        self.sentinels.push(sentinel.to_string());
        self
    }

    pub fn with_allowed(mut self, values: &[&str]) -> Self {
        self.allowed = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn with_option(mut self, value: &str, label: &str) -> Self {
        self.options.insert(value.to_string(), label.to_string());
        self
    }

    pub fn with_format(mut self, format: ValueFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn without_chip(mut self) -> Self {
        self.chip = false;
        self
    }

    pub fn is_sentinel(&self, value: &str) -> bool {
        value == ALL_SENTINEL || self.sentinels.iter().any(|s| s == value)
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.allowed.is_empty() || self.allowed.iter().any(|a| a == value)
    }
}

/// Outcome of checking one scalar against its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarInput {
    Value(String),
    /// Means "no filter": the key is cleared.
    Absent,
    /// Not an accepted value: the current filter stays as it is.
    Rejected,
}

/// Parent/child keys linked by the category hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeKeys {
    pub parent: String,
    pub child: String,
}

impl Default for CascadeKeys {
    fn default() -> Self {
        Self {
            parent: "category".to_string(),
            child: "sub_category".to_string(),
        }
    }
}

/// The filter fields one listing page recognizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSchema {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Immutable route parameters carried in the query (e.g. a store slug).
    #[serde(default)]
    pub preserve: Vec<String>,
    #[serde(default = "default_page_key")]
    pub page_key: String,
    #[serde(default)]
    pub cascade: CascadeKeys,
}

fn default_page_key() -> String {
    "page".to_string()
}

impl Default for FilterSchema {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            preserve: Vec::new(),
            page_key: default_page_key(),
            cascade: CascadeKeys::default(),
        }
    }
}

impl FilterSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn preserving(mut self, key: &str) -> Self {
        self.preserve.push(key.to_string());
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn kind(&self, key: &str) -> Option<FieldKind> {
        self.field(key).map(|f| f.kind)
    }

    pub fn is_multi(&self, key: &str) -> bool {
        self.kind(key) == Some(FieldKind::Multi)
    }

    pub fn is_recognized(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    pub fn is_preserved(&self, key: &str) -> bool {
        self.preserve.iter().any(|p| p == key)
    }

    /// Canonical check for single-valued input. `Absent` covers a missing or
    /// blank value, `all` and field sentinels (such as `date_posted=0`);
    /// `Rejected` is a value outside the field's allowed set.
    pub fn classify_scalar(&self, key: &str, value: Option<&str>) -> ScalarInput {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return ScalarInput::Absent;
        };

        let Some(field) = self.field(key) else {
            return ScalarInput::Value(value.to_string());
        };

        if field.is_sentinel(value) {
            return ScalarInput::Absent;
        }
        if !field.accepts(value) {
            tracing::warn!("Ignoring unsupported value '{}' for filter '{}'", value, key);
            return ScalarInput::Rejected;
        }
        ScalarInput::Value(value.to_string())
    }

    /// The value to store, or `None` when nothing should be stored.
    pub fn normalize_scalar(&self, key: &str, value: Option<&str>) -> Option<String> {
        match self.classify_scalar(key, value) {
            ScalarInput::Value(value) => Some(value),
            ScalarInput::Absent | ScalarInput::Rejected => None,
        }
    }

    /// Tokens of a multi-valued field that mean "no filter".
    pub fn is_sentinel_token(&self, key: &str, token: &str) -> bool {
        match self.field(key) {
            Some(field) => field.is_sentinel(token),
            None => token == ALL_SENTINEL,
        }
    }

    /// Splits a raw comma-joined value into tokens, dropping sentinels.
    pub fn split_tokens(&self, key: &str, raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .filter(|t| !self.is_sentinel_token(key, t))
            .map(str::to_string)
            .collect()
    }

    /// Jobs board sidebar.
    pub fn jobs() -> Self {
        Self::new(vec![
            FieldSpec::multi("category").with_label("Category"),
            FieldSpec::multi("sub_category").with_label("Role"),
            FieldSpec::multi("type")
                .with_label("Job Type")
                .with_option("full_time", "Full Time")
                .with_option("part_time", "Part Time")
                .with_option("contract", "Contract")
                .with_option("internship", "Internship"),
            FieldSpec::multi("salary")
                .with_label("Salary")
                .with_format(ValueFormat::Currency),
            FieldSpec::single("location").with_label("Location"),
            FieldSpec::single("urgent")
                .with_label("Urgent")
                .with_allowed(&["1"])
                .with_option("1", "Urgent"),
            FieldSpec::single("date_posted")
                .with_label("Date Posted")
                .with_sentinel("0")
                .with_allowed(&["0", "1", "7", "14", "30"])
                .with_option("1", "Last 24 hours")
                .with_option("7", "Last 7 days")
                .with_option("14", "Last 14 days")
                .with_option("30", "Last 30 days"),
            sort_field(),
        ])
    }

    /// Marketplace store search, scoped to one store slug.
    pub fn store_search() -> Self {
        Self::new(vec![
            FieldSpec::single("q").with_label("Search"),
            FieldSpec::multi("category").with_label("Category"),
            FieldSpec::multi("sub_category").with_label("Subcategory"),
            FieldSpec::single("min_price")
                .with_label("Min price")
                .with_format(ValueFormat::Currency),
            FieldSpec::single("max_price")
                .with_label("Max price")
                .with_format(ValueFormat::Currency),
            sort_field(),
        ])
        .preserving("store")
    }
}

fn sort_field() -> FieldSpec {
    FieldSpec::single("sort")
        .with_label("Sort")
        .with_allowed(&["newest", "price_low", "price_high", "name"])
        .with_option("newest", "Newest")
        .with_option("price_low", "Price: Low to High")
        .with_option("price_high", "Price: High to Low")
        .with_option("name", "Name")
        .without_chip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_posted_zero_is_absent() {
        let schema = FilterSchema::jobs();
        assert_eq!(schema.normalize_scalar("date_posted", Some("0")), None);
        assert_eq!(schema.normalize_scalar("date_posted", Some("all")), None);
        assert_eq!(schema.normalize_scalar("date_posted", None), None);
        assert_eq!(
            schema.normalize_scalar("date_posted", Some("7")),
            Some("7".to_string())
        );
    }

    #[test]
    fn test_disallowed_values_are_dropped() {
        let schema = FilterSchema::jobs();
        assert_eq!(schema.normalize_scalar("sort", Some("cheapest")), None);
        assert_eq!(schema.normalize_scalar("urgent", Some("yes")), None);
        assert_eq!(
            schema.normalize_scalar("sort", Some("price_low")),
            Some("price_low".to_string())
        );
    }

    #[test]
    fn test_classify_separates_absent_from_rejected() {
        let schema = FilterSchema::jobs();
        assert_eq!(schema.classify_scalar("date_posted", Some("0")), ScalarInput::Absent);
        assert_eq!(schema.classify_scalar("sort", Some(" ")), ScalarInput::Absent);
        assert_eq!(schema.classify_scalar("sort", Some("cheapest")), ScalarInput::Rejected);
        assert_eq!(
            schema.classify_scalar("sort", Some("name")),
            ScalarInput::Value("name".to_string())
        );
    }

    #[test]
    fn test_unknown_keys_only_reject_blank() {
        let schema = FilterSchema::jobs();
        assert_eq!(
            schema.normalize_scalar("utm_source", Some("all")),
            Some("all".to_string())
        );
        assert_eq!(schema.normalize_scalar("utm_source", Some("  ")), None);
    }

    #[test]
    fn test_split_tokens() {
        let schema = FilterSchema::jobs();
        assert_eq!(
            schema.split_tokens("category", "plumbing,,all, electrical"),
            vec!["plumbing", "electrical"]
        );
        assert_eq!(schema.split_tokens("category", "plumbing"), vec!["plumbing"]);
    }

    #[test]
    fn test_store_search_preserves_slug() {
        let schema = FilterSchema::store_search();
        assert!(schema.is_preserved("store"));
        assert!(!schema.is_recognized("store"));
        assert!(schema.is_multi("category"));
    }

    #[test]
    fn test_schema_from_toml() {
        let schema: FilterSchema = toml::from_str(
            r#"
preserve = ["store"]

[[fields]]
key = "category"
kind = "multi"

[[fields]]
key = "date_posted"
kind = "single"
sentinels = ["0"]
options = { "7" = "Last 7 days" }
"#,
        )
        .unwrap();

        assert_eq!(schema.page_key, "page");
        assert_eq!(schema.cascade, CascadeKeys::default());
        assert!(schema.is_multi("category"));
        let date = schema.field("date_posted").unwrap();
        assert!(date.chip);
        assert!(date.is_sentinel("0"));
        assert_eq!(date.options.get("7").map(String::as_str), Some("Last 7 days"));
    }
}
