use crate::domain::model::{FilterState, FilterValue};
use crate::domain::schema::{FieldKind, FilterSchema};
use url::form_urlencoded;

/// Splits `/path?query#fragment` into path and query.
pub fn split_url(url: &str) -> (&str, &str) {
    let url = url.split('#').next().unwrap_or(url);
    match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    }
}

/// Reads a query string (with or without the leading `?`) into filter state.
///
/// Repeated multi-valued keys are merged; for scalars the last occurrence wins.
pub fn decode(schema: &FilterSchema, query: &str) -> FilterState {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut state = FilterState::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if schema.is_multi(&key) {
            let mut tokens = state.tokens(&key);
            tokens.extend(schema.split_tokens(&key, &value));
            state = state.with_tokens(&key, tokens);
        } else {
            state = state.with_scalar(&key, value.into_owned());
        }
    }

    let state = canonicalize(schema, &state);
    tracing::debug!("Decoded {} filter keys from '{}'", state.len(), query);
    state
}

/// Applies the schema's normalization to every recognized key. Unknown keys
/// pass through untouched.
pub fn canonicalize(schema: &FilterSchema, state: &FilterState) -> FilterState {
    let mut next = state.clone();
    for (key, value) in state.iter() {
        let Some(field) = schema.field(key) else {
            continue;
        };
        next = match field.kind {
            FieldKind::Multi => {
                let tokens: Vec<String> = value
                    .tokens()
                    .into_iter()
                    .flat_map(|raw| schema.split_tokens(key, raw))
                    .collect();
                next.with_tokens(key, tokens)
            }
            FieldKind::Single => {
                let raw = match value {
                    FilterValue::Scalar(scalar) => scalar.clone(),
                    FilterValue::Tokens(tokens) => tokens.join(","),
                };
                match schema.normalize_scalar(key, Some(&raw)) {
                    Some(normalized) => next.with_scalar(key, normalized),
                    None => next.without(key),
                }
            }
        };
    }
    next
}

/// Serializes state into a query string without the leading `?`. Keys come
/// out sorted; multi-valued tokens keep their order and are joined with a
/// literal comma.
pub fn encode(schema: &FilterSchema, state: &FilterState) -> String {
    let state = canonicalize(schema, state);
    let mut pairs = Vec::with_capacity(state.len());

    for (key, value) in state.iter() {
        let encoded_value = match value {
            FilterValue::Scalar(scalar) => escape(scalar),
            FilterValue::Tokens(tokens) => tokens
                .iter()
                .map(|t| escape(t))
                .collect::<Vec<_>>()
                .join(","),
        };
        pairs.push(format!("{}={}", escape(key), encoded_value));
    }

    pairs.join("&")
}

fn escape(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Joins a base path and an encoded query.
pub fn to_url(base_path: &str, query: &str) -> String {
    if query.is_empty() {
        base_path.to_string()
    } else {
        format!("{}?{}", base_path, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_multi_and_single() {
        let schema = FilterSchema::jobs();
        let state = decode(
            &schema,
            "?category=plumbing,electrical&location=Abuja%20Central&urgent=1",
        );

        assert_eq!(state.tokens("category"), vec!["plumbing", "electrical"]);
        assert_eq!(state.scalar("location"), Some("Abuja Central"));
        assert_eq!(state.scalar("urgent"), Some("1"));
    }

    #[test]
    fn test_single_token_stays_a_set() {
        let schema = FilterSchema::jobs();
        let state = decode(&schema, "type=full_time");
        assert_eq!(
            state.get("type"),
            Some(&FilterValue::Tokens(vec!["full_time".to_string()]))
        );
        assert_eq!(encode(&schema, &state), "type=full_time");
    }

    #[test]
    fn test_sentinels_never_survive() {
        let schema = FilterSchema::jobs();
        let state = decode(&schema, "date_posted=0&category=all&salary=&sort=newest");
        assert_eq!(encode(&schema, &state), "sort=newest");
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let schema = FilterSchema::jobs();
        let state = decode(&schema, "ref=newsletter&category=plumbing");
        assert_eq!(state.scalar("ref"), Some("newsletter"));
        assert_eq!(encode(&schema, &state), "category=plumbing&ref=newsletter");
    }

    #[test]
    fn test_repeated_multi_keys_merge() {
        let schema = FilterSchema::jobs();
        let state = decode(&schema, "type=full_time&type=contract,full_time");
        assert_eq!(state.tokens("type"), vec!["full_time", "contract"]);
    }

    #[test]
    fn test_encode_escapes_tokens_but_not_separator() {
        let schema = FilterSchema::jobs();
        let state = FilterState::new()
            .with_tokens("salary", ["10000+", "1000-2000"])
            .with_scalar("location", "Port Harcourt");
        assert_eq!(
            encode(&schema, &state),
            "location=Port+Harcourt&salary=10000%2B,1000-2000"
        );
        let back = decode(&schema, &encode(&schema, &state));
        assert_eq!(back, state);
    }

    #[test]
    fn test_split_url() {
        assert_eq!(split_url("/jobs?page=2#top"), ("/jobs", "page=2"));
        assert_eq!(split_url("/jobs"), ("/jobs", ""));
        assert_eq!(to_url("/jobs", ""), "/jobs");
        assert_eq!(to_url("/jobs", "urgent=1"), "/jobs?urgent=1");
    }
}
