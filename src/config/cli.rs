use crate::core::chips::ActiveChip;
use crate::core::hierarchy::CategoryHierarchy;
use crate::core::present::IconSet;
use crate::domain::model::Visit;
use crate::domain::payload::{Attachment, FormPayload, PayloadValue};
use crate::domain::ports::Navigator;
use crate::utils::error::Result;
use std::collections::BTreeMap;

/// Prints each navigation for the terminal user.
#[derive(Debug, Clone, Default)]
pub struct StdoutNavigator;

impl Navigator for StdoutNavigator {
    fn visit(&self, visit: &Visit) {
        println!("{}", visit.url);
    }
}

pub fn parse_key_val(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.trim().is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

/// Builds a payload from `--field`, `--list` and `--file` arguments. A file
/// key given more than once becomes a `key[]` list.
pub fn build_payload(
    fields: &[(String, String)],
    lists: &[(String, String)],
    files: &[(String, String)],
) -> Result<FormPayload> {
    let mut payload = FormPayload::new();
    for (key, value) in fields {
        payload.set(key, PayloadValue::Text(value.clone()));
    }
    for (key, value) in lists {
        let items: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        payload.set(key, PayloadValue::List(items));
    }

    let mut grouped: BTreeMap<&str, Vec<Attachment>> = BTreeMap::new();
    for (key, path) in files {
        grouped
            .entry(key.as_str())
            .or_default()
            .push(Attachment::from_path(path)?);
    }
    for (key, mut attachments) in grouped {
        let value = if attachments.len() == 1 {
            PayloadValue::File(attachments.remove(0))
        } else {
            PayloadValue::Files(attachments)
        };
        payload.set(key, value);
    }

    Ok(payload)
}

pub fn format_chip(chip: &ActiveChip, icons: &IconSet, hierarchy: &CategoryHierarchy) -> String {
    if hierarchy.category(&chip.token).is_some() {
        format!(
            "[{}] {}  ({}={})",
            icons.for_category(hierarchy, &chip.token),
            chip.label,
            chip.key,
            chip.token
        )
    } else {
        format!("{}  ({}={})", chip.label, chip.key, chip.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("hotel=12").unwrap(),
            ("hotel".to_string(), "12".to_string())
        );
        assert_eq!(
            parse_key_val("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_build_payload_groups_files() {
        let mut one = NamedTempFile::with_suffix(".png").unwrap();
        one.write_all(b"a").unwrap();
        let mut two = NamedTempFile::with_suffix(".png").unwrap();
        two.write_all(b"b").unwrap();
        let path = |f: &NamedTempFile| f.path().to_str().unwrap().to_string();

        let payload = build_payload(
            &[("name".to_string(), "Ikoyi Lodge".to_string())],
            &[("remove_images".to_string(), "3, 4".to_string())],
            &[
                ("images".to_string(), path(&one)),
                ("images".to_string(), path(&two)),
                ("cover".to_string(), path(&one)),
            ],
        )
        .unwrap();

        assert_eq!(
            payload.get("remove_images"),
            Some(&PayloadValue::List(vec!["3".to_string(), "4".to_string()]))
        );
        assert!(matches!(payload.get("images"), Some(PayloadValue::Files(f)) if f.len() == 2));
        assert!(matches!(payload.get("cover"), Some(PayloadValue::File(_))));
    }
}
