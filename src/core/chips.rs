use crate::core::facets::{Facets, Mutation};
use crate::core::present;
use crate::domain::model::FilterState;
use crate::domain::schema::{FieldKind, FieldSpec, ValueFormat};
use serde::Serialize;

/// One removable token in the "active filters" strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveChip {
    pub key: String,
    pub token: String,
    pub label: String,
}

impl ActiveChip {
    pub fn removal(&self) -> Mutation {
        Mutation::remove(&self.key, &self.token)
    }
}

/// Chips in schema field order, then token order. Preserved route
/// parameters, unknown keys and fields with `chip = false` are skipped.
pub fn active_chips(facets: &Facets, state: &FilterState) -> Vec<ActiveChip> {
    let schema = facets.schema();
    let mut chips = Vec::new();

    for field in schema.fields.iter().filter(|f| f.chip) {
        if schema.is_preserved(&field.key) {
            continue;
        }
        let Some(value) = state.get(&field.key) else {
            continue;
        };
        for token in value.tokens() {
            chips.push(ActiveChip {
                key: field.key.clone(),
                token: token.to_string(),
                label: chip_label(facets, field, token),
            });
        }
    }

    chips
}

/// Label lookup falls back to the raw id.
pub fn chip_label(facets: &Facets, field: &FieldSpec, token: &str) -> String {
    let schema = facets.schema();
    let hierarchy = facets.hierarchy();

    let known = if field.key == schema.cascade.parent {
        hierarchy.category_label(token).map(str::to_string)
    } else if field.key == schema.cascade.child {
        hierarchy.sub_role_label(token).map(str::to_string)
    } else {
        None
    };
    if let Some(label) = known {
        return label;
    }
    if let Some(label) = field.options.get(token) {
        return label.clone();
    }

    let formatted = match field.format {
        Some(ValueFormat::Currency) => present::currency_label(token),
        Some(ValueFormat::Title) => Some(present::title_case(token)),
        None => None,
    };
    let value = formatted.unwrap_or_else(|| token.to_string());

    // free-text and amount scalars read better with their field name
    match (&field.kind, &field.label) {
        (FieldKind::Single, Some(label)) if field.options.is_empty() => {
            format!("{}: {}", label, value)
        }
        _ => value,
    }
}
