//! Completeness evaluator for promotion records.
//!
//! A promotion is complete when all eight required checks pass. Each check
//! coerces the field value to text and requires it to be non-blank after
//! trimming. The segmentation check passes on either `segmentacao` or
//! `publico_alvo`.
//!
//! Every function here is pure and never panics on malformed input: an absent
//! record, `null`, or a non-object value simply has no fields present.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use crate::promotion::PromotionRecord;

/// One of the eight checks that make up completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Title,
    Mechanic,
    Description,
    Segmentation,
    StartDate,
    EndDate,
    Conditions,
    Rewards,
}

impl RequiredField {
    /// All checks, in declaration order. Labels are reported in this order.
    pub const ALL: [RequiredField; 8] = [
        RequiredField::Title,
        RequiredField::Mechanic,
        RequiredField::Description,
        RequiredField::Segmentation,
        RequiredField::StartDate,
        RequiredField::EndDate,
        RequiredField::Conditions,
        RequiredField::Rewards,
    ];

    /// Wire keys that satisfy this check; any one of them is enough.
    #[must_use]
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            RequiredField::Title => &["titulo"],
            RequiredField::Mechanic => &["mecanica"],
            RequiredField::Description => &["descricao"],
            RequiredField::Segmentation => &["segmentacao", "publico_alvo"],
            RequiredField::StartDate => &["periodo_inicio"],
            RequiredField::EndDate => &["periodo_fim"],
            RequiredField::Conditions => &["condicoes"],
            RequiredField::Rewards => &["recompensas"],
        }
    }

    /// Human-readable label shown to users.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RequiredField::Title => "Título",
            RequiredField::Mechanic => "Mecânica",
            RequiredField::Description => "Descrição",
            RequiredField::Segmentation => "Segmentação",
            RequiredField::StartDate => "Data Início",
            RequiredField::EndDate => "Data Fim",
            RequiredField::Conditions => "Condições",
            RequiredField::Rewards => "Recompensas",
        }
    }

    /// Returns `true` when `record` satisfies this check.
    pub fn is_present<R: FieldSource + ?Sized>(self, record: &R) -> bool {
        self.value(record).is_some()
    }

    /// The first non-blank value satisfying this check, trimmed.
    pub fn value<R: FieldSource + ?Sized>(self, record: &R) -> Option<String> {
        self.keys().iter().find_map(|key| {
            record
                .field_text(key)
                .map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty())
        })
    }
}

/// Number of required checks per record.
pub const REQUIRED_FIELD_COUNT: usize = RequiredField::ALL.len();

/// Read access to a record's fields as text.
///
/// Implemented for the typed [`PromotionRecord`] and for raw JSON, so the
/// same rules apply to data straight off the wire and to edited copies.
pub trait FieldSource {
    /// The value of `field` coerced to text, or `None` when the field is
    /// absent or null.
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>>;
}

impl FieldSource for PromotionRecord {
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        self.text_field(field).map(Cow::Borrowed)
    }
}

impl FieldSource for Value {
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match self {
            Value::Object(map) => map.get(field).and_then(coerce_text),
            _ => None,
        }
    }
}

impl<T: FieldSource + ?Sized> FieldSource for &T {
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        (**self).field_text(field)
    }
}

impl<T: FieldSource> FieldSource for Option<T> {
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        self.as_ref().and_then(|inner| inner.field_text(field))
    }
}

/// Coerces a JSON value to text: numbers and booleans use their JSON form,
/// arrays join their elements with `,`, objects are always non-blank.
pub(crate) fn coerce_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Array(items) => Some(Cow::Owned(
            items
                .iter()
                .map(|item| coerce_text(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        )),
        Value::Object(_) => Some(Cow::Borrowed("[object]")),
    }
}

/// Fill progress for a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub filled: usize,
    pub total: usize,
    pub percentage: usize,
}

/// Combined fill progress for a sequence of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateProgress {
    pub total_filled: usize,
    pub total_fields: usize,
    pub percentage: usize,
    pub completed_count: usize,
    pub total_count: usize,
}

/// Returns `true` when every required check passes.
pub fn is_complete<R: FieldSource + ?Sized>(record: &R) -> bool {
    RequiredField::ALL
        .iter()
        .all(|field| field.is_present(record))
}

/// Labels of the failing checks, in declaration order.
pub fn missing_fields<R: FieldSource + ?Sized>(record: &R) -> Vec<&'static str> {
    RequiredField::ALL
        .iter()
        .filter(|field| !field.is_present(record))
        .map(|field| field.label())
        .collect()
}

/// How many of the eight checks pass, and the rounded percentage.
pub fn progress<R: FieldSource + ?Sized>(record: &R) -> Progress {
    let filled = RequiredField::ALL
        .iter()
        .filter(|field| field.is_present(record))
        .count();
    Progress {
        filled,
        total: REQUIRED_FIELD_COUNT,
        percentage: rounded_percentage(filled, REQUIRED_FIELD_COUNT),
    }
}

/// Returns `true` when the sequence is non-empty and every record is complete.
pub fn all_complete<R: FieldSource>(records: &[R]) -> bool {
    !records.is_empty() && records.iter().all(is_complete)
}

/// Sums [`progress`] over `records`. An empty sequence reports 0%.
pub fn aggregate_progress<R: FieldSource>(records: &[R]) -> AggregateProgress {
    let (total_filled, completed_count) =
        records.iter().fold((0, 0), |(filled, completed), record| {
            let p = progress(record);
            let done = usize::from(p.filled == p.total);
            (filled + p.filled, completed + done)
        });
    let total_fields = REQUIRED_FIELD_COUNT * records.len();

    AggregateProgress {
        total_filled,
        total_fields,
        percentage: rounded_percentage(total_filled, total_fields),
        completed_count,
        total_count: records.len(),
    }
}

/// Views a raw JSON value as a sequence of records; anything that is not an
/// array is an empty sequence.
#[must_use]
pub fn records_of(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        _ => &[],
    }
}

/// `round(100 * part / whole)` with halves rounded up; 0 when `whole` is 0.
fn rounded_percentage(part: usize, whole: usize) -> usize {
    if whole == 0 {
        return 0;
    }
    (200 * part + whole) / (2 * whole)
}

#[cfg(test)]
#[path = "completeness_test.rs"]
mod tests;
