//! Display classification for rendering promotion fields.
//!
//! This is presentation-only. It reuses the evaluator's presence checks but
//! never changes what [`crate::completeness::is_complete`] reports: the
//! preview view shows title and mechanic as soft warnings even though both
//! remain hard requirements for completeness.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::completeness::{FieldSource, RequiredField};
use crate::promotion::PromotionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    Ok,
    Missing,
    Warning,
}

/// Which rendering surface the classification is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayView {
    /// Confirm/export preview: title and mechanic are soft.
    Preview,
    /// In-progress draft: every required field is hard.
    Draft,
}

impl DisplayView {
    fn is_soft(self, field: RequiredField) -> bool {
        self == DisplayView::Preview
            && matches!(field, RequiredField::Title | RequiredField::Mechanic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDisplay {
    pub field: RequiredField,
    pub label: &'static str,
    pub value: Option<String>,
    pub status: FieldStatus,
}

/// Classifies each required field of `record` for `view`.
pub fn classify<R: FieldSource + ?Sized>(record: &R, view: DisplayView) -> Vec<FieldDisplay> {
    RequiredField::ALL
        .iter()
        .map(|&field| {
            let value = field.value(record);
            let status = match (&value, view.is_soft(field)) {
                (Some(_), _) => FieldStatus::Ok,
                (None, true) => FieldStatus::Warning,
                (None, false) => FieldStatus::Missing,
            };
            FieldDisplay {
                field,
                label: field.label(),
                value,
                status,
            }
        })
        .collect()
}

/// A notable optional field, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub label: &'static str,
    pub value: String,
}

/// Optional fields worth surfacing next to the required ones.
///
/// Only present, non-blank, non-zero values are listed.
#[must_use]
pub fn highlights(record: &PromotionRecord) -> Vec<Highlight> {
    let mut out = Vec::new();
    let mut push = |label: &'static str, value: Option<String>| {
        if let Some(value) = value {
            out.push(Highlight { label, value });
        }
    };
    let text = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    let nonzero = |v: Option<Decimal>| v.filter(|d| !d.is_zero());

    push("Canal", text(&record.canal));
    push(
        "Desconto",
        record
            .desconto_percentual
            .filter(|d| d.is_sign_positive() && !d.is_zero())
            .map(|d| format!("{}%", format_pt_br(d))),
    );
    push("Cluster", text(&record.cluster));
    push(
        "Qt. Mínima",
        nonzero(record.qt_minima).map(|d| format!("{} cxs", format_pt_br(d))),
    );
    push("Ticket Mínimo", nonzero(record.ticket_minimo).map(format_brl));
    push("Ticket Máximo", nonzero(record.ticket_maximo).map(format_brl));
    push("Volume Mínimo", nonzero(record.volume_minimo).map(format_pt_br));
    push("Limite Verba", nonzero(record.limite_verba).map(format_brl));
    push(
        "Produtos",
        record
            .produtos
            .as_ref()
            .filter(|p| !p.is_empty())
            .map(|p| p.join(", ")),
    );
    out
}

/// Formats a number the way pt-BR locales do: `.` between thousands, `,`
/// before decimals, at most three decimal places.
#[must_use]
pub fn format_pt_br(value: Decimal) -> String {
    let rounded = value.round_dp(3).normalize();
    let digits = rounded.abs().to_string();
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{frac_part}")
    }
}

/// Formats a money amount as `R$ 1.234,5`.
#[must_use]
pub fn format_brl(value: Decimal) -> String {
    format!("R$ {}", format_pt_br(value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::completeness::is_complete;

    fn statuses(record: &serde_json::Value, view: DisplayView) -> Vec<FieldStatus> {
        classify(record, view).into_iter().map(|d| d.status).collect()
    }

    #[test]
    fn preview_marks_title_and_mechanic_as_warnings() {
        let record = json!({ "descricao": "d" });
        let got = statuses(&record, DisplayView::Preview);
        assert_eq!(got[0], FieldStatus::Warning);
        assert_eq!(got[1], FieldStatus::Warning);
        assert_eq!(got[2], FieldStatus::Ok);
        assert!(got[3..].iter().all(|s| *s == FieldStatus::Missing));
    }

    #[test]
    fn draft_marks_every_absent_field_missing() {
        let record = json!({ "descricao": "d" });
        let got = statuses(&record, DisplayView::Draft);
        assert_eq!(got[0], FieldStatus::Missing);
        assert_eq!(got[1], FieldStatus::Missing);
        assert_eq!(got[2], FieldStatus::Ok);
    }

    #[test]
    fn soft_warning_does_not_relax_the_hard_gate() {
        let record = json!({
            "descricao": "d", "segmentacao": "s", "periodo_inicio": "a",
            "periodo_fim": "b", "condicoes": "c", "recompensas": "r"
        });
        let got = statuses(&record, DisplayView::Preview);
        assert!(!got.contains(&FieldStatus::Missing));
        assert!(!is_complete(&record));
    }

    #[test]
    fn segmentation_value_comes_from_publico_alvo() {
        let record = json!({ "segmentacao": "", "publico_alvo": " Varejo " });
        let seg = &classify(&record, DisplayView::Draft)[3];
        assert_eq!(seg.field, RequiredField::Segmentation);
        assert_eq!(seg.value.as_deref(), Some("Varejo"));
        assert_eq!(seg.status, FieldStatus::Ok);
    }

    #[test]
    fn highlights_skip_blank_and_zero_values() {
        let record = PromotionRecord {
            canal: Some(" ".to_owned()),
            desconto_percentual: Some(Decimal::ZERO),
            ticket_minimo: Some(Decimal::new(150_050, 2)),
            produtos: Some(vec!["A".to_owned(), "B".to_owned()]),
            ..PromotionRecord::default()
        };
        let got = highlights(&record);
        assert_eq!(
            got,
            vec![
                Highlight {
                    label: "Ticket Mínimo",
                    value: "R$ 1.500,5".to_owned()
                },
                Highlight {
                    label: "Produtos",
                    value: "A, B".to_owned()
                },
            ]
        );
    }

    #[test]
    fn format_pt_br_groups_thousands() {
        assert_eq!(format_pt_br(Decimal::new(1_234_567, 0)), "1.234.567");
        assert_eq!(format_pt_br(Decimal::new(999, 0)), "999");
        assert_eq!(format_pt_br(Decimal::new(-12_345, 1)), "-1.234,5");
        assert_eq!(format_pt_br(Decimal::new(10_123_456, 4)), "1.012,346");
    }
}
