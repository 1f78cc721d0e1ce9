//! Field checks applied before an edited promotion is saved.
//!
//! Saving an edit only requires the validity period; the other completeness
//! fields may be blank on an already-confirmed promotion.

use std::collections::BTreeMap;

use crate::promotion::PromotionRecord;

/// Per-field error messages; empty when the record may be saved.
#[must_use]
pub fn update_errors(record: &PromotionRecord) -> BTreeMap<&'static str, &'static str> {
    let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());

    let mut errors = BTreeMap::new();
    if blank(&record.periodo_inicio) {
        errors.insert("periodo_inicio", "Data de início é obrigatória");
    }
    if blank(&record.periodo_fim) {
        errors.insert("periodo_fim", "Data de término é obrigatória");
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_dates_required() {
        let errors = update_errors(&PromotionRecord::default());
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("periodo_inicio"));
        assert!(errors.contains_key("periodo_fim"));
    }

    #[test]
    fn blank_end_date_is_reported() {
        let record = PromotionRecord {
            periodo_inicio: Some("2024-01-01".to_owned()),
            periodo_fim: Some("  ".to_owned()),
            ..PromotionRecord::default()
        };
        let errors = update_errors(&record);
        assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec!["periodo_fim"]);
    }

    #[test]
    fn dates_alone_are_enough() {
        let record = PromotionRecord {
            periodo_inicio: Some("2024-01-01".to_owned()),
            periodo_fim: Some("2024-01-31".to_owned()),
            ..PromotionRecord::default()
        };
        assert!(update_errors(&record).is_empty());
    }
}
