use serde_json::{json, Value};

use super::*;

fn full() -> Value {
    json!({
        "titulo": "x",
        "mecanica": "y",
        "descricao": "z",
        "segmentacao": "w",
        "periodo_inicio": "2024-01-01",
        "periodo_fim": "2024-01-31",
        "condicoes": "c",
        "recompensas": "r"
    })
}

/// `full()` with the given keys removed.
fn without(keys: &[&str]) -> Value {
    let mut value = full();
    if let Value::Object(map) = &mut value {
        for key in keys {
            map.remove(*key);
        }
    }
    value
}

fn with(key: &str, field_value: Value) -> Value {
    let mut value = full();
    value[key] = field_value;
    value
}

// ---------------------------------------------------------------------------
// is_complete
// ---------------------------------------------------------------------------

#[test]
fn full_record_is_complete() {
    assert!(is_complete(&full()));
}

#[test]
fn each_missing_required_field_makes_record_incomplete() {
    for key in [
        "titulo",
        "mecanica",
        "descricao",
        "periodo_inicio",
        "periodo_fim",
        "condicoes",
        "recompensas",
    ] {
        assert!(
            !is_complete(&without(&[key])),
            "record without {key} should be incomplete"
        );
        assert!(
            !is_complete(&with(key, json!("   "))),
            "whitespace-only {key} should count as absent"
        );
        assert!(
            !is_complete(&with(key, Value::Null)),
            "null {key} should count as absent"
        );
    }
}

#[test]
fn segmentation_accepts_publico_alvo() {
    let mut record = with("segmentacao", json!(""));
    record["publico_alvo"] = json!("SP");
    assert!(is_complete(&record));
}

#[test]
fn segmentation_missing_when_both_blank() {
    let mut record = with("segmentacao", json!(" "));
    record["publico_alvo"] = json!("\t");
    assert!(!is_complete(&record));
    assert_eq!(missing_fields(&record), vec!["Segmentação"]);
}

#[test]
fn malformed_inputs_are_incomplete() {
    assert!(!is_complete(&json!({})));
    assert!(!is_complete(&Value::Null));
    assert!(!is_complete(&None::<Value>));
    assert!(!is_complete(&json!("titulo")));
    assert!(!is_complete(&json!(42)));
    assert!(!is_complete(&json!([full()])));
}

#[test]
fn numeric_values_are_coerced_to_text() {
    let record = with("condicoes", json!(0));
    assert!(is_complete(&record), "numeric zero is not special");
    let record = with("recompensas", json!(10.5));
    assert!(is_complete(&record));
}

#[test]
fn empty_array_value_counts_as_absent() {
    let record = with("condicoes", json!([]));
    assert!(!is_complete(&record));
    let record = with("condicoes", json!(["a", "b"]));
    assert!(is_complete(&record));
}

#[test]
fn typed_record_follows_the_same_rules() {
    let mut record: PromotionRecord =
        serde_json::from_value(full()).expect("fixture should deserialize");
    assert!(is_complete(&record));

    record.segmentacao = None;
    record.publico_alvo = Some("Atacado".to_owned());
    assert!(is_complete(&record));

    record.periodo_fim = Some("  ".to_owned());
    assert!(!is_complete(&record));
    assert_eq!(missing_fields(&record), vec!["Data Fim"]);
}

// ---------------------------------------------------------------------------
// missing_fields / progress
// ---------------------------------------------------------------------------

#[test]
fn missing_fields_in_declaration_order() {
    let record = json!({ "descricao": "d", "condicoes": "c" });
    assert_eq!(
        missing_fields(&record),
        vec![
            "Título",
            "Mecânica",
            "Segmentação",
            "Data Início",
            "Data Fim",
            "Recompensas"
        ]
    );
}

#[test]
fn missing_fields_for_invalid_input_lists_all_labels() {
    let expected: Vec<&str> = RequiredField::ALL.iter().map(|f| f.label()).collect();
    assert_eq!(missing_fields(&Value::Null), expected);
    assert_eq!(missing_fields(&json!([1, 2])), expected);
}

#[test]
fn only_end_date_missing() {
    let record = without(&["periodo_fim"]);
    assert_eq!(missing_fields(&record), vec!["Data Fim"]);
    assert!(!is_complete(&record));
}

#[test]
fn missing_count_matches_progress() {
    let fixtures = [
        full(),
        json!({}),
        Value::Null,
        without(&["titulo", "mecanica", "publico_alvo"]),
        without(&["segmentacao", "condicoes", "recompensas"]),
        json!({ "titulo": " ", "mecanica": "m" }),
    ];
    for record in &fixtures {
        assert_eq!(
            missing_fields(record).len(),
            REQUIRED_FIELD_COUNT - progress(record).filled,
            "mismatch for {record}"
        );
    }
}

#[test]
fn progress_full_record_is_100() {
    assert_eq!(
        progress(&full()),
        Progress {
            filled: 8,
            total: 8,
            percentage: 100
        }
    );
}

#[test]
fn progress_invalid_input_is_zero() {
    assert_eq!(
        progress(&Value::Null),
        Progress {
            filled: 0,
            total: 8,
            percentage: 0
        }
    );
}

#[test]
fn progress_rounds_half_up() {
    // 1/8 = 12.5% -> 13, 3/8 = 37.5% -> 38, 5/8 = 62.5% -> 63
    assert_eq!(progress(&json!({ "titulo": "t" })).percentage, 13);
    assert_eq!(
        progress(&json!({ "titulo": "t", "mecanica": "m", "descricao": "d" })).percentage,
        38
    );
    assert_eq!(
        progress(&without(&["titulo", "mecanica", "descricao"])).percentage,
        63
    );
    assert_eq!(progress(&without(&["titulo", "mecanica"])).percentage, 75);
}

// ---------------------------------------------------------------------------
// all_complete / aggregate_progress
// ---------------------------------------------------------------------------

#[test]
fn all_complete_empty_is_false() {
    assert!(!all_complete::<Value>(&[]));
    assert!(!all_complete(records_of(&json!([]))));
}

#[test]
fn all_complete_non_sequence_is_false() {
    assert!(!all_complete(records_of(&full())));
    assert!(!all_complete(records_of(&Value::Null)));
}

#[test]
fn all_complete_requires_every_record() {
    assert!(all_complete(&[full(), full()]));
    assert!(!all_complete(&[full(), without(&["recompensas"])]));
    assert!(all_complete(records_of(&json!([full(), full()]))));
}

#[test]
fn aggregate_progress_mixed_records() {
    let partial = without(&["periodo_inicio", "periodo_fim", "condicoes", "recompensas"]);
    assert_eq!(progress(&partial).filled, 4);

    let agg = aggregate_progress(&[full(), partial]);
    assert_eq!(
        agg,
        AggregateProgress {
            total_filled: 12,
            total_fields: 16,
            percentage: 75,
            completed_count: 1,
            total_count: 2,
        }
    );
}

#[test]
fn aggregate_progress_empty_is_zero() {
    let agg = aggregate_progress::<Value>(&[]);
    assert_eq!(agg.total_fields, 0);
    assert_eq!(agg.percentage, 0);
    assert_eq!(agg.total_count, 0);
    assert_eq!(agg.completed_count, 0);
}

// ---------------------------------------------------------------------------
// Purity
// ---------------------------------------------------------------------------

#[test]
fn evaluator_is_idempotent_and_does_not_mutate() {
    let single = without(&["descricao"]);
    let many = vec![full(), single.clone(), Value::Null];
    let single_before = single.clone();
    let many_before = many.clone();

    assert_eq!(is_complete(&single), is_complete(&single));
    assert_eq!(missing_fields(&single), missing_fields(&single));
    assert_eq!(progress(&single), progress(&single));
    assert_eq!(all_complete(&many), all_complete(&many));
    assert_eq!(aggregate_progress(&many), aggregate_progress(&many));

    assert_eq!(single, single_before);
    assert_eq!(many, many_before);
}
