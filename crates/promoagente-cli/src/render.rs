//! Plain-text renderers for the terminal.
//!
//! Every function returns a `String` so output can be asserted in tests; the
//! callers decide where to print it.

use chrono::Local;
use promoagente_client::SystemStatus;
use promoagente_core::{
    classify, highlights, missing_fields, progress, ChatMessage, ConversationState, DisplayView,
    FieldStatus, PromotionPayload, PromotionRecord, Role, SessionHistory,
};

/// Characters of a collapsed message kept in the transcript.
const COLLAPSED_PREVIEW_CHARS: usize = 120;

/// Column width for titles in list views.
const TITLE_WIDTH: usize = 40;

pub(crate) fn message(msg: &ChatMessage, collapsed: bool) -> String {
    let time = msg.timestamp.with_timezone(&Local).format("%H:%M");
    let who = match msg.role {
        Role::User => "Você",
        Role::Agent => "PromoAgente",
    };
    if collapsed {
        let first_line = msg.content.lines().next().unwrap_or_default();
        let short: String = first_line.chars().take(COLLAPSED_PREVIEW_CHARS).collect();
        format!("[{time}] {who}: {short} … (mensagem recolhida, veja o resumo abaixo)")
    } else {
        format!("[{time}] {who}: {}", msg.content)
    }
}

/// The panel shown under the transcript: the confirm/export preview once the
/// draft is complete and validated, the in-progress draft otherwise.
pub(crate) fn state_panel(state: &ConversationState) -> Option<String> {
    let payload = state.payload.as_ref()?;
    if state.should_show_preview() {
        Some(preview(payload, state.allows_export()))
    } else if payload.has_structured_data() {
        Some(draft(payload))
    } else {
        None
    }
}

pub(crate) fn preview(payload: &PromotionPayload, allows_export: bool) -> String {
    let records = payload.records();
    let mut lines = vec![if payload.is_multiple() {
        format!("✅ {} promoções prontas para confirmação", records.len())
    } else {
        "✅ Promoção pronta para confirmação".to_owned()
    }];

    for (index, record) in records.iter().enumerate() {
        if payload.is_multiple() {
            lines.push(format!("\n#{} {}", index + 1, record.display_title()));
        }
        lines.extend(fields(record, DisplayView::Preview));
        lines.extend(highlight_lines(record));
    }

    let mut actions = "\n/confirm para confirmar".to_owned();
    if allows_export {
        actions.push_str(" · /export para gerar Excel");
    }
    lines.push(actions);
    lines.join("\n")
}

pub(crate) fn draft(payload: &PromotionPayload) -> String {
    let mut lines = vec![if payload.is_multiple() {
        "📝 Promoções em progresso...".to_owned()
    } else {
        "📝 Promoção em progresso...".to_owned()
    }];

    for record in payload.records() {
        if payload.is_multiple() {
            lines.push(format!("\n{}", record.display_title()));
        }
        lines.extend(fields(record, DisplayView::Draft));
        let p = progress(record);
        lines.push(format!(
            "  📊 Progresso: {} de {} campos obrigatórios preenchidos ({}%)",
            p.filled, p.total, p.percentage
        ));
    }

    if payload.is_multiple() {
        let agg = payload.progress();
        lines.push(format!(
            "\nTotal: {}/{} campos ({}%) · {}/{} promoções completas",
            agg.total_filled, agg.total_fields, agg.percentage, agg.completed_count, agg.total_count
        ));
    }
    lines.join("\n")
}

fn fields(record: &PromotionRecord, view: DisplayView) -> Vec<String> {
    classify(record, view)
        .into_iter()
        .map(|field| {
            let (mark, value) = match (field.status, field.value) {
                (FieldStatus::Ok, Some(v)) => ("✓", v),
                (FieldStatus::Warning, _) => ("!", "(recomendado)".to_owned()),
                (_, _) => ("✗", "(pendente)".to_owned()),
            };
            let label = format!("{}:", field.label);
            format!("  {mark} {label:<13}{value}")
        })
        .collect()
}

fn highlight_lines(record: &PromotionRecord) -> impl Iterator<Item = String> {
    highlights(record)
        .into_iter()
        .map(|highlight| format!("  • {}: {}", highlight.label, highlight.value))
}

pub(crate) fn history(history: &SessionHistory) -> String {
    if history.is_empty() {
        return "Nenhuma promoção confirmada nesta sessão ainda.".to_owned();
    }
    let header = format!(
        "{:<38}{:<w$}{:<20}PERÍODO",
        "ID",
        "TÍTULO",
        "SEGMENTO",
        w = TITLE_WIDTH + 2
    );
    let rows = history.recent_first().map(|record| {
        format!(
            "{:<38}{:<w$}{:<20}{}",
            record.id.as_deref().unwrap_or("\u{2014}"),
            truncate(record.display_title(), TITLE_WIDTH),
            truncate(record.display_segment(), 18),
            period(record),
            w = TITLE_WIDTH + 2
        )
    });
    std::iter::once(header).chain(rows).collect::<Vec<_>>().join("\n")
}

/// Every field of one record, for the edit flow.
pub(crate) fn record_detail(record: &PromotionRecord) -> String {
    let mut lines = vec![record.display_title().to_owned()];
    lines.extend(fields(record, DisplayView::Draft));
    lines.extend(highlight_lines(record));
    if let Some(status) = record.status.as_deref() {
        lines.push(format!("  status: {status}"));
    }
    lines.join("\n")
}

pub(crate) fn promotions(records: &[PromotionRecord]) -> String {
    if records.is_empty() {
        return "nenhuma promoção encontrada".to_owned();
    }
    let header = format!(
        "{:<w$}{:<20}{:<12}PERÍODO",
        "TÍTULO",
        "SEGMENTO",
        "STATUS",
        w = TITLE_WIDTH + 2
    );
    let rows = records.iter().map(|record| {
        format!(
            "{:<w$}{:<20}{:<12}{}",
            truncate(record.display_title(), TITLE_WIDTH),
            truncate(record.display_segment(), 18),
            record.status.as_deref().unwrap_or("\u{2014}"),
            period(record),
            w = TITLE_WIDTH + 2
        )
    });
    std::iter::once(header).chain(rows).collect::<Vec<_>>().join("\n")
}

pub(crate) fn system_status(status: &SystemStatus) -> String {
    let mut summary = vec![format!(
        "Sistema: {}",
        if status.system_ready { "pronto" } else { "indisponível" }
    )];
    if !status.openai_model.is_empty() {
        summary.push(format!("modelo {}", status.openai_model));
    }
    if !status.environment.is_empty() {
        summary.push(format!("ambiente {}", status.environment));
    }

    let mut lines = vec![summary.join(" · ")];
    for (label, online) in status.components() {
        lines.push(format!("  {} {label}", if online { "●" } else { "○" }));
    }
    if let Some(error) = status.agno_status_error.as_deref() {
        lines.push(format!("  Agno: {error}"));
    }
    lines.push(format!(
        "Mensagens: {} · Promoções: {}",
        status.messages_stored, status.promotions_count
    ));
    lines.join("\n")
}

/// Offline completeness report for a record or array of records.
pub(crate) fn completeness_report(records: &[PromotionRecord]) -> String {
    let mut lines: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let p = progress(record);
            let missing = missing_fields(record);
            let verdict = if missing.is_empty() {
                "completa".to_owned()
            } else {
                format!("faltando: {}", missing.join(", "))
            };
            format!(
                "{:>3}. {:<w$} {}/{} ({:>3}%)  {verdict}",
                index + 1,
                truncate(record.display_title(), TITLE_WIDTH),
                p.filled,
                p.total,
                p.percentage,
                w = TITLE_WIDTH
            )
        })
        .collect();
    let agg = promoagente_core::aggregate_progress(records);
    lines.push(format!(
        "Total: {}/{} campos ({}%) · {}/{} completas",
        agg.total_filled, agg.total_fields, agg.percentage, agg.completed_count, agg.total_count
    ));
    lines.join("\n")
}

fn period(record: &PromotionRecord) -> String {
    let start = record.periodo_inicio.as_deref().unwrap_or("?");
    let end = record.periodo_fim.as_deref().unwrap_or("?");
    format!("{start} a {end}")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use promoagente_core::FlowStatus;
    use serde_json::json;

    use super::*;

    fn state(status: &str, data: serde_json::Value) -> ConversationState {
        ConversationState::from_wire(Some(&json!({ "data": data })), Some(status))
    }

    fn full() -> serde_json::Value {
        json!({
            "titulo": "Leve 3 Pague 2",
            "mecanica": "progressiva",
            "descricao": "d",
            "segmentacao": "Varejo",
            "periodo_inicio": "2025-03-01",
            "periodo_fim": "2025-03-31",
            "condicoes": "c",
            "recompensas": "r",
            "canal": "Atacado",
            "desconto_percentual": 12.5
        })
    }

    #[test]
    fn complete_validated_state_renders_preview() {
        let panel = state_panel(&state("validated", full())).expect("panel");
        assert!(panel.starts_with("✅ Promoção pronta"));
        assert!(panel.contains("• Canal: Atacado"));
        assert!(panel.contains("• Desconto: 12,5%"));
        assert!(!panel.contains("/export"));
    }

    #[test]
    fn ready_state_offers_export() {
        let panel = state_panel(&state("ready", full())).expect("panel");
        assert!(panel.contains("/export para gerar Excel"));
    }

    #[test]
    fn gathering_state_renders_draft_with_progress() {
        let data = json!({ "titulo": "Leve 3", "periodo_inicio": "2025-03-01" });
        let panel = state_panel(&state("gathering", data)).expect("panel");
        assert!(panel.starts_with("📝 Promoção em progresso"));
        assert!(panel.contains("2 de 8 campos obrigatórios preenchidos (25%)"));
        assert!(panel.contains("✗ Mecânica:"));
    }

    #[test]
    fn empty_draft_renders_nothing() {
        let s = state("draft", json!({ "observacoes": "x" }));
        assert_eq!(s.status, FlowStatus::Draft);
        assert!(state_panel(&s).is_none());
    }

    #[test]
    fn collapsed_message_keeps_first_line_only() {
        let msg = ChatMessage::agent(format!("Resumo\n{}", "x".repeat(300)));
        let line = message(&msg, true);
        assert!(line.contains("PromoAgente: Resumo …"));
        assert!(!line.contains("xxx"));
    }

    #[test]
    fn empty_history_has_placeholder() {
        assert_eq!(
            history(&SessionHistory::default()),
            "Nenhuma promoção confirmada nesta sessão ainda."
        );
    }

    #[test]
    fn history_lists_most_recent_first() {
        let mut h = SessionHistory::default();
        for (id, title) in [("1", "Primeira"), ("2", "Segunda")] {
            h.push(PromotionRecord {
                id: Some(id.to_owned()),
                titulo: Some(title.to_owned()),
                ..PromotionRecord::default()
            });
        }
        let out = history(&h);
        let first = out.find("Segunda").expect("listed");
        let second = out.find("Primeira").expect("listed");
        assert!(first < second);
    }

    #[test]
    fn system_status_lists_components_and_counts() {
        let status = SystemStatus {
            system_ready: true,
            openai: true,
            openai_model: "gpt-4o".to_owned(),
            agno_status_error: Some("timeout".to_owned()),
            messages_stored: 12,
            promotions_count: 3,
            ..SystemStatus::default()
        };
        let out = system_status(&status);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Sistema: pronto · modelo gpt-4o");
        assert_eq!(lines[1], "  ● OpenAI");
        assert_eq!(lines[2], "  ○ Agno");
        assert!(out.contains("\n  Agno: timeout\n"));
        assert_eq!(lines.last().copied(), Some("Mensagens: 12 · Promoções: 3"));
    }

    #[test]
    fn multiple_draft_ends_with_aggregate() {
        let data = json!({ "multiple_promotions": [full(), { "titulo": "Outra" }] });
        let panel = state_panel(&state("gathering", data)).expect("panel");
        assert!(panel.starts_with("📝 Promoções em progresso"));
        assert!(panel.ends_with("Total: 9/16 campos (56%) · 1/2 promoções completas"));
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("promoção", 20), "promoção");
        assert_eq!(truncate("ããããããã", 5), "ãã...");
    }

    #[test]
    fn completeness_report_totals() {
        let records = vec![
            PromotionRecord::from_wire(&full()).expect("object"),
            PromotionRecord::default(),
        ];
        let out = completeness_report(&records);
        assert!(out.contains("completa"));
        assert!(out.contains("faltando: Título"));
        assert!(out.ends_with("Total: 8/16 campos (50%) · 1/2 completas"));
    }
}
