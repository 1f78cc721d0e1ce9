//! Interactive chat loop.
//!
//! Reads one line at a time from stdin. Plain text goes to the agent; lines
//! starting with `/` are local commands. Each line is fully handled before
//! the next one is read.

use std::collections::HashMap;
use std::path::PathBuf;

use promoagente_client::PromoClient;
use promoagente_core::{PromotionRecord, SessionStore};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::controller::{ChatController, TurnOutcome};
use crate::render;

const HELP: &str = "\
Comandos:
  /new                         nova promoção (nova sessão)
  /confirm                     confirma a promoção em preview
  /export                      pede ao agente a planilha da promoção atual
  /export-session              exporta as promoções confirmadas nesta sessão
  /export-all                  exporta todas as promoções
  /history                     lista as promoções confirmadas nesta sessão
  /show <id>                   mostra uma promoção do histórico
  /edit <id> <campo> <valor>   altera um campo (valor vazio limpa)
  /save <id>                   salva as alterações feitas com /edit
  /status                      estado dos serviços do backend
  /help                        esta ajuda
  /quit                        sair";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReplCommand {
    Say(String),
    New,
    Confirm,
    Export,
    ExportSession,
    ExportAll,
    History,
    Show(String),
    Edit {
        id: String,
        field: String,
        value: String,
    },
    Save(String),
    Status,
    Help,
    Quit,
    Invalid(String),
}

impl ReplCommand {
    pub(crate) fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return ReplCommand::Say(line.to_owned());
        };
        let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let args = args.trim();

        match name {
            "new" => ReplCommand::New,
            "confirm" => ReplCommand::Confirm,
            "export" => ReplCommand::Export,
            "export-session" => ReplCommand::ExportSession,
            "export-all" => ReplCommand::ExportAll,
            "history" => ReplCommand::History,
            "status" => ReplCommand::Status,
            "help" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            "show" if !args.is_empty() => ReplCommand::Show(args.to_owned()),
            "save" if !args.is_empty() => ReplCommand::Save(args.to_owned()),
            "edit" => {
                let mut parts = args.splitn(3, char::is_whitespace);
                match (parts.next(), parts.next()) {
                    (Some(id), Some(field)) if !id.is_empty() && !field.is_empty() => {
                        ReplCommand::Edit {
                            id: id.to_owned(),
                            field: field.to_owned(),
                            value: parts.next().unwrap_or_default().trim().to_owned(),
                        }
                    }
                    _ => ReplCommand::Invalid("uso: /edit <id> <campo> <valor>".to_owned()),
                }
            }
            other => ReplCommand::Invalid(format!("comando desconhecido: /{other} (veja /help)")),
        }
    }
}

/// Local edits waiting for `/save`, scoped to the session they were made in.
#[derive(Debug, Default)]
struct PendingEdits {
    session_id: Option<String>,
    records: HashMap<String, PromotionRecord>,
}

impl PendingEdits {
    /// Drops every pending edit when the controller has moved to another
    /// session, since the history they were based on is gone.
    fn follow_session(&mut self, session_id: Option<&str>) {
        if self.session_id.as_deref() != session_id {
            self.records.clear();
            self.session_id = session_id.map(str::to_owned);
        }
    }
}

/// Runs the chat until `/quit` or end of input.
///
/// # Errors
///
/// Returns an error only when stdin cannot be read.
pub(crate) async fn run_chat<S: SessionStore>(
    client: PromoClient,
    store: S,
    export_dir: PathBuf,
) -> anyhow::Result<()> {
    let status_client = client.clone();
    let mut chat = ChatController::new(client, store, export_dir);
    let mut edits = PendingEdits::default();
    edits.follow_session(chat.session_id());
    let mut printed = 0;

    println!("PromoAgente chat · /help para comandos");
    if let Some(session_id) = chat.session_id() {
        println!("sessão: {session_id}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        edits.follow_session(chat.session_id());
        match ReplCommand::parse(&line) {
            ReplCommand::Say(text) => {
                if let Some(outcome) = chat.send(&text).await {
                    printed = print_new_messages(&chat, printed);
                    print_turn(&chat, &outcome);
                }
            }
            ReplCommand::Export => {
                if let Some(outcome) = chat.export_current().await {
                    printed = print_new_messages(&chat, printed);
                    print_turn(&chat, &outcome);
                }
            }
            ReplCommand::Confirm => {
                chat.confirm().await;
                printed = print_new_messages(&chat, printed);
            }
            ReplCommand::New => {
                printed = 0;
                match chat.new_promotion() {
                    Ok(session_id) => println!("✨ Nova promoção · sessão {session_id}"),
                    Err(e) => eprintln!("{e:#}"),
                }
            }
            ReplCommand::ExportSession => match chat.export_session().await {
                Ok(path) => println!("📥 Planilha salva em {}", path.display()),
                Err(e) => eprintln!("{e:#}"),
            },
            ReplCommand::ExportAll => match chat.export_all().await {
                Ok((path, total)) => {
                    let total = total.map(|n| format!(" ({n} promoções)")).unwrap_or_default();
                    println!("📥 Planilha salva em {}{total}", path.display());
                }
                Err(e) => eprintln!("{e:#}"),
            },
            ReplCommand::History => println!("{}", render::history(chat.history())),
            ReplCommand::Show(id) => {
                match edits.records.get(&id).or_else(|| chat.history().get(&id)) {
                    Some(record) => println!("{}", render::record_detail(record)),
                    None => eprintln!("promoção {id} não está no histórico desta sessão"),
                }
            }
            ReplCommand::Edit { id, field, value } => {
                let Some(base) = chat.history().get(&id) else {
                    eprintln!("promoção {id} não está no histórico desta sessão");
                    continue;
                };
                let draft = edits.records.entry(id.clone()).or_insert_with(|| base.clone());
                match draft.set_field(&field, &value) {
                    Ok(()) => println!("campo {field} alterado; /save {id} para salvar"),
                    Err(e) => eprintln!("{e}"),
                }
            }
            ReplCommand::Save(id) => {
                let Some(edited) = edits.records.get(&id) else {
                    eprintln!("nenhuma alteração pendente para {id}");
                    continue;
                };
                match chat.update_promotion(edited).await {
                    Ok(record) => {
                        println!("✅ Promoção atualizada: {}", record.display_title());
                        edits.records.remove(&id);
                    }
                    Err(e) => eprintln!("Erro ao salvar promoção: {e:#}"),
                }
            }
            ReplCommand::Status => match status_client.fetch_status().await {
                Ok(status) => println!("{}", render::system_status(&status)),
                Err(e) => {
                    tracing::warn!(error = %e, "status request failed");
                    eprintln!("não foi possível obter o status: {e}");
                }
            },
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Quit => break,
            ReplCommand::Invalid(reason) => eprintln!("{reason}"),
        }
    }

    Ok(())
}

fn print_new_messages<B, S>(chat: &ChatController<B, S>, printed: usize) -> usize
where
    B: crate::controller::Backend,
    S: SessionStore,
{
    let messages = chat.messages();
    for msg in messages.iter().skip(printed) {
        println!("{}", render::message(msg, chat.state().collapses(msg)));
    }
    messages.len()
}

fn print_turn<B, S>(chat: &ChatController<B, S>, outcome: &TurnOutcome)
where
    B: crate::controller::Backend,
    S: SessionStore,
{
    if let Some(panel) = render::state_panel(chat.state()) {
        println!("\n{panel}\n");
    }
    if let Some(path) = &outcome.spreadsheet {
        println!("📥 Planilha salva em {}", path.display());
    }
    if outcome.completed {
        println!("🎉 Promoção concluída.");
    }
}
