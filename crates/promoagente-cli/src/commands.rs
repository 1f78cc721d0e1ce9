//! One-shot subcommand handlers.
//!
//! Called from `main` once configuration and logging are set up. Each handler
//! prints its result to stdout and returns an error for anything the user
//! should see as a failure.

use std::path::Path;

use anyhow::Context as _;
use promoagente_client::PromoClient;
use promoagente_core::{
    new_session_id, records_of, AppConfig, FileSessionStore, PromotionRecord, SessionStore,
};
use serde_json::Value;

use crate::controller::ChatController;
use crate::render;
use crate::StateCommands;

fn build_client(config: &AppConfig) -> anyhow::Result<PromoClient> {
    PromoClient::new(
        &config.api_base_url,
        config.request_timeout_secs,
        &config.user_agent,
    )
    .with_context(|| format!("failed to build client for {}", config.api_base_url))
}

/// Interactive chat against the configured backend.
///
/// # Errors
///
/// Returns an error if the client cannot be built or stdin fails.
pub(crate) async fn run_chat(config: &AppConfig) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let store = FileSessionStore::new(&config.session_file);
    crate::repl::run_chat(client, store, config.export_dir.clone()).await
}

/// Sends one message in the stored session and prints the exchange.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the message is blank.
pub(crate) async fn run_send(config: &AppConfig, message: &str) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let store = FileSessionStore::new(&config.session_file);
    let mut chat = ChatController::new(client, store, &config.export_dir);

    let outcome = chat
        .send(message)
        .await
        .ok_or_else(|| anyhow::anyhow!("message is empty"))?;

    for msg in chat.messages().iter().skip(1) {
        println!("{}", render::message(msg, chat.state().collapses(msg)));
    }
    if let Some(panel) = render::state_panel(chat.state()) {
        println!("\n{panel}");
    }
    if let Some(path) = &outcome.spreadsheet {
        println!("\n📥 Planilha salva em {}", path.display());
    }
    if outcome.completed {
        println!("\n🎉 Promoção concluída.");
    }
    Ok(())
}

/// Prints backend health flags.
///
/// # Errors
///
/// Returns an error if the status request fails.
pub(crate) async fn run_status(config: &AppConfig) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let status = client
        .fetch_status()
        .await
        .context("failed to fetch backend status")?;
    println!("{}", render::system_status(&status));
    Ok(())
}

/// Lists stored promotions. An unreachable backend lists nothing.
///
/// # Errors
///
/// Returns an error if the client cannot be built.
pub(crate) async fn run_promotions(config: &AppConfig) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let promotions = client.fetch_promotions().await;
    println!("{}", render::promotions(&promotions));
    Ok(())
}

/// Replaces the stored session id with a fresh one.
///
/// # Errors
///
/// Returns an error if the session file cannot be written.
pub(crate) fn run_new_session(config: &AppConfig) -> anyhow::Result<()> {
    let mut store = FileSessionStore::new(&config.session_file);
    let session_id = new_session_id();
    store.set(&session_id)?;
    println!("{session_id}");
    Ok(())
}

/// Exports all stored promotions into the export directory.
///
/// # Errors
///
/// Returns an error if the export fails or the file cannot be written.
pub(crate) async fn run_export_all(config: &AppConfig) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let exported = client.export_all().await.context("export failed")?;
    let path = exported.file.write_into(&config.export_dir)?;
    match exported.total_promocoes {
        Some(total) => println!("{} ({total} promoções)", path.display()),
        None => println!("{}", path.display()),
    }
    Ok(())
}

/// Runs one promotion-state action for a session.
///
/// # Errors
///
/// Returns an error if no session is known or the request fails.
pub(crate) async fn run_state(
    config: &AppConfig,
    session: Option<&str>,
    command: StateCommands,
) -> anyhow::Result<()> {
    let session_id = match session {
        Some(id) => id.to_owned(),
        None => FileSessionStore::new(&config.session_file)
            .get()
            .context("no stored session; pass --session or start a chat first")?,
    };
    let client = build_client(config)?;

    let value = match command {
        StateCommands::Show => client.promotion_state(&session_id).await?,
        StateCommands::Validate => client.validate_promotion(&session_id).await?,
        StateCommands::Summary => {
            println!("{}", client.create_summary(&session_id).await?);
            return Ok(());
        }
        StateCommands::Save => client.save_promotion(&session_id).await?,
        StateCommands::Email => client.send_promotion_email(&session_id).await?,
        StateCommands::Reset => client.reset_promotion(&session_id).await?,
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Evaluates a JSON file of promotion data without contacting the backend.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON object or
/// array.
pub(crate) fn run_check(file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;
    let records = check_records(&value)?;
    println!("{}", render::completeness_report(&records));
    Ok(())
}

/// A top-level object is one record; an array is a list where entries that
/// are not objects count as empty records.
fn check_records(value: &Value) -> anyhow::Result<Vec<PromotionRecord>> {
    match value {
        Value::Object(_) => Ok(PromotionRecord::from_wire(value).into_iter().collect()),
        Value::Array(_) => Ok(records_of(value)
            .iter()
            .map(|item| PromotionRecord::from_wire(item).unwrap_or_default())
            .collect()),
        _ => anyhow::bail!("expected a JSON object or array of promotions"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn check_records_accepts_object_and_array() {
        assert_eq!(
            check_records(&json!({ "titulo": "A" }))
                .expect("object")
                .len(),
            1
        );
        let records = check_records(&json!([{ "titulo": "A" }, 42, null])).expect("array");
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], PromotionRecord::default());
    }

    #[test]
    fn check_records_rejects_scalars() {
        assert!(check_records(&json!("promo")).is_err());
    }

    #[test]
    fn run_check_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("promo.json");
        std::fs::write(&path, r#"{"titulo": "A"}"#).expect("write fixture");
        run_check(&path).expect("valid file");
    }

    #[test]
    fn run_new_session_persists_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session_file = dir.path().join("session");
        let config = AppConfig {
            api_base_url: "http://localhost:7000".to_owned(),
            env: promoagente_core::Environment::Test,
            log_level: "info".to_owned(),
            session_file: session_file.clone(),
            export_dir: dir.path().to_path_buf(),
            request_timeout_secs: 5,
            user_agent: "promoagente-test".to_owned(),
        };

        run_new_session(&config).expect("writes session file");
        let stored = FileSessionStore::new(&session_file).get();
        assert!(stored.is_some_and(|id| id.len() == 36));
    }
}
