//! `campusbot doctor`: diagnose configuration, data, and upstream reachability.

use campusbot_config::AppConfig;
use campusbot_core::provider::Provider;
use campusbot_knowledge::KnowledgeStore;
use campusbot_providers::OpenAiCompatProvider;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug)]
pub struct Check {
    pub status: Status,
    pub message: String,
}

impl Check {
    fn ok(message: impl Into<String>) -> Self {
        Self { status: Status::Ok, message: message.into() }
    }
    fn warn(message: impl Into<String>) -> Self {
        Self { status: Status::Warn, message: message.into() }
    }
    fn fail(message: impl Into<String>) -> Self {
        Self { status: Status::Fail, message: message.into() }
    }
}

/// Local checks: key presence and the knowledge files.
pub fn local_checks(config: &AppConfig) -> Vec<Check> {
    let mut checks = Vec::new();

    match config.api_key.as_deref().map(str::len) {
        Some(len) if len > 0 => checks.push(Check::ok(format!("API key configured ({len} chars)"))),
        _ => checks.push(Check::fail("No API key: set OPENAI_API_KEY or api_key in the config")),
    }

    if config.secret().is_some() {
        checks.push(Check::ok("Admin secret configured"));
    } else {
        checks.push(Check::warn("No APP_SECRET: /admin/reload-data is open to anyone"));
    }

    if config.knowledge.data_dir.is_dir() {
        checks.push(Check::ok(format!(
            "Data directory {}",
            config.knowledge.data_dir.display()
        )));
    } else {
        checks.push(Check::warn(format!(
            "Data directory {} missing",
            config.knowledge.data_dir.display()
        )));
    }

    let store = KnowledgeStore::from_config(&config.knowledge);
    let report = store.reload();
    match report.catalog_error {
        None => checks.push(Check::ok(format!("Catalog loaded: {} programs", report.programs))),
        Some(e) => checks.push(Check::warn(format!("Catalog not loaded: {e}"))),
    }
    if report.notes_len > 0 {
        checks.push(Check::ok(format!("Notes loaded: {} chars", report.notes_len)));
    } else {
        checks.push(Check::warn("No notes found; prompts will carry the placeholder"));
    }

    let index = config.gateway.public_dir.join("index.html");
    if index.is_file() {
        checks.push(Check::ok(format!("Static client {}", index.display())));
    } else {
        checks.push(Check::warn(format!("Static client {} missing", index.display())));
    }

    checks
}

/// Ask the upstream whether it accepts our credentials.
pub async fn upstream_check(provider: Arc<dyn Provider>) -> Check {
    match tokio::time::timeout(Duration::from_secs(10), provider.health_check()).await {
        Ok(Ok(true)) => Check::ok(format!("Upstream {} reachable", provider.name())),
        Ok(Ok(false)) => Check::fail(format!(
            "Upstream {} rejected the request (check the API key)",
            provider.name()
        )),
        Ok(Err(e)) => Check::fail(format!("Upstream {} unreachable: {e}", provider.name())),
        Err(_) => Check::fail(format!("Upstream {} timed out", provider.name())),
    }
}

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("campusbot doctor");
    println!("================\n");

    let config = match AppConfig::load(config_path) {
        Ok(config) => {
            println!("  [ok]   Config valid");
            config
        }
        Err(e) => {
            println!("  [fail] Config invalid: {e}");
            return Ok(());
        }
    };

    let mut checks = local_checks(&config);
    if config.has_api_key() {
        let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::from_config(&config)?);
        checks.push(upstream_check(provider).await);
    }

    for check in &checks {
        let tag = match check.status {
            Status::Ok => "[ok]  ",
            Status::Warn => "[warn]",
            Status::Fail => "[fail]",
        };
        println!("  {tag} {}", check.message);
    }

    let issues = checks.iter().filter(|c| c.status != Status::Ok).count();
    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
