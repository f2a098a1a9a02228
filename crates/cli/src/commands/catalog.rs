//! `campusbot catalog`: print what the prompt would carry about programs.

use campusbot_config::AppConfig;
use campusbot_core::error::{Error, Result};
use campusbot_knowledge::KnowledgeStore;
use std::path::Path;

pub async fn run(config_path: Option<&Path>, limit: Option<usize>) -> Result<()> {
    let config = AppConfig::load(config_path).map_err(|e| Error::Config {
        message: e.to_string(),
    })?;

    let store = KnowledgeStore::from_config(&config.knowledge);
    store.reload();

    print!("{}", render(&store, limit.unwrap_or(config.chat.brief_limit)));
    Ok(())
}

fn render(store: &KnowledgeStore, limit: usize) -> String {
    let programs = store.list_programs();
    let brief = store.brief_summary(limit);

    let mut out = format!(
        "Catalog: {} ({} programs)\nNotes:   {} ({} chars)\n\n",
        store.catalog_file().display(),
        programs.len(),
        store.data_dir().display(),
        store.notes().chars().count(),
    );
    if brief.is_empty() {
        out.push_str("(no programs loaded)\n");
    } else {
        out.push_str(&brief);
        out.push('\n');
        if programs.len() > limit {
            out.push_str(&format!("... and {} more\n", programs.len() - limit));
        }
    }
    out
}
