use anyhow::Result;
use serde_json::json;

use repro_core::{Config, ItemStore};

use crate::output::Output;

/// Show where data lives and how many items are stored locally
pub fn show(config: &Config, output: &Output) -> Result<()> {
    let store = ItemStore::open(config)?;
    let count = store.count()?;

    let service = config
        .service_url
        .clone()
        .unwrap_or_else(|| "(not configured)".to_string());

    if output.is_json() {
        let status = json!({
            "dataDir": config.data_dir,
            "sqlitePath": config.sqlite_path(),
            "serviceUrl": config.service_url,
            "itemCount": count,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else if output.is_quiet() {
        println!("{}", count);
    } else {
        println!("Data directory: {}", config.data_dir.display());
        println!("SQLite file:    {}", config.sqlite_path().display());
        println!("Sync service:   {}", service);
        println!("Items:          {}", count);
    }

    Ok(())
}
