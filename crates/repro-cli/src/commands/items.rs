//! Local item mutations, mirroring the add / clear buttons in the UI

use anyhow::Result;

use repro_core::{Config, Connection};

use crate::output::Output;

pub async fn add(config: Config, output: &Output) -> Result<()> {
    let conn = Connection::connect(config).await?;
    let item = conn.create().await?;
    conn.close().await?;

    output.success(&format!("Added item {}", item.value));
    Ok(())
}

pub async fn clear(config: Config, output: &Output) -> Result<()> {
    let conn = Connection::connect(config).await?;
    let deleted = conn.delete_many().await?;
    conn.close().await?;

    output.message(&format!("Cleared {} item(s)", deleted));
    Ok(())
}

pub async fn list(config: Config, output: &Output) -> Result<()> {
    let conn = Connection::connect(config).await?;
    let items = conn.find_many().await?;
    conn.close().await?;

    output.print_items(&items);
    Ok(())
}
