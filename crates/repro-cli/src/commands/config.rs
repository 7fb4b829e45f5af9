use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use repro_core::Config;

use crate::output::Output;

pub fn show(output: &Output) -> Result<()> {
    let config = Config::load()?;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let rendered =
            toml::to_string_pretty(&config).context("Failed to render configuration")?;
        println!("{}", rendered.trim_end());
    }

    Ok(())
}

pub fn set(key: &str, value: &str, output: &Output) -> Result<()> {
    let mut config = Config::load()?;

    match key {
        "data_dir" => {
            config.data_dir = PathBuf::from(value);
        }
        "service_url" => {
            // An empty value clears the service url
            config.service_url = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }
        "client_debug" => {
            config.client_debug = matches!(value, "true" | "1");
        }
        _ => bail!("Unknown config key: {} (expected data_dir, service_url, or client_debug)", key),
    }

    config.save()?;
    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}
