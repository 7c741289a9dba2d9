use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Initialize configuration file with defaults")]
    Init {
        #[arg(long, short = 'f', help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show configuration file path")]
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    match cmd {
        ConfigCommand::Init { force } => handle_init(force, format),
        ConfigCommand::Show => handle_show(format),
        ConfigCommand::Path => handle_path(),
    }
}

fn handle_init(force: bool, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    Config::default().save().context("failed to write config")?;
    print!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );

    Ok(())
}

fn handle_show(format: OutputFormat) -> Result<()> {
    let config = redact(Config::load()?);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        if let Some(path) = Config::config_path() {
            println!("# Config: {}", path.display());
            println!();
        }
        print!("{}", toml::to_string_pretty(&config)?);
    }

    Ok(())
}

fn handle_path() -> Result<()> {
    let path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if path.exists() {
        println!("Config (active): {}", path.display());
    } else {
        println!("Config (would be): {}", path.display());
    }

    Ok(())
}

/// Credentials are never echoed back, even when they came from the file.
fn redact(mut config: Config) -> Config {
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("********".to_string());
        }
    };
    mask(&mut config.providers.openai_api_key);
    mask(&mut config.providers.groq_api_key);
    mask(&mut config.vector_store.api_key);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_masks_present_keys_only() {
        let mut config = Config::default();
        config.providers.openai_api_key = Some("sk-secret".to_string());

        let redacted = redact(config);
        assert_eq!(
            redacted.providers.openai_api_key.as_deref(),
            Some("********")
        );
        assert!(redacted.providers.groq_api_key.is_none());
    }
}
