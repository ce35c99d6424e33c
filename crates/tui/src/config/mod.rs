use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/tui.toml";
const ENV_PREFIX: &str = "TACCUINO_TUI";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    pub contract: String,
    /// Wallet accounts available to this terminal; the first one is active
    /// at startup, `w` cycles through the rest.
    pub accounts: Vec<String>,
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".to_string(),
            contract: "0x1f421f8d9743c32b31218dc3266cc14a128e23aa".to_string(),
            accounts: Vec::new(),
            log_file: None,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "taccuino_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override node endpoint (e.g. http://127.0.0.1:8545).
    #[arg(long)]
    endpoint: Option<String>,
    /// Override task contract address.
    #[arg(long)]
    contract: Option<String>,
    /// Wallet account, repeatable; replaces the configured list.
    #[arg(long = "account")]
    accounts: Vec<String>,
    /// Write tracing output to this file (the TUI owns stdout).
    #[arg(long)]
    log_file: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    load_from(Args::parse(), env_source())
}

/// Environment source: `TACCUINO_TUI_*` variables, with `accounts` read as
/// one comma-separated list.
fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("accounts")
}

/// Layers the config: defaults, then the file, then environment variables,
/// then CLI flags; the later source wins.
fn load_from(args: Args, env: config::Environment) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(env);
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(contract) = args.contract {
        settings.contract = contract;
    }
    if !args.accounts.is_empty() {
        settings.accounts = args.accounts;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = Some(log_file);
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(vars: &[(&str, &str)]) -> config::Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        env_source().source(Some(map))
    }

    fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "taccuino-tui-{name}-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, contents).expect("config file written");
        path
    }

    #[test]
    fn defaults_hold_without_file_env_or_flags() {
        let args = Args::parse_from(["taccuino_tui", "--config", "/nonexistent/taccuino.toml"]);

        let settings = load_from(args, env_with(&[])).expect("config loads");

        assert_eq!(settings.endpoint, "http://127.0.0.1:8545");
        assert!(settings.accounts.is_empty());
        assert_eq!(settings.log_file, None);
    }

    #[test]
    fn environment_overrides_the_config_file() {
        let path = write_config(
            "env-over-file",
            "endpoint = \"http://127.0.0.1:7777\"\ncontract = \"0xfeed\"\n",
        );
        let args = Args::parse_from(["taccuino_tui", "--config", path.to_str().unwrap()]);
        let env = env_with(&[("TACCUINO_TUI_ENDPOINT", "http://127.0.0.1:8888")]);

        let settings = load_from(args, env).expect("config loads");
        let _ = std::fs::remove_file(&path);

        assert_eq!(settings.endpoint, "http://127.0.0.1:8888");
        // Keys the environment leaves alone still come from the file.
        assert_eq!(settings.contract, "0xfeed");
    }

    #[test]
    fn cli_flags_override_file_and_environment() {
        let path = write_config("cli-over-env", "endpoint = \"http://127.0.0.1:7777\"\n");
        let args = Args::parse_from([
            "taccuino_tui",
            "--config",
            path.to_str().unwrap(),
            "--endpoint",
            "http://127.0.0.1:9999",
            "--account",
            "0xaaa",
            "--account",
            "0xbbb",
        ]);
        let env = env_with(&[
            ("TACCUINO_TUI_ENDPOINT", "http://127.0.0.1:8888"),
            ("TACCUINO_TUI_ACCOUNTS", "0xccc"),
        ]);

        let settings = load_from(args, env).expect("config loads");
        let _ = std::fs::remove_file(&path);

        assert_eq!(settings.endpoint, "http://127.0.0.1:9999");
        assert_eq!(settings.accounts, vec!["0xaaa", "0xbbb"]);
    }

    #[test]
    fn env_accounts_split_on_commas() {
        let args = Args::parse_from(["taccuino_tui", "--config", "/nonexistent/taccuino.toml"]);
        let env = env_with(&[("TACCUINO_TUI_ACCOUNTS", "0xaaa,0xbbb")]);

        let settings = load_from(args, env).expect("config loads");

        assert_eq!(settings.accounts, vec!["0xaaa", "0xbbb"]);
    }
}
