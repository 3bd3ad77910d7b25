use std::path::PathBuf;

use clap::Parser;

use crate::{
    commands::{copy::CopyOptions, select::TargetSetChoice},
    sevengg::{ClientConfig, SEVENTV_URL},
    token::TOKEN_VAR,
};

/// Copy the emotes of one 7TV emote set into another.
///
/// Anything not given on the command line is asked for interactively.
#[derive(Parser, Debug)]
#[command(name = "seventv-copy", version, about, long_about)]
pub struct Cli {
    /// Id of the emote set to copy from
    #[arg(short, long, value_name = "SET_ID")]
    pub from: Option<String>,

    /// Id of the user to copy for (defaults to the token owner when prompted and left blank)
    #[arg(short, long, value_name = "USER_ID")]
    pub user: Option<String>,

    /// Id of an existing emote set of the target user to copy into
    #[arg(short, long, value_name = "SET_ID", conflicts_with = "new_set")]
    pub to: Option<String>,

    /// Create a new emote set with this name and copy into it
    #[arg(long, value_name = "NAME")]
    pub new_set: Option<String>,

    /// Proceed without asking when not every emote fits
    #[arg(short, long)]
    pub yes: bool,

    /// Show what would be copied without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// 7TV auth token
    #[arg(long, env = TOKEN_VAR, hide_env_values = true)]
    pub token: Option<String>,

    /// File the token is saved to when entered interactively
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Base URL of the 7TV v3 API
    #[arg(long, env = "SEVENTV_API_URL", default_value = SEVENTV_URL)]
    pub api_url: String,

    /// Maximum requests per second
    #[arg(long, default_value_t = 5)]
    pub rate_limit: u32,

    /// Retries for failed requests
    #[arg(long, default_value_t = 3)]
    pub max_retries: usize,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Token from the flag or environment, ignoring empty values.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn client_config(&self, token: &str) -> ClientConfig {
        ClientConfig::new(token)
            .with_base_url(&self.api_url)
            .with_rate_limit(self.rate_limit)
            .with_max_retries(self.max_retries)
            .with_timeout(self.timeout)
    }

    pub fn target_set_choice(&self) -> TargetSetChoice {
        TargetSetChoice {
            id: self.to.clone(),
            new_set_name: self.new_set.clone(),
        }
    }

    pub fn copy_options(&self) -> CopyOptions {
        CopyOptions {
            assume_yes: self.yes,
            dry_run: self.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "seventv-copy",
            "--from",
            "62cdd34e72a832540de95857",
            "-t",
            "63cdd34e72a832540de95858",
            "--token",
            "  ",
            "--rate-limit",
            "2",
            "-y",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.from.as_deref(), Some("62cdd34e72a832540de95857"));
        assert_eq!(cli.token(), None);
        assert_eq!(cli.verbose, 2);
        assert!(cli.copy_options().assume_yes);
        assert!(!cli.copy_options().dry_run);

        let config = cli.client_config("abc");
        assert_eq!(config.token, "abc");
        assert_eq!(config.rate_limit_per_sec, 2);
        assert_eq!(config.max_retries, 3);

        let choice = cli.target_set_choice();
        assert_eq!(choice.id.as_deref(), Some("63cdd34e72a832540de95858"));
        assert!(choice.new_set_name.is_none());
    }

    #[test]
    fn test_to_conflicts_with_new_set() {
        let err = Cli::try_parse_from([
            "seventv-copy",
            "--to",
            "63cdd34e72a832540de95858",
            "--new-set",
            "copy",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
