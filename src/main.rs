mod commands;
mod config;
mod emote;
mod logging;
mod prompt;
mod sevengg;
mod token;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use crate::{
    commands::{copy, select},
    config::Cli,
    prompt::{Prompter, Terminal},
    sevengg::SevenTvClient,
    token::TokenClaims,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let prompter = Terminal;
    let token = match cli.token() {
        Some(token) => token.to_owned(),
        None => {
            let token = prompter.secret("Your 7tv token")?;
            token::persist_token(&cli.env_file, &token)?;
            token
        }
    };

    let claims = TokenClaims::decode(&token)?;
    claims.ensure_valid()?;
    info!("Authenticated as {}", claims.user_id);

    let api = SevenTvClient::new(cli.client_config(&token))
        .wrap_err("Failed to create the 7TV client")?;

    let source = select::source_set(&api, &prompter, cli.from.clone()).await?;
    let target_user = select::target_user(&api, &prompter, &claims.user_id, cli.user.clone()).await?;
    let target = select::target_set(&api, &prompter, &target_user, cli.target_set_choice()).await?;

    let outcome = copy::copy_emotes(
        &api,
        &prompter,
        &source,
        &target_user,
        &target,
        &cli.copy_options(),
    )
    .await?;
    info!("Finished: {:?}", outcome);

    Ok(())
}
