use color_eyre::eyre::Result;
use dialoguer::{Confirm, Input, Password};

/// Interaction with whoever runs the tool.
pub trait Prompter {
    /// Ask for a line of text. Empty answers are allowed.
    fn input(&self, prompt: &str) -> Result<String>;

    /// Ask for a value without echoing it.
    fn secret(&self, prompt: &str) -> Result<String>;

    fn confirm(&self, prompt: &str) -> Result<bool>;

    fn say(&self, message: &str);
}

/// Terminal prompts.
pub struct Terminal;

impl Prompter for Terminal {
    fn input(&self, prompt: &str) -> Result<String> {
        let answer: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer.trim().to_owned())
    }

    fn secret(&self, prompt: &str) -> Result<String> {
        Ok(Password::new().with_prompt(prompt).interact()?.trim().to_owned())
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
    }

    fn say(&self, message: &str) {
        println!("{}", message);
    }
}
