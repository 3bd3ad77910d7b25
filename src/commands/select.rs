use color_eyre::eyre::{bail, Result, WrapErr};
use tracing::{debug, info, warn};

use crate::{
    emote::{EmoteSet, User},
    prompt::Prompter,
    sevengg::EmoteApi,
};

/// Capacity given to a new set when the target user has no sets to copy it from.
pub const DEFAULT_CAPACITY: u32 = 600;

/// 7TV object ids are 24 hex characters; `global` names the global set.
pub fn is_valid_id(id: &str) -> bool {
    id == "global" || (id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit()))
}

/// A value either passed on the command line or asked for interactively.
struct Answer {
    value: String,
    from_flag: bool,
}

fn next_answer(preset: &mut Option<String>, prompter: &dyn Prompter, prompt: &str) -> Result<Answer> {
    match preset.take() {
        Some(value) => Ok(Answer {
            value: value.trim().to_owned(),
            from_flag: true,
        }),
        None => Ok(Answer {
            value: prompter.input(prompt)?,
            from_flag: false,
        }),
    }
}

/// Flag values fail the run; prompted values get reported and asked again.
fn reject(answer: &Answer, prompter: &dyn Prompter, message: &str) -> Result<()> {
    if answer.from_flag {
        bail!("{} ({})", message, answer.value);
    }
    prompter.say(message);
    Ok(())
}

pub async fn source_set(
    api: &dyn EmoteApi,
    prompter: &dyn Prompter,
    mut preset: Option<String>,
) -> Result<EmoteSet> {
    loop {
        let answer = next_answer(
            &mut preset,
            prompter,
            "What is the id of the emote set you want to copy?",
        )?;

        if !is_valid_id(&answer.value) {
            reject(&answer, prompter, "Invalid id.")?;
            continue;
        }

        match api
            .emote_set(&answer.value)
            .await
            .wrap_err("Something went wrong fetching the emote set")?
        {
            Some(set) => {
                info!("Source set {} has {} emotes", set.id, set.emotes.len());
                return Ok(set);
            }
            None => reject(&answer, prompter, "Emote set not found.")?,
        }
    }
}

/// Resolve who the emotes are copied for. A blank answer means the token owner.
pub async fn target_user(
    api: &dyn EmoteApi,
    prompter: &dyn Prompter,
    own_id: &str,
    mut preset: Option<String>,
) -> Result<User> {
    loop {
        let mut answer = next_answer(
            &mut preset,
            prompter,
            "What is the id of the user you want to copy the emote set for? Leave blank for self.",
        )?;
        if answer.value.is_empty() {
            answer.value = own_id.to_owned();
        }
        let is_self = answer.value == own_id;

        if !is_valid_id(&answer.value) {
            reject(&answer, prompter, "Invalid id.")?;
            continue;
        }

        let Some(user) = api
            .user(&answer.value)
            .await
            .wrap_err("Something went wrong fetching the user")?
        else {
            reject(&answer, prompter, "User not found.")?;
            continue;
        };

        if !is_self {
            match user.editor(own_id) {
                None => {
                    reject(&answer, prompter, "You aren't an editor of that user.")?;
                    continue;
                }
                Some(editor) if !editor.permissions.can_modify_emotes() => {
                    warn!("Editor permissions on {} do not include modifying emotes", user.id());
                }
                Some(_) => {}
            }
        }

        if !user.is_subscribed() {
            prompter.say(if is_self {
                "You are not subscribed, so zero-width emotes won't be copied."
            } else {
                "Target user isn't subscribed, so zero-width emotes won't be copied."
            });
        }
        return Ok(user);
    }
}

/// Where the target set comes from when it was not given on the command line.
#[derive(Debug, Default)]
pub struct TargetSetChoice {
    pub id: Option<String>,
    pub new_set_name: Option<String>,
}

pub async fn target_set(
    api: &dyn EmoteApi,
    prompter: &dyn Prompter,
    user: &User,
    choice: TargetSetChoice,
) -> Result<EmoteSet> {
    if let Some(name) = choice.new_set_name {
        return match create_set(api, user, name.trim()).await? {
            Some(set) => Ok(set),
            None => bail!("Failed to find the new emote set."),
        };
    }

    let mut preset = choice.id;
    loop {
        let answer = next_answer(
            &mut preset,
            prompter,
            "What is the id of the emote set you want to copy into? Leave blank to create a new one.",
        )?;

        if answer.value.is_empty() {
            let name = new_set_name(prompter)?;
            match create_set(api, user, &name).await? {
                Some(set) => return Ok(set),
                None => {
                    prompter.say("Failed to find the new emote set. Try again.");
                    continue;
                }
            }
        }

        if !is_valid_id(&answer.value) {
            reject(&answer, prompter, "Invalid id.")?;
            continue;
        }

        if !user.owns_set(&answer.value) {
            reject(
                &answer,
                prompter,
                "Target user doesn't have an emote set matching the given id.",
            )?;
            continue;
        }

        match api
            .emote_set(&answer.value)
            .await
            .wrap_err("Something went wrong fetching the emote set")?
        {
            Some(set) => return Ok(set),
            None => reject(&answer, prompter, "Target emote set was not found.")?,
        }
    }
}

fn new_set_name(prompter: &dyn Prompter) -> Result<String> {
    loop {
        let name = prompter.input("What do you want to name the new emote set?")?;
        if !name.is_empty() {
            return Ok(name);
        }
        prompter.say("Please provide a valid name for the emote set.");
    }
}

/// Create a set for `user`, sized like their largest existing set.
async fn create_set(api: &dyn EmoteApi, user: &User, name: &str) -> Result<Option<EmoteSet>> {
    if name.is_empty() {
        bail!("Please provide a valid name for the emote set.");
    }

    let id = api
        .create_emote_set(user.id(), name)
        .await
        .wrap_err("Something went wrong creating an emote set")?;
    let capacity = user.max_set_capacity().unwrap_or(DEFAULT_CAPACITY);
    debug!("Created emote set {}, resizing to {}", id, capacity);

    api.update_emote_set(&id, name, capacity)
        .await
        .wrap_err("Something went wrong updating emote set")?;

    Ok(api
        .emote_set(&id)
        .await
        .wrap_err("Something went wrong fetching the emote set")?)
}
