use std::collections::HashSet;

use color_eyre::eyre::{Result, WrapErr};
use tracing::{debug, info};

use crate::{
    emote::{EmoteSet, EmoteSetEmote, User},
    prompt::Prompter,
    sevengg::EmoteApi,
};

const PROGRESS_EVERY: usize = 25;

/// Emotes from the source set that will be added to the target set.
#[derive(Debug)]
pub struct CopyPlan<'a> {
    pub emotes: Vec<&'a EmoteSetEmote>,
    pub skipped_private: usize,
    pub skipped_existing: usize,
    pub skipped_zero_width: usize,
    pub space_available: i64,
}

impl<'a> CopyPlan<'a> {
    /// Pick the emotes worth copying, in source order. Zero-width emotes need
    /// a subscribed target user.
    pub fn new(source: &'a EmoteSet, target: &EmoteSet, target_subscribed: bool) -> Self {
        let taken: HashSet<&str> = target.emotes.iter().map(|e| e.name.as_str()).collect();

        let mut plan = CopyPlan {
            emotes: Vec::new(),
            skipped_private: 0,
            skipped_existing: 0,
            skipped_zero_width: 0,
            space_available: target.space_available(),
        };

        for emote in &source.emotes {
            if emote.data.flags.is_private() {
                plan.skipped_private += 1;
            } else if taken.contains(emote.name.as_str()) {
                plan.skipped_existing += 1;
            } else if !target_subscribed && emote.data.flags.is_zero_width() {
                plan.skipped_zero_width += 1;
            } else {
                plan.emotes.push(emote);
            }
        }

        plan
    }

    pub fn exceeds_capacity(&self) -> bool {
        self.space_available < self.emotes.len() as i64
    }

    /// Drop the emotes that would not fit and return how many were dropped.
    pub fn truncate_to_capacity(&mut self) -> usize {
        let fits = self.space_available.max(0) as usize;
        let dropped = self.emotes.len().saturating_sub(fits);
        self.emotes.truncate(fits);
        dropped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Copied(usize),
    DryRun(usize),
    Cancelled,
}

#[derive(Debug, Default)]
pub struct CopyOptions {
    pub assume_yes: bool,
    pub dry_run: bool,
}

pub async fn copy_emotes(
    api: &dyn EmoteApi,
    prompter: &dyn Prompter,
    source: &EmoteSet,
    target_user: &User,
    target: &EmoteSet,
    options: &CopyOptions,
) -> Result<Outcome> {
    let mut plan = CopyPlan::new(source, target, target_user.is_subscribed());
    debug!(
        "Skipping {} private, {} already present, {} zero-width emotes",
        plan.skipped_private, plan.skipped_existing, plan.skipped_zero_width
    );

    let count = plan.emotes.len();
    let mut left_out = 0;
    if plan.exceeds_capacity() {
        let question = format!(
            "The number of emotes to be added exceeds the space available in the target emote set ({}>{}). Some emotes won't fit. Proceed?",
            count, plan.space_available
        );
        if !options.assume_yes && !prompter.confirm(&question)? {
            prompter.say("Exiting...");
            return Ok(Outcome::Cancelled);
        }
        left_out = plan.truncate_to_capacity();
    }

    let count = plan.emotes.len();
    prompter.say(&format!(
        "Adding {} emotes from the set '{}' ({}) to the set '{}' ({}).",
        count, source.name, source.id, target.name, target.id
    ));

    if options.dry_run {
        for emote in &plan.emotes {
            prompter.say(&format!(" - {} ({})", emote.name, emote.id));
        }
        return Ok(Outcome::DryRun(count));
    }

    for (i, emote) in plan.emotes.iter().enumerate() {
        debug!("Adding {} ({})", emote.name, emote.id);
        api.add_emote(&target.id, &emote.id, &emote.name)
            .await
            .wrap_err_with(|| {
                format!(
                    "Something went wrong adding {} after {} of {} emotes were copied",
                    emote.name, i, count
                )
            })?;

        let done = i + 1;
        if done % PROGRESS_EVERY == 0 {
            prompter.say(&format!("Progress: {}/{}", done, count));
        }
    }

    info!("Copied {} emotes into {}", count, target.id);
    if left_out == 0 {
        prompter.say("All emotes successfully copied.");
    } else {
        prompter.say(&format!("Copied {} emotes, {} did not fit.", count, left_out));
    }
    Ok(Outcome::Copied(count))
}
