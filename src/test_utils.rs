//! In-memory stand-ins for 7TV and the terminal.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};

use crate::{
    emote::{
        Emote, EmoteFlags, EmoteSet, EmoteSetEmote, EmoteSetPartial, User, UserEditor,
        UserPartial, SUBSCRIBER_ROLE,
    },
    prompt::Prompter,
    sevengg::{self, ApiError, EmoteApi},
};

pub const OWN_ID: &str = "60ae8fc0ea50f43c9e3ae255";
pub const OTHER_ID: &str = "6042058896832ffa785800fe";

pub fn emote(id: &str, name: &str, flags: u32) -> EmoteSetEmote {
    EmoteSetEmote {
        id: id.to_owned(),
        name: name.to_owned(),
        data: Emote {
            id: id.to_owned(),
            name: name.to_owned(),
            flags: EmoteFlags(flags),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn emote_set(id: &str, name: &str, capacity: u32, emotes: Vec<EmoteSetEmote>) -> EmoteSet {
    EmoteSet {
        id: id.to_owned(),
        name: name.to_owned(),
        emote_count: emotes.len(),
        capacity,
        emotes,
        ..Default::default()
    }
}

pub fn user(id: &str, subscribed: bool, sets: &[(&str, u32)], editors: &[&str]) -> User {
    User {
        profile: UserPartial {
            id: id.to_owned(),
            username: format!("user_{id}"),
            display_name: format!("User {id}"),
            roles: if subscribed {
                vec![SUBSCRIBER_ROLE.to_owned()]
            } else {
                vec![]
            },
            ..Default::default()
        },
        emote_sets: sets
            .iter()
            .map(|(id, capacity)| EmoteSetPartial {
                id: (*id).to_owned(),
                name: format!("set {id}"),
                capacity: *capacity,
                ..Default::default()
            })
            .collect(),
        editors: editors
            .iter()
            .map(|id| UserEditor {
                id: (*id).to_owned(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

#[derive(Default)]
struct FakeState {
    sets: HashMap<String, EmoteSet>,
    users: HashMap<String, User>,
    added: Vec<(String, String, String)>,
    updated: Vec<(String, String, u32)>,
    created: usize,
    adds_before_failure: Option<usize>,
}

/// Fake 7TV that keeps sets and users in memory.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_set(self, set: EmoteSet) -> Self {
        self.state.lock().unwrap().sets.insert(set.id.clone(), set);
        self
    }

    pub fn with_user(self, user: User) -> Self {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(user.id().to_owned(), user);
        self
    }

    /// Make every add after the first `count` fail.
    pub fn failing_after(self, count: usize) -> Self {
        self.state.lock().unwrap().adds_before_failure = Some(count);
        self
    }

    pub fn set(&self, id: &str) -> Option<EmoteSet> {
        self.state.lock().unwrap().sets.get(id).cloned()
    }

    /// `(set id, emote id, alias)` for every successful add, in order.
    pub fn added(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().added.clone()
    }

    pub fn updated(&self) -> Vec<(String, String, u32)> {
        self.state.lock().unwrap().updated.clone()
    }
}

#[async_trait]
impl EmoteApi for FakeApi {
    async fn emote_set(&self, id: &str) -> sevengg::Result<Option<EmoteSet>> {
        Ok(self.set(id))
    }

    async fn user(&self, id: &str) -> sevengg::Result<Option<User>> {
        Ok(self.state.lock().unwrap().users.get(id).cloned())
    }

    async fn add_emote(&self, emote_set_id: &str, emote_id: &str, name: &str) -> sevengg::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.adds_before_failure == Some(state.added.len()) {
            return Err(ApiError::GraphQl("70429 Rate Limit Exceeded".to_owned()));
        }

        let set = state
            .sets
            .get_mut(emote_set_id)
            .ok_or_else(|| ApiError::GraphQl("70440 Unknown Emote Set".to_owned()))?;
        if set.space_available() <= 0 {
            return Err(ApiError::GraphQl("704611 Emote Set Full".to_owned()));
        }
        set.emotes.push(emote(emote_id, name, 0));
        set.emote_count += 1;

        state
            .added
            .push((emote_set_id.to_owned(), emote_id.to_owned(), name.to_owned()));
        Ok(())
    }

    async fn create_emote_set(&self, user_id: &str, name: &str) -> sevengg::Result<String> {
        let mut state = self.state.lock().unwrap();
        state.created += 1;
        let id = format!("{:024x}", 0xabc000 + state.created);

        let mut set = emote_set(&id, name, 300, vec![]);
        set.owner = state.users.get(user_id).map(|user| user.profile.clone());
        state.sets.insert(id.clone(), set);
        if let Some(user) = state.users.get_mut(user_id) {
            user.emote_sets.push(EmoteSetPartial {
                id: id.clone(),
                name: name.to_owned(),
                capacity: 300,
                ..Default::default()
            });
        }

        Ok(id)
    }

    async fn update_emote_set(&self, emote_set_id: &str, name: &str, capacity: u32) -> sevengg::Result<()> {
        let mut state = self.state.lock().unwrap();
        let set = state
            .sets
            .get_mut(emote_set_id)
            .ok_or_else(|| ApiError::GraphQl("70440 Unknown Emote Set".to_owned()))?;
        set.name = name.to_owned();
        set.capacity = capacity;
        state
            .updated
            .push((emote_set_id.to_owned(), name.to_owned(), capacity));
        Ok(())
    }
}

/// Answers prompts from a script and records what was said.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    confirms: Mutex<VecDeque<bool>>,
    said: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| (*a).to_owned()).collect()),
            ..Default::default()
        }
    }

    pub fn with_confirms(self, confirms: &[bool]) -> Self {
        *self.confirms.lock().unwrap() = confirms.iter().copied().collect();
        self
    }

    pub fn said(&self) -> Vec<String> {
        self.said.lock().unwrap().clone()
    }

    pub fn said_line(&self, line: &str) -> bool {
        self.said().iter().any(|said| said == line)
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, prompt: &str) -> Result<String> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| eyre!("no scripted answer for {prompt:?}"))
    }

    fn secret(&self, prompt: &str) -> Result<String> {
        self.input(prompt)
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        self.confirms
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| eyre!("no scripted confirmation for {prompt:?}"))
    }

    fn say(&self, message: &str) {
        self.said.lock().unwrap().push(message.to_owned());
    }
}
