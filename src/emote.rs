use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Role granted to users with an active 7TV subscription.
pub const SUBSCRIBER_ROLE: &str = "6076a86b09a4c63a38ebe801";

/// Owner id 7TV reports for emotes whose uploader deleted their account.
const DELETED_USER_ID: &str = "000000000000000000000000";

/// Bitfield attached to every emote.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct EmoteFlags(pub u32);

impl EmoteFlags {
    pub const PRIVATE: u32 = 1 << 0;
    pub const AUTHENTIC: u32 = 1 << 1;
    pub const ZERO_WIDTH: u32 = 1 << 8;
    pub const SEXUAL_CONTENT: u32 = 1 << 16;
    pub const EPILEPSY: u32 = 1 << 17;
    pub const EDGY: u32 = 1 << 18;
    pub const TWITCH_DISALLOWED: u32 = 1 << 24;

    fn has(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn is_private(self) -> bool {
        self.has(Self::PRIVATE)
    }

    pub fn is_authentic(self) -> bool {
        self.has(Self::AUTHENTIC)
    }

    pub fn is_zero_width(self) -> bool {
        self.has(Self::ZERO_WIDTH)
    }

    pub fn is_sexual_content(self) -> bool {
        self.has(Self::SEXUAL_CONTENT)
    }

    pub fn is_epilepsy(self) -> bool {
        self.has(Self::EPILEPSY)
    }

    pub fn is_edgy(self) -> bool {
        self.has(Self::EDGY)
    }

    pub fn is_twitch_disallowed(self) -> bool {
        self.has(Self::TWITCH_DISALLOWED)
    }
}

/// What an editor is allowed to do on the account they edit.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct EditorPermissions(pub u32);

impl EditorPermissions {
    pub const MODIFY_EMOTES: u32 = 1 << 0;
    pub const USE_PRIVATE_EMOTES: u32 = 1 << 1;
    pub const MANAGE_PROFILE: u32 = 1 << 2;
    pub const MANAGE_OWNED_EMOTES: u32 = 1 << 3;
    pub const MANAGE_EMOTE_SETS: u32 = 1 << 4;
    pub const MANAGE_BILLING: u32 = 1 << 5;
    pub const MANAGE_EDITORS: u32 = 1 << 6;
    pub const VIEW_MESSAGES: u32 = 1 << 7;

    pub fn allows(self, permission: u32) -> bool {
        self.0 & permission == permission
    }

    pub fn can_modify_emotes(self) -> bool {
        self.allows(Self::MODIFY_EMOTES)
    }

    pub fn can_manage_emote_sets(self) -> bool {
        self.allows(Self::MANAGE_EMOTE_SETS)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserPartial {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, deserialize_with = "optional_https_url")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserPartial {
    pub fn is_subscribed(&self) -> bool {
        self.roles.iter().any(|role| role == SUBSCRIBER_ROLE)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    Avif,
    Webp,
    Png,
    Gif,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EmoteImage {
    pub name: String,
    #[serde(default)]
    pub static_name: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub frame_count: u32,
    #[serde(default)]
    pub size: u64,
    pub format: ImageFormat,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EmoteHost {
    #[serde(deserialize_with = "https_url")]
    pub url: String,
    #[serde(default)]
    pub files: Vec<EmoteImage>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmoteState {
    Listed,
    Personal,
    NoPersonal,
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Emote {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub flags: EmoteFlags,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lifecycle: i32,
    #[serde(default)]
    pub state: Vec<EmoteState>,
    #[serde(default)]
    pub listed: bool,
    #[serde(default)]
    pub animated: bool,
    #[serde(default, deserialize_with = "live_owner")]
    pub owner: Option<UserPartial>,
    #[serde(default)]
    pub host: EmoteHost,
}

/// An emote as it appears inside a set, under the set's alias.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EmoteSetEmote {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub flags: u32,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actor_id: Option<String>,
    pub data: Emote,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EmoteSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub flags: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub immutable: bool,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default)]
    pub emotes: Vec<EmoteSetEmote>,
    #[serde(default)]
    pub emote_count: usize,
    pub capacity: u32,
    #[serde(default)]
    pub owner: Option<UserPartial>,
}

impl EmoteSet {
    /// Free slots left in the set. Negative when the set is over capacity.
    pub fn space_available(&self) -> i64 {
        let used = self.emote_count.max(self.emotes.len());
        i64::from(self.capacity) - used as i64
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.emotes.iter().any(|emote| emote.name == name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EmoteSetPartial {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub flags: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub capacity: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserEditor {
    pub id: String,
    #[serde(default)]
    pub permissions: EditorPermissions,
    #[serde(default)]
    pub visible: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub added_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    Twitch,
    Youtube,
    Discord,
    Kick,
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserConnection {
    pub id: String,
    pub platform: Platform,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub linked_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct User {
    #[serde(flatten)]
    pub profile: UserPartial,
    #[serde(default)]
    pub emote_sets: Vec<EmoteSetPartial>,
    #[serde(default)]
    pub editors: Vec<UserEditor>,
    #[serde(default)]
    pub connections: Vec<UserConnection>,
}

impl User {
    pub fn id(&self) -> &str {
        &self.profile.id
    }

    pub fn is_subscribed(&self) -> bool {
        self.profile.is_subscribed()
    }

    pub fn editor(&self, user_id: &str) -> Option<&UserEditor> {
        self.editors.iter().find(|editor| editor.id == user_id)
    }

    pub fn owns_set(&self, set_id: &str) -> bool {
        self.emote_sets.iter().any(|set| set.id == set_id)
    }

    /// Largest capacity among the user's sets.
    pub fn max_set_capacity(&self) -> Option<u32> {
        self.emote_sets.iter().map(|set| set.capacity).max()
    }
}

fn with_https(url: String) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url
    }
}

fn https_url<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(with_https)
}

fn optional_https_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|url| !url.is_empty())
        .map(with_https))
}

fn live_owner<'de, D>(deserializer: D) -> Result<Option<UserPartial>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<UserPartial>::deserialize(deserializer)?.filter(|owner| owner.id != DELETED_USER_ID))
}
