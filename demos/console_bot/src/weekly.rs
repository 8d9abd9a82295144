//! Weekly challenge suggestions and the banned item list.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use thronebot::prelude::*;
use tracing::info;

/// Suggestions one user may make per week.
pub const MAX_SUGGESTIONS: usize = 3;

const CHARACTERS: &[&str] = &[
    "fish", "crystal", "eyes", "melting", "plant", "y.v.", "steroids", "robot", "chicken",
    "rebel", "horror", "rogue", "skeleton", "frog",
];

const WEAPONS: &[&str] = &[
    "revolver",
    "golden revolver",
    "machinegun",
    "assault rifle",
    "shotgun",
    "double shotgun",
    "crossbow",
    "super crossbow",
    "grenade launcher",
    "laser pistol",
    "plasma gun",
    "disc gun",
    "screwdriver",
    "wrench",
    "flare gun",
];

const CROWNS: &[&str] = &[
    "bare crown",
    "crown of death",
    "crown of life",
    "crown of haste",
    "crown of guns",
    "crown of hatred",
    "crown of blood",
    "crown of destiny",
    "crown of love",
    "crown of luck",
    "crown of curses",
    "crown of risk",
    "crown of protection",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemKind {
    Char,
    Weapon,
    Crown,
}

impl ItemKind {
    /// Parses the kind names used by `weekly ban`.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "char" => Some(Self::Char),
            "wep" => Some(Self::Weapon),
            "crown" => Some(Self::Crown),
            _ => None,
        }
    }

    fn catalog(self) -> &'static [&'static str] {
        match self {
            Self::Char => CHARACTERS,
            Self::Weapon => WEAPONS,
            Self::Crown => CROWNS,
        }
    }

    fn contains(self, name: &str) -> bool {
        self.catalog().contains(&name)
    }

    fn label(self) -> &'static str {
        match self {
            Self::Char => "Characters",
            Self::Weapon => "Weapons",
            Self::Crown => "Crowns",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeeklyError {
    #[error("You've already made 3 suggestions this week.")]
    LimitReached,

    #[error("Too few arguments")]
    TooFewArguments,

    #[error("Invalid character")]
    InvalidCharacter,

    #[error("Invalid weapon")]
    InvalidWeapon,

    #[error("Invalid crown")]
    InvalidCrown,

    #[error(
        "One or more of your selections are currently banned. Remember to check the banned list for banned items every week."
    )]
    Banned,

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Failed to ban item: {0} is already banned")]
    AlreadyBanned(String),

    #[error("Failed to unban item: {0} is not banned")]
    NotBanned(String),
}

/// One accepted weekly suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub author_id: String,
    pub character: String,
    pub skin: bool,
    pub weapon: String,
    pub crown: String,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let skin = if self.skin { "b" } else { "a" };
        write!(f, "{}/{skin}/{}/{}", self.character, self.weapon, self.crown)
    }
}

#[derive(Debug, Default)]
struct WeeklyState {
    suggestions: Vec<Suggestion>,
    counts: HashMap<String, usize>,
    banned: BTreeMap<ItemKind, BTreeSet<String>>,
}

impl WeeklyState {
    fn is_banned(&self, kind: ItemKind, name: &str) -> bool {
        self.banned.get(&kind).is_some_and(|items| items.contains(name))
    }
}

/// In-memory weekly store.
#[derive(Debug, Default)]
pub struct WeeklyStore {
    state: Mutex<WeeklyState>,
}

impl WeeklyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suggestion_count(&self, author_id: &str) -> usize {
        self.state.lock().counts.get(author_id).copied().unwrap_or(0)
    }

    /// Validates and records a `character/skin/weapon/crown` suggestion.
    ///
    /// A skin of `b` selects the alternate skin.
    pub fn suggest(&self, author_id: &str, build: &str) -> Result<Suggestion, WeeklyError> {
        let mut state = self.state.lock();
        if state.counts.get(author_id).copied().unwrap_or(0) >= MAX_SUGGESTIONS {
            return Err(WeeklyError::LimitReached);
        }

        let build = build.to_lowercase();
        let parts: Vec<&str> = build.split('/').map(str::trim).collect();
        let [character, skin, weapon, crown, ..] = parts.as_slice() else {
            return Err(WeeklyError::TooFewArguments);
        };

        if !ItemKind::Char.contains(character) {
            return Err(WeeklyError::InvalidCharacter);
        }
        if !ItemKind::Weapon.contains(weapon) {
            return Err(WeeklyError::InvalidWeapon);
        }
        if !ItemKind::Crown.contains(crown) {
            return Err(WeeklyError::InvalidCrown);
        }

        if state.is_banned(ItemKind::Char, character)
            || state.is_banned(ItemKind::Weapon, weapon)
            || state.is_banned(ItemKind::Crown, crown)
        {
            return Err(WeeklyError::Banned);
        }

        let suggestion = Suggestion {
            author_id: author_id.to_string(),
            character: character.to_string(),
            skin: *skin == "b",
            weapon: weapon.to_string(),
            crown: crown.to_string(),
        };
        state.suggestions.push(suggestion.clone());
        *state.counts.entry(author_id.to_string()).or_default() += 1;

        Ok(suggestion)
    }

    pub fn ban(&self, kind: ItemKind, name: &str) -> Result<(), WeeklyError> {
        if !kind.contains(name) {
            return Err(WeeklyError::InvalidSelection(name.to_string()));
        }
        if !self.state.lock().banned.entry(kind).or_default().insert(name.to_string()) {
            return Err(WeeklyError::AlreadyBanned(name.to_string()));
        }
        Ok(())
    }

    pub fn unban(&self, kind: ItemKind, name: &str) -> Result<(), WeeklyError> {
        if !kind.contains(name) {
            return Err(WeeklyError::InvalidSelection(name.to_string()));
        }
        let removed = self
            .state
            .lock()
            .banned
            .get_mut(&kind)
            .is_some_and(|items| items.remove(name));
        if !removed {
            return Err(WeeklyError::NotBanned(name.to_string()));
        }
        Ok(())
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.state.lock().suggestions.clone()
    }

    /// Banned items grouped by kind, skipping empty kinds.
    pub fn banned(&self) -> Vec<(ItemKind, Vec<String>)> {
        self.state
            .lock()
            .banned
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(kind, items)| (*kind, items.iter().cloned().collect()))
            .collect()
    }
}

// ============================================================================
// Routes
// ============================================================================

const BAN_USAGE: &str = "Usage: `weekly ban [add|del] [crown|char|wep] (name)`\n\
    To ban an item: ex: `weekly ban add crown crown of blood`\n\
    To unban an item: ex: `weekly ban del char steroids`";

/// Registers `suggest`, `banned` and the elevated `ban` under `weekly`.
pub fn register(weekly: &mut Route, store: Arc<WeeklyStore>, elevated: ElevatedUser) {
    let s = store.clone();
    weekly
        .on("suggest", move |msg: Message, Rest(build): Rest| {
            let store = s.clone();
            async move {
                match store.suggest(&msg.author_id, &build) {
                    Ok(suggestion) => {
                        info!(author = %msg.author_id, %suggestion, "Weekly suggestion saved");
                        format!(
                            "{} suggested `{suggestion}` ({}/{MAX_SUGGESTIONS} this week)",
                            msg.author_mention(),
                            store.suggestion_count(&msg.author_id)
                        )
                    }
                    Err(WeeklyError::TooFewArguments) => {
                        format!("{} Too few arguments", msg.author_mention())
                    }
                    Err(e) => e.to_string(),
                }
            }
        })
        .desc("Suggest a weekly. Ex. `steroids/b/grenade launcher/crown of death`");

    let s = store.clone();
    weekly
        .on("banned", move || {
            let store = s.clone();
            async move { banned_embed(&store) }
        })
        .desc("Print banned selections.");

    let s = store.clone();
    weekly
        .on("suggestions", move || {
            let store = s.clone();
            async move { suggestions_text(&store) }
        })
        .layer(elevated.clone())
        .desc("List this week's suggestions.");

    weekly
        .on("ban", move |args: Args| {
            let store = store.clone();
            async move { ban_or_unban(&store, &args) }
        })
        .layer(elevated)
        .desc("Ban or unban an item from the weekly.");
}

fn suggestions_text(store: &WeeklyStore) -> String {
    let suggestions = store.suggestions();
    if suggestions.is_empty() {
        return "No suggestions yet.".to_string();
    }

    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. `{s}` by <@{}>", i + 1, s.author_id))
        .collect::<Vec<_>>()
        .join("\n")
}

fn banned_embed(store: &WeeklyStore) -> Embed {
    let banned = store.banned();
    if banned.is_empty() {
        return Embed::quick("Nothing is banned this week.");
    }

    banned
        .into_iter()
        .fold(Embed::new().title("Currently banned items"), |embed, (kind, items)| {
            embed.field(kind.label(), items.join("\n"), false)
        })
}

fn ban_or_unban(store: &WeeklyStore, args: &Args) -> String {
    if args.len() < 4 {
        return BAN_USAGE.to_string();
    }

    let (action, kind, name) = (args.get(1), args.get(2), args.after(3).to_lowercase());
    let Some(kind) = ItemKind::parse(kind) else {
        return format!("Invalid option: {kind}");
    };

    let result = match action {
        "add" => store.ban(kind, &name).map(|()| format!("Banned {name}")),
        "del" => store.unban(kind, &name).map(|()| format!("Unbanned {name}")),
        other => return format!("Invalid option: {other}\n Expected `add` or `del`"),
    };

    result.unwrap_or_else(|e| e.to_string())
}
