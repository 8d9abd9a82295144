//! The `config` and `config set` commands.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thronebot::prelude::*;
use tracing::info;

/// Properties `config set` accepts, with their display labels.
const PROPERTIES: &[(&str, &str)] = &[
    ("staff", "Staff"),
    ("weekly_voting", "Weekly voting"),
    ("weekly_suggestion", "Weekly suggestion"),
];

/// Runtime-editable bot settings, seeded from the `[settings]` table.
#[derive(Debug, Default)]
pub struct Settings {
    values: RwLock<BTreeMap<String, String>>,
}

impl Settings {
    pub fn new(initial: &BTreeMap<String, String>) -> Self {
        Self {
            values: RwLock::new(initial.clone()),
        }
    }

    pub fn show(&self) -> String {
        let values = self.values.read();
        let mut out = String::from("Current config settings");
        for (key, label) in PROPERTIES {
            let value = values.get(*key).map(String::as_str).unwrap_or("");
            out.push_str(&format!("\n  {label}: {value}"));
        }
        out
    }

    pub fn set(&self, property: &str, value: &str) -> Result<(), &'static str> {
        if property.is_empty() || value.is_empty() {
            return Err("Missing property name or value");
        }
        if !PROPERTIES.iter().any(|(key, _)| *key == property) {
            return Err("Invalid property name");
        }

        info!(property, value, "Setting changed");
        self.values
            .write()
            .insert(property.to_string(), value.to_string());
        Ok(())
    }
}

/// Registers `config` and `config set`.
pub fn register(router: &mut Route, settings: Arc<Settings>) {
    let s = settings.clone();
    let config = router
        .on("config", move || {
            let settings = s.clone();
            async move { settings.show() }
        })
        .desc("Show the current settings.");

    config
        .on("set", move |args: Args| {
            let settings = settings.clone();
            async move {
                let (property, value) = (args.get(1), args.after(2));
                match settings.set(property, &value) {
                    Ok(()) => format!("Set {property} to {value}"),
                    Err(e) => e.to_string(),
                }
            }
        })
        .desc("Change a setting. Ex. `config set staff moderators`");
}
