//! User settings persisted in a key-value store.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const KEY_TOKEN: &str = "KEY_TOKEN";
pub const SECRET_TOKEN: &str = "SECRET_TOKEN";
pub const DESCRIPTION_TOKEN: &str = "DESCRIPTION_TOKEN";
pub const STYLE_TOKEN: &str = "STYLE_TOKEN";

/// Visual style understood by the generation service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageStyle {
    #[default]
    Uhd,
    Kandinsky,
    Default,
    Anime,
}

impl ImageStyle {
    /// Every style, in menu order.
    pub const ALL: [ImageStyle; 4] = [
        ImageStyle::Uhd,
        ImageStyle::Kandinsky,
        ImageStyle::Default,
        ImageStyle::Anime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStyle::Uhd => "UHD",
            ImageStyle::Kandinsky => "KANDINSKY",
            ImageStyle::Default => "DEFAULT",
            ImageStyle::Anime => "ANIME",
        }
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ImageStyle::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Storage(format!("Unknown image style: {s}")))
    }
}

/// Key-value storage for settings.
///
/// No `Send` bounds, works in single-threaded WASM contexts.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory [`SettingsStore`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Credentials and prompt of the client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub key: String,
    pub secret: String,
    pub description: String,
    pub style: ImageStyle,
}

impl Settings {
    /// Read settings, using empty strings and the default style for
    /// anything missing or unreadable.
    pub fn load<S: SettingsStore + ?Sized>(store: &S) -> Self {
        let style = match store.get(STYLE_TOKEN) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{e}, using {}", ImageStyle::default());
                ImageStyle::default()
            }),
            None => ImageStyle::default(),
        };
        Self {
            key: store.get(KEY_TOKEN).unwrap_or_default(),
            secret: store.get(SECRET_TOKEN).unwrap_or_default(),
            description: store.get(DESCRIPTION_TOKEN).unwrap_or_default(),
            style,
        }
    }

    /// `true` when no credential is set, i.e. the API settings should be
    /// shown to the user.
    pub fn needs_credentials(&self) -> bool {
        self.key.is_empty() && self.secret.is_empty()
    }

    pub fn save_credentials<S: SettingsStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.set(KEY_TOKEN, &self.key)?;
        store.set(SECRET_TOKEN, &self.secret)
    }

    /// Forget the credentials both in the store and in memory.
    pub fn clear_credentials<S: SettingsStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        store.remove(KEY_TOKEN)?;
        store.remove(SECRET_TOKEN)?;
        self.key.clear();
        self.secret.clear();
        Ok(())
    }

    /// Persist the description and style, done on every submit.
    pub fn save_prompt<S: SettingsStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.set(DESCRIPTION_TOKEN, &self.description)?;
        store.set(STYLE_TOKEN, self.style.as_str())
    }

    /// Authentication headers for the generation service.
    pub fn access_headers(&self) -> [(&'static str, String); 2] {
        [
            ("X-Key", format!("Key {}", self.key)),
            ("X-Secret", format!("Secret {}", self.secret)),
        ]
    }
}

/// `window.localStorage` backed store.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use web_sys::Storage;

    #[derive(Clone, Debug)]
    pub struct LocalStorageStore {
        storage: Storage,
    }

    impl LocalStorageStore {
        pub fn new() -> Result<Self> {
            let window = web_sys::window().ok_or_else(|| Error::Browser("No window available".into()))?;
            let storage = window
                .local_storage()
                .map_err(|e| Error::Storage(format!("Failed to open local storage: {e:?}")))?
                .ok_or_else(|| Error::Storage("Local storage unavailable".into()))?;
            Ok(Self { storage })
        }
    }

    impl SettingsStore for LocalStorageStore {
        fn get(&self, key: &str) -> Option<String> {
            match self.storage.get_item(key) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Failed to read {key}: {e:?}");
                    None
                }
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.storage
                .set_item(key, value)
                .map_err(|e| Error::Storage(format!("Failed to write {key}: {e:?}")))
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.storage
                .remove_item(key)
                .map_err(|e| Error::Storage(format!("Failed to remove {key}: {e:?}")))
        }
    }
}
