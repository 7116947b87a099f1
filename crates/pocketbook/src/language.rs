use std::{fmt, str::FromStr, sync::Arc};

use tokio::sync::broadcast;

use crate::{
    error::StorageError,
    storage::{LANGUAGE_KEY, Storage},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Persisted language preference with a change broadcast.
///
/// Subscribers receive the new language as part of the `set` call itself.
#[derive(Debug)]
pub struct LanguagePreference {
    storage: Arc<Storage>,
    changes: broadcast::Sender<Language>,
}

impl LanguagePreference {
    pub fn new(storage: Arc<Storage>) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self { storage, changes }
    }

    /// Stored language, `en` when absent or unreadable.
    pub fn current(&self) -> Language {
        self.storage
            .get(LANGUAGE_KEY)
            .and_then(|code| code.parse().ok())
            .unwrap_or_default()
    }

    pub fn set(&self, language: Language) -> Result<(), StorageError> {
        self.storage.set(LANGUAGE_KEY, language.code())?;
        // No listeners is not an error.
        let _ = self.changes.send(language);
        tracing::info!(language = language.code(), "language changed");
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Language> {
        self.changes.subscribe()
    }
}
