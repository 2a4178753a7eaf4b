//! User preferences with change notification.
//!
//! The store owns the current [`Preferences`], writes them to a TOML file on
//! every change and publishes the new value to every subscriber.

use std::fmt;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::AppError;
use crate::utils::group_indian;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub currency_symbol: String,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            theme: Theme::default(),
        }
    }
}

impl Preferences {
    /// `amount` with the currency symbol, two decimals and lakh grouping.
    pub fn format_amount(
        &self,
        amount: Decimal,
    ) -> String {
        let grouped = group_indian(amount);
        match grouped.strip_prefix('-') {
            Some(rest) => format!("-{}{rest}", self.currency_symbol),
            None => format!("{}{grouped}", self.currency_symbol),
        }
    }
}

pub struct PreferenceStore {
    path: Option<PathBuf>,
    sender: watch::Sender<Preferences>,
}

impl PreferenceStore {
    /// A store that never touches the filesystem.
    pub fn in_memory(initial: Preferences) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { path: None, sender }
    }

    /// Open the store backed by `path`. A missing file yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let initial = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                AppError::Preferences(format!("invalid preferences file '{}': {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no preferences file, using defaults");
                Preferences::default()
            }
            Err(e) => return Err(AppError::io(&path, e)),
        };

        let (sender, _) = watch::channel(initial);
        Ok(Self {
            path: Some(path),
            sender,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current(&self) -> Preferences {
        self.sender.borrow().clone()
    }

    /// Receiver that sees every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.sender.subscribe()
    }

    pub fn set_currency_symbol(
        &self,
        symbol: &str,
    ) -> Result<(), AppError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(AppError::validation("Currency symbol is required"));
        }
        self.update(|prefs| prefs.currency_symbol = symbol.to_string())
    }

    pub fn set_theme(
        &self,
        theme: Theme,
    ) -> Result<(), AppError> {
        self.update(|prefs| prefs.theme = theme)
    }

    /// Writes the file before publishing the new value.
    fn update(
        &self,
        change: impl FnOnce(&mut Preferences),
    ) -> Result<(), AppError> {
        let mut next = self.current();
        change(&mut next);

        if let Some(path) = &self.path {
            save(path, &next)?;
        }
        info!(currency = %next.currency_symbol, theme = %next.theme, "preferences updated");
        self.sender.send_replace(next);
        Ok(())
    }
}

fn save(
    path: &Path,
    prefs: &Preferences,
) -> Result<(), AppError> {
    let content = toml::to_string_pretty(prefs)
        .map_err(|e| AppError::Preferences(format!("cannot serialise preferences: {e}")))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| AppError::io(path, e))
}
