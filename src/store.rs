use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::roster::Roster;
use crate::seating::SeatingPreferences;

/// Roster created when the last saved roster is deleted
pub const DEFAULT_ROSTER: &str = "Default";

const ROSTER_PREFIX: &str = "roster.";
const PREFERENCES_KEY: &str = "preferences";
const EXTENSION: &str = ".json";

/// Key-value store keeping each roster and the preferences as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed.contains(['/', '\\', '\0'])
        || trimmed.contains("..")
    {
        return Err(Error::InvalidRosterName(name.to_string()));
    }
    Ok(trimmed)
}

fn roster_key(name: &str) -> Result<String> {
    Ok(format!("{}{}", ROSTER_PREFIX, validate_name(name)?))
}

impl JsonStore {
    /// Opens (creating if needed) a store rooted at `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!("Opened data directory {}", dir.display());
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}", key, EXTENSION))
    }

    fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let json = serde_json::to_vec_pretty(data)?;
        fs::write(self.key_path(key), json)?;
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match fs::read(self.key_path(key)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Names of all saved rosters, sorted
    pub fn list_rosters(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let file_name = entry?.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = file_name
                .strip_prefix(ROSTER_PREFIX)
                .and_then(|rest| rest.strip_suffix(EXTENSION))
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Roster to show on startup: the first saved one, or the default name
    pub fn active_roster(&self) -> Result<String> {
        Ok(self
            .list_rosters()?
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_ROSTER.to_string()))
    }

    /// Loads a roster; an unknown name gives an empty roster
    pub fn load_roster(&self, name: &str) -> Result<Roster> {
        Ok(self.load(&roster_key(name)?)?.unwrap_or_default())
    }

    pub fn save_roster(&self, name: &str, roster: &Roster) -> Result<()> {
        self.save(&roster_key(name)?, roster)?;
        info!("Roster \"{}\" saved ({} students)", name, roster.len());
        Ok(())
    }

    pub fn rename_roster(&self, old_name: &str, new_name: &str) -> Result<()> {
        let old_key = roster_key(old_name)?;
        let new_key = roster_key(new_name)?;
        if old_key == new_key {
            return Ok(());
        }
        let roster: Roster = self
            .load(&old_key)?
            .ok_or_else(|| Error::RosterNotFound(old_name.to_string()))?;
        self.save(&new_key, &roster)?;
        self.remove(&old_key)?;
        info!("Roster \"{}\" renamed to \"{}\"", old_name, new_name);
        Ok(())
    }

    /// Deletes a roster and returns the roster that should become active.
    /// Deleting the last roster leaves an empty default roster behind.
    pub fn delete_roster(&self, name: &str) -> Result<String> {
        self.remove(&roster_key(name)?)?;
        info!("Roster \"{}\" deleted", name);

        let remaining = self.list_rosters()?;
        match remaining.into_iter().next() {
            Some(first) => Ok(first),
            None => {
                self.save_roster(DEFAULT_ROSTER, &Roster::default())?;
                Ok(DEFAULT_ROSTER.to_string())
            }
        }
    }

    /// Saved preferences with missing values defaulted
    pub fn load_preferences(&self) -> Result<SeatingPreferences> {
        let mut prefs: SeatingPreferences = self.load(PREFERENCES_KEY)?.unwrap_or_default();
        prefs.pad_table_settings();
        Ok(prefs)
    }

    pub fn save_preferences(&self, prefs: &SeatingPreferences) -> Result<()> {
        self.save(PREFERENCES_KEY, prefs)?;
        info!("Preferences saved");
        Ok(())
    }
}
