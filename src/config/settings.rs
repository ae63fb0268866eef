//! Loading, saving and managing named filter profiles on disk.

use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ConfigError, FilterProfile, DEFAULT_PROFILE_NAME};

const APP_NAME: &str = "DevToolVault";
const FILTERS_DIR: &str = "filters";

/// Returns the platform-specific directory holding saved profiles.
pub fn get_profiles_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "devtoolvault", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().join(FILTERS_DIR))
}

/// The set of known profiles plus the one currently active.
///
/// The built-in `Default` profile is always present. Every `*.json` file in the
/// store directory is loaded as an additional profile; files that cannot be read
/// or parsed are skipped without affecting the others.
#[derive(Debug)]
pub struct ProfileStore {
    directory: PathBuf,
    profiles: Vec<FilterProfile>,
    active: String,
    /// Files each custom profile was loaded from or saved to. A profile is
    /// keyed by the name inside its JSON, which need not match the file name.
    sources: HashMap<String, Vec<PathBuf>>,
}

impl ProfileStore {
    /// Opens the store at the platform config directory.
    pub fn open_default() -> Result<Self, ConfigError> {
        let directory = get_profiles_directory().ok_or(ConfigError::NoConfigDirectory)?;
        Self::open(directory)
    }

    /// Opens the store at `directory`, creating it if needed.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let directory = directory.into();
        if !directory.exists() {
            fs::create_dir_all(&directory).map_err(|e| ConfigError::Io(e, directory.clone()))?;
            tracing::info!("Created profiles directory: {:?}", directory);
        }

        let mut store = Self {
            directory,
            profiles: vec![FilterProfile::built_in_default()],
            active: DEFAULT_PROFILE_NAME.to_string(),
            sources: HashMap::new(),
        };
        store.load_custom_profiles();
        Ok(store)
    }

    fn load_custom_profiles(&mut self) {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Could not list profiles in {:?}: {}", self.directory, e);
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
            .collect();
        paths.sort();

        for path in paths {
            match read_profile(&path) {
                Ok(mut profile) => {
                    if validate_name(&profile.name).is_err() {
                        tracing::warn!("Skipping profile with invalid name in {:?}", path);
                        continue;
                    }
                    if self.is_built_in(&profile.name) {
                        tracing::warn!(
                            "Skipping {:?}: it would shadow built-in profile {}",
                            path,
                            profile.name
                        );
                        continue;
                    }
                    profile.is_built_in = false;
                    tracing::debug!("Loaded profile {} from {:?}", profile.name, path);
                    self.sources.entry(profile.name.clone()).or_default().push(path);
                    self.upsert(profile);
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable profile {:?}: {}", path, e);
                }
            }
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn profiles(&self) -> &[FilterProfile] {
        &self.profiles
    }

    pub fn get(&self, name: &str) -> Option<&FilterProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn active(&self) -> &FilterProfile {
        // The built-in default sits at index 0 and is never removed.
        self.get(&self.active).unwrap_or(&self.profiles[0])
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.get(name).is_none() {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        self.active = name.to_string();
        Ok(())
    }

    /// Creates an unsaved profile that copies the active profile's settings.
    pub fn create_profile(&self, name: &str, description: &str) -> Result<FilterProfile, ConfigError> {
        validate_name(name)?;
        let active = self.active();
        Ok(FilterProfile {
            name: name.to_string(),
            description: description.to_string(),
            is_built_in: false,
            ..active.clone()
        })
    }

    /// Writes `profile` to `<name>.json` and replaces any same-name entry.
    pub fn save(&mut self, profile: FilterProfile) -> Result<(), ConfigError> {
        validate_name(&profile.name)?;
        if self.is_built_in(&profile.name) {
            return Err(ConfigError::BuiltIn(profile.name));
        }

        let path = self.profile_path(&profile.name);
        write_profile(&profile, &path)?;
        tracing::info!("Saved profile {} to {:?}", profile.name, path);

        // Other files holding this name would shadow the save on the next open.
        let stale = self.sources.insert(profile.name.clone(), vec![path.clone()]);
        for old in stale.into_iter().flatten().filter(|old| *old != path) {
            remove_profile_file(&old)?;
        }
        self.upsert(profile);
        Ok(())
    }

    /// Removes a custom profile and its file. Deleting the active profile
    /// makes `Default` active again.
    pub fn delete(&mut self, name: &str) -> Result<(), ConfigError> {
        let profile = self
            .get(name)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))?;
        if profile.is_built_in {
            return Err(ConfigError::BuiltIn(name.to_string()));
        }

        let paths = self
            .sources
            .remove(name)
            .unwrap_or_else(|| vec![self.profile_path(name)]);
        for path in &paths {
            remove_profile_file(path)?;
        }
        self.profiles.retain(|p| p.name != name);

        if self.active == name {
            self.active = DEFAULT_PROFILE_NAME.to_string();
        }
        tracing::info!("Deleted profile {}", name);
        Ok(())
    }

    /// Exports a profile to an arbitrary JSON file.
    pub fn export_profile(&self, name: &str, export_path: &Path) -> Result<(), ConfigError> {
        let profile = self
            .get(name)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))?;
        write_profile(profile, export_path)?;
        tracing::info!("Exported profile {} to {:?}", name, export_path);
        Ok(())
    }

    /// Imports a profile from a JSON file and saves it into the store.
    pub fn import_profile(&mut self, import_path: &Path) -> Result<FilterProfile, ConfigError> {
        let mut profile = read_profile(import_path)?;
        profile.is_built_in = false;
        self.save(profile.clone())?;
        tracing::info!("Imported profile {} from {:?}", profile.name, import_path);
        Ok(profile)
    }

    fn is_built_in(&self, name: &str) -> bool {
        self.get(name).is_some_and(|p| p.is_built_in)
    }

    fn upsert(&mut self, profile: FilterProfile) {
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    fn profile_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.json"))
    }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    let invalid = name.trim().is_empty()
        || name.contains(['/', '\\'])
        || name == "."
        || name == "..";
    if invalid {
        Err(ConfigError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

fn read_profile(path: &Path) -> Result<FilterProfile, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e, path.to_path_buf()))?;
    Ok(serde_json::from_str(&content)?)
}

fn remove_profile_file(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        fs::remove_file(path).map_err(|e| ConfigError::Io(e, path.to_path_buf()))?;
        tracing::debug!("Removed profile file {:?}", path);
    }
    Ok(())
}

fn write_profile(profile: &FilterProfile, path: &Path) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(profile)?;
    fs::write(path, json).map_err(|e| ConfigError::Io(e, path.to_path_buf()))
}
