use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::Profile;

const BUILTIN_PROFILE: &str = include_str!("../data/profile.json");

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed reading profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("profile is not valid json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid profile: {0}")]
    Invalid(String),
}

/// The profile compiled into the binary.
pub fn builtin_profile() -> Result<Profile, ProfileError> {
    parse_profile(BUILTIN_PROFILE)
}

pub fn load_profile(path: impl AsRef<Path>) -> Result<Profile, ProfileError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_profile(&raw)
}

/// Loads `path` when given, otherwise the built-in profile.
pub fn resolve_profile(path: Option<&Path>) -> Result<Profile, ProfileError> {
    match path {
        Some(path) => load_profile(path),
        None => builtin_profile(),
    }
}

pub fn parse_profile(raw: &str) -> Result<Profile, ProfileError> {
    let profile: Profile = serde_json::from_str(raw)?;
    validate_profile(&profile)?;
    Ok(profile)
}

pub fn validate_profile(profile: &Profile) -> Result<(), ProfileError> {
    if profile.name.trim().is_empty() {
        return Err(ProfileError::Invalid("name must not be empty".to_string()));
    }

    for (idx, entry) in profile.experience.iter().enumerate() {
        if entry.company.trim().is_empty() {
            return Err(ProfileError::Invalid(format!(
                "experience[{idx}] has an empty company"
            )));
        }
        if entry.role.trim().is_empty() {
            return Err(ProfileError::Invalid(format!(
                "experience[{idx}] ({}) has an empty role",
                entry.company
            )));
        }
    }

    Ok(())
}
