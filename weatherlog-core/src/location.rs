//! Turns free-form location text into the canonical `City[, State], Country`
//! form used for every provider call.

use std::fmt;

use thiserror::Error;

/// Literal typed by the user to request IP-based auto-detection.
pub const AUTO_DETECT: &str = "auto";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Location needs at least a city and a country, got {0:?}")]
    InsufficientTokens(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalLocation {
    AutoDetect,
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    raw: String,
    canonical: CanonicalLocation,
}

impl LocationQuery {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn canonical(&self) -> &CanonicalLocation {
        &self.canonical
    }

    /// Canonical string, or `auto` for the auto-detect sentinel.
    pub fn canonical_form(&self) -> &str {
        match &self.canonical {
            CanonicalLocation::AutoDetect => AUTO_DETECT,
            CanonicalLocation::Named(name) => name,
        }
    }

    pub fn is_auto_detect(&self) -> bool {
        self.canonical == CanonicalLocation::AutoDetect
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_form())
    }
}

pub fn normalize(text: &str) -> Result<LocationQuery, NormalizeError> {
    let trimmed = text.trim();
    let raw = text.to_string();

    if trimmed.to_lowercase() == AUTO_DETECT {
        return Ok(LocationQuery {
            raw,
            canonical: CanonicalLocation::AutoDetect,
        });
    }

    // Comma-separated input is only reformatted; segment count is not checked.
    if trimmed.contains(',') {
        let parts: Vec<&str> =
            trimmed.split(',').map(str::trim).filter(|part| !part.is_empty()).collect();
        if parts.is_empty() {
            return Err(NormalizeError::InsufficientTokens(trimmed.to_string()));
        }
        return Ok(LocationQuery {
            raw,
            canonical: CanonicalLocation::Named(parts.join(", ")),
        });
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let canonical = match tokens.as_slice() {
        [] | [_] => return Err(NormalizeError::InsufficientTokens(trimmed.to_string())),
        [city, country] => format!("{city}, {country}"),
        [city @ .., state, country] => format!("{}, {state}, {country}", city.join(" ")),
    };

    Ok(LocationQuery {
        raw,
        canonical: CanonicalLocation::Named(canonical),
    })
}
