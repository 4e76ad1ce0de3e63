// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Three-valued flag for settings that may be "not yet determined"

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Unknown / true / false
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    #[default]
    Unknown,
    True,
    False,
}

impl TriState {
    /// Whether the value has been determined
    pub fn is_known(&self) -> bool {
        !matches!(self, TriState::Unknown)
    }

    /// Collapse to a bool, using `default` for `Unknown`
    pub fn to_bool(&self, default: bool) -> bool {
        match self {
            TriState::Unknown => default,
            TriState::True => true,
            TriState::False => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriState::Unknown => "unknown",
            TriState::True => "true",
            TriState::False => "false",
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value {
            TriState::True
        } else {
            TriState::False
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        value.map_or(TriState::Unknown, TriState::from)
    }
}

impl FromStr for TriState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unknown" => Ok(TriState::Unknown),
            "true" => Ok(TriState::True),
            "false" => Ok(TriState::False),
            other => Err(Error::config(format!("Invalid tri-state value '{}'", other))),
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
