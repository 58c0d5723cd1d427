//! Permission Catalog
//!
//! The fixed set of device permissions the sheet walks through. Sequencing
//! follows `display_order`, never declaration order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PermissionError;

/// Number of permission kinds in the catalog.
pub const CATALOG_SIZE: usize = 4;

/// A device permission the sheet requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    Location,
    Camera,
    Microphone,
    PhotoLibrary,
}

impl PermissionKind {
    /// Position of this kind in the sheet. Camera < Microphone < PhotoLibrary < Location.
    pub fn display_order(self) -> u8 {
        match self {
            PermissionKind::Camera => 0,
            PermissionKind::Microphone => 1,
            PermissionKind::PhotoLibrary => 2,
            PermissionKind::Location => 3,
        }
    }

    /// Row label shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            PermissionKind::Location => "Location Services",
            PermissionKind::Camera => "Camera Access",
            PermissionKind::Microphone => "Microphone Access",
            PermissionKind::PhotoLibrary => "Photo Library Access",
        }
    }

    /// Symbol token the presentation layer resolves to an icon.
    pub fn icon_token(self) -> &'static str {
        match self {
            PermissionKind::Location => "location.fill",
            PermissionKind::Camera => "camera.fill",
            PermissionKind::Microphone => "microphone.fill",
            PermissionKind::PhotoLibrary => "photo.stack.fill",
        }
    }

    /// Stable identifier used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionKind::Location => "location",
            PermissionKind::Camera => "camera",
            PermissionKind::Microphone => "microphone",
            PermissionKind::PhotoLibrary => "photo_library",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionKind {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "location" => Ok(PermissionKind::Location),
            "camera" => Ok(PermissionKind::Camera),
            "microphone" | "mic" => Ok(PermissionKind::Microphone),
            "photo_library" | "photolibrary" | "photos" => Ok(PermissionKind::PhotoLibrary),
            _ => Err(PermissionError::UnknownPermission(s.to_owned())),
        }
    }
}

/// All catalog kinds, sorted by display order.
pub fn all_kinds() -> [PermissionKind; CATALOG_SIZE] {
    let mut kinds = [
        PermissionKind::Location,
        PermissionKind::Camera,
        PermissionKind::Microphone,
        PermissionKind::PhotoLibrary,
    ];
    kinds.sort_by_key(|k| k.display_order());
    kinds
}
