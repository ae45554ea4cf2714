// Copyright 2019-2022 Fuhon Developers
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::Serialize;

/// Seconds between successive epochs.
pub const BLOCK_DELAY_SECS: u64 = 5;

/// Semantic version of the API, packed into a single integer the way go
/// clients expect it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Version(u32);

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self((major as u32) << 16 | (minor as u32) << 8 | (patch as u32))
    }
}

/// Result of the node `Version` request.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct APIVersion {
    /// Node name and version string.
    pub version: String,
    /// Packed semantic API version.
    #[serde(rename = "APIVersion")]
    pub api_version: Version,
    /// Seconds between epochs.
    pub block_delay: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_packing() {
        assert_eq!(Version::new(0, 3, 0), Version(0x000300));
        assert_eq!(Version::new(1, 2, 3), Version(0x010203));
    }
}
