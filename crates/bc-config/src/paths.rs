// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration file discovery

use std::path::PathBuf;

pub const CONFIG_DIR_NAME: &str = "becon";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// `<platform config dir>/becon/config.toml`, e.g. `~/.config/becon/config.toml` on Linux
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
