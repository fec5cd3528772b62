//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::error::{ia_err, NoSQLError};
use std::path::PathBuf;

/// Expand a leading `~/` (or `~\`) in `file_path` to the user's home directory.
///
/// Paths without a leading `~` are returned unchanged.
pub(crate) fn expand_user_home(file_path: &str) -> Result<String, NoSQLError> {
    if file_path.starts_with("~/") || file_path.starts_with("~\\") {
        if let Some(home_dir) = dirs::home_dir() {
            let full_path = home_dir.join(PathBuf::from(correct_path(&file_path[2..])));
            return Ok(format!("{}", full_path.display()));
        }
        return ia_err!("cannot expand '{}': home directory is unknown", file_path);
    }
    Ok(String::from(file_path))
}

// Use the platform's path separator
fn correct_path(file_path: &str) -> String {
    if cfg!(target_os = "windows") {
        file_path.replace('/', "\\")
    } else {
        String::from(file_path)
    }
}
