use std::fs;
use std::path::Path;

use crate::session::Workspace;

/// Load a workspace document. A missing file is an empty workspace, not an
/// error, so a first run starts clean.
pub fn load_workspace(path: &Path) -> Result<Workspace, String> {
    if !path.exists() {
        return Ok(Workspace::default());
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read workspace file `{}`: {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse workspace file `{}`: {e}", path.display()))
}

pub fn save_workspace(path: &Path, workspace: &Workspace) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                format!("Failed to create data directory `{}`: {e}", parent.display())
            })?;
        }
    }
    let raw = serde_json::to_string_pretty(workspace)
        .map_err(|e| format!("Failed to serialize workspace: {e}"))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write workspace file `{}`: {e}", path.display()))
}
