//! Rule-file discovery and loading.
//!
//! Each scheduler variant owns a directory tree that is searched
//! recursively for a file named `rule.json`; the first match wins when
//! several exist. Loading happens once, at scheduler initialization —
//! there is no reload into a running scheduler.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::RuleError;
use crate::schema::Workflow;

/// The fixed rule-definition filename.
pub const RULE_FILE_NAME: &str = "rule.json";

/// Recursively search `root` for [`RULE_FILE_NAME`]. First match wins.
///
/// Files in a directory are considered before its subdirectories, and
/// entries are visited in name order so discovery is deterministic.
pub fn find_rule_file(root: &Path) -> Result<PathBuf, RuleError> {
    fn search(dir: &Path) -> Result<Option<PathBuf>, RuleError> {
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|e| e.path())
            .collect();
        entries.sort();

        for path in entries.iter().filter(|p| p.is_file()) {
            if path.file_name().and_then(|n| n.to_str()) == Some(RULE_FILE_NAME) {
                return Ok(Some(path.clone()));
            }
        }
        for path in entries.iter().filter(|p| p.is_dir()) {
            if let Some(found) = search(path)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    if !root.is_dir() {
        return Err(RuleError::NotFound(root.display().to_string()));
    }
    search(root)?.ok_or_else(|| RuleError::NotFound(root.display().to_string()))
}

/// Discover and parse the workflow list for one scheduler variant.
///
/// An empty workflow list is a configuration error: a scheduler with
/// nothing to evaluate should stay idle rather than spin.
pub fn load_workflows(root: &Path) -> Result<Vec<Workflow>, RuleError> {
    let path = find_rule_file(root)?;
    let contents = fs::read_to_string(&path)?;
    let workflows: Vec<Workflow> = serde_json::from_str(&contents)?;

    if workflows.is_empty() {
        return Err(RuleError::Validation(format!(
            "rule file {} contains no workflows",
            path.display()
        )));
    }

    info!(
        path = %path.display(),
        workflows = workflows.len(),
        "loaded rule workflows"
    );
    Ok(workflows)
}
