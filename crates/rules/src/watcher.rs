//! Rule-file change detection.
//!
//! Watches a rule directory and raises a latched flag when any rule
//! JSON file is created or modified. Nothing is reloaded into a running
//! scheduler; callers poll [`RuleFileWatcher::take_changed`] (or await
//! the watch channel) and restart the scheduler themselves.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use notify::event::{CreateKind, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::RuleError;

pub struct RuleFileWatcher {
    rules_dir: PathBuf,
    changed: Arc<AtomicBool>,
    rx: watch::Receiver<bool>,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: RecommendedWatcher,
}

impl RuleFileWatcher {
    /// Watch `rules_dir` recursively for rule-file changes.
    pub fn start(rules_dir: impl Into<PathBuf>) -> Result<Self, RuleError> {
        let rules_dir = rules_dir.into();
        let changed = Arc::new(AtomicBool::new(false));
        let (tx, rx) = watch::channel(false);

        let flag = Arc::clone(&changed);
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if is_rule_change(&event) {
                        flag.store(true, Ordering::SeqCst);
                        tx.send_replace(true);
                    }
                }
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;
        watcher.watch(&rules_dir, RecursiveMode::Recursive)?;

        info!(path = %rules_dir.display(), "watching rule directory for changes");
        Ok(Self {
            rules_dir,
            changed,
            rx,
            _watcher: watcher,
        })
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Whether a change has been observed since the last take.
    pub fn is_changed(&self) -> bool {
        self.changed.load(Ordering::SeqCst)
    }

    /// Read and clear the change flag.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::SeqCst)
    }

    /// A receiver that wakes when the flag is raised.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }
}

/// A create or content/rename modification of a non-dotfile JSON file.
fn is_rule_change(event: &Event) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(CreateKind::File)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
    );
    if !relevant_kind {
        return false;
    }
    event.paths.iter().any(|path| {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let is_dotfile = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false);
        is_json && !is_dotfile
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    #[tokio::test]
    async fn flags_a_written_rule_file() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = RuleFileWatcher::start(dir.path()).unwrap();
        assert!(!watcher.is_changed());

        fs::write(dir.path().join("rule.json"), "[]").unwrap();

        // Backend delivery latency varies; poll with a generous ceiling.
        let mut flagged = false;
        for _ in 0..100 {
            if watcher.is_changed() {
                flagged = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(flagged, "watcher never flagged the new rule file");

        assert!(watcher.take_changed());
        assert!(!watcher.is_changed(), "take clears the flag");
    }

    #[test]
    fn non_json_events_are_ignored() {
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/rules/readme.txt"));
        assert!(!is_rule_change(&event));
    }

    #[test]
    fn dotfiles_are_ignored() {
        let event = Event::new(EventKind::Modify(ModifyKind::Data(
            notify::event::DataChange::Any,
        )))
        .add_path(PathBuf::from("/rules/.rule.json.tmp.json"));
        assert!(!is_rule_change(&event));
    }

    #[test]
    fn json_modification_is_flagged() {
        let event = Event::new(EventKind::Modify(ModifyKind::Data(
            notify::event::DataChange::Any,
        )))
        .add_path(PathBuf::from("/rules/rule.json"));
        assert!(is_rule_change(&event));
    }
}
