use std::collections::BTreeMap;
use std::fmt::Display;
use std::time::SystemTime;

use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// A numbered, immutable snapshot of the structural model taken at commit
/// time.
#[derive(Clone, Debug)]
pub struct CommitEntry {
    pub revision: u64,
    /// Serialized structural model (textual model format).
    pub snapshot: String,
    /// Human-readable action description, e.g. `add place`.
    pub action: String,
    pub ts: SystemTime,
}

fn truncated(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        // Note: length in bytes, but each grapheme must have one byte at least.
        return text.into();
    }
    let mut graphemes = text.graphemes(true).take(max_len + 1).collect::<Vec<_>>();
    if graphemes.len() > max_len {
        graphemes.remove(max_len);
        graphemes[max_len - 1] = ".";
        graphemes[max_len - 2] = ".";
        graphemes[max_len - 3] = ".";
    }
    graphemes.concat()
}

impl Display for CommitEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "revision={} action='{}' snapshot='{}'",
            self.revision,
            self.action,
            truncated(&self.snapshot, 60)
        )
    }
}

/// Append-only revision table with a single current-revision pointer.
/// Truncation of stale redo branches is a bounded `split_off`.
#[derive(Debug, Default)]
pub struct History {
    revision: u64,
    commits: BTreeMap<u64, CommitEntry>,
}

impl History {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn entries(&self) -> impl Iterator<Item = &CommitEntry> {
        self.commits.values()
    }

    pub fn get(&self, revision: u64) -> Option<&CommitEntry> {
        self.commits.get(&revision)
    }

    /// Advance the current revision, store the snapshot and discard every
    /// revision at or above the new revision + 1.
    pub fn commit(&mut self, snapshot: String, action: &str) -> u64 {
        self.revision += 1;
        let entry = CommitEntry {
            revision: self.revision,
            snapshot,
            action: action.to_string(),
            ts: SystemTime::now(),
        };
        debug!(%entry, "commit");
        self.commits.insert(self.revision, entry);
        self.cull(self.revision + 1);
        self.revision
    }

    /// Drop every stored revision at or above `from_revision`.
    pub fn cull(&mut self, from_revision: u64) {
        self.commits.split_off(&from_revision);
    }

    /// Move the current-revision pointer and return the stored snapshot.
    /// None (and no pointer move) when the target is current or absent.
    /// Higher revisions stay in the table so redo remains possible until the
    /// next commit truncates them.
    pub fn revert(&mut self, revision: u64) -> Option<String> {
        if revision == self.revision || !self.commits.contains_key(&revision) {
            return None;
        }
        self.revision = revision;
        debug!(revision, "revert");
        self.commits.get(&revision).map(|entry| entry.snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: u64) -> History {
        let mut history = History::default();
        for i in 1..=n {
            history.commit(format!("snapshot {i}"), &format!("edit {i}"));
        }
        history
    }

    #[test]
    fn revisions_strictly_increase() {
        let history = filled(3);
        assert_eq!(history.revision(), 3);
        let revisions: Vec<u64> = history.entries().map(|e| e.revision).collect();
        assert_eq!(revisions, vec![1, 2, 3]);
    }

    #[test]
    fn revert_then_commit_truncates_redo_branch() {
        let mut history = filled(3);
        assert_eq!(history.revert(2), Some("snapshot 2".into()));
        assert_eq!(history.revision(), 2);
        // redo target still present until a divergent commit
        assert!(history.get(3).is_some());

        history.commit("snapshot 2b".into(), "divergent edit");
        assert_eq!(history.revision(), 3);
        assert_eq!(history.get(3).unwrap().snapshot, "snapshot 2b");
        assert!(history.get(4).is_none());
    }

    #[test]
    fn revert_to_missing_or_current_is_a_noop() {
        let mut history = filled(2);
        assert_eq!(history.revert(2), None);
        assert_eq!(history.revert(9), None);
        assert_eq!(history.revision(), 2);
    }

    #[test]
    fn display_truncates_long_snapshots() {
        let entry = CommitEntry {
            revision: 1,
            snapshot: "x".repeat(200),
            action: "load".into(),
            ts: SystemTime::now(),
        };
        let text = format!("{entry}");
        assert!(text.contains("..."));
        assert!(text.len() < 120);
    }
}
