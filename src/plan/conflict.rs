//! Tie-break policies for two candidates competing for one destination.
use crate::model::TreeNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// The later modification time survives.
    PreferNewerMtime,
    /// The larger file survives.
    PreferLargerSize,
}

impl ConflictPolicy {
    fn describe(self) -> &'static str {
        match self {
            ConflictPolicy::PreferNewerMtime => "newer",
            ConflictPolicy::PreferLargerSize => "larger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Survivor {
    Incoming,
    Existing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub survivor: Survivor,
    pub kept: &'a TreeNode,
    pub discarded: &'a TreeNode,
}

impl Resolution<'_> {
    /// Human-readable note for the report.
    pub fn note(&self, policy: ConflictPolicy) -> String {
        let who = match self.survivor {
            Survivor::Incoming => "incoming",
            Survivor::Existing => "existing",
        };
        format!(
            "kept {who} {} ({}), discarded {}",
            self.kept.path.display(),
            policy.describe(),
            self.discarded.path.display()
        )
    }
}

/// Decide which of `incoming` and `existing` occupies the destination.
///
/// The incoming candidate wins only when strictly newer or larger; ties keep
/// the entry already at the destination.
pub fn resolve<'a>(
    policy: ConflictPolicy,
    incoming: &'a TreeNode,
    existing: &'a TreeNode,
) -> Resolution<'a> {
    let incoming_wins = match policy {
        ConflictPolicy::PreferNewerMtime => incoming.modified > existing.modified,
        ConflictPolicy::PreferLargerSize => incoming.size > existing.size,
    };
    if incoming_wins {
        Resolution {
            survivor: Survivor::Incoming,
            kept: incoming,
            discarded: existing,
        }
    } else {
        Resolution {
            survivor: Survivor::Existing,
            kept: existing,
            discarded: incoming,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;
    use std::time::{Duration, UNIX_EPOCH};

    fn file(path: &str, size: u64, mtime: u64) -> TreeNode {
        TreeNode {
            path: path.into(),
            kind: NodeKind::File,
            size,
            modified: UNIX_EPOCH + Duration::from_secs(mtime),
        }
    }

    #[test]
    fn newer_incoming_replaces_existing() {
        let incoming = file("/a/hunyuan_1/out.mp4", 1, 200);
        let existing = file("/a/video.mp4", 9, 100);
        let resolution = resolve(ConflictPolicy::PreferNewerMtime, &incoming, &existing);
        assert_eq!(resolution.survivor, Survivor::Incoming);
        assert_eq!(resolution.discarded, &existing);
    }

    #[test]
    fn older_incoming_is_discarded() {
        let incoming = file("/a/hunyuan_1/out.mp4", 1, 100);
        let existing = file("/a/video.mp4", 1, 200);
        let resolution = resolve(ConflictPolicy::PreferNewerMtime, &incoming, &existing);
        assert_eq!(resolution.survivor, Survivor::Existing);
        assert_eq!(resolution.kept, &existing);
    }

    #[test]
    fn size_ties_keep_existing() {
        let incoming = file("/q/video.mp4", 10, 500);
        let existing = file("/q/run_1/video/video.mp4", 10, 1);
        for _ in 0..3 {
            let resolution = resolve(ConflictPolicy::PreferLargerSize, &incoming, &existing);
            assert_eq!(resolution.survivor, Survivor::Existing);
        }
    }

    #[test]
    fn mtime_ties_keep_existing() {
        let incoming = file("/a/hunyuan_1/out.mp4", 1, 100);
        let existing = file("/a/video.mp4", 1, 100);
        let resolution = resolve(ConflictPolicy::PreferNewerMtime, &incoming, &existing);
        assert_eq!(resolution.survivor, Survivor::Existing);
    }

    #[test]
    fn strictly_larger_incoming_wins() {
        let incoming = file("/q/video.mp4", 11, 1);
        let existing = file("/q/run_1/video/video.mp4", 10, 500);
        let resolution = resolve(ConflictPolicy::PreferLargerSize, &incoming, &existing);
        assert_eq!(resolution.survivor, Survivor::Incoming);
        assert!(resolution
            .note(ConflictPolicy::PreferLargerSize)
            .starts_with("kept incoming /q/video.mp4 (larger)"));
    }
}
