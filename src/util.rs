use std::path::Path;
use walkdir::WalkDir;

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            if !relative.as_os_str().is_empty() {
                return relative.display().to_string();
            }
        }
    }
    path.display().to_string()
}

/// First file under `root` accepted by `predicate`, in name order.
///
/// Unreadable entries count as a match so callers never delete what they
/// could not inspect.
pub fn find_file_in_subtree<F>(root: &Path, predicate: F) -> Option<std::path::PathBuf>
where
    F: Fn(&Path) -> bool,
{
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() && predicate(entry.path()) => {
                return Some(entry.path().to_path_buf());
            }
            Ok(_) => {}
            Err(err) => {
                return Some(
                    err.path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf()),
                );
            }
        }
    }
    None
}
