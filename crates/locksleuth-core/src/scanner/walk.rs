/// Directory traversal for one scan root.
///
/// Uses `jwalk` in serial mode with name-sorted siblings, so the order in
/// which files are reported is stable from run to run. Hidden files are
/// included and symlinks are not followed. Directories are never yielded;
/// everything else (regular files and symlinks) is.
use std::path::{Path, PathBuf};

/// One item produced by the walk.
#[derive(Debug)]
pub enum WalkItem {
    File(PathBuf),
    /// An entry the walk could not read (permission denied, vanished, ...).
    Error {
        path: Option<PathBuf>,
        message: String,
    },
}

/// Walk `root` depth-first.
pub fn walk_root(root: &Path) -> impl Iterator<Item = WalkItem> {
    jwalk::WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::Serial)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_dir() => None,
            Ok(e) => Some(WalkItem::File(e.path())),
            Err(err) => Some(WalkItem::Error {
                path: err.path().map(Path::to_path_buf),
                message: err.to_string(),
            }),
        })
}

/// Resolve a user-supplied root to an absolute path without touching
/// symlinks.
pub fn resolve_root(root: &Path) -> std::io::Result<PathBuf> {
    std::path::absolute(root)
}

/// The path shown to the user for `path` found under `root`.
///
/// Relative to `root` when possible; the absolute path otherwise. When the
/// root is the file itself, its file name is shown.
pub fn display_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned()),
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}
