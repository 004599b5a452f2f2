use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{InputSource, MergeOptions};
use crate::error::{MergeError, Result};

fn scan_error(path: &Path) -> impl FnOnce(io::Error) -> MergeError + '_ {
    move |source| MergeError::Scan {
        path: path.to_path_buf(),
        source,
    }
}

/// Resolve the input set: explicit files keep their order, directory scans
/// are sorted by path. Duplicates and the output file itself are dropped.
pub fn resolve_inputs(
    input: &InputSource,
    output: &Path,
    options: &MergeOptions,
) -> Result<Vec<PathBuf>> {
    let paths = match input {
        InputSource::Files(files) => files.clone(),
        InputSource::Directory(dir) => collect_paths(dir, options)?,
    };

    let output_key = identity(output);
    let mut seen = HashSet::with_capacity(paths.len());
    let mut resolved = Vec::with_capacity(paths.len());
    for path in paths {
        let key = identity(&path);
        if key == output_key {
            warn!("skipping {path:?}, it is the output file");
            continue;
        }
        if !seen.insert(key) {
            debug!("skipping duplicate input {path:?}");
            continue;
        }
        resolved.push(path);
    }

    Ok(resolved)
}

/// Key under which two spellings of the same file compare equal.
fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Recursively collect the files under `in_dir` with a recognized
/// extension, sorted lexicographically by path text. Symlinked
/// directories are not followed.
pub fn collect_paths(in_dir: &Path, options: &MergeOptions) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(in_dir).map_err(scan_error(in_dir))?;
    if !metadata.is_dir() {
        return Err(scan_error(in_dir)(io::Error::other("not a directory")));
    }

    let mut to_process: Vec<PathBuf> = Vec::<_>::with_capacity(16);
    let mut to_expand: Vec<PathBuf> = Vec::<_>::with_capacity(16);
    to_expand.push(in_dir.to_path_buf());
    while let Some(cur_dir) = to_expand.pop() {
        let entries = cur_dir
            .read_dir()
            .map_err(scan_error(&cur_dir))?
            .collect::<io::Result<Vec<_>>>()
            .map_err(scan_error(&cur_dir))?;

        for entry in entries {
            let path = entry.path();
            if is_excluded(&path, &options.exclude) {
                debug!("excluding {path:?}");
                continue;
            }
            let file_type = entry.file_type().map_err(scan_error(&path))?;
            if file_type.is_dir() {
                to_expand.push(path);
            } else if (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
                && has_extension(&path, &options.extensions)
            {
                to_process.push(path);
            }
        }
    }
    // whole path text, so `intro.md` sorts before `intro/details.md`
    to_process.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

    Ok(to_process)
}

fn is_excluded(path: &Path, exclude: &[String]) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| exclude.iter().any(|e| e == name))
}

/// Case-insensitive extension match, `extensions` are stored lowercase.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|e| *e == ext)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, rel).unwrap();
        path
    }

    #[test]
    fn extension_match_ignores_case() {
        let md = vec!["md".to_string()];
        assert!(has_extension(Path::new("a.md"), &md));
        assert!(has_extension(Path::new("dir/A.MD"), &md));
        assert!(!has_extension(Path::new("a.txt"), &md));
        assert!(!has_extension(Path::new("md"), &md));
    }

    #[test]
    fn collect_is_recursive_filtered_and_sorted() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "z.md");
        touch(root, "b/inner.md");
        touch(root, "a.md");
        touch(root, "notes.txt");
        touch(root, "b/deeper/x.MD");
        touch(root, ".git/HEAD.md");

        let paths = collect_paths(root, &MergeOptions::default()).unwrap();
        let rel: Vec<_> = paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a.md"),
                PathBuf::from("b/deeper/x.MD"),
                PathBuf::from("b/inner.md"),
                PathBuf::from("z.md"),
            ]
        );
    }

    #[test]
    fn collect_rejects_missing_and_non_directories() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "a.md");
        let missing = dir.path().join("missing");

        let err = collect_paths(&missing, &MergeOptions::default()).unwrap_err();
        assert!(matches!(err, MergeError::Scan { ref path, .. } if *path == missing));
        let err = collect_paths(&file, &MergeOptions::default()).unwrap_err();
        assert!(matches!(err, MergeError::Scan { .. }));
    }

    #[test]
    fn explicit_files_keep_order_and_drop_duplicates() {
        let dir = TempDir::new().unwrap();
        let b = touch(dir.path(), "b.md");
        let a = touch(dir.path(), "a.md");
        let input = InputSource::Files(vec![b.clone(), a.clone(), b.clone()]);

        let paths =
            resolve_inputs(&input, &dir.path().join("out.md"), &MergeOptions::default()).unwrap();
        assert_eq!(paths, vec![b, a]);
    }

    #[test]
    fn output_is_never_an_input() {
        let dir = TempDir::new().unwrap();
        let a = touch(dir.path(), "a.md");
        let out = touch(dir.path(), "out.md");
        let input = InputSource::Directory(dir.path().to_path_buf());

        let paths = resolve_inputs(&input, &out, &MergeOptions::default()).unwrap();
        assert_eq!(paths, vec![a]);
    }
}
