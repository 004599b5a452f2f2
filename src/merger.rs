use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::{MergeConfig, MergeOptions};
use crate::error::{MergeError, Result};
use crate::folders;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub output: PathBuf,
    /// Files whose content made it into the output.
    pub files_merged: usize,
    pub bytes_written: u64,
    /// Empty inputs left out of the output.
    pub skipped: Vec<PathBuf>,
}

/// Writes file contents one after the other, with an optional header
/// before each file and an optional separator line between files.
///
/// Separators and headers go on their own lines: a newline is added first
/// when the previous content does not end with one. Nothing is written
/// after the last file, and with neither separators nor headers the output
/// is the plain concatenation of the contents.
pub struct MergeWriter<'a, W: Write> {
    inner: W,
    options: &'a MergeOptions,
    separators: bool,
    files: usize,
    bytes: u64,
    ends_with_newline: bool,
}

impl<'a, W: Write> MergeWriter<'a, W> {
    pub fn new(inner: W, options: &'a MergeOptions, separators: bool) -> Self {
        Self {
            inner,
            options,
            separators,
            files: 0,
            bytes: 0,
            ends_with_newline: true,
        }
    }

    pub fn write_file(&mut self, path: &Path, content: &str) -> io::Result<()> {
        let marked = self.separators || self.options.headers;
        if self.files > 0 && marked && !self.ends_with_newline {
            self.put("\n")?;
        }
        if self.files > 0 && self.separators {
            let separator = render(&self.options.separator, path);
            self.put(&separator)?;
            self.put("\n")?;
        }
        if self.options.headers {
            let header = render(&self.options.header_format, path);
            self.put(&header)?;
            self.put("\n\n")?;
        }
        self.put(content)?;
        self.files += 1;
        Ok(())
    }

    fn put(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.inner.write_all(text.as_bytes())?;
        self.bytes += text.len() as u64;
        self.ends_with_newline = text.ends_with('\n');
        Ok(())
    }

    /// Flush and return the number of files and bytes written.
    pub fn finish(mut self) -> io::Result<(usize, u64)> {
        self.inner.flush()?;
        Ok((self.files, self.bytes))
    }
}

/// Substitute `{name}` and `{path}` in a separator or header template.
pub fn render(template: &str, path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    template
        .replace("{name}", &name)
        .replace("{path}", &path.display().to_string())
}

fn read_input(path: &Path, options: &MergeOptions) -> Result<String> {
    let read_error = |source| MergeError::Read {
        path: path.to_path_buf(),
        source,
    };

    if let Some(limit) = options.max_file_size {
        let size = fs::metadata(path).map_err(read_error)?.len();
        if size > limit {
            return Err(MergeError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit,
            });
        }
    }

    let content = fs::read_to_string(path).map_err(read_error)?;
    if options.normalize_line_endings && content.contains("\r\n") {
        return Ok(content.replace("\r\n", "\n"));
    }
    Ok(content)
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template("{bar:40} {pos}/{len} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(len as u64).with_style(style)
}

/// Merge the configured inputs into the output file.
///
/// Any unreadable input aborts the merge. The output is assembled in a
/// temporary file next to the destination and only moved into place once
/// every input has been written, so a failed merge leaves no trace.
pub fn merge(config: &MergeConfig) -> Result<MergeResult> {
    let output = &config.output;
    let write_error = |source| MergeError::Write {
        path: output.clone(),
        source,
    };

    let inputs = folders::resolve_inputs(&config.input, output, &config.options)?;
    if inputs.is_empty() {
        return Err(MergeError::NoInput);
    }
    if !config.force && fs::exists(output).map_err(write_error)? {
        return Err(MergeError::OutputExists(output.clone()));
    }
    info!("merging {} files into {output:?}", inputs.len());

    let out_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(out_dir).map_err(write_error)?;

    let progress = progress_bar(inputs.len(), config.progress);
    let mut skipped = Vec::new();
    let mut writer = MergeWriter::new(
        BufWriter::new(tmp.as_file()),
        &config.options,
        config.separators,
    );
    for path in inputs.iter() {
        progress.set_message(path.display().to_string());
        debug!("reading {path:?}");
        let content = read_input(path, &config.options)?;
        if content.is_empty() && config.options.skip_empty {
            warn!("skipping empty file {path:?}");
            skipped.push(path.clone());
        } else {
            writer.write_file(path, &content).map_err(write_error)?;
        }
        progress.inc(1);
    }
    let (files_merged, bytes_written) = writer.finish().map_err(write_error)?;
    progress.finish_and_clear();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(write_error)?;
    }

    let persisted = if config.force {
        tmp.persist(output)
    } else {
        tmp.persist_noclobber(output)
    };
    persisted.map_err(|e| {
        if !config.force && e.error.kind() == io::ErrorKind::AlreadyExists {
            MergeError::OutputExists(output.clone())
        } else {
            write_error(e.error)
        }
    })?;
    info!("wrote {bytes_written} bytes from {files_merged} files to {output:?}");

    Ok(MergeResult {
        output: output.clone(),
        files_merged,
        bytes_written,
        skipped,
    })
}
