use crate::utils::error::{HarvestError, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

/// A page's working directory. Created on acquire; deleted by `release` on
/// the success path, or handed back by `retain` so it stays on disk for
/// inspection.
#[derive(Debug)]
#[must_use = "an output directory must be released or retained"]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    /// Creates the directory if needed. An existing directory is reused.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the directory and everything under it.
    pub fn release(self) -> Result<()> {
        fs::remove_dir_all(&self.path)?;
        tracing::debug!("Removed {}", self.path.display());
        Ok(())
    }

    pub fn retain(self) -> PathBuf {
        self.path
    }
}

/// Writes every regular file under `source_dir` into a deflate-compressed
/// zip at `archive_path`, named by its path relative to `source_dir`.
/// Returns the number of files written.
///
/// The zip is built next to its destination as `<archive>.part` and only
/// renamed into place once complete, so a failure never leaves a truncated
/// archive behind.
pub fn create_archive(source_dir: &Path, archive_path: &Path) -> Result<usize> {
    let mut files = Vec::new();
    collect_files(source_dir, &mut files)?;
    // entry order follows the sorted paths
    files.sort();

    let part_path = part_path_for(archive_path);
    let written = write_zip(source_dir, &files, &part_path)
        .and_then(|()| fs::rename(&part_path, archive_path).map_err(HarvestError::from));
    if let Err(e) = written {
        // may not exist yet if the create itself failed
        let _ = fs::remove_file(&part_path);
        return Err(e);
    }

    tracing::debug!(
        "Wrote {} files from {} into {}",
        files.len(),
        source_dir.display(),
        archive_path.display()
    );
    Ok(files.len())
}

fn part_path_for(archive_path: &Path) -> PathBuf {
    let mut name = archive_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn write_zip(source_dir: &Path, files: &[PathBuf], part_path: &Path) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(part_path)?);

    for file_path in files {
        let name = archive_name(source_dir, file_path)?;
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(name, options)?;
        let mut source = File::open(file_path)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&entry.path(), files)?;
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }
    Ok(())
}

// Zip entry names always use '/' separators.
fn archive_name(root: &Path, file_path: &Path) -> Result<String> {
    let relative = file_path
        .strip_prefix(root)
        .map_err(|e| HarvestError::ArchiveError {
            message: format!("{} is outside {}: {}", file_path.display(), root.display(), e),
        })?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}
