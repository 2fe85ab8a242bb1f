use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("no usable model cache directory on this platform")]
    CacheDirUnavailable,
    #[error("cannot create {path}: {source}")]
    CreateCacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fetching {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("writing {path} failed: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 when the server sent no Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a model file by name, checking local locations before
/// downloading.
///
/// Order: per-user cache directory, then an optional bundled directory,
/// then download from `url` into the cache.
pub fn resolve(
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cache_dir = model_cache_dir()?;

    let mut candidates = vec![cache_dir.join(name)];
    if let Some(dir) = bundled_dir {
        candidates.push(dir.join(name));
    }
    if let Some(found) = candidates.into_iter().find(|p| p.exists()) {
        return Ok(found);
    }

    fs::create_dir_all(&cache_dir).map_err(|e| ModelResolveError::CreateCacheDir {
        path: cache_dir.clone(),
        source: e,
    })?;

    log::info!("downloading {name} from {url}");
    let target = cache_dir.join(name);
    download(url, &target, progress)?;
    Ok(target)
}

/// Per-user model cache directory.
///
/// - macOS: `~/Library/Application Support/PersonGuard/models/`
/// - Linux: `$XDG_CACHE_HOME/PersonGuard/models/` or `~/.cache/PersonGuard/models/`
/// - Windows: `%LOCALAPPDATA%/PersonGuard/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join("PersonGuard").join("models"))
        .ok_or(ModelResolveError::CacheDirUnavailable)
}

/// Downloads to a `.part` sibling first; the final path only ever holds a
/// complete file.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    if let Err(e) = fetch_into(url, &temp_path, progress.as_ref()) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Persist {
        path: dest.to_path_buf(),
        source: e,
    })
}

fn fetch_into(
    url: &str,
    temp_path: &Path,
    progress: Option<&ProgressFn>,
) -> Result<(), ModelResolveError> {
    let fetch_err = |e: reqwest::Error| ModelResolveError::Fetch {
        url: url.to_string(),
        source: e,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?;

    let file = fs::File::create(temp_path).map_err(|e| ModelResolveError::Persist {
        path: temp_path.to_path_buf(),
        source: e,
    })?;

    // Streams the body straight to disk; models run into the hundreds
    // of megabytes.
    let mut sink = ProgressSink {
        file,
        written: 0,
        total: response.content_length().unwrap_or(0),
        notify: progress,
    };
    response.copy_to(&mut sink).map_err(fetch_err)?;

    sink.file.flush().map_err(|e| ModelResolveError::Persist {
        path: temp_path.to_path_buf(),
        source: e,
    })
}

/// File sink that reports cumulative bytes after every write.
struct ProgressSink<'a> {
    file: fs::File,
    written: u64,
    total: u64,
    notify: Option<&'a ProgressFn>,
}

impl Write for ProgressSink<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.file.write(buf)?;
        self.written += n as u64;
        if let Some(cb) = self.notify {
            cb(self.written, self.total);
        }
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}
