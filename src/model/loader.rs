//! Model locating, downloading, and loading utilities.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};

use super::generator::OnnxGenerator;

/// Where the generator artifact comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// An artifact already on disk.
    Local(PathBuf),
    /// An artifact fetched once over HTTP and kept in the model cache.
    Remote {
        /// Download URL.
        url: String,
        /// File name inside the cache directory.
        file_name: String,
    },
}

impl ModelSource {
    /// Build a remote source, naming the cached file after the whole URL.
    #[must_use]
    pub fn remote(url: &str) -> Self {
        Self::Remote {
            url: url.to_string(),
            file_name: cache_file_name(url),
        }
    }

    /// Resolve the source to a local path, downloading if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or the
    /// download fails.
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            Self::Local(path) => Ok(path.clone()),
            Self::Remote { url, file_name } => ModelCache::new()?.fetch(url, file_name),
        }
    }
}

/// Flatten a URL into a cache file name.
///
/// Host and every path segment are kept so that artifacts sharing a basename
/// (`.../v1/model.onnx`, `.../v2/model.onnx`) never share a cache entry.
/// Scheme, query, and fragment are dropped.
fn cache_file_name(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let location = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme);

    let name = location
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .map(|segment| {
            segment
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || matches!(c, '.' | '-') {
                        c
                    } else {
                        '_'
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("_");

    if name.is_empty() {
        "generator.onnx".to_string()
    } else {
        name
    }
}

/// Load the generator described by `path`.
///
/// Meant to be called once at startup; a failure here is fatal for the
/// process since no try-on can run without the generator.
///
/// # Errors
///
/// Returns [`Error::ModelNotFound`] if the artifact is missing and
/// [`Error::ModelLoad`] if it cannot be deserialized.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<OnnxGenerator> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(Error::ModelNotFound {
            path: path.to_path_buf(),
        });
    }

    tracing::info!("Loading generator from {}", path.display());
    let generator = OnnxGenerator::from_file(path)?;

    let info = generator.info();
    tracing::info!(
        "Generator loaded (inputs: {:?}, outputs: {:?})",
        info.inputs,
        info.outputs
    );

    Ok(generator)
}

/// Manages the model cache directory and downloads.
pub struct ModelCache {
    cache_dir: PathBuf,
}

impl ModelCache {
    /// Create a new model cache.
    ///
    /// Uses the platform-appropriate cache directory:
    /// - Windows: `%LOCALAPPDATA%\virtual-tryon\models`
    /// - Linux: `~/.cache/virtual-tryon/models`
    /// - macOS: `~/Library/Caches/virtual-tryon/models`
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created.
    pub fn new() -> Result<Self> {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::with_dir(base.join("virtual-tryon").join("models"))
    }

    /// Create a cache rooted at an explicit directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_dir<P: Into<PathBuf>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.into();

        fs::create_dir_all(&cache_dir).map_err(|source| Error::CacheDir {
            path: cache_dir.clone(),
            source,
        })?;

        Ok(Self { cache_dir })
    }

    /// Directory the artifacts live in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get the path to a cached artifact, downloading it if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be downloaded.
    pub fn fetch(&self, url: &str, file_name: &str) -> Result<PathBuf> {
        let path = self.cache_dir.join(file_name);

        if path.exists() {
            tracing::debug!("Using cached model {}", path.display());
        } else {
            download_file(url, &path, file_name)?;
        }

        Ok(path)
    }
}

/// Download a file from a URL to a path with progress indication.
fn download_file(url: &str, path: &Path, name: &str) -> Result<()> {
    tracing::info!("Downloading {name} from {url}");

    // Write to a temporary file first, then rename for atomicity
    let temp_path = path.with_extension("tmp");
    let cache_write = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| Error::CacheWrite { path, source }
    };
    let mut file = fs::File::create(&temp_path).map_err(cache_write(&temp_path))?;

    let client = reqwest::blocking::Client::new();
    let response = match client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
    {
        Ok(response) => response,
        Err(source) => {
            drop(file);
            let _ = fs::remove_file(&temp_path);
            return Err(Error::ModelDownload {
                name: name.to_string(),
                source,
            });
        }
    };

    let pb = response
        .content_length()
        .map_or_else(ProgressBar::new_spinner, ProgressBar::new);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(format!("Downloading {name}"));

    let mut downloaded = 0u64;
    let mut reader = response;

    loop {
        let mut buffer = [0u8; 8192];
        let bytes_read = std::io::Read::read(&mut reader, &mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])
            .map_err(cache_write(&temp_path))?;
        downloaded += bytes_read as u64;
        pb.set_position(downloaded);
    }
    file.flush().map_err(cache_write(&temp_path))?;

    pb.finish_with_message(format!("Downloaded {name}"));

    fs::rename(&temp_path, path).map_err(cache_write(path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_file_name_from_url() {
        let source = ModelSource::remote("https://example.com/models/pix2pix_tryon_G.onnx");
        assert_eq!(
            source,
            ModelSource::Remote {
                url: "https://example.com/models/pix2pix_tryon_G.onnx".to_string(),
                file_name: "example.com_models_pix2pix_tryon_G.onnx".to_string(),
            }
        );
    }

    #[test]
    fn test_remote_file_name_trailing_slash() {
        match ModelSource::remote("https://example.com/gen.onnx/") {
            ModelSource::Remote { file_name, .. } => {
                assert_eq!(file_name, "example.com_gen.onnx");
            }
            ModelSource::Local(_) => panic!("expected remote source"),
        }
    }

    #[test]
    fn test_same_basename_gets_distinct_cache_entries() {
        let v1 = cache_file_name("https://huggingface.co/org/tryon-v1/resolve/main/model.onnx");
        let v2 = cache_file_name("https://huggingface.co/org/tryon-v2/resolve/main/model.onnx");

        assert_ne!(v1, v2);
        assert_eq!(v1, "huggingface.co_org_tryon-v1_resolve_main_model.onnx");
    }

    #[test]
    fn test_query_and_fragment_are_dropped() {
        assert_eq!(
            cache_file_name("https://example.com/a/model.onnx?download=true#top"),
            "example.com_a_model.onnx"
        );
        assert_eq!(cache_file_name("https://"), "generator.onnx");
    }

    #[test]
    fn test_local_source_resolves_to_itself() {
        let source = ModelSource::Local(PathBuf::from("models/g.onnx"));
        assert_eq!(source.resolve().unwrap(), PathBuf::from("models/g.onnx"));
    }

    #[test]
    fn test_load_model_missing_path() {
        match load_model("models/definitely_missing.onnx") {
            Err(Error::ModelNotFound { path }) => {
                assert_eq!(path, PathBuf::from("models/definitely_missing.onnx"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_load_model_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("g.onnx");
        std::fs::write(&artifact, b"definitely not a protobuf graph").unwrap();

        match load_model(&artifact) {
            Err(Error::ModelLoad { path, .. }) => assert_eq!(path, artifact),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_unwritable_cache_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::with_dir(dir.path().join("models")).unwrap();
        std::fs::remove_dir(cache.dir()).unwrap();

        // Fails locally before any request goes out
        match cache.fetch("http://127.0.0.1:9/g.onnx", "g.onnx") {
            Err(Error::CacheWrite { path, .. }) => {
                assert_eq!(path, cache.dir().join("g.tmp"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_cache_fetch_uses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::with_dir(dir.path().join("models")).unwrap();
        std::fs::write(cache.dir().join("g.onnx"), b"stub").unwrap();

        // Unroutable URL: a cache hit must not touch the network
        let path = cache.fetch("http://127.0.0.1:9/g.onnx", "g.onnx").unwrap();
        assert_eq!(path, cache.dir().join("g.onnx"));
    }
}
