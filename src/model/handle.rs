//! Load-once handle for the process-wide generator.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

use super::generator::{Generator, OnnxGenerator};
use super::loader::load_model;

/// Owns the path of the single generator used by a process and loads it on
/// first use.
///
/// Every later call returns the same `Arc`, so all try-on requests share one
/// in-memory model. A failed load leaves the handle empty.
pub struct ModelHandle<G = OnnxGenerator> {
    path: PathBuf,
    slot: Mutex<Option<Arc<G>>>,
}

impl<G: Generator> ModelHandle<G> {
    /// Create an empty handle for the artifact at `path`.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            slot: Mutex::new(None),
        }
    }

    /// Artifact path this handle loads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the generator has been loaded already.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.slot.lock().is_ok_and(|slot| slot.is_some())
    }

    /// Return the loaded generator, running `load` if this is the first call.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error; nothing is cached in that case.
    pub fn get_or_load_with<F>(&self, load: F) -> Result<Arc<G>>
    where
        F: FnOnce(&Path) -> Result<G>,
    {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| Error::LockPoisoned("model handle"))?;

        if let Some(generator) = slot.as_ref() {
            return Ok(Arc::clone(generator));
        }

        let generator = Arc::new(load(&self.path)?);
        *slot = Some(Arc::clone(&generator));
        Ok(generator)
    }
}

impl ModelHandle<OnnxGenerator> {
    /// Return the ONNX generator, loading it from disk on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact is missing or cannot be loaded.
    pub fn get_or_load(&self) -> Result<Arc<OnnxGenerator>> {
        self.get_or_load_with(|path| load_model(path))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::image::ImageTensor;
    use crate::model::CombinedTensor;

    #[derive(Debug)]
    struct Echo;

    impl Generator for Echo {
        fn predict(&self, input: &CombinedTensor) -> Result<ImageTensor> {
            Ok(input.clone())
        }
    }

    #[test]
    fn test_second_load_returns_same_instance() {
        let handle = ModelHandle::<Echo>::new("models/echo.onnx");
        let loads = AtomicUsize::new(0);
        let loader = |_: &Path| -> Result<Echo> {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(Echo)
        };

        let first = handle.get_or_load_with(loader).unwrap();
        let second = handle.get_or_load_with(loader).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let handle = ModelHandle::<Echo>::new("models/echo.onnx");

        let err = handle
            .get_or_load_with(|path| {
                Err(Error::ModelNotFound {
                    path: path.to_path_buf(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { .. }));
        assert!(!handle.is_loaded());

        handle.get_or_load_with(|_| Ok(Echo)).unwrap();
        assert!(handle.is_loaded());
    }

    #[test]
    fn test_loader_receives_handle_path() {
        let handle = ModelHandle::<Echo>::new("models/echo.onnx");
        handle
            .get_or_load_with(|path| {
                assert_eq!(path, Path::new("models/echo.onnx"));
                Ok(Echo)
            })
            .unwrap();
    }

    #[test]
    fn test_missing_onnx_artifact() {
        let handle = ModelHandle::<OnnxGenerator>::new("models/missing.onnx");
        assert!(matches!(
            handle.get_or_load(),
            Err(Error::ModelNotFound { .. })
        ));
    }

    #[test]
    fn test_corrupt_onnx_artifact_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("g.onnx");
        std::fs::write(&artifact, b"\x00\x01garbage").unwrap();

        let handle = ModelHandle::<OnnxGenerator>::new(&artifact);
        match handle.get_or_load() {
            Err(Error::ModelLoad { path, .. }) => assert_eq!(path, artifact),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected failure"),
        }
        assert!(!handle.is_loaded());
    }
}
