// Sample library - decode-and-cache for path-keyed samples
// Samples are shared handles: voices and the engine's instrument map
// hold Arcs into the cache, so a sample's memory survives eviction
// until the last voice referencing it finishes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::sampler::loader::{self, Sample, SampleLoadError};

/// Loads and caches audio samples, keyed by absolute path where the
/// file system can resolve one (falling back to the path as given).
#[derive(Debug, Default)]
pub struct SampleLibrary {
    cache: HashMap<String, Arc<Sample>>,
}

impl SampleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a sample file, or return the cached copy.
    pub fn load_sample(&mut self, path: &str) -> Result<Arc<Sample>, SampleLoadError> {
        let key = cache_key(path);
        if let Some(sample) = self.cache.get(&key) {
            return Ok(Arc::clone(sample));
        }

        let sample = Arc::new(loader::load_sample(Path::new(path))?);
        self.cache.insert(key, Arc::clone(&sample));
        Ok(sample)
    }

    /// Insert an already-decoded sample, keyed by its recorded path.
    /// Returns the shared handle.
    pub fn insert(&mut self, sample: Sample) -> Arc<Sample> {
        let key = cache_key(&sample.path);
        let sample = Arc::new(sample);
        self.cache.insert(key, Arc::clone(&sample));
        sample
    }

    /// A cached sample, or None if it was never loaded.
    pub fn get(&self, path: &str) -> Option<Arc<Sample>> {
        self.cache.get(&cache_key(path)).map(Arc::clone)
    }

    pub fn has_sample(&self, path: &str) -> bool {
        self.cache.contains_key(&cache_key(path))
    }

    /// Evict one sample from the cache. Voices still holding the Arc
    /// keep the audio data alive until they finish.
    pub fn unload_sample(&mut self, path: &str) {
        self.cache.remove(&cache_key(path));
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

fn cache_key(path: &str) -> String {
    std::fs::canonicalize(path)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string())
}
