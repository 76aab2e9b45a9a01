// src/services/object_store.rs
use crate::errors::ResizerError;
use async_trait::async_trait;
use log::info;
use std::path::PathBuf;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, name: &str, data: &[u8], content_type: &str) -> Result<(), ResizerError>;

    /// Where clients are redirected to for `name`.
    fn public_url(&self, name: &str) -> String;
}

/// Objects written to a local directory and served under `public_base_url`.
pub struct LocalObjectStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub async fn new(dir: PathBuf, public_base_url: &str) -> Result<Self, ResizerError> {
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ResizerError::Storage(format!("can't create {}: {}", dir.display(), e)))?;
        Ok(Self {
            dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, name: &str, data: &[u8], content_type: &str) -> Result<(), ResizerError> {
        if name.contains('/') || name.contains('\\') || name.starts_with('.') {
            return Err(ResizerError::Storage(format!("invalid object name '{}'", name)));
        }

        // Readers never observe a partially written object.
        let tmp = self.dir.join(format!(".{}.part", name));
        let path = self.dir.join(name);
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| ResizerError::Storage(format!("can't write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| ResizerError::Storage(format!("can't move {}: {}", path.display(), e)))?;

        info!(
            "wrote {} bytes object '{}' ({}) to {}",
            data.len(),
            name,
            content_type,
            self.dir.display()
        );
        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.public_base_url, name)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryObjectStore {
        objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
        fail_uploads: bool,
    }

    impl MemoryObjectStore {
        pub fn failing() -> Self {
            Self {
                objects: Mutex::new(HashMap::new()),
                fail_uploads: true,
            }
        }

        pub fn get(&self, name: &str) -> Option<(Vec<u8>, String)> {
            self.objects.lock().unwrap().get(name).cloned()
        }

        pub fn len(&self) -> usize {
            self.objects.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryObjectStore {
        async fn upload(&self, name: &str, data: &[u8], content_type: &str) -> Result<(), ResizerError> {
            if self.fail_uploads {
                return Err(ResizerError::Storage("bucket unavailable".to_string()));
            }
            self.objects
                .lock()
                .unwrap()
                .insert(name.to_string(), (data.to_vec(), content_type.to_string()));
            Ok(())
        }

        fn public_url(&self, name: &str) -> String {
            format!("https://bucket.example.com/{}", name)
        }
    }
}
