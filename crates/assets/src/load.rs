use crate::gltf::{ModelAsset, parse_gltf};
use crate::texture::TextureAsset;
use crate::AssetError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

struct Shared<T> {
    result: Option<Result<T, AssetError>>,
    waker: Option<Waker>,
    delivered: bool,
}

fn lock<T>(shared: &Mutex<Shared<T>>) -> MutexGuard<'_, Shared<T>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Observable state of a [`LoadHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed,
    /// The result was already taken.
    Taken,
}

/// Handle to an in-flight load.
///
/// The result arrives exactly once: either by awaiting the handle or by
/// calling [`poll_ready`](Self::poll_ready) from a frame step. Dropping the
/// handle discards the result when it arrives.
pub struct LoadHandle<T> {
    path: PathBuf,
    shared: Arc<Mutex<Shared<T>>>,
    taken: bool,
}

impl<T> LoadHandle<T> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> LoadState {
        if self.taken {
            return LoadState::Taken;
        }
        match &lock(&self.shared).result {
            None => LoadState::Pending,
            Some(Ok(_)) => LoadState::Ready,
            Some(Err(_)) => LoadState::Failed,
        }
    }

    /// Take the result if the load has finished. Never blocks.
    ///
    /// Returns `None` while pending and after the result was taken.
    pub fn poll_ready(&mut self) -> Option<Result<T, AssetError>> {
        if self.taken {
            return None;
        }
        let result = lock(&self.shared).result.take();
        if result.is_some() {
            self.taken = true;
        }
        result
    }
}

impl<T> Future for LoadHandle<T> {
    type Output = Result<T, AssetError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.taken {
            return Poll::Ready(Err(AssetError::Abandoned));
        }
        let mut shared = lock(&this.shared);
        match shared.result.take() {
            Some(result) => {
                this.taken = true;
                Poll::Ready(result)
            }
            None => {
                shared.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Worker side of a load. Delivers [`AssetError::Abandoned`] if dropped
/// without completing, so a panicking loader cannot leave a handle pending.
struct Completer<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> Completer<T> {
    fn complete(self, result: Result<T, AssetError>) {
        self.deliver(result);
    }

    fn deliver(&self, result: Result<T, AssetError>) {
        let mut shared = lock(&self.shared);
        if shared.delivered {
            return;
        }
        shared.delivered = true;
        shared.result = Some(result);
        if let Some(waker) = shared.waker.take() {
            waker.wake();
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        self.deliver(Err(AssetError::Abandoned));
    }
}

fn channel<T>(path: PathBuf) -> (LoadHandle<T>, Completer<T>) {
    let shared = Arc::new(Mutex::new(Shared {
        result: None,
        waker: None,
        delivered: false,
    }));
    (
        LoadHandle {
            path,
            shared: shared.clone(),
            taken: false,
        },
        Completer { shared },
    )
}

/// Loads files on background threads, relative to an asset root.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a web-style path (`/models/Fox/glTF/Fox.gltf`) under the root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    pub fn load_texture(&self, path: &str) -> LoadHandle<TextureAsset> {
        self.spawn("texture", self.resolve(path), |bytes| TextureAsset::from_bytes(&bytes))
    }

    pub fn load_model(&self, path: &str) -> LoadHandle<ModelAsset> {
        self.spawn("model", self.resolve(path), |bytes| parse_gltf(&bytes))
    }

    fn spawn<T, F>(&self, kind: &'static str, path: PathBuf, decode: F) -> LoadHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(Vec<u8>) -> Result<T, AssetError> + Send + 'static,
    {
        let (handle, completer) = channel(path.clone());
        let spawned = std::thread::Builder::new()
            .name(format!("load-{kind}"))
            .spawn(move || {
                let result = std::fs::read(&path)
                    .map_err(|source| AssetError::Io {
                        path: path.clone(),
                        source,
                    })
                    .and_then(decode);
                match &result {
                    Ok(_) => tracing::info!(path = %path.display(), "{kind} loaded"),
                    Err(e) => tracing::warn!(path = %path.display(), "{kind} failed to load: {e}"),
                }
                completer.complete(result);
            });
        if let Err(e) = spawned {
            // The closure, and the completer in it, were dropped: the handle
            // already reports Abandoned.
            tracing::warn!(kind, "could not start loader thread: {e}");
        }
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait<T>(handle: &mut LoadHandle<T>) -> Result<T, AssetError> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = handle.poll_ready() {
                return result;
            }
            assert!(Instant::now() < deadline, "load never finished");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn resolves_web_paths_under_root() {
        let loader = AssetLoader::new("/srv/static");
        assert_eq!(
            loader.resolve("/models/Fox/glTF/Fox.gltf"),
            PathBuf::from("/srv/static/models/Fox/glTF/Fox.gltf")
        );
    }

    #[test]
    fn model_load_delivers_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("duck.gltf"),
            r#"{"meshes": [{"name": "duck"}]}"#,
        )
        .unwrap();
        let loader = AssetLoader::new(dir.path());
        let mut handle = loader.load_model("/duck.gltf");
        let model = wait(&mut handle).unwrap();
        assert_eq!(model.meshes[0].name, "duck");
        assert!(handle.poll_ready().is_none());
        assert_eq!(handle.state(), LoadState::Taken);
    }

    #[test]
    fn missing_file_fails_with_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path());
        let mut handle = loader.load_texture("missing.png");
        match wait(&mut handle) {
            Err(AssetError::Io { path, .. }) => assert!(path.ends_with("missing.png")),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn handle_can_be_awaited() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.gltf"), "{ nope").unwrap();
        let loader = AssetLoader::new(dir.path());
        let result = pollster::block_on(loader.load_model("bad.gltf"));
        assert!(matches!(result, Err(AssetError::GltfParse(_))));
    }

    #[test]
    fn dropped_completer_reports_abandoned() {
        let (mut handle, completer) = channel::<u32>(PathBuf::from("x"));
        assert_eq!(handle.state(), LoadState::Pending);
        drop(completer);
        assert_eq!(handle.state(), LoadState::Failed);
        assert!(matches!(handle.poll_ready(), Some(Err(AssetError::Abandoned))));
    }
}
