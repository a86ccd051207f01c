//! Background model loading.
//!
//! One worker thread serves requests over a channel; the render loop polls
//! results without blocking. Every request carries a generation so results
//! of cancelled or superseded requests are dropped on arrival.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use formats::model::{ModelAsset, ModelError};
use formats::model_codec::load_model_bytes;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    Path(PathBuf),
    /// Already fetched bytes (JSON or compressed).
    Bytes(Vec<u8>),
}

#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, reason: String },
    Model(ModelError),
    WorkerGone,
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { path, reason } => write!(f, "read {}: {reason}", path.display()),
            LoadError::Model(e) => write!(f, "{e}"),
            LoadError::WorkerGone => write!(f, "model loader worker stopped"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ModelError> for LoadError {
    fn from(e: ModelError) -> Self {
        LoadError::Model(e)
    }
}

struct Request {
    generation: u64,
    source: ModelSource,
}

struct Response {
    generation: u64,
    result: Result<ModelAsset, LoadError>,
}

/// Dropping the loader closes the request channel and detaches the worker.
/// A read in progress finishes on its own and its result is thrown away.
pub struct ModelLoader {
    request_tx: Sender<Request>,
    result_rx: Receiver<Response>,
    generation: u64,
    pending: Option<u64>,
}

impl ModelLoader {
    pub fn new() -> Self {
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (result_tx, result_rx) = mpsc::channel::<Response>();
        // Detached. The worker exits once the request channel closes or its
        // results are no longer received.
        if let Err(e) = std::thread::Builder::new()
            .name("model-loader".into())
            .spawn(move || worker_loop(request_rx, result_tx))
        {
            tracing::warn!(error = %e, "model loader thread failed to start");
        }
        Self {
            request_tx,
            result_rx,
            generation: 0,
            pending: None,
        }
    }

    /// Queues a load, superseding any pending one.
    pub fn request(&mut self, source: ModelSource) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let sent = self
            .request_tx
            .send(Request { generation, source })
            .is_ok();
        self.pending = sent.then_some(generation);
        if !sent {
            tracing::warn!(generation, "model load request dropped: worker unavailable");
        }
        generation
    }

    /// Drops the pending load; its result is discarded when it arrives.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            self.generation += 1;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the result of the pending load if it has arrived.
    pub fn poll(&mut self) -> Option<Result<ModelAsset, LoadError>> {
        loop {
            match self.result_rx.try_recv() {
                Ok(response) => {
                    if Some(response.generation) != self.pending {
                        tracing::debug!(generation = response.generation, "stale model load discarded");
                        continue;
                    }
                    self.pending = None;
                    return Some(response.result);
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    return self.pending.take().map(|_| Err(LoadError::WorkerGone));
                }
            }
        }
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModelLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLoader")
            .field("generation", &self.generation)
            .field("pending", &self.pending)
            .finish()
    }
}

fn worker_loop(requests: Receiver<Request>, results: Sender<Response>) {
    while let Ok(Request { generation, source }) = requests.recv() {
        let result = load(source);
        if results.send(Response { generation, result }).is_err() {
            break;
        }
    }
}

fn load(source: ModelSource) -> Result<ModelAsset, LoadError> {
    let bytes = match source {
        ModelSource::Bytes(bytes) => bytes,
        ModelSource::Path(path) => std::fs::read(&path).map_err(|e| LoadError::Io {
            reason: e.to_string(),
            path,
        })?,
    };
    Ok(load_model_bytes(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::{LoadError, ModelLoader, ModelSource};
    use formats::model::{ModelAsset, ModelMesh};
    use formats::model_codec::encode_model;
    use std::time::{Duration, Instant};

    fn asset() -> ModelAsset {
        ModelAsset {
            name: "pin".into(),
            meshes: vec![ModelMesh {
                name: "m".into(),
                positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                indices: vec![0, 1, 2],
            }],
            animations: Vec::new(),
        }
    }

    fn wait(loader: &mut ModelLoader) -> Option<Result<ModelAsset, LoadError>> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(r) = loader.poll() {
                return Some(r);
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        None
    }

    #[test]
    fn loads_json_and_compressed_bytes() {
        let mut loader = ModelLoader::new();
        let json = asset().to_json_vec().expect("json");
        loader.request(ModelSource::Bytes(json));
        let loaded = wait(&mut loader).expect("result").expect("asset");
        assert_eq!(loaded.name, "pin");

        let packed = encode_model(&asset()).expect("encode");
        loader.request(ModelSource::Bytes(packed));
        let loaded = wait(&mut loader).expect("result").expect("asset");
        assert_eq!(loaded.meshes.len(), 1);
        assert!(!loader.is_pending());
    }

    #[test]
    fn missing_file_reports_io_error() {
        let mut loader = ModelLoader::new();
        loader.request(ModelSource::Path("/definitely/not/here.atmc".into()));
        let err = wait(&mut loader).expect("result").expect_err("io error");
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn cancelled_loads_are_discarded() {
        let mut loader = ModelLoader::new();
        loader.request(ModelSource::Bytes(asset().to_json_vec().expect("json")));
        loader.cancel();
        assert!(!loader.is_pending());
        std::thread::sleep(Duration::from_millis(50));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn a_newer_request_supersedes_the_old_one() {
        let mut loader = ModelLoader::new();
        loader.request(ModelSource::Bytes(b"garbage".to_vec()));
        loader.request(ModelSource::Bytes(asset().to_json_vec().expect("json")));
        let result = wait(&mut loader).expect("result");
        assert!(result.is_ok());
    }

    #[test]
    fn dropping_with_a_load_in_flight_does_not_wait_for_it() {
        let big = ModelAsset {
            meshes: vec![ModelMesh {
                name: "m".into(),
                positions: vec![[0.5, 0.25, 0.125]; 200_000],
                indices: vec![0, 1, 2],
            }],
            ..asset()
        };
        let bytes = big.to_json_vec().expect("json");
        let mut loader = ModelLoader::new();
        loader.request(ModelSource::Bytes(bytes));

        let start = Instant::now();
        drop(loader);
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
