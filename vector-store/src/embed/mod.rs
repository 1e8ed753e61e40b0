//! Fixed-dimension embedding on top of a lazily loaded native model.
//!
//! The index dimension is configured independently of the model, so every
//! native vector is fitted to `D` (zero-padded on the right or truncated).

use crate::errors::StoreError;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub mod ollama;

/// Native embedding model.
///
/// Implementations must be deterministic: the same text yields the same
/// vector for the lifetime of the model.
pub trait EmbeddingModel: Send + Sync {
    /// Encodes `text` at the model's native width.
    fn encode<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, StoreError>> + Send + 'a>>;

    /// Human-readable model identifier for logs.
    fn name(&self) -> &str;
}

/// Builds the model on first use.
pub trait ModelLoader: Send + Sync {
    fn load(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn EmbeddingModel>, StoreError>> + Send + '_>>;
}

enum EmbedderState {
    Uninitialized,
    Ready(Arc<dyn EmbeddingModel>),
    /// Load failed; stays failed until [`Embedder::reset`].
    Failed(String),
}

/// Produces vectors of exactly `dim` values.
///
/// The model is loaded once on the first [`Embedder::embed`] call and shared
/// afterwards. A failed load is remembered and reported without retrying.
pub struct Embedder {
    loader: Arc<dyn ModelLoader>,
    state: Mutex<EmbedderState>,
    dim: usize,
}

impl Embedder {
    pub fn new(loader: Arc<dyn ModelLoader>, dim: usize) -> Self {
        Self {
            loader,
            state: Mutex::new(EmbedderState::Uninitialized),
            dim,
        }
    }

    /// Embedder around an already loaded model.
    pub fn with_model(model: Arc<dyn EmbeddingModel>, dim: usize) -> Self {
        Self {
            loader: Arc::new(Preloaded(model.clone())),
            state: Mutex::new(EmbedderState::Ready(model)),
            dim,
        }
    }

    /// Target dimension `D`.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the loaded model, loading it on first use.
    ///
    /// # Errors
    /// [`StoreError::EmbeddingUnavailable`] when the load fails now or failed
    /// earlier without a [`Embedder::reset`] since.
    pub async fn model(&self) -> Result<Arc<dyn EmbeddingModel>, StoreError> {
        let mut state = self.state.lock().await;
        match &*state {
            EmbedderState::Ready(model) => return Ok(model.clone()),
            EmbedderState::Failed(reason) => {
                return Err(StoreError::EmbeddingUnavailable(reason.clone()));
            }
            EmbedderState::Uninitialized => {}
        }

        match self.loader.load().await {
            Ok(model) => {
                info!(model = %model.name(), dim = self.dim, "embedding model loaded");
                *state = EmbedderState::Ready(model.clone());
                Ok(model)
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(error = %reason, "embedding model failed to load");
                *state = EmbedderState::Failed(reason.clone());
                Err(StoreError::EmbeddingUnavailable(reason))
            }
        }
    }

    /// Embeds `text` into a vector of exactly [`Embedder::dim`] values.
    ///
    /// # Errors
    /// [`StoreError::EmbeddingUnavailable`] if the model cannot be loaded or
    /// fails to encode.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        let model = self.model().await?;
        let native = model
            .encode(text)
            .await
            .map_err(|e| StoreError::EmbeddingUnavailable(e.to_string()))?;
        if native.len() != self.dim {
            debug!(native = native.len(), dim = self.dim, "fitting embedding width");
        }
        Ok(fit_dimension(native, self.dim))
    }

    /// Forgets a loaded model or a remembered failure.
    pub async fn reset(&self) {
        *self.state.lock().await = EmbedderState::Uninitialized;
    }

    /// Whether a load has failed and not been reset.
    pub async fn is_failed(&self) -> bool {
        matches!(*self.state.lock().await, EmbedderState::Failed(_))
    }
}

/// Zero-pads on the right or truncates so the result has exactly `dim` values.
pub fn fit_dimension(mut v: Vec<f32>, dim: usize) -> Vec<f32> {
    v.resize(dim, 0.0);
    v
}

struct Preloaded(Arc<dyn EmbeddingModel>);

impl ModelLoader for Preloaded {
    fn load(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn EmbeddingModel>, StoreError>> + Send + '_>>
    {
        let model = self.0.clone();
        Box::pin(async move { Ok(model) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Width(usize);

    impl EmbeddingModel for Width {
        fn encode<'a>(
            &'a self,
            text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, StoreError>> + Send + 'a>> {
            let seed = text.len() as f32;
            let n = self.0;
            Box::pin(async move { Ok((0..n).map(|i| seed + i as f32 + 1.0).collect()) })
        }

        fn name(&self) -> &str {
            "width"
        }
    }

    struct FailingLoader {
        calls: AtomicUsize,
    }

    impl ModelLoader for FailingLoader {
        fn load(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn EmbeddingModel>, StoreError>> + Send + '_>>
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(StoreError::Config("model missing".into())) })
        }
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit_dimension(vec![1.0, 2.0], 4), vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(fit_dimension(vec![1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
    }

    #[tokio::test]
    async fn padded_tail_is_zero() {
        let e = Embedder::with_model(Arc::new(Width(384)), 1536);
        let v = e.embed("hello").await.unwrap();
        assert_eq!(v.len(), 1536);
        assert!(v[..384].iter().all(|x| *x != 0.0));
        assert!(v[384..].iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn failed_load_is_sticky_until_reset() {
        let loader = Arc::new(FailingLoader {
            calls: AtomicUsize::new(0),
        });
        let e = Embedder::new(loader.clone(), 1536);

        assert!(matches!(
            e.embed("a").await,
            Err(StoreError::EmbeddingUnavailable(_))
        ));
        assert!(e.embed("b").await.is_err());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(e.is_failed().await);

        e.reset().await;
        assert!(e.embed("c").await.is_err());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }
}
