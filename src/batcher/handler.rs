use async_trait::async_trait;

/// Error type produced by batch handlers.
///
/// Opaque to the batcher; it is broadcast unchanged to every item of the
/// failed batch.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Consumes one batch and produces a single outcome for the whole batch.
///
/// The batch arrives in arrival order and is owned by the handler; the
/// batcher never looks at it again. A handler is trusted to be atomic:
/// there is no per-item success/failure distinction.
#[async_trait]
pub trait BatchHandler<T>: Send + Sync {
    async fn handle(&self, items: Vec<T>) -> Result<(), HandlerError>;
}

#[async_trait]
impl<T, F, Fut> BatchHandler<T> for F
where
    F: Fn(Vec<T>) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<(), HandlerError>> + Send,
    T: Send + 'static,
{
    async fn handle(&self, items: Vec<T>) -> Result<(), HandlerError> {
        self(items).await
    }
}
