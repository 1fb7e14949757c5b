use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] verileaf_store_lmdb::LmdbError),

    #[error("registry error: {0}")]
    Registry(#[from] verileaf_registry::RegistryError),

    #[error("config error: {0}")]
    Config(String),

    #[error("the store holds no registry and no owner is configured")]
    MissingOwner,

    #[error("the owner must not be the null identity")]
    NullOwner,

    #[error("RPC server error: {0}")]
    Rpc(String),

    #[error("WebSocket server error: {0}")]
    WebSocket(String),

    #[error("shutdown timeout")]
    ShutdownTimeout,
}

impl From<verileaf_store::StoreError> for NodeError {
    fn from(e: verileaf_store::StoreError) -> Self {
        NodeError::Registry(e.into())
    }
}
