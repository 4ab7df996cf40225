use thiserror::Error;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage io error on record {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("record {key} is not valid json: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid record key {0:?}")]
    InvalidKey(String),
    #[error("storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_owned(),
            source,
        }
    }

    pub(crate) fn json(key: &str, source: serde_json::Error) -> Self {
        Self::Json {
            key: key.to_owned(),
            source,
        }
    }
}
