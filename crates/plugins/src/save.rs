use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("encode save state for '{key}': {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("decode save state for '{key}' at {path}: {source}")]
    Decode {
        key: &'static str,
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("save state for '{key}' has version {actual}, expected {expected}")]
    Version {
        key: &'static str,
        expected: u32,
        actual: u32,
    },
}

pub(crate) fn encode_state<T: Serialize>(
    key: &'static str,
    state: &T,
) -> Result<serde_json::Value, SaveError> {
    serde_json::to_value(state).map_err(|source| SaveError::Encode { key, source })
}

/// Deserializes a plugin's save envelope, naming the failing JSON path on
/// error so a broken blob points at the field that broke it.
pub(crate) fn decode_state<T: DeserializeOwned>(
    key: &'static str,
    value: &serde_json::Value,
) -> Result<T, SaveError> {
    match serde_path_to_error::deserialize(value) {
        Ok(state) => Ok(state),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            Err(SaveError::Decode { key, path, source })
        }
    }
}

pub(crate) fn check_version(
    key: &'static str,
    expected: u32,
    actual: u32,
) -> Result<(), SaveError> {
    if expected == actual {
        Ok(())
    } else {
        Err(SaveError::Version {
            key,
            expected,
            actual,
        })
    }
}
