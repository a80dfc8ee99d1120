//! Loading of compiled contract artifacts and ABI-bound decoding of raw
//! payloads into named fields.

use {
    alloy_dyn_abi::{DynSolValue, EventExt as _, FunctionExt as _},
    alloy_json_abi::{Event, Function, JsonAbi},
    alloy_primitives::{B256, Bytes},
    serde::Deserialize,
    std::path::{Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read contract artifact at {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed contract artifact at {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The ABI has no entry with the requested name. This indicates a
    /// mismatch between the configured contract name and the deployed
    /// contract, not a transient failure.
    #[error("no entry named {0:?} in the contract abi")]
    UnknownName(String),
    #[error("failed to decode payload for {name:?}")]
    Decode {
        name: String,
        #[source]
        source: alloy_dyn_abi::Error,
    },
}

/// A compiled contract artifact as emitted by the build pipeline: the
/// deployable bytecode plus the contract interface description.
#[derive(Debug, Deserialize)]
pub struct ContractArtifact {
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Reads the artifact from the conventional
    /// `<dir>/contracts/<name>.sol/<name>.json` location.
    pub fn for_contract(artifact_dir: &Path, name: &str) -> Result<Self, ArtifactError> {
        Self::from_path(
            &artifact_dir
                .join("contracts")
                .join(format!("{name}.sol"))
                .join(format!("{name}.json")),
        )
    }

    pub fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let raw = std::fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| ArtifactError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Contract interface description with name-addressed decoding helpers.
///
/// Lookups are by name only; for overloaded names the entry declared first
/// wins.
#[derive(Debug, Clone)]
pub struct Abi(JsonAbi);

impl Abi {
    pub fn new(abi: JsonAbi) -> Self {
        Self(abi)
    }

    pub fn function(&self, name: &str) -> Result<&Function, ArtifactError> {
        self.0
            .functions
            .get(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| ArtifactError::UnknownName(name.to_string()))
    }

    pub fn event(&self, name: &str) -> Result<&Event, ArtifactError> {
        self.0
            .events
            .get(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| ArtifactError::UnknownName(name.to_string()))
    }

    /// Decodes the raw result of executing the named function into its
    /// declared outputs.
    pub fn decode_function_result(
        &self,
        name: &str,
        data: &[u8],
    ) -> Result<DecodedFields, ArtifactError> {
        let function = self.function(name)?;
        let values = function
            .abi_decode_output(data)
            .map_err(|source| ArtifactError::Decode {
                name: name.to_string(),
                source,
            })?;
        let names = function.outputs.iter().map(|param| param.name.clone());
        Ok(DecodedFields(names.zip(values).collect()))
    }

    /// Decodes a log emitted by the named event into its declared fields,
    /// merging indexed (topic) and non-indexed (data) parameters back into
    /// declaration order.
    pub fn decode_event(
        &self,
        name: &str,
        topics: impl IntoIterator<Item = B256>,
        data: &[u8],
    ) -> Result<DecodedFields, ArtifactError> {
        let event = self.event(name)?;
        let decoded =
            event
                .decode_log_parts(topics, data)
                .map_err(|source| ArtifactError::Decode {
                    name: name.to_string(),
                    source,
                })?;
        let mut indexed = decoded.indexed.into_iter();
        let mut body = decoded.body.into_iter();
        let fields = event
            .inputs
            .iter()
            .map(|input| {
                let value = if input.indexed {
                    indexed.next()
                } else {
                    body.next()
                };
                // A successful decode yields exactly one value per declared
                // parameter.
                let value = value.expect("decoded event matches its definition");
                (input.name.clone(), value)
            })
            .collect();
        Ok(DecodedFields(fields))
    }
}

/// Decoded fields in declaration order, addressable by name.
#[derive(Debug, Clone)]
pub struct DecodedFields(Vec<(String, DynSolValue)>);

impl DecodedFields {
    pub fn get(&self, name: &str) -> Option<&DynSolValue> {
        self.0
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DynSolValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
