use {
    alloy::{
        primitives::{B256, Bytes, U256},
        rpc::types::Log,
    },
    alloy_dyn_abi::DynSolValue,
    artifact::{Abi, ArtifactError},
    chain::AccountId,
    chrono::{DateTime, Utc},
    std::fmt,
};

const CALLER: &str = "caller";
const RANDOM_NUMBER: &str = "randomNumber";
const SEED_BYTES: &str = "seedBytes";
const TIMESTAMP: &str = "timestamp";

/// One decoded occurrence of the monitored event. Decoded, printed,
/// discarded; never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub tx_hash: B256,
    pub caller: AccountId,
    pub random_number: U256,
    pub seed: Bytes,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("event field {0:?} is missing or has an unexpected type")]
    Field(&'static str),
    #[error("event timestamp {0} is not a valid unix time")]
    Timestamp(U256),
}

impl EventRecord {
    /// Decodes a raw log using the event's ABI description.
    pub fn decode(
        abi: &Abi,
        event_name: &str,
        tx_hash: B256,
        log: &Log,
    ) -> Result<Self, RecordError> {
        let data = &log.inner.data;
        let fields = abi.decode_event(event_name, data.topics().to_vec(), &data.data)?;

        let caller = match fields.get(CALLER) {
            Some(DynSolValue::Address(address)) => AccountId::from_evm_address(*address),
            _ => return Err(RecordError::Field(CALLER)),
        };
        let random_number = match fields.get(RANDOM_NUMBER) {
            Some(DynSolValue::Uint(value, _)) => *value,
            _ => return Err(RecordError::Field(RANDOM_NUMBER)),
        };
        let seed = match fields.get(SEED_BYTES) {
            Some(DynSolValue::Bytes(bytes)) => Bytes::from(bytes.clone()),
            Some(DynSolValue::FixedBytes(word, size)) => Bytes::from(word[..*size].to_vec()),
            _ => return Err(RecordError::Field(SEED_BYTES)),
        };
        let timestamp = match fields.get(TIMESTAMP) {
            Some(DynSolValue::Uint(value, _)) => unix_timestamp(*value)?,
            _ => return Err(RecordError::Field(TIMESTAMP)),
        };

        Ok(Self {
            tx_hash,
            caller,
            random_number,
            seed,
            timestamp,
        })
    }
}

fn unix_timestamp(value: U256) -> Result<DateTime<Utc>, RecordError> {
    let secs = i64::try_from(value).map_err(|_| RecordError::Timestamp(value))?;
    DateTime::from_timestamp(secs, 0).ok_or(RecordError::Timestamp(value))
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} : {} -> {} from seed({}) @ {}",
            self.tx_hash,
            self.caller,
            self.random_number,
            self.seed,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}
