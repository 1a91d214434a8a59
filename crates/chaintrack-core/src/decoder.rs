//! Transaction outcome decoding.
//!
//! A raw [`LogValue`] is turned into one of three outcome kinds. Stop and
//! Return carry event logs; Revert carries none.

use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};

use crate::assertion::LogValue;
use crate::error::DecodeError;
use crate::types::{EvmLog, EvmMessage, TransactionLogBundle};

/// The decoded result of one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Stop {
        message: EvmMessage,
        #[serde(default)]
        logs: Vec<EvmLog>,
    },
    Return {
        message: EvmMessage,
        #[serde(default)]
        logs: Vec<EvmLog>,
        #[serde(default)]
        output: Bytes,
    },
    Revert {
        message: EvmMessage,
        #[serde(default)]
        output: Bytes,
    },
}

impl Outcome {
    pub fn message(&self) -> &EvmMessage {
        match self {
            Self::Stop { message, .. }
            | Self::Return { message, .. }
            | Self::Revert { message, .. } => message,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stop { .. } => "stop",
            Self::Return { .. } => "return",
            Self::Revert { .. } => "revert",
        }
    }

    /// The log bundle this outcome contributes, `None` for a revert.
    pub fn into_bundle(self) -> Option<TransactionLogBundle> {
        match self {
            Self::Stop { message, logs } | Self::Return { message, logs, .. } => {
                Some(TransactionLogBundle { message, logs })
            }
            Self::Revert { .. } => None,
        }
    }
}

/// Decodes raw outcome values produced by the rollup VM.
///
/// Implementations must be `Send + Sync`; the dispatcher task owns one as
/// `Arc<dyn OutcomeDecoder>`.
pub trait OutcomeDecoder: Send + Sync {
    fn decode(&self, raw: &LogValue) -> Result<Outcome, DecodeError>;
}

/// Decodes log values whose bytes are a JSON-encoded [`Outcome`].
///
/// Used by the CLI replay command and by fixtures.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOutcomeDecoder;

impl JsonOutcomeDecoder {
    /// Encode an outcome into a log value this decoder accepts.
    pub fn encode(outcome: &Outcome) -> LogValue {
        // Serialising a plain data enum cannot fail.
        LogValue::new(serde_json::to_vec(outcome).unwrap_or_default())
    }
}

impl OutcomeDecoder for JsonOutcomeDecoder {
    fn decode(&self, raw: &LogValue) -> Result<Outcome, DecodeError> {
        if raw.as_bytes().is_empty() {
            return Err(DecodeError::Malformed("empty outcome".into()));
        }
        let value: serde_json::Value = serde_json::from_slice(raw.as_bytes())?;
        match value.get("kind").and_then(|k| k.as_str()) {
            Some("stop" | "return" | "revert") => Ok(serde_json::from_value(value)?),
            Some(other) => Err(DecodeError::UnknownKind(other.to_string())),
            None => Err(DecodeError::Malformed("missing outcome kind".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};

    fn message() -> EvmMessage {
        EvmMessage {
            id: B256::repeat_byte(1),
            sender: Address::repeat_byte(2),
            destination: Address::repeat_byte(3),
            data: Bytes::from_static(&[0xca, 0xfe]),
        }
    }

    fn log() -> EvmLog {
        EvmLog {
            address: Address::repeat_byte(9),
            topics: vec![B256::repeat_byte(5)],
            data: Bytes::from_static(&[1, 2, 3]),
        }
    }

    #[test]
    fn stop_and_return_yield_bundles() {
        let stop = Outcome::Stop { message: message(), logs: vec![log()] };
        assert_eq!(stop.clone().into_bundle().unwrap().logs.len(), 1);

        let ret = Outcome::Return { message: message(), logs: vec![], output: Bytes::new() };
        assert!(ret.into_bundle().unwrap().logs.is_empty());
    }

    #[test]
    fn revert_yields_no_bundle() {
        let revert = Outcome::Revert { message: message(), output: Bytes::new() };
        assert_eq!(revert.message().id, B256::repeat_byte(1));
        assert_eq!(revert.kind(), "revert");
        assert!(revert.into_bundle().is_none());
    }

    #[test]
    fn json_decoder_roundtrip() {
        let outcome = Outcome::Stop { message: message(), logs: vec![log(), log()] };
        let raw = JsonOutcomeDecoder::encode(&outcome);
        assert_eq!(JsonOutcomeDecoder.decode(&raw).unwrap(), outcome);
    }

    #[test]
    fn json_decoder_rejects_garbage() {
        let d = JsonOutcomeDecoder;
        assert!(matches!(d.decode(&LogValue::default()), Err(DecodeError::Malformed(_))));
        assert!(matches!(d.decode(&LogValue::new(vec![0xff, 0x00])), Err(DecodeError::Json(_))));
        assert!(matches!(
            d.decode(&LogValue::new(br#"{"kind":"selfdestruct"}"#.to_vec())),
            Err(DecodeError::UnknownKind(k)) if k == "selfdestruct"
        ));
        assert!(matches!(
            d.decode(&LogValue::new(br#"{"message":{}}"#.to_vec())),
            Err(DecodeError::Malformed(_))
        ));
    }
}
