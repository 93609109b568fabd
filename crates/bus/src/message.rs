use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire-format envelope for everything crossing the data bus.
///
/// Envelopes are serialized with MessagePack. The `topic` field drives
/// PUB/SUB routing; `correlation_id` ties a command back to the sample
/// that triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    /// Routing topic (e.g. "datamessage", "commandmessage").
    pub topic: String,

    /// MessagePack-encoded payload bytes.
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,

    /// When this envelope was created.
    pub timestamp: DateTime<Utc>,

    /// Correlation ID for tracing a reading through to its command.
    pub correlation_id: Uuid,
}

impl BusMessage {
    /// Create a new envelope, serializing the payload with MessagePack.
    pub fn new<T: Serialize>(
        topic: impl Into<String>,
        payload: &T,
    ) -> Result<Self, rmp_serde::encode::Error> {
        Ok(Self {
            topic: topic.into(),
            payload: rmp_serde::to_vec(payload)?,
            timestamp: Utc::now(),
            correlation_id: Uuid::new_v4(),
        })
    }

    /// Deserialize the payload into the expected type.
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T, rmp_serde::decode::Error> {
        rmp_serde::from_slice(&self.payload)
    }

    /// Serialize this entire envelope to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec(self)
    }

    /// Deserialize an envelope from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}

/// Helper module for serde to handle `Vec<u8>` as raw bytes in MessagePack.
mod serde_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let bytes: &[u8] = Deserialize::deserialize(d)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgerule_core::Sample;

    #[test]
    fn sample_roundtrip() {
        let sample = Sample::new("P1", "42", "m1");
        let msg = BusMessage::new("datamessage", &sample).unwrap();

        assert_eq!(msg.topic, "datamessage");
        assert_eq!(msg.decode::<Sample>().unwrap(), sample);
    }

    #[test]
    fn envelope_bytes_roundtrip() {
        let sample = Sample::new("P2", "7.5", "m2");
        let msg = BusMessage::new("datamessage", &sample).unwrap();
        let bytes = msg.to_bytes().unwrap();
        let decoded = BusMessage::from_bytes(&bytes).unwrap();

        assert_eq!(decoded.topic, "datamessage");
        assert_eq!(decoded.correlation_id, msg.correlation_id);
        assert_eq!(decoded.decode::<Sample>().unwrap(), sample);
    }
}
