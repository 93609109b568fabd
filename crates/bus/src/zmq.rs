//! ZeroMQ-backed data bus adapters.
//!
//! The subscriber side pairs a SUB socket with an internal sample queue:
//! a pump task drains the socket as fast as messages arrive, and the
//! ingestion loop polls the queue non-blockingly via `has_data`/`pop`.
//! The publisher side is a plain PUB socket for command messages.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zeromq::prelude::*;
use zeromq::{PubSocket, SubSocket, ZmqMessage};

use edgerule_core::{CommandMessage, Sample};

use crate::error::BusError;
use crate::message::BusMessage;
use crate::traits::{BusPublisher, BusSubscriber};
use crate::transport::Transport;

/// ZeroMQ SUB socket subscriber buffering decoded samples internally.
pub struct ZmqBusSubscriber {
    transport: Transport,
    /// Socket held between `try_connect` and `subscribe`; the pump task
    /// takes ownership once subscribed.
    socket: Mutex<Option<SubSocket>>,
    connected: Arc<AtomicBool>,
    queue: Arc<StdMutex<VecDeque<Sample>>>,
}

impl ZmqBusSubscriber {
    /// Create a subscriber for the given endpoint. No connection is made
    /// until [`try_connect`](BusSubscriber::try_connect).
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            socket: Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
            queue: Arc::new(StdMutex::new(VecDeque::new())),
        }
    }

    /// Number of samples currently buffered.
    pub fn buffered(&self) -> usize {
        self.queue.lock().expect("sample queue lock poisoned").len()
    }
}

#[async_trait]
impl BusSubscriber for ZmqBusSubscriber {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn try_connect(&self) -> bool {
        if self.is_connected() {
            return true;
        }
        let endpoint = self.transport.endpoint();
        let mut socket = SubSocket::new();
        match socket.connect(&endpoint).await {
            Ok(()) => {
                info!(endpoint = %endpoint, "connected SUB socket to data bus");
                *self.socket.lock().await = Some(socket);
                true
            }
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "data bus connect failed");
                false
            }
        }
    }

    async fn subscribe(&self, topic: &str) -> Result<(), BusError> {
        let mut slot = self.socket.lock().await;
        let mut socket = slot.take().ok_or(BusError::NotConnected)?;
        socket.subscribe(topic).await?;
        info!(topic = %topic, "subscribed to data bus topic");

        self.connected.store(true, Ordering::SeqCst);

        // Pump task: owns the socket, drains it into the sample queue.
        let queue = Arc::clone(&self.queue);
        let connected = Arc::clone(&self.connected);
        tokio::spawn(async move {
            loop {
                match socket.recv().await {
                    Ok(zmq_msg) => match decode_sample(&zmq_msg) {
                        Ok(sample) => {
                            debug!(parameter = %sample.id, "buffered sample from bus");
                            queue
                                .lock()
                                .expect("sample queue lock poisoned")
                                .push_back(sample);
                        }
                        Err(e) => {
                            warn!(error = %e, "discarding undecodable bus message");
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "data bus receive failed, dropping connection");
                        connected.store(false, Ordering::SeqCst);
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    fn has_data(&self) -> bool {
        !self
            .queue
            .lock()
            .expect("sample queue lock poisoned")
            .is_empty()
    }

    fn pop(&self) -> Option<Sample> {
        self.queue
            .lock()
            .expect("sample queue lock poisoned")
            .pop_front()
    }
}

/// Extract a [`Sample`] from a one- or two-frame ZMQ message.
///
/// Publishers send [topic, envelope]; some intermediaries collapse that
/// to a single frame, so both shapes are accepted.
fn decode_sample(zmq_msg: &ZmqMessage) -> Result<Sample, BusError> {
    let frames: Vec<_> = zmq_msg.iter().collect();
    let envelope_bytes = if frames.len() >= 2 {
        frames[1].as_ref()
    } else if !frames.is_empty() {
        frames[0].as_ref()
    } else {
        return Err(BusError::Transport("empty ZMQ message".into()));
    };
    let envelope = BusMessage::from_bytes(envelope_bytes)?;
    Ok(envelope.decode::<Sample>()?)
}

/// ZeroMQ PUB socket publisher for command messages.
pub struct ZmqCommandPublisher {
    socket: Mutex<PubSocket>,
}

impl ZmqCommandPublisher {
    /// Connect to a broker frontend.
    pub async fn connect(transport: &Transport) -> Result<Self, BusError> {
        let mut socket = PubSocket::new();
        let endpoint = transport.endpoint();
        info!(endpoint = %endpoint, "connecting command PUB socket");
        socket.connect(&endpoint).await?;
        Ok(Self {
            socket: Mutex::new(socket),
        })
    }

    /// Bind directly (no broker): subscribers connect to this process.
    pub async fn bind(transport: &Transport) -> Result<Self, BusError> {
        transport.ensure_ipc_dir().map_err(|e| BusError::Transport(e.to_string()))?;
        let mut socket = PubSocket::new();
        let endpoint = transport.endpoint();
        info!(endpoint = %endpoint, "binding command PUB socket");
        socket.bind(&endpoint).await?;
        Ok(Self {
            socket: Mutex::new(socket),
        })
    }
}

#[async_trait]
impl BusPublisher for ZmqCommandPublisher {
    /// Publish a command as a two-frame ZMQ message: [topic, envelope].
    async fn publish_command(
        &self,
        command: &CommandMessage,
        topic: &str,
    ) -> Result<(), BusError> {
        let envelope = BusMessage::new(topic, command)?;
        let envelope_bytes = envelope.to_bytes()?;

        let mut zmq_msg = ZmqMessage::from(topic);
        zmq_msg.push_back(envelope_bytes.into());

        let mut socket = self.socket.lock().await;
        socket.send(zmq_msg).await?;

        debug!(topic = %topic, parameter = %command.parameter_id, "published command message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use edgerule_core::CommandAction;

    /// Publish one sample envelope the way a device-side adapter would.
    async fn publish_sample(socket: &mut PubSocket, topic: &str, sample: &Sample) {
        let envelope = BusMessage::new(topic, sample).unwrap();
        let mut msg = ZmqMessage::from(topic);
        msg.push_back(envelope.to_bytes().unwrap().into());
        socket.send(msg).await.unwrap();
    }

    #[tokio::test]
    async fn subscriber_buffers_published_samples() {
        let transport = Transport::tcp("127.0.0.1", 15730);

        let mut publisher = PubSocket::new();
        publisher.bind(&transport.endpoint()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let subscriber = ZmqBusSubscriber::new(transport);
        assert!(subscriber.try_connect().await);
        subscriber.subscribe("datamessage").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let sample = Sample::new("P1", "42", "m1");
        publish_sample(&mut publisher, "datamessage", &sample).await;

        // Poll until the pump task delivers it.
        let mut received = None;
        for _ in 0..50 {
            if let Some(s) = subscriber.pop() {
                received = Some(s);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(received.expect("sample never arrived"), sample);
        assert!(!subscriber.has_data());
    }

    #[tokio::test]
    async fn subscribe_without_connect_is_an_error() {
        let subscriber = ZmqBusSubscriber::new(Transport::tcp("127.0.0.1", 15731));
        let err = subscriber.subscribe("datamessage").await.unwrap_err();
        assert!(matches!(err, BusError::NotConnected));
    }

    #[tokio::test]
    async fn command_publisher_roundtrip() {
        let transport = Transport::tcp("127.0.0.1", 15732);

        let publisher = ZmqCommandPublisher::bind(&transport).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut sub = SubSocket::new();
        sub.connect(&transport.endpoint()).await.unwrap();
        sub.subscribe("commandmessage").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let command = CommandMessage::nok_for(&Sample::new("P9", "99", "m9"));
        publisher
            .publish_command(&command, "commandmessage")
            .await
            .unwrap();

        let zmq_msg = tokio::time::timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("timed out")
            .unwrap();
        let frames: Vec<_> = zmq_msg.iter().collect();
        let envelope = BusMessage::from_bytes(frames[1].as_ref()).unwrap();
        let decoded: CommandMessage = envelope.decode().unwrap();
        assert_eq!(decoded.command_action, CommandAction::Nok);
        assert_eq!(decoded.parameter_id, "P9");
    }
}
