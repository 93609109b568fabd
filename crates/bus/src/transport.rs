use std::path::PathBuf;

/// Where a ZeroMQ socket lives.
///
/// The engine talks TCP to the bus broker by default; single-box
/// deployments can point both sides at a Unix-domain IPC endpoint
/// instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Unix domain socket named under `/tmp/edgerule/`.
    Ipc(String),

    /// TCP endpoint for an off-box broker.
    Tcp { host: String, port: u16 },
}

impl Transport {
    pub fn ipc(name: &str) -> Self {
        Self::Ipc(name.to_string())
    }

    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// The ZeroMQ endpoint address string.
    pub fn endpoint(&self) -> String {
        match self {
            Self::Ipc(_) => format!(
                "ipc://{}",
                self.socket_path().unwrap_or_default().display()
            ),
            Self::Tcp { host, port } => format!("tcp://{host}:{port}"),
        }
    }

    /// Filesystem path of the socket file; `None` for TCP.
    fn socket_path(&self) -> Option<PathBuf> {
        match self {
            Self::Ipc(name) => Some(PathBuf::from(format!("/tmp/edgerule/{name}.sock"))),
            Self::Tcp { .. } => None,
        }
    }

    /// Create the socket directory before an IPC bind. ZeroMQ will not
    /// bind an IPC endpoint whose directory is missing. No-op for TCP.
    pub fn ensure_ipc_dir(&self) -> std::io::Result<()> {
        if let Some(parent) = self.socket_path().as_deref().and_then(|p| p.parent()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}
