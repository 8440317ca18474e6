//! Append-only message log
//!
//! One JSON envelope per line. Writers are serialised; readers tolerate
//! malformed lines by skipping them.

use crate::groundstation::error::GroundStationResult;
use crate::message::Message;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct MessageLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl MessageLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Append one message as a JSON line, creating the file if needed
    pub async fn append(&self, message: &Message) -> GroundStationResult<()> {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    /// Read every well-formed message; a missing file is an empty log
    pub async fn load_all(&self) -> GroundStationResult<Vec<Message>> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let messages = data
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Message>(line) {
                Ok(message) => Some(message),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed log line");
                    None
                }
            })
            .collect();

        Ok(messages)
    }
}
