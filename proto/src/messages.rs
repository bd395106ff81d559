use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requests served by the namenode. The `action` field on the wire selects
/// the variant; arms are exhaustive on the server side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NamenodeRequest {
    RegisterDatanode {
        node_id: String,
        host: String,
        port: u16,
        total_space: u64,
    },
    Heartbeat {
        node_id: String,
        available_space: u64,
        total_space: u64,
        chunks: Vec<String>,
    },
    UploadInit {
        filename: String,
        filesize: u64,
    },
    UploadComplete {
        filename: String,
        filesize: u64,
        chunks: Vec<ChunkCommit>,
    },
    DownloadInit {
        filename: String,
    },
    ListFiles,
    FileInfo {
        filename: String,
    },
    DeleteFile {
        filename: String,
    },
    ClusterStatus,
}

/// Requests served by a datanode. Chunk bytes travel base64 encoded in the
/// `data` field so the envelope stays textual.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DatanodeRequest {
    StoreChunk { chunk_id: String, data: String },
    RetrieveChunk { chunk_id: String },
    DeleteChunk { chunk_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatanodeMeta {
    pub node_id: String,
    pub host: String,
    pub port: u16,
}
impl DatanodeMeta {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One chunk of an upload or download plan: where the replicas live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub chunk_id: String,
    pub chunk_index: u64,
    pub datanodes: Vec<DatanodeMeta>,
}

/// Reported by the client at upload_complete: the datanodes that actually
/// acknowledged the chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkCommit {
    pub chunk_id: String,
    pub chunk_index: u64,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPlan {
    pub chunk_size: u64,
    pub replication_factor: u32,
    pub plan: Vec<PlanEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadPlan {
    pub filesize: u64,
    pub chunk_size: u64,
    pub chunks: Vec<PlanEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub filename: String,
    pub filesize: u64,
    pub chunk_count: u64,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileList {
    pub files: Vec<FileSummary>,
}

/// Per-chunk detail in file_info: the recorded replica set plus the subset
/// of it that is currently alive, with addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub chunk_id: String,
    pub chunk_index: u64,
    pub locations: Vec<String>,
    pub datanodes: Vec<DatanodeMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDetails {
    pub filename: String,
    pub filesize: u64,
    pub chunk_size: u64,
    pub replication_factor: u32,
    pub created_at: u64,
    pub chunks: Vec<ChunkInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatanodeStatus {
    pub node_id: String,
    pub host: String,
    pub port: u16,
    pub alive: bool,
    pub chunk_count: u64,
    pub available_space: u64,
    pub total_space: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub total_files: u64,
    pub total_bytes: u64,
    pub datanodes: Vec<DatanodeStatus>,
}

/// Datanode ack for store_chunk, carrying the recorded digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub chunk_id: String,
    pub size: u64,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkData {
    pub chunk_id: String,
    pub data: String,
}

/// Plain `{"status":"ok"}` ack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    NotFound,
    InsufficientCapacity,
    Integrity,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InsufficientCapacity => "insufficient_capacity",
            ErrorKind::Integrity => "integrity",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// An error reported by the remote side of a call, or synthesized locally
/// for transport failures. Implements `Error` so it can propagate through
/// the workspace result alias and still be downcast where the kind matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }
    pub fn insufficient_capacity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientCapacity, message)
    }
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
impl std::error::Error for RemoteError {}

/// The response envelope: `{"status":"ok", ...}` or
/// `{"status":"error", "kind": ..., "message": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply<T> {
    Ok(T),
    Error(RemoteError),
}

impl<T> Reply<T> {
    pub fn ok(payload: T) -> Self {
        Reply::Ok(payload)
    }
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Reply::Error(RemoteError::new(kind, message))
    }
    pub fn into_result(self) -> Result<T, RemoteError> {
        match self {
            Reply::Ok(v) => Ok(v),
            Reply::Error(e) => Err(e),
        }
    }
}

pub fn encode_chunk(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub fn decode_chunk(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(data)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn request_envelope_carries_action_tag() {
        let request = NamenodeRequest::UploadInit {
            filename: "notes.txt".to_owned(),
            filesize: 42,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""action":"upload_init""#));
        let parsed: NamenodeRequest = serde_json::from_str(&json).unwrap();
        match parsed {
            NamenodeRequest::UploadInit { filename, filesize } => {
                assert_eq!(filename, "notes.txt");
                assert_eq!(filesize, 42);
            }
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn reply_envelope_is_status_tagged() {
        let ok: Reply<Ack> = Reply::ok(Ack {});
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"status":"ok"}"#);

        let err: Reply<Ack> = Reply::error(ErrorKind::InsufficientCapacity, "need 3, found 2");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains(r#""status":"error""#));
        assert!(json.contains(r#""kind":"insufficient_capacity""#));
        let parsed: Reply<Ack> = serde_json::from_str(&json).unwrap();
        let remote = parsed.into_result().unwrap_err();
        assert_eq!(remote.kind, ErrorKind::InsufficientCapacity);
    }

    #[test]
    fn chunk_payload_round_trips_through_base64() {
        let bytes = [0u8, 1, 2, 250, 255];
        let encoded = encode_chunk(&bytes);
        assert_eq!(decode_chunk(&encoded).unwrap(), bytes);
    }
}
