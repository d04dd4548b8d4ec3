//! Per-job log channel
//!
//! Each job owns one FIFO of [`LogLine`]s. The job's worker is the only
//! producer; status callers and the C boundary drain it concurrently. Lines
//! survive the job reaching a terminal state so they can be drained later.
//!
//! Line grammar, one record per line:
//!
//! ```text
//! <code>: START <root>
//! <code>: <path> <algo>:<DIGEST>
//! <code>: DONE <algo>:<DIGEST> files=<n> bytes=<b>
//! <code>: FAILED <message>
//! <code>: STOPPED files=<n>
//! ```
//!
//! Per-file lines carry no keyword so the path is always the second
//! whitespace-separated token, which is what line-splitting clients read.

use crate::hashing::{Digest, HashAlgorithm, HashAlgorithmExt};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Structured content of one log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// The worker started walking `root`
    Start { root: String },
    /// Per-file result
    File {
        algorithm: HashAlgorithm,
        digest: Digest,
        path: String,
    },
    /// Closing line of a Completed job
    Done {
        algorithm: HashAlgorithm,
        digest: Digest,
        files: usize,
        bytes: u64,
    },
    /// Closing line of a Failed job
    Failed { message: String },
    /// Closing line of a Stopped job
    Stopped { files: usize },
}

impl LogRecord {
    /// Parse a full line (including the leading job code)
    pub fn parse(line: &str) -> Option<(usize, LogRecord)> {
        let (code, rest) = line.split_once(": ")?;
        let code: usize = code.parse().ok()?;

        // A trailing `<algo>:<DIGEST>` token marks a per-file line
        if let Some((path, digest)) = rest.rsplit_once(' ')
            && let Some((algorithm, digest)) = parse_digest(digest)
        {
            return Some((
                code,
                LogRecord::File {
                    algorithm,
                    digest,
                    path: path.to_string(),
                },
            ));
        }

        let (kind, body) = rest.split_once(' ').unwrap_or((rest, ""));
        let record = match kind {
            "START" => LogRecord::Start {
                root: body.to_string(),
            },
            "DONE" => {
                let mut parts = body.split(' ');
                let (algorithm, digest) = parse_digest(parts.next()?)?;
                let files = parts.next()?.strip_prefix("files=")?.parse().ok()?;
                let bytes = parts.next()?.strip_prefix("bytes=")?.parse().ok()?;
                LogRecord::Done {
                    algorithm,
                    digest,
                    files,
                    bytes,
                }
            }
            "FAILED" => LogRecord::Failed {
                message: body.to_string(),
            },
            "STOPPED" => LogRecord::Stopped {
                files: body.strip_prefix("files=")?.parse().ok()?,
            },
            _ => return None,
        };

        Some((code, record))
    }
}

/// Parse `<algo>:<DIGEST>`; the digest must have the algorithm's length
fn parse_digest(field: &str) -> Option<(HashAlgorithm, Digest)> {
    let (algorithm, hex) = field.split_once(':')?;
    let algorithm: HashAlgorithm = algorithm.parse().ok()?;
    let digest = Digest::from_hex(hex)?;
    (digest.as_bytes().len() == algorithm.to_impl().digest_len()).then_some((algorithm, digest))
}

/// Keep every record on a single line that C can hold as a string
fn single_line(text: &str) -> String {
    text.replace(['\n', '\r', '\0'], " ")
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogRecord::Start { root } => write!(f, "START {}", single_line(root)),
            LogRecord::File {
                algorithm,
                digest,
                path,
            } => write!(f, "{} {algorithm}:{digest}", single_line(path)),
            LogRecord::Done {
                algorithm,
                digest,
                files,
                bytes,
            } => write!(f, "DONE {algorithm}:{digest} files={files} bytes={bytes}"),
            LogRecord::Failed { message } => write!(f, "FAILED {}", single_line(message)),
            LogRecord::Stopped { files } => write!(f, "STOPPED files={files}"),
        }
    }
}

/// One dequeued log line
///
/// Deliberately not `Clone`: once handed out, the caller is the only owner.
#[derive(Debug, PartialEq, Eq)]
pub struct LogLine {
    code: usize,
    sequence: u64,
    stamp: u64,
    text: String,
}

impl LogLine {
    /// Code of the job that produced this line
    pub fn code(&self) -> usize {
        self.code
    }

    /// Position within the job's log, starting at 1
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Engine-wide production stamp, used to order lines across jobs
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Parse the line back into its record
    pub fn record(&self) -> Option<LogRecord> {
        LogRecord::parse(&self.text).map(|(_, record)| record)
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

struct ChannelState {
    queue: VecDeque<LogLine>,
    next_sequence: u64,
}

/// FIFO of log lines for a single job
pub struct LogChannel {
    code: usize,
    stamps: Arc<AtomicU64>,
    state: Mutex<ChannelState>,
}

impl LogChannel {
    /// Create a channel for `code`; `stamps` is shared by every job of an engine
    pub fn new(code: usize, stamps: Arc<AtomicU64>) -> Self {
        Self {
            code,
            stamps,
            state: Mutex::new(ChannelState {
                queue: VecDeque::new(),
                next_sequence: 1,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a record; returns its sequence number
    pub fn push(&self, record: &LogRecord) -> u64 {
        let text = format!("{}: {record}", self.code);
        let mut state = self.lock();
        // Stamps are taken under the queue lock so per-job order matches stamp order
        let stamp = self.stamps.fetch_add(1, Ordering::SeqCst);
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.queue.push_back(LogLine {
            code: self.code,
            sequence,
            stamp,
            text,
        });
        sequence
    }

    /// Remove and return the oldest queued line
    pub fn pop(&self) -> Option<LogLine> {
        self.lock().queue.pop_front()
    }

    /// Stamp of the oldest queued line, if any
    pub fn front_stamp(&self) -> Option<u64> {
        self.lock().queue.front().map(LogLine::stamp)
    }

    /// Number of queued lines
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of lines ever produced on this channel
    pub fn produced(&self) -> u64 {
        self.lock().next_sequence - 1
    }
}

impl fmt::Debug for LogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogChannel")
            .field("code", &self.code)
            .field("queued", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashCalculator;
    use std::thread;

    fn digest(data: &[u8]) -> Digest {
        HashCalculator::default().calculate_bytes(data).digest
    }

    #[test]
    fn test_fifo_order_and_sequences() {
        let channel = LogChannel::new(7, Arc::new(AtomicU64::new(1)));
        channel.push(&LogRecord::Start { root: "/r".into() });
        channel.push(&LogRecord::Stopped { files: 0 });

        let first = channel.pop().unwrap();
        let second = channel.pop().unwrap();
        assert_eq!(first.sequence(), 1);
        assert_eq!(second.sequence(), 2);
        assert!(first.stamp() < second.stamp());
        assert_eq!(first.text(), "7: START /r");
        assert_eq!(second.text(), "7: STOPPED files=0");
        assert!(channel.pop().is_none());
        assert_eq!(channel.produced(), 2);
    }

    #[test]
    fn test_record_grammar_roundtrip() {
        let records = vec![
            LogRecord::Start {
                root: "/data/my photos".into(),
            },
            LogRecord::File {
                algorithm: HashAlgorithm::MD5,
                digest: digest(b"x"),
                path: "/data/my photos/a b.txt".into(),
            },
            LogRecord::Done {
                algorithm: HashAlgorithm::SHA1,
                digest: HashCalculator::new(HashAlgorithm::SHA1)
                    .calculate_bytes(b"agg")
                    .digest,
                files: 2,
                bytes: 10,
            },
            LogRecord::Failed {
                message: "Permission denied for: /data/locked".into(),
            },
            LogRecord::Stopped { files: 3 },
        ];

        for record in records {
            let line = format!("12: {record}");
            let (code, parsed) = LogRecord::parse(&line).unwrap();
            assert_eq!(code, 12);
            assert_eq!(parsed, record, "line {line}");
        }
    }

    #[test]
    fn test_file_line_layout() {
        let record = LogRecord::File {
            algorithm: HashAlgorithm::MD5,
            digest: digest(b"x"),
            path: "/tmp/a.txt".into(),
        };
        let line = format!("4: {record}");
        assert_eq!(line, "4: /tmp/a.txt md5:9DD4E461268C8034F5C8564E155C67A6");
        assert_eq!(line.split_whitespace().nth(1), Some("/tmp/a.txt"));
    }

    #[test]
    fn test_file_line_path_may_look_like_a_keyword() {
        let record = LogRecord::File {
            algorithm: HashAlgorithm::MD5,
            digest: digest(b"x"),
            path: "START here/DONE.txt".into(),
        };
        let (_, parsed) = LogRecord::parse(&format!("2: {record}")).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_multiline_text_is_flattened() {
        let record = LogRecord::Failed {
            message: "first\nsecond".into(),
        };
        assert_eq!(record.to_string(), "FAILED first second");
    }

    #[test]
    fn test_interior_nul_is_replaced() {
        let channel = LogChannel::new(5, Arc::new(AtomicU64::new(1)));
        channel.push(&LogRecord::Failed {
            message: "bad\0name".into(),
        });
        let line = channel.pop().unwrap();
        assert_eq!(line.text(), "5: FAILED bad name");
        assert!(std::ffi::CString::new(line.into_text()).is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(LogRecord::parse("").is_none());
        assert!(LogRecord::parse("abc: START /").is_none());
        assert!(LogRecord::parse("1: UNKNOWN x").is_none());
        assert!(LogRecord::parse("1: /tmp/a.txt nodigest").is_none());
        assert!(LogRecord::parse("1: /tmp/a.txt md5:XYZ").is_none());
        // Right shape, wrong digest length for the algorithm
        assert!(LogRecord::parse("1: /tmp/a.txt sha1:9DD4E461268C8034F5C8564E155C67A6").is_none());
        assert!(LogRecord::parse("1: STOPPED files=x").is_none());
    }

    #[test]
    fn test_concurrent_push_and_drain_loses_nothing() {
        let channel = Arc::new(LogChannel::new(1, Arc::new(AtomicU64::new(1))));
        let producer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                for files in 0..1000 {
                    channel.push(&LogRecord::Stopped { files });
                }
            })
        };

        let mut drained = Vec::new();
        while drained.len() < 1000 {
            match channel.pop() {
                Some(line) => drained.push(line.sequence()),
                None => thread::yield_now(),
            }
        }
        producer.join().unwrap();

        assert_eq!(drained, (1..=1000).collect::<Vec<u64>>());
        assert!(channel.is_empty());
    }
}
