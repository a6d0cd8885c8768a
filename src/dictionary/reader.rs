//! Dictionary file access: modification times and whitespace tokenization.

use std::collections::VecDeque;
use std::path::Path;
use std::time::UNIX_EPOCH;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Sentinel stored when a file's modification time is unavailable.
pub const UNKNOWN_MTIME: i64 = -1;

/// Modification time in milliseconds since the Unix epoch.
///
/// `Ok(None)` when the platform cannot report one; such files are rebuilt on
/// every update.
pub async fn modified_millis(path: &Path) -> std::io::Result<Option<i64>> {
    let metadata = tokio::fs::metadata(path).await?;
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .and_then(|elapsed| i64::try_from(elapsed.as_millis()).ok());
    Ok(mtime)
}

/// Byte order mark some editors put at the start of UTF-8 files.
const BOM: char = '\u{FEFF}';

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == BOM
}

/// Streams the whitespace-separated words of a file, line by line.
///
/// Invalid UTF-8 is replaced rather than rejected. A byte order mark is
/// treated as a separator so it never sticks to the first word.
pub struct WordStream {
    reader: BufReader<File>,
    line: Vec<u8>,
    queued: VecDeque<String>,
}

impl WordStream {
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self {
            reader: BufReader::new(file),
            line: Vec::new(),
            queued: VecDeque::new(),
        })
    }

    /// Next non-empty token, or `None` at end of file.
    pub async fn next_word(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(word) = self.queued.pop_front() {
                return Ok(Some(word));
            }

            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line).await? == 0 {
                return Ok(None);
            }
            let text = String::from_utf8_lossy(&self.line);
            self.queued.extend(
                text.split(is_separator)
                    .filter(|word| !word.is_empty())
                    .map(str::to_string),
            );
        }
    }
}
