//! RouterOS API framing.
//!
//! A sentence is a list of length-prefixed words terminated by an empty
//! word. Lengths use a 1 to 5 byte prefix whose leading bits select the
//! width.

use crate::error::{AppError, Result};
use std::collections::BTreeMap;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Attribute map of one reply (`=key=value` words)
pub type Attributes = BTreeMap<String, String>;

/// Largest word accepted from the device
const MAX_WORD_LEN: usize = 16 * 1024 * 1024;

/// Encode a word length into its variable-width prefix
pub fn encode_length(len: usize, out: &mut Vec<u8>) {
    let len = len as u32;
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x4000 {
        out.extend_from_slice(&((len | 0x8000) as u16).to_be_bytes());
    } else if len < 0x20_0000 {
        let bytes = (len | 0xC0_0000).to_be_bytes();
        out.extend_from_slice(&bytes[1..]);
    } else if len < 0x1000_0000 {
        out.extend_from_slice(&(len | 0xE000_0000).to_be_bytes());
    } else {
        out.push(0xF0);
        out.extend_from_slice(&len.to_be_bytes());
    }
}

/// Decode a length prefix from the front of `bytes`.
///
/// Returns the length and the number of prefix bytes consumed, or `None`
/// when more bytes are needed.
pub fn decode_length(bytes: &[u8]) -> Result<Option<(usize, usize)>> {
    let Some(&first) = bytes.first() else {
        return Ok(None);
    };

    let extra = prefix_extra_bytes(first)?;
    if bytes.len() < 1 + extra {
        return Ok(None);
    }

    Ok(Some((assemble_length(first, &bytes[1..=extra]), 1 + extra)))
}

fn prefix_extra_bytes(first: u8) -> Result<usize> {
    match first {
        b if b & 0x80 == 0x00 => Ok(0),
        b if b & 0xC0 == 0x80 => Ok(1),
        b if b & 0xE0 == 0xC0 => Ok(2),
        b if b & 0xF0 == 0xE0 => Ok(3),
        0xF0 => Ok(4),
        b => Err(AppError::protocol(format!("Reserved length prefix byte 0x{:02X}", b))),
    }
}

fn assemble_length(first: u8, rest: &[u8]) -> usize {
    let head = match rest.len() {
        0 => u32::from(first),
        1 => u32::from(first & 0x3F),
        2 => u32::from(first & 0x1F),
        3 => u32::from(first & 0x0F),
        _ => 0,
    };
    rest.iter().fold(head, |acc, byte| (acc << 8) | u32::from(*byte)) as usize
}

/// Encode a complete sentence, including the terminating empty word
pub fn encode_sentence<W: AsRef<str>>(words: &[W]) -> Vec<u8> {
    let mut out = Vec::new();
    for word in words {
        let bytes = word.as_ref().as_bytes();
        encode_length(bytes.len(), &mut out);
        out.extend_from_slice(bytes);
    }
    out.push(0);
    out
}

/// Write one sentence in a single buffered write
pub async fn write_sentence<S, W>(stream: &mut S, words: &[W]) -> Result<()>
where
    S: AsyncWrite + Unpin,
    W: AsRef<str>,
{
    let encoded = encode_sentence(words);
    stream
        .write_all(&encoded)
        .await
        .map_err(|e| AppError::connection(format!("Failed to send command: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| AppError::connection(format!("Failed to flush command: {}", e)))
}

async fn read_word<S: AsyncRead + Unpin>(stream: &mut S) -> Result<String> {
    let first = stream.read_u8().await.map_err(read_error)?;
    let extra = prefix_extra_bytes(first)?;
    let mut rest = [0u8; 4];
    stream.read_exact(&mut rest[..extra]).await.map_err(read_error)?;
    let len = assemble_length(first, &rest[..extra]);

    if len > MAX_WORD_LEN {
        return Err(AppError::protocol(format!("Word of {} bytes exceeds limit", len)));
    }

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await.map_err(read_error)?;
    // Interface comments may carry non-UTF-8 bytes; the frame itself is still intact
    Ok(match String::from_utf8(buf) {
        Ok(word) => word,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

fn read_error(error: std::io::Error) -> AppError {
    AppError::connection(format!("Failed to read reply: {}", error))
}

/// Read words until the terminating empty word
pub async fn read_sentence<S: AsyncRead + Unpin>(stream: &mut S) -> Result<Vec<String>> {
    let mut words = Vec::new();
    loop {
        let word = read_word(stream).await?;
        if word.is_empty() {
            return Ok(words);
        }
        words.push(word);
    }
}

/// Reply type word of a sentence from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// `!re`, one data record
    Data,
    /// `!done`, the command finished
    Done,
    /// `!empty`, a print matched nothing (RouterOS 7.18+); `!done` follows
    Empty,
    /// `!trap`, the command failed
    Trap,
    /// `!fatal`, the device is closing the connection
    Fatal,
}

/// One parsed reply sentence
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub attributes: Attributes,
    pub tag: Option<String>,
    /// Words of a `!fatal` reply, which carry a bare message
    pub message: Option<String>,
}

impl Reply {
    pub fn parse(words: &[String]) -> Result<Self> {
        let (head, rest) = words
            .split_first()
            .ok_or_else(|| AppError::protocol("Empty reply sentence"))?;

        let kind = match head.as_str() {
            "!re" => ReplyKind::Data,
            "!done" => ReplyKind::Done,
            "!trap" => ReplyKind::Trap,
            "!fatal" => ReplyKind::Fatal,
            "!empty" => ReplyKind::Empty,
            other => return Err(AppError::parse(format!("Unknown reply type '{}'", other))),
        };

        let mut attributes = Attributes::new();
        let mut tag = None;
        let mut message = None;

        for word in rest {
            if let Some(pair) = word.strip_prefix('=') {
                // Values may contain '=' themselves; only the first one splits
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                attributes.insert(key.to_string(), value.to_string());
            } else if let Some(value) = word.strip_prefix(".tag=") {
                tag = Some(value.to_string());
            } else {
                message = Some(word.clone());
            }
        }

        Ok(Self {
            kind,
            attributes,
            tag,
            message,
        })
    }

    /// Error text of a `!trap` or `!fatal` reply
    pub fn error_message(&self) -> String {
        self.attributes
            .get("message")
            .cloned()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "unknown device error".to_string())
    }
}
