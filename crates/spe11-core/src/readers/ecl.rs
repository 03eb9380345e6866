//! Reader for the simulator's unformatted binary output (EGRID, INIT, UNRST,
//! SMSPEC, UNSMRY).
//!
//! Files are sequences of big-endian Fortran records. Every keyword is a
//! 16-byte header record (8-char name, item count, 4-char type) followed by
//! as many data records as needed to hold the items, at most
//! [`NUMERIC_BLOCK`] numbers or [`STRING_BLOCK`] strings per record.

use crate::domain::ReductionError;
use std::fs;
use std::path::{Path, PathBuf};

pub const NUMERIC_BLOCK: usize = 1000;
pub const STRING_BLOCK: usize = 105;
const HEADER_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum EclError {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("truncated record at byte {offset}")]
    Truncated { offset: usize },
    #[error("record markers disagree at byte {offset} ({head} != {tail})")]
    MarkerMismatch { offset: usize, head: i32, tail: i32 },
    #[error("keyword header at byte {offset} is {len} bytes, expected 16")]
    BadHeader { offset: usize, len: usize },
    #[error("keyword '{keyword}' has unsupported data type '{kind}'")]
    UnsupportedType { keyword: String, kind: String },
    #[error("keyword '{keyword}' has a data record of {len} bytes, not a multiple of {item}")]
    RaggedRecord {
        keyword: String,
        len: usize,
        item: usize,
    },
    #[error("keyword '{keyword}' declares {declared} items but its records hold {found}")]
    CountMismatch {
        keyword: String,
        declared: usize,
        found: usize,
    },
}

impl EclError {
    pub const fn placeholder(&self) -> &'static str {
        match self {
            Self::Read { .. } => "IO.ECL_READ",
            Self::Write { .. } => "IO.ECL_WRITE",
            Self::Truncated { .. } => "IO.ECL_TRUNCATED",
            Self::MarkerMismatch { .. } => "IO.ECL_MARKER",
            Self::BadHeader { .. } => "IO.ECL_HEADER",
            Self::UnsupportedType { .. } => "IO.ECL_TYPE",
            Self::RaggedRecord { .. } | Self::CountMismatch { .. } => "IO.ECL_RECORD",
        }
    }
}

impl From<EclError> for ReductionError {
    fn from(error: EclError) -> Self {
        ReductionError::io_system(error.placeholder(), error.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemType {
    Int,
    Real,
    Double,
    Logical,
    Char(usize),
    Message,
}

impl ItemType {
    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "INTE" => Some(Self::Int),
            "REAL" => Some(Self::Real),
            "DOUB" => Some(Self::Double),
            "LOGI" => Some(Self::Logical),
            "CHAR" => Some(Self::Char(8)),
            "MESS" => Some(Self::Message),
            _ => kind
                .strip_prefix("C0")
                .and_then(|width| width.parse::<usize>().ok())
                .filter(|width| *width > 0)
                .map(Self::Char),
        }
    }

    const fn item_len(self) -> usize {
        match self {
            Self::Int | Self::Real | Self::Logical => 4,
            Self::Double => 8,
            Self::Char(width) => width,
            Self::Message => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EclData {
    Int(Vec<i32>),
    Real(Vec<f32>),
    Double(Vec<f64>),
    Logical(Vec<bool>),
    Char(Vec<String>),
    Message,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EclKeyword {
    pub name: String,
    pub data: EclData,
}

impl EclKeyword {
    pub fn new(name: impl Into<String>, data: EclData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn ints(name: impl Into<String>, values: Vec<i32>) -> Self {
        Self::new(name, EclData::Int(values))
    }

    pub fn reals(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self::new(name, EclData::Real(values))
    }

    pub fn doubles(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, EclData::Double(values))
    }

    pub fn strings(name: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(name, EclData::Char(values))
    }

    pub fn len(&self) -> usize {
        match &self.data {
            EclData::Int(values) => values.len(),
            EclData::Real(values) => values.len(),
            EclData::Double(values) => values.len(),
            EclData::Logical(values) => values.len(),
            EclData::Char(values) => values.len(),
            EclData::Message => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric payload widened to `f64`; `None` for text and logical data.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match &self.data {
            EclData::Int(values) => Some(values.iter().map(|value| f64::from(*value)).collect()),
            EclData::Real(values) => Some(values.iter().map(|value| f64::from(*value)).collect()),
            EclData::Double(values) => Some(values.clone()),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i32]> {
        match &self.data {
            EclData::Int(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match &self.data {
            EclData::Char(values) => Some(values),
            _ => None,
        }
    }
}

/// All keywords of one file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EclFile {
    keywords: Vec<EclKeyword>,
}

impl EclFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EclError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| EclError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EclError> {
        let mut cursor = RecordCursor { bytes, offset: 0 };
        let mut keywords = Vec::new();
        while !cursor.at_end() {
            keywords.push(cursor.read_keyword()?);
        }
        Ok(Self { keywords })
    }

    pub fn from_keywords(keywords: Vec<EclKeyword>) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &[EclKeyword] {
        &self.keywords
    }

    /// Encodes the keywords back into the unformatted binary layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for keyword in &self.keywords {
            encode_keyword(keyword, &mut bytes);
        }
        bytes
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), EclError> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes()).map_err(|source| EclError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn find(&self, name: &str) -> Option<&EclKeyword> {
        self.keywords.iter().find(|keyword| keyword.name == name)
    }

    /// Splits the keyword stream into blocks that each start at `marker`.
    /// Keywords before the first marker are dropped.
    pub fn into_blocks(self, marker: &str) -> Vec<Vec<EclKeyword>> {
        let mut blocks: Vec<Vec<EclKeyword>> = Vec::new();
        for keyword in self.keywords {
            if keyword.name == marker {
                blocks.push(vec![keyword]);
            } else if let Some(current) = blocks.last_mut() {
                current.push(keyword);
            }
        }
        blocks
    }
}

struct RecordCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> RecordCursor<'a> {
    fn at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn read_marker(&self, at: usize) -> Result<i32, EclError> {
        let raw = self
            .bytes
            .get(at..at + 4)
            .ok_or(EclError::Truncated { offset: at })?;
        Ok(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_record(&mut self) -> Result<&'a [u8], EclError> {
        let start = self.offset;
        let head = self.read_marker(start)?;
        let len = usize::try_from(head).map_err(|_| EclError::Truncated { offset: start })?;
        let payload_start = start + 4;
        let payload = self
            .bytes
            .get(payload_start..payload_start + len)
            .ok_or(EclError::Truncated { offset: start })?;
        let tail = self.read_marker(payload_start + len)?;
        if tail != head {
            return Err(EclError::MarkerMismatch {
                offset: start,
                head,
                tail,
            });
        }
        self.offset = payload_start + len + 4;
        Ok(payload)
    }

    fn read_keyword(&mut self) -> Result<EclKeyword, EclError> {
        let offset = self.offset;
        let header = self.read_record()?;
        if header.len() != HEADER_LEN {
            return Err(EclError::BadHeader {
                offset,
                len: header.len(),
            });
        }

        let name = String::from_utf8_lossy(&header[0..8]).trim().to_string();
        let count = i32::from_be_bytes([header[8], header[9], header[10], header[11]]);
        let count = usize::try_from(count).unwrap_or(0);
        let kind = String::from_utf8_lossy(&header[12..16]).to_string();
        let item_type = ItemType::parse(&kind).ok_or_else(|| EclError::UnsupportedType {
            keyword: name.clone(),
            kind: kind.clone(),
        })?;

        if item_type == ItemType::Message {
            return Ok(EclKeyword {
                name,
                data: EclData::Message,
            });
        }

        let item_len = item_type.item_len();
        // The declared count is untrusted until the records are read.
        let remaining = self.bytes.len().saturating_sub(self.offset);
        let mut raw = Vec::with_capacity(count.saturating_mul(item_len).min(remaining));
        let mut found = 0;
        while found < count {
            let record = self.read_record()?;
            if record.len() % item_len != 0 {
                return Err(EclError::RaggedRecord {
                    keyword: name,
                    len: record.len(),
                    item: item_len,
                });
            }
            found += record.len() / item_len;
            raw.extend_from_slice(record);
        }
        if found != count {
            return Err(EclError::CountMismatch {
                keyword: name,
                declared: count,
                found,
            });
        }

        Ok(EclKeyword {
            data: decode_items(item_type, &raw),
            name,
        })
    }
}

fn push_record(payload: &[u8], bytes: &mut Vec<u8>) {
    let marker = (payload.len() as i32).to_be_bytes();
    bytes.extend_from_slice(&marker);
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(&marker);
}

fn push_blocks<T>(
    items: &[T],
    block: usize,
    encode: impl Fn(&T, &mut Vec<u8>),
    bytes: &mut Vec<u8>,
) {
    for chunk in items.chunks(block) {
        let mut payload = Vec::new();
        for item in chunk {
            encode(item, &mut payload);
        }
        push_record(&payload, bytes);
    }
}

fn encode_keyword(keyword: &EclKeyword, bytes: &mut Vec<u8>) {
    let kind = match &keyword.data {
        EclData::Int(_) => "INTE",
        EclData::Real(_) => "REAL",
        EclData::Double(_) => "DOUB",
        EclData::Logical(_) => "LOGI",
        EclData::Char(_) => "CHAR",
        EclData::Message => "MESS",
    };
    let mut header = format!("{:<8.8}", keyword.name).into_bytes();
    header.extend_from_slice(&(keyword.len() as i32).to_be_bytes());
    header.extend_from_slice(kind.as_bytes());
    push_record(&header, bytes);

    match &keyword.data {
        EclData::Int(values) => push_blocks(
            values,
            NUMERIC_BLOCK,
            |value, out| out.extend_from_slice(&value.to_be_bytes()),
            bytes,
        ),
        EclData::Real(values) => push_blocks(
            values,
            NUMERIC_BLOCK,
            |value, out| out.extend_from_slice(&value.to_be_bytes()),
            bytes,
        ),
        EclData::Double(values) => push_blocks(
            values,
            NUMERIC_BLOCK,
            |value, out| out.extend_from_slice(&value.to_be_bytes()),
            bytes,
        ),
        EclData::Logical(values) => push_blocks(
            values,
            NUMERIC_BLOCK,
            |value, out| out.extend_from_slice(&(if *value { -1_i32 } else { 0 }).to_be_bytes()),
            bytes,
        ),
        EclData::Char(values) => push_blocks(
            values,
            STRING_BLOCK,
            |value, out| out.extend_from_slice(format!("{value:<8.8}").as_bytes()),
            bytes,
        ),
        EclData::Message => {}
    }
}

fn decode_items(item_type: ItemType, raw: &[u8]) -> EclData {
    match item_type {
        ItemType::Int => EclData::Int(
            raw.chunks_exact(4)
                .map(|chunk| i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect(),
        ),
        ItemType::Real => EclData::Real(
            raw.chunks_exact(4)
                .map(|chunk| f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect(),
        ),
        ItemType::Double => EclData::Double(
            raw.chunks_exact(8)
                .map(|chunk| {
                    f64::from_be_bytes([
                        chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6],
                        chunk[7],
                    ])
                })
                .collect(),
        ),
        ItemType::Logical => EclData::Logical(
            raw.chunks_exact(4)
                .map(|chunk| i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) != 0)
                .collect(),
        ),
        ItemType::Char(width) => EclData::Char(
            raw.chunks_exact(width)
                .map(|chunk| String::from_utf8_lossy(chunk).trim().to_string())
                .collect(),
        ),
        ItemType::Message => EclData::Message,
    }
}
