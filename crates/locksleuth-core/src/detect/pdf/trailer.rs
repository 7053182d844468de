//! Locates the document trailer and the `/Encrypt` dictionary it points at.
//!
//! Only the end of the file and the one object holding the encryption
//! dictionary are read. The cross-reference data itself is not parsed: an
//! indirect `/Encrypt` is found by its `N G obj` header, keeping the last
//! definition as an incremental update would.

use super::security::Encryption;
use super::syntax::{rfind, Dict, Object, Parser, SyntaxError};
use std::io::{self, Read, Seek, SeekFrom};
use thiserror::Error;

/// Bytes at the start of the file searched for `%PDF-`.
const HEADER_WINDOW: u64 = 1024;
/// Bytes at the end of the file searched for `startxref` and `trailer`.
const TAIL_WINDOW: u64 = 64 * 1024;
/// Bytes read from the start of one object.
const OBJECT_WINDOW: u64 = 64 * 1024;
/// Chunk size for the object header search.
const SEARCH_CHUNK: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed PDF: {0}")]
    Syntax(String),
}

impl From<SyntaxError> for PdfError {
    fn from(e: SyntaxError) -> Self {
        Self::Syntax(e.to_string())
    }
}

fn malformed(message: &str) -> PdfError {
    PdfError::Syntax(message.to_owned())
}

/// The document's encryption parameters, or `None` for a document without
/// an `/Encrypt` entry.
pub fn read_encryption<R: Read + Seek>(reader: &mut R) -> Result<Option<Encryption>, PdfError> {
    let len = reader.seek(SeekFrom::End(0))?;

    let header = read_at(reader, 0, HEADER_WINDOW)?;
    if rfind(&header, b"%PDF-").is_none() {
        return Err(malformed("no %PDF- header"));
    }

    let tail_start = len.saturating_sub(TAIL_WINDOW);
    let tail = read_at(reader, tail_start, TAIL_WINDOW)?;
    let trailer = find_trailer(reader, &tail, len)?;

    let encrypt = match trailer.get("Encrypt") {
        None | Some(Object::Null) => return Ok(None),
        Some(Object::Dict(d)) => d.clone(),
        Some(Object::Ref(num, generation)) => load_dict(reader, *num, *generation, len)?,
        Some(_) => return Err(malformed("/Encrypt is neither a dictionary nor a reference")),
    };

    let id = trailer
        .get("ID")
        .and_then(Object::as_array)
        .and_then(|ids| ids.first())
        .and_then(Object::as_bytes)
        .map(<[u8]>::to_vec)
        .unwrap_or_default();

    Ok(Some(Encryption::from_dict(&encrypt, id)))
}

/// The newest trailer: the cross-reference stream `startxref` points at, or
/// failing that the dictionary after the last `trailer` keyword.
fn find_trailer<R: Read + Seek>(reader: &mut R, tail: &[u8], len: u64) -> Result<Dict, PdfError> {
    if let Some(dict) = xref_stream_dict(reader, tail, len)? {
        return Ok(dict);
    }

    let at = rfind(tail, b"trailer").ok_or_else(|| malformed("no trailer"))?;
    let mut parser = Parser::at(tail, at + b"trailer".len());
    parser
        .parse_object()?
        .as_dict()
        .cloned()
        .ok_or_else(|| malformed("trailer is not a dictionary"))
}

fn xref_stream_dict<R: Read + Seek>(
    reader: &mut R,
    tail: &[u8],
    len: u64,
) -> Result<Option<Dict>, PdfError> {
    let Some(at) = rfind(tail, b"startxref") else {
        return Ok(None);
    };
    let mut parser = Parser::at(tail, at + b"startxref".len());
    let Some(offset) = parser
        .parse_object()
        .ok()
        .and_then(|o| o.as_int())
        .and_then(|n| u64::try_from(n).ok())
        .filter(|&n| n < len)
    else {
        return Ok(None);
    };

    let window = read_at(reader, offset, OBJECT_WINDOW)?;
    let mut parser = Parser::new(&window);
    if parser.object_header().is_err() {
        return Ok(None);
    }
    let dict = match parser.parse_object() {
        Ok(Object::Dict(d)) => d,
        _ => return Ok(None),
    };
    let is_xref = dict.get("Type").and_then(Object::as_name) == Some("XRef");
    Ok(is_xref.then_some(dict))
}

/// Parse the dictionary of object `num generation`.
fn load_dict<R: Read + Seek>(
    reader: &mut R,
    num: u32,
    generation: u16,
    len: u64,
) -> Result<Dict, PdfError> {
    let needle = format!("{num} {generation} obj").into_bytes();
    let offset = find_object(reader, &needle, len)?
        .ok_or_else(|| PdfError::Syntax(format!("object {num} {generation} not found")))?;

    let window = read_at(reader, offset, OBJECT_WINDOW)?;
    let mut parser = Parser::new(&window);
    parser.object_header()?;
    match parser.parse_object()? {
        Object::Dict(d) => Ok(d),
        _ => Err(PdfError::Syntax(format!(
            "object {num} {generation} is not a dictionary"
        ))),
    }
}

/// Offset of the last `needle` that starts a token, reading in overlapping
/// chunks so memory stays bounded on large files.
fn find_object<R: Read + Seek>(
    reader: &mut R,
    needle: &[u8],
    len: u64,
) -> Result<Option<u64>, PdfError> {
    reader.seek(SeekFrom::Start(0))?;
    let overlap = needle.len();
    let mut buf = vec![0u8; SEARCH_CHUNK + overlap];
    // `buf[..carried]` holds the last bytes of the previous chunk, which
    // start at file offset `base`.
    let mut carried = 0usize;
    let mut base = 0u64;
    let mut found = None;

    loop {
        let read = read_full(reader, &mut buf[carried..])?;
        let filled = carried + read;
        let window = &buf[..filled];

        let mut from = 0;
        while let Some(pos) = window[from..]
            .windows(needle.len())
            .position(|w| w == needle)
        {
            let at = from + pos;
            // The byte before must not extend the object number (`15 0 obj`
            // also contains `5 0 obj`). At a chunk start it was checked in
            // the previous window.
            let starts_token = match at.checked_sub(1) {
                Some(prev) => !window[prev].is_ascii_digit(),
                None => base == 0 || carried == 0,
            };
            if starts_token {
                found = Some(base + at as u64);
            }
            from = at + 1;
        }

        if read == 0 || base + filled as u64 >= len {
            break;
        }

        // Keep one byte more than the needle so the digit check above always
        // has its preceding byte.
        let keep = (overlap + 1).min(filled);
        buf.copy_within(filled - keep..filled, 0);
        base += (filled - keep) as u64;
        carried = keep;
    }
    Ok(found)
}

fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

fn read_at<R: Read + Seek>(reader: &mut R, offset: u64, max: u64) -> io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut out = Vec::new();
    reader.by_ref().take(max).read_to_end(&mut out)?;
    Ok(out)
}
