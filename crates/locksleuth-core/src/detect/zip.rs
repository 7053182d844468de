/// ZIP encryption detection.
///
/// **Native:** the `zip` crate reads the central directory; for every entry
/// we then read the general-purpose bit flags straight from its local file
/// header. Bit 0 (traditional PKWARE encryption) or bit 6 (strong
/// encryption) on any entry marks the whole archive protected. An archive
/// whose directory cannot be read is an error, not "not protected".
///
/// **Delegated:** `zipinfo -v` prints a `file security status:` line per
/// entry. The first one decides: "encrypted" means protected, "not
/// encrypted" means not. Only the first entry is consulted.
use super::{Delegation, DetectError, Detector, Strategy};
use crate::model::{DocumentFormat, Verdict};
use crate::platform::Tool;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// General-purpose flag bit 0: traditional encryption.
pub const FLAG_ENCRYPTED: u16 = 1 << 0;
/// General-purpose flag bit 6: strong encryption.
pub const FLAG_STRONG_ENCRYPTION: u16 = 1 << 6;

const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x0403_4b50;
/// Signature (4) + version needed (2) + flags (2).
const LOCAL_HEADER_PREFIX_LEN: usize = 8;

/// `true` if `flags` marks an entry as encrypted in either scheme.
#[inline]
pub fn flags_indicate_encryption(flags: u16) -> bool {
    flags & (FLAG_ENCRYPTED | FLAG_STRONG_ENCRYPTION) != 0
}

/// In-process ZIP check.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipNative;

impl Detector for ZipNative {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Zip
    }

    fn strategy(&self) -> Strategy {
        Strategy::Native
    }

    fn detect(&self, path: &Path) -> Result<Verdict, DetectError> {
        let file = File::open(path)?;
        let mut archive = ::zip::ZipArchive::new(BufReader::new(file))?;

        let mut header_offsets = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            header_offsets.push(entry.header_start());
        }

        let mut reader = archive.into_inner();
        for offset in header_offsets {
            let flags = read_local_flags(&mut reader, offset)?;
            if flags_indicate_encryption(flags) {
                debug!(
                    "{}: entry at offset {offset} has flags {flags:#06x}",
                    path.display()
                );
                return Ok(Verdict::Protected);
            }
        }
        Ok(Verdict::NotProtected)
    }
}

/// Read the general-purpose flags from the local header at `offset`.
fn read_local_flags<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<u16, DetectError> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut prefix = [0u8; LOCAL_HEADER_PREFIX_LEN];
    reader.read_exact(&mut prefix)?;

    let signature = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
    if signature != LOCAL_FILE_HEADER_SIGNATURE {
        return Err(DetectError::CorruptZip(format!(
            "no local file header at offset {offset}"
        )));
    }
    Ok(u16::from_le_bytes([prefix[6], prefix[7]]))
}

/// `zipinfo`-backed ZIP check.
#[derive(Clone)]
pub struct ZipDelegated {
    delegation: Delegation,
}

impl ZipDelegated {
    pub fn new(delegation: Delegation) -> Self {
        Self { delegation }
    }
}

impl Detector for ZipDelegated {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Zip
    }

    fn strategy(&self) -> Strategy {
        Strategy::Delegated
    }

    fn detect(&self, path: &Path) -> Result<Verdict, DetectError> {
        let host_path = self.delegation.prepare(path)?;
        let out = self
            .delegation
            .run(Tool::Zipinfo, &["-v".to_owned(), host_path])?;
        if !out.success() {
            return Err(DetectError::ToolFailed {
                tool: Tool::Zipinfo,
                code: out.code,
                stderr: out.stderr.trim().to_owned(),
            });
        }
        Ok(Verdict::from_protected(zipinfo_reports_encryption(
            &out.stdout,
        )))
    }
}

/// Interpret `zipinfo -v` output: the first `file security status:` line wins.
pub fn zipinfo_reports_encryption(output: &str) -> bool {
    output
        .lines()
        .map(str::to_ascii_lowercase)
        .find(|line| line.contains("file security status:"))
        .is_some_and(|line| !line.contains("not"))
}
