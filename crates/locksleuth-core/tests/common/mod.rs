//! Shared fixture builders for the integration tests.
//!
//! Archives are assembled byte by byte so each test controls the exact
//! general-purpose flags written to the local and central headers. PDFs
//! are written with a real xref table; the encrypted ones carry `/O` and
//! `/U` values computed here, independently of the crate, for the
//! RC4 128-bit Standard security handler (revision 3).
#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// 1980-01-01, the earliest MS-DOS date.
const DOS_DATE: u16 = (1 << 5) | 1;

/// One stored (uncompressed) entry.
pub struct ZipEntry<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    pub flags: u16,
}

impl<'a> ZipEntry<'a> {
    pub fn plain(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            data,
            flags: 0,
        }
    }

    pub fn with_flags(name: &'a str, data: &'a [u8], flags: u16) -> Self {
        Self { name, data, flags }
    }
}

/// Assemble a stored ZIP archive from `entries`.
pub fn build_zip(entries: &[ZipEntry<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for entry in entries {
        let offset = out.len() as u32;
        let crc = crc32(entry.data);
        let size = entry.data.len() as u32;
        let name = entry.name.as_bytes();

        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&entry.flags.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // stored
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&DOS_DATE.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(entry.data);

        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&entry.flags.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&DOS_DATE.to_le_bytes());
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes()); // extra
        central.extend_from_slice(&0u16.to_le_bytes()); // comment
        central.extend_from_slice(&0u16.to_le_bytes()); // disk
        central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name);
    }

    let cd_offset = out.len() as u32;
    let cd_size = central.len() as u32;
    out.extend_from_slice(&central);

    let count = entries.len() as u16;
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

pub fn write_zip(path: &Path, entries: &[ZipEntry<'_>]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, build_zip(entries)).unwrap();
}

/// A minimal, valid, unencrypted single-page PDF with a correct xref table.
pub fn build_plain_pdf() -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_owned(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>".to_owned(),
    ];
    assemble_pdf(&objects, "")
}

/// Number `objects` from 1, then append the xref table and a trailer with
/// `/Size`, `/Root 1 0 R` and `extra_trailer`.
fn assemble_pdf(objects: &[String], extra_trailer: &str) -> Vec<u8> {
    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R {extra_trailer} >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

/// Password padding string shared by every revision 2 to 4 document.
const PDF_PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

const PDF_PERMISSIONS: i32 = -3904;
const PDF_FILE_ID: &[u8; 16] = b"LockSleuthFileId";

/// A revision 3, 128-bit RC4 encrypted PDF. An empty `user_pw` gives an
/// owner-password-only document that opens without a password.
pub fn build_encrypted_pdf(user_pw: &str, owner_pw: &str) -> Vec<u8> {
    let o = pdf_owner_entry(user_pw.as_bytes(), owner_pw.as_bytes());
    let key = pdf_file_key(user_pw.as_bytes(), &o);

    let mut seed = PDF_PAD.to_vec();
    seed.extend_from_slice(PDF_FILE_ID);
    let mut u = rc4(&key, &md5::compute(&seed).0);
    for i in 1..=19u8 {
        u = rc4(&xor_key(&key, i), &u);
    }
    u.resize(32, 0);

    let encrypt = format!(
        "<< /Filter /Standard /V 2 /R 3 /Length 128 /P {PDF_PERMISSIONS} /O <{}> /U <{}> >>",
        hex(&o),
        hex(&u)
    );
    let id = hex(PDF_FILE_ID);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_owned(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>".to_owned(),
        encrypt,
    ];
    let trailer = format!("/Encrypt 4 0 R /ID [<{id}> <{id}>]");
    assemble_pdf(&objects, &trailer)
}

/// Algorithm 3: the `/O` entry.
fn pdf_owner_entry(user_pw: &[u8], owner_pw: &[u8]) -> Vec<u8> {
    let owner_pw = if owner_pw.is_empty() { user_pw } else { owner_pw };
    let mut hash = md5::compute(pad_pdf_password(owner_pw)).0;
    for _ in 0..50 {
        hash = md5::compute(hash).0;
    }
    let mut out = rc4(&hash, &pad_pdf_password(user_pw));
    for i in 1..=19u8 {
        out = rc4(&xor_key(&hash, i), &out);
    }
    out
}

/// Algorithm 2: the 16-byte file key for `user_pw`.
fn pdf_file_key(user_pw: &[u8], o: &[u8]) -> Vec<u8> {
    let mut input = pad_pdf_password(user_pw).to_vec();
    input.extend_from_slice(o);
    input.extend_from_slice(&PDF_PERMISSIONS.to_le_bytes());
    input.extend_from_slice(PDF_FILE_ID);
    let mut hash = md5::compute(&input).0;
    for _ in 0..50 {
        hash = md5::compute(hash).0;
    }
    hash.to_vec()
}

fn pad_pdf_password(pw: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let n = pw.len().min(32);
    out[..n].copy_from_slice(&pw[..n]);
    out[n..].copy_from_slice(&PDF_PAD[..32 - n]);
    out
}

fn xor_key(key: &[u8], i: u8) -> Vec<u8> {
    key.iter().map(|b| b ^ i).collect()
}

fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut s: Vec<u8> = (0..=255u8).collect();
    let mut j = 0u8;
    for i in 0..256 {
        j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
        s.swap(i, j as usize);
    }
    let (mut i, mut j) = (0u8, 0u8);
    data.iter()
        .map(|&b| {
            i = i.wrapping_add(1);
            j = j.wrapping_add(s[i as usize]);
            s.swap(i as usize, j as usize);
            b ^ s[s[i as usize].wrapping_add(s[j as usize]) as usize]
        })
        .collect()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Write `bytes` to `path`, creating parent directories.
pub fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}
