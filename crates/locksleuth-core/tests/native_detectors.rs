//! Native PDF and ZIP detectors against real files on disk.
mod common;

use common::{build_encrypted_pdf, build_plain_pdf, build_zip, write_file, write_zip, ZipEntry};
use locksleuth_core::detect::zip::{FLAG_ENCRYPTED, FLAG_STRONG_ENCRYPTION};
use locksleuth_core::detect::{DetectError, Detector, PdfNative, ZipNative};
use locksleuth_core::model::Verdict;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

#[test]
fn plain_zip_is_not_protected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("plain.zip");
    write_zip(
        &path,
        &[
            ZipEntry::plain("a.txt", b"hello"),
            ZipEntry::plain("b.txt", b"world"),
        ],
    );
    assert_eq!(ZipNative.detect(&path).unwrap(), Verdict::NotProtected);
}

#[test]
fn traditional_encryption_flag_is_protected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("locked.zip");
    write_zip(
        &path,
        &[ZipEntry::with_flags("secret.txt", b"xxxxxxxxxxxx", FLAG_ENCRYPTED)],
    );
    assert_eq!(ZipNative.detect(&path).unwrap(), Verdict::Protected);
}

/// Bit 6 alone is enough; bit 0 need not be set.
#[test]
fn strong_encryption_flag_alone_is_protected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("strong.zip");
    write_zip(
        &path,
        &[ZipEntry::with_flags("s.bin", b"data", FLAG_STRONG_ENCRYPTION)],
    );
    assert_eq!(ZipNative.detect(&path).unwrap(), Verdict::Protected);
}

#[test]
fn any_encrypted_entry_marks_the_archive() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("mixed.zip");
    write_zip(
        &path,
        &[
            ZipEntry::plain("readme.txt", b"open"),
            ZipEntry::with_flags("payload.bin", b"closed", FLAG_ENCRYPTED),
        ],
    );
    assert_eq!(ZipNative.detect(&path).unwrap(), Verdict::Protected);
}

#[test]
fn zero_byte_zip_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("empty.zip");
    write_file(&path, b"");
    assert!(ZipNative.detect(&path).is_err());
}

#[test]
fn truncated_zip_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cut.zip");
    let bytes = build_zip(&[ZipEntry::plain("a.txt", b"hello world")]);
    write_file(&path, &bytes[..bytes.len() / 2]);
    assert!(ZipNative.detect(&path).is_err());
}

#[test]
fn missing_zip_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    let err = ZipNative.detect(&tmp.path().join("gone.zip")).unwrap_err();
    assert!(matches!(err, DetectError::Io(_)));
}

#[test]
fn plain_pdf_is_not_protected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("plain.pdf");
    write_file(&path, &build_plain_pdf());
    assert_eq!(PdfNative.detect(&path).unwrap(), Verdict::NotProtected);
}

/// Unparseable input is reported as not protected rather than an error.
#[test]
fn garbage_pdf_is_not_protected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("junk.pdf");
    write_file(&path, b"this is not a pdf at all\n");
    assert_eq!(PdfNative.detect(&path).unwrap(), Verdict::NotProtected);

    let empty = tmp.path().join("empty.pdf");
    write_file(&empty, b"");
    assert_eq!(PdfNative.detect(&empty).unwrap(), Verdict::NotProtected);
}

#[test]
fn missing_pdf_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    let err = PdfNative.detect(&tmp.path().join("gone.pdf")).unwrap_err();
    assert!(matches!(err, DetectError::Io(_)));
}

#[test]
fn pdf_with_user_password_is_protected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("locked.pdf");
    write_file(&path, &build_encrypted_pdf("x", "owner"));
    assert_eq!(PdfNative.detect(&path).unwrap(), Verdict::Protected);
}

/// Restrictions without a user password: anyone can open the file.
#[test]
fn pdf_with_owner_password_only_is_not_protected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("restricted.pdf");
    write_file(&path, &build_encrypted_pdf("", "owner"));
    assert_eq!(PdfNative.detect(&path).unwrap(), Verdict::NotProtected);
}

#[test]
fn pdf_with_encrypt_entry_but_missing_dictionary_is_not_protected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("torn.pdf");
    let mut bytes = build_encrypted_pdf("x", "owner");
    // Break the `4 0 obj` header so the dictionary cannot be found.
    let at = bytes
        .windows(7)
        .position(|w| w == b"4 0 obj")
        .unwrap();
    bytes[at + 4..at + 7].copy_from_slice(b"xyz");
    write_file(&path, &bytes);
    assert_eq!(PdfNative.detect(&path).unwrap(), Verdict::NotProtected);
}

type Snapshot = BTreeMap<PathBuf, Option<(u64, SystemTime)>>;

fn snapshot(paths: impl IntoIterator<Item = PathBuf>) -> Snapshot {
    paths
        .into_iter()
        .map(|p| {
            let meta = fs::metadata(&p).ok().map(|m| (m.len(), m.modified().unwrap()));
            (p, meta)
        })
        .collect()
}

fn tree(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in fs::read_dir(root).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(tree(&path));
        }
        out.push(path);
    }
    out
}

/// Checking a PDF is read-only: the scanned tree is unchanged and no debug
/// log appears in the temporary directory.
#[test]
fn native_pdf_check_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp.path().join("sub/locked.pdf"), &build_encrypted_pdf("x", "o"));
    write_file(&tmp.path().join("restricted.pdf"), &build_encrypted_pdf("", "o"));
    write_file(&tmp.path().join("open.pdf"), &build_plain_pdf());
    write_file(&tmp.path().join("junk.pdf"), b"%PDF-1.7\ngarbage");

    let temp_logs = ["pdf_debug.log", "pdf_open_debug.log"].map(|n| std::env::temp_dir().join(n));
    let before_tree = snapshot(tree(tmp.path()));
    let before_logs = snapshot(temp_logs.clone());

    for path in tree(tmp.path()).into_iter().filter(|p| p.is_file()) {
        PdfNative.detect(&path).unwrap();
    }

    assert_eq!(snapshot(tree(tmp.path())), before_tree);
    assert_eq!(snapshot(temp_logs), before_logs);
}
