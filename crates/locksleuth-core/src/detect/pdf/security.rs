//! The Standard security handler's user-password check, limited to the one
//! question LockSleuth asks: does the empty user password open the file?
//!
//! Revisions 2 to 4 use the MD5/RC4 key derivation; 5 and 6 use the
//! SHA-2 validation salt stored in `/U`.

use super::syntax::{Dict, Object};
use aes_gcm::aes::cipher::generic_array::GenericArray;
use aes_gcm::aes::cipher::{BlockEncrypt, KeyInit};
use aes_gcm::aes::{Aes128, Block};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Padding string used to extend passwords to 32 bytes (revisions 2 to 4).
pub(crate) const PASSWORD_PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// What the `/Encrypt` dictionary says about how the document is locked.
#[derive(Debug, Clone, PartialEq)]
pub struct Encryption {
    pub filter: Option<String>,
    pub v: i64,
    pub r: i64,
    /// Key length in bits.
    pub length: i64,
    pub o: Vec<u8>,
    pub u: Vec<u8>,
    pub p: i64,
    pub encrypt_metadata: bool,
    /// First element of the trailer `/ID`.
    pub id: Vec<u8>,
}

impl Encryption {
    pub fn from_dict(dict: &Dict, id: Vec<u8>) -> Self {
        let int = |key: &str| dict.get(key).and_then(Object::as_int);
        let bytes = |key: &str| {
            dict.get(key)
                .and_then(Object::as_bytes)
                .map(<[u8]>::to_vec)
                .unwrap_or_default()
        };
        let v = int("V").unwrap_or(0);
        Self {
            filter: dict.get("Filter").and_then(Object::as_name).map(str::to_owned),
            v,
            r: int("R").unwrap_or(0),
            length: int("Length").unwrap_or(if v >= 4 { 128 } else { 40 }),
            o: bytes("O"),
            u: bytes("U"),
            p: int("P").unwrap_or(0),
            encrypt_metadata: dict
                .get("EncryptMetadata")
                .and_then(Object::as_bool)
                .unwrap_or(true),
            id,
        }
    }

    /// `true` when the document opens without a password, as an
    /// owner-password-only document does. Handlers other than `Standard`
    /// and revisions this check does not know cannot be opened here and
    /// report `false`.
    pub fn opens_with_empty_user_password(&self) -> bool {
        if self.filter.as_deref() != Some("Standard") {
            return false;
        }
        match self.r {
            2 => self.u.len() >= 32 && rc4(&self.file_key(b""), &PASSWORD_PAD) == self.u[..32],
            3 | 4 => self.u.len() >= 16 && self.user_check_r3(b"") == self.u[..16],
            5 => self.u.len() >= 48 && Sha256::digest(&self.u[32..40])[..] == self.u[..32],
            6 => self.u.len() >= 48 && hash_r6(b"", &self.u[32..40], &[]) == self.u[..32],
            _ => false,
        }
    }

    fn key_len(&self) -> usize {
        if self.r == 2 {
            5
        } else {
            usize::try_from(self.length / 8).unwrap_or(5).clamp(5, 16)
        }
    }

    /// File encryption key for a revision 2 to 4 password.
    fn file_key(&self, password: &[u8]) -> Vec<u8> {
        let n = self.key_len();
        let mut input = pad_password(password).to_vec();
        input.extend_from_slice(&self.o[..self.o.len().min(32)]);
        input.extend_from_slice(&(self.p as u32).to_le_bytes());
        input.extend_from_slice(&self.id);
        if self.r >= 4 && !self.encrypt_metadata {
            input.extend_from_slice(&[0xff; 4]);
        }
        let mut hash = md5::compute(&input).0;
        if self.r >= 3 {
            for _ in 0..50 {
                hash = md5::compute(&hash[..n]).0;
            }
        }
        hash[..n].to_vec()
    }

    /// First 16 bytes of the `/U` value a revision 3 or 4 password produces.
    fn user_check_r3(&self, password: &[u8]) -> Vec<u8> {
        let key = self.file_key(password);
        let mut input = PASSWORD_PAD.to_vec();
        input.extend_from_slice(&self.id);
        let mut out = rc4(&key, &md5::compute(&input).0);
        for i in 1..=19u8 {
            let round_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
            out = rc4(&round_key, &out);
        }
        out
    }
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut out = PASSWORD_PAD;
    let n = password.len().min(32);
    out[..n].copy_from_slice(&password[..n]);
    out[n..].copy_from_slice(&PASSWORD_PAD[..32 - n]);
    out
}

/// RC4 keystream applied to `data`. Encryption and decryption are the same.
pub(crate) fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut s: [u8; 256] = std::array::from_fn(|i| i as u8);
    if !key.is_empty() {
        let mut j = 0usize;
        for i in 0..256 {
            j = (j + s[i] as usize + key[i % key.len()] as usize) % 256;
            s.swap(i, j);
        }
    }

    let (mut i, mut j) = (0usize, 0usize);
    data.iter()
        .map(|&byte| {
            i = (i + 1) % 256;
            j = (j + s[i] as usize) % 256;
            s.swap(i, j);
            byte ^ s[(s[i] as usize + s[j] as usize) % 256]
        })
        .collect()
}

/// Revision 6 password hash: SHA-256 seeded, then at least 64 rounds of
/// AES-128-CBC stretching with the digest chosen by each round's output.
pub(crate) fn hash_r6(password: &[u8], salt: &[u8], user_key: &[u8]) -> Vec<u8> {
    let mut k = Sha256::new()
        .chain_update(password)
        .chain_update(salt)
        .chain_update(user_key)
        .finalize()
        .to_vec();

    let mut round = 0usize;
    let mut last = 0u8;
    while round < 64 || usize::from(last) + 32 > round {
        let mut block = Vec::with_capacity(password.len() + k.len() + user_key.len());
        block.extend_from_slice(password);
        block.extend_from_slice(&k);
        block.extend_from_slice(user_key);
        let k1 = block.repeat(64);

        let e = aes128_cbc(&k[..16], &k[16..32], &k1);
        let selector = e[..16].iter().map(|&b| u32::from(b)).sum::<u32>() % 3;
        k = match selector {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };
        last = e[e.len() - 1];
        round += 1;
    }
    k.truncate(32);
    k
}

/// AES-128-CBC without padding; `data` is always a multiple of 16 here.
fn aes128_cbc(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut prev = [0u8; 16];
    prev.copy_from_slice(iv);
    let mut out = Vec::with_capacity(data.len());
    for chunk in data.chunks_exact(16) {
        let mut block = Block::clone_from_slice(chunk);
        for (b, p) in block.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        cipher.encrypt_block(&mut block);
        prev.copy_from_slice(&block);
        out.extend_from_slice(&block);
    }
    out
}
