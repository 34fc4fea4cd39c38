//! Key derivation: PBKDF2-HMAC-SHA256 passphrase → (file key, table key)

use hmac::Hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use mist_core::{MistError, MistResult};

use crate::keys::SymmetricKey;
use crate::{KEY_SIZE, PBKDF2_ROUNDS, SALT_SIZE};

/// The two independent keys of one archive.
///
/// Both halves come from a single 64-byte PBKDF2 output, so the same
/// passphrase and salt always reproduce the same pair.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub file: SymmetricKey,
    pub table: SymmetricKey,
}

/// Derive `(file key, table key)` from a passphrase and the archive salt.
pub fn derive_keys(passphrase: &SecretString, salt: &[u8; SALT_SIZE]) -> MistResult<KeyPair> {
    let mut okm = stretch(passphrase.expose_secret().as_bytes(), salt)?;

    let file = SymmetricKey::from_slice(&okm[..KEY_SIZE]);
    let table = SymmetricKey::from_slice(&okm[KEY_SIZE..]);
    okm.zeroize();

    Ok(KeyPair {
        file: file?,
        table: table?,
    })
}

fn stretch(password: &[u8], salt: &[u8]) -> MistResult<[u8; 2 * KEY_SIZE]> {
    let mut okm = [0u8; 2 * KEY_SIZE];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, PBKDF2_ROUNDS, &mut okm)
        .map_err(|e| MistError::Other(anyhow::anyhow!("PBKDF2 failed: {e}")))?;
    Ok(okm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_kdf_known_answer() {
        // PBKDF2-HMAC-SHA256("password", "salt", 4096); first 32 bytes
        let okm = stretch(b"password", b"salt").unwrap();
        assert_eq!(
            hex(&okm[..KEY_SIZE]),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn test_kdf_deterministic() {
        let passphrase = SecretString::from("correct horse");
        let salt = [1u8; SALT_SIZE];

        let a = derive_keys(&passphrase, &salt).unwrap();
        let b = derive_keys(&passphrase, &salt).unwrap();

        assert_eq!(a.file.as_bytes(), b.file.as_bytes(), "KDF must be deterministic");
        assert_eq!(a.table.as_bytes(), b.table.as_bytes());
    }

    #[test]
    fn test_keys_are_the_two_halves() {
        let salt = [5u8; SALT_SIZE];
        let okm = stretch(b"correct horse", &salt).unwrap();
        let pair = derive_keys(&SecretString::from("correct horse"), &salt).unwrap();

        assert_eq!(&pair.file.as_bytes()[..], &okm[..KEY_SIZE]);
        assert_eq!(&pair.table.as_bytes()[..], &okm[KEY_SIZE..]);
    }

    #[test]
    fn test_halves_are_independent() {
        let pair = derive_keys(&SecretString::from("correct horse"), &[3u8; SALT_SIZE]).unwrap();
        assert_ne!(pair.file.as_bytes(), pair.table.as_bytes());
    }

    #[test]
    fn test_kdf_different_passphrases() {
        let salt = [1u8; SALT_SIZE];
        let a = derive_keys(&SecretString::from("correct horse"), &salt).unwrap();
        let b = derive_keys(&SecretString::from("wrong horse"), &salt).unwrap();

        assert_ne!(a.file.as_bytes(), b.file.as_bytes());
        assert_ne!(a.table.as_bytes(), b.table.as_bytes());
    }

    #[test]
    fn test_kdf_different_salts() {
        let passphrase = SecretString::from("same-passphrase");
        let a = derive_keys(&passphrase, &[1u8; SALT_SIZE]).unwrap();
        let b = derive_keys(&passphrase, &[2u8; SALT_SIZE]).unwrap();

        assert_ne!(a.file.as_bytes(), b.file.as_bytes());
    }

    #[test]
    fn test_empty_passphrase_is_accepted() {
        let pair = derive_keys(&SecretString::from(""), &[0u8; SALT_SIZE]).unwrap();
        assert_ne!(pair.file.as_bytes(), &[0u8; KEY_SIZE]);
    }
}
