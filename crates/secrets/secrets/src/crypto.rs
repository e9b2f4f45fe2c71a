//! Hashing helpers for key preparation and challenge-response authentication

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

use crate::constants::{ACCESS_KEY_LENGTH, ACCESS_KEY_ROUNDS, HMAC_MINIMUM_KEY_SIZE};
use crate::{Algorithm, Error, Result};

/// Hash `data` with the hash function underlying `algorithm`
pub(crate) fn hash(algorithm: Algorithm, data: &[u8]) -> Result<Vec<u8>> {
    match algorithm {
        Algorithm::Sha1 => Ok(Sha1::digest(data).to_vec()),
        Algorithm::Sha256 => Ok(Sha256::digest(data).to_vec()),
        Algorithm::Sha512 => Ok(Sha512::digest(data).to_vec()),
        Algorithm::Unknown(_) => Err(Error::UnsupportedAlgorithm(algorithm)),
    }
}

fn mac<M: Mac + KeyInit>(key: &[u8]) -> Result<M> {
    <M as Mac>::new_from_slice(key).map_err(|_| Error::WrongLength)
}

/// Compute HMAC(`key`, `message`) with `algorithm`
pub fn hmac(algorithm: Algorithm, key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    macro_rules! compute {
        ($hash:ty) => {{
            let mut mac = mac::<Hmac<$hash>>(key)?;
            mac.update(message);
            Ok(mac.finalize().into_bytes().to_vec())
        }};
    }

    match algorithm {
        Algorithm::Sha1 => compute!(Sha1),
        Algorithm::Sha256 => compute!(Sha256),
        Algorithm::Sha512 => compute!(Sha512),
        Algorithm::Unknown(_) => Err(Error::UnsupportedAlgorithm(algorithm)),
    }
}

/// Check `expected` against HMAC(`key`, `message`) in constant time
pub(crate) fn verify_hmac(
    algorithm: Algorithm,
    key: &[u8],
    message: &[u8],
    expected: &[u8],
) -> Result<()> {
    macro_rules! verify {
        ($hash:ty) => {{
            let mut mac = mac::<Hmac<$hash>>(key)?;
            mac.update(message);
            mac.verify_slice(expected)
                .map_err(|_| Error::AuthenticationFailed)
        }};
    }

    match algorithm {
        Algorithm::Sha1 => verify!(Sha1),
        Algorithm::Sha256 => verify!(Sha256),
        Algorithm::Sha512 => verify!(Sha512),
        Algorithm::Unknown(_) => Err(Error::UnsupportedAlgorithm(algorithm)),
    }
}

/// Bring a secret into the shape the applet stores
///
/// Secrets longer than the hash block size are replaced by their hash, as
/// HMAC would do internally. Short secrets are left-padded with zeros.
pub(crate) fn prepare_key(algorithm: Algorithm, secret: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let block_size = algorithm
        .block_size()
        .ok_or(Error::UnsupportedAlgorithm(algorithm))?;

    let key = if secret.len() > block_size {
        Zeroizing::new(hash(algorithm, secret)?)
    } else {
        Zeroizing::new(secret.to_vec())
    };

    Ok(pad_key(&key))
}

/// Left-pad `key` with zeros to the minimum HMAC key size
pub(crate) fn pad_key(key: &[u8]) -> Zeroizing<Vec<u8>> {
    let padding = HMAC_MINIMUM_KEY_SIZE.saturating_sub(key.len());
    let mut padded = Zeroizing::new(vec![0u8; padding]);
    padded.extend_from_slice(key);
    padded
}

/// Derive the challenge-response access key from a password
///
/// PBKDF2-HMAC-SHA1 over the salt from the SELECT response.
pub fn derive_access_key(password: &[u8], salt: &[u8]) -> Zeroizing<[u8; ACCESS_KEY_LENGTH]> {
    let mut key = Zeroizing::new([0u8; ACCESS_KEY_LENGTH]);
    pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, ACCESS_KEY_ROUNDS, key.as_mut_slice());
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_hmac_rfc2202() {
        let digest = hmac(Algorithm::Sha1, &[0x0b; 20], b"Hi There").unwrap();
        assert_eq!(digest, hex!("b617318655057264e28bc0b6fb378c8ef146be00"));

        assert!(verify_hmac(Algorithm::Sha1, &[0x0b; 20], b"Hi There", &digest).is_ok());
        assert!(matches!(
            verify_hmac(Algorithm::Sha1, &[0x0c; 20], b"Hi There", &digest),
            Err(Error::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_prepare_key() {
        let key = prepare_key(Algorithm::Sha1, b"abc").unwrap();
        assert_eq!(key.len(), HMAC_MINIMUM_KEY_SIZE);
        assert_eq!(&key[..11], &[0u8; 11]);
        assert_eq!(&key[11..], b"abc");

        let long = [0x42u8; 65];
        let key = prepare_key(Algorithm::Sha256, &long).unwrap();
        assert_eq!(key.as_slice(), Sha256::digest(long).as_slice());

        let exact = [0x42u8; 64];
        assert_eq!(prepare_key(Algorithm::Sha1, &exact).unwrap().as_slice(), &exact);

        assert!(matches!(
            prepare_key(Algorithm::Unknown(9), b"abc"),
            Err(Error::UnsupportedAlgorithm(Algorithm::Unknown(9)))
        ));
    }

    #[test]
    fn test_derive_access_key() {
        let key = derive_access_key(b"password", &hex!("5d26ffbf5e5b8c40"));
        assert_eq!(*key, hex!("7419faef50d014cd79c8816b3c83fc65"));
        assert_ne!(*key, *derive_access_key(b"password", &hex!("0000000000000000")));
    }
}
