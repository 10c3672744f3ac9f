//! Signing capability and Ed25519 keypairs
//!
//! Transactions are signed through the [`Signer`] trait so that callers can
//! plug in their own key custody. [`Keypair`] is the in-memory implementation.

use std::fmt;

use ed25519_dalek::{Signer as _, SigningKey};
use stellar_xdr::curr::{
    AccountId, DecoratedSignature, PublicKey, Signature, SignatureHint, Uint256,
};

use crate::{Error, Result};

/// Opaque transaction signing capability
pub trait Signer: Send + Sync {
    /// Raw Ed25519 public key
    fn public_key(&self) -> [u8; 32];

    /// Sign an arbitrary message (the transaction hash, for envelopes)
    fn sign(&self, message: &[u8]) -> [u8; 64];

    /// G... account id of the public key
    fn account_id(&self) -> String {
        stellar_strkey::ed25519::PublicKey(self.public_key()).to_string()
    }

    /// Signature decorated with the key hint (last four public key bytes)
    fn decorated_signature(&self, hash: &[u8; 32]) -> Result<DecoratedSignature> {
        let public_key = self.public_key();
        let hint = SignatureHint([public_key[28], public_key[29], public_key[30], public_key[31]]);
        let signature = Signature(self.sign(hash).to_vec().try_into()?);
        Ok(DecoratedSignature { hint, signature })
    }
}

/// Ed25519 keypair held in memory
///
/// The `Debug` implementation does not reveal the key material.
#[derive(Clone)]
pub struct Keypair {
    inner: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair from the OS random number generator
    pub fn random() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            inner: SigningKey::generate(&mut csprng),
        }
    }

    /// Create a keypair from a raw 32-byte seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            inner: SigningKey::from_bytes(seed),
        }
    }

    /// Parse a keypair from a secret seed (S...)
    pub fn from_secret(secret: &str) -> Result<Self> {
        let key = stellar_strkey::ed25519::PrivateKey::from_string(secret)
            .map_err(|_| Error::Config("Invalid secret seed".to_string()))?;
        Ok(Self::from_seed(&key.0))
    }

    /// Secret seed (S...). Handle with care.
    pub fn secret(&self) -> String {
        stellar_strkey::ed25519::PrivateKey(self.inner.to_bytes()).to_string()
    }
}

impl Signer for Keypair {
    fn public_key(&self) -> [u8; 32] {
        self.inner.verifying_key().to_bytes()
    }

    fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.inner.sign(message).to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", self.account_id())
    }
}

/// Parse a G... account id into its XDR form
pub fn parse_account_id(account_id: &str) -> Result<AccountId> {
    let key = stellar_strkey::ed25519::PublicKey::from_string(account_id)
        .map_err(|_| Error::invalid_account(account_id))?;
    Ok(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key.0))))
}

/// Render an XDR account id as G...
pub fn account_id_to_string(account_id: &AccountId) -> String {
    let PublicKey::PublicKeyTypeEd25519(Uint256(bytes)) = &account_id.0;
    stellar_strkey::ed25519::PublicKey(*bytes).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Verifier, VerifyingKey};

    #[test]
    fn test_secret_roundtrip() {
        let keypair = Keypair::random();
        let restored = Keypair::from_secret(&keypair.secret()).unwrap();
        assert_eq!(keypair.public_key(), restored.public_key());
        assert!(keypair.account_id().starts_with('G'));
    }

    #[test]
    fn test_decorated_signature_verifies() {
        let keypair = Keypair::from_seed(&[7u8; 32]);
        let hash = [42u8; 32];
        let decorated = keypair.decorated_signature(&hash).unwrap();

        let public_key = keypair.public_key();
        assert_eq!(decorated.hint.0, public_key[28..32]);

        let verifying = VerifyingKey::from_bytes(&public_key).unwrap();
        let bytes: [u8; 64] = decorated.signature.0.as_slice().try_into().unwrap();
        let signature = ed25519_dalek::Signature::from_bytes(&bytes);
        assert!(verifying.verify(&hash, &signature).is_ok());
    }

    #[test]
    fn test_parse_account_id() {
        let keypair = Keypair::from_seed(&[1u8; 32]);
        let account_id = parse_account_id(&keypair.account_id()).unwrap();
        assert_eq!(account_id_to_string(&account_id), keypair.account_id());

        assert!(matches!(
            parse_account_id("not-an-account"),
            Err(Error::InvalidAccount(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let keypair = Keypair::from_seed(&[3u8; 32]);
        let debug = format!("{:?}", keypair);
        assert!(!debug.contains(&keypair.secret()));
    }
}
