//! Deterministic contract address derivation
//!
//! A contract deployed by an account is addressed by
//! `sha256(xdr(HashIdPreimage::ContractId { network_id, preimage }))`, where
//! `network_id = sha256(passphrase)` and the preimage carries the deployer
//! account and a 32-byte salt. The result must match what the network
//! computes, bit for bit.

use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    ContractId, ContractIdPreimage, ContractIdPreimageFromAddress, Hash, HashIdPreimage,
    HashIdPreimageContractId, Limits, ScAddress, Uint256, WriteXdr,
};

use crate::keys::parse_account_id;
use crate::Result;

/// Network identifier: sha256 of the network passphrase
pub fn network_id(passphrase: &str) -> Hash {
    Hash(Sha256::digest(passphrase.as_bytes()).into())
}

/// Contract id preimage for a contract created by `source_account_id`
pub fn contract_id_preimage(source_account_id: &str, salt: &[u8; 32]) -> Result<ContractIdPreimage> {
    let account_id = parse_account_id(source_account_id)?;
    Ok(ContractIdPreimage::Address(ContractIdPreimageFromAddress {
        address: ScAddress::Account(account_id),
        salt: Uint256(*salt),
    }))
}

/// Derive the address of the contract `source_account_id` would create with `salt`
///
/// # Arguments
/// * `source_account_id` - Deployer account (G...)
/// * `salt` - 32-byte salt
/// * `passphrase` - Network passphrase
///
/// # Returns
/// `ScAddress::Contract`, or `Error::InvalidAccount` if the account id cannot be parsed
pub fn derive_contract_address(
    source_account_id: &str,
    salt: &[u8; 32],
    passphrase: &str,
) -> Result<ScAddress> {
    let preimage = HashIdPreimage::ContractId(HashIdPreimageContractId {
        network_id: network_id(passphrase),
        contract_id_preimage: contract_id_preimage(source_account_id, salt)?,
    });
    let encoded = preimage.to_xdr(Limits::none())?;
    let contract_id: [u8; 32] = Sha256::digest(&encoded).into();

    Ok(ScAddress::Contract(ContractId(Hash(contract_id))))
}

/// C... strkey of a contract address, `None` for other address kinds
pub fn contract_strkey(address: &ScAddress) -> Option<String> {
    match address {
        ScAddress::Contract(ContractId(Hash(bytes))) => {
            Some(stellar_strkey::Contract(*bytes).to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{STANDALONE_PASSPHRASE, TESTNET_PASSPHRASE};
    use crate::Error;

    const ACCOUNT: &str = "GDDFXO5LE6JLE7E4HYN7EWBDJSKJ3NV7MAC4UN7LY7BUSD6JNPUAUK4K";

    fn salt(s: &str) -> [u8; 32] {
        Sha256::digest(s.as_bytes()).into()
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_contract_address(ACCOUNT, &salt("hello"), TESTNET_PASSPHRASE).unwrap();
        let b = derive_contract_address(ACCOUNT, &salt("hello"), TESTNET_PASSPHRASE).unwrap();
        assert_eq!(a, b);
        assert!(contract_strkey(&a).unwrap().starts_with('C'));
    }

    #[test]
    fn test_each_input_changes_address() {
        let base = derive_contract_address(ACCOUNT, &salt("hello"), TESTNET_PASSPHRASE).unwrap();
        let other_salt =
            derive_contract_address(ACCOUNT, &salt("world"), TESTNET_PASSPHRASE).unwrap();
        let other_network =
            derive_contract_address(ACCOUNT, &salt("hello"), STANDALONE_PASSPHRASE).unwrap();
        let other_account = derive_contract_address(
            &stellar_strkey::ed25519::PublicKey([5u8; 32]).to_string(),
            &salt("hello"),
            TESTNET_PASSPHRASE,
        )
        .unwrap();

        assert_ne!(base, other_salt);
        assert_ne!(base, other_network);
        assert_ne!(base, other_account);
    }

    #[test]
    fn test_matches_manual_hash() {
        let preimage = HashIdPreimage::ContractId(HashIdPreimageContractId {
            network_id: network_id(TESTNET_PASSPHRASE),
            contract_id_preimage: contract_id_preimage(ACCOUNT, &[0u8; 32]).unwrap(),
        });
        let expected: [u8; 32] = Sha256::digest(preimage.to_xdr(Limits::none()).unwrap()).into();

        let derived = derive_contract_address(ACCOUNT, &[0u8; 32], TESTNET_PASSPHRASE).unwrap();
        assert_eq!(derived, ScAddress::Contract(ContractId(Hash(expected))));
    }

    #[test]
    fn test_invalid_account() {
        let err = derive_contract_address("GNOPE", &[0u8; 32], TESTNET_PASSPHRASE).unwrap_err();
        assert!(matches!(err, Error::InvalidAccount(_)));
    }

    #[test]
    fn test_account_address_has_no_contract_strkey() {
        let account = ScAddress::Account(parse_account_id(ACCOUNT).unwrap());
        assert!(contract_strkey(&account).is_none());
    }
}
