//! Signing identity: key decoding, address derivation and transaction signing.
//!
//! Accepted key material:
//! - Bech32 `suiprivkey1...` (scheme embedded)
//! - base64 or hex of `flag || key` (33 bytes, scheme embedded)
//! - raw 32-byte key as hex or base64, combined with an explicit scheme
//!   (default `ed25519`)

use fastcrypto::traits::EncodeDecodeBase64;
use serde::{Deserialize, Serialize};
use shared_crypto::intent::{Intent, IntentMessage};
use std::fmt;
use std::str::FromStr;
use sui_types::base_types::SuiAddress;
use sui_types::crypto::{Signature, SuiKeyPair};
use sui_types::transaction::TransactionData;

use crate::error::StepError;
use sui_steps_types::encoding::{base64_encode, decode_hex_or_base64};

const BECH32_PREFIX: &str = "suiprivkey";
const RAW_KEY_LEN: usize = 32;

/// Signature scheme of a private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    #[default]
    Ed25519,
    Secp256k1,
    Secp256r1,
}

impl KeyScheme {
    /// Leading flag byte of the `flag || key` encoding.
    pub fn flag(&self) -> u8 {
        match self {
            KeyScheme::Ed25519 => 0x00,
            KeyScheme::Secp256k1 => 0x01,
            KeyScheme::Secp256r1 => 0x02,
        }
    }

    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0x00 => Some(KeyScheme::Ed25519),
            0x01 => Some(KeyScheme::Secp256k1),
            0x02 => Some(KeyScheme::Secp256r1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyScheme::Ed25519 => "ed25519",
            KeyScheme::Secp256k1 => "secp256k1",
            KeyScheme::Secp256r1 => "secp256r1",
        }
    }
}

impl fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyScheme {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ed25519" => Ok(KeyScheme::Ed25519),
            "secp256k1" => Ok(KeyScheme::Secp256k1),
            "secp256r1" => Ok(KeyScheme::Secp256r1),
            other => Err(StepError::validation(
                "keyScheme",
                format!("unknown key scheme '{other}' (expected ed25519, secp256k1 or secp256r1)"),
            )),
        }
    }
}

/// Transaction bytes and signature, both base64, ready for
/// `sui_executeTransactionBlock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx_bytes: String,
    pub signature: String,
}

/// A decoded keypair and the address it controls.
pub struct Signer {
    keypair: SuiKeyPair,
    scheme: KeyScheme,
    address: SuiAddress,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("scheme", &self.scheme)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Decode key material. `scheme` applies to raw 32-byte keys and must
    /// agree with the embedded scheme of the other encodings when given.
    pub fn from_key(key: &str, scheme: Option<KeyScheme>) -> Result<Self, StepError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(StepError::InvalidKey("private key is empty".to_string()));
        }

        let keypair = if key.starts_with(BECH32_PREFIX) {
            SuiKeyPair::decode(key).map_err(|_| {
                StepError::InvalidKey("malformed suiprivkey bech32 string".to_string())
            })?
        } else {
            let bytes = decode_hex_or_base64(key).ok_or_else(|| {
                StepError::InvalidKey("expected bech32, hex or base64 key material".to_string())
            })?;
            decode_key_bytes(&bytes, scheme)?
        };

        let embedded = scheme_of(&keypair);
        if let Some(expected) = scheme {
            if expected != embedded {
                return Err(StepError::InvalidKey(format!(
                    "key is {embedded} but key scheme {expected} was configured"
                )));
            }
        }

        let address = SuiAddress::from(&keypair.public());
        Ok(Self {
            keypair,
            scheme: embedded,
            address,
        })
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    pub fn address(&self) -> SuiAddress {
        self.address
    }

    /// `0x`-prefixed 64-hex-digit address.
    pub fn address_string(&self) -> String {
        self.address.to_string()
    }

    /// Sign `tx_data` under the `sui_transaction` intent.
    pub fn sign_transaction(&self, tx_data: &TransactionData) -> Result<SignedTransaction, StepError> {
        let tx_bytes = bcs::to_bytes(tx_data).map_err(StepError::build)?;
        let message = IntentMessage::new(Intent::sui_transaction(), tx_data.clone());
        let signature = Signature::new_secure(&message, &self.keypair);
        Ok(SignedTransaction {
            tx_bytes: base64_encode(&tx_bytes),
            signature: base64_encode(signature.as_ref()),
        })
    }
}

fn decode_key_bytes(bytes: &[u8], scheme: Option<KeyScheme>) -> Result<SuiKeyPair, StepError> {
    let flagged = match bytes.len() {
        RAW_KEY_LEN => {
            let mut flagged = Vec::with_capacity(RAW_KEY_LEN + 1);
            flagged.push(scheme.unwrap_or_default().flag());
            flagged.extend_from_slice(bytes);
            flagged
        }
        len if len == RAW_KEY_LEN + 1 => {
            if KeyScheme::from_flag(bytes[0]).is_none() {
                return Err(StepError::InvalidKey(format!(
                    "unsupported key scheme flag 0x{:02x}",
                    bytes[0]
                )));
            }
            bytes.to_vec()
        }
        len => {
            return Err(StepError::InvalidKey(format!(
                "expected a 32-byte key or 33-byte flag||key, got {len} bytes"
            )))
        }
    };

    SuiKeyPair::decode_base64(&base64_encode(&flagged))
        .map_err(|_| StepError::InvalidKey("key bytes are not a valid private key".to_string()))
}

fn scheme_of(keypair: &SuiKeyPair) -> KeyScheme {
    match keypair {
        SuiKeyPair::Ed25519(_) => KeyScheme::Ed25519,
        SuiKeyPair::Secp256k1(_) => KeyScheme::Secp256k1,
        SuiKeyPair::Secp256r1(_) => KeyScheme::Secp256r1,
    }
}
