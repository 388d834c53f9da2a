// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Manifest Account Association
//!
//! Produces and checks the JSON Farcaster Signature (JFS) that ties an app
//! domain to a custody address:
//!
//! ```text
//! header    = base64url({"fid":..,"type":"custody","key":"0x.."})
//! payload   = base64url({"domain":".."})
//! signature = base64url(personal_sign("header.payload"))
//! ```
//!
//! All segments are URL-safe base64 without padding.

use alloy::primitives::{Address, Signature};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Classify, FailureKind};
use crate::wallet::{WalletController, WalletError};

pub const CUSTODY_KEY_TYPE: &str = "custody";

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Wallet not connected or FID not valid")]
    NotReady,

    #[error("Domain must not be empty")]
    EmptyDomain,

    #[error("Signing failed: {0}")]
    Signing(#[from] WalletError),

    #[error("Malformed {segment} segment: {reason}")]
    Malformed {
        segment: &'static str,
        reason: String,
    },

    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),
}

impl Classify for ManifestError {
    fn kind(&self) -> FailureKind {
        match self {
            ManifestError::Signing(e) => e.kind(),
            ManifestError::NotReady
            | ManifestError::EmptyDomain
            | ManifestError::Malformed { .. }
            | ManifestError::UnsupportedKeyType(_) => FailureKind::InvalidInput,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JfsHeader {
    pub fid: u64,
    #[serde(rename = "type")]
    pub key_type: String,
    /// Checksummed custody address.
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JfsPayload {
    pub domain: String,
}

/// The `accountAssociation` object of a `farcaster.json` manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAssociation {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

impl AccountAssociation {
    /// The exact text that was signed.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }

    pub fn decode_header(&self) -> Result<JfsHeader, ManifestError> {
        decode_segment("header", &self.header)
    }

    pub fn decode_payload(&self) -> Result<JfsPayload, ManifestError> {
        decode_segment("payload", &self.payload)
    }

    /// Recover the signer and check it against the header key.
    ///
    /// Returns the recovered address and whether it matches. Smart-contract
    /// wallets sign differently and will not match here.
    pub fn verify(&self) -> Result<(Address, bool), ManifestError> {
        let header = self.decode_header()?;
        if header.key_type != CUSTODY_KEY_TYPE {
            return Err(ManifestError::UnsupportedKeyType(header.key_type));
        }
        let key: Address = header.key.parse().map_err(|e| ManifestError::Malformed {
            segment: "header",
            reason: format!("invalid key: {e}"),
        })?;

        let raw = URL_SAFE_NO_PAD
            .decode(&self.signature)
            .map_err(|e| malformed("signature", e))?;
        let signature = Signature::try_from(raw.as_slice()).map_err(|e| malformed("signature", e))?;
        let recovered = signature
            .recover_address_from_msg(self.signing_input())
            .map_err(|e| malformed("signature", e))?;

        debug!(%recovered, %key, "Verified manifest signature");
        Ok((recovered, recovered == key))
    }
}

fn malformed(segment: &'static str, reason: impl std::fmt::Display) -> ManifestError {
    ManifestError::Malformed {
        segment,
        reason: reason.to_string(),
    }
}

fn encode_segment<T: Serialize>(value: &T) -> String {
    // Serializing these plain structs cannot fail.
    let json = serde_json::to_vec(value).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

fn decode_segment<T: DeserializeOwned>(segment: &'static str, encoded: &str) -> Result<T, ManifestError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| malformed(segment, e))?;
    serde_json::from_slice(&bytes).map_err(|e| malformed(segment, e))
}

/// Encoded `(header, payload)` for `fid` / `key` / `domain`.
pub fn encode_unsigned(fid: u64, key: Address, domain: &str) -> (String, String) {
    let header = JfsHeader {
        fid,
        key_type: CUSTODY_KEY_TYPE.to_string(),
        key: key.to_checksum(None),
    };
    let payload = JfsPayload {
        domain: domain.to_string(),
    };
    (encode_segment(&header), encode_segment(&payload))
}

/// Sign an account association for `domain` with the connected wallet.
pub async fn sign_manifest(
    wallet: &WalletController,
    fid: Option<u64>,
    domain: &str,
) -> Result<AccountAssociation, ManifestError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(ManifestError::EmptyDomain);
    }
    let session = wallet.session();
    let (Some(address), Some(fid)) = (session.address.filter(|_| session.is_connected), fid)
    else {
        return Err(ManifestError::NotReady);
    };
    if fid == 0 {
        return Err(ManifestError::NotReady);
    }

    let (header, payload) = encode_unsigned(fid, address, domain);
    let signature = wallet
        .sign_manifest_input(&format!("{header}.{payload}"))
        .await?;

    info!(fid, domain, "Signed manifest account association");
    Ok(AccountAssociation {
        header,
        payload,
        signature: URL_SAFE_NO_PAD.encode(&signature),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_signer, MockConnector};
    use std::sync::Arc;

    async fn connected_wallet() -> (WalletController, Arc<MockConnector>) {
        let connector = Arc::new(MockConnector::new("injected"));
        let wallet = WalletController::new(vec![connector.clone()]);
        wallet.connect(None, None).await.unwrap();
        (wallet, connector)
    }

    #[test]
    fn segments_are_unpadded_base64url_json() {
        let key = test_signer().address();
        let (header, payload) = encode_unsigned(6841, key, "frames-v2-demo-lilac.vercel.app");

        assert!(!header.contains('=') && !header.contains('+') && !header.contains('/'));
        let decoded: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&header).unwrap()).unwrap();
        assert_eq!(decoded["fid"], 6841);
        assert_eq!(decoded["type"], "custody");
        assert_eq!(decoded["key"], key.to_checksum(None));

        assert_eq!(
            URL_SAFE_NO_PAD.decode(&payload).unwrap(),
            br#"{"domain":"frames-v2-demo-lilac.vercel.app"}"#
        );
    }

    #[tokio::test]
    async fn signed_association_verifies_against_custody_key() {
        let (wallet, connector) = connected_wallet().await;

        let association = sign_manifest(&wallet, Some(6841), "example.com").await.unwrap();
        let (recovered, matches) = association.verify().unwrap();

        assert_eq!(recovered, connector.address());
        assert!(matches);
        assert_eq!(association.decode_payload().unwrap().domain, "example.com");
        assert_eq!(URL_SAFE_NO_PAD.decode(&association.signature).unwrap().len(), 65);
    }

    #[tokio::test]
    async fn leaves_last_message_signature_alone() {
        let (wallet, _) = connected_wallet().await;
        let user_signature = wallet.sign_message("Hello from Frames v2!").await.unwrap();

        let association = sign_manifest(&wallet, Some(1), "example.com").await.unwrap();

        assert_eq!(wallet.signature(), Some(user_signature));
        assert_eq!(
            wallet.manifest_signature().map(|s| URL_SAFE_NO_PAD.encode(&s)),
            Some(association.signature)
        );
    }

    #[tokio::test]
    async fn tampered_payload_does_not_match() {
        let (wallet, _) = connected_wallet().await;
        let mut association = sign_manifest(&wallet, Some(1), "example.com").await.unwrap();
        association.payload = encode_unsigned(1, Address::ZERO, "evil.example").1;

        let (_, matches) = association.verify().unwrap();
        assert!(!matches);
    }

    #[tokio::test]
    async fn requires_connected_wallet_and_fid() {
        let connector = Arc::new(MockConnector::new("injected"));
        let wallet = WalletController::new(vec![connector.clone()]);

        let err = sign_manifest(&wallet, Some(1), "example.com").await.unwrap_err();
        assert!(matches!(err, ManifestError::NotReady));
        assert_eq!(err.to_string(), "Wallet not connected or FID not valid");

        wallet.connect(None, None).await.unwrap();
        assert!(matches!(
            sign_manifest(&wallet, None, "example.com").await,
            Err(ManifestError::NotReady)
        ));
        assert!(matches!(
            sign_manifest(&wallet, Some(1), "  ").await,
            Err(ManifestError::EmptyDomain)
        ));
        assert_eq!(connector.calls("sign_message"), 0);
    }

    #[test]
    fn garbage_signature_is_malformed() {
        let (header, payload) = encode_unsigned(1, Address::ZERO, "example.com");
        let association = AccountAssociation {
            header,
            payload,
            signature: "AAAA".to_string(),
        };
        let err = association.verify().unwrap_err();
        assert!(matches!(err, ManifestError::Malformed { segment: "signature", .. }));
        assert_eq!(err.kind(), FailureKind::InvalidInput);
    }
}
