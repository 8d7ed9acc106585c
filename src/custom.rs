// Multisig keystore adapters & wallet policy engine.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2020-2024 by
//     Dr Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// Copyright (C) 2020-2024 LNP/BP Standards Association. All rights reserved.
// Copyright (C) 2020-2024 Dr Maxim Orlovsky. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use std::str::FromStr;

use derive::{KeyOrigin, Xpub, XpubFp};
use policy::{MultisigWalletConfig, MultisigWalletPolicy};

use crate::interaction::{InteractionError, WalletConfigExport, XpubRequest};

/// Root fingerprint implied by the key itself, known only for the master key
/// and its direct children.
fn implied_root_fp(xpub: &Xpub) -> Option<XpubFp> {
    match xpub.depth() {
        0 => Some(xpub.fingerprint()),
        1 => Some(xpub.parent_fp()),
        _ => None,
    }
}

fn check_fp(expected: Option<XpubFp>, actual: XpubFp) -> Result<(), InteractionError> {
    match expected {
        Some(expected) if expected != actual => {
            Err(InteractionError::FingerprintMismatch { expected, actual })
        }
        _ => Ok(()),
    }
}

/// Parses key entered by hand: either a full `[fingerprint/path]xpub` key
/// origin or a bare extended public key at the requested path.
pub fn parse_extended_public_key(
    request: &XpubRequest,
    payload: &str,
) -> Result<KeyOrigin, InteractionError> {
    let payload = payload.trim();
    let (root_fp, derivation, xpub) = if payload.starts_with('[') {
        let origin = KeyOrigin::from_str(payload)?;
        if origin.derivation() != &request.bip32_path {
            return Err(InteractionError::PathMismatch {
                requested: request.bip32_path.to_master_string(),
                exported: origin.derivation().to_master_string(),
            });
        }
        check_fp(request.root_fp, origin.root_fp())?;
        (origin.root_fp(), origin.derivation().clone(), origin.xpub())
    } else {
        let xpub = Xpub::from_str(payload)?;
        let root_fp = match (request.root_fp, implied_root_fp(&xpub)) {
            (Some(expected), Some(actual)) => {
                check_fp(Some(expected), actual)?;
                actual
            }
            (Some(expected), None) => expected,
            (None, implied) => implied.unwrap_or_else(XpubFp::master),
        };
        (root_fp, request.bip32_path.clone(), xpub)
    };

    if xpub.depth() as usize != derivation.depth() {
        return Err(InteractionError::DepthMismatch {
            depth: xpub.depth(),
            path_len: derivation.depth(),
        });
    }
    Ok(KeyOrigin::new(root_fp, derivation, xpub, request.network)?)
}

/// Exports the configuration file itself once it yields a valid policy.
pub fn export_wallet_config(
    config: &MultisigWalletConfig,
) -> Result<WalletConfigExport, InteractionError> {
    MultisigWalletPolicy::from_wallet_config(config)?;
    Ok(WalletConfigExport::Json(config.to_json()))
}

#[cfg(test)]
mod test {
    use derive::{DerivationPath, Network};
    use policy::{AddressType, ExtendedPublicKeyEntry};

    use super::*;

    const TPUB: &str = "tpubDFAKVF8qLV8EQYXahuxoJuRdeJkyuQ47gMgEPrFMoZd4rA6gVSSNsqjETNtY48BAmtnZeamS4RfFHs4KXbRHSu2AzCkpwJXzBp6w8hvsZDG";
    const MASTER: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";

    fn request(path: &str) -> XpubRequest {
        XpubRequest::new(DerivationPath::from_str(path).unwrap(), Network::Testnet)
    }

    #[test]
    fn key_origin_payload() {
        let payload = format!("[0F056943/48h/1h/0h/2h]{TPUB}");
        let origin = parse_extended_public_key(&request("m/48'/1'/0'/2'"), &payload).unwrap();
        assert_eq!(origin.to_string(), format!("[0f056943/48'/1'/0'/2']{TPUB}"));

        let short = format!("[0f056943/48'/1'/0']{TPUB}");
        assert!(matches!(
            parse_extended_public_key(&request("m/48'/1'/0'"), &short),
            Err(InteractionError::DepthMismatch { depth: 4, path_len: 3 })
        ));
    }

    #[test]
    fn key_origin_other_path() {
        let payload = format!("[0f056943/45'/7'/9'/1']{TPUB}");
        assert_eq!(
            parse_extended_public_key(&request("m/48'/1'/0'/2'"), &payload),
            Err(InteractionError::PathMismatch {
                requested: s!("m/48'/1'/0'/2'"),
                exported: s!("m/45'/7'/9'/1'"),
            })
        );
        let wrong_fp =
            request("m/45'/7'/9'/1'").with_root_fp(XpubFp::from_hex_str("deadbeef").unwrap());
        assert!(matches!(
            parse_extended_public_key(&wrong_fp, &payload),
            Err(InteractionError::FingerprintMismatch { .. })
        ));
        assert!(parse_extended_public_key(&request("m/45'/7'/9'/1'"), &payload).is_ok());
    }

    #[test]
    fn bare_xpub() {
        let origin = parse_extended_public_key(&request("m/48'/1'/0'/2'"), TPUB).unwrap();
        assert_eq!(origin.root_fp(), XpubFp::master());

        let fp = XpubFp::from_hex_str("0f056943").unwrap();
        let origin =
            parse_extended_public_key(&request("m/48'/1'/0'/2'").with_root_fp(fp), TPUB).unwrap();
        assert_eq!(origin.root_fp(), fp);

        assert!(matches!(
            parse_extended_public_key(&request("m/48'/1'"), TPUB),
            Err(InteractionError::DepthMismatch { .. })
        ));
        assert!(parse_extended_public_key(&request("m/48'/1'/0'/2'"), "tpub").is_err());
    }

    #[test]
    fn master_key() {
        let xpub = Xpub::from_str(MASTER).unwrap();
        let request = XpubRequest::new(DerivationPath::new(), Network::Mainnet);
        let origin = parse_extended_public_key(&request, MASTER).unwrap();
        assert_eq!(origin.root_fp(), xpub.fingerprint());

        let wrong = request.with_root_fp(XpubFp::from_hex_str("deadbeef").unwrap());
        assert!(matches!(
            parse_extended_public_key(&wrong, MASTER),
            Err(InteractionError::FingerprintMismatch { .. })
        ));
        let testnet = XpubRequest::new(DerivationPath::new(), Network::Testnet);
        assert!(parse_extended_public_key(&testnet, MASTER).is_err());
    }

    #[test]
    fn export() {
        let config = MultisigWalletConfig::new(
            "Manual",
            Network::Testnet,
            AddressType::P2wsh,
            1,
            vec![ExtendedPublicKeyEntry::new(TPUB, "m/48'/1'/0'/2'").with_xfp("0f056943")],
        );
        let WalletConfigExport::Json(json) = export_wallet_config(&config).unwrap() else {
            panic!("custom keystore exports json")
        };
        assert_eq!(MultisigWalletConfig::from_json(&json).unwrap(), config);

        let mut broken = config;
        broken.quorum.required_signers = 2;
        assert!(export_wallet_config(&broken).is_err());
    }
}
