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


//! Coldcard exchanges data through files on an SD card: it exports account
//! extended public keys as JSON and imports multisig wallets from a plain-text
//! setup file.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use derive::{parse_fingerprint, DerivationPath, KeyOrigin, Xpub};
use policy::{AddressType, MultisigWalletConfig, MultisigWalletPolicy};

use crate::interaction::{InteractionError, WalletConfigExport, XpubRequest};
use crate::Keystore;

/// Maximal length of a wallet name Coldcard accepts.
pub const COLDCARD_NAME_LEN: usize = 20;

/// Multisig account keys exported by Coldcard.
#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
#[serde(crate = "serde_crate")]
pub struct ColdcardXpubExport {
    pub xfp: String,
    #[serde(default)]
    pub p2sh_deriv: Option<String>,
    #[serde(default)]
    pub p2sh: Option<String>,
    #[serde(default, alias = "p2wsh_p2sh_deriv")]
    pub p2sh_p2wsh_deriv: Option<String>,
    #[serde(default, alias = "p2wsh_p2sh")]
    pub p2sh_p2wsh: Option<String>,
    #[serde(default)]
    pub p2wsh_deriv: Option<String>,
    #[serde(default)]
    pub p2wsh: Option<String>,
}

impl ColdcardXpubExport {
    pub fn from_json(json: &str) -> Result<Self, InteractionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Account derivation paths with the extended public keys at them.
    pub fn accounts(&self) -> impl Iterator<Item = (&str, &str)> {
        [
            (&self.p2sh_deriv, &self.p2sh),
            (&self.p2sh_p2wsh_deriv, &self.p2sh_p2wsh),
            (&self.p2wsh_deriv, &self.p2wsh),
        ]
        .into_iter()
        .filter_map(|(deriv, xpub)| Some((deriv.as_deref()?, xpub.as_deref()?)))
    }

    /// Finds the deepest exported account the path descends from and derives
    /// the key at the path from it.
    pub fn key_origin(&self, request: &XpubRequest) -> Result<KeyOrigin, InteractionError> {
        let root_fp = parse_fingerprint(&self.xfp)?;
        if let Some(expected) = request.root_fp {
            if expected != root_fp {
                return Err(InteractionError::FingerprintMismatch {
                    expected,
                    actual: root_fp,
                });
            }
        }

        let path = &request.bip32_path;
        let mut account = None::<(DerivationPath, &str)>;
        for (deriv, xpub) in self.accounts() {
            let deriv = DerivationPath::from_str(deriv)?;
            let deeper = account.as_ref().map(|(best, _)| deriv.depth() > best.depth()).unwrap_or(true);
            if deeper && path.strip_prefix(&deriv).is_some() {
                account = Some((deriv, xpub));
            }
        }
        let (deriv, xpub) =
            account.ok_or_else(|| InteractionError::NoMatchingAccount(path.to_master_string()))?;

        let xpub = Xpub::from_str(xpub)?;
        if xpub.depth() as usize != deriv.depth() {
            return Err(InteractionError::DepthMismatch {
                depth: xpub.depth(),
                path_len: deriv.depth(),
            });
        }
        let rest = path.strip_prefix(&deriv).unwrap_or_default();
        let rest = DerivationPath::from(rest)
            .to_normal()
            .ok_or_else(|| InteractionError::HardenedDerivation(path.to_master_string()))?;
        debug!("deriving {} from coldcard account {}", path.to_master_string(), deriv.to_master_string());

        Ok(KeyOrigin::new(root_fp, path.clone(), xpub.derive_pub(rest), request.network)?)
    }
}

/// Parses Coldcard multisig xpub export and returns the key at the requested
/// path.
pub fn parse_extended_public_key(
    request: &XpubRequest,
    payload: &str,
) -> Result<KeyOrigin, InteractionError> {
    ColdcardXpubExport::from_json(payload)?.key_origin(request)
}

fn coldcard_format(address_type: AddressType) -> Result<&'static str, InteractionError> {
    match address_type {
        AddressType::P2sh => Ok("P2SH"),
        AddressType::P2wsh => Ok("P2WSH"),
        AddressType::P2shP2wsh => Ok("P2SH-P2WSH"),
        AddressType::P2tr => Err(InteractionError::UnsupportedAddressType {
            keystore: Keystore::Coldcard,
            address_type,
        }),
    }
}

/// Shortens the wallet name to what Coldcard displays.
pub fn coldcard_name(name: &str) -> String {
    let name = name.trim();
    if name.chars().count() <= COLDCARD_NAME_LEN {
        return name.to_owned();
    }
    let short = name.chars().take(COLDCARD_NAME_LEN).collect::<String>().trim_end().to_owned();
    warn!("wallet name '{name}' is truncated to '{short}' for coldcard");
    short
}

/// Multisig setup file Coldcard imports.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ColdcardSetup<'policy> {
    name: String,
    format: &'static str,
    policy: &'policy MultisigWalletPolicy,
}

impl<'policy> ColdcardSetup<'policy> {
    pub fn new(
        policy: &'policy MultisigWalletPolicy,
        address_type: AddressType,
    ) -> Result<Self, InteractionError> {
        Ok(ColdcardSetup {
            name: coldcard_name(policy.name()),
            format: coldcard_format(address_type)?,
            policy,
        })
    }
}

impl Display for ColdcardSetup<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Coldcard multisig setup file")?;
        writeln!(f, "#")?;
        writeln!(f, "Name: {}", self.name)?;
        let (required, total) = (self.policy.required_signers(), self.policy.total_signers());
        writeln!(f, "Policy: {required} of {total}")?;
        writeln!(f, "Format: {}", self.format)?;
        for origin in self.policy.key_origins() {
            writeln!(f)?;
            writeln!(f, "Derivation: {}", origin.derivation().to_master_string())?;
            let xfp = origin.root_fp().to_string().to_uppercase();
            writeln!(f, "{xfp}: {}", origin.xpub())?;
        }
        Ok(())
    }
}

pub fn export_wallet_config(
    config: &MultisigWalletConfig,
) -> Result<WalletConfigExport, InteractionError> {
    let policy = MultisigWalletPolicy::from_wallet_config(config)?;
    let setup = ColdcardSetup::new(&policy, config.address_type)?;
    Ok(WalletConfigExport::ColdcardSetup(setup.to_string()))
}
