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

use derive::Network;

use crate::{AddressType, ExtendedPublicKeyEntry, MultisigWalletConfig, PolicyError, Quorum};

#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "camelCase")]
pub struct BraidKey {
    pub base58_string: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_fingerprint: Option<String>,
}

/// Description of a multisig address braid: the keys, script type and quorum
/// a coordinator uses to derive wallet addresses.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "camelCase")]
pub struct BraidDetails {
    pub network: Network,
    /// Kept as a string so unknown types are reported on conversion.
    pub address_type: String,
    pub extended_public_keys: Vec<BraidKey>,
    pub required_signers: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl BraidDetails {
    pub fn from_json(json: &str) -> Result<Self, PolicyError> { Ok(serde_json::from_str(json)?) }
}

/// Converts braid details into a wallet configuration.
///
/// Nameless braids are named like `2-of-3 P2WSH testnet wallet`.
pub fn braid_details_to_wallet_config(
    braid: &BraidDetails,
) -> Result<MultisigWalletConfig, PolicyError> {
    let address_type = AddressType::from_str(&braid.address_type)?;
    let total_signers = braid.extended_public_keys.len() as u16;
    let name = braid.name.clone().unwrap_or_else(|| {
        format!(
            "{}-of-{total_signers} {address_type} {} wallet",
            braid.required_signers, braid.network
        )
    });
    let extended_public_keys = braid
        .extended_public_keys
        .iter()
        .map(|key| ExtendedPublicKeyEntry {
            name: None,
            xpub: key.base58_string.clone(),
            bip32_path: key.path.clone(),
            xfp: key.root_fingerprint.clone(),
            method: None,
        })
        .collect();
    Ok(MultisigWalletConfig {
        name: Some(name),
        uuid: None,
        network: braid.network,
        address_type,
        quorum: Quorum {
            required_signers: braid.required_signers,
            total_signers,
        },
        extended_public_keys,
        client: None,
        starting_address_index: braid.index,
    })
}
