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
use serde::{Deserialize, Deserializer};

use crate::{PolicyError, ScriptWrapper};

/// Output script type of the multisig wallet, as named in wallet configuration
/// files.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Serialize)]
#[serde(crate = "serde_crate")]
pub enum AddressType {
    #[display("P2SH")]
    #[serde(rename = "P2SH")]
    P2sh,

    #[display("P2WSH")]
    #[serde(rename = "P2WSH")]
    P2wsh,

    #[display("P2SH-P2WSH")]
    #[serde(rename = "P2SH-P2WSH")]
    P2shP2wsh,

    #[display("P2TR")]
    #[serde(rename = "P2TR")]
    P2tr,
}

impl AddressType {
    pub const ALL: [AddressType; 4] =
        [AddressType::P2sh, AddressType::P2wsh, AddressType::P2shP2wsh, AddressType::P2tr];

    pub fn script_wrapper(self) -> ScriptWrapper {
        match self {
            AddressType::P2sh => ScriptWrapper::Sh,
            AddressType::P2wsh => ScriptWrapper::Wsh,
            AddressType::P2shP2wsh => ScriptWrapper::ShWsh,
            AddressType::P2tr => ScriptWrapper::Tr,
        }
    }
}

impl FromStr for AddressType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().replace('_', "-").as_str() {
            "P2SH" => AddressType::P2sh,
            "P2WSH" => AddressType::P2wsh,
            "P2SH-P2WSH" | "P2WSH-P2SH" => AddressType::P2shP2wsh,
            "P2TR" => AddressType::P2tr,
            _ => return Err(PolicyError::UnknownAddressType(s.to_owned())),
        })
    }
}

impl<'de> Deserialize<'de> for AddressType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        AddressType::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "camelCase")]
#[display("{required_signers} of {total_signers}")]
pub struct Quorum {
    pub required_signers: u16,
    pub total_signers: u16,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "camelCase")]
pub struct ExtendedPublicKeyEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub xpub: String,

    /// Derivation path or `unknown`.
    #[serde(rename = "bip32Path")]
    pub bip32_path: String,

    /// Root fingerprint; `unknown` or absent when not known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xfp: Option<String>,

    /// Keystore the key was exported from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl ExtendedPublicKeyEntry {
    pub fn new(xpub: impl Into<String>, bip32_path: impl Into<String>) -> Self {
        ExtendedPublicKeyEntry {
            name: None,
            xpub: xpub.into(),
            bip32_path: bip32_path.into(),
            xfp: None,
            method: None,
        }
    }

    pub fn with_xfp(mut self, xfp: impl Into<String>) -> Self {
        self.xfp = Some(xfp.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Blockchain client the coordinator uses for the wallet.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Multisig wallet configuration file.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "camelCase")]
pub struct MultisigWalletConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    pub network: Network,

    pub address_type: AddressType,

    pub quorum: Quorum,

    pub extended_public_keys: Vec<ExtendedPublicKeyEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_address_index: Option<u32>,
}

impl MultisigWalletConfig {
    /// Constructs `required`-of-N configuration for the given keys.
    pub fn new(
        name: impl Into<String>,
        network: Network,
        address_type: AddressType,
        required_signers: u16,
        extended_public_keys: Vec<ExtendedPublicKeyEntry>,
    ) -> Self {
        MultisigWalletConfig {
            name: Some(name.into()),
            uuid: None,
            network,
            address_type,
            quorum: Quorum {
                required_signers,
                total_signers: extended_public_keys.len() as u16,
            },
            extended_public_keys,
            client: None,
            starting_address_index: None,
        }
    }

    /// Parses configuration file, reporting unknown address types as such
    /// instead of a generic JSON error.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(address_type) = value.get("addressType").and_then(serde_json::Value::as_str) {
            AddressType::from_str(address_type)?;
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self)
            .expect("wallet configuration contains only string-keyed plain data")
    }

    /// Name the wallet is registered under: the uuid, if present, otherwise
    /// the name.
    pub fn wallet_name(&self) -> Option<&str> {
        fn non_empty(s: &Option<String>) -> Option<&str> {
            s.as_deref().filter(|s| !s.trim().is_empty())
        }
        non_empty(&self.uuid).or_else(|| non_empty(&self.name))
    }

    /// Checks that the quorum matches the list of keys.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let Quorum {
            required_signers,
            total_signers,
        } = self.quorum;
        let keys = self.extended_public_keys.len();
        if total_signers as usize != keys || required_signers == 0 || required_signers > total_signers
        {
            return Err(PolicyError::InconsistentQuorum {
                required: required_signers,
                total: total_signers,
                keys,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CONFIG: &str = r#"{
        "name": "Family vault",
        "uuid": "a8f3c1e2",
        "network": "testnet",
        "addressType": "P2WSH",
        "quorum": { "requiredSigners": 2, "totalSigners": 2 },
        "extendedPublicKeys": [
            {
                "name": "Alice",
                "xpub": "tpubDFc9Mm4tw6EkgR4YTC1GrU6CGEd9yw7KSBnSssL4LXAXh89D4uMZigRyv3csdXbeU3BhLQc4vWKTLewboA1Pt8Fu6fbHKu81MZ6VGdc32eM",
                "bip32Path": "m/48'/1'/100'/2'",
                "xfp": "f57ec65d",
                "method": "coldcard"
            },
            {
                "name": "Bob",
                "xpub": "tpubDErWN5qfdLwYE94mh12oWr4uURDDNKCjKVhCEcAgZ7jKnnAwq5tcTF2iEk3VuznkJuk2G8SCHft9gS6aKbBd18ptYWPqKLRSTRQY7e2rrDj",
                "bip32Path": "Unknown"
            }
        ],
        "client": { "type": "public" },
        "startingAddressIndex": 0,
        "ledgerPolicyHmacs": []
    }"#;

    #[test]
    fn address_types() {
        for ty in AddressType::ALL {
            assert_eq!(AddressType::from_str(&ty.to_string()).unwrap(), ty);
        }
        assert_eq!(AddressType::from_str("P2WSH-P2SH").unwrap(), AddressType::P2shP2wsh);
        assert_eq!(AddressType::from_str("p2sh_p2wsh").unwrap(), AddressType::P2shP2wsh);
        assert_eq!(
            AddressType::from_str("P2PKH"),
            Err(PolicyError::UnknownAddressType(s!("P2PKH")))
        );
        assert_eq!(AddressType::P2shP2wsh.script_wrapper(), ScriptWrapper::ShWsh);
        assert_eq!(AddressType::P2shP2wsh.to_string(), "P2SH-P2WSH");
        assert_eq!(serde_json::to_string(&AddressType::P2shP2wsh).unwrap(), r#""P2SH-P2WSH""#);
        assert_eq!(
            serde_json::from_str::<AddressType>(r#""p2wsh-p2sh""#).unwrap(),
            AddressType::P2shP2wsh
        );
    }

    #[test]
    fn parse() {
        let config = MultisigWalletConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.address_type, AddressType::P2wsh);
        assert_eq!(config.quorum.to_string(), "2 of 2");
        assert_eq!(config.extended_public_keys[0].xfp.as_deref(), Some("f57ec65d"));
        assert_eq!(config.extended_public_keys[1].xfp, None);
        assert_eq!(config.client.as_ref().map(|c| c.ty.as_str()), Some("public"));
        assert_eq!(config.wallet_name(), Some("a8f3c1e2"));
        config.validate().unwrap();

        let reparsed = MultisigWalletConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn unknown_address_type() {
        let json = CONFIG.replace("\"P2WSH\"", "\"P2PKH\"");
        assert_eq!(
            MultisigWalletConfig::from_json(&json),
            Err(PolicyError::UnknownAddressType(s!("P2PKH")))
        );
        assert!(matches!(MultisigWalletConfig::from_json("{"), Err(PolicyError::Json(_))));
    }

    #[test]
    fn name_resolution() {
        let mut config = MultisigWalletConfig::from_json(CONFIG).unwrap();
        config.uuid = None;
        assert_eq!(config.wallet_name(), Some("Family vault"));
        config.uuid = Some(s!("  "));
        assert_eq!(config.wallet_name(), Some("Family vault"));
        config.name = Some(s!(" \t"));
        assert_eq!(config.wallet_name(), None);
        config.uuid = Some(s!("a8f3c1e2"));
        assert_eq!(config.wallet_name(), Some("a8f3c1e2"));
    }

    #[test]
    fn quorum_consistency() {
        let mut config = MultisigWalletConfig::from_json(CONFIG).unwrap();
        config.quorum.required_signers = 3;
        assert_eq!(
            config.validate(),
            Err(PolicyError::InconsistentQuorum {
                required: 3,
                total: 2,
                keys: 2
            })
        );
        config.quorum = Quorum {
            required_signers: 1,
            total_signers: 3,
        };
        assert!(config.validate().is_err());
        config.quorum.required_signers = 0;
        config.quorum.total_signers = 2;
        assert!(config.validate().is_err());
    }
}
