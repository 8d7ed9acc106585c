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

/// Bitcoin network a wallet operates on.
///
/// Extended keys carry only a mainnet/testnet distinction in their version
/// bytes, so regtest and signet keys use testnet versions.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
#[display(lowercase)]
pub enum Network {
    /// Bitcoin mainnet
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "bitcoin", alias = "main"))]
    Mainnet,

    /// Bitcoin testnet
    #[cfg_attr(feature = "serde", serde(alias = "testnet3", alias = "test"))]
    Testnet,

    /// Bitcoin regtest networks
    Regtest,

    /// Bitcoin signet
    Signet,
}

impl Network {
    /// Detects whether the network is a kind of test network (testnet, signet,
    /// regtest).
    pub fn is_testnet(self) -> bool { self != Self::Mainnet }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("unknown bitcoin network '{0}'")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "bitcoin" | "mainnet" | "main" => Network::Mainnet,
            "testnet" | "testnet3" | "test" => Network::Testnet,
            "regtest" => Network::Regtest,
            "signet" => Network::Signet,
            _ => return Err(UnknownNetwork(s.to_owned())),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(Network::from_str("bitcoin").unwrap(), Network::Mainnet);
        assert_eq!(Network::from_str("Mainnet").unwrap(), Network::Mainnet);
        assert_eq!(Network::from_str("testnet").unwrap(), Network::Testnet);
        assert_eq!(Network::Regtest.to_string(), "regtest");
        assert!(Network::Signet.is_testnet());
        assert!(!Network::Mainnet.is_testnet());
        assert_eq!(Network::from_str("litecoin"), Err(UnknownNetwork(s!("litecoin"))));
    }
}
