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


use amplify::{ByteArray, Bytes32, Wrapper};
use bitcoin_hashes::{sha256, Hash, HashEngine};

use crate::PolicyError;

/// Wallet policy version tag of the registration protocol.
pub const WALLET_POLICY_V2: u8 = 0x02;

/// Identifier of a wallet policy registered on a Ledger signer.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Debug, Display, From)]
#[wrapper(RangeOps, Hex, FromStr)]
#[display(LowerHex)]
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate", transparent)]
pub struct PolicyId(
    #[from]
    #[from([u8; 32])]
    Bytes32,
);

/// Wallet policy in the form a Ledger signer registers it.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "camelCase")]
pub struct LedgerWalletPolicy {
    pub name: String,
    pub template: String,
    pub keys: Vec<String>,
}

impl LedgerWalletPolicy {
    pub fn new(name: impl Into<String>, template: impl Into<String>, keys: Vec<String>) -> Self {
        LedgerWalletPolicy {
            name: name.into(),
            template: template.into(),
            keys,
        }
    }

    /// Serializes the policy the way the signer hashes it:
    /// version, name, template length and hash, key count and merkle root of
    /// the keys.
    pub fn serialize(&self) -> Result<Vec<u8>, PolicyError> {
        let name_len =
            u8::try_from(self.name.len()).map_err(|_| PolicyError::NameTooLong(self.name.len()))?;
        let mut data = Vec::with_capacity(1 + 1 + self.name.len() + 9 + 32 + 9 + 32);
        data.push(WALLET_POLICY_V2);
        data.push(name_len);
        data.extend_from_slice(self.name.as_bytes());
        write_varint(&mut data, self.template.len() as u64);
        data.extend_from_slice(&sha256::Hash::hash(self.template.as_bytes()).to_byte_array());
        write_varint(&mut data, self.keys.len() as u64);
        data.extend_from_slice(&self.keys_merkle_root()[..]);
        Ok(data)
    }

    /// Computes the policy identifier as returned by the signer after a
    /// successful registration.
    pub fn id(&self) -> Result<PolicyId, PolicyError> {
        let hash = sha256::Hash::hash(&self.serialize()?);
        Ok(PolicyId::from_byte_array(hash.to_byte_array()))
    }

    pub fn keys_merkle_root(&self) -> Bytes32 {
        let leaves = self
            .keys
            .iter()
            .map(|key| tagged_hash(0x00, &[key.as_bytes()]))
            .collect::<Vec<_>>();
        merkle_root(&leaves)
    }
}

fn tagged_hash(tag: u8, parts: &[&[u8]]) -> Bytes32 {
    let mut engine = sha256::Hash::engine();
    engine.input(&[tag]);
    for part in parts {
        engine.input(part);
    }
    Bytes32::from_byte_array(sha256::Hash::from_engine(engine).to_byte_array())
}

fn merkle_root(leaves: &[Bytes32]) -> Bytes32 {
    match leaves.len() {
        0 => Bytes32::zero(),
        1 => leaves[0],
        len => {
            let split = len.next_power_of_two() / 2;
            let left = merkle_root(&leaves[..split]);
            let right = merkle_root(&leaves[split..]);
            tagged_hash(0x01, &[&left[..], &right[..]])
        }
    }
}

fn write_varint(data: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xFC => data.push(n as u8),
        0xFD..=0xFFFF => {
            data.push(0xFD);
            data.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x10000..=0xFFFF_FFFF => {
            data.push(0xFE);
            data.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            data.push(0xFF);
            data.extend_from_slice(&n.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use amplify::hex::ToHex;

    use super::*;

    const K1: &str = "[f57ec65d/48'/1'/100'/2']tpubDFc9Mm4tw6EkgR4YTC1GrU6CGEd9yw7KSBnSssL4LXAXh89D4uMZigRyv3csdXbeU3BhLQc4vWKTLewboA1Pt8Fu6fbHKu81MZ6VGdc32eM";
    const K2: &str = "[efa5d916/48'/1'/100'/2']tpubDErWN5qfdLwYE94mh12oWr4uURDDNKCjKVhCEcAgZ7jKnnAwq5tcTF2iEk3VuznkJuk2G8SCHft9gS6aKbBd18ptYWPqKLRSTRQY7e2rrDj";

    fn policy() -> LedgerWalletPolicy {
        LedgerWalletPolicy::new("Cold storage", "wsh(sortedmulti(2,@0/**,@1/**))", vec![
            K1.to_owned(),
            K2.to_owned(),
        ])
    }

    #[test]
    fn serialization() {
        assert_eq!(
            policy().serialize().unwrap().to_hex(),
            "020c436f6c642073746f726167651fb56c3d5542fa09b3956834a9ff6a1df5c36a38e5b02c63c54b41a9\
             a04403b8260225b2740bdd318b19aab38c74b1022d0a791e22fe635657b99f1ecbcb0b977ec3"
        );
    }

    #[test]
    fn policy_id() {
        let id = policy().id().unwrap();
        assert_eq!(
            id,
            PolicyId::from_str("fcbcb1612aa6c6d596a9f7910ce7391c1c0f5ba403812b7cb562af4a88949a7f")
                .unwrap()
        );
        assert_eq!(id.to_string(), "fcbcb1612aa6c6d596a9f7910ce7391c1c0f5ba403812b7cb562af4a88949a7f");
    }

    #[test]
    fn merkle_tree_shapes() {
        let with_keys = |keys: &[&str]| {
            LedgerWalletPolicy::new("", "", keys.iter().map(|k| k.to_string()).collect())
                .keys_merkle_root()
        };
        assert_eq!(with_keys(&[]), Bytes32::zero());
        assert_eq!(
            with_keys(&[K1]).to_hex(),
            "bfdaed4b2d014d9f07b579aca23d1ba17efaf91113190bb676f30f87e6c500c7"
        );
        assert_eq!(
            with_keys(&["a", "b", "c"]).to_hex(),
            "36642e73c2540ab121e3a6bf9545b0a24982cd830eb13d3cd19de3ce6c021ec1"
        );
        assert_eq!(
            with_keys(&["a", "b", "c", "d", "e"]).to_hex(),
            "fe14a5426fbd70c0fa73f52342afed0da0bd23c4838662ccf6b88a3070ead97b"
        );
    }

    #[test]
    fn varints() {
        let mut data = vec![];
        write_varint(&mut data, 0xFC);
        write_varint(&mut data, 0xFD);
        write_varint(&mut data, 0x1_0000);
        assert_eq!(data, vec![0xFC, 0xFD, 0xFD, 0x00, 0xFE, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn long_name() {
        let policy = LedgerWalletPolicy::new("ж".repeat(128), "wsh(sortedmulti(1,@0/**))", vec![
            K1.to_owned(),
        ]);
        assert_eq!(policy.id(), Err(PolicyError::NameTooLong(256)));
    }
}
