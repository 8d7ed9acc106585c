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


use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::{DerivationParseError, DerivationPath, Network, XkeyParseError, Xpub, XpubFp};

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum KeyOriginError {
    /// invalid root fingerprint '{0}': exactly 8 hex characters are required.
    InvalidFingerprint(String),

    /// invalid derivation path - {0}
    #[from]
    InvalidPath(DerivationParseError),

    /// invalid extended public key - {0}
    #[from]
    InvalidXpub(XkeyParseError),

    /// extended public key version does not match {0} network.
    NetworkMismatch(Network),

    /// key origin must have form `[fingerprint/path]xpub`.
    InvalidFormat,
}

/// Parses root fingerprint given as eight hex characters in any case.
pub fn parse_fingerprint(s: &str) -> Result<XpubFp, KeyOriginError> {
    XpubFp::from_hex_str(s).map_err(|_| KeyOriginError::InvalidFingerprint(s.to_owned()))
}

/// Provenance of a single multisig key: the root fingerprint of the signer,
/// the derivation path from that root and the extended public key at the end
/// of the path.
///
/// Renders as `[<fingerprint><path>]<xpub>`, for instance
/// `[76223a6e/48'/1'/0'/2']tpub...`; the xpub always uses the canonical
/// `xpub`/`tpub` version of the origin network.
#[derive(Getters, Clone, Eq, PartialEq, Hash, Debug)]
pub struct KeyOrigin {
    #[getter(as_copy)]
    root_fp: XpubFp,
    derivation: DerivationPath,
    #[getter(as_copy)]
    xpub: Xpub,
    #[getter(as_copy)]
    network: Network,
}

impl KeyOrigin {
    pub fn new(
        root_fp: XpubFp,
        derivation: DerivationPath,
        xpub: Xpub,
        network: Network,
    ) -> Result<Self, KeyOriginError> {
        if xpub.is_testnet() != network.is_testnet() {
            return Err(KeyOriginError::NetworkMismatch(network));
        }
        Ok(KeyOrigin {
            root_fp,
            derivation,
            xpub,
            network,
        })
    }

    /// Constructs key origin from the raw string values found in wallet
    /// configurations and signer exports.
    ///
    /// Checks fingerprint and path syntax and that the xpub version belongs to
    /// `network`. Whether the path length matches the xpub depth is up to the
    /// caller.
    pub fn with_raw(
        root_fp: &str,
        bip32_path: &str,
        xpub: &str,
        network: Network,
    ) -> Result<Self, KeyOriginError> {
        let root_fp = parse_fingerprint(root_fp)?;
        let derivation = DerivationPath::from_str(bip32_path)?;
        let xpub = Xpub::from_str(xpub)?;
        KeyOrigin::new(root_fp, derivation, xpub, network)
    }

    /// Depth of the key according to its derivation path.
    #[inline]
    pub fn depth(&self) -> usize { self.derivation.len() }
}

impl Display for KeyOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}{}]{}", self.root_fp, self.derivation, self.xpub)
    }
}

impl FromStr for KeyOrigin {
    type Err = KeyOriginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (origin, xpub) = s
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.split_once(']'))
            .ok_or(KeyOriginError::InvalidFormat)?;
        let (root_fp, path) = match origin.split_once('/') {
            None => (origin, "m"),
            Some((fp, path)) => (fp, path),
        };
        let root_fp = parse_fingerprint(root_fp)?;
        let derivation = DerivationPath::from_str(path)?;
        let xpub = Xpub::from_str(xpub)?;
        let network = if xpub.is_testnet() { Network::Testnet } else { Network::Mainnet };
        KeyOrigin::new(root_fp, derivation, xpub, network)
    }
}

#[cfg(feature = "serde")]
mod _serde {
    use serde_crate::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::*;

    impl Serialize for KeyOrigin {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for KeyOrigin {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de> {
            let s = String::deserialize(deserializer)?;
            KeyOrigin::from_str(&s).map_err(|err| {
                de::Error::custom(format!("invalid key origin string representation; {err}"))
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TPUB: &str = "tpubDE6gymPRzwqqxVpMi2auPoFy8ZPcRsR3UW2a98YqEzKYifgnKx6uCzCjUesbXetdwYTKm52f8cfuqgr1p5c7WU7UQN3DihGyAsVErckn258";

    #[test]
    fn display() {
        let origin = KeyOrigin::with_raw("76223a6e", "m/48'/1'/0'/2'", TPUB, Network::Testnet)
            .unwrap();
        assert_eq!(origin.to_string(), format!("[76223a6e/48'/1'/0'/2']{TPUB}"));
        assert_eq!(origin.depth(), 4);

        let same = KeyOrigin::with_raw("76223A6E", "48h/1h/0h/2h", TPUB, Network::Regtest).unwrap();
        assert_eq!(same.to_string(), origin.to_string());
    }

    #[test]
    fn from_str() {
        let s = format!("[76223a6e/48'/1'/0'/2']{TPUB}");
        let origin = KeyOrigin::from_str(&s).unwrap();
        assert_eq!(origin.root_fp().to_string(), "76223a6e");
        assert_eq!(origin.network(), Network::Testnet);
        assert_eq!(origin.to_string(), s);

        let bare = KeyOrigin::from_str(&format!("[00000000]{TPUB}")).unwrap();
        assert!(bare.derivation().is_empty());
        assert_eq!(KeyOrigin::from_str(TPUB), Err(KeyOriginError::InvalidFormat));
    }

    #[test]
    fn validation() {
        assert!(matches!(
            KeyOrigin::with_raw("76223a6", "m/48'", TPUB, Network::Testnet),
            Err(KeyOriginError::InvalidFingerprint(_))
        ));
        assert!(matches!(
            KeyOrigin::with_raw("76223a6e", "m/48'/x", TPUB, Network::Testnet),
            Err(KeyOriginError::InvalidPath(_))
        ));
        assert!(matches!(
            KeyOrigin::with_raw("76223a6e", "m/48'", "tpubXXX", Network::Testnet),
            Err(KeyOriginError::InvalidXpub(_))
        ));
        assert_eq!(
            KeyOrigin::with_raw("76223a6e", "m/48'", TPUB, Network::Mainnet),
            Err(KeyOriginError::NetworkMismatch(Network::Mainnet))
        );
    }
}
