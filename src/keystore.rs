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

use crate::interaction::Handlers;
use crate::{coldcard, custom, ledger};

/// Keystore kinds a multisig coordinator interacts with.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "lowercase")]
#[display(lowercase)]
pub enum Keystore {
    /// Coldcard, air-gapped via SD card files.
    Coldcard,
    /// Ledger, connected over USB.
    Ledger,
    /// Trezor, connected over USB through the bridge.
    Trezor,
    /// Hermit, air-gapped via QR codes.
    Hermit,
    /// Keys and signatures entered by hand.
    Custom,
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("unknown keystore '{0}'")]
pub struct UnknownKeystore(pub String);

impl FromStr for Keystore {
    type Err = UnknownKeystore;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Keystore::ALL
            .into_iter()
            .find(|keystore| keystore.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKeystore(s.to_owned()))
    }
}

/// Way the coordinator exchanges data with a keystore.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "lowercase")]
#[display(lowercase)]
pub enum Transport {
    Usb,
    File,
    Qr,
    Manual,
}

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "camelCase")]
pub enum Operation {
    #[display("get metadata")]
    GetMetadata,
    #[display("export public key")]
    ExportPublicKey,
    #[display("export extended public key")]
    ExportExtendedPublicKey,
    #[display("sign multisig transaction")]
    SignMultisigTransaction,
    #[display("confirm multisig address")]
    ConfirmMultisigAddress,
    #[display("register wallet policy")]
    RegisterWalletPolicy,
    #[display("export wallet config")]
    ExportWalletConfig,
}

/// Static description of keystore capabilities.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
#[serde(crate = "serde_crate", rename_all = "camelCase")]
pub struct KeystoreMetadata {
    pub keystore: Keystore,
    pub transport: Transport,
    pub operations: &'static [Operation],
}

impl KeystoreMetadata {
    pub fn supports(&self, operation: Operation) -> bool { self.operations.contains(&operation) }
}

const COLDCARD_OPS: &[Operation] = &[
    Operation::ExportExtendedPublicKey,
    Operation::SignMultisigTransaction,
    Operation::ExportWalletConfig,
];
const LEDGER_OPS: &[Operation] = &[
    Operation::GetMetadata,
    Operation::ExportPublicKey,
    Operation::ExportExtendedPublicKey,
    Operation::SignMultisigTransaction,
    Operation::ConfirmMultisigAddress,
    Operation::RegisterWalletPolicy,
    Operation::ExportWalletConfig,
];
const TREZOR_OPS: &[Operation] = &[
    Operation::GetMetadata,
    Operation::ExportPublicKey,
    Operation::ExportExtendedPublicKey,
    Operation::SignMultisigTransaction,
    Operation::ConfirmMultisigAddress,
];
const HERMIT_OPS: &[Operation] =
    &[Operation::ExportExtendedPublicKey, Operation::SignMultisigTransaction];
const CUSTOM_OPS: &[Operation] = &[
    Operation::ExportPublicKey,
    Operation::ExportExtendedPublicKey,
    Operation::SignMultisigTransaction,
    Operation::ExportWalletConfig,
];

const COLDCARD_HANDLERS: Handlers = Handlers {
    export_wallet_config: Some(coldcard::export_wallet_config),
    parse_extended_public_key: Some(coldcard::parse_extended_public_key),
    verify_registration: None,
};
const LEDGER_HANDLERS: Handlers = Handlers {
    export_wallet_config: Some(ledger::export_wallet_config),
    parse_extended_public_key: Some(custom::parse_extended_public_key),
    verify_registration: Some(ledger::verify_registration),
};
const TREZOR_HANDLERS: Handlers = Handlers {
    export_wallet_config: None,
    parse_extended_public_key: Some(custom::parse_extended_public_key),
    verify_registration: None,
};
const HERMIT_HANDLERS: Handlers = TREZOR_HANDLERS;
const CUSTOM_HANDLERS: Handlers = Handlers {
    export_wallet_config: Some(custom::export_wallet_config),
    parse_extended_public_key: Some(custom::parse_extended_public_key),
    verify_registration: None,
};

impl Keystore {
    pub const ALL: [Keystore; 5] =
        [Keystore::Coldcard, Keystore::Ledger, Keystore::Trezor, Keystore::Hermit, Keystore::Custom];

    pub fn metadata(self) -> KeystoreMetadata {
        let (transport, operations) = match self {
            Keystore::Coldcard => (Transport::File, COLDCARD_OPS),
            Keystore::Ledger => (Transport::Usb, LEDGER_OPS),
            Keystore::Trezor => (Transport::Usb, TREZOR_OPS),
            Keystore::Hermit => (Transport::Qr, HERMIT_OPS),
            Keystore::Custom => (Transport::Manual, CUSTOM_OPS),
        };
        KeystoreMetadata {
            keystore: self,
            transport,
            operations,
        }
    }

    #[inline]
    pub fn supports(self, operation: Operation) -> bool { self.metadata().supports(operation) }

    /// Transport-free operation handlers of the keystore.
    pub fn handlers(self) -> &'static Handlers {
        match self {
            Keystore::Coldcard => &COLDCARD_HANDLERS,
            Keystore::Ledger => &LEDGER_HANDLERS,
            Keystore::Trezor => &TREZOR_HANDLERS,
            Keystore::Hermit => &HERMIT_HANDLERS,
            Keystore::Custom => &CUSTOM_HANDLERS,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names() {
        for keystore in Keystore::ALL {
            assert_eq!(Keystore::from_str(&keystore.to_string()).unwrap(), keystore);
        }
        assert_eq!(Keystore::from_str("Coldcard").unwrap(), Keystore::Coldcard);
        assert_eq!(Keystore::Hermit.to_string(), "hermit");
        assert!(Keystore::from_str("jade").is_err());
        assert_eq!(serde_json::to_string(&Keystore::Ledger).unwrap(), r#""ledger""#);
    }

    #[test]
    fn handlers_match_metadata() {
        for keystore in Keystore::ALL {
            let handlers = keystore.handlers();
            assert_eq!(
                handlers.export_wallet_config.is_some(),
                keystore.supports(Operation::ExportWalletConfig),
                "{keystore}"
            );
            assert_eq!(
                handlers.parse_extended_public_key.is_some(),
                keystore.supports(Operation::ExportExtendedPublicKey),
                "{keystore}"
            );
            assert_eq!(
                handlers.verify_registration.is_some(),
                keystore.supports(Operation::RegisterWalletPolicy),
                "{keystore}"
            );
        }
    }

    #[test]
    fn transports() {
        assert_eq!(Keystore::Coldcard.metadata().transport, Transport::File);
        assert_eq!(Keystore::Hermit.metadata().transport, Transport::Qr);
        assert_eq!(Keystore::Custom.metadata().transport, Transport::Manual);
        assert!(!Keystore::Trezor.supports(Operation::RegisterWalletPolicy));
        assert!(Keystore::Ledger.supports(Operation::RegisterWalletPolicy));
    }
}
