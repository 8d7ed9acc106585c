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


use derive::{
    DerivationParseError, DerivationPath, KeyOrigin, KeyOriginError, Network, XkeyParseError,
    XpubFp,
};
use policy::{AddressType, LedgerWalletPolicy, MultisigWalletConfig, PolicyError, PolicyId};

use crate::{Keystore, Operation};

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum InteractionError {
    /// {keystore} keystore does not support {operation} operation.
    Unsupported {
        keystore: Keystore,
        operation: Operation,
    },

    /// {keystore} keystore does not support {address_type} wallets.
    UnsupportedAddressType {
        keystore: Keystore,
        address_type: AddressType,
    },

    /// invalid keystore export data - {0}
    Json(String),

    /// keystore export has no account key from which {0} can be derived.
    NoMatchingAccount(String),

    /// extended public key has depth {depth} while its derivation path has {path_len} steps.
    DepthMismatch { depth: u8, path_len: usize },

    /// derivation path {0} requires hardened derivation below the exported account key.
    HardenedDerivation(String),

    /// keystore exported key at {exported} while {requested} was requested.
    PathMismatch { requested: String, exported: String },

    /// keystore reports root fingerprint {actual} while {expected} was requested.
    FingerprintMismatch { expected: XpubFp, actual: XpubFp },

    /// keystore registered wallet policy {actual} while {expected} was expected.
    RegistrationMismatch { expected: PolicyId, actual: PolicyId },

    #[display(inner)]
    #[from]
    Policy(PolicyError),

    #[display(inner)]
    #[from]
    #[from(DerivationParseError)]
    KeyOrigin(KeyOriginError),

    #[display(inner)]
    #[from]
    Xpub(XkeyParseError),
}

impl From<serde_json::Error> for InteractionError {
    fn from(err: serde_json::Error) -> Self { InteractionError::Json(err.to_string()) }
}

/// Request for the extended public key at a derivation path, together with
/// what the coordinator already knows about the signer.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct XpubRequest {
    pub bip32_path: DerivationPath,
    pub root_fp: Option<XpubFp>,
    pub network: Network,
}

impl XpubRequest {
    pub fn new(bip32_path: DerivationPath, network: Network) -> Self {
        XpubRequest {
            bip32_path,
            root_fp: None,
            network,
        }
    }

    pub fn with_root_fp(mut self, root_fp: XpubFp) -> Self {
        self.root_fp = Some(root_fp);
        self
    }
}

/// Wallet configuration in the form a keystore imports it.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WalletConfigExport {
    /// Coldcard multisig setup file.
    ColdcardSetup(String),
    /// Policy to register on a Ledger signer.
    LedgerPolicy(LedgerWalletPolicy),
    /// Wallet configuration JSON document.
    Json(String),
}

pub type ExportWalletConfigFn = fn(&MultisigWalletConfig) -> Result<WalletConfigExport, InteractionError>;
pub type ParseExtendedPublicKeyFn = fn(&XpubRequest, &str) -> Result<KeyOrigin, InteractionError>;
pub type VerifyRegistrationFn =
    fn(&MultisigWalletConfig, PolicyId) -> Result<PolicyId, InteractionError>;

/// Operations a keystore performs without a device transport. Missing
/// handlers mark unsupported operations.
#[derive(Copy, Clone)]
pub struct Handlers {
    pub export_wallet_config: Option<ExportWalletConfigFn>,
    pub parse_extended_public_key: Option<ParseExtendedPublicKeyFn>,
    pub verify_registration: Option<VerifyRegistrationFn>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Request {
    /// Translate wallet configuration into the keystore format.
    ExportWalletConfig(MultisigWalletConfig),

    /// Parse extended public key the keystore exported.
    ParseExtendedPublicKey { request: XpubRequest, payload: String },

    /// Check the policy id the keystore returned after registering a wallet.
    VerifyRegistration {
        config: MultisigWalletConfig,
        policy_id: PolicyId,
    },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::ExportWalletConfig(_) => Operation::ExportWalletConfig,
            Request::ParseExtendedPublicKey { .. } => Operation::ExportExtendedPublicKey,
            Request::VerifyRegistration { .. } => Operation::RegisterWalletPolicy,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Response {
    WalletConfig(WalletConfigExport),
    ExtendedPublicKey(KeyOrigin),
    Registered(PolicyId),
}

/// Runs the request with the handler of the given keystore.
pub fn dispatch(keystore: Keystore, request: Request) -> Result<Response, InteractionError> {
    let operation = request.operation();
    debug!("dispatching {operation} to {keystore} keystore");
    let unsupported = InteractionError::Unsupported {
        keystore,
        operation,
    };
    let handlers = keystore.handlers();
    match request {
        Request::ExportWalletConfig(config) => {
            let handler = handlers.export_wallet_config.ok_or(unsupported)?;
            handler(&config).map(Response::WalletConfig)
        }
        Request::ParseExtendedPublicKey { request, payload } => {
            let handler = handlers.parse_extended_public_key.ok_or(unsupported)?;
            handler(&request, &payload).map(Response::ExtendedPublicKey)
        }
        Request::VerifyRegistration { config, policy_id } => {
            let handler = handlers.verify_registration.ok_or(unsupported)?;
            handler(&config, policy_id).map(Response::Registered)
        }
    }
}
