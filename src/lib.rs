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


//! Keystore adapters of a multisig wallet coordinator.
//!
//! Every supported keystore declares the operations it is able to perform;
//! operations which need no device transport (translating the wallet
//! configuration into the keystore format, parsing exported extended public
//! keys, verifying wallet policy registrations) are implemented here and
//! reachable through [`dispatch`].

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate serde_crate as serde;
#[macro_use]
extern crate log;

mod keystore;
mod interaction;
pub mod coldcard;
pub mod custom;
pub mod ledger;

pub use derive;
pub use derive::{DerivationPath, KeyOrigin, Network, Xpub, XpubFp};
pub use interaction::{
    dispatch, ExportWalletConfigFn, Handlers, InteractionError, ParseExtendedPublicKeyFn,
    Request, Response, VerifyRegistrationFn, WalletConfigExport, XpubRequest,
};
pub use keystore::{Keystore, KeystoreMetadata, Operation, Transport, UnknownKeystore};
pub use policy;
pub use policy::{
    AddressType, LedgerWalletPolicy, MultisigWalletConfig, MultisigWalletPolicy, PolicyError,
    PolicyId, PolicyTemplate,
};
