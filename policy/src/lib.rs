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


//! Multisig wallet policy engine.
//!
//! Converts multisig wallet configurations into policy templates like
//! `wsh(sortedmulti(2,@0/**,@1/**))` accompanied by the ordered list of key
//! origins, validates templates against the supported script grammar and
//! produces wallet policies in the form hardware signers register them.

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate serde_crate as serde;
#[macro_use]
extern crate log;

pub mod lexer;
pub mod parser;
mod template;
mod rules;
mod error;
mod config;
mod braid;
mod deriver;
mod wallet;
mod ledger;

pub use braid::{braid_details_to_wallet_config, BraidDetails, BraidKey};
pub use config::{AddressType, Client, ExtendedPublicKeyEntry, MultisigWalletConfig, Quorum};
pub use deriver::{
    derive_key_origins, derive_key_origins_with, derive_template, masked_derivation,
    sortedmulti_template,
};
pub use error::PolicyError;
pub use ledger::{LedgerWalletPolicy, PolicyId, WALLET_POLICY_V2};
pub use rules::{PolicyRules, MAX_NAME_LEN, UNKNOWN_MARKER};
pub use template::{
    count_key_placeholders, extract_required_signers, validate, validate_key_count,
    validate_script_type, validate_script_type_with, validate_with, PolicyTemplate,
    ScriptWrapper, TemplateError,
};
pub use wallet::MultisigWalletPolicy;
