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


use derive::{KeyOriginError, XkeyParseError};

use crate::TemplateError;

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum PolicyError {
    #[display(inner)]
    #[from]
    Template(TemplateError),

    #[display(inner)]
    #[from]
    #[from(XkeyParseError)]
    KeyOrigin(KeyOriginError),

    /// policy template has {placeholders} key placeholders, but {origins} key origins are
    /// provided.
    KeyOriginCountMismatch { placeholders: usize, origins: usize },

    /// unknown address type '{0}'.
    UnknownAddressType(String),

    /// wallet configuration has neither uuid nor name.
    MissingName,

    /// wallet quorum {required} of {total} does not match {keys} extended public keys.
    InconsistentQuorum {
        required: u16,
        total: u16,
        keys: usize,
    },

    /// wallet policy name takes {0} bytes, while signers accept at most 255 bytes.
    NameTooLong(usize),

    /// invalid JSON document - {0}
    Json(String),
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self { PolicyError::Json(err.to_string()) }
}
