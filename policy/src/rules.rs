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


use std::collections::BTreeSet;

use derive::XpubFp;

use crate::ScriptWrapper;

/// Maximal length of the wallet policy name accepted by hardware signers.
pub const MAX_NAME_LEN: usize = 64;

/// Marker used by wallet configuration files in place of an unknown root
/// fingerprint or derivation path.
pub const UNKNOWN_MARKER: &str = "unknown";

/// Rules the template validator and the policy deriver operate with.
///
/// The [`Default`] value carries the rules matching the signers supported
/// today; coordinators may pass a different set explicitly to `*_with`
/// functions.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "camelCase", default)]
pub struct PolicyRules {
    /// Outermost script wrappers accepted in policy templates.
    pub supported_wrappers: BTreeSet<ScriptWrapper>,

    /// Maximal policy name length; longer names are truncated to
    /// `max_name_len - 3` characters followed by `...`.
    pub max_name_len: usize,

    /// Marker of an unknown root fingerprint or derivation path (matched
    /// case-insensitively).
    pub unknown_marker: String,

    /// Fingerprint used in place of missing or unknown root fingerprints.
    pub masked_fingerprint: XpubFp,
}

impl Default for PolicyRules {
    fn default() -> Self {
        PolicyRules {
            supported_wrappers: bset![ScriptWrapper::Sh, ScriptWrapper::Wsh, ScriptWrapper::ShWsh],
            max_name_len: MAX_NAME_LEN,
            unknown_marker: UNKNOWN_MARKER.to_owned(),
            masked_fingerprint: XpubFp::master(),
        }
    }
}

impl PolicyRules {
    #[inline]
    pub fn supports(&self, wrapper: ScriptWrapper) -> bool {
        self.supported_wrappers.contains(&wrapper)
    }

    /// Detects missing or unknown value marker.
    pub fn is_unknown(&self, value: Option<&str>) -> bool {
        match value.map(str::trim) {
            None | Some("") => true,
            Some(value) => value.eq_ignore_ascii_case(&self.unknown_marker),
        }
    }

    /// Trims the name and truncates it to [`PolicyRules::max_name_len`]
    /// characters. Returns the name and whether it was truncated.
    pub fn fit_name(&self, name: &str) -> (String, bool) {
        let name = name.trim();
        if name.chars().count() <= self.max_name_len {
            return (name.to_owned(), false);
        }
        let keep = self.max_name_len.saturating_sub(3);
        let mut fitted = name.chars().take(keep).collect::<String>();
        fitted.push_str("...");
        (fitted, true)
    }
}
