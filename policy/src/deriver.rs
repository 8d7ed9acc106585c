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

use derive::{parse_fingerprint, DerivationIndex, DerivationPath, KeyOrigin, Xpub};

use crate::{ExtendedPublicKeyEntry, MultisigWalletConfig, PolicyError, PolicyRules};

/// Script body of an m-of-n multisig with positional key placeholders.
pub fn sortedmulti_template(required_signers: u16, key_count: usize) -> String {
    let mut body = format!("sortedmulti({required_signers}");
    for index in 0..key_count {
        body.push_str(&format!(",@{index}/**"));
    }
    body.push(')');
    body
}

/// Derives policy template for the wallet configuration, like
/// `sh(wsh(sortedmulti(2,@0/**,@1/**,@2/**)))` for 2-of-3 P2SH-P2WSH wallet.
pub fn derive_template(config: &MultisigWalletConfig) -> String {
    let body =
        sortedmulti_template(config.quorum.required_signers, config.extended_public_keys.len());
    config.address_type.script_wrapper().wrap(body)
}

/// Derives key origins of the wallet keys in the order of the configuration.
pub fn derive_key_origins(config: &MultisigWalletConfig) -> Result<Vec<KeyOrigin>, PolicyError> {
    derive_key_origins_with(config, &PolicyRules::default())
}

pub fn derive_key_origins_with(
    config: &MultisigWalletConfig,
    rules: &PolicyRules,
) -> Result<Vec<KeyOrigin>, PolicyError> {
    config
        .extended_public_keys
        .iter()
        .map(|entry| derive_key_origin(entry, config, rules))
        .collect()
}

fn derive_key_origin(
    entry: &ExtendedPublicKeyEntry,
    config: &MultisigWalletConfig,
    rules: &PolicyRules,
) -> Result<KeyOrigin, PolicyError> {
    let xpub = Xpub::from_str(&entry.xpub)?.to_network(config.network);

    let derivation = if rules.is_unknown(Some(&entry.bip32_path)) {
        masked_derivation(&xpub)
    } else {
        DerivationPath::from_str(&entry.bip32_path).map_err(derive::KeyOriginError::from)?
    };
    let root_fp = match entry.xfp.as_deref() {
        xfp if rules.is_unknown(xfp) => rules.masked_fingerprint,
        Some(xfp) => parse_fingerprint(xfp)?,
        None => rules.masked_fingerprint,
    };

    let origin = KeyOrigin::new(root_fp, derivation, xpub, config.network)?;
    debug!("derived key origin {origin} for {}", entry.name.as_deref().unwrap_or("unnamed key"));
    Ok(origin)
}

/// Derivation path standing for an unknown one: as many unhardened zero steps
/// as the xpub depth, so that the path length still matches the key.
pub fn masked_derivation(xpub: &Xpub) -> DerivationPath {
    (0..xpub.depth()).map(|_| DerivationIndex::normal(0)).collect()
}
