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

use derive::KeyOrigin;

use crate::{
    derive_key_origins_with, derive_template, validate_with, LedgerWalletPolicy,
    MultisigWalletConfig, PolicyError, PolicyRules, PolicyTemplate, ScriptWrapper,
};

/// Multisig wallet policy: a validated template with positional key
/// placeholders and the key origins they refer to.
///
/// Two policies built from the same keys listed in a different order have the
/// same [`MultisigWalletPolicy::key_set`]; use
/// [`MultisigWalletPolicy::is_equivalent`] to compare wallets rather than `==`.
#[derive(Getters, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MultisigWalletPolicy {
    name: String,
    template: PolicyTemplate,
    key_origins: Vec<KeyOrigin>,
}

impl MultisigWalletPolicy {
    pub fn new(
        name: &str,
        template: &str,
        key_origins: Vec<KeyOrigin>,
    ) -> Result<Self, PolicyError> {
        Self::with_rules(name, template, key_origins, &PolicyRules::default())
    }

    pub fn with_rules(
        name: &str,
        template: &str,
        key_origins: Vec<KeyOrigin>,
        rules: &PolicyRules,
    ) -> Result<Self, PolicyError> {
        let template = validate_with(template, rules)?;
        if template.key_count() as usize != key_origins.len() {
            return Err(PolicyError::KeyOriginCountMismatch {
                placeholders: template.key_count() as usize,
                origins: key_origins.len(),
            });
        }
        let (fitted, truncated) = rules.fit_name(name);
        if truncated {
            warn!(
                "wallet policy name '{}' exceeds {} characters and is truncated to '{fitted}'",
                name.trim(),
                rules.max_name_len
            );
        }
        Ok(MultisigWalletPolicy {
            name: fitted,
            template,
            key_origins,
        })
    }

    /// Constructs policy from the wallet configuration file.
    ///
    /// The policy is named after the configuration uuid, falling back to the
    /// configuration name.
    pub fn from_wallet_config(config: &MultisigWalletConfig) -> Result<Self, PolicyError> {
        Self::from_wallet_config_with(config, &PolicyRules::default())
    }

    pub fn from_wallet_config_with(
        config: &MultisigWalletConfig,
        rules: &PolicyRules,
    ) -> Result<Self, PolicyError> {
        let name = config.wallet_name().ok_or(PolicyError::MissingName)?;
        config.validate()?;
        let template = derive_template(config);
        let key_origins = derive_key_origins_with(config, rules)?;
        debug!("wallet '{name}' uses policy template {template}");
        Self::with_rules(name, &template, key_origins, rules)
    }

    /// Key origins rendered as `[fingerprint/path]xpub`, in placeholder order.
    pub fn keys(&self) -> Vec<String> { self.key_origins.iter().map(KeyOrigin::to_string).collect() }

    /// Order-independent view of the policy keys.
    pub fn key_set(&self) -> BTreeSet<String> {
        self.key_origins.iter().map(KeyOrigin::to_string).collect()
    }

    /// Detects whether both policies use the same keys under the same template.
    pub fn is_equivalent(&self, other: &MultisigWalletPolicy) -> bool {
        self.template == other.template && self.key_set() == other.key_set()
    }

    #[inline]
    pub fn required_signers(&self) -> u16 { self.template.required_signers() }

    #[inline]
    pub fn total_signers(&self) -> u16 { self.template.key_count() }

    #[inline]
    pub fn script_wrapper(&self) -> ScriptWrapper { self.template.wrapper() }

    /// Converts into the policy a Ledger signer registers.
    pub fn to_ledger_policy(&self) -> LedgerWalletPolicy {
        LedgerWalletPolicy::new(self.name.clone(), self.template.to_string(), self.keys())
    }
}
