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


use policy::{MultisigWalletConfig, MultisigWalletPolicy, PolicyId};

use crate::interaction::{InteractionError, WalletConfigExport};

/// Translates wallet configuration into the policy a Ledger signer registers.
pub fn export_wallet_config(
    config: &MultisigWalletConfig,
) -> Result<WalletConfigExport, InteractionError> {
    let policy = MultisigWalletPolicy::from_wallet_config(config)?;
    Ok(WalletConfigExport::LedgerPolicy(policy.to_ledger_policy()))
}

/// Checks that the signer registered exactly the policy built from the
/// configuration.
pub fn verify_registration(
    config: &MultisigWalletConfig,
    policy_id: PolicyId,
) -> Result<PolicyId, InteractionError> {
    let policy = MultisigWalletPolicy::from_wallet_config(config)?.to_ledger_policy();
    let expected = policy.id()?;
    if expected != policy_id {
        error!(
            "ledger registered wallet policy {policy_id} for '{}' while {expected} was expected",
            policy.name
        );
        return Err(InteractionError::RegistrationMismatch {
            expected,
            actual: policy_id,
        });
    }
    debug!("ledger registration of '{}' verified as {policy_id}", policy.name);
    Ok(policy_id)
}
