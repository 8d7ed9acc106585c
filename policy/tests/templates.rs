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


use policy::{validate, validate_script_type, ScriptWrapper, TemplateError};

fn assert_invalid(template: &str) {
    assert!(validate(template).is_err(), "template {template} must be rejected");
}

/// Case: wrappers other than sh, wsh and sh(wsh) are rejected.
#[test]
fn unsupported_wrappers() {
    for template in ["pkh(@0/**)", "tr(@0/**)", "foobar(@0/**)"] {
        assert_eq!(
            validate(template),
            Err(TemplateError::UnsupportedScriptType(template.to_owned()))
        );
    }
}

/// Case: quorum larger than the number of keys.
#[test]
fn quorum_exceeds_keys() {
    assert_eq!(
        validate("wsh(3,@0/**,@1/**)"),
        Err(TemplateError::QuorumExceedsKeys { required: 3, keys: 2 })
    );
}

/// Case: no quorum before the key placeholders.
#[test]
fn missing_quorum() {
    assert_eq!(validate("sh(@0/**)"), Err(TemplateError::MissingQuorum(s("sh(@0/**)"))));
}

/// Case: no key placeholders at all.
#[test]
fn no_keys() {
    assert!(matches!(validate("wsh()"), Err(TemplateError::MalformedTemplate { .. })));
}

#[test]
fn rejected() {
    for template in [
        "pkh(@0/**)",
        "tr(@0/**)",
        "foobar(@0/**)",
        "wsh(3,@0/**,@1/**)",
        "sh(@0/**)",
        "wsh()",
        "",
        "wsh(sortedmulti(0,@0/**))",
        "wsh(sortedmulti(2,@0/**,@1/**)",
    ] {
        assert_invalid(template);
    }
}

#[test]
fn accepted() {
    let cases = [
        ("wsh(2,@0/**,@1/**)", ScriptWrapper::Wsh, 2, 2),
        ("sh(2,@0/**,@1/**)", ScriptWrapper::Sh, 2, 2),
        ("sh(2,@0/**,@1/**,@2/**)", ScriptWrapper::Sh, 2, 3),
        ("sh(wsh(sortedmulti(1,@0/**,@1/**)))", ScriptWrapper::ShWsh, 1, 2),
        ("wsh(sortedmulti(3,@0/**,@1/**,@2/**))", ScriptWrapper::Wsh, 3, 3),
    ];
    for (template, wrapper, required, keys) in cases {
        let parsed = validate(template).unwrap();
        assert_eq!(parsed.wrapper(), wrapper);
        assert_eq!(parsed.required_signers(), required);
        assert_eq!(parsed.key_count(), keys);
        assert_eq!(validate_script_type(template), Ok(wrapper));
    }
}

fn s(s: &str) -> String { s.to_owned() }
