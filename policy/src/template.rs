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

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::lexer::{parse_template_str, TemplateToken};
use crate::parser::{ScriptExpr, TemplateAst};
use crate::PolicyRules;

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum TemplateError {
    /// policy template '{0}' uses unsupported script type.
    UnsupportedScriptType(String),

    /// policy template '{0}' does not specify the number of required signers.
    MissingQuorum(String),

    /// policy template requires {required} signatures out of {keys} keys.
    QuorumExceedsKeys { required: u32, keys: usize },

    /// malformed policy template '{template}' - {details}.
    MalformedTemplate { template: String, details: String },
}

impl TemplateError {
    fn malformed(template: &str, details: impl ToString) -> Self {
        TemplateError::MalformedTemplate {
            template: template.to_owned(),
            details: details.to_string(),
        }
    }
}

/// Outermost script expression of a multisig policy template.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
pub enum ScriptWrapper {
    /// Legacy P2SH.
    #[display("sh")]
    #[serde(rename = "sh")]
    Sh,

    /// Native segwit P2WSH.
    #[display("wsh")]
    #[serde(rename = "wsh")]
    Wsh,

    /// P2WSH nested in P2SH.
    #[display("sh(wsh)")]
    #[serde(rename = "sh(wsh)")]
    ShWsh,

    /// Taproot; recognized but not accepted by the default rules.
    #[display("tr")]
    #[serde(rename = "tr")]
    Tr,
}

impl FromStr for ScriptWrapper {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sh" => Ok(ScriptWrapper::Sh),
            "wsh" => Ok(ScriptWrapper::Wsh),
            "sh(wsh)" => Ok(ScriptWrapper::ShWsh),
            "tr" => Ok(ScriptWrapper::Tr),
            other => Err(TemplateError::UnsupportedScriptType(other.to_owned())),
        }
    }
}

impl ScriptWrapper {
    /// Detects the wrapper from the leading template tokens.
    pub fn detect(tokens: &[TemplateToken]) -> Option<ScriptWrapper> {
        let is_call = |pos: usize, name: &str| {
            tokens.get(pos).is_some_and(|token| token.is_ident(name))
                && matches!(tokens.get(pos + 1), Some(TemplateToken::OpeningParenthesis(_)))
        };
        if is_call(0, "sh") && is_call(2, "wsh") {
            Some(ScriptWrapper::ShWsh)
        } else if is_call(0, "sh") {
            Some(ScriptWrapper::Sh)
        } else if is_call(0, "wsh") {
            Some(ScriptWrapper::Wsh)
        } else if is_call(0, "tr") {
            Some(ScriptWrapper::Tr)
        } else {
            None
        }
    }

    /// Wraps script body into the wrapper expression(s).
    pub fn wrap(self, body: impl AsRef<str>) -> String {
        let body = body.as_ref();
        match self {
            ScriptWrapper::Sh => format!("sh({body})"),
            ScriptWrapper::Wsh => format!("wsh({body})"),
            ScriptWrapper::ShWsh => format!("sh(wsh({body}))"),
            ScriptWrapper::Tr => format!("tr({body})"),
        }
    }
}

/// Validated multisig policy template, like `wsh(sortedmulti(2,@0/**,@1/**))`.
///
/// Keys are referenced by positional `@<index>/**` placeholders; the number of
/// required signers is the first number preceding the placeholders.
#[derive(Getters, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display("{template}")]
pub struct PolicyTemplate {
    template: String,
    #[getter(as_copy)]
    wrapper: ScriptWrapper,
    #[getter(as_copy)]
    required_signers: u16,
    #[getter(as_copy)]
    key_count: u16,
}

impl PolicyTemplate {
    #[inline]
    pub fn as_str(&self) -> &str { &self.template }
}

impl FromStr for PolicyTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { validate(s) }
}

impl Serialize for PolicyTemplate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        serializer.serialize_str(&self.template)
    }
}

impl<'de> Deserialize<'de> for PolicyTemplate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        validate(&s).map_err(serde::de::Error::custom)
    }
}

/// Checks that the outermost expression uses a wrapper supported by the
/// default rules and returns it.
pub fn validate_script_type(template: &str) -> Result<ScriptWrapper, TemplateError> {
    validate_script_type_with(template, &PolicyRules::default())
}

pub fn validate_script_type_with(
    template: &str,
    rules: &PolicyRules,
) -> Result<ScriptWrapper, TemplateError> {
    let unsupported = || TemplateError::UnsupportedScriptType(template.to_owned());
    let tokens = parse_template_str(template).map_err(|_| unsupported())?;
    let wrapper = ScriptWrapper::detect(&tokens).ok_or_else(unsupported)?;
    if !rules.supports(wrapper) {
        return Err(unsupported());
    }
    Ok(wrapper)
}

fn parse(template: &str) -> Result<ScriptExpr<'_>, TemplateError> {
    ScriptExpr::parse(template).map_err(|err| TemplateError::malformed(template, err))
}

/// Counts `@<index>/**` key placeholders; fails if there are none or the
/// template can't be parsed.
pub fn count_key_placeholders(template: &str) -> Result<usize, TemplateError> {
    let expr = parse(template)?;
    let mut count = 0usize;
    expr.visit(|node| {
        if let TemplateAst::Key(..) = node {
            count += 1;
        }
    });
    if count == 0 {
        return Err(TemplateError::malformed(template, "no key placeholders"));
    }
    Ok(count)
}

/// Returns the first number appearing before the first key placeholder.
pub fn extract_required_signers(template: &str) -> Result<u32, TemplateError> {
    let expr = parse(template)?;
    let mut quorum = None;
    let mut seen_key = false;
    expr.visit(|node| match node {
        TemplateAst::Key(..) => seen_key = true,
        TemplateAst::Lit(lit, _)
            if !seen_key && quorum.is_none() && lit.bytes().all(|b| b.is_ascii_digit()) =>
        {
            quorum = Some(*lit)
        }
        _ => {}
    });
    let quorum = quorum.ok_or_else(|| TemplateError::MissingQuorum(template.to_owned()))?;
    quorum
        .parse()
        .map_err(|_| TemplateError::malformed(template, "number of required signers overflows"))
}

/// Checks that the template requires at least one and at most all of its keys
/// to sign.
pub fn validate_key_count(template: &str) -> Result<(), TemplateError> {
    let required = extract_required_signers(template)?;
    let keys = count_key_placeholders(template)?;
    check_quorum(required, keys)
}

fn check_quorum(required: u32, keys: usize) -> Result<(), TemplateError> {
    if required == 0 || required as usize > keys {
        return Err(TemplateError::QuorumExceedsKeys { required, keys });
    }
    Ok(())
}

/// Validates policy template against the default rules.
///
/// Checks script type, key placeholders, quorum presence and its consistency
/// with the number of keys, in that order, reporting the first failure.
pub fn validate(template: &str) -> Result<PolicyTemplate, TemplateError> {
    validate_with(template, &PolicyRules::default())
}

pub fn validate_with(template: &str, rules: &PolicyRules) -> Result<PolicyTemplate, TemplateError> {
    let wrapper = validate_script_type_with(template, rules)?;
    let keys = count_key_placeholders(template)?;
    let required = extract_required_signers(template)?;
    check_quorum(required, keys)?;
    let key_count = u16::try_from(keys)
        .map_err(|_| TemplateError::malformed(template, "too many key placeholders"))?;
    Ok(PolicyTemplate {
        template: template.to_owned(),
        wrapper,
        // never exceeds key count after the quorum check
        required_signers: required as u16,
        key_count,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn script_types() {
        assert_eq!(validate_script_type("sh(2,@0/**,@1/**)"), Ok(ScriptWrapper::Sh));
        assert_eq!(validate_script_type("wsh(sortedmulti(2,@0/**,@1/**))"), Ok(ScriptWrapper::Wsh));
        assert_eq!(
            validate_script_type("sh(wsh(sortedmulti(2,@0/**,@1/**)))"),
            Ok(ScriptWrapper::ShWsh)
        );
        for template in ["pkh(@0/**)", "tr(@0/**)", "foobar(@0/**)", "", "wsh", "(wsh(2,@0/**))"] {
            assert_eq!(
                validate_script_type(template),
                Err(TemplateError::UnsupportedScriptType(template.to_owned()))
            );
        }
    }

    #[test]
    fn taproot_enabled_by_rules() {
        let mut rules = PolicyRules::default();
        rules.supported_wrappers.insert(ScriptWrapper::Tr);
        let template = validate_with("tr(sortedmulti_a(2,@0/**,@1/**))", &rules).unwrap();
        assert_eq!(template.wrapper(), ScriptWrapper::Tr);
        assert_eq!(template.required_signers(), 2);
    }

    #[test]
    fn placeholders() {
        assert_eq!(count_key_placeholders("wsh(sortedmulti(2,@0/**,@1/**,@2/**))"), Ok(3));
        assert!(matches!(
            count_key_placeholders("wsh()"),
            Err(TemplateError::MalformedTemplate { .. })
        ));
        assert!(matches!(
            count_key_placeholders("wsh(sortedmulti(2,@0/**)"),
            Err(TemplateError::MalformedTemplate { .. })
        ));
    }

    #[test]
    fn quorum() {
        assert_eq!(extract_required_signers("wsh(sortedmulti(2,@0/**,@1/**))"), Ok(2));
        assert_eq!(extract_required_signers("sh(3,@0/**,@1/**)"), Ok(3));
        assert_eq!(
            extract_required_signers("sh(@0/**,2)"),
            Err(TemplateError::MissingQuorum(s!("sh(@0/**,2)")))
        );
        assert_eq!(
            validate_key_count("wsh(3,@0/**,@1/**)"),
            Err(TemplateError::QuorumExceedsKeys { required: 3, keys: 2 })
        );
        assert_eq!(
            validate_key_count("wsh(0,@0/**,@1/**)"),
            Err(TemplateError::QuorumExceedsKeys { required: 0, keys: 2 })
        );
        assert_eq!(validate_key_count("wsh(2,@0/**,@1/**)"), Ok(()));
    }

    #[test]
    fn validation_order() {
        // script type is checked before anything else
        assert!(matches!(validate("pkh()"), Err(TemplateError::UnsupportedScriptType(_))));
        // placeholders are checked before the quorum
        assert!(matches!(validate("wsh()"), Err(TemplateError::MalformedTemplate { .. })));
        assert!(matches!(validate("sh(@0/**)"), Err(TemplateError::MissingQuorum(_))));
        assert!(matches!(validate("wsh(3,@0/**,@1/**)"), Err(TemplateError::QuorumExceedsKeys {
            ..
        })));
    }

    #[test]
    fn valid() {
        let template = validate("sh(2,@0/**,@1/**,@2/**)").unwrap();
        assert_eq!(template.wrapper(), ScriptWrapper::Sh);
        assert_eq!(template.required_signers(), 2);
        assert_eq!(template.key_count(), 3);
        assert_eq!(template.to_string(), "sh(2,@0/**,@1/**,@2/**)");

        let n_of_n = PolicyTemplate::from_str("wsh(sortedmulti(2,@0/**,@1/**))").unwrap();
        assert_eq!(n_of_n.required_signers(), n_of_n.key_count());
    }

    #[test]
    fn serde_string() {
        let template = validate("wsh(sortedmulti(1,@0/**))").unwrap();
        let json = serde_json::to_string(&template).unwrap();
        assert_eq!(json, r#""wsh(sortedmulti(1,@0/**))""#);
        assert_eq!(serde_json::from_str::<PolicyTemplate>(&json).unwrap(), template);
        assert!(serde_json::from_str::<PolicyTemplate>(r#""pkh(@0/**)""#).is_err());
        assert_eq!(serde_json::to_string(&ScriptWrapper::ShWsh).unwrap(), r#""sh(wsh)""#);
    }
}
