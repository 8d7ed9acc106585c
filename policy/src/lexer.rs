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


#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum TemplateLexerError {
    /// unexpected character '{1}' at position {2} in the policy template '{0}'
    InvalidChar(String, char, usize),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum TemplateToken<'s> {
    #[display(inner)]
    Ident(&'s str, usize),

    #[display(inner)]
    Lit(&'s str, usize),

    #[display("(")]
    OpeningParenthesis(usize),

    #[display(")")]
    ClosingParenthesis(usize),

    #[display(",")]
    Comma(usize),
}

impl<'s> TemplateToken<'s> {
    pub fn pos(&self) -> usize {
        match self {
            TemplateToken::Ident(_, pos) => *pos,
            TemplateToken::Lit(_, pos) => *pos,
            TemplateToken::OpeningParenthesis(pos) => *pos,
            TemplateToken::ClosingParenthesis(pos) => *pos,
            TemplateToken::Comma(pos) => *pos,
        }
    }

    /// Detects identifier token with the given name.
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, TemplateToken::Ident(ident, _) if *ident == name)
    }
}

/// Splits policy template into tokens. Positions are byte offsets into the
/// template string.
pub fn parse_template_str(s: &str) -> Result<Vec<TemplateToken<'_>>, TemplateLexerError> {
    let mut tokens = vec![];

    #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
    enum TokenTy {
        Ident,
        Expr,
    }

    let mut state: Option<TokenTy> = None;
    let mut start = 0;
    for (idx, ch) in s.char_indices().chain([(s.len(), ' ')]) {
        let next_token = match ch {
            '(' => Some(TemplateToken::OpeningParenthesis(idx)),
            ')' => Some(TemplateToken::ClosingParenthesis(idx)),
            ',' => Some(TemplateToken::Comma(idx)),
            ' ' | '\t' | '\n' | '\r' => None,
            'A'..='Z' | 'a'..='z' | '_' => {
                state = state.or(Some(TokenTy::Ident));
                continue;
            }
            // Key placeholders, numbers and key origins: @0/**, 2, [fp/48']
            '0'..='9' | '[' | ']' | '\'' | '/' | '*' | '@' | '<' | ';' | '>' | '#' => {
                state = state.map(|prev| prev.max(TokenTy::Expr)).or(Some(TokenTy::Expr));
                continue;
            }
            _ => {
                return Err(TemplateLexerError::InvalidChar(s.to_string(), ch, idx));
            }
        };
        let prev_token = match state {
            None => None,
            Some(TokenTy::Ident) => Some(TemplateToken::Ident(&s[start..idx], start)),
            Some(TokenTy::Expr) => Some(TemplateToken::Lit(&s[start..idx], start)),
        };
        start = idx + ch.len_utf8();
        state = None;
        if let Some(token) = prev_token {
            tokens.push(token);
        }
        if let Some(token) = next_token {
            tokens.push(token);
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use TemplateToken::*;

    use super::*;

    fn test(sample: &str, expect: Vec<TemplateToken<'_>>) {
        let parsed = parse_template_str(sample).unwrap();
        assert_eq!(parsed, expect);
        let s = parsed.iter().map(TemplateToken::to_string).collect::<String>();
        assert_eq!(sample.replace(' ', ""), s);
    }

    #[test]
    fn empty() { test("", vec![]); }

    #[test]
    fn ident() { test("ident", vec![Ident("ident", 0)]); }

    #[test]
    fn whitespace() {
        test(" ident", vec![Ident("ident", 1)]);
        test("ident ()", vec![Ident("ident", 0), OpeningParenthesis(6), ClosingParenthesis(7)]);
        test("ident ( ) ", vec![Ident("ident", 0), OpeningParenthesis(6), ClosingParenthesis(8)]);
    }

    #[test]
    fn sh_wsh_sortedmulti() {
        test("sh(wsh(sortedmulti(2,@0/**,@1/**)))", vec![
            Ident("sh", 0),
            OpeningParenthesis(2),
            Ident("wsh", 3),
            OpeningParenthesis(6),
            Ident("sortedmulti", 7),
            OpeningParenthesis(18),
            Lit("2", 19),
            Comma(20),
            Lit("@0/**", 21),
            Comma(26),
            Lit("@1/**", 27),
            ClosingParenthesis(32),
            ClosingParenthesis(33),
            ClosingParenthesis(34),
        ]);
    }

    #[test]
    fn invalid_char() {
        assert_eq!(
            parse_template_str("wsh(2,@0/**,é)"),
            Err(TemplateLexerError::InvalidChar(s!("wsh(2,@0/**,é)"), 'é', 12))
        );
        assert!(parse_template_str("wsh(2.5)").is_err());
        assert!(matches!(
            parse_template_str("tr(@0/**,{pk(@1/**),pk(@2/**)})"),
            Err(TemplateLexerError::InvalidChar(_, '{', 9))
        ));
    }
}
