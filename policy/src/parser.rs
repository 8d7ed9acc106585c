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


use std::num::ParseIntError;
use std::str::FromStr;

use crate::lexer::{parse_template_str, TemplateLexerError, TemplateToken};

/// Key placeholder `@<index>/**` referring to a key origin by its position.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[display("@{0}/**")]
pub struct KeyPlaceholder(pub u16);

impl KeyPlaceholder {
    #[inline]
    pub fn index(self) -> u16 { self.0 }
}

impl FromStr for KeyPlaceholder {
    type Err = TemplateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = s
            .strip_prefix('@')
            .and_then(|rest| rest.strip_suffix("/**"))
            .filter(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| TemplateParseError::InvalidPlaceholder(s.to_owned()))?;
        Ok(KeyPlaceholder(index.parse()?))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum TemplateParseError {
    /// empty policy template expression.
    Empty,

    #[display(inner)]
    #[from]
    Lexer(TemplateLexerError),

    /// script expression '{0}' must have a name.
    NoName(String),

    /// unexpected token '{token}' at position {pos} when {expected} is expected.
    UnexpectedToken {
        template: String,
        pos: usize,
        token: String,
        expected: &'static str,
    },

    /// no matching bracket for '{bracket}' in position {pos} inside the template '{template}'.
    MismatchedBrackets {
        template: String,
        pos: usize,
        bracket: String,
    },

    /// invalid script expression '{0}'.
    InvalidScriptExpr(String),

    /// invalid key placeholder '{0}'.
    InvalidPlaceholder(String),

    /// invalid number literal: {0}.
    #[from]
    Lit(ParseIntError),
}

#[derive(Clone, PartialEq, Eq, Debug, Display)]
#[display(inner)]
pub enum TemplateAst<'s> {
    /// Key placeholder
    #[display("{0}")]
    Key(KeyPlaceholder, usize),

    /// Literal expression (like number or a keyword `unspendable`)
    Lit(&'s str, usize),

    /// Statement, like miniscript or descriptor overall
    Script(Box<ScriptExpr<'s>>),
}

#[derive(Clone, PartialEq, Eq, Debug, Display)]
#[display("{full}")]
pub struct ScriptExpr<'s> {
    pub name: &'s str,
    pub children: Vec<TemplateAst<'s>>,
    pub full: &'s str,
    pub offset: usize,
}

impl<'s> TemplateAst<'s> {
    fn parse_from_token_stream(
        template: &'s str,
        tokens: &mut &[TemplateToken<'s>],
    ) -> Result<Self, TemplateParseError> {
        let stream = *tokens;
        let Some((first, rest)) = stream.split_first() else {
            return Err(TemplateParseError::Empty);
        };

        Ok(match first {
            TemplateToken::Ident(_, _)
                if matches!(stream.get(1), Some(TemplateToken::OpeningParenthesis(_))) =>
            {
                let matched_bracket = matching_bracket_close(template, &stream[1..])?;
                let (subtokens, remaining) = stream.split_at(matched_bracket + 2);
                *tokens = remaining;
                Self::Script(Box::new(ScriptExpr::parse_tokens(template, subtokens)?))
            }
            TemplateToken::Lit(s, pos) if s.starts_with('@') => {
                *tokens = rest;
                Self::Key(KeyPlaceholder::from_str(s)?, *pos)
            }
            TemplateToken::Ident(s, pos) | TemplateToken::Lit(s, pos) => {
                *tokens = rest;
                Self::Lit(s, *pos)
            }
            _ => {
                return Err(TemplateParseError::UnexpectedToken {
                    template: template.to_string(),
                    pos: first.pos(),
                    token: first.to_string(),
                    expected: "key, literal or script expression",
                })
            }
        })
    }

    /// Visits all nodes of the tree in the order they appear in the template.
    pub fn visit(&self, f: &mut impl FnMut(&TemplateAst<'s>)) {
        f(self);
        match self {
            TemplateAst::Key(..) | TemplateAst::Lit(..) => {}
            TemplateAst::Script(expr) => {
                for child in &expr.children {
                    child.visit(f);
                }
            }
        }
    }
}

impl<'s> ScriptExpr<'s> {
    /// Parses complete policy template as a single script expression.
    pub fn parse(template: &'s str) -> Result<Self, TemplateParseError> {
        let tokens = parse_template_str(template)?;
        if tokens.is_empty() {
            return Err(TemplateParseError::Empty);
        }
        Self::parse_tokens(template, &tokens)
    }

    /// Parses a part of the token stream as a script expression.
    ///
    /// # Arguments
    ///
    /// - `template` is the complete original template string.
    /// - `tokens` must contain part of the lexer output specific to the expression
    fn parse_tokens(
        template: &'s str,
        tokens: &[TemplateToken<'s>],
    ) -> Result<Self, TemplateParseError> {
        let full = template_substr(template, tokens);

        let Some((TemplateToken::Ident(name, offset), rest)) = tokens.split_first() else {
            return Err(TemplateParseError::NoName(template.to_string()));
        };
        let mut tokens = match rest {
            [TemplateToken::OpeningParenthesis(_), inner @ .., TemplateToken::ClosingParenthesis(_)] => {
                inner
            }
            _ => return Err(TemplateParseError::InvalidScriptExpr(full.to_string())),
        };
        if tokens.is_empty() {
            return Ok(Self {
                name: *name,
                children: vec![],
                full,
                offset: *offset,
            });
        }

        let mut children = vec![];

        loop {
            let node = TemplateAst::parse_from_token_stream(template, &mut tokens)?;
            children.push(node);
            // All children must be separated by comma
            let Some((token, rest)) = tokens.split_first() else {
                break;
            };
            tokens = rest;
            match token {
                TemplateToken::Comma(_) => continue,
                _ => {
                    return Err(TemplateParseError::UnexpectedToken {
                        template: template.to_string(),
                        pos: token.pos(),
                        token: token.to_string(),
                        expected: "comma",
                    })
                }
            }
        }

        Ok(Self {
            name: *name,
            children,
            full,
            offset: *offset,
        })
    }

    /// Visits all nodes of the expression in the order they appear in the
    /// template.
    pub fn visit(&self, mut f: impl FnMut(&TemplateAst<'s>)) {
        for child in &self.children {
            child.visit(&mut f);
        }
    }
}

fn template_substr<'s>(template: &'s str, tokens: &[TemplateToken]) -> &'s str {
    let start = tokens.first().map(TemplateToken::pos).unwrap_or_default();
    let end = tokens
        .last()
        .map(|token| token.pos() + token.to_string().len())
        .unwrap_or(template.len());
    &template[start..end]
}

fn matching_bracket_close(
    template: &str,
    tokens: &[TemplateToken],
) -> Result<usize, TemplateParseError> {
    let mismatched = |token: &TemplateToken| TemplateParseError::MismatchedBrackets {
        template: template.to_string(),
        pos: token.pos(),
        bracket: token.to_string(),
    };
    let mut open = vec![];
    for (pos, token) in tokens.iter().enumerate() {
        match token {
            TemplateToken::OpeningParenthesis(_) => open.push(token),
            TemplateToken::ClosingParenthesis(_) => {
                open.pop().ok_or_else(|| mismatched(token))?;
                if open.is_empty() {
                    return Ok(pos);
                }
            }
            _ => {}
        }
    }
    match open.pop() {
        Some(opening) => Err(mismatched(opening)),
        None => Ok(tokens.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_script_expr() {
        let ast = ScriptExpr::parse("wsh(2,@0/**,@1/**)").unwrap();
        assert_eq!(ast.name, "wsh");
        assert_eq!(ast.children.len(), 3);
        assert_eq!(ast.children[0], TemplateAst::Lit("2", 4));
        assert_eq!(ast.children[1], TemplateAst::Key(KeyPlaceholder(0), 6));
        assert_eq!(ast.children[2], TemplateAst::Key(KeyPlaceholder(1), 12));
        assert_eq!(ast.full, "wsh(2,@0/**,@1/**)");
        assert_eq!(ast.offset, 0);
    }

    #[test]
    fn nested_script_expr() {
        let ast = ScriptExpr::parse("sh(wsh(sortedmulti(1,@0/**)))").unwrap();
        assert_eq!(ast.name, "sh");
        assert_eq!(ast.children.len(), 1);
        assert_eq!(
            ast.children[0],
            TemplateAst::Script(Box::new(ScriptExpr {
                name: "wsh",
                children: vec![TemplateAst::Script(Box::new(ScriptExpr {
                    name: "sortedmulti",
                    children: vec![
                        TemplateAst::Lit("1", 19),
                        TemplateAst::Key(KeyPlaceholder(0), 21)
                    ],
                    full: "sortedmulti(1,@0/**)",
                    offset: 7,
                }))],
                full: "wsh(sortedmulti(1,@0/**))",
                offset: 3,
            }))
        );
        assert_eq!(ast.to_string(), "sh(wsh(sortedmulti(1,@0/**)))");
    }

    #[test]
    fn visit_order() {
        let ast = ScriptExpr::parse("sh(wsh(sortedmulti(2,@2/**,@0/**,@1/**)))").unwrap();
        let mut keys = vec![];
        ast.visit(|node| {
            if let TemplateAst::Key(key, _) = node {
                keys.push(key.index())
            }
        });
        assert_eq!(keys, vec![2, 0, 1]);
    }

    #[test]
    fn empty_args() {
        let ast = ScriptExpr::parse("wsh()").unwrap();
        assert!(ast.children.is_empty());
    }

    #[test]
    fn errors() {
        assert_eq!(ScriptExpr::parse(""), Err(TemplateParseError::Empty));
        assert_eq!(ScriptExpr::parse("   "), Err(TemplateParseError::Empty));
        assert!(matches!(
            ScriptExpr::parse("wsh(2,@0/**"),
            Err(TemplateParseError::InvalidScriptExpr(_))
        ));
        assert!(matches!(
            ScriptExpr::parse("wsh(sortedmulti(2,@0/**)"),
            Err(TemplateParseError::MismatchedBrackets { .. })
        ));
        assert!(matches!(
            ScriptExpr::parse("wsh(2 @0/**)"),
            Err(TemplateParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            ScriptExpr::parse("wsh(2,@x/**)"),
            Err(TemplateParseError::InvalidPlaceholder(_))
        ));
        assert!(matches!(ScriptExpr::parse("(2)"), Err(TemplateParseError::NoName(_))));
        assert!(matches!(ScriptExpr::parse("wsh(2)x"), Err(TemplateParseError::InvalidScriptExpr(_))));
    }
}
