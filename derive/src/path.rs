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


use core::fmt::{self, Display, Formatter};
use core::str::FromStr;

use crate::{DerivationIndex, HardenedIndex, Idx, IndexParseError, NormalIndex};

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum DerivationParseError {
    /// unable to parse derivation path '{0}' - {1}
    InvalidIndex(String, IndexParseError),
    /// invalid derivation path format '{0}'
    InvalidFormat(String),
}

/// BIP32 derivation path.
///
/// Parses both master-relative (`m/48'/1'/0'/2'`) and bare (`48h/1h/0h/2h`,
/// `/48'/1'`) forms; the bare `m` denotes an empty path. [`Display`] renders
/// the form used inside key origins, i.e. without the leading `m`, while
/// [`DerivationPath::to_master_string`] restores it.
#[derive(Wrapper, WrapperMut, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Debug, From)]
#[wrapper(Deref)]
#[wrapper_mut(DerefMut)]
pub struct DerivationPath<I = DerivationIndex>(Vec<I>);

impl<I: Clone> From<&[I]> for DerivationPath<I> {
    fn from(path: &[I]) -> Self { Self(path.to_vec()) }
}

impl<I: Display> Display for DerivationPath<I> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            f.write_str("/")?;
            Display::fmt(segment, f)?;
        }
        Ok(())
    }
}

impl<I: FromStr> FromStr for DerivationPath<I>
where IndexParseError: From<<I as FromStr>::Err>
{
    type Err = DerivationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim();
        if path == "m" || path == "M" {
            return Ok(Self(vec![]));
        }
        let path = path
            .strip_prefix("m/")
            .or_else(|| path.strip_prefix("M/"))
            .or_else(|| path.strip_prefix('/'))
            .unwrap_or(path);
        if path.is_empty() {
            return Err(DerivationParseError::InvalidFormat(s.to_owned()));
        }
        let inner = path
            .split('/')
            .map(I::from_str)
            .collect::<Result<Vec<_>, I::Err>>()
            .map_err(|err| DerivationParseError::InvalidIndex(s.to_owned(), err.into()))?;
        Ok(Self(inner))
    }
}

impl<I> IntoIterator for DerivationPath<I> {
    type Item = I;
    type IntoIter = std::vec::IntoIter<I>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<'path, I: Copy> IntoIterator for &'path DerivationPath<I> {
    type Item = I;
    type IntoIter = std::iter::Copied<std::slice::Iter<'path, I>>;

    fn into_iter(self) -> Self::IntoIter { self.0.iter().copied() }
}

impl<I> FromIterator<I> for DerivationPath<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self { Self(iter.into_iter().collect()) }
}

impl<I: Idx> DerivationPath<I> {
    /// Constructs empty derivation path.
    pub fn new() -> Self { Self(vec![]) }

    /// Number of derivation steps, matching the depth of a key derived with
    /// this path from the master key.
    #[inline]
    pub fn depth(&self) -> usize { self.0.len() }

    /// Renders the path with the leading `m`, as hardware signers and wallet
    /// configuration files expect it.
    pub fn to_master_string(&self) -> String
    where I: Display {
        if self.0.is_empty() {
            return s!("m");
        }
        format!("m{self}")
    }

    /// Returns the rest of the path if `prefix` is its ancestor (or the path
    /// itself).
    pub fn strip_prefix(&self, prefix: &DerivationPath<I>) -> Option<&[I]> {
        self.0.strip_prefix(prefix.0.as_slice())
    }

    /// Converts the path into a sequence of unhardened steps, if it contains no
    /// hardened ones.
    pub fn to_normal(&self) -> Option<DerivationPath<NormalIndex>> {
        self.0
            .iter()
            .map(|idx| NormalIndex::try_from_index(idx.index()).ok())
            .collect::<Option<_>>()
    }
}

impl From<DerivationPath<HardenedIndex>> for DerivationPath {
    fn from(path: DerivationPath<HardenedIndex>) -> Self {
        path.into_iter().map(DerivationIndex::Hardened).collect()
    }
}

impl AsRef<[NormalIndex]> for DerivationPath<NormalIndex> {
    fn as_ref(&self) -> &[NormalIndex] { self.0.as_ref() }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn altstr() {
        let path1 = DerivationPath::<HardenedIndex>::from_str("86h/1h/0h").unwrap();
        let path2 = DerivationPath::<HardenedIndex>::from_str("86'/1'/0'").unwrap();
        let path3 = DerivationPath::<HardenedIndex>::from_str("m/86'/1h/0H").unwrap();
        assert_eq!(path1, path2);
        assert_eq!(path1, path3);
    }

    #[test]
    fn master_forms() {
        let path = DerivationPath::<DerivationIndex>::from_str("m/48h/1h/0h/2h").unwrap();
        assert_eq!(path.to_string(), "/48'/1'/0'/2'");
        assert_eq!(path.to_master_string(), "m/48'/1'/0'/2'");
        assert_eq!(path.depth(), 4);

        let empty = DerivationPath::<DerivationIndex>::from_str("m").unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.to_string(), "");
        assert_eq!(empty.to_master_string(), "m");
    }

    #[test]
    fn invalid() {
        assert!(DerivationPath::<DerivationIndex>::from_str("").is_err());
        assert!(DerivationPath::<DerivationIndex>::from_str("m/").is_err());
        assert!(DerivationPath::<DerivationIndex>::from_str("m/48'/").is_err());
        assert!(DerivationPath::<DerivationIndex>::from_str("m/48'/x").is_err());
        assert!(DerivationPath::<DerivationIndex>::from_str("unknown").is_err());
        assert!(DerivationPath::<DerivationIndex>::from_str("m/+48'/1'/0'/+2'").is_err());
        assert!(DerivationPath::<DerivationIndex>::from_str("+48'").is_err());
        assert!(DerivationPath::<DerivationIndex>::from_str("m/48'//0").is_err());
    }

    #[test]
    fn ancestry() {
        let account = DerivationPath::<DerivationIndex>::from_str("m/48'/1'/0'/2'").unwrap();
        let child = DerivationPath::<DerivationIndex>::from_str("m/48'/1'/0'/2'/0/7").unwrap();
        let rest = child.strip_prefix(&account).unwrap();
        assert_eq!(rest, &[DerivationIndex::normal(0), DerivationIndex::normal(7)]);
        assert!(account.strip_prefix(&child).is_none());

        let purpose = DerivationPath::<DerivationIndex>::from_str("m/48'").unwrap();
        let hardened_below = DerivationPath::<DerivationIndex>::from_str("m/48'/0/1'").unwrap();
        let below = hardened_below.strip_prefix(&purpose).unwrap();
        assert!(DerivationPath::from(below).to_normal().is_none());

        let normal = DerivationPath::from(rest).to_normal().unwrap();
        assert_eq!(normal.len(), 2);
        assert!(account.to_normal().is_none());
    }
}
