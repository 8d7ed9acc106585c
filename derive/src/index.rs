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

/// BIP32 index value from which child numbers are hardened.
pub const HARDENED_INDEX_BOUNDARY: u32 = 1 << 31;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum IndexError {
    /// child number {0} must be below 2^31.
    ChildNumberOverflow(u32),

    /// index {0} is hardened while unhardened one is required.
    Hardened(u32),

    /// index {0} is unhardened while hardened one is required.
    Unhardened(u32),
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum IndexParseError {
    #[from]
    #[display(inner)]
    Invalid(IndexError),

    #[from]
    /// invalid index string representation - {0}
    Parse(ParseIntError),

    /// expected hardened index value instead of the provided unhardened {0}
    HardenedRequired(String),

    /// index '{0}' must consist of decimal digits only
    NotDigits(String),
}

/// Common view of a single derivation step.
pub trait IdxBase: Sized + Eq + Ord + Copy {
    fn is_hardened(&self) -> bool;

    /// Child number, always below [`HARDENED_INDEX_BOUNDARY`].
    fn child_number(&self) -> u32;

    /// Raw index value used in derivation and in key serialization.
    fn index(&self) -> u32;

    fn to_be_bytes(&self) -> [u8; 4] { self.index().to_be_bytes() }
}

/// Derivation step which can be constructed from a raw index value.
pub trait Idx: IdxBase {
    const ZERO: Self;
    const ONE: Self;

    fn try_from_index(value: u32) -> Result<Self, IndexError>;
}

fn child_number(value: u32) -> Result<u32, IndexError> {
    if value >= HARDENED_INDEX_BOUNDARY {
        return Err(IndexError::ChildNumberOverflow(value));
    }
    Ok(value)
}

/// Parses child number written with decimal digits only.
fn parse_child_number(s: &str) -> Result<u32, IndexParseError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IndexParseError::NotDigits(s.to_owned()));
    }
    Ok(child_number(u32::from_str(s)?)?)
}

/// Unhardened derivation step; the only kind of step public derivation can
/// follow.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Debug, Hash, Default, Display, From)]
#[display(inner)]
pub struct NormalIndex(
    #[from(u8)]
    #[from(u16)]
    u32,
);

impl NormalIndex {
    pub const fn normal(child_number: u16) -> Self { NormalIndex(child_number as u32) }
}

impl IdxBase for NormalIndex {
    #[inline]
    fn is_hardened(&self) -> bool { false }
    #[inline]
    fn child_number(&self) -> u32 { self.0 }
    #[inline]
    fn index(&self) -> u32 { self.0 }
}

impl Idx for NormalIndex {
    const ZERO: Self = Self(0);
    const ONE: Self = Self(1);

    fn try_from_index(value: u32) -> Result<Self, IndexError> {
        if value >= HARDENED_INDEX_BOUNDARY {
            return Err(IndexError::Hardened(value));
        }
        Ok(Self(value))
    }
}

impl TryFrom<DerivationIndex> for NormalIndex {
    type Error = IndexError;

    fn try_from(idx: DerivationIndex) -> Result<Self, Self::Error> {
        NormalIndex::try_from_index(idx.index())
    }
}

impl FromStr for NormalIndex {
    type Err = IndexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse_child_number(s).map(Self) }
}

/// Hardened derivation step.
///
/// Displays with an apostrophe (`48'`), which is the form hardware signers
/// expect inside key origins; the alternate form uses `h`.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, Display, From)]
#[display("{0}'", alt = "{0}h")]
pub struct HardenedIndex(
    #[from(u8)]
    #[from(u16)]
    u32,
);

impl HardenedIndex {
    pub const fn hardened(child_number: u16) -> Self { HardenedIndex(child_number as u32) }
}

impl IdxBase for HardenedIndex {
    #[inline]
    fn is_hardened(&self) -> bool { true }
    #[inline]
    fn child_number(&self) -> u32 { self.0 }
    #[inline]
    fn index(&self) -> u32 { self.0 | HARDENED_INDEX_BOUNDARY }
}

impl Idx for HardenedIndex {
    const ZERO: Self = Self(0);
    const ONE: Self = Self(1);

    fn try_from_index(value: u32) -> Result<Self, IndexError> {
        if value < HARDENED_INDEX_BOUNDARY {
            return Err(IndexError::Unhardened(value));
        }
        Ok(Self(value ^ HARDENED_INDEX_BOUNDARY))
    }
}

impl TryFrom<DerivationIndex> for HardenedIndex {
    type Error = IndexError;

    fn try_from(idx: DerivationIndex) -> Result<Self, Self::Error> {
        HardenedIndex::try_from_index(idx.index())
    }
}

impl FromStr for HardenedIndex {
    type Err = IndexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = s
            .strip_suffix(['h', 'H', '\''])
            .ok_or_else(|| IndexParseError::HardenedRequired(s.to_owned()))?;
        parse_child_number(num).map(Self)
    }
}

/// Derivation step of either kind.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, From)]
#[display(inner)]
pub enum DerivationIndex {
    #[from]
    Normal(NormalIndex),
    #[from]
    Hardened(HardenedIndex),
}

impl From<u32> for DerivationIndex {
    fn from(value: u32) -> Self { Self::from_index(value) }
}

impl DerivationIndex {
    pub const fn normal(child_number: u16) -> Self {
        Self::Normal(NormalIndex::normal(child_number))
    }

    pub const fn hardened(child_number: u16) -> Self {
        Self::Hardened(HardenedIndex::hardened(child_number))
    }

    pub const fn from_index(value: u32) -> Self {
        match value & HARDENED_INDEX_BOUNDARY {
            0 => Self::Normal(NormalIndex(value)),
            _ => Self::Hardened(HardenedIndex(value ^ HARDENED_INDEX_BOUNDARY)),
        }
    }
}

impl IdxBase for DerivationIndex {
    fn is_hardened(&self) -> bool { matches!(self, Self::Hardened(_)) }

    fn child_number(&self) -> u32 {
        match self {
            Self::Normal(idx) => idx.child_number(),
            Self::Hardened(idx) => idx.child_number(),
        }
    }

    fn index(&self) -> u32 {
        match self {
            Self::Normal(idx) => idx.index(),
            Self::Hardened(idx) => idx.index(),
        }
    }
}

impl Idx for DerivationIndex {
    const ZERO: Self = Self::Normal(NormalIndex::ZERO);
    const ONE: Self = Self::Normal(NormalIndex::ONE);

    fn try_from_index(value: u32) -> Result<Self, IndexError> { Ok(Self::from_index(value)) }
}

impl FromStr for DerivationIndex {
    type Err = IndexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.ends_with(['h', 'H', '\'']) {
            HardenedIndex::from_str(s).map(Self::Hardened)
        } else {
            NormalIndex::from_str(s).map(Self::Normal)
        }
    }
}
