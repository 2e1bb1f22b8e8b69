//! Derivation paths in the `purpose'/coin'/account'/chain/index` scheme.
//!
//! The first three segments are hardened (marked with `'`), the last two
//! are soft. Textual form follows the usual convention, e.g.
//! `1852'/1815'/0'/0/5`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use saros_core::constants::{COIN_TYPE, PURPOSE, STAKING_CHAIN};

use crate::error::WalletError;

/// Bit marking a segment index as hardened.
pub const HARDENED: u32 = 0x8000_0000;

/// One step of a derivation path.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    index: u32,
    hardened: bool,
}

impl Segment {
    /// A hardened segment. The index must be below 2^31.
    pub fn hardened(index: u32) -> Result<Self, WalletError> {
        if index >= HARDENED {
            return Err(WalletError::Derivation(format!(
                "segment index {index} out of range"
            )));
        }
        Ok(Self {
            index,
            hardened: true,
        })
    }

    /// A soft (non-hardened) segment. The index must be below 2^31.
    pub fn soft(index: u32) -> Result<Self, WalletError> {
        if index >= HARDENED {
            return Err(WalletError::Derivation(format!(
                "segment index {index} out of range"
            )));
        }
        Ok(Self {
            index,
            hardened: false,
        })
    }

    /// The raw index, without the hardened marker.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Whether this segment is hardened.
    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// The index with the hardened bit applied, as fed to the KDF.
    pub fn wire_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// A full derivation path from the root node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    segments: Vec<Segment>,
}

impl DerivationPath {
    /// A path from explicit segments.
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// The account-level path `1852'/1815'/account'`.
    pub fn account(account: u32) -> Result<Self, WalletError> {
        Ok(Self {
            segments: vec![
                Segment::hardened(PURPOSE)?,
                Segment::hardened(COIN_TYPE)?,
                Segment::hardened(account)?,
            ],
        })
    }

    /// The address-level path `1852'/1815'/account'/chain/index`.
    pub fn address(account: u32, chain: u32, index: u32) -> Result<Self, WalletError> {
        let mut path = Self::account(account)?;
        path.segments.push(Segment::soft(chain)?);
        path.segments.push(Segment::soft(index)?);
        Ok(path)
    }

    /// The per-account staking path `1852'/1815'/account'/2/0`.
    pub fn staking(account: u32) -> Result<Self, WalletError> {
        Self::address(account, STAKING_CHAIN, 0)
    }

    /// The segments in root-to-leaf order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        for part in s.split('/') {
            let (digits, hardened) = match part.strip_suffix('\'') {
                Some(d) => (d, true),
                None => (part, false),
            };
            let index: u32 = digits
                .parse()
                .map_err(|_| WalletError::Derivation(format!("bad path segment: {part:?}")))?;
            segments.push(if hardened {
                Segment::hardened(index)?
            } else {
                Segment::soft(index)?
            });
        }
        if segments.is_empty() {
            return Err(WalletError::Derivation("empty path".into()));
        }
        Ok(Self { segments })
    }
}
