use std::{
    borrow::Borrow,
    fmt::{Debug, Display},
};

use serde::{Deserialize, Serialize};

pub mod grid;
pub mod net;
pub mod player;

/// Identifier the server assigns to a connection. Valid only for the
/// lifetime of that connection; a reconnecting peer gets a fresh one.
#[derive(Copy, Clone, PartialEq, Eq, Deserialize, Serialize, Hash)]
pub struct PlayerId(pub u32);

impl Debug for PlayerId {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as Display>::fmt(self, f)
    }
}

impl Display for PlayerId {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Always display IDs in hex
        write!(f, "{:#X}", self.0)
    }
}

impl From<u32> for PlayerId {
    #[inline]
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<PlayerId> for u32 {
    #[inline]
    fn from(v: PlayerId) -> Self {
        v.0
    }
}

impl Borrow<u32> for PlayerId {
    #[inline]
    fn borrow(&self) -> &u32 {
        &self.0
    }
}

impl PartialEq<u32> for PlayerId {
    #[inline]
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}
