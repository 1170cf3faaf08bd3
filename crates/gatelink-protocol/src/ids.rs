//! Identifier newtypes.
//!
//! Both identifiers are plain `u32`s on the wire, and the session core uses
//! the raw number as a pool key (an inbound frame's `kind` is looked up as a
//! service type first, then as a game id). The newtypes keep the two apart
//! everywhere else.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminator for a singleton backend service.
///
/// A `Connection` holds at most one live handle per `ServiceType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceType(pub u32);

impl ServiceType {
    pub const LOGIN: Self = Self(200);
    pub const LOBBY: Self = Self(201);
    pub const APPLIFE: Self = Self(202);
    pub const STATEMENT: Self = Self(203);
    pub const FINANCE: Self = Self(205);
    pub const VIP: Self = Self(229);
    pub const VERIFY_CODE: Self = Self(230);
    pub const LOG_API: Self = Self(231);
    pub const PLATFORM_API: Self = Self(232);
    pub const DAILY_CHECK: Self = Self(233);
    pub const MONEY_RAIN: Self = Self(234);
    pub const DAY_BUY: Self = Self(235);
    pub const MEMBER_INFO: Self = Self(236);
    pub const DIAMOND_RANK: Self = Self(237);
    pub const MONDAY_ORGY: Self = Self(238);
    pub const WORD_COLLECTION: Self = Self(239);
    pub const WEB_SHOPPING_CARD: Self = Self(240);
    pub const BIG_ROULETTE: Self = Self(241);
    pub const MATCH: Self = Self(242);
    pub const BROADCAST_MESSAGE: Self = Self(243);
    pub const GOLDEN_PIG: Self = Self(244);
    pub const STAR_MODEL: Self = Self(245);
    pub const WEEK_CARD: Self = Self(246);
    pub const WEB_CONSUMPTION: Self = Self(247);

    /// The raw number, used as a pool key and in URLs (`/service/{id}`).
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "svc-{}", self.0)
    }
}

/// Discriminator for a joinable game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u32);

impl GameId {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game-{}", self.0)
    }
}
