//! Close-reason codes.
//!
//! WebSocket close codes 4000–4999 are reserved for applications. Gatelink
//! uses 4300–4998, grouped in sections, so every terminal step of the session
//! machine closes its service with a code that names the cause. Codes outside
//! the 4000 range come from the transport itself (e.g. 1006).

use std::fmt;

/// Why a service connection was closed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseReason {
    LoginSection = 4300,
    LoginConnectingWaitTimeout = 4301,
    LoginConnectFail = 4302,
    LoginConnectRetry = 4303,
    LoginFinish = 4304,

    AppLifeSection = 4400,
    AppLifeConnectFail = 4401,
    AppLifeUserDisagreeKick = 4402,
    AppLifeUserAgreeKickTimeout = 4403,
    AppLifeUserAgreeKickFail = 4404,
    AppLifeConnectRetry = 4405,
    AppLifeConnectTimeout = 4406,
    AppLifeConnectedTimeout = 4407,
    AppLifeReconnectFail = 4408,

    UserSection = 4700,
    UserRequestLogout = 4703,

    TempSection = 4800,
    TempWebFlightMode = 4801,

    /// Last usable code; nothing may be numbered above it.
    SectionEnd = 4998,
}

impl CloseReason {
    const ALL: [Self; 19] = [
        Self::LoginSection,
        Self::LoginConnectingWaitTimeout,
        Self::LoginConnectFail,
        Self::LoginConnectRetry,
        Self::LoginFinish,
        Self::AppLifeSection,
        Self::AppLifeConnectFail,
        Self::AppLifeUserDisagreeKick,
        Self::AppLifeUserAgreeKickTimeout,
        Self::AppLifeUserAgreeKickFail,
        Self::AppLifeConnectRetry,
        Self::AppLifeConnectTimeout,
        Self::AppLifeConnectedTimeout,
        Self::AppLifeReconnectFail,
        Self::UserSection,
        Self::UserRequestLogout,
        Self::TempSection,
        Self::TempWebFlightMode,
        Self::SectionEnd,
    ];

    /// The numeric close code sent to the transport.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Maps a numeric code back to a reason. `None` for transport codes
    /// and unassigned numbers.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }
}

impl From<CloseReason> for u16 {
    fn from(reason: CloseReason) -> Self {
        reason.code()
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}
