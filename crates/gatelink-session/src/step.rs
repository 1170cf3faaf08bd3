//! The top-level session lifecycle.

use std::fmt;

/// A phase of the connection lifecycle.
///
/// Exactly one `Step` is current at a time. `Connection::main_process`
/// matches on it exhaustively, so adding a variant without handling it is
/// a compile error.
///
/// ```text
/// Wait ─→ Login ─→ AppLifeConnect ─→ AppLifeConnected ─→ DidAccessPreparation ─→ DidAccess
///           │            │                  │                                      │
///           ▼            ▼                  ▼                                      ▼
///     Timeout/Fail   Kick arbitration   Timeout/Fatal                         Disconnect
///                                                                                  │
///                                                              WaitReconnect ←─────┘
///                                                                   │
///                                                              Reconnecting ─→ DidAccess
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Wait,
    Login,
    LoginFail,
    LoginTimeout,
    LoginTimeoutWaitRetry,
    LoginFatalFail,

    AppLifeConnect,
    AppLifeConnectTimeout,
    AppLifeConnectTimeoutWaitRetry,
    AppLifeConnectFatalFail,

    AppLifeConnectFail,
    AppLifeConnectNeedUserAgreeKick,
    AppLifeConnectUserDidAgreeKick,
    AppLifeConnectUserDisagreeKick,
    AppLifeConnectUserAgreeKickTimeout,
    AppLifeConnectUserAgreeKickFail,

    AppLifeConnected,
    AppLifeConnectedTimeout,
    AppLifeConnectedTimeoutWaitRetry,
    AppLifeConnectedFatalFail,

    AppLifeDidAccessPreparation,
    AppLifeDidAccess,

    AppLifeDisconnect,
    AppLifeWaitReconnect,
    AppLifeReconnecting,
    AppLifeSocketError,
}

impl Step {
    /// True for the terminal and pre-reconnect steps, where a login
    /// attempt can be treated as over.
    pub fn is_connection_closed(self) -> bool {
        matches!(
            self,
            Self::LoginFail
                | Self::LoginFatalFail
                | Self::AppLifeConnectFail
                | Self::AppLifeConnectUserDisagreeKick
                | Self::AppLifeConnectUserAgreeKickTimeout
                | Self::AppLifeConnectUserAgreeKickFail
                | Self::AppLifeConnectFatalFail
                | Self::AppLifeConnectedFatalFail
                | Self::AppLifeDisconnect
                | Self::AppLifeWaitReconnect
                | Self::AppLifeReconnecting
                | Self::AppLifeSocketError
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wait => "WAIT",
            Self::Login => "LOGIN",
            Self::LoginFail => "LOGIN_FAIL",
            Self::LoginTimeout => "LOGIN_TIMEOUT",
            Self::LoginTimeoutWaitRetry => "LOGIN_TIMEOUT_WAIT_RETRY",
            Self::LoginFatalFail => "LOGIN_FATAL_FAIL",
            Self::AppLifeConnect => "APPLIFE_CONNECT",
            Self::AppLifeConnectTimeout => "APPLIFE_CONNECT_TIMEOUT",
            Self::AppLifeConnectTimeoutWaitRetry => "APPLIFE_CONNECT_TIMEOUT_WAIT_RETRY",
            Self::AppLifeConnectFatalFail => "APPLIFE_CONNECT_FATAL_FAIL",
            Self::AppLifeConnectFail => "APPLIFE_CONNECT_FAIL",
            Self::AppLifeConnectNeedUserAgreeKick => "APPLIFE_CONNECT_NEED_USER_AGREE_KICK",
            Self::AppLifeConnectUserDidAgreeKick => "APPLIFE_CONNECT_USER_DID_AGREE_KICK",
            Self::AppLifeConnectUserDisagreeKick => "APPLIFE_CONNECT_USER_DISAGREE_KICK",
            Self::AppLifeConnectUserAgreeKickTimeout => "APPLIFE_CONNECT_USER_AGREE_KICK_TIMEOUT",
            Self::AppLifeConnectUserAgreeKickFail => "APPLIFE_CONNECT_USER_AGREE_KICK_FAIL",
            Self::AppLifeConnected => "APPLIFE_CONNECTED",
            Self::AppLifeConnectedTimeout => "APPLIFE_CONNECTED_TIMEOUT",
            Self::AppLifeConnectedTimeoutWaitRetry => "APPLIFE_CONNECTED_TIMEOUT_WAIT_RETRY",
            Self::AppLifeConnectedFatalFail => "APPLIFE_CONNECTED_FATAL_FAIL",
            Self::AppLifeDidAccessPreparation => "APPLIFE_DID_ACCESS_PREPARATION",
            Self::AppLifeDidAccess => "APPLIFE_DID_ACCESS",
            Self::AppLifeDisconnect => "APPLIFE_DISCONNECT",
            Self::AppLifeWaitReconnect => "APPLIFE_WAIT_RECONNECT",
            Self::AppLifeReconnecting => "APPLIFE_RECONNECTING",
            Self::AppLifeSocketError => "APPLIFE_SOCKET_ERROR",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
