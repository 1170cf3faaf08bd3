//! Login records.

use serde::{Deserialize, Serialize};

/// Credentials a login service presents to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "vendor", rename_all = "snake_case")]
pub enum Vendor {
    Guest { device_id: String },
    Password { account: String, password: String },
    ThirdParty { provider: String, token: String },
}

/// Outcome of a login attempt as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Ok,
    /// Carries the backend's refusal code.
    Denied(i32),
}

impl Permission {
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// The login service's acknowledgement.
///
/// Present once the backend has answered; the session machine waits for it
/// before moving on to the app-life connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAck {
    pub permission: Permission,
    pub account_id: u64,
    pub token: String,
}

impl LoginAck {
    /// Headers every authenticated HTTP request carries after this login.
    pub fn auth_headers(&self) -> AuthHeaders {
        AuthHeaders {
            account_id: self.account_id,
            token: self.token.clone(),
        }
    }
}

/// Authentication headers shared with HTTP-backed services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub account_id: u64,
    pub token: String,
}

impl AuthHeaders {
    pub const HEADER_ACCOUNT: &'static str = "Gt2-AccountId";
    pub const HEADER_TOKEN: &'static str = "Token";

    /// `(name, value)` pairs ready to attach to a request.
    pub fn pairs(&self) -> [(&'static str, String); 2] {
        [
            (Self::HEADER_ACCOUNT, self.account_id.to_string()),
            (Self::HEADER_TOKEN, self.token.clone()),
        ]
    }
}
