use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one issued asynchronous request. Tokens only ever increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tracks the latest issued request of one kind so that out-of-order
/// responses can be recognised and dropped.
#[derive(Debug, Clone, Default)]
pub struct TokenSequence {
    issued: u64,
    outstanding: Option<RequestToken>,
}

impl TokenSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new token; any previously outstanding one is superseded.
    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        let token = RequestToken(self.issued);
        self.outstanding = Some(token);
        token
    }

    /// Consumes the outstanding token if `token` is it. Returns `false` for
    /// superseded or already settled tokens.
    pub fn settle(&mut self, token: RequestToken) -> bool {
        if self.outstanding == Some(token) {
            self.outstanding = None;
            true
        } else {
            false
        }
    }

    /// Forgets the outstanding request; its response will be treated as stale.
    pub fn invalidate(&mut self) {
        self.outstanding = None;
    }

    #[must_use]
    pub const fn outstanding(&self) -> Option<RequestToken> {
        self.outstanding
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.outstanding.is_some()
    }
}
