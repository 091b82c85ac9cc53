//! Nullable identity oracle: answers from a fixed set of verified members.

use async_trait::async_trait;
use blam_idv::{IdvOracle, OracleError};
use blam_types::MemberId;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// A test oracle. Members are unverified unless listed; scripted failures
/// take precedence over verification.
#[derive(Default)]
pub struct NullOracle {
    verified: Mutex<HashSet<MemberId>>,
    failing: Mutex<HashSet<MemberId>>,
    calls: Mutex<Vec<MemberId>>,
    delay: Mutex<Option<Duration>>,
}

impl NullOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verified<I>(self, members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MemberId>,
    {
        self.verified
            .lock()
            .unwrap()
            .extend(members.into_iter().map(Into::into));
        self
    }

    /// Any lookup of `member` fails as if the service were unreachable.
    pub fn with_failure(self, member: &str) -> Self {
        self.failing.lock().unwrap().insert(MemberId::from(member));
        self
    }

    /// Every lookup waits this long before answering.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn set_verified(&self, member: &MemberId, verified: bool) {
        let mut set = self.verified.lock().unwrap();
        if verified {
            set.insert(member.clone());
        } else {
            set.remove(member);
        }
    }

    /// Every member looked up so far, in call order.
    pub fn calls(&self) -> Vec<MemberId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdvOracle for NullOracle {
    async fn is_verified(&self, member: &MemberId) -> Result<bool, OracleError> {
        self.calls.lock().unwrap().push(member.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(member) {
            return Err(OracleError::Unreachable("scripted failure".to_string()));
        }
        Ok(self.verified.lock().unwrap().contains(member))
    }
}
