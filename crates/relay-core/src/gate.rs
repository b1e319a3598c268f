use std::collections::HashSet;

use crate::domain::ChatId;

/// One-outstanding-message-per-user back-pressure.
///
/// A user is pending from the moment their DM reaches the admin group until an admin
/// reply is relayed back. Process-lifetime state only: after a restart everyone may
/// send again.
#[derive(Debug, Default)]
pub struct PendingGate {
    pending: HashSet<ChatId>,
}

impl PendingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, user: ChatId) -> bool {
        self.pending.contains(&user)
    }

    /// Mark `user` pending. Returns `false` if they already were.
    pub fn try_arm(&mut self, user: ChatId) -> bool {
        self.pending.insert(user)
    }

    /// Clear `user`. No-op if not pending.
    pub fn disarm(&mut self, user: ChatId) {
        self.pending.remove(&user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_once_until_disarmed() {
        let mut gate = PendingGate::new();
        let u = ChatId(111);

        assert!(gate.try_arm(u));
        assert!(gate.is_pending(u));
        assert!(!gate.try_arm(u));

        gate.disarm(u);
        gate.disarm(u);
        assert!(!gate.is_pending(u));
        assert!(gate.try_arm(u));
    }

    #[test]
    fn users_are_independent() {
        let mut gate = PendingGate::new();
        assert!(gate.try_arm(ChatId(1)));
        assert!(gate.try_arm(ChatId(2)));
        gate.disarm(ChatId(1));
        assert!(!gate.is_pending(ChatId(1)));
        assert!(gate.is_pending(ChatId(2)));
    }
}
