use std::sync::Arc;

use crate::application::ports::link_runtime::DeletionCapability;
use crate::application::use_cases::link_events::{ConnectRequest, DisconnectRequest, LinkEventBus};
use crate::domain::entities::scope::ScopeSet;

/// Gates connect/disconnect so a user is never left without a login method.
#[derive(Clone)]
pub struct ScopeConsistencyPolicy {
    events: Arc<LinkEventBus>,
    deletion: Arc<dyn DeletionCapability>,
}

impl ScopeConsistencyPolicy {
    pub fn new(events: Arc<LinkEventBus>, deletion: Arc<dyn DeletionCapability>) -> Self {
        Self { events, deletion }
    }

    /// Broadcast the connect request to observers, then apply the `auth` rule
    /// to the user's current selection.
    ///
    /// Observers may rewrite `request.scopes`; the caller hands the provider
    /// whatever is left.
    pub fn can_connect(
        &self,
        request: &mut ConnectRequest,
        current: &ScopeSet,
        global: &ScopeSet,
    ) -> bool {
        self.events.before_connect(request);
        if !request.allow_connect {
            tracing::debug!(service = %request.service, "Connect vetoed by observer");
            return false;
        }
        connect_permitted(
            current.auth_enabled(),
            global.auth_enabled(),
            self.deletion.is_available(),
        )
    }

    pub fn can_disconnect(&self, request: &mut DisconnectRequest, global: &ScopeSet) -> bool {
        self.events.before_disconnect(request);
        if !request.allow_disconnect {
            tracing::debug!(service = %request.service, "Disconnect vetoed by observer");
            return false;
        }
        disconnect_permitted(global.auth_enabled(), self.deletion.is_available())
    }
}

/// Turning `auth` off diverges from the tenant default only when the account
/// could still be removed or recovered.
pub fn connect_permitted(requested_auth: bool, global_auth: bool, deletion_available: bool) -> bool {
    requested_auth || requested_auth == global_auth || deletion_available
}

pub fn disconnect_permitted(global_auth: bool, deletion_available: bool) -> bool {
    !global_auth || deletion_available
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::link_runtime::StaticDeletionCapability;
    use crate::application::use_cases::link_events::LinkObserver;

    fn policy(deletion: bool) -> ScopeConsistencyPolicy {
        ScopeConsistencyPolicy::new(
            Arc::new(LinkEventBus::new()),
            Arc::new(StaticDeletionCapability(deletion)),
        )
    }

    fn scopes(auth: bool) -> ScopeSet {
        ScopeSet::from_pairs(&[("auth", auth), ("email", true)]).unwrap()
    }

    fn connect_request(current: &ScopeSet) -> ConnectRequest {
        ConnectRequest {
            service: "passport".into(),
            scopes: current.enabled_names(),
            allow_connect: true,
        }
    }

    fn disconnect_request() -> DisconnectRequest {
        DisconnectRequest {
            service: "passport".into(),
            allow_disconnect: true,
        }
    }

    #[test]
    fn test_disconnect_truth_table() {
        assert!(disconnect_permitted(false, false));
        assert!(disconnect_permitted(false, true));
        assert!(!disconnect_permitted(true, false));
        assert!(disconnect_permitted(true, true));
    }

    #[test]
    fn test_connect_with_auth_on_always_allowed() {
        for global in [false, true] {
            for deletion in [false, true] {
                assert!(connect_permitted(true, global, deletion));
            }
        }
    }

    #[test]
    fn test_connect_auth_matching_global_default() {
        // requested ["auth","email"], global auth on, no deletion capability
        let current = scopes(true);
        let mut request = connect_request(&current);
        assert!(policy(false).can_connect(&mut request, &current, &scopes(true)));
        assert_eq!(request.scopes, vec!["auth".to_string(), "email".to_string()]);
    }

    #[test]
    fn test_connect_auth_off_against_global_on() {
        let current = scopes(false);

        let mut request = connect_request(&current);
        assert!(!policy(false).can_connect(&mut request, &current, &scopes(true)));

        let mut request = connect_request(&current);
        assert!(policy(true).can_connect(&mut request, &current, &scopes(true)));
    }

    #[test]
    fn test_connect_auth_off_with_global_off() {
        let current = scopes(false);
        let mut request = connect_request(&current);
        assert!(policy(false).can_connect(&mut request, &current, &scopes(false)));
    }

    #[test]
    fn test_disconnect_with_global_auth_off() {
        for deletion in [false, true] {
            let mut request = disconnect_request();
            assert!(policy(deletion).can_disconnect(&mut request, &scopes(false)));
        }
        let mut request = disconnect_request();
        assert!(!policy(false).can_disconnect(&mut request, &scopes(true)));
    }

    #[test]
    fn test_missing_auth_flag_counts_as_off() {
        let current = ScopeSet::from_pairs(&[("email", true)]).unwrap();
        let global = ScopeSet::default();
        let mut request = connect_request(&current);
        assert!(policy(false).can_connect(&mut request, &current, &global));
    }

    struct Veto;

    impl LinkObserver for Veto {
        fn before_connect(&self, request: &mut ConnectRequest) {
            request.allow_connect = false;
        }

        fn before_disconnect(&self, request: &mut DisconnectRequest) {
            request.allow_disconnect = false;
        }
    }

    #[test]
    fn test_observer_veto_overrides_rule() {
        let events = Arc::new(LinkEventBus::new());
        events.register(Arc::new(Veto));
        let policy = ScopeConsistencyPolicy::new(events, Arc::new(StaticDeletionCapability(true)));

        let current = scopes(true);
        let mut request = connect_request(&current);
        assert!(!policy.can_connect(&mut request, &current, &scopes(true)));

        let mut request = disconnect_request();
        assert!(!policy.can_disconnect(&mut request, &scopes(false)));
    }
}
