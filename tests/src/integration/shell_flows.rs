//! # Shell Relay Flows
//!
//! Sessions obtained from `ShellRegistry` driven by all four relay tasks over
//! in-memory transports, the way the gateway wires websockets.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rs_04_shell_relay::relay::{operator_input, operator_output, target_input, target_output};
    use rs_04_shell_relay::test_utils::{channel_transport, test_roster, TransportHandle};
    use rs_04_shell_relay::{RelayEnd, SessionKey, ShellError, ShellRegistry};
    use tokio::task::JoinHandle;

    macro_rules! spawn_relay {
        ($relay:ident, $session:expr) => {{
            let (mut transport, handle) = channel_transport();
            let session = Arc::clone(&$session);
            let task: JoinHandle<RelayEnd> =
                tokio::spawn(async move { $relay(&session, &mut transport).await });
            (task, handle)
        }};
    }

    fn registry() -> ShellRegistry {
        ShellRegistry::new(Arc::new(test_roster()), 16)
    }

    async fn next_text(handle: &mut TransportHandle) -> String {
        tokio::time::timeout(Duration::from_secs(2), handle.recv_text())
            .await
            .expect("relay produced a frame in time")
            .expect("transport still open")
    }

    async fn finished(task: JoinHandle<RelayEnd>) -> RelayEnd {
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("relay finished in time")
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_session_lifecycle() {
        let shells = registry();

        // Target dials in before any operator.
        let pending = shells.lookup_or_create("red-rovers", "web01").unwrap();
        let (_tgt_in, mut target_keys) = spawn_relay!(target_input, pending);
        let (_tgt_out, target_screen) = spawn_relay!(target_output, pending);

        let session = shells.attach_operator("t1", "web01").unwrap();
        assert!(Arc::ptr_eq(&pending, &session));
        assert_eq!(shells.active_count(), 1);
        let (op_in, operator_keys) = spawn_relay!(operator_input, session);
        let (_op_out, mut operator_screen) = spawn_relay!(operator_output, session);

        operator_keys.send_text("id");
        assert_eq!(next_text(&mut target_keys).await, "id\n");

        target_screen.send_text("uid=0(root)");
        assert_eq!(next_text(&mut operator_screen).await, "uid=0(root)");
        assert!(!session.state().is_closed());

        operator_keys.send_text("exit");
        assert_eq!(finished(op_in).await, RelayEnd::Exit);
        assert_eq!(next_text(&mut target_keys).await, "exit\n");
        assert!(session.state().is_closed());
        assert!(shells.get(&SessionKey::new("t1", "web01")).is_none());
        assert_eq!(shells.active_count(), 0);

        let next = shells.attach_operator("t1", "web01").unwrap();
        assert!(!Arc::ptr_eq(&next, &session));
    }

    #[tokio::test]
    async fn test_second_operator_waits_for_exit() {
        let shells = registry();
        let session = shells.attach_operator("t2", "db01").unwrap();

        assert_eq!(
            shells.attach_operator("blue-jays", "db01").unwrap_err(),
            ShellError::AlreadyInUse {
                team: "t2".to_string(),
                image: "db01".to_string()
            }
        );

        session.close();
        assert!(shells.attach_operator("blue-jays", "db01").is_ok());
    }

    #[tokio::test]
    async fn test_target_reconnect_keeps_operator_attached() {
        let shells = registry();
        let session = shells.attach_operator("t1", "db01").unwrap();
        let (_op_out, mut operator_screen) = spawn_relay!(operator_output, session);
        let (_tgt_out, target_screen) = spawn_relay!(target_output, session);

        target_screen.fail("connection reset by peer");
        target_screen.send_text("$ ");

        assert_eq!(next_text(&mut operator_screen).await, "$ ");
        assert_eq!(session.generation(), 1);
        assert!(session.state().is_active());
        assert!(shells.get(session.key()).is_some());
    }

    #[tokio::test]
    async fn test_unknown_targets_refused() {
        let shells = registry();
        assert_eq!(
            shells.lookup_or_create("nobody", "web01").unwrap_err(),
            ShellError::UnknownTeam("nobody".to_string())
        );
        assert_eq!(
            shells.attach_operator("t1", "mainframe").unwrap_err(),
            ShellError::UnknownImage("mainframe".to_string())
        );
    }
}
