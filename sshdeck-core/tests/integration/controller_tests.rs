//! Session controller behavior against the scripted transport

use std::sync::Arc;

use secrecy::SecretString;
use sshdeck_core::transport::{ScriptedTransport, TransportCall};
use sshdeck_core::{
    AuthMethod, AuthPayload, ConnectResponse, ConnectionConfig, ExecOutput, LifecycleState,
    ResultOrigin, SessionController, SessionError, SessionId, SshTransport,
    TRANSPORT_FAILURE_EXIT_STATUS, TransportError,
};

fn password_config(host: &str, port: u16, user: &str) -> ConnectionConfig {
    ConnectionConfig::new(
        host,
        port,
        user,
        AuthPayload::Password {
            password: SecretString::from("x"),
        },
    )
    .expect("valid config")
}

fn setup() -> (Arc<ScriptedTransport>, SessionController) {
    let transport = Arc::new(ScriptedTransport::new());
    let controller = SessionController::new(Arc::clone(&transport) as Arc<dyn SshTransport>);
    (transport, controller)
}

#[tokio::test]
async fn concrete_session_walkthrough() {
    let (transport, controller) = setup();
    transport.push_execute(Ok(ExecOutput::new("a.txt\n", "", 0)));

    let handle = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();
    assert_eq!(handle.id(), &SessionId::new("s1"));
    let transcript = controller.transcript();
    assert_eq!(transcript.len(), 1);
    assert!(transcript[0].result().stdout.contains("root@10.0.0.5:22"));

    let entry = controller
        .execute(&SessionId::new("s1"), "ls")
        .await
        .unwrap()
        .expect("entry appended");
    assert_eq!(entry.result().stdout, "a.txt\n");
    assert_eq!(entry.result().exit_status, 0);
    assert!(entry.result().success());
    let transcript = controller.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].command_text(), Some("ls"));

    let none = controller.execute(&SessionId::new("s1"), "").await.unwrap();
    assert!(none.is_none());
    assert_eq!(controller.transcript().len(), 2);

    controller.disconnect().await.unwrap();
    assert_eq!(controller.state(), LifecycleState::Disconnected);
    assert!(controller.transcript().is_empty());
    assert!(controller.session().is_none());
    assert!(controller.sessions().is_empty());

    assert_eq!(
        transport.calls(),
        vec![
            TransportCall::Connect {
                target: "root@10.0.0.5:22".to_string(),
                method: AuthMethod::Password,
            },
            TransportCall::Execute {
                session_id: SessionId::new("s1"),
                command: "ls".to_string(),
            },
            TransportCall::Disconnect {
                session_id: SessionId::new("s1"),
            },
        ]
    );
}

#[tokio::test]
async fn transport_failure_is_recorded_and_session_survives() {
    let (transport, controller) = setup();
    transport.push_execute(Err(TransportError::ConnectionLost(
        "connection reset by peer".to_string(),
    )));

    let handle = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();
    let entry = controller
        .execute(handle.id(), "whoami")
        .await
        .unwrap()
        .unwrap();

    let result = entry.result();
    assert_eq!(result.exit_status, TRANSPORT_FAILURE_EXIT_STATUS);
    assert!(!result.success());
    assert!(result.stdout.is_empty());
    assert!(result.stderr.contains("connection reset by peer"));
    assert_eq!(result.origin, ResultOrigin::Transport);
    assert_eq!(controller.state(), LifecycleState::Connected);

    let next = controller.execute(handle.id(), "id").await.unwrap().unwrap();
    assert!(next.result().success());
    assert_eq!(controller.transcript().len(), 3);
}

#[tokio::test]
async fn remote_exit_minus_one_is_not_a_transport_failure() {
    let (transport, controller) = setup();
    transport.push_execute(Ok(ExecOutput::new("", "", -1)));
    let handle = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();

    let entry = controller.execute(handle.id(), "weird").await.unwrap().unwrap();
    assert_eq!(entry.result().exit_status, -1);
    assert_eq!(entry.result().origin, ResultOrigin::Remote);
    assert!(!entry.result().is_transport_failure());
}

#[tokio::test]
async fn overlapping_execute_is_rejected_without_touching_transcript() {
    let (transport, controller) = setup();
    let controller = Arc::new(controller);
    let handle = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();
    let release = transport.hold_execute();

    let first = {
        let controller = Arc::clone(&controller);
        let id = handle.id().clone();
        tokio::spawn(async move { controller.execute(&id, "sleep 5").await })
    };
    transport.wait_for_execute().await;
    assert!(controller.is_executing());

    let second = controller.execute(handle.id(), "ls").await;
    assert_eq!(second, Err(SessionError::ExecutionInProgress));
    assert_eq!(controller.transcript().len(), 1);

    let disconnect = controller.disconnect().await;
    assert_eq!(disconnect, Err(SessionError::ExecutionInProgress));
    assert_eq!(controller.state(), LifecycleState::Connected);

    release.complete(Ok(ExecOutput::new("done\n", "", 0)));
    let entry = first.await.unwrap().unwrap().unwrap();
    assert_eq!(entry.sequence(), 2);
    assert!(!controller.is_executing());

    let transcript = controller.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].command_text(), Some("sleep 5"));
    assert_eq!(transport.executed_commands(), vec!["sleep 5"]);

    let after = controller.execute(handle.id(), "ls").await.unwrap();
    assert!(after.is_some());
}

#[tokio::test]
async fn dropped_execute_releases_the_gate() {
    let (transport, controller) = setup();
    let controller = Arc::new(controller);
    let handle = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();
    let _release = transport.hold_execute();

    let task = {
        let controller = Arc::clone(&controller);
        let id = handle.id().clone();
        tokio::spawn(async move { controller.execute(&id, "tail -f log").await })
    };
    transport.wait_for_execute().await;
    assert!(controller.is_executing());

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert!(!controller.is_executing());
    assert_eq!(controller.transcript().len(), 1);

    let entry = controller.execute(handle.id(), "ls").await.unwrap().unwrap();
    assert_eq!(entry.command_text(), Some("ls"));
}

#[tokio::test]
async fn execute_while_disconnected_is_ignored() {
    let (transport, controller) = setup();
    let result = controller.execute(&SessionId::new("s1"), "ls").await;
    assert_eq!(result, Ok(None));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn whitespace_command_never_reaches_transport() {
    let (transport, controller) = setup();
    let handle = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();

    assert_eq!(controller.execute(handle.id(), "   \t ").await, Ok(None));
    assert!(transport.executed_commands().is_empty());

    controller.execute(handle.id(), "  uptime  ").await.unwrap();
    assert_eq!(transport.executed_commands(), vec!["uptime"]);
    assert_eq!(controller.transcript()[1].command_text(), Some("uptime"));
}

#[tokio::test]
async fn execute_with_foreign_session_id_fails() {
    let (transport, controller) = setup();
    controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();

    let result = controller.execute(&SessionId::new("other"), "ls").await;
    assert_eq!(
        result,
        Err(SessionError::SessionNotFound("other".to_string()))
    );
    assert!(transport.executed_commands().is_empty());
}

#[tokio::test]
async fn rejected_connect_returns_to_disconnected() {
    let (transport, controller) = setup();
    transport.push_connect(Ok(ConnectResponse::rejected("Authentication failed")));

    let result = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await;
    assert_eq!(
        result,
        Err(SessionError::ConnectFailure(
            "Authentication failed".to_string()
        ))
    );
    assert_eq!(controller.state(), LifecycleState::Disconnected);
    assert!(controller.session().is_none());
    assert!(controller.transcript().is_empty());
}

#[tokio::test]
async fn transport_error_during_connect_is_a_connect_failure() {
    let (transport, controller) = setup();
    transport.push_connect(Err(TransportError::Io("no route to host".to_string())));

    let result = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await;
    match result {
        Err(SessionError::ConnectFailure(message)) => {
            assert!(message.contains("no route to host"));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(controller.state(), LifecycleState::Disconnected);
}

#[tokio::test]
async fn success_without_session_id_is_a_connect_failure() {
    let (transport, controller) = setup();
    transport.push_connect(Ok(ConnectResponse {
        success: true,
        message: "ok".to_string(),
        session_id: None,
        current_directory: None,
    }));

    let result = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await;
    assert!(matches!(result, Err(SessionError::ConnectFailure(_))));
    assert!(controller.session().is_none());
}

#[tokio::test]
async fn second_connect_is_rejected_without_transport_call() {
    let (transport, controller) = setup();
    controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();

    let result = controller
        .connect(password_config("10.0.0.6", 22, "admin"))
        .await;
    assert_eq!(result, Err(SessionError::AlreadyConnected));
    let connects = transport
        .calls()
        .into_iter()
        .filter(|call| matches!(call, TransportCall::Connect { .. }))
        .count();
    assert_eq!(connects, 1);
    assert_eq!(controller.transcript().len(), 1);
}

#[tokio::test]
async fn failed_transport_disconnect_still_clears_everything() {
    let (transport, controller) = setup();
    transport.push_disconnect(Err(TransportError::ConnectionLost(
        "broken pipe".to_string(),
    )));
    let handle = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();
    controller.execute(handle.id(), "ls").await.unwrap();

    controller.disconnect().await.unwrap();
    assert_eq!(controller.state(), LifecycleState::Disconnected);
    assert!(controller.transcript().is_empty());
    assert!(controller.session().is_none());
    assert_eq!(controller.current_directory(), None);
}

#[tokio::test]
async fn disconnect_when_disconnected_is_a_no_op() {
    let (transport, controller) = setup();
    controller.disconnect().await.unwrap();
    controller.disconnect().await.unwrap();
    assert!(transport.calls().is_empty());
    assert_eq!(controller.state(), LifecycleState::Disconnected);
}

#[tokio::test]
async fn unknown_session_tears_down_locally() {
    let (transport, controller) = setup();
    transport.push_execute(Err(TransportError::UnknownSession("s1".to_string())));
    let handle = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();

    let result = controller.execute(handle.id(), "ls").await;
    assert!(matches!(result, Err(SessionError::SessionLost(_))));
    assert_eq!(controller.state(), LifecycleState::Disconnected);
    assert!(controller.transcript().is_empty());
    assert!(controller.session().is_none());
    assert!(!controller.is_executing());

    // Reconnecting works and starts a fresh transcript
    let handle = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();
    assert_eq!(handle.id(), &SessionId::new("s2"));
    assert_eq!(controller.transcript().len(), 1);
}

#[tokio::test]
async fn working_directory_follows_transport_reports() {
    let (transport, controller) = setup();
    transport
        .push_connect(Ok(ConnectResponse::connected(SessionId::new("s1"), "hi")
            .with_current_directory(Some("/root".to_string()))))
        .push_execute(Ok(
            ExecOutput::new("", "", 0).with_current_directory(Some("/var/log".to_string()))
        ))
        .push_execute(Ok(ExecOutput::new("syslog\n", "", 0)));

    let handle = controller
        .connect(password_config("10.0.0.5", 22, "root"))
        .await
        .unwrap();
    assert_eq!(controller.current_directory().as_deref(), Some("/root"));

    controller.execute(handle.id(), "cd /var/log").await.unwrap();
    assert_eq!(controller.current_directory().as_deref(), Some("/var/log"));

    // A result without a directory keeps the last known one
    controller.execute(handle.id(), "ls").await.unwrap();
    assert_eq!(controller.current_directory().as_deref(), Some("/var/log"));
}

#[tokio::test]
async fn key_auth_reaches_transport_as_key_method() {
    let (transport, controller) = setup();
    let config = ConnectionConfig::new(
        "db1",
        2222,
        "admin",
        AuthPayload::Identity {
            identity_path: "/keys/id_ed25519".into(),
            passphrase: None,
        },
    )
    .unwrap();

    let handle = controller.connect(config).await.unwrap();
    assert_eq!(handle.info().auth_method, AuthMethod::Key);
    assert_eq!(
        transport.calls()[0],
        TransportCall::Connect {
            target: "admin@db1:2222".to_string(),
            method: AuthMethod::Key,
        }
    );
}
