//! Property tests for credential resolution

use std::sync::Arc;

use proptest::prelude::*;
use secrecy::ExposeSecret;
use sshdeck_core::transport::ScriptedTransport;
use sshdeck_core::{
    AuthMethod, AuthPayload, CredentialResolver, LifecycleState, RawConnectionRequest,
    SessionController, SessionError, SshTransport,
};

// ========== Strategies ==========

/// Host names and addresses without surrounding whitespace
fn arb_host() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9-]{0,20}(\\.[a-z]{2,5}){0,2}",
        (1u8..=254, 0u8..=255, 0u8..=255, 1u8..=254)
            .prop_map(|(a, b, c, d)| format!("{a}.{b}.{c}.{d}")),
    ]
}

fn arb_username() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_-]{0,15}"
}

fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t]{0,4}"
}

/// Any port text, valid or not
fn arb_port_text() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u16..=u16::MAX).prop_map(|port| port.to_string()),
        Just(String::new()),
        Just("0".to_string()),
        "[a-z]{1,5}",
        (65_536u32..1_000_000).prop_map(|port| port.to_string()),
    ]
}

/// Identity paths, blank ones included
fn arb_identity() -> impl Strategy<Value = String> {
    prop_oneof![
        "(/keys|~/.ssh)/id_[a-z0-9]{1,10}",
        arb_blank(),
    ]
}

fn arb_method() -> impl Strategy<Value = AuthMethod> {
    prop_oneof![Just(AuthMethod::Password), Just(AuthMethod::Key)]
}

fn request(host: &str, port: &str, user: &str) -> RawConnectionRequest {
    let mut raw = RawConnectionRequest::new(host, port, user);
    raw.password = "secret".to_string();
    raw.identity_path = "/keys/id_ed25519".to_string();
    raw
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Non-blank host and username resolve whatever the port text, unless
    /// key authentication lacks an identity path
    #[test]
    fn valid_requests_always_resolve(
        host in arb_host(),
        user in arb_username(),
        port in arb_port_text(),
        method in arb_method(),
        identity in arb_identity(),
        pad in arb_blank(),
    ) {
        let mut raw = request(&format!("{pad}{host}{pad}"), &port, &format!("{pad}{user}"));
        raw.identity_path = identity.clone();
        let result = CredentialResolver::new().resolve(&raw, method);

        if method == AuthMethod::Key && identity.trim().is_empty() {
            prop_assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
        } else {
            let config = result.unwrap();
            prop_assert_eq!(config.host(), host.as_str());
            prop_assert_eq!(config.username(), user.as_str());
            prop_assert!(config.port() > 0);
            prop_assert_eq!(config.auth().method(), method);
        }
    }

    /// A blank host or username is always rejected
    #[test]
    fn blank_host_or_username_is_rejected(
        host in arb_host(),
        user in arb_username(),
        blank in arb_blank(),
        blank_host in any::<bool>(),
        method in arb_method(),
    ) {
        let raw = if blank_host {
            request(&blank, "22", &user)
        } else {
            request(&host, "22", &blank)
        };
        let result = CredentialResolver::new().resolve(&raw, method);
        prop_assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
    }

    /// Numeric ports in range are kept, anything else falls back
    #[test]
    fn port_parsing_falls_back_to_default(
        port in arb_port_text(),
        default_port in 1u16..=u16::MAX,
    ) {
        let resolver = CredentialResolver::new().with_default_port(default_port);
        let config = resolver
            .resolve(&request("host", &port, "root"), AuthMethod::Password)
            .unwrap();

        let expected = match port.parse::<u16>() {
            Ok(parsed) if parsed > 0 => parsed,
            _ => default_port,
        };
        prop_assert_eq!(config.port(), expected);
    }

    /// The payload carries only the fields of the selected method
    #[test]
    fn payload_matches_selected_method(
        password in "[ -~]{0,20}",
        passphrase in "[ -~]{0,20}",
        method in arb_method(),
    ) {
        let mut raw = request("host", "22", "root");
        raw.password = password.clone();
        raw.passphrase = passphrase.clone();

        let config = CredentialResolver::new().resolve(&raw, method).unwrap();
        match (method, config.auth()) {
            (AuthMethod::Password, AuthPayload::Password { password: secret }) => {
                prop_assert_eq!(secret.expose_secret(), password.as_str());
            }
            (AuthMethod::Key, AuthPayload::Identity { identity_path, passphrase: secret }) => {
                prop_assert_eq!(identity_path.to_str(), Some("/keys/id_ed25519"));
                if passphrase.trim().is_empty() {
                    prop_assert!(secret.is_none());
                } else {
                    prop_assert_eq!(
                        secret.as_ref().map(|s| s.expose_secret().to_string()),
                        Some(passphrase.clone())
                    );
                }
            }
            (method, payload) => {
                prop_assert!(false, "method {} produced {:?}", method, payload.method());
            }
        }
    }

    /// Key authentication without an identity path is rejected before the
    /// transport sees a connect
    #[test]
    fn key_auth_requires_identity(
        host in arb_host(),
        user in arb_username(),
        blank in arb_blank(),
    ) {
        let mut raw = request(&host, "22", &user);
        raw.identity_path = blank;

        let transport = Arc::new(ScriptedTransport::new());
        let controller = SessionController::new(Arc::clone(&transport) as Arc<dyn SshTransport>);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let result = runtime.block_on(async {
            let config = CredentialResolver::new().resolve(&raw, AuthMethod::Key)?;
            controller.connect(config).await
        });

        prop_assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
        prop_assert!(transport.calls().is_empty());
        prop_assert_eq!(controller.state(), LifecycleState::Disconnected);
        prop_assert!(controller.session().is_none());
    }
}
