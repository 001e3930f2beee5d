//! Session setup shared by `shell` and `run`.

use std::sync::Arc;

use sshdeck_core::transport::{OpenSshOptions, OpenSshTransport};
use sshdeck_core::{
    AuthMethod, ClientSettings, ControllerOptions, CredentialResolver, RawConnectionRequest,
    SessionController, SessionHandle,
};

use tracing::debug;

use crate::error::CliError;

/// A connected controller and the handle of its session
pub struct OpenSession {
    /// Controller owning the session
    pub controller: SessionController,
    /// Registered session
    pub handle: SessionHandle,
}

/// Builds a controller over the OpenSSH transport configured by `settings`
pub fn build_controller(settings: &ClientSettings) -> SessionController {
    let transport = OpenSshTransport::new(OpenSshOptions::from_settings(settings));
    SessionController::new(Arc::new(transport))
        .with_options(ControllerOptions::from_settings(settings))
}

/// Resolves the request and connects
///
/// The raw request is consumed so its secrets are zeroized as soon as the
/// connection config has been built.
pub async fn open(
    controller: SessionController,
    settings: &ClientSettings,
    raw: RawConnectionRequest,
    method: AuthMethod,
) -> Result<OpenSession, CliError> {
    let config = CredentialResolver::new()
        .with_default_port(settings.connection.default_port)
        .resolve(&raw, method)?;
    drop(raw);
    debug!(remote = %config.target(), %method, "Opening session");

    let handle = controller.connect(config).await?;
    Ok(OpenSession { controller, handle })
}
