//! Session admission: the first inbound text frame must be an identity token
//! that resolves to the user the connection claims to be.

use std::time::Duration;

use axum::extract::ws::Message;
use futures_util::{Stream, StreamExt};
use tokio::time;

use crate::store::{IdentityResolver, StoreError};

use super::connection::ConnectionHandle;
use super::directory::ConnectionDirectory;

#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("no identity token within {0:?}")]
    Timeout(Duration),
    #[error("connection closed before identity token")]
    Closed,
    #[error("expected a text frame carrying the identity token")]
    NotText,
    #[error("empty identity token")]
    EmptyToken,
    #[error("identity token not recognised")]
    UnknownToken,
    #[error("token belongs to {resolved}, connection claimed {claimed}")]
    Mismatch { claimed: String, resolved: String },
    #[error("identity lookup failed: {0}")]
    Resolver(#[from] StoreError),
}

impl AdmissionError {
    /// Short reason suitable for a close frame.
    pub fn close_reason(&self) -> &'static str {
        match self {
            AdmissionError::Timeout(_) => "Identify timeout",
            AdmissionError::Closed => "Closed",
            AdmissionError::NotText => "Expected identity token",
            AdmissionError::Resolver(_) => "Identity lookup failed",
            _ => "Authentication failed",
        }
    }
}

/// Wait for the first text frame and return it as the token.
///
/// Ping/pong frames are skipped. Binary frames, close, EOF and read errors
/// all fail admission.
pub async fn read_token<S, E>(stream: &mut S, timeout: Duration) -> Result<String, AdmissionError>
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Debug,
{
    let first_text = async {
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(Message::Text(text)) => return Ok(text.as_str().to_string()),
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
                Ok(Message::Close(_)) => return Err(AdmissionError::Closed),
                Ok(Message::Binary(_)) => return Err(AdmissionError::NotText),
                Err(e) => {
                    tracing::debug!(?e, "ws read error during admission");
                    return Err(AdmissionError::Closed);
                }
            }
        }
        Err(AdmissionError::Closed)
    };

    time::timeout(timeout, first_text)
        .await
        .map_err(|_| AdmissionError::Timeout(timeout))?
}

/// Verify `token` against `claimed_user` and register the handle on success.
///
/// On failure the handle's completion is settled and it is never
/// registered; the caller is expected to drop the transport.
pub async fn admit(
    identity: &dyn IdentityResolver,
    directory: &ConnectionDirectory,
    claimed_user: &str,
    token: &str,
    handle: &ConnectionHandle,
) -> Result<(), AdmissionError> {
    match verify(identity, claimed_user, token).await {
        Ok(()) => {
            directory.register(claimed_user, handle.clone());
            Ok(())
        }
        Err(err) => {
            handle.complete();
            Err(err)
        }
    }
}

async fn verify(
    identity: &dyn IdentityResolver,
    claimed_user: &str,
    token: &str,
) -> Result<(), AdmissionError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AdmissionError::EmptyToken);
    }

    let resolved = identity
        .resolve_user(token)
        .await?
        .ok_or(AdmissionError::UnknownToken)?;

    if resolved != claimed_user {
        return Err(AdmissionError::Mismatch {
            claimed: claimed_user.to_string(),
            resolved,
        });
    }
    Ok(())
}
