//! Obtaining an access token when none is configured.

use serde_json::json;
use tracing::{info, warn};

use super::api::{Api, AppRegistration, TokenGrant};
use crate::config::MastodonConfig;
use crate::error::SocialError;

const CLIENT_NAME: &str = "LetsGoTroet";
const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
const SCOPES: &str = "read write push";

/// Register an OAuth application for the bridge.
pub async fn register_app(api: &Api) -> Result<AppRegistration, SocialError> {
    let app: AppRegistration = api
        .post(
            "/api/v1/apps",
            &json!({
                "client_name": CLIENT_NAME,
                "redirect_uris": REDIRECT_URI,
                "scopes": SCOPES,
            }),
        )
        .await?;
    warn!(
        client_id = %app.client_id,
        client_secret = %app.client_secret,
        "Registered a new OAuth application; add these credentials to the config"
    );
    Ok(app)
}

/// Password grant with the configured (or freshly registered) client.
pub async fn obtain_token(api: &Api, config: &MastodonConfig) -> Result<String, SocialError> {
    let (Some(username), Some(password)) = (&config.username, &config.password) else {
        return Err(SocialError::Forbidden(
            "neither an access token nor user credentials are configured".into(),
        ));
    };

    let (client_id, client_secret) = match (&config.client_id, &config.client_secret) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
            (id.clone(), secret.clone())
        }
        _ => {
            info!("No client credentials configured, registering application");
            let app = register_app(api).await?;
            (app.client_id, app.client_secret)
        }
    };

    let grant: TokenGrant = api
        .post(
            "/oauth/token",
            &json!({
                "client_id": client_id,
                "client_secret": client_secret,
                "username": username,
                "password": password,
                "grant_type": "password",
                "scope": SCOPES,
            }),
        )
        .await?;
    info!(user = %username, "Obtained access token via password grant");
    Ok(grant.access_token)
}
