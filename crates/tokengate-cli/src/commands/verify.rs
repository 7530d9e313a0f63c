use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::json;

use tokengate_auth::config::loader::load_config;
use tokengate_auth::oauth::parameters::{
    CLIENT_ASSERTION, CLIENT_ASSERTION_TYPE, CLIENT_ID, CODE, CODE_VERIFIER, GRANT_TYPE,
    JWT_BEARER_ASSERTION_TYPE,
};
use tokengate_auth::{
    AuthenticatedClient, Authorization, DelegatingClientAuthenticator, DelegatingGrantConverter,
    GrantType, InMemoryAuthorizationRepository, InMemoryRegisteredClientRepository,
    JwtClientAssertionAuthenticator, JwtClientAssertionConverter, ProviderContext,
    RegisteredClient, RemoteJwkSetSource, TokenRequestParameters,
};

use crate::cli::{OutputFormat, VerifyArgs};
use crate::output::print_value;

pub async fn verify(
    args: &VerifyArgs,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(config_path).context("failed to load configuration")?;
    let context = ProviderContext::from_config(&config);

    let clients: Vec<RegisteredClient> = read_json(&args.clients)?;
    let authorizations: Vec<Authorization> = match &args.authorizations {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    tracing::debug!(
        clients = clients.len(),
        authorizations = authorizations.len(),
        "loaded repositories"
    );

    let authenticator = JwtClientAssertionAuthenticator::new(
        Arc::new(InMemoryRegisteredClientRepository::from_clients(clients)?),
        Arc::new(InMemoryAuthorizationRepository::from_authorizations(authorizations)?),
        Arc::new(RemoteJwkSetSource::new(config.jwks.clone())?),
    )
    .with_storage_config(&config.storage);
    let authenticator = DelegatingClientAuthenticator::new().with_provider(Arc::new(authenticator));

    let converter = token_converter()?;
    let parameters = token_request(args);
    let Some(request) = converter.convert(&parameters).inspect_err(|e| {
        print_value(&json!(e.to_error_response()), format);
    })?
    else {
        return Err(not_converted(&converter, &args.grant_type));
    };

    match authenticator.authenticate(&context, &request).await {
        Ok(client) => {
            print_value(&describe(&client), format);
            Ok(())
        }
        Err(e) => {
            print_value(&json!(e.to_error_response()), format);
            Err(e).context("client authentication failed")
        }
    }
}

fn token_converter() -> Result<DelegatingGrantConverter> {
    let converter = DelegatingGrantConverter::for_grant_types(
        [
            GrantType::AuthorizationCode,
            GrantType::ClientCredentials,
            GrantType::RefreshToken,
        ],
        Arc::new(JwtClientAssertionConverter),
    )?;
    Ok(converter)
}

fn not_converted(converter: &DelegatingGrantConverter, grant_type: &str) -> anyhow::Error {
    if converter.supports(grant_type) {
        anyhow::anyhow!("client_assertion is required for grant_type '{grant_type}'")
    } else {
        anyhow::anyhow!("grant_type '{grant_type}' is not supported")
    }
}

fn token_request(args: &VerifyArgs) -> TokenRequestParameters {
    let mut pairs = vec![
        (GRANT_TYPE, args.grant_type.clone()),
        (CLIENT_ASSERTION_TYPE, JWT_BEARER_ASSERTION_TYPE.to_string()),
        (CLIENT_ASSERTION, args.assertion.clone()),
    ];
    if let Some(client_id) = &args.client_id {
        pairs.push((CLIENT_ID, client_id.clone()));
    }
    if let Some(code) = &args.code {
        pairs.push((CODE, code.clone()));
    }
    if let Some(verifier) = &args.code_verifier {
        pairs.push((CODE_VERIFIER, verifier.clone()));
    }
    TokenRequestParameters::from_pairs(pairs)
}

fn describe(client: &AuthenticatedClient) -> serde_json::Value {
    let assertion = &client.assertion;
    json!({
        "client_id": client.client_id(),
        "registration_id": client.registered_client.id,
        "client_name": client.registered_client.client_name,
        "authentication_method": client.client_authentication_method.as_str(),
        "assertion": {
            "algorithm": format!("{:?}", assertion.algorithm()),
            "key_id": assertion.header().kid,
            "issued_at": assertion.issued_at().map(|t| t.unix_timestamp()),
            "expires_at": assertion.expires_at().unix_timestamp(),
        },
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> VerifyArgs {
        VerifyArgs {
            clients: "clients.json".into(),
            authorizations: None,
            assertion: "a.b.c".to_string(),
            client_id: None,
            grant_type: "authorization_code".to_string(),
            code: Some("code-1".to_string()),
            code_verifier: None,
        }
    }

    #[test]
    fn test_token_request_parameters() {
        let params = token_request(&args());
        assert_eq!(params.get(GRANT_TYPE), Some("authorization_code"));
        assert_eq!(params.get(CLIENT_ASSERTION_TYPE), Some(JWT_BEARER_ASSERTION_TYPE));
        assert_eq!(params.get(CODE), Some("code-1"));
        assert_eq!(params.get(CLIENT_ID), None);
        assert_eq!(params.get(CODE_VERIFIER), None);
    }

    #[test]
    fn test_empty_assertion_is_reported() {
        let converter = token_converter().unwrap();
        let mut args = args();
        args.assertion = String::new();

        assert!(converter.convert(&token_request(&args)).unwrap().is_none());
        assert_eq!(
            not_converted(&converter, &args.grant_type).to_string(),
            "client_assertion is required for grant_type 'authorization_code'"
        );

        args.grant_type = "password".to_string();
        assert!(converter.convert(&token_request(&args)).unwrap().is_none());
        assert_eq!(
            not_converted(&converter, &args.grant_type).to_string(),
            "grant_type 'password' is not supported"
        );
    }

    #[test]
    fn test_read_clients_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clients.json");
        fs::write(
            &path,
            r#"[{
                "id": "registration-1",
                "clientId": "client-1",
                "clientSecret": "secret",
                "clientAuthenticationMethods": ["client_secret_jwt"],
                "clientSettings": {"tokenEndpointAuthenticationSigningAlgorithm": "HS256"}
            }]"#,
        )
        .unwrap();

        let clients: Vec<RegisteredClient> = read_json(&path).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].client_id, "client-1");
        assert!(read_json::<Vec<RegisteredClient>>(&dir.path().join("missing.json")).is_err());
    }
}
