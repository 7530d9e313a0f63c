use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use tokengate_auth::ProviderContext;
use tokengate_auth::config::loader::load_config;

use crate::cli::OutputFormat;
use crate::output::{print_success, print_value};

pub fn check(path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load_config(path).context("failed to load configuration")?;
    let context = ProviderContext::from_config(&config);
    let settings = context.settings();

    let summary = json!({
        "issuer": context.issuer(),
        "token_endpoint": context.token_endpoint_url(),
        "jwk_set_endpoint": context.endpoint_url(&settings.jwk_set_endpoint),
        "jwks": {
            "ttl": format!("{:?}", config.jwks.ttl),
            "request_timeout": format!("{:?}", config.jwks.request_timeout),
            "max_response_size": config.jwks.max_response_size,
            "require_https": config.jwks.require_https,
        },
        "storage": {
            "lookup_timeout": format!("{:?}", config.storage.lookup_timeout),
        },
    });

    if matches!(format, OutputFormat::Text) {
        print_success("configuration is valid");
    }
    print_value(&summary, format);
    Ok(())
}
