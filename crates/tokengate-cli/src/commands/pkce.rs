use anyhow::{Context, Result};
use serde_json::json;

use tokengate_auth::oauth::{PkceChallenge, PkceChallengeMethod, PkceVerifier};

use crate::cli::OutputFormat;
use crate::output::print_value;

pub fn challenge(verifier: &str, format: OutputFormat) -> Result<()> {
    let verifier = PkceVerifier::new(verifier.to_string()).context("invalid code_verifier")?;
    print_value(&describe(&verifier), format);
    Ok(())
}

pub fn generate(format: OutputFormat) {
    print_value(&describe(&PkceVerifier::generate()), format);
}

fn describe(verifier: &PkceVerifier) -> serde_json::Value {
    json!({
        "code_verifier": verifier.as_str(),
        "code_challenge": PkceChallenge::from_verifier(verifier).as_str(),
        "code_challenge_method": PkceChallengeMethod::S256.as_str(),
    })
}
