use anyhow::Context;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::OutputFormat;
use crate::config::config;

pub fn handle(principal: String, admin: bool, hours: Option<u64>, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config().security;
    let claims = Claims::new(principal, admin, hours.unwrap_or(security.jwt_expiry_hours))?;
    let token = generate_jwt(&claims, &security.jwt_secret).context("failed to issue token (is JWT_SECRET set?)")?;

    match output_format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "token": token,
                "principal": claims.sub,
                "admin": claims.admin,
                "expires_at": claims.exp,
            }))?
        ),
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
