//! API key generation.

use panos_api::{Credentials, DeviceClient, base_url_for};
use panos_core::CoreError;
use secrecy::{ExposeSecret, SecretString};

use crate::cli::{GlobalOpts, KeygenArgs};
use crate::config::Endpoint;
use crate::error::CliError;
use crate::output;

/// Password from `PANOS_PASSWORD`, otherwise prompted on the terminal.
fn read_password(user: &str) -> Result<SecretString, CliError> {
    if let Ok(password) = std::env::var("PANOS_PASSWORD") {
        return Ok(SecretString::from(password));
    }
    let password = rpassword::prompt_password(format!("Password for {user}: "))?;
    Ok(SecretString::from(password))
}

pub async fn handle(
    endpoint: &Endpoint,
    args: KeygenArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = read_password(&args.user)?;
    let credentials = Credentials::Basic {
        username: args.user.clone(),
        password: password.clone(),
    };
    let base_url = base_url_for(&endpoint.address).map_err(CoreError::from)?;
    let client = DeviceClient::new(
        base_url,
        endpoint.api_version.clone(),
        credentials,
        &endpoint.transport,
    )
    .map_err(CoreError::from)?;

    let key = client
        .generate_api_key(&args.user, &password)
        .await
        .map_err(CoreError::from)?;

    if args.store {
        panos_config::store_api_key(&endpoint.profile, &key)?;
        if !global.quiet {
            eprintln!("API key stored in the keyring for profile '{}'", endpoint.profile);
        }
        return Ok(());
    }

    output::print_output(key.expose_secret(), global.quiet);
    Ok(())
}
