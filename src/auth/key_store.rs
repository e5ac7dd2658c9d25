use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

const SERVICE: &str = "soundbite";

/// Save an API key into the OS keyring under the config section it belongs to
pub fn save_api_key(section: &str, api_key: &str) -> Result<()> {
    let entry = Entry::new(SERVICE, section);
    entry?
        .set_password(api_key)
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

/// Load the API key stored for a config section
pub fn load_api_key(section: &str) -> Result<Option<String>> {
    let entry = Entry::new(SERVICE, section);
    match entry?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

