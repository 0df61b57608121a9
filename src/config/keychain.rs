use eyre::{Result, WrapErr};
use keyring::Entry;
use zeroize::Zeroizing;

const SERVICE_NAME: &str = "ballotctl";

/// Read-only access to deployer keys in the OS keychain
pub struct KeychainManager {
    service: String,
}

impl KeychainManager {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Split a wallet reference into `(service, account)`.
    ///
    /// `"service:account"` names both; a bare `"account"` uses our own service.
    pub fn parse_reference<'a>(&'a self, reference: &'a str) -> (&'a str, &'a str) {
        match reference.split_once(':') {
            Some((service, account)) if !service.is_empty() => (service, account),
            Some((_, account)) => (&self.service, account),
            None => (&self.service, reference),
        }
    }

    /// Retrieve a secret from the keychain
    pub fn get(&self, reference: &str) -> Result<Option<String>> {
        let (service, account) = self.parse_reference(reference);
        let entry = Entry::new(service, account)
            .wrap_err_with(|| format!("Failed to access keychain entry for {}", reference))?;

        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                Err(e).wrap_err_with(|| format!("Failed to retrieve secret for {}", reference))
            }
        }
    }

    /// Retrieve a secret with zeroization for sensitive data
    pub fn get_zeroizing(&self, reference: &str) -> Result<Option<Zeroizing<String>>> {
        self.get(reference).map(|opt| opt.map(Zeroizing::new))
    }
}

impl Default for KeychainManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference() {
        let km = KeychainManager::new();
        assert_eq!(km.parse_reference("deployer"), ("ballotctl", "deployer"));
        assert_eq!(km.parse_reference("vault:sepolia"), ("vault", "sepolia"));
        assert_eq!(km.parse_reference(":ops"), ("ballotctl", "ops"));
    }

    // Needs a real keychain and may prompt for permissions
    #[test]
    #[ignore]
    fn test_missing_entry_is_none() {
        let km = KeychainManager::new();
        assert_eq!(km.get("ballotctl-test-missing-entry").unwrap(), None);
    }
}
