//! Provider configuration, read from the environment.

use anyhow::{Result, bail};
use std::env;

pub const ENV_ORG_SERVICE_URL: &str = "AZDO_ORG_SERVICE_URL";
pub const ENV_PERSONAL_ACCESS_TOKEN: &str = "AZDO_PERSONAL_ACCESS_TOKEN";
pub const ENV_HTTP_USER_AGENT: &str = "AZURE_HTTP_USER_AGENT";

#[derive(Debug, Clone)]
pub struct Config {
    pub org_service_url: String,
    pub personal_access_token: String,
    pub user_agent: String,
}

impl Config {
    /// Reads the process environment. The token never appears in error text.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let Some(org_service_url) = get(ENV_ORG_SERVICE_URL).filter(|v| !v.is_empty()) else {
            bail!("{ENV_ORG_SERVICE_URL} is not set, expected e.g. https://dev.azure.com/contoso");
        };
        let Some(personal_access_token) =
            get(ENV_PERSONAL_ACCESS_TOKEN).filter(|v| !v.is_empty())
        else {
            bail!("{ENV_PERSONAL_ACCESS_TOKEN} is not set");
        };
        let mut user_agent = format!("azdoprov/{}", env!("CARGO_PKG_VERSION"));
        if let Some(extra) = get(ENV_HTTP_USER_AGENT).filter(|v| !v.is_empty()) {
            user_agent = format!("{user_agent} {extra}");
        }
        Ok(Self { org_service_url, personal_access_token, user_agent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| (*v).to_string())
    }

    #[test]
    fn requires_org_url_and_token() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains(ENV_ORG_SERVICE_URL));

        let err = Config::from_lookup(lookup(&[(
            ENV_ORG_SERVICE_URL,
            "https://dev.azure.com/contoso",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_PERSONAL_ACCESS_TOKEN));
    }

    #[test]
    fn user_agent_carries_the_caller_suffix() {
        let config = Config::from_lookup(lookup(&[
            (ENV_ORG_SERVICE_URL, "https://dev.azure.com/contoso"),
            (ENV_PERSONAL_ACCESS_TOKEN, "pat"),
            (ENV_HTTP_USER_AGENT, "terraform/1.9"),
        ]))
        .unwrap();
        assert_eq!(
            config.user_agent,
            format!("azdoprov/{} terraform/1.9", env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn empty_values_count_as_unset() {
        let err = Config::from_lookup(lookup(&[
            (ENV_ORG_SERVICE_URL, ""),
            (ENV_PERSONAL_ACCESS_TOKEN, "pat"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_ORG_SERVICE_URL));
    }
}
