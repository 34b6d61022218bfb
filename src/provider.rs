//! Resource registry assembly.

use std::collections::BTreeMap;
use std::sync::Arc;

use azdoapi::{ChecksClient, ProcessClient, RestClient, ServiceHooksClient};
use declarative::BoxedLifecycle;

use crate::config::Config;

/// One connected organization and its resource handlers.
pub struct Provider {
    client: Arc<RestClient>,
}

impl Provider {
    pub fn new(config: &Config) -> Self {
        let client = Arc::new(RestClient::new(
            config.org_service_url.clone(),
            &config.personal_access_token,
            config.user_agent.clone(),
        ));
        Self { client }
    }

    pub fn org_url(&self) -> &str {
        self.client.org_url()
    }

    /// All resource handlers keyed by registry name.
    pub fn resources(&self) -> BTreeMap<&'static str, BoxedLifecycle> {
        registry(self.client.clone(), self.client.clone(), self.client.clone())
    }
}

pub fn registry(
    process: Arc<dyn ProcessClient>,
    hooks: Arc<dyn ServiceHooksClient>,
    checks: Arc<dyn ChecksClient>,
) -> BTreeMap<&'static str, BoxedLifecycle> {
    let mut map = BTreeMap::new();
    for handler in processkit::resources(process)
        .into_iter()
        .chain(hookkit::resources(hooks))
        .chain(checkkit::resources(checks))
    {
        let previous = map.insert(handler.type_name(), handler);
        assert!(previous.is_none(), "duplicate resource registration");
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdoapi::mock::MockAzdo;

    #[test]
    fn registry_names_are_unique_and_complete() {
        let mock = Arc::new(MockAzdo::new());
        let map = registry(mock.clone(), mock.clone(), mock);
        assert_eq!(map.len(), 24);
        assert!(map.contains_key("azdo_process"));
        assert!(map.contains_key("azdo_servicehook_subscription"));
        assert!(map.contains_key("azdo_check_rest_api"));
    }

    #[test]
    fn provider_reports_the_configured_organization() {
        let provider = Provider::new(&Config {
            org_service_url: "https://dev.azure.com/contoso/".to_string(),
            personal_access_token: "pat".to_string(),
            user_agent: "azdoprov/test".to_string(),
        });
        assert_eq!(provider.org_url(), "https://dev.azure.com/contoso");
    }
}
