//! Service-hooks subscription endpoints.

use uuid::Uuid;

use crate::client::ServiceHooksClient;
use crate::error::Result;
use crate::models::hooks::Subscription;
use crate::rest::RestClient;

const API_VERSION: &str = "5.1";

impl ServiceHooksClient for RestClient {
    fn create_subscription(&self, body: &Subscription) -> Result<Subscription> {
        self.post(&self.url("hooks/subscriptions", API_VERSION), body)
    }

    fn get_subscription(&self, id: Uuid) -> Result<Subscription> {
        self.get_json(&self.url(&format!("hooks/subscriptions/{id}"), API_VERSION))
    }

    fn replace_subscription(&self, id: Uuid, body: &Subscription) -> Result<Subscription> {
        self.put(
            &self.url(&format!("hooks/subscriptions/{id}"), API_VERSION),
            body,
        )
    }

    fn delete_subscription(&self, id: Uuid) -> Result<()> {
        self.delete(&self.url(&format!("hooks/subscriptions/{id}"), API_VERSION))
    }
}
