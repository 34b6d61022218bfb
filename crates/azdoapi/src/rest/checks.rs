//! Pipeline check configuration endpoints.
//!
//! These endpoints are project-scoped and still on the 5.1 preview surface.

use crate::client::ChecksClient;
use crate::error::Result;
use crate::models::checks::CheckConfiguration;
use crate::rest::RestClient;

const API_VERSION: &str = "5.1-preview.1";

impl ChecksClient for RestClient {
    fn add_check(&self, project: &str, body: &CheckConfiguration) -> Result<CheckConfiguration> {
        self.post(
            &self.project_url(project, "pipelines/checks/configurations", API_VERSION),
            body,
        )
    }

    fn get_check(&self, project: &str, id: i64) -> Result<CheckConfiguration> {
        let mut url = self.project_url(
            project,
            &format!("pipelines/checks/configurations/{id}"),
            API_VERSION,
        );
        // Settings are omitted unless expansion is requested.
        url.push_str("&$expand=1");
        self.get_json(&url)
    }

    fn update_check(
        &self,
        project: &str,
        id: i64,
        body: &CheckConfiguration,
    ) -> Result<CheckConfiguration> {
        self.patch(
            &self.project_url(
                project,
                &format!("pipelines/checks/configurations/{id}"),
                API_VERSION,
            ),
            body,
        )
    }

    fn delete_check(&self, project: &str, id: i64) -> Result<()> {
        self.delete(&self.project_url(
            project,
            &format!("pipelines/checks/configurations/{id}"),
            API_VERSION,
        ))
    }
}
