use serde::Deserialize;

/// Settings for the bulk import job, loaded from `[import]`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ImportConfig {
    /// Dashboard link for an environment; `{customer}` and `{environment}`
    /// are substituted per row.
    pub web_url_template: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            web_url_template: "https://gitlab.com/cloud-ops/customer-instances/{customer}/{environment}/appinstance"
                .to_string(),
        }
    }
}

impl ImportConfig {
    pub fn web_url(&self, customer: &str, environment: &str) -> String {
        self.web_url_template
            .replace("{customer}", customer)
            .replace("{environment}", environment)
    }
}

/// A label-only Azure subscription, seeded from `[[azure_subscriptions]]`.
#[derive(Debug, Deserialize, Clone)]
pub struct AzureSubscriptionConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub internal: bool,
}
