/// Connection settings for the annotation backend.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://labels.example.com`.
    pub base_url: String,
    /// Long-lived credential exchanged for short-lived bearer tokens.
    pub refresh_token: String,
    pub project_id: i64,
    /// Data-manager view passed on task listings so results match the UI view.
    pub view_id: Option<i64>,
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Required | Default |
    /// |----------------------|----------|---------|
    /// | `BACKEND_URL`        | yes      | -       |
    /// | `BACKEND_TOKEN`      | yes      | -       |
    /// | `BACKEND_PROJECT_ID` | yes      | -       |
    /// | `BACKEND_VIEW_ID`    | no       | unset   |
    ///
    /// Panics on missing or malformed required values so misconfiguration
    /// fails at startup.
    pub fn from_env() -> Self {
        let base_url = std::env::var("BACKEND_URL").expect("BACKEND_URL must be set");
        let refresh_token = std::env::var("BACKEND_TOKEN").expect("BACKEND_TOKEN must be set");
        let project_id = std::env::var("BACKEND_PROJECT_ID")
            .expect("BACKEND_PROJECT_ID must be set")
            .parse()
            .expect("BACKEND_PROJECT_ID must be a valid i64");
        let view_id = std::env::var("BACKEND_VIEW_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.parse().expect("BACKEND_VIEW_ID must be a valid i64"));

        Self {
            base_url,
            refresh_token,
            project_id,
            view_id,
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("refresh_token", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("view_id", &self.view_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_credential() {
        let config = BackendConfig {
            base_url: "https://labels.example.com".into(),
            refresh_token: "super-secret".into(),
            project_id: 3,
            view_id: None,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("labels.example.com"));
    }
}
