use serde::Deserialize;

/// Body of `GET /api/status`.
///
/// `totalCount` was added after the base fields, so older hosts omit it.
#[derive(Debug, Deserialize, Clone)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, rename = "totalCount")]
    pub total_count: u64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Body of `GET /api/health`.
#[derive(Debug, Deserialize, Clone)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_count_defaults_to_zero() {
        let parsed: StatusResponse = serde_json::from_str(
            r#"{"status":"none","message":"nothing","timestamp":"2024-01-01 10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(parsed.total_count, 0);
        assert_eq!(parsed.status, "none");
    }

    #[test]
    fn negative_count_is_rejected() {
        let parsed = serde_json::from_str::<StatusResponse>(r#"{"status":"has","totalCount":-1}"#);
        assert!(parsed.is_err());
    }
}
