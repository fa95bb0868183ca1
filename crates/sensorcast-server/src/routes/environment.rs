//! Deployment environment endpoint.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Which environment the server runs in, with one flag per environment.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentResponse {
    pub environment: String,
    pub production: bool,
    pub uat: bool,
    pub development: bool,
}

/// GET /api/environment
pub async fn environment_handler(State(state): State<AppState>) -> Json<EnvironmentResponse> {
    let env = state.config.env;
    Json(EnvironmentResponse {
        environment: env.to_string(),
        production: env.is_production(),
        uat: env.is_uat(),
        development: env.is_development(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::test_support::seeded_state;
    use sensorcast_config::Environment;

    #[tokio::test]
    async fn test_environment_flags() {
        let state = seeded_state(ServerConfig::new().with_env(Environment::Prod));
        let Json(body) = environment_handler(State(state)).await;

        assert_eq!(
            body,
            EnvironmentResponse {
                environment: "prod".to_string(),
                production: true,
                uat: false,
                development: false,
            }
        );
    }

    #[tokio::test]
    async fn test_default_is_dev() {
        let state = seeded_state(ServerConfig::new());
        let Json(body) = environment_handler(State(state)).await;

        assert_eq!(body.environment, "dev");
        assert!(body.development);
        assert!(!body.production);
    }
}
