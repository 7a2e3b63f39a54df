#[derive(Clone)]
pub struct Config {
    pub project_id: String,
    pub location: String,
    pub model_endpoint: String,
    pub access_token: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            project_id: std::env::var("PROJECT_ID")
                .expect("PROJECT_ID environment variable is required"),
            location: std::env::var("LOCATION")
                .expect("LOCATION environment variable is required"),
            model_endpoint: std::env::var("MODEL_ENDPOINT")
                .expect("MODEL_ENDPOINT environment variable is required"),
            access_token: std::env::var("ACCESS_TOKEN")
                .expect("ACCESS_TOKEN environment variable is required"),
        }
    }
}
