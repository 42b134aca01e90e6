use super::RequestsLoggingLevel;
use crate::storefront_store::LikeMode;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// max-age for successful config reads. Review data is never cached.
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub like_mode: LikeMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            content_cache_age_sec: 60,
            frontend_dir_path: None,
            like_mode: LikeMode::default(),
        }
    }
}
