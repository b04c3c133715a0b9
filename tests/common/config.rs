//! Test configuration pointing the pipeline at a mock catalog

use lyrics_harvest::Config;
use std::path::Path;
use std::time::Duration;

/// Configuration with every delay zeroed, paths inside `dir`, and the catalog at `server_uri`
pub fn test_config(server_uri: &str, dir: &Path, max_page: u32) -> Config {
    let mut config = Config::default().without_delays();

    config.collect.base_url = format!("{server_uri}/asongs");
    config.collect.start_page = 0;
    config.collect.max_page = max_page;
    config.fetch.timeout = Duration::from_secs(5);
    config.fetch.retry.max_attempts = 3;
    config.process.output_dir = dir.join("tat");
    config.persistence.database_path = dir.join("songs.db");
    config.persistence.index_dir = dir.to_path_buf();
    config.batch.batch_size = 2;
    config.batch.timeout = Duration::from_secs(30);

    config
}
