use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crate::config::AppConfig;
use crate::server;
use crate::services::Services;

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let services = Arc::new(Services::from_config(config));
    server::serve(services, config.bind).await
}
