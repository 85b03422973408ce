use anyhow::Result;
use tracing_subscriber::EnvFilter;

use shakti_server::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;
    let store = shakti_server::store_for(&settings);
    if shakti_server::bootstrap::ensure_super_admin(store.as_ref(), &settings).await? {
        tracing::info!("super admin seeded from the environment");
    }

    let addr = format!("{}:{}", settings.http_host, settings.http_port);
    let ax = shakti_server::build(settings, store)?;

    tracing::info!(environment = %ax.app.get("app.environment").unwrap_or_default(), "starting shakti-server");
    ax.listen(addr).await
}
