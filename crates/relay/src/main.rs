use std::sync::Arc;

use relay_core::{
    config::Config,
    threads::{FileThreadStore, SecondaryStore, ThreadStore},
};
use relay_supabase::SupabaseThreadStore;

#[tokio::main]
async fn main() -> Result<(), relay_core::Error> {
    relay_core::logging::init("relay")?;

    let cfg = Arc::new(Config::load()?);

    let file = FileThreadStore::open(&cfg.threads_file)?;
    let secondary: Option<Arc<dyn SecondaryStore>> = match &cfg.supabase {
        Some(sb) => {
            tracing::info!(url = %sb.url, "mirroring threads to supabase");
            Some(Arc::new(SupabaseThreadStore::new(sb)?))
        }
        None => None,
    };
    let threads = Arc::new(ThreadStore::new(file, secondary));

    relay_telegram::router::run(cfg, threads)
        .await
        .map_err(|e| relay_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
