pub mod error;
pub mod route;
pub mod state;

use self::state::AppState;
use crate::{config::Config, dispatch::client::DefaultHttpClient, error::HookResult, trigger::Trigger};

/// Runs the http front end until Ctrl+C.
pub async fn serve(config: Config) -> HookResult<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let (registry, dispatcher) = (config.registry(), config.dispatcher(DefaultHttpClient::new()?));
    tracing::info!(templates = registry.len(), timeout = ?dispatcher.timeout(), "seed templates");
    let app = route::app(AppState::new(Trigger::new(registry, dispatcher)));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("start app on {}", listener.local_addr()?);
    let serve = axum::serve(listener, axum::ServiceExt::<axum::extract::Request>::into_make_service(app))
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("stop app"),
                Err(e) => {
                    tracing::error!("cannot listen Ctrl+C: {}", e);
                    std::future::pending::<()>().await
                }
            }
        });
    Ok(serve.await?)
}
