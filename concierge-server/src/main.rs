use concierge_rag::Settings;
use concierge_server::{AppState, ServerConfig, init_tracing, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let settings = Settings::from_env()?;
    let agent = settings.build_agent()?;
    let mut state = AppState::new(agent);
    if let Some(service) = &settings.service_name {
        state = state.with_service(service);
    }

    run_server(ServerConfig::from(&settings), state).await
}
