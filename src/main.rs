use niltoum::{app, logging, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let app_state = AppState::init(AppConfig::from_env()?).await?;
    let addr = app_state.config.addr();

    app::serve(app::build_app(app_state), &addr).await
}
