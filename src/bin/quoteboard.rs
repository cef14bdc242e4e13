use quoteboard::app::Application;
use quoteboard::utils::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let mut app = Application::init()?;
    app.run().await
}
