use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = bazaar_app::bazaar_config();
    let ax = bazaar_app::build(&config)?;

    let host = config.get("http.host").unwrap_or("127.0.0.1").to_string();
    let port = config.get("http.port").unwrap_or("3000").to_string();
    let addr = format!("{host}:{port}");

    println!("[bazaar] listening on http://{addr}");

    ax.listen(addr).await?;

    Ok(())
}
