use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt::init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "mock wishlist service listening on {addr} (pid={}, key={})",
        mock_server::PID,
        mock_server::API_KEY
    );
    mock_server::run(listener).await
}
