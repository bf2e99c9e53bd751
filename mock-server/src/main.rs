use tokio::net::TcpListener;

/// Standalone mock vendor, for manual poking with curl. The integration
/// tests start their own instance on a random port instead.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let addr = std::env::var("MOCK_VENDOR_ADDR").unwrap_or_else(|_| "127.0.0.1:8432".to_string());
    let listener = TcpListener::bind(&addr).await?;
    println!("mock vendor listening on http://{addr}");
    mock_server::run(listener).await
}
