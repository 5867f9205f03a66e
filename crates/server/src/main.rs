#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wasapp_server::run().await
}
