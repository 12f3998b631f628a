use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    balcao_server::run().await
}
