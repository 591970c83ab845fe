#[tokio::main]
async fn main() -> anyhow::Result<()> {
    epoch_duties::node::run_cli().await
}
