use anyhow::Result;

#[tokio::main(core_threads = 1)]
async fn main() -> Result<()> {
    env3::client().await
}
