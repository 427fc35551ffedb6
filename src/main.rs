#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = biotest_rust::run().await {
        eprintln!("biotest-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
