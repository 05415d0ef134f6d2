#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = examroom::run().await {
        eprintln!("examroom fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
