#[tokio::main]
async fn main() {
    if let Err(e) = neurodx::run().await {
        eprintln!("neurodx: {e}");
        std::process::exit(1);
    }
}
