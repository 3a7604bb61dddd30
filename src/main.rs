#[tokio::main]
async fn main() {
    if let Err(e) = sistema_ventas::run().await {
        eprintln!("Error fatal: {}", e);
        std::process::exit(1);
    }
}
