//! Hospital Portal - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = hospital_portal::run().await {
        eprintln!("hospital-portal: {}", e);
        std::process::exit(1);
    }
}
