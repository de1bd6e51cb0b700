use tracing::error;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    if let Err(error) = pickup_core::observability::init_observability("backend") {
        eprintln!("Failed to initialise tracing: {:#}", error);
        std::process::exit(1);
    }

    if let Err(error) = pickup_backend::run().await {
        error!("Backend exited with error: {:#}", error);
        std::process::exit(1);
    }
}
