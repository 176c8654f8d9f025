//! Entry point for the birthstats binary.
#![forbid(unsafe_code)]

use birthstats_server::ServerError;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match birthstats_server::run().await {
        Ok(()) => {}
        Err(ServerError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("birthstats: {err}");
            std::process::exit(1);
        }
    }
}
