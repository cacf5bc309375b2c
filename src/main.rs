use lambda_runtime::{service_fn, Error, LambdaEvent};
use ping_ingest::config::Config;
use ping_ingest::session::AwsSessionFactory;
use ping_ingest::types::DeviceRequest;
use ping_ingest::PingHandler;
use std::str::FromStr;
use tracing::debug;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = Config::from_env();

    // the DynamoDB client is created on the first invocation and reused after that
    let handler = PingHandler::new(AwsSessionFactory, config.session);
    let handler = &handler;

    if let Err(e) = lambda_runtime::run(service_fn(move |event: LambdaEvent<DeviceRequest>| {
        handler.handle_event(event)
    }))
    .await
    {
        debug!("Runtime error: {:?}", e);
        return Err(e);
    }

    Ok(())
}

/// Initializes the tracing from RUST_LOG env var if present, otherwise logs INFO for this lambda only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(
                    Directive::from_str("ping_ingest=info").expect("Invalid logging filter. It's a bug."),
                )
                .from_env_lossy(),
        )
        // CloudWatch adds its own timestamps and does not render colours
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .compact()
        .init();
}
