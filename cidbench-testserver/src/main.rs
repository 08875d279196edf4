use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut bind_addr: SocketAddr = "127.0.0.1:0".parse()?;
    let mut options = cidbench_testserver::TestServerOptions::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--bind requires an address, e.g. 127.0.0.1:0")
                })?;
                bind_addr = addr.parse()?;
            }
            "--delay-ms" => {
                let ms = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--delay-ms requires a number"))?;
                options.delay = Duration::from_millis(ms.parse()?);
            }
            "-h" | "--help" => {
                eprintln!(
                    "cidbench-testserver\n\nUSAGE:\n  cidbench-testserver [--bind 127.0.0.1:0] [--delay-ms 0]\n\nOUTPUT:\n  Prints API_URL=<url> to stdout once ready. The same URL serves the IPNI /cid/{{cid}} lookups."
                );
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let stats = cidbench_testserver::TestServerStats::default();
    let app = cidbench_testserver::router(options, stats);

    println!("API_URL=http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
