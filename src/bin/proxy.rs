use clap::Parser;
use color_eyre::Result;
use heybuddy::{config::ProxyConfig, proxy, telemetry};

#[derive(Parser)]
#[command(name = "heybuddy-proxy", version, about = "Forwards prompts to Gemini")]
struct Cli {
    #[command(flatten)]
    proxy: ProxyConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    telemetry::init_stdout("info");

    let config = Cli::parse().proxy.with_env_fallbacks();
    proxy::start_server(config).await?;
    Ok(())
}
