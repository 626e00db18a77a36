use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Client CLI for the circuit gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Make guarded calls through the gateway
    Call {
        /// Number of sequential calls to make
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Show rate limiter usage
    RateLimit,
    /// Show circuit breaker state
    Circuit,
    /// Check gateway health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Call { count } => {
            for _ in 0..count {
                let res = client.get(format!("{}/api/data", cli.url)).send().await?;
                print_response(res).await?;
            }
        }
        Commands::RateLimit => {
            let res = client.get(format!("{}/api/rate-limit", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Circuit => {
            let res = client.get(format!("{}/api/circuit", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(retry_after) = res.headers().get(reqwest::header::RETRY_AFTER) {
        eprintln!("Retry-After: {}", retry_after.to_str().unwrap_or("?"));
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("[{}] {}", status.as_u16(), serde_json::to_string_pretty(&json)?),
        Err(_) => {
            eprintln!("Error: gateway returned status {}", status);
            eprintln!("Response: {}", text);
        }
    }
    Ok(())
}
