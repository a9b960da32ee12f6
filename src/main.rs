use any_chat_mcp::Result;
use any_chat_mcp::commands::serve;
use any_chat_mcp::config::Config;
use clap::Parser;

#[derive(Parser)]
#[command(name = "any-chat-mcp")]
#[command(about = "MCP server exposing an OpenAI-compatible chat API as a single tool")]
#[command(version)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr: stdout belongs to the MCP transport.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Only --help/--version; configuration comes from the environment.
    let _cli = Cli::parse();

    let config = Config::from_env()?;
    serve(config).await?;

    Ok(())
}
