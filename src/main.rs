use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use snaplink::cli::{Cli, Commands, ConfigCommands};
use snaplink::config::{StaticConfig, get_config, init_config_from};
use snaplink::runtime::modes::run_server;
use snaplink::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config {
            action: ConfigCommands::Generate { output_path },
        }) => generate_config(output_path.as_deref()),
        Some(Commands::Serve) | None => serve(cli.config.as_deref()).await,
    }
}

fn generate_config(output_path: Option<&str>) -> Result<()> {
    let path = output_path.unwrap_or("config.example.toml");
    StaticConfig::default()
        .save_to_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path, e))?;
    println!("{} Sample configuration written to {}", "✓".green(), path);
    Ok(())
}

async fn serve(config_path: Option<&str>) -> Result<()> {
    init_config_from(config_path);
    let config = get_config();

    if let Err(e) = config.validate() {
        eprintln!("{}", e.format_colored());
        std::process::exit(1);
    }

    // 日志 guard 需要存活到进程结束
    let _guard = init_logging(&config.logging)?;

    run_server(&config).await
}
