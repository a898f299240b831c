use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ledgerstack",
    about = "ledgerstack — deployment descriptor for a self-hosted budgeting service",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the deployment descriptor.
    ///
    /// Configuration comes from --config when given, otherwise from the
    /// REGION / ACCOUNT_ID / DOMAIN_NAME environment variables. Resolving
    /// the SSH relay ranges needs network access; pass --offline together
    /// with `ssh = "disabled"` to synthesize without it.
    Synth {
        /// Path to a TOML config file.
        #[arg(short, long)]
        config: Option<String>,
        /// Path to the compose descriptor deployed to the artifact bucket.
        #[arg(long, default_value = "./docker-compose.yml")]
        compose: String,
        /// Output format: json or text.
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Write the JSON template to a file instead of stdout.
        #[arg(short, long)]
        out: Option<String>,
        /// Skip the relay IP-range lookup.
        #[arg(long)]
        offline: bool,
    },
    /// Render the first-boot script for the given bucket names.
    Script {
        #[arg(long)]
        artifact_bucket: String,
        #[arg(long)]
        backup_bucket: String,
        #[arg(long, default_value = "/home/ec2-user/data")]
        data_dir: String,
    },
    /// Validate configuration and the backup retention invariant.
    Check {
        /// Path to a TOML config file.
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ledgerstack=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Synth {
            config,
            compose,
            format,
            out,
            offline,
        } => {
            commands::synth::synth(
                config.as_deref(),
                &compose,
                &format,
                out.as_deref(),
                offline,
            )
            .await
        }
        Commands::Script {
            artifact_bucket,
            backup_bucket,
            data_dir,
        } => commands::script::script(&artifact_bucket, &backup_bucket, &data_dir),
        Commands::Check { config } => commands::check::check(config.as_deref()),
    }
}
