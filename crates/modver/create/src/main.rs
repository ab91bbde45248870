//! modver - run module version creation against a simulated registry
//!
//! ```text
//! modver create --input model.json --in-progress-polls 3
//! modver predict --module-name Org::Mod::Resource::MODULE --existing-version 4
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use modver_create::{
    telemetry, ArnPredictor, CreateDriver, CreateHandler, HandlerConfig,
    IdentifierPredictor, InMemoryContinuationStore, SimulatedRegistry,
};
use modver_types::{
    AttemptId, ProgressEvent, RegistrationStatus, ResourceHandlerRequest, ResourceModel,
};
use std::io::Read;
use std::sync::Arc;

/// Module version provisioning CLI
#[derive(Parser)]
#[command(name = "modver")]
#[command(about = "Predict, register and stabilize new module versions", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MODVER_CONFIG")]
    config: Option<String>,

    /// Log level (overrides configuration)
    #[arg(long, env = "MODVER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    json: bool,

    /// Registry region
    #[arg(long, default_value = "us-east-1")]
    region: String,

    /// Registry account id
    #[arg(long, default_value = "123456789012")]
    account: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a module version from a JSON resource model
    Create {
        /// Resource model file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Attempt id; defaults to a generated one
        #[arg(long)]
        attempt_id: Option<String>,

        /// Status queries that report IN_PROGRESS before the registration settles
        #[arg(long, default_value_t = 0)]
        in_progress_polls: u32,

        /// ARN the registry assigns instead of the next sequential one
        #[arg(long)]
        actual_arn: Option<String>,

        /// Settle the registration as FAILED
        #[arg(long)]
        fail: bool,

        /// Versions already registered for the module
        #[arg(long, default_value_t = 0)]
        existing_versions: u32,

        /// Seconds between status queries (overrides configuration)
        #[arg(long)]
        delay_secs: Option<u64>,
    },

    /// Print the ARN the next version of a module would get
    Predict {
        /// Module type name, e.g. Org::Service::Resource::MODULE
        #[arg(long)]
        module_name: String,

        /// Highest version already registered
        #[arg(long, default_value_t = 0)]
        existing_version: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = HandlerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(level) = cli.log_level.clone() {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.json = true;
    }
    telemetry::init_tracing(&config.logging);

    match cli.command {
        Commands::Create {
            input,
            attempt_id,
            in_progress_polls,
            actual_arn,
            fail,
            existing_versions,
            delay_secs,
        } => {
            if let Some(delay) = delay_secs {
                config.backoff.delay_secs = delay;
            }
            let model = read_model(&input)?;

            let mut registry = SimulatedRegistry::new(&cli.region, &cli.account)
                .with_in_progress_polls(in_progress_polls);
            if let Some(arn) = actual_arn {
                registry = registry.with_assigned_arn(arn);
            }
            if fail {
                registry = registry.with_final_status(RegistrationStatus::Failed);
            }
            if existing_versions > 0 {
                let name = model
                    .module_name
                    .as_deref()
                    .context("ModuleName is required to seed existing versions")?;
                registry = registry.with_existing_version(name, existing_versions);
            }

            let handler = CreateHandler::new(Arc::new(registry), config.backoff.policy());
            let driver = CreateDriver::new(
                Arc::new(handler),
                Arc::new(InMemoryContinuationStore::new()),
            );

            let request = ResourceHandlerRequest::new(Some(model), &cli.account, &cli.region);
            let attempt_id = attempt_id.map(AttemptId::new).unwrap_or_else(AttemptId::generate);

            match driver.run(attempt_id, request).await {
                Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                Err(err) => {
                    let event = ProgressEvent::failed(None, err.error_code(), err.to_string());
                    println!("{}", serde_json::to_string_pretty(&event)?);
                    bail!("[{}] {}", err.error_code(), err)
                }
            }
        }
        Commands::Predict {
            module_name,
            existing_version,
        } => {
            let mut registry = SimulatedRegistry::new(&cli.region, &cli.account);
            if existing_version > 0 {
                registry = registry.with_existing_version(&module_name, existing_version);
            }
            let predictor = ArnPredictor::new(Arc::new(registry));
            let request = ResourceHandlerRequest::new(None, &cli.account, &cli.region);
            let model = ResourceModel {
                module_name: Some(module_name.clone()),
                ..Default::default()
            };

            match predictor.predict(&request, &model).await {
                Some(arn) => println!("{}", arn),
                None => bail!("ARN prediction for new module version of module {}", module_name),
            }
        }
    }

    Ok(())
}

fn read_model(input: &str) -> anyhow::Result<ResourceModel> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading resource model from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input))?
    };
    serde_json::from_str(&raw).context("parsing resource model")
}
