use atlas_vector_provisioner::config::DEFAULT_SERVER_SELECTION_TIMEOUT;
use atlas_vector_provisioner::definition::IndexSource;
use atlas_vector_provisioner::presets::{ Preset, DEFAULT_COLLECTION, DEFAULT_DATABASE };
use atlas_vector_provisioner::provisioner::DEFAULT_POLL_INTERVAL;
use atlas_vector_provisioner::{
    create_index_store,
    get_store_type,
    ProvisionError,
    Provisioner,
    ProvisionerConfig,
    SimilarityMetric,
    StoreType,
};
use clap::{ Args, Parser, Subcommand };
use dotenv::dotenv;
use std::io::{ self, Write };
use std::path::PathBuf;
use std::time::Duration;
use log::{ info, error };

#[derive(Debug, Parser)]
#[command(name = "atlas-vector-provisioner", version, about = "Create and manage Atlas vector search indexes")]
struct Cli {
    /// Index store backend: atlas or memory.
    #[arg(long, env = "INDEX_STORE", default_value = "atlas", value_parser = get_store_type)]
    store: StoreType,

    #[arg(long, env = "CLUSTER_URI", hide_env_values = true)]
    uri: Option<String>,

    #[arg(long, default_value = DEFAULT_DATABASE)]
    database: String,

    #[arg(long, default_value = DEFAULT_COLLECTION)]
    collection: String,

    #[arg(long, default_value_t = DEFAULT_SERVER_SELECTION_TIMEOUT.as_millis() as u64)]
    server_selection_timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a search index and print a confirmation line.
    Create(CreateArgs),
    /// List search indexes on the collection.
    List {
        #[arg(long)]
        name: Option<String>,
    },
    /// Drop a search index by name.
    Drop {
        #[arg(long)]
        name: String,
    },
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// Built-in layout: voyage-text, openai-text or voyage-image.
    #[arg(long, conflicts_with_all = ["definition", "name"])]
    preset: Option<Preset>,

    /// JSON file holding `{ name, type, definition }`.
    #[arg(long, conflicts_with = "name")]
    definition: Option<PathBuf>,

    #[arg(long, requires_all = ["path", "dimensions"])]
    name: Option<String>,

    #[arg(long, requires = "name")]
    path: Option<String>,

    #[arg(long, requires = "name")]
    dimensions: Option<u32>,

    /// Defaults to cosine.
    #[arg(long, requires = "name")]
    similarity: Option<SimilarityMetric>,

    /// Extra pre-filter field path; repeatable.
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Print the index document instead of submitting it.
    #[arg(long)]
    dry_run: bool,

    /// Block until the index reports queryable.
    #[arg(long)]
    wait: bool,

    #[arg(long, default_value_t = 300)]
    wait_timeout_secs: u64,

    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    poll_interval_secs: u64,
}

impl CreateArgs {
    fn source(&self) -> Result<IndexSource, ProvisionError> {
        if let Some(file) = &self.definition {
            return Ok(IndexSource::File(file.clone()));
        }
        if let Some(name) = &self.name {
            let path = self.path
                .clone()
                .ok_or_else(|| ProvisionError::Config("--name requires --path".to_string()))?;
            let dimensions = self.dimensions.ok_or_else(||
                ProvisionError::Config("--name requires --dimensions".to_string())
            )?;
            return Ok(IndexSource::Inline {
                name: name.clone(),
                path,
                dimensions,
                similarity: self.similarity.unwrap_or(SimilarityMetric::Cosine),
            });
        }
        Ok(IndexSource::Preset(self.preset.unwrap_or_default()))
    }
}

impl Cli {
    fn config(&self) -> ProvisionerConfig {
        ProvisionerConfig {
            store_type: self.store,
            uri: self.uri.clone(),
            database: self.database.clone(),
            collection: self.collection.clone(),
            server_selection_timeout: Duration::from_millis(self.server_selection_timeout_ms),
            ..ProvisionerConfig::default()
        }
    }
}

/// Validated wire document for `create --dry-run`.
fn render_dry_run(args: &CreateArgs) -> Result<String, ProvisionError> {
    let spec = args.source()?.resolve(&args.filters)?;
    spec.validate()?;
    serde_json::to_string_pretty(&spec).map_err(|e| ProvisionError::InvalidSpecification(e.to_string()))
}

async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<(), ProvisionError> {
    let config = cli.config();

    match &cli.command {
        Command::Create(args) => {
            if args.dry_run {
                writeln!(out, "{}", render_dry_run(args)?)?;
                return Ok(());
            }

            let spec = args.source()?.resolve(&args.filters)?;

            let provisioner = Provisioner::new(create_index_store(&config).await?);
            let name = provisioner.provision_and_confirm(
                &config.database,
                &config.collection,
                &spec,
                out
            ).await?;

            if args.wait {
                provisioner.wait_until_queryable(
                    &config.database,
                    &config.collection,
                    &name,
                    Duration::from_secs(args.wait_timeout_secs),
                    Duration::from_secs(args.poll_interval_secs.max(1))
                ).await?;
            }
        }
        Command::List { name } => {
            let provisioner = Provisioner::new(create_index_store(&config).await?);
            let indexes = provisioner.list(&config.database, &config.collection, name.as_deref()).await?;
            info!("Found {} search indexes on {}.{}", indexes.len(), config.database, config.collection);
            for index in indexes {
                writeln!(
                    out,
                    "{}\t{}\t{}\tqueryable={}",
                    index.name,
                    index.kind.as_deref().unwrap_or("-"),
                    index.status.as_deref().unwrap_or("-"),
                    index.queryable
                )?;
            }
        }
        Command::Drop { name } => {
            let provisioner = Provisioner::new(create_index_store(&config).await?);
            provisioner.drop_index(&config.database, &config.collection, name).await?;
            writeln!(out, "Search index \"{}\" has been dropped.", name)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ProvisionError> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli, &mut io::stdout()).await {
        error!("{}", e);
        return Err(e);
    }
    Ok(())
}
