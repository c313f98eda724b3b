use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kgclient::query::{self, DatasetVersionSummary};
use kgclient::{resolver, Config, KgClient};

#[derive(Parser, Debug)]
#[command(name = "kgclient")]
#[command(about = "Query a JSON-LD knowledge-graph REST API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search dataset versions by name
    Search {
        /// Substring to match against the dataset full name
        term: String,
    },
    /// Fetch a single node by identifier
    Node {
        /// Node identifier (the last segment of its URI)
        id: String,
        /// Short property names whose references get resolved one hop,
        /// comma-separated, in order
        #[arg(long, value_delimiter = ',')]
        follow: Vec<String>,
        /// Resolve followed properties concurrently (all-or-nothing on failure)
        #[arg(long)]
        concurrent: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;

    // Initialize logger from environment variable or the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", &config.kg.log_level),
    )
    .init();

    let client = KgClient::new(&config.kg.base_url, config.token()?)?;

    match cli.command {
        Command::Search { term } => run_search(&client, &config, &term).await?,
        Command::Node {
            id,
            follow,
            concurrent,
        } => run_node(&client, &config, &id, &follow, concurrent).await?,
    }

    Ok(())
}

async fn run_search(client: &KgClient, config: &Config, term: &str) -> Result<()> {
    let items = query::query_kg(
        client,
        &config.kg.stage,
        config.kg.space.as_deref(),
        config.kg.page_size,
        term,
    )
    .await?;

    println!("\nQuery: \"{}\" ({} result(s))\n", term, items.len());

    for (index, item) in items.into_iter().enumerate() {
        let summary: DatasetVersionSummary = serde_json::from_value(item)
            .with_context(|| format!("Malformed result at index {}", index))?;

        println!("─────────────────────────────────────────────────────────");
        println!("#{}: {}", index + 1, summary.full_name);
        if let Some(version) = &summary.version_identifier {
            println!("Version: {}", version);
        }
        if let Some(date) = summary.release_date {
            println!("Released: {}", date);
        }
        if let Some(dataset) = &summary.dataset_name {
            println!("Dataset: {}", dataset);
        }
    }

    Ok(())
}

async fn run_node(
    client: &KgClient,
    config: &Config,
    id: &str,
    follow: &[String],
    concurrent: bool,
) -> Result<()> {
    let mut node = resolver::load_node(client, &config.kg.stage, id).await?;

    if !follow.is_empty() {
        let names: Vec<&str> = follow.iter().map(String::as_str).collect();
        if concurrent {
            resolver::follow_links_concurrent(client, &config.kg.stage, &mut node, &names).await?;
        } else {
            resolver::follow_links(client, &config.kg.stage, &mut node, &names).await?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&node.to_value())?);
    Ok(())
}
