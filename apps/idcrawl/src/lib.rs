use std::path::{Path, PathBuf};

use clap::{
	Parser, Subcommand,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use idcrawl_config::Config;
use idcrawl_providers::meilisearch::MeiliClient;
use idcrawl_service::{DeepSearchRequest, IdentityService, QueryType, classify};

pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	"-",
	env!("VERGEN_GIT_SHA"),
	"-",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
);

#[derive(Debug, Parser)]
#[command(version = VERSION, rename_all = "kebab", styles = styles())]
pub struct Args {
	/// Required by every command that talks to the record index.
	#[arg(long, short = 'c', value_name = "FILE", global = true)]
	pub config: Option<PathBuf>,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Print the type a raw query would be searched as.
	Classify { query: String },
	/// Run one single-hop search across every collection.
	Search {
		query: String,
		#[arg(long = "type", short = 't', value_name = "TYPE")]
		query_type: Option<QueryType>,
	},
	/// Crawl outward from a seed query through linked identifiers.
	Deep {
		query: String,
		#[arg(long = "type", short = 't', value_name = "TYPE")]
		query_type: Option<QueryType>,
		#[arg(long, value_name = "N")]
		max_depth: Option<u32>,
		#[arg(long, value_name = "N")]
		max_queries: Option<u32>,
		#[arg(long, value_name = "N")]
		max_per_hit: Option<u32>,
		#[arg(long, value_name = "N")]
		concurrency: Option<usize>,
	},
	/// Report whether the record index is online.
	Health,
	/// Count collections and indexed documents.
	Stats,
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	match args.command {
		Command::Classify { query } => {
			let query_type = classify(&query);

			print_json(&serde_json::json!({ "query": query, "query_type": query_type }))
		},
		Command::Search { query, query_type } => {
			let service = IdentityService::new(load(args.config.as_deref())?)?;
			let query_type = query_type.unwrap_or_else(|| classify(&query));

			print_json(&service.search(&query, query_type).await)
		},
		Command::Deep { query, query_type, max_depth, max_queries, max_per_hit, concurrency } => {
			let service = IdentityService::new(load(args.config.as_deref())?)?;
			let req = DeepSearchRequest {
				query,
				query_type,
				max_depth,
				max_queries,
				max_per_hit,
				concurrency,
			};

			print_json(&service.deep_search(req).await)
		},
		Command::Health => {
			let service = IdentityService::new(load(args.config.as_deref())?)?;
			let online = service.is_online().await;

			print_json(&serde_json::json!({ "online": online }))
		},
		Command::Stats => {
			let config = load(args.config.as_deref())?;
			let client = MeiliClient::new(&config.index)?;

			print_json(&client.stats().await?)
		},
	}
}

fn load(path: Option<&Path>) -> color_eyre::Result<Config> {
	let path = path.ok_or_else(|| eyre::eyre!("--config is required for this command."))?;
	let config = idcrawl_config::load(path)?;

	init_tracing(&config)?;

	tracing::debug!(config = %path.display(), index = %config.index.url, "Configuration loaded.");

	Ok(config)
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter).init();

	Ok(())
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: serde::Serialize,
{
	println!("{}", serde_json::to_string_pretty(value)?);

	Ok(())
}
