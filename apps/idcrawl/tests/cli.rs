use std::path::PathBuf;

use clap::Parser;

use idcrawl::{Args, Command};
use idcrawl_service::QueryType;

#[test]
fn classify_needs_no_config() {
	let args = Args::try_parse_from(["idcrawl", "classify", "@neo"]).expect("Failed to parse.");

	assert!(args.config.is_none());
	assert!(matches!(args.command, Command::Classify { query } if query == "@neo"));
}

#[test]
fn deep_accepts_every_budget() {
	let args = Args::try_parse_from([
		"idcrawl",
		"deep",
		"ann@x.com",
		"--config",
		"idcrawl.toml",
		"--type",
		"email",
		"--max-depth",
		"2",
		"--max-queries",
		"10",
		"--max-per-hit",
		"3",
		"--concurrency",
		"4",
	])
	.expect("Failed to parse.");

	assert_eq!(args.config, Some(PathBuf::from("idcrawl.toml")));

	let Command::Deep { query, query_type, max_depth, max_queries, max_per_hit, concurrency } =
		args.command
	else {
		panic!("Expected the deep command.");
	};

	assert_eq!(query, "ann@x.com");
	assert_eq!(query_type, Some(QueryType::Email));
	assert_eq!(max_depth, Some(2));
	assert_eq!(max_queries, Some(10));
	assert_eq!(max_per_hit, Some(3));
	assert_eq!(concurrency, Some(4));
}

#[test]
fn search_type_is_optional() {
	let args = Args::try_parse_from(["idcrawl", "-c", "idcrawl.toml", "search", "Ann Lee"])
		.expect("Failed to parse.");

	assert!(matches!(
		args.command,
		Command::Search { query, query_type: None } if query == "Ann Lee"
	));
}

#[test]
fn rejects_unknown_query_type() {
	let err = Args::try_parse_from(["idcrawl", "search", "neo", "--type", "nickname"])
		.expect_err("Unknown types must be rejected.");

	assert!(err.to_string().contains("nickname"));
}

#[tokio::test]
async fn backend_commands_require_config() {
	let args = Args::try_parse_from(["idcrawl", "health"]).expect("Failed to parse.");
	let err = idcrawl::run(args).await.expect_err("Missing config must fail.");

	assert!(err.to_string().contains("--config"));
}
