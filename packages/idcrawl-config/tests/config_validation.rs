use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use idcrawl_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let table = root
		.as_table_mut()
		.expect("Template config must be a table.")
		.get_mut(section)
		.and_then(Value::as_table_mut)
		.expect("Template config must include the requested section.");

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn sample_toml_without(section: &str) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove(section);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("idcrawl_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> idcrawl_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = idcrawl_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");
	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn loads_template_and_normalizes_index() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string()).expect("Template must load.");

	assert_eq!(cfg.index.url, "http://127.0.0.1:7700");
	assert!(cfg.index.api_key.is_none());
	assert_eq!(cfg.crawl.max_depth, 5);
	assert_eq!(cfg.search.exact_limit, 100);
}

#[test]
fn search_and_crawl_sections_are_optional() {
	let payload = sample_toml_without("search");
	let mut root: Value = toml::from_str(&payload).expect("Failed to parse payload.");

	root.as_table_mut().expect("Payload must be a table.").remove("crawl");

	let cfg = load_payload(toml::to_string(&root).expect("Failed to render payload."))
		.expect("Config without optional sections must load.");

	assert_eq!(cfg.search.full_text_limit, 200);
	assert_eq!(cfg.search.scan_limit, 200);
	assert_eq!(cfg.search.collection_concurrency, 8);
	assert_eq!(cfg.crawl.max_queries, 5);
	assert_eq!(cfg.crawl.max_per_hit, 5);
	assert_eq!(cfg.crawl.concurrency, 5);
}

#[test]
fn api_key_is_kept_when_present() {
	let payload = sample_toml_with("index", "api_key", Value::String("master".to_string()));
	let cfg = load_payload(payload).expect("Config must load.");

	assert_eq!(cfg.index.api_key.as_deref(), Some("master"));
}

#[test]
fn index_url_must_be_non_empty() {
	expect_validation(
		sample_toml_with("index", "url", Value::String("  ".to_string())),
		"index.url must be non-empty.",
	);
}

#[test]
fn zero_limits_are_rejected() {
	expect_validation(
		sample_toml_with("index", "timeout_ms", Value::Integer(0)),
		"index.timeout_ms must be greater than zero.",
	);
	expect_validation(
		sample_toml_with("search", "scan_limit", Value::Integer(0)),
		"search.scan_limit must be greater than zero.",
	);
	expect_validation(
		sample_toml_with("search", "collection_concurrency", Value::Integer(0)),
		"search.collection_concurrency must be greater than zero.",
	);
	expect_validation(
		sample_toml_with("crawl", "max_queries", Value::Integer(0)),
		"crawl.max_queries must be greater than zero.",
	);
	expect_validation(
		sample_toml_with("crawl", "concurrency", Value::Integer(0)),
		"crawl.concurrency must be greater than zero.",
	);
}

#[test]
fn zero_max_depth_is_allowed() {
	let cfg = load_payload(sample_toml_with("crawl", "max_depth", Value::Integer(0)))
		.expect("Seed-only crawl must be a valid config.");

	assert_eq!(cfg.crawl.max_depth, 0);
}

#[test]
fn default_headers_must_be_strings() {
	let mut headers = toml::map::Map::new();

	headers.insert("x-retries".to_string(), Value::Integer(3));

	expect_validation(
		sample_toml_with("index", "default_headers", Value::Table(headers)),
		"index.default_headers.x-retries must be a string.",
	);
}

#[test]
fn missing_file_reports_path() {
	let path = env::temp_dir().join("idcrawl_config_test_missing.toml");
	let err = idcrawl_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
	assert!(err.to_string().contains("idcrawl_config_test_missing.toml"));
}

#[test]
fn malformed_toml_is_a_parse_error() {
	let err = load_payload("[service\nlog_level = 1".to_string()).expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }));
}
