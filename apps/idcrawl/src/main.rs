use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = idcrawl::Args::parse();

	idcrawl::run(args).await
}
