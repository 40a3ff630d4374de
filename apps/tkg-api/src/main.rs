use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = tkg_api::Args::parse();

	tkg_api::run(args).await
}
