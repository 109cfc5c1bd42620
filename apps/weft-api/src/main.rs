use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = weft_api::Args::parse();

	weft_api::run(args).await
}
