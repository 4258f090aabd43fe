use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = grants_web::Args::parse();
	grants_web::run(args).await
}
