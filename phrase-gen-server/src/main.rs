mod config;
mod service;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use log::info;

use phrase_gen_core::Generator;
use phrase_gen_core::corpus::load_or_build_chain;

use config::ServerArgs;
use service::SharedData;

/// Main entry point for the server.
///
/// Loads the chain (from its snapshot when available, otherwise from the
/// corpus), then starts an Actix-web HTTP server exposing `/v1/message` and
/// `/v1/status`.
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = ServerArgs::parse();
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
		.format_timestamp_millis()
		.init();

	let config = args.chain_config();
	info!("starting with {config:?}");

	let chain = load_or_build_chain(&args.file, args.snapshot.clone(), &config)?;
	info!("chain ready: {} predecessors, {} records", chain.len(), chain.total_records());

	let shared_data = web::Data::new(SharedData {
		chain,
		generator: Generator::new(&config),
	});

	info!("listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.app_data(shared_data.clone())
			.configure(service::configure)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await?;

	Ok(())
}
