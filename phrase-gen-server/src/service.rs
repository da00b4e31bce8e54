use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use actix_web::{HttpResponse, Responder, get, web};
use log::{debug, warn};
use phrase_gen_core::{Chain, Generator};
use serde::Serialize;

/// State shared by every worker of the HTTP server.
///
/// The chain synchronizes itself, so no extra lock is needed here.
pub struct SharedData {
	pub chain: Arc<Chain>,
	pub generator: Generator,
}

#[derive(Serialize, Debug)]
struct Timestamp {
	seconds: u64,
	nanos: u32,
}

impl Timestamp {
	fn now() -> Self {
		let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
		Self {
			seconds: elapsed.as_secs(),
			nanos: elapsed.subsec_nanos(),
		}
	}
}

/// Envelope returned by `/v1/message`.
#[derive(Serialize, Debug)]
struct Message {
	id: String,
	ts: Timestamp,
	text: String,
}

/// Body returned by `/v1/status`.
#[derive(Serialize, Debug)]
struct Status {
	ts: Timestamp,
	status: &'static str,
	records: u64,
	predecessors: usize,
}

fn new_id() -> String {
	format!("{:032x}", rand::random::<u128>())
}

/// HTTP GET endpoint `/v1/message`
///
/// Generates a new sentence and wraps it with an identifier and a timestamp.
/// A failed walk is reported as a server error, never as an empty sentence.
#[get("/v1/message")]
async fn get_message(data: web::Data<SharedData>) -> impl Responder {
	match data.generator.generate(&data.chain) {
		Ok(text) => {
			let message = Message {
				id: new_id(),
				ts: Timestamp::now(),
				text,
			};
			debug!("sending message {}", message.id);
			HttpResponse::Ok().json(message)
		}
		Err(e) => {
			warn!("generation failed: {e}");
			HttpResponse::InternalServerError().body(format!("Failed to generate message: {e}"))
		}
	}
}

/// HTTP GET endpoint `/v1/status`
#[get("/v1/status")]
async fn get_status(data: web::Data<SharedData>) -> impl Responder {
	HttpResponse::Ok().json(Status {
		ts: Timestamp::now(),
		status: "ok",
		records: data.chain.total_records(),
		predecessors: data.chain.len(),
	})
}

/// Registers every endpoint of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_message).service(get_status);
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::{App, http::StatusCode, test};
	use phrase_gen_core::{ChainConfig, Pipeline};

	fn shared(lines: &[&str], weighted: bool) -> web::Data<SharedData> {
		let chain = Arc::new(Chain::new());
		let pipeline = Pipeline::new(Arc::clone(&chain), ChainConfig::default());
		pipeline.ingest(lines.iter().copied());
		if weighted {
			chain.calculate_cells();
		}
		web::Data::new(SharedData {
			chain,
			generator: Generator::default(),
		})
	}

	#[actix_web::test]
	async fn message_wraps_a_sentence() {
		let app = test::init_service(App::new().app_data(shared(&["The cat sat."], true)).configure(configure)).await;
		let req = test::TestRequest::get().uri("/v1/message").to_request();
		let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

		assert_eq!(body["text"], "the cat sat.");
		assert_eq!(body["id"].as_str().map(str::len), Some(32));
		assert!(body["ts"]["seconds"].as_u64().is_some());
	}

	#[actix_web::test]
	async fn unweighted_chain_is_a_server_error() {
		let app = test::init_service(App::new().app_data(shared(&["The cat sat."], false)).configure(configure)).await;
		let req = test::TestRequest::get().uri("/v1/message").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[actix_web::test]
	async fn status_reports_ok() {
		let app = test::init_service(App::new().app_data(shared(&["A b."], true)).configure(configure)).await;
		let req = test::TestRequest::get().uri("/v1/status").to_request();
		let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

		assert_eq!(body["status"], "ok");
		assert_eq!(body["records"], 3);
		assert_eq!(body["predecessors"], 3);
	}
}
