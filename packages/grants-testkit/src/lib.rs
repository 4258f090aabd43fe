mod error;

pub use error::{Error, Result};

use std::{
	net::SocketAddr,
	sync::{Arc, Mutex},
	time::Duration,
};

use axum::{
	Json, Router,
	body::Bytes,
	extract::State,
	http::{HeaderMap, Method, StatusCode, Uri},
	response::{IntoResponse, Response},
};
use serde_json::Value;
use tokio::{net::TcpListener, task::JoinHandle};

/// A request captured by [`StubSearchApi`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
	pub method: String,
	pub path: String,
	pub headers: Vec<(String, String)>,
	pub body: Value,
}
impl RecordedRequest {
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

#[derive(Debug, Clone)]
pub struct StubReply {
	pub status: u16,
	pub body: Value,
	pub delay: Option<Duration>,
}
impl StubReply {
	pub fn ok(body: Value) -> Self {
		Self { status: 200, body, delay: None }
	}

	pub fn status(status: u16, body: Value) -> Self {
		Self { status, body, delay: None }
	}

	pub fn delayed(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}
}

/// In-process stand-in for the backend opportunity search API. Every request, on any path, is
/// recorded and answered with the configured reply.
pub struct StubSearchApi {
	addr: SocketAddr,
	state: Arc<StubState>,
	server: JoinHandle<()>,
}
impl StubSearchApi {
	pub async fn start(reply: StubReply) -> Result<Self> {
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let state = Arc::new(StubState { reply, requests: Mutex::new(Vec::new()) });
		let app = Router::new().fallback(handle).with_state(state.clone());
		let server = tokio::spawn(async move {
			if let Err(err) = axum::serve(listener, app).await {
				eprintln!("Stub search API stopped: {err}.");
			}
		});

		Ok(Self { addr, state, server })
	}

	pub fn base_url(&self) -> String {
		format!("http://{}", self.addr)
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.state.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl Drop for StubSearchApi {
	fn drop(&mut self) {
		self.server.abort();
	}
}

struct StubState {
	reply: StubReply,
	requests: Mutex<Vec<RecordedRequest>>,
}

/// A well-formed upstream success payload holding one opportunity per id.
pub fn search_payload(ids: &[i64]) -> Value {
	let data: Vec<Value> = ids
		.iter()
		.map(|id| {
			serde_json::json!({
				"opportunity_id": id,
				"opportunity_number": format!("STUB-{id}"),
				"opportunity_title": format!("Stub opportunity {id}"),
				"agency": "STUB",
				"opportunity_status": "posted",
				"summary": { "post_date": "2024-01-01", "close_date": "2024-12-31" }
			})
		})
		.collect();

	serde_json::json!({
		"message": "Success",
		"status_code": 200,
		"data": data,
		"pagination_info": {
			"page_offset": 1,
			"page_size": 25,
			"total_pages": 1,
			"total_records": ids.len(),
			"order_by": "post_date",
			"sort_direction": "descending"
		}
	})
}

async fn handle(
	State(state): State<Arc<StubState>>,
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	let recorded = RecordedRequest {
		method: method.to_string(),
		path: uri.path().to_string(),
		headers: headers
			.iter()
			.filter_map(|(key, value)| {
				value.to_str().ok().map(|value| (key.as_str().to_string(), value.to_string()))
			})
			.collect(),
		body: serde_json::from_slice(&body).unwrap_or(Value::Null),
	};

	state.requests.lock().unwrap_or_else(|err| err.into_inner()).push(recorded);

	if let Some(delay) = state.reply.delay {
		tokio::time::sleep(delay).await;
	}

	let status = StatusCode::from_u16(state.reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

	(status, Json(state.reply.body.clone())).into_response()
}
