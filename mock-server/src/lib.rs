use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::warn;

pub const NOW_PATH: &str = "/v3/weather/now.json";

/// A location the stub knows about.
#[derive(Clone, Debug)]
pub struct Fixture {
    pub name: &'static str,
    pub id: &'static str,
    pub timezone: &'static str,
    pub timezone_offset: &'static str,
    pub text: &'static str,
    pub code: &'static str,
    pub temperature: &'static str,
    pub last_update: &'static str,
}

pub static FIXTURES: &[Fixture] = &[
    Fixture {
        name: "chongqing",
        id: "C23NB62W20TF",
        timezone: "America/Los_Angeles",
        timezone_offset: "-07:00",
        text: "多云",
        code: "4",
        temperature: "14",
        last_update: "2015-09-25T22:45:00-07:00",
    },
    Fixture {
        name: "chengdu",
        id: "WM6N2PM3WY2K",
        timezone: "Asia/Shanghai",
        timezone_offset: "+08:00",
        text: "阴",
        code: "9",
        temperature: "20",
        last_update: "2023-04-06T10:30:00+08:00",
    },
];

impl Fixture {
    pub fn document(&self) -> Value {
        json!({
            "results": [{
                "location": {
                    "id": self.id,
                    "timezone": self.timezone,
                    "timezone_offset": self.timezone_offset,
                },
                "now": {
                    "text": self.text,
                    "code": self.code,
                    "temperature": self.temperature,
                },
                "last_update": self.last_update,
            }]
        })
    }
}

pub fn fixture(location: &str) -> Option<&'static Fixture> {
    FIXTURES.iter().find(|f| f.name.eq_ignore_ascii_case(location))
}

#[derive(Deserialize)]
pub struct NowParams {
    pub key: Option<String>,
    pub location: Option<String>,
    pub language: Option<String>,
    pub unit: Option<String>,
}

/// Keys the stub accepts. An empty list accepts any non-empty key.
#[derive(Clone, Default)]
pub struct AcceptedKeys(pub Vec<String>);

pub fn app() -> Router {
    app_with_keys(AcceptedKeys::default())
}

pub fn app_with_keys(keys: AcceptedKeys) -> Router {
    Router::new().route(NOW_PATH, get(now)).with_state(keys)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn now(
    State(keys): State<AcceptedKeys>,
    Query(params): Query<NowParams>,
) -> (StatusCode, Json<Value>) {
    let key = params.key.unwrap_or_default();
    if key.is_empty() || (!keys.0.is_empty() && !keys.0.contains(&key)) {
        return error(StatusCode::FORBIDDEN, "The API key is invalid.", "AP010003");
    }
    if params.unit.as_deref().is_some_and(|u| u != "c" && u != "f") {
        return error(StatusCode::BAD_REQUEST, "Invalid unit.", "AP010001");
    }
    let Some(location) = params.location.as_deref().and_then(fixture) else {
        return error(
            StatusCode::NOT_FOUND,
            "The location can not be found.",
            "AP010010",
        );
    };
    (StatusCode::OK, Json(location.document()))
}

fn error(status: StatusCode, message: &str, code: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "status": message, "status_code": code })))
}

/// Answer every connection on `listener` with `response` verbatim, then close it.
pub async fn serve_raw(listener: TcpListener, response: Vec<u8>) -> Result<(), std::io::Error> {
    loop {
        let (socket, peer) = listener.accept().await?;
        let response = response.clone();
        tokio::spawn(async move {
            if let Err(err) = answer_raw(socket, &response).await {
                warn!(%peer, error = %err, "raw response not delivered");
            }
        });
    }
}

/// Read the request up to its blank line so the client never sees a reset,
/// then write `response` and shut the write side down.
pub async fn answer_raw<S>(mut socket: S, response: &[u8]) -> Result<(), std::io::Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut request = Vec::new();
    let mut buf = [0u8; 512];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await? {
            0 => break,
            n => request.extend_from_slice(&buf[..n]),
        }
    }
    socket.write_all(response).await?;
    socket.shutdown().await
}
