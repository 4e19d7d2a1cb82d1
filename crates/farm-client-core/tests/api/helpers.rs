use actix_web::{http::header, web, App, HttpRequest, HttpResponse, HttpServer};
use farm_client_core::{
    storage::{KeyValueStore, MemoryStore},
    ApiClient, AuthContext, SimulatedDelays, UserDirectory,
};
use farm_shared::{
    req_args::LoginReqArgs,
    telemetry::{self, get_subscriber, init_subscriber},
    token::TokenPair,
};
use std::{
    io::{Read as _, Write as _},
    net::TcpListener,
    ops::Deref,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, LazyLock, Mutex,
    },
};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const STANDARD_EMAIL: &str = "user@example.com";
pub const STANDARD_PASSWORD: &str = "user123";

pub const STALE_ACCESS: &str = "stale-access";
pub const FRESH_ACCESS: &str = "fresh-access";
pub const GOOD_REFRESH: &str = "good-refresh";
pub const ROTATED_REFRESH: &str = "rotated-refresh";

// Ensure that the `tracing` stack is only initialised once
pub static TRACING: LazyLock<String> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let log_file_name = format!("client_core_tests{}", std::process::id());
        let (file, path) = telemetry::create_trace_file(&log_file_name).unwrap();
        let subscriber = get_subscriber(subscriber_name, default_filter_level, file);
        init_subscriber(subscriber).unwrap();
        format!("Traces for tests being written to: {path:?}")
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber).unwrap();
        "Traces set to std::io::sink".to_string()
    }
});

fn start_tracing() {
    // Accessing TRACING also forces the LazyLock to initialize
    let logging_msg = TRACING.deref();
    println!("{logging_msg}");
}

/// Empty function for use when a call back isn't needed
pub fn no_cb() {}

pub struct TestContext {
    pub context: AuthContext,
    pub directory: UserDirectory,
    pub store: Arc<dyn KeyValueStore>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        start_tracing();
        let directory = UserDirectory::with_seed_users().expect("failed to seed directory");
        let context = AuthContext::new(directory.clone(), store.clone())
            .with_delays(SimulatedDelays::NONE);
        Self {
            context,
            directory,
            store,
        }
    }

    pub async fn login_admin(&self) {
        self.context
            .login(LoginReqArgs::new(ADMIN_EMAIL, ADMIN_PASSWORD.into()))
            .await
            .expect("admin login failed");
    }

    pub async fn login_standard(&self) {
        self.context
            .login(LoginReqArgs::new(STANDARD_EMAIL, STANDARD_PASSWORD.into()))
            .await
            .expect("standard login failed");
    }
}

/// How the fake backend answers token refresh requests
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReply {
    #[default]
    NewTokens,
    Rejected,
    /// Success status but not a token pair
    MalformedBody,
}

/// Counts what a fake backend saw
#[derive(Debug, Default)]
pub struct BackendState {
    refresh_reply: RefreshReply,
    livestock_hits: AtomicUsize,
    reports_hits: AtomicUsize,
    refresh_hits: AtomicUsize,
    seen_authorization: Mutex<Vec<Option<String>>>,
}

impl BackendState {
    pub fn livestock_hits(&self) -> usize {
        self.livestock_hits.load(Ordering::SeqCst)
    }

    pub fn reports_hits(&self) -> usize {
        self.reports_hits.load(Ordering::SeqCst)
    }

    pub fn refresh_hits(&self) -> usize {
        self.refresh_hits.load(Ordering::SeqCst)
    }

    pub fn seen_authorization(&self) -> Vec<Option<String>> {
        self.seen_authorization.lock().unwrap().clone()
    }

    fn record_authorization(&self, req: &HttpRequest) -> Option<String> {
        let value = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|x| x.to_str().ok())
            .map(str::to_string);
        self.seen_authorization.lock().unwrap().push(value.clone());
        value
    }
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized()
        .json(serde_json::json!({"detail": "Given token not valid for any token type"}))
}

async fn livestock(req: HttpRequest, state: web::Data<BackendState>) -> HttpResponse {
    state.livestock_hits.fetch_add(1, Ordering::SeqCst);
    let expected = format!("Bearer {FRESH_ACCESS}");
    if state.record_authorization(&req).as_deref() == Some(expected.as_str()) {
        HttpResponse::Ok().json(serde_json::json!([
            {"tag_number": "COW001", "animal_type": "Cattle"},
            {"tag_number": "GOAT001", "animal_type": "Goat"},
        ]))
    } else {
        unauthorized()
    }
}

async fn reports(req: HttpRequest, state: web::Data<BackendState>) -> HttpResponse {
    state.reports_hits.fetch_add(1, Ordering::SeqCst);
    state.record_authorization(&req);
    unauthorized()
}

async fn refresh(
    body: web::Json<serde_json::Value>,
    state: web::Data<BackendState>,
) -> HttpResponse {
    state.refresh_hits.fetch_add(1, Ordering::SeqCst);
    if body.get("refresh").and_then(|x| x.as_str()) != Some(GOOD_REFRESH) {
        return unauthorized();
    }
    match state.refresh_reply {
        RefreshReply::NewTokens => HttpResponse::Ok().json(serde_json::json!({
            "access": FRESH_ACCESS,
            "refresh": ROTATED_REFRESH,
        })),
        RefreshReply::Rejected => unauthorized(),
        RefreshReply::MalformedBody => {
            HttpResponse::Ok().json(serde_json::json!({"detail": "token refreshed"}))
        }
    }
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "API is running correctly",
        "version": "1.0.0",
    }))
}

pub struct TestBackend {
    pub api_url: String,
    pub state: web::Data<BackendState>,
}

impl TestBackend {
    pub async fn spawn(refresh_reply: RefreshReply) -> Self {
        let state = web::Data::new(BackendState {
            refresh_reply,
            ..Default::default()
        });
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let server_state = state.clone();
        let server = HttpServer::new(move || {
            App::new().app_data(server_state.clone()).service(
                web::scope("/api")
                    .route("/livestock/", web::get().to(livestock))
                    .route("/reports/", web::get().to(reports))
                    .route("/token/refresh/", web::post().to(refresh))
                    .route("/health-check/", web::get().to(health_check)),
            )
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen on test port")
        .run();
        tokio::spawn(server);
        Self {
            api_url: format!("http://127.0.0.1:{port}/api"),
            state,
        }
    }

    /// Client for a logged in admin holding an expired access token
    pub async fn admin_client_with_stale_token(&self) -> ApiClient {
        admin_client_with_stale_token(&self.api_url).await
    }
}

pub async fn admin_client_with_stale_token(api_url: &str) -> ApiClient {
    let test_context = TestContext::new();
    test_context.login_admin().await;
    test_context
        .context
        .store_tokens(TokenPair::new(STALE_ACCESS, GOOD_REFRESH));
    ApiClient::new(api_url.to_string(), test_context.context)
}

/// Backend on a plain socket that answers the first request with a 401 and
/// then hangs up on every later connection without replying.
///
/// Returns the api url and the request lines received
pub fn spawn_hang_up_backend() -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let request_lines = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&request_lines);
    std::thread::spawn(move || {
        for (i, stream) in listener.incoming().enumerate() {
            let Ok(mut stream) = stream else {
                break;
            };
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap_or(0);
            let head = String::from_utf8_lossy(&buf[..n]);
            let request_line = head
                .lines()
                .next()
                .unwrap_or_default()
                .trim_end_matches(" HTTP/1.1")
                .to_string();
            seen.lock().unwrap().push(request_line);
            if i == 0 {
                let body = r#"{"detail":"Given token not valid for any token type"}"#;
                let _ = write!(
                    stream,
                    "HTTP/1.1 401 Unauthorized\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
            }
            // Stream dropped here which closes the connection
        }
    });
    (format!("http://127.0.0.1:{port}/api"), request_lines)
}
