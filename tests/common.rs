use listings_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::factory::{build_state, Repositories},
    domain::models::{
        booking::{Booking, NewBookingParams},
        job::{Job, NotificationTask},
        listing::{Listing, NewListingParams},
        user::User,
    },
    domain::ports::{EmailMessage, EmailService, TaskQueue},
    domain::services::{
        notification::NotificationDispatcher,
        renderer::{load_templates, NotificationRenderer},
    },
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
    Router,
};
use chrono::{NaiveDate, Utc};
use std::str::FromStr;
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::Value;
use tracing::Dispatch;

/// Records every delivered message. The first `failures` sends are refused,
/// and sends to `hang_recipient` never return.
pub struct RecordingEmailService {
    failures_left: AtomicUsize,
    attempts: AtomicUsize,
    sent: Mutex<Vec<EmailMessage>>,
    hang_recipient: Option<String>,
}

#[allow(dead_code)]
impl RecordingEmailService {
    pub fn new(failures: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            hang_recipient: None,
        }
    }

    pub fn hanging_for(mut self, recipient: Option<String>) -> Self {
        self.hang_recipient = recipient;
        self
    }

    pub fn always_failing() -> Self {
        Self::new(usize::MAX)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(stuck) = &self.hang_recipient
            && message.recipients.contains(stuck)
        {
            std::future::pending::<()>().await;
        }
        let refused = self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        if refused {
            return Err(AppError::Mail("connection refused".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// A broker that is down.
pub struct FailingTaskQueue;

#[async_trait]
impl TaskQueue for FailingTaskQueue {
    async fn submit(&self, _task: NotificationTask, _booking_id: &str) -> Result<(), AppError> {
        Err(AppError::InternalWithMsg("broker unavailable".into()))
    }
}

/// In-memory sink for a test's log output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

#[allow(dead_code)]
impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    fn dispatch(&self) -> Dispatch {
        let buffer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || buffer.clone())
            .finish();
        Dispatch::new(subscriber)
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct TestOptions {
    pub mail_failures: usize,
    pub failing_queue: bool,
    pub capture_logs: bool,
    pub hang_recipient: Option<String>,
}

pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub mail: Arc<RecordingEmailService>,
    pub logs: LogBuffer,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            default_from_email: "noreply@test.local".to_string(),
            mail_service_url: None,
            mail_service_token: String::new(),
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            worker_poll_interval: Duration::from_millis(50),
            worker_batch_size: 10,
            worker_concurrency: 4,
            job_lease: chrono::Duration::seconds(60),
        };

        let mail = Arc::new(
            RecordingEmailService::new(options.mail_failures).hanging_for(options.hang_recipient),
        );
        let logs = LogBuffer::default();

        let mut state = build_state(&config, Repositories::sqlite(pool.clone()), mail.clone())
            .expect("Failed to build state");

        if options.failing_queue {
            state.task_queue = Arc::new(FailingTaskQueue);
        }
        if options.capture_logs {
            let renderer = NotificationRenderer::new(Arc::new(load_templates().unwrap()));
            let dispatcher = NotificationDispatcher::new(
                state.booking_repo.clone(),
                state.listing_repo.clone(),
                state.user_repo.clone(),
                mail.clone(),
                renderer,
                config.default_from_email.clone(),
            )
            .with_log(logs.dispatch());
            state.dispatcher = Arc::new(dispatcher);
        }

        let state = Arc::new(state);
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            mail,
            logs,
        }
    }

    pub async fn request(&self, method: &str, uri: &str, auth: Option<&AuthHeaders>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .header("X-CSRF-Token", &auth.csrf_token);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    /// Registers and logs in a user, returning their id and credentials.
    pub async fn sign_up(&self, username: &str, email: &str) -> (String, AuthHeaders) {
        let payload = serde_json::json!({
            "username": username,
            "email": email,
            "password": "correct-horse"
        });
        let response = self.request("POST", "/api/v1/auth/register", None, Some(payload)).await;
        if !response.status().is_success() {
            panic!("Register failed in test helper: status {}", response.status());
        }
        let user_id = parse_body(response).await["id"].as_str().unwrap().to_string();
        let auth = self.login(username, "correct-horse").await;
        (user_id, auth)
    }

    pub async fn login(&self, username: &str, password: &str) -> AuthHeaders {
        let payload = serde_json::json!({
            "username": username,
            "password": password
        });

        let response = self.request("POST", "/api/v1/auth/login", None, Some(payload)).await;

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let cookies: Vec<String> = response.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|h| h.to_str().unwrap().to_string())
            .collect();

        let access_token_cookie = cookies.iter()
            .find(|c| c.contains("access_token="))
            .expect("No access_token cookie returned");

        let start = access_token_cookie.find("access_token=").unwrap() + 13;
        let end = access_token_cookie[start..].find(';').unwrap_or(access_token_cookie.len() - start);
        let access_token = access_token_cookie[start..start+end].to_string();

        let body_json = parse_body(response).await;
        let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();

        AuthHeaders {
            access_token,
            csrf_token
        }
    }

    pub async fn seed_user(&self, username: &str, email: &str) -> User {
        let user = User::new(username.to_string(), email.to_string(), "not-a-real-hash".to_string());
        self.state.user_repo.create(&user).await.unwrap()
    }

    pub async fn seed_listing(&self, host: &User, title: &str) -> Listing {
        let listing = Listing::new(NewListingParams {
            host_id: host.id.clone(),
            title: title.to_string(),
            description: String::new(),
            location: "Lakeside".to_string(),
            price_per_night: 120.0,
        });
        self.state.listing_repo.create(&listing).await.unwrap()
    }

    pub async fn seed_booking(&self, listing: &Listing, guest: &User) -> Booking {
        let booking = Booking::new(NewBookingParams {
            listing_id: listing.id.clone(),
            guest_id: guest.id.clone(),
            check_in: NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2030, 6, 4).unwrap(),
            guests: 2,
        });
        self.state.booking_repo.create(&booking).await.unwrap()
    }

    /// Queues a single job directly, bypassing the booking write path.
    pub async fn queue_job(&self, task: NotificationTask, booking_id: &str) -> Job {
        let job = Job::new(task, booking_id.to_string(), Utc::now());
        self.state.job_repo.create(&job).await.unwrap()
    }

    pub async fn reload_job(&self, job_id: &str) -> Job {
        self.state.job_repo.find_by_id(job_id).await.unwrap().expect("job vanished")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

#[allow(dead_code)]
pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn future_date(days: i64) -> String {
    (Utc::now().date_naive() + chrono::Duration::days(days)).to_string()
}
