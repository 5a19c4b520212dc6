use axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use cinema_booking::{
    app,
    booking_page::{
        BookedSeatsClient, BookingPage, ClickOutcome, FetchError, SeatElement, SeatSelectionController, SeatStatus,
    },
    config::{AdminConfig, Config, SecurityConfig},
    store::{seed, BookingStore, MemoryStore},
    AppState,
};

const ALICE: (&str, &str) = ("alice", "alice-pw");
const ADMIN: (&str, &str) = ("root", "root-pw");

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    async fn new() -> Self {
        let config = Config {
            security: SecurityConfig { bcrypt_cost: 4 },
            admin: AdminConfig {
                username: ADMIN.0.to_string(),
                email: "root@example.com".to_string(),
                password: ADMIN.1.to_string(),
            },
            ..Config::default()
        };
        let store = Arc::new(MemoryStore::new());
        seed::seed_catalog(store.as_ref()).await.expect("seed");
        seed::ensure_admin(store.as_ref(), &config.admin, 4).await.expect("admin");

        let router = app(AppState::new(store.clone(), config));
        let app = Self { router, store };
        let res = app
            .send(form("POST", "/register", None, &[("username", ALICE.0), ("email", "alice@example.com"), ("password", ALICE.1)]))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        app
    }

    async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.expect("response")
    }

    async fn movie_id(&self, title: &str) -> i64 {
        self.store
            .list_movies()
            .await
            .unwrap()
            .into_iter()
            .find(|m| m.movie.title == title)
            .expect("movie")
            .movie
            .id
    }
}

fn basic(credentials: (&str, &str)) -> String {
    let encoded = general_purpose::STANDARD.encode(format!("{}:{}", credentials.0, credentials.1));
    format!("Basic {encoded}")
}

fn get(uri: &str, auth: Option<(&str, &str)>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(creds) = auth {
        builder = builder.header(header::AUTHORIZATION, basic(creds));
    }
    builder.body(Body::empty()).expect("request")
}

fn form(method: &str, uri: &str, auth: Option<(&str, &str)>, fields: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(creds) = auth {
        builder = builder.header(header::AUTHORIZATION, basic(creds));
    }
    let body = serde_urlencoded::to_string(fields).expect("form body");
    builder.body(Body::from(body)).expect("request")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn book(app: &TestApp, movie_id: i64, seats: &str, showtime: &str, total: &str) -> axum::response::Response {
    app.send(form(
        "POST",
        &format!("/book/{movie_id}"),
        Some(ALICE),
        &[("seat_ids", seats), ("showtime", showtime), ("total_price", total)],
    ))
    .await
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let res = app.send(get("/health", None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "OK");
}

#[tokio::test]
async fn booked_seats_require_login() {
    let app = TestApp::new().await;
    let id = app.movie_id("Inception").await;

    let res = app.send(get(&format!("/get_booked_seats/{id}/4:00%20PM"), None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["error"], "Please log in to access this resource.");

    let res = app
        .send(get(&format!("/get_booked_seats/{id}/4:00%20PM"), Some((ALICE.0, "wrong"))))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_flow_marks_seats_as_booked() {
    let app = TestApp::new().await;
    let id = app.movie_id("Inception").await;

    let res = book(&app, id, "A1,A2", "4:00 PM", "1000.00").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let confirmation = location(&res);
    assert!(confirmation.starts_with("/confirmation/"));

    let res = app.send(get(&format!("/get_booked_seats/{id}/4:00%20PM"), Some(ALICE))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let seats: Vec<String> = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(seats, vec!["A1", "A2"]);

    let res = app.send(get(&confirmation, Some(ALICE))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["movie"]["title"], "Inception");
    assert_eq!(body["seats"], serde_json::json!(["A1", "A2"]));
    assert_eq!(body["booking"]["total_price"], 1000.0);
}

#[tokio::test]
async fn overlapping_booking_conflicts_only_for_same_showtime() {
    let app = TestApp::new().await;
    let id = app.movie_id("Inception").await;

    assert_eq!(book(&app, id, "A1,A2", "4:00 PM", "1000.00").await.status(), StatusCode::SEE_OTHER);

    let res = book(&app, id, "A2,A3", "4:00 PM", "1000.00").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_text(res).await, "One or more selected seats are already booked.");

    assert_eq!(book(&app, id, "A2,A3", "7:00 PM", "1000.00").await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn invalid_booking_forms_are_rejected() {
    let app = TestApp::new().await;
    let id = app.movie_id("Inception").await;

    let res = book(&app, id, "", "4:00 PM", "0.00").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(res).await, "Please select at least one seat.");

    assert_eq!(book(&app, id, "A1", "1:00 AM", "500.00").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(book(&app, id, "A1", "4:00 PM", "free").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(book(&app, 9999, "A1", "4:00 PM", "500.00").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn confirmation_is_private() {
    let app = TestApp::new().await;
    let id = app.movie_id("Dangal").await;
    let res = book(&app, id, "C5", "2:00 PM", "500.00").await;
    let confirmation = location(&res);

    let res = app
        .send(form("POST", "/register", None, &[("username", "bob"), ("email", "bob@example.com"), ("password", "bob-pw")]))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app.send(get(&confirmation, Some(("bob", "bob-pw")))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = app.send(get("/confirmation/424242", Some(ALICE))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    let res = app
        .send(form("POST", "/register", None, &[("username", "alice"), ("email", "new@example.com"), ("password", "x")]))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_text(res).await, "Username already exists.");

    let res = app
        .send(form("POST", "/register", None, &[("username", "carol"), ("email", "not-an-email"), ("password", "x")]))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn booking_page_lists_showtimes_and_prices() {
    let app = TestApp::new().await;
    let id = app.movie_id("Baahubali").await;
    let res = app.send(get(&format!("/book/{id}"), Some(ALICE))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["showtimes"], serde_json::json!(["3:00 PM", "6:00 PM", "9:00 PM"]));
    assert_eq!(body["classic_price"], 500.0);
    assert_eq!(body["premium_price"], 1000.0);
    assert_eq!(body["theater"]["location"], "Hyderabad");
}

#[tokio::test]
async fn add_movie_is_admin_only_and_needs_title() {
    let app = TestApp::new().await;
    let theater_id = app.store.list_theaters().await.unwrap()[0].id.to_string();
    let fields = |title: &'static str| -> Vec<(&'static str, String)> {
        vec![
            ("title", title.to_string()),
            ("genre", "Drama".to_string()),
            ("showtimes", "1:00 PM, 4:00 PM".to_string()),
            ("theater_id", theater_id.clone()),
        ]
    };
    let add_movie = |auth: (&'static str, &'static str), title: &'static str| {
        let owned = fields(title);
        let pairs: Vec<(&str, &str)> = owned.iter().map(|(k, v)| (*k, v.as_str())).collect();
        form("POST", "/admin/add_movie", Some(auth), &pairs)
    };

    let res = app.send(add_movie(ALICE, "Lagaan")).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.send(add_movie(ADMIN, "   ")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(res).await, "Movie title is required.");

    let res = app.send(add_movie(ADMIN, "Lagaan")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/dashboard");

    let res = app.send(get("/admin/dashboard", Some(ADMIN))).await;
    let movies: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    let lagaan = movies
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["title"] == "Lagaan")
        .expect("new movie listed");
    assert_eq!(lagaan["showtimes"], "1:00 PM,4:00 PM");
}

#[tokio::test]
async fn remove_movie_drops_it_from_catalog() {
    let app = TestApp::new().await;
    let id = app.movie_id("La La Land").await;

    let res = app.send(form("POST", &format!("/admin/remove_movie/{id}"), Some(ADMIN), &[])).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let res = app.send(form("POST", &format!("/admin/remove_movie/{id}"), Some(ADMIN), &[])).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = app.send(get(&format!("/book/{id}"), Some(ALICE))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn seat_prices_are_updated_for_all_theaters() {
    let app = TestApp::new().await;
    let theaters = app.store.list_theaters().await.unwrap();

    let mut fields: Vec<(String, String)> = Vec::new();
    for t in &theaters {
        fields.push((format!("classic_price_{}", t.id), "300".to_string()));
        fields.push((format!("premium_price_{}", t.id), "750.5".to_string()));
    }
    let as_refs: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

    let res = app.send(form("POST", "/admin/seat_prices", Some(ADMIN), &as_refs[1..])).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.send(form("POST", "/admin/seat_prices", Some(ADMIN), &as_refs)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    for t in app.store.list_theaters().await.unwrap() {
        assert_eq!((t.classic_price, t.premium_price), (300.0, 750.5));
    }
}

#[tokio::test]
async fn long_seat_lists_and_showtimes_are_booked() {
    let app = TestApp::new().await;
    let id = app.movie_id("Inception").await;

    let seats: Vec<String> = (10..70).map(|n| format!("A{n}")).collect();
    let seat_ids = seats.join(",");
    assert!(seat_ids.len() > 200);
    let res = book(&app, id, &seat_ids, "7:00 PM", "30000.00").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let res = app.send(get(&format!("/get_booked_seats/{id}/7:00%20PM"), Some(ALICE))).await;
    let booked: Vec<String> = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(booked, seats);

    // сеанс длиннее 50 символов
    let theater_id = app.store.list_theaters().await.unwrap()[0].id.to_string();
    let showtime = "Late night premiere screening with director Q&A at 11:30 PM";
    assert!(showtime.len() > 50);
    let res = app
        .send(form(
            "POST",
            "/admin/add_movie",
            Some(ADMIN),
            &[("title", "Premiere"), ("genre", "Drama"), ("showtimes", showtime), ("theater_id", theater_id.as_str())],
        ))
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let premiere = app.movie_id("Premiere").await;
    assert_eq!(book(&app, premiere, "B1", showtime, "500.00").await.status(), StatusCode::SEE_OTHER);
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}

async fn select_city(app: &TestApp, city: &str) -> axum::response::Response {
    app.send(form("POST", "/select_city", Some(ALICE), &[("city", city)])).await
}

#[tokio::test]
async fn browsing_needs_a_selected_city() {
    let app = TestApp::new().await;

    let res = app.send(get("/browse", Some(ALICE))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/select_city");

    let body = json_body(app.send(get("/select_city", Some(ALICE))).await).await;
    assert_eq!(body["cities"].as_array().unwrap().len(), 12);
    assert!(body["selected_city"].is_null());

    let res = select_city(&app, "Paris").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(res).await, "Please select a valid city.");

    let res = select_city(&app, "Hyderabad").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/browse");

    let body = json_body(app.send(get("/browse", Some(ALICE))).await).await;
    assert_eq!(body["city"], "Hyderabad");
    assert_eq!(body["theaters"].as_array().unwrap().len(), 1);
    assert_eq!(body["theaters"][0]["name"], "PVR Banjara Hills");
    let titles: Vec<&str> = body["movies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Baahubali"]);

    // город без кинотеатров: пустая афиша
    select_city(&app, "Jaipur").await;
    let body = json_body(app.send(get("/browse", Some(ALICE))).await).await;
    assert!(body["movies"].as_array().unwrap().is_empty());

    let body = json_body(app.send(get("/select_city", Some(ALICE))).await).await;
    assert_eq!(body["selected_city"], "Jaipur");
    assert_eq!(app.send(get("/browse", None)).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn recommendations_are_logged_per_city() {
    let app = TestApp::new().await;
    let recommend = |genre: &'static str| form("POST", "/recommend", Some(ALICE), &[("genre", genre)]);

    let res = app.send(recommend("Drama")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/select_city");

    select_city(&app, "Pune").await;
    let res = app.send(recommend("DRAMA")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let movies = json_body(res).await;
    assert_eq!(movies.as_array().unwrap().len(), 1);
    assert_eq!(movies[0]["title"], "3 Idiots");

    // пустой результат не записывается
    let movies = json_body(app.send(recommend("Horror")).await).await;
    assert!(movies.as_array().unwrap().is_empty());

    let res = app.send(recommend("  ")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(res).await, "Genre is required.");

    select_city(&app, "Delhi").await;
    let movies = json_body(app.send(recommend("romance")).await).await;
    assert_eq!(movies[0]["title"], "La La Land");

    let res = app.send(get("/admin/customer_recommendations", Some(ALICE))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let searches = json_body(app.send(get("/admin/customer_recommendations", Some(ADMIN))).await).await;
    let searches = searches.as_array().unwrap();
    assert_eq!(searches.len(), 2);
    assert_eq!(searches[0]["genre"], "romance");
    assert_eq!(searches[0]["recommended_movies"], "La La Land");
    assert_eq!(searches[1]["genre"], "DRAMA");
    assert_eq!(searches[1]["recommended_movies"], "3 Idiots");
}

#[tokio::test]
async fn admin_genre_search_covers_all_cities() {
    let app = TestApp::new().await;

    let res = app
        .send(form("POST", "/admin/view_recommendations", Some(ALICE), &[("genre", "drama")]))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .send(form("POST", "/admin/view_recommendations", Some(ADMIN), &[("genre", "drama")]))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let movies = json_body(res).await;
    let titles: Vec<&str> = movies
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Dangal", "Baahubali", "3 Idiots", "Gujarati Natak"]);

    // поиск администратора в журнал не попадает
    let searches = json_body(app.send(get("/admin/customer_recommendations", Some(ADMIN))).await).await;
    assert!(searches.as_array().unwrap().is_empty());
}

fn seat_grid(form_action: &str, showtime: &str) -> BookingPage {
    BookingPage::new(
        form_action,
        showtime,
        vec![
            SeatElement::new("A1", "500"),
            SeatElement::new("A2", "500"),
            SeatElement::new("P1", "1000"),
        ],
    )
}

#[tokio::test]
async fn controller_books_through_running_server() {
    let app = TestApp::new().await;
    let id = app.movie_id("Interstellar").await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service()).await.unwrap();
    });

    let client = BookedSeatsClient::new(&format!("http://{addr}"), Duration::from_secs(5))
        .unwrap()
        .with_credentials(ALICE.0, ALICE.1);

    // Первый пользователь бронирует A1 и P1
    let mut first = SeatSelectionController::initialize(seat_grid(&format!("/book/{id}"), "6:00 PM")).unwrap();
    first.refresh_booked_seats(&client).await.unwrap();
    assert_eq!(first.click("A1"), ClickOutcome::Selected);
    assert_eq!(first.click("P1"), ClickOutcome::Selected);
    assert_eq!(first.total_price_value(), "1500.00");
    let submission = first.submission().expect("seats selected");
    let booking_id = client.submit_booking(id, &submission).await.unwrap();
    assert!(booking_id > 0);

    // Второй выбрал A1 до обновления, после обновления место занято и из выбора ушло
    let mut second = SeatSelectionController::initialize(seat_grid(&format!("/book/{id}"), "6:00 PM")).unwrap();
    second.click("A1");
    second.click("A2");
    second.refresh_booked_seats(&client).await.unwrap();
    assert_eq!(second.seat_status("A1"), Some(SeatStatus::Booked));
    assert_eq!(second.seat_status("P1"), Some(SeatStatus::Booked));
    assert_eq!(second.seat_ids_value(), "A2");
    assert_eq!(second.total_price_value(), "500.00");

    // Повторная отправка занятых мест отклоняется сервером
    let err = client.submit_booking(id, &submission).await.unwrap_err();
    assert!(matches!(err, FetchError::SeatsTaken));

    // На другом сеансе все места свободны
    let ticket = second.change_showtime("9:00 PM");
    let booked = cinema_booking::booking_page::BookedSeatsSource::booked_seats(&client, id, &ticket.showtime)
        .await
        .unwrap();
    second.apply_booked_seats(&ticket, &booked);
    assert_eq!(second.seat_status("A1"), Some(SeatStatus::Available));
}
