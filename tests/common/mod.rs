#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, TimeZone, Utc};
use eosc_perf::{
    AppState, Identity, Migrator, PageLimits,
    entities::{
        ApprovalStatus, benchmark, benchmark_result, flavor, result_tags, site, tag, user,
    },
    router,
};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

pub const ISSUER: &str = "https://aai.egi.eu/oidc";

/// Ids of the seeded catalog.
#[derive(Debug, Clone)]
pub struct Fixtures {
    pub tag_gpu: Uuid,
    pub tag_cpu: Uuid,
    pub benchmark_ab: Uuid,
    pub benchmark_cd: Uuid,
    pub benchmark_review: Uuid,
    pub site_kit: Uuid,
    pub site_cesga: Uuid,
    pub site_review: Uuid,
    pub flavor_large: Uuid,
    pub flavor_gpu: Uuid,
    /// In execution order.
    pub results: Vec<Uuid>,
    pub documents: Vec<(Uuid, Value)>,
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

async fn insert_user(db: &DatabaseConnection, sub: &str) -> Result<(), DbErr> {
    user::ActiveModel {
        iss: Set(ISSUER.to_string()),
        sub: Set(sub.to_string()),
        email: Set(format!("{sub}@example.com")),
        registration_datetime: Set(at(2019, 1, 1, 0, 0)),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn insert_tag(db: &DatabaseConnection, name: &str, description: &str) -> Result<Uuid, DbErr> {
    let id = Uuid::new_v4();
    tag::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        description: Set(Some(description.to_string())),
    }
    .insert(db)
    .await?;
    Ok(id)
}

async fn insert_benchmark(
    db: &DatabaseConnection,
    image: &str,
    docker_tag: &str,
    status: ApprovalStatus,
    uploader: &str,
) -> Result<Uuid, DbErr> {
    let id = Uuid::new_v4();
    benchmark::ActiveModel {
        id: Set(id),
        docker_image: Set(image.to_string()),
        docker_tag: Set(docker_tag.to_string()),
        description: Set(Some(format!("Benchmark packaged as {image}:{docker_tag}"))),
        status: Set(status),
        uploader_iss: Set(ISSUER.to_string()),
        uploader_sub: Set(uploader.to_string()),
        upload_datetime: Set(at(2019, 6, 1, 12, 0)),
    }
    .insert(db)
    .await?;
    Ok(id)
}

async fn insert_site(
    db: &DatabaseConnection,
    name: &str,
    address: &str,
    status: ApprovalStatus,
    uploader: &str,
    uploaded: DateTime<Utc>,
) -> Result<Uuid, DbErr> {
    let id = Uuid::new_v4();
    site::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        address: Set(address.to_string()),
        description: Set(None),
        status: Set(status),
        uploader_iss: Set(ISSUER.to_string()),
        uploader_sub: Set(uploader.to_string()),
        upload_datetime: Set(uploaded),
    }
    .insert(db)
    .await?;
    Ok(id)
}

async fn insert_flavor(db: &DatabaseConnection, name: &str, site_id: Uuid) -> Result<Uuid, DbErr> {
    let id = Uuid::new_v4();
    flavor::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        description: Set(None),
        site_id: Set(site_id),
        status: Set(ApprovalStatus::Approved),
        uploader_iss: Set(ISSUER.to_string()),
        uploader_sub: Set("alice".to_string()),
        upload_datetime: Set(at(2019, 6, 1, 12, 0)),
    }
    .insert(db)
    .await?;
    Ok(id)
}

struct NewResult {
    executed: DateTime<Utc>,
    document: Value,
    benchmark_id: Uuid,
    site_id: Uuid,
    flavor_id: Uuid,
    tags: Vec<Uuid>,
    uploader: &'static str,
}

async fn insert_result(db: &DatabaseConnection, new: NewResult) -> Result<Uuid, DbErr> {
    let id = Uuid::new_v4();
    benchmark_result::ActiveModel {
        id: Set(id),
        execution_datetime: Set(new.executed),
        json: Set(new.document),
        benchmark_id: Set(new.benchmark_id),
        site_id: Set(new.site_id),
        flavor_id: Set(new.flavor_id),
        uploader_iss: Set(ISSUER.to_string()),
        uploader_sub: Set(new.uploader.to_string()),
        upload_datetime: Set(new.executed),
    }
    .insert(db)
    .await?;
    for tag_id in new.tags {
        result_tags::ActiveModel {
            result_id: Set(id),
            tag_id: Set(tag_id),
        }
        .insert(db)
        .await?;
    }
    Ok(id)
}

/// Two users, two tags, three benchmarks, three sites, two flavors and
/// five results with varied JSON documents.
pub async fn seed(db: &DatabaseConnection) -> Result<Fixtures, DbErr> {
    insert_user(db, "alice").await?;
    insert_user(db, "bob").await?;

    let tag_gpu = insert_tag(db, "gpu-tests", "Runs on accelerators").await?;
    let tag_cpu = insert_tag(db, "cpu", "Processor only").await?;

    let benchmark_ab = insert_benchmark(db, "a/b", "v1", ApprovalStatus::Approved, "alice").await?;
    let benchmark_cd =
        insert_benchmark(db, "c/d", "latest", ApprovalStatus::Approved, "bob").await?;
    let benchmark_review =
        insert_benchmark(db, "e/f", "dev", ApprovalStatus::OnReview, "alice").await?;

    let site_kit = insert_site(
        db,
        "KIT-SCC",
        "Karlsruhe",
        ApprovalStatus::Approved,
        "alice",
        at(2019, 9, 7, 8, 0),
    )
    .await?;
    let site_cesga = insert_site(
        db,
        "CESGA",
        "Santiago de Compostela",
        ApprovalStatus::Approved,
        "bob",
        at(2019, 9, 8, 23, 59),
    )
    .await?;
    let site_review = insert_site(
        db,
        "IFCA",
        "Instituto de Física de Cantabria, Santander",
        ApprovalStatus::OnReview,
        "alice",
        at(2019, 9, 9, 0, 0),
    )
    .await?;

    let flavor_large = insert_flavor(db, "m1.large", site_kit).await?;
    let flavor_gpu = insert_flavor(db, "gpu.small", site_cesga).await?;

    let rows = vec![
        NewResult {
            executed: at(2020, 1, 10, 9, 0),
            document: json!({"cpu": {"count": 8, "model": "Xeon"}, "score": 10.5}),
            benchmark_id: benchmark_ab,
            site_id: site_kit,
            flavor_id: flavor_large,
            tags: vec![tag_gpu],
            uploader: "alice",
        },
        NewResult {
            executed: at(2020, 2, 15, 9, 0),
            document: json!({"cpu": {"count": 2, "model": "EPYC"}, "score": 3}),
            benchmark_id: benchmark_ab,
            site_id: site_cesga,
            flavor_id: flavor_gpu,
            tags: vec![tag_gpu, tag_cpu],
            uploader: "bob",
        },
        NewResult {
            executed: at(2020, 3, 20, 9, 0),
            document: json!({"cpu": {"count": 16}, "score": null}),
            benchmark_id: benchmark_cd,
            site_id: site_kit,
            flavor_id: flavor_large,
            tags: vec![],
            uploader: "alice",
        },
        NewResult {
            executed: at(2020, 4, 25, 9, 0),
            document: json!({"cpu": {"count": "many", "model": "ARM"}, "score": 7}),
            benchmark_id: benchmark_cd,
            site_id: site_cesga,
            flavor_id: flavor_gpu,
            tags: vec![tag_cpu],
            uploader: "bob",
        },
        NewResult {
            executed: at(2020, 5, 30, 23, 30),
            document: json!({"score": 12, "notes": {"ok": true}}),
            benchmark_id: benchmark_ab,
            site_id: site_kit,
            flavor_id: flavor_large,
            tags: vec![],
            uploader: "alice",
        },
    ];

    let mut results = Vec::new();
    let mut documents = Vec::new();
    for row in rows {
        let document = row.document.clone();
        let id = insert_result(db, row).await?;
        results.push(id);
        documents.push((id, document));
    }

    Ok(Fixtures {
        tag_gpu,
        tag_cpu,
        benchmark_ab,
        benchmark_cd,
        benchmark_review,
        site_kit,
        site_cesga,
        site_review,
        flavor_large,
        flavor_gpu,
        results,
        documents,
    })
}

pub async fn setup_test_app() -> (Router, Fixtures) {
    setup_test_app_with_limits(PageLimits::default()).await
}

pub async fn setup_test_app_with_limits(limits: PageLimits) -> (Router, Fixtures) {
    let db = setup_test_db().await.unwrap();
    let fixtures = seed(&db).await.unwrap();
    (router(AppState::new(db).limits(limits)), fixtures)
}

/// Response status, `Content-Range` header and JSON body.
pub struct TestResponse {
    pub status: StatusCode,
    pub content_range: Option<String>,
    pub body: Value,
}

impl TestResponse {
    pub fn ids(&self) -> Vec<Uuid> {
        self.body["items"]
            .as_array()
            .unwrap_or_else(|| panic!("no items in {}", self.body))
            .iter()
            .map(|item| item["id"].as_str().unwrap().parse().unwrap())
            .collect()
    }

    pub fn total(&self) -> u64 {
        self.body["total"].as_u64().unwrap()
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_as(app: &Router, uri: &str, subject: &str) -> TestResponse {
    let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    request
        .extensions_mut()
        .insert(Identity::new(ISSUER, subject));
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_range = response
        .headers()
        .get("content-range")
        .map(|value| value.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    TestResponse {
        status,
        content_range,
        body,
    }
}

/// Percent-encode one query value.
pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
