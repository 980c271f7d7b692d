/*!
# Query Benchmarks

Cost of the listing pipeline: predicate parsing, query composition and
end-to-end page fetches over an in-memory SQLite catalog.

## Usage

```bash
cargo bench --bench query_benchmarks

# One group only
cargo bench --bench query_benchmarks -- "Result listing"
```

HTML reports are generated in `target/criterion/report/index.html`.
*/

use std::time::Duration;

use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use eosc_perf::{
    Migrator, QueryBuilder, QueryParams,
    core::CatalogResource,
    entities::{
        ApprovalStatus, BenchmarkResult, benchmark, benchmark_result, flavor, site, user,
    },
    fetch_page,
    filtering::parse_predicates,
};
use sea_orm::{ActiveModelTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use tokio::runtime::Runtime;
use uuid::Uuid;

const ISSUER: &str = "https://aai.egi.eu/oidc";

async fn setup_benchmark_db(results: usize) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;

    let uploaded = Utc.with_ymd_and_hms(2020, 5, 21, 10, 0, 0).unwrap();
    user::ActiveModel {
        iss: Set(ISSUER.to_string()),
        sub: Set("bench".to_string()),
        email: Set("bench@example.com".to_string()),
        registration_datetime: Set(uploaded),
    }
    .insert(&db)
    .await?;

    let benchmark_id = Uuid::new_v4();
    benchmark::ActiveModel {
        id: Set(benchmark_id),
        docker_image: Set("deephdc/deep-oc-benchmarks_cnn".to_string()),
        docker_tag: Set("gpu".to_string()),
        description: Set(None),
        status: Set(ApprovalStatus::Approved),
        uploader_iss: Set(ISSUER.to_string()),
        uploader_sub: Set("bench".to_string()),
        upload_datetime: Set(uploaded),
    }
    .insert(&db)
    .await?;

    let site_id = Uuid::new_v4();
    site::ActiveModel {
        id: Set(site_id),
        name: Set("KIT-SCC".to_string()),
        address: Set("Karlsruhe".to_string()),
        description: Set(None),
        status: Set(ApprovalStatus::Approved),
        uploader_iss: Set(ISSUER.to_string()),
        uploader_sub: Set("bench".to_string()),
        upload_datetime: Set(uploaded),
    }
    .insert(&db)
    .await?;

    let flavor_id = Uuid::new_v4();
    flavor::ActiveModel {
        id: Set(flavor_id),
        name: Set("m1.large".to_string()),
        description: Set(None),
        site_id: Set(site_id),
        status: Set(ApprovalStatus::Approved),
        uploader_iss: Set(ISSUER.to_string()),
        uploader_sub: Set("bench".to_string()),
        upload_datetime: Set(uploaded),
    }
    .insert(&db)
    .await?;

    for i in 0..results {
        benchmark_result::ActiveModel {
            id: Set(Uuid::new_v4()),
            execution_datetime: Set(uploaded - chrono::Duration::hours(i as i64)),
            json: Set(json!({
                "cpu": {"count": i % 16, "model": format!("model-{}", i % 4)},
                "score": i as f64 * 1.5,
            })),
            benchmark_id: Set(benchmark_id),
            site_id: Set(site_id),
            flavor_id: Set(flavor_id),
            uploader_iss: Set(ISSUER.to_string()),
            uploader_sub: Set("bench".to_string()),
            upload_datetime: Set(uploaded),
        }
        .insert(&db)
        .await?;
    }

    Ok(db)
}

async fn benchmark_listing(db: &DatabaseConnection, query: &str) -> usize {
    let listing = QueryBuilder::new(BenchmarkResult::filter_spec(), DatabaseBackend::Sqlite)
        .build::<BenchmarkResult>(&QueryParams::parse(query))
        .unwrap();
    fetch_page(db, &listing, None).await.unwrap().items.len()
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parsing");

    let predicates = [
        "cpu.count > 4",
        "machine.cpu.model == Xeon",
        "score <= 12.5",
    ];
    group.bench_function("predicates", |b| {
        b.iter(|| parse_predicates(std::hint::black_box(&predicates)).unwrap());
    });

    let query = "execution_after=2019-09-07&tags_ids[]=4d2c4f4e-7b48-4b2e-9b4e-6d7cc5b4b6a3\
                 &filters[]=cpu.count%20%3E%204&sort_by=-execution_datetime,+id&per_page=50";
    group.bench_function("compose_result_listing", |b| {
        b.iter(|| {
            QueryBuilder::new(BenchmarkResult::filter_spec(), DatabaseBackend::Sqlite)
                .build::<BenchmarkResult>(&QueryParams::parse(std::hint::black_box(query)))
                .unwrap()
        });
    });

    group.finish();
}

fn bench_result_listing(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    for size in [100, 1000] {
        let db = rt.block_on(setup_benchmark_db(size)).unwrap();
        let mut group = c.benchmark_group(format!("Result listing ({size} records)"));
        group.measurement_time(Duration::from_secs(10));

        for query in [
            "",
            "sort_by=-execution_datetime&per_page=100",
            "filters[]=cpu.count%20%3E%204",
            "filters[]=cpu.count%20%3E%204&filters[]=cpu.model%20%3D%3D%20model-1",
        ] {
            group.bench_with_input(BenchmarkId::new("fetch_page", query), &query, |b, query| {
                b.iter(|| rt.block_on(std::hint::black_box(benchmark_listing(&db, query))));
            });
        }

        group.finish();
    }
}

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(30)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_parsing, bench_result_listing
}
criterion_main!(benches);
