//! OpenAPI document generated from the resources' filter specifications,
//! so the documented parameters are exactly the accepted ones.

use std::sync::LazyLock;

use axum::Json;
use utoipa::{
    PartialSchema, ToSchema,
    openapi::{
        ArrayBuilder, ComponentsBuilder, ContentBuilder, InfoBuilder, KnownFormat, ObjectBuilder,
        OpenApi, OpenApiBuilder, PathItem, PathsBuilder, Ref, RefOr, Required, ResponseBuilder,
        Schema, SchemaFormat, Type,
        path::{HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn},
        response::Response,
    },
};

use crate::core::CatalogResource;
use crate::entities::{ApprovalStatus, Benchmark, BenchmarkResult, Flavor, Site, Tag, User};
use crate::errors::ErrorResponse;
use crate::filtering::{FieldKind, FieldSpec, FilterSpec, Page};

fn string_schema(format: Option<KnownFormat>) -> ObjectBuilder {
    ObjectBuilder::new()
        .schema_type(Type::String)
        .format(format.map(SchemaFormat::KnownFormat))
}

fn field_schema(field: &FieldSpec) -> Schema {
    let scalar = match field.kind {
        FieldKind::Text | FieldKind::TextList => string_schema(None),
        FieldKind::Uuid | FieldKind::UuidList => string_schema(Some(KnownFormat::Uuid)),
        FieldKind::Date => string_schema(Some(KnownFormat::Date)),
        FieldKind::Integer => ObjectBuilder::new()
            .schema_type(Type::Integer)
            .minimum(Some(1)),
        FieldKind::Boolean => ObjectBuilder::new().schema_type(Type::Boolean),
    };
    let scalar = match field.one_of {
        Some(allowed) => scalar.enum_values(Some(allowed.iter().copied())),
        None => scalar,
    };
    let scalar = scalar.default(field.default.map(|value| match field.kind {
        FieldKind::Integer => value
            .parse::<u64>()
            .map_or_else(|_| value.into(), serde_json::Value::from),
        _ => value.into(),
    }));

    match field.kind {
        FieldKind::UuidList | FieldKind::TextList => ArrayBuilder::new().items(scalar).into(),
        _ => scalar.into(),
    }
}

fn error_response(description: &str) -> Response {
    ResponseBuilder::new()
        .description(description)
        .content(
            "application/json",
            ContentBuilder::new()
                .schema(Some(Ref::from_schema_name(ErrorResponse::name())))
                .build(),
        )
        .build()
}

fn listing_operation<R: CatalogResource + ToSchema>(
    spec: &FilterSpec,
    operation_id: String,
    summary: String,
) -> PathItem {
    let mut operation = OperationBuilder::new()
        .tag(R::RESOURCE_NAME_PLURAL)
        .operation_id(Some(operation_id))
        .summary(Some(summary))
        .description(Some(R::RESOURCE_DESCRIPTION));

    for field in spec.fields() {
        let name = match field.kind {
            FieldKind::UuidList | FieldKind::TextList => format!("{}[]", field.name),
            _ => field.name.to_string(),
        };
        operation = operation.parameter(
            ParameterBuilder::new()
                .name(name)
                .parameter_in(ParameterIn::Query)
                .required(Required::False)
                .description(Some(field.description))
                .schema(Some(field_schema(field))),
        );
    }

    let page: RefOr<Schema> = Page::<R>::schema();
    let ok = ResponseBuilder::new()
        .description(format!("A page of {}", R::RESOURCE_NAME_PLURAL))
        .content(
            "application/json",
            ContentBuilder::new().schema(Some(page)).build(),
        )
        .build();

    PathItem::new(
        HttpMethod::Get,
        operation
            .response("200", ok)
            .response("400", error_response("Invalid query parameters"))
            .response("401", error_response("`mine` requires an authenticated caller"))
            .response("503", error_response("The store did not answer in time"))
            .build(),
    )
}

fn by_id_operation<R: CatalogResource + ToSchema>() -> PathItem {
    let ok = ResponseBuilder::new()
        .description(format!("The requested {}", R::RESOURCE_NAME_SINGULAR))
        .content(
            "application/json",
            ContentBuilder::new()
                .schema(Some(Ref::from_schema_name(R::name())))
                .build(),
        )
        .build();

    PathItem::new(
        HttpMethod::Get,
        OperationBuilder::new()
            .tag(R::RESOURCE_NAME_PLURAL)
            .operation_id(Some(format!("get_{}", R::RESOURCE_NAME_SINGULAR)))
            .parameter(
                ParameterBuilder::new()
                    .name("id")
                    .parameter_in(ParameterIn::Path)
                    .required(Required::True)
                    .schema(Some(string_schema(Some(KnownFormat::Uuid)))),
            )
            .response("200", ok)
            .response("404", error_response("Not found"))
            .build(),
    )
}

fn listing_paths<R: CatalogResource + ToSchema>(paths: PathsBuilder) -> PathsBuilder {
    let plural = R::RESOURCE_NAME_PLURAL;
    paths
        .path(
            format!("/{plural}"),
            listing_operation::<R>(
                R::filter_spec(),
                format!("list_{plural}"),
                format!("Filtered list of {plural}"),
            ),
        )
        .path(
            format!("/{plural}/search"),
            listing_operation::<R>(
                R::search_spec(),
                format!("search_{plural}"),
                format!("Search {plural} by keywords"),
            ),
        )
}

fn resource_paths<R: CatalogResource + ToSchema>(paths: PathsBuilder) -> PathsBuilder {
    listing_paths::<R>(paths).path(
        format!("/{}/{{id}}", R::RESOURCE_NAME_PLURAL),
        by_id_operation::<R>(),
    )
}

/// Build the document.
#[must_use]
pub fn api_doc() -> OpenApi {
    let paths = PathsBuilder::new();
    let paths = listing_paths::<User>(paths);
    let paths = resource_paths::<Tag>(paths);
    let paths = resource_paths::<Benchmark>(paths);
    let paths = resource_paths::<Site>(paths);
    let paths = resource_paths::<Flavor>(paths);
    let paths = resource_paths::<BenchmarkResult>(paths);

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title("EOSC Performance API")
                .version(env!("CARGO_PKG_VERSION"))
                .description(Some(env!("CARGO_PKG_DESCRIPTION")))
                .build(),
        )
        .paths(paths.build())
        .components(Some(
            ComponentsBuilder::new()
                .schema_from::<ApprovalStatus>()
                .schema_from::<User>()
                .schema_from::<Tag>()
                .schema_from::<Benchmark>()
                .schema_from::<Site>()
                .schema_from::<Flavor>()
                .schema_from::<BenchmarkResult>()
                .schema_from::<ErrorResponse>()
                .build(),
        ))
        .build()
}

static API_DOC: LazyLock<OpenApi> = LazyLock::new(api_doc);

/// `GET /api-spec.json`
pub async fn api_spec() -> Json<OpenApi> {
    Json(API_DOC.clone())
}
