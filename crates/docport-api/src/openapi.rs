//! OpenAPI document, served at `/apispec.json` and rendered by Swagger UI
//! at `/docs`.

use utoipa::OpenApi;

use crate::handlers::{convert, download, system};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "docport API",
        description = "Document conversion service backed by LibreOffice"
    ),
    paths(
        convert::convert,
        download::download,
        system::health,
        system::reprobe,
        system::index,
    ),
    components(schemas(
        convert::ConvertForm,
        convert::ConvertResponse,
        system::HealthResponse,
    )),
    tags(
        (name = "Conversion", description = "Convert documents and download results"),
        (name = "System", description = "Health checks and service info")
    )
)]
pub struct ApiDoc;
