use crate::config::Config;
use crate::error::ApiError;
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;
use serde_json::{json, Value};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Strips anything that could escape the upload directory.
fn sanitize_filename(filename: &str) -> Option<String> {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    let sanitized = sanitized.trim_matches(|c| c == '.' || c == ' ');
    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized.to_string())
    }
}

/// Saves the `image` form field into the upload directory.
#[post("/upload")]
pub async fn upload_file(
    config: web::Data<Config>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let bad_request = |e: actix_multipart::MultipartError| ApiError::BadRequest(e.to_string());

    while let Some(mut field) = payload.try_next().await.map_err(bad_request)? {
        let (name, raw_filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };

        if name.as_deref() != Some("image") {
            // drain fields we don't care about
            while field.try_next().await.map_err(bad_request)?.is_some() {}
            continue;
        }

        let raw_filename = raw_filename
            .ok_or_else(|| ApiError::BadRequest("image field has no filename".to_string()))?;
        let filename = sanitize_filename(&raw_filename)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid filename: {:?}", raw_filename)))?;

        let path = config.upload_dir.join(&filename);
        let written = save_field(&config.upload_dir, &filename, &mut field).await?;

        info!("Saved upload {} ({} bytes)", path.display(), written);
        return Ok(HttpResponse::Ok().body("File upload complete!"));
    }

    Err(ApiError::BadRequest(
        "request has no image file".to_string(),
    ))
}

/// Streams the field into a hidden `.part` file and renames it over
/// `dir/filename` only once the whole body has arrived.
async fn save_field(
    dir: &Path,
    filename: &str,
    field: &mut actix_multipart::Field,
) -> Result<usize, ApiError> {
    let path = dir.join(filename);
    let internal = |e: std::io::Error| ApiError::Internal(format!("{}: {}", path.display(), e));

    fs::create_dir_all(dir).await.map_err(internal)?;

    // sanitized names never start with '.', so this cannot clash with a real upload
    let nonce = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let part = dir.join(format!(".{}.{}.part", filename, nonce));

    let result = match write_part(&part, field).await {
        Ok(written) => fs::rename(&part, &path)
            .await
            .map(|_| written)
            .map_err(internal),
        Err(e) => Err(e),
    };

    if result.is_err() {
        if let Err(e) = fs::remove_file(&part).await {
            warn!("Could not remove {}: {}", part.display(), e);
        }
    }
    result
}

async fn write_part(part: &Path, field: &mut actix_multipart::Field) -> Result<usize, ApiError> {
    let internal = |e: std::io::Error| ApiError::Internal(format!("{}: {}", part.display(), e));
    let mut file = fs::File::create(part).await.map_err(internal)?;

    let mut written = 0;
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        file.write_all(&chunk).await.map_err(internal)?;
        written += chunk.len();
    }
    file.flush().await.map_err(internal)?;
    Ok(written)
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fills `{{Key}}` placeholders with escaped values.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |page, (key, value)| {
        page.replace(&format!("{{{{{}}}}}", key), &escape_html(value))
    })
}

#[get("/test-html")]
pub async fn test_html(config: web::Data<Config>) -> Result<HttpResponse, ApiError> {
    let path = config.views_dir.join("index.html");
    let template = fs::read_to_string(&path)
        .await
        .map_err(|e| ApiError::Internal(format!("{}: {}", path.display(), e)))?;

    let page = render(&template, &[("Title", "Hello, World!"), ("Name", "Nack")]);

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page))
}

fn book_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "integer" },
            "title": { "type": "string" },
            "author": { "type": "string" }
        },
        "required": ["id", "title", "author"]
    })
}

pub fn openapi_document() -> Value {
    let secured = json!([{ "bearerAuth": [] }]);
    let id_param = json!([{
        "name": "id", "in": "path", "required": true,
        "schema": { "type": "integer" }
    }]);

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Book API",
            "description": "This is a sample server for a book API.",
            "version": "1.0"
        },
        "servers": [{ "url": "http://localhost:8080/" }],
        "components": {
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }
            },
            "schemas": { "Book": book_schema() }
        },
        "paths": {
            "/login": {
                "post": {
                    "summary": "Exchange credentials for a bearer token",
                    "requestBody": { "content": { "application/json": { "schema": {
                        "type": "object",
                        "properties": {
                            "email": { "type": "string" },
                            "password": { "type": "string" }
                        }
                    }}}},
                    "responses": {
                        "200": { "description": "Login success" },
                        "400": { "description": "Malformed body" },
                        "401": { "description": "Bad credentials" }
                    }
                }
            },
            "/books": {
                "get": {
                    "summary": "List books",
                    "security": secured,
                    "responses": { "200": { "description": "All books" }, "401": { "description": "Unauthorized" } }
                },
                "post": {
                    "summary": "Create a book",
                    "security": secured,
                    "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Book" } } } },
                    "responses": { "201": { "description": "Created" }, "401": { "description": "Unauthorized" } }
                }
            },
            "/books/{id}": {
                "get": {
                    "summary": "Get a book",
                    "security": secured,
                    "parameters": id_param,
                    "responses": { "200": { "description": "The book" }, "404": { "description": "Not found" } }
                },
                "put": {
                    "summary": "Update a book's title and author",
                    "security": secured,
                    "parameters": id_param,
                    "responses": { "200": { "description": "Updated" }, "404": { "description": "Not found" } }
                },
                "delete": {
                    "summary": "Delete a book",
                    "security": secured,
                    "parameters": id_param,
                    "responses": { "204": { "description": "Deleted" }, "404": { "description": "Not found" } }
                }
            },
            "/upload": {
                "post": {
                    "summary": "Upload a file in the `image` form field",
                    "security": secured,
                    "responses": { "200": { "description": "Saved" }, "400": { "description": "No file" } }
                }
            },
            "/test-html": {
                "get": {
                    "summary": "Render the sample HTML page",
                    "security": secured,
                    "responses": { "200": { "description": "HTML page" }, "401": { "description": "Unauthorized" } }
                }
            },
            "/config": {
                "get": {
                    "summary": "Show the display secret",
                    "security": secured,
                    "responses": { "200": { "description": "Config" } }
                }
            }
        }
    })
}

#[get("/swagger/doc.json")]
pub async fn api_docs() -> HttpResponse {
    HttpResponse::Ok().json(openapi_document())
}

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html>
<head>
    <title>Book API</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({ url: "/swagger/doc.json", dom_id: "#swagger-ui" });
        };
    </script>
</body>
</html>
"##;

/// Swagger UI shell; the assets come from unpkg and read `doc.json`.
#[get("/swagger/index.html")]
pub async fn swagger_ui() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(SWAGGER_UI)
}
