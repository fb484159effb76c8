use crate::db::BookStore;
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::models::{Book, BookUpdate};
use actix_web::{delete, get, post, put, web, HttpResponse};
use tracing::{info, warn};

#[get("/books")]
pub async fn list_books(store: web::Data<BookStore>) -> HttpResponse {
    HttpResponse::Ok().json(store.list())
}

#[get("/books/{id}")]
pub async fn get_book(
    store: web::Data<BookStore>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let book = store.get(id.into_inner()).ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(book))
}

#[post("/books")]
pub async fn create_book(
    store: web::Data<BookStore>,
    ctx: AuthContext,
    book: web::Json<Book>,
) -> HttpResponse {
    let (book, duplicate) = store.create(book.into_inner());
    if duplicate {
        warn!("Book id {} now appears more than once", book.id);
    }
    info!("{} created book {}", ctx.claims.identity, book.id);
    HttpResponse::Created().json(book)
}

#[put("/books/{id}")]
pub async fn update_book(
    store: web::Data<BookStore>,
    id: web::Path<i64>,
    update: web::Json<BookUpdate>,
) -> Result<HttpResponse, ApiError> {
    let book = store
        .update(id.into_inner(), update.into_inner())
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(book))
}

#[delete("/books/{id}")]
pub async fn delete_book(
    store: web::Data<BookStore>,
    ctx: AuthContext,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let book = store.delete(id.into_inner()).ok_or(ApiError::NotFound)?;
    info!("{} deleted book {}", ctx.claims.identity, book.id);
    Ok(HttpResponse::NoContent().finish())
}
