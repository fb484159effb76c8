use crate::models::{Book, BookUpdate, Principal};
use bcrypt::{hash, verify, BcryptError};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Answers whether an identity/secret pair belongs to a known principal.
pub trait CredentialStore: Send + Sync {
    fn verify(&self, identity: &str, secret: &str) -> bool;
}

/// Holds exactly one principal. The secret is kept only as a bcrypt hash.
pub struct SinglePrincipalStore {
    identity: String,
    secret_hash: String,
}

impl SinglePrincipalStore {
    pub fn new(principal: &Principal, cost: u32) -> Result<Self, BcryptError> {
        Ok(Self {
            identity: principal.identity.clone(),
            secret_hash: hash(&principal.secret, cost)?,
        })
    }
}

impl CredentialStore for SinglePrincipalStore {
    fn verify(&self, identity: &str, secret: &str) -> bool {
        if identity.is_empty() || secret.is_empty() || identity != self.identity {
            return false;
        }
        verify(secret, &self.secret_hash).unwrap_or(false)
    }
}

/// Insertion-ordered book collection shared by all workers.
#[derive(Default)]
pub struct BookStore {
    books: Mutex<Vec<Book>>,
}

impl BookStore {
    pub fn new(books: Vec<Book>) -> Self {
        Self {
            books: Mutex::new(books),
        }
    }

    pub fn seeded() -> Self {
        Self::new(vec![
            Book {
                id: 1,
                title: "1984".to_string(),
                author: "George Orwell".to_string(),
            },
            Book {
                id: 2,
                title: "The Great Gatsby".to_string(),
                author: "F. Scott Fitzgerald".to_string(),
            },
        ])
    }

    // every mutation is a single push/assign/remove, so a poisoned Vec is still whole
    fn lock(&self) -> MutexGuard<'_, Vec<Book>> {
        self.books.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn list(&self) -> Vec<Book> {
        self.lock().clone()
    }

    pub fn get(&self, id: i64) -> Option<Book> {
        self.lock().iter().find(|b| b.id == id).cloned()
    }

    /// Appends the book. Returns the book and whether its id was already taken.
    pub fn create(&self, book: Book) -> (Book, bool) {
        let mut books = self.lock();
        let duplicate = books.iter().any(|b| b.id == book.id);
        books.push(book.clone());
        (book, duplicate)
    }

    pub fn update(&self, id: i64, update: BookUpdate) -> Option<Book> {
        let mut books = self.lock();
        let book = books.iter_mut().find(|b| b.id == id)?;
        book.title = update.title;
        book.author = update.author;
        Some(book.clone())
    }

    pub fn delete(&self, id: i64) -> Option<Book> {
        let mut books = self.lock();
        let pos = books.iter().position(|b| b.id == id)?;
        Some(books.remove(pos))
    }
}
