//! Blocking client for the WrappedUp REST API.

use std::io;

use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{Book, Review, WishlistItem};
use crate::error::IngestError;
use crate::ingest::{book_from_api, reviews_from_api, wishlist_from_api, wishlist_item_from_api};
use crate::session::Session;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("not logged in or session expired; run `wrappedup login` again")]
    Unauthorized,
    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("superseded by a newer search")]
    Cancelled,
    #[error("unexpected response: {0}")]
    UnexpectedShape(String),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("session storage: {0}")]
    Session(#[from] io::Error),
}

#[derive(Serialize)]
struct WishlistPayload<'a> {
    book: &'a Book,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    priority: u8,
    #[serde(rename = "isPublic")]
    is_public: bool,
}

impl<'a> From<&'a WishlistItem> for WishlistPayload<'a> {
    fn from(item: &'a WishlistItem) -> Self {
        Self {
            book: &item.book,
            description: item.description.as_deref(),
            priority: item.priority,
            is_public: item.is_public,
        }
    }
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Result<Self, ApiError> {
        Ok(Self {
            http: Client::builder().build()?,
            base_url: base_url.into(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Drops the stored token after the server rejected it.
    pub fn expire_session(&mut self) -> Result<(), ApiError> {
        self.session.logout()?;
        Ok(())
    }

    /// A detached handle for running searches off the UI thread.
    pub fn searcher(&self) -> Searcher {
        Searcher {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: self.session.token().map(str::to_string),
        }
    }

    pub fn fetch_reviews(&mut self) -> Result<Vec<Review>, ApiError> {
        let response = self.send(self.get("/api/reviews/me"))?;
        Ok(reviews_from_api(&json_array(response.json()?)?))
    }

    pub fn fetch_wishlist(&mut self) -> Result<Vec<WishlistItem>, ApiError> {
        let response = self.send(self.get("/api/wishlist"))?;
        Ok(wishlist_from_api(&json_array(response.json()?)?))
    }

    pub fn create_wishlist_item(&mut self, item: &WishlistItem) -> Result<WishlistItem, ApiError> {
        let request = authorize(self.http.post(self.url("/api/wishlist")), self.session.token())
            .json(&WishlistPayload::from(item));
        let response = self.send(request)?;
        Ok(wishlist_item_from_api(&response.json::<Value>()?)?)
    }

    pub fn update_wishlist_item(&mut self, item: &WishlistItem) -> Result<WishlistItem, ApiError> {
        let path = format!("/api/wishlist/{}", item.id);
        let request = authorize(self.http.put(self.url(&path)), self.session.token())
            .json(&WishlistPayload::from(item));
        let response = self.send(request)?;
        Ok(wishlist_item_from_api(&response.json::<Value>()?)?)
    }

    pub fn delete_wishlist_item(&mut self, id: &str) -> Result<(), ApiError> {
        let path = format!("/api/wishlist/{id}");
        let request = authorize(self.http.delete(self.url(&path)), self.session.token());
        self.send(request)?;
        Ok(())
    }

    fn get(&self, path: &str) -> RequestBuilder {
        authorize(self.http.get(self.url(path)), self.session.token())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request. A 401 drops the stored token before reporting;
    /// failing to drop it is reported instead.
    fn send(&mut self, request: RequestBuilder) -> Result<Response, ApiError> {
        match check_status(request.send()?) {
            Err(ApiError::Unauthorized) => {
                self.expire_session()?;
                Err(ApiError::Unauthorized)
            }
            other => other,
        }
    }
}

/// Search handle that can be moved to a worker thread.
#[derive(Clone)]
pub struct Searcher {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl Searcher {
    pub fn search(&self, query: &str) -> Result<Vec<Book>, ApiError> {
        let url = format!("{}/api/books/search", self.base_url);
        debug!("searching catalog for {query:?}");
        let request = authorize(self.http.get(url).query(&[("query", query)]), self.token.as_deref());
        let response = check_status(request.send()?)?;
        let books = books_from_search(response.json()?)?;
        Ok(rank_results(query, books))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

/// Latest-wins bookkeeping for overlapping searches. Results carrying an
/// older ticket are discarded.
#[derive(Debug, Default)]
pub struct SearchGate {
    latest: u64,
}

impl SearchGate {
    pub fn begin(&mut self) -> SearchTicket {
        self.latest += 1;
        SearchTicket(self.latest)
    }

    /// Invalidates any search in flight without starting a new one.
    pub fn cancel(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        ticket.0 == self.latest
    }

    pub fn accept<T>(&self, ticket: SearchTicket, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if self.is_current(ticket) { result } else { Err(ApiError::Cancelled) }
    }
}

/// Orders search results: exact title, title prefix, title substring,
/// author match, everything else. Server order breaks ties.
pub fn rank_results(query: &str, mut books: Vec<Book>) -> Vec<Book> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return books;
    }
    books.sort_by_key(|book| {
        let title = book.title.to_lowercase();
        let author = book.author.as_deref().unwrap_or_default().to_lowercase();
        if title == needle {
            0
        } else if title.starts_with(&needle) {
            1
        } else if title.contains(&needle) {
            2
        } else if author.contains(&needle) {
            3
        } else {
            4
        }
    });
    books
}

fn books_from_search(body: Value) -> Result<Vec<Book>, ApiError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut object) => ["docs", "results", "books"]
            .iter()
            .find_map(|key| match object.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| ApiError::UnexpectedShape("search response has no result list".to_string()))?,
        other => return Err(ApiError::UnexpectedShape(format!("search response was {other}"))),
    };
    Ok(items.iter().filter(|item| item.is_object()).map(book_from_api).collect())
}

fn json_array(body: Value) -> Result<Vec<Value>, ApiError> {
    match body {
        Value::Array(items) => Ok(items),
        other => Err(ApiError::UnexpectedShape(format!("expected a JSON array, got {other}"))),
    }
}

fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use serde_json::json;

    use super::{ApiClient, ApiError, SearchGate, books_from_search, rank_results};
    use crate::domain::Book;
    use crate::session::{MemoryTokenStore, Session, TokenStore};

    /// A token file that can be read but never removed.
    struct ReadOnlyStore;

    impl TokenStore for ReadOnlyStore {
        fn get(&self) -> std::io::Result<Option<String>> {
            Ok(Some("stale-token".to_string()))
        }

        fn set(&mut self, _token: &str) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"))
        }

        fn clear(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    /// Serves one canned response and hands back the request head.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                head.push_str(&line);
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();
            head.push_str(&String::from_utf8_lossy(&request_body));

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            head
        });
        (base_url, handle)
    }

    fn logged_in_session() -> Session {
        let mut session = Session::new(Box::new(MemoryTokenStore::default())).unwrap();
        session.login("secret-token").unwrap();
        session
    }

    #[test]
    fn fetches_and_normalizes_reviews() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"[{"id": 1, "rating": 4, "startDate": "2024-01-01", "end_date": "2024-01-03", "book": {"title": "Dune", "numberOfPages": 412}}]"#,
        );
        let mut client = ApiClient::new(base_url, logged_in_session()).unwrap();

        let reviews = client.fetch_reviews().unwrap();
        let request = server.join().unwrap();
        assert!(request.starts_with("GET /api/reviews/me "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret-token"));
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].book.pages, Some(412));
        assert!(reviews[0].start_date.is_some());
    }

    #[test]
    fn unauthorized_clears_the_session() {
        let (base_url, server) = serve_once("401 Unauthorized", "{}");
        let mut client = ApiClient::new(base_url, logged_in_session()).unwrap();

        let err = client.fetch_wishlist().unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(!client.session().is_authenticated());
    }

    #[test]
    fn unremovable_token_is_reported() {
        let (base_url, server) = serve_once("401 Unauthorized", "{}");
        let session = Session::new(Box::new(ReadOnlyStore)).unwrap();
        let mut client = ApiClient::new(base_url, session).unwrap();

        let err = client.fetch_reviews().unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, ApiError::Session(ref source) if source.kind() == std::io::ErrorKind::PermissionDenied));
        assert!(client.session().is_authenticated());
    }

    #[test]
    fn server_errors_keep_the_session() {
        let (base_url, server) = serve_once("500 Internal Server Error", "boom");
        let mut client = ApiClient::new(base_url, logged_in_session()).unwrap();

        let err = client.delete_wishlist_item("42").unwrap_err();
        let request = server.join().unwrap();
        assert!(request.starts_with("DELETE /api/wishlist/42 "));
        assert!(matches!(err, ApiError::Status { status: 500, ref body } if body == "boom"));
        assert!(client.session().is_authenticated());
    }

    #[test]
    fn creates_wishlist_items_with_camel_case_flags() {
        let (base_url, server) = serve_once(
            "201 Created",
            r#"{"id": 9, "book": {"title": "Piranesi"}, "priority": 4, "isPublic": true, "createdAt": "2024-03-01T12:00:00Z"}"#,
        );
        let mut client = ApiClient::new(base_url, logged_in_session()).unwrap();
        let draft = crate::domain::WishlistDraft {
            book: Book::new("Piranesi", None, None),
            priority: Some(4),
            is_public: true,
            ..Default::default()
        }
        .into_item(chrono::Utc::now())
        .unwrap();

        let created = client.create_wishlist_item(&draft).unwrap();
        let request = server.join().unwrap();
        assert!(request.starts_with("POST /api/wishlist "));
        assert!(request.contains("\"isPublic\":true"));
        assert_eq!(created.id, "9");
        assert!(created.is_public);
    }

    #[test]
    fn newer_searches_win() {
        let mut gate = SearchGate::default();
        let first = gate.begin();
        let second = gate.begin();

        assert!(matches!(gate.accept(first, Ok(1)), Err(ApiError::Cancelled)));
        assert_eq!(gate.accept(second, Ok(2)).unwrap(), 2);

        gate.cancel();
        assert!(!gate.is_current(second));
    }

    #[test]
    fn ranks_title_matches_first() {
        let books = vec![
            Book::new("A History of Dune", None, None),
            Book::new("Unrelated", Some("Dune Fan".to_string()), None),
            Book::new("Nothing", None, None),
            Book::new("Dune Messiah", None, None),
            Book::new("Dune", None, None),
        ];
        let titles = rank_results(" dune ", books)
            .into_iter()
            .map(|book| book.title)
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Dune", "Dune Messiah", "A History of Dune", "Unrelated", "Nothing"]);
    }

    #[test]
    fn accepts_wrapped_and_bare_search_results() {
        let wrapped = books_from_search(json!({"docs": [{"title": "Emma", "number_of_pages_median": 474}]})).unwrap();
        assert_eq!(wrapped[0].pages, Some(474));
        let bare = books_from_search(json!([{"title": "Emma"}, "junk"])).unwrap();
        assert_eq!(bare.len(), 1);
        assert!(matches!(books_from_search(json!({"count": 0})), Err(ApiError::UnexpectedShape(_))));
    }
}
