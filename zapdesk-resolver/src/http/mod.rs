pub mod reqwest;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ::reqwest::Client,
}
