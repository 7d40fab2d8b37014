//! HTTP method entry points

use http::Method;
use tether_client::HttpClient;

use crate::builder::core::RequestBuilder;

/// Entry point binding requests to a client.
#[derive(Debug, Clone)]
pub struct Tether {
    client: HttpClient,
}

impl Tether {
    #[must_use]
    pub fn new(client: &HttpClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    #[must_use]
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Start a request; relative targets join the client's base URL.
    #[must_use]
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let config = self.client.request(method, url);
        RequestBuilder::new(self.client.clone(), config)
    }

    #[must_use]
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    #[must_use]
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    #[must_use]
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    #[must_use]
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    #[must_use]
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    #[must_use]
    pub fn head(&self, url: &str) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    #[must_use]
    pub fn options(&self, url: &str) -> RequestBuilder {
        self.request(Method::OPTIONS, url)
    }
}
