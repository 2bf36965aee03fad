pub mod crypto;
pub mod html;
pub mod scanner;
pub mod text;

use std::{sync::OnceLock, time::Duration};

use reqwest::{
    header::{self, HeaderMap},
    ClientBuilder,
};

pub fn get_user_agent<'a>() -> &'a str {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36"
}

/// Shared client for HTML pages. Parsers never touch it; only the api layer
/// performs I/O.
pub fn create_client() -> &'static reqwest::Client {
    static LAZY_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    LAZY_CLIENT.get_or_init(|| {
        let builder = create_client_builder();

        let mut headers = get_default_headers();
        headers.insert(
            header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .parse()
                .unwrap(),
        );

        builder.default_headers(headers).build().unwrap()
    })
}

pub fn create_ajax_client() -> &'static reqwest::Client {
    static LAZY_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    LAZY_CLIENT.get_or_init(|| {
        let builder = create_client_builder();

        let mut headers = get_default_headers();
        headers.insert(header::ACCEPT, "application/json".parse().unwrap());
        headers.insert("X-Requested-With", "XMLHttpRequest".parse().unwrap());

        builder.default_headers(headers).build().unwrap()
    })
}

pub fn create_client_builder() -> reqwest::ClientBuilder {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .read_timeout(Duration::from_secs(30))
        .user_agent(get_user_agent())
        .cookie_store(true)
}

pub fn get_default_headers() -> HeaderMap {
    let mut headers = HeaderMap::default();

    headers.insert(
        header::ACCEPT_ENCODING,
        "gzip, deflate, br".parse().unwrap(),
    );
    headers.insert(header::ACCEPT_LANGUAGE, "ru-RU,ru;q=0.9".parse().unwrap());
    headers.insert(header::CACHE_CONTROL, "no-cache".parse().unwrap());
    headers.insert(header::PRAGMA, "no-cache".parse().unwrap());
    headers.insert(header::CONNECTION, "keep-alive".parse().unwrap());
    headers.insert(header::DNT, "1".parse().unwrap());
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, "1".parse().unwrap());
    headers
}
