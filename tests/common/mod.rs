#![allow(dead_code)]

use brrtmux::context::Context;
use brrtmux::error::Error;
use http::{Method, Request};

pub fn get(path: &str) -> Request<Vec<u8>> {
    request(Method::GET, path, Vec::new())
}

pub fn request(method: Method, path: &str, body: Vec<u8>) -> Request<Vec<u8>> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(body)
        .unwrap()
}

pub fn noop(_: &mut Context) -> Result<(), Error> {
    Ok(())
}

pub fn body_text(response: &http::Response<Vec<u8>>) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}
