use std::fs::File;
use std::io::Cursor;
use std::path::{Component, Path};
use std::str::FromStr;

use tiny_http::{Header, Request, Response, ResponseBox};

use crate::error::Error;
use crate::server::Handler;

/// Answer one request, logging the path and outcome around the handler.
///
/// A handler fault turns into a 500 carrying the fault message; it never
/// takes the serve loop down with it.
pub(crate) fn handle(root: &Path, request: Request, handler: &Handler) {
    let url = request.url().to_owned();
    match request.remote_addr() {
        Some(remote) => log::info!("Received request for {url} from {remote}"),
        None => log::info!("Received request for {url}"),
    }

    match handler(root, &url) {
        Ok(response) => {
            let status = response.status_code().0;
            if let Err(e) = request.respond(response) {
                log::error!("Failed to answer request for {url}: {e}");
            } else {
                log::info!("Served {url} ({status})");
            }
        }
        Err(e) => {
            log::error!("Error serving {url}: {e}");
            let response =
                Response::from_string(format!("Error: {e}")).with_status_code(500);
            if let Err(e) = request.respond(response) {
                log::error!("Failed to answer request for {url}: {e}");
            }
        }
    }
}

/// Resolve a request path against the served directory.
///
/// This is the default handler: an existing file is served with its guessed
/// content type, a directory falls back to its `index.html` or a generated
/// listing, anything else is a 404.
pub(crate) fn serve_file(root: &Path, url: &str) -> Result<ResponseBox, Error> {
    // querystrings (cachebusters and the like) never name files on disk
    let mut req_path = url.to_owned();
    if let Some(position) = req_path.rfind('?') {
        req_path.truncate(position);
    }

    // only plain components may reach into the served directory
    let rel_path = Path::new(req_path.trim_start_matches('/'));
    if rel_path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Ok(not_found());
    }

    let path = root.join(rel_path);
    let serve_path = if path.is_file() {
        path.clone()
    } else {
        path.join("index.html")
    };

    if serve_path.is_file() {
        let file = File::open(&serve_path).map_err(Error::new)?;
        let mut response = Response::from_file(file);
        if let Some(mime) = mime_guess::MimeGuess::from_path(&serve_path).first_raw() {
            response.add_header(content_type(mime));
        }
        Ok(response.boxed())
    } else if path.is_dir() {
        Ok(listing(&path, &req_path)?.boxed())
    } else {
        Ok(not_found())
    }
}

fn listing(path: &Path, req_path: &str) -> Result<Response<Cursor<Vec<u8>>>, Error> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(path).map_err(Error::new)? {
        let entry = entry.map_err(Error::new)?;
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().map_err(Error::new)?.is_dir() {
            name.push('/');
        }
        names.push(name);
    }
    names.sort_by(|a, b| natord::compare_ignore_case(a, b));

    let base = if req_path.ends_with('/') {
        req_path.to_owned()
    } else {
        format!("{req_path}/")
    };

    let mut items = String::new();
    for name in &names {
        items += &format!(
            r#"<li><a href="{}">{}</a></li>"#,
            html_escape::encode_double_quoted_attribute(&format!("{base}{name}")),
            html_escape::encode_text(name),
        );
    }

    let title = format!("Index of {}", html_escape::encode_text(req_path));
    let html = format!(
        "<!DOCTYPE html>\n<html><head><title>{title}</title></head>\n\
         <body><h1>{title}</h1><ul>{items}</ul></body></html>"
    );

    Ok(Response::from_string(html).with_header(content_type("text/html")))
}

fn not_found() -> ResponseBox {
    Response::from_string("<h1><center>404: Nothing here</center></h1>")
        .with_status_code(404)
        .with_header(content_type("text/html"))
        .boxed()
}

fn content_type(mime: &str) -> Header {
    Header::from_str(&format!("Content-Type: {mime}")).expect("formatted correctly")
}
