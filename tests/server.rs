use std::fs;
use std::io::{Read as _, Write as _};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dir_serve::{Error, Server, ServerBuilder};

fn fixture(files: &[(&str, &str)]) -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        let path = root.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    root
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn start(server: &Arc<Server>) -> thread::JoinHandle<Result<(), Error>> {
    let handle = {
        let server = Arc::clone(server);
        thread::spawn(move || server.serve())
    };

    let deadline = Instant::now() + Duration::from_secs(5);
    while !server.is_running() {
        assert!(Instant::now() < deadline, "server never came up");
        thread::sleep(Duration::from_millis(10));
    }

    handle
}

fn get(port: u16, path: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
    )
    .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

#[test]
fn serves_existing_files() {
    let root = fixture(&[("hello.txt", "hello world")]);
    let server = Arc::new(ServerBuilder::new(root.path()).port(free_port()).build());
    let handle = start(&server);

    let response = get(server.port(), "/hello.txt");
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains("text/plain"), "got: {response}");
    assert!(response.ends_with("hello world"), "got: {response}");

    server.close();
    handle.join().unwrap().unwrap();
}

#[test]
fn missing_files_are_not_found() {
    let root = fixture(&[("hello.txt", "hello world")]);
    let server = Arc::new(ServerBuilder::new(root.path()).port(free_port()).build());
    let handle = start(&server);

    let response = get(server.port(), "/nope.txt");
    assert!(response.starts_with("HTTP/1.1 404"), "got: {response}");

    server.close();
    handle.join().unwrap().unwrap();
}

#[test]
fn serves_the_directory_index() {
    let root = fixture(&[("index.html", "<p>home</p>")]);
    let server = Arc::new(ServerBuilder::new(root.path()).port(free_port()).build());
    let handle = start(&server);

    let response = get(server.port(), "/");
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains("<p>home</p>"), "got: {response}");

    server.close();
    handle.join().unwrap().unwrap();
}

#[test]
fn lists_directories_without_an_index() {
    let root = fixture(&[("notes.txt", "n"), ("media/song.mp3", "")]);
    let server = Arc::new(ServerBuilder::new(root.path()).port(free_port()).build());
    let handle = start(&server);

    let response = get(server.port(), "/");
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains("notes.txt"), "got: {response}");
    assert!(response.contains("media/"), "got: {response}");

    server.close();
    handle.join().unwrap().unwrap();
}

#[test]
fn handler_faults_become_500_and_the_server_survives() {
    let root = fixture(&[]);
    let server = Arc::new(
        ServerBuilder::new(root.path())
            .port(free_port())
            .handler(|_root: &Path, url: &str| {
                if url == "/boom" {
                    Err(Error::new("boom"))
                } else {
                    Ok(tiny_http::Response::from_string("still alive").boxed())
                }
            })
            .build(),
    );
    let handle = start(&server);

    let response = get(server.port(), "/boom");
    assert!(response.starts_with("HTTP/1.1 500"), "got: {response}");
    assert!(response.contains("Error: boom"), "got: {response}");

    // one failed request must not take the loop down
    let response = get(server.port(), "/fine");
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains("still alive"), "got: {response}");

    server.close();
    handle.join().unwrap().unwrap();
}

#[test]
fn close_unblocks_the_serve_loop() {
    let root = fixture(&[]);
    let server = Arc::new(ServerBuilder::new(root.path()).port(free_port()).build());
    let handle = start(&server);

    server.close();
    handle.join().unwrap().unwrap();
    assert!(!server.is_running());
}

#[test]
fn occupied_ports_fall_back_to_the_next_one() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let taken = listener.local_addr().unwrap().port();

    let root = fixture(&[]);
    let server = ServerBuilder::new(root.path()).port(taken).build();

    assert_eq!(server.port(), taken + 1);
    assert_eq!(server.addr(), format!("localhost:{}", taken + 1));
}

#[test]
fn free_ports_are_kept() {
    let port = free_port();

    let root = fixture(&[]);
    let server = ServerBuilder::new(root.path()).port(port).build();

    assert_eq!(server.port(), port);
}
