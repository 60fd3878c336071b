use burrow::config::ServerConfig;
use burrow::files::sandbox::PathSandbox;
use burrow::http::connection::Connection;
use burrow::http::framer::RequestFramer;
use burrow::server::dispatcher::Dispatcher;
use burrow::server::listener;
use std::fs;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn dispatcher(temp: &TempDir) -> Dispatcher {
    Dispatcher::new(PathSandbox::new(temp.path()).unwrap(), 16)
}

/// Runs one connection over an in-memory pipe and returns the raw response.
async fn roundtrip(dispatcher: Dispatcher, request: Vec<u8>) -> Vec<u8> {
    let (mut client, server) = tokio::io::duplex(64);

    let handle = tokio::spawn(async move {
        let mut conn = Connection::new(server, dispatcher, RequestFramer::default());
        conn.run().await
    });

    client.write_all(&request).await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();

    handle.await.unwrap().unwrap();
    response
}

#[tokio::test]
async fn test_connection_serves_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("hello.txt"), "hello there").unwrap();

    let response = roundtrip(
        dispatcher(&temp),
        b"GET /hello.txt HTTP/1.1\r\nHost: x\r\n\r\n".to_vec(),
    )
    .await;

    assert_eq!(
        response,
        b"HTTP/1.1 200 OK\r\n\
          Content-Type: text/plain; charset=UTF-8\r\n\
          Content-Length: 11\r\n\
          Connection: close\r\n\
          \r\n\
          hello there"
            .to_vec()
    );
}

#[tokio::test]
async fn test_connection_unsupported_method() {
    let temp = TempDir::new().unwrap();

    let response = roundtrip(dispatcher(&temp), b"PUT /x HTTP/1.1\r\n\r\n".to_vec()).await;
    assert!(response.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_connection_upload_round_trip() {
    let temp = TempDir::new().unwrap();
    let body = b"--b0undary\r\nContent-Disposition: form-data; name=\"file\"; filename=\"note.txt\"\r\n\r\nhello world\r\n--b0undary--\r\n";
    let mut request = format!(
        "POST /upload?path=/ HTTP/1.1\r\nContent-Type: multipart/form-data; boundary=b0undary\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(body);

    let response = roundtrip(dispatcher(&temp), request).await;

    assert!(response.starts_with(b"HTTP/1.1 200 OK\r\n"));
    assert_eq!(fs::read(temp.path().join("note.txt")).unwrap(), b"hello world");
}

#[tokio::test]
async fn test_connection_closed_early_gets_no_response() {
    let temp = TempDir::new().unwrap();
    let (mut client, server) = tokio::io::duplex(64);

    let handle = tokio::spawn({
        let dispatcher = dispatcher(&temp);
        async move {
            let mut conn = Connection::new(server, dispatcher, RequestFramer::default());
            conn.run().await
        }
    });

    client
        .write_all(b"POST /upload HTTP/1.1\r\nContent-Length: 100\r\n\r\npartial")
        .await
        .unwrap();
    client.shutdown().await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();

    assert!(response.is_empty());
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_listener_serves_over_tcp() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("a")).unwrap();
    fs::write(temp.path().join("b.txt"), "b").unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cfg = ServerConfig {
        max_connections: 2,
        ..ServerConfig::default()
    };
    let server = tokio::spawn({
        let dispatcher = dispatcher(&temp);
        async move { listener::serve(listener, &cfg, dispatcher).await }
    });

    // More requests than permits, one after another
    for _ in 0..4 {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let text = String::from_utf8_lossy(&response);

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.find(">a/</a>").unwrap() < text.find(">b.txt</a>").unwrap());
    }

    server.abort();
}
