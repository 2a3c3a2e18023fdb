use strand::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, MockStream};
use strand::{Builder, time};

use rstest::rstest;
use std::io;
use std::thread;
use std::time::Duration;

const OK_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\r\nHello!";
const NOT_FOUND_RESPONSE: &[u8] = b"HTTP/1.1 404 NOT FOUND\r\n\r\nSorry, nothing here.";

/// Reads one request and answers it, like a minimal web server would.
async fn handle_connection<S>(mut stream: S) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = [0u8; 1024];
    let mut len = 0;

    // Read until the end of the request head, or end of stream.
    while !buffer[..len].windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buffer[len..]).await?;
        if n == 0 {
            break;
        }
        len += n;
    }

    let response = if buffer[..len].starts_with(b"GET / HTTP/1.1\r\n") {
        OK_RESPONSE
    } else {
        NOT_FOUND_RESPONSE
    };

    stream.write_all(response).await?;
    stream.flush().await
}

#[rstest]
#[case::index("GET / HTTP/1.1\r\n\r\n", OK_RESPONSE)]
#[case::unknown_path("GET /missing HTTP/1.1\r\n\r\n", NOT_FOUND_RESPONSE)]
fn answers_a_complete_request(#[case] request: &str, #[case] expected: &[u8]) {
    let (stream, handle) = MockStream::with_input(request);

    let result = Builder::new()
        .enable_timer(false)
        .build()
        .block_on(handle_connection(stream));

    assert!(result.is_ok());
    assert_eq!(handle.output(), expected);
    assert_eq!(handle.flushes(), 1);
}

#[test]
fn request_trickling_in_from_another_thread() -> anyhow::Result<()> {
    let (stream, handle) = MockStream::pair();

    let client = {
        let handle = handle.clone();
        thread::spawn(move || {
            for chunk in ["GET / ", "HTTP/1.1\r\n", "Host: localhost\r\n", "\r\n"] {
                thread::sleep(Duration::from_millis(5));
                handle.push_input(chunk);
            }
        })
    };

    Builder::new().build().block_on(handle_connection(stream))?;
    client.join().expect("client thread panicked");

    assert_eq!(handle.output(), OK_RESPONSE);
    Ok(())
}

#[strand::test]
async fn many_connections_share_one_executor() -> anyhow::Result<()> {
    let mut handles = Vec::new();
    let mut peers = Vec::new();

    for i in 0..8 {
        let (stream, peer) = MockStream::pair();
        handles.push(strand::spawn(handle_connection(stream)));

        let request: &[u8] = if i % 2 == 0 {
            b"GET / HTTP/1.1\r\n\r\n"
        } else {
            b"POST / HTTP/1.1\r\n\r\n"
        };
        peers.push((peer, request));
    }

    // Every handler is parked on its empty stream; feed them in reverse.
    time::sleep(Duration::from_millis(5)).await;
    for (peer, request) in peers.iter().rev() {
        peer.push_input(request);
    }

    for handle in handles {
        handle.await??;
    }

    for (i, (peer, _)) in peers.iter().enumerate() {
        let expected = if i % 2 == 0 { OK_RESPONSE } else { NOT_FOUND_RESPONSE };
        assert_eq!(peer.output(), expected);
    }

    Ok(())
}
