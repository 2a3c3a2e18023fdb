use super::{AsyncRead, AsyncWrite};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// State shared by a [`MockStream`] and its [`MockStreamHandle`].
#[derive(Default)]
struct Shared {
    /// Bytes waiting to be read by the stream.
    input: VecDeque<u8>,

    /// Everything the stream has written.
    output: Vec<u8>,

    /// No more input will arrive once set.
    closed: bool,

    flushes: usize,

    /// Live [`MockStreamHandle`]s. The input closes when the last one goes.
    handles: usize,

    /// Task blocked on an empty read.
    read_waker: Option<Waker>,
}

/// An in-memory byte stream for tests.
///
/// Reading returns the bytes fed through the paired [`MockStreamHandle`];
/// while none are available the reading task is parked until more are
/// pushed or the handle closes the input. Writes are always accepted and
/// recorded for inspection through the handle.
///
/// ```rust,ignore
/// let (mut stream, handle) = MockStream::pair();
/// handle.push_input(b"ping");
/// handle.close();
///
/// serve(&mut stream).await?;
/// assert_eq!(handle.output(), b"pong");
/// ```
pub struct MockStream {
    shared: Arc<Mutex<Shared>>,
}

/// Controls the peer side of a [`MockStream`]. Can be sent to another
/// thread.
///
/// Dropping the last handle hangs up: the input is closed and a parked
/// reader sees end of stream.
pub struct MockStreamHandle {
    shared: Arc<Mutex<Shared>>,
}

impl MockStream {
    /// Creates a stream with no input yet, and the handle feeding it.
    pub fn pair() -> (MockStream, MockStreamHandle) {
        let shared = Arc::new(Mutex::new(Shared {
            handles: 1,
            ..Shared::default()
        }));

        (
            MockStream {
                shared: shared.clone(),
            },
            MockStreamHandle { shared },
        )
    }

    /// Creates a stream that reads `input` and then reaches end of stream.
    pub fn with_input(input: impl AsRef<[u8]>) -> (MockStream, MockStreamHandle) {
        let (stream, handle) = Self::pair();
        handle.push_input(input);
        handle.close();
        (stream, handle)
    }
}

impl MockStreamHandle {
    /// Makes `bytes` available to the stream and wakes a parked reader.
    pub fn push_input(&self, bytes: impl AsRef<[u8]>) {
        let waker = {
            let mut shared = self.shared.lock();
            shared.input.extend(bytes.as_ref());
            shared.read_waker.take()
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Ends the input: once drained, reads return `Ok(0)`.
    pub fn close(&self) {
        let waker = close_input(&mut self.shared.lock());

        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Returns a copy of everything written so far.
    pub fn output(&self) -> Vec<u8> {
        self.shared.lock().output.clone()
    }

    /// Returns how many times the stream was flushed.
    pub fn flushes(&self) -> usize {
        self.shared.lock().flushes
    }
}

/// Marks the input closed and takes the parked reader's waker.
fn close_input(shared: &mut Shared) -> Option<Waker> {
    shared.closed = true;
    shared.read_waker.take()
}

impl Clone for MockStreamHandle {
    fn clone(&self) -> Self {
        self.shared.lock().handles += 1;

        Self {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for MockStreamHandle {
    fn drop(&mut self) {
        let waker = {
            let mut shared = self.shared.lock();
            shared.handles -= 1;

            if shared.handles > 0 {
                return;
            }

            close_input(&mut shared)
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let mut shared = self.shared.lock();

        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        if shared.input.is_empty() {
            if shared.closed {
                return Poll::Ready(Ok(0));
            }

            shared.read_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        let n = buf.len().min(shared.input.len());
        for (slot, byte) in buf.iter_mut().zip(shared.input.drain(..n)) {
            *slot = byte;
        }

        Poll::Ready(Ok(n))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.shared.lock().output.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.shared.lock().flushes += 1;
        Poll::Ready(Ok(()))
    }
}

impl fmt::Debug for MockStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.lock();

        f.debug_struct("MockStream")
            .field("pending_input", &shared.input.len())
            .field("written", &shared.output.len())
            .field("closed", &shared.closed)
            .finish()
    }
}

impl fmt::Debug for MockStreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockStreamHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{AsyncReadExt, AsyncWriteExt};
    use crate::new_executor_and_spawner;
    use crate::test_utils::counting_waker;

    use std::pin::pin;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn read_parks_until_input_arrives() {
        let (mut stream, handle) = MockStream::pair();
        let (waker, wakes) = counting_waker();
        let mut cx = Context::from_waker(&waker);
        let mut buf = [0u8; 8];

        {
            let mut read = pin!(stream.read(&mut buf));
            assert!(read.as_mut().poll(&mut cx).is_pending());

            handle.push_input(b"abc");
            assert_eq!(wakes.count(), 1);

            let Poll::Ready(Ok(n)) = read.as_mut().poll(&mut cx) else {
                panic!("input should be readable");
            };
            assert_eq!(n, 3);
        }

        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn reads_are_bounded_by_the_buffer() {
        let (mut stream, _handle) = MockStream::with_input(b"hello world");
        let (waker, _wakes) = counting_waker();
        let mut cx = Context::from_waker(&waker);
        let mut buf = [0u8; 5];

        let mut chunks = Vec::new();
        loop {
            let polled = pin!(stream.read(&mut buf)).poll(&mut cx);
            match polled {
                Poll::Ready(Ok(0)) => break,
                Poll::Ready(Ok(n)) => chunks.push(buf[..n].to_vec()),
                other => panic!("unexpected read result: {other:?}"),
            }
        }

        assert_eq!(chunks, [b"hello".to_vec(), b" worl".to_vec(), b"d".to_vec()]);
    }

    #[test]
    fn close_wakes_a_parked_reader_with_end_of_stream() {
        let (mut stream, handle) = MockStream::pair();
        let (waker, wakes) = counting_waker();
        let mut cx = Context::from_waker(&waker);
        let mut buf = [0u8; 4];
        let mut read = pin!(stream.read(&mut buf));

        assert!(read.as_mut().poll(&mut cx).is_pending());
        handle.close();

        assert_eq!(wakes.count(), 1);
        assert!(matches!(read.as_mut().poll(&mut cx), Poll::Ready(Ok(0))));
    }

    #[test]
    fn dropping_the_last_handle_hangs_up() {
        let (executor, spawner) = new_executor_and_spawner();
        let (mut stream, handle) = MockStream::pair();

        let mut reader = spawner.spawn(async move {
            let mut buf = [0u8; 8];
            stream.read(&mut buf).await
        });
        drop(spawner);

        assert_eq!(executor.run_until_idle(), 1);
        assert!(!reader.is_finished());

        let other = handle.clone();
        drop(handle);
        assert_eq!(executor.run_until_idle(), 0);

        drop(other);
        executor.run();

        assert!(matches!(reader.try_take(), Some(Ok(Ok(0)))));
    }

    #[test]
    fn echo_driven_by_another_thread() {
        let (executor, spawner) = new_executor_and_spawner();
        let (mut stream, handle) = MockStream::pair();

        let mut server = spawner.spawn(async move {
            let mut buf = [0u8; 16];
            loop {
                let n = stream.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                stream.write_all(&buf[..n]).await?;
            }
            stream.flush().await
        });
        drop(spawner);

        let peer = handle.clone();
        let client = thread::spawn(move || {
            for chunk in ["one ", "two ", "three"] {
                thread::sleep(Duration::from_millis(5));
                peer.push_input(chunk);
            }
            peer.close();
        });

        executor.run();
        client.join().expect("client thread panicked");

        assert!(matches!(server.try_take(), Some(Ok(Ok(())))));
        assert_eq!(handle.output(), b"one two three");
        assert_eq!(handle.flushes(), 1);
    }
}
