//! Pooled HTTP session and transport-level retries

use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use std::sync::{Condvar, Mutex, PoisonError};
use tracing::{debug, warn};

use crate::client::ClientError;
use crate::config::ClientConfig;

/// Build the default pooled session for `config`
pub fn default_http_client(config: &ClientConfig) -> Result<HttpClient, reqwest::Error> {
    HttpClient::builder()
        .timeout(config.timeout)
        .pool_max_idle_per_host(config.pool_max_size)
        .build()
}

/// Caps the number of sends in flight through one client
///
/// A slot is held while a request is sent and its response headers arrive.
/// Reading the body afterwards happens outside the gate. With `block` set,
/// callers past the limit wait for a slot; otherwise the gate only counts.
#[derive(Debug)]
pub(crate) struct PoolGate {
    limit: usize,
    block: bool,
    in_flight: Mutex<usize>,
    released: Condvar,
}

pub(crate) struct PoolSlot<'a> {
    gate: &'a PoolGate,
}

impl PoolGate {
    pub(crate) fn new(limit: usize, block: bool) -> Self {
        Self {
            limit: limit.max(1),
            block,
            in_flight: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    pub(crate) fn acquire(&self) -> PoolSlot<'_> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if self.block && *in_flight >= self.limit {
            debug!(limit = self.limit, "Connection pool exhausted, waiting for a free slot");
            in_flight = self
                .released
                .wait_while(in_flight, |n| *n >= self.limit)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *in_flight += 1;
        PoolSlot { gate: self }
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PoolSlot<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .gate
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *in_flight -= 1;
        self.gate.released.notify_one();
    }
}

/// Send the request produced by `build`, re-sending on connection failures
///
/// `build` is called once per attempt since multipart bodies cannot be
/// replayed. Only errors raised while connecting are retried; timeouts after
/// the request went out and HTTP error statuses are returned as-is.
pub(crate) fn send_with_retries<F>(max_retries: u32, mut build: F) -> Result<Response, ClientError>
where
    F: FnMut() -> Result<RequestBuilder, ClientError>,
{
    let mut attempt = 0;
    loop {
        match build()?.send() {
            Ok(response) => return Ok(response),
            Err(e) if e.is_connect() && attempt < max_retries => {
                attempt += 1;
                warn!(attempt, max_retries, error = %e, "Connection failed, retrying");
            }
            Err(e) => return Err(ClientError::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}/search/42", port)
    }

    #[test]
    fn test_retries_connection_failures() {
        let http = default_http_client(&ClientConfig::default()).unwrap();
        let url = closed_port_url();
        let mut attempts = 0;

        let result = send_with_retries(3, || {
            attempts += 1;
            Ok(http.post(&url))
        });

        match result {
            Err(ClientError::Http(e)) => assert!(e.is_connect()),
            other => panic!("expected connection error, got {:?}", other.map(|r| r.status())),
        }
        assert_eq!(attempts, 4);
    }

    #[test]
    fn test_build_error_is_not_retried() {
        let mut attempts = 0;
        let result = send_with_retries(3, || {
            attempts += 1;
            Err(ClientError::Unsupported("test"))
        });
        assert!(matches!(result, Err(ClientError::Unsupported("test"))));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_pool_gate_blocks_when_exhausted() {
        let gate = PoolGate::new(2, true);
        let acquired = AtomicBool::new(false);

        std::thread::scope(|s| {
            let first = gate.acquire();
            let _second = gate.acquire();
            assert_eq!(gate.in_flight(), 2);

            let waiter = s.spawn(|| {
                let _third = gate.acquire();
                acquired.store(true, Ordering::SeqCst);
            });

            std::thread::sleep(Duration::from_millis(100));
            assert!(!acquired.load(Ordering::SeqCst));

            drop(first);
            waiter.join().unwrap();
            assert!(acquired.load(Ordering::SeqCst));
        });

        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_pool_gate_without_block_never_waits() {
        let gate = PoolGate::new(1, false);
        let _a = gate.acquire();
        let _b = gate.acquire();
        assert_eq!(gate.in_flight(), 2);
    }
}
