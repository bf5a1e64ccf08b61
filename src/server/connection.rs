// Connection handling module
// Accepts a single TCP connection and serves it with hyper

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppState;
use crate::handler;
use crate::http;
use crate::logger;

/// How often an idle keep-alive connection is checked against its timeout
const IDLE_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Accept and process a connection, checking limits and logging.
///
/// Connections above `performance.max_connections` are dropped.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
) {
    let counter = &state.active_connections;
    // Increment first, then check the limit so concurrent accepts can't overshoot
    let prev_count = counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    if let Err(e) = stream.set_nodelay(true) {
        logger::log_debug(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// Request activity on one connection, used for the keep-alive idle timeout
struct ConnectionActivity {
    started: Instant,
    /// Milliseconds since `started` when the last request finished
    last_done_ms: AtomicU64,
    in_flight: AtomicUsize,
}

impl ConnectionActivity {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            last_done_ms: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn begin(self: &Arc<Self>) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(Arc::clone(self))
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Time since the last request finished; `None` while a request is running
    fn idle_for(&self) -> Option<Duration> {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return None;
        }
        let idle_ms = self
            .elapsed_ms()
            .saturating_sub(self.last_done_ms.load(Ordering::SeqCst));
        Some(Duration::from_millis(idle_ms))
    }
}

/// Marks a request finished even if its future is dropped mid-flight
struct InFlightGuard(Arc<ConnectionActivity>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.last_done_ms.store(self.0.elapsed_ms(), Ordering::SeqCst);
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serve one connection on its own task.
///
/// - `read_timeout` bounds reading each request head
/// - `write_timeout` bounds handling one request and building its response
/// - `keep_alive_timeout` closes a connection idle between requests
///   (0 disables keep-alive)
/// - shutdown closes idle connections at once and busy ones after their
///   current response
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<AppState>,
) {
    let mut shutdown_rx = state.subscribe_shutdown();

    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let request_timeout = Duration::from_secs(performance.write_timeout);
        let keep_alive = (performance.keep_alive_timeout > 0)
            .then(|| Duration::from_secs(performance.keep_alive_timeout));

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(performance.read_timeout))
            .keep_alive(keep_alive.is_some());

        let activity = Arc::new(ConnectionActivity::new());
        let service_state = Arc::clone(&state);
        let service_activity = Arc::clone(&activity);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                let guard = service_activity.begin();
                async move {
                    let result = tokio::time::timeout(
                        request_timeout,
                        handler::handle_request(req, state, peer_addr),
                    )
                    .await;
                    drop(guard);
                    match result {
                        Ok(response) => response,
                        Err(_) => {
                            logger::log_warning(&format!(
                                "Request from {peer_addr} timed out after {} seconds",
                                request_timeout.as_secs()
                            ));
                            Ok(http::build_text_response(
                                StatusCode::REQUEST_TIMEOUT,
                                "408 Request Timeout",
                            ))
                        }
                    }
                }
            }),
        );
        tokio::pin!(conn);

        let mut closing = *shutdown_rx.borrow();
        if closing {
            conn.as_mut().graceful_shutdown();
        }
        let mut idle_check = tokio::time::interval(IDLE_CHECK_INTERVAL);

        let result = loop {
            tokio::select! {
                res = conn.as_mut() => break res,
                _ = shutdown_rx.changed(), if !closing => {
                    closing = true;
                    conn.as_mut().graceful_shutdown();
                }
                _ = idle_check.tick(), if !closing && keep_alive.is_some() => {
                    let expired = matches!(
                        (activity.idle_for(), keep_alive),
                        (Some(idle), Some(limit)) if idle >= limit
                    );
                    if expired {
                        logger::log_debug(&format!("Closing idle connection from {peer_addr}"));
                        closing = true;
                        conn.as_mut().graceful_shutdown();
                    }
                }
            }
        };

        if let Err(err) = result {
            if err.is_timeout() {
                logger::log_warning(&format!("Timed out reading request head from {peer_addr}"));
            } else {
                logger::log_connection_error(&err);
            }
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_idle_only_between_requests() {
        let activity = Arc::new(ConnectionActivity::new());
        assert!(activity.idle_for().is_some());

        let guard = activity.begin();
        assert_eq!(activity.idle_for(), None);

        drop(guard);
        let idle = activity.idle_for().unwrap();
        assert!(idle < Duration::from_secs(1));
    }
}
