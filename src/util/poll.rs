use std::{
    future::Future,
    pin::pin,
    sync::Arc,
    task::{Context, Poll},
    thread::{self, Thread},
    time::Duration,
};

use futures::task::{waker, ArcWake};

/// Upper bound on one park, for futures that return `Pending` without
/// registering the waker.
const MAX_PARK: Duration = Duration::from_millis(10);

/// Unparks the thread blocked in `poll_until_ready`.
struct ThreadWaker(Thread);

impl ArcWake for ThreadWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.unpark();
    }
}

/// Drives an SDK future to completion from synchronous code, parking the
/// calling thread until the future is woken.
///
/// Must be called from inside the tokio runtime started by `main`, whose
/// worker threads drive the underlying I/O.
pub fn poll_until_ready<Fut: Future>(future: Fut) -> Fut::Output {
    let waker = waker(Arc::new(ThreadWaker(thread::current())));
    let mut context = Context::from_waker(&waker);
    let mut future = pin!(future);

    loop {
        if let Poll::Ready(result) = future.as_mut().poll(&mut context) {
            return result;
        }
        thread::park_timeout(MAX_PARK);
    }
}
