use ::axum::Router;
use ::axum::extract::Request;
use ::axum::handler::Handler;
use ::axum::response::IntoResponse;
use ::axum::response::Response;
use ::axum::routing;
use ::axum::routing::MethodRouter;
use ::axum::routing::Route;
use ::std::convert::Infallible;
use ::std::future::Future;
use ::std::pin::Pin;
use ::std::sync::Arc;
use ::std::sync::RwLock;
use ::std::task::Context;
use ::std::task::Poll;
use ::tower::Layer;
use ::tower::Service;
use ::tower::ServiceExt;

///
/// The routing half of a [`TestServer`](crate::TestServer).
///
/// A `TestRouter` is a cheap clonable handle onto one shared
/// [`axum::Router`]. Routes registered through any clone are visible to
/// every other clone straight away, including to listeners which are
/// already serving. Nothing is snapshotted at bind time.
///
/// ```rust
/// # async fn test() -> Result<(), Box<dyn ::std::error::Error>> {
/// #
/// use ::local_test_server::TestServer;
///
/// let server = TestServer::new().await?;
/// let router = server.router();
///
/// // reachable immediately, even though the server is already listening
/// router.get("/greet", || async { "hello!" });
/// #
/// # Ok(())
/// # }
/// ```
///
#[derive(Debug, Clone, Default)]
pub struct TestRouter {
    router: Arc<RwLock<Router>>,
}

impl TestRouter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `GET` requests to the path.
    pub fn get<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(path, routing::get(handler));
    }

    /// Registers a handler for `POST` requests to the path.
    pub fn post<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(path, routing::post(handler));
    }

    /// Registers a handler for `PUT` requests to the path.
    pub fn put<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(path, routing::put(handler));
    }

    /// Registers a handler for `PATCH` requests to the path.
    pub fn patch<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(path, routing::patch(handler));
    }

    /// Registers a handler for `DELETE` requests to the path.
    pub fn delete<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(path, routing::delete(handler));
    }

    /// Registers a handler for `HEAD` requests to the path.
    pub fn head<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(path, routing::head(handler));
    }

    /// Registers a handler for `OPTIONS` requests to the path.
    pub fn options<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(path, routing::options(handler));
    }

    /// Registers a handler for `TRACE` requests to the path.
    pub fn trace<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(path, routing::trace(handler));
    }

    /// Registers a [`MethodRouter`] at the path,
    /// for anything the verb helpers above do not cover.
    pub fn route(&self, path: &str, method_router: MethodRouter) {
        self.update(|router| router.route(path, method_router));
    }

    /// Attaches a middleware layer around all routes registered so far.
    ///
    /// Same semantics as [`axum::Router::layer`].
    pub fn layer<L>(&self, layer: L)
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.update(|router| router.layer(layer));
    }

    fn update(&self, update_router: impl FnOnce(Router) -> Router) {
        let mut router = self
            .router
            .write()
            .expect("Failed to lock the shared router for writing");
        *router = update_router(::std::mem::take(&mut *router));
    }

    fn snapshot(&self) -> Router {
        self.router
            .read()
            .expect("Failed to lock the shared router for reading")
            .clone()
    }
}

impl Service<Request> for TestRouter {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let router = self.snapshot();
        Box::pin(router.oneshot(request))
    }
}

#[cfg(test)]
mod test_route_dispatch {
    use super::*;

    use ::axum::body::Body;
    use ::http::StatusCode;
    use ::http_body_util::BodyExt;

    async fn send(router: &TestRouter, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("Should build request");

        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("Should dispatch request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Should read response body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    #[tokio::test]
    async fn it_should_dispatch_to_registered_routes() {
        let router = TestRouter::new();
        router.get("/foo", || async { "bar" });

        let (status, body) = send(&router, "/foo").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "bar");
    }

    #[tokio::test]
    async fn it_should_return_not_found_for_unknown_routes() {
        let router = TestRouter::new();

        let (status, _) = send(&router, "/missing").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn it_should_see_routes_registered_through_another_clone() {
        let router = TestRouter::new();
        let other_handle = router.clone();

        let (status, _) = send(&router, "/later").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        other_handle.get("/later", || async { "better late than never" });

        let (status, body) = send(&router, "/later").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "better late than never");
    }
}
