//! Decorators and their composition.

use std::sync::Arc;

use crate::SharedClient;

/// Wraps a client with additional behaviour.
pub trait Decorator: Send + Sync {
    /// Produce a new client around `client`.
    fn decorate(&self, client: SharedClient) -> SharedClient;
}

impl<D: Decorator + ?Sized> Decorator for Box<D> {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        (**self).decorate(client)
    }
}

impl<D: Decorator + ?Sized> Decorator for Arc<D> {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        (**self).decorate(client)
    }
}

impl<D: Decorator + ?Sized> Decorator for &D {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        (**self).decorate(client)
    }
}

/// A decorator backed by a closure.
pub struct DecoratorFn<F> {
    f: F,
}

/// Turn a `Fn(SharedClient) -> SharedClient` into a [`Decorator`].
pub fn decorator_fn<F>(f: F) -> DecoratorFn<F>
where
    F: Fn(SharedClient) -> SharedClient + Send + Sync,
{
    DecoratorFn { f }
}

impl<F> Decorator for DecoratorFn<F>
where
    F: Fn(SharedClient) -> SharedClient + Send + Sync,
{
    fn decorate(&self, client: SharedClient) -> SharedClient {
        (self.f)(client)
    }
}

/// Wrap `client` with all `decorators`.
///
/// The first decorator becomes the outermost layer (the one the caller
/// talks to) and the last one sits directly around `client`, so
/// `decorate(c, [d1, d2, d3])` behaves like `d1(d2(d3(c)))`.
pub fn decorate<I>(client: SharedClient, decorators: I) -> SharedClient
where
    I: IntoIterator,
    I::Item: Decorator,
{
    let decorators: Vec<I::Item> = decorators.into_iter().collect();
    decorators
        .iter()
        .rev()
        .fold(client, |inner, decorator| decorator.decorate(inner))
}

/// Fluent builder over [`decorate`].
///
/// ```
/// use relay_http_client::{Decorated, Null, Typed};
///
/// let client = Decorated::new(reqwest::Client::new())
///     .with(Typed::json())
///     .with(Null)
///     .build();
/// ```
pub struct Decorated {
    client: SharedClient,
    decorators: Vec<Box<dyn Decorator>>,
}

impl Decorated {
    /// Start from a base client.
    pub fn new<C: crate::Client + 'static>(client: C) -> Self {
        Self::from_shared(Arc::new(client))
    }

    /// Start from an already shared client.
    pub fn from_shared(client: SharedClient) -> Self {
        Self {
            client,
            decorators: Vec::new(),
        }
    }

    /// Add the next (inner) layer.
    pub fn with<D: Decorator + 'static>(mut self, decorator: D) -> Self {
        self.decorators.push(Box::new(decorator));
        self
    }

    /// Number of layers added so far.
    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    /// Whether no layer was added.
    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Fold the layers over the base client.
    pub fn build(self) -> SharedClient {
        decorate(self.client, self.decorators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Client, RequestBuilder, client_fn, null_response};
    use parking_lot::Mutex;

    fn recording(name: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> impl Decorator {
        decorator_fn(move |inner: SharedClient| {
            let log = Arc::clone(&log);
            Arc::new(client_fn(move |request| {
                log.lock().push(name);
                let inner = Arc::clone(&inner);
                async move { inner.execute(request).await }
            })) as SharedClient
        })
    }

    fn base(log: Arc<Mutex<Vec<&'static str>>>) -> SharedClient {
        Arc::new(client_fn(move |_request| {
            log.lock().push("base");
            async { Ok(null_response()) }
        }))
    }

    #[tokio::test]
    async fn test_first_decorator_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let client = decorate(
            base(Arc::clone(&log)),
            vec![
                Box::new(recording("d1", Arc::clone(&log))) as Box<dyn Decorator>,
                Box::new(recording("d2", Arc::clone(&log))),
                Box::new(recording("d3", Arc::clone(&log))),
            ],
        );

        client
            .execute(RequestBuilder::get("/").build().unwrap())
            .await
            .unwrap();

        assert_eq!(*log.lock(), vec!["d1", "d2", "d3", "base"]);
    }

    #[tokio::test]
    async fn test_no_decorators_returns_base() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let client = decorate(base(Arc::clone(&log)), Vec::<Box<dyn Decorator>>::new());

        client
            .execute(RequestBuilder::get("/").build().unwrap())
            .await
            .unwrap();

        assert_eq!(*log.lock(), vec!["base"]);
    }

    #[tokio::test]
    async fn test_builder_matches_fold_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let builder = Decorated::from_shared(base(Arc::clone(&log)))
            .with(recording("outer", Arc::clone(&log)))
            .with(recording("inner", Arc::clone(&log)));
        assert_eq!(builder.len(), 2);

        builder
            .build()
            .execute(RequestBuilder::get("/").build().unwrap())
            .await
            .unwrap();

        assert_eq!(*log.lock(), vec!["outer", "inner", "base"]);
    }
}
