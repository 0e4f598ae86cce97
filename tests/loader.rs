use std::cell::Cell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use blog_gateway::{BatchFunction, Error, Loader, Result, StorageError};
use futures::future;

#[derive(Debug, PartialEq, Eq, Clone)]
struct DummyData(String);

#[derive(Default)]
struct DummyContext {
    map: HashMap<i64, String>,
    batches: Mutex<Vec<Vec<i64>>>,
}

impl DummyContext {
    fn with(entries: &[(i64, &str)]) -> Self {
        Self {
            map: entries.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            ..Default::default()
        }
    }
}

struct DummyDataLoader;

#[async_trait]
impl BatchFunction<i64, Option<DummyData>> for DummyDataLoader {
    type Context = Arc<DummyContext>;
    async fn load(keys: &[i64], context: &Self::Context) -> Result<Vec<Option<DummyData>>> {
        context.batches.lock().unwrap().push(keys.to_vec());
        Ok(keys.iter().map(|k| context.map.get(k).cloned().map(DummyData)).collect())
    }
}

/// Returns one value too few.
struct ShortLoader;

#[async_trait]
impl BatchFunction<i64, i64> for ShortLoader {
    type Context = ();
    async fn load(keys: &[i64], _: &()) -> Result<Vec<i64>> {
        Ok(keys.iter().skip(1).copied().collect())
    }
}

struct FailingLoader;

#[async_trait]
impl BatchFunction<i64, i64> for FailingLoader {
    type Context = ();
    async fn load(_: &[i64], _: &()) -> Result<Vec<i64>> {
        Err(Error::BulkFetch {
            relation: "dummies",
            source: Arc::new(StorageError::Backend("connection refused".to_owned())),
        })
    }
}

/// `Send` but not `Sync`; the worker only ever owns its batch function marker.
struct UnsyncLoader(PhantomData<Cell<u8>>);

#[async_trait]
impl BatchFunction<i64, i64> for UnsyncLoader {
    type Context = ();
    async fn load(keys: &[i64], _: &()) -> Result<Vec<i64>> {
        Ok(keys.iter().map(|k| k * 2).collect())
    }
}

fn data(s: &str) -> Option<DummyData> {
    Some(DummyData(s.to_owned()))
}

#[tokio::test]
async fn basic_load() {
    let context = Arc::new(DummyContext::with(&[(42, "Foo")]));

    let loader = Loader::new(DummyDataLoader {}, context);
    assert_eq!(loader.load(42).await.unwrap(), data("Foo"));
}

#[tokio::test]
async fn repeated_load_is_not_cached() {
    let context = Arc::new(DummyContext::with(&[(42, "Foo")]));

    let loader = Loader::new(DummyDataLoader {}, context.clone());
    assert_eq!(loader.load(42).await.unwrap(), data("Foo"));
    assert_eq!(loader.load(42).await.unwrap(), data("Foo"));
    assert_eq!(*context.batches.lock().unwrap(), vec![vec![42], vec![42]]);
}

#[tokio::test]
async fn basic_load_many() {
    let context = Arc::new(DummyContext::with(&[
        (42, "one fish"),
        (12, "two fish"),
        (5, "red fish"),
        (8, "blue fish"),
    ]));

    let loader = Loader::new(DummyDataLoader {}, context);
    assert_eq!(
        loader.load_many(vec![5, 12, 8]).await.unwrap(),
        vec![data("red fish"), data("two fish"), data("blue fish")]
    );
}

#[tokio::test]
async fn load_async() {
    let context = Arc::new(DummyContext::with(&[
        (42, "one fish"),
        (12, "two fish"),
        (5, "red fish"),
        (8, "blue fish"),
    ]));

    let loader = Loader::new(DummyDataLoader {}, context.clone());

    let tuple = future::join4(
        loader.load(5),
        loader.load_many(vec![5, 42]),
        loader.load(99),
        loader.load(12),
    );

    let (a, b, c, d) = tuple.await;
    assert_eq!(a.unwrap(), data("red fish"));
    assert_eq!(b.unwrap(), vec![data("red fish"), data("one fish")]);
    assert_eq!(c.unwrap(), None);
    assert_eq!(d.unwrap(), data("two fish"));

    // One batch, unique keys in first-requested order.
    assert_eq!(*context.batches.lock().unwrap(), vec![vec![5, 42, 99, 12]]);
}

#[tokio::test]
async fn duplicate_keys_each_get_a_value() {
    let context = Arc::new(DummyContext::with(&[(1, "a"), (2, "b")]));

    let loader = Loader::new(DummyDataLoader {}, context.clone());
    assert_eq!(
        loader.load_many(vec![2, 1, 2, 2]).await.unwrap(),
        vec![data("b"), data("a"), data("b"), data("b")]
    );
    assert_eq!(*context.batches.lock().unwrap(), vec![vec![2, 1]]);
}

#[tokio::test]
async fn empty_load_many_skips_batch() {
    let context = Arc::new(DummyContext::default());

    let loader = Loader::new(DummyDataLoader {}, context.clone());
    assert!(loader.load_many(vec![]).await.unwrap().is_empty());
    assert!(context.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn batch_window_coalesces_late_requests() {
    let context = Arc::new(DummyContext::with(&[(1, "a"), (2, "b")]));

    let loader = Loader::with_batch_window(
        DummyDataLoader {},
        context.clone(),
        Duration::from_millis(20),
    );
    let late = async {
        tokio::time::sleep(Duration::from_millis(1)).await;
        loader.load(2).await
    };
    let (a, b) = future::join(loader.load(1), late).await;
    assert_eq!(a.unwrap(), data("a"));
    assert_eq!(b.unwrap(), data("b"));
    assert_eq!(*context.batches.lock().unwrap(), vec![vec![1, 2]]);
}

#[tokio::test]
async fn length_mismatch_fails_every_caller() {
    let loader = Loader::new(ShortLoader {}, ());

    let (a, b) = future::join(loader.load(1), loader.load(2)).await;
    assert!(matches!(a, Err(Error::BatchLength { expected: 2, actual: 1 })));
    assert!(matches!(b, Err(Error::BatchLength { expected: 2, actual: 1 })));
}

#[tokio::test]
async fn batch_error_reaches_every_caller() {
    let loader = Loader::new(FailingLoader {}, ());

    let (a, b, c) =
        future::join3(loader.load(1), loader.load_many(vec![2, 3]), loader.load(1)).await;
    for error in [a.unwrap_err(), b.unwrap_err(), c.unwrap_err()] {
        assert!(matches!(error, Error::BulkFetch { relation: "dummies", .. }));
        assert_eq!(error.to_string(), "failed to load dummies: connection refused");
    }
}

#[tokio::test]
async fn unsync_batch_function_runs_with_batch_window() {
    let loader = Loader::with_batch_window(UnsyncLoader(PhantomData), (), Duration::from_millis(5));

    let (a, b) = future::join(loader.load(1), loader.load_many(vec![2, 3])).await;
    assert_eq!(a.unwrap(), 2);
    assert_eq!(b.unwrap(), vec![4, 6]);

    let loader = Loader::new(UnsyncLoader(PhantomData), ());
    assert_eq!(loader.load(21).await.unwrap(), 42);
}
