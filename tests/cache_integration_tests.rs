//! Integration Tests for the Cache Engine
//!
//! Exercises the public surface end to end: TTL reads, the background
//! sweeper lifecycle and snapshot persistence.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tokio_test::{assert_err, assert_ok};
use ttl_cache::{Cache, CacheConfig, CacheError, Ttl, Value, DEFAULT_EXPIRATION, NO_EXPIRATION};

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ttl_cache=debug")
        .with_test_writer()
        .try_init();
}

fn manual_cache() -> Cache<Value> {
    Cache::new(NO_EXPIRATION, Duration::ZERO)
}

fn ms(n: u64) -> Ttl {
    Ttl::After(Duration::from_millis(n))
}

// == Expiration ==

#[tokio::test]
async fn test_concrete_expiration_scenario() {
    init_tracing();
    let cache: Cache<i32> = Cache::new(DEFAULT_EXPIRATION, Duration::from_millis(50));

    cache.set("x", 1, ms(20));
    assert_eq!(cache.get("x"), Some(1));

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(cache.get("x"), None);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(cache.count(), 0);
    assert_eq!(cache.stats().expired_removed, 1);
}

#[tokio::test]
async fn test_never_expiring_entries_survive_sweeps() {
    let cache: Cache<&str> = Cache::new(DEFAULT_EXPIRATION, Duration::from_millis(20));

    cache.set("explicit", "a", NO_EXPIRATION);
    cache.set("via_default", "b", DEFAULT_EXPIRATION);

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(cache.get("explicit"), Some("a"));
    assert_eq!(cache.get("via_default"), Some("b"));
    assert_eq!(cache.count(), 2);
}

#[test]
fn test_expired_entry_counted_until_swept() {
    let cache = manual_cache();
    cache.set("short", Value::from(1), ms(10));
    cache.set("long", Value::from(2), Duration::from_secs(60));

    thread::sleep(Duration::from_millis(30));

    assert_eq!(cache.get("short"), None);
    assert_eq!(cache.count(), 2);

    assert_eq!(cache.delete_expired(), 1);
    assert_eq!(cache.delete_expired(), 0);
    assert_eq!(cache.count(), 1);
}

#[test]
fn test_add_over_expired_entry() {
    let cache = manual_cache();
    cache.set("k", Value::from("old"), ms(10));

    thread::sleep(Duration::from_millis(30));

    assert_err!(cache.update("k", Value::from("upd"), NO_EXPIRATION));
    assert_ok!(cache.add("k", Value::from("new"), NO_EXPIRATION));
    assert_eq!(cache.get("k"), Some(Value::from("new")));
}

#[test]
fn test_add_error_reports_key() {
    let cache = manual_cache();
    cache.set("dup", Value::Null, NO_EXPIRATION);

    let err = cache.add("dup", Value::Bool(true), NO_EXPIRATION).unwrap_err();
    assert!(matches!(&err, CacheError::KeyAlreadyExists(key) if key == "dup"));
    assert_eq!(cache.get("dup"), Some(Value::Null));
}

// == Sweeper Lifecycle ==

#[tokio::test]
async fn test_stop_gc_halts_sweeping() {
    let cache: Cache<i32> = Cache::new(NO_EXPIRATION, Duration::from_millis(20));
    assert!(cache.is_gc_running());

    cache.stop_gc();
    cache.stop_gc();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!cache.is_gc_running());

    cache.set("x", 1, ms(5));
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(cache.get("x"), None);
    assert_eq!(cache.count(), 1, "Nothing sweeps after stop");
}

#[test]
fn test_sweeper_without_runtime() {
    let cache: Cache<i32> = Cache::with_config(
        CacheConfig::new().with_gc_interval(Duration::from_millis(20)),
    );
    assert!(cache.is_gc_running());

    cache.set("x", 1, ms(5));
    thread::sleep(Duration::from_millis(100));
    assert_eq!(cache.count(), 0);

    cache.stop_gc();
}

#[test]
fn test_sweeper_survives_init_runtime() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let cache: Cache<i32> =
        runtime.block_on(async { Cache::new(NO_EXPIRATION, Duration::from_millis(20)) });
    drop(runtime);

    cache.set("x", 1, ms(5));
    thread::sleep(Duration::from_millis(100));

    assert!(cache.is_gc_running());
    assert_eq!(cache.count(), 0);
}

#[test]
fn test_concurrent_readers_and_writers() {
    let cache: Arc<Cache<i64>> = Arc::new(Cache::new(NO_EXPIRATION, Duration::from_millis(5)));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for n in 0..200 {
                    let key = format!("key_{}_{}", i, n % 10);
                    cache.set(key.clone(), n, NO_EXPIRATION);
                    assert!(cache.get(&key).is_some());
                    let _ = cache.add(key.clone(), -1, NO_EXPIRATION);
                    let _ = cache.update(key, n + 1, NO_EXPIRATION);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.count(), 80);
}

// == Snapshots ==

#[test]
fn test_snapshot_roundtrip_through_flush() {
    init_tracing();
    let cache = manual_cache();

    let mut map = BTreeMap::new();
    map.insert("nested".to_string(), Value::List(vec![Value::Int(1), Value::Float(2.5)]));

    cache.set("int", Value::from(7), NO_EXPIRATION);
    cache.set("str", Value::from("seven"), Duration::from_secs(60));
    cache.set("map", Value::Map(map.clone()), NO_EXPIRATION);
    cache.set("gone", Value::from(0), ms(5));
    thread::sleep(Duration::from_millis(20));

    let mut buffer = Vec::new();
    assert_ok!(cache.save(&mut buffer));

    cache.flush();
    assert_eq!(cache.count(), 0);

    assert_ok!(cache.load(Cursor::new(buffer)));

    assert_eq!(cache.get("int"), Some(Value::Int(7)));
    assert_eq!(cache.get("str"), Some(Value::from("seven")));
    assert_eq!(cache.get("map"), Some(Value::Map(map)));
    assert_eq!(cache.get("gone"), None);
}

#[test]
fn test_snapshot_keeps_non_finite_floats() {
    let cache = manual_cache();
    cache.set("ok", Value::Int(1), NO_EXPIRATION);
    cache.set("nan", Value::Float(f64::NAN), NO_EXPIRATION);
    cache.set("inf", Value::Float(f64::INFINITY), NO_EXPIRATION);

    let mut buffer = Vec::new();
    assert_ok!(cache.save(&mut buffer));
    cache.flush();
    assert_ok!(cache.load(buffer.as_slice()));

    assert_eq!(cache.count(), 3);
    assert_eq!(cache.get("ok"), Some(Value::Int(1)));
    assert!(matches!(cache.get("nan"), Some(Value::Float(f)) if f.is_nan()));
    assert_eq!(cache.get("inf"), Some(Value::Float(f64::INFINITY)));
}

#[test]
fn test_load_does_not_clobber_live_entries() {
    let source = manual_cache();
    source.set("a", Value::from("V2"), NO_EXPIRATION);
    source.set("b", Value::from("loaded"), NO_EXPIRATION);

    let mut buffer = Vec::new();
    source.save(&mut buffer).unwrap();

    let target = manual_cache();
    target.set("a", Value::from("V1"), NO_EXPIRATION);
    target.load(buffer.as_slice()).unwrap();

    assert_eq!(target.get("a"), Some(Value::from("V1")));
    assert_eq!(target.get("b"), Some(Value::from("loaded")));
}

#[test]
fn test_load_replaces_expired_entries() {
    let source = manual_cache();
    source.set("a", Value::from("fresh"), NO_EXPIRATION);
    let mut buffer = Vec::new();
    source.save(&mut buffer).unwrap();

    let target = manual_cache();
    target.set("a", Value::from("stale"), ms(5));
    thread::sleep(Duration::from_millis(20));

    target.load(buffer.as_slice()).unwrap();
    assert_eq!(target.get("a"), Some(Value::from("fresh")));
}

#[test]
fn test_load_malformed_snapshot() {
    let cache = manual_cache();
    cache.set("keep", Value::from(1), NO_EXPIRATION);

    let err = cache.load(&[0xff, 0x13, 0x37][..]).unwrap_err();
    assert!(matches!(err, CacheError::CborDecode(_)));
    assert_eq!(cache.count(), 1);
}

#[derive(Debug, Clone)]
struct Opaque;

impl Serialize for Opaque {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("opaque values cannot be encoded"))
    }
}

#[test]
fn test_save_reports_encoding_failure() {
    let cache: Cache<Opaque> = Cache::new(NO_EXPIRATION, Duration::ZERO);
    cache.set("o", Opaque, NO_EXPIRATION);

    let mut buffer = Vec::new();
    let err = cache.save(&mut buffer).unwrap_err();

    assert!(matches!(err, CacheError::SnapshotEncoding(_)));
    assert!(buffer.is_empty());
    // Lock must be free again
    cache.set("p", Opaque, NO_EXPIRATION);
    assert_eq!(cache.count(), 2);
}

#[test]
fn test_file_snapshot_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.snapshot");

    let cache = manual_cache();
    cache.set("a", Value::from(1), NO_EXPIRATION);
    cache.set("b", Value::Bytes(vec![0, 255]), NO_EXPIRATION);
    assert_ok!(cache.save_to_file(&path));

    let restored = manual_cache();
    assert_ok!(restored.load_from_file(&path));

    assert_eq!(restored.count(), 2);
    assert_eq!(restored.get("b"), Some(Value::Bytes(vec![0, 255])));
}

#[test]
fn test_load_from_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache = manual_cache();

    let err = cache.load_from_file(dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, CacheError::Io(_)));
}

#[test]
fn test_save_to_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let cache = manual_cache();

    let err = cache
        .save_to_file(dir.path().join("no_such_dir").join("snapshot"))
        .unwrap_err();
    assert!(matches!(err, CacheError::Io(_)));
}
