use bramble::{Context, ContextPool, Registrar, Request, Router};
use http::Method;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_pool_is_safe_across_threads() {
    let pool = Arc::new(ContextPool::new("GET"));
    let threads = 8;
    let per_thread = 200;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    let path = format!("/t{t}/r{i}");
                    let mut ctx = pool.acquire(Request::new(Method::GET, &path));
                    assert_eq!(ctx.path(), path);
                    assert!(ctx.value_raw("owner").is_none());
                    ctx.set_value("owner", t).unwrap();
                    ctx.text(200, &path);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let metrics = pool.metrics();
    let total = (threads * per_thread) as u64;
    assert_eq!(metrics.acquired(), total);
    assert_eq!(metrics.released(), total);
    assert_eq!(metrics.in_use(), 0);
    // Never more contexts than concurrent holders
    assert!(metrics.created() <= threads as u64);
    assert_eq!(pool.idle() as u64, metrics.created());
}

#[test]
fn test_router_serves_concurrently_from_shared_reference() {
    let mut router = Router::new();
    router
        .get("/users/:id", |ctx: &mut Context| {
            let id = ctx.param("id").unwrap_or_default().to_string();
            assert_eq!(ctx.params().len(), 1);
            ctx.text(200, id);
            Ok(())
        })
        .unwrap();
    let router = Arc::new(router);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let router = Arc::clone(&router);
            thread::spawn(move || {
                for i in 0..250 {
                    let id = format!("{t}-{i}");
                    let res = router.serve(Request::new(Method::GET, &format!("/users/{id}")));
                    assert_eq!(res.status(), 200);
                    assert_eq!(res.body_text(), id);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let pool = router.garden().first().unwrap().pool();
    assert_eq!(pool.metrics().acquired(), 1000);
    assert_eq!(pool.metrics().in_use(), 0);
    assert!(pool.metrics().created() <= 4);
}

#[test]
fn test_request_ids_are_unique_per_acquire() {
    let pool = ContextPool::new("GET");
    let first = pool.acquire(Request::new(Method::GET, "/")).request_id();
    let second = pool.acquire(Request::new(Method::GET, "/")).request_id();
    assert_ne!(first, second);
    assert!(!first.is_nil());
}

#[test]
fn test_state_does_not_leak_between_requests() {
    let mut router = Router::new();
    router
        .get("/set/:v", |ctx: &mut Context| {
            let v = ctx.param("v").unwrap_or_default().to_string();
            ctx.set_value("sticky", &v)?;
            ctx.set_header("x-sticky", v);
            Ok(())
        })
        .unwrap();
    router
        .get("/read", |ctx: &mut Context| {
            let seen = ctx.value::<String>("sticky").unwrap_or_else(|| "none".into());
            ctx.text(200, seen);
            Ok(())
        })
        .unwrap();

    let res = router.serve(Request::new(Method::GET, "/set/abc"));
    assert_eq!(res.header("x-sticky"), Some("abc"));
    let res = router.serve(Request::new(Method::GET, "/read"));
    assert_eq!(res.body_text(), "none");
    assert_eq!(res.header("x-sticky"), None);

    // Both routes share the GET tree pool, so the same context was reused
    assert_eq!(router.garden().first().unwrap().pool().metrics().created(), 1);
}

#[test]
fn test_param_bindings_cleared_on_reuse() {
    let mut router = Router::new();
    router
        .get("/users/:id", |ctx: &mut Context| {
            let id = ctx.param("id").unwrap_or_default().to_string();
            ctx.text(200, id);
            Ok(())
        })
        .unwrap();
    router
        .get("/plain", |ctx: &mut Context| {
            let body = format!(
                "{} {}",
                ctx.params().len(),
                ctx.route_pattern().unwrap_or_default()
            );
            ctx.text(200, body);
            Ok(())
        })
        .unwrap();

    assert_eq!(router.serve(Request::new(Method::GET, "/users/7")).body_text(), "7");
    let res = router.serve(Request::new(Method::GET, "/plain"));
    assert_eq!(res.body_text(), "0 /plain");

    let pool = router.garden().first().unwrap().pool();
    assert_eq!(pool.metrics().created(), 1);
    assert_eq!(pool.metrics().acquired(), 2);
}
