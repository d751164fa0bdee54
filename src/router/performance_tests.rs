// Performance-focused tests for router scalability
//
// Resolution cost must follow the length of the request path, not the number
// of registered routes.

use super::{PathTrie, Route, Router};
use crate::context::{Context, Request};
use crate::handler::HandlerChain;
use http::Method;
use std::sync::Arc;
use std::time::Instant;

fn trie_with(count: usize) -> PathTrie {
    let mut trie = PathTrie::new();
    for i in 0..count {
        let pattern = format!("/api/v1/resource{i}/:id");
        let route = Route::new(Method::GET, None, &pattern, HandlerChain::new()).unwrap();
        trie.insert(Arc::new(route)).unwrap();
    }
    trie
}

#[test]
fn test_trie_performance_with_many_routes() {
    let trie = trie_with(500);

    let start = Instant::now();
    for _ in 0..1000 {
        let result = trie.resolve("/api/v1/resource250/123");
        assert!(result.is_some());
    }
    let duration = start.elapsed();

    assert!(
        duration.as_millis() < 50,
        "Trie performance degraded: {}ms for 1000 lookups with 500 routes",
        duration.as_millis()
    );
}

#[test]
fn test_lookup_cost_independent_of_route_count() {
    let small = trie_with(10);
    let large = trie_with(1000);

    let time = |trie: &PathTrie| {
        let start = Instant::now();
        for _ in 0..2000 {
            assert!(trie.resolve("/api/v1/resource5/42").is_some());
        }
        start.elapsed().as_nanos()
    };
    let small_ns = time(&small).max(1);
    let large_ns = time(&large);

    // Allow generous noise; a linear scan would be ~100x slower.
    assert!(
        large_ns < small_ns * 20,
        "lookup with 1000 routes took {large_ns}ns vs {small_ns}ns with 10"
    );
}

#[test]
fn test_adversarial_path_depth() {
    let mut trie = PathTrie::new();
    for pattern in ["/:a/x", "/:a/:b/y", "/files/*rest"] {
        let route = Route::new(Method::GET, None, pattern, HandlerChain::new()).unwrap();
        trie.insert(Arc::new(route)).unwrap();
    }
    let deep = "/seg".repeat(10_000);
    assert!(trie.resolve(&deep).is_none());

    let deep_files = format!("/files{deep}");
    let m = trie.resolve(&deep_files).unwrap();
    assert_eq!(m.values[0].len(), deep.len() - 1);
}

#[test]
fn test_serve_reuses_contexts() {
    let mut router = Router::new();
    router
        .register(
            Method::GET,
            "/users/:id",
            HandlerChain::new().then(|ctx: &mut Context| {
                let id = ctx.param("id").unwrap_or_default().to_string();
                ctx.text(200, id);
                Ok(())
            }),
        )
        .unwrap();

    for i in 0..1000 {
        let res = router.serve(Request::new(Method::GET, &format!("/users/{i}")));
        assert_eq!(res.body_text(), i.to_string());
    }
    let pool = router.garden().first().unwrap().pool();
    assert_eq!(pool.metrics().created(), 1);
    assert_eq!(pool.metrics().acquired(), 1000);
}
