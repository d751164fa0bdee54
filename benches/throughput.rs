use bramble::{Context, HandlerChain, PathTrie, Registrar, Request, Route, Router};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use std::hint::black_box;
use std::sync::Arc;

const ZOO_ROUTES: &[(Method, &str)] = &[
    (Method::GET, "/"),
    (Method::GET, "/zoo/animals"),
    (Method::POST, "/zoo/animals"),
    (Method::GET, "/zoo/animals/:id"),
    (Method::PUT, "/zoo/animals/:id"),
    (Method::PATCH, "/zoo/animals/:id"),
    (Method::DELETE, "/zoo/animals/:id"),
    (Method::GET, "/zoo/animals/:id/toys/:toy_id"),
    (
        Method::GET,
        "/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id",
    ),
    (
        Method::POST,
        "/inventory/:warehouse_id/feeds/:feed_id/items/:item_id/batches/:batch_id",
    ),
    (Method::GET, "/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i"),
    (Method::GET, "/zoo/files/*path"),
    (Method::HEAD, "/zoo/health"),
    (Method::OPTIONS, "/zoo/health"),
];

fn noop(_: &mut Context) -> anyhow::Result<()> {
    Ok(())
}

fn zoo_router() -> Router {
    let mut router = Router::new();
    for (method, pattern) in ZOO_ROUTES {
        router
            .handle(method.clone(), pattern, HandlerChain::new().then(noop))
            .unwrap();
    }
    router
}

fn bench_route_throughput(c: &mut Criterion) {
    let router = zoo_router();
    c.bench_function("route_match", |b| {
        let test_paths = [
            (Method::GET, "/zoo/animals/123"),
            (Method::GET, "/zoo/animals/123/toys/456"),
            (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
            (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
            (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
            (Method::GET, "/zoo/files/img/lion.png"),
        ];
        b.iter(|| {
            for (method, path) in &test_paths {
                let res = router.serve(Request::new(method.clone(), path));
                black_box(&res);
            }
        })
    });
}

fn bench_trie_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie_resolve");
    for count in [10usize, 100, 1000] {
        let mut trie = PathTrie::new();
        for i in 0..count {
            let pattern = format!("/api/v1/resource{i}/:id/items/:item_id");
            let route = Route::new(Method::GET, None, &pattern, HandlerChain::new()).unwrap();
            trie.insert(Arc::new(route)).unwrap();
        }
        let path = format!("/api/v1/resource{}/42/items/7", count / 2);
        group.bench_with_input(BenchmarkId::from_parameter(count), &path, |b, path| {
            b.iter(|| black_box(trie.resolve(black_box(path)).is_some()))
        });
    }
    group.finish();
}

fn bench_not_found(c: &mut Criterion) {
    let router = zoo_router();
    c.bench_function("route_not_found", |b| {
        b.iter(|| {
            let res = router.serve(Request::new(Method::GET, "/zoo/animals/1/unknown"));
            black_box(res.status())
        })
    });
}

criterion_group!(
    benches,
    bench_route_throughput,
    bench_trie_resolve,
    bench_not_found
);
criterion_main!(benches);
