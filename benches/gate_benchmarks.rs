use criterion::{black_box, criterion_group, criterion_main, Criterion};
use carehub::auth::{Identity, Role, Session, SessionState};
use carehub::gate::{evaluate, RouteTable};

fn bench_route_resolution(c: &mut Criterion) {
    let table = RouteTable::carehub();

    c.bench_function("resolve_literal", |b| {
        b.iter(|| table.resolve(black_box("/patients")))
    });

    c.bench_function("resolve_param", |b| {
        b.iter(|| table.resolve(black_box("/blogs/edit/42")))
    });

    c.bench_function("resolve_miss", |b| {
        b.iter(|| table.resolve(black_box("/no/such/page")))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let table = RouteTable::carehub();
    let policy = table.resolve("/patients").and_then(|m| m.route.policy().cloned());
    let nurse = SessionState::Authenticated(Session::new(
        "sample-jwt-token",
        Identity::new(4, "Nancy White", Role::Nurse),
    ));

    c.bench_function("evaluate_render", |b| {
        b.iter(|| evaluate(black_box(&nurse), black_box(policy.as_ref())))
    });

    c.bench_function("evaluate_anonymous", |b| {
        b.iter(|| evaluate(black_box(&SessionState::Anonymous), black_box(policy.as_ref())))
    });
}

criterion_group!(benches, bench_route_resolution, bench_evaluate);
criterion_main!(benches);
