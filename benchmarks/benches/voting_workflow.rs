use chrono::{Duration as ChronoDuration, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use election_core::{
    ElectionService, InMemoryStore, Session,
    config::LifecycleConfig,
    results,
    types::{Candidacy, Election, ElectionStatus, Role},
};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct Fixture {
    store: Arc<InMemoryStore>,
    service: Arc<ElectionService>,
    admin: Session,
    election: Election,
    candidacies: Vec<Candidacy>,
}

/// An active election with `candidates` candidacies
fn active_election(candidates: usize) -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let admin = Session::signed_in(store.seed_admin("Ada", "ada@example.com").unwrap());
    let service = Arc::new(ElectionService::new(
        store.clone(),
        LifecycleConfig::for_testing(),
    ));

    let now = Utc::now();
    let election = service
        .create_election(
            &admin,
            "Benchmark",
            "Benchmark election",
            now + ChronoDuration::hours(1),
            now + ChronoDuration::hours(2),
        )
        .unwrap();

    let candidacies = (0..candidates)
        .map(|i| {
            let identity = store
                .register(
                    &format!("Candidate {i}"),
                    &format!("candidate{i}@example.com"),
                    Role::Candidate,
                )
                .unwrap();
            service
                .apply_as_candidate(&Session::signed_in(identity), election.id, "Chair")
                .unwrap()
        })
        .collect();

    let election = service
        .transition_election(&admin, election.id, ElectionStatus::Active)
        .unwrap();

    Fixture {
        store,
        service,
        admin,
        election,
        candidacies,
    }
}

fn fresh_voter(store: &InMemoryStore) -> Session {
    let id = Uuid::new_v4();
    Session::signed_in(
        store
            .register("Voter", &format!("{id}@example.com"), Role::Voter)
            .unwrap(),
    )
}

fn bench_cast_vote(c: &mut Criterion) {
    let mut group = c.benchmark_group("ballots");
    group.warm_up_time(Duration::from_millis(100));

    let fixture = active_election(4);
    let candidacy_id = fixture.candidacies[0].id;

    // Accepted ballot, fresh voter each time
    group.bench_function("cast_vote", |b| {
        b.iter_batched(
            || fresh_voter(&fixture.store),
            |voter| {
                fixture
                    .service
                    .cast_vote(black_box(&voter), fixture.election.id, candidacy_id)
                    .unwrap()
            },
            criterion::BatchSize::SmallInput,
        )
    });

    // Refused ballot from a voter who already voted
    let repeat_voter = fresh_voter(&fixture.store);
    fixture
        .service
        .cast_vote(&repeat_voter, fixture.election.id, candidacy_id)
        .unwrap();
    group.bench_function("duplicate_vote_refused", |b| {
        b.iter(|| {
            let refused = fixture
                .service
                .cast_vote(black_box(&repeat_voter), fixture.election.id, candidacy_id);
            assert!(refused.is_err());
        })
    });

    group.finish();
}

fn bench_concurrent_voting(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("concurrent_voting");
    group.sample_size(30);

    for num_voters in [10, 50, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("concurrent_voters", num_voters),
            num_voters,
            |b, &num_voters| {
                b.to_async(&rt).iter(|| async move {
                    let fixture = active_election(3);
                    let election_id = fixture.election.id;
                    let mut handles = Vec::new();

                    for i in 0..num_voters {
                        let service = fixture.service.clone();
                        let voter = fresh_voter(&fixture.store);
                        let candidacy_id = fixture.candidacies[i % 3].id;

                        handles.push(tokio::spawn(async move {
                            service.cast_vote(&voter, election_id, candidacy_id).unwrap();
                        }));
                    }

                    for handle in handles {
                        handle.await.unwrap();
                    }
                    black_box(fixture.store.stats().unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_tabulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("results");

    for candidates in [3, 20, 100].iter() {
        let fixture = active_election(*candidates);
        for (i, candidacy) in fixture.candidacies.iter().enumerate() {
            for _ in 0..(i % 7) {
                let voter = fresh_voter(&fixture.store);
                fixture
                    .service
                    .cast_vote(&voter, fixture.election.id, candidacy.id)
                    .unwrap();
            }
        }
        fixture
            .service
            .transition_election(&fixture.admin, fixture.election.id, ElectionStatus::Completed)
            .unwrap();

        group.bench_with_input(
            BenchmarkId::new("view_results", candidates),
            candidates,
            |b, _| {
                b.iter(|| {
                    fixture
                        .service
                        .view_results(&fixture.admin, black_box(fixture.election.id))
                        .unwrap()
                })
            },
        );

        let snapshot = fixture.service.candidacies(fixture.election.id).unwrap();
        group.bench_with_input(BenchmarkId::new("rank", candidates), candidates, |b, _| {
            b.iter_batched(
                || snapshot.clone(),
                |candidacies| results::rank(black_box(candidacies)),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cast_vote,
    bench_concurrent_voting,
    bench_tabulation
);
criterion_main!(benches);
