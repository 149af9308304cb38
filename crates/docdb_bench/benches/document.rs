//! Document and database benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docdb_bench::{flat_body, generate_ids, nested_body};
use docdb_core::{ArrayRead, Database, DictionaryRead, Document, DocumentId, MutableArray};

/// Benchmark saving fresh documents.
fn bench_save_new(c: &mut Criterion) {
    let mut group = c.benchmark_group("save_new");

    for fields in [4, 16, 64].iter() {
        group.throughput(Throughput::Elements(*fields as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fields), fields, |b, &fields| {
            let db = Database::open_in_memory();
            let body = flat_body(fields);
            b.iter(|| {
                let mut doc = Document::with_content(DocumentId::new(), body.clone()).unwrap();
                db.save(black_box(&mut doc)).unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark a read-modify-save cycle on one existing document.
fn bench_update(c: &mut Criterion) {
    let db = Database::open_in_memory();
    let mut seed = Document::with_content("hot", flat_body(32)).unwrap();
    db.save(&mut seed).unwrap();

    c.bench_function("update_one_field", |b| {
        let mut n = 0i64;
        b.iter(|| {
            let mut doc = db.get_document("hot").unwrap().unwrap();
            n += 1;
            doc.set("field_0", n).unwrap();
            doc.save().unwrap();
        });
    });
}

/// Benchmark the conflict path: every save runs against a stale revision.
fn bench_conflict_merge(c: &mut Criterion) {
    let db = Database::open_in_memory();
    let mut seed = Document::with_content("contended", flat_body(16)).unwrap();
    db.save(&mut seed).unwrap();

    c.bench_function("save_after_conflict", |b| {
        b.iter(|| {
            let mut stale = db.get_document("contended").unwrap().unwrap();
            let mut winner = db.get_document("contended").unwrap().unwrap();
            winner.set("field_1", 1).unwrap();
            winner.save().unwrap();
            stale.set("field_2", 2).unwrap();
            stale.save().unwrap();
        });
    });
}

/// Benchmark reads of stored documents.
fn bench_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    let db = Database::open_in_memory();
    let ids = generate_ids(1000);
    for id in &ids {
        let mut doc = Document::with_content(id.as_str(), flat_body(8)).unwrap();
        db.save(&mut doc).unwrap();
    }

    group.bench_function("fetch", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % ids.len();
            black_box(db.fetch(&ids[i]).unwrap());
        });
    });

    group.bench_function("typed_getter", |b| {
        let doc = db.fetch(&ids[0]).unwrap();
        b.iter(|| black_box(doc.int(black_box("field_0"))));
    });

    group.finish();
}

/// Benchmark promotion of nested snapshots and materialization back.
fn bench_promote_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("promote_materialize");

    for depth in [1, 2, 3].iter() {
        let body = nested_body(*depth, 4);
        group.bench_with_input(BenchmarkId::new("untouched", depth), &body, |b, body| {
            b.iter(|| black_box(body.to_mutable().to_read_only()));
        });
        group.bench_with_input(BenchmarkId::new("leaf_edit", depth), &body, |b, body| {
            b.iter(|| {
                let mutable = body.to_mutable();
                let mut dict = mutable.clone();
                while let Some(child) = dict.dictionary("key_0") {
                    dict = child;
                }
                dict.set("edited", true).unwrap();
                black_box(mutable.to_read_only())
            });
        });
    }
    group.finish();
}

/// Benchmark array edits that shift elements.
fn bench_array_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_edits");

    for len in [16usize, 256, 4096].iter() {
        group.bench_with_input(BenchmarkId::new("insert_front", len), len, |b, &len| {
            let array = MutableArray::from_values(0..len as i64).unwrap();
            b.iter(|| {
                array.insert(0, black_box(1)).unwrap();
                array.remove(0).unwrap();
            });
        });
        group.bench_with_input(BenchmarkId::new("read_all", len), len, |b, &len| {
            let array = MutableArray::from_values(0..len as i64).unwrap();
            b.iter(|| {
                let mut sum = 0i64;
                for i in 0..array.count() {
                    sum += array.int_at(i).unwrap();
                }
                black_box(sum)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_save_new,
    bench_update,
    bench_conflict_merge,
    bench_reads,
    bench_promote_materialize,
    bench_array_edits,
);
criterion_main!(benches);
