use criterion::{criterion_group, criterion_main, Criterion};

use smsmime::contacts::directory::StaticDirectory;
use smsmime::convert::batch::BatchConverter;
use smsmime::convert::identity;
use smsmime::convert::record::{ConversionContext, RecordConverter};
use smsmime::model::address::EmailAddress;
use smsmime::model::row::{columns, Row};

fn rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            Row::new()
                .with(columns::ID, i.to_string())
                .with(columns::ADDRESS, format!("+1555{:07}", i % 700))
                .with(columns::DATE, (1_262_304_000_000 + i as i64 * 1000).to_string())
                .with(columns::TYPE, if i % 2 == 0 { "1" } else { "2" })
                .with(columns::BODY, "See you at eight")
        })
        .collect()
}

fn bench_convert_batch(c: &mut Criterion) {
    let rows = rows(5_000);
    c.bench_function("convert_batch_5000", |b| {
        b.iter(|| {
            let ctx = ConversionContext::new(
                EmailAddress::bare("me@example.com"),
                "benchtoken",
                true,
                "bench",
            );
            let mut batch =
                BatchConverter::new(RecordConverter::new(ctx, StaticDirectory::default()));
            batch.convert_batch(&rows, rows.len(), -1).messages.len()
        })
    });
}

fn bench_message_id(c: &mut Criterion) {
    c.bench_function("message_id", |b| {
        b.iter(|| identity::message_id(1_262_304_000_000, "+15551234567", 1))
    });
}

criterion_group!(benches, bench_convert_batch, bench_message_id);
criterion_main!(benches);
