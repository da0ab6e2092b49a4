//! Benchmarks for parsing, querying and handle churn.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use dombridge::Bridge;

/// A table-heavy page with a few hundred rows.
fn sample_page() -> String {
    let mut html = String::from("<html><head><title>Bench</title></head><body><table>");
    for i in 0..300 {
        html.push_str(&format!(
            r#"<tr class="row r{i}"><td><a href="/item/{i}">Item {i}</a></td><td>{}</td></tr>"#,
            i * 7
        ));
    }
    html.push_str("</table></body></html>");
    html
}

fn bench_parse(c: &mut Criterion) {
    let html = sample_page();
    let bridge = Bridge::new();

    c.bench_function("parse", |b| {
        b.iter(|| {
            let doc = bridge.parse(black_box(&html), "https://example.com/");
            bridge.free(doc);
        });
    });
}

fn bench_select(c: &mut Criterion) {
    let bridge = Bridge::new();
    let doc = bridge.parse(&sample_page(), "https://example.com/");

    c.bench_function("select_links", |b| {
        b.iter(|| {
            let list = bridge.select(doc, black_box("tr.row td > a[href]")).unwrap();
            bridge.free(list);
        });
    });

    c.bench_function("select_contains", |b| {
        b.iter(|| {
            let list = bridge.select(doc, black_box("td:contains(item 29)")).unwrap();
            bridge.free(list);
        });
    });
}

fn bench_handle_churn(c: &mut Criterion) {
    let bridge = Bridge::new();
    let doc = bridge.parse(&sample_page(), "");
    let list = bridge.select(doc, "a").unwrap();
    let len = bridge.size(list).unwrap() as i64;

    c.bench_function("get_text_free", |b| {
        b.iter(|| {
            for i in 0..len {
                let a = bridge.get(list, i).unwrap();
                black_box(bridge.text(a).unwrap());
                bridge.free(a);
            }
        });
    });

    c.bench_function("parent_aliases", |b| {
        let a = bridge.first(list).unwrap();
        b.iter(|| {
            let p = bridge.parent(a).unwrap();
            bridge.free(black_box(p));
        });
    });
}

criterion_group!(
    benches,
    // Parsing
    bench_parse,
    // Queries
    bench_select,
    // Registry
    bench_handle_churn,
);
criterion_main!(benches);
