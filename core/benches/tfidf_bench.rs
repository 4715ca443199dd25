use criterion::{criterion_group, criterion_main, Criterion};
use std::collections::BTreeMap;
use wikiconflict_core::tfidf::{rank_page, DocumentFrequencies};
use wikiconflict_core::PageWordCounts;

fn synthetic_pages(n: u32, vocab: u32) -> Vec<PageWordCounts> {
    (0..n)
        .map(|id| {
            let words: BTreeMap<String, u32> = (0..vocab)
                .filter(|w| (w * 7 + id) % 5 != 0)
                .map(|w| (format!("word{w}"), 1 + (w + id) % 13))
                .collect();
            PageWordCounts { page_id: id, title: format!("page {id}"), words }
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let pages = synthetic_pages(200, 2_000);
    let freqs = DocumentFrequencies::from_pages(&pages);
    c.bench_function("rank_page_top50", |b| b.iter(|| rank_page(&pages[17], &freqs, 50, false)));
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
