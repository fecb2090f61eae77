use criterion::{Criterion, criterion_group, criterion_main};
use slick_reporter::config::TestSection;
use slick_reporter::core::classifier::OutputClassifier;
use std::hint::black_box;
use std::time::Instant;

const PATTERN: &str = r"\[(?P<result>.*?)\](?:\[(?P<reason>.*?)\])? \| (?P<name>.*?) \| (?P<counts>.*?) \| ElapsedMS: (?P<runlength>\d+)";

fn bench_classify(c: &mut Criterion) {
    let section = TestSection {
        command: Some("run-tests".to_string()),
        output_regex: Some(PATTERN.to_string()),
        name: Some("Search {name}".to_string()),
        reason: Some("{reason}: {counts}".to_string()),
        ..TestSection::default()
    };
    let mut classifier = OutputClassifier::from_config(&section).unwrap();
    let matching = "[PASS] | Search should return results | 3 items | ElapsedMS: 450";
    let noise = "Compiling search-service v0.4.2 (/work/search-service)";

    c.bench_function("classify_matching_line", |b| {
        b.iter(|| classifier.classify(black_box(matching), Instant::now()).unwrap());
    });
    c.bench_function("classify_non_matching_line", |b| {
        b.iter(|| classifier.classify(black_box(noise), Instant::now()).unwrap());
    });
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
