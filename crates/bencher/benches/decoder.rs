use bencher::{TestCase, TestFile};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use futures::executor::block_on;
use micro_http::codec::{ChunkedBytes, HttpDecoder};
use std::hint::black_box;

static SMALL_HEADER: TestFile = TestFile::new("get_small.txt", include_str!("../resources/request/get_small.txt"));
static LARGE_HEADER: TestFile = TestFile::new("get_large.txt", include_str!("../resources/request/get_large.txt"));
static SMALL_BODY: TestFile = TestFile::new("post_small.txt", include_str!("../resources/request/post_small.txt"));

fn create_test_cases() -> Vec<TestCase> {
    vec![
        TestCase::small("small_header_decoder", SMALL_HEADER),
        TestCase::normal("large_header_decoder", LARGE_HEADER),
        TestCase::normal("small_body_decoder", SMALL_BODY),
    ]
}

fn benchmark_request_decoder(criterion: &mut Criterion) {
    let test_cases = create_test_cases();
    let mut group = criterion.benchmark_group("request_decoder");

    for case in test_cases {
        group.sample_size(case.group().sample_size());
        group.throughput(Throughput::Bytes(case.file().bytes().len() as u64));
        group.bench_with_input(BenchmarkId::new(case.name(), case.file().file_name()), &case, |b, case| {
            let decoder = HttpDecoder::new();
            b.iter_batched(
                || ChunkedBytes::new(case.file().bytes()),
                |bytes| {
                    let request = block_on(decoder.decode_request(bytes)).expect("input should be a valid http request");
                    black_box(request);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(decoder, benchmark_request_decoder);
criterion_main!(decoder);
