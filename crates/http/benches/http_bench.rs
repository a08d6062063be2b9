use criterion::{Criterion, criterion_group, criterion_main};
use futures::executor::block_on;
use micro_http::codec::{ChunkedBytes, DecoderConfig, HttpDecoder};
use micro_http::protocol::Body;
use std::{
    hint::black_box,
    io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, ReadBuf};

// Mock IO handing out at most `step` bytes per read
struct MockIO {
    read_data: Vec<u8>,
    read_pos: usize,
    step: usize,
}

impl MockIO {
    fn new(read_data: Vec<u8>, step: usize) -> Self {
        Self { read_data, read_pos: 0, step }
    }
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = remaining.len().min(buf.remaining()).min(self.step);
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
        Poll::Ready(Ok(()))
    }
}

fn bench_request_decoder(c: &mut Criterion) {
    let request = b"GET /search?q=rust&page=2 HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\n";
    let decoder = HttpDecoder::new();

    c.bench_function("decode_simple_request", |b| {
        b.iter(|| {
            let bytes = ChunkedBytes::new(&request[..]);
            black_box(block_on(decoder.decode_request(bytes)).unwrap());
        });
    });

    c.bench_function("decode_fragmented_request", |b| {
        b.iter(|| {
            let bytes = ChunkedBytes::new(MockIO::new(request.to_vec(), 7));
            black_box(block_on(decoder.decode_request(bytes)).unwrap());
        });
    });
}

fn bench_response_decoder(c: &mut Criterion) {
    let body = "Hello World!".repeat(64);
    let response = format!("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{body}", body.len());
    let decoder = HttpDecoder::new();

    c.bench_function("decode_response_with_body", |b| {
        b.iter(|| {
            let bytes = ChunkedBytes::new(response.as_bytes());
            black_box(block_on(decoder.decode_response(bytes)).unwrap());
        });
    });
}

fn bench_streamed_body(c: &mut Criterion) {
    let length = 1024 * 1024;
    let mut request = format!("POST /upload HTTP/1.1\r\nContent-Length: {length}\r\n\r\n").into_bytes();
    request.resize(request.len() + length, b'x');
    let decoder = HttpDecoder::with_config(DecoderConfig::new().with_materialize_threshold(64 * 1024));

    c.bench_function("stream_large_request_body", |b| {
        b.iter(|| {
            block_on(async {
                let request = decoder.decode_request(ChunkedBytes::new(&request[..])).await.unwrap();
                let Body::Streamed(mut body) = request.into_body() else {
                    unreachable!("body is above the materialization threshold");
                };
                while let Some(chunk) = body.next_chunk().await {
                    black_box(chunk.unwrap());
                }
            });
        });
    });
}

criterion_group!(benches, bench_request_decoder, bench_response_decoder, bench_streamed_body);
criterion_main!(benches);
