//! Parcel codec and dispatch benchmarks

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

use ohipc_core::prelude::*;
use ohipc_core::{DispatchTable, IpcRuntime};

const DESCRIPTOR: &str = "bench.IEcho";

struct Echo {
    table: DispatchTable<Echo>,
}

impl Echo {
    fn new() -> Self {
        Self {
            table: DispatchTable::builder(DESCRIPTOR)
                .handler(1u32, Self::echo)
                .build(),
        }
    }

    fn echo(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let text = data.read_string()?;
        reply.write_string(&text)?;
        Ok(())
    }
}

impl IpcStub for Echo {
    fn descriptor(&self) -> &str {
        DESCRIPTOR
    }

    fn on_remote_request(
        &self,
        code: u32,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
        option: &MessageOption,
    ) -> IpcResult<()> {
        self.table.dispatch(self, code, data, reply, option)
    }
}

fn request() -> MessageParcel {
    let mut data = MessageParcel::new();
    let written = data
        .write_interface_token(DESCRIPTOR)
        .and_then(|()| data.write_string("usual.event.SCREEN_ON"));
    black_box(written.is_ok());
    data
}

fn bench_parcel_write(c: &mut Criterion) {
    c.bench_function("parcel_write_request", |b| {
        b.iter(|| black_box(request()));
    });
}

fn bench_parcel_read(c: &mut Criterion) {
    let bytes = request().as_bytes().to_vec();
    c.bench_function("parcel_read_request", |b| {
        b.iter(|| {
            let mut parcel = MessageParcel::from_bytes(&bytes);
            black_box(parcel.read_interface_token().ok());
            black_box(parcel.read_string().ok());
        });
    });
}

fn bench_inline_dispatch(c: &mut Criterion) {
    let echo = Echo::new();
    c.bench_function("stub_dispatch_inline", |b| {
        b.iter(|| {
            let mut data = request();
            let mut reply = MessageParcel::new();
            black_box(
                echo.on_remote_request(1, &mut data, &mut reply, &MessageOption::sync())
                    .is_ok(),
            );
        });
    });
}

fn bench_runtime_roundtrip(c: &mut Criterion) {
    let Ok(runtime) = IpcRuntime::with_defaults() else {
        return;
    };
    let Ok(handle) = runtime.publish(Arc::new(Echo::new())) else {
        return;
    };
    let proxy = RemoteProxy::new(handle, DESCRIPTOR);
    c.bench_function("runtime_sync_roundtrip", |b| {
        b.iter(|| black_box(proxy.send(1, request(), MessageOption::sync()).is_ok()));
    });
    runtime.shutdown();
}

criterion_group!(
    benches,
    bench_parcel_write,
    bench_parcel_read,
    bench_inline_dispatch,
    bench_runtime_roundtrip
);
criterion_main!(benches);
