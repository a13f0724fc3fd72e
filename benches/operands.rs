use criterion::{black_box, criterion_group, criterion_main, Criterion};

use yaxpeax_udvm::{OperandDecoder, OperandKind, UdvmMemory};

// one operand of each encoding length for each kind, laid out back to back
const LITERALS: &[u8] = &[0x05, 0x81, 0x23, 0xc0, 0x12, 0x34];
const MULTITYPES: &[u8] = &[0x3f, 0x47, 0x87, 0x8f, 0xe3, 0x9a, 0xbc, 0xa5, 0x5a, 0xc0, 0x10, 0x80, 0xff, 0xfe, 0x81, 0x00, 0x20];

fn bench_decode_slice(c: &mut Criterion) {
    let literal = OperandDecoder::new(OperandKind::Literal);
    let multitype = OperandDecoder::new(OperandKind::Multitype);

    c.bench_function("decode_slice literal", |b| {
        b.iter(|| {
            let mut data = black_box(LITERALS);
            while !data.is_empty() {
                let operand = literal.decode_slice(data).unwrap();
                data = &data[operand.len() as usize..];
            }
        })
    });

    c.bench_function("decode_slice multitype", |b| {
        b.iter(|| {
            let mut data = black_box(MULTITYPES);
            while !data.is_empty() {
                let operand = multitype.decode_slice(data).unwrap();
                data = &data[operand.len() as usize..];
            }
        })
    });
}

fn bench_decode_at(c: &mut Criterion) {
    let mut memory = UdvmMemory::new(vec![0u8; 65536]).unwrap();
    memory.write(0xfff0, MULTITYPES);
    let end = 0xfff0u16.wrapping_add(MULTITYPES.len() as u16);

    c.bench_function("decode_at address, wrapping", |b| {
        b.iter(|| {
            let mut pc = 0xfff0u16;
            while pc != end {
                let instruction = pc;
                black_box(yaxpeax_udvm::address(&memory, &mut pc, instruction).unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_decode_slice, bench_decode_at);
criterion_main!(benches);
