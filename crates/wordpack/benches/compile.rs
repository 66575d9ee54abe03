use criterion::{Criterion, criterion_group, criterion_main};
use wordpack::{field::FieldSchema, schema::Schema, value::Value};

fn gen_root(field_count: usize) -> FieldSchema {
    let mut fields = Vec::with_capacity(field_count + 2);

    for i in 0..field_count {
        let ty = match i % 4 {
            0 => "uint16",
            1 => "bool",
            2 => "bytes4",
            _ => "int64",
        };
        fields.push(FieldSchema::new(format!("f{}", i), ty));
    }
    fields.push(FieldSchema::new("payload", "bytes"));
    fields.push(FieldSchema::tuple_array(
        "points",
        "[]",
        vec![FieldSchema::new("x", "int32"), FieldSchema::new("y", "int32")],
    ));

    FieldSchema::tuple("root", fields)
}

fn gen_value(field_count: usize) -> Value {
    let mut values = Vec::with_capacity(field_count + 2);

    // Deterministic but non-trivial pattern
    for i in 0..field_count {
        values.push(match i % 4 {
            0 => Value::uint((i * 31 % 65536) as u128),
            1 => Value::Bool(i % 3 == 0),
            2 => Value::FixedBytes(vec![(i % 256) as u8; 4]),
            _ => Value::int(-(i as i128) * 1_000_003),
        });
    }
    values.push(Value::Bytes((0..100).map(|b| (b * 7 % 256) as u8).collect()));
    values.push(Value::Array(
        (0..16)
            .map(|i| Value::Tuple(vec![Value::int(i), Value::int(-i)]))
            .collect(),
    ));

    Value::Tuple(values)
}

fn bench_compile(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 100] {
        let root = gen_root(field_count);

        c.bench_function(&format!("compile_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = Schema::compile(&root).unwrap();
            })
        });
    }
}

fn bench_decode(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 100] {
        let schema = Schema::compile(&gen_root(field_count)).unwrap();
        let packet = schema.encode(&gen_value(field_count)).unwrap();

        c.bench_function(&format!("decode_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = schema.parse(&packet).unwrap();
            })
        });
    }
}

criterion_group!(benches, bench_compile, bench_decode);
criterion_main!(benches);
