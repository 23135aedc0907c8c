// Snapshot tests: lock node descriptions and lowered instruction listings.
//
// Each case builds a device-data input and a SymEig node over it, then
// lowers both onto a RecordingBuilder. The listing shows the eigensolver
// arguments (triangle, iteration cap, tolerance) and how the eigenvector
// output is wired.
//
// Run `cargo insta review` after intentional output changes to update baselines.

use symeig::id::IdAllocator;
use symeig::lowering::RecordingBuilder;
use symeig::node::DeviceData;
use symeig::{Node, SymEig};

fn build(shape: &str, eigenvectors: bool, lower: bool) -> (DeviceData, SymEig) {
    let shape = symeig::parser::parse_shape(shape)
        .into_result()
        .unwrap_or_else(|d| panic!("bad shape text: {:?}", d));
    let mut ids = IdAllocator::new();
    let input = DeviceData::new(shape);
    let node = SymEig::new(input.output(ids.alloc_node()), eigenvectors, lower)
        .unwrap_or_else(|e| panic!("construction failed: {}", e));
    (input, node)
}

fn lowered(shape: &str, eigenvectors: bool, lower: bool) -> String {
    let (input, node) = build(shape, eigenvectors, lower);
    let mut builder = RecordingBuilder::new();
    let params = input.lower(&mut builder, &[]).unwrap();
    let outs = node.lower(&mut builder, &params).unwrap();
    format!("{}results: {}, {}", builder, outs[0], outs[1])
}

#[test]
fn describe_batched_with_eigenvectors() {
    let (_, node) = build("f32[4,5,5]", true, false);
    insta::assert_snapshot!(
        node.describe(),
        @"(f32[4,5], f32[4,5,5]) aten::symeig, num_outputs=2, eigenvectors=1, lower=0"
    );
}

#[test]
fn describe_without_eigenvectors() {
    let (_, node) = build("f64[3,3]", false, true);
    insta::assert_snapshot!(
        node.describe(),
        @"(f64[3], f64[0]) aten::symeig, num_outputs=2, eigenvectors=0, lower=1"
    );
}

#[test]
fn lowered_batched_with_eigenvectors() {
    insta::assert_snapshot!(lowered("f32[4,5,5]", true, false), @r"
    %0 = f32[4,5,5] parameter(0)
    %1 = (f32[4,5,5], f32[4,5]) self_adjoint_eig(%0), lower=0, max_iter=100, epsilon=1e-6
    %2 = f32[4,5,5] get_tuple_element(%1), index=0
    %3 = f32[4,5] get_tuple_element(%1), index=1
    results: %3, %2
    ");
}

#[test]
fn lowered_without_eigenvectors() {
    insta::assert_snapshot!(lowered("f32[4,5,5]", false, true), @r"
    %0 = f32[4,5,5] parameter(0)
    %1 = (f32[4,5,5], f32[4,5]) self_adjoint_eig(%0), lower=1, max_iter=100, epsilon=1e-6
    %2 = f32[4,5,5] get_tuple_element(%1), index=0
    %3 = f32[4,5] get_tuple_element(%1), index=1
    %4 = f32[0] zeros()
    results: %3, %4
    ");
}

#[test]
fn lowered_complex_matrix() {
    insta::assert_snapshot!(lowered("c64[2,2]", false, false), @r"
    %0 = c64[2,2] parameter(0)
    %1 = (c64[2,2], c64[2]) self_adjoint_eig(%0), lower=0, max_iter=100, epsilon=1e-6
    %2 = c64[2,2] get_tuple_element(%1), index=0
    %3 = c64[2] get_tuple_element(%1), index=1
    %4 = c64[0] zeros()
    results: %3, %4
    ");
}

#[test]
fn json_report() {
    let (_, node) = build("bf16[2,3,3]", true, true);
    let mut json = serde_json::to_value(node.report()).unwrap();
    let hash = json
        .as_object_mut()
        .and_then(|obj| obj.remove("hash"))
        .unwrap();
    assert_eq!(hash.as_str().map(str::len), Some(16));
    assert_eq!(
        json,
        serde_json::json!({
            "op": "aten::symeig",
            "input": { "element_type": "bf16", "dims": [2, 3, 3] },
            "eigenvectors": true,
            "lower": true,
            "num_outputs": 2,
            "outputs": {
                "eigenvalues": { "element_type": "bf16", "dims": [2, 3] },
                "eigenvectors": { "element_type": "bf16", "dims": [2, 3, 3] }
            }
        })
    );
}
