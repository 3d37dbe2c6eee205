use super::*;

#[test]
fn fnv_matches_reference_vector() {
    let mut h = Fnv1a64::new_default();
    h.write_bytes(b"a");
    assert_eq!(h.finish(), 0xaf63_dc4c_8601_ec8c);
}

#[test]
fn node_ids_are_stable_and_path_sensitive() {
    let a = stable_node_id("poster", &[0, 2], "layer");
    assert_eq!(a, stable_node_id("poster", &[0, 2], "layer"));
    assert_ne!(a, stable_node_id("poster", &[2, 0], "layer"));
    assert_ne!(a, stable_node_id("poster", &[0, 2], "mask"));
    assert_ne!(a, stable_node_id("other", &[0, 2], "layer"));
    assert!(a.starts_with('n'));
    assert_eq!(a.len(), 17);
}
