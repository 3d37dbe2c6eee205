#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new_default() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
        // Terminator keeps ("ab", "c") and ("a", "bc") apart.
        self.write_bytes(&[0xff]);
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

/// Deterministic node id from the document name, the index path of the source layer and
/// the role of the emitted node (content, wrapper, mask...).
pub(crate) fn stable_node_id(document: &str, path: &[u32], role: &str) -> String {
    let mut h = Fnv1a64::new_default();
    h.write_str(document);
    for &i in path {
        h.write_u32(i);
    }
    h.write_str(role);
    format!("n{:016x}", h.finish())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
