//! FNV-1a/32 as used by the binary catalog checksum and style name hashes.

pub const FNV_SEED: u32 = 0x811C_9DC5;
pub const FNV_PRIME: u32 = 0x0100_0193;

pub fn fnv1a32(data: &[u8]) -> u32 {
    fnv1a32_append(FNV_SEED, data)
}

/// Continue a running FNV-1a hash over another region.
pub fn fnv1a32_append(hash: u32, data: &[u8]) -> u32 {
    data.iter()
        .fold(hash, |h, &b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}
