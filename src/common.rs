use std::path::Path;

pub type TableId = i32;
pub type PageNo = i32;

/// Logical address of a page within a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageId {
    pub table_id: TableId,
    pub page_no: PageNo,
}

impl PageId {
    pub fn new(table_id: TableId, page_no: PageNo) -> Self {
        Self { table_id, page_no }
    }
}

/// Logical address of a tuple within a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_no: i32,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_no: i32) -> Self {
        Self { page_id, slot_no }
    }
}

/// A fixed 32-bit FNV-1a hash, used to derive a table id that is stable across processes for the
/// same canonical path. `std`'s `DefaultHasher` is seeded randomly per process and is unsuitable
/// here.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Derives a deterministic table id from a table file's canonical path.
pub fn table_id_for_path(path: &Path) -> std::io::Result<TableId> {
    let canonical = path.canonicalize()?;
    let hash = fnv1a32(canonical.to_string_lossy().as_bytes());
    Ok(hash as i32)
}

#[cfg(test)]
mod tests {
    use super::fnv1a32;

    #[test]
    fn hash_is_deterministic() {
        let a = fnv1a32(b"/data/table_0001");
        let b = fnv1a32(b"/data/table_0001");
        assert_eq!(a, b);
    }

    #[test]
    fn different_paths_differ() {
        let a = fnv1a32(b"/data/table_0001");
        let b = fnv1a32(b"/data/table_0002");
        assert_ne!(a, b);
    }
}
