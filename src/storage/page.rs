use crate::common::{PageId, RecordId};
use crate::concurrency::TransactionId;
use crate::error::{DbError, Result};
use crate::field::Value;
use crate::schema::TupleDesc;
use crate::tuple::Tuple;

/// A fixed-size on-disk page: a slot-occupancy bitmap header (bit `i` set means slot `i` is
/// occupied, MSB-first within each byte) followed by `num_slots` fixed-size tuple slots. No
/// per-tuple header exists; a slot's raw bytes are exactly the tuple's serialized field values.
pub struct Page {
    pid: PageId,
    page_size: usize,
    tuple_size: usize,
    num_slots: usize,
    header_bytes: usize,
    bitmap: Vec<u8>,
    slots: Vec<u8>,
    dirty_tid: Option<TransactionId>,
}

impl Page {
    /// Number of fixed-size slots a page of `page_size` bytes can hold for tuples of
    /// `tuple_size` bytes, accounting for the one bit of header each slot costs.
    pub fn num_slots_for(page_size: usize, tuple_size: usize) -> usize {
        (page_size * 8) / (tuple_size * 8 + 1)
    }

    fn header_bytes_for(num_slots: usize) -> usize {
        (num_slots + 7) / 8
    }

    /// Builds a brand-new, all-empty page.
    pub fn empty(pid: PageId, page_size: usize, tuple_size: usize) -> Self {
        let num_slots = Self::num_slots_for(page_size, tuple_size);
        let header_bytes = Self::header_bytes_for(num_slots);
        Self {
            pid,
            page_size,
            tuple_size,
            num_slots,
            header_bytes,
            bitmap: vec![0u8; header_bytes],
            slots: vec![0u8; num_slots * tuple_size],
            dirty_tid: None,
        }
    }

    /// Parses a page from its on-disk byte image.
    pub fn from_bytes(pid: PageId, bytes: &[u8], tuple_size: usize) -> Self {
        let page_size = bytes.len();
        let num_slots = Self::num_slots_for(page_size, tuple_size);
        let header_bytes = Self::header_bytes_for(num_slots);
        Self {
            pid,
            page_size,
            tuple_size,
            num_slots,
            header_bytes,
            bitmap: bytes[..header_bytes].to_vec(),
            slots: bytes[header_bytes..header_bytes + num_slots * tuple_size].to_vec(),
            dirty_tid: None,
        }
    }

    /// Serializes this page back to exactly `page_size` bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.page_size);
        out.extend_from_slice(&self.bitmap);
        out.extend_from_slice(&self.slots);
        out.resize(self.page_size, 0);
        out
    }

    pub fn pid(&self) -> PageId {
        self.pid
    }

    fn bit(&self, slot: usize) -> bool {
        let byte = self.bitmap[slot / 8];
        let mask = 0x80u8 >> (slot % 8);
        byte & mask != 0
    }

    fn set_bit(&mut self, slot: usize, value: bool) {
        let mask = 0x80u8 >> (slot % 8);
        if value {
            self.bitmap[slot / 8] |= mask;
        } else {
            self.bitmap[slot / 8] &= !mask;
        }
    }

    pub fn num_empty_slots(&self) -> usize {
        (0..self.num_slots).filter(|&s| !self.bit(s)).count()
    }

    fn slot_bytes_mut(&mut self, slot: usize) -> &mut [u8] {
        let start = slot * self.tuple_size;
        &mut self.slots[start..start + self.tuple_size]
    }

    fn slot_bytes(&self, slot: usize) -> &[u8] {
        let start = slot * self.tuple_size;
        &self.slots[start..start + self.tuple_size]
    }

    /// Inserts into the lowest-indexed free slot, stamping `tuple`'s record id.
    pub fn insert(&mut self, tuple: &mut Tuple, schema: &TupleDesc) -> Result<()> {
        let slot = (0..self.num_slots)
            .find(|&s| !self.bit(s))
            .ok_or(DbError::NoSpace)?;

        let mut offset = 0;
        let buffer = self.slot_bytes_mut(slot);
        for (value, field) in tuple.values().iter().zip(schema.fields()) {
            value.serialize(&mut buffer[offset..], field.field_type);
            offset += field.field_type.len();
        }
        self.set_bit(slot, true);
        tuple.set_record_id(RecordId::new(self.pid, slot as i32));
        Ok(())
    }

    /// Clears the slot named by `record_id`, which must belong to this page.
    pub fn delete(&mut self, record_id: RecordId) -> Result<()> {
        if record_id.page_id != self.pid {
            return Err(DbError::NotFound(format!(
                "record {:?} does not belong to page {:?}",
                record_id, self.pid
            )));
        }
        let slot = record_id.slot_no as usize;
        if slot >= self.num_slots || !self.bit(slot) {
            return Err(DbError::NotFound(format!(
                "slot {} is not occupied on page {:?}",
                slot, self.pid
            )));
        }
        self.set_bit(slot, false);
        self.slot_bytes_mut(slot).fill(0);
        Ok(())
    }

    /// Iterates occupied slots in ascending order, parsing each into a `Tuple`.
    pub fn iter_tuples<'a>(&'a self, schema: &'a TupleDesc) -> impl Iterator<Item = Tuple> + 'a {
        (0..self.num_slots).filter(|&s| self.bit(s)).map(move |s| {
            let bytes = self.slot_bytes(s);
            let mut offset = 0;
            let mut values = Vec::with_capacity(schema.num_fields());
            for field in schema.fields() {
                values.push(Value::parse(&bytes[offset..], field.field_type));
                offset += field.field_type.len();
            }
            Tuple::with_record_id(values, RecordId::new(self.pid, s as i32))
        })
    }

    pub fn mark_dirty(&mut self, tid: Option<TransactionId>) {
        self.dirty_tid = tid;
    }

    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirty_tid
    }
}
