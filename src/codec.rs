//! Small byte-cursor helpers used by the field codec and the page layout. Keeps the on-disk
//! format explicit and big-endian throughout, the way the teacher's own storage layer reads.

pub(crate) struct Serializer<'a> {
    buffer: &'a mut [u8],
    pos: usize,
}

impl<'a> Serializer<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, pos: 0 }
    }

    pub fn serialize_u32(&mut self, val: u32) {
        self.buffer[self.pos..self.pos + 4].copy_from_slice(&val.to_be_bytes());
        self.pos += 4;
    }

    pub fn serialize_i32(&mut self, val: i32) {
        self.serialize_u32(val as u32);
    }

    pub fn copy_bytes(&mut self, bytes: &[u8]) {
        self.buffer[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    pub fn pos(&self) -> usize {
        self.pos
    }
}

pub(crate) struct Deserializer<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> Deserializer<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, pos: 0 }
    }

    pub fn deserialize_u32(&mut self) -> u32 {
        let val = u32::from_be_bytes(self.buffer[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        val
    }

    pub fn deserialize_i32(&mut self) -> i32 {
        self.deserialize_u32() as i32
    }

    pub fn take_bytes(&mut self, count: usize) -> &'a [u8] {
        let bytes = &self.buffer[self.pos..self.pos + count];
        self.pos += count;
        bytes
    }

    pub fn pos(&self) -> usize {
        self.pos
    }
}
