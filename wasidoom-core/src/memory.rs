//! Bounds-checked view over the guest's linear memory.
//!
//! Syscall arguments are pointers and lengths into this region, so every
//! access is validated against it. An out-of-range access is not a syscall
//! error: errno values are reserved for failures a well-behaved guest can
//! provoke, while a bad pointer means the guest is corrupted or hostile.
//! Such an access panics and takes the whole process down.

/// A view over the guest's memory, scoped to a single host call.
///
/// The host never owns the underlying buffer; the runtime hands out a
/// mutable slice for the duration of one syscall.
pub struct GuestMemory<'a> {
    data: &'a mut [u8],
}

impl<'a> GuestMemory<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn span(&self, offset: u32, len: usize) -> std::ops::Range<usize> {
        let start = offset as usize;
        let end = start.checked_add(len).unwrap_or(usize::MAX);
        if end > self.data.len() {
            panic!(
                "guest memory access out of bounds: {}+{} > {}",
                start,
                len,
                self.data.len()
            );
        }
        start..end
    }

    pub fn read(&self, offset: u32, len: u32) -> &[u8] {
        &self.data[self.span(offset, len as usize)]
    }

    pub fn write(&mut self, offset: u32, bytes: &[u8]) {
        let span = self.span(offset, bytes.len());
        self.data[span].copy_from_slice(bytes);
    }

    pub fn read_u32(&self, offset: u32) -> u32 {
        let bytes = self.read(offset, 4);
        u32::from_le_bytes(bytes.try_into().unwrap())
    }

    pub fn write_u32(&mut self, offset: u32, value: u32) {
        self.write(offset, &value.to_le_bytes());
    }

    pub fn write_u64(&mut self, offset: u32, value: u64) {
        self.write(offset, &value.to_le_bytes());
    }
}
