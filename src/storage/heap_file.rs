use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::sync::Mutex;

use crate::common::{table_id_for_path, PageId, PageNo, TableId};
use crate::error::Result;
use crate::schema::TupleDesc;

use super::page::Page;

/// The on-disk representation of a table: a byte-exact concatenation of fixed-size pages.
/// `table_id` is a deterministic hash of the file's canonical path, stable across process
/// restarts, so it never needs to be persisted anywhere else.
pub struct HeapFile {
    table_id: TableId,
    schema: TupleDesc,
    file: File,
    page_size: usize,
    tuple_size: usize,
    // Guards page-count growth so two concurrent appends cannot both claim the same page number.
    filesize: Mutex<u64>,
}

impl HeapFile {
    pub fn open_or_create(path: &Path, schema: TupleDesc, page_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let table_id = table_id_for_path(path)?;
        let filesize = file.metadata()?.len();
        let tuple_size = schema.size();
        Ok(Self {
            table_id,
            schema,
            file,
            page_size,
            tuple_size,
            filesize: Mutex::new(filesize),
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn schema(&self) -> &TupleDesc {
        &self.schema
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn num_pages(&self) -> i32 {
        let size = *self.filesize.lock().unwrap();
        (size / self.page_size as u64) as i32
    }

    pub fn read_page(&self, page_no: PageNo) -> Result<Page> {
        let mut buf = vec![0u8; self.page_size];
        self.file
            .read_exact_at(&mut buf, page_no as u64 * self.page_size as u64)?;
        Ok(Page::from_bytes(
            PageId::new(self.table_id, page_no),
            &buf,
            self.tuple_size,
        ))
    }

    pub fn write_page(&self, page: &Page) -> Result<()> {
        let bytes = page.serialize();
        let page_no = page.pid().page_no;
        self.file
            .write_all_at(&bytes, page_no as u64 * self.page_size as u64)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Appends a new zero-initialized empty page under a file-wide mutex, so a concurrent append
    /// can never race on the same page number, and returns it.
    pub fn allocate_page(&self) -> Result<Page> {
        let mut filesize = self.filesize.lock().unwrap();
        let page_no = (*filesize / self.page_size as u64) as i32;
        let page = Page::empty(PageId::new(self.table_id, page_no), self.page_size, self.tuple_size);
        self.file.write_all_at(&page.serialize(), *filesize)?;
        self.file.sync_all()?;
        *filesize += self.page_size as u64;
        Ok(page)
    }
}
