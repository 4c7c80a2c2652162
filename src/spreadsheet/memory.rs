use crate::error::FetchError;
use crate::spreadsheet::cell::RawCell;
use crate::spreadsheet::SheetService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// In-process workbook speaking the same protocol as the remote service.
///
/// Worksheets keep insertion order. Switching the workbook offline makes every
/// call fail with `FetchError::Unreachable`, as a dropped network would.
#[derive(Debug, Default)]
pub struct MemorySheets {
    worksheets: Mutex<Vec<(String, Vec<Vec<RawCell>>)>>,
    offline: AtomicBool,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a worksheet with a header row and text data rows.
    pub fn with_worksheet(self, title: &str, header: &[&str], rows: &[&[&str]]) -> Self {
        let grid = std::iter::once(header)
            .chain(rows.iter().copied())
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            RawCell::Empty
                        } else {
                            RawCell::Text((*cell).to_owned())
                        }
                    })
                    .collect()
            })
            .collect();
        self.insert_worksheet(title, grid);
        self
    }

    /// Adds (or replaces) a worksheet from a raw grid.
    pub fn insert_worksheet(&self, title: &str, grid: Vec<Vec<RawCell>>) {
        let mut worksheets = self.lock();
        match worksheets.iter_mut().find(|(name, _)| name == title) {
            Some((_, slot)) => *slot = grid,
            None => worksheets.push((title.to_owned(), grid)),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Current grid of a worksheet, for assertions.
    pub fn grid(&self, title: &str) -> Option<Vec<Vec<RawCell>>> {
        self.lock()
            .iter()
            .find(|(name, _)| name == title)
            .map(|(_, grid)| grid.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, Vec<Vec<RawCell>>)>> {
        // A panic while holding the lock leaves plain data behind; keep serving it.
        self.worksheets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_online(&self) -> Result<(), FetchError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(FetchError::Unreachable("workbook is offline".to_owned()))
        } else {
            Ok(())
        }
    }

    fn with_grid<T>(
        &self,
        worksheet: &str,
        f: impl FnOnce(&mut Vec<Vec<RawCell>>) -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        self.ensure_online()?;
        let mut worksheets = self.lock();
        let index = worksheets
            .iter()
            .position(|(name, _)| name == worksheet)
            .ok_or_else(|| FetchError::WorksheetNotFound(worksheet.to_owned()))?;
        f(&mut worksheets[index].1)
    }
}

impl SheetService for MemorySheets {
    fn worksheet_titles(&self) -> Result<Vec<String>, FetchError> {
        self.ensure_online()?;
        Ok(self.lock().iter().map(|(name, _)| name.to_owned()).collect())
    }

    fn read_rows(&self, worksheet: &str) -> Result<Vec<Vec<RawCell>>, FetchError> {
        self.with_grid(worksheet, |grid| Ok(grid.clone()))
    }

    fn append_row(&self, worksheet: &str, row: Vec<RawCell>) -> Result<(), FetchError> {
        self.with_grid(worksheet, |grid| {
            grid.push(row);
            Ok(())
        })
    }

    fn write_cell(&self, worksheet: &str, row: usize, col: usize, value: RawCell) -> Result<(), FetchError> {
        self.with_grid(worksheet, |grid| {
            if row == 0 || col == 0 {
                return Err(FetchError::InvalidResponse(format!("cell ({row}, {col}) is not 1-based")));
            }
            if grid.len() < row {
                grid.resize(row, Vec::new());
            }
            let cells = &mut grid[row - 1];
            if cells.len() < col {
                cells.resize(col, RawCell::Empty);
            }
            cells[col - 1] = value;
            Ok(())
        })
    }
}
