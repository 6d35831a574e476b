//! Cursor-backed point sequences
//!
//! Adapts a storage [`PointCursor`] into the lazy iterator a [`DataSample`]
//! wraps. Every pulled row is recorded for the raw-points accessor and
//! reported to an optional observer as it streams through, and iteration
//! honors a cancellation token so an abandoned computation stops pulling
//! promptly. The cursor itself sits behind a shared handle so the iterator,
//! the accessor and the disposer all reach the same state.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::sampling::data_sample::{Disposer, RawPointsAccessor};
use crate::store::PointCursor;
use crate::types::{DataPoint, RawDataPoint};

/// Observer receiving raw rows as they are pulled from storage.
pub type RawPointObserver = Arc<dyn Fn(&[RawDataPoint]) + Send + Sync>;

struct CursorShared {
    cursor: Option<Box<dyn PointCursor>>,
    raw: Vec<RawDataPoint>,
}

pub(crate) struct CursorPoints {
    shared: Arc<Mutex<CursorShared>>,
    cancellation: CancellationToken,
    observer: Option<RawPointObserver>,
}

impl CursorPoints {
    pub(crate) fn new(
        cursor: Box<dyn PointCursor>,
        cancellation: CancellationToken,
        observer: Option<RawPointObserver>,
    ) -> Self {
        Self {
            shared: Arc::new(Mutex::new(CursorShared {
                cursor: Some(cursor),
                raw: Vec::new(),
            })),
            cancellation,
            observer,
        }
    }

    pub(crate) fn raw_points_accessor(&self) -> RawPointsAccessor {
        let shared = Arc::clone(&self.shared);
        Arc::new(move || lock(&shared).raw.clone())
    }

    /// Disposer closing the underlying cursor. Safe to run while the iterator
    /// is still alive; iteration then ends.
    pub(crate) fn disposer(&self) -> Disposer {
        let shared = Arc::clone(&self.shared);
        Box::new(move || {
            if let Some(mut cursor) = lock(&shared).cursor.take() {
                cursor.close();
            }
        })
    }
}

impl Iterator for CursorPoints {
    type Item = DataPoint;

    fn next(&mut self) -> Option<DataPoint> {
        if self.cancellation.is_cancelled() {
            return None;
        }
        let row = {
            let mut shared = lock(&self.shared);
            let row = shared.cursor.as_mut()?.next_point()?;
            shared.raw.push(row.clone());
            row
        };
        if let Some(observer) = &self.observer {
            observer(std::slice::from_ref(&row));
        }
        Some(row.as_data_point())
    }
}

fn lock(shared: &Arc<Mutex<CursorShared>>) -> MutexGuard<'_, CursorShared> {
    match shared.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
