use std::cell::RefCell;

use crate::driver::{Driver, DriverId};

pub(crate) trait Dropper {
    fn drop_gl_object(&self, object: DropObject);
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum DropObject {
    Buffer(DriverId),
}

/// Collects driver objects whose last handle was dropped.
///
/// A handle can be dropped anywhere, including places that have no access to the driver, so the
/// objects are queued here and destroyed by the context at the start of its next operation.
#[derive(Default)]
pub(crate) struct DropQueue {
    pending: RefCell<Vec<DropObject>>,
}

impl DropQueue {
    pub(crate) fn take(&self) -> Vec<DropObject> {
        self.pending.replace(Vec::new())
    }

    /// Destroys all queued objects.
    pub(crate) fn flush<D>(&self, driver: &mut D)
    where
        D: Driver,
    {
        for object in self.take() {
            match object {
                DropObject::Buffer(id) => {
                    log::debug!("Destroying driver buffer object {}", id);

                    driver.delete_buffer(id)
                }
            }
        }
    }
}

impl Dropper for DropQueue {
    fn drop_gl_object(&self, object: DropObject) {
        self.pending.borrow_mut().push(object);
    }
}
