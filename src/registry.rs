//! Bound devices, looked up by the driver that owns them.

use alloc::vec::Vec;

#[derive(Debug)]
struct Binding<D> {
    driver: &'static str,
    device: D,
}

/// Devices bound to drivers.
///
/// Passed explicitly to whoever needs to find a device; there is no global
/// instance.
#[derive(Debug)]
pub struct DeviceRegistry<D> {
    bindings: Vec<Binding<D>>,
}

impl<D> Default for DeviceRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> DeviceRegistry<D> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind `device` to `driver`.
    ///
    /// A driver holds at most one device; binding a second one hands it back.
    pub fn bind(&mut self, driver: &'static str, device: D) -> Result<(), D> {
        if self.contains(driver) {
            return Err(device);
        }
        self.bindings.push(Binding { driver, device });
        Ok(())
    }

    /// Remove and return the device bound to `driver`
    pub fn unbind(&mut self, driver: &str) -> Option<D> {
        let index = self.bindings.iter().position(|b| b.driver == driver)?;
        Some(self.bindings.remove(index).device)
    }

    pub fn get_device_by_driver(&mut self, driver: &str) -> Option<&mut D> {
        self.bindings
            .iter_mut()
            .find(|b| b.driver == driver)
            .map(|b| &mut b.device)
    }

    pub fn contains(&self, driver: &str) -> bool {
        self.bindings.iter().any(|b| b.driver == driver)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
