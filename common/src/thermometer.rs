use std::{cell::Cell, rc::Rc, sync::Arc};

/// Current room temperature in degrees Fahrenheit.
pub trait Thermometer {
    fn temperature(&self) -> f32;
}

impl<T: Thermometer + ?Sized> Thermometer for &T {
    fn temperature(&self) -> f32 {
        (**self).temperature()
    }
}

impl<T: Thermometer + ?Sized> Thermometer for Rc<T> {
    fn temperature(&self) -> f32 {
        (**self).temperature()
    }
}

impl<T: Thermometer + ?Sized> Thermometer for Arc<T> {
    fn temperature(&self) -> f32 {
        (**self).temperature()
    }
}

/// Thermometer whose reading is set by hand.
#[derive(Debug, Default)]
pub struct ManualThermometer {
    temp_f: Cell<f32>,
}

impl ManualThermometer {
    pub fn new(temp_f: f32) -> Self {
        Self {
            temp_f: Cell::new(temp_f),
        }
    }

    pub fn set(&self, temp_f: f32) {
        self.temp_f.set(temp_f);
    }
}

impl Thermometer for ManualThermometer {
    fn temperature(&self) -> f32 {
        self.temp_f.get()
    }
}
