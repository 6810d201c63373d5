#![allow(dead_code)]

use qsim_station::customer::CustomerRecord;

pub fn assert_float_eq(x: f64, y: f64, eps: f64) {
    assert!(x > y - eps && x < y + eps, "{} is not within {} of {}", x, eps, y);
}

pub fn departed(records: &[CustomerRecord]) -> Vec<&CustomerRecord> {
    records.iter().filter(|r| r.has_departed()).collect()
}
