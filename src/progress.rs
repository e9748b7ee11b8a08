/// Advisory row-progress sink.
///
/// Reports are best-effort fractions in `0.0..=1.0`. Implementations must not
/// block; nothing in the decoder or encoder depends on them.
pub trait Progress {
    fn report(&self, fraction: f32);
}

impl<F: Fn(f32)> Progress for F {
    fn report(&self, fraction: f32) {
        self(fraction)
    }
}

/// Discards every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _fraction: f32) {}
}

/// Fraction for `row` of a `rows`-row loop: `row / (rows - 1)`, or 1.0 when
/// there is only one row.
pub(crate) fn row_fraction(row: u32, rows: u32) -> f32 {
    if rows <= 1 {
        1.0
    } else {
        row as f32 / (rows - 1) as f32
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    #[test]
    fn closures_are_progress() {
        let last = Cell::new(-1.0f32);
        let sink = |f: f32| last.set(f);
        sink.report(0.5);
        assert_eq!(last.get(), 0.5);
        NoProgress.report(0.25);
    }

    #[test]
    fn fractions() {
        assert_eq!(row_fraction(0, 1), 1.0);
        assert_eq!(row_fraction(0, 5), 0.0);
        assert_eq!(row_fraction(4, 5), 1.0);
        assert_eq!(row_fraction(1, 3), 0.5);
    }
}
