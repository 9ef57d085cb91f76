use std::{fmt::Display, ops::Deref};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. || value.is_nan() {
            None
        } else {
            Some(Percentage(value))
        }
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `part` in `whole`. There is no share of nothing, so a zero `whole` gives `None`.
pub fn count_percentage(part: usize, whole: usize) -> Option<Percentage> {
    if whole == 0 {
        return None;
    }
    Percentage::new_opt(part as f64 / whole as f64 * 100.)
}

#[cfg(test)]
mod tests {
    use super::{count_percentage, Percentage};

    #[test]
    fn percentage_of_counts() {
        assert_eq!(count_percentage(1, 4), Percentage::new_opt(25.));
        assert_eq!(count_percentage(0, 3), Percentage::new_opt(0.));
        assert_eq!(count_percentage(2, 0), None);
    }

    #[test]
    fn negative_is_rejected() {
        assert_eq!(Percentage::new_opt(-1.), None);
    }

    #[test]
    fn display_rounds() {
        assert_eq!(count_percentage(2, 3).unwrap().to_string(), "67%");
    }
}
