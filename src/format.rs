const MAGNITUDE_SUFFIXES: [char; 4] = [' ', 'K', 'M', 'G'];

/// Two-decimal value with a K/M/G magnitude suffix, e.g. `1.50K`.
///
/// Unscaled values keep a trailing space so columns line up on the card.
pub fn magnitude(n: i64) -> String {
    let mut value = n as f64;
    let mut index = 0;
    while value > 1000.0 && index + 1 < MAGNITUDE_SUFFIXES.len() {
        value /= 1000.0;
        index += 1;
    }
    format!("{:.2}{}", value, MAGNITUDE_SUFFIXES[index])
}

pub fn round2(value: f64) -> String {
    format!("{:.2}", value)
}

/// Direction of change between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// `Down` only for strictly negative deltas.
    pub fn of<T: PartialOrd + Default>(delta: T) -> Self {
        if delta < T::default() {
            Self::Down
        } else {
            Self::Up
        }
    }

    /// Ranks improve as the number shrinks, so a positive delta is a drop.
    pub fn of_rank(delta: i64) -> Self {
        if delta > 0 {
            Self::Down
        } else {
            Self::Up
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
        }
    }

    pub fn sign(self) -> &'static str {
        match self {
            Self::Up => "+",
            Self::Down => "-",
        }
    }
}

/// `↑1.25` / `↓0.50`
pub fn arrow_delta(delta: f64) -> String {
    format!("{}{}", Trend::of(delta).arrow(), round2(delta.abs()))
}

/// `+1.50K` / `-200.00 `
pub fn signed_magnitude(delta: i64) -> String {
    format!("{}{}", Trend::of(delta).sign(), magnitude(delta.saturating_abs()))
}

/// `+12` / `-3`
pub fn signed_count(delta: i64) -> String {
    format!("{}{}", Trend::of(delta).sign(), delta.unsigned_abs())
}

/// `+0.42` / `-1.00`
pub fn signed_decimal(delta: f64) -> String {
    format!("{}{}", Trend::of(delta).sign(), round2(delta.abs()))
}

/// `(↑3)` / `(↓1)`
pub fn bracketed_arrow_count(delta: i64, trend: Trend) -> String {
    format!("({}{})", trend.arrow(), delta.unsigned_abs())
}
