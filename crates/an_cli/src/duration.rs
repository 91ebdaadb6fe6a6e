use std::str::FromStr;
use std::time::Duration;

/// Interval given as `1h`, `30m`, `1d`, `1h15m30s` or a bare number of seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

fn unit_seconds(unit: char) -> Option<u64> {
    match unit {
        's' => Some(1),
        'm' => Some(60),
        'h' => Some(3600),
        'd' => Some(86_400),
        _ => None,
    }
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let overflow = || format!("Duration too large: {}", s);
        let mut total: u64 = 0;
        let mut pending: Option<u64> = None;

        for c in s.chars().filter(|c| !c.is_whitespace()) {
            if let Some(digit) = c.to_digit(10) {
                let value = pending.unwrap_or(0);
                pending = Some(
                    value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(u64::from(digit)))
                        .ok_or_else(overflow)?,
                );
                continue;
            }
            let amount = pending
                .take()
                .ok_or_else(|| format!("Expected a number before '{}'", c))?;
            let unit = unit_seconds(c).ok_or_else(|| format!("Invalid duration unit: {}", c))?;
            total = amount
                .checked_mul(unit)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(overflow)?;
        }

        // bare trailing number is seconds
        if let Some(amount) = pending {
            total = total.checked_add(amount).ok_or_else(overflow)?;
        }

        if total == 0 {
            return Err("Duration must be greater than zero".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total)))
    }
}
