//! Draw history grouped by date.

use chrono::NaiveDate;
use quiniela_core::types::Draw;

/// Numbers drawn on one date, in position order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawDay {
    pub date: NaiveDate,
    pub numbers: Vec<u8>,
}

/// Draws grouped into data-bearing days, ascending by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawHistory {
    days: Vec<DrawDay>,
    draw_count: usize,
}

impl DrawHistory {
    /// Group draws by date. Input order does not matter.
    pub fn from_draws(draws: &[Draw]) -> Self {
        let mut sorted: Vec<&Draw> = draws.iter().collect();
        sorted.sort_by_key(|d| (d.date, d.position, d.number));

        let mut days: Vec<DrawDay> = Vec::new();
        for draw in sorted {
            match days.last_mut() {
                Some(day) if day.date == draw.date => day.numbers.push(draw.number),
                _ => days.push(DrawDay {
                    date: draw.date,
                    numbers: vec![draw.number],
                }),
            }
        }

        Self {
            days,
            draw_count: draws.len(),
        }
    }

    pub fn days(&self) -> &[DrawDay] {
        &self.days
    }

    /// Individual draw records.
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    /// Distinct data-bearing dates.
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }

    /// The last `n` data-bearing days.
    pub fn last_days(&self, n: usize) -> &[DrawDay] {
        let start = self.days.len().saturating_sub(n);
        &self.days[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(day: u32, number: u8, position: u8) -> Draw {
        Draw::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), number, position).unwrap()
    }

    #[test]
    fn groups_by_date_in_position_order() {
        let history = DrawHistory::from_draws(&[
            draw(2, 50, 2),
            draw(1, 10, 1),
            draw(2, 40, 1),
            draw(1, 11, 2),
        ]);

        assert_eq!(history.draw_count(), 4);
        assert_eq!(history.day_count(), 2);
        assert_eq!(history.days()[0].numbers, vec![10, 11]);
        assert_eq!(history.days()[1].numbers, vec![40, 50]);
        assert_eq!(history.last_days(1)[0].date.to_string(), "2024-01-02");
        assert_eq!(history.last_days(10).len(), 2);
    }
}
