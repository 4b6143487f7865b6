//! Body stat rows

use chrono::{NaiveDate, Utc};
use rusqlite::{Row, params};
use tracing::info;

use super::Database;
use crate::error::{Error, Result};
use crate::measurements::{BodyStat, NewBodyStat};

fn stat_from_row(row: &Row<'_>) -> rusqlite::Result<BodyStat> {
    Ok(BodyStat {
        id: row.get(0)?,
        date: row.get(1)?,
        weight: row.get(2)?,
        body_fat: row.get(3)?,
        muscle_mass: row.get(4)?,
    })
}

impl Database {
    /// Record a measurement; `today` is used when the stat has no date
    pub fn add_body_stat(&self, stat: NewBodyStat, today: NaiveDate) -> Result<BodyStat> {
        stat.validate()?;
        let date = stat.date.unwrap_or(today);
        self.conn.execute(
            "INSERT INTO body_stats (stat_date, weight, body_fat, muscle_mass, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![date, stat.weight, stat.body_fat, stat.muscle_mass, Utc::now()],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("Recorded body stats for {} (id {})", date, id);
        Ok(BodyStat {
            id,
            date,
            weight: stat.weight,
            body_fat: stat.body_fat,
            muscle_mass: stat.muscle_mass,
        })
    }

    /// Stats dated on or after `since` (all when `None`), oldest first
    pub fn get_body_stats(&self, since: Option<NaiveDate>) -> Result<Vec<BodyStat>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, stat_date, weight, body_fat, muscle_mass FROM body_stats
             WHERE (?1 IS NULL OR stat_date >= ?1)
             ORDER BY stat_date, id",
        )?;
        let stats = stmt
            .query_map(params![since], stat_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stats)
    }

    pub fn delete_body_stat(&self, id: i64) -> Result<()> {
        let removed = self.conn.execute("DELETE FROM body_stats WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(Error::not_found(format!("measurement {}", id)));
        }
        info!("Deleted measurement {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weight(day: NaiveDate, kg: f64) -> NewBodyStat {
        NewBodyStat {
            date: Some(day),
            weight: Some(kg),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_list_delete() {
        let db = Database::open_in_memory().unwrap();
        db.add_body_stat(weight(date(2024, 6, 10), 80.0), date(2024, 6, 20)).unwrap();
        let second = db.add_body_stat(weight(date(2024, 6, 1), 81.0), date(2024, 6, 20)).unwrap();

        let all = db.get_body_stats(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        db.delete_body_stat(second.id).unwrap();
        assert_eq!(db.get_body_stats(None).unwrap().len(), 1);
        assert!(matches!(db.delete_body_stat(second.id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_defaults_to_today() {
        let db = Database::open_in_memory().unwrap();
        let stat = NewBodyStat {
            body_fat: Some(18.5),
            ..Default::default()
        };
        let saved = db.add_body_stat(stat, date(2024, 6, 20)).unwrap();
        assert_eq!(saved.date, date(2024, 6, 20));
    }

    #[test]
    fn test_since_filter() {
        let db = Database::open_in_memory().unwrap();
        for day in [1, 10, 20] {
            db.add_body_stat(weight(date(2024, 6, day), 80.0), date(2024, 6, 20)).unwrap();
        }
        assert_eq!(db.get_body_stats(Some(date(2024, 6, 10))).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_stat_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.add_body_stat(NewBodyStat::default(), date(2024, 6, 20)).is_err());
    }
}
