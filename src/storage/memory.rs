use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AttendanceFilter, AttendanceRepository, RepositoryError};
use crate::model::attendance::{Attendance, NewAttendance};

/// In-memory backend. Enforces the same per-day uniqueness the MySQL schema
/// guarantees, so callers observe identical duplicate behavior.
#[derive(Default)]
pub struct InMemoryAttendanceRepository {
    records: Mutex<Vec<Attendance>>,
    next_id: AtomicU64,
}

impl InMemoryAttendanceRepository {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AttendanceRepository for InMemoryAttendanceRepository {
    async fn find_for_date(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, RepositoryError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|r| r.user_id == user_id && r.check_in.date() == date)
            .cloned())
    }

    async fn insert(&self, record: NewAttendance) -> Result<Attendance, RepositoryError> {
        let mut records = self.records.lock().unwrap();

        let date = record.check_in.date();
        if records
            .iter()
            .any(|r| r.user_id == record.user_id && r.check_in.date() == date)
        {
            return Err(RepositoryError::Duplicate);
        }

        let stored = Attendance {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            user_id: record.user_id,
            check_in: record.check_in,
            latitude: record.latitude,
            longitude: record.longitude,
            jarak: record.jarak,
            status: record.status.as_str().to_string(),
        };

        records.push(stored.clone());
        Ok(stored)
    }

    async fn list(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<(Vec<Attendance>, i64), RepositoryError> {
        let records = self.records.lock().unwrap();

        let mut matches: Vec<Attendance> = records
            .iter()
            .filter(|r| filter.user_id.map_or(true, |u| r.user_id == u))
            .filter(|r| filter.date.map_or(true, |d| r.check_in.date() == d))
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.check_in.cmp(&a.check_in));

        let total = matches.len() as i64;
        let (page, per_page) = filter.pagination();
        let offset = ((page - 1) * per_page) as usize;

        let page_items = matches
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();

        Ok((page_items, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::NaiveDate;

    fn record_at(user_id: u64, date: NaiveDate) -> NewAttendance {
        NewAttendance {
            user_id,
            check_in: date.and_hms_opt(8, 15, 0).unwrap(),
            latitude: -6.2,
            longitude: 106.8,
            jarak: 12.5,
            status: AttendanceStatus::Present,
        }
    }

    #[actix_web::test]
    async fn second_insert_same_day_is_rejected() {
        let repo = InMemoryAttendanceRepository::new();
        let day = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();

        repo.insert(record_at(42, day)).await.unwrap();
        let err = repo.insert(record_at(42, day)).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Duplicate));
        assert_eq!(repo.len(), 1);
    }

    #[actix_web::test]
    async fn different_days_and_users_are_allowed() {
        let repo = InMemoryAttendanceRepository::new();
        let monday = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();

        repo.insert(record_at(42, monday)).await.unwrap();
        repo.insert(record_at(42, tuesday)).await.unwrap();
        repo.insert(record_at(7, tuesday)).await.unwrap();

        assert_eq!(repo.len(), 3);
        let found = repo.find_for_date(42, tuesday).await.unwrap();
        assert_eq!(found.unwrap().user_id, 42);
    }

    #[actix_web::test]
    async fn list_filters_by_user_and_date() {
        let repo = InMemoryAttendanceRepository::new();
        let monday = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();

        repo.insert(record_at(42, monday)).await.unwrap();
        repo.insert(record_at(42, tuesday)).await.unwrap();
        repo.insert(record_at(7, tuesday)).await.unwrap();

        let filter = AttendanceFilter {
            user_id: Some(42),
            ..Default::default()
        };
        let (records, total) = repo.list(&filter).await.unwrap();
        assert_eq!(total, 2);
        assert!(records.iter().all(|r| r.user_id == 42));

        let filter = AttendanceFilter {
            date: Some(tuesday),
            ..Default::default()
        };
        let (records, total) = repo.list(&filter).await.unwrap();
        assert_eq!(total, 2);
        assert!(records.iter().all(|r| r.check_in.date() == tuesday));
    }

    #[actix_web::test]
    async fn list_paginates_newest_first() {
        let repo = InMemoryAttendanceRepository::new();
        for day in 1..=5 {
            let date = NaiveDate::from_ymd_opt(2026, 8, day).unwrap();
            repo.insert(record_at(42, date)).await.unwrap();
        }

        let filter = AttendanceFilter {
            page: Some(1),
            per_page: Some(2),
            ..Default::default()
        };
        let (records, total) = repo.list(&filter).await.unwrap();

        assert_eq!(total, 5);
        assert_eq!(records.len(), 2);
        assert!(records[0].check_in > records[1].check_in);
    }
}
